//! [`SqliteStore`] — the SQLite implementation of [`FundStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use fundlog_core::{
  article::{ArticleQuery, ArticleUpdate, FundArticle, NewArticle},
  fund::{FundFields, FundRecord},
  history::{ChangeKind, HISTORY_LIMIT, HistorySnapshot, Persisted},
  store::FundStore,
};
use rusqlite::{OptionalExtension as _, params_from_iter};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ARTICLE_SELECT, FUND_SELECT, RawArticle, RawFund, RawSnapshot,
    SNAPSHOT_SELECT, encode_dt, encode_uuid, field_columns, fund_values,
    snapshot_values,
  },
  schema::SCHEMA,
};

const INSERT_FUND: &str = concat!(
  "INSERT INTO funds (fund_id, ",
  field_columns!(),
  ", updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, \
   ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
);

const UPDATE_FUND: &str = "UPDATE funds SET
    name = ?2, amc_name = ?3, primary_badge = ?4, market_cap = ?5, cagr = ?6,
    equity_size = ?7, high_return = ?8, low_return = ?9, std_deviation = ?10,
    sharpe_ratio = ?11, sortino_ratio = ?12, beta = ?13, alpha = ?14,
    r_squared = ?15, expense_ratio = ?16, nav = ?17, aum = ?18,
    lock_in_period = ?19, updated_at = ?20
  WHERE fund_id = ?1";

const INSERT_SNAPSHOT: &str = concat!(
  "INSERT INTO fund_history (history_id, fund_id, history_date, change_kind, \
   updated_at, ",
  field_columns!(),
  ") VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, \
   ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A fund store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:          tokio_rusqlite::Connection,
  history_limit: usize,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, history_limit: HISTORY_LIMIT };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, history_limit: HISTORY_LIMIT };
    store.init_schema().await?;
    Ok(store)
  }

  /// Override how many snapshots per fund survive the post-write trim.
  /// At least one is always kept.
  pub fn with_history_limit(mut self, limit: usize) -> Self {
    self.history_limit = limit.max(1);
    self
  }

  pub fn history_limit(&self) -> usize { self.history_limit }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write `record` (insert for [`ChangeKind::Created`], update otherwise),
  /// append its snapshot in the same transaction, then trim the fund's
  /// history as a separate step.
  async fn persist(
    &self,
    record: FundRecord,
    change_kind: ChangeKind,
  ) -> Result<Persisted> {
    let snapshot = HistorySnapshot::capture(&record, change_kind);
    let record_values = fund_values(&record);
    let history_values = snapshot_values(&snapshot);
    let sql = match change_kind {
      ChangeKind::Created => INSERT_FUND,
      _ => UPDATE_FUND,
    };

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if tx.execute(sql, params_from_iter(record_values))? == 0 {
          return Ok(false);
        }
        tx.execute(INSERT_SNAPSHOT, params_from_iter(history_values))?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !written {
      return Err(fundlog_core::Error::FundNotFound(record.fund_id).into());
    }

    let trimmed = self.trim_history(record.fund_id, self.history_limit).await?;
    Ok(Persisted { fund: record, snapshot, trimmed })
  }
}

// ─── FundStore impl ──────────────────────────────────────────────────────────

impl FundStore for SqliteStore {
  type Error = Error;

  // ── Funds ─────────────────────────────────────────────────────────────────

  async fn create_fund(&self, fields: FundFields) -> Result<Persisted> {
    let record = FundRecord {
      fund_id: Uuid::new_v4(),
      fields,
      updated_at: Utc::now(),
    };
    self.persist(record, ChangeKind::Created).await
  }

  async fn get_fund(&self, id: Uuid) -> Result<Option<FundRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFund> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("{FUND_SELECT} WHERE fund_id = ?1"),
            rusqlite::params![id_str],
            RawFund::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawFund::into_fund).transpose()
  }

  async fn find_fund_by_name(&self, name: String) -> Result<Option<FundRecord>> {
    let lookup = name.clone();

    let raws: Vec<RawFund> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare(&format!("{FUND_SELECT} WHERE name = ?1 ORDER BY rowid LIMIT 2"))?;
        let rows = stmt
          .query_map(rusqlite::params![lookup], RawFund::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if raws.len() > 1 {
      return Err(fundlog_core::Error::DuplicateFundName(name).into());
    }
    raws.into_iter().next().map(RawFund::into_fund).transpose()
  }

  async fn list_funds(&self) -> Result<Vec<FundRecord>> {
    let raws: Vec<RawFund> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{FUND_SELECT} ORDER BY name, rowid"))?;
        let rows = stmt
          .query_map([], RawFund::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFund::into_fund).collect()
  }

  async fn save_fund(&self, id: Uuid, fields: FundFields) -> Result<Persisted> {
    let record = FundRecord {
      fund_id: id,
      fields,
      updated_at: Utc::now(),
    };
    self.persist(record, ChangeKind::Updated).await
  }

  async fn delete_fund(&self, id: Uuid) -> Result<bool> {
    let Some(record) = self.get_fund(id).await? else {
      return Ok(false);
    };

    let snapshot = HistorySnapshot::capture(&record, ChangeKind::Deleted);
    let id_str = encode_uuid(id);
    let history_values = snapshot_values(&snapshot);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if tx.execute("DELETE FROM funds WHERE fund_id = ?1", rusqlite::params![id_str])?
          == 0
        {
          return Ok(false);
        }
        tx.execute(INSERT_SNAPSHOT, params_from_iter(history_values))?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if deleted {
      self.trim_history(id, self.history_limit).await?;
    }
    Ok(deleted)
  }

  // ── Articles ──────────────────────────────────────────────────────────────

  async fn create_article(&self, input: NewArticle) -> Result<FundArticle> {
    let article = FundArticle {
      article_id: Uuid::new_v4(),
      fund_id:    input.fund_id,
      title:      input.title,
      summary:    input.summary,
      content:    input.content,
      date:       Utc::now(),
    };

    let article_id_str = encode_uuid(article.article_id);
    let fund_id_str    = encode_uuid(article.fund_id);
    let title          = article.title.clone();
    let summary        = article.summary.clone();
    let content        = article.content.clone();
    let date_str       = encode_dt(article.date);

    let inserted = self
      .conn
      .call(move |conn| {
        let fund_exists = conn
          .query_row(
            "SELECT 1 FROM funds WHERE fund_id = ?1",
            rusqlite::params![fund_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !fund_exists {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO fund_articles (article_id, fund_id, title, summary, content, date)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![article_id_str, fund_id_str, title, summary, content, date_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(fundlog_core::Error::FundNotFound(article.fund_id).into());
    }
    Ok(article)
  }

  async fn get_article(&self, id: Uuid) -> Result<Option<FundArticle>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawArticle> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("{ARTICLE_SELECT} WHERE article_id = ?1"),
            rusqlite::params![id_str],
            RawArticle::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawArticle::into_article).transpose()
  }

  async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<FundArticle>> {
    let fund_id_str = query.fund_id.map(encode_uuid);
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val   = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset_val  = query.offset.map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));

    let raws: Vec<RawArticle> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{ARTICLE_SELECT}
           WHERE ?1 IS NULL OR fund_id = ?1
           ORDER BY date DESC, rowid DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![fund_id_str, limit_val, offset_val],
            RawArticle::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArticle::into_article).collect()
  }

  async fn update_article(
    &self,
    id: Uuid,
    update: ArticleUpdate,
  ) -> Result<Option<FundArticle>> {
    let Some(mut article) = self.get_article(id).await? else {
      return Ok(None);
    };
    update.apply_to(&mut article);

    let id_str  = encode_uuid(id);
    let title   = article.title.clone();
    let summary = article.summary.clone();
    let content = article.content.clone();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE fund_articles SET title = ?2, summary = ?3, content = ?4
           WHERE article_id = ?1",
          rusqlite::params![id_str, title, summary, content],
        )?)
      })
      .await?;

    Ok((updated > 0).then_some(article))
  }

  async fn delete_article(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM fund_articles WHERE article_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn list_history(
    &self,
    fund_id: Uuid,
    limit: usize,
  ) -> Result<Vec<HistorySnapshot>> {
    let fund_id_str = encode_uuid(fund_id);
    let limit_val   = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{SNAPSHOT_SELECT}
           WHERE fund_id = ?1
           ORDER BY history_date DESC, rowid DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![fund_id_str, limit_val], RawSnapshot::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }

  async fn set_history_date(
    &self,
    history_id: Uuid,
    date: DateTime<Utc>,
  ) -> Result<()> {
    let id_str   = encode_uuid(history_id);
    let date_str = encode_dt(date);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE fund_history SET history_date = ?2 WHERE history_id = ?1",
          rusqlite::params![id_str, date_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(fundlog_core::Error::SnapshotNotFound(history_id).into());
    }
    Ok(())
  }

  async fn trim_history(&self, fund_id: Uuid, keep: usize) -> Result<usize> {
    let fund_id_str = encode_uuid(fund_id);
    let keep_val    = i64::try_from(keep).unwrap_or(i64::MAX);

    let trimmed = self
      .conn
      .call(move |conn| {
        let excess: Vec<String> = {
          let mut stmt = conn.prepare(
            "SELECT history_id FROM fund_history
             WHERE fund_id = ?1
             ORDER BY history_date DESC, rowid DESC
             LIMIT -1 OFFSET ?2",
          )?;
          stmt
            .query_map(rusqlite::params![fund_id_str, keep_val], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut delete =
          conn.prepare("DELETE FROM fund_history WHERE history_id = ?1")?;
        for history_id in &excess {
          delete.execute(rusqlite::params![history_id])?;
        }
        Ok(excess.len())
      })
      .await?;

    Ok(trimmed)
  }
}
