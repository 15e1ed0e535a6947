//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use fundlog_core::{
  article::{ArticleQuery, ArticleUpdate, NewArticle},
  fund::FundFields,
  history::{ChangeKind, HISTORY_LIMIT},
  store::{FundStore, StoreError},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn fields(name: &str, nav: f64) -> FundFields {
  FundFields {
    name:           name.into(),
    amc_name:       Some("Acme AMC".into()),
    primary_badge:  Some("Equity Fund".into()),
    market_cap:     "Large Cap".into(),
    cagr:           None,
    equity_size:    90.0,
    high_return:    24.1,
    low_return:     -8.3,
    std_deviation:  14.2,
    sharpe_ratio:   1.1,
    sortino_ratio:  1.6,
    beta:           0.95,
    alpha:          2.4,
    r_squared:      0.91,
    expense_ratio:  0.65,
    nav,
    aum:            12_500.0,
    lock_in_period: None,
  }
}

// ─── Funds ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_fund() {
  let s = store().await;

  let persisted = s.create_fund(fields("Acme Bluechip", 10.0)).await.unwrap();
  assert_eq!(persisted.trimmed, 0);
  assert_eq!(persisted.snapshot.change_kind, ChangeKind::Created);
  assert_eq!(persisted.snapshot.fund_id, persisted.fund.fund_id);

  let fetched = s.get_fund(persisted.fund.fund_id).await.unwrap().unwrap();
  assert_eq!(fetched, persisted.fund);
}

#[tokio::test]
async fn get_fund_missing_returns_none() {
  let s = store().await;
  assert!(s.get_fund(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_name_rejects_duplicates() {
  let s = store().await;
  s.create_fund(fields("Twin", 1.0)).await.unwrap();
  assert!(s.find_fund_by_name("Twin".into()).await.unwrap().is_some());

  s.create_fund(fields("Twin", 2.0)).await.unwrap();
  let err = s.find_fund_by_name("Twin".into()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(fundlog_core::Error::DuplicateFundName(ref n)) if n == "Twin"
  ));
}

#[tokio::test]
async fn save_fund_restamps_updated_at_and_appends_snapshot() {
  let s = store().await;
  let created = s.create_fund(fields("Acme Bluechip", 10.0)).await.unwrap();

  let saved = s
    .save_fund(created.fund.fund_id, fields("Acme Bluechip", 11.5))
    .await
    .unwrap();
  assert!(saved.fund.updated_at >= created.fund.updated_at);
  assert_eq!(saved.snapshot.change_kind, ChangeKind::Updated);
  assert_eq!(saved.snapshot.fields.nav, 11.5);

  let history = s.list_history(created.fund.fund_id, HISTORY_LIMIT).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].history_id, saved.snapshot.history_id);
  assert_eq!(history[1].history_id, created.snapshot.history_id);
}

#[tokio::test]
async fn save_missing_fund_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.save_fund(id, fields("Ghost", 1.0)).await.unwrap_err();
  assert!(matches!(err, Error::Core(fundlog_core::Error::FundNotFound(x)) if x == id));
  assert!(s.list_history(id, HISTORY_LIMIT).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_funds_is_ordered_by_name() {
  let s = store().await;
  s.create_fund(fields("Zeta", 1.0)).await.unwrap();
  s.create_fund(fields("Alpha", 1.0)).await.unwrap();

  let names: Vec<_> = s
    .list_funds()
    .await
    .unwrap()
    .into_iter()
    .map(|f| f.fields.name)
    .collect();
  assert_eq!(names, ["Alpha", "Zeta"]);
}

#[tokio::test]
async fn delete_fund_cascades_articles_and_keeps_history() {
  let s = store().await;
  let fund = s.create_fund(fields("Doomed", 1.0)).await.unwrap().fund;
  let article = s
    .create_article(NewArticle {
      fund_id: fund.fund_id,
      title:   "Q1 review".into(),
      summary: "short".into(),
      content: "long".into(),
    })
    .await
    .unwrap();

  assert!(s.delete_fund(fund.fund_id).await.unwrap());
  assert!(!s.delete_fund(fund.fund_id).await.unwrap());
  assert!(s.get_fund(fund.fund_id).await.unwrap().is_none());
  assert!(s.get_article(article.article_id).await.unwrap().is_none());

  let history = s.list_history(fund.fund_id, HISTORY_LIMIT).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].change_kind, ChangeKind::Deleted);
  assert_eq!(history[0].fields.name, "Doomed");
}

// ─── Articles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn article_requires_existing_fund() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s
    .create_article(NewArticle {
      fund_id: id,
      title:   "t".into(),
      summary: "s".into(),
      content: "c".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(fundlog_core::Error::FundNotFound(x)) if x == id));
  assert!(matches!(err.as_core(), Some(fundlog_core::Error::FundNotFound(x)) if *x == id));
}

#[tokio::test]
async fn list_articles_filters_by_fund_newest_first() {
  let s = store().await;
  let a = s.create_fund(fields("A", 1.0)).await.unwrap().fund;
  let b = s.create_fund(fields("B", 1.0)).await.unwrap().fund;

  for (fund_id, title) in [(a.fund_id, "a1"), (b.fund_id, "b1"), (a.fund_id, "a2")] {
    s.create_article(NewArticle {
      fund_id,
      title:   title.into(),
      summary: String::new(),
      content: String::new(),
    })
    .await
    .unwrap();
  }

  let only_a = s
    .list_articles(&ArticleQuery { fund_id: Some(a.fund_id), ..Default::default() })
    .await
    .unwrap();
  let titles: Vec<_> = only_a.iter().map(|x| x.title.as_str()).collect();
  assert_eq!(titles, ["a2", "a1"]);

  let page = s
    .list_articles(&ArticleQuery { limit: Some(1), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].title, "b1");

  let past_end = s
    .list_articles(&ArticleQuery { offset: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap();
  assert!(past_end.is_empty());
}

#[tokio::test]
async fn update_article_keeps_date() {
  let s = store().await;
  let fund = s.create_fund(fields("A", 1.0)).await.unwrap().fund;
  let article = s
    .create_article(NewArticle {
      fund_id: fund.fund_id,
      title:   "draft".into(),
      summary: "s".into(),
      content: "c".into(),
    })
    .await
    .unwrap();

  let updated = s
    .update_article(article.article_id, ArticleUpdate {
      title: Some("final".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.title, "final");
  assert_eq!(updated.summary, "s");
  assert_eq!(updated.date, article.date);

  assert!(
    s.update_article(Uuid::new_v4(), ArticleUpdate::default())
      .await
      .unwrap()
      .is_none()
  );
  assert!(s.delete_article(article.article_id).await.unwrap());
  assert!(!s.delete_article(article.article_id).await.unwrap());
}

// ─── History retention ───────────────────────────────────────────────────────

#[tokio::test]
async fn retention_keeps_newest_hundred_of_150_writes() {
  let s = store().await;
  let created = s.create_fund(fields("Busy", 0.0)).await.unwrap();
  let id = created.fund.fund_id;

  let mut last_trimmed = 0;
  for i in 1..150 {
    last_trimmed = s.save_fund(id, fields("Busy", i as f64)).await.unwrap().trimmed;
  }
  assert_eq!(last_trimmed, 1);

  let history = s.list_history(id, usize::MAX).await.unwrap();
  assert_eq!(history.len(), HISTORY_LIMIT);
  // Writes 50..=149 survive, newest first.
  assert_eq!(history[0].fields.nav, 149.0);
  assert_eq!(history[HISTORY_LIMIT - 1].fields.nav, 50.0);
}

#[tokio::test]
async fn retention_orders_by_history_date_not_insertion() {
  let s = store().await.with_history_limit(5);
  let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

  let created = s.create_fund(fields("Backdated", 0.0)).await.unwrap();
  let id = created.fund.fund_id;
  // Give the first snapshot the latest date of all.
  s.set_history_date(created.snapshot.history_id, base + Duration::days(1000))
    .await
    .unwrap();

  // Dates deliberately out of insertion order: 7, 3, 9, 1, 5, 8, 2.
  for (i, day) in [7, 3, 9, 1, 5, 8, 2].into_iter().enumerate() {
    let saved = s.save_fund(id, fields("Backdated", (i + 1) as f64)).await.unwrap();
    s.set_history_date(saved.snapshot.history_id, base + Duration::days(day))
      .await
      .unwrap();
  }

  let days = |history: &[fundlog_core::history::HistorySnapshot]| -> Vec<i64> {
    history.iter().map(|h| (h.history_date - base).num_days()).collect()
  };

  // The trim for the last write ran before its snapshot was backdated to
  // day 2, so day 5 was evicted in its place.
  let history = s.list_history(id, usize::MAX).await.unwrap();
  assert_eq!(days(&history), [1000, 9, 8, 7, 2]);

  // The next write re-trims against the corrected dates.
  let last = s.save_fund(id, fields("Backdated", 99.0)).await.unwrap();
  assert_eq!(last.trimmed, 1);
  let history = s.list_history(id, usize::MAX).await.unwrap();
  assert_eq!(history[0].history_id, last.snapshot.history_id);
  assert_eq!(days(&history[1..]), [1000, 9, 8, 7]);
}

#[tokio::test]
async fn zero_history_limit_still_keeps_latest_snapshot() {
  let s = store().await.with_history_limit(0);
  assert_eq!(s.history_limit(), 1);

  let created = s.create_fund(fields("Lean", 1.0)).await.unwrap();
  let saved = s.save_fund(created.fund.fund_id, fields("Lean", 2.0)).await.unwrap();
  assert_eq!(saved.trimmed, 1);

  let history = s.list_history(created.fund.fund_id, usize::MAX).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].history_id, saved.snapshot.history_id);
}

#[tokio::test]
async fn trim_deletes_nothing_under_limit() {
  let s = store().await;
  let id = s.create_fund(fields("Quiet", 1.0)).await.unwrap().fund.fund_id;
  assert_eq!(s.trim_history(id, HISTORY_LIMIT).await.unwrap(), 0);
  assert_eq!(s.list_history(id, HISTORY_LIMIT).await.unwrap().len(), 1);
}

#[tokio::test]
async fn set_history_date_on_missing_snapshot_fails() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.set_history_date(id, Utc::now()).await.unwrap_err();
  assert!(matches!(err, Error::Core(fundlog_core::Error::SnapshotNotFound(x)) if x == id));
  assert!(matches!(err.as_core(), Some(fundlog_core::Error::SnapshotNotFound(x)) if *x == id));
}
