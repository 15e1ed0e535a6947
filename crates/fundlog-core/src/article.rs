//! Articles — editorial content owned by exactly one fund.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted article. Deleted together with its fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundArticle {
  pub article_id: Uuid,
  pub fund_id:    Uuid,
  pub title:      String,
  pub summary:    String,
  pub content:    String,
  /// Set by the store at creation; never changes afterwards.
  pub date:       DateTime<Utc>,
}

/// Input to [`crate::store::FundStore::create_article`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
  pub fund_id: Uuid,
  pub title:   String,
  pub summary: String,
  pub content: String,
}

/// Editable article content. `None` leaves the current value in place.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArticleUpdate {
  pub title:   Option<String>,
  pub summary: Option<String>,
  pub content: Option<String>,
}

impl ArticleUpdate {
  pub fn apply_to(self, article: &mut FundArticle) {
    if let Some(title) = self.title {
      article.title = title;
    }
    if let Some(summary) = self.summary {
      article.summary = summary;
    }
    if let Some(content) = self.content {
      article.content = content;
    }
  }
}

/// Parameters for [`crate::store::FundStore::list_articles`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleQuery {
  /// Restrict to articles of one fund.
  pub fund_id: Option<Uuid>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}
