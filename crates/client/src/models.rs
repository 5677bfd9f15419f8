//! Response bodies returned by the articles API.

use kb_core::options::RuleOption;
use kb_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// `GET /api/articles` and `GET /api/articles/student-feed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleList {
    #[serde(default)]
    pub articles: Vec<Article>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: DbId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_for_staff: bool,
    #[serde(default)]
    pub is_actual: bool,
    pub archive_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
    #[serde(default)]
    pub categories: Vec<ArticleCategory>,
    #[serde(default)]
    pub authors: Vec<ArticleAuthor>,
    #[serde(default)]
    pub media: Vec<ArticleMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleCategory {
    pub id: DbId,
    pub top_category: Option<NamedRef>,
    pub subcategory: Option<NamedRef>,
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: DbId,
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: DbId,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleAuthor {
    pub id: DbId,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMedia {
    pub id: DbId,
    pub media_type: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
    pub position: Option<i32>,
}

/// Acknowledgement returned by create, update, delete and (un)publish.
///
/// A create with a rule-based scope fans out into one article per rule and
/// reports all of them in `ids`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleMutation {
    pub id: Option<DbId>,
    #[serde(default)]
    pub ids: Vec<DbId>,
    pub title: Option<String>,
    pub message: Option<String>,
}

impl ArticleMutation {
    /// Every article id touched, single or fanned out.
    pub fn affected_ids(&self) -> Vec<DbId> {
        if self.ids.is_empty() {
            self.id.into_iter().collect()
        } else {
            self.ids.clone()
        }
    }
}

/// `POST /api/auth/login` request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /api/auth/login` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: DbId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: String,
}

/// One entry of an audience lookup list (`/api/categories/...`).
///
/// The lookups share an `id` but differ in what names them: cities,
/// institution types, education forms and school classes carry `name`,
/// specialities add a `code`, admission years carry `year`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub id: DbId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub institution_type_id: Option<DbId>,
}

impl LookupItem {
    /// Display label: `code name` for specialities, `name` for most lists,
    /// the year for admission years, the id as a last resort.
    pub fn label(&self) -> String {
        match (&self.code, &self.name, self.year) {
            (Some(code), Some(name), _) if !code.is_empty() => format!("{code} {name}"),
            (_, Some(name), _) => name.clone(),
            (_, None, Some(year)) => year.to_string(),
            _ => self.id.to_string(),
        }
    }
}

impl From<LookupItem> for RuleOption {
    fn from(item: LookupItem) -> Self {
        RuleOption::new(item.id, item.label())
    }
}
