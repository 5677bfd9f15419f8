//! Article feed query building.
//!
//! Maps the filter state of an article listing (search box, quick audience
//! toggles, advanced multi-selects, student context) to the endpoint and
//! flat parameter map the articles API expects. No validation happens here:
//! malformed numeric input is passed through as `NaN` and left for the
//! backend to reject.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::options::{unwrap_values, OptionValue};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Endpoints & defaults
// ---------------------------------------------------------------------------

/// General article listing.
pub const ARTICLES_ENDPOINT: &str = "/api/articles";

/// Listing pre-scoped to the requesting student's group.
pub const STUDENT_FEED_ENDPOINT: &str = "/api/articles/student-feed";

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;
pub const DEFAULT_SORT_BY: &str = "created_at";
pub const DEFAULT_SORT_DIR: &str = "desc";

// ---------------------------------------------------------------------------
// Parameter values
// ---------------------------------------------------------------------------

/// A single scalar in the query parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Numeric coercion of an id-like string.
    ///
    /// Surrounding whitespace is ignored and an empty string coerces to `0`.
    /// Anything that is not a finite number becomes `Float(NaN)`.
    pub fn numeric(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ParamValue::Int(0);
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return ParamValue::Int(n);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => ParamValue::Float(f),
            _ => ParamValue::Float(f64::NAN),
        }
    }

    /// `true` when numeric coercion failed.
    pub fn is_nan(&self) -> bool {
        matches!(self, ParamValue::Float(f) if f.is_nan())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(x) if x.is_nan() => f.write_str("NaN"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Insertion-ordered parameter map.
pub type QueryParams = IndexMap<String, ParamValue>;

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Which slice of the feed a student is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedView {
    Common,
    City,
}

impl FeedView {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedView::Common => "common",
            FeedView::City => "city",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "common" => Some(FeedView::Common),
            "city" => Some(FeedView::City),
            _ => None,
        }
    }
}

/// Coarse audience toggles. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickFilters {
    pub city: Option<String>,
    pub group: Option<String>,
    pub view: Option<FeedView>,
}

/// Advanced multi-select filters. An empty list is the same as no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiFilters {
    pub institution_type_ids: Vec<DbId>,
    pub education_form_ids: Vec<DbId>,
    pub speciality_ids: Vec<DbId>,
    pub city_ids: Vec<DbId>,
    pub admission_year_ids: Vec<DbId>,
}

impl MultiFilters {
    /// Parameter names paired with their selections, in wire order.
    pub fn named_lists(&self) -> [(&'static str, &[DbId]); 5] {
        [
            ("institution_type_ids", self.institution_type_ids.as_slice()),
            ("education_form_ids", self.education_form_ids.as_slice()),
            ("speciality_ids", self.speciality_ids.as_slice()),
            ("city_ids", self.city_ids.as_slice()),
            ("admission_year_ids", self.admission_year_ids.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.named_lists().iter().all(|(_, ids)| ids.is_empty())
    }
}

/// Everything the article listing knows when it dispatches a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParamsInput {
    pub search: Option<String>,
    pub quick: Option<QuickFilters>,
    pub multi: Option<MultiFilters>,
    /// Passthrough parameters. Override defaults, lose to explicit filters.
    pub extra: QueryParams,
    pub is_student: bool,
    pub group_id: Option<String>,
}

/// Endpoint plus fully assembled parameter map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticlesQuery {
    pub endpoint: &'static str,
    pub params: QueryParams,
}

impl ArticlesQuery {
    /// Render the parameter map as string pairs for a query string.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    pub fn is_student_feed(&self) -> bool {
        self.endpoint == STUDENT_FEED_ENDPOINT
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Expand a list into `name[0]`, `name[1]`, ... in selection order.
fn push_indexed<T: OptionValue>(params: &mut QueryParams, name: &str, values: &[T]) {
    for (i, id) in unwrap_values(values).into_iter().enumerate() {
        params.insert(format!("{name}[{i}]"), ParamValue::Int(id));
    }
}

/// Whether any filter is set that the student feed cannot honor.
pub fn has_advanced_filters(quick: Option<&QuickFilters>, multi: Option<&MultiFilters>) -> bool {
    let quick_advanced =
        quick.is_some_and(|q| q.view.is_some() || non_empty(&q.city).is_some());
    let multi_advanced = multi.is_some_and(|m| !m.is_empty());
    quick_advanced || multi_advanced
}

/// Build the article listing query for the given filter state.
///
/// Parameters are merged in a fixed order, later steps overwriting earlier
/// ones on key collision:
///
/// 1. defaults (`page`, `per_page`, `sort_by`, `sort_dir`);
/// 2. `extra` passthrough parameters;
/// 3. explicit search, quick and multi filters.
///
/// The student feed is chosen only for a student with a group and no
/// advanced filter; everything else goes to the general listing.
///
/// # Examples
///
/// ```
/// use kb_core::filters::{build_articles_query, BuildParamsInput, ParamValue, ARTICLES_ENDPOINT};
///
/// let query = build_articles_query(&BuildParamsInput {
///     search: Some("abc".into()),
///     ..Default::default()
/// });
/// assert_eq!(query.endpoint, ARTICLES_ENDPOINT);
/// assert_eq!(query.params["search"], ParamValue::from("abc"));
/// ```
pub fn build_articles_query(input: &BuildParamsInput) -> ArticlesQuery {
    let mut params = QueryParams::new();
    params.insert("page".into(), DEFAULT_PAGE.into());
    params.insert("per_page".into(), DEFAULT_PER_PAGE.into());
    params.insert("sort_by".into(), DEFAULT_SORT_BY.into());
    params.insert("sort_dir".into(), DEFAULT_SORT_DIR.into());

    for (key, value) in &input.extra {
        params.insert(key.clone(), value.clone());
    }

    if let Some(search) = non_empty(&input.search) {
        params.insert("search".into(), search.into());
    }

    let quick = input.quick.as_ref();
    if let Some(q) = quick {
        if let Some(city) = non_empty(&q.city) {
            params.insert("audience_city_id".into(), ParamValue::numeric(city));
        }
        if let Some(group) = non_empty(&q.group) {
            params.insert("group_id".into(), ParamValue::numeric(group));
        }
        if let Some(view) = q.view {
            params.insert("view".into(), view.as_str().into());
        }
    }

    let multi = input.multi.as_ref();
    if let Some(m) = multi {
        for (name, ids) in m.named_lists() {
            push_indexed(&mut params, name, ids);
        }
    }

    let student_feed = input.is_student
        && non_empty(&input.group_id).is_some()
        && !has_advanced_filters(quick, multi);

    ArticlesQuery {
        endpoint: if student_feed {
            STUDENT_FEED_ENDPOINT
        } else {
            ARTICLES_ENDPOINT
        },
        params,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
