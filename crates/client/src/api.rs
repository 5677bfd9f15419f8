//! REST client for the knowledge-base articles endpoints.
//!
//! Wraps the articles API (feed listing, single-article lookup, create,
//! update, delete, publish toggles) using [`reqwest`], plus the login call
//! that opens a session and the audience lookup lists the editor picks
//! rule options from. Filter state and audience selections are turned into
//! wire form by `kb_core` before they get here.

use kb_core::article::{validate_draft, ArticleDraft};
use kb_core::error::CoreError;
use kb_core::filters::{build_articles_query, ArticlesQuery, BuildParamsInput};
use kb_core::options::RuleOption;
use kb_core::types::DbId;
use reqwest::{Method, RequestBuilder, StatusCode};
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::models::{
    Article, ArticleList, ArticleMutation, LoginRequest, LoginResponse, LookupItem, SessionUser,
};

/// Collection path for create; the backend routes it with a trailing slash.
const ARTICLES_COLLECTION: &str = "/api/articles/";

const LOGIN_PATH: &str = "/api/auth/login";

/// Prefix of the audience lookup lists.
const LOOKUPS_PREFIX: &str = "/api/categories";

/// HTTP client for a single knowledge-base backend.
pub struct ArticlesApi {
    client: reqwest::Client,
    api_url: String,
    token: RwLock<Option<String>>,
}

/// Errors from the articles API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered 401. The stored token has been dropped.
    #[error("Session ended: {0}")]
    Unauthorized(String),

    /// A domain error: rejected draft, missing article, or forbidden action.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Any other non-2xx status.
    #[error("Articles API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The body's `error` field, or the raw body.
        message: String,
        /// The body's `details` field, when present.
        details: Option<String>,
    },
}

impl ArticlesApi {
    /// Create a client from configuration, applying its timeout and token.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            token: RwLock::new(config.token.clone()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// List articles for an already built query.
    ///
    /// Sends `GET` to the query's endpoint (general listing or student
    /// feed) with its parameter map as the query string.
    pub async fn list_articles(&self, query: &ArticlesQuery) -> Result<ArticleList, ApiError> {
        let pairs = query.to_query_pairs();
        tracing::debug!(
            endpoint = query.endpoint,
            params = pairs.len(),
            "Listing articles"
        );

        let request = self.request(Method::GET, query.endpoint).await.query(&pairs);
        let list: ArticleList = self.parse_response(request, None).await?;

        tracing::debug!(
            returned = list.articles.len(),
            total = list.pagination.total,
            "Articles listed"
        );
        Ok(list)
    }

    /// Build the query for the given filter state and list it.
    pub async fn fetch_feed(&self, input: &BuildParamsInput) -> Result<ArticleList, ApiError> {
        self.list_articles(&build_articles_query(input)).await
    }

    /// Retrieve a single article with its categories, authors and media.
    pub async fn get_article(&self, article_id: DbId) -> Result<Article, ApiError> {
        let request = self
            .request(Method::GET, &article_path(article_id, None))
            .await;
        self.parse_response(request, Some(article_id)).await
    }

    /// Create an article. The draft is validated before anything is sent.
    pub async fn create_article(&self, draft: &ArticleDraft) -> Result<ArticleMutation, ApiError> {
        validate_draft(draft)?;
        let request = self
            .request(Method::POST, ARTICLES_COLLECTION)
            .await
            .json(&draft.normalized());
        let created: ArticleMutation = self.parse_response(request, None).await?;

        tracing::info!(ids = ?created.affected_ids(), "Article created");
        Ok(created)
    }

    /// Replace an article's fields. The draft is validated first.
    pub async fn update_article(
        &self,
        article_id: DbId,
        draft: &ArticleDraft,
    ) -> Result<ArticleMutation, ApiError> {
        validate_draft(draft)?;
        let request = self
            .request(Method::PUT, &article_path(article_id, None))
            .await
            .json(&draft.normalized());
        self.parse_response(request, Some(article_id)).await
    }

    pub async fn delete_article(&self, article_id: DbId) -> Result<ArticleMutation, ApiError> {
        let request = self
            .request(Method::DELETE, &article_path(article_id, None))
            .await;
        self.parse_response(request, Some(article_id)).await
    }

    pub async fn publish_article(&self, article_id: DbId) -> Result<ArticleMutation, ApiError> {
        let request = self
            .request(Method::POST, &article_path(article_id, Some("publish")))
            .await;
        self.parse_response(request, Some(article_id)).await
    }

    pub async fn unpublish_article(&self, article_id: DbId) -> Result<ArticleMutation, ApiError> {
        let request = self
            .request(Method::POST, &article_path(article_id, Some("unpublish")))
            .await;
        self.parse_response(request, Some(article_id)).await
    }

    /// Log in with email and password and keep the returned access token.
    ///
    /// The email is trimmed and lowercased the way the backend stores it.
    /// Bad credentials come back as [`ApiError::Unauthorized`].
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, ApiError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(CoreError::Validation("Email and password are required".into()).into());
        }

        let request = self
            .request(Method::POST, LOGIN_PATH)
            .await
            .json(&LoginRequest {
                email: &email,
                password,
            });
        let session: LoginResponse = self.parse_response(request, None).await?;

        self.set_token(session.access_token).await;
        tracing::info!(user_id = session.user.id, role = %session.user.role, "Logged in");
        Ok(session.user)
    }

    // ---- audience lookups ----

    pub async fn cities(&self) -> Result<Vec<RuleOption>, ApiError> {
        self.lookup("cities", None).await
    }

    pub async fn institution_types(&self) -> Result<Vec<RuleOption>, ApiError> {
        self.lookup("institution-types", None).await
    }

    /// Specialities, optionally narrowed to one institution type.
    pub async fn specialities(
        &self,
        institution_type_id: Option<DbId>,
    ) -> Result<Vec<RuleOption>, ApiError> {
        self.lookup("specialities", institution_type_id).await
    }

    pub async fn education_forms(
        &self,
        institution_type_id: Option<DbId>,
    ) -> Result<Vec<RuleOption>, ApiError> {
        self.lookup("education-forms", institution_type_id).await
    }

    /// Admission years, newest first, labelled by year.
    pub async fn admission_years(
        &self,
        institution_type_id: Option<DbId>,
    ) -> Result<Vec<RuleOption>, ApiError> {
        self.lookup("admission-years", institution_type_id).await
    }

    pub async fn school_classes(
        &self,
        institution_type_id: Option<DbId>,
    ) -> Result<Vec<RuleOption>, ApiError> {
        self.lookup("school-classes", institution_type_id).await
    }

    /// Course numbers `1..=max` as options. The backend defaults `max` to 4.
    pub async fn courses(&self, max: Option<u32>) -> Result<Vec<RuleOption>, ApiError> {
        let mut request = self
            .request(Method::GET, &format!("{LOOKUPS_PREFIX}/courses"))
            .await;
        if let Some(max) = max {
            request = request.query(&[("max", max)]);
        }
        let courses: Vec<DbId> = self.parse_response(request, None).await?;
        Ok(courses
            .into_iter()
            .map(|course| RuleOption::new(course, course.to_string()))
            .collect())
    }

    // ---- private helpers ----

    async fn lookup(
        &self,
        list: &str,
        institution_type_id: Option<DbId>,
    ) -> Result<Vec<RuleOption>, ApiError> {
        let mut request = self
            .request(Method::GET, &format!("{LOOKUPS_PREFIX}/{list}"))
            .await;
        if let Some(id) = institution_type_id {
            request = request.query(&[("institution_type_id", id)]);
        }
        let items: Vec<LookupItem> = self.parse_response(request, None).await?;
        tracing::debug!(list, returned = items.len(), "Lookup loaded");
        Ok(items.into_iter().map(RuleOption::from).collect())
    }

    /// Resolve an API path against the base URL.
    ///
    /// When the base already ends in `/api`, the path's own `/api` prefix
    /// is dropped so requests never hit `/api/api/...`.
    fn url(&self, path: &str) -> String {
        let base_has_api = self.api_url.to_ascii_lowercase().ends_with("/api")
            || self.api_url.eq_ignore_ascii_case("api");
        if base_has_api {
            format!("{}{}", self.api_url, strip_api_prefix(path))
        } else {
            format!("{}{}", self.api_url, path)
        }
    }

    /// Start a request, attaching the bearer token when one is held.
    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!(method = %method, url = %url, "Sending request");

        let builder = self.client.request(method, url);
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send the request and map a non-2xx status to an [`ApiError`].
    ///
    /// A 401 also drops the stored token, ending the session.
    async fn send(
        &self,
        request: RequestBuilder,
        article_id: Option<DbId>,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let (message, details) = error_message(&body, status);

        match (status, article_id) {
            (StatusCode::UNAUTHORIZED, _) => {
                self.clear_token().await;
                tracing::warn!(error = %message, "Session ended (401), token cleared");
                Err(ApiError::Unauthorized(message))
            }
            (StatusCode::FORBIDDEN, _) => Err(CoreError::Forbidden(message).into()),
            (StatusCode::NOT_FOUND, Some(id)) => Err(CoreError::NotFound {
                entity: "Article",
                id,
            }
            .into()),
            _ => {
                tracing::warn!(status = status.as_u16(), error = %message, "Articles API error");
                Err(ApiError::Api {
                    status: status.as_u16(),
                    message,
                    details,
                })
            }
        }
    }

    /// Send the request and parse a successful JSON body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        article_id: Option<DbId>,
    ) -> Result<T, ApiError> {
        let response = self.send(request, article_id).await?;
        Ok(response.json::<T>().await?)
    }
}

fn article_path(article_id: DbId, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("/api/articles/{article_id}/{action}"),
        None => format!("/api/articles/{article_id}"),
    }
}

/// `/api/articles` -> `/articles`; paths without the prefix pass through.
fn strip_api_prefix(path: &str) -> String {
    let relative = path.strip_prefix('/').unwrap_or(path);
    match relative.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("api/") => {
            format!("/{}", relative[4..].trim_start_matches('/'))
        }
        _ => path.to_string(),
    }
}

/// Pull `error` / `details` out of a JSON error body, falling back to the
/// raw text.
fn error_message(body: &str, status: StatusCode) -> (String, Option<String>) {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let message = field("error").or_else(|| field("message")).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            body.to_string()
        }
    });
    (message, field("details"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> ArticlesApi {
        ArticlesApi::with_client(reqwest::Client::new(), &ClientConfig::new(base))
    }

    #[test]
    fn plain_base_keeps_api_prefix() {
        let api = api("http://localhost:5000/");
        assert_eq!(api.url("/api/articles"), "http://localhost:5000/api/articles");
    }

    #[test]
    fn api_base_drops_duplicate_prefix() {
        let api = api("https://kb.example/api");
        assert_eq!(api.url("/api/articles"), "https://kb.example/api/articles");
        assert_eq!(
            api.url("/api/articles/student-feed"),
            "https://kb.example/api/articles/student-feed"
        );
        assert_eq!(api.url("/health"), "https://kb.example/api/health");
    }

    #[test]
    fn strip_api_prefix_handles_missing_slash_and_repeats() {
        assert_eq!(strip_api_prefix("api/articles"), "/articles");
        assert_eq!(strip_api_prefix("/api//articles"), "/articles");
        assert_eq!(strip_api_prefix("/apis"), "/apis");
    }

    #[test]
    fn article_paths() {
        assert_eq!(article_path(7, None), "/api/articles/7");
        assert_eq!(article_path(7, Some("publish")), "/api/articles/7/publish");
    }

    #[test]
    fn error_message_prefers_json_fields() {
        let (message, details) = error_message(
            r#"{"error":"Failed to create article","details":"db down"}"#,
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_eq!(message, "Failed to create article");
        assert_eq!(details.as_deref(), Some("db down"));
    }

    #[test]
    fn error_message_falls_back_to_raw_body_or_reason() {
        let (message, details) = error_message("gateway timeout", StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(message, "gateway timeout");
        assert_eq!(details, None);

        let (message, _) = error_message("", StatusCode::BAD_GATEWAY);
        assert_eq!(message, "Bad Gateway");
    }
}
