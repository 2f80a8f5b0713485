use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::error::BackendError;
use crate::config::BackendConfig;

/// A filtered, ordered read of one table through the REST layer.
///
/// Renders to the `select=..&col=eq.value&order=col.asc` query-string
/// convention of the hosted backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    table: String,
    select: String,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl TableQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        // Embedded-resource selects are written across lines for readability
        self.select = columns.split_whitespace().collect::<Vec<_>>().join("");
        self
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn neq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("neq.{}", value)));
        self
    }

    pub fn gte(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), format!("gte.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.clone())];
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(n) = self.limit {
            pairs.push(("limit".to_string(), n.to_string()));
        }
        pairs
    }
}

/// Authenticated client for the hosted backend's REST and auth endpoints
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

/// Create a backend client. Without an access token requests run with the
/// anonymous key, which row-level security limits to public reads.
pub fn create_client(config: &BackendConfig, access_token: Option<String>) -> Result<BackendClient> {
    let http = Client::builder()
        .user_agent(concat!("y-ultimate/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(15))
        .build()
        .context("Failed to create HTTP client")?;

    Ok(BackendClient {
        http,
        base_url: config.url.trim_end_matches('/').to_string(),
        anon_key: config.anon_key.clone(),
        access_token,
    })
}

impl BackendClient {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Same client, new token (after login or refresh)
    pub fn with_access_token(&self, token: String) -> Self {
        Self {
            access_token: Some(token),
            ..self.clone()
        }
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn url_with_params(&self, base: &str, pairs: &[(String, String)]) -> Result<Url> {
        Url::parse_with_params(base, pairs)
            .with_context(|| format!("Invalid backend URL: {}", base))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Read rows matching the query. Retried on transient failures.
    pub async fn select<T: DeserializeOwned>(&self, query: &TableQuery) -> Result<Vec<T>> {
        let url = self.url_with_params(&self.rest_url(query.table()), &query.to_query_pairs())?;

        RetryIf::spawn(
            retry_strategy(),
            || async {
                let req = self.request(Method::GET, url.clone());
                send_json::<Vec<T>>(req).await
            },
            is_transient,
        )
        .await
        .with_context(|| format!("Failed to read {}", query.table()))
    }

    /// Insert rows and return them as stored. Never retried.
    pub async fn insert<B, T>(&self, table: &str, rows: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_with_params(&self.rest_url(table), &[("select".to_string(), "*".to_string())])?;
        let req = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(rows);
        send_json(req)
            .await
            .with_context(|| format!("Failed to insert into {}", table))
    }

    /// Apply an absolute patch to every row matching the query's filters.
    /// Patches are idempotent, so transient failures are retried.
    pub async fn update<B, T>(&self, query: &TableQuery, patch: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_with_params(&self.rest_url(query.table()), &query.to_query_pairs())?;

        RetryIf::spawn(
            retry_strategy(),
            || async {
                let req = self
                    .request(Method::PATCH, url.clone())
                    .header("Prefer", "return=representation")
                    .json(patch);
                send_json::<Vec<T>>(req).await
            },
            is_transient,
        )
        .await
        .with_context(|| format!("Failed to update {}", query.table()))
    }

    /// Insert-or-merge on the given conflict columns
    pub async fn upsert<B>(&self, table: &str, rows: &B, on_conflict: &str) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_with_params(
            &self.rest_url(table),
            &[("on_conflict".to_string(), on_conflict.to_string())],
        )?;
        let req = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        send_empty(req)
            .await
            .with_context(|| format!("Failed to upsert into {}", table))
    }

    /// GET an auth endpoint with the current token (`user`)
    pub async fn get_auth<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url_with_params(&self.auth_url(path), &[])?;
        send_json(self.request(Method::GET, url)).await
    }

    /// POST to an auth endpoint (`token?grant_type=..`, `signup`)
    pub async fn post_auth<B, T>(&self, path: &str, grant_type: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let pairs: Vec<(String, String)> = grant_type
            .map(|g| vec![("grant_type".to_string(), g.to_string())])
            .unwrap_or_default();
        let url = self.url_with_params(&self.auth_url(path), &pairs)?;
        let req = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(body);
        send_json(req).await
    }
}

fn retry_strategy() -> impl Iterator<Item = Duration> {
    // Exponential backoff with 3 attempts
    ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(5))
        .take(3)
}

/// Network failures and 5xx responses are worth retrying; everything the
/// backend rejected on purpose is not.
fn is_transient(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<BackendError>() {
        Some(BackendError::Api { status, .. }) => *status >= 500,
        Some(_) => false,
        None => true,
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let response = req.send().await.context("Failed to reach backend")?;
    let status = response.status();
    let body = response.text().await.context("Failed to read backend response")?;

    if !status.is_success() {
        return Err(BackendError::from_response(status.as_u16(), &body).into());
    }

    serde_json::from_str(&body).context("Failed to parse backend response")
}

async fn send_empty(req: RequestBuilder) -> Result<()> {
    let response = req.send().await.context("Failed to reach backend")?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::from_response(status.as_u16(), &body).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BackendConfig {
        BackendConfig {
            url: "https://project.example.co/".to_string(),
            anon_key: "anon".to_string(),
        }
    }

    #[test]
    fn test_default_query_selects_everything() {
        let q = TableQuery::new("teams");
        assert_eq!(q.to_query_pairs(), vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn test_query_pairs_with_filters_and_order() {
        let q = TableQuery::new("matches")
            .eq("tournament_id", "t1")
            .neq("status", "upcoming")
            .order("scheduled_time", true)
            .order("field", false)
            .limit(50);
        let pairs = q.to_query_pairs();
        assert_eq!(pairs[1], ("tournament_id".to_string(), "eq.t1".to_string()));
        assert_eq!(pairs[2], ("status".to_string(), "neq.upcoming".to_string()));
        assert_eq!(pairs[3], ("order".to_string(), "scheduled_time.asc,field.desc".to_string()));
        assert_eq!(pairs[4], ("limit".to_string(), "50".to_string()));
    }

    #[test]
    fn test_multiline_select_is_compacted() {
        let q = TableQuery::new("matches").select(
            "*,
             team_a:teams!matches_team_a_id_fkey(id, name)",
        );
        assert_eq!(
            q.to_query_pairs()[0].1,
            "*,team_a:teams!matches_team_a_id_fkey(id,name)"
        );
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = create_client(&test_config(), None).unwrap();
        assert_eq!(client.rest_url("teams"), "https://project.example.co/rest/v1/teams");
        assert_eq!(
            client.auth_url("/token"),
            "https://project.example.co/auth/v1/token"
        );
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_query_is_percent_encoded() {
        let client = create_client(&test_config(), None).unwrap();
        let q = TableQuery::new("teams").eq("name", "Hucks & Co");
        let url = client
            .url_with_params(&client.rest_url(q.table()), &q.to_query_pairs())
            .unwrap();
        assert!(url.as_str().contains("name=eq.Hucks+%26+Co"));
    }

    #[test]
    fn test_with_access_token() {
        let client = create_client(&test_config(), None).unwrap();
        let authed = client.with_access_token("jwt".to_string());
        assert!(authed.is_authenticated());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_transient_classification() {
        let server: anyhow::Error = BackendError::Api {
            status: 503,
            message: "unavailable".to_string(),
        }
        .into();
        assert!(is_transient(&server));

        let auth: anyhow::Error = BackendError::Unauthorized("JWT expired".to_string()).into();
        assert!(!is_transient(&auth));

        let bad_request: anyhow::Error = BackendError::Api {
            status: 400,
            message: "bad".to_string(),
        }
        .into();
        assert!(!is_transient(&bad_request));

        let network = anyhow::anyhow!("connection reset");
        assert!(is_transient(&network));
    }
}
