//! Salesforce REST API access.
//!
//! Two call shapes cover everything the export needs: a SOQL query returning a
//! page of rows plus an optional continuation cursor, and an authenticated GET
//! for raw file content. [`QueryClient`] is the seam that keeps the
//! orchestration testable; [`RestClient`] is the production implementation
//! over `reqwest`.

use crate::error::{DownloadError, Error, QueryError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

/// REST API version every request is pinned to.
pub const API_VERSION: &str = "v59.0";

/// One page of a SOQL query result.
///
/// Rows are surfaced as raw JSON object maps; domain types parse themselves
/// out via their `from_record` constructors. A present `next_records_url`
/// means the result set continues and the cursor must be followed.
#[derive(Clone, Debug, Deserialize)]
pub struct QueryPage {
    /// Rows in this page, as returned field mappings
    #[serde(default)]
    pub records: Vec<Map<String, Value>>,
    /// Whether this is the final page
    #[serde(default)]
    pub done: bool,
    /// Continuation cursor for the next page, if any
    #[serde(rename = "nextRecordsUrl")]
    pub next_records_url: Option<String>,
}

/// Abstraction over the remote read and content-fetch APIs, enabling testability.
#[async_trait::async_trait]
pub trait QueryClient: Send + Sync {
    /// Execute a SOQL query and return the first page of results.
    async fn query(&self, soql: &str) -> Result<QueryPage>;

    /// Follow a continuation cursor returned with a prior page.
    async fn query_more(&self, cursor: &str) -> Result<QueryPage>;

    /// Fetch raw file content from an instance-relative path.
    async fn fetch_content(&self, path: &str) -> std::result::Result<Vec<u8>, DownloadError>;
}

/// Production [`QueryClient`] over the Salesforce REST API.
///
/// Holds the instance base URL and the bearer session token obtained from the
/// login flow. The client never refreshes the token; an expired session
/// surfaces as HTTP 401 on the next call.
#[derive(Debug)]
pub struct RestClient {
    http: reqwest::Client,
    instance: Url,
    token: String,
}

impl RestClient {
    /// Create a client for an instance URL and session token.
    ///
    /// Fails if the instance URL does not parse as an absolute URL.
    pub fn new(instance_url: &str, access_token: &str) -> Result<Self> {
        let instance = Url::parse(instance_url).map_err(|e| Error::Config {
            message: format!("invalid instance URL {instance_url}: {e}"),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            instance,
            token: access_token.to_string(),
        })
    }

    /// Resolve an instance-relative path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.instance.join(path).map_err(|e| Error::Config {
            message: format!("invalid API path {path}: {e}"),
        })
    }

    /// GET a query endpoint and parse the page envelope.
    async fn get_page(&self, url: Url) -> Result<QueryPage> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueryError::Rejected {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response
            .json::<QueryPage>()
            .await
            .map_err(|e| QueryError::MalformedResponse { reason: e.to_string() }.into())
    }
}

#[async_trait::async_trait]
impl QueryClient for RestClient {
    async fn query(&self, soql: &str) -> Result<QueryPage> {
        let mut url = self.endpoint(&format!("/services/data/{API_VERSION}/query"))?;
        url.query_pairs_mut().append_pair("q", soql);
        self.get_page(url).await
    }

    async fn query_more(&self, cursor: &str) -> Result<QueryPage> {
        let url = self.endpoint(cursor)?;
        self.get_page(url).await.map_err(|e| {
            Error::Query(QueryError::CursorFailed {
                cursor: cursor.to_string(),
                reason: e.to_string(),
            })
        })
    }

    async fn fetch_content(&self, path: &str) -> std::result::Result<Vec<u8>, DownloadError> {
        let url = self
            .instance
            .join(path)
            .map_err(|e| DownloadError::Transport {
                reason: format!("invalid content path {path}: {e}"),
            })?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DownloadError::Transport { reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Transport { reason: e.to_string() })?;
        Ok(bytes.to_vec())
    }
}

/// Execute a query and drain every continuation cursor, returning all rows.
///
/// The page stream is lazy and non-restartable: a cursor-follow failure
/// propagates immediately and rows gathered so far are discarded with it.
pub async fn query_all(client: &dyn QueryClient, soql: &str) -> Result<Vec<Map<String, Value>>> {
    let mut records = Vec::new();
    let mut page = client.query(soql).await?;
    loop {
        records.append(&mut page.records);
        match page.next_records_url {
            Some(cursor) => {
                tracing::debug!(cursor = %cursor, "Following query continuation cursor");
                page = client.query_more(&cursor).await?;
            }
            None => break,
        }
    }
    Ok(records)
}
