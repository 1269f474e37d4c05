//! Microsoft Graph HTTP client with cursor-based pagination.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::{GraphConfig, SyncConfig};
use crate::error::{AppError, AppResult};
use crate::graph::auth::TokenProvider;
use crate::models::ServicePrincipal;

/// Service principal fields requested from the listing endpoint
const SP_SELECT_FIELDS: &str = "id,appId,displayName,accountEnabled,tags,\
appOwnerOrganizationId,publisherName,appRoleAssignmentRequired,createdDateTime,\
preferredSingleSignOnMode,homepage,loginUrl,notes,description,\
notificationEmailAddresses,keyCredentials";

/// Response wrapper for paginated Graph API responses
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    #[serde(default)]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.count")]
    pub count: Option<i64>,
}

/// OData error response from Microsoft Graph
#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    code: String,
    message: String,
}

/// Pagination cursor for the listing stream
enum PageCursor {
    First,
    Next(String),
    Done,
}

/// Authenticated Microsoft Graph client
#[derive(Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    graph_base_url: String,
    sync: SyncConfig,
}

impl GraphClient {
    /// Creates a new Graph client
    pub fn new(graph: GraphConfig, sync: SyncConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let graph_base_url = graph.graph_base_url.trim_end_matches('/').to_string();
        let tokens = TokenProvider::new(graph, http.clone());

        Ok(Self {
            http,
            tokens,
            graph_base_url,
            sync,
        })
    }

    /// Lazily paginated listing of service principals.
    ///
    /// Follows `@odata.nextLink` cursors until the directory is exhausted.
    /// `$top` is a page-size hint only; whatever count the server returns is
    /// passed through. Each call starts a fresh listing from the first page.
    pub fn list_service_principals(
        &self,
    ) -> impl Stream<Item = AppResult<ServicePrincipal>> + '_ {
        stream::try_unfold(PageCursor::First, move |cursor| async move {
            let url = match cursor {
                PageCursor::First => self.service_principals_url()?.to_string(),
                PageCursor::Next(url) => url,
                PageCursor::Done => return Ok::<_, AppError>(None),
            };

            let page: ODataPage<ServicePrincipal> = self.get_json(&url, false).await?;
            log::debug!("Fetched service principal page ({} records)", page.value.len());

            let next = match page.next_link {
                Some(url) => PageCursor::Next(url),
                None => PageCursor::Done,
            };
            Ok(Some((page.value, next)))
        })
        .map_ok(|records| stream::iter(records.into_iter().map(Ok::<_, AppError>)))
        .try_flatten()
    }

    /// Counts successful sign-ins for an application since `window_start`.
    ///
    /// Prefers the server-computed `@odata.count`; when the server omits it,
    /// walks the result pages and sums their lengths instead.
    pub async fn signin_count(
        &self,
        app_id: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<i64> {
        let url = self.signins_url(app_id, window_start)?;

        let first: ODataPage<serde_json::Value> = self.get_json(url.as_str(), true).await?;
        if let Some(count) = first.count {
            return Ok(count);
        }

        let mut total = first.value.len() as i64;
        let mut next = first.next_link;
        while let Some(url) = next {
            let page: ODataPage<serde_json::Value> = self.get_json(&url, true).await?;
            total += page.value.len() as i64;
            next = page.next_link;
        }
        Ok(total)
    }

    fn service_principals_url(&self) -> AppResult<Url> {
        let mut url = Url::parse(&format!("{}/servicePrincipals", self.graph_base_url))?;
        url.query_pairs_mut()
            .append_pair("$select", SP_SELECT_FIELDS)
            .append_pair("$filter", &self.sync.service_principal_filter)
            .append_pair("$top", &self.sync.page_size.to_string());
        Ok(url)
    }

    fn signins_url(&self, app_id: &str, window_start: DateTime<Utc>) -> AppResult<Url> {
        let mut url = Url::parse(&format!("{}/auditLogs/signIns", self.graph_base_url))?;
        let filter = format!(
            "appId eq '{}' and createdDateTime ge {}",
            app_id,
            window_start.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        url.query_pairs_mut()
            .append_pair("$filter", &filter)
            .append_pair("$count", "true")
            .append_pair("$top", &self.sync.page_size.to_string());
        Ok(url)
    }

    /// Performs an authenticated GET, mapping OData error bodies to
    /// structured errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        eventual_consistency: bool,
    ) -> AppResult<T> {
        let token = self.tokens.bearer_token().await?;

        let mut request = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json");

        if eventual_consistency {
            // Required by the sign-in aggregation endpoint for $count support
            request = request.header("ConsistencyLevel", "eventual");
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(odata) = serde_json::from_str::<ODataError>(&body) {
            return Err(AppError::Graph {
                code: odata.error.code,
                message: odata.error.message,
            });
        }

        Err(AppError::Graph {
            code: status.to_string(),
            message: body,
        })
    }
}
