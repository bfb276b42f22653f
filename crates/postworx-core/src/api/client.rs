//! API client for the Teamworx scheduling service.
//!
//! The service authenticates with a form post and hands back session
//! cookies; every later request replays those cookies.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionData;
use crate::models::{CoworkerApiItem, CoworkerRecord, ShiftId, ShiftRecord};
use crate::sync::ScheduleSource;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const AUTH_PATH: &str = "/json/a/account/authorization";
const SCHEDULE_PATH: &str = "/json/e/schedule/get/forDateRange";
const COWORKERS_PATH: &str = "/json/e/schedule/shift/coworkers";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    result: ScheduleResult,
}

#[derive(Debug, Deserialize)]
struct ScheduleResult {
    #[serde(default)]
    shifts: Vec<ShiftRecord>,
}

#[derive(Debug, Deserialize)]
struct CoworkersResponse {
    data: CoworkersData,
}

#[derive(Debug, Deserialize)]
struct CoworkersData {
    #[serde(default)]
    shifts: Vec<CoworkerApiItem>,
}

/// API client for a Teamworx site.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    cookie: Option<String>,
}

impl ApiClient {
    /// Create a client for `host` (`acme.ct-teamworx.com`; an explicit
    /// `http://` or `https://` prefix is kept as-is).
    pub fn new(host: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(host),
            cookie: None,
        })
    }

    /// Create a new ApiClient using `session`, sharing the connection pool.
    pub fn with_session(&self, session: &SessionData) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            cookie: Some(session.cookie.clone()),
        }
    }

    /// Site root requests are sent to, e.g. `https://acme.ct-teamworx.com`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sign in and return the session cookies.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<SessionData> {
        let response = self
            .client
            .post(self.url(AUTH_PATH))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send authentication request")?;

        let response = Self::check_response(response).await?;
        let cookie = session_cookie(response.headers()).ok_or_else(|| {
            ApiError::Malformed("authentication returned no session cookie".to_string())
        })?;
        debug!("Authenticated");

        Ok(SessionData {
            cookie,
            host: self.base_url.clone(),
            username: username.to_string(),
            created_at: Utc::now(),
        })
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let cookie = self.cookie.as_deref().ok_or(ApiError::NoSession)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(header::COOKIE, header::HeaderValue::from_str(cookie)?);
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .map_err(ApiError::from)
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited { attempts: retries }.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn post_form<T: DeserializeOwned, F: Serialize + ?Sized>(&self, path: &str, form: &F) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(&url)
                .headers(self.auth_headers()?)
                .form(form)
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send POST request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .map_err(ApiError::from)
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited { attempts: retries }.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }
}

impl ScheduleSource for ApiClient {
    /// Fetch the user's shifts between `start` and `end` (inclusive)
    async fn fetch_schedule(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ShiftRecord>> {
        let start = start.format(DATE_FORMAT).to_string();
        let end = end.format(DATE_FORMAT).to_string();
        let response: ScheduleResponse = self
            .post_form(SCHEDULE_PATH, &[("startDate", start.as_str()), ("endDate", end.as_str())])
            .await?;
        Ok(response.result.shifts)
    }

    /// Fetch everyone working during a shift
    async fn fetch_coworkers(
        &self,
        shift_id: &ShiftId,
        labor_date: NaiveDate,
    ) -> Result<Vec<CoworkerRecord>> {
        let labor_date = labor_date.format(DATE_FORMAT).to_string();
        let response: CoworkersResponse = self
            .get(
                COWORKERS_PATH,
                &[("shiftId", shift_id.as_str()), ("laborDate", labor_date.as_str())],
            )
            .await?;
        debug!(shift_id = %shift_id, count = response.data.shifts.len(), "Coworkers fetched");
        Ok(response.data.shifts.iter().map(CoworkerApiItem::to_coworker).collect())
    }
}

fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Collapse all `Set-Cookie` headers into a single `Cookie` header value.
fn session_cookie(headers: &header::HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("acme.ct-teamworx.com"), "https://acme.ct-teamworx.com");
        assert_eq!(normalize_base_url("http://localhost:8080/"), "http://localhost:8080");
    }

    #[test]
    fn test_session_cookie_from_set_cookie_headers() {
        let mut headers = header::HeaderMap::new();
        headers.append(
            header::SET_COOKIE,
            header::HeaderValue::from_static("TSID1=abc123; Path=/; HttpOnly"),
        );
        headers.append(header::SET_COOKIE, header::HeaderValue::from_static("lang=en"));
        assert_eq!(session_cookie(&headers).as_deref(), Some("TSID1=abc123; lang=en"));

        assert_eq!(session_cookie(&header::HeaderMap::new()), None);
    }

    #[test]
    fn test_requests_need_a_session() {
        let client = ApiClient::new("acme.ct-teamworx.com").unwrap();
        assert!(client.auth_headers().is_err());

        let session = SessionData {
            cookie: "TSID1=abc".to_string(),
            host: "https://acme.ct-teamworx.com".to_string(),
            username: "me".to_string(),
            created_at: Utc::now(),
        };
        let headers = client.with_session(&session).auth_headers().unwrap();
        assert_eq!(headers.get(header::COOKIE).unwrap().to_str().unwrap(), "TSID1=abc");
    }

    #[test]
    fn test_parse_schedule_response() {
        let json = r#"{"result":{"shifts":[{"laborDate":"2026-10-16","positionName":"Cook","inTimeText":"9:00 AM","outTimeText":"5:00 PM","hours":8.0,"scheduleShiftId":42,"locationName":"Store_1","extra":"ignored"}]}}"#;
        let parsed: ScheduleResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.result.shifts.len(), 1);
        assert_eq!(parsed.result.shifts[0].shift_id.as_str(), "42");
    }

    #[test]
    fn test_parse_coworkers_response() {
        let json = r#"{"data":{"shifts":[{"employeeName":"Ann","positionName":"Cashier","stationName":"Drive Thru","inTimeText":"9:00 AM","outTimeText":null}]}}"#;
        let parsed: CoworkersResponse = serde_json::from_str(json).unwrap();
        let coworker = parsed.data.shifts[0].to_coworker();
        assert_eq!(coworker.position_name, "Cashier: Drive Thru");
        assert_eq!(coworker.out_time, None);
    }
}
