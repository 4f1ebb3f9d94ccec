use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TrafficError};
use crate::model::{DailySample, Repository};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

#[derive(Clone)]
pub enum Auth {
    Token(String),
    Basic { user: String, password: String },
}

/// Client for the GitHub repository traffic API. Cheap to clone; clones
/// share the underlying connection pool.
#[derive(Clone)]
pub struct TrafficClient {
    http: reqwest::Client,
    base: String,
    auth: Auth,
}

/// All-time totals plus raw per-day samples for one metric, as served
/// by the API. Samples may have gaps; callers densify them onto the
/// report window.
#[derive(Debug, Clone)]
pub struct TrafficTotals {
    pub uniques: u64,
    pub count: u64,
    pub samples: Vec<DailySample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopReferrer {
    pub referrer: String,
    pub count: u64,
    pub uniques: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopPath {
    pub path: String,
    #[serde(default)]
    pub title: String,
    pub count: u64,
    pub uniques: u64,
}

#[derive(Deserialize)]
struct RawSample {
    timestamp: DateTime<Utc>,
    count: u64,
    uniques: u64,
}

impl From<RawSample> for DailySample {
    fn from(raw: RawSample) -> Self {
        DailySample {
            date: raw.timestamp.date_naive(),
            uniques: raw.uniques,
            count: raw.count,
        }
    }
}

#[derive(Deserialize)]
struct ViewsResponse {
    count: u64,
    uniques: u64,
    #[serde(default)]
    views: Vec<RawSample>,
}

#[derive(Deserialize)]
struct ClonesResponse {
    count: u64,
    uniques: u64,
    #[serde(default)]
    clones: Vec<RawSample>,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

impl TrafficClient {
    pub fn new(base_url: &str, auth: Auth) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ghtraffic/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Repositories visible to the authenticated identity, in API order,
    /// permission flags included.
    pub async fn viewer_repos(&self) -> Result<Vec<Repository>> {
        let mut repos = Vec::new();
        let mut page = 1usize;

        loop {
            let path = format!("/user/repos?per_page={PER_PAGE}&page={page}");
            let batch: Vec<Repository> = self.get(&path).await?.json().await?;
            let short_page = batch.len() < PER_PAGE;
            repos.extend(batch);
            if short_page {
                break;
            }
            page += 1;
        }

        debug!(count = repos.len(), "fetched repository list");
        Ok(repos)
    }

    pub async fn views_traffic(&self, repo: &Repository) -> Result<TrafficTotals> {
        let path = format!("/repos/{}/traffic/views", repo.full_name);
        let resp: ViewsResponse = self.get(&path).await?.json().await?;
        Ok(TrafficTotals {
            uniques: resp.uniques,
            count: resp.count,
            samples: resp.views.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn clones_traffic(&self, repo: &Repository) -> Result<TrafficTotals> {
        let path = format!("/repos/{}/traffic/clones", repo.full_name);
        let resp: ClonesResponse = self.get(&path).await?.json().await?;
        Ok(TrafficTotals {
            uniques: resp.uniques,
            count: resp.count,
            samples: resp.clones.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn top_referrers(&self, repo: &Repository) -> Result<Vec<TopReferrer>> {
        let path = format!("/repos/{}/traffic/popular/referrers", repo.full_name);
        Ok(self.get(&path).await?.json().await?)
    }

    pub async fn top_paths(&self, repo: &Repository) -> Result<Vec<TopPath>> {
        let path = format!("/repos/{}/traffic/popular/paths", repo.full_name);
        Ok(self.get(&path).await?.json().await?)
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base, path);
        debug!(%url, "GET");

        let req = self.http.get(&url);
        let req = match &self.auth {
            Auth::Token(token) => req.bearer_auth(token),
            Auth::Basic { user, password } => req.basic_auth(user, Some(password)),
        };

        check_status(req.send().await?).await
    }
}

/// Map non-success statuses to errors. 429, and 403 carrying a
/// `Retry-After` header, are rate-limit signals; everything else is an
/// ordinary API failure.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let retry_after = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);

    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && retry_after.is_some())
    {
        return Err(TrafficError::RateLimited { retry_after });
    }

    let message = match resp.json::<ApiMessage>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    Err(TrafficError::Api { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo(full_name: &str) -> Repository {
        Repository {
            name: full_name.rsplit('/').next().unwrap().to_string(),
            full_name: full_name.to_string(),
            permissions: Default::default(),
        }
    }

    async fn client(server: &MockServer) -> TrafficClient {
        TrafficClient::new(&server.uri(), Auth::Token("t".into())).unwrap()
    }

    #[tokio::test]
    async fn parses_views_traffic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/traffic/views"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 14,
                "uniques": 3,
                "views": [
                    {"timestamp": "2024-03-14T00:00:00Z", "count": 9, "uniques": 2},
                    {"timestamp": "2024-03-15T00:00:00Z", "count": 5, "uniques": 1}
                ]
            })))
            .mount(&server)
            .await;

        let totals = client(&server)
            .await
            .views_traffic(&repo("octocat/hello"))
            .await
            .unwrap();

        assert_eq!(totals.count, 14);
        assert_eq!(totals.uniques, 3);
        assert_eq!(totals.samples.len(), 2);
        assert_eq!(
            totals.samples[0].date,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
        );
    }

    #[tokio::test]
    async fn paginates_repo_list() {
        let server = MockServer::start().await;
        let full_page: Vec<_> = (0..PER_PAGE)
            .map(|i| json!({"name": format!("r{i}"), "full_name": format!("o/r{i}")}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(full_page)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "last", "full_name": "o/last", "permissions": {"push": true}}
            ])))
            .mount(&server)
            .await;

        let repos = client(&server).await.viewer_repos().await.unwrap();
        assert_eq!(repos.len(), PER_PAGE + 1);
        assert!(repos.last().unwrap().permissions.push);
    }

    #[tokio::test]
    async fn maps_429_to_rate_limited_with_advice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/traffic/views"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .views_traffic(&repo("o/r"))
            .await
            .unwrap_err();

        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn maps_403_with_retry_after_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/traffic/clones"))
            .respond_with(ResponseTemplate::new(403).insert_header("Retry-After", "2"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .clones_traffic(&repo("o/r"))
            .await
            .unwrap_err();

        assert!(matches!(err, TrafficError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn maps_plain_403_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/traffic/views"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "Must have push access"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .views_traffic(&repo("o/r"))
            .await
            .unwrap_err();

        match err {
            TrafficError::Api { status, message } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(message, "Must have push access");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
