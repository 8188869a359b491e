//! Ranking API client: one classified, retried `fetch` plus typed endpoints.

use crate::budget::RequestBudget;
use crate::config::{ApiConfig, HOST_PLACEHOLDER};
use crate::dto::{
    rank_from_entries, AccountDto, LeagueEntryDto, MatchDto, SummonerDto, RANKED_SOLO_QUEUE_ID,
};
use crate::error::{ApiError, ApiResult, UnavailableCause};
use crate::retry::{RetryPolicy, RetryState};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use rankwatch_core::{Cluster, MatchSummary, PlayerId, RankState, Region, RiotId};
use rankwatch_telemetry::Metrics;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Header identifying a rate limit enforced by the upstream service itself.
const RATE_LIMIT_TYPE_HEADER: &str = "X-Rate-Limit-Type";
const RETRY_AFTER_HEADER: &str = "Retry-After";
const API_KEY_HEADER: &str = "X-Riot-Token";

/// Host an endpoint is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Per-platform host (`na1`, `euw1`, ...).
    Platform(Region),
    /// Regional cluster host (`americas`, ...).
    Regional(Cluster),
}

impl Route {
    pub fn host(&self) -> &'static str {
        match self {
            Route::Platform(region) => region.as_str(),
            Route::Regional(cluster) => cluster.as_str(),
        }
    }
}

/// Upstream endpoint family, used for metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Account,
    Summoner,
    League,
    MatchIds,
    Match,
}

impl Endpoint {
    pub fn label(&self) -> &'static str {
        match self {
            Endpoint::Account => "account",
            Endpoint::Summoner => "summoner",
            Endpoint::League => "league",
            Endpoint::MatchIds => "match_ids",
            Endpoint::Match => "match",
        }
    }
}

/// A fully routed request: endpoint, host and path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub route: Route,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl ApiRequest {
    /// Path segments are percent-encoded when the URL is built.
    pub fn new(endpoint: Endpoint, route: Route, segments: &[&str]) -> Self {
        Self {
            endpoint,
            route,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn account_by_riot_id(cluster: Cluster, riot_id: &RiotId) -> Self {
        Self::new(
            Endpoint::Account,
            Route::Regional(cluster),
            &[
                "riot",
                "account",
                "v1",
                "accounts",
                "by-riot-id",
                riot_id.game_name.as_str(),
                riot_id.tag_line.as_str(),
            ],
        )
    }

    pub fn summoner_by_puuid(region: Region, player: &PlayerId) -> Self {
        Self::new(
            Endpoint::Summoner,
            Route::Platform(region),
            &["lol", "summoner", "v4", "summoners", "by-puuid", player.as_str()],
        )
    }

    pub fn league_entries(region: Region, player: &PlayerId) -> Self {
        Self::new(
            Endpoint::League,
            Route::Platform(region),
            &["lol", "league", "v4", "entries", "by-puuid", player.as_str()],
        )
    }

    pub fn recent_match_ids(cluster: Cluster, player: &PlayerId) -> Self {
        Self::new(
            Endpoint::MatchIds,
            Route::Regional(cluster),
            &["lol", "match", "v5", "matches", "by-puuid", player.as_str(), "ids"],
        )
        .with_query("queue", RANKED_SOLO_QUEUE_ID)
        .with_query("count", 1)
    }

    pub fn match_detail(cluster: Cluster, match_id: &str) -> Self {
        Self::new(
            Endpoint::Match,
            Route::Regional(cluster),
            &["lol", "match", "v5", "matches", match_id],
        )
    }
}

/// Result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(serde_json::Value),
    /// HTTP 404: the caller decides whether this is fatal.
    NotFound,
}

impl FetchOutcome {
    pub fn into_found(self) -> Option<serde_json::Value> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            FetchOutcome::NotFound => None,
        }
    }
}

/// Platform profile of a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summoner {
    pub player_id: PlayerId,
    pub level: u64,
    pub profile_icon_id: i64,
}

/// Classification of one attempt.
enum Attempt {
    Done(FetchOutcome),
    Fail(ApiError),
    Retry {
        delay: Duration,
        reason: &'static str,
        /// Returned if no attempts remain.
        error: ApiError,
    },
}

/// Client for the upstream ranking API.
///
/// Requests are issued one at a time by the caller; the client itself keeps
/// no cache.
pub struct RiotClient {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    host_template: String,
    user_agent: String,
    account_cluster: Cluster,
    policy: RetryPolicy,
    budget: RequestBudget,
}

impl RiotClient {
    /// Create a client backed by `reqwest`.
    pub fn new(api_key: impl Into<String>, config: &ApiConfig) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(Arc::new(transport), api_key, config))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        api_key: impl Into<String>,
        config: &ApiConfig,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            host_template: config.host_template.clone(),
            user_agent: config.user_agent.clone(),
            account_cluster: config.account_cluster,
            policy: config.retry_policy(),
            budget: RequestBudget::new(config.budget_requests, config.budget_window()),
        }
    }

    /// Cluster used for account lookups.
    pub fn account_cluster(&self) -> Cluster {
        self.account_cluster
    }

    pub fn budget(&self) -> &RequestBudget {
        &self.budget
    }

    /// Absolute URL for `request`.
    pub fn url(&self, request: &ApiRequest) -> ApiResult<String> {
        let base = self
            .host_template
            .replace(HOST_PLACEHOLDER, request.route.host());
        let mut url = Url::parse(&base)
            .map_err(|e| ApiError::HttpClient(format!("Invalid base URL {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::HttpClient(format!("Base URL {base} cannot take a path")))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url.into())
    }

    /// Perform one logical call with classification and retries.
    ///
    /// At most `max_attempts` requests are sent. Sleeps happen only between
    /// attempts, so a call that is rate limited on every attempt sleeps
    /// `max_attempts - 1` times before failing with `RateLimitExceeded`.
    pub async fn fetch(&self, request: &ApiRequest) -> ApiResult<FetchOutcome> {
        let url = self.url(request)?;
        let endpoint = request.endpoint.label();
        let mut state = RetryState::new(&self.policy);

        loop {
            let attempt = state.begin_attempt();
            self.budget.acquire().await;
            debug!(endpoint, url = %url, attempt, "Upstream request");

            let result = self.transport.get(self.http_request(&url)).await;
            match self.classify(&url, result, attempt) {
                Attempt::Done(outcome) => {
                    let label = match outcome {
                        FetchOutcome::Found(_) => "ok",
                        FetchOutcome::NotFound => "not_found",
                    };
                    Metrics::api_request(endpoint, label);
                    return Ok(outcome);
                }
                Attempt::Fail(error) => {
                    Metrics::api_request(endpoint, error.kind());
                    warn!(endpoint, url = %url, attempt, error = %error, "Upstream request failed");
                    return Err(error);
                }
                Attempt::Retry {
                    delay,
                    reason,
                    error,
                } => {
                    Metrics::api_request(endpoint, reason);
                    if state.is_exhausted() {
                        warn!(
                            endpoint,
                            url = %url,
                            attempts = state.attempts(),
                            slept_ms = state.total_slept().as_millis() as u64,
                            error = %error,
                            "Upstream retries exhausted"
                        );
                        return Err(error);
                    }
                    let delay = state.schedule(delay);
                    Metrics::api_retry_sleep(reason);
                    warn!(
                        endpoint,
                        url = %url,
                        attempt,
                        reason,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying upstream request"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn http_request(&self, url: &str) -> HttpRequest {
        HttpRequest {
            url: url.to_string(),
            headers: vec![
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), self.user_agent.clone()),
            ],
        }
    }

    fn classify(&self, url: &str, result: ApiResult<HttpResponse>, attempt: u32) -> Attempt {
        let response = match result {
            Ok(response) => response,
            Err(error @ ApiError::Transport(_)) => {
                return Attempt::Retry {
                    delay: self.policy.backoff_delay(attempt),
                    reason: "transport",
                    error,
                }
            }
            Err(error) => return Attempt::Fail(error),
        };

        match response.status {
            200..=299 => match serde_json::from_str(&response.body) {
                Ok(value) => Attempt::Done(FetchOutcome::Found(value)),
                Err(e) => Attempt::Fail(ApiError::Decode(format!("{url}: {e}"))),
            },
            404 => Attempt::Done(FetchOutcome::NotFound),
            429 if response.header(RATE_LIMIT_TYPE_HEADER).is_some() => Attempt::Retry {
                delay: self.policy.retry_after(response.header(RETRY_AFTER_HEADER)),
                reason: "rate_limited",
                error: ApiError::RateLimitExceeded { attempts: attempt },
            },
            429 => Attempt::Fail(ApiError::ServiceUnavailable {
                status: 429,
                cause: UnavailableCause::Intermediary,
            }),
            401 | 403 => Attempt::Fail(ApiError::Auth {
                status: response.status,
            }),
            400 | 500..=599 => Attempt::Fail(ApiError::ServiceUnavailable {
                status: response.status,
                cause: UnavailableCause::Upstream,
            }),
            status => Attempt::Fail(ApiError::UnexpectedStatus {
                status,
                url: url.to_string(),
            }),
        }
    }

    async fn fetch_as<T: DeserializeOwned>(&self, request: &ApiRequest) -> ApiResult<Option<T>> {
        match self.fetch(request).await? {
            FetchOutcome::Found(value) => Ok(Some(serde_json::from_value(value)?)),
            FetchOutcome::NotFound => Ok(None),
        }
    }

    /// Resolve a Riot ID on the account cluster.
    pub async fn account_by_riot_id(&self, riot_id: &RiotId) -> ApiResult<PlayerId> {
        let request = ApiRequest::account_by_riot_id(self.account_cluster, riot_id);
        self.fetch_as::<AccountDto>(&request)
            .await?
            .map(|account| PlayerId::new(account.puuid))
            .ok_or_else(|| ApiError::NotFound(format!("player {riot_id} not found")))
    }

    /// Platform profile; `None` if the player has none on `region`.
    pub async fn summoner_by_puuid(
        &self,
        region: Region,
        player: &PlayerId,
    ) -> ApiResult<Option<Summoner>> {
        let request = ApiRequest::summoner_by_puuid(region, player);
        Ok(self
            .fetch_as::<SummonerDto>(&request)
            .await?
            .map(|dto| Summoner {
                player_id: PlayerId::new(dto.puuid),
                level: dto.summoner_level,
                profile_icon_id: dto.profile_icon_id,
            }))
    }

    /// Current solo-queue ranking; unranked when no solo entry exists.
    pub async fn ranked_state(&self, region: Region, player: &PlayerId) -> ApiResult<RankState> {
        let request = ApiRequest::league_entries(region, player);
        let entries = self
            .fetch_as::<Vec<LeagueEntryDto>>(&request)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no ranked data for {player} on {region}")))?;
        rank_from_entries(&entries)
    }

    /// Most recent ranked solo match of `player`, served by `cluster`.
    pub async fn recent_match(&self, cluster: Cluster, player: &PlayerId) -> ApiResult<MatchSummary> {
        let ids = self
            .fetch_as::<Vec<String>>(&ApiRequest::recent_match_ids(cluster, player))
            .await?
            .unwrap_or_default();
        let Some(match_id) = ids.into_iter().next() else {
            return Err(ApiError::NotFound(format!("no recent matches for {player}")));
        };

        self.fetch_as::<MatchDto>(&ApiRequest::match_detail(cluster, &match_id))
            .await?
            .map(MatchSummary::from)
            .ok_or_else(|| ApiError::NotFound(format!("match {match_id} not found")))
    }
}
