//! `reqwest` implementation of [`EventApi`].

use crate::api::EventApi;
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    Event, EventId, JoinRequest, Province, Rating, RatingAverage, RatingSubmission, Region,
    UserRatingStatus, MAX_SCORE, MIN_SCORE,
};
use heritage_auth::{SessionProvider, UserId};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Catalog API client over HTTP.
///
/// Sends `Authorization: Bearer <token>` whenever the session provider has a
/// token. Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct HttpEventApi {
    client: Client,
    config: ApiConfig,
    session: Arc<dyn SessionProvider>,
}

impl HttpEventApi {
    /// Create a client with a fresh connection pool.
    #[must_use]
    pub fn new(config: ApiConfig, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_client(Client::new(), config, session)
    }

    /// Create a client over an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: Client, config: ApiConfig, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            client,
            config,
            session,
        }
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self
            .config
            .base_url()
            .join(path)
            .map_err(|e| ApiError::Validation(format!("invalid request path {path}: {e}")))?;

        let builder = self.client.request(method, url);
        Ok(match self.session.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn execute(request: RequestBuilder) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), error = %error, "Request failed");
        Err(error)
    }

    async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
        let response = Self::execute(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_unit(request: RequestBuilder) -> ApiResult<()> {
        Self::execute(request).await.map(|_| ())
    }
}

impl fmt::Debug for HttpEventApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEventApi")
            .field("base_url", &self.config.base_url().as_str())
            .field("authenticated", &self.session.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl EventApi for HttpEventApi {
    fn fetch_event(&self, event_id: EventId) -> impl std::future::Future<Output = ApiResult<Event>> + Send {
        async move {
            let request = self.request(Method::GET, &format!("events/{event_id}"))?;
            Self::fetch_json(request).await
        }
        .instrument(tracing::debug_span!("fetch_event", %event_id))
    }

    fn fetch_ratings(
        &self,
        event_id: EventId,
    ) -> impl std::future::Future<Output = ApiResult<Vec<Rating>>> + Send {
        async move {
            let request = self.request(Method::GET, &format!("events/{event_id}/ratings"))?;
            Self::fetch_json(request).await
        }
        .instrument(tracing::debug_span!("fetch_ratings", %event_id))
    }

    fn fetch_average(
        &self,
        event_id: EventId,
    ) -> impl std::future::Future<Output = ApiResult<RatingAverage>> + Send {
        async move {
            let request =
                self.request(Method::GET, &format!("events/{event_id}/ratings/average"))?;
            Self::fetch_json(request).await
        }
        .instrument(tracing::debug_span!("fetch_average", %event_id))
    }

    fn fetch_user_status(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> impl std::future::Future<Output = ApiResult<UserRatingStatus>> + Send {
        async move {
            let request = self.request(
                Method::GET,
                &format!("users/{user_id}/events/{event_id}/rating-status"),
            )?;
            match Self::fetch_json(request).await {
                // No participation record yet
                Err(ApiError::NotFound) => Ok(UserRatingStatus::default()),
                other => other,
            }
        }
        .instrument(tracing::debug_span!("fetch_user_status", %user_id, %event_id))
    }

    fn join(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = ApiResult<()>> + Send {
        async move {
            let request = self
                .request(Method::POST, &format!("events/{event_id}/participants"))?
                .json(&JoinRequest { user_id });
            Self::fetch_unit(request).await
        }
        .instrument(tracing::debug_span!("join", %event_id, %user_id))
    }

    fn leave(&self, event_id: EventId) -> impl std::future::Future<Output = ApiResult<()>> + Send {
        async move {
            let request =
                self.request(Method::DELETE, &format!("events/{event_id}/participants/me"))?;
            Self::fetch_unit(request).await
        }
        .instrument(tracing::debug_span!("leave", %event_id))
    }

    fn submit_rating(
        &self,
        event_id: EventId,
        user_id: UserId,
        score: u8,
        comment: String,
    ) -> impl std::future::Future<Output = ApiResult<()>> + Send {
        async move {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(ApiError::Validation(format!(
                    "score must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
                )));
            }

            let request = self
                .request(Method::POST, &format!("events/{event_id}/ratings"))?
                .json(&RatingSubmission {
                    user_id,
                    rating: score,
                    comment,
                });
            Self::fetch_unit(request).await
        }
        .instrument(tracing::debug_span!("submit_rating", %event_id, %user_id, score))
    }

    fn fetch_regions(&self) -> impl std::future::Future<Output = ApiResult<Vec<Region>>> + Send {
        async move {
            let request = self.request(Method::GET, "regions")?;
            Self::fetch_json(request).await
        }
        .instrument(tracing::debug_span!("fetch_regions"))
    }

    fn fetch_provinces(
        &self,
    ) -> impl std::future::Future<Output = ApiResult<Vec<Province>>> + Send {
        async move {
            let request = self.request(Method::GET, "provinces")?;
            Self::fetch_json(request).await
        }
        .instrument(tracing::debug_span!("fetch_provinces"))
    }
}
