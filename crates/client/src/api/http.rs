//! `reqwest` implementation of [`ReservationApi`].

use async_trait::async_trait;
use lodge_core::ReservationId;
use lodge_reservations::{RawGuest, RawReservation, RawRoom, ReservationDraft, ReservationStatus};
use reqwest::{Method, RequestBuilder};
use serde_json::{Value, json};

use super::{
    CreatedReservation, ReservationApi, body_message, created_from_body, ensure_success,
    guests_from_body, reservations_from_body, rooms_from_body,
};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

/// Talks JSON to the REST backend.
#[derive(Debug, Clone)]
pub struct HttpReservationApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpReservationApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send and decode the JSON body. Non-2xx statuses become
    /// [`ApiError::Http`] carrying the body's `message`; an empty body decodes
    /// as `null`.
    async fn send(&self, req: RequestBuilder) -> ApiResult<Value> {
        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text).ok().as_ref().and_then(body_message);
            tracing::debug!("HTTP {} from reservation API: {}", status.as_u16(), text);
            return Err(ApiError::http(status.as_u16(), message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn send_ack(&self, req: RequestBuilder) -> ApiResult<()> {
        let body = self.send(req).await?;
        ensure_success(&body)
    }
}

#[async_trait]
impl ReservationApi for HttpReservationApi {
    async fn list_reservations(&self) -> ApiResult<Vec<RawReservation>> {
        let body = self.send(self.request(Method::GET, "reservations")).await?;
        reservations_from_body(&body)
    }

    async fn list_guests(&self) -> ApiResult<Vec<RawGuest>> {
        let body = self.send(self.request(Method::GET, "guests")).await?;
        guests_from_body(&body)
    }

    async fn list_rooms(&self) -> ApiResult<Vec<RawRoom>> {
        let body = self.send(self.request(Method::GET, "rooms")).await?;
        rooms_from_body(&body)
    }

    async fn create_reservation(&self, draft: &ReservationDraft) -> ApiResult<CreatedReservation> {
        let body = self
            .send(self.request(Method::POST, "reservations").json(draft))
            .await?;
        created_from_body(&body)
    }

    async fn update_status(&self, id: ReservationId, status: ReservationStatus) -> ApiResult<()> {
        let req = self
            .request(Method::PATCH, &format!("reservations/{}/status", id))
            .json(&json!({ "status": status }));
        self.send_ack(req).await
    }

    async fn cancel_reservation(&self, id: ReservationId) -> ApiResult<()> {
        self.send_ack(self.request(Method::POST, &format!("reservations/{}/cancel", id)))
            .await
    }

    async fn delete_reservation(&self, id: ReservationId) -> ApiResult<()> {
        self.send_ack(self.request(Method::DELETE, &format!("reservations/{}", id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let config = ClientConfig::default().with_api_url("http://pms.local/api/");
        let api = HttpReservationApi::new(&config).unwrap();
        assert_eq!(api.api_url(), "http://pms.local/api");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let config = ClientConfig::default()
            .with_api_url("http://127.0.0.1:9")
            .with_request_timeout(std::time::Duration::from_millis(500));
        let api = HttpReservationApi::new(&config).unwrap();
        assert!(matches!(api.list_reservations().await, Err(ApiError::Network(_))));
    }
}
