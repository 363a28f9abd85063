//! HTTP gateway: JSON over the portal's public REST endpoints.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use super::AvailabilityGateway;
use super::schema::{
    BookingReceipt, BookingRequest, CalendarMonth, ErrorBody, Program, ThemeSettings,
    TimeBlockAvailability,
};
use crate::config::GatewayConfig;
use crate::error::{ConfigError, GatewayError};

/// Gateway backed by `reqwest`.
pub struct HttpGateway {
    base_url: String,
    api_token: Option<SecretString>,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a successful JSON body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let started = std::time::Instant::now();
        let resp = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| GatewayError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        tracing::debug!(
            endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Booking API responded"
        );

        if !status.is_success() {
            return Err(status_error(endpoint, resp).await);
        }

        resp.json::<T>()
            .await
            .map_err(|e| GatewayError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Turn a non-success response into a `Status` error, keeping the server's `detail`.
async fn status_error(endpoint: &str, resp: Response) -> GatewayError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message());
    tracing::warn!(endpoint, status, detail = ?detail, "Booking API returned an error");
    GatewayError::Status {
        endpoint: endpoint.to_string(),
        status,
        detail,
    }
}

fn invalid(endpoint: &str) -> impl FnOnce(String) -> GatewayError + '_ {
    move |reason| GatewayError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason,
    }
}

#[async_trait]
impl AvailabilityGateway for HttpGateway {
    async fn list_programs(&self, institution_id: &str) -> Result<Vec<Program>, GatewayError> {
        let endpoint = "programs";
        let programs: Vec<Program> = self
            .fetch(
                endpoint,
                self.client
                    .get(self.url(&format!("programs/public/{institution_id}"))),
            )
            .await?;
        for program in &programs {
            program.check().map_err(invalid(endpoint))?;
        }
        Ok(programs)
    }

    async fn calendar_month(
        &self,
        institution_id: &str,
        year: i32,
        month: u32,
    ) -> Result<CalendarMonth, GatewayError> {
        let endpoint = "calendar";
        let calendar: CalendarMonth = self
            .fetch(
                endpoint,
                self.client
                    .get(self.url(&format!("calendar/{institution_id}/{year}/{month}"))),
            )
            .await?;
        calendar.check(year, month).map_err(invalid(endpoint))?;
        Ok(calendar)
    }

    async fn time_blocks(
        &self,
        institution_id: &str,
        program_id: &str,
        date: NaiveDate,
    ) -> Result<TimeBlockAvailability, GatewayError> {
        let endpoint = "availability";
        let availability: TimeBlockAvailability = self
            .fetch(
                endpoint,
                self.client.get(self.url(&format!(
                    "availability/{institution_id}/{program_id}/{}",
                    date.format("%Y-%m-%d")
                ))),
            )
            .await?;
        availability.check(date).map_err(invalid(endpoint))?;
        Ok(availability)
    }

    async fn submit_booking(
        &self,
        institution_id: &str,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, GatewayError> {
        let endpoint = "bookings";
        let receipt: BookingReceipt = self
            .fetch(
                endpoint,
                self.client
                    .post(self.url(&format!("bookings/public/{institution_id}")))
                    .json(request),
            )
            .await?;
        receipt.check().map_err(invalid(endpoint))?;
        tracing::info!(booking_id = %receipt.id, institution_id, "Booking created");
        Ok(receipt)
    }

    async fn public_theme(&self, institution_id: &str) -> Result<ThemeSettings, GatewayError> {
        self.fetch(
            "theme",
            self.client
                .get(self.url(&format!("settings/theme/public/{institution_id}"))),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let config = GatewayConfig {
            base_url: "http://localhost:8001/api/".to_string(),
            ..Default::default()
        };
        let gateway = HttpGateway::new(&config).unwrap();
        assert_eq!(
            gateway.url("calendar/demo/2026/3"),
            "http://localhost:8001/api/calendar/demo/2026/3"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_request_failure() {
        let config = GatewayConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        };
        let gateway = HttpGateway::new(&config).unwrap();
        let err = gateway.list_programs("demo").await.unwrap_err();
        assert!(matches!(err, GatewayError::RequestFailed { .. }), "got {err:?}");
    }
}
