//! HTTP client for the notification endpoint.

use std::time::Duration;

use courier_common::config::AppConfig;
use courier_common::error::AppError;
use courier_common::types::{NotificationRequest, NotificationResponse};
use courier_dispatch::{DispatchConfig, DispatchQueue, SendTicket};

/// Client that delivers notification requests through the dispatch queue.
///
/// Holds one queue per external rate-limit domain: every send issued through
/// this client — single or batch — shares the same pacing and retry budget.
/// Clone-cheap collaborators can share a client by reference.
pub struct NotifierClient {
    http: reqwest::Client,
    endpoint: String,
    queue: DispatchQueue<NotificationResponse>,
}

impl NotifierClient {
    /// Build a client and its queue from environment-driven configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.notify_http_timeout_secs))
            .build()
            .map_err(AppError::Http)?;
        let queue = DispatchQueue::new(DispatchConfig::new(
            config.notify_requests_per_second,
            config.notify_max_retries,
            Duration::from_millis(config.notify_retry_delay_ms),
        ));
        Ok(Self::new(http, config.notify_endpoint_url.clone(), queue))
    }

    /// Build a client from explicit parts. Tests hand in an isolated queue
    /// and a stub endpoint URL.
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        queue: DispatchQueue<NotificationResponse>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            queue,
        }
    }

    /// The underlying dispatch queue.
    pub fn queue(&self) -> &DispatchQueue<NotificationResponse> {
        &self.queue
    }

    /// Validate and enqueue one notification without awaiting its outcome.
    ///
    /// Validation failures are surfaced immediately and never consume a
    /// rate-limited send slot. The returned ticket resolves once the send
    /// reaches a terminal state.
    pub fn dispatch(
        &self,
        request: NotificationRequest,
    ) -> Result<SendTicket<NotificationResponse>, AppError> {
        request.validate()?;

        tracing::info!(
            recipient = %request.recipient_email,
            notification_type = %request.notification_type,
            "Queueing notification"
        );

        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        Ok(self.queue.submit(move || {
            let http = http.clone();
            let endpoint = endpoint.clone();
            let request = request.clone();
            async move { deliver(http, endpoint, request).await }
        }))
    }

    /// Like [`NotifierClient::dispatch`], with a per-send retry ceiling.
    /// A limit of zero makes the first failure terminal.
    pub fn dispatch_with_retry_limit(
        &self,
        request: NotificationRequest,
        retry_limit: u32,
    ) -> Result<SendTicket<NotificationResponse>, AppError> {
        request.validate()?;

        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        Ok(self.queue.submit_with_retry_limit(
            move || {
                let http = http.clone();
                let endpoint = endpoint.clone();
                let request = request.clone();
                async move { deliver(http, endpoint, request).await }
            },
            retry_limit,
        ))
    }

    /// Send one notification and wait for its terminal outcome.
    pub async fn send(
        &self,
        request: NotificationRequest,
    ) -> anyhow::Result<NotificationResponse> {
        let ticket = self.dispatch(request)?;
        Ok(ticket.await?)
    }

    /// Send one notification with a per-send retry ceiling.
    pub async fn send_with_retry_limit(
        &self,
        request: NotificationRequest,
        retry_limit: u32,
    ) -> anyhow::Result<NotificationResponse> {
        let ticket = self.dispatch_with_retry_limit(request, retry_limit)?;
        Ok(ticket.await?)
    }
}

/// One delivery attempt: POST the request as JSON, map non-2xx replies to
/// [`AppError::Endpoint`], parse the endpoint's JSON reply.
async fn deliver(
    http: reqwest::Client,
    endpoint: String,
    request: NotificationRequest,
) -> anyhow::Result<NotificationResponse> {
    let response = http
        .post(&endpoint)
        .json(&request)
        .send()
        .await
        .map_err(AppError::Http)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Endpoint {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let reply: NotificationResponse = response.json().await.map_err(AppError::Http)?;
    tracing::debug!(message_id = ?reply.message_id, "Notification endpoint accepted send");
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_common::types::{ClaimDetails, NotificationType, Recipient};
    use uuid::Uuid;

    fn make_client() -> NotifierClient {
        NotifierClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/send",
            DispatchQueue::new(DispatchConfig::default()),
        )
    }

    fn make_claim() -> ClaimDetails {
        ClaimDetails {
            id: Uuid::new_v4(),
            description: "Parking".to_string(),
            amount: 12.0,
            date: chrono::NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            job_number: None,
            category_name: "Travel".to_string(),
            subcategory_name: "Parking".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_queueing() {
        let client = make_client();
        let recipient = Recipient::new("", "No Address");
        let request =
            NotificationRequest::single(&recipient, NotificationType::Submission, make_claim());

        let result = client.dispatch(request);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(client.queue().is_empty());
        assert!(!client.queue().is_draining());
    }

    #[tokio::test]
    async fn test_valid_request_is_queued() {
        let client = make_client();
        let recipient = Recipient::new("employee@example.com", "Jordan Lee");
        let request =
            NotificationRequest::single(&recipient, NotificationType::Submission, make_claim());

        // Port 9 (discard) never answers, so only admission is observable.
        let ticket = client.dispatch(request).unwrap();
        assert!(client.queue().is_draining());
        drop(ticket);
    }
}
