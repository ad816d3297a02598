//! Batch fan-out with partial-success aggregation.

use courier_common::types::{EmailOutcome, NotificationRequest};
use serde::Serialize;

use crate::client::NotifierClient;

/// Outcome of a notification batch.
///
/// Every recipient's send is independent: a terminal failure lands in
/// `failed` while the rest of the batch delivers normally. Callers present
/// this as a partial-success summary instead of failing the whole batch.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchSummary {
    pub sent: Vec<EmailOutcome>,
    pub failed: Vec<EmailOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.sent.len() + self.failed.len()
    }

    pub fn all_sent(&self) -> bool {
        self.failed.is_empty()
    }
}

impl NotifierClient {
    /// Send a batch of notifications and collect per-recipient outcomes.
    ///
    /// All requests are admitted to the queue up front so pacing overlaps;
    /// requests that fail validation are recorded as failed without ever
    /// consuming a send slot.
    pub async fn send_batch(&self, requests: Vec<NotificationRequest>) -> BatchSummary {
        let mut pending = Vec::with_capacity(requests.len());
        let mut summary = BatchSummary::default();

        for request in requests {
            let email = request.recipient_email.clone();
            let kind = request.notification_type;
            match self.dispatch(request) {
                Ok(ticket) => pending.push((email, kind, ticket)),
                Err(error) => {
                    tracing::warn!(
                        recipient = %email,
                        notification_type = %kind,
                        error = %error,
                        "Notification rejected before queueing"
                    );
                    summary
                        .failed
                        .push(EmailOutcome::failed(email, kind, error.to_string()));
                }
            }
        }

        for (email, kind, ticket) in pending {
            match ticket.await {
                Ok(reply) => {
                    summary
                        .sent
                        .push(EmailOutcome::sent(email, kind, reply.message_id));
                }
                Err(error) => {
                    tracing::warn!(
                        recipient = %email,
                        notification_type = %kind,
                        error = %error,
                        "Notification failed terminally"
                    );
                    summary
                        .failed
                        .push(EmailOutcome::failed(email, kind, error.to_string()));
                }
            }
        }

        tracing::info!(
            sent = summary.sent.len(),
            failed = summary.failed.len(),
            "Notification batch complete"
        );
        summary
    }
}
