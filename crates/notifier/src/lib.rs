//! Claim-workflow notification client.
//!
//! Builds per-recipient notification requests, posts them as JSON to the
//! external notification endpoint, and routes every send through the
//! rate-limited dispatch queue so the email provider's per-second quota is
//! never exceeded. Batch sends aggregate independent per-recipient outcomes:
//! one recipient's terminal failure never aborts the rest of the batch.

pub mod batch;
pub mod client;

pub use batch::BatchSummary;
pub use client::NotifierClient;
