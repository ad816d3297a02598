//! Rate-limited retry queue for outbound sends.
//!
//! The downstream email provider enforces a per-second send quota; violating
//! it causes provider-side throttling or bans. Every send therefore goes
//! through a [`DispatchQueue`], which executes queued operations one at a
//! time with a minimum start-to-start spacing, retries failures after a fixed
//! cooldown, and surfaces the original error once retries are exhausted.
//!
//! Queues are explicitly constructed and passed by reference (or cloned —
//! clones share the same queue); tests instantiate isolated queues under
//! paused tokio time.

pub mod config;
pub mod error;
pub mod queue;
pub mod ticket;

pub use config::DispatchConfig;
pub use error::DispatchError;
pub use queue::DispatchQueue;
pub use ticket::SendTicket;
