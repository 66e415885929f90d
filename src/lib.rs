//! SMS Manager - message state and synchronization engine
//!
//! Client-side engine for an SMS gateway dashboard: fetches, sends and
//! deletes messages through a gateway's CGI endpoints, keeps a local message
//! store with filtering, pagination and selection on top, and drives a
//! pausable auto-refresh cycle. Rendering is out of scope; state changes are
//! published as [`events::UiEvent`] values over a channel.
//!
//! ## Module Organization
//!
//! - `gateway/`: HTTP client for the gateway CGI endpoints
//! - `store/`: In-memory message store and sample data generation
//! - `filter`: View/filter/search/pagination pipeline (pure functions)
//! - `selection`: Multi-select set for bulk operations
//! - `sync/`: Auto-refresh scheduler with activity pause
//! - `manager`: Orchestration context object
//! - `config/`: Persisted dashboard settings
//! - `events`: Renderer-facing event contract
//! - `export`: CSV export
//! - `types/`: Message model, gateway payload parsing, errors

pub mod config;
pub mod events;
pub mod export;
pub mod filter;
pub mod gateway;
pub mod manager;
pub mod selection;
pub mod store;
pub mod sync;
pub mod types;

#[cfg(test)]
mod test_support;

pub use events::{AutoRefreshIndicator, ConnectionState, Severity, UiEvent};
pub use filter::{Filters, MessageView, PageInfo, ReadFilter, TimeRange};
pub use gateway::GatewayClient;
pub use manager::SmsManager;
pub use sync::{AutoRefreshScheduler, SyncSignal};
pub use types::error::{Result, SmsError};
pub use types::{DeliveryStatus, Direction, Message, Stats};
