//! Renderer contract
//!
//! The engine never touches a UI. Everything presentational is driven by
//! `UiEvent`s delivered over a flume channel; the embedding renderer decides
//! what a message list, a stats strip or a toast looks like.

use serde::{Deserialize, Serialize};

use crate::filter::PageInfo;
use crate::types::{Message, Stats};

/// Toast severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Connection probe outcome for UI affordances (send button gating etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Checking,
    Connected,
    Disconnected,
}

/// Auto-refresh indicator state for the countdown badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "seconds")]
pub enum AutoRefreshIndicator {
    Off,
    Active(u64),
    Paused,
}

/// Event emitted towards the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UiEvent {
    /// Current page slice of the filtered view
    MessageList { page: Vec<Message>, info: PageInfo },
    /// Aggregate counters over the full store
    Stats(Stats),
    /// Transient notification; the renderer auto-dismisses it
    Toast {
        severity: Severity,
        title: String,
        body: String,
    },
    ConnectionStatus(ConnectionState),
    AutoRefresh(AutoRefreshIndicator),
    /// Number of currently selected messages
    SelectionCount(usize),
}

/// Create the channel pair the renderer subscribes on
pub fn channel() -> (flume::Sender<UiEvent>, flume::Receiver<UiEvent>) {
    flume::unbounded()
}
