//! In-memory message store
//!
//! The authoritative collection of message records for the session. The
//! store is a cache of gateway state, not the source of truth: a refresh
//! replaces it wholesale. All mutations are synchronous, and the collection
//! is kept sorted by timestamp descending after every mutation that adds
//! records.

pub mod mock;

use std::collections::HashSet;

use tracing::debug;

use crate::types::{Direction, Message, Stats};

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Replace the whole collection (load / refresh path)
    ///
    /// Gateways occasionally echo the same record twice; only the first
    /// occurrence of each id is kept so selection and delete accounting
    /// stay exact.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        let mut seen = HashSet::with_capacity(messages.len());
        self.messages = messages
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        self.sort_descending();
        debug!("Store replaced, {} messages", self.messages.len());
    }

    /// Insert a single record (optimistic send path). An existing record
    /// with the same id is replaced rather than duplicated.
    pub fn insert(&mut self, message: Message) {
        self.messages.retain(|m| m.id != message.id);
        self.messages.push(message);
        self.sort_descending();
    }

    /// Remove every message whose id is in `ids`, returning how many went
    ///
    /// Removing ids that are not present is a no-op.
    pub fn remove_many(&mut self, ids: &HashSet<String>) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| !ids.contains(&m.id));
        before - self.messages.len()
    }

    /// Flip the read flag in place; false if the id is unknown
    pub fn set_read(&mut self, id: &str, read: bool) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.read = read;
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total: self.messages.len(),
            sent: self
                .messages
                .iter()
                .filter(|m| m.direction == Direction::Sent)
                .count(),
            received: self
                .messages
                .iter()
                .filter(|m| m.direction == Direction::Received)
                .count(),
            unread: self.messages.iter().filter(|m| !m.read).count(),
        }
    }

    /// Timestamp-descending order invariant, newest first
    fn sort_descending(&mut self) {
        self.messages
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }

    #[cfg(test)]
    pub fn is_sorted_descending(&self) -> bool {
        self.messages
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp)
    }
}
