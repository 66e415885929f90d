//! Synthetic fallback data
//!
//! When the gateway is unreachable or returns nothing, the dashboard is
//! populated from generated records so the UI always has something to show.
//! Shapes mirror real gateway data: a handful of known numbers, short
//! contents, timestamps spread over the last 30 days.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::types::{DeliveryStatus, Direction, Message};

const PHONES: &[&str] = &[
    "0901234567",
    "0912345678",
    "0923456789",
    "0934567890",
    "0945678901",
];

const CONTENTS: &[&str] = &[
    "Hello! I'd like to ask about your product.",
    "Thanks for the support, very happy with the service.",
    "Has my order shipped yet?",
    "I need help with a payment.",
    "Great product, I'll recommend it to friends.",
    "Any promotions running this month?",
    "How long does delivery take?",
    "I'd like to return an item.",
    "Where are your store branches?",
    "Thanks for the thorough advice.",
];

/// Generate `count` plausible records, newest first
pub fn generate_messages(count: usize) -> Vec<Message> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let mut messages: Vec<Message> = (0..count)
        .map(|_| {
            let received = rng.gen_bool(0.4);
            let minutes_back = rng.gen_range(0..60 * 24 * 30);
            Message {
                id: Message::generate_id(),
                phone: PHONES[rng.gen_range(0..PHONES.len())].to_string(),
                content: CONTENTS[rng.gen_range(0..CONTENTS.len())].to_string(),
                direction: if received {
                    Direction::Received
                } else {
                    Direction::Sent
                },
                timestamp: now - Duration::minutes(minutes_back),
                read: rng.gen_bool(0.7),
                status: if rng.gen_bool(0.9) {
                    DeliveryStatus::Delivered
                } else {
                    DeliveryStatus::Failed
                },
                storage: None,
            }
        })
        .collect();

    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    messages
}
