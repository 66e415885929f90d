//! Filter & view engine
//!
//! Pure functions computing the visible slice of the store from the active
//! tab, the filter criteria and the current page. `compute_view` takes `now`
//! explicitly so calendar-day boundaries are deterministic under test.
//!
//! Filtering never re-sorts: result ordering is inherited from the store's
//! timestamp-descending order.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Direction, Message};

/// Active tab restricting the view before any filter applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageView {
    #[default]
    All,
    Received,
    Sent,
}

/// Read-state filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFilter {
    Read,
    Unread,
}

/// Calendar time-range filter, anchored to `now` at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeRange {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

/// Filter criteria, combined with the active view via logical AND
///
/// Replaced wholesale on each filter change; no other component mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub direction: Option<Direction>,
    pub read_state: Option<ReadFilter>,
    pub time: Option<TimeRange>,
    pub search: String,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.direction.is_none()
            && self.read_state.is_none()
            && self.time.is_none()
            && self.search.is_empty()
    }
}

/// Compute the filtered view of `messages`
///
/// Steps, in order: restrict to the view tab, then direction filter, then
/// read-state filter, then time range, then case-insensitive substring search
/// against phone and content (OR'd).
pub fn compute_view(
    messages: &[Message],
    view: MessageView,
    filters: &Filters,
    now: DateTime<Utc>,
) -> Vec<Message> {
    let range = filters.time.map(|t| time_bounds(t, now));
    let search = filters.search.to_lowercase();

    messages
        .iter()
        .filter(|m| match view {
            MessageView::All => true,
            MessageView::Received => m.direction == Direction::Received,
            MessageView::Sent => m.direction == Direction::Sent,
        })
        .filter(|m| filters.direction.map_or(true, |d| m.direction == d))
        .filter(|m| {
            filters.read_state.map_or(true, |rs| match rs {
                ReadFilter::Read => m.read,
                ReadFilter::Unread => !m.read,
            })
        })
        .filter(|m| {
            range.map_or(true, |(start, end)| {
                m.timestamp >= start && end.map_or(true, |e| m.timestamp < e)
            })
        })
        .filter(|m| {
            search.is_empty()
                || m.phone.to_lowercase().contains(&search)
                || m.content.to_lowercase().contains(&search)
        })
        .cloned()
        .collect()
}

/// Inclusive start / exclusive end bounds for a time range
///
/// Day boundaries are UTC calendar days; weeks start on Sunday.
fn time_bounds(range: TimeRange, now: DateTime<Utc>) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
    let today = start_of_day(now.date_naive());

    match range {
        TimeRange::Today => (today, None),
        TimeRange::Yesterday => (today - Days::new(1), Some(today)),
        TimeRange::ThisWeek => {
            let week_start = today - Days::new(now.weekday().num_days_from_sunday() as u64);
            (week_start, None)
        }
        TimeRange::LastWeek => {
            let week_start = today - Days::new(now.weekday().num_days_from_sunday() as u64);
            (week_start - Days::new(7), Some(week_start))
        }
        TimeRange::ThisMonth => (start_of_month(now.year(), now.month()), None),
        TimeRange::LastMonth => {
            let (prev_year, prev_month) = if now.month() == 1 {
                (now.year() - 1, 12)
            } else {
                (now.year(), now.month() - 1)
            };
            (
                start_of_month(prev_year, prev_month),
                Some(start_of_month(now.year(), now.month())),
            )
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc)
}

fn start_of_month(year: i32, month: u32) -> DateTime<Utc> {
    // (year, month) always comes from a valid chrono date
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    start_of_day(date)
}

/// Pagination summary of the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// 1-based index of the first item on the page, 0 when the view is empty
    pub start_item: usize,
    pub end_item: usize,
}

/// Slice one page out of the filtered view
///
/// `page` is 1-based and clamped into range so a shrinking view never leaves
/// the caller on a page past the end.
pub fn page_slice(filtered: &[Message], page: usize, per_page: usize) -> (Vec<Message>, PageInfo) {
    let per_page = per_page.max(1);
    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);
    let slice = if start < total_items {
        filtered[start..end].to_vec()
    } else {
        Vec::new()
    };

    let info = PageInfo {
        page,
        per_page,
        total_items,
        total_pages,
        start_item: if total_items == 0 { 0 } else { start + 1 },
        end_item: end,
    };

    (slice, info)
}
