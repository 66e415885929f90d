//! Dashboard orchestration
//!
//! `SmsManager` is the context object tying the gateway client, message
//! store, filter engine, selection set and refresh scheduler together. All
//! mutation goes through it, and every state change it makes is mirrored to
//! the renderer over the `UiEvent` channel.
//!
//! Long-running operations are guarded by plain booleans rather than locks:
//! the manager is driven from a single task, so a guard only has to stop the
//! same loop from re-entering an operation that is already in flight.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use flume::Sender;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{default_settings_path, DashboardSettings};
use crate::events::{AutoRefreshIndicator, ConnectionState, Severity, UiEvent};
use crate::export;
use crate::filter::{self, Filters, MessageView, TimeRange};
use crate::gateway::GatewayClient;
use crate::selection::SelectionSet;
use crate::store::{mock, MessageStore};
use crate::sync::{AutoRefreshScheduler, SyncSignal};
use crate::types::error::{Result, SmsError};
use crate::types::{Direction, DeliveryStatus, Message};

/// Messages seeded when the gateway has nothing to offer
const MOCK_MESSAGE_COUNT: usize = 150;
const DEFAULT_PER_PAGE: usize = 20;

/// Outcome of a bulk operation, for callers that want more than toasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkReport {
    pub succeeded: usize,
    pub requested: usize,
}

pub struct SmsManager {
    gateway: GatewayClient,
    store: MessageStore,
    filters: Filters,
    view: MessageView,
    /// Result of the last `compute_view` pass, paged on demand
    filtered: Vec<Message>,
    page: usize,
    per_page: usize,
    selection: SelectionSet,
    scheduler: AutoRefreshScheduler,
    settings: DashboardSettings,
    settings_path: Option<PathBuf>,
    events: Sender<UiEvent>,
    refreshing: bool,
    exporting: bool,
    bulk_deleting: bool,
}

impl SmsManager {
    /// Build a manager and hand back the scheduler signal stream the caller
    /// must drain into [`SmsManager::handle_signal`].
    pub fn new(
        base_url: Url,
        settings: DashboardSettings,
        events: Sender<UiEvent>,
    ) -> Result<(Self, flume::Receiver<SyncSignal>)> {
        let gateway = GatewayClient::new(base_url)?;
        let (scheduler, signals) =
            AutoRefreshScheduler::new(settings.activity_pause_enabled, settings.activity_delay_secs);
        let manager = Self {
            gateway,
            store: MessageStore::new(),
            filters: Filters::default(),
            view: MessageView::All,
            filtered: Vec::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            selection: SelectionSet::new(),
            scheduler,
            settings,
            settings_path: default_settings_path(),
            events,
            refreshing: false,
            exporting: false,
            bulk_deleting: false,
        };
        Ok((manager, signals))
    }

    /// Redirect settings persistence, used by tests
    pub fn set_settings_path(&mut self, path: Option<PathBuf>) {
        self.settings_path = path;
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Probe the gateway, load messages and arm auto-refresh from settings
    pub async fn init(&mut self) {
        info!("Initializing dashboard");
        self.emit(UiEvent::ConnectionStatus(ConnectionState::Checking));
        let online = self.gateway.test_connection_with_retry().await;
        self.emit(UiEvent::ConnectionStatus(if online {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }));

        self.load_messages(true).await;

        if self.settings.auto_refresh_interval_secs > 0 {
            self.scheduler
                .set_interval(self.settings.auto_refresh_interval_secs);
            self.emit(UiEvent::AutoRefresh(AutoRefreshIndicator::Active(
                self.settings.auto_refresh_interval_secs,
            )));
        }

        self.toast(Severity::Info, "Ready", "SMS dashboard loaded");
    }

    /// Fetch from the gateway, falling back to generated data when it has
    /// nothing. `quiet` suppresses the success toast (polling path).
    pub async fn load_messages(&mut self, quiet: bool) {
        match self.gateway.fetch_messages().await {
            Some(messages) if !messages.is_empty() => {
                let count = messages.len();
                self.store.replace_all(messages);
                if !quiet {
                    self.toast(
                        Severity::Success,
                        "Messages loaded",
                        &format!("{} messages loaded", count),
                    );
                }
            }
            _ => {
                warn!("Gateway returned no messages, using generated data");
                self.store.replace_all(mock::generate_messages(MOCK_MESSAGE_COUNT));
                self.toast(
                    Severity::Warning,
                    "Offline data",
                    "Could not reach the gateway, showing sample messages",
                );
            }
        }

        let existing: HashSet<String> =
            self.store.messages().iter().map(|m| m.id.clone()).collect();
        self.selection.retain_existing(&existing);
        self.recompute_view();
    }

    /// Manual refresh. Drops the selection, which a full replace would
    /// invalidate anyway.
    pub async fn refresh(&mut self) {
        if self.refreshing {
            debug!("Refresh already in progress, ignoring");
            return;
        }
        self.refreshing = true;
        self.selection.clear();
        self.load_messages(false).await;
        self.refreshing = false;
    }

    /// Send a message and insert it locally without waiting for a re-fetch.
    /// A later full refresh reconciles with whatever the gateway stored.
    pub async fn send_message(&mut self, phone: &str, content: &str) -> Result<()> {
        match self.gateway.send_message(phone, content).await {
            Ok(()) => {
                self.store.insert(Message {
                    id: Message::generate_id(),
                    phone: phone.to_string(),
                    content: content.to_string(),
                    direction: Direction::Sent,
                    timestamp: Utc::now(),
                    read: true,
                    status: DeliveryStatus::Sent,
                    storage: None,
                });
                self.recompute_view();
                self.toast(Severity::Success, "Sent", &format!("Message sent to {}", phone));
                Ok(())
            }
            Err(err) => {
                self.toast(Severity::Error, "Send failed", &err.to_string());
                Err(err)
            }
        }
    }

    pub async fn delete_message(&mut self, id: &str) -> Result<()> {
        if !self.store.contains(id) {
            return Err(SmsError::MessageNotFound(id.to_string()));
        }

        let outcome = self.gateway.delete_messages(&[id.to_string()]).await;
        if outcome.deleted.contains(id) {
            self.store.remove_many(&outcome.deleted);
            self.selection.remove(id);
            self.recompute_view();
            self.toast(Severity::Success, "Deleted", "Message deleted");
            Ok(())
        } else {
            self.toast(Severity::Error, "Delete failed", "Message could not be deleted");
            Err(SmsError::Server("delete rejected by gateway".to_string()))
        }
    }

    /// Flip a message's read flag on the gateway first, then locally
    pub async fn mark_read(&mut self, id: &str, read: bool) -> Result<()> {
        if !self.store.contains(id) {
            return Err(SmsError::MessageNotFound(id.to_string()));
        }

        if self.gateway.set_read_status(id, read).await {
            self.store.set_read(id, read);
            self.recompute_view();
            Ok(())
        } else {
            Err(SmsError::Server("read-status update rejected".to_string()))
        }
    }

    /// Mark every selected message read, one gateway call per id.
    /// Partial failure is reported, successful ids are still applied.
    pub async fn mark_selected_read(&mut self) -> BulkReport {
        let mut ids = self.selection.to_vec();
        ids.sort();
        let requested = ids.len();
        if requested == 0 {
            self.toast(Severity::Warning, "Nothing selected", "Select messages first");
            return BulkReport { succeeded: 0, requested: 0 };
        }

        let mut succeeded = 0;
        for id in &ids {
            if self.gateway.set_read_status(id, true).await {
                self.store.set_read(id, true);
                succeeded += 1;
            }
        }

        self.selection.clear();
        self.recompute_view();

        if succeeded == requested {
            self.toast(
                Severity::Success,
                "Marked read",
                &format!("{} messages marked as read", succeeded),
            );
        } else {
            self.toast(
                Severity::Warning,
                "Partially marked read",
                &format!("{} of {} messages marked as read", succeeded, requested),
            );
        }

        BulkReport { succeeded, requested }
    }

    /// Delete every selected message. `confirmed` is the caller-supplied
    /// answer to the single up-front confirmation; ids the gateway failed to
    /// delete stay in the store and stay selected.
    pub async fn delete_selected(&mut self, confirmed: bool) -> BulkReport {
        let mut ids = self.selection.to_vec();
        ids.sort();
        let requested = ids.len();

        if requested == 0 {
            self.toast(Severity::Warning, "Nothing selected", "Select messages first");
            return BulkReport { succeeded: 0, requested: 0 };
        }
        if !confirmed {
            debug!("Bulk delete cancelled by user");
            return BulkReport { succeeded: 0, requested };
        }
        if self.bulk_deleting {
            debug!("Bulk delete already in progress, ignoring");
            return BulkReport { succeeded: 0, requested };
        }

        self.bulk_deleting = true;
        let outcome = self.gateway.delete_messages(&ids).await;
        let succeeded = outcome.deleted.len();

        self.store.remove_many(&outcome.deleted);
        self.selection.remove_many(&outcome.deleted);
        self.recompute_view();
        self.bulk_deleting = false;

        if succeeded == requested {
            self.toast(
                Severity::Success,
                "Deleted",
                &format!("{} messages deleted", succeeded),
            );
        } else {
            self.toast(
                Severity::Warning,
                "Partially deleted",
                &format!("{} of {} messages deleted", succeeded, requested),
            );
        }

        BulkReport { succeeded, requested }
    }

    pub fn toggle_selection(&mut self, id: &str) {
        self.selection.toggle(id);
        self.emit(UiEvent::SelectionCount(self.selection.len()));
    }

    /// Select the whole current page, or clear it if already fully selected
    pub fn toggle_select_page(&mut self) {
        let (page, _) = filter::page_slice(&self.filtered, self.page, self.per_page);
        self.selection.toggle_page(&page);
        self.emit(UiEvent::SelectionCount(self.selection.len()));
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn switch_view(&mut self, view: MessageView) {
        if self.view != view {
            self.view = view;
            self.recompute_view();
        }
    }

    pub fn apply_filters(&mut self, filters: Filters) {
        self.filters = filters;
        self.recompute_view();
    }

    pub fn clear_filters(&mut self) {
        self.filters = Filters::default();
        self.recompute_view();
    }

    pub fn set_search(&mut self, query: &str) {
        self.filters.search = query.to_string();
        self.recompute_view();
    }

    pub fn set_time_range(&mut self, range: Option<TimeRange>) {
        self.filters.time = range;
        self.recompute_view();
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page;
        self.emit_page();
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.page = 1;
        self.emit_page();
    }

    /// Export the current view (or everything when no filter narrows it)
    /// to a CSV file in `dir`, returning the file path.
    pub fn export_to_dir(&mut self, dir: &std::path::Path) -> Result<PathBuf> {
        if self.exporting {
            return Err(SmsError::Other("export already in progress".to_string()));
        }

        let rows: &[Message] = if self.filtered.is_empty() && self.filters.is_empty() {
            self.store.messages()
        } else {
            &self.filtered
        };
        if rows.is_empty() {
            self.toast(Severity::Warning, "Nothing to export", "The current view is empty");
            return Err(SmsError::Validation("no messages to export".to_string()));
        }

        self.exporting = true;
        let result = export::write_to_dir(rows, dir);
        self.exporting = false;

        match &result {
            Ok(path) => {
                self.toast(
                    Severity::Success,
                    "Exported",
                    &format!("Saved {}", path.display()),
                );
            }
            Err(err) => {
                self.toast(Severity::Error, "Export failed", &err.to_string());
            }
        }
        result
    }

    /// React to a scheduler signal. The caller's event loop drains the
    /// receiver returned from [`SmsManager::new`] into this.
    pub async fn handle_signal(&mut self, signal: SyncSignal) {
        match signal {
            SyncSignal::PollDue => {
                if self.refreshing {
                    debug!("Poll due during manual refresh, skipping");
                    return;
                }
                self.refreshing = true;
                self.load_messages(true).await;
                self.refreshing = false;
                self.scheduler.poll_completed();
                self.toast(Severity::Info, "Refreshed", "Messages updated automatically");
            }
            SyncSignal::CountdownTick(remaining) => {
                self.emit(UiEvent::AutoRefresh(AutoRefreshIndicator::Active(remaining)));
            }
            SyncSignal::PausedByActivity => {
                self.emit(UiEvent::AutoRefresh(AutoRefreshIndicator::Paused));
            }
            SyncSignal::ResumeDue => {
                self.scheduler.resume();
                if self.scheduler.interval_secs() > 0 {
                    self.emit(UiEvent::AutoRefresh(AutoRefreshIndicator::Active(
                        self.scheduler.interval_secs(),
                    )));
                }
            }
        }
    }

    pub fn notify_activity(&mut self) {
        self.scheduler.notify_activity();
    }

    pub fn set_auto_refresh_interval(&mut self, secs: u64) {
        self.scheduler.set_interval(secs);
        self.settings.auto_refresh_interval_secs = secs;
        self.persist_settings();
        self.emit(UiEvent::AutoRefresh(if secs == 0 {
            AutoRefreshIndicator::Off
        } else {
            AutoRefreshIndicator::Active(secs)
        }));
    }

    pub fn set_activity_pause(&mut self, enabled: bool) {
        self.scheduler.set_activity_pause(enabled);
        self.settings.activity_pause_enabled = enabled;
        self.persist_settings();
    }

    pub fn set_activity_delay(&mut self, secs: u64) {
        self.scheduler.set_activity_delay(secs);
        self.settings.activity_delay_secs = secs;
        self.persist_settings();
    }

    fn persist_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(err) = self.settings.save(path) {
            warn!("Failed to persist settings: {}", err);
        }
    }

    /// Re-run the filter pipeline and publish the first page plus stats
    fn recompute_view(&mut self) {
        self.filtered = filter::compute_view(
            self.store.messages(),
            self.view,
            &self.filters,
            Utc::now(),
        );
        self.page = 1;
        self.emit_page();
        self.emit(UiEvent::Stats(self.store.stats()));
        self.emit(UiEvent::SelectionCount(self.selection.len()));
    }

    fn emit_page(&mut self) {
        let (page, info) = filter::page_slice(&self.filtered, self.page, self.per_page);
        self.page = info.page;
        self.emit(UiEvent::MessageList { page, info });
    }

    fn toast(&self, severity: Severity, title: &str, body: &str) {
        self.emit(UiEvent::Toast {
            severity,
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn emit(&self, event: UiEvent) {
        // A dropped receiver just means no renderer is attached
        let _ = self.events.send(event);
    }

    #[cfg(test)]
    fn store(&self) -> &MessageStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::test_support::{http_response, TestServer};

    fn manager_for(server: &TestServer) -> (SmsManager, flume::Receiver<UiEvent>) {
        let (tx, rx) = events::channel();
        let (mut manager, _signals) =
            SmsManager::new(server.url(), DashboardSettings::default(), tx)
                .expect("manager");
        manager.set_settings_path(None);
        (manager, rx)
    }

    fn seed(manager: &mut SmsManager, count: usize) {
        let messages: Vec<Message> = (0..count)
            .map(|i| Message {
                id: format!("m{:02}", i),
                phone: "0901234567".to_string(),
                content: format!("message {}", i),
                direction: Direction::Received,
                timestamp: Utc::now() - chrono::Duration::minutes(i as i64),
                read: false,
                status: DeliveryStatus::Received,
                storage: None,
            })
            .collect();
        manager.store.replace_all(messages);
        manager.recompute_view();
    }

    fn select_all(manager: &mut SmsManager, count: usize) {
        for i in 0..count {
            manager.toggle_selection(&format!("m{:02}", i));
        }
    }

    fn toasts(rx: &flume::Receiver<UiEvent>) -> Vec<(Severity, String)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let UiEvent::Toast { severity, title, .. } = event {
                out.push((severity, title));
            }
        }
        out
    }

    #[tokio::test]
    async fn bulk_delete_keeps_failed_ids_selected() {
        // 25 selected ids split into batches of 10, 10 and 5. The second
        // batch only partially succeeds.
        let server = TestServer::spawn(vec![
            http_response(
                200,
                "application/json",
                r#"{"success": true, "deleted_count": 10}"#,
            ),
            http_response(
                200,
                "application/json",
                r#"{"success": false,
                    "deleted": ["m10","m11","m12","m13","m14","m15","m16"],
                    "failed_count": 3}"#,
            ),
            http_response(
                200,
                "application/json",
                r#"{"success": true, "deleted_count": 5}"#,
            ),
        ])
        .await;

        let (mut manager, rx) = manager_for(&server);
        seed(&mut manager, 25);
        select_all(&mut manager, 25);
        let _ = toasts(&rx);

        let report = manager.delete_selected(true).await;

        assert_eq!(report.requested, 25);
        assert_eq!(report.succeeded, 22);
        assert_eq!(manager.store().len(), 3);
        assert_eq!(manager.selection_len(), 3);
        for id in ["m17", "m18", "m19"] {
            assert!(manager.store().contains(id));
            assert!(manager.selection.contains(id));
        }
        assert_eq!(server.requests().len(), 3);

        let titles = toasts(&rx);
        assert!(titles
            .iter()
            .any(|(s, t)| *s == Severity::Warning && t == "Partially deleted"));
    }

    #[tokio::test]
    async fn bulk_delete_requires_confirmation() {
        let server = TestServer::spawn(vec![]).await;
        let (mut manager, _rx) = manager_for(&server);
        seed(&mut manager, 3);
        select_all(&mut manager, 3);

        let report = manager.delete_selected(false).await;

        assert_eq!(report.succeeded, 0);
        assert_eq!(manager.store().len(), 3);
        assert_eq!(manager.selection_len(), 3);
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn send_inserts_optimistically() {
        let server =
            TestServer::spawn(vec![http_response(200, "text/plain", "OK: queued")]).await;
        let (mut manager, _rx) = manager_for(&server);
        seed(&mut manager, 2);

        manager
            .send_message("0901234567", "hello there")
            .await
            .expect("send");

        assert_eq!(manager.store().len(), 3);
        let newest = &manager.store().messages()[0];
        assert_eq!(newest.direction, Direction::Sent);
        assert_eq!(newest.status, DeliveryStatus::Sent);
        assert!(newest.read);
        assert_eq!(newest.content, "hello there");
    }

    #[tokio::test]
    async fn send_failure_does_not_insert() {
        let server =
            TestServer::spawn(vec![http_response(200, "text/plain", "ERROR: no credit")]).await;
        let (mut manager, _rx) = manager_for(&server);
        seed(&mut manager, 2);

        let result = manager.send_message("0901234567", "hello").await;

        assert!(result.is_err());
        assert_eq!(manager.store().len(), 2);
    }

    #[tokio::test]
    async fn mark_selected_read_reports_partial_success() {
        let server = TestServer::spawn(vec![
            http_response(200, "text/plain", "OK"),
            http_response(500, "text/plain", "boom"),
        ])
        .await;
        let (mut manager, rx) = manager_for(&server);
        seed(&mut manager, 2);
        select_all(&mut manager, 2);
        let _ = toasts(&rx);

        let report = manager.mark_selected_read().await;

        assert_eq!(report.requested, 2);
        assert_eq!(report.succeeded, 1);
        // m00 sorts first, its call got the OK response
        assert!(manager.store().get("m00").expect("m00").read);
        assert!(!manager.store().get("m01").expect("m01").read);
        assert_eq!(manager.selection_len(), 0);

        let titles = toasts(&rx);
        assert!(titles
            .iter()
            .any(|(s, t)| *s == Severity::Warning && t == "Partially marked read"));
    }

    #[tokio::test]
    async fn delete_message_prunes_store_and_selection() {
        let server = TestServer::spawn(vec![http_response(
            200,
            "application/json",
            r#"{"success": true, "deleted_count": 1}"#,
        )])
        .await;
        let (mut manager, _rx) = manager_for(&server);
        seed(&mut manager, 3);
        manager.toggle_selection("m01");

        manager.delete_message("m01").await.expect("delete");

        assert!(!manager.store().contains("m01"));
        assert_eq!(manager.selection_len(), 0);
    }

    #[tokio::test]
    async fn delete_unknown_message_is_rejected_locally() {
        let server = TestServer::spawn(vec![]).await;
        let (mut manager, _rx) = manager_for(&server);
        seed(&mut manager, 1);

        let result = manager.delete_message("nope").await;

        assert!(matches!(result, Err(SmsError::MessageNotFound(_))));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn switching_view_resets_page_and_filters_direction() {
        let server = TestServer::spawn(vec![]).await;
        let (mut manager, rx) = manager_for(&server);
        seed(&mut manager, 30);
        manager.go_to_page(2);

        manager.switch_view(MessageView::Sent);

        let mut last_info = None;
        while let Ok(event) = rx.try_recv() {
            if let UiEvent::MessageList { info, .. } = event {
                last_info = Some(info);
            }
        }
        let info = last_info.expect("page event");
        assert_eq!(info.page, 1);
        // Seeded messages are all received
        assert_eq!(info.total_items, 0);
    }

    #[tokio::test]
    async fn failed_load_falls_back_to_generated_data() {
        let server = TestServer::spawn(vec![http_response(500, "text/plain", "down")]).await;
        let (mut manager, rx) = manager_for(&server);

        manager.load_messages(false).await;

        assert_eq!(manager.store().len(), MOCK_MESSAGE_COUNT);
        let titles = toasts(&rx);
        assert!(titles
            .iter()
            .any(|(s, t)| *s == Severity::Warning && t == "Offline data"));
    }

    #[tokio::test]
    async fn export_empty_view_is_rejected() {
        let server = TestServer::spawn(vec![]).await;
        let (mut manager, _rx) = manager_for(&server);
        let dir = tempfile::tempdir().expect("tempdir");

        let result = manager.export_to_dir(dir.path());

        assert!(matches!(result, Err(SmsError::Validation(_))));
    }

    #[tokio::test]
    async fn export_writes_current_view() {
        let server = TestServer::spawn(vec![]).await;
        let (mut manager, _rx) = manager_for(&server);
        seed(&mut manager, 5);
        manager.set_search("message 3");
        let dir = tempfile::tempdir().expect("tempdir");

        let path = manager.export_to_dir(dir.path()).expect("export");
        let content = std::fs::read(&path).expect("read csv");
        let text = String::from_utf8_lossy(&content);

        assert!(text.contains("message 3"));
        assert!(!text.contains("message 4"));
    }
}
