use std::time::Duration;

use crate::bridge::{EditorSnapshot, LogEntry, PreviewUpdate, SaveAck, SavePayload};
use crate::editor::drafts::DraftStore;
use crate::editor::preview::render_markdown;

/// Produces the session key for a new draft.
pub type KeySource = Box<dyn Fn() -> String + Send>;

/// Text handed to the shell and not yet acknowledged.
#[derive(Debug, Clone)]
struct InFlight {
    key: String,
    content: String,
}

/// Editor state behind the view: the live text, its draft, the preview and
/// the bookkeeping that decides when a save is due.
pub struct EditorController {
    drafts: DraftStore,
    next_key: KeySource,
    session_key: String,
    text: String,
    /// Input recorded but not yet flushed to the draft store.
    edit_pending: bool,
    /// Flushed text that no save has confirmed yet.
    pending_changes: bool,
    preview_visible: bool,
    preview_html: Option<String>,
    autosave_interval: Duration,
    in_flight: Option<InFlight>,
    restored: bool,
}

impl EditorController {
    pub fn new(
        drafts: DraftStore,
        preview_visible: bool,
        autosave_interval: Duration,
        next_key: KeySource,
    ) -> Self {
        let session_key = next_key();
        Self {
            drafts,
            next_key,
            session_key,
            text: String::new(),
            edit_pending: false,
            pending_changes: false,
            preview_visible,
            preview_html: None,
            autosave_interval,
            in_flight: None,
            restored: false,
        }
    }

    /// Adopt the most recent unsaved draft, if there is one.
    pub fn restore(&mut self) -> bool {
        let Some((key, text)) = self
            .drafts
            .latest()
            .filter(|(_, text)| !text.is_empty())
            .map(|(key, text)| (key.to_string(), text.to_string()))
        else {
            return false;
        };

        self.session_key = key;
        self.text = text;
        self.pending_changes = true;
        self.restored = true;
        self.refresh_preview();
        tracing::info!(key = %self.session_key, "restored unsaved draft");
        true
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            session_key: self.session_key.clone(),
            text: self.text.clone(),
            preview_html: self.preview_html.clone(),
            preview_visible: self.preview_visible,
            restored: self.restored,
        }
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn autosave_interval(&self) -> Duration {
        self.autosave_interval
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.edit_pending || self.pending_changes
    }

    /// Cheap; the draft write and preview happen in [`Self::flush_edit`].
    pub fn record_input(&mut self, text: String) {
        self.text = text;
        self.edit_pending = true;
    }

    /// Persist the latest input under the current session key and re-render
    /// the preview when it is visible.
    pub fn flush_edit(&mut self) -> Option<PreviewUpdate> {
        if !self.edit_pending {
            return None;
        }
        self.edit_pending = false;

        // Cleared text leaves nothing to save or restore.
        if self.text.trim().is_empty() {
            self.pending_changes = false;
            if let Err(e) = self.drafts.remove(&self.session_key) {
                tracing::warn!(key = %self.session_key, error = %e, "could not clear empty draft");
            }
        } else {
            self.pending_changes = true;
            if let Err(e) = self.drafts.set(&self.session_key, &self.text) {
                tracing::warn!(key = %self.session_key, error = %e, "could not store draft");
            }
        }

        self.refresh_preview()
    }

    /// The payload for a save, or `None` when there is nothing new to write.
    pub fn build_save_request(&mut self) -> Option<SavePayload> {
        if !self.pending_changes || self.text.trim().is_empty() {
            return None;
        }

        let payload = SavePayload {
            time: self.session_key.clone(),
            content: self.text.clone(),
        };
        self.in_flight = Some(InFlight {
            key: payload.time.clone(),
            content: payload.content.clone(),
        });
        Some(payload)
    }

    /// Reconcile a save reply. Only the acknowledged key's draft is removed.
    pub fn apply_ack(&mut self, ack: &SaveAck) -> LogEntry {
        if !ack.is_success {
            let error = ack.error.as_deref().unwrap_or("Unknown error");
            tracing::warn!(key = %ack.key, error, "save failed, keeping draft");
            self.in_flight = None;
            return LogEntry::error(format!("Failed to save note: {}", error));
        }

        if let Err(e) = self.drafts.remove(&ack.key) {
            tracing::warn!(key = %ack.key, error = %e, "could not clear saved draft");
        }

        if ack.key == self.session_key {
            let saved_content = self
                .in_flight
                .take()
                .filter(|flight| flight.key == ack.key)
                .map(|flight| flight.content);

            self.session_key = (self.next_key)();
            self.pending_changes = false;

            // Text typed while the save was in flight belongs to the new session.
            if saved_content.as_deref() != Some(self.text.as_str()) && !self.text.is_empty() {
                self.edit_pending = true;
                self.flush_edit();
            }
        }

        LogEntry::info(format!("Note from {} saved successfully.", ack.key))
    }

    /// Set the preview flag, or flip it when `visible` is `None`.
    pub fn set_preview_visible(&mut self, visible: Option<bool>) -> Option<PreviewUpdate> {
        self.preview_visible = visible.unwrap_or(!self.preview_visible);
        if self.preview_visible {
            self.refresh_preview()
        } else {
            None
        }
    }

    pub fn preview_visible(&self) -> bool {
        self.preview_visible
    }

    fn refresh_preview(&mut self) -> Option<PreviewUpdate> {
        if !self.preview_visible {
            return None;
        }
        let html = render_markdown(&self.text);
        self.preview_html = Some(html.clone());
        Some(PreviewUpdate { html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_keys() -> KeySource {
        let counter = Arc::new(AtomicUsize::new(0));
        Box::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            format!("2024-01-01 10:{:02}", n)
        })
    }

    fn controller(drafts: DraftStore) -> EditorController {
        EditorController::new(drafts, true, Duration::from_secs(30), counting_keys())
    }

    #[test]
    fn flush_writes_draft_and_renders_preview() {
        let mut editor = controller(DraftStore::in_memory());
        editor.record_input("# hi".to_string());

        let update = editor.flush_edit().expect("preview visible");

        assert!(update.html.contains("<h1>hi</h1>"));
        assert!(editor.has_unsaved_changes());
        assert_eq!(editor.snapshot().text, "# hi");
        assert!(editor.flush_edit().is_none());
    }

    #[test]
    fn hidden_preview_skips_rendering() {
        let mut editor = EditorController::new(
            DraftStore::in_memory(),
            false,
            Duration::from_secs(30),
            counting_keys(),
        );
        editor.record_input("text".to_string());
        assert!(editor.flush_edit().is_none());
        assert!(editor.has_unsaved_changes());
    }

    #[test]
    fn no_save_request_without_changes() {
        let mut editor = controller(DraftStore::in_memory());
        assert!(editor.build_save_request().is_none());

        editor.record_input("   ".to_string());
        editor.flush_edit();
        assert!(editor.build_save_request().is_none());
    }

    #[test]
    fn clearing_the_text_drops_draft_and_unsaved_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drafts.json");
        let mut editor = controller(DraftStore::open(&path));

        editor.record_input("x".to_string());
        editor.flush_edit();
        assert!(editor.has_unsaved_changes());

        editor.record_input(String::new());
        editor.flush_edit();

        assert!(editor.build_save_request().is_none());
        assert!(!editor.has_unsaved_changes());
        assert_eq!(DraftStore::open(&path).keys().count(), 0);
    }

    #[test]
    fn successful_ack_clears_only_the_acknowledged_draft() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drafts.json");
        let mut drafts = DraftStore::open(&path);
        drafts.set("2023-12-31 09:00", "stale failure").expect("set");

        let mut editor = controller(drafts);
        editor.record_input("hello".to_string());
        editor.flush_edit();
        let payload = editor.build_save_request().expect("payload");
        assert_eq!(payload.time, "2024-01-01 10:00");

        let log = editor.apply_ack(&SaveAck::success(&payload.time));

        assert!(!log.is_error);
        assert_eq!(editor.session_key(), "2024-01-01 10:01");
        assert!(!editor.has_unsaved_changes());

        let reopened = DraftStore::open(&path);
        assert_eq!(reopened.keys().collect::<Vec<_>>(), vec!["2023-12-31 09:00"]);
    }

    #[test]
    fn failed_ack_keeps_draft_and_pending_flag() {
        let mut editor = controller(DraftStore::in_memory());
        editor.record_input("hello".to_string());
        editor.flush_edit();
        let payload = editor.build_save_request().expect("payload");

        let log = editor.apply_ack(&SaveAck::failure(&payload.time, "disk full"));

        assert!(log.is_error);
        assert!(log.message.contains("disk full"));
        assert_eq!(editor.session_key(), payload.time);
        assert!(editor.has_unsaved_changes());
        assert!(editor.build_save_request().is_some());
    }

    #[test]
    fn text_typed_during_save_moves_to_new_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drafts.json");
        let mut editor = controller(DraftStore::open(&path));

        editor.record_input("first".to_string());
        editor.flush_edit();
        let payload = editor.build_save_request().expect("payload");

        editor.record_input("first and more".to_string());
        editor.flush_edit();
        editor.apply_ack(&SaveAck::success(&payload.time));

        assert!(editor.has_unsaved_changes());
        let reopened = DraftStore::open(&path);
        assert_eq!(
            reopened.latest(),
            Some(("2024-01-01 10:01", "first and more"))
        );
    }

    #[test]
    fn stale_ack_does_not_rotate_current_session() {
        let mut drafts = DraftStore::in_memory();
        drafts.set("2023-12-31 09:00", "old").expect("set");
        let mut editor = controller(drafts);
        editor.record_input("current".to_string());
        editor.flush_edit();

        editor.apply_ack(&SaveAck::success("2023-12-31 09:00"));

        assert_eq!(editor.session_key(), "2024-01-01 10:00");
        assert!(editor.has_unsaved_changes());
    }

    #[test]
    fn restore_adopts_latest_draft_key_and_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("drafts.json");
        {
            let mut drafts = DraftStore::open(&path);
            drafts.set("2024-01-01 08:00", "older").expect("set");
            drafts.set("2024-01-02 08:00", "line one\nline two").expect("set");
        }

        let mut editor = controller(DraftStore::open(&path));
        assert!(editor.restore());

        let snapshot = editor.snapshot();
        assert_eq!(snapshot.session_key, "2024-01-02 08:00");
        assert_eq!(snapshot.text, "line one\nline two");
        assert!(snapshot.restored);
        assert!(editor.has_unsaved_changes());
    }

    #[test]
    fn restore_with_empty_store_keeps_fresh_session() {
        let mut editor = controller(DraftStore::in_memory());
        assert!(!editor.restore());
        assert!(!editor.snapshot().restored);
        assert!(!editor.has_unsaved_changes());
    }

    #[test]
    fn toggling_preview_flips_and_renders_on_show() {
        let mut editor = controller(DraftStore::in_memory());
        editor.record_input("*x*".to_string());
        editor.flush_edit();

        assert!(editor.set_preview_visible(None).is_none());
        assert!(!editor.preview_visible());

        let update = editor.set_preview_visible(Some(true)).expect("rendered");
        assert!(update.html.contains("<em>x</em>"));
    }
}
