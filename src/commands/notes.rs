use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Manager};

use crate::bridge::{SaveAck, SavePayload};
use crate::commands::editor::publish_ack;
use crate::error::NoteError;
use crate::state::AppState;
use crate::storage;

/// `**title**`, the raw body, then a `---` rule.
pub fn format_entry(title: &str, content: &str) -> String {
    format!("**{}**\n{}\n---", title, content)
}

/// One file per calendar day, named by ISO date.
pub fn daily_file_name(date: NaiveDate) -> String {
    format!("{}.md", date.format("%Y-%m-%d"))
}

fn validate_payload(payload: &SavePayload) -> Result<(), NoteError> {
    if payload.time.trim().is_empty() {
        return Err(NoteError::InvalidPayload("missing session key"));
    }
    if payload.content.trim().is_empty() {
        return Err(NoteError::InvalidPayload("empty note"));
    }
    Ok(())
}

/// Prepends entries to daily files. Read-modify-write cycles on the same
/// path are serialized; different days never block each other.
#[derive(Default)]
pub struct NoteWriter {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl NoteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn prepend(&self, path: &Path, title: &str, content: &str) -> Result<(), NoteError> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let existing = storage::read_optional(path)?.unwrap_or_default();
        let updated = format!("{}\n\n{}", format_entry(title, content), existing);
        storage::write_atomic(path, &updated)
    }

    /// Writes `payload` into `folder`'s file for `day` and builds the reply.
    pub fn append_note(&self, payload: &SavePayload, folder: &Path, day: NaiveDate) -> SaveAck {
        let result = validate_payload(payload).and_then(|()| {
            let path = folder.join(daily_file_name(day));
            self.prepend(&path, &payload.time, &payload.content)
                .map(|()| path)
        });

        match result {
            Ok(path) => {
                tracing::info!(key = %payload.time, path = %path.display(), "note prepended");
                SaveAck::success(&payload.time)
            }
            Err(e) => {
                tracing::error!(key = %payload.time, error = %e, "failed to save note");
                SaveAck::failure(&payload.time, e)
            }
        }
    }
}

/// Shell side of a save request: the daily file is picked at save time so
/// a long-running process rolls over at midnight.
pub fn handle_save_request(state: &AppState, payload: &SavePayload) -> SaveAck {
    state
        .notes
        .append_note(payload, &state.config.save_path, Local::now().date_naive())
}

/// Fire-and-forget save; the reply arrives as a `note-saved` event. The file
/// write runs on the blocking pool, off the event loop.
#[tauri::command]
pub async fn save_note(app: AppHandle, payload: SavePayload) -> Result<(), String> {
    tauri::async_runtime::spawn_blocking(move || {
        let Some(state) = app.try_state::<AppState>() else {
            tracing::warn!(key = %payload.time, "save requested before startup finished");
            return;
        };
        let ack = handle_save_request(&state, &payload);
        publish_ack(&app, &state, &ack);
    })
    .await
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;

    fn payload(time: &str, content: &str) -> SavePayload {
        SavePayload {
            time: time.to_string(),
            content: content.to_string(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
    }

    #[test]
    fn first_entry_in_empty_day_matches_file_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = NoteWriter::new();

        let ack = writer.append_note(&payload("2024-01-01 10:00", "hello"), dir.path(), day());

        assert_eq!(ack, SaveAck::success("2024-01-01 10:00"));
        let content = fs::read_to_string(dir.path().join("2024-01-01.md")).expect("read");
        assert_eq!(content, "**2024-01-01 10:00**\nhello\n---\n\n");
    }

    #[test]
    fn later_entries_are_placed_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = NoteWriter::new();

        writer.append_note(&payload("2024-01-01 10:00", "first"), dir.path(), day());
        writer.append_note(&payload("2024-01-01 10:05", "second"), dir.path(), day());

        let content = fs::read_to_string(dir.path().join("2024-01-01.md")).expect("read");
        assert_eq!(
            content,
            "**2024-01-01 10:05**\nsecond\n---\n\n**2024-01-01 10:00**\nfirst\n---\n\n"
        );
    }

    #[test]
    fn same_key_twice_is_not_deduplicated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = NoteWriter::new();

        writer.append_note(&payload("2024-01-01 10:00", "draft"), dir.path(), day());
        writer.append_note(&payload("2024-01-01 10:00", "draft"), dir.path(), day());

        let content = fs::read_to_string(dir.path().join("2024-01-01.md")).expect("read");
        assert_eq!(content.matches("**2024-01-01 10:00**").count(), 2);
    }

    #[test]
    fn different_days_go_to_different_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = NoteWriter::new();
        let next_day = NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date");

        writer.append_note(&payload("2024-01-01 23:59", "late"), dir.path(), day());
        writer.append_note(&payload("2024-01-01 23:59", "later"), dir.path(), next_day);

        assert!(dir.path().join("2024-01-01.md").exists());
        assert!(dir.path().join("2024-01-02.md").exists());
    }

    #[test]
    fn missing_folder_yields_failed_ack_with_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = NoteWriter::new();

        let ack = writer.append_note(
            &payload("2024-01-01 10:00", "hello"),
            &dir.path().join("gone"),
            day(),
        );

        assert!(!ack.is_success);
        assert_eq!(ack.key, "2024-01-01 10:00");
        assert!(ack.error.is_some());
    }

    #[test]
    fn empty_content_is_rejected_without_touching_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = NoteWriter::new();

        let ack = writer.append_note(&payload("2024-01-01 10:00", "  \n"), dir.path(), day());

        assert!(!ack.is_success);
        assert_eq!(ack.key, "2024-01-01 10:00");
        assert!(!dir.path().join("2024-01-01.md").exists());
    }

    #[test]
    fn concurrent_appends_to_one_file_lose_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = Arc::new(NoteWriter::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let writer = Arc::clone(&writer);
                let folder = dir.path().to_path_buf();
                thread::spawn(move || {
                    writer.append_note(
                        &payload(&format!("2024-01-01 10:{:02}", i), &format!("entry {}", i)),
                        &folder,
                        day(),
                    )
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().expect("thread").is_success);
        }

        let content = fs::read_to_string(dir.path().join("2024-01-01.md")).expect("read");
        for i in 0..16 {
            assert!(content.contains(&format!("entry {}\n---", i)));
        }
        assert_eq!(content.matches("\n---\n\n").count(), 16);
    }
}
