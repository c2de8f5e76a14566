use std::time::Duration;
use tauri::{AppHandle, Emitter, Manager, State};

use crate::bridge::{
    EditorSnapshot, SaveAck, EVENT_EDITOR_LOG, EVENT_NOTE_SAVED, EVENT_PREVIEW_UPDATED,
};
use crate::commands::notes::handle_save_request;
use crate::editor::Intent;
use crate::state::AppState;
use crate::windows::hide_main_window;

/// How long a close waits for the final save before hiding anyway.
const CLOSE_SAVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs on the editor worker thread for every scheduler intent.
pub fn perform_intent(app: &AppHandle, intent: Intent) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };

    match intent {
        Intent::Flush => {
            let update = state.editor().flush_edit();
            if let Some(update) = update {
                emit(app, EVENT_PREVIEW_UPDATED, &update);
            }
        }
        Intent::Save => {
            // The editor lock is released before the disk write.
            let request = state.editor().build_save_request();
            let Some(payload) = request else {
                return;
            };
            let ack = handle_save_request(&state, &payload);
            publish_ack(app, &state, &ack);
        }
    }
}

/// Reconcile a save reply with the editor and tell the view about it.
pub fn publish_ack(app: &AppHandle, state: &AppState, ack: &SaveAck) {
    let log = state.editor().apply_ack(ack);
    emit(app, EVENT_NOTE_SAVED, ack);
    emit(app, EVENT_EDITOR_LOG, &log);
}

fn emit<S: serde::Serialize + Clone>(app: &AppHandle, event: &str, payload: &S) {
    if let Err(e) = app.emit(event, payload.clone()) {
        tracing::warn!(event, error = %e, "failed to emit event");
    }
}

/// Called by the view once loaded; returns whatever it should paint.
#[tauri::command]
pub fn editor_startup(state: State<'_, AppState>) -> EditorSnapshot {
    state.editor().snapshot()
}

#[tauri::command]
pub fn update_draft(state: State<'_, AppState>, text: String) {
    state.editor().record_input(text);
    state.scheduler.notify_edit();
}

#[tauri::command]
pub fn request_save(state: State<'_, AppState>) {
    state.scheduler.request_save();
}

/// Save whatever is pending, then hide. The window is hidden even when the
/// save times out; the draft survives either way.
#[tauri::command]
pub async fn request_close(app: AppHandle) -> Result<(), String> {
    let pending = app
        .try_state::<AppState>()
        .is_some_and(|state| state.editor().has_unsaved_changes());

    if pending {
        let handle = app.clone();
        let saved = tauri::async_runtime::spawn_blocking(move || {
            handle
                .try_state::<AppState>()
                .is_some_and(|state| state.scheduler.save_and_wait(CLOSE_SAVE_TIMEOUT))
        })
        .await
        .map_err(|e| e.to_string())?;

        if !saved {
            tracing::warn!("closing before the final save was confirmed");
        }
    }
    hide_main_window(&app);
    Ok(())
}

/// Flip (or set) preview visibility; returns the new state.
#[tauri::command]
pub fn toggle_preview(app: AppHandle, state: State<'_, AppState>, visible: Option<bool>) -> bool {
    let (update, now_visible) = {
        let mut editor = state.editor();
        let update = editor.set_preview_visible(visible);
        (update, editor.preview_visible())
    };
    if let Some(update) = update {
        emit(&app, EVENT_PREVIEW_UPDATED, &update);
    }
    now_visible
}

#[tauri::command]
pub fn has_unsaved_changes(state: State<'_, AppState>) -> bool {
    state.editor().has_unsaved_changes()
}
