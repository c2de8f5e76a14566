use std::fs;
use std::path::Path;
use tauri::AppHandle;
use tauri_plugin_autostart::ManagerExt;

use crate::storage;

/// Written once auto-launch has been offered so a user's opt-out sticks.
const AUTOLAUNCH_MARKER: &str = "autolaunch-configured";

/// Enable launch-at-login on first run. Failures only cost the feature.
pub fn setup_autolaunch(app: &AppHandle) {
    let Some(marker) = storage::app_dir().map(|dir| dir.join(AUTOLAUNCH_MARKER)) else {
        tracing::warn!("no home directory, skipping auto-launch setup");
        return;
    };

    if !should_enable_on_launch(&marker) {
        tracing::debug!(enabled = is_autolaunch_enabled(app), "auto-launch already configured");
        return;
    }

    if toggle_autolaunch(app, true) {
        if let Err(e) = fs::write(&marker, chrono::Local::now().to_rfc3339()) {
            tracing::warn!(path = %marker.display(), error = %e, "could not record auto-launch setup");
        }
    }
}

fn should_enable_on_launch(marker: &Path) -> bool {
    !marker.exists()
}

pub fn is_autolaunch_enabled(app: &AppHandle) -> bool {
    match app.autolaunch().is_enabled() {
        Ok(enabled) => enabled,
        Err(e) => {
            tracing::warn!(error = %e, "failed to check auto-launch state");
            false
        }
    }
}

/// Returns whether the requested state was applied.
pub fn toggle_autolaunch(app: &AppHandle, enabled: bool) -> bool {
    let autolaunch = app.autolaunch();
    let result = if enabled {
        autolaunch.enable()
    } else {
        autolaunch.disable()
    };

    match result {
        Ok(()) => {
            tracing::info!(enabled, "auto-launch updated");
            true
        }
        Err(e) => {
            tracing::warn!(enabled, error = %e, "failed to update auto-launch");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_enables_and_marker_suppresses_later_runs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join(AUTOLAUNCH_MARKER);

        assert!(should_enable_on_launch(&marker));
        fs::write(&marker, "done").expect("write");
        assert!(!should_enable_on_launch(&marker));
    }
}
