use std::path::{Path, PathBuf};
use tauri::{AppHandle, State};
use tauri_plugin_opener::OpenerExt;

use crate::state::AppState;

/// Folders to try, in order: the save folder when it exists, then the
/// desktop, then home.
fn folders_to_try(save_path: &Path, desktop: Option<PathBuf>, home: Option<PathBuf>) -> Vec<PathBuf> {
    let mut folders = Vec::with_capacity(3);
    if save_path.is_dir() {
        folders.push(save_path.to_path_buf());
    }
    folders.extend(desktop);
    folders.extend(home);
    folders.dedup();
    folders
}

/// Open the notes folder in the platform file manager. Failures are logged only.
#[tauri::command]
pub fn open_file_explorer(app: AppHandle, state: State<'_, AppState>) {
    let candidates = folders_to_try(&state.config.save_path, dirs::desktop_dir(), dirs::home_dir());

    for folder in candidates {
        match app
            .opener()
            .open_path(folder.to_string_lossy().to_string(), None::<&str>)
        {
            Ok(()) => {
                tracing::info!(path = %folder.display(), "opened folder");
                return;
            }
            Err(e) => {
                tracing::warn!(path = %folder.display(), error = %e, "failed to open folder");
            }
        }
    }
    tracing::error!("could not open any folder in the file explorer");
}
