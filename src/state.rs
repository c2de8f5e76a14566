use std::sync::{Mutex, MutexGuard};

use crate::commands::config::Config;
use crate::commands::notes::NoteWriter;
use crate::editor::{EditorController, EditorScheduler};
use crate::instance_lock::InstanceLock;
use crate::platform::PlatformCaps;

/// Everything the shell owns once initialization has finished.
pub struct AppState {
    pub config: Config,
    pub caps: PlatformCaps,
    pub notes: NoteWriter,
    pub editor: Mutex<EditorController>,
    pub scheduler: EditorScheduler,
    pub instance_lock: Mutex<Option<InstanceLock>>,
}

impl AppState {
    pub fn editor(&self) -> MutexGuard<'_, EditorController> {
        self.editor.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn release_instance_lock(&self) {
        let lock = self
            .instance_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(mut lock) = lock {
            lock.release();
        }
    }
}
