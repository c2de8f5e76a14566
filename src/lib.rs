pub mod bridge;
pub mod commands;
pub mod editor;
pub mod error;
pub mod instance_lock;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod shortcuts;
pub mod state;
pub mod storage;
pub mod tray;
pub mod windows;

use std::sync::Mutex;
use tauri::{AppHandle, Manager, RunEvent};
use tauri_plugin_autostart::MacosLauncher;
use tauri_plugin_global_shortcut::ShortcutState;

use commands::config::{resolve_config, Config, ConfigSources, CONFIG_FILE_NAME, INSTALLER_INI_NAME};
use commands::{autostart, config, editor as editor_commands, explorer, notes};
use editor::drafts::DRAFTS_FILE_NAME;
use editor::scheduler::EDIT_DEBOUNCE;
use editor::{DraftStore, EditorController, EditorScheduler};
use instance_lock::{InstanceLock, LOCK_FILE_NAME};
use lifecycle::{Lifecycle, HIDDEN_FLAG};
use platform::PlatformCaps;
use state::AppState;
use windows::show_main_window;

pub fn run() {
    let log_dir = storage::app_dir().map(|dir| dir.join("logs"));
    let mut logging_guard = Some(logging::init(log_dir.as_deref()));

    let caps = PlatformCaps::current();
    let lifecycle = Lifecycle::from_args(std::env::args());
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        hidden = lifecycle.started_hidden(),
        ?caps,
        "starting jotter"
    );

    let built = tauri::Builder::default()
        // Must be registered first so a second launch exits before touching anything.
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            tracing::info!("second launch detected, showing existing window");
            show_main_window(app);
        }))
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, _shortcut, event| {
                    if event.state != ShortcutState::Pressed {
                        return;
                    }
                    show_main_window(app);
                })
                .build(),
        )
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            Some(vec![HIDDEN_FLAG]),
        ))
        .plugin(tauri_plugin_opener::init())
        .manage(lifecycle)
        .setup(move |app| {
            #[cfg(target_os = "macos")]
            if caps.hide_from_dock {
                app.set_activation_policy(tauri::ActivationPolicy::Accessory);
            }

            initialize(app.handle(), caps)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            notes::save_note,
            windows::close_app,
            explorer::open_file_explorer,
            config::get_config,
            editor_commands::editor_startup,
            editor_commands::update_draft,
            editor_commands::request_save,
            editor_commands::request_close,
            editor_commands::toggle_preview,
            editor_commands::has_unsaved_changes,
        ])
        .build(tauri::generate_context!());

    let app = match built {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "failed to start jotter");
            drop(logging_guard.take());
            std::process::exit(1);
        }
    };

    app.run(move |app, event| match event {
        RunEvent::ExitRequested { api, code, .. } => {
            // Hiding the last window must not end a tray app.
            if code.is_none() && !app.state::<Lifecycle>().is_quitting() {
                api.prevent_exit();
            }
        }
        RunEvent::Exit => {
            shutdown_services(app);
            tracing::info!("jotter exited");
            drop(logging_guard.take());
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => show_main_window(app),
        _ => {}
    });
}

/// Everything between plugin setup and the first frame. Only a failure to
/// create the note window is fatal; the rest degrades with a log line.
fn initialize(app: &AppHandle, caps: PlatformCaps) -> Result<(), Box<dyn std::error::Error>> {
    let lifecycle = app.state::<Lifecycle>();
    lifecycle.begin_initializing();

    let app_dir = storage::app_dir();
    if app_dir.is_none() {
        tracing::warn!("no home directory, drafts and settings will not persist");
    }

    let instance_lock = app_dir.as_deref().and_then(|dir| {
        match InstanceLock::acquire(&dir.join(LOCK_FILE_NAME)) {
            Ok((lock, outcome)) => {
                tracing::info!(?outcome, "instance lock acquired");
                Some(lock)
            }
            Err(e) => {
                tracing::warn!(error = %e, "running without a lock file");
                None
            }
        }
    });

    let sources = ConfigSources {
        json_override: app_dir.as_ref().map(|dir| dir.join(CONFIG_FILE_NAME)),
        installer_ini: app
            .path()
            .resource_dir()
            .ok()
            .map(|dir| dir.join(INSTALLER_INI_NAME)),
        home: dirs::home_dir(),
    };
    let config = resolve_config(Config::default(), &sources);
    tracing::info!(save_path = %config.save_path.display(), "configuration loaded");

    let drafts = match app_dir.as_deref() {
        Some(dir) => DraftStore::open(&dir.join(DRAFTS_FILE_NAME)),
        None => DraftStore::in_memory(),
    };
    let mut editor = EditorController::new(
        drafts,
        config.is_preview_visible,
        config.autosave_interval(),
        Box::new(editor::session_key_now),
    );
    editor.restore();

    let worker_handle = app.clone();
    let scheduler = EditorScheduler::start(EDIT_DEBOUNCE, editor.autosave_interval(), move |intent| {
        editor_commands::perform_intent(&worker_handle, intent)
    })?;

    app.manage(AppState {
        config: config.clone(),
        caps,
        notes: notes::NoteWriter::new(),
        editor: Mutex::new(editor),
        scheduler,
        instance_lock: Mutex::new(instance_lock),
    });

    autostart::setup_autolaunch(app);

    windows::ensure_main_window(app, !lifecycle.started_hidden())?;

    if let Err(e) = tray::setup_tray(app, caps) {
        tracing::error!(error = %e, "tray icon unavailable, use the global shortcut");
    }
    shortcuts::register_show_shortcut(app, &config);

    lifecycle.mark_running();
    tracing::info!("jotter ready");
    Ok(())
}

/// Tray "Quit": the only path that actually ends the process.
pub fn quit_app(app: &AppHandle) {
    if !app.state::<Lifecycle>().request_quit() {
        return;
    }
    shutdown_services(app);
    app.exit(0);
}

/// Idempotent; runs on quit and again on the final exit event.
fn shutdown_services(app: &AppHandle) {
    if let Some(state) = app.try_state::<AppState>() {
        state.scheduler.shutdown();
    }
    shortcuts::unregister_all(app);
    let _ = app.remove_tray_by_id(tray::TRAY_ID);
    if let Some(state) = app.try_state::<AppState>() {
        state.release_instance_lock();
    }
}
