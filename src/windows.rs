use tauri::webview::PageLoadEvent;
use tauri::{AppHandle, Manager, Url, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::commands::config::Config;
use crate::lifecycle::{CloseDisposition, Lifecycle};
use crate::platform::PlatformCaps;
use crate::state::AppState;

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const DEV_SERVER_ENV: &str = "JOTTER_DEV_SERVER_URL";

/// Show the note window, recreating it if it was destroyed. Used by the tray,
/// the global shortcut, second launches and dock reopen.
pub fn show_main_window(app: &AppHandle) {
    if let Err(e) = ensure_main_window(app, true) {
        tracing::error!(error = %e, "failed to show note window");
    }
}

/// The main window, created on first use. With `reveal`, an existing window
/// is un-minimized, shown and focused, and a new one appears once loaded.
pub fn ensure_main_window(app: &AppHandle, reveal: bool) -> tauri::Result<WebviewWindow> {
    let lifecycle = app.state::<Lifecycle>();
    let (window, created) = lifecycle.show_or_create(
        || app.get_webview_window(MAIN_WINDOW_LABEL),
        || build_main_window(app, reveal),
    )?;

    if created {
        tracing::info!("note window created");
    } else if reveal {
        let _ = window.unminimize();
        let _ = window.show();
        let _ = window.set_focus();
    }
    Ok(window)
}

pub fn hide_main_window(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        let _ = window.hide();
    }
}

fn build_main_window(app: &AppHandle, reveal_when_loaded: bool) -> tauri::Result<WebviewWindow> {
    let (config, caps) = match app.try_state::<AppState>() {
        Some(state) => (state.config.clone(), state.caps),
        None => (Config::default(), PlatformCaps::current()),
    };
    let defaults = &config.window.defaults;

    let builder = WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, main_window_url(&config))
        .title(&defaults.title)
        .inner_size(defaults.width, defaults.height)
        .resizable(defaults.resizable)
        .always_on_top(defaults.always_on_top)
        .skip_taskbar(caps.skip_taskbar)
        .visible(false)
        .on_page_load(move |window, payload| {
            if reveal_when_loaded && matches!(payload.event(), PageLoadEvent::Finished) {
                let _ = window.show();
                let _ = window.set_focus();
            }
        });

    let builder = match bottom_right_on_primary(app, &config) {
        Some((x, y)) => builder.position(x, y),
        None => builder.center(),
    };
    let window = builder.build()?;

    let app_handle = app.clone();
    let w = window.clone();
    window.on_window_event(move |event| {
        if let tauri::WindowEvent::CloseRequested { api, .. } = event {
            let lifecycle = app_handle.state::<Lifecycle>();
            if lifecycle.close_disposition() == CloseDisposition::Hide {
                api.prevent_close();
                let _ = w.hide();
                tracing::debug!("close intercepted, window hidden");
            }
        }
    });

    Ok(window)
}

fn main_window_url(config: &Config) -> WebviewUrl {
    if cfg!(debug_assertions) {
        let env_url = std::env::var(DEV_SERVER_ENV).ok();
        if let Some(url) = resolve_dev_url(env_url.as_deref(), &config.debug.client_url) {
            tracing::info!(%url, "loading note window from dev server");
            return WebviewUrl::External(url);
        }
    }
    WebviewUrl::App("index.html".into())
}

/// Environment beats config; blank or unparsable values mean "use the bundle".
fn resolve_dev_url(env_url: Option<&str>, configured: &str) -> Option<Url> {
    [env_url.unwrap_or_default(), configured]
        .into_iter()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .and_then(|candidate| match Url::parse(candidate) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(url = candidate, error = %e, "ignoring invalid dev server url");
                None
            }
        })
}

fn bottom_right_on_primary(app: &AppHandle, config: &Config) -> Option<(f64, f64)> {
    let monitor = app.primary_monitor().ok().flatten()?;
    let scale = monitor.scale_factor();
    let origin = monitor.position().to_logical::<f64>(scale);
    let size = monitor.size().to_logical::<f64>(scale);
    let defaults = &config.window.defaults;

    Some(corner_position(
        (origin.x, origin.y),
        (size.width, size.height),
        (defaults.width, defaults.height),
        config.window.offset,
    ))
}

/// Top-left corner that puts the window `offset` away from the screen's
/// bottom-right, never past the top-left edge.
fn corner_position(
    origin: (f64, f64),
    screen: (f64, f64),
    window: (f64, f64),
    offset: f64,
) -> (f64, f64) {
    let x = origin.0 + screen.0 - (window.0 + offset);
    let y = origin.1 + screen.1 - (window.1 + offset);
    (x.max(origin.0), y.max(origin.1))
}

/// `close-app` from the view: hide, never quit.
#[tauri::command]
pub fn close_app(app: AppHandle) {
    hide_main_window(&app);
}
