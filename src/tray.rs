use tauri::menu::{CheckMenuItem, Menu, MenuItem, PredefinedMenuItem};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::AppHandle;

use crate::commands::autostart;
use crate::platform::PlatformCaps;
use crate::windows::show_main_window;

pub const TRAY_ID: &str = "main-tray";
const TOOLTIP: &str = "Jotter";

const MENU_SHOW: &str = "show";
const MENU_AUTOLAUNCH: &str = "autolaunch";
const MENU_QUIT: &str = "quit";

pub fn setup_tray(app: &AppHandle, caps: PlatformCaps) -> tauri::Result<()> {
    let show = MenuItem::with_id(app, MENU_SHOW, "Show Notes", true, None::<&str>)?;
    let launch_at_login = CheckMenuItem::with_id(
        app,
        MENU_AUTOLAUNCH,
        "Launch at Login",
        true,
        autostart::is_autolaunch_enabled(app),
        None::<&str>,
    )?;
    let separator = PredefinedMenuItem::separator(app)?;
    let quit = MenuItem::with_id(app, MENU_QUIT, "Quit", true, None::<&str>)?;

    let menu = Menu::with_items(app, &[&show, &launch_at_login, &separator, &quit])?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .menu(&menu)
        .show_menu_on_left_click(!caps.tray_click_events);

    match app.default_window_icon() {
        Some(icon) => builder = builder.icon(icon.clone()),
        None => tracing::warn!("no default window icon, tray may be blank"),
    }
    if caps.tray_tooltip {
        builder = builder.tooltip(TOOLTIP);
    }

    let check = launch_at_login.clone();
    builder
        .on_menu_event(move |app, event| match event.id.as_ref() {
            MENU_SHOW => show_main_window(app),
            MENU_AUTOLAUNCH => {
                // The item has already flipped by the time the event arrives.
                let wanted = check.is_checked().unwrap_or(false);
                if !autostart::toggle_autolaunch(app, wanted) {
                    let _ = check.set_checked(!wanted);
                }
            }
            MENU_QUIT => crate::quit_app(app),
            _ => {}
        })
        .on_tray_icon_event(move |tray, event| {
            if !caps.tray_click_events {
                return;
            }
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                show_main_window(tray.app_handle());
            }
        })
        .build(app)?;

    tracing::info!("tray icon ready");
    Ok(())
}
