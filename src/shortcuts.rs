use tauri::AppHandle;
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut};

use crate::commands::config::Config;

/// Parse an accelerator such as `CommandOrControl+Shift+N`. `CommandOrControl`
/// resolves to Cmd on macOS and Ctrl elsewhere.
pub fn parse_shortcut_string(accelerator: &str) -> Result<Shortcut, String> {
    let trimmed = accelerator.trim();
    if trimmed.is_empty() {
        return Err("empty shortcut".to_string());
    }
    trimmed
        .parse::<Shortcut>()
        .map_err(|e| format!("invalid shortcut '{}': {}", trimmed, e))
}

/// Register the show-window shortcut. Failure (bad accelerator or a key
/// combination owned by another app) leaves the tray as the only entry point.
pub fn register_show_shortcut(app: &AppHandle, config: &Config) -> bool {
    let accelerator = &config.window.global_shortcut;
    let shortcut = match parse_shortcut_string(accelerator) {
        Ok(shortcut) => shortcut,
        Err(e) => {
            tracing::warn!(error = %e, "global shortcut not registered");
            return false;
        }
    };

    match app.global_shortcut().register(shortcut) {
        Ok(()) => {
            tracing::info!(shortcut = %accelerator, "global shortcut registered");
            true
        }
        Err(e) => {
            tracing::warn!(shortcut = %accelerator, error = %e, "failed to register global shortcut");
            false
        }
    }
}

pub fn unregister_all(app: &AppHandle) {
    if let Err(e) = app.global_shortcut().unregister_all() {
        tracing::warn!(error = %e, "failed to unregister global shortcuts");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tauri_plugin_global_shortcut::{Code, Modifiers};

    #[test]
    fn default_accelerator_parses() {
        let shortcut = parse_shortcut_string(&Config::default().window.global_shortcut)
            .expect("default shortcut");

        assert_eq!(shortcut.key, Code::KeyN);
        assert!(shortcut.mods.contains(Modifiers::SHIFT));
        let platform_mod = if cfg!(target_os = "macos") {
            Modifiers::SUPER
        } else {
            Modifiers::CONTROL
        };
        assert!(shortcut.mods.contains(platform_mod));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let shortcut = parse_shortcut_string("  Alt+Space ").expect("shortcut");
        assert_eq!(shortcut.key, Code::Space);
        assert!(shortcut.mods.contains(Modifiers::ALT));
    }

    #[test]
    fn empty_and_unknown_accelerators_are_rejected() {
        assert!(parse_shortcut_string("").is_err());
        assert!(parse_shortcut_string("Shift+NotAKey").is_err());
    }
}
