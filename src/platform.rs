/// Per-OS behavior, resolved once at startup instead of scattered `cfg!` checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCaps {
    /// Run as an accessory app (no dock icon) while living in the tray.
    pub hide_from_dock: bool,
    /// Tray icons on this platform deliver click events.
    pub tray_click_events: bool,
    /// Tray icons on this platform show a hover tooltip.
    pub tray_tooltip: bool,
    /// Keep the note window out of the taskbar.
    pub skip_taskbar: bool,
}

const MACOS: PlatformCaps = PlatformCaps {
    hide_from_dock: true,
    tray_click_events: true,
    tray_tooltip: true,
    skip_taskbar: true,
};

const WINDOWS: PlatformCaps = PlatformCaps {
    hide_from_dock: false,
    tray_click_events: true,
    tray_tooltip: true,
    skip_taskbar: true,
};

// Linux tray implementations (libappindicator) only expose the menu.
const LINUX: PlatformCaps = PlatformCaps {
    hide_from_dock: false,
    tray_click_events: false,
    tray_tooltip: false,
    skip_taskbar: false,
};

impl PlatformCaps {
    pub fn for_os(os: &str) -> Self {
        match os {
            "macos" => MACOS,
            "windows" => WINDOWS,
            _ => LINUX,
        }
    }

    pub fn current() -> Self {
        Self::for_os(std::env::consts::OS)
    }
}
