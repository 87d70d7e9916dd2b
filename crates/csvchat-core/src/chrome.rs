//! Sidebar, viewport, and theme flags.

use csvchat_config::ThemeMode;
use log::debug;

/// Presentation flags independent of conversation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiChrome {
    pub sidebar_open: bool,
    pub is_mobile: bool,
    /// Set once the first frame has been drawn.
    pub mounted: bool,
    pub theme: ThemeMode,
}

impl Default for UiChrome {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            is_mobile: false,
            mounted: false,
            theme: ThemeMode::default(),
        }
    }
}

impl UiChrome {
    pub fn with_theme(mut self, theme: ThemeMode) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub fn set_sidebar_open(mut self, open: bool) -> Self {
        self.sidebar_open = open;
        self
    }

    #[must_use]
    pub fn toggle_sidebar(mut self) -> Self {
        self.sidebar_open = !self.sidebar_open;
        self
    }

    /// Entering the compact layout also closes the sidebar.
    #[must_use]
    pub fn set_mobile(mut self, is_mobile: bool) -> Self {
        if is_mobile != self.is_mobile {
            debug!("viewport changed (is_mobile={is_mobile})");
        }
        self.is_mobile = is_mobile;
        if is_mobile {
            self.sidebar_open = false;
        }
        self
    }

    /// Re-run mobile detection for a terminal `width` columns wide.
    #[must_use]
    pub fn set_width(self, width: u16, breakpoint: u16) -> Self {
        self.set_mobile(width < breakpoint)
    }

    #[must_use]
    pub fn set_mounted(mut self, mounted: bool) -> Self {
        self.mounted = mounted;
        self
    }

    /// Close the sidebar after a selection, on mobile only.
    #[must_use]
    pub fn close_sidebar_on_mobile(mut self) -> Self {
        if self.is_mobile {
            self.sidebar_open = false;
        }
        self
    }

    #[must_use]
    pub fn toggle_theme(mut self) -> Self {
        self.theme = match self.theme {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        };
        self
    }
}
