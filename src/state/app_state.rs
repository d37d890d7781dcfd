// ============================================================================
// APP STATE - Estado global del shell (tema, sidebar, usuario)
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::auth::UserDisplay;
use crate::utils::storage::{load_raw_from_storage, save_raw_to_storage};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Valor guardado, o la preferencia del sistema si no hay ninguno
    pub fn resolve(stored: Option<&str>, prefers_dark: bool) -> Self {
        match stored {
            Some("dark") => Theme::Dark,
            Some("light") => Theme::Light,
            _ if prefers_dark => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Estado global de la aplicación
#[derive(Clone)]
pub struct AppState {
    pub theme: Rc<RefCell<Theme>>,
    pub sidebar_open: Rc<RefCell<bool>>,
    pub user: Rc<RefCell<UserDisplay>>,
}

impl AppState {
    /// Crear nuevo estado de aplicación
    pub fn new() -> Self {
        // Sin JSON: el script inline del HTML lee la misma clave
        let stored = load_raw_from_storage(THEME_KEY);
        let theme = Theme::resolve(stored.as_deref(), Self::prefers_dark());

        Self {
            theme: Rc::new(RefCell::new(theme)),
            sidebar_open: Rc::new(RefCell::new(false)),
            user: Rc::new(RefCell::new(UserDisplay::guest())),
        }
    }

    fn prefers_dark() -> bool {
        web_sys::window()
            .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
            .map(|query| query.matches())
            .unwrap_or(false)
    }

    pub fn theme(&self) -> Theme {
        *self.theme.borrow()
    }

    /// Cambia el tema y lo persiste bajo `theme`
    pub fn toggle_theme(&self) -> Theme {
        let next = self.theme().toggled();
        *self.theme.borrow_mut() = next;
        if let Err(e) = save_raw_to_storage(THEME_KEY, next.as_str()) {
            log::warn!("⚠️ [THEME] {}", e);
        }
        log::info!("🎨 [THEME] Tema: {}", next.as_str());
        next
    }

    pub fn set_sidebar_open(&self, open: bool) {
        *self.sidebar_open.borrow_mut() = open;
    }

    pub fn is_sidebar_open(&self) -> bool {
        *self.sidebar_open.borrow()
    }

    pub fn set_user(&self, user: UserDisplay) {
        *self.user.borrow_mut() = user;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_theme_wins_over_system_preference() {
        assert_eq!(Theme::resolve(Some("light"), true), Theme::Light);
        assert_eq!(Theme::resolve(Some("dark"), false), Theme::Dark);
        assert_eq!(Theme::resolve(None, true), Theme::Dark);
        assert_eq!(Theme::resolve(Some("garbage"), false), Theme::Light);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn persisted_theme_reads_back() {
        for theme in [Theme::Light, Theme::Dark] {
            assert_eq!(Theme::resolve(Some(theme.toggled().as_str()), false), theme.toggled());
            assert_eq!(Theme::resolve(Some(theme.as_str()), true), theme);
        }
    }
}
