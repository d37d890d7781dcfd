// ============================================================================
// APP - Punto de entrada por página (login o dashboard)
// ============================================================================

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::config::CONFIG;
use crate::dom::{append_child, document, get_element_by_id, redirect, window};
use crate::services::auth_service::perform_login;
use crate::services::session_service::{check_auth, clear_session};
use crate::state::modal_state::StatusKind;
use crate::viewmodels::modal_viewmodel::ModalManager;
use crate::viewmodels::shell_viewmodel::Shell;
use crate::views::login_view::{render_login, set_login_busy, show_login_error};

/// Aplicación montada en la página actual
pub enum App {
    Login(Rc<ModalManager>),
    Dashboard(Rc<Shell>),
    /// Sesión inválida: ya se está redirigiendo al login
    Redirecting,
}

impl App {
    pub fn new() -> Result<Self, JsValue> {
        if is_login_page() {
            return Self::login().map(App::Login);
        }

        let status = check_auth();
        if !status.is_valid() {
            log::warn!("🔒 [APP] Sesión no válida ({:?}), redirigiendo al login", status);
            clear_session();
            redirect(&CONFIG.login_page)?;
            return Ok(App::Redirecting);
        }

        Shell::start().map(App::Dashboard)
    }

    fn login() -> Result<Rc<ModalManager>, JsValue> {
        let modals = ModalManager::new();
        modals.install()?;

        let status_modals = modals.clone();
        let form = render_login(Rc::new(move |username, password| {
            let modals = status_modals.clone();
            set_login_busy(true);
            spawn_local(async move {
                match perform_login(&username, &password).await {
                    Ok(_) => {
                        if let Err(e) = redirect(&CONFIG.dashboard_page) {
                            log::error!("❌ [APP] Redirección al dashboard falló: {:?}", e);
                        }
                    }
                    Err(message) => {
                        set_login_busy(false);
                        show_login_error(Some(&message));
                        modals.show_info(StatusKind::Error, "Login Failed", &message);
                    }
                }
            });
        }))?;

        let root = get_element_by_id("app")
            .or_else(|| document().and_then(|d| d.body()).map(Into::into))
            .ok_or_else(|| JsValue::from_str("No #app element or body found"))?;
        append_child(&root, &form)?;
        log::info!("✅ [APP] Pantalla de login lista");
        Ok(modals)
    }
}

fn is_login_page() -> bool {
    let path = window().and_then(|w| w.location().pathname().ok()).unwrap_or_default();
    is_login_path(&path, &CONFIG.login_page)
}

/// `/static/login.html` cuenta como página de login si coincide el nombre
pub fn is_login_path(path: &str, login_page: &str) -> bool {
    let page = login_page.rsplit('/').next().unwrap_or(login_page);
    !page.is_empty() && path.ends_with(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_matches_by_file_name() {
        assert!(is_login_path("/static/login.html", "login.html"));
        assert!(is_login_path("/login.html", "/login.html"));
        assert!(!is_login_path("/dashboard.html", "login.html"));
        assert!(!is_login_path("/", "login.html"));
    }
}
