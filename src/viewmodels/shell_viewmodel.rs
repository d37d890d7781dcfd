// ============================================================================
// SHELL VIEWMODEL - Router del SPA, navegación y ciclo de vida de módulos
// ============================================================================
// El shell es dueño de la página activa. Antes de montar la siguiente:
// cleanup de la página anterior, teardown de la tabla y cierre de modales.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::PopStateEvent;

use crate::catalog::{Catalog, OVERVIEW_MODULE};
use crate::config::CONFIG;
use crate::dom::{
    closest_target, data_attributes, get_attribute, get_element_by_id, listen_forever, redirect, set_document_title,
    window,
};
use crate::models::module_config::ModuleConfig;
use crate::services::api_client::ApiClient;
use crate::services::auth_service::perform_logout;
use crate::services::session_service::current_user_display;
use crate::services::template_service::{content_load_error_html, fetch_template};
use crate::state::app_state::AppState;
use crate::state::modal_state::StatusKind;
use crate::utils::debounce::{GlooScheduler, Scheduler};
use crate::viewmodels::modal_viewmodel::ModalManager;
use crate::viewmodels::overview_viewmodel::OverviewPage;
use crate::viewmodels::table_viewmodel::TableController;
use crate::views::shell_view::{
    self, CLOSE_SIDEBAR_ID, LOGOUT_BUTTON_ID, MOBILE_MENU_ID, NAV_LIST_ID, SIDEBAR_OVERLAY_ID, THEME_TOGGLE_ID,
};

const MANIFEST_ID: &str = "module-manifest";

/// Página montada en el área de contenido
enum ActivePage {
    None,
    Overview(Rc<OverviewPage>),
    Table(Rc<TableController>),
}

pub struct Shell {
    state: AppState,
    catalog: Rc<Catalog>,
    modals: Rc<ModalManager>,
    api: ApiClient,
    page: RefCell<ActivePage>,
    load_seq: Cell<u64>,
}

impl Shell {
    /// Arranca el dashboard (la sesión ya está validada)
    pub fn start() -> Result<Rc<Self>, JsValue> {
        let marker = &CONFIG.table_config.table_template_marker;
        let mut catalog = Catalog::fleet(marker).map_err(|e| JsValue::from_str(&e.to_string()))?;

        apply_manifest(&mut catalog, marker);
        shell_view::render_nav_if_empty(catalog.modules())?;
        apply_nav_overrides(&mut catalog, marker);

        let modals = ModalManager::new();
        modals.install()?;
        let weak_modals = Rc::downgrade(&modals);
        let api = ApiClient::new(
            modals.notifier(),
            Rc::new(move || {
                log::warn!("🔒 [SHELL] Sesión expirada, volviendo al login");
                sign_out(weak_modals.upgrade(), &SESSION_EXPIRED);
            }),
        );
        modals.attach_api(api.clone());

        let state = AppState::new();
        state.set_user(current_user_display());
        shell_view::render_user(&state.user.borrow());
        shell_view::apply_theme(state.theme())?;
        shell_view::apply_sidebar(false)?;

        let shell = Rc::new(Self {
            state,
            catalog: Rc::new(catalog),
            modals,
            api,
            page: RefCell::new(ActivePage::None),
            load_seq: Cell::new(0),
        });

        shell.bind()?;

        let hash = window().and_then(|w| w.location().hash().ok()).unwrap_or_default();
        let initial = module_from_hash(&hash, &CONFIG.ui_config.default_module);
        log::info!("🚀 [SHELL] Módulo inicial: {}", initial);
        shell.load_module(&initial, false);
        Ok(shell)
    }

    // ========================================================================
    // LISTENERS DEL SHELL (viven lo que vive la página)
    // ========================================================================

    fn bind(self: &Rc<Self>) -> Result<(), JsValue> {
        if let Some(nav) = get_element_by_id(NAV_LIST_ID) {
            let weak = Rc::downgrade(self);
            listen_forever(&nav, "click", move |event| {
                let Some(shell) = weak.upgrade() else { return };
                let Some(link) = closest_target(&event, ".nav-link") else { return };
                event.prevent_default();
                let name = get_attribute(&link, "data-module")
                    .or_else(|| get_attribute(&link, "href").map(|href| href.trim_start_matches('#').to_string()))
                    .unwrap_or_default();
                if !shell_view::is_desktop_width() {
                    shell.set_sidebar(false);
                }
                shell.load_module(&name, true);
            })?;
        }

        if let Some(win) = window() {
            let weak = Rc::downgrade(self);
            listen_forever(&win, "popstate", move |event| {
                let Some(shell) = weak.upgrade() else { return };
                let from_state = event
                    .dyn_ref::<PopStateEvent>()
                    .and_then(|e| js_sys::Reflect::get(&e.state(), &JsValue::from_str("module")).ok())
                    .and_then(|module| module.as_string());
                let name = from_state.unwrap_or_else(|| {
                    let hash = window().and_then(|w| w.location().hash().ok()).unwrap_or_default();
                    module_from_hash(&hash, &CONFIG.ui_config.default_module)
                });
                let name = if shell.catalog.get(&name).is_some() { name } else { OVERVIEW_MODULE.to_string() };
                log::info!("↩️ [SHELL] popstate -> {}", name);
                shell.load_module(&name, false);
            })?;
        }

        if let Some(toggle) = get_element_by_id(THEME_TOGGLE_ID) {
            let state = self.state.clone();
            listen_forever(&toggle, "click", move |_| {
                let _ = shell_view::apply_theme(state.toggle_theme());
            })?;
        }

        if let Some(menu) = get_element_by_id(MOBILE_MENU_ID) {
            let weak = Rc::downgrade(self);
            listen_forever(&menu, "click", move |_| {
                if let Some(shell) = weak.upgrade() {
                    shell.set_sidebar(!shell.state.is_sidebar_open());
                }
            })?;
        }

        for id in [CLOSE_SIDEBAR_ID, SIDEBAR_OVERLAY_ID] {
            if let Some(element) = get_element_by_id(id) {
                let weak = Rc::downgrade(self);
                listen_forever(&element, "click", move |_| {
                    if let Some(shell) = weak.upgrade() {
                        shell.set_sidebar(false);
                    }
                })?;
            }
        }

        if let Some(button) = get_element_by_id(LOGOUT_BUTTON_ID) {
            let weak = Rc::downgrade(self);
            listen_forever(&button, "click", move |event| {
                event.prevent_default();
                let Some(shell) = weak.upgrade() else { return };
                sign_out(Some(shell.modals.clone()), &LOGGED_OUT);
            })?;
        }

        Ok(())
    }

    fn set_sidebar(&self, open: bool) {
        self.state.set_sidebar_open(open);
        let _ = shell_view::apply_sidebar(open);
    }

    // ========================================================================
    // CARGA DE MÓDULOS
    // ========================================================================

    /// Limpia la página actual, inyecta la plantilla del módulo y lo inicializa
    pub fn load_module(self: &Rc<Self>, name: &str, push_history: bool) {
        if name.is_empty() {
            self.cleanup();
            shell_view::hide_initial_loader();
            shell_view::render_welcome();
            return;
        }
        let Some(config) = self.catalog.get(name).cloned() else {
            log::warn!("⚠️ [SHELL] Módulo desconocido: '{}'", name);
            self.cleanup();
            shell_view::hide_initial_loader();
            shell_view::render_module_not_found();
            return;
        };

        self.cleanup();
        let seq = self.load_seq.get() + 1;
        self.load_seq.set(seq);

        shell_view::hide_initial_loader();
        shell_view::show_content_loading();
        log::info!("📦 [SHELL] Cargando '{}' desde {}", config.name, config.content_url);

        let shell = self.clone();
        spawn_local(async move {
            let template = fetch_template(&config.content_url).await;
            if shell.load_seq.get() != seq {
                log::debug!("⏭️ [SHELL] Carga de '{}' superada por otra navegación", config.name);
                return;
            }

            let loaded = match template {
                Ok(html) => {
                    shell_view::set_main_content(&html);
                    true
                }
                Err(reason) => {
                    log::error!("❌ [SHELL] Plantilla de '{}': {}", config.name, reason);
                    shell_view::set_main_content(&content_load_error_html(&config.title, &config.content_url, &reason));
                    false
                }
            };

            if push_history {
                push_history_state(&config);
            }
            let _ = shell_view::highlight_active(&config.href());
            set_document_title(&shell_view::document_title(&config.title, &config.name));

            if loaded {
                shell.init_page(config);
            }
        });
    }

    /// Inicializador específico si existe, si no la tabla genérica
    fn init_page(&self, config: ModuleConfig) {
        let mounted = if config.name == OVERVIEW_MODULE {
            OverviewPage::mount(self.api.clone(), self.modals.clone(), self.catalog.clone()).map(ActivePage::Overview)
        } else if config.is_table_module(&CONFIG.table_config.table_template_marker) {
            TableController::mount(config, self.api.clone(), self.modals.clone()).map(ActivePage::Table)
        } else {
            log::info!("ℹ️ [SHELL] '{}' no necesita inicialización", config.name);
            Ok(ActivePage::None)
        };

        match mounted {
            Ok(page) => *self.page.borrow_mut() = page,
            Err(e) => log::error!("❌ [SHELL] Error inicializando módulo: {:?}", e),
        }
    }

    fn cleanup(&self) {
        let previous = self.page.replace(ActivePage::None);
        match &previous {
            ActivePage::Overview(page) => page.teardown(),
            ActivePage::Table(table) => table.teardown(),
            ActivePage::None => {}
        }
        drop(previous);
        self.modals.close_all();
    }
}

// ============================================================================
// LOGOUT (botón o 401)
// ============================================================================

struct LogoutNotice {
    kind: StatusKind,
    title: &'static str,
    message: &'static str,
}

const LOGGED_OUT: LogoutNotice = LogoutNotice {
    kind: StatusKind::Success,
    title: "Logged Out",
    message: "You have been successfully logged out.",
};

const SESSION_EXPIRED: LogoutNotice = LogoutNotice {
    kind: StatusKind::Warning,
    title: "Session Expired",
    message: "Your session has expired. Please log in again.",
};

/// Borra la sesión, avisa y vuelve al login cuando el aviso ya se ha visto
fn sign_out(modals: Option<Rc<ModalManager>>, notice: &LogoutNotice) {
    perform_logout();
    let redirect_timer = schedule_logout(
        &GlooScheduler,
        CONFIG.ui_config.logout_redirect_ms,
        || {
            if let Some(modals) = modals {
                modals.show_info_for(notice.kind, notice.title, notice.message, CONFIG.ui_config.logout_notice_ms);
            }
        },
        || {
            if let Err(e) = redirect(&CONFIG.login_page) {
                log::error!("❌ [SHELL] Redirección al login fallida: {:?}", e);
            }
        },
    );
    redirect_timer.forget();
}

/// El aviso sale ya; la redirección queda programada
fn schedule_logout<S: Scheduler>(
    scheduler: &S,
    redirect_ms: u32,
    notify: impl FnOnce(),
    redirect_to_login: impl FnOnce() + 'static,
) -> S::Handle {
    notify();
    scheduler.schedule(redirect_ms, Box::new(redirect_to_login))
}

fn push_history_state(config: &ModuleConfig) {
    let Some(history) = window().and_then(|w| w.history().ok()) else {
        return;
    };
    let href = config.href();
    let state = serde_json::json!({ "module": config.name, "href": href }).to_string();
    match js_sys::JSON::parse(&state) {
        Ok(state) => {
            if let Err(e) = history.push_state_with_url(&state, "", Some(&href)) {
                log::warn!("⚠️ [SHELL] pushState falló: {:?}", e);
            }
        }
        Err(e) => log::warn!("⚠️ [SHELL] Estado de historial inválido: {:?}", e),
    }
}

/// `<script type="application/json" id="module-manifest">` con módulos extra o
/// redefinidos; un manifiesto inválido se ignora entero
fn apply_manifest(catalog: &mut Catalog, marker: &str) {
    let Some(script) = get_element_by_id(MANIFEST_ID) else {
        return;
    };
    let raw = script.text_content().unwrap_or_default();
    match ModuleConfig::from_manifest(&raw, marker) {
        Ok(modules) => {
            log::info!("🗂️ [SHELL] Manifiesto con {} módulos", modules.len());
            for module in modules {
                catalog.override_with(module);
            }
        }
        Err(e) => log::error!("❌ [SHELL] Manifiesto de módulos inválido: {}", e),
    }
}

/// Los enlaces del menú pueden redefinir módulos con `data-columns`, o
/// declarar módulos que el catálogo no conoce
fn apply_nav_overrides(catalog: &mut Catalog, marker: &str) {
    for link in shell_view::nav_links() {
        let attributes = data_attributes(&link);
        if !should_override(&attributes, catalog) {
            continue;
        }
        match ModuleConfig::from_nav_attributes(&attributes, marker) {
            Ok(module) => {
                log::info!("🧭 [SHELL] Módulo '{}' definido desde el menú", module.name);
                catalog.override_with(module);
            }
            Err(e) => log::warn!("⚠️ [SHELL] Enlace de menú ignorado: {}", e),
        }
    }
}

fn should_override(attributes: &HashMap<String, String>, catalog: &Catalog) -> bool {
    let Some(name) = attributes.get("data-module") else {
        return false;
    };
    attributes.contains_key("data-columns") || catalog.get(name).is_none()
}

/// `#vehicles` -> `vehicles`; vacío -> módulo por defecto
pub fn module_from_hash(hash: &str, default_module: &str) -> String {
    let name = hash.trim_start_matches('#').trim();
    if name.is_empty() {
        default_module.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::debounce::fake::FakeScheduler;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn hash_routes_to_module_or_default() {
        assert_eq!(module_from_hash("#vehicles", OVERVIEW_MODULE), "vehicles");
        assert_eq!(module_from_hash("", OVERVIEW_MODULE), OVERVIEW_MODULE);
        assert_eq!(module_from_hash("#", OVERVIEW_MODULE), OVERVIEW_MODULE);
    }

    #[test]
    fn plain_nav_links_keep_catalog_definition() {
        let catalog = Catalog::fleet("table-template.html").unwrap();
        assert!(!should_override(&attrs(&[("data-module", "vehicles"), ("data-title", "Vehicles")]), &catalog));
        assert!(should_override(&attrs(&[("data-module", "vehicles"), ("data-columns", "[]")]), &catalog));
        assert!(should_override(&attrs(&[("data-module", "tyres")]), &catalog));
        assert!(!should_override(&attrs(&[("data-title", "Orphan")]), &catalog));
    }

    #[test]
    fn logout_notice_shows_before_redirect() {
        let clock = FakeScheduler::default();
        let notified = Rc::new(Cell::new(false));
        let redirected = Rc::new(Cell::new(false));

        let flag = redirected.clone();
        let _timer = schedule_logout(&clock, 1600, || notified.set(true), move || flag.set(true));
        assert!(notified.get());
        assert!(!redirected.get());

        // el aviso se cierra a los 1500 ms; la redirección llega después
        clock.advance(1500);
        assert!(!redirected.get());
        clock.advance(100);
        assert!(redirected.get());
    }
}
