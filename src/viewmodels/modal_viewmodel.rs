// ============================================================================
// MODAL VIEWMODEL - Alta/edición, detalle, confirmación y avisos
// ============================================================================
// Un único `ModalManager` por página. Los listeners de los modales se
// registran una vez en `install()`; el estado (pila, confirmación pendiente,
// formulario abierto) vive aquí y el markup en `views::modal_view`.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use crate::catalog::Catalog;
use crate::config::CONFIG;
use crate::dom::{closest_target, get_element_by_id, listen_forever, set_body_scroll_locked};
use crate::error::ValidationError;
use crate::models::form::{build_payload, lookup_options, prefill_fields, FieldPrefill, FormMode, SubmittedField};
use crate::models::module_config::{ModuleConfig, SelectOption, UpdateMethod};
use crate::models::record::{get_nested, Record};
use crate::services::api_client::{ApiClient, HttpMethod, Notifier, RequestBody};
use crate::state::modal_state::{ConfirmSlot, ModalKind, ModalStack, StatusKind};
use crate::utils::dates::now_local;
use crate::utils::debounce::Debouncer;
use crate::utils::format::render_cell;
use crate::views::modal_view::{self, CLOSE_ATTR, CONFIRM_BUTTON_ID, FORM_ID};

/// Callback tras guardar (la tabla vuelve a pedir datos)
pub type OnSaved = Rc<dyn Fn()>;

/// Formulario de alta/edición abierto
struct OpenForm {
    config: ModuleConfig,
    mode: FormMode,
    prefills: Vec<FieldPrefill>,
    options: Vec<Vec<SelectOption>>,
    on_saved: Option<OnSaved>,
}

pub struct ModalManager {
    stack: RefCell<ModalStack>,
    confirm: RefCell<ConfirmSlot<String>>,
    form: RefCell<Option<OpenForm>>,
    /// Cada apertura del formulario invalida las cargas de lookups anteriores
    form_seq: Cell<u64>,
    submitting: Cell<bool>,
    status_timer: Debouncer,
    api: RefCell<Option<ApiClient>>,
}

impl ModalManager {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            stack: RefCell::new(ModalStack::default()),
            confirm: RefCell::new(ConfirmSlot::default()),
            form: RefCell::new(None),
            form_seq: Cell::new(0),
            submitting: Cell::new(false),
            status_timer: Debouncer::with_delay(CONFIG.ui_config.status_auto_close_ms),
            api: RefCell::new(None),
        })
    }

    /// Notifier para el `ApiClient` (referencia débil: el cliente vive dentro del manager)
    pub fn notifier(self: &Rc<Self>) -> Rc<dyn Notifier> {
        Rc::new(ModalNotifier { manager: Rc::downgrade(self) })
    }

    pub fn attach_api(&self, api: ApiClient) {
        *self.api.borrow_mut() = Some(api);
    }

    fn api(&self) -> Option<ApiClient> {
        self.api.borrow().clone()
    }

    // ========================================================================
    // INSTALACIÓN (una vez por página)
    // ========================================================================

    pub fn install(self: &Rc<Self>) -> Result<(), JsValue> {
        modal_view::ensure_modals()?;

        for kind in ModalKind::ALL {
            let Some(root) = modal_view::modal_element(kind) else {
                continue;
            };
            let weak = Rc::downgrade(self);
            let root_for_check = root.clone();
            listen_forever(&root, "click", move |event| {
                let Some(manager) = weak.upgrade() else { return };
                let on_backdrop = event
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                    .is_some_and(|target| target == root_for_check);
                let on_close_button = closest_target(&event, &format!("[{}]", CLOSE_ATTR)).is_some();
                if on_backdrop || on_close_button {
                    manager.close(kind);
                }
            })?;
        }

        if let Some(form) = get_element_by_id(FORM_ID) {
            let weak = Rc::downgrade(self);
            listen_forever(&form, "submit", move |event| {
                event.prevent_default();
                if let Some(manager) = weak.upgrade() {
                    manager.submit_form();
                }
            })?;
        }

        if let Some(button) = get_element_by_id(CONFIRM_BUTTON_ID) {
            let weak = Rc::downgrade(self);
            listen_forever(&button, "click", move |_| {
                if let Some(manager) = weak.upgrade() {
                    manager.run_confirm();
                }
            })?;
        }

        log::info!("✅ [MODAL] Modales instalados");
        Ok(())
    }

    // ========================================================================
    // APERTURA / CIERRE
    // ========================================================================

    fn open(&self, kind: ModalKind) {
        if let Err(e) = modal_view::set_modal_visible(kind, true) {
            log::error!("❌ [MODAL] No se pudo abrir {:?}: {:?}", kind, e);
            return;
        }
        if self.stack.borrow_mut().open(kind) {
            let _ = set_body_scroll_locked(true);
        }
    }

    pub fn close(&self, kind: ModalKind) {
        let _ = modal_view::set_modal_visible(kind, false);
        let unlock = self.stack.borrow_mut().close(kind);
        match kind {
            ModalKind::Confirm => self.confirm.borrow_mut().clear(),
            ModalKind::AddEdit => {
                self.form.borrow_mut().take();
                self.form_seq.set(self.form_seq.get() + 1);
            }
            // El temporizador puede ser quien llama: no se cancela aquí
            ModalKind::Status | ModalKind::View => {}
        }
        if unlock {
            let _ = set_body_scroll_locked(false);
        }
    }

    /// Cierra todo (cambio de módulo)
    pub fn close_all(&self) {
        let was_open = self.stack.borrow_mut().close_all();
        for kind in ModalKind::ALL {
            let _ = modal_view::set_modal_visible(kind, false);
        }
        self.confirm.borrow_mut().clear();
        self.form.borrow_mut().take();
        self.form_seq.set(self.form_seq.get() + 1);
        self.status_timer.cancel();
        let _ = set_body_scroll_locked(false);
        if !was_open.is_empty() {
            log::debug!("🧹 [MODAL] Cerrados {} modales", was_open.len());
        }
    }

    pub fn is_open(&self, kind: ModalKind) -> bool {
        self.stack.borrow().is_open(kind)
    }

    // ========================================================================
    // ESTADO / AVISOS
    // ========================================================================

    /// Aviso con cierre automático por defecto
    pub fn show_info(self: &Rc<Self>, kind: StatusKind, title: &str, message: &str) {
        self.show_info_for(kind, title, message, CONFIG.ui_config.status_auto_close_ms);
    }

    /// Aviso con retardo concreto (0 = no se cierra solo)
    pub fn show_info_for(self: &Rc<Self>, kind: StatusKind, title: &str, message: &str, auto_close_ms: u32) {
        modal_view::render_status(kind, title, message);
        self.open(ModalKind::Status);
        self.status_timer.cancel();
        if auto_close_ms > 0 {
            let weak = Rc::downgrade(self);
            self.status_timer.call_after(auto_close_ms, move || {
                if let Some(manager) = weak.upgrade() {
                    manager.close(ModalKind::Status);
                }
            });
        }
    }

    pub fn show_validation(self: &Rc<Self>, error: &ValidationError) {
        self.show_info(StatusKind::Warning, error.title(), &error.to_string());
    }

    // ========================================================================
    // CONFIRMACIÓN
    // ========================================================================

    /// Una sola confirmación pendiente; `on_confirm` recibe `payload`
    pub fn confirm<F>(&self, title: &str, message: &str, confirm_label: &str, payload: String, on_confirm: F)
    where
        F: FnOnce(String) + 'static,
    {
        modal_view::render_confirm(title, message, confirm_label);
        self.confirm.borrow_mut().arm(payload, on_confirm);
        self.open(ModalKind::Confirm);
    }

    fn run_confirm(&self) {
        // Sacar el callback antes de cerrar (close() limpia el slot)
        let pending = self.confirm.borrow_mut().take();
        self.close(ModalKind::Confirm);
        if let Some(run) = pending {
            run();
        }
    }

    // ========================================================================
    // DETALLE
    // ========================================================================

    pub fn open_view(&self, config: &ModuleConfig, record: &Record) {
        let title = format!("{} Details", config.singular_title());
        if let Err(e) = modal_view::render_view(&title, &view_rows(config, record)) {
            log::error!("❌ [MODAL] Detalle: {:?}", e);
            return;
        }
        self.open(ModalKind::View);
    }

    // ========================================================================
    // ALTA / EDICIÓN
    // ========================================================================

    /// Abre el formulario. Con `record` es edición (el ID sale de la columna ID).
    pub fn open_add_edit(self: &Rc<Self>, config: ModuleConfig, record: Option<Record>, on_saved: Option<OnSaved>) {
        let mode = match record.as_ref().and_then(|r| config.record_id(r)) {
            Some(id) => FormMode::Edit { id },
            None => FormMode::Add,
        };
        let seq = self.form_seq.get() + 1;
        self.form_seq.set(seq);
        let manager = self.clone();

        spawn_local(async move {
            let options = manager.load_field_options(&config).await;
            if manager.form_seq.get() != seq {
                log::debug!("⏭️ [MODAL] Formulario obsoleto descartado");
                return;
            }
            let prefills = prefill_fields(&config.form_fields, record.as_ref(), &mode, now_local());
            let singular = config.singular_title();
            modal_view::render_form_header(&mode.title(&singular), &mode.subtitle(&singular), mode.is_edit());
            if let Err(e) = modal_view::render_form_fields(&config.form_fields, &prefills, &options) {
                log::error!("❌ [MODAL] Campos del formulario: {:?}", e);
                return;
            }
            log::info!("📝 [MODAL] {} ({})", mode.title(&singular), config.name);
            *manager.form.borrow_mut() = Some(OpenForm { config, mode, prefills, options, on_saved });
            manager.submitting.set(false);
            modal_view::set_submit_busy(false);
            manager.open(ModalKind::AddEdit);
        });
    }

    /// Opciones de cada campo: estáticas o del endpoint de lookup
    async fn load_field_options(&self, config: &ModuleConfig) -> Vec<Vec<SelectOption>> {
        let api = self.api();
        let mut all = Vec::with_capacity(config.form_fields.len());
        for field in &config.form_fields {
            let options = match (&field.options, &field.api_lookup, &api) {
                (Some(options), _, _) => options.clone(),
                (None, Some(endpoint), Some(api)) => match api.get(endpoint).await.and_then(|r| r.into_json()) {
                    Some(response) => lookup_options(field, &response),
                    None => Vec::new(),
                },
                _ => Vec::new(),
            };
            all.push(options);
        }
        all
    }

    fn submit_form(self: &Rc<Self>) {
        if self.submitting.get() {
            return;
        }
        let prepared = {
            let form = self.form.borrow();
            let Some(form) = form.as_ref() else {
                return;
            };
            let raw = modal_view::read_form_values(&form.config.form_fields);
            let submitted: Vec<SubmittedField<'_>> = form
                .config
                .form_fields
                .iter()
                .zip(raw)
                .enumerate()
                .map(|(index, (field, raw))| SubmittedField {
                    field,
                    raw,
                    options: form.options.get(index).map(Vec::as_slice).unwrap_or(&[]),
                })
                .collect();
            build_payload(&submitted, &form.prefills, &form.mode).map(|payload| {
                (
                    submit_target(&form.config, &form.mode),
                    payload,
                    form.mode.clone(),
                    form.on_saved.clone(),
                )
            })
        };

        let (target, payload, mode, on_saved) = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                self.show_validation(&error);
                return;
            }
        };
        let Some((endpoint, method)) = target else {
            self.show_info(StatusKind::Error, "Error", "This module has no API endpoint configured.");
            return;
        };
        let Some(api) = self.api() else {
            return;
        };

        self.submitting.set(true);
        modal_view::set_submit_busy(true);
        let manager = self.clone();
        spawn_local(async move {
            log::info!("💾 [MODAL] {} {}", method.as_str(), endpoint);
            let result = api.request(&endpoint, method, Some(RequestBody::Json(Value::Object(payload)))).await;
            manager.submitting.set(false);
            modal_view::set_submit_busy(false);
            if result.is_some() {
                manager.close(ModalKind::AddEdit);
                manager.show_info(StatusKind::Success, "Success", success_message(&mode));
                if let Some(on_saved) = on_saved {
                    on_saved();
                }
            }
        });
    }

    // ========================================================================
    // ALTA RÁPIDA
    // ========================================================================

    /// Formulario de alta de cualquier módulo del catálogo (panel principal)
    pub fn trigger_add_for_module(self: &Rc<Self>, catalog: &Catalog, name: &str, on_saved: Option<OnSaved>) {
        let Some(config) = catalog.get(name) else {
            log::error!("❌ [MODAL] Módulo '{}' no encontrado para alta rápida", name);
            self.show_info(
                StatusKind::Error,
                "Error",
                &format!("Configuration for module '{}' not found for Quick Add.", name),
            );
            return;
        };
        if config.api_endpoint.is_none() || config.form_fields.is_empty() {
            log::error!("❌ [MODAL] Módulo '{}' sin endpoint o campos", name);
            self.show_info(
                StatusKind::Error,
                "Error",
                &format!("Cannot Quick Add for '{}'. Missing configuration.", name),
            );
            return;
        }
        self.open_add_edit(config.clone(), None, on_saved);
    }
}

/// Adaptador `Notifier` -> modal de estado
struct ModalNotifier {
    manager: Weak<ModalManager>,
}

impl Notifier for ModalNotifier {
    fn notify_error(&self, title: &str, message: &str) {
        match self.manager.upgrade() {
            Some(manager) => manager.show_info(StatusKind::Error, title, message),
            None => log::error!("❌ [MODAL] {}: {}", title, message),
        }
    }
}

// ============================================================================
// FUNCIONES PURAS
// ============================================================================

/// Endpoint y verbo del submit: POST `{endpoint}` o PUT/PATCH `{endpoint}{id}`
pub fn submit_target(config: &ModuleConfig, mode: &FormMode) -> Option<(String, HttpMethod)> {
    match mode {
        FormMode::Add => config.api_endpoint.clone().map(|endpoint| (endpoint, HttpMethod::Post)),
        FormMode::Edit { id } => {
            let method = match config.update_method {
                UpdateMethod::Put => HttpMethod::Put,
                UpdateMethod::Patch => HttpMethod::Patch,
            };
            config.item_endpoint(id).map(|endpoint| (endpoint, method))
        }
    }
}

pub fn success_message(mode: &FormMode) -> &'static str {
    match mode {
        FormMode::Add => "Record added successfully.",
        FormMode::Edit { .. } => "Record updated successfully.",
    }
}

/// (etiqueta, markup) de cada campo del detalle; sin `view_fields` se usan las columnas
pub fn view_rows(config: &ModuleConfig, record: &Record) -> Vec<(String, String)> {
    if config.view_fields.is_empty() {
        return config
            .columns
            .iter()
            .map(|c| {
                let html = render_cell(get_nested(record, &c.key), record, c.render, c.fallback.as_deref());
                (c.header.clone(), html)
            })
            .collect();
    }
    config
        .view_fields
        .iter()
        .map(|f| {
            let html = render_cell(get_nested(record, &f.key), record, f.render, f.fallback.as_deref());
            (f.label.clone(), html)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::module_config::{ColumnSpec, ViewFieldSpec};
    use crate::utils::format::{RenderFn, NOT_AVAILABLE};
    use serde_json::json;

    fn config() -> ModuleConfig {
        ModuleConfig::table("garages", "Garage Records", "/garage/", "pages/table-template.html")
            .columns(vec![ColumnSpec::new("id", "ID").id(), ColumnSpec::new("nom_garage", "Name")])
    }

    #[test]
    fn add_posts_to_collection_and_edit_targets_the_item() {
        assert_eq!(
            submit_target(&config(), &FormMode::Add),
            Some(("/garage/".to_string(), HttpMethod::Post))
        );
        assert_eq!(
            submit_target(&config(), &FormMode::Edit { id: "4".into() }),
            Some(("/garage/4".to_string(), HttpMethod::Put))
        );
        let mut patched = config();
        patched.update_method = UpdateMethod::Patch;
        assert_eq!(
            submit_target(&patched, &FormMode::Edit { id: "4".into() }).map(|(_, m)| m),
            Some(HttpMethod::Patch)
        );
        let page = ModuleConfig::page("dashboard_overview", "Dashboard", "pages/dashboard-overview.html");
        assert_eq!(submit_target(&page, &FormMode::Add), None);
    }

    #[test]
    fn view_rows_render_and_fall_back() {
        let config = config().view_fields(vec![
            ViewFieldSpec::new("nom_garage", "Name"),
            ViewFieldSpec::new("phone", "Phone"),
            ViewFieldSpec::new("status", "Status").render(RenderFn::FormatStatus),
        ]);
        let rows = view_rows(&config, &json!({"id": 1, "nom_garage": "Atlas <Auto>", "status": "active"}));
        assert_eq!(rows[0], ("Name".to_string(), "Atlas &lt;Auto&gt;".to_string()));
        assert_eq!(rows[1].1, NOT_AVAILABLE);
        assert_eq!(rows[2].1, "Active");
    }

    #[test]
    fn view_without_fields_uses_columns() {
        let rows = view_rows(&config(), &json!({"id": 9, "nom_garage": "Central"}));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ("ID".to_string(), "9".to_string()));
    }

    #[test]
    fn success_messages() {
        assert_eq!(success_message(&FormMode::Add), "Record added successfully.");
        assert_eq!(success_message(&FormMode::Edit { id: "1".into() }), "Record updated successfully.");
    }
}
