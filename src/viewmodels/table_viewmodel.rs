// ============================================================================
// TABLE VIEWMODEL - Controlador de la tabla genérica de un módulo
// ============================================================================
// Un `TableController` por módulo activo. Traduce eventos del DOM a
// transiciones de `TableState` y ejecuta los efectos (pedir datos, repintar).
// El shell lo suelta al navegar: sus listeners se eliminan con el registry y
// las respuestas que lleguen después se descartan.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::config::CONFIG;
use crate::dom::{closest_target, control_value_by_id, get_attribute, ListenerRegistry};
use crate::models::module_config::ModuleConfig;
use crate::services::api_client::{ApiClient, ApiResponse, HttpMethod};
use crate::state::modal_state::StatusKind;
use crate::state::pagination::{page_controls, record_range_label};
use crate::state::table_state::{DateFilterMode, TableEffect, TablePhase, TableState};
use crate::utils::dates::today;
use crate::utils::debounce::Debouncer;
use crate::viewmodels::modal_viewmodel::{ModalManager, OnSaved};
use crate::views::table_view::{
    RowAction, TableDom, APPLY_CUSTOM_ID, CUSTOM_END_ID, CUSTOM_START_ID, DATE_FILTER_ATTR, STATUS_SELECT_ID,
};

pub struct TableController {
    config: ModuleConfig,
    state: RefCell<TableState>,
    dom: TableDom,
    api: ApiClient,
    modals: Rc<ModalManager>,
    search: Debouncer,
    alive: Cell<bool>,
    listeners: RefCell<ListenerRegistry>,
}

impl TableController {
    /// Monta la tabla del módulo sobre la plantilla ya inyectada y pide la primera página
    pub fn mount(config: ModuleConfig, api: ApiClient, modals: Rc<ModalManager>) -> Result<Rc<Self>, JsValue> {
        let dom = TableDom::locate()?;
        let state = TableState::for_module(&config, CONFIG.table_config.page_size);
        log::info!("📋 [TABLE] Montando tabla '{}' ({} columnas)", config.name, config.columns.len());

        let controller = Rc::new(Self {
            config,
            state: RefCell::new(state),
            dom,
            api,
            modals,
            search: Debouncer::with_delay(CONFIG.table_config.search_debounce_ms),
            alive: Cell::new(true),
            listeners: RefCell::new(ListenerRegistry::new()),
        });

        controller.dom.set_title(&controller.config.title);
        controller.dom.clear_search();
        controller.dom.render_headers(&controller.config.columns, &controller.state.borrow().sort)?;
        controller.dom.render_filters(&controller.config)?;
        controller.bind()?;
        controller.refresh();
        Ok(controller)
    }

    /// Vuelve a pedir la página actual
    pub fn refresh(self: &Rc<Self>) {
        self.apply(vec![TableEffect::Fetch]);
    }

    /// Deja de reaccionar: quita listeners y cancela la búsqueda pendiente
    pub fn teardown(&self) {
        if !self.alive.replace(false) {
            return;
        }
        self.search.cancel();
        self.listeners.borrow_mut().clear();
        log::info!("🧹 [TABLE] Tabla '{}' desmontada", self.config.name);
    }

    fn on_saved(self: &Rc<Self>) -> OnSaved {
        let weak = Rc::downgrade(self);
        Rc::new(move || {
            if let Some(controller) = weak.upgrade() {
                if controller.alive.get() {
                    controller.refresh();
                }
            }
        })
    }

    // ========================================================================
    // LISTENERS
    // ========================================================================

    fn bind(self: &Rc<Self>) -> Result<(), JsValue> {
        let mut listeners = self.listeners.borrow_mut();

        if let Some(button) = &self.dom.add_button {
            let weak = Rc::downgrade(self);
            listeners.listen(button, "click", move |_| {
                if let Some(c) = weak.upgrade() {
                    c.modals.open_add_edit(c.config.clone(), None, Some(c.on_saved()));
                }
            })?;
        }

        if let Some(input) = &self.dom.search_input {
            let weak = Rc::downgrade(self);
            listeners.listen(input, "input", move |_| {
                let Some(c) = weak.upgrade() else { return };
                let term = c.dom.search_value();
                let weak = Rc::downgrade(&c);
                c.search.call(move || {
                    if let Some(c) = weak.upgrade() {
                        let effects = c.state.borrow_mut().set_search(&term);
                        c.apply(effects);
                    }
                });
            })?;
        }

        let weak = Rc::downgrade(self);
        listeners.listen(&self.dom.header_row, "click", move |event| {
            let Some(c) = weak.upgrade() else { return };
            if let Some(key) = closest_target(&event, "th[data-sort-key]").and_then(|th| get_attribute(&th, "data-sort-key")) {
                let effects = c.state.borrow_mut().toggle_sort(&key);
                c.apply(effects);
            }
        })?;

        let weak = Rc::downgrade(self);
        listeners.listen(&self.dom.body, "click", move |event| {
            let Some(c) = weak.upgrade() else { return };
            let Some(button) = closest_target(&event, "button[data-action]") else { return };
            let action = get_attribute(&button, "data-action").and_then(|a| RowAction::parse(&a));
            let id = get_attribute(&button, "data-id").unwrap_or_default();
            if let Some(action) = action {
                c.row_action(action, id);
            }
        })?;

        if let Some(pagination) = &self.dom.pagination {
            let weak = Rc::downgrade(self);
            listeners.listen(pagination, "click", move |event| {
                let Some(c) = weak.upgrade() else { return };
                let page = closest_target(&event, "button[data-page]")
                    .and_then(|b| get_attribute(&b, "data-page"))
                    .and_then(|p| p.parse::<u32>().ok());
                if let Some(page) = page {
                    let effects = c.state.borrow_mut().go_to_page(page);
                    c.apply(effects);
                }
            })?;
        }

        if let Some(filters) = &self.dom.filters {
            let weak = Rc::downgrade(self);
            listeners.listen(filters, "click", move |event| {
                let Some(c) = weak.upgrade() else { return };
                if let Some(button) = closest_target(&event, ".date-filter-btn") {
                    let mode = get_attribute(&button, DATE_FILTER_ATTR)
                        .map(|raw| DateFilterMode::parse(&raw))
                        .unwrap_or_default();
                    if let Err(e) = c.dom.highlight_date_filter(mode) {
                        log::warn!("⚠️ [TABLE] Filtro de fecha sin resaltar: {:?}", e);
                    }
                    let effects = c.state.borrow_mut().select_date_filter(mode);
                    c.apply(effects);
                } else if closest_target(&event, &format!("#{}", APPLY_CUSTOM_ID)).is_some() {
                    c.apply_custom_range();
                }
            })?;

            let weak = Rc::downgrade(self);
            listeners.listen(filters, "change", move |event| {
                let Some(c) = weak.upgrade() else { return };
                if closest_target(&event, &format!("#{}", STATUS_SELECT_ID)).is_some() {
                    let value = control_value_by_id(STATUS_SELECT_ID);
                    let effects = c.state.borrow_mut().set_status_filter(&value);
                    c.apply(effects);
                }
            })?;
        }

        log::debug!("🎧 [TABLE] {} listeners registrados", listeners.len());
        Ok(())
    }

    // ========================================================================
    // EFECTOS
    // ========================================================================

    fn apply(self: &Rc<Self>, effects: Vec<TableEffect>) {
        if !self.alive.get() {
            return;
        }
        for effect in effects {
            match effect {
                TableEffect::Fetch => self.fetch(),
                TableEffect::RenderHeaders => {
                    let state = self.state.borrow();
                    if let Err(e) = self.dom.render_headers(&self.config.columns, &state.sort) {
                        log::error!("❌ [TABLE] Cabeceras: {:?}", e);
                    }
                }
                TableEffect::ShowCustomInputs(visible) => {
                    if let Err(e) = self.dom.show_custom_inputs(visible) {
                        log::warn!("⚠️ [TABLE] Rango personalizado: {:?}", e);
                    }
                }
            }
        }
    }

    fn apply_custom_range(self: &Rc<Self>) {
        let start = control_value_by_id(CUSTOM_START_ID);
        let end = control_value_by_id(CUSTOM_END_ID);
        let result = self.state.borrow_mut().apply_custom_range(&start, &end);
        match result {
            Ok(effects) => self.apply(effects),
            Err(error) => self.modals.show_validation(&error),
        }
    }

    fn fetch(self: &Rc<Self>) {
        let Some(endpoint) = self.config.api_endpoint.clone() else {
            return;
        };
        let (ticket, pairs) = {
            let mut state = self.state.borrow_mut();
            let ticket = state.begin_fetch();
            (ticket, state.query_pairs(&self.config, today()))
        };
        self.dom.render_loading(&self.config.columns);

        let api = self.api.clone();
        let weak: Weak<Self> = Rc::downgrade(self);
        spawn_local(async move {
            let response = api.get_with_query(&endpoint, &pairs).await;
            let Some(c) = weak.upgrade() else { return };
            if !c.alive.get() {
                log::debug!("⏭️ [TABLE] Respuesta tras desmontar descartada");
                return;
            }
            let json = response.and_then(ApiResponse::into_json);
            let applied = c.state.borrow_mut().complete_fetch(ticket, json.as_ref());
            if !applied {
                log::debug!("⏭️ [TABLE] Respuesta obsoleta descartada");
                return;
            }
            c.render_current();
        });
    }

    fn render_current(&self) {
        let state = self.state.borrow();
        let rendered = match state.phase {
            TablePhase::Error => self.dom.render_error(),
            _ => self.dom.render_rows(&self.config, &state.data),
        };
        if let Err(e) = rendered {
            log::error!("❌ [TABLE] Filas: {:?}", e);
        }
        let controls = page_controls(state.current_page, state.total, state.page_size);
        if let Err(e) = self.dom.render_pagination(&controls) {
            log::error!("❌ [TABLE] Paginación: {:?}", e);
        }
        self.dom.render_record_count(&record_range_label(
            state.current_page,
            state.page_size,
            state.total,
            state.data.len(),
        ));
        log::info!(
            "✅ [TABLE] {}: página {} ({} de {})",
            self.config.name,
            state.current_page,
            state.data.len(),
            state.total
        );
    }

    // ========================================================================
    // ACCIONES DE FILA
    // ========================================================================

    fn row_action(self: &Rc<Self>, action: RowAction, id: String) {
        let record = self.state.borrow().find_row(&self.config, &id).cloned();
        match action {
            RowAction::View => match record {
                Some(record) => self.modals.open_view(&self.config, &record),
                None => log::warn!("⚠️ [TABLE] Registro {} no está en la página", id),
            },
            RowAction::Edit => match record {
                Some(record) => self.modals.open_add_edit(self.config.clone(), Some(record), Some(self.on_saved())),
                None => log::warn!("⚠️ [TABLE] Registro {} no está en la página", id),
            },
            RowAction::Delete => {
                let weak = Rc::downgrade(self);
                self.modals.confirm(
                    "Confirm Deletion",
                    &delete_message(&self.config, &id),
                    "Delete",
                    id,
                    move |id| {
                        if let Some(c) = weak.upgrade() {
                            c.delete(id);
                        }
                    },
                );
            }
        }
    }

    fn delete(self: &Rc<Self>, id: String) {
        let Some(endpoint) = self.config.item_endpoint(&id) else {
            return;
        };
        let api = self.api.clone();
        let weak = Rc::downgrade(self);
        spawn_local(async move {
            log::info!("🗑️ [TABLE] DELETE {}", endpoint);
            let result = api.request(&endpoint, HttpMethod::Delete, None).await;
            let Some(c) = weak.upgrade() else { return };
            if !c.alive.get() {
                return;
            }
            let effects = if result.is_some() {
                c.modals.show_info(StatusKind::Success, "Success", "Record deleted successfully.");
                c.state.borrow_mut().after_delete_success()
            } else {
                c.modals.show_info(
                    StatusKind::Error,
                    "Error",
                    "Failed to delete record. It might be in use or an error occurred.",
                );
                vec![TableEffect::Fetch]
            };
            c.apply(effects);
        });
    }
}

impl Drop for TableController {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Texto del diálogo de borrado
pub fn delete_message(config: &ModuleConfig, id: &str) -> String {
    format!(
        "Are you sure you want to delete this {} (ID: {})? This action cannot be undone.",
        config.singular_title().to_lowercase(),
        id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_message_names_the_record() {
        let config = ModuleConfig::table("vehicles", "Vehicle Records", "/vehicle/", "pages/table-template.html");
        assert_eq!(
            delete_message(&config, "12"),
            "Are you sure you want to delete this vehicle (ID: 12)? This action cannot be undone."
        );
    }
}
