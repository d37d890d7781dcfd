// ============================================================================
// OVERVIEW VIEWMODEL - Panel principal (KPIs + alta rápida)
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::catalog::Catalog;
use crate::dom::{closest_target, get_attribute, get_element_by_id, has_class, set_hidden, ListenerRegistry};
use crate::models::record::PaginatedResponse;
use crate::services::api_client::{ApiClient, ApiResponse};
use crate::utils::dates::{iso_date, parse_date, today};
use crate::viewmodels::modal_viewmodel::{ModalManager, OnSaved};
use crate::views::overview_view::{
    self, kpi_queries, render_kpi, QUICK_ADD_BUTTON_ID, QUICK_ADD_DROPDOWN_ID, QUICK_ADD_LINK_CLASS,
    QUICK_ADD_TARGET_ATTR,
};

pub struct OverviewPage {
    api: ApiClient,
    modals: Rc<ModalManager>,
    catalog: Rc<Catalog>,
    day: Cell<NaiveDate>,
    load_seq: Cell<u64>,
    alive: Cell<bool>,
    listeners: RefCell<ListenerRegistry>,
}

impl OverviewPage {
    pub fn mount(api: ApiClient, modals: Rc<ModalManager>, catalog: Rc<Catalog>) -> Result<Rc<Self>, JsValue> {
        let page = Rc::new(Self {
            api,
            modals,
            catalog,
            day: Cell::new(today()),
            load_seq: Cell::new(0),
            alive: Cell::new(true),
            listeners: RefCell::new(ListenerRegistry::new()),
        });

        overview_view::render_quick_add_links(page.catalog.modules())?;
        if let Some(input) = overview_view::date_filter_input() {
            input.set_value(&iso_date(page.day.get()));
        }
        page.bind()?;
        page.load_kpis();
        log::info!("📊 [OVERVIEW] Panel principal inicializado");
        Ok(page)
    }

    fn bind(self: &Rc<Self>) -> Result<(), JsValue> {
        let mut listeners = self.listeners.borrow_mut();

        if let Some(input) = overview_view::date_filter_input() {
            let weak = Rc::downgrade(self);
            let source = input.clone();
            listeners.listen(&input, "change", move |_| {
                let Some(page) = weak.upgrade() else { return };
                let day = parse_date(&source.value()).unwrap_or_else(today);
                page.day.set(day);
                page.load_kpis();
            })?;
        }

        if let Some(button) = get_element_by_id(QUICK_ADD_BUTTON_ID) {
            listeners.listen(&button, "click", move |event| {
                event.prevent_default();
                if let Some(dropdown) = get_element_by_id(QUICK_ADD_DROPDOWN_ID) {
                    let _ = set_hidden(&dropdown, !has_class(&dropdown, "hidden"));
                }
            })?;
        }

        if let Some(dropdown) = get_element_by_id(QUICK_ADD_DROPDOWN_ID) {
            let weak = Rc::downgrade(self);
            let selector = format!(".{}", QUICK_ADD_LINK_CLASS);
            let menu = dropdown.clone();
            listeners.listen(&dropdown, "click", move |event| {
                let Some(page) = weak.upgrade() else { return };
                let Some(link) = closest_target(&event, &selector) else { return };
                event.prevent_default();
                let _ = set_hidden(&menu, true);
                if let Some(target) = get_attribute(&link, QUICK_ADD_TARGET_ATTR) {
                    page.modals.trigger_add_for_module(&page.catalog, &target, Some(page.on_saved()));
                }
            })?;
        }

        Ok(())
    }

    fn on_saved(self: &Rc<Self>) -> OnSaved {
        let weak = Rc::downgrade(self);
        Rc::new(move || {
            if let Some(page) = weak.upgrade() {
                page.load_kpis();
            }
        })
    }

    /// Pide los contadores del día seleccionado; las cargas anteriores se ignoran
    fn load_kpis(self: &Rc<Self>) {
        let seq = self.load_seq.get() + 1;
        self.load_seq.set(seq);

        for query in kpi_queries(self.day.get()) {
            render_kpi(query.element_id, None);
            let api = self.api.clone();
            let weak = Rc::downgrade(self);
            spawn_local(async move {
                let response = api.get_with_query(query.endpoint, &query.pairs).await;
                let Some(page) = weak.upgrade() else { return };
                if !page.alive.get() || page.load_seq.get() != seq {
                    return;
                }
                let total = response
                    .and_then(ApiResponse::into_json)
                    .map(|json| PaginatedResponse::from_value(&json).total);
                render_kpi(query.element_id, total);
            });
        }
    }

    pub fn teardown(&self) {
        if self.alive.replace(false) {
            self.listeners.borrow_mut().clear();
            log::info!("🧹 [OVERVIEW] Panel principal desmontado");
        }
    }
}

impl Drop for OverviewPage {
    fn drop(&mut self) {
        self.teardown();
    }
}
