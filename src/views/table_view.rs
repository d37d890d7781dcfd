// ============================================================================
// TABLE VIEW - Pintado de la tabla genérica (cabeceras, filas, filtros, paginador)
// ============================================================================
// Solo DOM: el estado y los listeners viven en `TableController`. Los
// contenedores se localizan una vez por módulo con los ids de la plantilla
// `pages/table-template.html`.
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlInputElement};

use crate::dom::{
    append_child, get_element_as, get_element_by_id, query_selector_all, set_hidden, set_inner_html,
    set_text_content, toggle_class, ElementBuilder,
};
use crate::models::module_config::{ColumnSpec, ModuleConfig, SelectOption};
use crate::models::record::{get_nested, Record};
use crate::state::pagination::{PageControl, PageControlKind};
use crate::state::table_state::{DateFilterMode, SortDirection, SortState};
use crate::utils::format::{escape_html, render_cell};

pub const DATE_FILTER_ATTR: &str = "data-date-filter";
pub const CUSTOM_START_ID: &str = "custom-start-date";
pub const CUSTOM_END_ID: &str = "custom-end-date";
pub const APPLY_CUSTOM_ID: &str = "apply-custom-date";
pub const STATUS_SELECT_ID: &str = "status-filter-select";
const CUSTOM_INPUTS_ID: &str = "custom-date-inputs";

const ACTIVE_DATE_CLASSES: [&str; 4] = ["active", "bg-blue-600", "text-white", "border-blue-600"];

/// (valor del botón, etiqueta)
const DATE_FILTERS: [(&str, &str, DateFilterMode); 5] = [
    ("all", "All", DateFilterMode::All),
    ("today", "Today", DateFilterMode::Today),
    ("last7", "Last 7D", DateFilterMode::Last7),
    ("last30", "Last 30D", DateFilterMode::Last30),
    ("custom", "Custom", DateFilterMode::Custom),
];

/// Acción de un botón de fila
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

impl RowAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "view" => Some(RowAction::View),
            "edit" => Some(RowAction::Edit),
            "delete" => Some(RowAction::Delete),
            _ => None,
        }
    }
}

/// Contenedores de la plantilla de tabla
pub struct TableDom {
    pub title: Option<Element>,
    pub search_input: Option<HtmlInputElement>,
    pub add_button: Option<Element>,
    pub filters: Option<Element>,
    pub header_row: Element,
    pub body: Element,
    pub table: Option<Element>,
    pub empty_state: Option<Element>,
    pub record_count: Option<Element>,
    pub pagination: Option<Element>,
}

impl TableDom {
    /// Busca los elementos de la plantilla. Sin cabecera o cuerpo no hay tabla.
    pub fn locate() -> Result<Self, JsValue> {
        let header_row = get_element_by_id("table-header-row")
            .ok_or_else(|| JsValue::from_str("table-header-row not found"))?;
        let body = get_element_by_id("table-body-content")
            .ok_or_else(|| JsValue::from_str("table-body-content not found"))?;

        Ok(Self {
            title: get_element_by_id("table-module-title"),
            search_input: get_element_as::<HtmlInputElement>("table-search-input"),
            add_button: get_element_by_id("add-new-record-button"),
            filters: get_element_by_id("table-filters-container"),
            header_row,
            body,
            table: get_element_by_id("dynamic-crud-table"),
            empty_state: get_element_by_id("table-empty-state"),
            record_count: get_element_by_id("table-record-count-display"),
            pagination: get_element_by_id("table-pagination-controls"),
        })
    }

    pub fn set_title(&self, title: &str) {
        if let Some(element) = &self.title {
            set_text_content(element, if title.is_empty() { "Records" } else { title });
        }
    }

    pub fn search_value(&self) -> String {
        self.search_input.as_ref().map(|input| input.value()).unwrap_or_default()
    }

    pub fn clear_search(&self) {
        if let Some(input) = &self.search_input {
            input.set_value("");
        }
    }

    /// Columnas de cabecera + "Actions"
    fn column_count(&self, columns: &[ColumnSpec]) -> usize {
        let rendered = self.header_row.child_element_count() as usize;
        if rendered > 0 { rendered } else { columns.len() + 1 }
    }

    // ========================================================================
    // CABECERAS
    // ========================================================================

    pub fn render_headers(&self, columns: &[ColumnSpec], sort: &SortState) -> Result<(), JsValue> {
        set_inner_html(&self.header_row, "");
        for column in columns {
            let class = if column.sortable {
                "py-3 px-3 font-semibold text-gray-600 dark:text-gray-300 cursor-pointer hover:bg-gray-100 dark:hover:bg-gray-700"
            } else {
                "py-3 px-3 font-semibold text-gray-600 dark:text-gray-300"
            };
            let mut th = ElementBuilder::new("th")?.class(class).text(&column.header);
            if column.sortable {
                let key = column.effective_sort_key();
                th = th.data("sort-key", key)?;
                let indicator = ElementBuilder::new("span")?
                    .class(if sort.key.as_deref() == Some(key) { "ml-1.5" } else { "ml-1.5 opacity-50" })
                    .text(sort_indicator(sort, key))
                    .build();
                th = th.child(indicator)?;
            }
            append_child(&self.header_row, &th.build())?;
        }
        let actions = ElementBuilder::new("th")?
            .class("py-3 px-3 font-semibold text-gray-600 dark:text-gray-300 text-center")
            .text("Actions")
            .build();
        append_child(&self.header_row, &actions)
    }

    // ========================================================================
    // CUERPO
    // ========================================================================

    pub fn render_loading(&self, columns: &[ColumnSpec]) {
        set_inner_html(&self.body, &loading_row_html(self.column_count(columns)));
    }

    pub fn render_rows(&self, config: &ModuleConfig, rows: &[Record]) -> Result<(), JsValue> {
        set_inner_html(&self.body, "");
        for row in rows {
            let tr = ElementBuilder::new("tr")?
                .class("hover:bg-gray-50 dark:hover:bg-gray-700/40 transition-colors")
                .build();
            for column in &config.columns {
                let td = ElementBuilder::new("td")?
                    .class("py-2.5 px-3")
                    .html(&cell_html(column, row))
                    .build();
                append_child(&tr, &td)?;
            }
            let id = config.record_id(row).unwrap_or_default();
            let actions = ElementBuilder::new("td")?
                .class("py-2.5 px-3 text-center whitespace-nowrap")
                .html(&row_actions_html(&id))
                .build();
            append_child(&tr, &actions)?;
            append_child(&self.body, &tr)?;
        }
        self.show_table(!rows.is_empty(), "No records found.")
    }

    /// Petición fallida: tabla vacía con mensaje
    pub fn render_error(&self) -> Result<(), JsValue> {
        set_inner_html(&self.body, "");
        self.show_table(false, "Could not load records. Try again.")
    }

    fn show_table(&self, has_rows: bool, empty_message: &str) -> Result<(), JsValue> {
        if let Some(empty) = &self.empty_state {
            if !has_rows {
                set_text_content(empty, empty_message);
            }
            set_hidden(empty, has_rows)?;
        }
        if let Some(table) = &self.table {
            set_hidden(table, !has_rows)?;
        }
        Ok(())
    }

    // ========================================================================
    // PAGINACIÓN Y CONTADOR
    // ========================================================================

    pub fn render_pagination(&self, controls: &[PageControl]) -> Result<(), JsValue> {
        let Some(container) = &self.pagination else {
            return Ok(());
        };
        set_inner_html(container, "");
        for control in controls {
            let mut button = ElementBuilder::new("button")?
                .class(&page_button_class(control))
                .text(&page_button_text(control))
                .attr("type", "button")?
                .attr("aria-label", &control.label())?
                .flag("disabled", control.disabled)?;
            if let (Some(target), false) = (control.target, control.disabled) {
                button = button.data("page", &target.to_string())?;
            }
            if control.active {
                button = button.attr("aria-current", "page")?;
            }
            append_child(container, &button.build())?;
        }
        Ok(())
    }

    pub fn render_record_count(&self, label: &str) {
        if let Some(element) = &self.record_count {
            set_text_content(element, label);
        }
    }

    // ========================================================================
    // FILTROS
    // ========================================================================

    pub fn render_filters(&self, config: &ModuleConfig) -> Result<(), JsValue> {
        let Some(container) = &self.filters else {
            return Ok(());
        };
        set_inner_html(container, "");
        let mut any = false;

        if config.has_date_filters {
            any = true;
            let group = ElementBuilder::new("div")?
                .class("flex flex-col sm:flex-row items-start sm:items-center gap-2")
                .html(&date_filter_html())
                .build();
            append_child(container, &group)?;
        }

        if config.status_filter_key.is_some() && !config.status_filter_options.is_empty() {
            any = true;
            let group = ElementBuilder::new("div")?
                .class("flex flex-col sm:flex-row items-start sm:items-center gap-2")
                .html(&status_filter_html(&config.status_filter_options))
                .build();
            append_child(container, &group)?;
        }

        set_hidden(container, !any)
    }

    /// Marca el botón de fecha activo
    pub fn highlight_date_filter(&self, mode: DateFilterMode) -> Result<(), JsValue> {
        let Some(container) = &self.filters else {
            return Ok(());
        };
        for button in query_selector_all(container, ".date-filter-btn")? {
            let is_active = button
                .get_attribute(DATE_FILTER_ATTR)
                .is_some_and(|raw| DateFilterMode::parse(&raw) == mode);
            for class in ACTIVE_DATE_CLASSES {
                toggle_class(&button, class, is_active)?;
            }
        }
        Ok(())
    }

    pub fn show_custom_inputs(&self, visible: bool) -> Result<(), JsValue> {
        if let Some(inputs) = get_element_by_id(CUSTOM_INPUTS_ID) {
            set_hidden(&inputs, !visible)?;
            toggle_class(&inputs, "flex", visible)?;
        }
        Ok(())
    }
}

// ============================================================================
// MARKUP (funciones puras)
// ============================================================================

pub fn sort_indicator(sort: &SortState, key: &str) -> &'static str {
    match (sort.key.as_deref() == Some(key), sort.direction) {
        (true, SortDirection::Asc) => "▲",
        (true, SortDirection::Desc) => "▼",
        (false, _) => "↕",
    }
}

fn cell_html(column: &ColumnSpec, row: &Record) -> String {
    render_cell(get_nested(row, &column.key), row, column.render, column.fallback.as_deref())
}

pub fn row_actions_html(id: &str) -> String {
    let id = escape_html(id);
    format!(
        concat!(
            r#"<button type="button" data-action="view" data-id="{id}" class="text-blue-600 dark:text-blue-400 p-1.5 hover:bg-blue-100 dark:hover:bg-blue-900 rounded-md" title="View">👁</button>"#,
            r#"<button type="button" data-action="edit" data-id="{id}" class="text-green-600 dark:text-green-400 p-1.5 hover:bg-green-100 dark:hover:bg-green-900 rounded-md ml-1" title="Edit">✏️</button>"#,
            r#"<button type="button" data-action="delete" data-id="{id}" class="text-red-600 dark:text-red-400 p-1.5 hover:bg-red-100 dark:hover:bg-red-900 rounded-md ml-1" title="Delete">🗑</button>"#,
        ),
        id = id
    )
}

fn loading_row_html(colspan: usize) -> String {
    format!(
        r#"<tr><td colspan="{}" class="text-center py-10"><div class="loader-container inline-block relative"><div class="loader"></div></div></td></tr>"#,
        colspan.max(1)
    )
}

fn page_button_text(control: &PageControl) -> String {
    match control.kind {
        PageControlKind::Previous => "‹".to_string(),
        PageControlKind::Next => "›".to_string(),
        _ => control.label(),
    }
}

fn page_button_class(control: &PageControl) -> String {
    let base = "px-3 py-1.5 text-sm rounded-md border dark:border-gray-600 transition-colors duration-150 focus:outline-none focus:ring-1 focus:ring-blue-500";
    let state = if control.disabled {
        "bg-gray-100 dark:bg-gray-800 text-gray-400 dark:text-gray-500 cursor-not-allowed"
    } else if control.active {
        "bg-blue-600 text-white border-blue-600"
    } else {
        "bg-white dark:bg-gray-700 text-gray-700 dark:text-gray-200 hover:bg-gray-50 dark:hover:bg-gray-600"
    };
    format!("{} {}", base, state)
}

pub fn date_filter_html() -> String {
    let buttons: String = DATE_FILTERS
        .iter()
        .map(|(value, label, mode)| {
            let class = if *mode == DateFilterMode::All {
                format!("date-filter-btn {}", ACTIVE_DATE_CLASSES.join(" "))
            } else {
                "date-filter-btn".to_string()
            };
            format!(r#"<button type="button" {}="{}" class="{}">{}</button>"#, DATE_FILTER_ATTR, value, class, label)
        })
        .collect();
    format!(
        concat!(
            r#"<label class="text-sm font-medium text-gray-700 dark:text-gray-300 whitespace-nowrap">Date Range:</label>"#,
            r#"<div class="inline-flex rounded-md shadow-sm" role="group">{buttons}</div>"#,
            r#"<div id="{inputs}" class="hidden items-center gap-2 mt-2 sm:mt-0">"#,
            r#"<input type="date" id="{start}" class="form-input-sm">"#,
            r#"<span class="text-sm dark:text-gray-400">to</span>"#,
            r#"<input type="date" id="{end}" class="form-input-sm">"#,
            r#"<button type="button" id="{apply}" class="btn btn-secondary btn-sm">Apply</button>"#,
            r#"</div>"#,
        ),
        buttons = buttons,
        inputs = CUSTOM_INPUTS_ID,
        start = CUSTOM_START_ID,
        end = CUSTOM_END_ID,
        apply = APPLY_CUSTOM_ID,
    )
}

pub fn status_filter_html(options: &[SelectOption]) -> String {
    let options: String = options
        .iter()
        .map(|option| {
            format!(
                r#"<option value="{}">{}</option>"#,
                escape_html(&option.value_string()),
                escape_html(&option.text)
            )
        })
        .collect();
    format!(
        concat!(
            r#"<label for="{id}" class="text-sm font-medium text-gray-700 dark:text-gray-300 whitespace-nowrap">Status:</label>"#,
            r#"<select id="{id}" class="form-select-sm">{options}</select>"#,
        ),
        id = STATUS_SELECT_ID,
        options = options
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_indicator_follows_active_key() {
        let sort = SortState { key: Some("id".into()), direction: SortDirection::Desc };
        assert_eq!(sort_indicator(&sort, "id"), "▼");
        assert_eq!(sort_indicator(&sort, "name"), "↕");
    }

    #[test]
    fn row_actions_carry_escaped_id() {
        let html = row_actions_html("7\"><script>");
        assert_eq!(html.matches("data-id=\"7&quot;&gt;&lt;script&gt;\"").count(), 3);
        for action in ["view", "edit", "delete"] {
            assert!(html.contains(&format!("data-action=\"{}\"", action)));
            assert!(RowAction::parse(action).is_some());
        }
        assert_eq!(RowAction::parse("archive"), None);
    }

    #[test]
    fn date_filter_buttons_cover_every_mode() {
        let html = date_filter_html();
        for (value, _, mode) in DATE_FILTERS {
            assert!(html.contains(&format!("data-date-filter=\"{}\"", value)));
            assert_eq!(DateFilterMode::parse(value), mode);
        }
        assert!(html.contains(APPLY_CUSTOM_ID));
    }

    #[test]
    fn status_options_are_escaped() {
        let html = status_filter_html(&[SelectOption::new("", "All"), SelectOption::new("a&b", "<A>")]);
        assert!(html.contains(r#"<option value="">All</option>"#));
        assert!(html.contains(r#"<option value="a&amp;b">&lt;A&gt;</option>"#));
    }

    #[test]
    fn page_buttons_reflect_state() {
        let active = PageControl { kind: PageControlKind::Page(3), target: Some(3), disabled: false, active: true };
        assert!(page_button_class(&active).contains("bg-blue-600"));
        let prev = PageControl { kind: PageControlKind::Previous, target: Some(1), disabled: true, active: false };
        assert!(page_button_class(&prev).contains("cursor-not-allowed"));
        assert_eq!(page_button_text(&prev), "‹");
    }
}
