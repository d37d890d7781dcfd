// ============================================================================
// OVERVIEW VIEW - KPIs y menú de alta rápida del panel principal
// ============================================================================

use chrono::{Datelike, NaiveDate};
use wasm_bindgen::prelude::*;
use web_sys::HtmlInputElement;

use crate::dom::{append_child, get_element_as, get_element_by_id, set_text_by_id, ElementBuilder};
use crate::models::module_config::ModuleConfig;
use crate::utils::dates::iso_date;

pub const DATE_FILTER_ID: &str = "dashboardDateFilter";
pub const QUICK_ADD_BUTTON_ID: &str = "quickAddBtn";
pub const QUICK_ADD_DROPDOWN_ID: &str = "quickAddDropdown";
pub const QUICK_ADD_LINK_CLASS: &str = "quick-add-link";
pub const QUICK_ADD_TARGET_ATTR: &str = "data-target-module";

/// Un contador del panel: `total` de una consulta de una sola fila
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiQuery {
    pub element_id: &'static str,
    pub endpoint: &'static str,
    pub pairs: Vec<(String, String)>,
}

fn page_of_one() -> Vec<(String, String)> {
    vec![("skip".to_string(), "0".to_string()), ("limit".to_string(), "1".to_string())]
}

/// Consultas de los KPIs para el día seleccionado
pub fn kpi_queries(day: NaiveDate) -> Vec<KpiQuery> {
    let month_start = day.with_day(1).unwrap_or(day);
    let range = |start: NaiveDate| {
        let mut pairs = page_of_one();
        pairs.push(("start_date".to_string(), iso_date(start)));
        pairs.push(("end_date".to_string(), iso_date(day)));
        pairs
    };

    let mut open_breakdowns = page_of_one();
    open_breakdowns.push(("status".to_string(), "active".to_string()));

    vec![
        KpiQuery { element_id: "kpiTotalVehicles", endpoint: "/vehicle/", pairs: page_of_one() },
        KpiQuery { element_id: "kpiTotalDrivers", endpoint: "/driver/", pairs: page_of_one() },
        KpiQuery { element_id: "kpiOpenBreakdowns", endpoint: "/panne/", pairs: open_breakdowns },
        KpiQuery { element_id: "kpiRepairsMonth", endpoint: "/reparation/", pairs: range(month_start) },
        KpiQuery { element_id: "kpiFuelToday", endpoint: "/fuel/", pairs: range(day) },
    ]
}

/// Valor de un KPI (guion largo mientras carga o si falló)
pub fn render_kpi(element_id: &str, total: Option<u64>) {
    let text = total.map(|t| t.to_string()).unwrap_or_else(|| "—".to_string());
    set_text_by_id(element_id, &text);
}

pub fn date_filter_input() -> Option<HtmlInputElement> {
    get_element_as::<HtmlInputElement>(DATE_FILTER_ID)
}

/// Rellena el desplegable de alta rápida si la plantilla lo trae vacío
pub fn render_quick_add_links(modules: &[ModuleConfig]) -> Result<(), JsValue> {
    let Some(dropdown) = get_element_by_id(QUICK_ADD_DROPDOWN_ID) else {
        return Ok(());
    };
    if dropdown.child_element_count() > 0 {
        return Ok(());
    }
    for module in modules.iter().filter(|m| m.api_endpoint.is_some() && !m.form_fields.is_empty()) {
        let link = ElementBuilder::new("a")?
            .class(&format!(
                "{} block px-4 py-2 text-sm text-gray-700 dark:text-gray-200 hover:bg-gray-100 dark:hover:bg-gray-700",
                QUICK_ADD_LINK_CLASS
            ))
            .attr("href", "#")?
            .attr(QUICK_ADD_TARGET_ATTR, &module.name)?
            .text(&format!("New {}", module.singular_title()))
            .build();
        append_child(&dropdown, &link)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(query: &'a KpiQuery, key: &str) -> Option<&'a str> {
        query.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn kpis_only_ask_for_one_row() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        for query in kpi_queries(day) {
            assert_eq!(lookup(&query, "limit"), Some("1"), "{}", query.element_id);
        }
    }

    #[test]
    fn dated_kpis_follow_selected_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let queries = kpi_queries(day);
        let repairs = queries.iter().find(|q| q.element_id == "kpiRepairsMonth").unwrap();
        assert_eq!(lookup(repairs, "start_date"), Some("2024-03-01"));
        assert_eq!(lookup(repairs, "end_date"), Some("2024-03-17"));
        let fuel = queries.iter().find(|q| q.element_id == "kpiFuelToday").unwrap();
        assert_eq!(lookup(fuel, "start_date"), Some("2024-03-17"));
        let vehicles = queries.iter().find(|q| q.element_id == "kpiTotalVehicles").unwrap();
        assert_eq!(lookup(vehicles, "start_date"), None);
    }
}
