// ============================================================================
// RENDER REGISTRY - Funciones de formato referenciadas por nombre en la config
// ============================================================================
// Los nombres ("statusBadge", "formatDateTime"...) se resuelven a la variante
// del enum al deserializar la config: un nombre desconocido hace fallar la
// carga del módulo en lugar de mostrar el valor crudo.
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::JsValue;

use crate::config::CONFIG;
use crate::models::record::{get_present, value_to_plain_string};
use crate::utils::dates::{parse_date, parse_datetime};

pub const NOT_AVAILABLE: &str = "N/A";

/// Función de render registrada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderFn {
    #[serde(rename = "formatDateTime")]
    FormatDateTime,
    #[serde(rename = "formatDate")]
    FormatDate,
    #[serde(rename = "formatStatus")]
    FormatStatus,
    #[serde(rename = "statusBadge")]
    StatusBadge,
    #[serde(rename = "vehicleFullName")]
    VehicleFullName,
    #[serde(rename = "driverFullNameView")]
    DriverFullNameView,
    #[serde(rename = "formatCurrency")]
    FormatCurrency,
}

impl RenderFn {
    /// Produce markup HTML a partir del valor y del registro completo
    pub fn render(self, value: &Value, record: &Value) -> String {
        match self {
            RenderFn::FormatDateTime => format_date_time(value),
            RenderFn::FormatDate => format_date(value),
            RenderFn::FormatStatus => escape_html(&format_status(value)),
            RenderFn::StatusBadge => status_badge(value),
            RenderFn::VehicleFullName => escape_html(&vehicle_full_name(value)),
            RenderFn::DriverFullNameView => escape_html(&driver_full_name(record)),
            RenderFn::FormatCurrency => format_currency(value, &CONFIG.ui_config.currency),
        }
    }
}

/// Markup de una celda: render registrado o valor escapado con fallback
pub fn render_cell(
    value: Option<&Value>,
    record: &Value,
    render: Option<RenderFn>,
    fallback: Option<&str>,
) -> String {
    if let Some(render) = render {
        let value = value.cloned().unwrap_or(Value::Null);
        return render.render(&value, record);
    }
    match value {
        None | Some(Value::Null) => escape_html(fallback.unwrap_or(NOT_AVAILABLE)),
        Some(v) => escape_html(&value_to_plain_string(v)),
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(value_to_plain_string(other)),
    }
}

pub fn format_date_time(value: &Value) -> String {
    let Some(raw) = as_text(value) else {
        return NOT_AVAILABLE.to_string();
    };
    match parse_datetime(&raw) {
        Some(dt) => dt.format("%b %-d, %Y, %H:%M").to_string(),
        None => "Invalid Date".to_string(),
    }
}

pub fn format_date(value: &Value) -> String {
    let Some(raw) = as_text(value) else {
        return NOT_AVAILABLE.to_string();
    };
    match parse_date(&raw) {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// "in_progress" -> "In progress"
pub fn format_status(value: &Value) -> String {
    let Some(raw) = as_text(value) else {
        return NOT_AVAILABLE.to_string();
    };
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.collect();
            format!("{}{}", first.to_uppercase(), rest.replace('_', " "))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn status_badge(value: &Value) -> String {
    let label = format_status(value);
    let lowered = as_text(value).map(|s| s.to_lowercase()).unwrap_or_default();
    let color = match lowered.as_str() {
        "active" | "available" | "completed" => {
            "bg-green-100 text-green-700 dark:bg-green-700 dark:text-green-100"
        }
        "inactive" | "closed" | "hors_service" => {
            "bg-red-100 text-red-700 dark:bg-red-700 dark:text-red-100"
        }
        "in_progress" | "inprogress" | "maintenance" | "in_mission" => {
            "bg-yellow-100 text-yellow-700 dark:bg-yellow-700 dark:text-yellow-100"
        }
        "resolved" => "bg-blue-100 text-blue-700 dark:bg-blue-700 dark:text-blue-100",
        _ => "bg-gray-200 text-gray-700 dark:bg-gray-700 dark:text-gray-300",
    };
    format!(
        r#"<span class="px-2.5 py-0.5 text-xs font-medium rounded-full {}">{}</span>"#,
        color,
        escape_html(&label)
    )
}

/// "AB-123 (Toyota Hilux)" a partir del objeto vehículo embebido
pub fn vehicle_full_name(value: &Value) -> String {
    let Some(plate) = get_present(value, "plate_number") else {
        return NOT_AVAILABLE.to_string();
    };
    let part = |key: &str| get_present(value, key).map(value_to_plain_string).unwrap_or_default();
    format!("{} ({} {})", value_to_plain_string(plate), part("make"), part("model"))
}

pub fn driver_full_name(record: &Value) -> String {
    match (as_text_at(record, "first_name"), as_text_at(record, "last_name")) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn as_text_at(record: &Value, key: &str) -> Option<String> {
    get_present(record, key).and_then(as_text)
}

/// Importe en la moneda configurada, con el formato del idioma del navegador
pub fn format_currency(value: &Value, currency: &str) -> String {
    let Some(amount) = value.as_f64() else {
        return NOT_AVAILABLE.to_string();
    };
    if !is_currency_code(currency) {
        log::warn!("⚠️ [FORMAT] Código de moneda no válido: {}", currency);
        return plain_amount(amount, currency);
    }
    intl_currency(amount, currency).unwrap_or_else(|| plain_amount(amount, currency))
}

/// ISO 4217: tres letras mayúsculas. `Intl.NumberFormat` lanza RangeError si no.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

fn plain_amount(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, currency)
}

fn intl_currency(amount: f64, currency: &str) -> Option<String> {
    let locales = js_sys::Array::new();
    if let Some(language) = web_sys::window().and_then(|w| w.navigator().language()) {
        locales.push(&JsValue::from_str(&language));
    }
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &JsValue::from_str("style"), &JsValue::from_str("currency")).ok()?;
    js_sys::Reflect::set(&options, &JsValue::from_str("currency"), &JsValue::from_str(currency)).ok()?;

    let formatter = js_sys::Intl::NumberFormat::new(&locales, &options);
    formatter
        .format()
        .call1(&JsValue::NULL, &JsValue::from_f64(amount))
        .ok()?
        .as_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_names_resolve_and_unknown_names_fail() {
        let parsed: RenderFn = serde_json::from_value(json!("statusBadge")).unwrap();
        assert_eq!(parsed, RenderFn::StatusBadge);
        assert!(serde_json::from_value::<RenderFn>(json!("window.alert")).is_err());
    }

    #[test]
    fn cell_defaults_to_fallback_then_na() {
        let record = json!({});
        assert_eq!(render_cell(None, &record, None, Some("-")), "-");
        assert_eq!(render_cell(Some(&Value::Null), &record, None, None), "N/A");
        assert_eq!(render_cell(Some(&json!("<b>")), &record, None, None), "&lt;b&gt;");
    }

    #[test]
    fn status_formatting() {
        assert_eq!(format_status(&json!("in_progress")), "In progress");
        assert_eq!(format_status(&Value::Null), "N/A");
        assert!(status_badge(&json!("active")).contains("bg-green-100"));
        assert!(status_badge(&json!("resolved")).contains("Resolved"));
    }

    #[test]
    fn vehicle_and_driver_names() {
        let vehicle = json!({"plate_number": "AB-123", "make": "Toyota", "model": "Hilux"});
        assert_eq!(vehicle_full_name(&vehicle), "AB-123 (Toyota Hilux)");
        assert_eq!(vehicle_full_name(&json!(7)), "N/A");
        let driver = json!({"first_name": "Amina", "last_name": "Diallo"});
        assert_eq!(driver_full_name(&driver), "Amina Diallo");
        assert_eq!(driver_full_name(&json!({"first_name": "Amina"})), "N/A");
    }

    #[test]
    fn currency_needs_a_number() {
        assert_eq!(format_currency(&json!("12"), "USD"), "N/A");
        assert_eq!(format_currency(&Value::Null, "USD"), "N/A");
        assert_eq!(format_currency(&json!({"amount": 3}), "EUR"), "N/A");
    }

    #[test]
    fn only_iso_codes_reach_intl() {
        assert!(is_currency_code("USD"));
        assert!(is_currency_code("MAD"));
        assert!(!is_currency_code("usd"));
        assert!(!is_currency_code("€"));
        assert!(!is_currency_code("EURO"));
        assert!(!is_currency_code(""));
        assert_eq!(format_currency(&json!(12.5), "dollars"), "12.50 dollars");
    }

    #[test]
    fn dates_render_or_flag_invalid() {
        assert_eq!(format_date_time(&json!("2024-03-10T14:30:00")), "Mar 10, 2024, 14:30");
        assert_eq!(format_date(&json!("2024-03-10")), "Mar 10, 2024");
        assert_eq!(format_date(&json!("tomorrow")), "Invalid Date");
        assert_eq!(format_date_time(&Value::Null), "N/A");
    }
}
