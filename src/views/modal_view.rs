// ============================================================================
// MODAL VIEW - Markup de los cuatro modales genéricos
// ============================================================================
// Si la página no trae los modales se crean al arrancar y se añaden al body.
// Todos comparten estructura: raíz `.modal` (el fondo), panel interior y
// botones con `data-modal-close` que solo cierran.
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom::{
    append_child, control_value_by_id, document, get_element_by_id, set_control_value, set_hidden, set_inner_html,
    set_text_by_id, set_text_content, ElementBuilder,
};
use crate::models::form::{is_preselected, FieldPrefill};
use crate::models::module_config::{FieldType, FormFieldSpec, SelectOption};
use crate::state::modal_state::{ModalKind, StatusKind};
use crate::utils::format::escape_html;

pub const FORM_ID: &str = "genericAddEditForm";
pub const CONFIRM_BUTTON_ID: &str = "genericConfirmModalConfirmBtn";
pub const CLOSE_ATTR: &str = "data-modal-close";

const FIELDS_CONTAINER_ID: &str = "genericFormFieldsContainer";
const INPUT_CLASS: &str = "form-input w-full px-3 py-2 text-sm border dark:border-gray-600 rounded-lg dark:bg-gray-700 dark:text-white focus:ring-blue-500 focus:border-blue-500";

/// Id del control de un campo (prefijo para no chocar con la página)
pub fn control_id(field_id: &str) -> String {
    format!("field-{}", field_id)
}

/// Crea los modales que falten en el documento
pub fn ensure_modals() -> Result<(), JsValue> {
    let body = document()
        .and_then(|d| d.body())
        .ok_or_else(|| JsValue::from_str("No body"))?;
    for kind in ModalKind::ALL {
        if get_element_by_id(kind.element_id()).is_none() {
            let modal = ElementBuilder::new("div")?
                .id(kind.element_id())?
                .class("modal hidden fixed inset-0 z-50 flex items-center justify-center bg-black/50 p-4")
                .attr("role", "dialog")?
                .attr("aria-modal", "true")?
                .html(&modal_markup(kind))
                .build();
            append_child(&body, &modal)?;
            log::debug!("🧩 [MODAL] Creado #{}", kind.element_id());
        }
    }
    Ok(())
}

pub fn modal_element(kind: ModalKind) -> Option<Element> {
    get_element_by_id(kind.element_id())
}

pub fn set_modal_visible(kind: ModalKind, visible: bool) -> Result<(), JsValue> {
    match modal_element(kind) {
        Some(modal) => set_hidden(&modal, !visible),
        None => Err(JsValue::from_str(&format!("#{} not found", kind.element_id()))),
    }
}

// ============================================================================
// ALTA / EDICIÓN
// ============================================================================

pub fn render_form_header(title: &str, subtitle: &str, is_edit: bool) {
    set_text_by_id("genericModalTitle", title);
    set_text_by_id("genericModalSubtitle", subtitle);
    set_text_by_id("genericSubmitButton", if is_edit { "Save Changes" } else { "Add Record" });
}

/// Un bloque label + control por campo. `options[i]` son las opciones del campo i.
pub fn render_form_fields(
    fields: &[FormFieldSpec],
    prefills: &[FieldPrefill],
    options: &[Vec<SelectOption>],
) -> Result<(), JsValue> {
    let container = get_element_by_id(FIELDS_CONTAINER_ID)
        .ok_or_else(|| JsValue::from_str("genericFormFieldsContainer not found"))?;
    set_inner_html(&container, "");

    for (index, field) in fields.iter().enumerate() {
        let prefill = prefills.iter().find(|p| p.field_id == field.id);
        let field_options = options.get(index).map(Vec::as_slice).unwrap_or(&[]);

        let label = ElementBuilder::new("label")?
            .class("block text-sm font-medium text-gray-700 dark:text-gray-300 mb-1")
            .attr("for", &control_id(&field.id))?
            .html(&field_label_html(&field.label, field.required))
            .build();
        let control = build_control(field, prefill, field_options)?;
        let wrapper = ElementBuilder::new("div")?.child(label)?.child(control)?.build();
        append_child(&container, &wrapper)?;
    }
    Ok(())
}

fn build_control(
    field: &FormFieldSpec,
    prefill: Option<&FieldPrefill>,
    options: &[SelectOption],
) -> Result<Element, JsValue> {
    let display = prefill.map(|p| p.display.as_str()).unwrap_or("");
    let id = control_id(&field.id);

    let element = match field.field_type {
        FieldType::Select => ElementBuilder::new("select")?
            .html(&select_options_html(field, prefill, options))
            .build(),
        FieldType::Textarea => ElementBuilder::new("textarea")?
            .attr("rows", &field.rows.unwrap_or(3).to_string())?
            .text(display)
            .build(),
        other => {
            let input = ElementBuilder::new("input")?.attr("type", other.input_type())?.build();
            set_control_value(&input, display);
            if other == FieldType::Number {
                input.set_attribute("step", "any")?;
            }
            input
        }
    };

    element.set_id(&id);
    element.set_attribute("name", &field.id)?;
    element.set_class_name(INPUT_CLASS);
    if let Some(placeholder) = &field.placeholder {
        if field.field_type != FieldType::Select {
            element.set_attribute("placeholder", placeholder)?;
        }
    }
    if field.required {
        element.set_attribute("required", "")?;
    }
    Ok(element)
}

/// Valores crudos de los controles en el orden de `fields`
pub fn read_form_values(fields: &[FormFieldSpec]) -> Vec<String> {
    fields.iter().map(|field| control_value_by_id(&control_id(&field.id))).collect()
}

pub fn set_submit_busy(busy: bool) {
    if let Some(button) = get_element_by_id("genericSubmitButton") {
        let _ = if busy {
            button.set_attribute("disabled", "")
        } else {
            button.remove_attribute("disabled")
        };
    }
}

// ============================================================================
// DETALLE, CONFIRMACIÓN Y ESTADO
// ============================================================================

/// `rows`: (etiqueta, markup ya renderizado)
pub fn render_view(title: &str, rows: &[(String, String)]) -> Result<(), JsValue> {
    set_text_by_id("genericViewModalTitle", title);
    let container = get_element_by_id("genericViewDetailsContainer")
        .ok_or_else(|| JsValue::from_str("genericViewDetailsContainer not found"))?;
    set_inner_html(&container, &view_rows_html(rows));
    Ok(())
}

pub fn render_confirm(title: &str, message: &str, confirm_label: &str) {
    set_text_by_id("genericConfirmModalTitle", title);
    set_text_by_id("genericConfirmModalMessage", message);
    if let Some(button) = get_element_by_id(CONFIRM_BUTTON_ID) {
        set_text_content(&button, confirm_label);
    }
}

pub fn render_status(kind: StatusKind, title: &str, message: &str) {
    set_text_by_id("infoStatusModalTitle", title);
    set_text_by_id("infoStatusModalMessage", message);
    if let Some(icon) = get_element_by_id("infoStatusModalIconContainer") {
        icon.set_class_name(&format!(
            "mx-auto flex items-center justify-center h-12 w-12 rounded-full mb-4 {} {}",
            status_background(kind),
            kind.color_class()
        ));
        set_text_content(&icon, kind.icon());
    }
}

// ============================================================================
// MARKUP (funciones puras)
// ============================================================================

fn status_background(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Info => "bg-blue-100 dark:bg-blue-900",
        StatusKind::Success => "bg-green-100 dark:bg-green-900",
        StatusKind::Error => "bg-red-100 dark:bg-red-900",
        StatusKind::Warning => "bg-yellow-100 dark:bg-yellow-900",
    }
}

pub fn field_label_html(label: &str, required: bool) -> String {
    if required {
        format!(r#"{}<span class="text-red-500 ml-0.5">*</span>"#, escape_html(label))
    } else {
        escape_html(label)
    }
}

/// Placeholder vacío + opciones, con la precargada marcada
pub fn select_options_html(field: &FormFieldSpec, prefill: Option<&FieldPrefill>, options: &[SelectOption]) -> String {
    let placeholder = field
        .placeholder
        .clone()
        .unwrap_or_else(|| format!("Select {}", field.label));
    let mut html = format!(r#"<option value="">{}</option>"#, escape_html(&placeholder));
    for option in options {
        let selected = prefill.is_some_and(|p| is_preselected(p, option));
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape_html(&option.value_string()),
            if selected { " selected" } else { "" },
            escape_html(&option.text)
        ));
    }
    html
}

pub fn view_rows_html(rows: &[(String, String)]) -> String {
    let mut html = String::from(r#"<dl class="divide-y dark:divide-gray-700">"#);
    for (label, value) in rows {
        html.push_str(&format!(
            concat!(
                r#"<div class="py-3 sm:grid sm:grid-cols-3 sm:gap-4">"#,
                r#"<dt class="text-sm font-medium text-gray-500 dark:text-gray-400">{}</dt>"#,
                r#"<dd class="mt-1 text-sm text-gray-900 dark:text-white sm:mt-0 sm:col-span-2 whitespace-pre-wrap">{}</dd>"#,
                r#"</div>"#,
            ),
            escape_html(label),
            value
        ));
    }
    html.push_str("</dl>");
    html
}

fn close_button(label: &str, class: &str) -> String {
    format!(r#"<button type="button" {} class="{}">{}</button>"#, CLOSE_ATTR, class, label)
}

fn modal_markup(kind: ModalKind) -> String {
    let panel = "relative w-full rounded-xl bg-white dark:bg-gray-800 shadow-xl p-6";
    let x = close_button("✕", "absolute top-3 right-3 text-gray-400 hover:text-gray-600 dark:hover:text-gray-200");
    let cancel = close_button("Cancel", "btn btn-secondary w-full sm:w-auto");
    match kind {
        ModalKind::AddEdit => format!(
            concat!(
                r#"<div class="{panel} max-w-2xl max-h-[90vh] overflow-y-auto">{x}"#,
                r#"<h3 id="genericModalTitle" class="text-lg font-semibold text-gray-900 dark:text-white"></h3>"#,
                r#"<p id="genericModalSubtitle" class="text-sm text-gray-500 dark:text-gray-400 mb-4"></p>"#,
                r#"<form id="{form}" novalidate>"#,
                r#"<div id="{fields}" class="grid grid-cols-1 md:grid-cols-2 gap-4"></div>"#,
                r#"<div class="mt-6 flex flex-col-reverse sm:flex-row sm:justify-end gap-2">{cancel}"#,
                r#"<button type="submit" id="genericSubmitButton" class="btn btn-primary w-full sm:w-auto"></button>"#,
                r#"</div></form></div>"#,
            ),
            panel = panel,
            x = x,
            form = FORM_ID,
            fields = FIELDS_CONTAINER_ID,
            cancel = cancel,
        ),
        ModalKind::View => format!(
            concat!(
                r#"<div class="{panel} max-w-2xl max-h-[90vh] overflow-y-auto">{x}"#,
                r#"<h3 id="genericViewModalTitle" class="text-lg font-semibold text-gray-900 dark:text-white mb-4"></h3>"#,
                r#"<div id="genericViewDetailsContainer"></div>"#,
                r#"<div class="mt-6 flex justify-end">{close}</div></div>"#,
            ),
            panel = panel,
            x = x,
            close = close_button("Close", "btn btn-secondary"),
        ),
        ModalKind::Confirm => format!(
            concat!(
                r#"<div class="{panel} max-w-md">{x}"#,
                r#"<h3 id="genericConfirmModalTitle" class="text-lg font-semibold text-gray-900 dark:text-white"></h3>"#,
                r#"<p id="genericConfirmModalMessage" class="mt-2 text-sm text-gray-600 dark:text-gray-300"></p>"#,
                r#"<div class="mt-6 flex flex-col-reverse sm:flex-row sm:justify-end gap-2">{cancel}"#,
                r#"<button type="button" id="{confirm}" class="btn btn-danger w-full sm:w-auto">Confirm</button>"#,
                r#"</div></div>"#,
            ),
            panel = panel,
            x = x,
            cancel = cancel,
            confirm = CONFIRM_BUTTON_ID,
        ),
        ModalKind::Status => format!(
            concat!(
                r#"<div class="{panel} max-w-sm text-center">"#,
                r#"<div id="infoStatusModalIconContainer" class="mx-auto flex items-center justify-center h-12 w-12 rounded-full mb-4"></div>"#,
                r#"<h3 id="infoStatusModalTitle" class="text-lg font-semibold text-gray-900 dark:text-white"></h3>"#,
                r#"<p id="infoStatusModalMessage" class="mt-2 text-sm text-gray-600 dark:text-gray-300"></p>"#,
                r#"<div class="mt-5">{ok}</div></div>"#,
            ),
            panel = panel,
            ok = close_button("OK", "btn btn-primary w-full"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_modal_has_close_affordance() {
        for kind in ModalKind::ALL {
            assert!(modal_markup(kind).contains(CLOSE_ATTR), "{:?}", kind);
        }
        assert!(modal_markup(ModalKind::AddEdit).contains(FIELDS_CONTAINER_ID));
        assert!(modal_markup(ModalKind::Confirm).contains(CONFIRM_BUTTON_ID));
    }

    #[test]
    fn required_label_gets_marker() {
        assert_eq!(field_label_html("Plate", false), "Plate");
        assert!(field_label_html("Plate", true).ends_with("*</span>"));
        assert_eq!(field_label_html("<b>", false), "&lt;b&gt;");
    }

    #[test]
    fn select_marks_prefilled_option() {
        let field = FormFieldSpec::select("status", "Status", vec![]);
        let options = vec![SelectOption::new("active", "Active"), SelectOption::new("resolved", "Resolved")];
        let prefill = FieldPrefill { field_id: "status".into(), display: "resolved".into(), initial: Some(json!("resolved")) };
        let html = select_options_html(&field, Some(&prefill), &options);
        assert!(html.starts_with(r#"<option value="">Select Status</option>"#));
        assert!(html.contains(r#"<option value="resolved" selected>Resolved</option>"#));
        assert!(html.contains(r#"<option value="active">Active</option>"#));
    }

    #[test]
    fn view_rows_escape_labels_only() {
        let html = view_rows_html(&[("A<B".into(), "<span class=\"badge\">ok</span>".into())]);
        assert!(html.contains("A&lt;B"));
        assert!(html.contains("<span class=\"badge\">ok</span>"));
    }
}
