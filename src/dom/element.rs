// ============================================================================
// ELEMENT HELPERS - Funciones básicas para manipular DOM
// ============================================================================

use std::collections::HashMap;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, Window};

/// Obtener window global
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Obtener document
pub fn document() -> Option<Document> {
    window()?.document()
}

/// Obtener elemento por ID
pub fn get_element_by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

/// Elemento por ID con el tipo concreto (input, select...)
pub fn get_element_as<T: JsCast>(id: &str) -> Option<T> {
    get_element_by_id(id)?.dyn_into::<T>().ok()
}

/// Crear elemento
pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    document()
        .ok_or_else(|| JsValue::from_str("No document"))
        .and_then(|doc| doc.create_element(tag))
}

/// Pone o quita una clase según `on`
pub fn toggle_class(element: &Element, class: &str, on: bool) -> Result<(), JsValue> {
    element.class_list().toggle_with_force(class, on).map(|_| ())
}

/// Verificar si tiene clase
pub fn has_class(element: &Element, class: &str) -> bool {
    element.class_list().contains(class)
}

/// Mostrar/ocultar con la clase `hidden` de Tailwind
pub fn set_hidden(element: &Element, hidden: bool) -> Result<(), JsValue> {
    toggle_class(element, "hidden", hidden)
}

/// Establecer text content
pub fn set_text_content(element: &Element, text: &str) {
    element.set_text_content(Some(text));
}

/// Texto de un elemento por ID (no hace nada si no existe)
pub fn set_text_by_id(id: &str, text: &str) {
    if let Some(element) = get_element_by_id(id) {
        set_text_content(&element, text);
    }
}

/// Establecer inner HTML
pub fn set_inner_html(element: &Element, html: &str) {
    element.set_inner_html(html);
}

/// Agregar hijo
pub fn append_child(parent: &Element, child: &Element) -> Result<(), JsValue> {
    parent.append_child(child).map(|_| ())
}

/// Establecer atributo
pub fn set_attribute(element: &Element, name: &str, value: &str) -> Result<(), JsValue> {
    element.set_attribute(name, value)
}

/// Obtener atributo
pub fn get_attribute(element: &Element, name: &str) -> Option<String> {
    element.get_attribute(name)
}

/// Query selector sobre el document
pub fn query_selector(selector: &str) -> Result<Option<Element>, JsValue> {
    document()
        .ok_or_else(|| JsValue::from_str("No document"))?
        .query_selector(selector)
}

/// Todos los elementos bajo `root` que cumplen el selector
pub fn query_selector_all(root: &Element, selector: &str) -> Result<Vec<Element>, JsValue> {
    let nodes = root.query_selector_all(selector)?;
    Ok((0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

/// Todos los atributos `data-*` de un elemento (`data-module` -> valor)
pub fn data_attributes(element: &Element) -> HashMap<String, String> {
    element
        .get_attribute_names()
        .iter()
        .filter_map(|name| name.as_string())
        .filter(|name| name.starts_with("data-"))
        .filter_map(|name| element.get_attribute(&name).map(|value| (name, value)))
        .collect()
}

/// Valor actual de un input, select o textarea
pub fn control_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some(select.value());
    }
    element.dyn_ref::<HtmlTextAreaElement>().map(HtmlTextAreaElement::value)
}

/// Valor de un control por ID ("" si no existe)
pub fn control_value_by_id(id: &str) -> String {
    get_element_by_id(id).and_then(|e| control_value(&e)).unwrap_or_default()
}

/// Escribe el valor de un input, select o textarea
pub fn set_control_value(element: &Element, value: &str) {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
    }
}

/// Bloquea/desbloquea el scroll del body
pub fn set_body_scroll_locked(locked: bool) -> Result<(), JsValue> {
    let body: HtmlElement = document()
        .and_then(|d| d.body())
        .ok_or_else(|| JsValue::from_str("No body"))?;
    toggle_class(&body, "overflow-hidden", locked)
}

/// Cambia `document.title`
pub fn set_document_title(title: &str) {
    if let Some(doc) = document() {
        doc.set_title(title);
    }
}

/// Redirección completa (`window.location.href = ...`)
pub fn redirect(url: &str) -> Result<(), JsValue> {
    window()
        .ok_or_else(|| JsValue::from_str("No window"))?
        .location()
        .set_href(url)
}
