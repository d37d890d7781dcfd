// ============================================================================
// SHELL VIEW - Sidebar, navegación, tema, usuario y área de contenido
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom::{
    append_child, document, get_attribute, get_element_by_id, query_selector_all, set_hidden, set_inner_html,
    set_text_by_id, toggle_class, ElementBuilder,
};
use crate::models::auth::UserDisplay;
use crate::models::module_config::ModuleConfig;
use crate::state::app_state::Theme;

pub const NAV_LIST_ID: &str = "main-nav-list";
pub const MAIN_CONTENT_ID: &str = "main-content-area";
pub const LOGOUT_BUTTON_ID: &str = "global-logout-btn";
pub const THEME_TOGGLE_ID: &str = "theme-toggle";
pub const MOBILE_MENU_ID: &str = "mobile-menu-button";
pub const CLOSE_SIDEBAR_ID: &str = "close-sidebar-button";
pub const SIDEBAR_OVERLAY_ID: &str = "sidebar-overlay";

const ITEM_ACTIVE: [&str; 3] = ["active-link", "bg-blue-50", "dark:bg-gray-700"];
const LINK_ACTIVE: [&str; 3] = ["text-primary", "dark:text-primary-light", "font-semibold"];

// ============================================================================
// NAVEGACIÓN
// ============================================================================

/// Enlaces `.nav-link` de la lista principal
pub fn nav_links() -> Vec<Element> {
    get_element_by_id(NAV_LIST_ID)
        .and_then(|list| query_selector_all(&list, ".nav-link").ok())
        .unwrap_or_default()
}

/// Si la página no trae menú, se pinta uno a partir del catálogo
pub fn render_nav_if_empty(modules: &[ModuleConfig]) -> Result<(), JsValue> {
    let Some(list) = get_element_by_id(NAV_LIST_ID) else {
        log::warn!("⚠️ [SHELL] #{} no existe", NAV_LIST_ID);
        return Ok(());
    };
    if !nav_links().is_empty() {
        return Ok(());
    }
    for module in modules {
        let link = ElementBuilder::new("a")?
            .class("nav-link flex items-center gap-3 px-3 py-2 rounded-lg text-gray-700 dark:text-gray-300")
            .attr("href", &module.href())?
            .data("module", &module.name)?
            .data("title", &module.title)?
            .data("content-url", &module.content_url)?
            .text(&module.title)
            .build();
        if let Some(endpoint) = &module.api_endpoint {
            link.set_attribute("data-api-endpoint", endpoint)?;
        }
        let item = ElementBuilder::new("li")?
            .class("nav-item rounded-lg hover:bg-gray-100 dark:hover:bg-gray-700")
            .child(link)?
            .build();
        append_child(&list, &item)?;
    }
    log::info!("🧭 [SHELL] Menú generado con {} módulos", modules.len());
    Ok(())
}

/// Marca el enlace cuyo `href` coincide
pub fn highlight_active(active_href: &str) -> Result<(), JsValue> {
    for link in nav_links() {
        let is_active = get_attribute(&link, "href").as_deref() == Some(active_href);
        if let Ok(Some(item)) = link.closest(".nav-item") {
            for class in ITEM_ACTIVE {
                toggle_class(&item, class, is_active)?;
            }
        }
        for class in LINK_ACTIVE {
            toggle_class(&link, class, is_active)?;
        }
    }
    Ok(())
}

// ============================================================================
// CONTENIDO
// ============================================================================

pub fn main_content() -> Option<Element> {
    get_element_by_id(MAIN_CONTENT_ID)
}

pub fn set_main_content(html: &str) {
    if let Some(area) = main_content() {
        set_inner_html(&area, html);
    }
}

pub fn show_content_loading() {
    set_main_content(r#"<div class="flex justify-center py-20"><div class="loader"></div></div>"#);
}

pub fn hide_initial_loader() {
    if let Some(loader) = get_element_by_id("initial-loader") {
        let _ = set_hidden(&loader, true);
    }
}

pub fn render_module_not_found() {
    set_main_content(r#"<p class="p-4 text-center text-red-500">Module not found or configuration error.</p>"#);
}

pub fn render_welcome() {
    set_main_content("<p class='p-4 text-center'>Welcome! Please select a module from the menu.</p>");
}

// ============================================================================
// TEMA, SIDEBAR Y USUARIO
// ============================================================================

/// Clase `dark` en `<html>` + icono del botón
pub fn apply_theme(theme: Theme) -> Result<(), JsValue> {
    if let Some(root) = document().and_then(|d| d.document_element()) {
        toggle_class(&root, "dark", theme == Theme::Dark)?;
    }
    set_text_by_id(THEME_TOGGLE_ID, theme_icon(theme));
    Ok(())
}

pub fn apply_sidebar(open: bool) -> Result<(), JsValue> {
    if let Some(sidebar) = get_element_by_id("sidebar") {
        toggle_class(&sidebar, "-translate-x-full", !open)?;
        toggle_class(&sidebar, "translate-x-0", open)?;
    }
    if let Some(overlay) = get_element_by_id(SIDEBAR_OVERLAY_ID) {
        set_hidden(&overlay, !open)?;
    }
    if let Some(body) = document().and_then(|d| d.body()) {
        toggle_class(&body, "overflow-hidden", open)?;
        toggle_class(&body, "md:overflow-auto", open)?;
    }
    Ok(())
}

pub fn render_user(user: &UserDisplay) {
    set_text_by_id("userDisplayName", &user.name);
    set_text_by_id("userRole", &user.role);
}

/// Ancho de escritorio (el sidebar no se cierra al navegar)
pub fn is_desktop_width() -> bool {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|w| w.as_f64())
        .is_some_and(|width| width >= 768.0)
}

// ============================================================================
// FUNCIONES PURAS
// ============================================================================

pub fn theme_icon(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "☀️",
        Theme::Light => "🌙",
    }
}

/// "FleetDash - Vehicle Records"
pub fn document_title(title: &str, module: &str) -> String {
    let shown = if title.is_empty() { module } else { title };
    format!("FleetDash - {}", shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_module_name() {
        assert_eq!(document_title("Vehicle Records", "vehicles"), "FleetDash - Vehicle Records");
        assert_eq!(document_title("", "vehicles"), "FleetDash - vehicles");
    }

    #[test]
    fn theme_button_shows_the_other_mode() {
        assert_eq!(theme_icon(Theme::Dark), "☀️");
        assert_eq!(theme_icon(Theme::Light), "🌙");
    }
}
