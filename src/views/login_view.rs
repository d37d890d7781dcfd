// ============================================================================
// LOGIN VIEW - Formulario de acceso (Rust puro)
// ============================================================================

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlInputElement};

use crate::dom::{append_child, get_element_as, get_element_by_id, listen_forever, set_hidden, set_text_content, ElementBuilder};

const USERNAME_ID: &str = "login-username";
const PASSWORD_ID: &str = "login-password";
const SUBMIT_ID: &str = "login-submit";
const ERROR_ID: &str = "login-error";

/// Callback del submit: (usuario o email, contraseña)
pub type OnLogin = Rc<dyn Fn(String, String)>;

/// Renderizar vista de login
pub fn render_login(on_login: OnLogin) -> Result<Element, JsValue> {
    log::info!("🎬 [LOGIN] render_login()");

    let screen = ElementBuilder::new("div")?
        .class("min-h-screen flex items-center justify-center bg-gray-100 dark:bg-gray-900 p-4")
        .build();

    let card = ElementBuilder::new("div")?
        .class("w-full max-w-md rounded-xl bg-white dark:bg-gray-800 shadow-lg p-8")
        .child(
            ElementBuilder::new("h1")?
                .class("text-2xl font-bold text-center text-gray-900 dark:text-white")
                .text("FleetDash")
                .build(),
        )?
        .child(
            ElementBuilder::new("p")?
                .class("text-sm text-center text-gray-500 dark:text-gray-400 mb-6")
                .text("Sign in to manage your fleet")
                .build(),
        )?
        .build();

    let form = ElementBuilder::new("form")?
        .class("space-y-4")
        .attr("novalidate", "")?
        .child(labelled_input(USERNAME_ID, "Username or email", "text", "username")?)?
        .child(labelled_input(PASSWORD_ID, "Password", "password", "current-password")?)?
        .child(
            ElementBuilder::new("p")?
                .id(ERROR_ID)?
                .class("hidden text-sm text-red-600 dark:text-red-400")
                .build(),
        )?
        .child(
            ElementBuilder::new("button")?
                .id(SUBMIT_ID)?
                .class("btn btn-primary w-full")
                .attr("type", "submit")?
                .text("Sign in")
                .build(),
        )?
        .build();

    listen_forever(&form, "submit", move |event| {
        event.prevent_default();
        let username = input_value(USERNAME_ID);
        let password = input_value(PASSWORD_ID);
        if username.trim().is_empty() || password.is_empty() {
            show_login_error(Some("Please enter your username and password."));
            return;
        }
        show_login_error(None);
        on_login(username, password);
    })?;

    append_child(&card, &form)?;
    append_child(&screen, &card)?;
    Ok(screen)
}

fn labelled_input(id: &str, label: &str, input_type: &str, autocomplete: &str) -> Result<Element, JsValue> {
    let label = ElementBuilder::new("label")?
        .class("block text-sm font-medium text-gray-700 dark:text-gray-300 mb-1")
        .attr("for", id)?
        .text(label)
        .build();
    let input = ElementBuilder::new("input")?
        .id(id)?
        .class("form-input w-full px-3 py-2 text-sm border dark:border-gray-600 rounded-lg dark:bg-gray-700 dark:text-white")
        .attr("type", input_type)?
        .attr("autocomplete", autocomplete)?
        .build();
    Ok(ElementBuilder::new("div")?.child(label)?.child(input)?.build())
}

fn input_value(id: &str) -> String {
    get_element_as::<HtmlInputElement>(id).map(|input| input.value()).unwrap_or_default()
}

/// Mensaje bajo el formulario (`None` lo oculta)
pub fn show_login_error(message: Option<&str>) {
    if let Some(element) = get_element_by_id(ERROR_ID) {
        set_text_content(&element, message.unwrap_or(""));
        let _ = set_hidden(&element, message.is_none());
    }
}

/// Deshabilita el botón mientras la petición está en curso
pub fn set_login_busy(busy: bool) {
    if let Some(button) = get_element_by_id(SUBMIT_ID).and_then(|e| e.dyn_into::<web_sys::HtmlButtonElement>().ok()) {
        button.set_disabled(busy);
        button.set_text_content(Some(if busy { "Signing in..." } else { "Sign in" }));
    }
}
