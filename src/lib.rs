// ============================================================================
// FLEET DASHBOARD - FRONTEND MVVM (RUST PURO + WASM)
// ============================================================================
// - Views: funciones que pintan DOM (sin lógica)
// - ViewModels: controladores de tabla, modales, panel y shell
// - State: máquinas de estado puras (tabla, modales, paginación)
// - Services: API, sesión, login y plantillas
// - Models: descriptores de módulo, registros y formularios
// ============================================================================

mod app;
mod catalog;
mod config;
mod dom;
mod error;
mod models;
mod services;
mod state;
mod utils;
mod viewmodels;
mod views;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_logger::Config;

use crate::app::App;
use crate::config::CONFIG;

// La instancia vive lo que vive la página
thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    if CONFIG.is_logging_enabled() {
        let level = if CONFIG.is_production() { log::Level::Info } else { log::Level::Debug };
        wasm_logger::init(Config::new(level));
    }
    log::info!("🚀 FleetDash - Rust Puro + MVVM ({})", CONFIG.environment);

    let app = App::new()?;
    APP.with(|cell| {
        *cell.borrow_mut() = Some(app);
    });
    Ok(())
}
