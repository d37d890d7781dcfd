// ============================================================================
// EVENT HANDLING - Sistema de eventos
// ============================================================================
// GESTIÓN DE MEMORY LEAKS:
// - Listeners de un módulo (tabla, filtros, paginador): se registran en un
//   `ListenerRegistry`. Al hacer drop del registry se llama a
//   removeEventListener y se sueltan los closures, así que cambiar de módulo
//   no acumula handlers.
// - Listeners globales del shell (nav, popstate, modales): se registran UNA VEZ
//   al arrancar con `closure.forget()`.
// ============================================================================

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget};

type Handler = Closure<dyn FnMut(Event)>;

/// Listeners que se eliminan juntos al destruir el registry
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Vec<(EventTarget, &'static str, Handler)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un listener ligado a la vida del registry
    pub fn listen<F>(&mut self, target: &EventTarget, event_type: &'static str, handler: F) -> Result<(), JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())?;
        self.entries.push((target.clone(), event_type, closure));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Quita todos los listeners ahora (también ocurre en Drop)
    pub fn clear(&mut self) {
        for (target, event_type, closure) in self.entries.drain(..) {
            let _ = target.remove_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
        }
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("🧹 [EVENTS] Eliminando {} listeners", self.entries.len());
        }
        self.clear();
    }
}

/// Listener permanente (vive lo que viva la página)
pub fn listen_forever<F>(target: &EventTarget, event_type: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())?;
    // Nota: closure.forget() mantiene vivo el closure; solo para listeners del shell
    closure.forget();
    Ok(())
}

/// Elemento sobre el que se hizo click (o su ancestro que cumple el selector)
pub fn closest_target(event: &Event, selector: &str) -> Option<web_sys::Element> {
    event
        .target()?
        .dyn_into::<web_sys::Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}
