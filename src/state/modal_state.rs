// ============================================================================
// MODAL STATE - Pila de modales, confirmaciones pendientes y avisos
// ============================================================================

/// Modales genéricos del dashboard (ids de la plantilla principal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalKind {
    AddEdit,
    View,
    Confirm,
    Status,
}

impl ModalKind {
    pub const ALL: [ModalKind; 4] = [ModalKind::AddEdit, ModalKind::View, ModalKind::Confirm, ModalKind::Status];

    pub fn element_id(self) -> &'static str {
        match self {
            ModalKind::AddEdit => "genericAddEditModal",
            ModalKind::View => "genericViewModal",
            ModalKind::Confirm => "genericConfirmModal",
            ModalKind::Status => "infoStatusModal",
        }
    }
}

/// Modales abiertos; el scroll del body se bloquea mientras haya alguno
#[derive(Debug, Default)]
pub struct ModalStack {
    open: Vec<ModalKind>,
}

impl ModalStack {
    /// Devuelve true si el body debe bloquearse (primer modal abierto)
    pub fn open(&mut self, kind: ModalKind) -> bool {
        let was_empty = self.open.is_empty();
        if !self.open.contains(&kind) {
            self.open.push(kind);
        }
        was_empty
    }

    /// Devuelve true si el body debe desbloquearse (no queda ninguno)
    pub fn close(&mut self, kind: ModalKind) -> bool {
        let before = self.open.len();
        self.open.retain(|k| *k != kind);
        before > 0 && self.open.is_empty()
    }

    pub fn close_all(&mut self) -> Vec<ModalKind> {
        std::mem::take(&mut self.open)
    }

    pub fn is_open(&self, kind: ModalKind) -> bool {
        self.open.contains(&kind)
    }

    #[cfg(test)]
    pub fn is_locked(&self) -> bool {
        !self.open.is_empty()
    }
}

/// Tipo de aviso del modal de estado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
    Warning,
}

impl StatusKind {
    pub fn icon(self) -> &'static str {
        match self {
            StatusKind::Info => "ℹ️",
            StatusKind::Success => "✅",
            StatusKind::Error => "❌",
            StatusKind::Warning => "⚠️",
        }
    }

    pub fn color_class(self) -> &'static str {
        match self {
            StatusKind::Info => "text-blue-500",
            StatusKind::Success => "text-green-500",
            StatusKind::Error => "text-red-500",
            StatusKind::Warning => "text-yellow-500",
        }
    }
}

/// Una única confirmación pendiente: el callback corre como mucho una vez
pub struct ConfirmSlot<P> {
    pending: Option<(Box<dyn FnOnce(P)>, P)>,
}

impl<P> Default for ConfirmSlot<P> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<P> ConfirmSlot<P> {
    /// Arma una confirmación nueva, descartando la anterior
    pub fn arm<F>(&mut self, payload: P, on_confirm: F)
    where
        F: FnOnce(P) + 'static,
    {
        self.pending = Some((Box::new(on_confirm), payload));
    }

    /// Saca la confirmación pendiente para ejecutarla fuera de cualquier borrow
    pub fn take(&mut self) -> Option<impl FnOnce()> {
        self.pending.take().map(|(callback, payload)| move || callback(payload))
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn body_locks_while_any_modal_is_open() {
        let mut stack = ModalStack::default();
        assert!(stack.open(ModalKind::AddEdit));
        assert!(!stack.open(ModalKind::Status));
        assert!(!stack.close(ModalKind::Status));
        assert!(stack.is_locked());
        assert!(stack.close(ModalKind::AddEdit));
        assert!(!stack.is_locked());
        assert!(!stack.close(ModalKind::AddEdit));
    }

    #[test]
    fn confirm_fires_at_most_once() {
        let mut slot = ConfirmSlot::default();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        slot.arm(7u32, move |id| counter.set(counter.get() + id));

        if let Some(run) = slot.take() {
            run();
        }
        assert!(slot.take().is_none());
        assert_eq!(fired.get(), 7);
    }

    #[test]
    fn cancel_discards_pending_confirmation() {
        let mut slot: ConfirmSlot<()> = ConfirmSlot::default();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        slot.arm((), move |_| flag.set(true));
        slot.clear();
        assert!(!slot.is_armed());
        assert!(slot.take().is_none());
        assert!(!fired.get());
    }
}
