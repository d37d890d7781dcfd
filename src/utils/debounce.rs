// ============================================================================
// DEBOUNCE - Temporizadores cancelables
// ============================================================================
// Un `Timeout` de gloo se cancela al hacer drop: guardar el handle nuevo en el
// mismo slot cancela el anterior. Así funcionan tanto la búsqueda (300 ms de
// silencio) como el cierre automático del modal de estado.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

/// Programa tareas diferidas; el handle cancela la tarea al destruirse
pub trait Scheduler {
    type Handle;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;
}

/// Scheduler real basado en `setTimeout`
#[derive(Clone, Copy, Default)]
pub struct GlooScheduler;

impl Scheduler for GlooScheduler {
    type Handle = Timeout;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(delay_ms, task)
    }
}

/// Como mucho una tarea pendiente: cada llamada reemplaza (cancela) la anterior
pub struct Debouncer<S: Scheduler = GlooScheduler> {
    scheduler: S,
    delay_ms: u32,
    pending: Rc<RefCell<Option<S::Handle>>>,
}

impl<S: Scheduler> Debouncer<S> {
    pub fn new(scheduler: S, delay_ms: u32) -> Self {
        Self {
            scheduler,
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    /// Reprograma la tarea con el retardo por defecto
    pub fn call<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.call_after(self.delay_ms, task);
    }

    /// Reprograma la tarea con un retardo concreto
    pub fn call_after<F>(&self, delay_ms: u32, task: F)
    where
        F: FnOnce() + 'static,
    {
        // Soltar el handle anterior antes de armar el nuevo
        self.cancel();
        let handle = self.scheduler.schedule(delay_ms, Box::new(task));
        *self.pending.borrow_mut() = Some(handle);
    }

    /// Cancela la tarea pendiente, si la hay
    pub fn cancel(&self) {
        let previous = self.pending.borrow_mut().take();
        drop(previous);
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}

impl Debouncer<GlooScheduler> {
    pub fn with_delay(delay_ms: u32) -> Self {
        Self::new(GlooScheduler, delay_ms)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::Scheduler;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Task {
        due: u64,
        cancelled: Rc<Cell<bool>>,
        run: Option<Box<dyn FnOnce()>>,
    }

    /// Reloj manual para tests: las tareas corren en `advance`
    #[derive(Clone, Default)]
    pub struct FakeScheduler {
        now: Rc<Cell<u64>>,
        tasks: Rc<RefCell<Vec<Task>>>,
    }

    pub struct FakeHandle(Rc<Cell<bool>>);

    impl Drop for FakeHandle {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    impl Scheduler for FakeScheduler {
        type Handle = FakeHandle;

        fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> FakeHandle {
            let cancelled = Rc::new(Cell::new(false));
            self.tasks.borrow_mut().push(Task {
                due: self.now.get() + u64::from(delay_ms),
                cancelled: cancelled.clone(),
                run: Some(task),
            });
            FakeHandle(cancelled)
        }
    }

    impl FakeScheduler {
        pub fn advance(&self, ms: u64) {
            let target = self.now.get() + ms;
            self.now.set(target);
            let ready: Vec<Box<dyn FnOnce()>> = {
                let mut tasks = self.tasks.borrow_mut();
                let mut ready = Vec::new();
                for task in tasks.iter_mut() {
                    if task.due <= target && !task.cancelled.get() {
                        if let Some(run) = task.run.take() {
                            ready.push(run);
                        }
                    }
                }
                tasks.retain(|t| t.run.is_some() && !t.cancelled.get());
                ready
            };
            for run in ready {
                run();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeScheduler;
    use super::*;
    use std::cell::Cell;

    #[test]
    fn burst_of_keystrokes_fires_once() {
        let clock = FakeScheduler::default();
        let debouncer = Debouncer::new(clock.clone(), 300);
        let fired = Rc::new(Cell::new(0));

        // 5 pulsaciones en 100 ms
        for _ in 0..5 {
            let fired = fired.clone();
            debouncer.call(move || fired.set(fired.get() + 1));
            clock.advance(20);
        }
        assert_eq!(fired.get(), 0);
        clock.advance(300);
        assert_eq!(fired.get(), 1);
        clock.advance(1000);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn separate_quiet_windows_fire_separately() {
        let clock = FakeScheduler::default();
        let debouncer = Debouncer::new(clock.clone(), 300);
        let fired = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let fired = fired.clone();
            debouncer.call(move || fired.set(fired.get() + 1));
            clock.advance(301);
        }
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn cancel_drops_pending_task() {
        let clock = FakeScheduler::default();
        let debouncer = Debouncer::new(clock.clone(), 50);
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        debouncer.call(move || flag.set(true));
        debouncer.cancel();
        clock.advance(100);
        assert!(!fired.get());
    }
}
