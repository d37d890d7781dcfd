// ============================================================================
// STATE MODULE - Estado del shell + máquinas de estado puras (tabla, modales)
// ============================================================================

pub mod app_state;
pub mod modal_state;
pub mod pagination;
pub mod table_state;
