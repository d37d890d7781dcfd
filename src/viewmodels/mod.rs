pub mod modal_viewmodel;
pub mod overview_viewmodel;
pub mod shell_viewmodel;
pub mod table_viewmodel;
