// Views: funciones que pintan DOM, sin estado propio

pub mod login_view;
pub mod modal_view;
pub mod overview_view;
pub mod shell_view;
pub mod table_view;
