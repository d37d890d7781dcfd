// Modelos compartidos con el backend y descriptores de módulo

pub mod auth;
pub mod form;
pub mod module_config;
pub mod record;
