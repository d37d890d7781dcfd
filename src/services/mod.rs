// Servicios: SOLO comunicación (API, sesión, login, plantillas HTML)

pub mod api_client;
pub mod auth_service;
pub mod session_service;
pub mod template_service;
