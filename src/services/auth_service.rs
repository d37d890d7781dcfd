use serde_json::Value;

use crate::config::CONFIG;
use crate::models::auth::TokenResponse;
use crate::services::api_client::{prepare_request, HttpMethod, RequestBody};
use crate::services::session_service::{clear_session, store_session};

/// Mensaje por defecto cuando el backend no explica el fallo
const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

/// `detail` de un error FastAPI, o el mensaje genérico
pub fn login_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .map(|detail| match detail {
            Value::String(s) if !s.is_empty() => s,
            Value::Null => LOGIN_FAILED.to_string(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| LOGIN_FAILED.to_string())
}

/// Perform login with username (or email) and password.
/// El backend espera el formulario OAuth2 (`username`, `password`).
/// Un 401 aquí es "credenciales inválidas", no sesión caducada: por eso no
/// pasa por `ApiClient`.
pub async fn perform_login(username: &str, password: &str) -> Result<TokenResponse, String> {
    let url = CONFIG.api_url("/login/");
    let form = login_form(username, password);

    log::info!("🔐 [AUTH] Login para usuario: {}", username.trim());
    let response = prepare_request(&url, HttpMethod::Post, &[], None, Some(form))
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Request error: {}", e))?;

    if !response.ok() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::warn!("⚠️ [AUTH] Login rechazado ({})", status);
        return Err(login_error_message(&body));
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| format!("Parse error: {}", e))?;
    store_session(&token)?;
    log::info!("✅ [AUTH] Login correcto: {} ({})", token.username, token.status);
    Ok(token)
}

pub fn login_form(username: &str, password: &str) -> RequestBody {
    RequestBody::Form(vec![
        ("username".to_string(), username.trim().to_string()),
        ("password".to_string(), password.trim().to_string()),
    ])
}

/// Borra la sesión local (el backend no mantiene sesiones)
pub fn perform_logout() {
    clear_session();
    log::info!("👋 [AUTH] Logout");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_errors_surface_backend_detail() {
        assert_eq!(login_error_message(r#"{"detail":"Invalid Credentials"}"#), "Invalid Credentials");
        assert_eq!(
            login_error_message(r#"{"detail":"Account pending approval"}"#),
            "Account pending approval"
        );
        assert_eq!(login_error_message("<html>"), LOGIN_FAILED);
        assert_eq!(login_error_message(r#"{"detail":null}"#), LOGIN_FAILED);
    }

    #[test]
    fn login_posts_trimmed_oauth_form() {
        let form = login_form("  admin@fleet.io ", "s3cret+1 ");
        assert_eq!(form.content_type(), "application/x-www-form-urlencoded");
        assert_eq!(form.encode().unwrap(), "username=admin%40fleet.io&password=s3cret%2B1");
    }
}
