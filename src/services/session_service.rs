// ============================================================================
// SESSION SERVICE - Token y usuario en localStorage
// ============================================================================
// El token se guarda en crudo (sin JSON) para que el HTML de login y el
// dashboard lo lean igual; `userInfo` sí va serializado.
// ============================================================================

use std::cell::Cell;

use crate::models::auth::{JwtClaims, TokenResponse, UserDisplay, UserInfo};
use crate::utils::jwt::{is_expired, parse_jwt};
use crate::utils::storage::{
    load_from_storage, load_raw_from_storage, remove_from_storage, save_raw_to_storage, save_to_storage,
};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const TOKEN_TYPE_KEY: &str = "tokenType";
pub const USER_INFO_KEY: &str = "userInfo";

/// Resultado de la comprobación del guard
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    Missing,
    Expired,
    /// Token ilegible: se trata como sesión inválida
    Malformed,
    Valid(JwtClaims),
}

impl AuthStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, AuthStatus::Valid(_))
    }
}

/// Clasifica un token (sin tocar storage)
pub fn auth_status(token: Option<&str>, now_ms: i64) -> AuthStatus {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return AuthStatus::Missing;
    };
    match parse_jwt(token) {
        None => AuthStatus::Malformed,
        Some(claims) if is_expired(&claims, now_ms) => AuthStatus::Expired,
        Some(claims) => AuthStatus::Valid(claims),
    }
}

pub fn get_auth_token() -> Option<String> {
    load_raw_from_storage(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
}

pub fn get_token_type() -> String {
    load_raw_from_storage(TOKEN_TYPE_KEY).unwrap_or_else(|| "bearer".to_string())
}

pub fn get_user_info() -> Option<UserInfo> {
    load_from_storage::<UserInfo>(USER_INFO_KEY)
}

/// Persiste la respuesta del login
pub fn store_session(token: &TokenResponse) -> Result<(), String> {
    save_raw_to_storage(ACCESS_TOKEN_KEY, &token.access_token)?;
    save_raw_to_storage(TOKEN_TYPE_KEY, &token.token_type)?;
    save_to_storage(USER_INFO_KEY, &UserInfo::from(token))?;
    log::info!("💾 [SESSION] Sesión guardada para {}", token.username);
    Ok(())
}

pub fn clear_session() {
    remove_from_storage(ACCESS_TOKEN_KEY);
    remove_from_storage(TOKEN_TYPE_KEY);
    remove_from_storage(USER_INFO_KEY);
    log::info!("🧹 [SESSION] Sesión eliminada");
}

/// Guard del dashboard: limpia la sesión si el token no es válido
pub fn check_auth() -> AuthStatus {
    let status = auth_status(get_auth_token().as_deref(), js_sys::Date::now() as i64);
    match &status {
        AuthStatus::Valid(_) => {}
        AuthStatus::Missing => log::info!("🔒 [SESSION] No hay token"),
        AuthStatus::Expired | AuthStatus::Malformed => {
            log::warn!("⚠️ [SESSION] Token inválido o expirado: {:?}", status);
            clear_session();
        }
    }
    status
}

/// Nombre/estado de la cabecera: userInfo guardado, si no los claims del token
pub fn current_user_display() -> UserDisplay {
    if let Some(info) = get_user_info() {
        return UserDisplay::from_user_info(&info);
    }
    get_auth_token()
        .and_then(|token| parse_jwt(&token))
        .map(|claims| UserDisplay::from_claims(&claims))
        .unwrap_or_else(UserDisplay::guest)
}

/// Garantiza que el logout forzado corre una sola vez aunque lleguen
/// varios 401 a la vez
#[derive(Debug, Default)]
pub struct LogoutLatch {
    fired: Cell<bool>,
}

impl LogoutLatch {
    /// true solo la primera vez
    pub fn try_fire(&self) -> bool {
        !self.fired.replace(true)
    }

    #[cfg(test)]
    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }
}

thread_local! {
    static LOGOUT_LATCH: LogoutLatch = LogoutLatch::default();
}

/// Latch global de la página
pub fn claim_forced_logout() -> bool {
    LOGOUT_LATCH.with(LogoutLatch::try_fire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::encode_test_token;
    use serde_json::json;

    #[test]
    fn classifies_tokens() {
        assert_eq!(auth_status(None, 0), AuthStatus::Missing);
        assert_eq!(auth_status(Some(""), 0), AuthStatus::Missing);
        assert_eq!(auth_status(Some("garbage"), 0), AuthStatus::Malformed);

        let token = encode_test_token(&json!({"sub": "admin", "exp": 1_000}));
        assert_eq!(auth_status(Some(&token), 2_000_000), AuthStatus::Expired);
        assert!(auth_status(Some(&token), 999_000).is_valid());
    }

    #[test]
    fn latch_fires_once_for_many_unauthorized_responses() {
        let latch = LogoutLatch::default();
        let fired = (0..10).filter(|_| latch.try_fire()).count();
        assert_eq!(fired, 1);
        assert!(latch.has_fired());
    }
}
