// ============================================================================
// JWT - Decodificación del payload (sin verificar firma: eso es del servidor)
// ============================================================================

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::models::auth::JwtClaims;

/// Decodifica el segmento de claims de un token `header.payload.signature`
pub fn parse_jwt(token: &str) -> Option<JwtClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// `exp` está en segundos; se compara contra milisegundos como hace el navegador
pub fn is_expired(claims: &JwtClaims, now_ms: i64) -> bool {
    match claims.exp {
        Some(exp) => exp.saturating_mul(1000) < now_ms,
        None => false,
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{}.signature", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_claims() {
        let token = encode_test_token(&json!({"sub": "admin", "user_id": 3, "status": "active", "exp": 1_700_000_000}));
        let claims = parse_jwt(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("admin"));
        assert_eq!(claims.user_id, Some(3));
        assert_eq!(claims.exp, Some(1_700_000_000));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(parse_jwt("not-a-token").is_none());
        assert!(parse_jwt("a.%%%.c").is_none());
    }

    #[test]
    fn expiry_compares_in_milliseconds() {
        let claims = JwtClaims { exp: Some(100), ..JwtClaims::default() };
        assert!(!is_expired(&claims, 100_000));
        assert!(is_expired(&claims, 100_001));
        assert!(!is_expired(&JwtClaims::default(), i64::MAX));
    }
}
