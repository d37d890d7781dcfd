use serde::{Deserialize, Serialize};

/// Respuesta de `POST /login/`
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub username: String,
    pub status: String,
}

/// Datos del usuario persistidos bajo `userInfo`
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct UserInfo {
    pub user_id: i64,
    pub username: String,
    pub status: String,
}

impl From<&TokenResponse> for UserInfo {
    fn from(token: &TokenResponse) -> Self {
        Self {
            user_id: token.user_id,
            username: token.username.clone(),
            status: token.status.clone(),
        }
    }
}

/// Claims del JWT emitido por el backend
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct JwtClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Nombre y estado a mostrar en la cabecera
#[derive(Clone, PartialEq, Debug)]
pub struct UserDisplay {
    pub name: String,
    pub role: String,
}

impl UserDisplay {
    pub fn guest() -> Self {
        Self { name: "Guest".to_string(), role: String::new() }
    }

    pub fn from_user_info(info: &UserInfo) -> Self {
        Self {
            name: if info.username.is_empty() { "User".to_string() } else { info.username.clone() },
            role: capitalize_or(&info.status, "Active"),
        }
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            name: claims.sub.clone().unwrap_or_else(|| "User".to_string()),
            role: capitalize_or(claims.status.as_deref().unwrap_or(""), "Active"),
        }
    }
}

fn capitalize_or(raw: &str, default: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_stored_user_info() {
        let info = UserInfo { user_id: 1, username: "admin".into(), status: "active".into() };
        assert_eq!(
            UserDisplay::from_user_info(&info),
            UserDisplay { name: "admin".into(), role: "Active".into() }
        );
    }

    #[test]
    fn display_from_claims_defaults_role() {
        let claims = JwtClaims { sub: Some("ops".into()), ..JwtClaims::default() };
        assert_eq!(UserDisplay::from_claims(&claims).role, "Active");
    }
}
