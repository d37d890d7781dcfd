// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP
// ============================================================================
// Un único punto de entrada para el backend: añade el token, serializa el
// body y clasifica la respuesta. Ningún error sale de aquí: se notifican por
// el `Notifier` y el llamador recibe `None`.
// ============================================================================

use std::rc::Rc;

use gloo_net::http::{Request, RequestBuilder};
use serde_json::Value;

use crate::config::CONFIG;
use crate::error::ApiError;
use crate::services::session_service::{claim_forced_logout, clear_session, get_auth_token, get_token_type};

/// Salida de errores hacia la UI (modal de estado)
pub trait Notifier {
    fn notify_error(&self, title: &str, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Cuerpo de la petición
pub enum RequestBody {
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
}

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

impl RequestBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Json(_) => JSON_CONTENT_TYPE,
            RequestBody::Form(_) => FORM_CONTENT_TYPE,
        }
    }

    /// Texto que viaja en el body
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            RequestBody::Json(value) => serde_json::to_string(value),
            RequestBody::Form(pairs) => Ok(form_urlencoded(pairs)),
        }
    }
}

/// `k1=v1&k2=v2` con claves y valores codificados
pub fn form_urlencoded(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Construye la petición: verbo, query, cabecera de auth y body
pub fn prepare_request(
    url: &str,
    method: HttpMethod,
    query: &[(String, String)],
    authorization: Option<&str>,
    body: Option<RequestBody>,
) -> Result<Request, gloo_net::Error> {
    let mut builder = match method {
        HttpMethod::Get => Request::get(url),
        HttpMethod::Post => Request::post(url),
        HttpMethod::Put => Request::put(url),
        HttpMethod::Patch => Request::patch(url),
        HttpMethod::Delete => Request::delete(url),
    };
    if !query.is_empty() {
        builder = builder.query(query.iter().map(|(key, value)| (key.as_str(), value.as_str())));
    }
    if let Some(authorization) = authorization {
        builder = builder.header("Authorization", authorization);
    }
    attach_body(builder, body)
}

fn attach_body(builder: RequestBuilder, body: Option<RequestBody>) -> Result<Request, gloo_net::Error> {
    match body {
        None => builder.header("Content-Type", JSON_CONTENT_TYPE).build(),
        Some(body) => {
            let text = body.encode().map_err(gloo_net::Error::SerdeError)?;
            builder.header("Content-Type", body.content_type()).body(text)
        }
    }
}

/// Respuesta útil del backend
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    /// 204
    NoContent,
    /// 2xx que no es JSON
    Text(String),
}

impl ApiResponse {
    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            _ => None,
        }
    }
}

const SNIPPET_CHARS: usize = 100;

/// Clasifica status + content-type + body sin tocar la red
pub fn interpret_response(status: u16, content_type: Option<&str>, body: &str) -> Result<ApiResponse, ApiError> {
    if status == 401 {
        return Err(ApiError::Unauthorized);
    }
    if status == 204 {
        return Ok(ApiResponse::NoContent);
    }
    let ok = (200..300).contains(&status);
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));

    if !is_json {
        if ok {
            return Ok(ApiResponse::Text(body.to_string()));
        }
        let snippet: String = body.chars().take(SNIPPET_CHARS).collect();
        return Err(ApiError::UnexpectedBody { status, snippet });
    }

    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if ok {
        return Ok(ApiResponse::Json(value));
    }
    let detail = match value.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(detail) if !detail.is_null() => detail.to_string(),
        _ => value.to_string(),
    };
    Err(ApiError::Server { status, detail })
}

/// `bearer` (como lo guarda el login) -> `Bearer <token>`
pub fn authorization_header(token_type: &str, token: &str) -> String {
    let scheme = match token_type.trim() {
        t if t.is_empty() || t.eq_ignore_ascii_case("bearer") => "Bearer".to_string(),
        other => other.to_string(),
    };
    format!("{} {}", scheme, token)
}

/// Cliente API (stateless: el token se lee en cada petición)
#[derive(Clone)]
pub struct ApiClient {
    notifier: Rc<dyn Notifier>,
    on_unauthorized: Rc<dyn Fn()>,
}

impl ApiClient {
    pub fn new(notifier: Rc<dyn Notifier>, on_unauthorized: Rc<dyn Fn()>) -> Self {
        Self {
            notifier,
            on_unauthorized,
        }
    }

    pub async fn get(&self, endpoint: &str) -> Option<ApiResponse> {
        self.request(endpoint, HttpMethod::Get, None).await
    }

    /// GET con query string (`?skip=0&limit=10...`)
    pub async fn get_with_query(&self, endpoint: &str, pairs: &[(String, String)]) -> Option<ApiResponse> {
        self.dispatch(endpoint, HttpMethod::Get, pairs, None).await
    }

    /// Petición completa. `None` = fallo ya notificado (o 401 ya gestionado).
    pub async fn request(&self, endpoint: &str, method: HttpMethod, body: Option<RequestBody>) -> Option<ApiResponse> {
        self.dispatch(endpoint, method, &[], body).await
    }

    async fn dispatch(
        &self,
        endpoint: &str,
        method: HttpMethod,
        query: &[(String, String)],
        body: Option<RequestBody>,
    ) -> Option<ApiResponse> {
        match self.send(endpoint, method, query, body).await {
            Ok(response) => Some(response),
            Err(ApiError::Unauthorized) => {
                log::warn!("🔒 [API] 401 en {} {}: cerrando sesión", method.as_str(), endpoint);
                clear_session();
                if claim_forced_logout() {
                    (self.on_unauthorized)();
                }
                None
            }
            Err(error) => {
                log::error!("❌ [API] {} {}: {}", method.as_str(), endpoint, error);
                if let Some((title, message)) = error.notification() {
                    self.notifier.notify_error(&title, &message);
                }
                None
            }
        }
    }

    async fn send(
        &self,
        endpoint: &str,
        method: HttpMethod,
        query: &[(String, String)],
        body: Option<RequestBody>,
    ) -> Result<ApiResponse, ApiError> {
        let url = CONFIG.api_url(endpoint);
        let authorization = get_auth_token().map(|token| authorization_header(&get_token_type(), &token));
        if authorization.is_none() {
            log::warn!("⚠️ [API] Petición a {} sin token", endpoint);
        }

        let request = prepare_request(&url, method, query, authorization.as_deref(), body)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        log::debug!("🌐 [API] {} {}", method.as_str(), request.url());

        let response = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let content_type = response.headers().get("content-type");
        let text = if status == 204 || status == 401 {
            String::new()
        } else {
            response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?
        };
        interpret_response(status, content_type.as_deref(), &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON: Option<&str> = Some("application/json; charset=utf-8");

    #[test]
    fn login_form_is_url_encoded() {
        let body = RequestBody::Form(vec![
            ("username".to_string(), "ana@fleet.io".to_string()),
            ("password".to_string(), "p&ss word/é".to_string()),
        ]);
        assert_eq!(body.content_type(), "application/x-www-form-urlencoded");
        assert_eq!(body.encode().unwrap(), "username=ana%40fleet.io&password=p%26ss%20word%2F%C3%A9");
    }

    #[test]
    fn json_body_keeps_json_content_type() {
        let body = RequestBody::Json(json!({"plate_number": "AB-123", "year": 2020}));
        assert_eq!(body.content_type(), "application/json");
        let sent: Value = serde_json::from_str(&body.encode().unwrap()).unwrap();
        assert_eq!(sent, json!({"plate_number": "AB-123", "year": 2020}));
    }

    #[test]
    fn stored_token_type_becomes_bearer_scheme() {
        assert_eq!(authorization_header("bearer", "abc"), "Bearer abc");
        assert_eq!(authorization_header("", "abc"), "Bearer abc");
        assert_eq!(authorization_header("Token", "abc"), "Token abc");
    }

    #[test]
    fn no_content_and_unauthorized() {
        assert_eq!(interpret_response(204, None, ""), Ok(ApiResponse::NoContent));
        assert_eq!(interpret_response(401, JSON, "{}"), Err(ApiError::Unauthorized));
    }

    #[test]
    fn success_bodies() {
        assert_eq!(
            interpret_response(200, JSON, r#"{"items":[],"total":0}"#),
            Ok(ApiResponse::Json(json!({"items": [], "total": 0})))
        );
        assert_eq!(interpret_response(200, Some("text/plain"), "pong"), Ok(ApiResponse::Text("pong".into())));
    }

    #[test]
    fn server_errors_carry_detail() {
        assert_eq!(
            interpret_response(404, JSON, r#"{"detail":"Vehicle not found"}"#),
            Err(ApiError::Server { status: 404, detail: "Vehicle not found".into() })
        );
        // Validación de FastAPI: detail es una lista
        let err = interpret_response(422, JSON, r#"{"detail":[{"loc":["body","vin"]}]}"#).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 422, ref detail } if detail.contains("vin")));
        let err = interpret_response(400, JSON, r#"{"error":"bad"}"#).unwrap_err();
        assert_eq!(err, ApiError::Server { status: 400, detail: r#"{"error":"bad"}"#.into() });
    }

    #[test]
    fn non_json_errors_are_truncated() {
        let body = "x".repeat(500);
        match interpret_response(502, Some("text/html"), &body) {
            Err(ApiError::UnexpectedBody { status, snippet }) => {
                assert_eq!(status, 502);
                assert_eq!(snippet.len(), 100);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn broken_json_is_a_request_error() {
        let err = interpret_response(200, JSON, "{oops").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.notification().map(|(title, _)| title), Some("Request Error".to_string()));
    }
}
