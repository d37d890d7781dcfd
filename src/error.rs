// ============================================================================
// ERRORES - Taxonomía de errores del panel
// ============================================================================
// Ninguno de estos errores llega al usuario como excepción: el cliente API los
// convierte en notificaciones y los handlers de la tabla/modales en avisos.
// ============================================================================

use thiserror::Error;

/// Resultado de una petición HTTP que no se pudo completar
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("unauthorized (401)")]
    Unauthorized,
    #[error("server error {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("unexpected non-JSON response {status}")]
    UnexpectedBody { status: u16, snippet: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Título y mensaje del modal de estado; None para los 401 (se fuerza logout)
    pub fn notification(&self) -> Option<(String, String)> {
        match self {
            ApiError::Unauthorized => None,
            ApiError::Server { status, detail } => {
                Some((format!("API Error: {}", status), detail.clone()))
            }
            ApiError::UnexpectedBody { status, snippet } => Some((
                format!("API Error: {}", status),
                format!("Server responded with: {}...", snippet),
            )),
            ApiError::Transport(message) | ApiError::Decode(message) => {
                let message = if message.is_empty() {
                    "A network or request error occurred.".to_string()
                } else {
                    message.clone()
                };
                Some(("Request Error".to_string(), message))
            }
        }
    }
}

/// Configuración de módulo inválida (se detecta al cargarla, nunca al renderizar)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("module '{module}': invalid JSON in {attribute}: {source}")]
    InvalidJson {
        module: String,
        attribute: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("module without data-module name")]
    MissingName,
    #[error("module '{0}' declares a table template but no API endpoint")]
    MissingEndpoint(String),
    #[error("module '{0}' has an API endpoint but no columns")]
    NoColumns(String),
    #[error("module '{module}': select field '{field}' has neither options nor apiLookup")]
    SelectWithoutSource { module: String, field: String },
    #[error("module '{module}': lookup field '{field}' needs valueField and displayFields")]
    IncompleteLookup { module: String, field: String },
    #[error("module '{module}': duplicate form field id '{field}'")]
    DuplicateField { module: String, field: String },
    #[error("module '{0}': status filter key without options")]
    StatusFilterWithoutOptions(String),
    #[error("duplicate module name '{0}'")]
    DuplicateModule(String),
}

/// Errores de validación en el cliente: se muestran como aviso y no se envía nada
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please fill in the required field: {0}.")]
    MissingRequired(String),
    #[error("'{0}' must be a number.")]
    InvalidNumber(String),
    #[error("Please select both start and end dates for custom range.")]
    DateRangeIncomplete,
    #[error("Start date cannot be after end date.")]
    DateRangeInverted,
}

impl ValidationError {
    pub fn title(&self) -> &'static str {
        "Input Error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_has_no_notification() {
        assert_eq!(ApiError::Unauthorized.notification(), None);
    }

    #[test]
    fn server_error_carries_status_and_detail() {
        let err = ApiError::Server { status: 422, detail: "plate_number required".into() };
        assert_eq!(
            err.notification(),
            Some(("API Error: 422".to_string(), "plate_number required".to_string()))
        );
    }

    #[test]
    fn transport_error_falls_back_to_generic_message() {
        let (title, message) = ApiError::Transport(String::new()).notification().unwrap();
        assert_eq!(title, "Request Error");
        assert_eq!(message, "A network or request error occurred.");
    }
}
