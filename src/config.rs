use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub login_page: String,
    pub dashboard_page: String,
    pub environment: String,
    pub enable_logging: bool,
    pub table_config: TableConfig,
    pub ui_config: UIConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            login_page: "login.html".to_string(),
            dashboard_page: "dashboard.html".to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            table_config: TableConfig::default(),
            ui_config: UIConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub page_size: u32,
    pub search_debounce_ms: u32,
    /// Template HTML que activa el inicializador genérico de tabla
    pub table_template_marker: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            search_debounce_ms: 300,
            table_template_marker: "table-template.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    pub status_auto_close_ms: u32,
    pub logout_notice_ms: u32,
    pub logout_redirect_ms: u32,
    pub currency: String,
    pub default_module: String,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            status_auto_close_ms: 3000,
            logout_notice_ms: 1500,
            logout_redirect_ms: 1600,
            currency: "USD".to_string(),
            default_module: "dashboard_overview".to_string(),
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: option_env!("FLEET_API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            login_page: option_env!("FLEET_LOGIN_PAGE")
                .map(str::to_string)
                .unwrap_or(defaults.login_page),
            dashboard_page: option_env!("FLEET_DASHBOARD_PAGE")
                .map(str::to_string)
                .unwrap_or(defaults.dashboard_page),
            environment: option_env!("FLEET_ENVIRONMENT")
                .unwrap_or("development").to_string(),
            enable_logging: option_env!("FLEET_ENABLE_LOGGING")
                .unwrap_or("true").parse().unwrap_or(true),
            table_config: TableConfig {
                page_size: option_env!("FLEET_PAGE_SIZE")
                    .and_then(|v| v.parse().ok())
                    .filter(|size: &u32| *size > 0)
                    .unwrap_or(defaults.table_config.page_size),
                search_debounce_ms: parse_ms(
                    option_env!("FLEET_SEARCH_DEBOUNCE_MS"),
                    defaults.table_config.search_debounce_ms,
                ),
                table_template_marker: defaults.table_config.table_template_marker,
            },
            ui_config: UIConfig {
                status_auto_close_ms: parse_ms(
                    option_env!("FLEET_STATUS_AUTO_CLOSE_MS"),
                    defaults.ui_config.status_auto_close_ms,
                ),
                logout_notice_ms: parse_ms(
                    option_env!("FLEET_LOGOUT_NOTICE_MS"),
                    defaults.ui_config.logout_notice_ms,
                ),
                logout_redirect_ms: parse_ms(
                    option_env!("FLEET_LOGOUT_REDIRECT_MS"),
                    defaults.ui_config.logout_redirect_ms,
                ),
                currency: option_env!("FLEET_CURRENCY")
                    .unwrap_or("USD").to_string(),
                default_module: option_env!("FLEET_DEFAULT_MODULE")
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .unwrap_or(defaults.ui_config.default_module),
            },
        }
    }

    /// URL absoluta para un endpoint relativo de la API
    pub fn api_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!("{}{}", self.api_base_url, endpoint)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Verifica si el modo de logging está habilitado
    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

/// Milisegundos desde .env; valor por defecto si falta o no es un número
fn parse_ms(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_relative_endpoints() {
        let config = AppConfig::default();
        assert_eq!(config.api_url("/vehicle/"), "http://localhost:8000/vehicle/");
        assert_eq!(config.api_url("https://other.host/x"), "https://other.host/x");
    }

    #[test]
    fn defaults_match_table_contract() {
        let config = AppConfig::default();
        assert_eq!(config.table_config.page_size, 10);
        assert_eq!(config.table_config.search_debounce_ms, 300);
        assert_eq!(config.ui_config.status_auto_close_ms, 3000);
    }

    #[test]
    fn durations_fall_back_when_unset_or_invalid() {
        assert_eq!(parse_ms(None, 1500), 1500);
        assert_eq!(parse_ms(Some(" 2500 "), 1500), 2500);
        assert_eq!(parse_ms(Some("soon"), 1600), 1600);
        assert_eq!(parse_ms(Some("-1"), 1600), 1600);
        assert_eq!(parse_ms(Some("0"), 3000), 0);
    }

    #[test]
    fn logout_redirect_waits_for_notice() {
        let ui = UIConfig::default();
        assert_eq!(ui.logout_notice_ms, 1500);
        assert_eq!(ui.logout_redirect_ms, 1600);
        assert_eq!(ui.default_module, "dashboard_overview");
    }
}
