// ============================================================================
// MODULE CONFIG - Descriptor declarativo de cada módulo CRUD
// ============================================================================

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::models::record::{get_nested, value_to_plain_string};
use crate::utils::format::RenderFn;

/// Columna de la tabla
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub key: String,
    pub header: String,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub is_id: bool,
    #[serde(default)]
    pub render: Option<RenderFn>,
    #[serde(default)]
    pub fallback: Option<String>,
}

impl ColumnSpec {
    pub fn new(key: &str, header: &str) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
            sortable: false,
            sort_key: None,
            is_id: false,
            render: None,
            fallback: None,
        }
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self.sortable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn sort_by(mut self, sort_key: &str) -> Self {
        self.sortable = true;
        self.sort_key = Some(sort_key.to_string());
        self
    }

    pub fn render(mut self, render: RenderFn) -> Self {
        self.render = Some(render);
        self
    }

    pub fn fallback(mut self, fallback: &str) -> Self {
        self.fallback = Some(fallback.to_string());
        self
    }

    /// Clave enviada en `ordering`
    pub fn effective_sort_key(&self) -> &str {
        self.sort_key.as_deref().unwrap_or(&self.key)
    }
}

/// Tipo de input generado para un campo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Password,
    Tel,
    Date,
    #[serde(rename = "datetime-local")]
    DateTimeLocal,
    Textarea,
    Select,
}

impl FieldType {
    /// Valor del atributo `type` para los `<input>`
    pub fn input_type(self) -> &'static str {
        match self {
            FieldType::Text | FieldType::Textarea | FieldType::Select => "text",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Tel => "tel",
            FieldType::Date => "date",
            FieldType::DateTimeLocal => "datetime-local",
        }
    }
}

/// Opción estática de un select o del filtro de estado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Value,
    pub text: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, text: &str) -> Self {
        Self { value: value.into(), text: text.to_string() }
    }

    /// Valor tal y como aparece en el atributo `value` del `<option>`
    pub fn value_string(&self) -> String {
        value_to_plain_string(&self.value)
    }
}

/// Campo del formulario de alta/edición
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldSpec {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub api_lookup: Option<String>,
    #[serde(default)]
    pub value_field: Option<String>,
    #[serde(default)]
    pub display_fields: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub default_to_now: bool,
    #[serde(default)]
    pub rows: Option<u32>,
}

impl FormFieldSpec {
    pub fn new(id: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required: false,
            options: None,
            api_lookup: None,
            value_field: None,
            display_fields: Vec::new(),
            placeholder: None,
            default_value: None,
            default_to_now: false,
            rows: None,
        }
    }

    pub fn text(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldType::Text)
    }

    pub fn number(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldType::Number)
    }

    pub fn datetime(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldType::DateTimeLocal)
    }

    pub fn select(id: &str, label: &str, options: Vec<SelectOption>) -> Self {
        let mut field = Self::new(id, label, FieldType::Select);
        field.options = Some(options);
        field
    }

    /// Select cuyas opciones vienen de otro endpoint
    pub fn lookup(id: &str, label: &str, endpoint: &str, value_field: &str, display_fields: &[&str]) -> Self {
        let mut field = Self::new(id, label, FieldType::Select);
        field.api_lookup = Some(endpoint.to_string());
        field.value_field = Some(value_field.to_string());
        field.display_fields = display_fields.iter().map(|s| s.to_string()).collect();
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn default_to_now(mut self) -> Self {
        self.default_to_now = true;
        self
    }

    pub fn textarea(mut self, rows: u32) -> Self {
        self.field_type = FieldType::Textarea;
        self.rows = Some(rows);
        self
    }

    /// Clave `<id>_id` usada para preseleccionar un lookup
    pub fn id_field_key(&self) -> String {
        if self.id.ends_with("_id") {
            self.id.clone()
        } else {
            format!("{}_id", self.id)
        }
    }
}

/// Campo del modal de detalle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFieldSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub render: Option<RenderFn>,
    #[serde(default)]
    pub fallback: Option<String>,
}

impl ViewFieldSpec {
    pub fn new(key: &str, label: &str) -> Self {
        Self { key: key.to_string(), label: label.to_string(), render: None, fallback: None }
    }

    pub fn render(mut self, render: RenderFn) -> Self {
        self.render = Some(render);
        self
    }
}

/// Verbo HTTP usado para guardar una edición
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateMethod {
    #[default]
    Put,
    Patch,
}

/// Descriptor completo de un módulo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub name: String,
    pub title: String,
    pub content_url: String,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub form_fields: Vec<FormFieldSpec>,
    #[serde(default)]
    pub view_fields: Vec<ViewFieldSpec>,
    #[serde(default)]
    pub has_date_filters: bool,
    #[serde(default)]
    pub status_filter_key: Option<String>,
    #[serde(default)]
    pub status_filter_options: Vec<SelectOption>,
    #[serde(default)]
    pub update_method: UpdateMethod,
}

impl ModuleConfig {
    /// Módulo sin tabla (overview, páginas estáticas)
    pub fn page(name: &str, title: &str, content_url: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            content_url: content_url.to_string(),
            api_endpoint: None,
            columns: Vec::new(),
            form_fields: Vec::new(),
            view_fields: Vec::new(),
            has_date_filters: false,
            status_filter_key: None,
            status_filter_options: Vec::new(),
            update_method: UpdateMethod::Put,
        }
    }

    /// Módulo CRUD servido por la plantilla de tabla genérica
    pub fn table(name: &str, title: &str, api_endpoint: &str, content_url: &str) -> Self {
        let mut config = Self::page(name, title, content_url);
        config.api_endpoint = Some(api_endpoint.to_string());
        config
    }

    pub fn columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.columns = columns;
        self
    }

    pub fn form_fields(mut self, fields: Vec<FormFieldSpec>) -> Self {
        self.form_fields = fields;
        self
    }

    pub fn view_fields(mut self, fields: Vec<ViewFieldSpec>) -> Self {
        self.view_fields = fields;
        self
    }

    pub fn date_filters(mut self) -> Self {
        self.has_date_filters = true;
        self
    }

    pub fn status_filter(mut self, key: &str, options: Vec<SelectOption>) -> Self {
        self.status_filter_key = Some(key.to_string());
        self.status_filter_options = options;
        self
    }

    /// Enlace de navegación (`#vehicles`)
    pub fn href(&self) -> String {
        format!("#{}", self.name)
    }

    pub fn id_column(&self) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.is_id)
    }

    /// Ruta del identificador dentro de un registro
    pub fn id_key(&self) -> &str {
        self.id_column().map(|c| c.key.as_str()).unwrap_or("id")
    }

    /// Identificador de un registro como texto (para `data-id` y URLs)
    pub fn record_id(&self, record: &Value) -> Option<String> {
        get_nested(record, self.id_key())
            .filter(|v| !v.is_null())
            .map(value_to_plain_string)
    }

    /// Orden inicial: columna ID, si no la primera ordenable, si no la primera
    pub fn default_sort_key(&self) -> Option<String> {
        self.id_column()
            .or_else(|| self.columns.iter().find(|c| c.sortable))
            .or_else(|| self.columns.first())
            .map(|c| c.effective_sort_key().to_string())
    }

    /// Título sin "Records"/"Record" ("Vehicle Records" -> "Vehicle")
    pub fn singular_title(&self) -> String {
        let lowered = self.title.to_ascii_lowercase();
        match lowered.find("record") {
            Some(start) => {
                let mut end = start + "record".len();
                if lowered[end..].starts_with('s') {
                    end += 1;
                }
                format!("{}{}", &self.title[..start], &self.title[end..]).trim().to_string()
            }
            None => self.title.trim().to_string(),
        }
    }

    /// Usa la plantilla de tabla genérica
    pub fn is_table_module(&self, table_template_marker: &str) -> bool {
        self.api_endpoint.as_deref().is_some_and(|e| !e.is_empty())
            && self.content_url.contains(table_template_marker)
    }

    /// URL de un registro concreto (`/vehicle/` + `12`)
    pub fn item_endpoint(&self, id: &str) -> Option<String> {
        self.api_endpoint.as_ref().map(|endpoint| format!("{}{}", endpoint, id))
    }

    /// Comprueba la coherencia interna del descriptor
    pub fn validate(&self, table_template_marker: &str) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingName);
        }
        let has_endpoint = self.api_endpoint.as_deref().is_some_and(|e| !e.is_empty());
        if self.content_url.contains(table_template_marker) && !has_endpoint {
            return Err(ConfigError::MissingEndpoint(self.name.clone()));
        }
        if has_endpoint && self.columns.is_empty() {
            return Err(ConfigError::NoColumns(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for field in &self.form_fields {
            if !seen.insert(field.id.as_str()) {
                return Err(ConfigError::DuplicateField {
                    module: self.name.clone(),
                    field: field.id.clone(),
                });
            }
            if field.field_type != FieldType::Select {
                continue;
            }
            match (&field.options, &field.api_lookup) {
                (None, None) => {
                    return Err(ConfigError::SelectWithoutSource {
                        module: self.name.clone(),
                        field: field.id.clone(),
                    });
                }
                (None, Some(_)) if field.value_field.is_none() || field.display_fields.is_empty() => {
                    return Err(ConfigError::IncompleteLookup {
                        module: self.name.clone(),
                        field: field.id.clone(),
                    });
                }
                _ => {}
            }
        }

        if self.status_filter_key.is_some() && self.status_filter_options.is_empty() {
            return Err(ConfigError::StatusFilterWithoutOptions(self.name.clone()));
        }
        Ok(())
    }

    /// Construye el descriptor a partir de los atributos `data-*` de un enlace
    /// de navegación (los valores JSON se validan igual que el catálogo).
    pub fn from_nav_attributes(
        attributes: &HashMap<String, String>,
        table_template_marker: &str,
    ) -> Result<Self, ConfigError> {
        let get = |name: &str| attributes.get(name).map(|s| s.trim()).filter(|s| !s.is_empty());
        let name = get("data-module").ok_or(ConfigError::MissingName)?.to_string();

        fn parse_json<T: serde::de::DeserializeOwned + Default>(
            module: &str,
            attribute: &str,
            raw: Option<&str>,
        ) -> Result<T, ConfigError> {
            match raw {
                Some(raw) => serde_json::from_str(raw).map_err(|source| ConfigError::InvalidJson {
                    module: module.to_string(),
                    attribute: attribute.to_string(),
                    source,
                }),
                None => Ok(T::default()),
            }
        }

        let config = Self {
            title: get("data-title").unwrap_or("Page").to_string(),
            content_url: get("data-content-url").unwrap_or_default().to_string(),
            api_endpoint: get("data-api-endpoint").map(str::to_string),
            columns: parse_json(&name, "data-columns", get("data-columns"))?,
            form_fields: parse_json(&name, "data-form-fields", get("data-form-fields"))?,
            view_fields: parse_json(&name, "data-view-fields", get("data-view-fields"))?,
            has_date_filters: get("data-date-filters") == Some("true"),
            status_filter_key: get("data-status-filter-key").map(str::to_string),
            status_filter_options: parse_json(
                &name,
                "data-status-filter-options",
                get("data-status-filter-options"),
            )?,
            update_method: match get("data-update-method") {
                Some(m) if m.eq_ignore_ascii_case("patch") => UpdateMethod::Patch,
                _ => UpdateMethod::Put,
            },
            name,
        };
        config.validate(table_template_marker)?;
        Ok(config)
    }

    /// Carga un manifiesto JSON (`[ModuleConfig, ...]`) validando cada módulo
    pub fn from_manifest(raw: &str, table_template_marker: &str) -> Result<Vec<Self>, ConfigError> {
        let modules: Vec<Self> = serde_json::from_str(raw).map_err(|source| ConfigError::InvalidJson {
            module: "*".to_string(),
            attribute: "manifest".to_string(),
            source,
        })?;
        let mut names = HashSet::new();
        for module in &modules {
            module.validate(table_template_marker)?;
            if !names.insert(module.name.as_str()) {
                return Err(ConfigError::DuplicateModule(module.name.clone()));
            }
        }
        Ok(modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MARKER: &str = "table-template.html";

    fn vehicles() -> ModuleConfig {
        ModuleConfig::table("vehicles", "Vehicle Records", "/vehicle/", "pages/table-template.html")
            .columns(vec![
                ColumnSpec::new("plate_number", "Plate").sortable(),
                ColumnSpec::new("id", "ID").id(),
            ])
    }

    #[test]
    fn default_sort_prefers_id_column() {
        assert_eq!(vehicles().default_sort_key().as_deref(), Some("id"));

        let no_id = ModuleConfig::table("x", "X", "/x/", MARKER).columns(vec![
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("created_at", "Created").sort_by("created"),
        ]);
        assert_eq!(no_id.default_sort_key().as_deref(), Some("created"));

        let unsorted = ModuleConfig::table("y", "Y", "/y/", MARKER).columns(vec![ColumnSpec::new("name", "Name")]);
        assert_eq!(unsorted.default_sort_key().as_deref(), Some("name"));
    }

    #[test]
    fn singular_title_strips_record_word() {
        assert_eq!(vehicles().singular_title(), "Vehicle");
        let mut config = vehicles();
        config.title = "Fuel Record".into();
        assert_eq!(config.singular_title(), "Fuel");
        config.title = "Garages".into();
        assert_eq!(config.singular_title(), "Garages");
    }

    #[test]
    fn record_id_uses_id_column_path() {
        let config = vehicles();
        assert_eq!(config.record_id(&json!({"id": 42})).as_deref(), Some("42"));
        assert_eq!(config.record_id(&json!({"id": null})), None);
        assert_eq!(config.item_endpoint("42").as_deref(), Some("/vehicle/42"));
    }

    #[test]
    fn parses_nav_attributes() {
        let mut attrs = HashMap::new();
        attrs.insert("data-module".to_string(), "pannes".to_string());
        attrs.insert("data-title".to_string(), "Breakdown Records".to_string());
        attrs.insert("data-content-url".to_string(), "pages/table-template.html".to_string());
        attrs.insert("data-api-endpoint".to_string(), "/panne/".to_string());
        attrs.insert(
            "data-columns".to_string(),
            r#"[{"key":"id","header":"ID","isId":true,"sortable":true},{"key":"status","header":"Status","render":"statusBadge"}]"#.to_string(),
        );
        attrs.insert(
            "data-form-fields".to_string(),
            r#"[{"id":"vehicle_id","label":"Vehicle","type":"select","apiLookup":"/vehicle/","valueField":"id","displayFields":["plate_number"]},{"id":"panne_date","label":"Date","type":"datetime-local","defaultToNow":true}]"#.to_string(),
        );
        attrs.insert("data-date-filters".to_string(), "true".to_string());
        attrs.insert("data-status-filter-key".to_string(), "status".to_string());
        attrs.insert(
            "data-status-filter-options".to_string(),
            r#"[{"value":"","text":"All"},{"value":"active","text":"Active"}]"#.to_string(),
        );

        let config = ModuleConfig::from_nav_attributes(&attrs, MARKER).unwrap();
        assert_eq!(config.columns[1].render, Some(RenderFn::StatusBadge));
        assert_eq!(config.form_fields[1].field_type, FieldType::DateTimeLocal);
        assert!(config.has_date_filters);
        assert!(config.is_table_module(MARKER));
        assert_eq!(config.status_filter_options.len(), 2);
    }

    #[test]
    fn unknown_render_name_fails_at_load() {
        let mut attrs = HashMap::new();
        attrs.insert("data-module".to_string(), "x".to_string());
        attrs.insert("data-api-endpoint".to_string(), "/x/".to_string());
        attrs.insert("data-columns".to_string(), r#"[{"key":"a","header":"A","render":"boom"}]"#.to_string());
        let err = ModuleConfig::from_nav_attributes(&attrs, MARKER).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
    }

    #[test]
    fn validation_catches_incoherent_configs() {
        let missing_endpoint = ModuleConfig::page("x", "X", "pages/table-template.html");
        assert!(matches!(missing_endpoint.validate(MARKER), Err(ConfigError::MissingEndpoint(_))));

        let no_source = vehicles().form_fields(vec![FormFieldSpec::new("make", "Make", FieldType::Select)]);
        assert!(matches!(no_source.validate(MARKER), Err(ConfigError::SelectWithoutSource { .. })));

        let mut partial_lookup = FormFieldSpec::lookup("make", "Make", "/vehicle_make/", "id", &["vehicle_make"]);
        partial_lookup.display_fields.clear();
        let incomplete = vehicles().form_fields(vec![partial_lookup]);
        assert!(matches!(incomplete.validate(MARKER), Err(ConfigError::IncompleteLookup { .. })));

        let duplicated = vehicles().form_fields(vec![FormFieldSpec::text("vin", "VIN"), FormFieldSpec::text("vin", "VIN")]);
        assert!(matches!(duplicated.validate(MARKER), Err(ConfigError::DuplicateField { .. })));

        let status = vehicles().status_filter("status", vec![]);
        assert!(matches!(status.validate(MARKER), Err(ConfigError::StatusFilterWithoutOptions(_))));
    }

    #[test]
    fn manifest_rejects_duplicate_modules() {
        let manifest = json!([
            {"name": "garages", "title": "Garages", "contentUrl": "pages/table-template.html", "apiEndpoint": "/garage/", "columns": [{"key": "id", "header": "ID", "isId": true}]},
            {"name": "garages", "title": "Garages", "contentUrl": "pages/table-template.html", "apiEndpoint": "/garage/", "columns": [{"key": "id", "header": "ID", "isId": true}]}
        ]);
        let err = ModuleConfig::from_manifest(&manifest.to_string(), MARKER).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateModule(_)));
    }
}
