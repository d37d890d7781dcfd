// ============================================================================
// RECORD - Registros opacos devueltos por el backend
// ============================================================================

use serde_json::Value;

/// Un registro es un objeto JSON sin forma fija
pub type Record = Value;

/// Buscar una propiedad anidada ("vehicle.plate_number").
/// Devuelve None si algún segmento no existe; un `null` explícito se devuelve tal cual.
pub fn get_nested<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(record);
    }
    path.split('.').try_fold(record, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Igual que `get_nested` pero tratando `null` como ausente
pub fn get_present<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    get_nested(record, path).filter(|v| !v.is_null())
}

/// Representación "String(value)" de un valor escalar (sin comillas)
pub fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Respuesta paginada `{items: [...], total: N}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginatedResponse {
    pub items: Vec<Record>,
    pub total: u64,
}

impl PaginatedResponse {
    /// Interpreta cualquier JSON como página; lo que falte se degrada a vacío/0.
    /// Algunos routers devuelven `total_count` en lugar de `total`.
    pub fn from_value(value: &Value) -> Self {
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total = value
            .get("total")
            .or_else(|| value.get("total_count"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_lookup_walks_objects() {
        let record = json!({"vehicle": {"plate_number": "AB-123", "make": null}});
        assert_eq!(get_nested(&record, "vehicle.plate_number"), Some(&json!("AB-123")));
        assert_eq!(get_nested(&record, "vehicle.make"), Some(&Value::Null));
        assert_eq!(get_present(&record, "vehicle.make"), None);
        assert_eq!(get_nested(&record, "vehicle.vin"), None);
        assert_eq!(get_nested(&record, "driver.name"), None);
    }

    #[test]
    fn empty_path_returns_record() {
        let record = json!({"id": 1});
        assert_eq!(get_nested(&record, ""), Some(&record));
    }

    #[test]
    fn plain_string_drops_quotes() {
        assert_eq!(value_to_plain_string(&json!("x")), "x");
        assert_eq!(value_to_plain_string(&json!(12)), "12");
        assert_eq!(value_to_plain_string(&Value::Null), "");
    }

    #[test]
    fn paginated_response_tolerates_missing_parts() {
        let page = PaginatedResponse::from_value(&json!({"items": [{"id": 1}], "total": 11}));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 11);

        let legacy = PaginatedResponse::from_value(&json!({"items": [], "total_count": 4}));
        assert_eq!(legacy.total, 4);

        let garbage = PaginatedResponse::from_value(&json!([1, 2, 3]));
        assert_eq!(garbage, PaginatedResponse::default());
    }
}
