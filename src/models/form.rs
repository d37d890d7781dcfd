// ============================================================================
// FORM - Prefill, opciones de select y construcción del payload
// ============================================================================
// Todo lo que hace el modal de alta/edición sin tocar el DOM: qué valor lleva
// cada input al abrirse, qué opción queda seleccionada y cómo se convierten
// los strings de los inputs en el JSON que se envía.
// ============================================================================

use chrono::NaiveDateTime;
use serde_json::{Map, Number, Value};

use crate::error::ValidationError;
use crate::models::module_config::{FieldType, FormFieldSpec, SelectOption};
use crate::models::record::{get_nested, get_present, value_to_plain_string};
use crate::utils::dates::{iso_date, iso_datetime_local, parse_date, parse_datetime};

/// Alta o edición de un registro
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { id: String },
}

impl FormMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, FormMode::Edit { .. })
    }

    /// "Add New Vehicle" / "Edit Vehicle"
    pub fn title(&self, singular: &str) -> String {
        match self {
            FormMode::Add => format!("Add New {}", singular),
            FormMode::Edit { .. } => format!("Edit {}", singular),
        }
    }

    pub fn subtitle(&self, singular: &str) -> String {
        match self {
            FormMode::Add => format!("Fill in the details for the new {}.", singular.to_lowercase()),
            FormMode::Edit { id } => format!("Update the details of {} #{}.", singular.to_lowercase(), id),
        }
    }
}

/// Estado inicial de un campo del formulario
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPrefill {
    pub field_id: String,
    /// Texto que aparece en el input (o valor de la opción seleccionada)
    pub display: String,
    /// Valor JSON original del registro (solo en edición)
    pub initial: Option<Value>,
}

/// Prefill de todos los campos para el modo indicado
pub fn prefill_fields(
    fields: &[FormFieldSpec],
    record: Option<&Value>,
    mode: &FormMode,
    now: NaiveDateTime,
) -> Vec<FieldPrefill> {
    fields
        .iter()
        .map(|field| {
            let initial = match (mode, record) {
                (FormMode::Edit { .. }, Some(record)) => initial_value(field, record),
                _ => None,
            };
            let display = match &initial {
                Some(value) => display_for(field, value),
                None if mode.is_edit() => String::new(),
                None => default_display(field, now),
            };
            FieldPrefill { field_id: field.id.clone(), display, initial }
        })
        .collect()
}

/// Valor del registro que corresponde al campo. Para los select se intenta
/// `<id>_id`, luego el objeto embebido (`value_field`), luego el valor directo.
fn initial_value(field: &FormFieldSpec, record: &Value) -> Option<Value> {
    if field.field_type != FieldType::Select {
        return get_nested(record, &field.id).cloned();
    }
    if let Some(value) = get_present(record, &field.id_field_key()) {
        return Some(value.clone());
    }
    let direct = get_nested(record, &field.id)?;
    match (direct, field.value_field.as_deref()) {
        (Value::Object(_), Some(value_field)) => get_nested(direct, value_field).cloned(),
        _ => Some(direct.clone()),
    }
}

fn display_for(field: &FormFieldSpec, value: &Value) -> String {
    if value.is_null() {
        return String::new();
    }
    let raw = value_to_plain_string(value);
    match field.field_type {
        FieldType::DateTimeLocal => parse_datetime(&raw).map(iso_datetime_local).unwrap_or(raw),
        FieldType::Date => parse_date(&raw).map(iso_date).unwrap_or(raw),
        _ => raw,
    }
}

fn default_display(field: &FormFieldSpec, now: NaiveDateTime) -> String {
    let configured = field
        .default_value
        .as_ref()
        .map(|v| display_for(field, v))
        .unwrap_or_default();
    if !configured.is_empty() || !field.default_to_now {
        return configured;
    }
    match field.field_type {
        FieldType::Date => iso_date(now.date()),
        _ => iso_datetime_local(now),
    }
}

/// La opción coincide con el valor precargado
pub fn is_preselected(prefill: &FieldPrefill, option: &SelectOption) -> bool {
    !prefill.display.is_empty() && option.value_string() == prefill.display
}

/// Opciones de un select a partir de la respuesta del endpoint de lookup
/// (un array o un sobre `{items: [...]}`)
pub fn lookup_options(field: &FormFieldSpec, response: &Value) -> Vec<SelectOption> {
    let items = match response {
        Value::Array(items) => items.as_slice(),
        other => other
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
    };
    let value_field = field.value_field.as_deref().unwrap_or("id");
    items
        .iter()
        .filter_map(|item| {
            let value = get_present(item, value_field)?.clone();
            let text = field
                .display_fields
                .iter()
                .filter_map(|key| get_present(item, key).map(value_to_plain_string))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" - ");
            let text = if text.is_empty() { value_to_plain_string(&value) } else { text };
            Some(SelectOption { value, text })
        })
        .collect()
}

/// Valor crudo de un input en el momento del submit
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedField<'a> {
    pub field: &'a FormFieldSpec,
    pub raw: String,
    /// Opciones que tenía el select al enviarse
    pub options: &'a [SelectOption],
}

/// Construye el payload JSON. Los campos que no se han tocado devuelven el
/// valor original del registro tal cual.
pub fn build_payload(
    submitted: &[SubmittedField<'_>],
    prefills: &[FieldPrefill],
    mode: &FormMode,
) -> Result<Map<String, Value>, ValidationError> {
    let mut payload = Map::new();
    for entry in submitted {
        let field = entry.field;
        let raw = entry.raw.trim();
        let prefill = prefills.iter().find(|p| p.field_id == field.id);

        if raw.is_empty() && field.required {
            return Err(ValidationError::MissingRequired(field.label.clone()));
        }
        // Contraseña vacía en edición: no se cambia
        if raw.is_empty() && field.field_type == FieldType::Password && mode.is_edit() {
            continue;
        }

        let unchanged = prefill
            .filter(|p| p.display == raw)
            .and_then(|p| p.initial.clone());

        let value = match field.field_type {
            FieldType::Select => {
                if raw.is_empty() {
                    Value::Null
                } else if let Some(option) = entry.options.iter().find(|o| o.value_string() == raw) {
                    option.value.clone()
                } else {
                    unchanged.unwrap_or_else(|| Value::String(raw.to_string()))
                }
            }
            _ if unchanged.is_some() => unchanged.unwrap_or(Value::Null),
            _ if raw.is_empty() => Value::Null,
            FieldType::Number => parse_number(raw)
                .ok_or_else(|| ValidationError::InvalidNumber(field.label.clone()))?,
            _ => Value::String(raw.to_string()),
        };
        payload.insert(field.id.clone(), value);
    }
    Ok(payload)
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::module_config::FormFieldSpec;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap().and_hms_opt(9, 15, 0).unwrap()
    }

    fn panne_fields() -> Vec<FormFieldSpec> {
        vec![
            FormFieldSpec::lookup("vehicle_id", "Vehicle", "/vehicle/", "id", &["plate_number"]).required(),
            FormFieldSpec::text("description", "Description").textarea(3),
            FormFieldSpec::select(
                "status",
                "Status",
                vec![SelectOption::new("active", "Active"), SelectOption::new("resolved", "Resolved")],
            )
            .default_value("active"),
            FormFieldSpec::number("cost", "Cost"),
            FormFieldSpec::datetime("panne_date", "Date").required().default_to_now(),
        ]
    }

    fn submit<'a>(
        fields: &'a [FormFieldSpec],
        raws: &[String],
        options: &'a [Vec<SelectOption>],
    ) -> Vec<SubmittedField<'a>> {
        fields
            .iter()
            .zip(raws)
            .zip(options)
            .map(|((field, raw), options)| SubmittedField { field, raw: raw.clone(), options })
            .collect()
    }

    fn options_for(fields: &[FormFieldSpec]) -> Vec<Vec<SelectOption>> {
        let vehicles = json!([{"id": 3, "plate_number": "AB-123"}, {"id": 4, "plate_number": "CD-456"}]);
        fields
            .iter()
            .map(|f| match (&f.options, &f.api_lookup) {
                (Some(static_options), _) => static_options.clone(),
                (None, Some(_)) => lookup_options(f, &vehicles),
                _ => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn add_mode_uses_defaults_and_now() {
        let fields = panne_fields();
        let prefills = prefill_fields(&fields, None, &FormMode::Add, now());
        assert_eq!(prefills[2].display, "active");
        assert_eq!(prefills[4].display, "2024-05-20T09:15");
        assert!(prefills.iter().all(|p| p.initial.is_none()));
    }

    #[test]
    fn edit_mode_never_defaults_to_now() {
        let fields = panne_fields();
        let record = json!({"id": 1, "vehicle_id": 3, "panne_date": null});
        let mode = FormMode::Edit { id: "1".into() };
        let prefills = prefill_fields(&fields, Some(&record), &mode, now());
        assert_eq!(prefills[4].display, "");
        assert_eq!(prefills[0].display, "3");
    }

    #[test]
    fn select_preselection_order() {
        let field = FormFieldSpec::lookup("vehicle", "Vehicle", "/vehicle/", "id", &["plate_number"]);
        let edit = FormMode::Edit { id: "9".into() };

        let with_id = json!({"vehicle_id": 7, "vehicle": {"id": 8}});
        assert_eq!(prefill_fields(&[field.clone()], Some(&with_id), &edit, now())[0].display, "7");

        let embedded = json!({"vehicle": {"id": 8, "plate_number": "X"}});
        assert_eq!(prefill_fields(&[field.clone()], Some(&embedded), &edit, now())[0].display, "8");

        let direct = json!({"vehicle": 5});
        let prefill = &prefill_fields(&[field], Some(&direct), &edit, now())[0];
        assert_eq!(prefill.display, "5");
        assert!(is_preselected(prefill, &SelectOption::new(5, "five")));
        assert!(!is_preselected(prefill, &SelectOption::new(6, "six")));
    }

    #[test]
    fn lookup_accepts_array_or_envelope() {
        let field = FormFieldSpec::lookup("vehicle_id", "Vehicle", "/vehicle/", "id", &["plate_number", "vin"]);
        let array = json!([{"id": 1, "plate_number": "AB", "vin": "V1"}, {"plate_number": "no id"}]);
        let options = lookup_options(&field, &array);
        assert_eq!(options, vec![SelectOption::new(1, "AB - V1")]);

        let envelope = json!({"items": [{"id": 2, "plate_number": "CD", "vin": null}], "total": 1});
        assert_eq!(lookup_options(&field, &envelope), vec![SelectOption::new(2, "CD")]);
        assert!(lookup_options(&field, &json!({"detail": "nope"})).is_empty());
    }

    #[test]
    fn required_fields_block_submission() {
        let fields = panne_fields();
        let options = options_for(&fields);
        let raws = vec!["".into(), "".into(), "active".into(), "".into(), "2024-05-20T09:15".into()];
        let prefills = prefill_fields(&fields, None, &FormMode::Add, now());
        let err = build_payload(&submit(&fields, &raws, &options), &prefills, &FormMode::Add).unwrap_err();
        assert_eq!(err, ValidationError::MissingRequired("Vehicle".into()));
    }

    #[test]
    fn add_payload_coerces_types() {
        let fields = panne_fields();
        let options = options_for(&fields);
        let raws = vec!["4".into(), "Flat tyre".into(), "resolved".into(), "12.5".into(), "2024-05-20T09:15".into()];
        let prefills = prefill_fields(&fields, None, &FormMode::Add, now());
        let payload = build_payload(&submit(&fields, &raws, &options), &prefills, &FormMode::Add).unwrap();
        assert_eq!(
            Value::Object(payload),
            json!({
                "vehicle_id": 4,
                "description": "Flat tyre",
                "status": "resolved",
                "cost": 12.5,
                "panne_date": "2024-05-20T09:15"
            })
        );
    }

    #[test]
    fn invalid_number_is_reported() {
        let fields = vec![FormFieldSpec::number("cost", "Cost")];
        let raws = vec!["twelve".to_string()];
        let options = vec![Vec::new()];
        let err = build_payload(&submit(&fields, &raws, &options), &[], &FormMode::Add).unwrap_err();
        assert_eq!(err, ValidationError::InvalidNumber("Cost".into()));
    }

    #[test]
    fn unchanged_edit_round_trips_the_record() {
        let fields = panne_fields();
        let options = options_for(&fields);
        let record = json!({
            "id": 11,
            "vehicle_id": 3,
            "description": null,
            "status": "active",
            "cost": 80.0,
            "panne_date": "2024-05-01T08:30:00+00:00",
            "created_at": "2024-05-01T08:31:00+00:00"
        });
        let mode = FormMode::Edit { id: "11".into() };
        let prefills = prefill_fields(&fields, Some(&record), &mode, now());
        let raws: Vec<String> = prefills.iter().map(|p| p.display.clone()).collect();
        let payload = build_payload(&submit(&fields, &raws, &options), &prefills, &mode).unwrap();

        for field in &fields {
            assert_eq!(payload.get(&field.id), record.get(&field.id), "field {}", field.id);
        }
        assert!(!payload.contains_key("created_at"));
    }

    #[test]
    fn blank_password_is_skipped_on_edit() {
        let fields = vec![FormFieldSpec::new("password", "Password", FieldType::Password)];
        let raws = vec![String::new()];
        let options = vec![Vec::new()];
        let mode = FormMode::Edit { id: "1".into() };
        let payload = build_payload(&submit(&fields, &raws, &options), &[], &mode).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn titles_follow_mode() {
        assert_eq!(FormMode::Add.title("Vehicle"), "Add New Vehicle");
        assert_eq!(FormMode::Edit { id: "2".into() }.title("Vehicle"), "Edit Vehicle");
    }
}
