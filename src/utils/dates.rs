// ============================================================================
// FECHAS - Formatos ISO usados por filtros y formularios
// ============================================================================

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// `YYYY-MM-DD`
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DDTHH:MM` (valor de un input datetime-local, precisión de minuto)
pub fn iso_datetime_local(datetime: NaiveDateTime) -> String {
    datetime.format("%Y-%m-%dT%H:%M").to_string()
}

/// Fecha local de hoy
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fecha-hora local actual
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Interpreta los formatos de fecha-hora que devuelve la API.
/// Los valores con zona horaria se convierten a hora local.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(with_tz) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_tz.with_timezone(&Local).naive_local());
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// `YYYY-MM-DD`, tolerando una parte horaria detrás
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dates_with_zero_padding() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(iso_date(date), "2024-03-01");
        let dt = date.and_hms_opt(7, 5, 59).unwrap();
        assert_eq!(iso_datetime_local(dt), "2024-03-01T07:05");
    }

    #[test]
    fn parses_backend_datetimes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(parse_datetime("2024-03-10T14:30:00"), Some(expected));
        assert_eq!(parse_datetime("2024-03-10T14:30"), Some(expected));
        assert_eq!(
            parse_datetime("2024-03-10T14:30:00.123456").map(|d| iso_datetime_local(d)),
            Some("2024-03-10T14:30".to_string())
        );
        assert_eq!(parse_datetime("garbage"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn parse_date_ignores_time_suffix() {
        assert_eq!(parse_date("2024-03-01T10:00:00"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("01/03/2024"), None);
    }
}
