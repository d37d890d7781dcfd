// ============================================================================
// TABLE STATE - Máquina de estados de la tabla genérica (sin DOM)
// ============================================================================
// Cada evento de la UI se traduce en una transición que devuelve los efectos
// a ejecutar (pedir datos, repintar cabeceras, mostrar inputs de rango).
// El controlador de la tabla solo ejecuta esos efectos.
// ============================================================================

use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::module_config::ModuleConfig;
use crate::models::record::{PaginatedResponse, Record};
use crate::utils::dates::{iso_date, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// Valor del parámetro `ordering` (`-` delante para descendente)
    pub fn ordering(&self) -> Option<String> {
        self.key.as_ref().map(|key| match self.direction {
            SortDirection::Asc => key.clone(),
            SortDirection::Desc => format!("-{}", key),
        })
    }
}

/// Opciones del desplegable de fechas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilterMode {
    #[default]
    All,
    Today,
    Last7,
    Last30,
    Custom,
}

impl DateFilterMode {
    /// Valor del `<option>` en la plantilla
    pub fn parse(raw: &str) -> Self {
        match raw {
            "today" => DateFilterMode::Today,
            "last7" => DateFilterMode::Last7,
            "last30" => DateFilterMode::Last30,
            "custom" => DateFilterMode::Custom,
            _ => DateFilterMode::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateFilter {
    pub mode: DateFilterMode,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateFilter {
    /// Rango `[start, end]` inclusivo que se envía al backend
    pub fn range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self.mode {
            DateFilterMode::All => None,
            DateFilterMode::Today => Some((today, today)),
            DateFilterMode::Last7 => Some((today - Duration::days(6), today)),
            DateFilterMode::Last30 => Some((today - Duration::days(29), today)),
            DateFilterMode::Custom => match (self.start, self.end) {
                (Some(start), Some(end)) => Some((start, end)),
                _ => None,
            },
        }
    }
}

/// Fase visible de la tabla
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TablePhase {
    Idle,
    Loading,
    Rendered,
    Error,
}

/// Identificador monotónico de una petición de datos
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Lo que el controlador debe hacer tras una transición
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEffect {
    Fetch,
    RenderHeaders,
    ShowCustomInputs(bool),
}

/// Estado de la tabla del módulo activo
#[derive(Debug, Clone)]
pub struct TableState {
    pub module: String,
    pub current_page: u32,
    pub page_size: u32,
    pub data: Vec<Record>,
    pub total: u64,
    pub sort: SortState,
    pub date_filter: DateFilter,
    pub status_filter: String,
    pub search_term: String,
    pub phase: TablePhase,
    fetch_seq: u64,
}

impl TableState {
    /// Estado limpio para un módulo recién activado
    pub fn for_module(config: &ModuleConfig, page_size: u32) -> Self {
        Self {
            module: config.name.clone(),
            current_page: 1,
            page_size: page_size.max(1),
            data: Vec::new(),
            total: 0,
            sort: SortState { key: config.default_sort_key(), direction: SortDirection::Asc },
            date_filter: DateFilter::default(),
            status_filter: String::new(),
            search_term: String::new(),
            phase: TablePhase::Idle,
            fetch_seq: 0,
        }
    }

    /// Texto de búsqueda (ya filtrado por el debounce)
    pub fn set_search(&mut self, term: &str) -> Vec<TableEffect> {
        self.search_term = term.trim().to_string();
        self.current_page = 1;
        vec![TableEffect::Fetch]
    }

    /// Click en cabecera: misma clave invierte la dirección
    pub fn toggle_sort(&mut self, key: &str) -> Vec<TableEffect> {
        if self.sort.key.as_deref() == Some(key) {
            self.sort.direction = self.sort.direction.toggled();
        } else {
            self.sort = SortState { key: Some(key.to_string()), direction: SortDirection::Asc };
        }
        vec![TableEffect::RenderHeaders, TableEffect::Fetch]
    }

    pub fn go_to_page(&mut self, page: u32) -> Vec<TableEffect> {
        let last = self.total_pages().max(1);
        if page == 0 || page > last || page == self.current_page {
            return Vec::new();
        }
        self.current_page = page;
        vec![TableEffect::Fetch]
    }

    /// Cambio del desplegable de fechas. "custom" solo muestra los inputs.
    pub fn select_date_filter(&mut self, mode: DateFilterMode) -> Vec<TableEffect> {
        self.date_filter.mode = mode;
        if mode == DateFilterMode::Custom {
            return vec![TableEffect::ShowCustomInputs(true)];
        }
        self.date_filter.start = None;
        self.date_filter.end = None;
        self.current_page = 1;
        vec![TableEffect::ShowCustomInputs(false), TableEffect::Fetch]
    }

    /// Botón "Apply" del rango personalizado
    pub fn apply_custom_range(&mut self, start: &str, end: &str) -> Result<Vec<TableEffect>, ValidationError> {
        let (Some(start), Some(end)) = (parse_date(start), parse_date(end)) else {
            return Err(ValidationError::DateRangeIncomplete);
        };
        if start > end {
            return Err(ValidationError::DateRangeInverted);
        }
        self.date_filter = DateFilter { mode: DateFilterMode::Custom, start: Some(start), end: Some(end) };
        self.current_page = 1;
        Ok(vec![TableEffect::Fetch])
    }

    pub fn set_status_filter(&mut self, value: &str) -> Vec<TableEffect> {
        self.status_filter = value.to_string();
        self.current_page = 1;
        vec![TableEffect::Fetch]
    }

    /// Tras borrar: si era la única fila de una página > 1, retroceder
    pub fn after_delete_success(&mut self) -> Vec<TableEffect> {
        if self.data.len() == 1 && self.current_page > 1 {
            self.current_page -= 1;
        }
        vec![TableEffect::Fetch]
    }

    /// Reserva un ticket nuevo; cualquier respuesta anterior queda obsoleta
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_seq += 1;
        self.phase = TablePhase::Loading;
        FetchTicket(self.fetch_seq)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.fetch_seq
    }

    /// Aplica la respuesta si el ticket sigue vigente. Devuelve false si se descarta.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, response: Option<&Value>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match response {
            Some(value) => {
                let page = PaginatedResponse::from_value(value);
                self.data = page.items;
                self.total = page.total;
                self.phase = TablePhase::Rendered;
            }
            None => {
                self.data.clear();
                self.total = 0;
                self.phase = TablePhase::Error;
            }
        }
        true
    }

    pub fn total_pages(&self) -> u32 {
        super::pagination::total_pages(self.total, self.page_size)
    }

    /// Parámetros de la petición GET de la página actual
    pub fn query_pairs(&self, config: &ModuleConfig, today: NaiveDate) -> Vec<(String, String)> {
        let skip = u64::from(self.current_page.saturating_sub(1)) * u64::from(self.page_size);
        let mut pairs = vec![
            ("skip".to_string(), skip.to_string()),
            ("limit".to_string(), self.page_size.to_string()),
        ];
        if !self.search_term.is_empty() {
            pairs.push(("search".to_string(), self.search_term.clone()));
        }
        if let Some(ordering) = self.sort.ordering() {
            pairs.push(("ordering".to_string(), ordering));
        }
        if config.has_date_filters {
            if let Some((start, end)) = self.date_filter.range(today) {
                pairs.push(("start_date".to_string(), iso_date(start)));
                pairs.push(("end_date".to_string(), iso_date(end)));
            }
        }
        if let Some(key) = &config.status_filter_key {
            if !self.status_filter.is_empty() {
                pairs.push((key.clone(), self.status_filter.clone()));
            }
        }
        pairs
    }

    /// Fila cargada cuyo ID coincide con el `data-id` del botón
    pub fn find_row(&self, config: &ModuleConfig, id: &str) -> Option<&Record> {
        self.data.iter().find(|row| config.record_id(row).as_deref() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::module_config::{ColumnSpec, SelectOption};
    use serde_json::json;

    fn config() -> ModuleConfig {
        ModuleConfig::table("pannes", "Breakdown Records", "/panne/", "pages/table-template.html")
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("panne_date", "Date").sortable(),
            ])
            .date_filters()
            .status_filter("status", vec![SelectOption::new("active", "Active")])
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn module_activation_starts_clean() {
        let state = TableState::for_module(&config(), 10);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.sort, SortState { key: Some("id".into()), direction: SortDirection::Asc });
        assert_eq!(state.date_filter, DateFilter::default());
        assert!(state.search_term.is_empty());
        assert!(state.status_filter.is_empty());
    }

    #[test]
    fn switching_modules_resets_page_sort_and_filters() {
        let mut state = TableState::for_module(&config(), 10);
        state.total = 50;
        state.go_to_page(3);
        state.toggle_sort("panne_date");
        state.set_status_filter("active");
        state.select_date_filter(DateFilterMode::Last7);
        state.set_search("abc");

        let other = ModuleConfig::table("garages", "Garages", "/garage/", "pages/table-template.html")
            .columns(vec![ColumnSpec::new("nom_garage", "Name")]);
        let fresh = TableState::for_module(&other, 10);
        assert_eq!(fresh.current_page, 1);
        assert_eq!(fresh.sort.key.as_deref(), Some("nom_garage"));
        assert_eq!(fresh.query_pairs(&other, today()), vec![
            ("skip".to_string(), "0".to_string()),
            ("limit".to_string(), "10".to_string()),
            ("ordering".to_string(), "nom_garage".to_string()),
        ]);
    }

    #[test]
    fn sort_toggles_on_same_key() {
        let mut state = TableState::for_module(&config(), 10);
        let effects = state.toggle_sort("id");
        assert_eq!(effects, vec![TableEffect::RenderHeaders, TableEffect::Fetch]);
        assert_eq!(state.sort.ordering().as_deref(), Some("-id"));
        state.toggle_sort("panne_date");
        assert_eq!(state.sort.ordering().as_deref(), Some("panne_date"));
    }

    #[test]
    fn paging_keeps_filters() {
        let mut state = TableState::for_module(&config(), 10);
        state.set_status_filter("active");
        state.total = 35;
        assert_eq!(state.go_to_page(4), vec![TableEffect::Fetch]);
        assert!(state.go_to_page(5).is_empty());
        let pairs = state.query_pairs(&config(), today());
        assert_eq!(lookup(&pairs, "skip"), Some("30"));
        assert_eq!(lookup(&pairs, "status"), Some("active"));
    }

    #[test]
    fn filters_reset_to_first_page() {
        let mut state = TableState::for_module(&config(), 10);
        state.total = 100;
        state.go_to_page(5);
        state.set_search("  hilux ");
        assert_eq!(state.current_page, 1);
        assert_eq!(lookup(&state.query_pairs(&config(), today()), "search"), Some("hilux"));
    }

    #[test]
    fn relative_date_ranges() {
        let mut state = TableState::for_module(&config(), 10);
        state.select_date_filter(DateFilterMode::Last7);
        let pairs = state.query_pairs(&config(), today());
        assert_eq!(lookup(&pairs, "start_date"), Some("2024-03-04"));
        assert_eq!(lookup(&pairs, "end_date"), Some("2024-03-10"));

        state.select_date_filter(DateFilterMode::Last30);
        let pairs = state.query_pairs(&config(), today());
        assert_eq!(lookup(&pairs, "start_date"), Some("2024-02-10"));

        state.select_date_filter(DateFilterMode::Today);
        let pairs = state.query_pairs(&config(), today());
        assert_eq!(lookup(&pairs, "start_date"), lookup(&pairs, "end_date"));
    }

    #[test]
    fn custom_range_only_fetches_on_valid_apply() {
        let mut state = TableState::for_module(&config(), 10);
        assert_eq!(state.select_date_filter(DateFilterMode::Custom), vec![TableEffect::ShowCustomInputs(true)]);
        assert_eq!(state.apply_custom_range("2024-03-01", ""), Err(ValidationError::DateRangeIncomplete));
        assert_eq!(
            state.apply_custom_range("2024-03-09", "2024-03-01"),
            Err(ValidationError::DateRangeInverted)
        );
        assert!(lookup(&state.query_pairs(&config(), today()), "start_date").is_none());

        assert_eq!(state.apply_custom_range("2024-03-01", "2024-03-09"), Ok(vec![TableEffect::Fetch]));
        let pairs = state.query_pairs(&config(), today());
        assert_eq!(lookup(&pairs, "start_date"), Some("2024-03-01"));
        assert_eq!(lookup(&pairs, "end_date"), Some("2024-03-09"));
    }

    #[test]
    fn deleting_last_row_steps_back_a_page() {
        let mut state = TableState::for_module(&config(), 10);
        state.total = 11;
        state.go_to_page(2);
        let ticket = state.begin_fetch();
        state.complete_fetch(ticket, Some(&json!({"items": [{"id": 11}], "total": 11})));
        assert_eq!(state.after_delete_success(), vec![TableEffect::Fetch]);
        assert_eq!(state.current_page, 1);

        // En la página 1 no se retrocede
        state.data = vec![json!({"id": 1})];
        state.after_delete_success();
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut state = TableState::for_module(&config(), 10);
        let first = state.begin_fetch();
        let second = state.begin_fetch();
        assert!(!state.complete_fetch(first, Some(&json!({"items": [{"id": 1}], "total": 1}))));
        assert!(state.data.is_empty());
        assert!(state.complete_fetch(second, Some(&json!({"items": [{"id": 2}], "total": 1}))));
        assert_eq!(state.phase, TablePhase::Rendered);
        assert!(state.find_row(&config(), "2").is_some());
        assert!(state.find_row(&config(), "1").is_none());
    }

    #[test]
    fn failed_fetch_shows_error_state() {
        let mut state = TableState::for_module(&config(), 10);
        let ticket = state.begin_fetch();
        assert!(state.complete_fetch(ticket, None));
        assert_eq!(state.phase, TablePhase::Error);
        assert_eq!(state.total, 0);
    }
}
