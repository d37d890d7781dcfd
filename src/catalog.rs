// ============================================================================
// CATALOG - Módulos de la flota (tablas genéricas + overview)
// ============================================================================

use serde_json::Value;

use crate::error::ConfigError;
use crate::models::module_config::{
    ColumnSpec, FieldType, FormFieldSpec, ModuleConfig, SelectOption, ViewFieldSpec,
};
use crate::utils::format::RenderFn;

pub const OVERVIEW_MODULE: &str = "dashboard_overview";
const TABLE_PAGE: &str = "pages/table-template.html";

/// Conjunto de módulos navegables, validados al construirse
#[derive(Debug, Clone)]
pub struct Catalog {
    modules: Vec<ModuleConfig>,
}

impl Catalog {
    /// Catálogo validado; falla con el primer módulo incoherente
    pub fn new(modules: Vec<ModuleConfig>, table_template_marker: &str) -> Result<Self, ConfigError> {
        let mut names = std::collections::HashSet::new();
        for module in &modules {
            module.validate(table_template_marker)?;
            if !names.insert(module.name.clone()) {
                return Err(ConfigError::DuplicateModule(module.name.clone()));
            }
        }
        Ok(Self { modules })
    }

    /// Catálogo incorporado de la flota
    pub fn fleet(table_template_marker: &str) -> Result<Self, ConfigError> {
        Self::new(fleet_modules(), table_template_marker)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn modules(&self) -> &[ModuleConfig] {
        &self.modules
    }

    /// Reemplaza (o añade) la definición de un módulo con la de la navegación
    pub fn override_with(&mut self, module: ModuleConfig) {
        match self.modules.iter_mut().find(|m| m.name == module.name) {
            Some(existing) => *existing = module,
            None => self.modules.push(module),
        }
    }
}

fn options(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
    pairs.iter().map(|(value, text)| SelectOption::new(*value, text)).collect()
}

fn with_all(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
    let mut all = vec![SelectOption::new(Value::String(String::new()), "All Statuses")];
    all.extend(options(pairs));
    all
}

/// Tabla de referencia de un solo campo (`vehicle_make`, `fuel_type`...)
fn reference_table(name: &str, title: &str, endpoint: &str, field: &str, label: &str) -> ModuleConfig {
    ModuleConfig::table(name, title, endpoint, TABLE_PAGE)
        .columns(vec![
            ColumnSpec::new("id", "ID").id(),
            ColumnSpec::new(field, label).sortable(),
        ])
        .form_fields(vec![FormFieldSpec::text(field, label).required()])
        .view_fields(vec![ViewFieldSpec::new("id", "ID"), ViewFieldSpec::new(field, label)])
}

fn vehicle_lookup() -> FormFieldSpec {
    FormFieldSpec::lookup("vehicle_id", "Vehicle", "/vehicle/", "id", &["plate_number", "vin"]).required()
}

fn garage_lookup() -> FormFieldSpec {
    FormFieldSpec::lookup("garage_id", "Garage", "/garage/", "id", &["nom_garage"])
}

pub fn fleet_modules() -> Vec<ModuleConfig> {
    let vehicle_status = [
        ("available", "Available"),
        ("in_mission", "In Mission"),
        ("maintenance", "Maintenance"),
        ("hors_service", "Out of Service"),
    ];
    let panne_status = [("active", "Active"), ("in_progress", "In Progress"), ("resolved", "Resolved")];
    let repair_status = [("Inprogress", "In Progress"), ("Completed", "Completed")];

    vec![
        ModuleConfig::page(OVERVIEW_MODULE, "Dashboard Overview", "pages/dashboard-overview.html"),
        ModuleConfig::table("vehicles", "Vehicle Records", "/vehicle/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("plate_number", "Plate").sortable(),
                ColumnSpec::new("vin", "VIN"),
                ColumnSpec::new("year", "Year").sortable(),
                ColumnSpec::new("color", "Color"),
                ColumnSpec::new("mileage", "Mileage").sortable(),
                ColumnSpec::new("status", "Status").sortable().render(RenderFn::StatusBadge),
            ])
            .form_fields(vec![
                FormFieldSpec::text("plate_number", "Plate Number").required(),
                FormFieldSpec::text("vin", "VIN").required(),
                FormFieldSpec::lookup("make", "Make", "/vehicle_make/", "id", &["vehicle_make"]).required(),
                FormFieldSpec::lookup("model", "Model", "/vehicle_model/", "id", &["vehicle_model"]).required(),
                FormFieldSpec::number("year", "Year").required(),
                FormFieldSpec::text("color", "Color").required(),
                FormFieldSpec::number("mileage", "Mileage").default_value(0),
                FormFieldSpec::number("engine_size", "Engine Size").required(),
                FormFieldSpec::lookup("vehicle_type", "Type", "/vehicle_type/", "id", &["vehicle_type"]).required(),
                FormFieldSpec::lookup(
                    "vehicle_transmission",
                    "Transmission",
                    "/vehicle_transmission/",
                    "id",
                    &["vehicle_transmission"],
                )
                .required(),
                FormFieldSpec::lookup("vehicle_fuel_type", "Fuel Type", "/fuel_type/", "id", &["fuel_type"]).required(),
                FormFieldSpec::number("purchase_price", "Purchase Price").required(),
                FormFieldSpec::datetime("purchase_date", "Purchase Date").required().default_to_now(),
                FormFieldSpec::select("status", "Status", options(&vehicle_status)).default_value("available"),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("plate_number", "Plate Number"),
                ViewFieldSpec::new("vin", "VIN"),
                ViewFieldSpec::new("year", "Year"),
                ViewFieldSpec::new("color", "Color"),
                ViewFieldSpec::new("mileage", "Mileage"),
                ViewFieldSpec::new("engine_size", "Engine Size"),
                ViewFieldSpec::new("purchase_price", "Purchase Price").render(RenderFn::FormatCurrency),
                ViewFieldSpec::new("purchase_date", "Purchase Date").render(RenderFn::FormatDate),
                ViewFieldSpec::new("registration_date", "Registered").render(RenderFn::FormatDateTime),
                ViewFieldSpec::new("status", "Status").render(RenderFn::StatusBadge),
            ])
            .status_filter("status", with_all(&vehicle_status)),
        ModuleConfig::table("drivers", "Driver Records", "/driver/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("last_name", "Name").sort_by("last_name").render(RenderFn::DriverFullNameView),
                ColumnSpec::new("matricule", "Matricule").sortable(),
                ColumnSpec::new("email", "Email"),
                ColumnSpec::new("created_at", "Created").sortable().render(RenderFn::FormatDateTime),
            ])
            .form_fields(vec![
                FormFieldSpec::text("first_name", "First Name").required(),
                FormFieldSpec::text("last_name", "Last Name").required(),
                FormFieldSpec::text("cni_number", "CNI Number").required(),
                FormFieldSpec::new("email", "Email", FieldType::Email).required(),
                FormFieldSpec::text("matricule", "Matricule").required(),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("first_name", "Name").render(RenderFn::DriverFullNameView),
                ViewFieldSpec::new("cni_number", "CNI Number"),
                ViewFieldSpec::new("email", "Email"),
                ViewFieldSpec::new("matricule", "Matricule"),
                ViewFieldSpec::new("created_at", "Created").render(RenderFn::FormatDateTime),
            ]),
        ModuleConfig::table("pannes", "Breakdown Records", "/panne/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("vehicle", "Vehicle").render(RenderFn::VehicleFullName),
                ColumnSpec::new("category_panne.panne_name", "Category").fallback("Uncategorised"),
                ColumnSpec::new("panne_date", "Date").sortable().render(RenderFn::FormatDateTime),
                ColumnSpec::new("status", "Status").sortable().render(RenderFn::StatusBadge),
            ])
            .form_fields(vec![
                vehicle_lookup(),
                FormFieldSpec::lookup("category_panne_id", "Category", "/category_panne/", "id", &["panne_name"])
                    .required(),
                FormFieldSpec::text("description", "Description").textarea(3).placeholder("What happened?"),
                FormFieldSpec::select("status", "Status", options(&panne_status)).default_value("active"),
                FormFieldSpec::datetime("panne_date", "Breakdown Date").required().default_to_now(),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("vehicle", "Vehicle").render(RenderFn::VehicleFullName),
                ViewFieldSpec::new("category_panne.panne_name", "Category"),
                ViewFieldSpec::new("description", "Description"),
                ViewFieldSpec::new("status", "Status").render(RenderFn::StatusBadge),
                ViewFieldSpec::new("panne_date", "Breakdown Date").render(RenderFn::FormatDateTime),
                ViewFieldSpec::new("created_at", "Reported").render(RenderFn::FormatDateTime),
            ])
            .date_filters()
            .status_filter("status", with_all(&panne_status)),
        ModuleConfig::table("reparations", "Repair Records", "/reparation/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("panne_id", "Breakdown"),
                ColumnSpec::new("garage.nom_garage", "Garage").fallback("-"),
                ColumnSpec::new("cost", "Cost").sortable().render(RenderFn::FormatCurrency),
                ColumnSpec::new("repair_date", "Date").sortable().render(RenderFn::FormatDateTime),
                ColumnSpec::new("status", "Status").sortable().render(RenderFn::StatusBadge),
            ])
            .form_fields(vec![
                FormFieldSpec::lookup("panne_id", "Breakdown", "/panne/", "id", &["id", "description"]).required(),
                garage_lookup().required(),
                FormFieldSpec::number("cost", "Cost").required(),
                FormFieldSpec::text("receipt", "Receipt").required(),
                FormFieldSpec::datetime("repair_date", "Repair Date").required().default_to_now(),
                FormFieldSpec::select("status", "Status", options(&repair_status)).default_value("Inprogress"),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("panne_id", "Breakdown"),
                ViewFieldSpec::new("garage.nom_garage", "Garage"),
                ViewFieldSpec::new("cost", "Cost").render(RenderFn::FormatCurrency),
                ViewFieldSpec::new("receipt", "Receipt"),
                ViewFieldSpec::new("repair_date", "Repair Date").render(RenderFn::FormatDateTime),
                ViewFieldSpec::new("status", "Status").render(RenderFn::StatusBadge),
            ])
            .date_filters()
            .status_filter("status", with_all(&repair_status)),
        ModuleConfig::table("fuel", "Fuel Records", "/fuel/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("vehicle_id", "Vehicle"),
                ColumnSpec::new("quantity", "Quantity").sortable(),
                ColumnSpec::new("price_little", "Price/L").render(RenderFn::FormatCurrency),
                ColumnSpec::new("cost", "Cost").sortable().render(RenderFn::FormatCurrency),
                ColumnSpec::new("created_at", "Date").sortable().render(RenderFn::FormatDateTime),
            ])
            .form_fields(vec![
                vehicle_lookup(),
                FormFieldSpec::lookup("fuel_type_id", "Fuel Type", "/fuel_type/", "id", &["fuel_type"]).required(),
                FormFieldSpec::number("quantity", "Quantity").required(),
                FormFieldSpec::number("price_little", "Price per Litre").required(),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("vehicle_id", "Vehicle"),
                ViewFieldSpec::new("fuel_type_id", "Fuel Type"),
                ViewFieldSpec::new("quantity", "Quantity"),
                ViewFieldSpec::new("price_little", "Price per Litre").render(RenderFn::FormatCurrency),
                ViewFieldSpec::new("cost", "Cost").render(RenderFn::FormatCurrency),
                ViewFieldSpec::new("created_at", "Date").render(RenderFn::FormatDateTime),
            ])
            .date_filters(),
        ModuleConfig::table("maintenance", "Maintenance Records", "/maintenance/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("vehicle_id", "Vehicle"),
                ColumnSpec::new("maintenance_cost", "Cost").sortable().render(RenderFn::FormatCurrency),
                ColumnSpec::new("maintenance_date", "Date").sortable().render(RenderFn::FormatDateTime),
                ColumnSpec::new("status", "Status").sortable().render(RenderFn::StatusBadge),
            ])
            .form_fields(vec![
                vehicle_lookup(),
                FormFieldSpec::lookup(
                    "cat_maintenance_id",
                    "Category",
                    "/category_maintenance/",
                    "id",
                    &["cat_maintenance"],
                ),
                garage_lookup(),
                FormFieldSpec::number("maintenance_cost", "Cost").required(),
                FormFieldSpec::text("receipt", "Receipt").required(),
                FormFieldSpec::datetime("maintenance_date", "Maintenance Date").required().default_to_now(),
                FormFieldSpec::select("status", "Status", options(&[("active", "Active"), ("completed", "Completed")]))
                    .default_value("active"),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("vehicle_id", "Vehicle"),
                ViewFieldSpec::new("garage_id", "Garage"),
                ViewFieldSpec::new("maintenance_cost", "Cost").render(RenderFn::FormatCurrency),
                ViewFieldSpec::new("receipt", "Receipt"),
                ViewFieldSpec::new("maintenance_date", "Date").render(RenderFn::FormatDateTime),
                ViewFieldSpec::new("status", "Status").render(RenderFn::StatusBadge),
            ])
            .date_filters(),
        ModuleConfig::table("documents", "Vehicle Documents", "/document_vehicle/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("vehicle_id", "Vehicle"),
                ColumnSpec::new("doc_name_id", "Document"),
                ColumnSpec::new("issued_date", "Issued").sortable().render(RenderFn::FormatDate),
                ColumnSpec::new("expiration_date", "Expires").sortable().render(RenderFn::FormatDate),
            ])
            .form_fields(vec![
                FormFieldSpec::lookup("doc_name_id", "Document", "/category_document/", "id", &["doc_name"])
                    .required(),
                vehicle_lookup(),
                FormFieldSpec::datetime("issued_date", "Issued").required(),
                FormFieldSpec::datetime("expiration_date", "Expires").required(),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("vehicle_id", "Vehicle"),
                ViewFieldSpec::new("doc_name_id", "Document"),
                ViewFieldSpec::new("issued_date", "Issued").render(RenderFn::FormatDate),
                ViewFieldSpec::new("expiration_date", "Expires").render(RenderFn::FormatDate),
            ]),
        reference_table("garages", "Garages", "/garage/", "nom_garage", "Garage Name"),
        reference_table("vehicle_makes", "Vehicle Makes", "/vehicle_make/", "vehicle_make", "Make"),
        reference_table("vehicle_models", "Vehicle Models", "/vehicle_model/", "vehicle_model", "Model"),
        reference_table("vehicle_types", "Vehicle Types", "/vehicle_type/", "vehicle_type", "Type"),
        reference_table(
            "vehicle_transmissions",
            "Transmissions",
            "/vehicle_transmission/",
            "vehicle_transmission",
            "Transmission",
        ),
        reference_table("fuel_types", "Fuel Types", "/fuel_type/", "fuel_type", "Fuel Type"),
        reference_table("panne_categories", "Breakdown Categories", "/category_panne/", "panne_name", "Category"),
        reference_table(
            "maintenance_categories",
            "Maintenance Categories",
            "/category_maintenance/",
            "cat_maintenance",
            "Category",
        ),
        ModuleConfig::table("document_categories", "Document Categories", "/category_document/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("doc_name", "Document").sortable(),
                ColumnSpec::new("cost", "Cost").sortable().render(RenderFn::FormatCurrency),
            ])
            .form_fields(vec![
                FormFieldSpec::text("doc_name", "Document").required(),
                FormFieldSpec::number("cost", "Cost").required(),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("doc_name", "Document"),
                ViewFieldSpec::new("cost", "Cost").render(RenderFn::FormatCurrency),
            ]),
        ModuleConfig::table("users", "User Records", "/user/", TABLE_PAGE)
            .columns(vec![
                ColumnSpec::new("id", "ID").id(),
                ColumnSpec::new("username", "Username").sortable(),
                ColumnSpec::new("email", "Email").sortable(),
                ColumnSpec::new("status", "Status").render(RenderFn::StatusBadge),
                ColumnSpec::new("created_at", "Created").sortable().render(RenderFn::FormatDateTime),
            ])
            .form_fields(vec![
                FormFieldSpec::text("username", "Username").required(),
                FormFieldSpec::new("email", "Email", FieldType::Email).required(),
                FormFieldSpec::new("password", "Password", FieldType::Password)
                    .placeholder("Leave blank to keep the current password"),
                FormFieldSpec::select(
                    "status",
                    "Status",
                    options(&[("active", "Active"), ("inactive", "Inactive"), ("pending_approval", "Pending")]),
                )
                .default_value("pending_approval"),
            ])
            .view_fields(vec![
                ViewFieldSpec::new("id", "ID"),
                ViewFieldSpec::new("username", "Username"),
                ViewFieldSpec::new("email", "Email"),
                ViewFieldSpec::new("status", "Status").render(RenderFn::StatusBadge),
                ViewFieldSpec::new("created_at", "Created").render(RenderFn::FormatDateTime),
            ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "table-template.html";

    #[test]
    fn fleet_catalog_validates() {
        let catalog = Catalog::fleet(MARKER).unwrap();
        assert!(catalog.get(OVERVIEW_MODULE).is_some());
        assert!(!catalog.get(OVERVIEW_MODULE).unwrap().is_table_module(MARKER));
        assert!(catalog.get("vehicles").unwrap().is_table_module(MARKER));
    }

    #[test]
    fn repairs_filter_on_status_and_dates() {
        let catalog = Catalog::fleet(MARKER).unwrap();
        let repairs = catalog.get("reparations").unwrap();
        assert!(repairs.has_date_filters);
        assert_eq!(repairs.status_filter_key.as_deref(), Some("status"));
        assert_eq!(repairs.singular_title(), "Repair");
    }

    #[test]
    fn override_replaces_existing_module() {
        let mut catalog = Catalog::fleet(MARKER).unwrap();
        let before = catalog.modules().len();
        catalog.override_with(reference_table("garages", "Workshops", "/garage/", "nom_garage", "Name"));
        assert_eq!(catalog.modules().len(), before);
        assert_eq!(catalog.get("garages").unwrap().title, "Workshops");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let modules = vec![
            reference_table("garages", "Garages", "/garage/", "nom_garage", "Name"),
            reference_table("garages", "Garages", "/garage/", "nom_garage", "Name"),
        ];
        assert!(matches!(Catalog::new(modules, MARKER), Err(ConfigError::DuplicateModule(_))));
    }
}
