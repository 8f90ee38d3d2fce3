use tablekeeper_application::{AuthorizationService, InventoryService, MaintenanceService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub inventory_service: InventoryService,
    pub maintenance_service: MaintenanceService,
    pub authorization_service: AuthorizationService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
