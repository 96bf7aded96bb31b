//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod run_automation;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use run_automation::configure_routes as configure_automation_routes;
