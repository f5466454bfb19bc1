pub mod auth_service;
pub use auth_service::{AuthError, AuthService};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod copilot_service;
pub use copilot_service::{CopilotError, CopilotService};

pub mod copilot_service_impl;
pub use copilot_service_impl::LedgerCopilotService;
