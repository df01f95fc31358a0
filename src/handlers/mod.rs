// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod assist;
pub mod health;
pub mod pairing;
pub mod session;
pub mod spots;

pub use assist::config as assist_config;
pub use health::config as health_config;
pub use pairing::config as pairing_config;
pub use session::config as session_config;
pub use spots::config as spots_config;
