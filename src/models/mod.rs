// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export storage rows, view models and request payloads

pub mod filter;
pub mod ids;
pub mod photo;
pub mod profile;
pub mod spot;
pub mod usage;
pub mod visit;

pub use filter::*;
pub use ids::*;
pub use photo::*;
pub use profile::*;
pub use spot::*;
pub use usage::*;
pub use visit::*;
