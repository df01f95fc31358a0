// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export the remote store contract and its implementations

pub mod photo_repository;
pub mod profile_repository;
pub mod repository;
pub mod visit_repository;

#[cfg(test)]
pub mod memory;

pub use photo_repository::*;
pub use profile_repository::*;
pub use repository::*;
pub use visit_repository::*;
