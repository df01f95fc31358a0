// src/lib.rs
// DOCUMENTATION: Library root
// PURPOSE: Module tree shared by the companion service and the cache worker

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
