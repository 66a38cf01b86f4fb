//! Database models shared across the Petawall repository.

pub mod campaign;
pub mod config;
pub mod notification;
pub mod scan;
pub mod tracking;
