//! Domain aggregates exposed by the Petawall service layer.

pub mod campaign;
pub mod notification;
pub mod scan;
pub mod tool;
pub mod tracking;
pub mod types;
