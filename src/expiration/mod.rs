//! Booking lifecycle expiration engine and its periodic driver

pub mod checker;
pub mod service;

pub use checker::run_expiration_checker;
pub use service::{CycleReport, ExpirationService, SweepReport};
