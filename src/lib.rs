//! DriveHub worker library
//!
//! Core modules of the booking lifecycle worker: the expiration engine, the
//! rental domain and its Postgres store, and the refund/notification ports.

pub mod config;
pub mod db;
pub mod expiration;
pub mod notifications;
pub mod payments;
pub mod rentals;
