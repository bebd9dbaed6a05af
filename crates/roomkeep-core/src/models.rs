//! Domain models for Roomkeep.
//!
//! These are the core types shared across all crates.

pub mod dashboard;
pub mod payment;
pub mod reservation;
pub mod room;
pub mod schedule;
pub mod session;
pub mod user;
