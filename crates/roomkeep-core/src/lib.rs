//! Roomkeep Core — domain models, stay-range availability rules, role
//! capabilities and repository traits shared by every other crate.

pub mod access;
pub mod availability;
pub mod error;
pub mod models;
pub mod repository;
