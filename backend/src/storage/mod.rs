//! # Storage Module
//!
//! Persistence for the safety core. Every repository is backed by a single
//! SQLite pool (`DbConnection`) and implements one of the traits in
//! [`traits`], which is all the domain layer ever sees.
//!
//! ## Layout
//!
//! - **connection.rs** - pool setup and schema
//! - **traits.rs** - storage abstractions consumed by the domain services
//! - **repositories/** - SQLite implementations, one per table

pub mod connection;
pub mod repositories;
pub mod traits;

pub use connection::DbConnection;
pub use repositories::{
    ActivityRepository, AlertRepository, ChildRepository, IncidentRepository, MessageRepository,
    SafetyRuleRepository,
};
pub use traits::*;
