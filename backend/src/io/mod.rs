//! # IO Module
//!
//! Interface layer exposing the safety core over HTTP. Handlers translate
//! the public DTOs in `shared` into domain commands and domain errors into
//! status codes; they hold no business logic.

pub mod rest;
