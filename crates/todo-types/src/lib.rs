//! Todo Types - Pure type definitions shared by the API server and its clients
//!
//! This crate contains only data types and input validation, with no async
//! runtime or database dependencies.

pub mod api;
pub mod todo;

pub use api::*;
pub use todo::*;
