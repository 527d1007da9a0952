//! Models Module - Data Structures & Errors
//!
//! Single source of truth for the report data model and the error taxonomy.

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
