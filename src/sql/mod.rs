//! SQL text generation.
//!
//! - [`dialect`] - SQL/JSON dialect implementations

pub mod dialect;


pub use dialect::{Dialect, JsonDialect};
