//! Utility functions and helpers.

pub mod csv;
pub mod http;
pub mod progress;
pub mod url;

pub use url::normalize;
