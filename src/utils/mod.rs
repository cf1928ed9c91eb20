//! Utility functions and helpers.

pub mod http;
pub mod log;
pub mod retry;
pub mod url;

pub use self::url::{host_of, resolve, strip_fragment};
