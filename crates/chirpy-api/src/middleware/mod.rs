//! HTTP middleware
//!
//! Author: bailey4770

pub mod security_headers;

pub use security_headers::security_headers_middleware;
