//! API handlers
//!
//! Author: bailey4770

pub mod admin;
pub mod auth;
pub mod health;
pub mod webhooks;
