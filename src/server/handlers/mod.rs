//! HTTP request handlers

pub mod forbidden;
pub mod health;
pub mod proxy;
