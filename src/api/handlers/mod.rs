//! HTTP request handlers

pub mod assets;
pub mod health;
