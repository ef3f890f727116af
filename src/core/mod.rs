// src/core/mod.rs
pub mod auth;
pub mod config;
pub mod events;
pub mod vault;
