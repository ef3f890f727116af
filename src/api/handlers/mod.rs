// src/api/handlers/mod.rs
pub mod auth;
pub mod credentials;
pub mod generator;
pub mod tools;
