// src/generators/mod.rs
pub mod password;

pub use password::{generate, classify, improvement_hints, strength_score};
