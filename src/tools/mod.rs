// src/tools/mod.rs
pub mod breach;
pub mod favicon;
pub mod geo;
