// src/core/mod.rs

//! Domain logic: preset storage, project plans and env file rewriting.

pub mod dotenv;
pub mod paths;
pub mod plan;
pub mod preset_store;
