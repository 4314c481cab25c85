// src/cli/handlers/mod.rs

//! The wizard's steps: shared checks, the questions, and the run itself.

pub mod commons;
pub mod new;
pub mod wizard;
