//! Core pipeline orchestration and domain logic for mdpack.
//!
//! This crate ties together discovery, classification, encoding, and
//! manifest assembly into end-to-end workflows (e.g., [`pipeline::pack`]).

pub mod assembler;
pub mod classify;
pub mod encoder;
pub mod pipeline;
pub mod prompt;
pub mod tokens;
