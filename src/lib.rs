//! Differentie · exercise differentiation backend
//!
//! Builds instructions for a text-generation service from a user's input
//! (an existing exercise plus a differentiation intent, or the description of
//! a new exercise) and splits the generated markdown back into easy, normal,
//! hard and answer-key sections.
//!
//! Layout:
//!   - `templates` / `sections`: prompt construction and reply decomposition
//!   - `generation` / `openai`: the generation service boundary
//!   - `upload`: file to plain text
//!   - `controller`: per-session state machine composing the above
//!   - `state`, `logic`, `protocol`, `routes`: the axum service around it

pub mod config;
pub mod controller;
pub mod domain;
pub mod errors;
pub mod generation;
pub mod logic;
pub mod openai;
pub mod protocol;
pub mod routes;
pub mod sections;
pub mod state;
pub mod telemetry;
pub mod templates;
pub mod upload;
pub mod util;
