//! Core library for pdfscan
//!
//! This crate implements the **Functional Core** of the pdfscan application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! - **`pdfscan_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdfscan`**: I/O operations and orchestration (the Imperative Shell)
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Deterministic**: Behavior is predictable and reproducible
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! - [`outline`]: Numbered outline reconstruction from heading-marked text
//! - [`stats`]: Word cleaning, counting, and frequency ranking
//! - [`stopwords`]: The stop-word table used by [`stats`]
//! - [`chunk`]: Paragraph-aware text chunking for summarization
//! - [`summarize`]: Prompt assembly for the summarization agent
//!
//! Each module contains domain models, transformation functions, and
//! comprehensive unit tests using fixture data (no mocking).

pub mod chunk;
pub mod outline;
pub mod stats;
pub mod stopwords;
pub mod summarize;
