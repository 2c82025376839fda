//! # Iconsmith Architecture
//!
//! Iconsmith asks an image-generation API for flat, single-color icon
//! silhouettes, checks every returned image pixel by pixel, retries once with
//! a corrective prompt when a check fails, and stores accepted images next to
//! JSON sidecars. It is a library with a thin CLI client.
//!
//! ## The Three-Layer Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, runs the REPL          │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Builds requests, returns structured Result types         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - generate, edit, list, set_key                            │
//! │  - pipeline.rs: the per-variant validate/retry machine      │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                         │
//!                    ▼                         ▼
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │  Provider (provider/)        │ │  Storage (store/)          │
//! │  - ImageProvider trait       │ │  - ArtifactStore trait     │
//! │  - OpenAI images client      │ │  - FileStore, InMemoryStore│
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes Rust values and returns
//! `Result<CmdResult>`. It never writes to stdout/stderr and never exits the
//! process. Per-variant failures are values ([`commands::VariantOutcome`]);
//! `Err` is reserved for failures of the whole invocation.
//!
//! ## Testing Strategy
//!
//! 1. **Domain** (`checker`, `namer`, `prompt`): pure functions, plain unit tests
//!    over synthetic pixel fixtures.
//! 2. **Commands** (`commands/*.rs`): the bulk of the tests, driving the
//!    pipeline with `test_utils::ScriptedProvider` against both stores.
//! 3. **Provider** (`provider/openai.rs`): against an in-process HTTP mock.
//! 4. **CLI** (`tests/`): the binary end to end, without network access.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Business logic for each command
//! - [`checker`]: Pixel-level acceptance checks
//! - [`namer`]: Artifact base names
//! - [`prompt`]: Prompt compiler and corrective prompts
//! - [`provider`]: Image provider boundary
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Core data types
//! - [`config`]: Configuration management
//! - [`error`]: Error types and the failure taxonomy
//! - `cli`: Argument parsing, printing and the REPL for the binary (not part of the lib API)

pub mod api;
pub mod checker;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod namer;
pub mod prompt;
pub mod provider;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
