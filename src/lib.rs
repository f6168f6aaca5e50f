//! Threadline is a terminal client for a chat backend that answers with cited
//! documents.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the display-side logic: markup normalization, citation
//!   resolution, the timed answer reveal, the folder panel, and the account
//!   menu. None of it persists anything; the backend is the source of truth.
//! - [`ui`] turns core view models into styled terminal lines, including the
//!   markdown walker with pluggable link, paragraph, and code-block handlers.
//! - [`api`] defines the backend wire types and the [`api::ChatBackend`]
//!   seam with its HTTP implementation.
//! - [`cli`] parses arguments and dispatches subcommands.
//!
//! The binary (`src/main.rs`) only forwards to [`cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
