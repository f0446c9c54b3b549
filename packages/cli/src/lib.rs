//! # remirror-cli
//!
//! A command-line shell for inspecting a live remirror session over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive shell against a local server
//! remirror --url http://localhost:8888
//!
//! # Inside the shell:
//! > context
//! > get person.name
//! > set person.age 31
//! > call person.greet "Bob"
//!
//! # One-shot command
//! remirror get person.name
//! ```

pub mod commands;
pub mod error;
pub mod shell;

pub use error::Error;
