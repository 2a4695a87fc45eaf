//! Shared test fixtures for sluice crates.
//!
//! This crate provides sample data and small stage definitions for testing.
//! It depends only on `sluice-core` so the engine crate can use it without
//! pulling in the stage catalogs.
//!
//! - [`data`] - sample input sequences
//! - [`stages`] - minimal through and terminal stage definitions
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! sluice-test = { workspace = true }
//! ```
//!
//! Then register the fixture add-in:
//!
//! ```ignore
//! let mut registry = Registry::new().with_catalog([sluice_test::add_in()]);
//! registry.load(&["fixtures"])?;
//! ```

pub mod data;
pub mod stages;

pub use data::{ints, keyed_dicts, pairs};
pub use stages::add_in;
