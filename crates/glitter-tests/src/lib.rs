//! Integration test suite for the Glitter client.
//!
//! Property tests in `tests/properties.rs` exercise the statement builder,
//! argument codec and signing under randomized inputs. `tests/e2e.rs`
//! drives the full write and query pipeline against the in-memory ledger
//! in [`helpers`].

pub mod helpers;
