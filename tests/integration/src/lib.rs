//! Cross-crate tests for acknowledged configuration pushes.
//!
//! Run with: `cargo test --package integration-tests`

#[cfg(test)]
mod ack_tests;
#[cfg(test)]
mod load_tests;
#[cfg(test)]
mod store_tests;
