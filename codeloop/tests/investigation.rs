//! Investigation tests that need a real Python interpreter or a live oracle.
//!
//! Excluded from regular runs because they depend on the local environment
//! and, for the oracle, on API credentials.
//!
//! Run with: `cargo test --test investigation -- --ignored`

#[path = "investigation/gemini.rs"]
mod gemini;
#[path = "investigation/python_sandbox.rs"]
mod python_sandbox;
