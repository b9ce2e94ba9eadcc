//! Generate-test-debug loop for small stdin/stdout programs.
//!
//! Given a task description and input/expected-output cases, the solver asks
//! an oracle for a program, runs it in a sandbox against every case, and feeds
//! failures back to the oracle until the program passes or a budget runs out.
//!
//! - **[`core`]**: Pure, deterministic logic (output comparison, error
//!   normalization, classification, canned cases). No I/O.
//! - **[`io`]**: Side effects (process execution, sandbox, oracle backends,
//!   config, transcripts). Behind traits where tests substitute doubles.
//!
//! [`solve`] drives the retry loop and [`cases`] suggests test cases; both
//! coordinate core logic with I/O for the CLI.

pub mod cases;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod solve;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
