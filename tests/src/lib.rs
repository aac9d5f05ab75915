//! # Sieve Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── harness.rs        # In-process node over the in-memory log
//! │   └── scenarios/        # End-to-end pipeline scenarios
//! │       ├── filtering.rs  # Join + lookup behaviour
//! │       ├── recovery.rs   # Restart and redelivery
//! │       └── wiring.rs     # Key alignment and malformed input
//! └── benches/
//!     └── filter_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sv-tests
//! cargo bench -p sv-tests
//! ```

pub mod harness;
pub mod scenarios;
