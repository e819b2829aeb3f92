//! Demos member crate.
//!
//! The runnable binaries live under `examples/`; run them with
//! `cargo run -p stream-source-demos --example <name>`.
