//! Integration-test member crate.
//!
//! The actual tests live under `tests/`; fixtures are sibling modules next
//! to the test files.
