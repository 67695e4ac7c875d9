//! sf2gen command-line interface internals.
//!
//! The binary in `main.rs` parses arguments and dispatches into
//! [`commands`]; keeping the command logic in the library makes it
//! testable without spawning the binary.

pub mod commands;
