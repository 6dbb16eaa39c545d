//! Library wrapper around the `orbit` CLI implementation.
//!
//! `cargo test -p orbit-cli --lib` typechecks the CLI without building the binary test suite, so
//! the binary crate root (`main.rs`) is compiled as a module of this library target.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
