// ABOUTME: Subcommand implementations for the kiln binary
// ABOUTME: Each module wires configuration into the library crates for one command

pub mod ping;
pub mod submit;
pub mod worker;
