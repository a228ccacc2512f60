// ABOUTME: Subcommand implementations for the adapt binary
// ABOUTME: One module per command

pub mod generate;
pub mod render;
pub mod serve;
pub mod validate;
