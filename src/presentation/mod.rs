#[cfg(feature = "cli")]
pub mod cli_summary;
pub mod compiler;
pub mod grid;
pub mod writers;
