pub mod cleanup;
pub mod cli;
