pub mod cli;
pub mod credo;
