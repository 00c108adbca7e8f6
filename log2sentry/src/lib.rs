pub mod cli;
pub mod logging;

pub use cli::{run, Cli, LogFormat};
