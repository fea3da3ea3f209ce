pub mod compile;
pub mod config;
pub mod fetch;
pub mod output;
pub mod table;

pub use compile::{compile_archive, CompileError, CompileOutcome, Compiler, RunSummary};
pub use config::CompilerConfig;
pub use table::Table;
