pub mod arguments;
pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod issue;
pub mod lexer;
pub mod lines;
pub mod rules;
pub mod structure;

pub use arguments::parse_arguments;
pub use lexer::classify;
pub use rules::analyze_file;
pub use structure::find_test_blocks;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
