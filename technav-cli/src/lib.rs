//! # technav-cli
//!
//! The `technav` binary: a thin request handler over the TechNav RAG services.
//!
//! ```text
//! technav --user u1 ingest notes/photosynthesis.txt
//! technav --user u1 search "sunlight energy" --limit 3
//! technav --user u1 ask "How do plants get energy?"
//! technav --user u1 summary --output json
//! ```

pub mod app;
pub mod cli;
pub mod commands;

pub use app::App;
pub use cli::{Cli, Command, ConnectionArgs, FilterArgs, LogFormat, OutputFormat};
pub use commands::run;
