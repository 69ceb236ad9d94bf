//! Command-line arguments.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use technav_rag::pgvector::DEFAULT_TABLE;
use technav_rag::{MetadataFilter, OwnerScope};

#[derive(Parser, Debug)]
#[command(name = "technav", about = "Ingest, search and question TechNav documents", version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Act on behalf of this user
    #[arg(long, global = true, env = "TECHNAV_USER_ID")]
    pub user: Option<String>,

    /// Read across every user's documents (search, ask, list, summary, delete)
    #[arg(long, global = true, conflicts_with = "user")]
    pub all_users: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Plain)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The owner scope selected by `--user` / `--all-users`.
    pub fn scope(&self) -> anyhow::Result<OwnerScope> {
        if self.all_users {
            return Ok(OwnerScope::Unscoped);
        }
        match self.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => Ok(OwnerScope::owner(user)),
            _ => bail!("no user selected: pass --user <ID> or --all-users"),
        }
    }
}

/// Backend connection settings. Flags override the environment.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// PostgreSQL connection string
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Table holding the documents
    #[arg(long, global = true, env = "TECHNAV_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// API key for the OpenAI-compatible endpoints
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Embedding model name
    #[arg(
        long,
        global = true,
        env = "TECHNAV_EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub embedding_model: String,

    /// Embedding vector length; must match the database column
    #[arg(long, global = true, env = "TECHNAV_EMBEDDING_DIMENSIONS", default_value_t = 384)]
    pub embedding_dimensions: usize,

    /// Chat model used for answers
    #[arg(long, global = true, env = "TECHNAV_CHAT_MODEL", default_value = "gpt-4o-mini")]
    pub chat_model: String,

    /// Log output format
    #[arg(
        long,
        global = true,
        env = "TECHNAV_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

/// How command results are written to stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Plain,
    /// Pretty-printed JSON
    Json,
}

/// How log events are written to stderr.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact text lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store one or more text files as documents
    Ingest {
        /// Files to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Title for every ingested file (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,
        /// Source label
        #[arg(long, default_value = "upload")]
        source: String,
        /// Document type (defaults to the file extension)
        #[arg(long = "type")]
        doc_type: Option<String>,
    },

    /// Rank documents by similarity to a query
    Search {
        query: String,
        /// Maximum results
        #[arg(long)]
        limit: Option<usize>,
        /// Minimum similarity
        #[arg(long)]
        threshold: Option<f32>,
        /// Return results without metadata
        #[arg(long)]
        no_metadata: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Answer a question from stored documents
    Ask {
        question: String,
        /// Maximum documents used as context
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List documents, newest first
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Count documents by type and show recent uploads
    Summary,

    /// Delete documents matching a metadata filter
    Delete {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Exact-match metadata filter flags.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only documents with this title
    #[arg(long = "where-title")]
    pub title: Option<String>,
    /// Only documents from this source
    #[arg(long = "where-source")]
    pub source: Option<String>,
    /// Only documents of this type
    #[arg(long = "where-type")]
    pub doc_type: Option<String>,
    /// Only documents with this file name
    #[arg(long = "where-file-name")]
    pub file_name: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> MetadataFilter {
        let mut filter = MetadataFilter::new();
        if let Some(title) = &self.title {
            filter = filter.title(title.clone());
        }
        if let Some(source) = &self.source {
            filter = filter.source(source.clone());
        }
        if let Some(doc_type) = &self.doc_type {
            filter = filter.doc_type(doc_type.clone());
        }
        if let Some(file_name) = &self.file_name {
            filter = filter.file_name(file_name.clone());
        }
        filter
    }
}
