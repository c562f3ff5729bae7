//! CLI command implementations
//!
//! Both commands open the same session: configuration, then schema, then
//! entries, then the configured indexes. Relative file names in the
//! configuration resolve against the configuration file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::builder::search_ids;
use crate::config::SearchConfig;
use crate::context::SearchContext;
use crate::cursor::Direction;
use crate::filter::ExpressionNode;
use crate::observability::{log_event_with_fields, Event, SearchStats};
use crate::schema::SchemaRegistry;
use crate::store::MemoryStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Engine settings
    #[serde(flatten)]
    pub search: SearchConfig,

    /// JSON schema definition; the built-in core schema when absent
    #[serde(default)]
    pub schema_file: Option<String>,

    /// JSON array of entries (required)
    pub entries_file: String,
}

impl CliConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        let config = Self::from_json_str(&content)?;
        log_event_with_fields(Event::ConfigLoaded, &[("path", &path.display().to_string())]);
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> CliResult<Self> {
        let config: CliConfig = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.entries_file.trim().is_empty() {
            return Err(CliError::config_error("entries_file must not be empty"));
        }
        self.search.validate()?;
        Ok(())
    }
}

/// Everything one command needs
struct Session {
    config: CliConfig,
    schema: SchemaRegistry,
    store: MemoryStore,
}

fn resolve(base: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn open_session(config_path: &Path) -> CliResult<Session> {
    let config = CliConfig::load(config_path)?;
    config.search.apply_logging();

    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let schema = match &config.schema_file {
        Some(file) => SchemaRegistry::load(&resolve(base, file))?,
        None => SchemaRegistry::core(),
    };

    let mut store = MemoryStore::load(&resolve(base, &config.entries_file))?;
    for attribute in &config.search.indexed_attributes {
        store.index_with_schema(&schema, attribute)?;
    }

    Ok(Session {
        config,
        schema,
        store,
    })
}

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Search { config, reverse } => search(&config, reverse),
        Command::Validate { config } => validate(&config),
    }
}

/// Read a filter from stdin, run it, print ids and counters
pub fn search(config_path: &Path, reverse: bool) -> CliResult<()> {
    let session = open_session(config_path)?;
    let filter: ExpressionNode = serde_json::from_value(read_request()?)?;

    let stats = SearchStats::new();
    let ctx = SearchContext::new(&session.store, &session.schema, &session.config.search)
        .with_stats(&stats);
    let direction = if reverse {
        Direction::Backward
    } else {
        Direction::Forward
    };

    match search_ids(ctx, &filter, direction) {
        Ok(ids) => write_response(json!({
            "ids": ids,
            "stats": stats.snapshot(),
        })),
        Err(e) => {
            write_error(e.code().code(), &e.to_string())?;
            Err(e.into())
        }
    }
}

/// Load everything and report counts
pub fn validate(config_path: &Path) -> CliResult<()> {
    let session = open_session(config_path)?;
    session.schema.validate()?;
    write_response(json!({
        "attribute_types": session.schema.attribute_type_count(),
        "entries": session.store.len(),
        "indexed_attributes": session.config.search.indexed_attributes,
    }))
}
