//! CLI command implementations
//!
//! Every command follows the same sequence: load config, apply the log
//! level, load the catalog snapshot, open a session, answer one request.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::{load_catalog, DataType};
use crate::collation;
use crate::observability::{log_event, Event, Logger, Severity};
use crate::planner::{CompiledPlan, ExplainPlan, Generated};
use crate::session::{Session, SessionError, DEFAULT_SCHEMA};
use crate::sql::Statement;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{error_response, ok_response, read_request, write_json, write_response, write_text};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema for unqualified names (optional, default "test")
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// Minimum log severity (optional, default "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Catalog snapshot used when `--catalog` is not given
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}
fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_schema: default_schema(),
            log_level: default_log_level(),
            catalog_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.default_schema.trim().is_empty() {
            return Err(CliError::config_error("default_schema must not be empty"));
        }

        self.log_level
            .parse::<Severity>()
            .map_err(|e| CliError::config_error(format!("Invalid log_level: {}", e)))?;

        Ok(())
    }

    /// Parsed log level; validated on load
    pub fn severity(&self) -> Severity {
        self.log_level.parse().unwrap_or(Severity::Info)
    }
}

/// Loads the config (or defaults) and applies its log level
fn configure(config_path: Option<&Path>) -> CliResult<Config> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Logger::set_min_severity(config.severity());

    let source = config_path.map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
    log_event(
        Severity::Info,
        Event::ConfigLoaded,
        &[
            ("default_schema", &config.default_schema),
            ("log_level", &config.log_level),
            ("source", &source),
        ],
    );
    Ok(config)
}

fn open_session(catalog_path: Option<&Path>, config_path: Option<&Path>) -> CliResult<Session> {
    let config = configure(config_path)?;
    let path = catalog_path
        .map(Path::to_path_buf)
        .or_else(|| config.catalog_path.clone())
        .ok_or_else(|| {
            CliError::config_error("No catalog given: pass --catalog or set catalog_path")
        })?;
    let catalog = load_catalog(&path)?;
    Ok(Session::new(Arc::new(catalog), config.default_schema))
}

/// Body of a compile or explain request
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompileRequest {
    WithHints {
        statement: Statement,
        #[serde(default)]
        parameter_types: Vec<Option<DataType>>,
    },
    Bare(Statement),
}

impl CompileRequest {
    fn parse(request: Value) -> CliResult<(Statement, Vec<Option<DataType>>)> {
        let request: CompileRequest = serde_json::from_value(request)
            .map_err(|e| CliError::invalid_request(format!("Not a statement: {}", e)))?;
        Ok(match request {
            CompileRequest::WithHints {
                statement,
                parameter_types,
            } => (statement, parameter_types),
            CompileRequest::Bare(statement) => (statement, Vec::new()),
        })
    }
}

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { catalog, config } => compile(catalog.as_deref(), config.as_deref()),
        Command::Explain { catalog, config } => explain(catalog.as_deref(), config.as_deref()),
        Command::Collations { config } => collations(config.as_deref()),
    }
}

/// Compile one statement from stdin and write the plan as JSON
///
/// DDL is applied to the in-memory snapshot, which validates it.
pub fn compile(catalog_path: Option<&Path>, config_path: Option<&Path>) -> CliResult<()> {
    let mut session = open_session(catalog_path, config_path)?;
    let request = read_request()?;
    let response = handle_compile(&mut session, request)?;
    write_json(&response)
}

/// Print explain text for one statement from stdin
pub fn explain(catalog_path: Option<&Path>, config_path: Option<&Path>) -> CliResult<()> {
    let session = open_session(catalog_path, config_path)?;
    let request = read_request()?;
    let explain = handle_explain(&session, request)?;
    write_text(&explain.to_string())
}

/// List the collation registry
pub fn collations(config_path: Option<&Path>) -> CliResult<()> {
    configure(config_path)?;
    write_response(collations_json())
}

/// Builds the full response for a compile request. Rejections become error
/// responses; only malformed requests fail.
pub fn handle_compile(session: &mut Session, request: Value) -> CliResult<Value> {
    let (statement, hints) = CompileRequest::parse(request)?;
    Ok(match session.execute(&statement, &hints) {
        Ok(Generated::Plan(plan)) => ok_response(plan_json(&plan)),
        Ok(Generated::NotApplicable) => ok_response(json!({
            "statement_text": statement.statement_text(),
            "kind": "ddl",
        })),
        Err(SessionError::Planner(e)) => error_response(e.code().code(), e.message()),
        Err(e) => error_response("SQLPLAN_DDL_REJECTED", &e.to_string()),
    })
}

pub fn handle_explain(session: &Session, request: Value) -> CliResult<ExplainPlan> {
    let (statement, hints) = CompileRequest::parse(request)?;
    Ok(match session.compile(&statement, &hints) {
        Ok(Generated::Plan(plan)) => ExplainPlan::from_plan(&plan),
        Ok(Generated::NotApplicable) => ExplainPlan::not_applicable(statement.statement_text()),
        Err(e) => ExplainPlan::from_error(&e),
    })
}

fn plan_json(plan: &CompiledPlan) -> Value {
    let operators: Vec<String> = plan.root.to_string().lines().map(str::to_string).collect();
    json!({
        "statement_text": plan.statement_text,
        "kind": plan.kind(),
        "is_modify": plan.is_modify,
        "operators": operators,
        "result_columns": plan.result_columns,
        "parameter_types": plan.parameter_types,
        "offset": plan.offset,
        "limit": plan.limit,
    })
}

fn collations_json() -> Value {
    let collators: Vec<Value> = collation::registry()
        .all()
        .iter()
        .map(|c| {
            json!({
                "id": c.collation_id(),
                "name": c.name(),
                "scheme": c.scheme(),
                "recoverable": c.is_recoverable(),
                "case_sensitive": c.is_case_sensitive(),
            })
        })
        .collect();
    Value::Array(collators)
}
