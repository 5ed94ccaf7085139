// crates/numport-cli/src/main.rs
// ============================================================================
// Module: Numport CLI Entry Point
// Description: Command dispatcher for porting validation and submission.
// Purpose: Expose the porting engine to operators and scripts.
// Dependencies: clap, numport-cli, numport-config, numport-core, tokio
// ============================================================================

//! ## Overview
//! Commands print JSON on stdout and diagnostics on stderr. A rejected field,
//! upload, or submission exits with a failure code after printing its verdict
//! so scripts can branch on the exit status and still read the details.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use numport_cli::CliError;
use numport_cli::CliResult;
use numport_cli::logging::init_logging;
use numport_cli::services::build_services;
use numport_cli::services::open_ledger;
use numport_cli::submission::load_submission;
use numport_cli::submission::submit_application;
use numport_config::NumportConfig;
use numport_core::CompatibilityResolver;
use numport_core::FieldName;
use numport_core::FieldValidators;
use numport_core::FileUpload;
use numport_core::Network;
use numport_core::SubmitError;
use numport_core::SystemClock;
use numport_core::UploadValidator;
use serde::Serialize;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "numport", version, about = "Number porting request toolkit")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate one form field value.
    Validate(ValidateCommand),
    /// Look up the compatibility of a network pair.
    Compat(CompatCommand),
    /// Check upload metadata against the configured policy.
    UploadCheck(UploadCheckCommand),
    /// Submit a porting application from a JSON file.
    Submit(SubmitCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Field wire label (for example `idNumber` or `id-number`).
    #[arg(long, value_name = "FIELD")]
    field: String,
    /// Raw value to validate.
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    value: String,
}

/// Arguments for `compat`.
#[derive(Args, Debug)]
struct CompatCommand {
    /// Operator currently holding the number.
    #[arg(long, value_name = "NETWORK")]
    from: Option<String>,
    /// Operator receiving the number.
    #[arg(long, value_name = "NETWORK")]
    to: Option<String>,
}

/// Arguments for `upload-check`.
#[derive(Args, Debug)]
struct UploadCheckCommand {
    /// File name as supplied by the client.
    #[arg(long, value_name = "NAME")]
    name: String,
    /// File size in bytes.
    #[arg(long, value_name = "BYTES")]
    size: u64,
    /// Declared MIME type.
    #[arg(long, value_name = "MIME")]
    content_type: Option<String>,
    /// Optional config file path (defaults to numport.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `submit`.
#[derive(Args, Debug)]
struct SubmitCommand {
    /// Path to the submission JSON file.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Optional config file path (defaults to numport.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Numport configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to numport.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_logging()?;
    match cli.command {
        Commands::Validate(command) => command_validate(&command),
        Commands::Compat(command) => command_compat(&command),
        Commands::UploadCheck(command) => command_upload_check(command),
        Commands::Submit(command) => command_submit(&command).await,
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let field = FieldName::parse(&command.field)
        .ok_or_else(|| CliError::UnknownField(command.field.clone()))?;
    let validators = FieldValidators::new(Arc::new(SystemClock));
    let result = validators.validate(field, &command.value);
    write_json(&result)?;
    Ok(verdict_code(result.is_valid))
}

/// Executes the `compat` command.
fn command_compat(command: &CompatCommand) -> CliResult<ExitCode> {
    let resolver = CompatibilityResolver::default();
    match (&command.from, &command.to) {
        (Some(from), Some(to)) => {
            let entry = resolver.resolve(parse_network(from)?, parse_network(to)?);
            write_json(&entry)?;
        }
        (None, None) => {
            let matrix: Vec<_> = Network::ALL
                .iter()
                .flat_map(|from| Network::ALL.iter().map(move |to| (*from, *to)))
                .filter(|(from, to)| from != to)
                .map(|(from, to)| resolver.resolve(from, to))
                .collect();
            write_json(&matrix)?;
        }
        _ => return Err(CliError::Input("--from and --to must be given together".to_string())),
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `upload-check` command.
fn command_upload_check(command: UploadCheckCommand) -> CliResult<ExitCode> {
    let config = NumportConfig::load_or_default(command.config.as_deref())?;
    let validator = UploadValidator::new(config.uploads.upload_policy());
    let verdict = validator.validate(&FileUpload {
        name: command.name,
        size_bytes: command.size,
        content_type: command.content_type,
    });
    write_json(&verdict)?;
    Ok(verdict_code(verdict.is_valid))
}

/// Executes the `submit` command.
async fn command_submit(command: &SubmitCommand) -> CliResult<ExitCode> {
    let config = NumportConfig::load_or_default(command.config.as_deref())?;
    let input = load_submission(&command.input)?;
    let services = Arc::new(build_services(&config, Arc::new(SystemClock))?);
    let sync = open_ledger(&config, &services, &input.owner()).await?;
    match submit_application(&input, services, &sync).await {
        Ok(report) => {
            write_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(CliError::Submit(SubmitError::Invalid(errors))) => {
            write_json(&InvalidSubmission {
                error: "invalid_fields",
                fields: errors
                    .into_iter()
                    .map(|(field, message)| (field.as_str(), message))
                    .collect(),
            })?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            NumportConfig::load(command.config.as_deref())?;
            write_stdout_line("config valid")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Field errors printed for an invalid submission.
#[derive(Debug, Serialize)]
struct InvalidSubmission {
    /// Stable error label.
    error: &'static str,
    /// Error message per field wire label.
    fields: BTreeMap<&'static str, String>,
}

/// Parses a network argument.
fn parse_network(value: &str) -> CliResult<Network> {
    Network::parse(value).ok_or_else(|| CliError::Input(format!("unknown network: {value}")))
}

/// Maps a verdict onto the process exit code.
fn verdict_code(valid: bool) -> ExitCode {
    if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Writes `value` to stdout as pretty JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(|err| CliError::Output {
        stream: "stdout",
        error: err.to_string(),
    })?;
    write_stdout_line(&rendered)
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::Output {
        stream: "stdout",
        error: err.to_string(),
    })
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
