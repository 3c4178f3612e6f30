//! CLI entrypoint (§1.1): a thin `clap`-derived harness over the library
//! API. `run()` handles all output, including errors, and returns
//! `Result<(), ExitCode>` so `main.rs` only needs to map that to a process
//! exit code.

use crate::bundle::build_bundle;
use crate::config::{CliArgs as ConfigCliArgs, Config};
use auditor_analyzer::AuditReport;
use auditor_pipeline::{cancel::Cancel, process_document, OcrSource, PipelineInput};
use auditor_templates::fixtures;
use auditor_utils::canonicalization::emit_jcs;
use auditor_utils::exit_codes::ExitCode;
use auditor_utils::AuditError;
use clap::{Parser, Subcommand};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "jobsheet-auditor", version, about = "Document audit pipeline")]
struct Cli {
    /// Path to an explicit TOML config file, bypassing upward discovery.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the file-backed template registry; in-memory if unset.
    #[arg(long, global = true)]
    registry_path: Option<PathBuf>,

    /// Overrides the configured SSOT mode (forced strict in production/staging regardless).
    #[arg(long, global = true)]
    ssot_mode: Option<String>,

    #[arg(long, global = true)]
    ocr_provider: Option<String>,

    #[arg(long, global = true)]
    interpreter_provider: Option<String>,

    #[arg(long, global = true)]
    enable_raw_ocr_insights: bool,

    /// Directory under which run artifacts (traces, reports) are written.
    #[arg(long, global = true)]
    artifacts_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Runs a single document through the full audit pipeline.
    Process {
        /// Path to the document image/PDF to submit for OCR.
        file: PathBuf,
    },
    /// Template registry operations.
    #[command(subcommand)]
    Registry(RegistryCommands),
    /// Validates OCR/interpreter provider credentials without processing a document.
    Doctor,
}

#[derive(Debug, Subcommand)]
enum RegistryCommands {
    /// Activates a template version, running its fixture gate first.
    Activate {
        version_id: String,
    },
    #[command(subcommand)]
    Fixtures(FixtureCommands),
}

#[derive(Debug, Subcommand)]
enum FixtureCommands {
    /// Runs a template version's fixture pack without activating it.
    Run {
        version_id: String,
    },
}

/// Parses arguments, builds the process configuration and service bundle,
/// and dispatches to the selected subcommand.
///
/// # Errors
/// Returns the mapped [`ExitCode`] for any configuration, adapter, or
/// pipeline failure; never panics on user input.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let config_cli_args = ConfigCliArgs {
        config_path: cli.config.clone(),
        registry_path: cli.registry_path.clone(),
        ssot_mode: cli.ssot_mode.clone(),
        ocr_provider: cli.ocr_provider.clone(),
        interpreter_provider: cli.interpreter_provider.clone(),
        enable_raw_ocr_insights: cli.enable_raw_ocr_insights,
        verbose: cli.verbose,
        artifacts_dir: cli.artifacts_dir.clone(),
    };

    let config = Config::discover(&config_cli_args).map_err(|err| {
        eprintln!("✗ configuration error: {err:#}");
        ExitCode::CONFIG_ERROR
    })?;

    auditor_logging::init_tracing(config.verbose).map_err(|err| {
        eprintln!("✗ failed to initialize logging: {err}");
        ExitCode::CONFIG_ERROR
    })?;

    let bundle = build_bundle(&config).map_err(|err| {
        eprintln!("✗ failed to build service bundle: {err:#}");
        ExitCode::CONFIG_ERROR
    })?;

    let rt = tokio::runtime::Runtime::new().map_err(|err| {
        eprintln!("✗ failed to start async runtime: {err}");
        ExitCode::GENERAL_ERROR
    })?;

    let result = rt.block_on(async {
        match cli.command {
            Commands::Process { file } => execute_process(&bundle, &file).await,
            Commands::Registry(RegistryCommands::Activate { version_id }) => {
                execute_registry_activate(&bundle, &version_id)
            }
            Commands::Registry(RegistryCommands::Fixtures(FixtureCommands::Run { version_id })) => {
                execute_fixtures_run(&bundle, &version_id)
            }
            Commands::Doctor => execute_doctor(&bundle).await,
        }
    });

    if let Err(err) = result {
        if let Some(audit_error) = err.downcast_ref::<AuditError>() {
            eprintln!("✗ {audit_error} [{}]", audit_error.error_code());
            return Err(ExitCode(audit_error.to_exit_code()));
        }
        eprintln!("✗ {err:#}");
        return Err(ExitCode::GENERAL_ERROR);
    }

    Ok(())
}

async fn execute_process(bundle: &auditor_pipeline::ServiceBundle, file: &std::path::Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).map_err(|e| AuditError::Io(e.to_string()))?;
    let document_id = format!("{:x}", Sha256::digest(&bytes));
    let data = base64_encode(&bytes);
    let mime = guess_mime(file);

    let input = PipelineInput {
        document_id,
        source: OcrSource::Base64 { data, mime_type: mime },
        include_raw_ocr_insights: bundle.enable_raw_ocr_insights,
    };

    let outcome = process_document(bundle, input, &Cancel::new()).await?;
    print_audit_report(&outcome.audit_report)?;
    Ok(())
}

fn execute_registry_activate(bundle: &auditor_pipeline::ServiceBundle, version_id: &str) -> anyhow::Result<()> {
    let slug = find_slug_for_version(bundle, version_id)?;
    let report = bundle.registry.activate(&slug, version_id)?;
    println!("{report:#?}");
    if !report.passed() {
        anyhow::bail!("activation gates failed for version '{version_id}'");
    }
    Ok(())
}

fn execute_fixtures_run(bundle: &auditor_pipeline::ServiceBundle, version_id: &str) -> anyhow::Result<()> {
    let slug = find_slug_for_version(bundle, version_id)?;
    let templates = bundle.registry.get(&slug)?;
    let version = templates
        .and_then(|t| t.versions.into_iter().find(|v| v.version_id == version_id))
        .ok_or_else(|| AuditError::Validation {
            field_path: "version_id".to_string(),
            reason: format!("no template version '{version_id}' found"),
            fix_path: "registry.fixtures.run".to_string(),
        })?;
    let pack = version.fixture_pack.ok_or_else(|| AuditError::Validation {
        field_path: "fixture_pack".to_string(),
        reason: format!("version '{version_id}' has no attached fixture pack"),
        fix_path: "registry.fixtures.run".to_string(),
    })?;
    let summary = fixtures::run(&version.spec, &pack);
    println!(
        "{}/{} passed ({} required failures)",
        summary.passed, summary.total, summary.required_failed
    );
    for case in &summary.case_results {
        let marker = if case.passed { "ok" } else { "FAIL" };
        println!("  [{marker}] {} - {}", case.case_id, case.detail);
    }
    if !summary.all_required_pass() {
        anyhow::bail!("required fixture cases failed");
    }
    Ok(())
}

async fn execute_doctor(bundle: &auditor_pipeline::ServiceBundle) -> anyhow::Result<()> {
    let report = auditor_pipeline::doctor::run(bundle).await;
    println!("{}", emit_jcs(&report)?);
    if !report.all_valid {
        anyhow::bail!("one or more providers failed credential validation");
    }
    Ok(())
}

fn find_slug_for_version(bundle: &auditor_pipeline::ServiceBundle, version_id: &str) -> Result<String, AuditError> {
    let templates = bundle.registry.list()?;
    templates
        .into_iter()
        .find(|t| t.versions.iter().any(|v| v.version_id == version_id))
        .map(|t| t.slug)
        .ok_or_else(|| AuditError::Validation {
            field_path: "version_id".to_string(),
            reason: format!("no template version '{version_id}' found in any template"),
            fix_path: "registry.activate".to_string(),
        })
}

fn print_audit_report(report: &AuditReport) -> anyhow::Result<()> {
    println!("{}", emit_jcs(report)?);
    Ok(())
}

fn guess_mime(file: &std::path::Path) -> String {
    match file.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("png") => "image/png".to_string(),
        Some("jpg" | "jpeg") => "image/jpeg".to_string(),
        Some("pdf") => "application/pdf".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
