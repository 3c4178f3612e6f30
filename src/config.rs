//! Process configuration (§1.1, §6 `Config`): layered environment flags,
//! an optional TOML file, and CLI overrides, resolved once at start-up into
//! the typed form consumed by [`crate::bundle::build_bundle`].
//!
//! Precedence: CLI flags > environment variables > config file > defaults.

use anyhow::{Context, Result};
use auditor_calibration::ThresholdLevel;
use auditor_templates::SsotMode;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// CLI-sourced overrides, mirrored 1:1 from [`crate::cli::Cli`]'s global flags
/// so `Config::discover` can be exercised independently of `clap`.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub registry_path: Option<PathBuf>,
    pub ssot_mode: Option<String>,
    pub ocr_provider: Option<String>,
    pub interpreter_provider: Option<String>,
    pub enable_raw_ocr_insights: bool,
    pub verbose: bool,
    pub artifacts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct TomlConfig {
    registry_path: Option<String>,
    ssot_mode: Option<String>,
    ocr_provider: Option<String>,
    interpreter_provider: Option<String>,
    enable_raw_ocr_insights: Option<bool>,
    log_level: Option<String>,
    calibration_level: Option<String>,
    resilience: Option<TomlResilience>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct TomlResilience {
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    failure_threshold: Option<u32>,
    reset_timeout_ms: Option<u64>,
}

/// `APP_ENV`/`NODE_ENV` values that the registry forces into strict SSOT mode
/// regardless of any override (§4.9, §8); kept here too so `doctor` and the
/// config summary can report the effective mode before the registry exists.
const FORCED_STRICT_ENVIRONMENTS: &[&str] = &["production", "staging"];

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub retry: RetrySettings,
    pub breaker: BreakerSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetrySettings { max_retries: 3, base_delay_ms: 200, max_delay_ms: 5_000 },
            breaker: BreakerSettings { failure_threshold: 5, reset_timeout_ms: 30_000 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub registry_path: Option<PathBuf>,
    pub ssot_mode_override: SsotMode,
    pub ocr_provider: String,
    pub interpreter_provider: String,
    pub enable_raw_ocr_insights: bool,
    pub log_level: String,
    pub calibration_level: ThresholdLevel,
    pub resilience: ResilienceConfig,
    pub app_env: String,
    pub verbose: bool,
    pub artifacts_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: None,
            ssot_mode_override: SsotMode::Permissive,
            ocr_provider: "mock".to_string(),
            interpreter_provider: "mock".to_string(),
            enable_raw_ocr_insights: false,
            log_level: "info".to_string(),
            calibration_level: ThresholdLevel::Standard,
            resilience: ResilienceConfig::default(),
            app_env: "development".to_string(),
            verbose: false,
            artifacts_dir: PathBuf::from(".jobsheet-auditor/artifacts"),
        }
    }
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults.
    ///
    /// # Errors
    /// Returns an error if an explicit or discovered config file cannot be
    /// read or parsed, or if a value fails to parse into its typed form.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("failed to read current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Path-driven variant used by tests to avoid relying on process CWD.
    ///
    /// # Errors
    /// See [`Self::discover`].
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut config = Self::default();

        let config_path = if let Some(explicit) = &cli_args.config_path {
            Some(explicit.clone())
        } else {
            Self::discover_config_file_from(start_dir)
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("failed to load config file: {}", path.display()))?;
            apply_file_config(&mut config, file_config);
        }

        apply_env_overrides(&mut config)?;
        apply_cli_overrides(&mut config, cli_args)?;

        Ok(config)
    }

    /// Searches upward from `start_dir` for `.jobsheet-auditor/config.toml`.
    fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = Some(start_dir.to_path_buf());
        while let Some(current) = dir {
            let candidate = current.join(".jobsheet-auditor").join("config.toml");
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Whether the environment forces strict SSOT mode regardless of
    /// `ssot_mode_override` (mirrors [`auditor_templates::TemplateRegistry::ssot_mode`]).
    #[must_use]
    pub fn forces_strict_ssot(&self) -> bool {
        FORCED_STRICT_ENVIRONMENTS.contains(&self.app_env.as_str())
    }

    #[cfg(test)]
    pub fn minimal_for_testing() -> Self {
        Self::default()
    }
}

fn apply_file_config(config: &mut Config, file: TomlConfig) {
    if let Some(v) = file.registry_path {
        config.registry_path = Some(PathBuf::from(v));
    }
    if let Some(v) = file.ssot_mode {
        if let Some(mode) = parse_ssot_mode(&v) {
            config.ssot_mode_override = mode;
        }
    }
    if let Some(v) = file.ocr_provider {
        config.ocr_provider = v;
    }
    if let Some(v) = file.interpreter_provider {
        config.interpreter_provider = v;
    }
    if let Some(v) = file.enable_raw_ocr_insights {
        config.enable_raw_ocr_insights = v;
    }
    if let Some(v) = file.log_level {
        config.log_level = v;
    }
    if let Some(v) = file.calibration_level {
        if let Some(level) = parse_threshold_level(&v) {
            config.calibration_level = level;
        }
    }
    if let Some(r) = file.resilience {
        if let Some(v) = r.max_retries {
            config.resilience.retry.max_retries = v;
        }
        if let Some(v) = r.base_delay_ms {
            config.resilience.retry.base_delay_ms = v;
        }
        if let Some(v) = r.max_delay_ms {
            config.resilience.retry.max_delay_ms = v;
        }
        if let Some(v) = r.failure_threshold {
            config.resilience.breaker.failure_threshold = v;
        }
        if let Some(v) = r.reset_timeout_ms {
            config.resilience.breaker.reset_timeout_ms = v;
        }
    }
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(v) = env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")) {
        config.app_env = v;
    }
    if let Ok(v) = env::var("TEMPLATE_SSOT_MODE") {
        match parse_ssot_mode(&v) {
            Some(mode) => config.ssot_mode_override = mode,
            None => anyhow::bail!("invalid TEMPLATE_SSOT_MODE value: {v} (expected strict|permissive)"),
        }
    }
    if let Ok(v) = env::var("OCR_PROVIDER") {
        config.ocr_provider = v;
    }
    if let Ok(v) = env::var("INTERPRETER_PROVIDER") {
        config.interpreter_provider = v;
    }
    if let Ok(v) = env::var("ENABLE_RAW_OCR_INSIGHTS") {
        config.enable_raw_ocr_insights = parse_bool_env(&v);
    }
    if let Ok(v) = env::var("LOG_LEVEL") {
        config.log_level = v;
    }
    Ok(())
}

fn apply_cli_overrides(config: &mut Config, cli_args: &CliArgs) -> Result<()> {
    if let Some(v) = &cli_args.registry_path {
        config.registry_path = Some(v.clone());
    }
    if let Some(v) = &cli_args.ssot_mode {
        match parse_ssot_mode(v) {
            Some(mode) => config.ssot_mode_override = mode,
            None => anyhow::bail!("invalid --ssot-mode value: {v} (expected strict|permissive)"),
        }
    }
    if let Some(v) = &cli_args.ocr_provider {
        config.ocr_provider = v.clone();
    }
    if let Some(v) = &cli_args.interpreter_provider {
        config.interpreter_provider = v.clone();
    }
    if cli_args.enable_raw_ocr_insights {
        config.enable_raw_ocr_insights = true;
    }
    if cli_args.verbose {
        config.verbose = true;
    }
    if let Some(v) = &cli_args.artifacts_dir {
        config.artifacts_dir = v.clone();
    }
    Ok(())
}

fn parse_ssot_mode(v: &str) -> Option<SsotMode> {
    match v.to_lowercase().as_str() {
        "strict" => Some(SsotMode::Strict),
        "permissive" => Some(SsotMode::Permissive),
        _ => None,
    }
}

fn parse_threshold_level(v: &str) -> Option<ThresholdLevel> {
    match v.to_lowercase().as_str() {
        "strict" => Some(ThresholdLevel::Strict),
        "standard" => Some(ThresholdLevel::Standard),
        "lenient" => Some(ThresholdLevel::Lenient),
        _ => None,
    }
}

fn parse_bool_env(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
