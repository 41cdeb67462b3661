//! Configuration System for folr
//!
//! Provides a flexible configuration system supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Named reasoning profiles
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./folr.toml` - Project-local configuration
//! 2. `~/.config/folr/config.toml` - User configuration (XDG)
//! 3. `~/.folr/config.toml` - User configuration (legacy)
//! 4. `/etc/folr/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `FOLR_PROFILE` - Reasoning profile (horn, saturation, exhaustive, quick)
//! - `FOLR_PROCEDURE` - Inference procedure (fc, bc, otter, me, closure)
//! - `FOLR_MAX_STEPS` - Maximum inference steps
//! - `FOLR_MAX_DEPTH` - Maximum search depth
//! - `FOLR_MAX_CLAUSES` - Maximum number of kept clauses
//! - `FOLR_MAX_SECONDS` - Wall-clock limit for saturation and the closure
//! - `FOLR_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `FOLR_FORMAT` - Output format (text, json)
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! format = "text"
//! log_level = "normal"
//!
//! [reasoning]
//! procedure = "otter"
//! max_steps = 10000
//! max_clauses = 20000
//!
//! [profiles.deep]
//! procedure = "me"
//! max_depth = 12
//! description = "Deep model elimination"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::reasoning::{
    BackwardChaining, ForwardChaining, InferenceProcedure, ModelElimination,
    ModelEliminationConfig, OtterConfig, OtterProver, ResolutionClosure, StrategyConfig,
};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FolrConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Reasoning settings
    pub reasoning: ReasoningConfig,
    /// Profile-specific overrides
    pub profiles: IndexMap<String, ProfileConfig>,
}

/// General configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format
    pub format: OutputFormat,
    /// Logging level
    pub log_level: LogLevel,
}

/// Reasoning configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Inference procedure used by `ask`
    pub procedure: ProcedureKind,
    /// Maximum inference steps (passes, expansions or given clauses)
    pub max_steps: usize,
    /// Maximum search depth for backward chaining and model elimination
    pub max_depth: usize,
    /// Stop after this many proofs (0 = all)
    pub max_proofs: usize,
    /// Maximum number of kept clauses for saturation procedures
    pub max_clauses: usize,
    /// Wall-clock limit in seconds (0 = none)
    pub max_seconds: u64,
    /// Discard derived clauses heavier than this
    pub max_weight: usize,
    /// Rewrite new clauses with unit equalities
    pub demodulation: bool,
    /// Infer with equalities by paramodulation
    pub paramodulation: bool,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            procedure: ProcedureKind::Otter,
            max_steps: 10000,
            max_depth: 64,
            max_proofs: 0,
            max_clauses: 20000,
            max_seconds: 30,
            max_weight: 100,
            demodulation: true,
            paramodulation: true,
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProfileConfig {
    pub procedure: Option<ProcedureKind>,
    pub max_steps: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_proofs: Option<usize>,
    pub max_clauses: Option<usize>,
    pub max_seconds: Option<u64>,
    /// Description of the profile
    pub description: Option<String>,
}

// ============================================================================
// Enums
// ============================================================================

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Verdict and numbered proof listing
    #[default]
    Text,
    /// The full result as JSON
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// The `log` crate filter for this level
    pub fn level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Quiet => log::LevelFilter::Error,
            LogLevel::Normal => log::LevelFilter::Warn,
            LogLevel::Verbose => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Inference procedure selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
pub enum ProcedureKind {
    /// Forward chaining (definite clauses)
    #[serde(rename = "fc", alias = "forward")]
    #[value(name = "fc", alias = "forward")]
    ForwardChaining,
    /// Backward chaining (definite clauses)
    #[serde(rename = "bc", alias = "backward")]
    #[value(name = "bc", alias = "backward")]
    BackwardChaining,
    /// Given-clause saturation with a set of support
    #[default]
    #[serde(rename = "otter")]
    #[value(name = "otter")]
    Otter,
    /// Model elimination with iterative deepening
    #[serde(rename = "me", alias = "model-elimination")]
    #[value(name = "me", alias = "model-elimination")]
    ModelElimination,
    /// Naive resolution closure
    #[serde(rename = "closure", alias = "resolution")]
    #[value(name = "closure", alias = "resolution")]
    ResolutionClosure,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::ForwardChaining => "fc",
            ProcedureKind::BackwardChaining => "bc",
            ProcedureKind::Otter => "otter",
            ProcedureKind::ModelElimination => "me",
            ProcedureKind::ResolutionClosure => "closure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fc" | "forward" | "forward-chaining" => Some(ProcedureKind::ForwardChaining),
            "bc" | "backward" | "backward-chaining" => Some(ProcedureKind::BackwardChaining),
            "otter" | "saturation" => Some(ProcedureKind::Otter),
            "me" | "model-elimination" => Some(ProcedureKind::ModelElimination),
            "closure" | "resolution" => Some(ProcedureKind::ResolutionClosure),
            _ => None,
        }
    }
}

/// Built-in reasoning profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProfile {
    /// Horn knowledge bases by backward chaining
    Horn,
    /// Full first-order saturation
    Saturation,
    /// Large bounds for hard problems
    Exhaustive,
    /// Small bounds for interactive use
    Quick,
}

impl BuiltinProfile {
    pub const ALL: [BuiltinProfile; 4] = [
        BuiltinProfile::Horn,
        BuiltinProfile::Saturation,
        BuiltinProfile::Exhaustive,
        BuiltinProfile::Quick,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinProfile::Horn => "horn",
            BuiltinProfile::Saturation => "saturation",
            BuiltinProfile::Exhaustive => "exhaustive",
            BuiltinProfile::Quick => "quick",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "horn" => Some(BuiltinProfile::Horn),
            "saturation" | "otter" => Some(BuiltinProfile::Saturation),
            "exhaustive" | "complete" => Some(BuiltinProfile::Exhaustive),
            "quick" | "fast" => Some(BuiltinProfile::Quick),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuiltinProfile::Horn => "Backward chaining over definite clauses",
            BuiltinProfile::Saturation => "OTTER-like given-clause saturation with equality",
            BuiltinProfile::Exhaustive => "Saturation with large resource bounds",
            BuiltinProfile::Quick => "Small bounds for fast answers",
        }
    }

    fn apply(&self, reasoning: &mut ReasoningConfig) {
        match self {
            BuiltinProfile::Horn => {
                reasoning.procedure = ProcedureKind::BackwardChaining;
                reasoning.max_steps = 10000;
                reasoning.max_depth = 64;
            }
            BuiltinProfile::Saturation => {
                reasoning.procedure = ProcedureKind::Otter;
                reasoning.max_steps = 10000;
                reasoning.max_clauses = 20000;
                reasoning.demodulation = true;
                reasoning.paramodulation = true;
            }
            BuiltinProfile::Exhaustive => {
                reasoning.max_steps = 1_000_000;
                reasoning.max_depth = 256;
                reasoning.max_clauses = 200_000;
                reasoning.max_seconds = 300;
                reasoning.max_weight = 1000;
            }
            BuiltinProfile::Quick => {
                reasoning.max_steps = 1000;
                reasoning.max_depth = 16;
                reasoning.max_clauses = 2000;
                reasoning.max_seconds = 5;
            }
        }
    }
}

// ============================================================================
// Procedure construction
// ============================================================================

impl ReasoningConfig {
    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            max_steps: self.max_steps,
            max_depth: self.max_depth,
            max_proofs: self.max_proofs,
            max_clauses: self.max_clauses,
            max_seconds: self.max_seconds,
        }
    }

    pub fn otter_config(&self) -> OtterConfig {
        OtterConfig {
            max_clauses: self.max_clauses,
            max_iterations: self.max_steps,
            max_seconds: self.max_seconds,
            max_weight: self.max_weight,
            demodulation: self.demodulation,
            paramodulation: self.paramodulation,
            max_answers: self.max_proofs,
        }
    }

    pub fn model_elimination_config(&self) -> ModelEliminationConfig {
        ModelEliminationConfig {
            max_depth: self.max_depth,
            max_inferences: self.max_steps,
            iterative_deepening: true,
            max_seconds: self.max_seconds,
        }
    }

    /// Build the configured inference procedure
    pub fn build_procedure(&self) -> Box<dyn InferenceProcedure> {
        match self.procedure {
            ProcedureKind::ForwardChaining => {
                Box::new(ForwardChaining::new(self.strategy_config()))
            }
            ProcedureKind::BackwardChaining => {
                Box::new(BackwardChaining::new(self.strategy_config()))
            }
            ProcedureKind::Otter => Box::new(OtterProver::new(self.otter_config())),
            ProcedureKind::ModelElimination => {
                Box::new(ModelElimination::new(self.model_elimination_config()))
            }
            ProcedureKind::ResolutionClosure => {
                Box::new(ResolutionClosure::new(self.strategy_config()))
            }
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl FolrConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations
    ///
    /// The first existing file in [`FolrConfig::config_paths`] is used,
    /// then environment variable overrides are applied.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: FolrConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        let config: FolrConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject bounds that make the chosen procedure useless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reasoning;
        if r.max_steps == 0 {
            return Err(ConfigError::InvalidValue(
                "reasoning.max_steps must be positive".to_string(),
            ));
        }
        let needs_depth = matches!(
            r.procedure,
            ProcedureKind::BackwardChaining | ProcedureKind::ModelElimination
        );
        if needs_depth && r.max_depth == 0 {
            return Err(ConfigError::InvalidValue(format!(
                "reasoning.max_depth must be positive for procedure {}",
                r.procedure.as_str()
            )));
        }
        if r.max_weight == 0 {
            return Err(ConfigError::InvalidValue(
                "reasoning.max_weight must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./folr.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("folr").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".folr").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/folr/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("FOLR_PROFILE") {
            if let Err(e) = self.apply_profile(&val) {
                warn!("ignoring FOLR_PROFILE: {}", e);
            }
        }

        if let Ok(val) = env::var("FOLR_PROCEDURE") {
            if let Some(kind) = ProcedureKind::from_str(&val) {
                self.reasoning.procedure = kind;
            }
        }

        if let Some(steps) = env_usize("FOLR_MAX_STEPS") {
            self.reasoning.max_steps = steps;
        }

        if let Some(depth) = env_usize("FOLR_MAX_DEPTH") {
            self.reasoning.max_depth = depth;
        }

        if let Some(clauses) = env_usize("FOLR_MAX_CLAUSES") {
            self.reasoning.max_clauses = clauses;
        }

        if let Ok(val) = env::var("FOLR_MAX_SECONDS") {
            if let Ok(secs) = val.parse::<u64>() {
                self.reasoning.max_seconds = secs;
            }
        }

        if let Ok(val) = env::var("FOLR_LOG_LEVEL") {
            if let Some(level) = LogLevel::from_str(&val) {
                self.general.log_level = level;
            }
        }

        if let Ok(val) = env::var("FOLR_FORMAT") {
            if let Some(format) = OutputFormat::from_str(&val) {
                self.general.format = format;
            }
        }
    }

    /// Apply a named profile's settings
    ///
    /// Custom profiles from the `[profiles]` table take precedence over
    /// built-in ones with the same name.
    pub fn apply_profile(&mut self, name: &str) -> Result<(), ConfigError> {
        if let Some(custom) = self.profiles.get(name).cloned() {
            let r = &mut self.reasoning;
            if let Some(procedure) = custom.procedure {
                r.procedure = procedure;
            }
            if let Some(max_steps) = custom.max_steps {
                r.max_steps = max_steps;
            }
            if let Some(max_depth) = custom.max_depth {
                r.max_depth = max_depth;
            }
            if let Some(max_proofs) = custom.max_proofs {
                r.max_proofs = max_proofs;
            }
            if let Some(max_clauses) = custom.max_clauses {
                r.max_clauses = max_clauses;
            }
            if let Some(max_seconds) = custom.max_seconds {
                r.max_seconds = max_seconds;
            }
            return Ok(());
        }

        match BuiltinProfile::from_str(name) {
            Some(profile) => {
                profile.apply(&mut self.reasoning);
                Ok(())
            }
            None => Err(ConfigError::UnknownProfile(name.to_string())),
        }
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# folr configuration file

[general]
# Output format: text, json
format = "text"
# Logging level: quiet, normal, verbose, debug
log_level = "normal"

[reasoning]
# Inference procedure: fc, bc, otter, me, closure
procedure = "otter"
# Maximum inference steps
max_steps = 10000
# Maximum depth for bc and me
max_depth = 64
# Stop after this many proofs (0 = all)
max_proofs = 0
# Maximum kept clauses for otter and closure
max_clauses = 20000
# Wall-clock limit in seconds (0 = none)
max_seconds = 30
# Discard derived clauses heavier than this
max_weight = 100
# Equality reasoning for otter
demodulation = true
paramodulation = true

# Custom profiles can be defined like this:
# [profiles.deep]
# procedure = "me"
# max_depth = 12
# description = "Deep model elimination"
"#
    }

    /// List all available profiles
    pub fn available_profiles(&self) -> Vec<(&str, &str)> {
        let mut profiles: Vec<(&str, &str)> = BuiltinProfile::ALL
            .iter()
            .map(|p| (p.as_str(), p.description()))
            .collect();

        for (name, config) in &self.profiles {
            let desc = config.description.as_deref().unwrap_or("Custom profile");
            profiles.push((name.as_str(), desc));
        }

        profiles
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// Tests
// ============================================================================
