// Configuration loading and parsing (draft.toml; strategy.toml is read with
// the reference data).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use pickcast_core::data::DataPaths;
use pickcast_core::hero::RoleAliases;
use pickcast_core::scoring::weights::ScoringWeights;
use pickcast_core::{Role, Side, TimerConfig};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub timer: TimerConfig,
    pub pacing_ms: u64,
    /// The side our team plays; `None` treats Blue as ours.
    pub our_side: Option<Side>,
    pub db_path: String,
    /// Data file locations, resolved against the base directory.
    pub data_paths: DataPaths,
    pub scoring: ScoringWeights,
    pub role_aliases: RoleAliases,
}

// ---------------------------------------------------------------------------
// draft.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct DraftFile {
    timer: TimerConfig,
    #[serde(default)]
    simulation: SimulationSection,
    database: DatabaseSection,
    data: DataPaths,
    #[serde(default)]
    scoring: ScoringWeights,
    #[serde(default)]
    roles: RolesSection,
}

#[derive(Debug, Clone, Deserialize)]
struct SimulationSection {
    #[serde(default = "default_pacing_ms")]
    pacing_ms: u64,
    #[serde(default)]
    our_side: Option<String>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        SimulationSection {
            pacing_ms: default_pacing_ms(),
            our_side: None,
        }
    }
}

fn default_pacing_ms() -> u64 {
    750
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RolesSection {
    /// Extra role name -> canonical role name.
    #[serde(default)]
    aliases: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/draft.toml` relative to `base_dir`, without
/// copying defaults. Prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let draft_path = base_dir.join("config").join("draft.toml");
    let draft_text = read_file(&draft_path)?;
    let file: DraftFile = toml::from_str(&draft_text).map_err(|e| ConfigError::ParseError {
        path: draft_path.clone(),
        source: e,
    })?;

    let our_side = match file.simulation.our_side.as_deref() {
        None => None,
        Some(s) => Some(Side::from_str_side(s).ok_or_else(|| ConfigError::ValidationError {
            field: "simulation.our_side".into(),
            message: format!("expected BLUE or RED, got '{s}'"),
        })?),
    };

    let mut role_aliases = RoleAliases::new();
    let mut alias_names: Vec<&String> = file.roles.aliases.keys().collect();
    alias_names.sort();
    for alias in alias_names {
        let target = &file.roles.aliases[alias];
        let role = Role::from_str_role(target).ok_or_else(|| ConfigError::ValidationError {
            field: format!("roles.aliases.{alias}"),
            message: format!("unknown role '{target}'"),
        })?;
        role_aliases.insert(alias, role);
    }

    let config = Config {
        timer: file.timer,
        pacing_ms: file.simulation.pacing_ms,
        our_side,
        db_path: file.database.path,
        data_paths: file.data.resolved(base_dir),
        scoring: file.scoring,
        role_aliases,
    };

    validate(&config)?;

    Ok(config)
}

/// Files a working `config/` directory needs.
const CONFIG_FILES: [&str; 2] = ["draft.toml", "strategy.toml"];

/// Copy any of `draft.toml` and `strategy.toml` missing from `config/` out of
/// `defaults/`. Existing files are never overwritten. Returns the files that
/// were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(vec![]);
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/ nor config/ directory found in {}",
                base_dir.display()
            ),
        });
    }

    let copy_error = |message: String| ConfigError::DefaultsCopyError { message };
    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("failed to create config directory: {e}")))?;

    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.is_file() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| {
            copy_error(format!("failed to copy {} to {}: {e}", source.display(), target.display()))
        })?;
        info!("Copied default {} into config/", name);
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let timer_fields: &[(&str, u32)] = &[
        ("timer.ban_seconds", config.timer.ban_seconds),
        ("timer.pick_seconds", config.timer.pick_seconds),
    ];
    for (name, val) in timer_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be greater than 0".into(),
            });
        }
    }

    if config.data_paths.heroes.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.heroes".into(),
            message: "a hero roster file is required".into(),
        });
    }

    config
        .scoring
        .validate()
        .map_err(|(field, message)| ConfigError::ValidationError { field, message })
}
