use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "unset-refs",
    version,
    about = "Review unset object references in a scene and acknowledge the intended ones"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Scene file to review (.json, .yaml or .yml)
    #[arg(long, global = true)]
    pub scene: Option<String>,

    /// Per-user settings store holding acknowledgments (JSON)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Category switches (YAML)
    #[arg(long, global = true)]
    pub settings: Option<String>,

    /// Append session events to this JSONL file
    #[arg(long, global = true)]
    pub event_log: Option<String>,

    /// Path to config file (default: unset-refs.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the scene and list fields to review
    Scan {
        /// Output format: console, json
        #[arg(long, default_value = "console")]
        format: String,

        /// Also list acknowledged fields
        #[arg(long)]
        all: bool,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Stop flagging one field
    Ack {
        /// Object id of the behavior (as printed by `scan`)
        #[arg(long)]
        id: String,

        /// Property path inside the behavior
        #[arg(long)]
        path: String,
    },

    /// Acknowledge every listed field matching a mode
    AckAll {
        /// unset, set or all
        #[arg(long, default_value = "unset")]
        mode: String,
    },

    /// Forget every acknowledgment
    Reset,

    /// Write a reference into a field (omit --value to clear it)
    Assign {
        #[arg(long)]
        id: String,

        #[arg(long)]
        path: String,

        #[arg(long)]
        value: Option<String>,
    },

    /// Show which node an object id points at
    Resolve {
        #[arg(long)]
        id: String,
    },

    /// Inspect or change category switches
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CategoryAction {
    /// Print the category menu with current switches
    List,

    /// Show fields of this category
    Enable { category: String },

    /// Hide fields of this category
    Disable { category: String },

    /// Switch every category on
    AllOn,

    /// Switch every category off
    AllOff,

    /// Only user-authored scripts on
    Defaults,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `unset-refs.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_scene")]
    pub scene: String,

    #[serde(default = "default_store")]
    pub store: String,

    #[serde(default = "default_settings")]
    pub settings: String,

    pub event_log: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scene: default_scene(),
            store: default_store(),
            settings: default_settings(),
            event_log: None,
        }
    }
}

// Serde default helpers
fn default_scene() -> String { "scene.json".to_string() }
fn default_store() -> String { ".unset-refs/user-settings.json".to_string() }
fn default_settings() -> String { ".unset-refs/categories.yaml".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("unset-refs.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

/// Files a command works on, after merging CLI flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub scene: PathBuf,
    pub store: PathBuf,
    pub settings: PathBuf,
    pub event_log: Option<PathBuf>,
}

/// CLI > config file > defaults.
pub fn resolve_paths(cli: &Cli, config: &AppConfig) -> ResolvedPaths {
    let pick = |flag: &Option<String>, configured: &str| {
        PathBuf::from(flag.as_deref().unwrap_or(configured))
    };

    ResolvedPaths {
        scene: pick(&cli.scene, &config.paths.scene),
        store: pick(&cli.store, &config.paths.store),
        settings: pick(&cli.settings, &config.paths.settings),
        event_log: cli
            .event_log
            .as_deref()
            .or(config.paths.event_log.as_deref())
            .map(PathBuf::from),
    }
}

/// Default log level for a `-v` count; `RUST_LOG` still wins.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
