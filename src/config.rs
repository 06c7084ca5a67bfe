//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/comptrack/comptrack.toml`
//! 3. Local config: `<project_dir>/.comptrack.toml`
//! 4. Environment variables: `COMPTRACK_*` prefix, `__` between nested keys

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Bounds, LayoutConfig, UnresolvedParentPolicy};

pub const APP_NAME: &str = "comptrack";
pub const LOCAL_CONFIG_FILE: &str = ".comptrack.toml";
const ENV_PREFIX: &str = "COMPTRACK";

/// How rows encode their parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyVariant {
    /// Parent pointer by surrogate id.
    #[default]
    Supervisor,
    /// Rows carry a division label; drops may move employees between divisions.
    Division,
}

impl fmt::Display for HierarchyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HierarchyVariant::Supervisor => f.write_str("supervisor"),
            HierarchyVariant::Division => f.write_str("division"),
        }
    }
}

impl FromStr for HierarchyVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supervisor" => Ok(Self::Supervisor),
            "division" => Ok(Self::Division),
            other => Err(format!("unknown hierarchy variant: {other}")),
        }
    }
}

/// Canvas the layout is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl CanvasConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Months after the last salary change before a review is due.
    pub months_without_raise: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            months_without_raise: 10,
        }
    }
}

/// Unified configuration for comptrack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Flat relation file (relative paths resolve against the project dir)
    pub store_path: PathBuf,
    pub variant: HierarchyVariant,
    pub unresolved_parent: UnresolvedParentPolicy,
    pub layout: LayoutConfig,
    pub canvas: CanvasConfig,
    pub review: ReviewConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("hierarchy.json"),
            variant: HierarchyVariant::default(),
            unresolved_parent: UnresolvedParentPolicy::default(),
            layout: LayoutConfig::default(),
            canvas: CanvasConfig::default(),
            review: ReviewConfig::default(),
        }
    }
}

/// Get the XDG config directory for comptrack.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(format!("{APP_NAME}.toml")))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(LOCAL_CONFIG_FILE)
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), project_dir)
    }

    /// Load settings from an explicit global config location.
    pub fn load_from(
        global: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(global_path) = global {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path.to_path_buf()));
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                builder = builder.add_source(File::from(local_path));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.anchor_store_path(project_dir);
        Ok(settings)
    }

    /// Replace the store path the way a configured one is treated: expanded,
    /// then anchored at `project_dir` when relative.
    pub fn override_store_path(&mut self, store: impl Into<PathBuf>, project_dir: Option<&Path>) {
        self.store_path = store.into();
        self.anchor_store_path(project_dir);
    }

    fn anchor_store_path(&mut self, project_dir: Option<&Path>) {
        self.expand_paths();
        if let Some(dir) = project_dir {
            self.store_path = self.resolve_store_path(dir);
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        let raw = self.store_path.to_string_lossy().to_string();
        if let Ok(expanded) = shellexpand::full(&raw) {
            self.store_path = PathBuf::from(expanded.as_ref());
        }
    }

    /// Store path anchored at `project_dir` when relative.
    pub fn resolve_store_path(&self, project_dir: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            project_dir.join(&self.store_path)
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# comptrack configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/comptrack/comptrack.toml
#   Local:  <project_dir>/.comptrack.toml
#   Env:    COMPTRACK_* environment variables, e.g. COMPTRACK_LAYOUT__POLICY=stacked

# Flat employee/supervisor relation (JSON array or {"global": [...], "domestic": [...]})
# store_path = "hierarchy.json"

# Parent encoding: "supervisor" (by id) or "division" (division label + supervisor)
# variant = "supervisor"

# Rows whose supervisor does not exist: "error" rejects the data, "promote" makes them roots
# unresolved_parent = "error"

[layout]
# "proportional" (horizontal tree, one band per root) or "stacked" (leaf columns)
# policy = "proportional"
# node_width = 120.0
# node_height = 40.0
# level_gap = 40.0
# sibling_gap = 16.0
# stack_offset = 24.0
# stack_gap = 8.0
# margin = 20.0

[canvas]
# width = 1200.0
# height = 800.0

[review]
# Months without a salary change before a raise review is due
# months_without_raise = 10
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
