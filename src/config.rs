//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orbitmap/orbitmap.toml`
//! 3. Local config: `<document_dir>/.orbitmap.toml` (next to the node document)
//! 4. Environment variables: `ORBITMAP__*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{HierarchyRules, LayoutConfig, OrbitConfig, Point, RingTier};

pub const LOCAL_CONFIG_FILE: &str = ".orbitmap.toml";
pub const GLOBAL_CONFIG_FILE: &str = "orbitmap.toml";

/// Drawing area; its midpoint is the layout center.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl ViewportConfig {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Raw ring config: `None` means "not specified, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOrbitConfig {
    pub rings: Option<Vec<RingTier>>,
    pub increment: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutConfig {
    pub primary: RawOrbitConfig,
    pub secondary: RawOrbitConfig,
    pub tertiary: RawOrbitConfig,
    pub max_rings: Option<usize>,
    pub tolerance: Option<f64>,
    pub drag_growth_rings: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawViewportConfig {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLimits {
    pub root: Option<usize>,
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
    pub tertiary: Option<usize>,
}

/// Raw settings for intermediate parsing.
///
/// Used during layered config merging to tell "not specified" (`None`)
/// apart from an explicit value.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub nodes_file: Option<PathBuf>,
    pub viewport: RawViewportConfig,
    pub layout: RawLayoutConfig,
    pub limits: RawLimits,
}

fn merge_orbit(base: &OrbitConfig, overlay: &RawOrbitConfig) -> OrbitConfig {
    OrbitConfig {
        // Ring lists replace, never union: a partial ring list is meaningless
        rings: overlay.rings.clone().unwrap_or_else(|| base.rings.clone()),
        increment: overlay.increment.unwrap_or(base.increment),
    }
}

/// Unified configuration for orbitmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Node document (default: orbitmap.json)
    pub nodes_file: PathBuf,
    pub viewport: ViewportConfig,
    /// Ring tiers and placement policy
    pub layout: LayoutConfig,
    /// Maximum child count per parent type
    pub limits: HierarchyRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nodes_file: PathBuf::from("orbitmap.json"),
            viewport: ViewportConfig::default(),
            layout: LayoutConfig::default(),
            limits: HierarchyRules::default(),
        }
    }
}

/// Get the XDG config directory for orbitmap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orbitmap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Get the path to the local config file in a document directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
}

/// Directory holding a document's local config; "." for a bare file name.
pub fn document_dir(document: &Path) -> PathBuf {
    document
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Layout parameters with the center taken from the viewport.
    pub fn layout_config(&self) -> LayoutConfig {
        self.layout.clone().with_center(self.viewport.center())
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.nodes_file = expand_path(&self.nodes_file);
    }

    /// Merge overlay config onto self (base).
    ///
    /// Scalars: overlay wins if Some. Ring lists: overlay replaces.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        let layout = &overlay.layout;
        let limits = &overlay.limits;
        Self {
            nodes_file: overlay
                .nodes_file
                .clone()
                .unwrap_or_else(|| self.nodes_file.clone()),
            viewport: ViewportConfig {
                width: overlay.viewport.width.unwrap_or(self.viewport.width),
                height: overlay.viewport.height.unwrap_or(self.viewport.height),
            },
            layout: LayoutConfig {
                center: self.layout.center,
                primary: merge_orbit(&self.layout.primary, &layout.primary),
                secondary: merge_orbit(&self.layout.secondary, &layout.secondary),
                tertiary: merge_orbit(&self.layout.tertiary, &layout.tertiary),
                max_rings: layout.max_rings.or(self.layout.max_rings),
                tolerance: layout.tolerance.unwrap_or(self.layout.tolerance),
                drag_growth_rings: layout
                    .drag_growth_rings
                    .unwrap_or(self.layout.drag_growth_rings),
            },
            limits: HierarchyRules {
                root: limits.root.unwrap_or(self.limits.root),
                primary: limits.primary.unwrap_or(self.limits.primary),
                secondary: limits.secondary.unwrap_or(self.limits.secondary),
                tertiary: limits.tertiary.unwrap_or(self.limits.tertiary),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a local `.orbitmap.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/orbitmap/orbitmap.toml`
    /// 3. Local config: `<local_dir>/.orbitmap.toml`
    /// 4. Environment variables: `ORBITMAP__*`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config next to the document
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Settings for a node document and the document's path.
    ///
    /// With no explicit `document`, the path comes from the global and env
    /// layers. Either way the local layer is read from the document's own
    /// directory, so a local `nodes_file` never redirects the document.
    pub fn for_document(document: Option<&Path>) -> Result<(Self, PathBuf), ApplicationError> {
        let path = match document {
            Some(path) => path.to_path_buf(),
            None => Self::load(None)?.nodes_file,
        };
        let settings = Self::load(Some(&document_dir(&path)))?;
        debug!(path = %path.display(), "Resolved node document");
        Ok((settings, path))
    }

    /// Load a single TOML file on top of the defaults, without env overrides.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        let mut settings = Self::default().merge_with(&raw);
        settings.expand_paths();
        settings.validate()?;
        Ok(settings)
    }

    /// Apply ORBITMAP__* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ORBITMAP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("nodes_file") {
            settings.nodes_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_float("viewport.width") {
            settings.viewport.width = val;
        }
        if let Ok(val) = config.get_float("viewport.height") {
            settings.viewport.height = val;
        }
        if let Ok(val) = config.get::<usize>("layout.max_rings") {
            settings.layout.max_rings = Some(val);
        }
        if let Ok(val) = config.get_float("layout.tolerance") {
            settings.layout.tolerance = val;
        }
        if let Ok(val) = config.get::<usize>("layout.drag_growth_rings") {
            settings.layout.drag_growth_rings = val;
        }
        for (key, orbit) in [
            ("primary", &mut settings.layout.primary),
            ("secondary", &mut settings.layout.secondary),
            ("tertiary", &mut settings.layout.tertiary),
        ] {
            if let Ok(val) = config.get_float(&format!("layout.{key}.increment")) {
                orbit.increment = val;
            }
        }
        for (key, limit) in [
            ("root", &mut settings.limits.root),
            ("primary", &mut settings.limits.primary),
            ("secondary", &mut settings.limits.secondary),
            ("tertiary", &mut settings.limits.tertiary),
        ] {
            if let Ok(val) = config.get::<usize>(&format!("limits.{key}")) {
                *limit = val;
            }
        }

        Ok(settings)
    }

    /// Reject settings the layout engine cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let invalid = |message: String| ApplicationError::Config { message };

        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(invalid(format!(
                "viewport must be positive, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if !(self.layout.tolerance > 0.0) {
            return Err(invalid(format!(
                "layout.tolerance must be positive, got {}",
                self.layout.tolerance
            )));
        }
        if self.layout.max_rings == Some(0) {
            return Err(invalid("layout.max_rings must be at least 1".into()));
        }
        for (name, orbit) in [
            ("primary", &self.layout.primary),
            ("secondary", &self.layout.secondary),
            ("tertiary", &self.layout.tertiary),
        ] {
            orbit
                .validate()
                .map_err(|e| invalid(format!("layout.{name}: {e}")))?;
            // Grown rings must be further apart than two tolerances
            if orbit.increment <= 2.0 * self.layout.tolerance {
                return Err(invalid(format!(
                    "layout.{name}.increment ({}) must exceed twice the tolerance ({})",
                    orbit.increment, self.layout.tolerance
                )));
            }
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# orbitmap configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/orbitmap/orbitmap.toml
#   Local:  .orbitmap.toml next to the node document
#   Env:    ORBITMAP__* environment variables, e.g. ORBITMAP__LIMITS__ROOT=10
#
# Ring lists from a higher layer replace lower ones entirely.

# Node document
# nodes_file = "orbitmap.json"

[viewport]
# Layout center is the viewport midpoint
# width = 1200
# height = 800

[layout]
# Cap on rings scanned per node; unset grows rings without bound
# max_rings = 10
# Points closer than this (px) count as the same position
# tolerance = 0.5
# Grown rings offered as extra drag targets
# drag_growth_rings = 1

[layout.primary]
# increment = 100
# rings = [
#   { radius = 180, slots = 6 },
#   { radius = 280, slots = 8 },
#   { radius = 380, slots = 12 },
# ]

[layout.secondary]
# increment = 30
# rings = [{ radius = 60, slots = 5 }]

[layout.tertiary]
# increment = 30
# rings = [{ radius = 95, slots = 6 }]

[limits]
# Maximum children per parent type
# root = 8
# primary = 5
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
