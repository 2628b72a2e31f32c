//! Site configuration and API credentials.
//!
//! Two sources feed a build:
//!
//! - **Environment**: the catalog API location and read-only credentials.
//!   These are secrets and never live in a config file.
//! - **`config.toml`** in the site directory: search parameters, grid layout,
//!   lazy-image tuning and colors. The file is optional and sparse; stock
//!   defaults fill in everything it doesn't set.
//!
//! ## Configuration Options
//!
//! ```toml
//! [search]
//! craft = "knitting"
//! query = "sweater"
//! sort = "favorites"
//! language = "en"
//! photo = "yes"
//! availability = "ravelry|inprint|online|free"
//!
//! [grid]
//! title = "Sweaters"
//! cell_size = "600px"
//! gap = "0.5rem"
//! padding = "2rem"
//! max_columns = 3
//! pattern_link_base = "http://www.ravelry.com/patterns/library/"
//!
//! [lazy_image]
//! threshold = 0.1          # Fraction of the image that must be visible
//! root_margin = "0px"
//! blur = "40px"
//! transition_ms = 150
//! width = 640
//! height = 640
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! overlay = "rgba(255, 255, 255, 0.55)"
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! text = "#eeeeee"
//! overlay = "rgba(0, 0, 0, 0.55)"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing required environment variable {0}")]
    MissingEnv(&'static str),
}

pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_USERNAME: &str = "READ_ONLY_USERNAME";
pub const ENV_PASSWORD: &str = "READ_ONLY_PASSWORD";

/// Catalog API location and Basic-auth credentials.
#[derive(Clone)]
pub struct ApiCredentials {
    /// Base URL including the trailing slash, e.g. `https://api.ravelry.com/`.
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ApiCredentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };
        Ok(Self {
            base_url: require(ENV_API_BASE_URL)?,
            username: require(ENV_USERNAME)?,
            password: require(ENV_PASSWORD)?,
        })
    }
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Query parameters sent to `patterns/search.json`.
    pub search: SearchConfig,
    /// Page and grid layout.
    pub grid: GridConfig,
    /// Lazy-image loading and transition settings.
    pub lazy_image: LazyImageConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.lazy_image.threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::Validation(
                "lazy_image.threshold must be in (0, 1]".into(),
            ));
        }
        if self.search.query.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search.query must not be empty".into(),
            ));
        }
        if self.grid.max_columns == 0 {
            return Err(ConfigError::Validation(
                "grid.max_columns must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Search parameters. Defaults reproduce the stock "popular sweaters" query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub craft: String,
    pub query: String,
    pub sort: String,
    pub language: String,
    pub photo: String,
    /// Pipe-separated availability filter.
    pub availability: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            craft: "knitting".to_string(),
            query: "sweater".to_string(),
            sort: "favorites".to_string(),
            language: "en".to_string(),
            photo: "yes".to_string(),
            availability: "ravelry|inprint|online|free".to_string(),
        }
    }
}

impl SearchConfig {
    /// Query pairs in the order they are sent.
    pub fn query_pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("craft", self.craft.as_str()),
            ("query", self.query.as_str()),
            ("sort", self.sort.as_str()),
            ("language", self.language.as_str()),
            ("photo", self.photo.as_str()),
            ("availability", self.availability.as_str()),
        ]
    }
}

/// Grid layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Document title.
    pub title: String,
    /// Width of a square cell (CSS value).
    pub cell_size: String,
    /// Gap between cells (CSS value).
    pub gap: String,
    /// Padding around the grid (CSS value).
    pub padding: String,
    /// Upper bound on responsive columns (1 on phones, 2 on tablets, 3 on desktop).
    pub max_columns: u32,
    /// Prefix joined with each pattern's permalink for the cell link.
    pub pattern_link_base: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            title: "Sweaters".to_string(),
            cell_size: "600px".to_string(),
            gap: "0.5rem".to_string(),
            padding: "2rem".to_string(),
            max_columns: 3,
            pattern_link_base: "http://www.ravelry.com/patterns/library/".to_string(),
        }
    }
}

/// Lazy-image settings shared by every image on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyImageConfig {
    /// Fraction of the image area that must be visible to start the load.
    pub threshold: f64,
    /// Margin around the observation root (CSS value), grows or shrinks the trigger area.
    pub root_margin: String,
    /// Blur radius applied to the placeholder (CSS value).
    pub blur: String,
    /// Opacity transition duration in milliseconds.
    pub transition_ms: u32,
    /// Intrinsic width hint on both layers.
    pub width: u32,
    /// Intrinsic height hint on both layers.
    pub height: u32,
}

impl Default for LazyImageConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "0px".to_string(),
            blur: "40px".to_string(),
            transition_ms: 150,
            width: 640,
            height: 640,
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Backdrop behind the hover caption.
    pub overlay: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            overlay: "rgba(255, 255, 255, 0.55)".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            overlay: "rgba(0, 0, 0, 0.55)".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading
// =============================================================================

/// Load config from `config.toml` in the given directory.
///
/// A missing file yields the stock defaults. Unknown keys and out-of-range
/// values are errors.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let config_path = dir.join("config.toml");
    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        toml::from_str(&content)?
    } else {
        SiteConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# knit-grid Configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.
#
# API credentials are NOT read from this file. Set these instead:
#   API_BASE_URL        e.g. https://api.ravelry.com/ (trailing slash)
#   READ_ONLY_USERNAME
#   READ_ONLY_PASSWORD

# ---------------------------------------------------------------------------
# Search parameters for patterns/search.json
# ---------------------------------------------------------------------------
[search]
craft = "knitting"
query = "sweater"
sort = "favorites"
language = "en"
photo = "yes"
availability = "ravelry|inprint|online|free"

# ---------------------------------------------------------------------------
# Grid layout
# ---------------------------------------------------------------------------
[grid]
title = "Sweaters"
# Width of each square cell.
cell_size = "600px"
gap = "0.5rem"
padding = "2rem"
# 1 column on small screens, 2 from 768px, 3 from 1280px, capped here.
max_columns = 3
pattern_link_base = "http://www.ravelry.com/patterns/library/"

# ---------------------------------------------------------------------------
# Lazy images
# ---------------------------------------------------------------------------
[lazy_image]
# Fraction of the image that must be on screen before the full image loads.
threshold = 0.1
# Grow (positive) or shrink (negative) the trigger area, CSS margin syntax.
root_margin = "0px"
# Blur radius of the thumbnail placeholder.
blur = "40px"
transition_ms = 150
width = 640
height = 640

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
overlay = "rgba(255, 255, 255, 0.55)"

[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
overlay = "rgba(0, 0, 0, 0.55)"
"##
}

/// Generate CSS custom properties from color and grid config.
pub fn generate_theme_css(config: &SiteConfig) -> String {
    let colors = &config.colors;
    let grid = &config.grid;
    let lazy = &config.lazy_image;
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-overlay: {light_overlay};
    --cell-size: {cell_size};
    --grid-gap: {gap};
    --grid-padding: {padding};
    --placeholder-blur: {blur};
    --fade-duration: {fade}ms;
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-overlay: {dark_overlay};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_overlay = colors.light.overlay,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_overlay = colors.dark.overlay,
        cell_size = grid.cell_size,
        gap = grid.gap,
        padding = grid.padding,
        blur = lazy.blur,
        fade = lazy.transition_ms,
    )
}

/// Generate the responsive column rules, capped at `grid.max_columns`.
pub fn generate_grid_css(grid: &GridConfig) -> String {
    let mut css = String::from(".pattern-grid {\n    grid-template-columns: repeat(1, var(--cell-size));\n}");
    for (columns, min_width) in [(2, 768), (3, 1280)] {
        if columns > grid.max_columns {
            break;
        }
        css.push_str(&format!(
            "\n\n@media (min-width: {min_width}px) {{\n    .pattern-grid {{\n        grid-template-columns: repeat({columns}, var(--cell-size));\n    }}\n}}"
        ));
    }
    css
}
