//! HTML page generation.
//!
//! Stage 2 of the build. Reads `patterns.json` written by the fetch stage and
//! renders a single self-contained `index.html`: the pattern grid, inline CSS
//! and the inline lazy-image runtime.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! └── index.html     # Grid page, or the error page if the fetch failed
//! ```
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: layout and caption overlay
//! - `static/lazy-image.js`: observer-driven loading
//!
//! Colors, grid sizes and the layer opacity rules are generated from config
//! and prepended to the static stylesheet.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.

use crate::config::{self, SiteConfig};
use crate::grid::{self, GridCell};
use crate::lazy_image;
use crate::types::{PatternRecord, SearchResponse};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// What a generate run produced, for CLI output.
#[derive(Debug)]
pub struct GenerateSummary {
    pub index_path: PathBuf,
    pub cells: Vec<GridCell>,
    /// `(id, name)` of records skipped for lack of a photo.
    pub skipped: Vec<(u64, String)>,
}

/// Read the fetch stage's output.
pub fn load_patterns(path: &Path) -> Result<SearchResponse, GenerateError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Render `index.html` from a saved search response.
pub fn generate(
    patterns_path: &Path,
    output_dir: &Path,
    config: &SiteConfig,
) -> Result<GenerateSummary, GenerateError> {
    let response = load_patterns(patterns_path)?;
    generate_from_records(&response.patterns, output_dir, config)
}

pub fn generate_from_records(
    records: &[PatternRecord],
    output_dir: &Path,
    config: &SiteConfig,
) -> Result<GenerateSummary, GenerateError> {
    let cells = grid::build_cells(records, &config.grid);
    let skipped = grid::skipped_records(records)
        .into_iter()
        .map(|r| (r.id, r.name.clone()))
        .collect();

    let css = build_css(config);
    let page = render_grid_page(&cells, config, &css);

    fs::create_dir_all(output_dir)?;
    let index_path = output_dir.join("index.html");
    fs::write(&index_path, page.into_string())?;
    tracing::info!(cells = cells.len(), path = %index_path.display(), "wrote grid page");

    Ok(GenerateSummary {
        index_path,
        cells,
        skipped,
    })
}

/// Write the fallback page shown when the patterns could not be loaded.
pub fn write_error_page(
    output_dir: &Path,
    config: &SiteConfig,
    message: &str,
) -> Result<PathBuf, GenerateError> {
    let css = build_css(config);
    let page = render_error_page(message, config, &css);
    fs::create_dir_all(output_dir)?;
    let index_path = output_dir.join("index.html");
    fs::write(&index_path, page.into_string())?;
    tracing::warn!(path = %index_path.display(), "wrote error page");
    Ok(index_path)
}

/// Generated rules first, static stylesheet last.
pub fn build_css(config: &SiteConfig) -> String {
    format!(
        "{}\n\n{}\n\n{}\n{}",
        config::generate_theme_css(config),
        config::generate_grid_css(&config.grid),
        lazy_image::opacity_css(".pattern-cell"),
        CSS_STATIC
    )
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_grid_page(cells: &[GridCell], config: &SiteConfig, css: &str) -> Markup {
    let content = html! {
        (grid::render_grid(cells, &config.lazy_image))
        script { (PreEscaped(lazy_image::RUNTIME_JS)) }
    };
    base_document(&config.grid.title, css, content)
}

fn render_error_page(message: &str, config: &SiteConfig, css: &str) -> Markup {
    let content = html! {
        main.error-page {
            h1 { "Patterns unavailable" }
            p { "The pattern catalog could not be loaded." }
            pre { (message) }
        }
    };
    base_document(&config.grid.title, css, content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Photo;
    use tempfile::TempDir;

    fn records() -> Vec<PatternRecord> {
        vec![
            PatternRecord {
                id: 1,
                name: "Flax".into(),
                permalink: "flax".into(),
                first_photo: Some(Photo {
                    medium2_url: Some("https://x/full.jpg".into()),
                    small_url: Some("https://x/thumb.jpg".into()),
                    caption: Some("Front".into()),
                }),
                ..Default::default()
            },
            PatternRecord {
                id: 2,
                name: "No Photo".into(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn base_document_includes_doctype() {
        let doc = base_document("Test", "body {}", html! { p { "x" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Test</title>"));
    }

    #[test]
    fn css_contains_generated_and_static_rules() {
        let css = build_css(&SiteConfig::default());
        assert!(css.contains("--color-bg"));
        assert!(css.contains("data-state=\"loaded\""));
        assert!(css.contains(".pattern-cell {"));
    }

    #[test]
    fn css_is_not_escaped_in_style_tag() {
        let css = build_css(&SiteConfig::default());
        let doc = base_document("T", &css, html! {}).into_string();
        assert!(doc.contains(".lazy-image[data-state=\"loaded\"]"));
    }

    #[test]
    fn generate_writes_index_with_runtime() {
        let tmp = TempDir::new().unwrap();
        let summary =
            generate_from_records(&records(), tmp.path(), &SiteConfig::default()).unwrap();

        assert_eq!(summary.cells.len(), 1);
        assert_eq!(summary.skipped, vec![(2, "No Photo".to_string())]);

        let html = fs::read_to_string(&summary.index_path).unwrap();
        assert!(html.contains("IntersectionObserver"));
        assert!(html.contains(r#"data-src="https://x/full.jpg""#));
        assert!(!html.contains("No Photo"));
    }

    #[test]
    fn generate_reads_patterns_file() {
        let tmp = TempDir::new().unwrap();
        let patterns = tmp.path().join("patterns.json");
        let response = SearchResponse {
            patterns: records(),
        };
        fs::write(&patterns, serde_json::to_string(&response).unwrap()).unwrap();

        let out = tmp.path().join("dist");
        let summary = generate(&patterns, &out, &SiteConfig::default()).unwrap();
        assert!(summary.index_path.exists());
    }

    #[test]
    fn generate_missing_patterns_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = generate(
            &tmp.path().join("missing.json"),
            tmp.path(),
            &SiteConfig::default(),
        );
        assert!(matches!(result, Err(GenerateError::Io(_))));
    }

    #[test]
    fn error_page_shows_message_escaped() {
        let tmp = TempDir::new().unwrap();
        let path = write_error_page(
            tmp.path(),
            &SiteConfig::default(),
            "Failed to fetch data: API responded 500 <Internal>",
        )
        .unwrap();
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("Patterns unavailable"));
        assert!(html.contains("&lt;Internal&gt;"));
        assert!(!html.contains("IntersectionObserver"));
    }
}
