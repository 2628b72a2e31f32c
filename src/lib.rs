//! # knit-grid
//!
//! A static page of knitting patterns, fetched from a pattern catalog API and
//! shown as a responsive grid of lazily loaded, blur-up images.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Fetch     API       →  patterns.json   (one authenticated search)
//! 2. Generate  patterns  →  dist/index.html (grid + inline CSS/JS)
//! ```
//!
//! The intermediate file is the raw API response, so a page can be
//! regenerated (new layout, new colors) without touching the network.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | Stage 1: builds the search URL, performs the request, saves the response |
//! | [`generate`] | Stage 2: renders the page (or the error page) with Maud |
//! | [`grid`] | Records → grid cells; skips records without a photo |
//! | [`lazy_image`] | Observer-driven image loading, placeholder swap and hover states |
//! | [`config`] | Environment credentials, `config.toml` loading, CSS generation |
//! | [`types`] | Pattern records as returned by the API |
//! | [`output`] | CLI output formatting |
//!
//! # Lazy Images
//!
//! Each cell holds two stacked images: a blurred thumbnail that is always
//! present, and a foreground with no `src` until the cell is at least 10%
//! visible. Then the full image is requested once and the observer lets go.
//! When it finishes loading the layers cross-fade. Hovering a loaded cell
//! brings the blurred thumbnail back behind the caption.
//!
//! The browser side is a few lines of script in `static/lazy-image.js`. The
//! same behavior is modeled in [`lazy_image::LazyImage`] against a
//! [`lazy_image::Viewport`], which is what the tests exercise. The CSS opacity
//! rules are generated from [`lazy_image::visual_state`], so the page and
//! the model share one table.

pub mod config;
pub mod fetch;
pub mod generate;
pub mod grid;
pub mod lazy_image;
pub mod output;
pub mod types;
