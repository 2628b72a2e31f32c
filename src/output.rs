//! CLI output formatting for each stage.
//!
//! Every pattern is shown by positional index and name, with details on
//! indented lines beneath it:
//!
//! ## Fetch
//!
//! ```text
//! Patterns
//! 001 Flax (Tin Can Knits)
//!     Photo: https://images.example.com/flax_medium2.jpg
//! 002 Untitled Pullover
//!     Photo: none (will be skipped)
//!
//! Fetched 2 patterns, 1 with photos
//! ```
//!
//! ## Generate
//!
//! ```text
//! Grid → dist/index.html
//! 001 Flax
//!     Image: pattern-1234-0
//!
//! Skipped
//!     #5678 Untitled Pullover (no photo)
//!
//! Generated 1 cell, skipped 1 pattern
//! ```
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout.

use crate::generate::GenerateSummary;
use crate::types::SearchResponse;

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

pub fn format_fetch_output(response: &SearchResponse) -> Vec<String> {
    let mut lines = vec!["Patterns".to_string()];
    let mut with_photos = 0;
    for (i, record) in response.patterns.iter().enumerate() {
        let designer = record.designer_name();
        if designer.is_empty() {
            lines.push(format!("{} {}", format_index(i + 1), record.name));
        } else {
            lines.push(format!("{} {} ({})", format_index(i + 1), record.name, designer));
        }
        match record.full_image_url() {
            Some(url) => {
                with_photos += 1;
                lines.push(format!("{}Photo: {}", indent(1), url));
            }
            None => lines.push(format!("{}Photo: none (will be skipped)", indent(1))),
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Fetched {}, {} with photos",
        plural(response.patterns.len(), "pattern"),
        with_photos
    ));
    lines
}

pub fn print_fetch_output(response: &SearchResponse) {
    for line in format_fetch_output(response) {
        println!("{}", line);
    }
}

pub fn format_generate_output(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = vec![format!("Grid → {}", summary.index_path.display())];
    for (i, cell) in summary.cells.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), cell.title));
        lines.push(format!("{}Image: {}", indent(1), cell.element_id()));
    }
    if !summary.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for (id, name) in &summary.skipped {
            lines.push(format!("{}#{} {} (no photo)", indent(1), id, name));
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, skipped {}",
        plural(summary.cells.len(), "cell"),
        plural(summary.skipped.len(), "pattern")
    ));
    lines
}

pub fn print_generate_output(summary: &GenerateSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}
