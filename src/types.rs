//! Pattern records as returned by the catalog search API.
//!
//! These are deserialized as-is from the API and written unchanged to
//! `patterns.json` between the fetch and generate stages. Every nested field
//! is optional on the wire; the grid decides which records are usable.

use serde::{Deserialize, Serialize};

/// Top-level body of `patterns/search.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub patterns: Vec<PatternRecord>,
}

/// One pattern from the search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// URL slug on the catalog site, appended to `grid.pattern_link_base`.
    #[serde(default)]
    pub permalink: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer: Option<Designer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_photo: Option<Photo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Designer {
    #[serde(default)]
    pub name: String,
}

/// Photo reference attached to a pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Photo {
    /// Medium-resolution image, used as the full-resolution foreground.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium2_url: Option<String>,
    /// Small image, used as the blurred placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl PatternRecord {
    /// The full-resolution photo URL, if the record has a usable photo.
    pub fn full_image_url(&self) -> Option<&str> {
        self.first_photo
            .as_ref()
            .and_then(|p| p.medium2_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    pub fn designer_name(&self) -> &str {
        self.designer.as_ref().map(|d| d.name.as_str()).unwrap_or("")
    }
}
