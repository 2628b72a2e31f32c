//! Pattern records to grid cells.
//!
//! A record becomes a cell only when it carries a full-resolution photo URL;
//! the rest are skipped without comment on the page (the CLI lists them).
//! Each cell hands its lazy image exactly the full URL, the thumbnail URL and
//! the alt text.

use crate::config::{GridConfig, LazyImageConfig};
use crate::lazy_image::{self, LazyImage, LazyImageProps, Viewport};
use crate::types::PatternRecord;
use maud::{Markup, html};

/// One rendered grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    /// `{id}-{index}`, unique even if the API repeats a pattern.
    pub key: String,
    pub image: LazyImageProps,
    pub title: String,
    pub designer: String,
    pub link: String,
}

impl GridCell {
    /// DOM id of the cell's lazy image.
    pub fn element_id(&self) -> String {
        format!("pattern-{}", self.key)
    }

    /// Mount this cell's image in a viewport.
    pub fn mount(&self, viewport: &Viewport, threshold: f64) -> LazyImage {
        LazyImage::mount(viewport, self.element_id(), self.image.clone(), threshold)
    }
}

/// Build cells for every record with a usable photo, preserving order.
pub fn build_cells(records: &[PatternRecord], grid: &GridConfig) -> Vec<GridCell> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let full = record.full_image_url()?;
            let photo = record.first_photo.as_ref()?;
            Some(GridCell {
                key: format!("{}-{}", record.id, index),
                image: LazyImageProps::new(
                    full,
                    photo.small_url.clone().unwrap_or_default(),
                    photo.caption.clone().unwrap_or_default(),
                ),
                title: record.name.clone(),
                designer: record.designer_name().to_string(),
                link: format!("{}{}", grid.pattern_link_base, record.permalink),
            })
        })
        .collect()
}

/// Records that produce no cell.
pub fn skipped_records(records: &[PatternRecord]) -> Vec<&PatternRecord> {
    records
        .iter()
        .filter(|r| r.full_image_url().is_none())
        .collect()
}

fn render_cell(cell: &GridCell, lazy: &LazyImageConfig) -> Markup {
    html! {
        div.pattern-cell data-key=(cell.key) {
            (lazy_image::render(&cell.element_id(), &cell.image, lazy.width, lazy.height))
            div.pattern-caption {
                a href=(cell.link) target="_blank" rel="noreferrer" {
                    h2 { (cell.title) }
                }
                @if !cell.designer.is_empty() {
                    h3 { (cell.designer) }
                }
            }
        }
    }
}

/// The grid container. Observer settings ride along as data attributes.
pub fn render_grid(cells: &[GridCell], lazy: &LazyImageConfig) -> Markup {
    html! {
        main.pattern-grid
            data-lazy-threshold=(lazy.threshold)
            data-lazy-root-margin=(lazy.root_margin) {
            @for cell in cells {
                (render_cell(cell, lazy))
            }
        }
        @if cells.is_empty() {
            p.empty-grid { "No patterns with photos matched this search." }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy_image::Phase;
    use crate::types::{Designer, Photo};

    fn record(id: u64, full: Option<&str>) -> PatternRecord {
        PatternRecord {
            id,
            name: format!("Pattern {id}"),
            permalink: format!("pattern-{id}"),
            designer: Some(Designer {
                name: "Designer".into(),
            }),
            first_photo: Some(Photo {
                medium2_url: full.map(str::to_string),
                small_url: Some(format!("https://x/{id}-thumb.jpg")),
                caption: None,
            }),
        }
    }

    #[test]
    fn record_without_full_url_gets_no_cell() {
        let records = vec![
            record(1, Some("https://x/1.jpg")),
            record(2, None),
            PatternRecord {
                id: 3,
                first_photo: None,
                ..Default::default()
            },
        ];
        let cells = build_cells(&records, &GridConfig::default());
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].key, "1-0");

        let skipped: Vec<u64> = skipped_records(&records).iter().map(|r| r.id).collect();
        assert_eq!(skipped, vec![2, 3]);
    }

    #[test]
    fn cell_carries_urls_alt_and_link() {
        let mut r = record(5, Some("https://x/full.jpg"));
        r.first_photo.as_mut().unwrap().caption = Some("Yoke detail".into());
        let cells = build_cells(&[r], &GridConfig::default());
        let cell = &cells[0];
        assert_eq!(cell.image.src, "https://x/full.jpg");
        assert_eq!(cell.image.thumbnail, "https://x/5-thumb.jpg");
        assert_eq!(cell.image.alt, "Yoke detail");
        assert_eq!(
            cell.link,
            "http://www.ravelry.com/patterns/library/pattern-5"
        );
    }

    #[test]
    fn missing_caption_gives_empty_alt() {
        let cells = build_cells(&[record(1, Some("https://x/1.jpg"))], &GridConfig::default());
        assert_eq!(cells[0].image.alt, "");
    }

    #[test]
    fn keys_use_position_to_stay_unique() {
        let records = vec![
            record(9, Some("https://x/a.jpg")),
            record(9, Some("https://x/a.jpg")),
        ];
        let cells = build_cells(&records, &GridConfig::default());
        assert_eq!(cells[0].key, "9-0");
        assert_eq!(cells[1].key, "9-1");
        assert_ne!(cells[0].element_id(), cells[1].element_id());
    }

    #[test]
    fn mounted_cells_load_independently() {
        let records = vec![
            record(1, Some("https://x/1.jpg")),
            record(2, Some("https://x/2.jpg")),
        ];
        let cells = build_cells(&records, &GridConfig::default());
        let vp = Viewport::new();
        let images: Vec<LazyImage> = cells.iter().map(|c| c.mount(&vp, 0.1)).collect();

        vp.set_visibility(&cells[1].element_id(), 1.0);
        assert_eq!(images[0].phase(), Phase::Pending);
        assert_eq!(images[1].foreground_src().as_deref(), Some("https://x/2.jpg"));

        drop(images);
        assert_eq!(vp.total_watches(), 0);
    }

    #[test]
    fn grid_markup_has_cells_and_observer_settings() {
        let cells = build_cells(&[record(1, Some("https://x/1.jpg"))], &GridConfig::default());
        let html = render_grid(&cells, &LazyImageConfig::default()).into_string();
        assert!(html.contains(r#"data-lazy-threshold="0.1""#));
        assert!(html.contains(r#"id="pattern-1-0""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains("<h2>Pattern 1</h2>"));
        assert!(!html.contains("empty-grid"));
    }

    #[test]
    fn empty_grid_shows_notice() {
        let html = render_grid(&[], &LazyImageConfig::default()).into_string();
        assert!(html.contains("empty-grid"));
    }
}
