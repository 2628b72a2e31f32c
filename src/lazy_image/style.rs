//! Layer opacity as a pure function of load and hover state.
//!
//! | State                       | Foreground | Background |
//! |-----------------------------|-----------:|-----------:|
//! | loading                     |         0% |        80% |
//! | loaded, not hovered         |       100% |         0% |
//! | loaded, hovered             |         0% |        50% |
//!
//! The browser never runs this code. [`opacity_css`] compiles the same table
//! into attribute-selector rules for the page.

/// Opacity of each layer, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerOpacity {
    pub foreground: u8,
    pub background: u8,
}

pub const fn visual_state(loading: bool, hovered: bool) -> LayerOpacity {
    match (loading, hovered) {
        (true, _) => LayerOpacity {
            foreground: 0,
            background: 80,
        },
        (false, false) => LayerOpacity {
            foreground: 100,
            background: 0,
        },
        (false, true) => LayerOpacity {
            foreground: 0,
            background: 50,
        },
    }
}

/// Lifecycle of one image, mirrored in the container's `data-state` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not yet visible; no source assigned.
    Pending,
    /// Source assigned, waiting for the load event.
    Loading,
    Loaded,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Pending, Phase::Loading, Phase::Loaded];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Loading => "loading",
            Phase::Loaded => "loaded",
        }
    }

    /// Whether the placeholder should dominate. True until the full image is in.
    pub fn awaiting_full_image(self) -> bool {
        self != Phase::Loaded
    }

    pub fn opacity(self, hovered: bool) -> LayerOpacity {
        visual_state(self.awaiting_full_image(), hovered)
    }
}

fn percent(value: u8) -> String {
    match value {
        0 => "0".to_string(),
        100 => "1".to_string(),
        v => format!("{:.2}", f64::from(v) / 100.0)
            .trim_end_matches('0')
            .to_string(),
    }
}

fn layer_rules(selector: &str, opacity: LayerOpacity) -> String {
    format!(
        "{selector} .lazy-image__foreground {{ opacity: {fg}; }}\n{selector} .lazy-image__background {{ opacity: {bg}; }}\n",
        fg = percent(opacity.foreground),
        bg = percent(opacity.background),
    )
}

/// CSS rules for every phase, plus hover rules scoped to `hover_group`.
///
/// Hover is taken from the enclosing cell so the caption overlay and the
/// image react to the same pointer.
pub fn opacity_css(hover_group: &str) -> String {
    let mut css = String::new();
    for phase in Phase::ALL {
        let selector = format!(".lazy-image[data-state=\"{}\"]", phase.as_str());
        css.push_str(&layer_rules(&selector, phase.opacity(false)));
        if !phase.awaiting_full_image() {
            let hovered = format!("{hover_group}:hover {selector}");
            css.push_str(&layer_rules(&hovered, phase.opacity(true)));
        }
    }
    css
}
