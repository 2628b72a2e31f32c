//! The lazy image: a blurred thumbnail placeholder under a deferred
//! full-resolution foreground.
//!
//! [`LazyImage`] is the event-driven model of one mounted image. It watches its
//! element through a [`Viewport`], assigns the foreground source on the first
//! threshold crossing, and then stops watching. [`render`] produces the static
//! markup the browser runtime (`static/lazy-image.js`) drives the same way.

use super::observer::{Subscription, Viewport};
use super::style::{LayerOpacity, Phase};
use maud::{Markup, PreEscaped, html};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Attributes the component sets itself. Pass-through values can't replace them.
const RESERVED_ATTRS: [&str; 6] = ["src", "alt", "class", "id", "data-src", "loading"];

/// Inputs handed over by the grid for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LazyImageProps {
    /// Full-resolution image, loaded only once visible.
    pub src: String,
    /// Small image shown blurred until the full image arrives. May be empty.
    pub thumbnail: String,
    pub alt: String,
    /// Extra attributes for the foreground `<img>`, e.g. `width`/`height` hints.
    pub attrs: BTreeMap<String, String>,
}

impl LazyImageProps {
    pub fn new(src: impl Into<String>, thumbnail: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            thumbnail: thumbnail.into(),
            alt: alt.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Default)]
struct ImageState {
    loading: bool,
    loaded: bool,
    failed: bool,
    hovered: bool,
    foreground_src: Option<String>,
    /// Number of times a source was assigned to the foreground.
    source_assignments: u32,
    subscription: Option<Subscription>,
}

/// One mounted lazy image.
///
/// Dropping it (or calling [`unmount`](Self::unmount)) cancels the observation.
pub struct LazyImage {
    element_id: String,
    props: LazyImageProps,
    threshold: f64,
    viewport: Viewport,
    state: Rc<RefCell<ImageState>>,
}

impl LazyImage {
    /// Mount an image and start watching `element_id` in `viewport`.
    pub fn mount(
        viewport: &Viewport,
        element_id: impl Into<String>,
        props: LazyImageProps,
        threshold: f64,
    ) -> Self {
        let image = Self {
            element_id: element_id.into(),
            props,
            threshold,
            viewport: viewport.clone(),
            state: Rc::new(RefCell::new(ImageState::default())),
        };
        image.watch();
        image
    }

    fn watch(&self) {
        let weak = Rc::downgrade(&self.state);
        let src = self.props.src.clone();
        let element_id = self.element_id.clone();
        let subscription = self
            .viewport
            .observe(&self.element_id, self.threshold, move |entry| {
                if !entry.is_intersecting {
                    return;
                }
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let mut state = state.borrow_mut();
                state.loading = true;
                state.foreground_src = Some(src.clone());
                state.source_assignments += 1;
                tracing::debug!(element = %element_id, ratio = entry.ratio, "lazy image visible, loading");
                if let Some(sub) = &state.subscription {
                    sub.cancel();
                }
            });
        let mut state = self.state.borrow_mut();
        if let Some(old) = state.subscription.replace(subscription) {
            old.cancel();
        }
    }

    /// The foreground finished loading.
    ///
    /// Ignored when no source has been assigned yet.
    pub fn on_load(&self) {
        let mut state = self.state.borrow_mut();
        if state.foreground_src.is_none() {
            return;
        }
        state.loading = false;
        state.loaded = true;
    }

    /// The foreground failed to load. The placeholder stays up.
    pub fn on_error(&self) {
        let mut state = self.state.borrow_mut();
        if state.foreground_src.is_none() {
            return;
        }
        state.failed = true;
        tracing::warn!(element = %self.element_id, src = %self.props.src, "lazy image failed to load");
    }

    pub fn set_hovered(&self, hovered: bool) {
        self.state.borrow_mut().hovered = hovered;
    }

    /// Point the image at a new full-resolution URL.
    ///
    /// The old observation is cancelled and the image goes back to pending,
    /// so the new URL is also deferred until visible.
    pub fn set_src(&mut self, src: impl Into<String>) {
        let src = src.into();
        if src == self.props.src {
            return;
        }
        self.props.src = src;
        {
            let mut state = self.state.borrow_mut();
            if let Some(old) = state.subscription.take() {
                old.cancel();
            }
            state.loading = false;
            state.loaded = false;
            state.failed = false;
            state.foreground_src = None;
        }
        self.watch();
    }

    /// Remove the image from the page.
    pub fn unmount(self) {}

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn props(&self) -> &LazyImageProps {
        &self.props
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn is_hovered(&self) -> bool {
        self.state.borrow().hovered
    }

    pub fn has_failed(&self) -> bool {
        self.state.borrow().failed
    }

    /// Source currently assigned to the foreground, `None` before first visibility.
    pub fn foreground_src(&self) -> Option<String> {
        self.state.borrow().foreground_src.clone()
    }

    pub fn source_assignments(&self) -> u32 {
        self.state.borrow().source_assignments
    }

    /// Whether the element is still being watched.
    pub fn is_observing(&self) -> bool {
        self.state
            .borrow()
            .subscription
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    pub fn phase(&self) -> Phase {
        let state = self.state.borrow();
        if state.loaded {
            Phase::Loaded
        } else if state.foreground_src.is_some() {
            Phase::Loading
        } else {
            Phase::Pending
        }
    }

    pub fn opacity(&self) -> LayerOpacity {
        self.phase().opacity(self.is_hovered())
    }
}

impl Drop for LazyImage {
    fn drop(&mut self) {
        let subscription = self.state.borrow_mut().subscription.take();
        if let Some(sub) = subscription {
            sub.cancel();
        }
        self.viewport.forget(&self.element_id);
    }
}

fn is_valid_attr_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

fn escape(value: &str) -> String {
    html! { (value) }.into_string()
}

/// Foreground `<img>` with pass-through attributes.
///
/// Maud has no attribute spread, so the tag is assembled here with every
/// value escaped. `src` is deliberately absent.
fn foreground_tag(
    props: &LazyImageProps,
    width: u32,
    height: u32,
) -> PreEscaped<String> {
    let mut attrs: BTreeMap<&str, String> = BTreeMap::new();
    attrs.insert("width", width.to_string());
    attrs.insert("height", height.to_string());
    for (name, value) in &props.attrs {
        let lower = name.to_ascii_lowercase();
        if RESERVED_ATTRS.contains(&lower.as_str()) || !is_valid_attr_name(name) {
            tracing::warn!(attribute = %name, "dropping pass-through attribute");
            continue;
        }
        attrs.insert(name.as_str(), value.clone());
    }

    let mut tag = format!(
        r#"<img class="lazy-image__foreground" alt="{}" data-src="{}""#,
        escape(&props.alt),
        escape(&props.src),
    );
    for (name, value) in attrs {
        tag.push_str(&format!(r#" {}="{}""#, name, escape(&value)));
    }
    tag.push('>');
    PreEscaped(tag)
}

/// Static markup for one image in the pending phase.
pub fn render(element_id: &str, props: &LazyImageProps, width: u32, height: u32) -> Markup {
    html! {
        div.lazy-image id=(element_id) data-state=(Phase::Pending.as_str()) {
            (foreground_tag(props, width, height))
            @if !props.thumbnail.is_empty() {
                img.lazy-image__background src=(props.thumbnail) alt="" aria-hidden="true" width=(width) height=(height);
            }
        }
    }
}
