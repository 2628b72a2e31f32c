//! Lazy-loaded images with a blur-up placeholder.
//!
//! - [`observer`]: viewport intersection model with cancellable one-shot watches
//! - [`style`]: the pure `(loading, hovered)` → opacity table and its CSS
//! - [`component`]: the image model and its static markup

pub mod component;
pub mod observer;
pub mod style;

pub use component::{LazyImage, LazyImageProps, render};
pub use observer::{IntersectionEntry, Subscription, Viewport};
pub use style::{LayerOpacity, Phase, opacity_css, visual_state};

/// Browser runtime that drives the rendered markup.
pub const RUNTIME_JS: &str = include_str!("../../static/lazy-image.js");
