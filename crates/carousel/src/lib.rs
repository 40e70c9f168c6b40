//! Radial carousel core.
//!
//! Lays out a duplicated item list on a circle whose center sits mostly off
//! the left edge of the viewport, rotates it from an eased scroll offset and
//! drives a hover image that follows the pointer with a lag. Rendering goes
//! through the [`Scene`] trait so any backend (cairo, a DOM bridge, a test
//! recorder) can host it.
//!
//! The core never reads a clock. Every operation that can arm a timer takes
//! the current [`std::time::Instant`], and hosts call
//! [`RadialCarousel::frame`] once per display frame while
//! [`RadialCarousel::is_active`] reports pending work.

pub mod carousel;
pub mod follow;
pub mod geometry;
pub mod item;
pub mod macros;
pub mod registry;
pub mod scene;
pub mod scroll;
pub mod timer;
pub mod tuning;

pub use carousel::{CarouselRuntimeState, Key, Navigate, RadialCarousel};
pub use geometry::{CircleGeometry, DeviceClass, Layout, Placement, Point, Size, Viewport};
pub use item::{CarouselItem, EscapedKey, ImageRef, ItemSequence, Label, NavigationKey};
pub use scene::{NodeId, NodeKind, Positioning, Reveal, Scene, SceneError};
pub use tuning::Tuning;

pub const HOVER_IMAGE_SIZE: Size = Size::new(400.0, 300.0);
pub const CENTER_IMAGE_MAX_WIDTH: f64 = 280.0;
pub const CENTER_IMAGE_WIDTH_RATIO: f64 = 0.75; // of viewport width
pub const CENTER_IMAGE_ASPECT: f64 = 1.5; // height / width (4:6)
pub const LABEL_FONT_SIZE_DESKTOP: f64 = 48.0;
pub const LABEL_FONT_SIZE_MOBILE: f64 = 32.0;
pub const LABEL_OPACITY_EMPHASIZED: f64 = 1.0;
pub const LABEL_OPACITY_MUTED: f64 = 0.6;
