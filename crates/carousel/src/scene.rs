use crate::geometry::{Point, Size};
use crate::item::{ImageRef, Label};
use derive_more::{Display, From, Into};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("#{_0}")]
pub struct NodeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Label,
    ImageLayer,
    CenterImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Positioning {
    /// On the circle: the position is the left-center anchor and the node is
    /// rotated by the slot angle.
    #[default]
    Flow,
    /// Viewport-fixed: the position is the top-left corner, no rotation.
    Fixed,
}

/// Vertical clip mask used to wipe image layers in and out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reveal {
    #[default]
    Hidden,
    Shown,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene node {0} is already detached")]
    Detached(NodeId),
}

/// Setters on a node that no longer exists must be ignored by the
/// implementation; only `detach` and `remove` report it.
pub trait Scene {
    fn create_label(&mut self, slot: usize, label: &Label, font_size: f64) -> NodeId;
    fn create_image_layer(&mut self, slot: usize, image: &ImageRef, size: Size) -> NodeId;
    fn create_center_image(&mut self) -> NodeId;

    /// Routes activation input on `node` (pointer, click, keys) to `slot`.
    fn on_activate(&mut self, node: NodeId, slot: usize);
    fn detach(&mut self, node: NodeId) -> Result<(), SceneError>;
    fn remove(&mut self, node: NodeId) -> Result<(), SceneError>;

    fn set_position(&mut self, node: NodeId, position: Point, angle: f64);
    fn set_size(&mut self, node: NodeId, size: Size);
    fn set_opacity(&mut self, node: NodeId, opacity: f64);
    fn set_clip_reveal(&mut self, node: NodeId, reveal: Reveal);
    fn set_positioning(&mut self, node: NodeId, positioning: Positioning);
    fn set_image_source(&mut self, node: NodeId, image: &ImageRef);
}
