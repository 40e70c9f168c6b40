use carousel::scroll::ease_out_cubic;
use carousel::{
    ImageRef, Label, NodeId, NodeKind, Point, Positioning, Reveal, Scene, SceneError, Size,
};
use gdk_pixbuf::Pixbuf;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const FONT_FAMILY: &str = "Sans";

const LABEL_FADE: Duration = Duration::from_millis(300);
const IMAGE_FADE: Duration = Duration::from_millis(500);
const CENTER_FADE: Duration = Duration::from_millis(150);
const IMAGE_LOAD_BOUND: i32 = 800; // px, longest side

/// Eased transition of one scalar property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    start: Instant,
    duration: Duration,
}

impl Tween {
    pub fn fixed(value: f64, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            start: now,
            duration: Duration::ZERO,
        }
    }

    pub fn value(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = now.saturating_duration_since(self.start).as_secs_f64()
            / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * ease_out_cubic(t.min(1.0))
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    /// Starts from wherever the running transition currently is.
    pub fn retarget(&mut self, to: f64, duration: Duration, now: Instant) {
        if to == self.to {
            return;
        }
        self.from = self.value(now);
        self.to = to;
        self.start = now;
        self.duration = duration;
    }

    pub fn is_running(&self, now: Instant) -> bool {
        now < self.start + self.duration
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub slot: Option<usize>,
    pub text: Option<Label>,
    pub font_size: f64,
    pub image: Option<ImageRef>,
    pub position: Point,
    pub angle: f64,
    /// Image box, or the measured text box for labels.
    pub size: Size,
    pub opacity: Tween,
    /// Visible fraction of the top-down wipe, 0 to 1.
    pub reveal: Tween,
    pub positioning: Positioning,
    pub activation: Option<usize>,
}

impl Node {
    fn new(kind: NodeKind, slot: Option<usize>, now: Instant) -> Self {
        Self {
            kind,
            slot,
            text: None,
            font_size: 0.0,
            image: None,
            position: Point::default(),
            angle: 0.0,
            size: Size::default(),
            opacity: Tween::fixed(0.0, now),
            reveal: Tween::fixed(1.0, now),
            positioning: Positioning::Flow,
            activation: None,
        }
    }

    fn fade(&self) -> Duration {
        match self.kind {
            NodeKind::Label => LABEL_FADE,
            NodeKind::ImageLayer => IMAGE_FADE,
            NodeKind::CenterImage => CENTER_FADE,
        }
    }

    /// Whether `point` falls on the label's rotated text box.
    fn contains(&self, point: Point) -> bool {
        let (dx, dy) = (point.x - self.position.x, point.y - self.position.y);
        let (sin, cos) = (-self.angle).sin_cos();
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;
        (0.0..=self.size.width).contains(&local_x) && local_y.abs() <= self.size.height / 2.0
    }
}

/// Decoded images keyed by locator. Failed loads are remembered as `None`
/// and drawn as a broken placeholder.
#[derive(Debug, Default)]
pub struct ImageCache {
    root: PathBuf,
    /// URL prefix the carousel puts on site-absolute locators. Not a
    /// directory under `root`.
    base_path: String,
    pixbufs: HashMap<ImageRef, Option<Pixbuf>>,
}

impl ImageCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            base_path: String::new(),
            pixbufs: HashMap::new(),
        }
    }

    pub fn set_base_path(&mut self, base_path: String) {
        if base_path != self.base_path {
            self.base_path = base_path;
            self.pixbufs.clear();
        }
    }

    pub fn set_root(&mut self, root: PathBuf) {
        if root != self.root {
            self.root = root;
            self.pixbufs.clear();
        }
    }

    /// Local file behind a site-absolute or relative locator. Remote URLs
    /// have none.
    pub fn resolve(&self, image: &ImageRef) -> Option<PathBuf> {
        if image.contains("://") || image.starts_with("//") {
            return None;
        }
        let local = image.strip_base_path(&self.base_path);
        Some(self.root.join(local.trim_start_matches('/')))
    }

    fn load(&mut self, image: &ImageRef) {
        if self.pixbufs.contains_key(image) {
            return;
        }
        let pixbuf = match self.resolve(image) {
            Some(path) => load_pixbuf(&path),
            None => {
                log::warn!("Cannot load remote image {}", image);
                None
            }
        };
        self.pixbufs.insert(image.clone(), pixbuf);
    }

    pub fn get(&self, image: &ImageRef) -> Option<&Pixbuf> {
        self.pixbufs.get(image).and_then(Option::as_ref)
    }
}

fn load_pixbuf(path: &Path) -> Option<Pixbuf> {
    Pixbuf::from_file_at_scale(path, IMAGE_LOAD_BOUND, IMAGE_LOAD_BOUND, true)
        .map_err(|e| log::warn!("Failed to load image {}: {}", path.display(), e))
        .ok()
}

/// Retained scene drawn by `view::draw`.
#[derive(Debug)]
pub struct CairoScene {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    images: ImageCache,
    measure: Option<cairo::Context>,
}

impl CairoScene {
    pub fn new(image_root: PathBuf) -> Self {
        let measure = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1)
            .and_then(|surface| cairo::Context::new(&surface))
            .map_err(|e| log::warn!("No text measuring context: {}", e))
            .ok();
        Self {
            nodes: BTreeMap::new(),
            next_id: 0,
            images: ImageCache::new(image_root),
            measure,
        }
    }

    pub fn set_image_root(&mut self, root: PathBuf) {
        self.images.set_root(root);
    }

    pub fn set_base_path(&mut self, base_path: String) {
        self.images.set_base_path(base_path);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes of one kind in creation order.
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .filter(move |(_, n)| n.kind == kind)
            .map(|(&id, n)| (id, n))
    }

    pub fn pixbuf(&self, image: &ImageRef) -> Option<&Pixbuf> {
        self.images.get(image)
    }

    /// Slot of the topmost activatable label under `point`.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.nodes
            .values()
            .rev()
            .filter(|n| n.kind == NodeKind::Label)
            .find(|n| n.activation.is_some() && n.contains(point))
            .and_then(|n| n.activation)
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.nodes
            .values()
            .any(|n| n.opacity.is_running(now) || n.reveal.is_running(now))
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.next_id += 1;
        let id = NodeId::from(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    fn measure_text(&self, text: &str, font_size: f64) -> Size {
        self.measure
            .as_ref()
            .and_then(|cr| {
                cr.select_font_face(
                    FONT_FAMILY,
                    cairo::FontSlant::Normal,
                    cairo::FontWeight::Normal,
                );
                cr.set_font_size(font_size);
                cr.text_extents(text).ok()
            })
            .map(|ext| Size::new(ext.x_advance(), font_size))
            .unwrap_or_else(|| Size::new(text.chars().count() as f64 * font_size * 0.6, font_size))
    }
}

impl Scene for CairoScene {
    fn create_label(&mut self, slot: usize, label: &Label, font_size: f64) -> NodeId {
        let mut node = Node::new(NodeKind::Label, Some(slot), Instant::now());
        node.size = self.measure_text(label, font_size);
        node.text = Some(label.clone());
        node.font_size = font_size;
        self.insert(node)
    }

    fn create_image_layer(&mut self, slot: usize, image: &ImageRef, size: Size) -> NodeId {
        self.images.load(image);
        let mut node = Node::new(NodeKind::ImageLayer, Some(slot), Instant::now());
        node.image = Some(image.clone());
        node.size = size;
        self.insert(node)
    }

    fn create_center_image(&mut self) -> NodeId {
        let mut node = Node::new(NodeKind::CenterImage, None, Instant::now());
        node.positioning = Positioning::Fixed;
        self.insert(node)
    }

    fn on_activate(&mut self, node: NodeId, slot: usize) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.activation = Some(slot);
        }
    }

    fn detach(&mut self, node: NodeId) -> Result<(), SceneError> {
        let n = self
            .nodes
            .get_mut(&node)
            .ok_or(SceneError::Detached(node))?;
        n.activation = None;
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.nodes
            .remove(&node)
            .map(|_| ())
            .ok_or(SceneError::Detached(node))
    }

    fn set_position(&mut self, node: NodeId, position: Point, angle: f64) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.position = position;
            n.angle = angle;
        }
    }

    fn set_size(&mut self, node: NodeId, size: Size) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.size = size;
        }
    }

    fn set_opacity(&mut self, node: NodeId, opacity: f64) {
        if let Some(n) = self.nodes.get_mut(&node) {
            let fade = n.fade();
            n.opacity.retarget(opacity, fade, Instant::now());
        }
    }

    fn set_clip_reveal(&mut self, node: NodeId, reveal: Reveal) {
        let to = match reveal {
            Reveal::Hidden => 0.0,
            Reveal::Shown => 1.0,
        };
        if let Some(n) = self.nodes.get_mut(&node) {
            n.reveal.retarget(to, IMAGE_FADE, Instant::now());
        }
    }

    fn set_positioning(&mut self, node: NodeId, positioning: Positioning) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.positioning = positioning;
        }
    }

    fn set_image_source(&mut self, node: NodeId, image: &ImageRef) {
        self.images.load(image);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.image = Some(image.clone());
        }
    }
}
