use crate::follow::{FollowStep, PointerFollow};
use crate::geometry::{self, CircleGeometry, DeviceClass, Layout, Point, Viewport};
use crate::item::{CarouselItem, EscapedKey, ItemSequence};
use crate::registry::Registry;
use crate::scene::{Positioning, Reveal, Scene};
use crate::scroll::{ScrollStep, SmoothScroll, TouchTracker};
use crate::timer::{Debouncer, Throttler};
use crate::tuning::Tuning;
use crate::{HOVER_IMAGE_SIZE, LABEL_OPACITY_EMPHASIZED, LABEL_OPACITY_MUTED};
use std::collections::BTreeMap;
use std::time::Instant;

pub type Navigate = Box<dyn FnMut(EscapedKey)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Other,
}

impl Key {
    pub fn is_activation(self) -> bool {
        matches!(self, Self::Enter | Self::Space)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSwap {
    slot: usize,
    due: Instant,
}

/// Mutable state shared by every carousel callback. Only touched from the
/// thread that owns the carousel.
#[derive(Debug)]
pub struct CarouselRuntimeState {
    pub sequence: ItemSequence,
    pub scroll: SmoothScroll,
    pub touch: TouchTracker,
    pub follow: PointerFollow,
    /// Mobile only: slot whose image the shared center image shows (or is
    /// fading to).
    pub center_index: Option<usize>,
    pub viewport: Viewport,
    pub device: DeviceClass,
    pub last_pointer: Option<Point>,
    pub registry: Registry,
    pending_viewport: Option<Viewport>,
    resize: Debouncer,
    pointer: Throttler,
    /// At most one pending hide per slot.
    hides: BTreeMap<usize, Instant>,
    swap: Option<PendingSwap>,
}

impl CarouselRuntimeState {
    pub fn create(viewport: Viewport, tuning: &Tuning) -> Self {
        Self {
            sequence: ItemSequence::default(),
            scroll: SmoothScroll::default(),
            touch: TouchTracker::default(),
            follow: PointerFollow::default(),
            center_index: None,
            viewport,
            device: DeviceClass::classify(viewport.width, tuning.mobile_breakpoint),
            last_pointer: None,
            registry: Registry::default(),
            pending_viewport: None,
            resize: Debouncer::new(tuning.resize_debounce),
            pointer: Throttler::new(tuning.pointer_throttle),
            hides: BTreeMap::new(),
            swap: None,
        }
    }

    /// Drops the scene bindings and everything that refers to them. Scroll
    /// state and a pending resize survive.
    fn unbind<S: Scene>(&mut self, scene: &mut S) {
        self.registry.teardown(scene);
        self.follow.release();
        self.hides.clear();
        self.swap = None;
        self.center_index = None;
    }

    pub fn teardown<S: Scene>(&mut self, scene: &mut S) {
        self.unbind(scene);
        self.scroll.cancel();
        self.touch.end();
        self.resize.cancel();
        self.pointer.cancel();
        self.pending_viewport = None;
    }

    pub fn layout(&self, tuning: &Tuning) -> Layout {
        geometry::layout(
            self.sequence.len(),
            self.scroll.current(),
            self.viewport,
            self.device,
            tuning,
        )
    }

    pub fn is_active(&self) -> bool {
        self.scroll.is_chasing()
            || self.follow.is_running()
            || self.resize.is_pending()
            || !self.hides.is_empty()
            || self.swap.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.resize
            .deadline()
            .into_iter()
            .chain(self.hides.values().copied())
            .chain(self.swap.map(|s| s.due))
            .min()
    }
}

pub struct RadialCarousel<S: Scene> {
    scene: S,
    tuning: Tuning,
    base_path: String,
    navigate: Navigate,
    state: CarouselRuntimeState,
}

impl<S: Scene> RadialCarousel<S> {
    pub fn new(scene: S, tuning: Tuning, viewport: Viewport, navigate: Navigate) -> Self {
        let tuning = tuning.sanitized();
        let state = CarouselRuntimeState::create(viewport, &tuning);
        Self {
            scene,
            tuning,
            base_path: String::new(),
            navigate,
            state,
        }
    }

    /// Prefix for site-absolute image locators. Applies from the next rebuild.
    pub fn set_base_path(&mut self, base_path: impl Into<String>) {
        self.base_path = base_path.into();
    }

    pub fn set_tuning(&mut self, tuning: Tuning, now: Instant) {
        let tuning = tuning.sanitized();
        self.state.resize.set_delay(tuning.resize_debounce);
        self.state.pointer.set_interval(tuning.pointer_throttle);

        let duplication_changed = tuning.duplication != self.tuning.duplication;
        self.tuning = tuning;

        if duplication_changed {
            let items = self.state.sequence.items().to_vec();
            self.state.sequence = ItemSequence::new(items, self.tuning.duplication);
        }

        let device =
            DeviceClass::classify(self.state.viewport.width, self.tuning.mobile_breakpoint);
        if duplication_changed || device != self.state.device {
            self.state.device = device;
            self.rebind(now);
        } else {
            self.relayout(now);
        }
    }

    /// Replaces the item list. Unchanged content is a no-op; anything else
    /// tears every binding down and builds afresh.
    pub fn set_items(&mut self, items: Vec<CarouselItem>, now: Instant) {
        if items.as_slice() == self.state.sequence.items() {
            log::debug!("Item list unchanged, keeping bindings");
            return;
        }

        self.state.sequence = ItemSequence::new(items, self.tuning.duplication);
        self.state.scroll.cancel();
        self.state.scroll.retarget_to_current();
        self.rebind(now);

        log::info!(
            "Carousel bound to {} items ({} slots)",
            self.state.sequence.original_len(),
            self.state.sequence.len()
        );
    }

    /// Rebinds the current items, for when something outside the item list
    /// (base path, image sources) changed. Scroll state is kept.
    pub fn rebuild(&mut self, now: Instant) {
        self.rebind(now);
    }

    pub fn wheel(&mut self, delta_y: f64) {
        if self.state.sequence.is_empty() {
            return;
        }
        if self.state.scroll.push(delta_y) {
            log::trace!("Scroll loop started");
        }
    }

    pub fn touch_start(&mut self, y: f64) {
        self.state.touch.start(y);
    }

    pub fn touch_move(&mut self, y: f64) {
        if let Some(delta) = self.state.touch.move_to(y) {
            self.wheel(delta * self.tuning.touch_multiplier);
        }
    }

    pub fn touch_end(&mut self) {
        self.state.touch.end();
    }

    /// Records the new size; geometry and device class follow once the
    /// debounce window has passed.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        if !(viewport.width > 0.0 && viewport.height > 0.0)
            || !viewport.width.is_finite()
            || !viewport.height.is_finite()
        {
            log::debug!("Ignoring degenerate viewport {:?}", viewport);
            return;
        }
        self.state.pending_viewport = Some(viewport);
        self.state.resize.schedule(now);
    }

    pub fn pointer_move(&mut self, point: Point, now: Instant) {
        if !point.is_finite() {
            return;
        }
        if self.state.follow.hovered().is_some() {
            self.state.last_pointer = Some(point);
            if self.state.follow.retarget(image_anchor(point)) {
                log::trace!("Follow loop started");
            }
        } else if self.state.pointer.allow(now) {
            self.state.last_pointer = Some(point);
        }
    }

    pub fn pointer_enter(&mut self, slot: usize, point: Option<Point>, now: Instant) {
        if let Some(point) = point.filter(Point::is_finite) {
            self.state.last_pointer = Some(point);
        }
        self.engage(slot, now);
    }

    pub fn pointer_leave(&mut self, slot: usize, now: Instant) {
        if self.state.follow.hovered() == Some(slot) {
            self.disengage(slot, now);
        }
    }

    pub fn key_down(&mut self, slot: usize, key: Key, now: Instant) {
        if key.is_activation() && self.state.follow.hovered() != Some(slot) {
            self.engage(slot, now);
        }
    }

    pub fn key_up(&mut self, slot: usize, key: Key, now: Instant) {
        if !key.is_activation() {
            return;
        }
        if self.state.device.is_mobile() {
            if key == Key::Enter {
                self.activate(slot);
            }
            return;
        }
        if self.state.follow.hovered() != Some(slot) {
            return;
        }
        self.disengage(slot, now);
        if key == Key::Enter {
            self.activate(slot);
        }
    }

    pub fn click(&mut self, slot: usize) {
        self.activate(slot);
    }

    /// Runs due timers, then one scroll step, then one follow step. Returns
    /// whether the host should schedule another frame.
    pub fn frame(&mut self, now: Instant) -> bool {
        self.poll_timers(now);

        match self.state.scroll.step(&self.tuning) {
            ScrollStep::Moved | ScrollStep::Settled => self.relayout(now),
            ScrollStep::Idle => {}
        }

        if let FollowStep::Moved(position) | FollowStep::Settled(position) =
            self.state.follow.step(&self.tuning)
            && let Some(image) = self
                .state
                .follow
                .hovered()
                .and_then(|slot| self.state.registry.image(slot))
        {
            self.scene.set_position(image.node, position, 0.0);
        }

        self.is_active()
    }

    /// Resize first, so a scroll step in the same frame sees the new geometry.
    pub fn poll_timers(&mut self, now: Instant) {
        if self.state.resize.poll(now) {
            self.apply_resize(now);
        }

        let due: Vec<usize> = self
            .state
            .hides
            .iter()
            .filter(|&(_, &due)| due <= now)
            .map(|(&slot, _)| slot)
            .collect();
        for slot in due {
            self.state.hides.remove(&slot);
            self.finish_hide(slot, now);
        }

        if let Some(swap) = self.state.swap
            && swap.due <= now
        {
            self.state.swap = None;
            self.finish_swap(swap.slot);
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.next_deadline()
    }

    pub fn teardown(&mut self) {
        let Self { scene, state, .. } = self;
        state.teardown(scene);
        log::debug!("Carousel torn down");
    }

    pub fn scroll_offset(&self) -> f64 {
        self.state.scroll.current()
    }

    pub fn target_offset(&self) -> f64 {
        self.state.scroll.target()
    }

    pub fn device_class(&self) -> DeviceClass {
        self.state.device
    }

    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    pub fn geometry(&self) -> CircleGeometry {
        CircleGeometry::new(self.state.viewport, self.state.device, &self.tuning)
    }

    pub fn layout(&self) -> Layout {
        self.state.layout(&self.tuning)
    }

    pub fn hovered(&self) -> Option<usize> {
        self.state.follow.hovered()
    }

    pub fn center_index(&self) -> Option<usize> {
        self.state.center_index
    }

    pub fn items(&self) -> &ItemSequence {
        &self.state.sequence
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn state(&self) -> &CarouselRuntimeState {
        &self.state
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    fn rebind(&mut self, now: Instant) {
        let Self {
            scene,
            state,
            base_path,
            ..
        } = self;
        state.unbind(scene);
        if state.sequence.is_empty() {
            return;
        }

        state.registry = Registry::build(scene, &state.sequence, state.device, base_path);
        if state.device.is_mobile() {
            self.seed_center_image();
        }
        self.relayout(now);
    }

    fn seed_center_image(&mut self) {
        let Self {
            scene,
            state,
            base_path,
            ..
        } = self;
        if state.center_index.is_some() {
            return;
        }
        let (Some(node), Some(item)) = (state.registry.center_image(), state.sequence.resolve(0))
        else {
            return;
        };
        scene.set_image_source(node, &item.image.with_base_path(base_path));
        scene.set_opacity(node, 1.0);
        state.center_index = Some(0);
    }

    fn relayout(&mut self, now: Instant) {
        let Self {
            scene,
            state,
            tuning,
            ..
        } = self;
        if state.registry.is_empty() {
            return;
        }

        let layout = state.layout(tuning);
        let hovered = state.follow.hovered();

        for (entry, placement) in state.registry.entries().iter().zip(&layout.placements) {
            scene.set_position(entry.label, placement.position, placement.angle);

            let emphasized = match layout.center_index {
                Some(center) => center == entry.slot,
                None => hovered == Some(entry.slot),
            };
            scene.set_opacity(
                entry.label,
                if emphasized {
                    LABEL_OPACITY_EMPHASIZED
                } else {
                    LABEL_OPACITY_MUTED
                },
            );

            if let Some(image) = entry.image
                && image.positioning == Positioning::Flow
                && hovered != Some(entry.slot)
            {
                scene.set_position(image.node, placement.position, placement.angle);
            }
        }

        if let Some(node) = state.registry.center_image() {
            let size = geometry::center_image_size(state.viewport);
            let origin = state
                .viewport
                .center()
                .offset(-size.width / 2.0, -size.height / 2.0);
            scene.set_size(node, size);
            scene.set_position(node, origin, 0.0);

            if let Some(index) = layout.center_index
                && state.center_index != Some(index)
            {
                scene.set_opacity(node, 0.0);
                state.swap = Some(PendingSwap {
                    slot: index,
                    due: now + tuning.crossfade_half,
                });
                state.center_index = Some(index);
            }
        }
    }

    fn apply_resize(&mut self, now: Instant) {
        let Some(viewport) = self.state.pending_viewport.take() else {
            return;
        };
        self.state.viewport = viewport;

        let device = DeviceClass::classify(viewport.width, self.tuning.mobile_breakpoint);
        if device != self.state.device {
            log::info!(
                "Device class changed from {} to {}",
                self.state.device,
                device
            );
            self.state.device = device;
            self.rebind(now);
        } else {
            self.relayout(now);
        }
    }

    fn engage(&mut self, slot: usize, now: Instant) {
        if self.state.device.is_mobile() {
            return;
        }
        let Some(image) = self.state.registry.image(slot) else {
            return;
        };
        if let Some(previous) = self.state.follow.hovered()
            && previous != slot
        {
            self.disengage(previous, now);
        }

        let Self { scene, state, .. } = self;
        state.hides.remove(&slot);

        let cursor = state
            .last_pointer
            .unwrap_or_else(|| state.viewport.center());
        let anchor = image_anchor(cursor);
        state.follow.engage(slot, anchor);
        state.registry.set_image_positioning(slot, Positioning::Fixed);

        scene.set_positioning(image.node, Positioning::Fixed);
        scene.set_position(image.node, anchor, 0.0);
        scene.set_opacity(image.node, 1.0);
        scene.set_clip_reveal(image.node, Reveal::Shown);
        if let Some(entry) = state.registry.entry(slot) {
            scene.set_opacity(entry.label, LABEL_OPACITY_EMPHASIZED);
        }
        log::debug!("Hover engaged on slot {}", slot);
    }

    fn disengage(&mut self, slot: usize, now: Instant) {
        let Self {
            scene,
            state,
            tuning,
            ..
        } = self;
        state.follow.release();

        if let Some(entry) = state.registry.entry(slot) {
            if let Some(image) = entry.image {
                scene.set_opacity(image.node, 0.0);
                scene.set_clip_reveal(image.node, Reveal::Hidden);
            }
            scene.set_opacity(entry.label, LABEL_OPACITY_MUTED);
        }
        state.hides.insert(slot, now + tuning.hide_delay);
    }

    /// The hidden image may rejoin the circle, unless another hover started
    /// meanwhile; that hover's own release will bring everything back.
    fn finish_hide(&mut self, slot: usize, now: Instant) {
        if let Some(active) = self.state.follow.hovered() {
            log::debug!(
                "Delayed hide of slot {} skipped, slot {} is hovered",
                slot,
                active
            );
            return;
        }

        let Self { scene, state, .. } = self;
        let stranded: Vec<_> = state
            .registry
            .entries()
            .iter()
            .filter(|e| !state.hides.contains_key(&e.slot))
            .filter_map(|e| e.image.map(|image| (e.slot, image)))
            .filter(|(_, image)| image.positioning == Positioning::Fixed)
            .collect();

        for (slot, image) in stranded {
            scene.set_positioning(image.node, Positioning::Flow);
            state.registry.set_image_positioning(slot, Positioning::Flow);
        }
        self.relayout(now);
    }

    fn finish_swap(&mut self, slot: usize) {
        let Self {
            scene,
            state,
            base_path,
            ..
        } = self;
        let (Some(node), Some(item)) = (state.registry.center_image(), state.sequence.resolve(slot))
        else {
            return;
        };
        scene.set_image_source(node, &item.image.with_base_path(base_path));
        scene.set_opacity(node, 1.0);
    }

    fn activate(&mut self, slot: usize) {
        let Some(item) = self.state.sequence.resolve(slot) else {
            log::debug!("Activation on unknown slot {}", slot);
            return;
        };
        let escaped = item.key.escaped();
        log::info!("Opening '{}' ({})", item.label, escaped);
        (self.navigate)(escaped);
    }
}

/// Top-left corner that centers the hover image under `cursor`.
fn image_anchor(cursor: Point) -> Point {
    cursor.offset(-HOVER_IMAGE_SIZE.width / 2.0, -HOVER_IMAGE_SIZE.height / 2.0)
}
