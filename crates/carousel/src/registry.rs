use crate::HOVER_IMAGE_SIZE;
use crate::geometry::DeviceClass;
use crate::item::ItemSequence;
use crate::scene::{NodeId, Positioning, Reveal, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageEntry {
    pub node: NodeId,
    pub positioning: Positioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub slot: usize,
    pub label: NodeId,
    /// Desktop only; mobile relies on the shared center image.
    pub image: Option<ImageEntry>,
}

/// Scene nodes bound to the current item sequence. Always rebuilt whole.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    center_image: Option<NodeId>,
}

impl Registry {
    pub fn build<S: Scene>(
        scene: &mut S,
        sequence: &ItemSequence,
        device: DeviceClass,
        base_path: &str,
    ) -> Self {
        let font_size = device.label_font_size();

        let entries: Vec<Entry> = sequence
            .iter()
            .map(|(slot, item)| {
                let label = scene.create_label(slot, &item.label, font_size);
                scene.on_activate(label, slot);

                let image = (!device.is_mobile()).then(|| {
                    let node = scene.create_image_layer(
                        slot,
                        &item.image.with_base_path(base_path),
                        HOVER_IMAGE_SIZE,
                    );
                    scene.set_positioning(node, Positioning::Flow);
                    scene.set_opacity(node, 0.0);
                    scene.set_clip_reveal(node, Reveal::Hidden);
                    ImageEntry {
                        node,
                        positioning: Positioning::Flow,
                    }
                });

                Entry { slot, label, image }
            })
            .collect();

        let center_image =
            (device.is_mobile() && !entries.is_empty()).then(|| scene.create_center_image());

        log::debug!(
            "Built {} carousel entries ({} originals) for {} layout",
            entries.len(),
            sequence.original_len(),
            device
        );

        Self {
            entries,
            center_image,
        }
    }

    /// Detaches handlers and removes every node. Nodes the host already
    /// dropped are skipped.
    pub fn teardown<S: Scene>(&mut self, scene: &mut S) {
        for entry in self.entries.drain(..) {
            if let Err(e) = scene.detach(entry.label) {
                log::debug!("Skipping handler detach: {}", e);
            }
            release(scene, entry.label);
            if let Some(image) = entry.image {
                release(scene, image.node);
            }
        }
        if let Some(node) = self.center_image.take() {
            release(scene, node);
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, slot: usize) -> Option<&Entry> {
        self.entries.get(slot)
    }

    pub fn image(&self, slot: usize) -> Option<ImageEntry> {
        self.entry(slot).and_then(|e| e.image)
    }

    pub fn set_image_positioning(&mut self, slot: usize, positioning: Positioning) {
        if let Some(image) = self.entries.get_mut(slot).and_then(|e| e.image.as_mut()) {
            image.positioning = positioning;
        }
    }

    pub fn center_image(&self) -> Option<NodeId> {
        self.center_image
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn release<S: Scene>(scene: &mut S, node: NodeId) {
    if let Err(e) = scene.remove(node) {
        log::debug!("Skipping node removal: {}", e);
    }
}
