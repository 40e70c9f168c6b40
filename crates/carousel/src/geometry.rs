use crate::tuning::Tuning;
use crate::{CENTER_IMAGE_ASPECT, CENTER_IMAGE_MAX_WIDTH, CENTER_IMAGE_WIDTH_RATIO};
use crate::{LABEL_FONT_SIZE_DESKTOP, LABEL_FONT_SIZE_MOBILE};
use std::f64::consts::TAU;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn classify(width: f64, breakpoint: f64) -> Self {
        if width < breakpoint {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        self == Self::Mobile
    }

    pub fn label_font_size(self) -> f64 {
        match self {
            Self::Desktop => LABEL_FONT_SIZE_DESKTOP,
            Self::Mobile => LABEL_FONT_SIZE_MOBILE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleGeometry {
    pub center: Point,
    pub radius: f64,
}

impl CircleGeometry {
    pub fn new(viewport: Viewport, device: DeviceClass, tuning: &Tuning) -> Self {
        Self {
            center: Point::new(
                viewport.width * tuning.center_x_offset(device),
                viewport.height / 2.0,
            ),
            radius: viewport.min_side() * tuning.radius_multiplier,
        }
    }

    pub fn point_at(&self, angle: f64) -> Point {
        Point::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }
}

/// Where one slot of the expanded sequence sits. The node is anchored at its
/// left-center and rotated by `angle`, so text runs along the tangent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub index: usize,
    pub position: Point,
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub geometry: CircleGeometry,
    pub placements: Vec<Placement>,
    pub center_index: Option<usize>,
}

/// Angle of slot `index` out of `count`. The offset is never wrapped;
/// `cos`/`sin` handle the periodicity.
pub fn angle(index: usize, count: usize, scroll_offset: f64, tuning: &Tuning) -> f64 {
    (index as f64 / count as f64) * TAU + scroll_offset * tuning.angle_per_pixel
}

pub fn layout(
    count: usize,
    scroll_offset: f64,
    viewport: Viewport,
    device: DeviceClass,
    tuning: &Tuning,
) -> Layout {
    let geometry = CircleGeometry::new(viewport, device, tuning);

    let placements: Vec<Placement> = (0..count)
        .map(|index| {
            let angle = angle(index, count, scroll_offset, tuning);
            Placement {
                index,
                position: geometry.point_at(angle),
                angle,
            }
        })
        .collect();

    let center_index = device
        .is_mobile()
        .then(|| nearest_to_horizontal_center(&placements, viewport.width / 2.0))
        .flatten();

    Layout {
        geometry,
        placements,
        center_index,
    }
}

/// Ties go to the lowest index.
pub fn nearest_to_horizontal_center(placements: &[Placement], center_x: f64) -> Option<usize> {
    placements
        .iter()
        .min_by(|a, b| {
            (a.position.x - center_x)
                .abs()
                .total_cmp(&(b.position.x - center_x).abs())
        })
        .map(|p| p.index)
}

pub fn center_image_size(viewport: Viewport) -> Size {
    let width = CENTER_IMAGE_MAX_WIDTH.min(viewport.width * CENTER_IMAGE_WIDTH_RATIO);
    Size::new(width, width * CENTER_IMAGE_ASPECT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_angles_are_uniformly_spaced() {
        let tuning = Tuning::default();
        for count in [1, 2, 7, 15, 72] {
            let layout = layout(
                count,
                123.4,
                Viewport::new(1920.0, 1080.0),
                DeviceClass::Desktop,
                &tuning,
            );
            assert_eq!(layout.placements.len(), count);
            for pair in layout.placements.windows(2) {
                let step = pair[1].angle - pair[0].angle;
                assert!((step - TAU / count as f64).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_offset_rotates_every_slot_equally() {
        let tuning = Tuning::default();
        for offset in [-2500.0, -1.0, 0.0, 333.3, 1.0e6] {
            for i in 0..15 {
                let delta = angle(i, 15, offset, &tuning) - angle(i, 15, 0.0, &tuning);
                assert!((delta - offset * tuning.angle_per_pixel).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_reference_angles() {
        let tuning = Tuning::default();
        assert_eq!(angle(0, 15, 0.0, &tuning), 0.0);
        assert!((angle(3, 15, 0.0, &tuning) - 1.2566370614359172).abs() < EPS);
        assert!((angle(0, 15, 500.0, &tuning) - 0.75).abs() < EPS);
    }

    #[test]
    fn test_geometry_per_device() {
        let tuning = Tuning::default();

        let desktop = CircleGeometry::new(
            Viewport::new(1920.0, 1080.0),
            DeviceClass::Desktop,
            &tuning,
        );
        assert!((desktop.center.x - -384.0).abs() < EPS);
        assert!((desktop.center.y - 540.0).abs() < EPS);
        assert!((desktop.radius - 1080.0 * 0.508).abs() < EPS);

        let mobile =
            CircleGeometry::new(Viewport::new(375.0, 667.0), DeviceClass::Mobile, &tuning);
        assert!((mobile.center.x - 375.0 * -0.35).abs() < EPS);
        assert!((mobile.center.y - 333.5).abs() < EPS);
        assert!((mobile.radius - 375.0 * 0.508).abs() < EPS);
    }

    #[test]
    fn test_device_classification() {
        assert_eq!(DeviceClass::classify(375.0, 768.0), DeviceClass::Mobile);
        assert_eq!(DeviceClass::classify(767.9, 768.0), DeviceClass::Mobile);
        assert_eq!(DeviceClass::classify(768.0, 768.0), DeviceClass::Desktop);
        assert_eq!(DeviceClass::classify(1920.0, 768.0), DeviceClass::Desktop);
        assert_eq!("MOBILE".parse::<DeviceClass>().unwrap(), DeviceClass::Mobile);
        assert_eq!(DeviceClass::Desktop.to_string(), "desktop");
    }

    #[test]
    fn test_center_index_only_on_mobile() {
        let tuning = Tuning::default();
        let desktop = layout(15, 0.0, Viewport::new(1920.0, 1080.0), DeviceClass::Desktop, &tuning);
        assert_eq!(desktop.center_index, None);

        let mobile = layout(15, 0.0, Viewport::new(375.0, 667.0), DeviceClass::Mobile, &tuning);
        let center = mobile.center_index.unwrap();
        let best = (mobile.placements[center].position.x - 187.5).abs();
        assert!(
            mobile
                .placements
                .iter()
                .all(|p| (p.position.x - 187.5).abs() >= best)
        );

        let empty = layout(0, 0.0, Viewport::new(375.0, 667.0), DeviceClass::Mobile, &tuning);
        assert!(empty.placements.is_empty());
        assert_eq!(empty.center_index, None);
    }

    #[test]
    fn test_center_ties_go_to_lowest_index() {
        let placements: Vec<Placement> = [(0, 90.0), (1, 110.0), (2, 90.0), (3, 300.0)]
            .into_iter()
            .map(|(index, x)| Placement {
                index,
                position: Point::new(x, 0.0),
                angle: 0.0,
            })
            .collect();
        assert_eq!(nearest_to_horizontal_center(&placements, 100.0), Some(0));
    }

    #[test]
    fn test_huge_offsets_stay_finite() {
        let tuning = Tuning::default();
        let layout = layout(
            15,
            1.0e15,
            Viewport::new(1920.0, 1080.0),
            DeviceClass::Desktop,
            &tuning,
        );
        assert!(layout.placements.iter().all(|p| p.position.is_finite()));
    }

    #[test]
    fn test_center_image_size() {
        assert_eq!(center_image_size(Viewport::new(375.0, 667.0)), Size::new(280.0, 420.0));
        assert_eq!(center_image_size(Viewport::new(320.0, 568.0)), Size::new(240.0, 360.0));
    }
}
