use crate::geometry::DeviceClass;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::Duration;

/// Numeric knobs of the carousel. Every field has a default, so a config
/// file only needs to name what it overrides.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub angle_per_pixel: f64,
    /// Circle radius as a fraction of the viewport's shorter side.
    pub radius_multiplier: f64,
    /// Circle center x as a fraction of viewport width.
    pub center_x_offset_desktop: f64,
    pub center_x_offset_mobile: f64,
    pub mobile_breakpoint: f64,
    pub duplication: usize,

    pub scroll_smoothing: f64,
    pub scroll_threshold: f64,
    /// Distance at which the ease-out reaches full speed.
    pub scroll_ease_distance: f64,
    pub touch_multiplier: f64,

    pub follow_smoothing: f64,
    pub follow_threshold: f64,

    #[serde(rename = "resize_debounce_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub resize_debounce: Duration,
    #[serde(rename = "pointer_throttle_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub pointer_throttle: Duration,
    /// Length of the hide transition; a released hover image returns to its
    /// slot only after this elapses.
    #[serde(rename = "hide_delay_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub hide_delay: Duration,
    #[serde(rename = "crossfade_half_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub crossfade_half: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            angle_per_pixel: 0.0015,
            radius_multiplier: 0.508,
            center_x_offset_desktop: -0.20,
            center_x_offset_mobile: -0.35,
            mobile_breakpoint: 768.0,
            duplication: 3,
            scroll_smoothing: 0.12,
            scroll_threshold: 0.1,
            scroll_ease_distance: 1000.0,
            touch_multiplier: 2.0,
            follow_smoothing: 0.08,
            follow_threshold: 0.1,
            resize_debounce: Duration::from_millis(150),
            pointer_throttle: Duration::from_millis(16),
            hide_delay: Duration::from_millis(500),
            crossfade_half: Duration::from_millis(150),
        }
    }
}

impl Tuning {
    pub fn center_x_offset(&self, device: DeviceClass) -> f64 {
        match device {
            DeviceClass::Desktop => self.center_x_offset_desktop,
            DeviceClass::Mobile => self.center_x_offset_mobile,
        }
    }

    /// Pulls out-of-range values back to something the integrators can
    /// converge with. Smoothing factors above 1 would overshoot the target.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.scroll_smoothing > 0.0 && self.scroll_smoothing <= 1.0) {
            log::warn!(
                "scroll_smoothing {} out of (0, 1], using {}",
                self.scroll_smoothing,
                defaults.scroll_smoothing
            );
            self.scroll_smoothing = defaults.scroll_smoothing;
        }
        if !(self.follow_smoothing > 0.0 && self.follow_smoothing <= 1.0) {
            log::warn!(
                "follow_smoothing {} out of (0, 1], using {}",
                self.follow_smoothing,
                defaults.follow_smoothing
            );
            self.follow_smoothing = defaults.follow_smoothing;
        }
        if !(self.scroll_threshold > 0.0) {
            self.scroll_threshold = defaults.scroll_threshold;
        }
        if !(self.follow_threshold > 0.0) {
            self.follow_threshold = defaults.follow_threshold;
        }
        if !(self.scroll_ease_distance > 0.0) {
            self.scroll_ease_distance = defaults.scroll_ease_distance;
        }
        if !self.angle_per_pixel.is_finite() {
            self.angle_per_pixel = defaults.angle_per_pixel;
        }
        if !self.touch_multiplier.is_finite() {
            self.touch_multiplier = defaults.touch_multiplier;
        }
        self.duplication = self.duplication.max(1);
        self
    }
}
