use crate::tuning::Tuning;

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// Speed factor for one chase step. Far from the target the full smoothing
/// factor applies, close to it half of it; the blend follows an ease-out of
/// the remaining distance.
pub fn eased_factor(diff: f64, tuning: &Tuning) -> f64 {
    let progress = (diff.abs() / tuning.scroll_ease_distance).min(1.0);
    tuning.scroll_smoothing * (0.5 + ease_out_cubic(progress) * 0.5)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStep {
    Idle,
    Moved,
    Settled,
}

/// Chases an unbounded target offset. Idle until input arrives, Chasing until
/// the remaining distance drops under the threshold.
#[derive(Debug, Clone, Default)]
pub struct SmoothScroll {
    current: f64,
    target: f64,
    chasing: bool,
}

impl SmoothScroll {
    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_chasing(&self) -> bool {
        self.chasing
    }

    pub fn push(&mut self, delta: f64) -> bool {
        let target = self.target + delta;
        if !target.is_finite() {
            log::warn!("dropping scroll delta {delta}: target would leave finite range");
            return false;
        }
        self.target = target;
        !std::mem::replace(&mut self.chasing, true)
    }

    pub fn retarget_to_current(&mut self) {
        self.target = self.current;
    }

    pub fn cancel(&mut self) {
        self.chasing = false;
    }

    pub fn step(&mut self, tuning: &Tuning) -> ScrollStep {
        if !self.chasing {
            return ScrollStep::Idle;
        }

        let diff = self.target - self.current;
        let next = self.current + diff * eased_factor(diff, tuning);
        // At large magnitudes the step can round away entirely.
        if diff.abs() < tuning.scroll_threshold || next == self.current {
            self.current = self.target;
            self.chasing = false;
            return ScrollStep::Settled;
        }

        self.current = next;
        ScrollStep::Moved
    }
}

/// Turns absolute touch positions into scroll deltas. Dragging upwards
/// scrolls forward, like a wheel turned down.
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchTracker {
    last_y: Option<f64>,
}

impl TouchTracker {
    pub fn start(&mut self, y: f64) {
        self.last_y = Some(y);
    }

    pub fn move_to(&mut self, y: f64) -> Option<f64> {
        let last = self.last_y.replace(y)?;
        Some(last - y)
    }

    pub fn end(&mut self) {
        self.last_y = None;
    }
}
