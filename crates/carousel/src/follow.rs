use crate::geometry::Point;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowStep {
    Idle,
    Moved(Point),
    Settled(Point),
}

/// Lagged tracking of the hovered item's image toward the pointer. Only one
/// slot can be followed at a time; `current` and `target` are shared.
#[derive(Debug, Clone, Default)]
pub struct PointerFollow {
    hovered: Option<usize>,
    current: Point,
    target: Point,
    running: bool,
}

impl PointerFollow {
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn current(&self) -> Point {
        self.current
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts following `slot` with no initial travel: current and target are
    /// both seeded at `anchor`.
    pub fn engage(&mut self, slot: usize, anchor: Point) {
        self.hovered = Some(slot);
        self.current = anchor;
        self.target = anchor;
        self.running = false;
    }

    pub fn retarget(&mut self, anchor: Point) -> bool {
        if self.hovered.is_none() || !anchor.is_finite() {
            return false;
        }
        self.target = anchor;
        !std::mem::replace(&mut self.running, true)
    }

    pub fn release(&mut self) -> Option<usize> {
        self.running = false;
        self.hovered.take()
    }

    pub fn step(&mut self, tuning: &Tuning) -> FollowStep {
        if !self.running || self.hovered.is_none() {
            self.running = false;
            return FollowStep::Idle;
        }

        let (dx, dy) = (
            self.target.x - self.current.x,
            self.target.y - self.current.y,
        );
        if dx.abs() < tuning.follow_threshold && dy.abs() < tuning.follow_threshold {
            self.current = self.target;
            self.running = false;
            return FollowStep::Settled(self.current);
        }

        self.current = self.current.offset(
            dx * tuning.follow_smoothing,
            dy * tuning.follow_smoothing,
        );
        FollowStep::Moved(self.current)
    }
}
