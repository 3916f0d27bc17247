use crate::engine::config::{EdgePolicy, REFERENCE_FRAME_COUNT};
use crate::engine::render::Size;

/// Drag distance calibration: a 1500 px wide surface, 150 drag speed and 36
/// frames gives 25 px per step.
const REFERENCE_DRAG_SPEED: f64 = 150.0;
const REFERENCE_SURFACE_WIDTH: f64 = 1500.0;
const REFERENCE_STEP_PX: f64 = 25.0;

/// Logical direction of travel through the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// The on-screen prev/next affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Prev,
    Next,
}

/// Enabled state of both controls. Only `Clamp` ever disables one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeControls {
    pub prev: bool,
    pub next: bool,
}

impl EdgeControls {
    pub const ENABLED: EdgeControls = EdgeControls { prev: true, next: true };

    pub fn is_enabled(&self, control: Control) -> bool {
        match control {
            Control::Prev => self.prev,
            Control::Next => self.next,
        }
    }

    fn set(&mut self, control: Control, enabled: bool) {
        match control {
            Control::Prev => self.prev = enabled,
            Control::Next => self.next = enabled,
        }
    }
}

/// What a step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub from: usize,
    pub to: usize,
    /// A control that became disabled by this step.
    pub edge_reached: Option<Control>,
    /// Controls disabled at the other edge became enabled again.
    pub edges_cleared: bool,
}

impl StepOutcome {
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

/// Steps produced from a drag displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSteps {
    pub direction: Direction,
    pub count: usize,
    /// Signed displacement used up by these steps.
    pub consumed: f64,
}

/// Screen distance of one frame step, independent of surface resolution and
/// frame count. Never below 1 px.
pub fn speed_factor(drag_speed: f64, frame_count: usize, surface_width: f64) -> f64 {
    let factor = drag_speed / REFERENCE_DRAG_SPEED * REFERENCE_FRAME_COUNT
        / frame_count.max(1) as f64
        * REFERENCE_STEP_PX
        * surface_width
        / REFERENCE_SURFACE_WIDTH;
    factor.floor().max(1.0)
}

/// Width the image actually occupies inside a letterboxed container of
/// `container`, for an image of height/width `ratio`.
pub fn letterboxed_width(container: Size, ratio: f64) -> f64 {
    if container.width > 0.0 && ratio > container.ratio() {
        container.height / ratio
    } else {
        container.width
    }
}

// ---------------------------------------------------------------------------
// FrameIndex
// ---------------------------------------------------------------------------

/// Active frame index (1-based) plus edge policy and direction flags.
#[derive(Debug, Clone)]
pub struct FrameIndex {
    active: usize,
    count: usize,
    policy: EdgePolicy,
    spin_reverse: bool,
    control_reverse: bool,
    controls: EdgeControls,
    speed_factor: f64,
}

impl FrameIndex {
    pub fn new(count: usize, policy: EdgePolicy, spin_reverse: bool, control_reverse: bool) -> Self {
        Self {
            active: 1,
            count: count.max(1),
            policy,
            spin_reverse,
            control_reverse,
            controls: EdgeControls::ENABLED,
            speed_factor: 1.0,
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn policy(&self) -> EdgePolicy {
        self.policy
    }

    pub fn controls(&self) -> EdgeControls {
        self.controls
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn set_speed_factor(&mut self, factor: f64) {
        self.speed_factor = factor.max(1.0);
    }

    fn effective_reverse(&self) -> bool {
        self.spin_reverse ^ self.control_reverse
    }

    /// The control pointing in logical direction `direction`.
    pub fn control_for(&self, direction: Direction) -> Control {
        match (direction, self.effective_reverse()) {
            (Direction::Up, false) | (Direction::Down, true) => Control::Next,
            (Direction::Up, true) | (Direction::Down, false) => Control::Prev,
        }
    }

    /// Logical direction a control moves in.
    pub fn direction_of(&self, control: Control) -> Direction {
        match (control, self.effective_reverse()) {
            (Control::Next, false) | (Control::Prev, true) => Direction::Up,
            (Control::Prev, false) | (Control::Next, true) => Direction::Down,
        }
    }

    /// Jump straight to `index`, clamped into range. Controls are untouched.
    pub fn jump_to(&mut self, index: usize) {
        self.active = index.clamp(1, self.count);
    }

    /// Controls as they stand before any movement: under `Clamp` the one
    /// pointing below frame 1 starts disabled.
    pub fn reset_controls(&mut self) -> Option<Control> {
        self.controls = EdgeControls::ENABLED;
        if self.policy == EdgePolicy::Clamp && self.active == 1 {
            let control = self.control_for(Direction::Down);
            self.controls.set(control, false);
            return Some(control);
        }
        None
    }

    pub fn step_up(&mut self, n: usize) -> StepOutcome {
        self.step(Direction::Up, n)
    }

    pub fn step_down(&mut self, n: usize) -> StepOutcome {
        self.step(Direction::Down, n)
    }

    pub fn step(&mut self, direction: Direction, n: usize) -> StepOutcome {
        let from = self.active;
        let n = n.max(1);
        let count = self.count;

        match self.policy {
            EdgePolicy::Wrap => {
                let delta = match direction {
                    Direction::Up => n as i64,
                    Direction::Down => -(n as i64),
                };
                self.active = ((from as i64 + delta - 1).rem_euclid(count as i64) + 1) as usize;
                StepOutcome { from, to: self.active, edge_reached: None, edges_cleared: false }
            }
            EdgePolicy::Clamp => {
                let at_edge = match direction {
                    Direction::Up => from + n >= count,
                    Direction::Down => from <= n + 1,
                };
                if at_edge {
                    self.active = match direction {
                        Direction::Up => count,
                        Direction::Down => 1,
                    };
                    // Leaving the opposite edge re-enables its control.
                    let left_other_edge = from != self.active
                        && self.controls != EdgeControls::ENABLED
                        && count > 1;
                    if left_other_edge {
                        self.controls = EdgeControls::ENABLED;
                    }
                    let control = self.control_for(direction);
                    let newly = self.controls.is_enabled(control);
                    self.controls.set(control, false);
                    StepOutcome {
                        from,
                        to: self.active,
                        edge_reached: newly.then_some(control),
                        edges_cleared: left_other_edge,
                    }
                } else {
                    self.active = match direction {
                        Direction::Up => from + n,
                        Direction::Down => from - n,
                    };
                    let cleared = self.controls != EdgeControls::ENABLED;
                    self.controls = EdgeControls::ENABLED;
                    StepOutcome { from, to: self.active, edge_reached: None, edges_cleared: cleared }
                }
            }
        }
    }

    /// Convert a pointer displacement into whole frame steps. Returns `None`
    /// until the displacement reaches one speed factor.
    pub fn translate_drag(&self, dx: f64) -> Option<DragSteps> {
        let factor = self.speed_factor;
        if !dx.is_finite() || dx.abs() < factor {
            return None;
        }
        let count = ((dx.abs() / factor).floor() as usize).max(1);
        let rightward = dx > 0.0;
        let direction = match (rightward, self.spin_reverse) {
            (true, false) | (false, true) => Direction::Up,
            (true, true) | (false, false) => Direction::Down,
        };
        Some(DragSteps {
            direction,
            count,
            consumed: dx.signum() * count as f64 * factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(n: usize) -> FrameIndex {
        FrameIndex::new(n, EdgePolicy::Wrap, false, false)
    }

    fn clamp(n: usize) -> FrameIndex {
        FrameIndex::new(n, EdgePolicy::Clamp, false, false)
    }

    #[test]
    fn wrap_step_down_from_first_lands_on_last() {
        let mut idx = wrap(24);
        idx.step_down(1);
        assert_eq!(idx.active(), 24);
    }

    #[test]
    fn wrap_round_trip_returns_to_start() {
        for n in 1..=13 {
            for start in 1..=n {
                let mut idx = wrap(n);
                idx.jump_to(start);
                for _ in 0..n {
                    idx.step_up(1);
                }
                assert_eq!(idx.active(), start, "n={n} start={start}");
            }
        }
    }

    #[test]
    fn index_stays_in_range_for_any_steps() {
        for policy in [EdgePolicy::Wrap, EdgePolicy::Clamp] {
            for n in 1..=7 {
                let mut idx = FrameIndex::new(n, policy, false, false);
                for (i, k) in [1usize, 3, 9, 2, 15, 1, 6, 100].iter().enumerate() {
                    if i % 2 == 0 { idx.step_up(*k) } else { idx.step_down(*k) };
                    assert!((1..=n).contains(&idx.active()), "{policy:?} n={n}");
                }
            }
        }
    }

    #[test]
    fn wrap_large_steps_are_modular() {
        let mut idx = wrap(10);
        idx.jump_to(3);
        idx.step_up(25);
        assert_eq!(idx.active(), 8);
        idx.step_down(27);
        assert_eq!(idx.active(), 1);
    }

    #[test]
    fn clamp_holds_at_last_and_disables_next() {
        let mut idx = clamp(5);
        idx.jump_to(4);
        let out = idx.step_up(3);
        assert_eq!(idx.active(), 5);
        assert_eq!(out.edge_reached, Some(Control::Next));
        assert!(!idx.controls().next);

        let again = idx.step_up(1);
        assert!(!again.moved());
        assert_eq!(again.edge_reached, None);

        let back = idx.step_down(1);
        assert_eq!(idx.active(), 4);
        assert!(back.edges_cleared);
        assert_eq!(idx.controls(), EdgeControls::ENABLED);
    }

    #[test]
    fn clamp_holds_at_first_and_disables_prev() {
        let mut idx = clamp(24);
        idx.jump_to(3);
        let out = idx.step_down(5);
        assert_eq!(idx.active(), 1);
        assert_eq!(out.edge_reached, Some(Control::Prev));
        assert!(!idx.controls().prev);
    }

    #[test]
    fn crossing_whole_sequence_swaps_disabled_control() {
        let mut idx = clamp(2);
        assert_eq!(idx.reset_controls(), Some(Control::Prev));

        let up = idx.step_up(1);
        assert_eq!(idx.active(), 2);
        assert!(up.edges_cleared);
        assert_eq!(up.edge_reached, Some(Control::Next));
        assert_eq!(idx.controls(), EdgeControls { prev: true, next: false });

        let down = idx.step_down(1);
        assert_eq!(idx.active(), 1);
        assert!(down.edges_cleared);
        assert_eq!(idx.controls(), EdgeControls { prev: false, next: true });
    }

    #[test]
    fn single_frame_keeps_both_controls_disabled() {
        let mut idx = clamp(1);
        idx.reset_controls();
        idx.step_up(1);
        let out = idx.step_down(1);
        assert!(!out.moved());
        assert!(!out.edges_cleared);
        assert_eq!(idx.controls(), EdgeControls { prev: false, next: false });
    }

    #[test]
    fn reversed_controls_swap_edge_markers() {
        let mut idx = FrameIndex::new(5, EdgePolicy::Clamp, true, false);
        idx.jump_to(5);
        let out = idx.step_up(1);
        assert_eq!(out.edge_reached, Some(Control::Prev));
        assert_eq!(idx.direction_of(Control::Prev), Direction::Up);

        // control_reverse cancels spin_reverse for the controls.
        let idx = FrameIndex::new(5, EdgePolicy::Clamp, true, true);
        assert_eq!(idx.control_for(Direction::Up), Control::Next);
    }

    #[test]
    fn initial_clamp_controls_disable_prev() {
        let mut idx = clamp(10);
        assert_eq!(idx.reset_controls(), Some(Control::Prev));
        assert!(!idx.controls().prev);
        let mut idx = wrap(10);
        assert_eq!(idx.reset_controls(), None);
    }

    #[test]
    fn drag_below_threshold_does_nothing() {
        let mut idx = wrap(24);
        idx.set_speed_factor(10.0);
        assert_eq!(idx.translate_drag(9.99), None);
        assert_eq!(idx.translate_drag(-9.99), None);
    }

    #[test]
    fn drag_consumes_whole_steps_only() {
        let mut idx = wrap(24);
        idx.set_speed_factor(10.0);
        let steps = idx.translate_drag(37.0).unwrap();
        assert_eq!(steps.direction, Direction::Up);
        assert_eq!(steps.count, 3);
        assert_eq!(steps.consumed, 30.0);

        let steps = idx.translate_drag(-25.0).unwrap();
        assert_eq!(steps.direction, Direction::Down);
        assert_eq!(steps.count, 2);
        assert_eq!(steps.consumed, -20.0);
    }

    #[test]
    fn spin_reverse_flips_drag_direction() {
        let mut idx = FrameIndex::new(24, EdgePolicy::Wrap, true, false);
        idx.set_speed_factor(5.0);
        assert_eq!(idx.translate_drag(5.0).unwrap().direction, Direction::Down);
        assert_eq!(idx.translate_drag(-5.0).unwrap().direction, Direction::Up);
    }

    #[test]
    fn speed_factor_is_frame_count_and_width_relative() {
        assert_eq!(speed_factor(150.0, 36, 1500.0), 25.0);
        assert_eq!(speed_factor(150.0, 18, 1500.0), 50.0);
        assert_eq!(speed_factor(150.0, 36, 750.0), 12.0);
        assert_eq!(speed_factor(150.0, 720, 100.0), 1.0);
    }

    #[test]
    fn letterboxed_width_uses_height_for_tall_images() {
        let container = Size::new(1000.0, 500.0);
        assert_eq!(letterboxed_width(container, 1.0), 500.0);
        assert_eq!(letterboxed_width(container, 0.25), 1000.0);
    }
}
