//! Long-press and radial-menu gesture resolution.
//!
//! A press that survives the long-press threshold without drifting past
//! the slop radius arms a [`RadialGestureSession`]. While armed, pointer
//! position relative to the fixed origin resolves to one of four
//! directions; release commits the armed direction or cancels. The menu
//! always closes on release; reopening requires a fresh long-press.

use serde::{Deserialize, Serialize};

use crate::cycle::MenuAction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Logical viewport the menu must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    None,
    Right,
    Bottom,
    Left,
    Top,
}

/// Bucket a pointer offset into a direction.
///
/// Screen coordinates: +y is down, so `Bottom` covers [45°, 135°). The
/// four 90° quadrants are half-open, which fixes every boundary angle:
/// 45°→bottom, 135°→left, 225°→top, 315°→right.
pub fn bucket_direction(dx: f64, dy: f64, deadzone: f64) -> Direction {
    if (dx * dx + dy * dy).sqrt() < deadzone {
        return Direction::None;
    }
    let mut angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    if !(45.0..315.0).contains(&angle) {
        Direction::Right
    } else if angle < 135.0 {
        Direction::Bottom
    } else if angle < 225.0 {
        Direction::Left
    } else {
        Direction::Top
    }
}

/// Directional action bindings of the radial menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLayout {
    pub right: MenuAction,
    pub bottom: MenuAction,
    pub left: MenuAction,
    pub top: MenuAction,
}

impl Default for MenuLayout {
    fn default() -> Self {
        Self {
            right: MenuAction::Listen,
            bottom: MenuAction::SaveSentence,
            left: MenuAction::Reset,
            top: MenuAction::MarkImportant,
        }
    }
}

impl MenuLayout {
    pub fn action_for(&self, direction: Direction) -> Option<MenuAction> {
        match direction {
            Direction::None => None,
            Direction::Right => Some(self.right),
            Direction::Bottom => Some(self.bottom),
            Direction::Left => Some(self.left),
            Direction::Top => Some(self.top),
        }
    }
}

/// Shift the menu center inward so all four directional targets stay
/// fully inside the viewport.
pub fn clamp_center(
    center: Point,
    viewport: Viewport,
    radius: f64,
    button_radius: f64,
    padding: f64,
) -> Point {
    let inset = radius + button_radius + padding;
    Point {
        x: clamp_axis(center.x, viewport.width, inset),
        y: clamp_axis(center.y, viewport.height, inset),
    }
}

fn clamp_axis(value: f64, extent: f64, inset: f64) -> f64 {
    if extent <= inset * 2.0 {
        return extent / 2.0;
    }
    value.clamp(inset, extent - inset)
}

// ============================================================
// Radial gesture session
// ============================================================

/// One armed radial-menu interaction.
///
/// Created when the long-press fires (origin fixed for the session's
/// lifetime), destroyed on release or explicit close.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGestureSession {
    origin: Point,
    deadzone: f64,
    current: Direction,
    committed: bool,
}

impl RadialGestureSession {
    pub fn new(origin: Point, deadzone: f64) -> Self {
        Self {
            origin,
            deadzone,
            current: Direction::None,
            committed: false,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn current_direction(&self) -> Direction {
        self.current
    }

    /// Recompute the armed direction from the current pointer position.
    pub fn pointer_move(&mut self, position: Point) -> Direction {
        if self.committed {
            return self.current;
        }
        self.current = bucket_direction(
            position.x - self.origin.x,
            position.y - self.origin.y,
            self.deadzone,
        );
        self.current
    }

    /// Commit on release.
    ///
    /// Returns the armed direction, or `None` when released inside the
    /// deadzone: a cancel, never an error. Either way the session is
    /// finished.
    pub fn release(&mut self) -> Option<Direction> {
        self.committed = true;
        match self.current {
            Direction::None => None,
            direction => Some(direction),
        }
    }
}

// ============================================================
// Long-press tracking
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum PressState {
    Idle,
    Pending { origin: Point, down_at_ms: i64 },
    Armed,
}

/// Outcome of feeding one pointer event to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressEvent {
    /// Nothing resolved yet.
    Ignored,
    /// Movement exceeded the slop radius before the threshold: plain drag.
    Cancelled,
    /// The long-press fired; the radial menu should open at `origin`.
    Armed { origin: Point },
    /// Released before the threshold: a tap.
    Tap { origin: Point },
}

/// Resolves a raw pointer stream into tap vs. long-press.
///
/// Timestamps are injected (epoch milliseconds) so resolution is
/// deterministic and testable without a clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressTracker {
    long_press_ms: i64,
    slop_px: f64,
    state: PressState,
}

impl PressTracker {
    pub fn new(long_press_ms: u64, slop_px: f64) -> Self {
        Self {
            long_press_ms: long_press_ms as i64,
            slop_px,
            state: PressState::Idle,
        }
    }

    pub fn pointer_down(&mut self, position: Point, at_ms: i64) {
        self.state = PressState::Pending {
            origin: position,
            down_at_ms: at_ms,
        };
    }

    pub fn pointer_move(&mut self, position: Point, at_ms: i64) -> PressEvent {
        match self.state {
            PressState::Pending { origin, down_at_ms } => {
                if at_ms - down_at_ms >= self.long_press_ms {
                    self.state = PressState::Armed;
                    return PressEvent::Armed { origin };
                }
                if origin.distance_to(position) > self.slop_px {
                    self.state = PressState::Idle;
                    return PressEvent::Cancelled;
                }
                PressEvent::Ignored
            }
            _ => PressEvent::Ignored,
        }
    }

    /// Arming check without pointer movement (driven by the host's timer
    /// tick or the next event loop turn).
    pub fn poll(&mut self, at_ms: i64) -> PressEvent {
        match self.state {
            PressState::Pending { origin, down_at_ms }
                if at_ms - down_at_ms >= self.long_press_ms =>
            {
                self.state = PressState::Armed;
                PressEvent::Armed { origin }
            }
            _ => PressEvent::Ignored,
        }
    }

    pub fn pointer_up(&mut self, at_ms: i64) -> PressEvent {
        let state = self.state;
        self.state = PressState::Idle;
        match state {
            PressState::Pending { origin, down_at_ms } => {
                if at_ms - down_at_ms < self.long_press_ms {
                    PressEvent::Tap { origin }
                } else {
                    // Fired and released in the same tick: armed with no
                    // direction, which release treats as cancel.
                    PressEvent::Armed { origin }
                }
            }
            _ => PressEvent::Ignored,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state == PressState::Armed
    }

    /// Teardown: drop any live press.
    pub fn cancel(&mut self) {
        self.state = PressState::Idle;
    }
}
