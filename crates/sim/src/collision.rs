//! Block collision resolution.
//!
//! For every obstacle overlapping the body, four separation depths are
//! measured and the body is pushed out along the shallowest one. Ties go to
//! the first side in [`Side::PRECEDENCE`].
//!
//! The overlap list is computed once against the tentative rect. Obstacles
//! are then resolved one after another in the order given, each measuring
//! depths against the rect as already corrected by earlier obstacles, without
//! re-testing overlap. Two simultaneous contacts can therefore leave the body
//! in an inconsistent spot; this is accepted and never reported as an error.

use crate::rect::Rect;
use crate::vec2::Vec2;

/// Side of the obstacle the body is pushed out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Body lands on the obstacle's top edge (ground contact).
    Top,
    /// Body hits the obstacle's bottom edge from below.
    Bottom,
    /// Body is pushed out through the obstacle's left edge.
    Left,
    /// Body is pushed out through the obstacle's right edge.
    Right,
}

impl Side {
    /// Tie-break order between equal depths.
    pub const PRECEDENCE: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];
}

/// Contacts found during one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Contacts {
    pub ground: bool,
    pub ceiling: bool,
    pub left_wall: bool,
    pub right_wall: bool,
}

impl Contacts {
    fn record(&mut self, side: Side) {
        match side {
            Side::Top => self.ground = true,
            Side::Bottom => self.ceiling = true,
            Side::Left => self.right_wall = true,
            Side::Right => self.left_wall = true,
        }
    }
}

/// Separation depths `[top, bottom, left, right]` between `body` and `obstacle`.
pub fn separation_depths(body: &Rect, obstacle: &Rect) -> [f64; 4] {
    [
        (body.bottom() - obstacle.top()).abs(),
        (body.top() - obstacle.bottom()).abs(),
        (body.right() - obstacle.left()).abs(),
        (body.left() - obstacle.right()).abs(),
    ]
}

/// Side with the minimum depth. A later side wins only when strictly smaller.
pub fn pick_side(body: &Rect, obstacle: &Rect) -> Side {
    let depths = separation_depths(body, obstacle);
    let mut best = 0;
    for (idx, depth) in depths.iter().enumerate().skip(1) {
        if *depth < depths[best] {
            best = idx;
        }
    }
    Side::PRECEDENCE[best]
}

/// Snap one edge of `body` to `obstacle` and zero velocity on that axis.
fn push_out(body: &mut Rect, velocity: &mut Vec2, obstacle: &Rect, side: Side) {
    match side {
        Side::Top => {
            body.set_bottom(obstacle.top());
            velocity.y = 0.0;
        }
        Side::Bottom => {
            body.set_top(obstacle.bottom());
            velocity.y = 0.0;
        }
        Side::Left => {
            body.set_right(obstacle.left());
            velocity.x = 0.0;
        }
        Side::Right => {
            body.set_left(obstacle.right());
            velocity.x = 0.0;
        }
    }
}

/// Resolve `body` against `obstacles`, mutating its rect and velocity.
pub fn resolve_collisions<'a, I>(body: &mut Rect, velocity: &mut Vec2, obstacles: I) -> Contacts
where
    I: IntoIterator<Item = &'a Rect>,
{
    let tentative = *body;
    let hits: Vec<&Rect> = obstacles
        .into_iter()
        .filter(|o| tentative.intersects(o))
        .collect();

    let mut contacts = Contacts::default();
    for obstacle in hits {
        let side = pick_side(body, obstacle);
        push_out(body, velocity, obstacle, side);
        contacts.record(side);
    }
    contacts
}
