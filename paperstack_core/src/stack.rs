// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Left/right stack bookkeeping.
//!
//! Papers start on the right stack in registration order, the first paper
//! on top. Viewing a paper and moving on pushes it onto the left stack
//! (LIFO, visitation order); going back pops it. The model changes
//! synchronously; [`advance`](StackModel::advance),
//! [`retreat`](StackModel::retreat) and [`reset`](StackModel::reset) return
//! the target poses the animator should tween towards.
//!
//! Every paper except the current one rests with a small random yaw within
//! `±max_tilt`. A fresh yaw is drawn each time a paper changes stacks.

use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::paper::PaperId;
use crate::transform::PaperPose;

/// Anchor-space slots of both stacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackGeometry {
    /// Bottom slot of the right (unread) stack.
    pub right_base: [f64; 3],
    /// Bottom slot of the left (read) stack.
    pub left_base: [f64; 3],
    /// Height between neighbouring right-stack papers.
    pub right_gap: f64,
    /// Height between neighbouring left-stack papers.
    pub left_gap: f64,
}

impl StackGeometry {
    /// Two stacks side by side on a desk-sized anchor.
    #[must_use]
    pub const fn desk() -> Self {
        Self {
            right_base: [0.0, 0.0, 0.0],
            left_base: [-1.05, 0.0, 0.08],
            right_gap: 0.004,
            left_gap: 0.004,
        }
    }
}

impl Default for StackGeometry {
    fn default() -> Self {
        Self::desk()
    }
}

/// Which stack a paper is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StackSide {
    /// Already viewed.
    Left,
    /// Not yet viewed, including the current paper.
    Right,
}

/// A paper's place in the stacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackEntry {
    /// Paper.
    pub paper: PaperId,
    /// Stack the paper is on.
    pub side: StackSide,
    /// Height rank within its stack; larger is higher.
    pub order_index: usize,
    /// Yaw the paper rests at when it is not current.
    pub resting_rotation: f64,
}

/// Whether a navigation step honours the busy lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// No-op while busy; takes the lock otherwise.
    Normal,
    /// Ignores the lock; the caller serializes batched steps.
    Bypass,
}

/// Result of [`StackModel::advance`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Advance {
    /// Paper leaving for the left stack.
    pub outgoing: PaperId,
    /// Left-stack slot and fresh resting yaw for `outgoing`.
    pub outgoing_target: PaperPose,
    /// Paper that is now current; it flattens to yaw 0.
    pub incoming: PaperId,
}

/// Result of [`StackModel::retreat`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Retreat {
    /// Paper returning from the left stack; it becomes current.
    pub returning: PaperId,
    /// Right-stack slot for `returning`, flat.
    pub returning_target: PaperPose,
    /// Paper that was current.
    pub previous: PaperId,
    /// Persisted resting yaw `previous` tilts back to.
    pub previous_yaw: f64,
}

/// One paper of a reset cascade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResetStep {
    /// Paper returning to the right stack.
    pub paper: PaperId,
    /// Right-stack slot with a fresh resting yaw.
    pub target: PaperPose,
}

/// Result of [`StackModel::reset`].
#[derive(Clone, Debug, PartialEq)]
pub struct Reset {
    /// Papers in reverse order of having been moved left.
    pub steps: Vec<ResetStep>,
    /// The paper that was current, with the resting yaw it tilts back to.
    pub previous: Option<(PaperId, f64)>,
}

/// The left/right partition, the current paper, and resting rotations.
#[derive(Debug)]
pub struct StackModel {
    count: usize,
    left: Vec<PaperId>,
    current: Option<PaperId>,
    rotations: Vec<f64>,
    busy: bool,
    max_tilt: f64,
    geometry: StackGeometry,
    rng: SmallRng,
}

impl StackModel {
    /// Creates a model for `count` papers with no current paper yet.
    ///
    /// `max_tilt` is in radians. Initial resting yaws are drawn from `seed`.
    #[must_use]
    pub fn new(count: usize, geometry: StackGeometry, max_tilt: f64, seed: u64) -> Self {
        let max_tilt = if max_tilt.is_finite() {
            max_tilt.abs()
        } else {
            0.0
        };
        let mut rng = SmallRng::seed_from_u64(seed);
        let rotations = (0..count)
            .map(|_| rng.gen_range(-max_tilt..=max_tilt))
            .collect();
        Self {
            count,
            left: Vec::new(),
            current: None,
            rotations,
            busy: false,
            max_tilt,
            geometry,
            rng,
        }
    }

    /// Number of papers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the model holds no papers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The current paper, if the stack has been activated.
    #[must_use]
    pub fn current(&self) -> Option<PaperId> {
        self.current
    }

    /// Left stack, bottom to top.
    #[must_use]
    pub fn left(&self) -> &[PaperId] {
        &self.left
    }

    /// Right stack, top (current) to bottom.
    pub fn right(&self) -> impl Iterator<Item = PaperId> + '_ {
        (0..self.count)
            .map(paper_at)
            .filter(|id| !self.left.contains(id))
    }

    /// Whether the busy lock is held.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Releases the busy lock. Called when a gated transition settles,
    /// however it ended.
    pub fn release(&mut self) {
        self.busy = false;
    }

    /// Largest resting yaw, radians.
    #[must_use]
    pub fn max_tilt(&self) -> f64 {
        self.max_tilt
    }

    /// Slot geometry.
    #[must_use]
    pub fn geometry(&self) -> &StackGeometry {
        &self.geometry
    }

    /// Makes the top right-stack paper current if nothing is.
    ///
    /// Returns the new current paper when this call set it.
    pub fn activate(&mut self) -> Option<PaperId> {
        if self.current.is_some() {
            return None;
        }
        self.current = self.right().next();
        self.current
    }

    /// Which stack `paper` is on.
    #[must_use]
    pub fn side_of(&self, paper: PaperId) -> Option<StackSide> {
        if paper.index() >= self.count {
            None
        } else if self.left.contains(&paper) {
            Some(StackSide::Left)
        } else {
            Some(StackSide::Right)
        }
    }

    /// Persisted resting yaw of `paper`.
    #[must_use]
    pub fn resting_rotation(&self, paper: PaperId) -> Option<f64> {
        self.rotations.get(paper.index()).copied()
    }

    /// Right-stack slot for `paper`; the first paper is highest.
    #[must_use]
    pub fn right_slot(&self, paper: PaperId) -> [f64; 3] {
        let rank = self.count.saturating_sub(1 + paper.index());
        lift(self.geometry.right_base, rank as f64 * self.geometry.right_gap)
    }

    /// Left-stack slot for stack position `position` (0 is the bottom).
    #[must_use]
    pub fn left_slot(&self, position: usize) -> [f64; 3] {
        lift(self.geometry.left_base, position as f64 * self.geometry.left_gap)
    }

    /// Where `paper` rests in the current model state.
    #[must_use]
    pub fn rest_pose(&self, paper: PaperId) -> Option<PaperPose> {
        let yaw = if self.current == Some(paper) {
            0.0
        } else {
            self.resting_rotation(paper)?
        };
        let position = match self.left.iter().position(|&p| p == paper) {
            Some(pos) => self.left_slot(pos),
            None => self.right_slot(paper),
        };
        Some(PaperPose::new(position, yaw))
    }

    /// Render priority at rest: higher draws over lower.
    #[must_use]
    pub fn render_priority(&self, paper: PaperId) -> i32 {
        let rank = match self.left.iter().position(|&p| p == paper) {
            Some(pos) => pos,
            None => self.count.saturating_sub(paper.index()),
        };
        i32::try_from(rank).unwrap_or(i32::MAX)
    }

    /// Snapshot of every paper's stack entry, in registration order.
    #[must_use]
    pub fn entries(&self) -> Vec<StackEntry> {
        (0..self.count)
            .map(|i| {
                let paper = paper_at(i);
                let (side, order_index) = match self.left.iter().position(|&p| p == paper) {
                    Some(pos) => (StackSide::Left, pos),
                    None => (StackSide::Right, self.count - 1 - i),
                };
                StackEntry {
                    paper,
                    side,
                    order_index,
                    resting_rotation: self.rotations[i],
                }
            })
            .collect()
    }

    /// Moves the current paper to the left stack and makes the next one
    /// current.
    ///
    /// No-op (returns `None`) at the last paper, before activation, or when
    /// `gate` is [`Gate::Normal`] and the lock is held. A normal step takes
    /// the lock.
    pub fn advance(&mut self, gate: Gate) -> Option<Advance> {
        if gate == Gate::Normal && self.busy {
            return None;
        }
        let outgoing = self.current?;
        if outgoing.index() + 1 >= self.count {
            return None;
        }
        let incoming = paper_at(outgoing.index() + 1);
        let yaw = self.fresh_tilt();
        self.rotations[outgoing.index()] = yaw;
        self.left.push(outgoing);
        self.current = Some(incoming);
        if gate == Gate::Normal {
            self.busy = true;
        }
        Some(Advance {
            outgoing,
            outgoing_target: PaperPose::new(self.left_slot(self.left.len() - 1), yaw),
            incoming,
        })
    }

    /// Pops the top of the left stack back to current.
    ///
    /// No-op at the first paper, before activation, or when gated and busy.
    pub fn retreat(&mut self, gate: Gate) -> Option<Retreat> {
        if gate == Gate::Normal && self.busy {
            return None;
        }
        let previous = self.current?;
        let returning = self.left.pop()?;
        self.current = Some(returning);
        if gate == Gate::Normal {
            self.busy = true;
        }
        Some(Retreat {
            returning,
            returning_target: PaperPose::new(self.right_slot(returning), 0.0),
            previous,
            previous_yaw: self.rotations[previous.index()],
        })
    }

    /// Returns every left-stack paper to the right stack.
    ///
    /// The most recently moved paper comes first. Each gets a fresh resting
    /// yaw, and afterwards the first paper is current again. Not gated: a
    /// reset supersedes whatever is in flight.
    pub fn reset(&mut self) -> Reset {
        let previous = self.current.map(|p| (p, self.rotations[p.index()]));
        let mut steps = Vec::with_capacity(self.left.len());
        while let Some(paper) = self.left.pop() {
            let yaw = self.fresh_tilt();
            self.rotations[paper.index()] = yaw;
            steps.push(ResetStep {
                paper,
                target: PaperPose::new(self.right_slot(paper), yaw),
            });
        }
        if self.count > 0 {
            self.current = Some(paper_at(0));
        }
        self.busy = false;
        Reset { steps, previous }
    }

    fn fresh_tilt(&mut self) -> f64 {
        self.rng.gen_range(-self.max_tilt..=self.max_tilt)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "paper counts are far below u32::MAX"
)]
fn paper_at(index: usize) -> PaperId {
    PaperId(index as u32)
}

fn lift(base: [f64; 3], dy: f64) -> [f64; 3] {
    [base[0], base[1] + dy, base[2]]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILT: f64 = 2.0 * core::f64::consts::PI / 180.0;

    fn model(n: usize) -> StackModel {
        let mut m = StackModel::new(n, StackGeometry::desk(), TILT, 7);
        m.activate();
        m
    }

    #[test]
    fn starts_without_current_until_activated() {
        let mut m = StackModel::new(3, StackGeometry::desk(), TILT, 1);
        assert_eq!(m.current(), None);
        assert!(m.advance(Gate::Normal).is_none());
        assert_eq!(m.activate(), Some(PaperId(0)));
        assert_eq!(m.activate(), None, "already active");
    }

    #[test]
    fn advance_at_last_paper_is_noop() {
        let mut m = model(3);
        m.advance(Gate::Bypass).unwrap();
        m.advance(Gate::Bypass).unwrap();
        assert_eq!(m.current(), Some(PaperId(2)));
        let before = m.entries();
        assert!(m.advance(Gate::Bypass).is_none());
        assert_eq!(m.current(), Some(PaperId(2)));
        assert_eq!(m.entries(), before);
    }

    #[test]
    fn retreat_at_first_paper_is_noop() {
        let mut m = model(3);
        assert!(m.retreat(Gate::Normal).is_none());
        assert!(!m.is_busy(), "no-op does not take the lock");
    }

    #[test]
    fn busy_lock_gates_normal_steps_only() {
        let mut m = model(4);
        assert!(m.advance(Gate::Normal).is_some());
        assert!(m.is_busy());
        assert!(m.advance(Gate::Normal).is_none());
        assert_eq!(m.current(), Some(PaperId(1)));
        assert!(m.advance(Gate::Bypass).is_some());
        assert_eq!(m.current(), Some(PaperId(2)));
        m.release();
        assert!(m.retreat(Gate::Normal).is_some());
        assert_eq!(m.current(), Some(PaperId(1)));
    }

    #[test]
    fn left_stack_grows_upward() {
        let mut m = model(4);
        let a = m.advance(Gate::Bypass).unwrap();
        let b = m.advance(Gate::Bypass).unwrap();
        assert_eq!(m.left(), [PaperId(0), PaperId(1)]);
        assert!(b.outgoing_target.height() > a.outgoing_target.height());
        for t in [a.outgoing_target, b.outgoing_target] {
            assert!(t.yaw.abs() <= TILT, "tilt {} out of bounds", t.yaw);
        }
    }

    #[test]
    fn retreat_returns_to_right_slot() {
        let mut m = model(3);
        let original = m.right_slot(PaperId(0));
        m.advance(Gate::Bypass).unwrap();
        let r = m.retreat(Gate::Bypass).unwrap();
        assert_eq!(r.returning, PaperId(0));
        assert_eq!(r.previous, PaperId(1));
        assert_eq!(r.returning_target, PaperPose::new(original, 0.0));
        assert_eq!(Some(r.previous_yaw), m.resting_rotation(PaperId(1)));
        assert!(r.previous_yaw.abs() <= TILT);
        assert!(m.left().is_empty());
    }

    #[test]
    fn right_stack_puts_first_paper_on_top() {
        let m = model(3);
        let heights: Vec<f64> = (0..3).map(|i| m.right_slot(PaperId(i))[1]).collect();
        assert!(heights[0] > heights[1] && heights[1] > heights[2]);
        assert!(m.render_priority(PaperId(0)) > m.render_priority(PaperId(2)));
        assert_eq!(m.right().collect::<Vec<_>>(), [PaperId(0), PaperId(1), PaperId(2)]);
    }

    #[test]
    fn reset_cascades_most_recent_first() {
        let mut m = model(4);
        for _ in 0..3 {
            m.advance(Gate::Bypass).unwrap();
        }
        let reset = m.reset();
        let order: Vec<_> = reset.steps.iter().map(|s| s.paper).collect();
        assert_eq!(order, [PaperId(2), PaperId(1), PaperId(0)]);
        assert_eq!(reset.previous.map(|(p, _)| p), Some(PaperId(3)));
        assert_eq!(m.current(), Some(PaperId(0)));
        assert!(m.left().is_empty());
        for step in &reset.steps {
            assert_eq!(step.target.position, m.right_slot(step.paper));
            assert!(step.target.yaw.abs() <= TILT);
        }
    }

    #[test]
    fn rest_pose_flattens_current_only() {
        let m = model(2);
        assert_eq!(m.rest_pose(PaperId(0)).unwrap().yaw, 0.0);
        assert_eq!(m.rest_pose(PaperId(1)).unwrap().yaw, m.resting_rotation(PaperId(1)).unwrap());
        assert!(m.rest_pose(PaperId(5)).is_none());
    }

    #[test]
    fn zero_tilt_is_allowed() {
        let mut m = StackModel::new(2, StackGeometry::desk(), 0.0, 3);
        m.activate();
        let a = m.advance(Gate::Normal).unwrap();
        assert_eq!(a.outgoing_target.yaw, 0.0);
    }
}
