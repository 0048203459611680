// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-stage pose tweens.
//!
//! A [`Tween`] is a pure function of time: it owns its start pose, target,
//! start time and duration, and [`Tween::sample`] returns the pose for any
//! `now` plus whether the tween is finished. Nothing here schedules frames;
//! the [`Animator`](crate::animator::Animator) samples every active tween
//! once per tick.
//!
//! Advance paths have three equal stages:
//!
//! ```text
//!   rise       lateral        descend
//!  ┌──────┐┌─────────────┐┌──────────┐
//!  y: start → peak   (held at peak)   peak → target
//!  xz: start         start → target   target
//!  yaw: split·Δ      remaining Δ      pinned at target
//! ```
//!
//! Retreat paths have two: a lateral move at a raised height with the first
//! part of the rotation, then a descent with the rest.

use crate::time::{Duration, HostTime};
use crate::transform::PaperPose;

/// Timing and shape parameters for one kind of navigation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    /// Total tween duration.
    pub duration: Duration,
    /// Delay between the starts of batched or cascaded steps.
    pub stagger: Duration,
    /// Rise above the start height during an advance.
    pub peak_lift: f64,
    /// Clearance above the higher endpoint during a retreat.
    pub retreat_lift: f64,
    /// Fraction of the yaw change applied in the first stage.
    pub rotation_split: f64,
}

impl MotionConfig {
    /// Direct navigation (next/previous, jumps).
    #[must_use]
    pub const fn direct() -> Self {
        Self {
            duration: Duration::from_millis(650),
            stagger: Duration::from_millis(180),
            peak_lift: 0.12,
            retreat_lift: 0.03,
            rotation_split: 0.5,
        }
    }

    /// Stack reset cascades.
    #[must_use]
    pub const fn cascade() -> Self {
        Self {
            duration: Duration::from_millis(400),
            stagger: Duration::from_millis(150),
            ..Self::direct()
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self::direct()
    }
}

/// Whether a tween needs more frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenStatus {
    /// Sample again next frame.
    Continue,
    /// The returned pose is the exact target.
    Done,
}

/// Ease-in/ease-out on `[0, 1]`.
#[must_use]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Path shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenKind {
    /// Rise, lateral, descend.
    Advance,
    /// Raised lateral, descend.
    Retreat,
    /// Yaw only; position is held.
    Rotation,
}

/// A time-parameterized pose animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    kind: TweenKind,
    from: PaperPose,
    to: PaperPose,
    begin: HostTime,
    duration: Duration,
    lift: f64,
    split: f64,
}

impl Tween {
    /// A three-stage advance from `from` to `to`.
    #[must_use]
    pub fn advance(from: PaperPose, to: PaperPose, begin: HostTime, motion: &MotionConfig) -> Self {
        Self {
            kind: TweenKind::Advance,
            from,
            to,
            begin,
            duration: motion.duration,
            lift: motion.peak_lift,
            split: motion.rotation_split.clamp(0.0, 1.0),
        }
    }

    /// A two-stage retreat from `from` to `to`.
    #[must_use]
    pub fn retreat(from: PaperPose, to: PaperPose, begin: HostTime, motion: &MotionConfig) -> Self {
        Self {
            kind: TweenKind::Retreat,
            from,
            to,
            begin,
            duration: motion.duration,
            lift: motion.retreat_lift,
            split: motion.rotation_split.clamp(0.0, 1.0),
        }
    }

    /// A yaw-only tween at `from`'s position.
    #[must_use]
    pub fn rotation(from: PaperPose, yaw: f64, begin: HostTime, motion: &MotionConfig) -> Self {
        Self {
            kind: TweenKind::Rotation,
            from,
            to: from.with_yaw(yaw),
            begin,
            duration: motion.duration,
            lift: 0.0,
            split: 1.0,
        }
    }

    /// Path shape.
    #[must_use]
    pub fn kind(&self) -> TweenKind {
        self.kind
    }

    /// Final pose.
    #[must_use]
    pub fn target(&self) -> PaperPose {
        self.to
    }

    /// Start time; may be in the future for staggered steps.
    #[must_use]
    pub fn begin(&self) -> HostTime {
        self.begin
    }

    /// Time at which the tween reaches its target.
    #[must_use]
    pub fn end(&self) -> HostTime {
        self.begin + self.duration
    }

    /// Overall progress in `[0, 1]` at `now`.
    #[must_use]
    pub fn progress(&self, now: HostTime) -> f64 {
        self.duration
            .progress(now.saturating_duration_since(self.begin))
    }

    /// Pose at `now` and whether the tween has finished.
    #[must_use]
    pub fn sample(&self, now: HostTime) -> (PaperPose, TweenStatus) {
        let p = self.progress(now);
        if p >= 1.0 {
            return (self.to, TweenStatus::Done);
        }
        let pose = match self.kind {
            TweenKind::Advance => self.sample_advance(p),
            TweenKind::Retreat => self.sample_retreat(p),
            TweenKind::Rotation => {
                self.from
                    .with_yaw(lerp(self.from.yaw, self.to.yaw, smoothstep(p)))
            }
        };
        (pose, TweenStatus::Continue)
    }

    fn sample_advance(&self, p: f64) -> PaperPose {
        let [x0, y0, z0] = self.from.position;
        let [x1, y1, z1] = self.to.position;
        let peak = y0 + self.lift;
        let first = self.from.yaw + (self.to.yaw - self.from.yaw) * self.split;
        if p < 1.0 / 3.0 {
            let s = smoothstep(p * 3.0);
            PaperPose::new([x0, lerp(y0, peak, s), z0], lerp(self.from.yaw, first, s))
        } else if p < 2.0 / 3.0 {
            let s = smoothstep((p - 1.0 / 3.0) * 3.0);
            PaperPose::new(
                [lerp(x0, x1, s), peak, lerp(z0, z1, s)],
                lerp(first, self.to.yaw, s),
            )
        } else {
            let s = smoothstep((p - 2.0 / 3.0) * 3.0);
            PaperPose::new([x1, lerp(peak, y1, s), z1], self.to.yaw)
        }
    }

    fn sample_retreat(&self, p: f64) -> PaperPose {
        let [x0, y0, z0] = self.from.position;
        let [x1, y1, z1] = self.to.position;
        let travel = y0.max(y1) + self.lift;
        let first = self.from.yaw + (self.to.yaw - self.from.yaw) * self.split;
        if p < 0.5 {
            let s = smoothstep(p * 2.0);
            PaperPose::new(
                [lerp(x0, x1, s), lerp(y0, travel, s), lerp(z0, z1, s)],
                lerp(self.from.yaw, first, s),
            )
        } else {
            let s = smoothstep((p - 0.5) * 2.0);
            PaperPose::new([x1, lerp(travel, y1, s), z1], lerp(first, self.to.yaw, s))
        }
    }
}
