// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-paper tween ownership.
//!
//! Each paper has at most one active [`Tween`]. Starting another for the same
//! paper cancels the first, so two writers never compete for one pose.
//! Every started tween gets a [`TweenToken`]; a token is *settled* once its
//! tween finished or was cancelled, which is what navigation jobs wait on.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::paper::PaperId;
use crate::time::HostTime;
use crate::transform::PaperPose;
use crate::tween::{Tween, TweenStatus};

/// Identifies one started tween.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenToken(pub u64);

#[derive(Clone, Copy, Debug)]
struct Active {
    token: TweenToken,
    tween: Tween,
}

/// How a tween left the animator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenEnd {
    /// Reached its target.
    Finished,
    /// Superseded or cancelled.
    Cancelled,
}

/// Output of one [`Animator::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimatorFrame {
    /// New pose for every paper with an active tween, in id order.
    pub poses: Vec<(PaperId, PaperPose)>,
    /// Tweens that reached their target this tick.
    pub finished: Vec<(PaperId, TweenToken)>,
}

/// Owns the active tween of every animating paper.
#[derive(Debug, Default)]
pub struct Animator {
    active: BTreeMap<PaperId, Active>,
    live: BTreeSet<TweenToken>,
    next_token: u64,
}

impl Animator {
    /// Creates an idle animator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `tween` for `paper`, cancelling any tween it already has.
    ///
    /// Returns the new token and the cancelled one, if any.
    pub fn start(&mut self, paper: PaperId, tween: Tween) -> (TweenToken, Option<TweenToken>) {
        let cancelled = self.cancel(paper);
        let token = TweenToken(self.next_token);
        self.next_token += 1;
        self.live.insert(token);
        self.active.insert(paper, Active { token, tween });
        (token, cancelled)
    }

    /// Cancels the active tween of `paper`. The pose stays where the last
    /// tick left it.
    pub fn cancel(&mut self, paper: PaperId) -> Option<TweenToken> {
        let old = self.active.remove(&paper)?;
        self.live.remove(&old.token);
        Some(old.token)
    }

    /// Cancels every active tween.
    pub fn cancel_all(&mut self) -> Vec<(PaperId, TweenToken)> {
        let out = self
            .active
            .iter()
            .map(|(&paper, a)| (paper, a.token))
            .collect();
        self.active.clear();
        self.live.clear();
        out
    }

    /// Whether `token`'s tween has finished or been cancelled.
    #[must_use]
    pub fn is_settled(&self, token: TweenToken) -> bool {
        !self.live.contains(&token)
    }

    /// Whether `paper` has an active tween.
    #[must_use]
    pub fn is_animating(&self, paper: PaperId) -> bool {
        self.active.contains_key(&paper)
    }

    /// Whether no tween is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of active tweens.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// The active tween of `paper`.
    #[must_use]
    pub fn tween(&self, paper: PaperId) -> Option<&Tween> {
        self.active.get(&paper).map(|a| &a.tween)
    }

    /// Progress of the tween owning `token`, or `None` once settled.
    #[must_use]
    pub fn progress(&self, token: TweenToken, now: HostTime) -> Option<f64> {
        self.active
            .values()
            .find(|a| a.token == token)
            .map(|a| a.tween.progress(now))
    }

    /// Samples every active tween at `now` and retires finished ones.
    pub fn tick(&mut self, now: HostTime) -> AnimatorFrame {
        let mut frame = AnimatorFrame::default();
        for (&paper, a) in &self.active {
            let (pose, status) = a.tween.sample(now);
            frame.poses.push((paper, pose));
            if status == TweenStatus::Done {
                frame.finished.push((paper, a.token));
            }
        }
        for &(paper, token) in &frame.finished {
            self.active.remove(&paper);
            self.live.remove(&token);
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Duration;
    use crate::tween::MotionConfig;

    fn motion() -> MotionConfig {
        MotionConfig {
            duration: Duration::from_millis(100),
            ..MotionConfig::direct()
        }
    }

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    #[test]
    fn restarting_cancels_previous_tween() {
        let mut a = Animator::new();
        let p = PaperId(0);
        let from = PaperPose::default();
        let (first, none) = a.start(p, Tween::rotation(from, 0.1, ms(0), &motion()));
        assert!(none.is_none());
        let (second, cancelled) = a.start(p, Tween::rotation(from, -0.1, ms(0), &motion()));
        assert_eq!(cancelled, Some(first));
        assert!(a.is_settled(first));
        assert!(!a.is_settled(second));
        assert_eq!(a.active_count(), 1);
        assert_eq!(a.tween(p).unwrap().target().yaw, -0.1);
    }

    #[test]
    fn tick_reports_poses_and_retires_finished() {
        let mut a = Animator::new();
        let from = PaperPose::default();
        let (short, _) = a.start(PaperId(1), Tween::rotation(from, 0.1, ms(0), &motion()));
        let (long, _) = a.start(
            PaperId(2),
            Tween::rotation(
                from,
                0.1,
                ms(0),
                &MotionConfig {
                    duration: Duration::from_millis(300),
                    ..motion()
                },
            ),
        );

        let frame = a.tick(ms(50));
        assert_eq!(frame.poses.len(), 2);
        assert!(frame.finished.is_empty());
        assert_eq!(a.progress(long, ms(150)), Some(0.5));

        let frame = a.tick(ms(100));
        assert_eq!(frame.finished, [(PaperId(1), short)]);
        assert_eq!(frame.poses[0], (PaperId(1), from.with_yaw(0.1)));
        assert!(a.is_settled(short));
        assert!(!a.is_animating(PaperId(1)));
        assert!(a.is_animating(PaperId(2)));

        a.tick(ms(300));
        assert!(a.is_idle());
        assert!(a.is_settled(long));
        assert_eq!(a.progress(long, ms(300)), None);
    }

    #[test]
    fn cancel_all_settles_everything() {
        let mut a = Animator::new();
        let from = PaperPose::default();
        let (t0, _) = a.start(PaperId(0), Tween::rotation(from, 0.1, ms(0), &motion()));
        let (t1, _) = a.start(PaperId(1), Tween::rotation(from, 0.1, ms(0), &motion()));
        assert_eq!(a.cancel_all().len(), 2);
        assert!(a.is_settled(t0) && a.is_settled(t1));
        assert!(a.tick(ms(10)).poses.is_empty());
    }
}
