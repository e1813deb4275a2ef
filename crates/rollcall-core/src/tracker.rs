//! Presence tracking: decides check-in, check-out or cooldown per sighting.
//!
//! A recognized face whose center stays inside the zone for the dwell
//! interval triggers a check-out, after which the name cools down and new
//! check-ins are suppressed. Every other non-suppressed sighting carries a
//! check-in, which the recorder treats idempotently.

use crate::types::BoundingBox;
use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;

/// Rectangular "badge reader" region of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Zone {
    /// A `zone_width × zone_height` rectangle centered in the frame.
    pub fn centered(frame_width: u32, frame_height: u32, zone_width: u32, zone_height: u32) -> Self {
        let cx = (frame_width / 2) as f32;
        let cy = (frame_height / 2) as f32;
        let hw = (zone_width / 2) as f32;
        let hh = (zone_height / 2) as f32;
        Self {
            left: cx - hw,
            top: cy - hh,
            right: cx + hw,
            bottom: cy + hh,
        }
    }

    /// Strict containment; points on the border are outside.
    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        self.left < x && x < self.right && self.top < y && y < self.bottom
    }
}

/// A recognized face in one frame.
#[derive(Debug, Clone)]
pub struct Sighting {
    pub name: String,
    pub bbox: BoundingBox,
    pub similarity: f32,
}

/// Attendance write requested by a tracker outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckIn,
    CheckOut,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CheckIn => f.write_str("check-in"),
            Action::CheckOut => f.write_str("check-out"),
        }
    }
}

/// Per-sighting decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Name is cooling down after a check-out.
    Suppressed { remaining: Duration },
    /// Outside the zone with no dwell timer running.
    CheckIn,
    /// Inside the zone; `dwell` is zero on the frame the timer starts.
    Tracking { dwell: Duration },
    /// Dwell threshold reached.
    CheckOut,
    /// Was dwelling, now outside the zone; dwell timer reset.
    LeftZone,
}

impl Outcome {
    /// Recorder actions implied by this outcome, in order.
    pub fn actions(&self) -> &'static [Action] {
        match self {
            Outcome::Suppressed { .. } => &[],
            Outcome::CheckOut => &[Action::CheckIn, Action::CheckOut],
            Outcome::CheckIn | Outcome::Tracking { .. } | Outcome::LeftZone => &[Action::CheckIn],
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Suppressed { remaining } => {
                write!(f, "cooldown ({}s left)", remaining.num_seconds())
            }
            Outcome::CheckIn => f.write_str("seen"),
            Outcome::Tracking { dwell } => write!(f, "in zone ({}ms)", dwell.num_milliseconds()),
            Outcome::CheckOut => f.write_str("logout"),
            Outcome::LeftZone => f.write_str("left zone"),
        }
    }
}

/// Timing thresholds for the tracker.
#[derive(Debug, Clone, Copy)]
pub struct PresencePolicy {
    /// Suppression window after a check-out.
    pub cooldown: Duration,
    /// Continuous zone presence needed for a check-out.
    pub dwell: Duration,
    /// A dwell timer is dropped when its face has not been seen for this long.
    pub lost_after: Duration,
}

impl Default for PresencePolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::seconds(60),
            dwell: Duration::seconds(2),
            lost_after: Duration::milliseconds(1000),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Dwell {
    since: NaiveDateTime,
    last_seen: NaiveDateTime,
}

/// Dwell timers and cooldowns, keyed by employee name.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    policy: PresencePolicy,
    tracking: HashMap<String, Dwell>,
    cooldowns: HashMap<String, NaiveDateTime>,
}

impl PresenceTracker {
    pub fn new(policy: PresencePolicy) -> Self {
        Self {
            policy,
            tracking: HashMap::new(),
            cooldowns: HashMap::new(),
        }
    }

    /// Drop expired cooldowns and dwell timers whose face has gone missing.
    pub fn sweep(&mut self, now: NaiveDateTime) {
        let cooldown = self.policy.cooldown;
        let lost_after = self.policy.lost_after;

        self.cooldowns.retain(|name, at| {
            let keep = now - *at < cooldown;
            if !keep {
                tracing::debug!(name = %name, "cooldown expired");
            }
            keep
        });
        self.tracking.retain(|name, d| {
            let keep = now - d.last_seen < lost_after;
            if !keep {
                tracing::debug!(name = %name, "dwell timer dropped, face lost");
            }
            keep
        });
    }

    /// Sweep, then decide an outcome for each sighting, in order.
    pub fn observe_frame(
        &mut self,
        sightings: &[Sighting],
        zone: &Zone,
        now: NaiveDateTime,
    ) -> Vec<Outcome> {
        self.sweep(now);
        sightings
            .iter()
            .map(|s| self.observe(&s.name, s.bbox.center(), zone, now))
            .collect()
    }

    /// Decide the outcome for one recognized face.
    pub fn observe(
        &mut self,
        name: &str,
        center: (f32, f32),
        zone: &Zone,
        now: NaiveDateTime,
    ) -> Outcome {
        if let Some(remaining) = self.cooldown_remaining(name, now) {
            return Outcome::Suppressed { remaining };
        }
        self.cooldowns.remove(name);

        if !zone.contains(center) {
            return if self.tracking.remove(name).is_some() {
                Outcome::LeftZone
            } else {
                Outcome::CheckIn
            };
        }

        let Some(dwell) = self.tracking.get_mut(name) else {
            self.tracking.insert(
                name.to_string(),
                Dwell {
                    since: now,
                    last_seen: now,
                },
            );
            return Outcome::Tracking {
                dwell: Duration::zero(),
            };
        };

        dwell.last_seen = now;
        let elapsed = now - dwell.since;
        if elapsed >= self.policy.dwell {
            self.tracking.remove(name);
            self.cooldowns.insert(name.to_string(), now);
            Outcome::CheckOut
        } else {
            Outcome::Tracking { dwell: elapsed }
        }
    }

    /// Time left on `name`'s cooldown, or `None` if it is not cooling down.
    pub fn cooldown_remaining(&self, name: &str, now: NaiveDateTime) -> Option<Duration> {
        let at = self.cooldowns.get(name)?;
        let elapsed = now - *at;
        (elapsed < self.policy.cooldown).then(|| self.policy.cooldown - elapsed)
    }

    /// Start a cooldown for `name` outside of the dwell flow.
    pub fn start_cooldown(&mut self, name: &str, now: NaiveDateTime) {
        self.tracking.remove(name);
        self.cooldowns.insert(name.to_string(), now);
    }

    /// Remove the cooldown for `name` if it has run out.
    pub fn clear_expired_cooldown(&mut self, name: &str, now: NaiveDateTime) {
        if self.cooldown_remaining(name, now).is_none() {
            self.cooldowns.remove(name);
        }
    }

    pub fn is_tracking(&self, name: &str) -> bool {
        self.tracking.contains_key(name)
    }

    pub fn cooling_down(&self) -> usize {
        self.cooldowns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap()
    }

    fn zone() -> Zone {
        Zone::centered(640, 480, 180, 180)
    }

    const INSIDE: (f32, f32) = (320.0, 240.0);
    const OUTSIDE: (f32, f32) = (50.0, 50.0);

    #[test]
    fn test_zone_centered_bounds() {
        let z = zone();
        assert_eq!((z.left, z.top, z.right, z.bottom), (230.0, 150.0, 410.0, 330.0));
    }

    #[test]
    fn test_zone_border_is_outside() {
        let z = zone();
        assert!(z.contains(INSIDE));
        assert!(!z.contains((230.0, 240.0)));
        assert!(!z.contains((320.0, 330.0)));
        assert!(z.contains((230.5, 150.5)));
    }

    #[test]
    fn test_outside_zone_is_plain_check_in() {
        let mut t = PresenceTracker::default();
        let out = t.observe("alice", OUTSIDE, &zone(), at(9, 0, 0, 0));
        assert_eq!(out, Outcome::CheckIn);
        assert_eq!(out.actions(), &[Action::CheckIn]);
    }

    #[test]
    fn test_dwell_triggers_check_out_after_two_seconds() {
        let mut t = PresenceTracker::new(PresencePolicy::default());
        let z = zone();

        assert_eq!(
            t.observe("alice", INSIDE, &z, at(9, 0, 0, 0)),
            Outcome::Tracking { dwell: Duration::zero() }
        );
        assert_eq!(
            t.observe("alice", INSIDE, &z, at(9, 0, 1, 999)),
            Outcome::Tracking { dwell: Duration::milliseconds(1999) }
        );
        let out = t.observe("alice", INSIDE, &z, at(9, 0, 2, 0));
        assert_eq!(out, Outcome::CheckOut);
        assert_eq!(out.actions(), &[Action::CheckIn, Action::CheckOut]);
        assert!(!t.is_tracking("alice"));
    }

    #[test]
    fn test_leaving_zone_resets_dwell() {
        let mut t = PresenceTracker::default();
        let z = zone();

        t.observe("alice", INSIDE, &z, at(9, 0, 0, 0));
        assert_eq!(t.observe("alice", OUTSIDE, &z, at(9, 0, 1, 500)), Outcome::LeftZone);
        assert_eq!(
            t.observe("alice", INSIDE, &z, at(9, 0, 2, 100)),
            Outcome::Tracking { dwell: Duration::zero() }
        );
        assert_eq!(
            t.observe("alice", INSIDE, &z, at(9, 0, 3, 0)),
            Outcome::Tracking { dwell: Duration::milliseconds(900) }
        );
        assert_eq!(t.observe("alice", INSIDE, &z, at(9, 0, 4, 100)), Outcome::CheckOut);
    }

    #[test]
    fn test_cooldown_suppresses_for_sixty_seconds() {
        let mut t = PresenceTracker::default();
        let z = zone();

        t.observe("alice", INSIDE, &z, at(9, 0, 0, 0));
        assert_eq!(t.observe("alice", INSIDE, &z, at(9, 0, 2, 0)), Outcome::CheckOut);

        let out = t.observe("alice", OUTSIDE, &z, at(9, 0, 50, 0));
        assert_eq!(out, Outcome::Suppressed { remaining: Duration::seconds(12) });
        assert!(out.actions().is_empty());

        assert_eq!(t.observe("alice", OUTSIDE, &z, at(9, 1, 2, 0)), Outcome::CheckIn);
        assert_eq!(t.cooling_down(), 0);
    }

    #[test]
    fn test_suppressed_face_does_not_start_dwell() {
        let mut t = PresenceTracker::default();
        let z = zone();
        t.start_cooldown("alice", at(9, 0, 0, 0));

        t.observe("alice", INSIDE, &z, at(9, 0, 10, 0));
        assert!(!t.is_tracking("alice"));
    }

    #[test]
    fn test_sweep_expires_cooldowns_and_lost_faces() {
        let mut t = PresenceTracker::default();
        let z = zone();
        t.start_cooldown("bob", at(9, 0, 0, 0));
        t.observe("alice", INSIDE, &z, at(9, 0, 30, 0));

        t.sweep(at(9, 0, 30, 900));
        assert!(t.is_tracking("alice"));
        assert_eq!(t.cooling_down(), 1);

        t.sweep(at(9, 1, 0, 0));
        assert!(!t.is_tracking("alice"));
        assert_eq!(t.cooling_down(), 0);
    }

    #[test]
    fn test_observe_frame_handles_each_sighting() {
        let mut t = PresenceTracker::default();
        let z = zone();
        let face = |name: &str, (cx, cy): (f32, f32)| Sighting {
            name: name.into(),
            bbox: BoundingBox {
                x: cx - 20.0, y: cy - 20.0, width: 40.0, height: 40.0,
                confidence: 0.9, landmarks: None,
            },
            similarity: 0.7,
        };

        let frame = vec![face("alice", INSIDE), face("bob", OUTSIDE)];
        let outcomes = t.observe_frame(&frame, &z, at(9, 0, 0, 0));
        assert_eq!(
            outcomes,
            vec![Outcome::Tracking { dwell: Duration::zero() }, Outcome::CheckIn]
        );
    }

    #[test]
    fn test_clear_expired_cooldown_keeps_active_one() {
        let mut t = PresenceTracker::default();
        t.start_cooldown("alice", at(9, 0, 0, 0));
        t.clear_expired_cooldown("alice", at(9, 0, 30, 0));
        assert_eq!(t.cooling_down(), 1);
        t.clear_expired_cooldown("alice", at(9, 1, 0, 0));
        assert_eq!(t.cooling_down(), 0);
    }
}
