//! The attendance desk: presence tracker in front of the recorder.

use crate::{Recorded, Store, StoreError};
use chrono::NaiveDateTime;
use rollcall_core::{Action, Outcome, PresencePolicy, PresenceTracker, Sighting, Zone};

/// What happened for one sighting in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceEvent {
    pub name: String,
    pub outcome: Outcome,
    /// Whether any attendance row was written for this sighting.
    pub changed: bool,
}

/// Per-session attendance state over a borrowed [`Store`].
pub struct Desk<'a> {
    store: &'a Store,
    tracker: PresenceTracker,
}

impl<'a> Desk<'a> {
    pub fn new(store: &'a Store, policy: PresencePolicy) -> Self {
        Self {
            store,
            tracker: PresenceTracker::new(policy),
        }
    }

    /// Check `name` in unless it is cooling down.
    pub fn check_in(&mut self, name: &str, at: NaiveDateTime) -> Result<Recorded, StoreError> {
        if let Some(remaining) = self.tracker.cooldown_remaining(name, at) {
            tracing::debug!(name, remaining_s = remaining.num_seconds(), "check-in suppressed");
            return Ok(Recorded::Suppressed);
        }
        self.tracker.clear_expired_cooldown(name, at);
        self.store.record(name, Action::CheckIn, at)
    }

    /// Check `name` out; a closed row starts its cooldown.
    pub fn check_out(&mut self, name: &str, at: NaiveDateTime) -> Result<Recorded, StoreError> {
        let recorded = self.store.record(name, Action::CheckOut, at)?;
        if recorded.changed() {
            self.tracker.start_cooldown(name, at);
        }
        Ok(recorded)
    }

    /// Run the tracker over one frame's sightings and apply the resulting actions.
    pub fn observe_frame(
        &mut self,
        sightings: &[Sighting],
        zone: &Zone,
        at: NaiveDateTime,
    ) -> Result<Vec<FaceEvent>, StoreError> {
        let outcomes = self.tracker.observe_frame(sightings, zone, at);

        sightings
            .iter()
            .zip(outcomes)
            .map(|(sighting, outcome)| -> Result<FaceEvent, StoreError> {
                let mut changed = false;
                for &action in outcome.actions() {
                    changed |= self.store.record(&sighting.name, action, at)?.changed();
                }
                Ok(FaceEvent {
                    name: sighting.name.clone(),
                    outcome,
                    changed,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::employees::tests::employee;
    use chrono::{Duration, NaiveDate};
    use rollcall_core::BoundingBox;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.insert_employee(&employee("Alice", "a@x.io", "100")).unwrap();
        store
    }

    fn sighting(name: &str, cx: f32, cy: f32) -> Sighting {
        Sighting {
            name: name.into(),
            bbox: BoundingBox {
                x: cx - 30.0, y: cy - 30.0, width: 60.0, height: 60.0,
                confidence: 0.95, landmarks: None,
            },
            similarity: 0.8,
        }
    }

    #[test]
    fn test_alice_day() {
        let store = store();
        let mut desk = Desk::new(&store, PresencePolicy::default());

        assert!(matches!(desk.check_in("Alice", at(9, 0, 0)).unwrap(), Recorded::Opened { .. }));
        assert_eq!(desk.check_in("Alice", at(9, 5, 0)).unwrap(), Recorded::Unchanged);
        assert_eq!(store.all_records().unwrap().len(), 1);

        assert!(matches!(desk.check_out("Alice", at(9, 6, 0)).unwrap(), Recorded::Closed { .. }));
        assert_eq!(store.all_records().unwrap()[0].time_out.as_deref(), Some("09:06:00"));

        assert_eq!(desk.check_in("Alice", at(9, 6, 30)).unwrap(), Recorded::Suppressed);
        assert_eq!(store.all_records().unwrap().len(), 1);

        assert!(matches!(desk.check_in("Alice", at(10, 7, 0)).unwrap(), Recorded::Opened { .. }));
        let rows = store.all_records().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_open());
    }

    #[test]
    fn test_cooldown_boundary_is_sixty_seconds() {
        let store = store();
        let mut desk = Desk::new(&store, PresencePolicy::default());
        desk.check_in("Alice", at(9, 0, 0)).unwrap();
        desk.check_out("Alice", at(9, 0, 10)).unwrap();

        assert_eq!(desk.check_in("Alice", at(9, 1, 9)).unwrap(), Recorded::Suppressed);
        assert!(matches!(desk.check_in("Alice", at(9, 1, 10)).unwrap(), Recorded::Opened { .. }));
    }

    #[test]
    fn test_noop_check_out_starts_no_cooldown() {
        let store = store();
        let mut desk = Desk::new(&store, PresencePolicy::default());
        assert_eq!(desk.check_out("Alice", at(9, 0, 0)).unwrap(), Recorded::Unchanged);
        assert!(matches!(desk.check_in("Alice", at(9, 0, 1)).unwrap(), Recorded::Opened { .. }));
    }

    #[test]
    fn test_frames_drive_check_in_then_dwell_check_out() {
        let store = store();
        // one frame per second in this test, so keep dwell timers alive longer
        let policy = PresencePolicy { lost_after: Duration::seconds(5), ..PresencePolicy::default() };
        let mut desk = Desk::new(&store, policy);
        let zone = Zone::centered(640, 480, 180, 180);

        // walks up outside the zone
        let events = desk.observe_frame(&[sighting("Alice", 60.0, 60.0)], &zone, at(9, 0, 0)).unwrap();
        assert_eq!(events[0].outcome, Outcome::CheckIn);
        assert!(events[0].changed);

        // steps into the zone and holds
        let events = desk.observe_frame(&[sighting("Alice", 320.0, 240.0)], &zone, at(9, 0, 1)).unwrap();
        assert_eq!(events[0].outcome, Outcome::Tracking { dwell: Duration::zero() });
        assert!(!events[0].changed);

        let events = desk.observe_frame(&[sighting("Alice", 322.0, 238.0)], &zone, at(9, 0, 2)).unwrap();
        assert_eq!(events[0].outcome, Outcome::Tracking { dwell: Duration::seconds(1) });

        let events = desk.observe_frame(&[sighting("Alice", 320.0, 240.0)], &zone, at(9, 0, 3)).unwrap();
        assert_eq!(events[0].outcome, Outcome::CheckOut);
        assert!(events[0].changed);
        assert!(!store.all_records().unwrap()[0].is_open());

        // still standing there: cooldown, no new row
        let events = desk.observe_frame(&[sighting("Alice", 320.0, 240.0)], &zone, at(9, 0, 4)).unwrap();
        assert!(matches!(events[0].outcome, Outcome::Suppressed { .. }));
        assert_eq!(store.all_records().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_name_in_frame_writes_nothing() {
        let store = store();
        let mut desk = Desk::new(&store, PresencePolicy::default());
        let zone = Zone::centered(640, 480, 180, 180);

        let events = desk.observe_frame(&[sighting("Ghost", 60.0, 60.0)], &zone, at(9, 0, 0)).unwrap();
        assert!(!events[0].changed);
        assert!(store.all_records().unwrap().is_empty());
    }
}
