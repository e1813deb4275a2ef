//! Live attendance monitor.
//!
//! One cooperative loop on the current thread: every tick pulls a frame,
//! recognizes faces, feeds the desk and prints what changed. Ctrl-C stops
//! it and the camera is released on the way out.

use crate::config::Config;
use crate::engine::{Engine, EngineError};
use crate::report;
use anyhow::{Context, Result};
use chrono::Local;
use rollcall_core::{Outcome, Sighting, Zone};
use rollcall_hw::Camera;
use rollcall_store::{Desk, FaceEvent, Store};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Consecutive capture failures tolerated before giving up on the camera.
const MAX_CAPTURE_FAILURES: u32 = 30;

pub async fn run(store: &Store, config: &Config) -> Result<()> {
    let known = match store.known_faces() {
        Ok(faces) => faces,
        Err(e) => {
            tracing::warn!(error = %e, "could not load registered faces; continuing with none");
            Vec::new()
        }
    };
    tracing::info!(count = known.len(), "registered faces loaded");

    let mut engine = Engine::load(config)?;
    let camera = Camera::open(&config.camera_device, config.frame_width, config.frame_height)
        .context("could not access the webcam")?;
    camera.warmup(config.warmup_frames)?;
    let mut stream = camera.stream()?;

    let mut desk = Desk::new(store, config.presence_policy());
    report::print_stats(&store.daily_stats(Local::now().date_naive())?);

    let mut tick = tokio::time::interval(Duration::from_millis(config.tick_ms.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    println!("Monitoring on {}, press Ctrl-C to stop", camera.device_path);
    let mut failures = 0u32;

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                break;
            }
            _ = tick.tick() => {}
        }

        let frame = match stream.next_frame() {
            Ok(frame) => {
                failures = 0;
                frame
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(error = %e, failures, "frame capture failed");
                if failures >= MAX_CAPTURE_FAILURES {
                    return Err(e).context("camera stopped delivering frames");
                }
                continue;
            }
        };

        let zone = Zone::centered(frame.width, frame.height, config.zone_width, config.zone_height);
        let sightings = sightings_or_skip(
            engine.recognize(&frame, &known, config.similarity_threshold),
            frame.sequence,
        );
        if sightings.is_empty() {
            continue;
        }

        let now = Local::now().naive_local();
        let events = desk.observe_frame(&sightings, &zone, now)?;
        for event in &events {
            announce(event, now);
        }
        if events.iter().any(|e| e.changed) {
            report::print_stats(&store.daily_stats(now.date())?);
        }
    }

    tracing::info!("monitor stopped; releasing camera");
    Ok(())
}

/// An inference failure drops the frame, not the session.
fn sightings_or_skip(result: Result<Vec<Sighting>, EngineError>, sequence: u32) -> Vec<Sighting> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, frame = sequence, "recognition failed; skipping frame");
        Vec::new()
    })
}

fn announce(event: &FaceEvent, now: chrono::NaiveDateTime) {
    tracing::debug!(name = %event.name, outcome = ?event.outcome, changed = event.changed, "face event");
    let time = now.format("%H:%M:%S");
    match event.outcome {
        Outcome::CheckOut if event.changed => println!("{time}  {}  LOGOUT SUCCESS", event.name),
        Outcome::CheckOut => println!("{time}  {}  logout (no open check-in)", event.name),
        _ if event.changed => println!("{time}  {}  checked in", event.name),
        Outcome::LeftZone => println!("{time}  {}  left zone", event.name),
        _ => {}
    }
}
