//! Headless frame loop on the consumer side of the snapshot channel.

use crate::scheduler::{Frame, SnapshotStream};
use eco_core::ConsumerConfig;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub frames: u64,
    /// Frames that showed a newer snapshot than the one before
    pub fresh_frames: u64,
    pub last_tick: u64,
}

/// Poll the stream once per frame until the producer closes it
pub async fn run_consumer(mut stream: SnapshotStream, config: ConsumerConfig) -> ConsumerReport {
    let mut frames = interval(Duration::from_millis(config.frame_interval_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut report = ConsumerReport::default();

    loop {
        frames.tick().await;
        report.frames += 1;

        match stream.poll() {
            Frame::Fresh => {
                report.fresh_frames += 1;
                show(stream.latest(), config.render_ascii);
            }
            Frame::Stale => {}
            Frame::Closed => break,
        }
    }

    report.last_tick = stream.latest().tick;
    info!(
        frames = report.frames,
        fresh_frames = report.fresh_frames,
        last_tick = report.last_tick,
        "Snapshot stream closed"
    );
    report
}

fn show(snapshot: &eco_world::WorldSnapshot, render_ascii: bool) {
    let population = snapshot.population();
    debug!(
        tick = snapshot.tick,
        rabbits = population.rabbits,
        foxes = population.foxes,
        "Frame"
    );

    if render_ascii {
        println!(
            "tick {} | rabbits {} | foxes {}\n{}",
            snapshot.tick, population.rabbits, population.foxes, snapshot
        );
    }
}
