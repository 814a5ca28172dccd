//! Background tick loop and the hand-off to snapshot consumers.
//!
//! The producer task owns the `World`. After every tick it appends a
//! population sample to the shared history and offers a snapshot on a
//! one-slot channel without waiting: if the consumer has not taken the
//! previous snapshot the new one is dropped, so consumers always see the
//! latest state and never a backlog.

use eco_core::{PopulationHistory, PopulationSample, SchedulerConfig};
use eco_world::{World, WorldSnapshot};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Running,
    Paused,
    /// Loop finished; delivering the last snapshot and closing the channel
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// No rabbits and no foxes left
    Extinct,
    /// Configured tick limit reached
    TickLimit,
    Cancelled,
    /// The snapshot consumer went away
    Disconnected,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub ticks: u64,
    pub reason: StopReason,
    pub final_population: PopulationSample,
    pub published_snapshots: u64,
    pub dropped_snapshots: u64,
}

/// Read access to the population history owned by the producer
#[derive(Debug, Clone, Default)]
pub struct HistoryHandle(Arc<RwLock<PopulationHistory>>);

impl HistoryHandle {
    fn record(&self, sample: PopulationSample) {
        self.0.write().record(sample);
    }

    /// Copy of the history so far
    pub fn to_history(&self) -> PopulationHistory {
        self.0.read().clone()
    }

    pub fn latest(&self) -> Option<PopulationSample> {
        self.0.read().latest().copied()
    }
}

/// Control side of a running simulation
pub struct SchedulerHandle {
    run_id: Uuid,
    cancel: CancellationToken,
    pause_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<SchedulerState>,
    history: HistoryHandle,
    task: JoinHandle<RunSummary>,
}

impl SchedulerHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Suspend the tick loop. Consumers stop pulling snapshots as well.
    pub fn pause(&self) {
        self.pause_tx.send_replace(true);
    }

    pub fn resume(&self) {
        self.pause_tx.send_replace(false);
    }

    pub fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.pause_tx.borrow()
    }

    /// Ask the producer to stop. A pause is lifted so consumers can keep
    /// polling until the stream reports closure.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.resume();
    }

    pub fn history(&self) -> HistoryHandle {
        self.history.clone()
    }

    /// Resolve once the scheduler reaches `state`
    pub async fn wait_for_state(&self, state: SchedulerState) {
        let mut rx = self.state_rx.clone();
        // The sender lives until the task ends, and the task sets Stopped last
        let _ = rx.wait_for(|current| *current == state).await;
    }

    pub async fn join(self) -> anyhow::Result<RunSummary> {
        Ok(self.task.await?)
    }
}

/// Frame outcome of a non-blocking poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// A newer snapshot arrived
    Fresh,
    /// Nothing new; keep showing the last snapshot
    Stale,
    /// Producer finished and the channel is drained
    Closed,
}

/// Consumer side: the last received snapshot plus the channel behind it
pub struct SnapshotStream {
    rx: mpsc::Receiver<WorldSnapshot>,
    paused: watch::Receiver<bool>,
    state: watch::Receiver<SchedulerState>,
    latest: WorldSnapshot,
    closed: bool,
}

impl SnapshotStream {
    /// Non-blocking check for a newer snapshot, once per frame.
    /// While paused nothing is pulled, unless the producer is already
    /// draining and only the final hand-off is left.
    pub fn poll(&mut self) -> Frame {
        if self.closed {
            return Frame::Closed;
        }
        let finishing = matches!(
            *self.state.borrow(),
            SchedulerState::Draining | SchedulerState::Stopped
        );
        let paused = *self.paused.borrow();
        if paused && !finishing {
            return Frame::Stale;
        }

        match self.rx.try_recv() {
            Ok(snapshot) => {
                self.latest = snapshot;
                Frame::Fresh
            }
            Err(TryRecvError::Empty) => Frame::Stale,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                Frame::Closed
            }
        }
    }

    /// Take everything still buffered until the producer closes the
    /// channel. Returns how many snapshots arrived.
    #[cfg(test)]
    pub async fn drain(&mut self) -> usize {
        let mut received = 0;
        while let Some(snapshot) = self.rx.recv().await {
            self.latest = snapshot;
            received += 1;
        }
        self.closed = true;
        received
    }

    pub fn latest(&self) -> &WorldSnapshot {
        &self.latest
    }
}

/// Start the producer task. Must be called inside a tokio runtime.
pub fn spawn(world: World, config: SchedulerConfig) -> (SchedulerHandle, SnapshotStream) {
    let run_id = Uuid::new_v4();
    let cancel = CancellationToken::new();
    let (pause_tx, pause_rx) = watch::channel(false);
    let (state_tx, state_rx) = watch::channel(SchedulerState::Running);
    let (snapshot_tx, snapshot_rx) = mpsc::channel(1);
    let history = HistoryHandle::default();

    let stream = SnapshotStream {
        rx: snapshot_rx,
        paused: pause_rx.clone(),
        state: state_rx.clone(),
        latest: world.snapshot(),
        closed: false,
    };

    let producer = Producer {
        run_id,
        world,
        config,
        cancel: cancel.clone(),
        pause_rx,
        state_tx,
        snapshot_tx,
        history: history.clone(),
        published: 0,
        dropped: 0,
    };
    let task = tokio::spawn(producer.run());

    let handle = SchedulerHandle {
        run_id,
        cancel,
        pause_tx,
        state_rx,
        history,
        task,
    };

    (handle, stream)
}

struct Producer {
    run_id: Uuid,
    world: World,
    config: SchedulerConfig,
    cancel: CancellationToken,
    pause_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<SchedulerState>,
    snapshot_tx: mpsc::Sender<WorldSnapshot>,
    history: HistoryHandle,
    published: u64,
    dropped: u64,
}

impl Producer {
    #[instrument(skip_all, fields(run_id = %self.run_id))]
    async fn run(mut self) -> RunSummary {
        info!(
            tick_interval_ms = self.config.tick_interval_ms,
            max_ticks = ?self.config.max_ticks,
            "Simulation started"
        );

        let reason = self.tick_loop().await;

        self.state_tx.send_replace(SchedulerState::Draining);
        info!(reason = ?reason, tick = self.world.tick(), "Simulation draining");
        self.deliver_final_snapshot().await;

        let summary = RunSummary {
            run_id: self.run_id,
            ticks: self.world.tick(),
            reason,
            final_population: self.world.population(),
            published_snapshots: self.published,
            dropped_snapshots: self.dropped,
        };

        // Closing the channel tells the consumer the stream has ended
        drop(self.snapshot_tx);
        self.state_tx.send_replace(SchedulerState::Stopped);

        info!(
            ticks = summary.ticks,
            rabbits = summary.final_population.rabbits,
            foxes = summary.final_population.foxes,
            published = summary.published_snapshots,
            dropped = summary.dropped_snapshots,
            "Simulation stopped"
        );
        summary
    }

    async fn tick_loop(&mut self) -> StopReason {
        let interval = Duration::from_millis(self.config.tick_interval_ms);

        loop {
            let paused = *self.pause_rx.borrow();
            if paused {
                if let Some(reason) = self.wait_while_paused().await {
                    return reason;
                }
            }
            if self.cancel.is_cancelled() {
                return StopReason::Cancelled;
            }

            let report = self.world.step();
            let population = report.population;
            self.history.record(population);

            if self.config.metrics_interval > 0 && report.tick % self.config.metrics_interval == 0 {
                crate::record_gauge!("population_rabbits", population.rabbits, tick = report.tick);
                crate::record_gauge!("population_foxes", population.foxes, tick = report.tick);
                debug!(
                    tick = report.tick,
                    births = report.phases.births(),
                    kills = report.phases.kills,
                    deaths = report.phases.deaths,
                    grass_grown = report.phases.grass_grown,
                    "Tick metrics"
                );
            }

            if population.is_extinct() {
                return StopReason::Extinct;
            }
            if self
                .config
                .max_ticks
                .map_or(false, |max| report.tick >= max)
            {
                return StopReason::TickLimit;
            }

            match self.snapshot_tx.try_send(self.world.snapshot()) {
                Ok(()) => self.published += 1,
                Err(TrySendError::Full(_)) => {
                    self.dropped += 1;
                    trace!(tick = report.tick, "Consumer busy; snapshot dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(tick = report.tick, "Snapshot consumer disconnected");
                    return StopReason::Disconnected;
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return StopReason::Cancelled,
                _ = sleep(interval) => {}
            }
        }
    }

    /// Block until resumed. Returns a stop reason if cancelled meanwhile.
    async fn wait_while_paused(&mut self) -> Option<StopReason> {
        self.state_tx.send_replace(SchedulerState::Paused);
        info!(tick = self.world.tick(), "Simulation paused");

        let pause_rx = &mut self.pause_rx;
        let resumed = async { pause_rx.wait_for(|paused| !*paused).await.is_ok() };

        tokio::select! {
            _ = self.cancel.cancelled() => return Some(StopReason::Cancelled),
            ok = resumed => {
                if !ok {
                    // Control handle dropped while paused; nobody can resume us
                    return Some(StopReason::Cancelled);
                }
            }
        }

        self.state_tx.send_replace(SchedulerState::Running);
        info!(tick = self.world.tick(), "Simulation resumed");
        None
    }

    /// The end state is always offered, waiting for a free slot unless the
    /// run was cancelled.
    async fn deliver_final_snapshot(&mut self) {
        let snapshot = self.world.snapshot();

        tokio::select! {
            biased;
            sent = self.snapshot_tx.send(snapshot) => {
                if sent.is_ok() {
                    self.published += 1;
                }
            }
            _ = self.cancel.cancelled() => {
                debug!("Cancelled; final snapshot not delivered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::{Occupant, SimParams};
    use eco_world::Grid;

    fn busy_world(seed: u64) -> World {
        World::new(&SimParams {
            width: 16,
            height: 12,
            rabbits: 20,
            foxes: 6,
            grass_growth_rate: 0.2,
            seed: Some(seed),
        })
        .unwrap()
    }

    fn fast(max_ticks: Option<u64>) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval_ms: 0,
            max_ticks,
            metrics_interval: 10,
        }
    }

    #[tokio::test]
    async fn test_extinct_world_stops_after_one_tick() {
        let world = World::from_grid(Grid::new(4, 4), 0.5, 1).unwrap();
        let (handle, mut stream) = spawn(world, fast(None));

        let received = stream.drain().await;
        assert_eq!(received, 1);
        assert_eq!(stream.poll(), Frame::Closed);
        assert_eq!(stream.latest().tick, 1);

        let history = handle.history();
        let summary = handle.join().await.unwrap();
        assert_eq!(summary.reason, StopReason::Extinct);
        assert_eq!(summary.ticks, 1);
        assert!(summary.final_population.is_extinct());
        assert_eq!(history.to_history().len(), 1);
    }

    #[tokio::test]
    async fn test_tick_limit_records_ordered_history() {
        let (handle, mut stream) = spawn(busy_world(5), fast(Some(5)));

        stream.drain().await;
        assert_eq!(stream.latest().tick, 5);

        let history = handle.history().to_history();
        let summary = handle.join().await.unwrap();
        assert_eq!(summary.reason, StopReason::TickLimit);
        assert_eq!(summary.ticks, 5);

        let ticks: Vec<u64> = history.samples().iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![1, 2, 3, 4, 5]);
        assert_eq!(history.latest().copied(), Some(summary.final_population));
    }

    #[tokio::test]
    async fn test_slow_consumer_sees_latest_not_backlog() {
        let (handle, mut stream) = spawn(busy_world(9), fast(Some(20)));

        // Never poll while running; only the first snapshot fits in the slot
        handle.wait_for_state(SchedulerState::Draining).await;
        let received = stream.drain().await;

        assert_eq!(received, 2);
        assert_eq!(stream.latest().tick, 20);

        let summary = handle.join().await.unwrap();
        assert_eq!(summary.dropped_snapshots, 18);
        assert_eq!(summary.published_snapshots, 2);
    }

    #[tokio::test]
    async fn test_cancel_closes_stream() {
        let config = SchedulerConfig {
            tick_interval_ms: 2,
            max_ticks: None,
            metrics_interval: 0,
        };
        let (handle, mut stream) = spawn(busy_world(2), config);

        while handle.history().to_history().len() < 3 {
            stream.poll();
            sleep(Duration::from_millis(1)).await;
        }
        handle.cancel();
        stream.drain().await;

        assert_eq!(stream.poll(), Frame::Closed);
        handle.wait_for_state(SchedulerState::Stopped).await;
        assert_eq!(handle.state(), SchedulerState::Stopped);

        let summary = handle.join().await.unwrap();
        assert_eq!(summary.reason, StopReason::Cancelled);
        assert!(summary.ticks >= 3);
    }

    #[tokio::test]
    async fn test_pause_suspends_ticks_and_polling() {
        let config = SchedulerConfig {
            tick_interval_ms: 1,
            max_ticks: None,
            metrics_interval: 0,
        };
        let (handle, mut stream) = spawn(busy_world(4), config);
        let history = handle.history();

        handle.pause();
        assert!(handle.is_paused());
        handle.wait_for_state(SchedulerState::Paused).await;

        let frozen = history.to_history().len();
        sleep(Duration::from_millis(30)).await;
        assert_eq!(history.to_history().len(), frozen);
        assert_eq!(stream.poll(), Frame::Stale);

        handle.toggle_pause();
        handle.wait_for_state(SchedulerState::Running).await;
        while history.to_history().len() <= frozen {
            sleep(Duration::from_millis(1)).await;
        }

        handle.cancel();
        stream.drain().await;
        let summary = handle.join().await.unwrap();
        assert_eq!(summary.reason, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn test_pause_during_drain_still_delivers_final_snapshot() {
        let (handle, mut stream) = spawn(busy_world(9), fast(Some(6)));

        // The slot holds tick 1, so the final send is waiting on us
        handle.wait_for_state(SchedulerState::Draining).await;
        handle.pause();

        let mut frames = Vec::new();
        let polled = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match stream.poll() {
                    Frame::Fresh => frames.push(stream.latest().tick),
                    Frame::Stale => sleep(Duration::from_millis(1)).await,
                    Frame::Closed => break,
                }
            }
        })
        .await;

        assert!(polled.is_ok(), "stream never closed while paused in drain");
        assert_eq!(frames, vec![1, 6]);

        let summary = handle.join().await.unwrap();
        assert_eq!(summary.reason, StopReason::TickLimit);
    }

    #[tokio::test]
    async fn test_cancel_while_paused() {
        let (handle, mut stream) = spawn(busy_world(6), fast(None));

        handle.pause();
        handle.wait_for_state(SchedulerState::Paused).await;
        handle.cancel();
        stream.drain().await;

        let summary = handle.join().await.unwrap();
        assert_eq!(summary.reason, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn test_dropped_consumer_stops_producer() {
        let (handle, stream) = spawn(busy_world(3), fast(None));
        drop(stream);

        let summary = handle.join().await.unwrap();
        assert_eq!(summary.reason, StopReason::Disconnected);
    }

    #[tokio::test]
    async fn test_snapshots_are_independent_copies() {
        let (handle, mut stream) = spawn(busy_world(8), fast(Some(3)));
        let initial = stream.latest().clone();
        assert_eq!(initial.tick, 0);

        stream.drain().await;
        handle.join().await.unwrap();

        // The initial frame still shows the seeded population
        assert_eq!(
            initial
                .cells()
                .iter()
                .filter(|c| c.occupant == Occupant::Fox)
                .count(),
            6
        );
    }
}
