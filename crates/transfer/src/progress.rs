use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Snapshot of one file transfer handed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub file: String,
    pub total_bytes: u64,
    pub transferred_bytes: u64,
    pub bytes_per_second: f64,
    pub eta: Option<Duration>,
    pub finished: bool,
}

/// Span the reported speed is averaged over.
pub const SPEED_WINDOW: Duration = Duration::from_secs(5);

/// Callback invoked with transfer progress.
pub type ProgressCallback = Box<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Fans progress out to registered callbacks.
///
/// Transfers are sequential, so notifications are sent inline from the
/// transfer loop rather than from a ticker task.
#[derive(Default)]
pub struct ProgressTracker {
    callbacks: RwLock<Vec<ProgressCallback>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a progress callback.
    pub fn on_progress(&self, callback: ProgressCallback) {
        let mut callbacks = self.callbacks.write().unwrap_or_else(|e| e.into_inner());
        callbacks.push(callback);
    }

    /// Starts reporting a transfer of `total` bytes, `current` of which are
    /// already done (resumed uploads).
    pub fn begin(&self, file: &str, total: u64, current: u64) -> TransferProgress<'_> {
        let progress = TransferProgress {
            tracker: self,
            file: file.to_string(),
            total,
            transferred: current.min(total),
            speed: SpeedCalculator::new(SPEED_WINDOW),
        };
        progress.notify(false);
        progress
    }

    fn notify(&self, update: &ProgressUpdate) {
        let callbacks = self.callbacks.read().unwrap_or_else(|e| e.into_inner());
        for cb in callbacks.iter() {
            cb(update);
        }
    }
}

/// Progress of a single file, created by [`ProgressTracker::begin`].
pub struct TransferProgress<'a> {
    tracker: &'a ProgressTracker,
    file: String,
    total: u64,
    transferred: u64,
    speed: SpeedCalculator,
}

impl TransferProgress<'_> {
    /// Adds `bytes` to the transferred count.
    pub fn advance(&mut self, bytes: u64) {
        self.transferred += bytes;
        self.speed.record(bytes);
        self.notify(false);
    }

    /// Marks the transfer complete.
    pub fn finish(mut self) {
        self.transferred = self.transferred.max(self.total);
        self.notify(true);
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    fn notify(&self, finished: bool) {
        let remaining = self.total.saturating_sub(self.transferred);
        self.tracker.notify(&ProgressUpdate {
            file: self.file.clone(),
            total_bytes: self.total,
            transferred_bytes: self.transferred,
            bytes_per_second: self.speed.bytes_per_second(),
            eta: if finished { None } else { self.speed.eta(remaining) },
            finished,
        });
    }
}

/// Throughput over a sliding time window.
///
/// Bytes of each sample count against the time elapsed since the sample
/// before it, so the very first chunk already yields a rate.
pub struct SpeedCalculator {
    window: Duration,
    /// End of the last sample that fell out of the window, or the start.
    anchor: Instant,
    samples: VecDeque<(Instant, u64)>,
}

impl SpeedCalculator {
    pub fn new(window: Duration) -> Self {
        Self::starting_at(window, Instant::now())
    }

    fn starting_at(window: Duration, anchor: Instant) -> Self {
        Self {
            window,
            anchor,
            samples: VecDeque::new(),
        }
    }

    /// Records `bytes` completed now.
    pub fn record(&mut self, bytes: u64) {
        self.record_at(Instant::now(), bytes);
    }

    fn record_at(&mut self, at: Instant, bytes: u64) {
        self.samples.push_back((at, bytes));
        while self.samples.len() > 1 {
            let Some(&(oldest, _)) = self.samples.front() else {
                break;
            };
            if at.duration_since(oldest) <= self.window {
                break;
            }
            self.anchor = oldest;
            self.samples.pop_front();
        }
    }

    pub fn bytes_per_second(&self) -> f64 {
        let Some(&(last, _)) = self.samples.back() else {
            return 0.0;
        };
        let elapsed = last.duration_since(self.anchor).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        let bytes: u64 = self.samples.iter().map(|&(_, b)| b).sum();
        bytes as f64 / elapsed
    }

    /// Time left for `remaining_bytes` at the current rate.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(remaining_bytes as f64 / speed).ok()
    }
}
