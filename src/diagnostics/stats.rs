use serde::Serialize;
use std::time::Instant;

/// Counters for one exercise session, from start to stop.
pub struct SessionStats {
    frames_sent: u64,
    ticks_skipped: u64,
    bytes_sent: u64,
    results_rendered: u64,
    stale_results: u64,
    start_time: Instant,
}

/// Snapshot of session stats for logging and the `stats` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub frames_sent: u64,
    pub ticks_skipped: u64,
    pub bytes_sent: u64,
    pub results_rendered: u64,
    pub stale_results: u64,
    pub malformed_messages: u64,
    pub send_fps: f64,
    pub bandwidth_bps: u64,
}

impl SessionStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self {
            frames_sent: 0,
            ticks_skipped: 0,
            bytes_sent: 0,
            results_rendered: 0,
            stale_results: 0,
            start_time: Instant::now(),
        }
    }

    /// Record a frame handed to the transport.
    pub fn record_frame(&mut self, bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Record a tick that did no work.
    pub fn record_skip(&mut self) {
        self.ticks_skipped += 1;
    }

    pub fn record_render(&mut self) {
        self.results_rendered += 1;
    }

    /// Record a result that arrived after the session stopped.
    pub fn record_stale(&mut self) {
        self.stale_results += 1;
    }

    /// Frames sent per second since the last reset.
    pub fn send_fps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0.0;
        }
        self.frames_sent as f64 / elapsed
    }

    /// Outbound bytes per second since the last reset.
    pub fn bandwidth_bps(&self) -> u64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0;
        }
        (self.bytes_sent as f64 / elapsed) as u64
    }

    /// Reset all counters and restart the clock.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Take a serialisable snapshot. Malformed messages are counted by the
    /// transport, so the caller supplies them.
    pub fn snapshot(&self, malformed_messages: u64) -> StatsSnapshot {
        StatsSnapshot {
            frames_sent: self.frames_sent,
            ticks_skipped: self.ticks_skipped,
            bytes_sent: self.bytes_sent,
            results_rendered: self.results_rendered,
            stale_results: self.stale_results,
            malformed_messages,
            send_fps: self.send_fps(),
            bandwidth_bps: self.bandwidth_bps(),
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
