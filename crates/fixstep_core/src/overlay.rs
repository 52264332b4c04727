//! On-screen diagnostic line

use crate::stats::WindowedStats;
use std::fmt::Write;

const SECOND_NANOS: u64 = 1_000_000_000;

/// Builds the overlay text once per frame without allocating
///
/// Frame rate is the number of frames seen in the last full second; the
/// step cost is the stats average, refreshed at most once per second so it
/// stays readable.
#[derive(Debug, Default)]
pub struct Overlay {
    text: String,
    frames_this_second: u32,
    fps: u32,
    second_started: Option<u64>,
    step_average: i64,
    average_updated: Option<u64>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame and rebuild the text
    pub fn update(
        &mut self,
        now_nanos: u64,
        prefix: &str,
        paused: bool,
        object_count: usize,
        step_stats: &WindowedStats,
    ) -> &str {
        self.count_frame(now_nanos);

        let stale = self
            .average_updated
            .map_or(true, |at| now_nanos.saturating_sub(at) > SECOND_NANOS);
        if stale {
            self.step_average = step_stats.average();
            self.average_updated = Some(now_nanos);
        }

        self.text.clear();
        self.text.push_str(prefix);
        if paused {
            self.text.push_str("[PAUSED] ");
        }
        // Writing to a String cannot fail
        let _ = write!(
            self.text,
            "fps: {} objects: {} stepSimulation: {} ",
            self.fps, object_count, self.step_average
        );
        &self.text
    }

    fn count_frame(&mut self, now_nanos: u64) {
        let started = *self.second_started.get_or_insert(now_nanos);
        if now_nanos.saturating_sub(started) >= SECOND_NANOS {
            self.fps = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_started = Some(now_nanos);
        }
        self.frames_this_second += 1;
    }

    /// The text from the last update
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_format() {
        let mut stats = WindowedStats::new(1);
        stats.add(1234);
        let mut overlay = Overlay::new();
        let text = overlay.update(0, "(p:pause) ", true, 3, &stats);
        assert_eq!(text, "(p:pause) [PAUSED] fps: 0 objects: 3 stepSimulation: 1234 ");
    }

    #[test]
    fn test_average_refreshes_at_most_once_per_second() {
        let mut stats = WindowedStats::new(1);
        let mut overlay = Overlay::new();
        stats.add(10);
        overlay.update(0, "", false, 0, &stats);

        stats.add(20);
        let text = overlay.update(SECOND_NANOS / 2, "", false, 0, &stats);
        assert!(text.ends_with("stepSimulation: 10 "));

        let text = overlay.update(SECOND_NANOS + 1, "", false, 0, &stats);
        assert!(text.ends_with("stepSimulation: 20 "));
    }

    #[test]
    fn test_fps_counts_frames_in_last_second() {
        let stats = WindowedStats::new(1);
        let mut overlay = Overlay::new();
        let frame = SECOND_NANOS / 50;
        for i in 0..=50 {
            overlay.update(i * frame, "", false, 0, &stats);
        }
        assert_eq!(overlay.fps(), 50);
        assert!(overlay.text().starts_with("fps: 50 "));
    }
}
