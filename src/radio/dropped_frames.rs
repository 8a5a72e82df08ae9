use crate::radio::generation::Generation;
use std::collections::HashMap;

/// Estimates the ratio of lost robot responses from the wrapping 8 bit frame counter.
///
/// The ratio is only updated once per counter wraparound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DroppedFrameCounter {
    start_value: i32,
    last_frame_counter: u8,
    dropped_frames_counter: u8,
    dropped_frames_ratio: f32,
    last_dropped_frames: i32,
}

impl Default for DroppedFrameCounter {
    fn default() -> Self {
        Self {
            start_value: -1,
            last_frame_counter: 0,
            dropped_frames_counter: 0,
            dropped_frames_ratio: 0.0,
            last_dropped_frames: -1,
        }
    }
}

impl DroppedFrameCounter {
    /// Feeds the counter of a received response.
    ///
    /// Parameters:
    /// - `counter`: Frame counter echoed by the robot.
    /// - `skipped_frames`: Frames the robot reports as never received. These could not
    ///   have been answered and are excluded from the ratio. `None` if unknown.
    ///
    /// Returns:
    /// - The most recent dropped frame ratio.
    pub fn update(&mut self, counter: u8, skipped_frames: Option<u8>) -> f32 {
        if self.start_value == -1 {
            self.start_value = counter as i32;
        } else if counter > self.last_frame_counter {
            // a gap in the counter is a lost frame
            let gap = counter - self.last_frame_counter - 1;
            self.dropped_frames_counter = self.dropped_frames_counter.wrapping_add(gap);
        } else {
            // wrapped, frames between the last counter and 255 were lost as well
            self.last_dropped_frames = self.dropped_frames_counter as i32 + (255 - self.last_frame_counter as i32);
            self.dropped_frames_counter = counter;
        }

        if let Some(skipped) = skipped_frames {
            if self.last_dropped_frames >= 0 {
                let skipped = skipped as i32;
                self.dropped_frames_ratio =
                    (self.last_dropped_frames - skipped) as f32 / (256 - self.start_value - skipped) as f32;
                self.start_value = 0;
                self.last_dropped_frames = -1;
            }
        }

        self.last_frame_counter = counter;
        self.dropped_frames_ratio
    }

    pub fn ratio(&self) -> f32 {
        self.dropped_frames_ratio
    }
}

/// Dropped frame estimators keyed by robot. Entries are created on first observation.
#[derive(Debug, Clone, Default)]
pub struct DroppedFrameStatistics {
    counters: HashMap<(Generation, u32), DroppedFrameCounter>,
}

impl DroppedFrameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, generation: Generation, id: u32, counter: u8, skipped_frames: Option<u8>) -> f32 {
        self.counters
            .entry((generation, id))
            .or_default()
            .update(counter, skipped_frames)
    }

    pub fn ratio(&self, generation: Generation, id: u32) -> Option<f32> {
        self.counters.get(&(generation, id)).map(DroppedFrameCounter::ratio)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(counter: &mut DroppedFrameCounter, values: impl IntoIterator<Item = u8>) -> f32 {
        let mut ratio = counter.ratio();
        for value in values {
            ratio = counter.update(value, Some(0));
        }
        ratio
    }

    #[test]
    fn no_gaps_no_drops() {
        let mut counter = DroppedFrameCounter::default();
        feed(&mut counter, 0..=255);
        assert_eq!(feed(&mut counter, 0..=3), 0.0);
    }

    #[test]
    fn two_gaps_over_one_wrap() {
        let mut counter = DroppedFrameCounter::default();
        let ratio = feed(&mut counter, (0..=255).filter(|&c| c != 10 && c != 200));
        // nothing is reported before the wrap
        assert_eq!(ratio, 0.0);
        assert_eq!(feed(&mut counter, [0]), 2.0 / 256.0);
    }

    #[test]
    fn late_start_shrinks_the_first_window() {
        let mut counter = DroppedFrameCounter::default();
        feed(&mut counter, 128..=250);
        // 251..=255 lost right before the wrap
        assert_eq!(feed(&mut counter, [0]), 5.0 / 128.0);
        // the next window spans all 256 frames, 0 already counted as received
        feed(&mut counter, 1..=255);
        assert_eq!(feed(&mut counter, [0]), 0.0);
    }

    #[test]
    fn lost_frames_after_the_wrap_count_in_the_next_window() {
        let mut counter = DroppedFrameCounter::default();
        feed(&mut counter, 0..=255);
        // frames 0..=3 lost
        feed(&mut counter, 4..=255);
        assert_eq!(feed(&mut counter, [0]), 4.0 / 256.0);
    }

    #[test]
    fn skipped_frames_are_excluded() {
        let mut counter = DroppedFrameCounter::default();
        for value in (0..=255u8).filter(|c| c % 16 != 1) {
            counter.update(value, Some(16));
        }
        // 16 frames missing, all of them skipped by the robot
        assert_eq!(counter.update(0, Some(16)), 0.0);
    }

    #[test]
    fn unknown_skips_defer_the_ratio() {
        let mut counter = DroppedFrameCounter::default();
        for value in (0..=255u8).filter(|&c| c != 7) {
            counter.update(value, None);
        }
        assert_eq!(counter.update(0, None), 0.0);
        // the pending window is finalized once the skip count becomes known
        assert_eq!(counter.update(1, Some(0)), 1.0 / 256.0);
    }

    #[test]
    fn statistics_are_kept_per_robot() {
        let mut statistics = DroppedFrameStatistics::new();
        assert!(statistics.ratio(Generation::Gen2014, 1).is_none());
        statistics.update(Generation::Gen2014, 1, 0, Some(0));
        statistics.update(Generation::Gen2018, 1, 0, Some(0));
        assert_eq!(statistics.len(), 2);
        assert_eq!(statistics.ratio(Generation::Gen2014, 1), Some(0.0));
    }
}
