//! Weighted progress blending across stages and videos.
//!
//! Each stage owns a slice of a video's 0..=100 range proportional to
//! its weight; a stage's own percentage is mapped linearly into its
//! slice. Batch progress is `(video_index * 100 + video_percent) /
//! video_count`. Values only ever move forward.

/// Per-stage slices of a single video's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSlices {
    /// `(start, width)` in percent, covering 0..=100 in order.
    slices: Vec<(f64, f64)>,
}

impl StageSlices {
    /// Build slices from relative weights.
    ///
    /// Non-finite or negative weights count as zero; if nothing is left,
    /// every stage gets an equal share.
    pub fn new(weights: &[f64]) -> Self {
        let cleaned: Vec<f64> = weights
            .iter()
            .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
            .collect();
        let total: f64 = cleaned.iter().sum();

        let shares: Vec<f64> = if total > 0.0 {
            cleaned.iter().map(|w| w / total * 100.0).collect()
        } else if cleaned.is_empty() {
            Vec::new()
        } else {
            vec![100.0 / cleaned.len() as f64; cleaned.len()]
        };

        let mut start = 0.0;
        let mut slices = Vec::with_capacity(shares.len());
        for width in shares {
            slices.push((start, width));
            start += width;
        }
        Self { slices }
    }

    /// Equal shares for `count` stages (`100 / count` each).
    pub fn equal(count: usize) -> Self {
        Self::new(&vec![1.0; count])
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Video percentage for stage `stage` reporting `local` percent.
    pub fn map(&self, stage: usize, local: u32) -> f64 {
        match self.slices.get(stage) {
            Some(&(start, width)) => (start + width * f64::from(local.min(100)) / 100.0).min(100.0),
            None => 100.0,
        }
    }

    /// Video percentage once `stage` has completed.
    pub fn stage_end(&self, stage: usize) -> f64 {
        self.map(stage, 100)
    }
}

/// Monotonic progress tracker for one batch.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    video_count: usize,
    slices: StageSlices,
    current_video: usize,
    video_percent: f64,
}

impl BatchProgress {
    pub fn new(video_count: usize, slices: StageSlices) -> Self {
        Self {
            video_count,
            slices,
            current_video: 0,
            video_percent: 0.0,
        }
    }

    /// Move to video `index` (never backwards).
    pub fn start_video(&mut self, index: usize) {
        if index > self.current_video {
            self.current_video = index;
            self.video_percent = 0.0;
        }
    }

    /// Record a stage-local reading. Returns `true` if anything advanced.
    pub fn stage_progress(&mut self, stage: usize, local: u32) -> bool {
        self.advance(self.slices.map(stage, local))
    }

    /// Mark `stage` as complete for the current video.
    pub fn complete_stage(&mut self, stage: usize) -> bool {
        self.advance(self.slices.stage_end(stage))
    }

    /// Mark the current video as done (including when stages were skipped).
    pub fn finish_video(&mut self) -> bool {
        self.advance(100.0)
    }

    fn advance(&mut self, video_percent: f64) -> bool {
        if video_percent > self.video_percent {
            self.video_percent = video_percent.min(100.0);
            true
        } else {
            false
        }
    }

    pub fn current_video(&self) -> usize {
        self.current_video
    }

    pub fn video_count(&self) -> usize {
        self.video_count
    }

    pub fn video_percent(&self) -> f64 {
        self.video_percent
    }

    /// Whole-batch percentage, 0..=100.
    pub fn overall_percent(&self) -> f64 {
        if self.video_count == 0 {
            return 100.0;
        }
        let done = self.current_video.min(self.video_count) as f64 * 100.0;
        ((done + self.video_percent) / self.video_count as f64).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn two_equal_stages_split_in_half() {
        let slices = StageSlices::equal(2);
        assert!(approx(slices.map(0, 0), 0.0));
        assert!(approx(slices.map(0, 50), 25.0));
        assert!(approx(slices.map(0, 100), 50.0));
        assert!(approx(slices.map(1, 0), 50.0));
        assert!(approx(slices.map(1, 50), 75.0));
        assert!(approx(slices.map(1, 100), 100.0));
    }

    #[test]
    fn single_stage_owns_everything() {
        let slices = StageSlices::equal(1);
        assert!(approx(slices.map(0, 40), 40.0));
        assert!(approx(slices.stage_end(0), 100.0));
    }

    #[test]
    fn weighted_and_degenerate_weights() {
        let slices = StageSlices::new(&[3.0, 1.0]);
        assert!(approx(slices.stage_end(0), 75.0));

        let fallback = StageSlices::new(&[0.0, f64::NAN, -2.0]);
        assert_eq!(fallback.len(), 3);
        assert!(approx(fallback.stage_end(0), 100.0 / 3.0));
        assert!(approx(fallback.stage_end(2), 100.0));
    }

    #[test]
    fn third_stage_composes() {
        let slices = StageSlices::equal(4);
        assert!(approx(slices.map(2, 100), 75.0));
    }

    #[test]
    fn batch_progress_is_monotonic_and_bounded() {
        let mut progress = BatchProgress::new(3, StageSlices::equal(2));
        let readings = [
            (0usize, 0u32, 0usize),
            (0, 40, 0),
            (0, 30, 0), // stale reading
            (0, 100, 0),
            (1, 10, 0),
            (1, 100, 0),
            (0, 0, 1),
            (0, 80, 1),
            (1, 100, 1),
            (0, 100, 2),
        ];

        let mut last_overall = 0.0;
        let mut last_video = 0;
        for (stage, local, video) in readings {
            if video != last_video {
                progress.finish_video();
                progress.start_video(video);
                last_video = video;
            }
            progress.stage_progress(stage, local);
            assert!(progress.video_percent() <= 100.0);
            assert!(progress.overall_percent() >= last_overall);
            last_overall = progress.overall_percent();
        }
        progress.finish_video();
        assert!(approx(progress.overall_percent(), 100.0));
    }

    #[test]
    fn overall_matches_formula() {
        let mut progress = BatchProgress::new(4, StageSlices::equal(2));
        progress.start_video(2);
        progress.stage_progress(1, 50);
        // (2 * 100 + 75) / 4
        assert!(approx(progress.overall_percent(), 68.75));
    }

    #[test]
    fn failed_stage_skips_to_video_end() {
        let mut progress = BatchProgress::new(2, StageSlices::equal(2));
        progress.stage_progress(0, 30);
        assert!(progress.finish_video());
        assert!(approx(progress.overall_percent(), 50.0));
    }
}
