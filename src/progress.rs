// Stage bands for the overall progress scale

use crate::models::PipelineProgress;

/// Pipeline phases in order, each owning a fixed sub-range of 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    PageParse,
    Chunking,
    Filtering,
    Prepare,
    Generate,
    Finalize,
}

impl Stage {
    /// All stages in pipeline order, for the step list on the generation
    /// screen.
    pub const ALL: [Self; 7] = [
        Self::Connect,
        Self::PageParse,
        Self::Chunking,
        Self::Filtering,
        Self::Prepare,
        Self::Generate,
        Self::Finalize,
    ];

    /// `(lo, hi)` band on the overall scale. Bands are non-overlapping and
    /// assigned in pipeline order.
    #[must_use]
    pub const fn band(self) -> (u8, u8) {
        match self {
            Self::Connect => (0, 10),
            Self::PageParse => (10, 25),
            Self::Chunking => (25, 35),
            Self::Filtering => (35, 40),
            Self::Prepare => (40, 50),
            Self::Generate => (50, 90),
            Self::Finalize => (90, 100),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connect => "Checking API connection...",
            Self::PageParse => "Parsing document...",
            Self::Chunking => "Segmenting text...",
            Self::Filtering => "Filtering segments...",
            Self::Prepare => "Preparing segments...",
            Self::Generate => "Generating questions...",
            Self::Finalize => "Finalizing quiz...",
        }
    }
}

/// Percent within the stage band: `lo + ratio * (hi - lo)`, clamped to the
/// band's upper bound. Pure; safe to call repeatedly.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percent(stage: Stage, ratio: f64) -> u8 {
    let (lo, hi) = stage.band();
    let ratio = ratio.clamp(0.0, 1.0);
    let raw = f64::from(lo) + ratio * f64::from(hi - lo);
    (raw.floor() as u8).min(hi)
}

#[must_use]
pub fn report(stage: Stage, ratio: f64, status: impl Into<String>) -> PipelineProgress {
    PipelineProgress {
        percent: percent(stage, ratio),
        status: status.into(),
    }
}

#[allow(dead_code)]
#[must_use]
pub fn report_default(stage: Stage, ratio: f64) -> PipelineProgress {
    report(stage, ratio, stage.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STAGES: [Stage; 7] = Stage::ALL;

    #[test]
    fn test_bands_are_contiguous_and_ordered() {
        let mut previous_hi = 0;
        for stage in ALL_STAGES {
            let (lo, hi) = stage.band();
            assert_eq!(lo, previous_hi, "band for {stage:?} does not start where the previous ended");
            assert!(hi > lo);
            previous_hi = hi;
        }
        assert_eq!(previous_hi, 100);
    }

    #[test]
    fn test_percent_monotone_within_band() {
        for stage in ALL_STAGES {
            let mut last = 0;
            for step in 0..=20 {
                let ratio = f64::from(step) / 20.0;
                let value = percent(stage, ratio);
                assert!(value >= last, "percent regressed within {stage:?}");
                last = value;
            }
        }
    }

    #[test]
    fn test_percent_never_exceeds_band_upper_bound() {
        for stage in ALL_STAGES {
            let (_, hi) = stage.band();
            assert!(percent(stage, 1.0) <= hi);
            assert!(percent(stage, 5.0) <= hi);
        }
    }

    #[test]
    fn test_percent_clamps_negative_ratio_to_band_start() {
        let (lo, _) = Stage::Generate.band();
        assert_eq!(percent(Stage::Generate, -0.5), lo);
    }

    #[test]
    fn test_generation_band_interpolation() {
        // 50-90 band: halfway through generation lands at 70.
        assert_eq!(percent(Stage::Generate, 0.5), 70);
        assert_eq!(percent(Stage::Generate, 0.0), 50);
        assert_eq!(percent(Stage::Generate, 1.0), 90);
    }

    #[test]
    fn test_report_carries_status_text() {
        let progress = report(Stage::Finalize, 1.0, "Quiz is ready!");
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.status, "Quiz is ready!");

        let default = report_default(Stage::Connect, 0.0);
        assert_eq!(default.status, Stage::Connect.label());
    }
}
