// THEORY:
// The `pipeline` module is the top-level API for the radial engine. It bundles
// the analyzer and the persistence pass behind a single call: hand it the
// prepared spot and edge tables, get back the processed edge table plus the
// bookkeeping of what was skipped and why.

use crate::core_modules::analyzer::RadialAnalyzer;
use crate::error::RadialError;

// Re-export key data structures for the public API.
pub use crate::core_modules::analyzer::{FileOutcome, FileReport, FileSummary, RadialReport};
pub use crate::core_modules::centroid::DynamicCenter;
pub use crate::core_modules::edge::Edge;
pub use crate::core_modules::file_group::FileOrder;
pub use crate::core_modules::persistence::{derive_radial_persistence, radial_persistence};
pub use crate::core_modules::radial::{DEFAULT_FRAME_INTERVAL_SECONDS, ProcessedEdge};
pub use crate::core_modules::skip::{SkipReason, SkipTally};
pub use crate::core_modules::spot::Spot;

/// Configuration for the radial engine.
#[derive(Debug, Clone)]
pub struct RadialConfig {
    /// Seconds between frames, used when spots lack `POSITION_T`.
    pub frame_interval_seconds: f64,
    /// Order in which files are processed and concatenated.
    pub file_order: FileOrder,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            frame_interval_seconds: DEFAULT_FRAME_INTERVAL_SECONDS,
            file_order: FileOrder::FirstAppearance,
        }
    }
}

impl RadialConfig {
    pub fn validate(&self) -> Result<(), RadialError> {
        if !self.frame_interval_seconds.is_finite() || self.frame_interval_seconds <= 0.0 {
            return Err(RadialError::invalid_config(format!(
                "frame interval must be a positive number of seconds, got {}",
                self.frame_interval_seconds
            )));
        }
        Ok(())
    }
}

/// Sequential radial analysis over a whole batch.
pub struct RadialPipeline {
    config: RadialConfig,
}

impl RadialPipeline {
    pub fn new(config: RadialConfig) -> Result<Self, RadialError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RadialConfig {
        &self.config
    }

    /// Runs every file, then derives `radial_persistence` on the concatenated rows.
    ///
    /// An empty report is a valid outcome; callers decide whether it is acceptable.
    pub fn run(&self, spots: &[Spot], edges: &[Edge]) -> RadialReport {
        let analyzer = RadialAnalyzer::new(spots, edges, self.config.clone());
        let mut report = analyzer.process_all_files();
        analyzer.calculate_radial_persistence(&mut report.edges);
        report
    }
}
