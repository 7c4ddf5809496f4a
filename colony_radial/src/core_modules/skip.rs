use std::fmt;

/// Why an edge was dropped from the output instead of producing a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The `0 -> 0` placeholder link.
    SentinelEdge,
    /// `SPOT_SOURCE_ID` does not resolve within the file.
    MissingSource,
    /// `SPOT_TARGET_ID` does not resolve within the file.
    MissingTarget,
    /// Neither `POSITION_T` nor `FRAME` is present on both endpoints.
    MissingTime,
    /// Both endpoints share the same time; velocity is undefined.
    ZeroElapsedTime,
    /// The source spot sits exactly on the dynamic center; direction is undefined.
    ZeroRadialDistance,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::SentinelEdge => "sentinel edge",
            SkipReason::MissingSource => "missing source spot",
            SkipReason::MissingTarget => "missing target spot",
            SkipReason::MissingTime => "missing time fields",
            SkipReason::ZeroElapsedTime => "zero elapsed time",
            SkipReason::ZeroRadialDistance => "zero radial distance",
        };
        f.write_str(label)
    }
}

/// Per-reason counters of dropped edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipTally {
    pub sentinel_edges: usize,
    pub missing_source: usize,
    pub missing_target: usize,
    pub missing_time: usize,
    pub zero_elapsed_time: usize,
    pub zero_radial_distance: usize,
}

impl SkipTally {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::SentinelEdge => self.sentinel_edges += 1,
            SkipReason::MissingSource => self.missing_source += 1,
            SkipReason::MissingTarget => self.missing_target += 1,
            SkipReason::MissingTime => self.missing_time += 1,
            SkipReason::ZeroElapsedTime => self.zero_elapsed_time += 1,
            SkipReason::ZeroRadialDistance => self.zero_radial_distance += 1,
        }
    }

    pub fn count(&self, reason: SkipReason) -> usize {
        match reason {
            SkipReason::SentinelEdge => self.sentinel_edges,
            SkipReason::MissingSource => self.missing_source,
            SkipReason::MissingTarget => self.missing_target,
            SkipReason::MissingTime => self.missing_time,
            SkipReason::ZeroElapsedTime => self.zero_elapsed_time,
            SkipReason::ZeroRadialDistance => self.zero_radial_distance,
        }
    }

    pub fn merge(&mut self, other: &SkipTally) {
        self.sentinel_edges += other.sentinel_edges;
        self.missing_source += other.missing_source;
        self.missing_target += other.missing_target;
        self.missing_time += other.missing_time;
        self.zero_elapsed_time += other.zero_elapsed_time;
        self.zero_radial_distance += other.zero_radial_distance;
    }

    pub fn total(&self) -> usize {
        self.sentinel_edges
            + self.missing_source
            + self.missing_target
            + self.missing_time
            + self.zero_elapsed_time
            + self.zero_radial_distance
    }
}

impl fmt::Display for SkipTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} skipped (sentinel {}, missing source {}, missing target {}, missing time {}, zero dt {}, zero r {})",
            self.total(),
            self.sentinel_edges,
            self.missing_source,
            self.missing_target,
            self.missing_time,
            self.zero_elapsed_time,
            self.zero_radial_distance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_merge_accumulate_per_reason() {
        let mut a = SkipTally::default();
        a.record(SkipReason::MissingSource);
        a.record(SkipReason::MissingSource);
        a.record(SkipReason::ZeroElapsedTime);

        let mut b = SkipTally::default();
        b.record(SkipReason::SentinelEdge);
        b.record(SkipReason::MissingSource);

        a.merge(&b);
        assert_eq!(a.count(SkipReason::MissingSource), 3);
        assert_eq!(a.count(SkipReason::ZeroElapsedTime), 1);
        assert_eq!(a.count(SkipReason::SentinelEdge), 1);
        assert_eq!(a.count(SkipReason::ZeroRadialDistance), 0);
        assert_eq!(a.total(), 5);
    }
}
