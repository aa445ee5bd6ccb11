use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::RecoveredError;

/// A timed step of frame handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Appending a chunk and parsing the buffer.
    Decode,
    /// Mapping a frame to an action.
    Classify,
    /// Turning the action's pixel payloads into images.
    Materialize,
    /// Publishing the change to the progress state.
    Apply,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Classify => "classify",
            Stage::Materialize => "materialize",
            Stage::Apply => "apply",
        }
    }
}

/// Hooks the session calls around each stage of frame handling.
///
/// Both methods default to doing nothing. Implementations must be cheap;
/// they run inline on the read loop.
pub trait StageObserver: Send + Sync {
    fn on_stage(&self, _stage: Stage, _elapsed: Duration) {}

    fn on_recovered(&self, _error: &RecoveredError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}

/// Observer that records stage timings and recovered errors.
#[derive(Debug, Default)]
pub struct PerfRecorder {
    timings: Mutex<HashMap<Stage, Vec<Duration>>>,
    recovered: Mutex<Vec<RecoveredError>>,
}

impl PerfRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of measurements taken for `stage`.
    pub fn count(&self, stage: Stage) -> usize {
        self.timings
            .lock()
            .map(|t| t.get(&stage).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Mean duration of `stage`, or zero if it was never measured.
    pub fn average(&self, stage: Stage) -> Duration {
        let Ok(timings) = self.timings.lock() else {
            return Duration::ZERO;
        };
        match timings.get(&stage) {
            Some(samples) if !samples.is_empty() => {
                samples.iter().sum::<Duration>() / samples.len() as u32
            }
            _ => Duration::ZERO,
        }
    }

    /// Recovered errors seen so far, oldest first.
    pub fn recovered(&self) -> Vec<RecoveredError> {
        self.recovered.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// One line per measured stage, e.g. `decode: 12 samples, avg 85µs`.
    pub fn report(&self) -> String {
        let Ok(timings) = self.timings.lock() else {
            return String::new();
        };
        let mut stages: Vec<_> = timings.keys().copied().collect();
        stages.sort_by_key(|s| s.as_str());
        drop(timings);

        stages
            .into_iter()
            .map(|s| {
                format!(
                    "{}: {} samples, avg {:?}",
                    s.as_str(),
                    self.count(s),
                    self.average(s)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl StageObserver for PerfRecorder {
    fn on_stage(&self, stage: Stage, elapsed: Duration) {
        if let Ok(mut timings) = self.timings.lock() {
            timings.entry(stage).or_default().push(elapsed);
        }
    }

    fn on_recovered(&self, error: &RecoveredError) {
        if let Ok(mut recovered) = self.recovered.lock() {
            recovered.push(error.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnexpectedUpdateKind;

    #[test]
    fn test_average_of_samples() {
        let perf = PerfRecorder::new();
        perf.on_stage(Stage::Decode, Duration::from_millis(10));
        perf.on_stage(Stage::Decode, Duration::from_millis(30));
        assert_eq!(perf.count(Stage::Decode), 2);
        assert_eq!(perf.average(Stage::Decode), Duration::from_millis(20));
    }

    #[test]
    fn test_unmeasured_stage_is_zero() {
        let perf = PerfRecorder::new();
        assert_eq!(perf.count(Stage::Apply), 0);
        assert_eq!(perf.average(Stage::Apply), Duration::ZERO);
        assert!(perf.report().is_empty());
    }

    #[test]
    fn test_records_recovered_errors() {
        let perf = PerfRecorder::new();
        perf.on_recovered(&UnexpectedUpdateKind("x".into()).into());
        assert_eq!(perf.recovered().len(), 1);
    }

    #[test]
    fn test_report_lists_stages() {
        let perf = PerfRecorder::new();
        perf.on_stage(Stage::Materialize, Duration::from_micros(5));
        perf.on_stage(Stage::Classify, Duration::from_micros(1));
        let report = perf.report();
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("classify: 1 samples"));
        assert!(lines[1].starts_with("materialize: 1 samples"));
    }

    #[test]
    fn test_noop_observer_accepts_calls() {
        let noop = NoopObserver;
        noop.on_stage(Stage::Decode, Duration::from_millis(1));
    }
}
