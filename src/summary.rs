use std::fmt;

/// What happened to one configured source during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Folder missing or no candidate files
    Empty,
    /// Number of files relocated to the destination
    Processed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub label: String,
    pub outcome: SourceOutcome,
}

/// Final verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every source was empty, nothing to do
    Aborted,
    Success,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Aborted => f.write_str("aborted"),
            RunOutcome::Success => f.write_str("successful"),
        }
    }
}

/// Per-source tally built up by the pipeline and handed back to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
    /// Soft failures (transcoder errors, unconverted files)
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_empty(&mut self, label: &str) {
        self.sources.push(SourceReport {
            label: label.to_string(),
            outcome: SourceOutcome::Empty,
        });
    }

    pub fn record_processed(&mut self, label: &str, count: usize) {
        let outcome = if count == 0 {
            SourceOutcome::Empty
        } else {
            SourceOutcome::Processed(count)
        };
        self.sources.push(SourceReport {
            label: label.to_string(),
            outcome,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Labels of the sources that yielded nothing, in processing order
    pub fn empty_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|report| report.outcome == SourceOutcome::Empty)
            .map(|report| report.label.as_str())
            .collect()
    }

    pub fn all_empty(&self) -> bool {
        self.sources
            .iter()
            .all(|report| report.outcome == SourceOutcome::Empty)
    }

    pub fn files_moved(&self) -> usize {
        self.sources
            .iter()
            .map(|report| match report.outcome {
                SourceOutcome::Processed(count) => count,
                SourceOutcome::Empty => 0,
            })
            .sum()
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.all_empty() {
            RunOutcome::Aborted
        } else {
            RunOutcome::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_empty_sources_abort() {
        let mut summary = RunSummary::new();
        summary.record_empty("Snapchat");
        summary.record_processed("VidMate", 0);

        assert!(summary.all_empty());
        assert_eq!(summary.outcome(), RunOutcome::Aborted);
        assert_eq!(summary.empty_sources(), vec!["Snapchat", "VidMate"]);
    }

    #[test]
    fn one_processed_source_is_a_success() {
        let mut summary = RunSummary::new();
        summary.record_empty("Snapchat");
        summary.record_processed("WhatsApp Images", 3);
        summary.record_processed("CLOUD_MUSIC", 2);

        assert_eq!(summary.outcome(), RunOutcome::Success);
        assert_eq!(summary.files_moved(), 5);
        assert_eq!(summary.empty_sources(), vec!["Snapchat"]);
    }

    #[test]
    fn no_sources_counts_as_nothing_to_do() {
        assert_eq!(RunSummary::new().outcome(), RunOutcome::Aborted);
    }
}
