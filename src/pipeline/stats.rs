//! Counters reported by a pipeline run.

use std::fmt;

/// Statistics of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Page images found in the directory.
    pub pages_total: usize,
    /// Pages that produced at least one line and were exported.
    pub pages_processed: usize,
    /// Pages skipped because no line was detected.
    pub pages_skipped: usize,
    /// Lines recognized over all pages.
    pub lines_recognized: usize,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average lines per processed page, 0 when nothing was processed.
    pub fn lines_per_page(&self) -> f64 {
        if self.pages_processed == 0 {
            0.0
        } else {
            self.lines_recognized as f64 / self.pages_processed as f64
        }
    }

    pub(crate) fn record_page(&mut self, lines: usize) {
        self.pages_processed += 1;
        self.lines_recognized += lines;
    }

    pub(crate) fn record_skip(&mut self) {
        self.pages_skipped += 1;
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Statistics:")?;
        writeln!(f, "  Pages found: {}", self.pages_total)?;
        writeln!(f, "  Processed: {}", self.pages_processed)?;
        writeln!(f, "  Skipped (no lines): {}", self.pages_skipped)?;
        writeln!(
            f,
            "  Lines recognized: {} ({:.1} per page)",
            self.lines_recognized,
            self.lines_per_page()
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineStats;

    #[test]
    fn test_lines_per_page_handles_zero_processed() {
        assert_eq!(PipelineStats::default().lines_per_page(), 0.0);
    }

    #[test]
    fn test_record_page_accumulates() {
        let mut stats = PipelineStats::new();
        stats.record_page(3);
        stats.record_page(5);
        stats.record_skip();
        assert_eq!(stats.pages_processed, 2);
        assert_eq!(stats.pages_skipped, 1);
        assert_eq!(stats.lines_recognized, 8);
        assert_eq!(stats.lines_per_page(), 4.0);
    }

    #[test]
    fn test_display_lists_counters() {
        let stats = PipelineStats {
            pages_total: 4,
            pages_processed: 3,
            pages_skipped: 1,
            lines_recognized: 12,
        };
        let text = stats.to_string();
        assert!(text.contains("Pages found: 4"));
        assert!(text.contains("Lines recognized: 12 (4.0 per page)"));
    }
}
