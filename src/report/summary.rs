//! End-of-run statistics

use std::collections::BTreeMap;

use super::row::ReportRow;

/// Spread of the detected tempi
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmStats {
    /// Mean BPM
    pub mean: f32,
    /// Slowest track
    pub min: u32,
    /// Fastest track
    pub max: u32,
    /// Population standard deviation
    pub std_dev: f32,
}

/// Totals of one batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Rows in the report
    pub processed: usize,
    /// Rows with both a key and a tempo
    pub analyzed: usize,
    /// Rows whose file was renamed
    pub renamed: usize,
    /// Rows carrying an error
    pub errors: usize,
    /// Tempo statistics over rows with a tempo
    pub bpm: Option<BpmStats>,
    /// Number of tracks per Classic key name
    pub keys: BTreeMap<String, usize>,
}

impl BatchSummary {
    /// Tally a finished report
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut keys = BTreeMap::new();
        for key in rows.iter().filter_map(|r| r.key_classic.as_ref()) {
            *keys.entry(key.clone()).or_insert(0) += 1;
        }

        let tempi: Vec<u32> = rows.iter().filter_map(|r| r.bpm).collect();

        Self {
            processed: rows.len(),
            analyzed: rows
                .iter()
                .filter(|r| r.bpm.is_some() && r.key_classic.is_some())
                .count(),
            renamed: rows.iter().filter(|r| r.changed).count(),
            errors: rows.iter().filter(|r| r.error.is_some()).count(),
            bpm: bpm_stats(&tempi),
            keys,
        }
    }

    /// Log the summary at info level
    pub fn log(&self) {
        log::info!(
            "Processed {} files: {} analyzed, {} renamed, {} with errors",
            self.processed,
            self.analyzed,
            self.renamed,
            self.errors
        );

        if let Some(stats) = &self.bpm {
            log::info!(
                "BPM: mean {:.1}, min {}, max {}, std dev {:.1}",
                stats.mean,
                stats.min,
                stats.max,
                stats.std_dev
            );
        }

        let mut by_count: Vec<(&String, &usize)> = self.keys.iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (key, count) in by_count.iter().take(5) {
            log::info!("  {:<4} {} tracks", key, count);
        }
    }
}

fn bpm_stats(tempi: &[u32]) -> Option<BpmStats> {
    let min = *tempi.iter().min()?;
    let max = *tempi.iter().max()?;
    let n = tempi.len() as f32;
    let mean = tempi.iter().map(|&b| b as f32).sum::<f32>() / n;
    let variance = tempi
        .iter()
        .map(|&b| (b as f32 - mean).powi(2))
        .sum::<f32>()
        / n;

    Some(BpmStats {
        mean,
        min,
        max,
        std_dev: variance.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(key: Option<&str>, bpm: Option<u32>, changed: bool, error: bool) -> ReportRow {
        ReportRow {
            original_name: "a.mp3".to_string(),
            final_name: "a.mp3".to_string(),
            key_classic: key.map(String::from),
            key_camelot: None,
            bpm,
            changed,
            error: error.then(|| "failed".to_string()),
            correlation: None,
            confidence: None,
            duration_seconds: None,
            size_mb: None,
            processed_at: String::new(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let rows = vec![
            row(Some("Am"), Some(120), true, false),
            row(Some("Am"), Some(130), false, false),
            row(Some("C"), None, false, true),
            row(None, None, false, true),
        ];
        let summary = BatchSummary::from_rows(&rows);

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.analyzed, 2);
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.keys.get("Am"), Some(&2));
        assert_eq!(summary.keys.get("C"), Some(&1));

        let stats = summary.bpm.unwrap();
        assert_eq!(stats.min, 120);
        assert_eq!(stats.max, 130);
        assert_relative_eq!(stats.mean, 125.0);
        assert_relative_eq!(stats.std_dev, 5.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_rows(&[]);
        assert_eq!(summary, BatchSummary::default());
        assert!(summary.bpm.is_none());
    }
}
