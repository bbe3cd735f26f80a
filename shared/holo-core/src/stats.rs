//! Eight-number summaries used by channel and unit summaries

/// Statistic names in column order
pub const STAT_LABELS: [&str; 8] = ["sum", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Sum, mean, population standard deviation, min, quartiles and max of a sample.
/// Every statistic except the sum is `None` for an empty sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStats {
    pub sum: f64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStats {
    /// Summarize the present values. `None` entries are skipped.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut sorted: Vec<f64> = values.into_iter().flatten().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        // Folding from +0.0 keeps an empty sum from rendering as "-0"
        let sum = sorted.iter().fold(0.0, |acc, v| acc + v);
        if sorted.is_empty() {
            return Self::default();
        }

        let n = sorted.len() as f64;
        let mean = sum / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = if variance.is_nan() { 0.0 } else { variance.sqrt() };

        Self {
            sum,
            mean: Some(mean),
            std: Some(std),
            min: sorted.first().copied(),
            q25: Some(quantile(&sorted, 0.25)),
            median: Some(quantile(&sorted, 0.50)),
            q75: Some(quantile(&sorted, 0.75)),
            max: sorted.last().copied(),
        }
    }

    /// Values in [`STAT_LABELS`] order
    pub fn values(&self) -> [Option<f64>; 8] {
        [
            Some(self.sum),
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }

    /// `(label, value)` pairs named `<prefix>_(<stat>)`, e.g. `view_count_(mean)`
    pub fn labelled(&self, prefix: &str) -> Vec<(String, Option<f64>)> {
        STAT_LABELS
            .iter()
            .zip(self.values())
            .map(|(stat, value)| (format!("{}_({})", prefix, stat), value))
            .collect()
    }
}

/// Quantile of sorted data by linear interpolation between closest ranks
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Column key for a label: lower-cased with spaces as underscores (`Music Video` -> `music_video`)
pub fn column_key(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}
