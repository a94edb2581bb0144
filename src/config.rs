use crate::stats::Bucket;

/// Tunable constants for the analysis pipeline, passed explicitly to the
/// components that need them. No ambient global configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Symmetric band around zero inside which a lexicon compound score
    /// is labelled neutral.
    pub neutral_threshold: f64,
    /// Periods with fewer records than this get a warning result
    /// instead of full analysis.
    pub min_sample_size: usize,
    /// Model-strategy input is truncated to this many characters.
    pub max_model_input: usize,
    /// How many top keywords to report per period.
    pub top_keywords: usize,
    /// Emit a progress log line every N classified records.
    pub progress_interval: usize,
    /// Time bucket used for volume and trend grouping.
    pub bucket: Bucket,
    /// Classification worker pool size.
    pub workers: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            neutral_threshold: 0.15,
            min_sample_size: 10,
            max_model_input: 512,
            top_keywords: 20,
            progress_interval: 100,
            bucket: Bucket::Daily,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}
