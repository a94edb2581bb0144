use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::models::{ReviewRecord, SentimentLabel, SentimentResult};

/// Seam for an external pretrained text-classification capability.
/// Implementations must be safe to call from multiple workers at once.
pub trait SentimentModel: Send + Sync {
    fn score(&self, text: &str) -> Result<ModelOutput>;
}

/// Raw model output: whatever label vocabulary the model uses, plus a
/// confidence in [0,1].
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub label: String,
    pub score: f64,
}

// Compact valence lexicon for player reviews, VADER-style weights in
// roughly [-4, 4].
const LEXICON: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("awful", -2.0),
    ("bad", -2.5),
    ("best", 3.2),
    ("better", 1.9),
    ("boring", -1.3),
    ("broken", -2.2),
    ("bug", -1.5),
    ("buggy", -2.1),
    ("cool", 1.3),
    ("crash", -2.0),
    ("crashes", -2.0),
    ("disappointed", -2.3),
    ("disappointing", -2.2),
    ("enjoy", 1.9),
    ("enjoyable", 2.0),
    ("excellent", 2.7),
    ("fantastic", 2.6),
    ("favorite", 2.0),
    ("frustrating", -2.1),
    ("fun", 2.3),
    ("garbage", -2.8),
    ("glitch", -1.6),
    ("good", 1.9),
    ("great", 3.1),
    ("greedy", -2.1),
    ("happy", 2.7),
    ("hate", -2.7),
    ("horrible", -2.5),
    ("lag", -1.4),
    ("laggy", -1.8),
    ("love", 3.2),
    ("loved", 2.9),
    ("mediocre", -0.7),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("poor", -2.1),
    ("problem", -1.4),
    ("problems", -1.4),
    ("recommend", 1.7),
    ("refund", -1.9),
    ("sad", -2.1),
    ("scam", -2.9),
    ("slow", -1.2),
    ("smooth", 1.5),
    ("solid", 1.5),
    ("stuck", -1.3),
    ("terrible", -2.6),
    ("trash", -2.6),
    ("uninstall", -2.0),
    ("unplayable", -2.7),
    ("useless", -1.8),
    ("waste", -2.2),
    ("wonderful", 2.7),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wow", 2.2),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "isnt", "dont", "doesnt", "didnt", "cant", "wont", "wouldnt",
    "couldnt", "aint",
];

// VADER normalization constant and negation damping factor.
const NORM_ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;

enum Strategy {
    Lexicon {
        weights: HashMap<&'static str, f64>,
        threshold: f64,
    },
    Model {
        model: Arc<dyn SentimentModel>,
        max_input: usize,
    },
}

/// Maps one text to a (label, score) pair. The strategy is fixed at
/// construction and all internal state is read-only afterwards, so one
/// classifier can be shared across pool workers.
pub struct SentimentClassifier {
    strategy: Strategy,
}

impl SentimentClassifier {
    pub fn lexicon(threshold: f64) -> Self {
        Self {
            strategy: Strategy::Lexicon {
                weights: LEXICON.iter().copied().collect(),
                threshold,
            },
        }
    }

    pub fn model(model: Arc<dyn SentimentModel>, max_input: usize) -> Self {
        Self {
            strategy: Strategy::Model { model, max_input },
        }
    }

    /// Classify one text. Empty text yields the neutral sentinel, and a
    /// per-text model failure is logged and recovered with the same
    /// sentinel so batch callers never see it.
    pub fn classify(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() {
            return SentimentResult::neutral_sentinel();
        }

        match &self.strategy {
            Strategy::Lexicon { weights, threshold } => {
                let score = compound_score(text, weights);
                let label = if score >= *threshold {
                    SentimentLabel::Positive
                } else if score <= -*threshold {
                    SentimentLabel::Negative
                } else {
                    SentimentLabel::Neutral
                };
                SentimentResult { label, score }
            }
            Strategy::Model { model, max_input } => {
                let truncated: String = text.chars().take(*max_input).collect();
                match model.score(&truncated) {
                    Ok(output) => SentimentResult {
                        label: parse_model_label(&output.label),
                        score: output.score.clamp(0.0, 1.0),
                    },
                    Err(e) => {
                        warn!("model classification failed, using neutral sentinel: {e}");
                        SentimentResult::neutral_sentinel()
                    }
                }
            }
        }
    }
}

fn parse_model_label(label: &str) -> SentimentLabel {
    match label.to_lowercase().as_str() {
        "positive" => SentimentLabel::Positive,
        "negative" => SentimentLabel::Negative,
        _ => SentimentLabel::Neutral,
    }
}

/// Compound polarity in [-1, 1]: signed valence sum over lexicon hits,
/// flipped and damped after a negator, normalized like VADER.
fn compound_score(text: &str, weights: &HashMap<&'static str, f64>) -> f64 {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect();

    let mut sum = 0.0;
    for (i, token) in tokens.iter().enumerate() {
        let Some(&valence) = weights.get(token.as_str()) else {
            continue;
        };
        let negated = i > 0 && NEGATORS.contains(&tokens[i - 1].as_str());
        sum += if negated {
            valence * NEGATION_SCALAR
        } else {
            valence
        };
    }

    if sum == 0.0 {
        0.0
    } else {
        sum / (sum * sum + NORM_ALPHA).sqrt()
    }
}

/// Heuristic stand-in for an external pretrained model: votes by lexicon
/// hit counts and reports the winning share as confidence. Wired through
/// the same `SentimentModel` seam a real model would use.
pub struct HeuristicModel {
    weights: HashMap<&'static str, f64>,
}

impl HeuristicModel {
    pub fn new() -> Self {
        Self {
            weights: LEXICON.iter().copied().collect(),
        }
    }
}

impl Default for HeuristicModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for HeuristicModel {
    fn score(&self, text: &str) -> Result<ModelOutput> {
        let mut positive = 0u32;
        let mut negative = 0u32;
        for token in text.split_whitespace() {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            match self.weights.get(token.as_str()) {
                Some(v) if *v > 0.0 => positive += 1,
                Some(v) if *v < 0.0 => negative += 1,
                _ => {}
            }
        }

        let total = positive + negative;
        if total == 0 {
            return Ok(ModelOutput {
                label: "NEUTRAL".to_string(),
                score: 0.5,
            });
        }
        let (label, hits) = if positive >= negative {
            ("POSITIVE", positive)
        } else {
            ("NEGATIVE", negative)
        };
        Ok(ModelOutput {
            label: label.to_string(),
            score: f64::from(hits) / f64::from(total),
        })
    }
}

/// Fans a record set out across a bounded worker pool and attaches each
/// result to its source record by row identity, independent of
/// completion order.
pub struct ClassificationScheduler {
    classifier: Arc<SentimentClassifier>,
    workers: usize,
    progress_interval: usize,
}

impl ClassificationScheduler {
    pub fn new(classifier: Arc<SentimentClassifier>, config: &AnalyzerConfig) -> Self {
        Self {
            classifier,
            workers: config.workers.max(1),
            progress_interval: config.progress_interval.max(1),
        }
    }

    /// Classify every record, preserving input cardinality and order.
    /// A failed unit of work does not cancel the batch; its record gets
    /// the neutral sentinel.
    pub async fn classify_batch(&self, records: Vec<ReviewRecord>) -> Vec<ReviewRecord> {
        if records.is_empty() {
            return records;
        }

        let total = records.len();
        info!("classifying {total} reviews across {} workers", self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        for (slot, record) in records.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let classifier = Arc::clone(&self.classifier);
            let text = record.combined_text();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = match text {
                    Some(text) => classifier.classify(&text),
                    None => SentimentResult::neutral_sentinel(),
                };
                (slot, result)
            });
        }

        let mut results: Vec<Option<SentimentResult>> = vec![None; total];
        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            match joined {
                Ok((slot, result)) => results[slot] = Some(result),
                // The slot stays None and falls back to the sentinel.
                Err(e) => warn!("classification task failed: {e}"),
            }
            if completed % self.progress_interval == 0 || completed == total {
                info!(
                    "classification progress: {completed}/{total} ({:.1}%)",
                    completed as f64 / total as f64 * 100.0
                );
            }
        }

        let mut records = records;
        for (record, result) in records.iter_mut().zip(results) {
            record.sentiment = Some(result.unwrap_or_else(SentimentResult::neutral_sentinel));
        }
        records
    }
}
