use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Categorical outcome of sentiment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Negative => write!(f, "negative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f64,
}

impl SentimentResult {
    /// Defined sentinel for empty/absent text and for per-item
    /// classification failures. Not an error value.
    pub fn neutral_sentinel() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.5,
        }
    }
}

/// One cleaned player review. Sentiment is attached after classification
/// and never mutates the loader-supplied fields.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub id: usize,
    pub country: String,
    pub rating: u8,
    pub date: NaiveDate,
    pub version: String,
    pub username: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub sentiment: Option<SentimentResult>,
}

impl ReviewRecord {
    /// Title and content joined as one sentence-delimited unit for
    /// classification. None when the record carries neither.
    pub fn combined_text(&self) -> Option<String> {
        let title = self.title.as_deref().filter(|t| !t.trim().is_empty());
        let content = self.content.as_deref().filter(|c| !c.trim().is_empty());
        match (title, content) {
            (Some(t), Some(c)) => Some(format!("{t}. {c}")),
            (Some(t), None) => Some(t.to_string()),
            (None, Some(c)) => Some(c.to_string()),
            (None, None) => None,
        }
    }

    /// Title and content joined with a plain space for keyword counting,
    /// so the title's last token does not pick up a glued period.
    pub fn topic_text(&self) -> Option<String> {
        let title = self.title.as_deref().filter(|t| !t.trim().is_empty());
        let content = self.content.as_deref().filter(|c| !c.trim().is_empty());
        match (title, content) {
            (Some(t), Some(c)) => Some(format!("{t} {c}")),
            (Some(t), None) => Some(t.to_string()),
            (None, Some(c)) => Some(c.to_string()),
            (None, None) => None,
        }
    }
}

/// A named, date-bounded slice of classified review records.
#[derive(Debug, Clone)]
pub struct Period {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub records: Vec<ReviewRecord>,
}

impl Period {
    pub fn new(
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        records: Vec<ReviewRecord>,
    ) -> Result<Self> {
        if start > end {
            return Err(AnalysisError::InvalidInput(format!(
                "period start {start} is after end {end}"
            )));
        }
        Ok(Self {
            name: name.into(),
            start,
            end,
            records,
        })
    }
}

/// Review counts grouped into time buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub counts: BTreeMap<NaiveDate, u64>,
    pub total: u64,
    pub average_per_bucket: f64,
    pub peak_bucket: Option<NaiveDate>,
    pub peak_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentStats {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    pub positive_ratio: f64,
    pub neutral_ratio: f64,
    pub negative_ratio: f64,
    pub average_score: f64,
    pub score_std: f64,
    pub rating_correlation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// Mean sentiment score per bucket with a least-squares trend estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendStats {
    pub series: BTreeMap<NaiveDate, f64>,
    pub most_positive: Option<(NaiveDate, f64)>,
    pub most_negative: Option<(NaiveDate, f64)>,
    pub slope: f64,
    pub direction: TrendDirection,
}

impl Default for TrendStats {
    fn default() -> Self {
        Self {
            series: BTreeMap::new(),
            most_positive: None,
            most_negative: None,
            slope: 0.0,
            direction: TrendDirection::Stable,
        }
    }
}

/// Top keyword frequencies, ordered by descending count with
/// first-encountered tie-break.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordStats {
    pub top: Vec<(String, u64)>,
}

/// Read-only aggregate over one classified period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatistics {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub review_count: usize,
    pub average_rating: f64,
    pub rating_distribution: BTreeMap<u8, u64>,
    pub version_distribution: BTreeMap<String, u64>,
    pub volume: VolumeStats,
    pub sentiment: SentimentStats,
    pub trend: TrendStats,
    pub keywords: KeywordStats,
}

/// Actual date coverage of one period within a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSide {
    pub total_reviews: usize,
    pub daily_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeComparison {
    pub period1: VolumeSide,
    pub period2: VolumeSide,
    /// Signed percent changes; a zero baseline yields `f64::INFINITY`.
    pub total_reviews_percent: f64,
    pub daily_average_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingComparison {
    pub period1_average: f64,
    pub period2_average: f64,
    pub delta: f64,
}

/// Ratios are percentages rounded to 2 decimals, scores to 4.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSide {
    pub positive_ratio: f64,
    pub negative_ratio: f64,
    pub neutral_ratio: f64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentComparison {
    pub period1: SentimentSide,
    pub period2: SentimentSide,
    pub positive_ratio_points: f64,
    pub negative_ratio_points: f64,
    pub neutral_ratio_points: f64,
    pub score_delta: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub period1_main: Option<String>,
    pub period2_main: Option<String>,
    pub changed: bool,
}

/// Full output of one comparison request. Constructed once, serialized
/// into a report, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub period1: PeriodWindow,
    pub period2: PeriodWindow,
    pub volume: VolumeComparison,
    pub rating: RatingComparison,
    pub sentiment: SentimentComparison,
    pub version: VersionComparison,
    pub summary: Vec<String>,
    pub detailed_insights: Vec<String>,
}
