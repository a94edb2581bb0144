use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AnalyzerConfig;
use crate::models::{
    KeywordStats, Period, PeriodStatistics, ReviewRecord, SentimentLabel, SentimentStats,
    TrendDirection, TrendStats, VolumeStats,
};

/// Fixed-width time interval used to group records. Volume and trend use
/// the same bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Daily,
    Weekly,
    Monthly,
}

impl Bucket {
    /// Canonical bucket key for a date: the day itself, the Monday of
    /// its week, or the first of its month.
    pub fn key(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Bucket::Daily => date,
            Bucket::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Bucket::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    fn next(&self, key: NaiveDate) -> NaiveDate {
        match self {
            Bucket::Daily => key + Duration::days(1),
            Bucket::Weekly => key + Duration::days(7),
            Bucket::Monthly => {
                let (year, month) = if key.month() == 12 {
                    (key.year() + 1, 1)
                } else {
                    (key.year(), key.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(key + Duration::days(31))
            }
        }
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Bucket::Daily),
            "weekly" | "week" | "w" => Ok(Bucket::Weekly),
            "monthly" | "month" | "m" => Ok(Bucket::Monthly),
            other => Err(format!("unknown bucket '{other}', expected daily/weekly/monthly")),
        }
    }
}

/// Continuous sequence of bucket keys covering [min, max], so days (or
/// weeks, months) with no reviews still appear as buckets.
fn bucket_range(bucket: Bucket, min: NaiveDate, max: NaiveDate) -> Vec<NaiveDate> {
    let mut keys = Vec::new();
    let mut key = bucket.key(min);
    let last = bucket.key(max);
    while key <= last {
        keys.push(key);
        key = bucket.next(key);
    }
    keys
}

fn date_bounds(records: &[ReviewRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let min = records.iter().map(|r| r.date).min()?;
    let max = records.iter().map(|r| r.date).max()?;
    Some((min, max))
}

/// Review counts per bucket over the full covered range. Empty input
/// yields the all-zero result, not an error.
pub fn volume(records: &[ReviewRecord], bucket: Bucket) -> VolumeStats {
    let Some((min, max)) = date_bounds(records) else {
        return VolumeStats::default();
    };

    let mut counts: BTreeMap<NaiveDate, u64> = bucket_range(bucket, min, max)
        .into_iter()
        .map(|key| (key, 0))
        .collect();
    for record in records {
        if let Some(count) = counts.get_mut(&bucket.key(record.date)) {
            *count += 1;
        }
    }

    let total = records.len() as u64;
    let average_per_bucket = total as f64 / counts.len() as f64;
    // First bucket wins ties; BTreeMap iterates in date order.
    let (peak_bucket, peak_count) = counts
        .iter()
        .fold((None, 0u64), |(best, best_count), (key, count)| {
            if *count > best_count || best.is_none() {
                (Some(*key), *count)
            } else {
                (best, best_count)
            }
        });

    VolumeStats {
        counts,
        total,
        average_per_bucket,
        peak_bucket,
        peak_count,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation; 0 below 2 values.
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Pearson correlation; 0 below 2 pairs or at zero variance.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() < 2 || xs.len() != ys.len() {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx) * (x - mx);
        var_y += (y - my) * (y - my);
    }
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        cov / denom
    }
}

/// Label counts, ratios against the full record count, score moments and
/// rating/score correlation. Records without attached sentiment degrade
/// every dependent value to zero.
pub fn sentiment_distribution(records: &[ReviewRecord]) -> SentimentStats {
    let total = records.len();
    if total == 0 {
        return SentimentStats::default();
    }

    let mut stats = SentimentStats::default();
    let mut scores = Vec::new();
    let mut ratings = Vec::new();
    for record in records {
        let Some(sentiment) = record.sentiment else {
            continue;
        };
        match sentiment.label {
            SentimentLabel::Positive => stats.positive += 1,
            SentimentLabel::Neutral => stats.neutral += 1,
            SentimentLabel::Negative => stats.negative += 1,
        }
        scores.push(sentiment.score);
        ratings.push(f64::from(record.rating));
    }

    if scores.is_empty() {
        warn!("no sentiment attached to any record, sentiment stats degrade to zeros");
        return stats;
    }

    stats.positive_ratio = stats.positive as f64 / total as f64;
    stats.neutral_ratio = stats.neutral as f64 / total as f64;
    stats.negative_ratio = stats.negative as f64 / total as f64;
    stats.average_score = mean(&scores);
    stats.score_std = std_dev(&scores);
    stats.rating_correlation = pearson(&ratings, &scores);
    stats
}

fn direction_for_slope(slope: f64) -> TrendDirection {
    if slope > 0.01 {
        TrendDirection::Up
    } else if slope < -0.01 {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Mean sentiment score per bucket plus a least-squares slope over the
/// bucket index. Buckets with no records keep their index position but
/// contribute no point to the fit, mirroring the original regression
/// over raw bucket index rather than elapsed time.
pub fn sentiment_trend(records: &[ReviewRecord], bucket: Bucket) -> TrendStats {
    let classified: Vec<&ReviewRecord> =
        records.iter().filter(|r| r.sentiment.is_some()).collect();
    let Some((min, max)) = date_bounds(records) else {
        return TrendStats::default();
    };
    if classified.is_empty() {
        warn!("no sentiment attached to any record, trend degrades to stable");
        return TrendStats::default();
    }

    let mut sums: HashMap<NaiveDate, (f64, u64)> = HashMap::new();
    for record in &classified {
        if let Some(sentiment) = record.sentiment {
            let entry = sums.entry(bucket.key(record.date)).or_insert((0.0, 0));
            entry.0 += sentiment.score;
            entry.1 += 1;
        }
    }

    let keys = bucket_range(bucket, min, max);
    let mut series = BTreeMap::new();
    let mut points: Vec<(f64, f64)> = Vec::new();
    let mut most_positive: Option<(NaiveDate, f64)> = None;
    let mut most_negative: Option<(NaiveDate, f64)> = None;
    for (index, key) in keys.iter().enumerate() {
        let Some((sum, count)) = sums.get(key) else {
            continue;
        };
        let bucket_mean = sum / *count as f64;
        series.insert(*key, bucket_mean);
        points.push((index as f64, bucket_mean));
        // Strict comparisons keep the first bucket on ties.
        if most_positive.map_or(true, |(_, best)| bucket_mean > best) {
            most_positive = Some((*key, bucket_mean));
        }
        if most_negative.map_or(true, |(_, best)| bucket_mean < best) {
            most_negative = Some((*key, bucket_mean));
        }
    }

    let slope = least_squares_slope(&points);
    TrendStats {
        series,
        most_positive,
        most_negative,
        slope,
        direction: direction_for_slope(slope),
    }
}

/// Simple least-squares slope; 0 below 2 points or at zero x-variance.
fn least_squares_slope(points: &[(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();
    let denom = n * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        0.0
    } else {
        (n * sum_xy - sum_x * sum_y) / denom
    }
}

// The original implementation's English stop-word list, kept verbatim.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "because", "as", "what", "when", "where",
    "how", "to", "in", "is", "it", "of", "for", "with", "this", "that", "be", "on", "are",
    "was", "were", "has", "have", "had", "not", "by", "at", "from", "so", "some", "other",
    "than", "then", "can", "could", "will", "would", "my", "your", "his", "her", "their",
    "our", "its", "i", "you", "he", "she", "they", "we", "who", "whom", "whose", "which",
    "there", "here", "all", "any", "each", "more", "most", "need", "im", "just", "dont",
    "get", "also", "ill", "very",
];

/// Top-N keyword frequencies over lower-cased title+content (joined by
/// a space), whitespace tokenized, dropping stop words and tokens of
/// length <= 2. Ties break by first-encountered order.
pub fn keywords(records: &[ReviewRecord], top_n: usize) -> KeywordStats {
    let mut counts: HashMap<String, (u64, usize)> = HashMap::new();
    let mut next_seen = 0usize;
    for record in records {
        let Some(text) = record.topic_text() else {
            continue;
        };
        for token in text.to_lowercase().split_whitespace() {
            if token.chars().count() <= 2 || STOP_WORDS.contains(&token) {
                continue;
            }
            let entry = counts.entry(token.to_string()).or_insert_with(|| {
                let seen = (0, next_seen);
                next_seen += 1;
                seen
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(String, u64, usize)> = counts
        .into_iter()
        .map(|(word, (count, first_seen))| (word, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(top_n);

    KeywordStats {
        top: ranked.into_iter().map(|(word, count, _)| (word, count)).collect(),
    }
}

/// Full per-period aggregate consumed by renderers and the synthesizer.
pub fn period_statistics(period: &Period, config: &AnalyzerConfig) -> PeriodStatistics {
    let records = &period.records;
    let mut rating_distribution: BTreeMap<u8, u64> = BTreeMap::new();
    let mut version_distribution: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        *rating_distribution.entry(record.rating).or_insert(0) += 1;
        if !record.version.is_empty() {
            *version_distribution.entry(record.version.clone()).or_insert(0) += 1;
        }
    }
    let average_rating = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| f64::from(r.rating)).sum::<f64>() / records.len() as f64
    };

    PeriodStatistics {
        name: period.name.clone(),
        start: period.start,
        end: period.end,
        review_count: records.len(),
        average_rating: (average_rating * 100.0).round() / 100.0,
        rating_distribution,
        version_distribution,
        volume: volume(records, config.bucket),
        sentiment: sentiment_distribution(records),
        trend: sentiment_trend(records, config.bucket),
        keywords: keywords(records, config.top_keywords),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentResult;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn record(id: usize, date: NaiveDate, rating: u8, score: f64) -> ReviewRecord {
        let label = if score >= 0.15 {
            SentimentLabel::Positive
        } else if score <= -0.15 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        ReviewRecord {
            id,
            country: "US".to_string(),
            rating,
            date,
            version: "1.0.0".to_string(),
            username: "player".to_string(),
            title: None,
            content: Some("fine".to_string()),
            sentiment: Some(SentimentResult { label, score }),
        }
    }

    #[test]
    fn volume_counts_sum_to_total() {
        let records = vec![
            record(0, day(1), 5, 0.5),
            record(1, day(1), 4, 0.2),
            record(2, day(3), 3, 0.0),
        ];
        let stats = volume(&records, Bucket::Daily);
        assert_eq!(stats.counts.values().sum::<u64>(), stats.total);
        assert_eq!(stats.total, 3);
        // Day 2 has no reviews but still appears as a zero bucket.
        assert_eq!(stats.counts.len(), 3);
        assert_eq!(stats.counts[&day(2)], 0);
        assert_eq!(stats.peak_bucket, Some(day(1)));
        assert_eq!(stats.peak_count, 2);
        assert!((stats.average_per_bucket - 1.0).abs() < 1e-9);
    }

    #[test]
    fn volume_peak_first_bucket_wins_ties() {
        let records = vec![record(0, day(1), 5, 0.5), record(1, day(2), 4, 0.2)];
        let stats = volume(&records, Bucket::Daily);
        assert_eq!(stats.peak_bucket, Some(day(1)));
    }

    #[test]
    fn volume_empty_input_is_all_zero() {
        let stats = volume(&[], Bucket::Daily);
        assert_eq!(stats, VolumeStats::default());
    }

    #[test]
    fn weekly_and_monthly_bucket_keys() {
        // 2025-01-08 is a Wednesday; its week starts Monday the 6th.
        assert_eq!(Bucket::Weekly.key(day(8)), day(6));
        assert_eq!(Bucket::Monthly.key(day(28)), day(1));
        assert_eq!(Bucket::Daily.key(day(8)), day(8));
    }

    #[test]
    fn ratios_sum_to_one_when_total_positive() {
        let records = vec![
            record(0, day(1), 5, 0.6),
            record(1, day(1), 3, 0.0),
            record(2, day(2), 1, -0.6),
            record(3, day(2), 2, -0.4),
        ];
        let stats = sentiment_distribution(&records);
        let ratio_sum = stats.positive_ratio + stats.neutral_ratio + stats.negative_ratio;
        assert!((ratio_sum - 1.0).abs() < 1e-9);
        assert_eq!(stats.positive, 1);
        assert_eq!(stats.neutral, 1);
        assert_eq!(stats.negative, 2);
    }

    #[test]
    fn ratios_are_zero_on_empty_input() {
        let stats = sentiment_distribution(&[]);
        assert_eq!(stats.positive_ratio, 0.0);
        assert_eq!(stats.neutral_ratio, 0.0);
        assert_eq!(stats.negative_ratio, 0.0);
        assert_eq!(stats.average_score, 0.0);
    }

    #[test]
    fn missing_sentiment_degrades_to_zeros() {
        let mut unclassified = record(0, day(1), 5, 0.5);
        unclassified.sentiment = None;
        let stats = sentiment_distribution(&[unclassified]);
        assert_eq!(stats, SentimentStats::default());
    }

    #[test]
    fn correlation_tracks_rating_and_score() {
        let records = vec![
            record(0, day(1), 1, -0.8),
            record(1, day(1), 3, 0.0),
            record(2, day(2), 5, 0.8),
        ];
        let stats = sentiment_distribution(&records);
        assert!((stats.rating_correlation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_is_zero_below_two_rows() {
        let stats = sentiment_distribution(&[record(0, day(1), 5, 0.5)]);
        assert_eq!(stats.rating_correlation, 0.0);
        assert_eq!(stats.score_std, 0.0);
    }

    #[test]
    fn trend_direction_boundaries_are_open() {
        assert_eq!(direction_for_slope(0.01), TrendDirection::Stable);
        assert_eq!(direction_for_slope(-0.01), TrendDirection::Stable);
        assert_eq!(direction_for_slope(0.011), TrendDirection::Up);
        assert_eq!(direction_for_slope(-0.011), TrendDirection::Down);
        assert_eq!(direction_for_slope(0.0), TrendDirection::Stable);
    }

    #[test]
    fn trend_slope_over_daily_means() {
        // Bucket means -0.2, 0.0, 0.2 over indices 0..3: slope 0.2.
        let records = vec![
            record(0, day(1), 2, -0.2),
            record(1, day(2), 3, 0.0),
            record(2, day(3), 4, 0.2),
        ];
        let stats = sentiment_trend(&records, Bucket::Daily);
        assert!((stats.slope - 0.2).abs() < 1e-9);
        assert_eq!(stats.direction, TrendDirection::Up);
        assert_eq!(stats.most_positive, Some((day(3), 0.2)));
        assert_eq!(stats.most_negative, Some((day(1), -0.2)));
    }

    #[test]
    fn trend_empty_buckets_keep_index_positions() {
        // Days 1, 2 and 4: the gap at day 3 leaves x positions 0, 1, 3.
        let records = vec![
            record(0, day(1), 3, 0.0),
            record(1, day(2), 3, 0.1),
            record(2, day(4), 4, 0.3),
        ];
        let stats = sentiment_trend(&records, Bucket::Daily);
        // Least squares over (0,0.0), (1,0.1), (3,0.3): exact slope 0.1.
        assert!((stats.slope - 0.1).abs() < 1e-9);
        assert_eq!(stats.series.len(), 3);
        assert!(!stats.series.contains_key(&day(3)));
    }

    #[test]
    fn trend_below_two_buckets_is_stable() {
        let records = vec![record(0, day(1), 5, 0.9), record(1, day(1), 5, 0.7)];
        let stats = sentiment_trend(&records, Bucket::Daily);
        assert_eq!(stats.slope, 0.0);
        assert_eq!(stats.direction, TrendDirection::Stable);
    }

    fn text_record(id: usize, content: &str) -> ReviewRecord {
        let mut r = record(id, day(1), 4, 0.2);
        r.content = Some(content.to_string());
        r
    }

    #[test]
    fn keyword_tie_break_is_first_encountered() {
        let records = vec![text_record(0, "great game great nice")];
        let stats = keywords(&records, 2);
        assert_eq!(stats.top.len(), 2);
        assert_eq!(stats.top[0], ("great".to_string(), 2));
        // "game" appears before "nice" in the text and wins the tie.
        assert_eq!(stats.top[1], ("game".to_string(), 1));
    }

    #[test]
    fn keywords_drop_stop_words_and_short_tokens() {
        let records = vec![text_record(0, "the ok game is it gg fun")];
        let stats = keywords(&records, 10);
        let words: Vec<&str> = stats.top.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["game", "fun"]);
    }

    #[test]
    fn keywords_lowercase_and_merge_title_content() {
        let mut r = text_record(0, "GREAT update");
        r.title = Some("Great fun".to_string());
        let stats = keywords(&[r], 10);
        assert_eq!(stats.top[0], ("great".to_string(), 2));
    }

    #[test]
    fn keyword_at_title_tail_merges_with_content() {
        // The title/content seam must not glue punctuation onto the
        // title's last token.
        let mut r = text_record(0, "battles are fun");
        r.title = Some("love battles".to_string());
        let stats = keywords(&[r], 10);
        assert_eq!(stats.top[0], ("battles".to_string(), 2));
    }
}
