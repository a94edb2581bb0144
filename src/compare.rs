use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AnalyzerConfig;
use crate::models::{
    ComparisonResult, Period, PeriodWindow, RatingComparison, ReviewRecord, SentimentComparison,
    SentimentSide, TrendDirection, VersionComparison, VolumeComparison, VolumeSide,
};
use crate::stats;

// Rule thresholds from the synthesis rule tables. Summary rules use the
// first tier; detailed insights also use the finer-grained ones.
const VOLUME_SHIFT: f64 = 0.2;
const VOLUME_SURGE: f64 = 0.5;
const RATING_SHIFT: f64 = 0.5;
const RATING_LEAN: f64 = 0.3;
const SENTIMENT_SHIFT: f64 = 0.2;
const SENTIMENT_LEAN: f64 = 0.15;
const RATIO_SWING: f64 = 0.15;
const STABILITY_SAMPLE: usize = 100;
const HIGH_RATING: f64 = 4.0;
const LOW_RATING: f64 = 3.0;

/// Fallback summary line when no rule fires; the stability insights key
/// off the same constant.
const NO_SIGNIFICANT_DIFFERENCE: &str = "No significant difference between the two periods";

/// Outcome of one comparison request. Below the minimum sample size only
/// the warning variant is returned; this is a defined condition, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ComparisonOutcome {
    Insufficient {
        period1_count: usize,
        period2_count: usize,
        minimum: usize,
    },
    Complete(Box<ComparisonResult>),
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Signed fractional change against a baseline; a zero baseline yields
/// the infinite sentinel rather than a division error.
fn fractional_change(baseline: f64, current: f64) -> f64 {
    if baseline > 0.0 {
        (current - baseline) / baseline
    } else {
        f64::INFINITY
    }
}

fn window(period: &Period) -> PeriodWindow {
    let start = period.records.iter().map(|r| r.date).min();
    let end = period.records.iter().map(|r| r.date).max();
    let days = match (start, end) {
        (Some(start), Some(end)) => (end - start).num_days() + 1,
        _ => 0,
    };
    PeriodWindow {
        name: period.name.clone(),
        start,
        end,
        days,
    }
}

fn average_rating(records: &[ReviewRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| f64::from(r.rating)).sum::<f64>() / records.len() as f64
}

/// Mode of the version column; ties break by first-encountered order in
/// the value counts. None when every record has an empty version.
fn main_version(records: &[ReviewRecord]) -> Option<String> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    for record in records {
        if record.version.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| *v == record.version) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.version.clone(), 1)),
        }
    }
    let mut best: Option<(String, u64)> = None;
    for (version, count) in counts {
        if best.as_ref().map_or(true, |(_, b)| count > *b) {
            best = Some((version, count));
        }
    }
    best.map(|(version, _)| version)
}

/// Diff two classified periods into quantitative deltas plus rule-based
/// summary bullets and detailed insights.
pub fn compare(period1: &Period, period2: &Period, config: &AnalyzerConfig) -> ComparisonOutcome {
    let count1 = period1.records.len();
    let count2 = period2.records.len();
    if count1 < config.min_sample_size || count2 < config.min_sample_size {
        warn!(
            "insufficient data for comparison: {count1} and {count2} records (minimum {})",
            config.min_sample_size
        );
        return ComparisonOutcome::Insufficient {
            period1_count: count1,
            period2_count: count2,
            minimum: config.min_sample_size,
        };
    }

    let window1 = window(period1);
    let window2 = window(period2);

    // Volume.
    let volume_change = fractional_change(count1 as f64, count2 as f64);
    let daily_avg1 = count1 as f64 / window1.days.max(1) as f64;
    let daily_avg2 = count2 as f64 / window2.days.max(1) as f64;
    let daily_avg_change = fractional_change(daily_avg1, daily_avg2);

    // Rating.
    let avg_rating1 = average_rating(&period1.records);
    let avg_rating2 = average_rating(&period2.records);
    let rating_change = avg_rating2 - avg_rating1;

    // Sentiment. If either period lacks attached sentiment, every
    // dependent value degrades to zero.
    let has_sentiment = period1.records.iter().any(|r| r.sentiment.is_some())
        && period2.records.iter().any(|r| r.sentiment.is_some());
    let (dist1, dist2) = if has_sentiment {
        (
            stats::sentiment_distribution(&period1.records),
            stats::sentiment_distribution(&period2.records),
        )
    } else {
        warn!("sentiment missing in at least one period, sentiment comparison degrades to zeros");
        Default::default()
    };
    let positive_change = dist2.positive_ratio - dist1.positive_ratio;
    let negative_change = dist2.negative_ratio - dist1.negative_ratio;
    let neutral_change = dist2.neutral_ratio - dist1.neutral_ratio;
    let sentiment_change = dist2.average_score - dist1.average_score;

    // Version.
    let version1 = main_version(&period1.records);
    let version2 = main_version(&period2.records);
    let version_changed = match (&version1, &version2) {
        (Some(v1), Some(v2)) => v1 != v2,
        _ => false,
    };

    let summary = build_summary(
        volume_change,
        rating_change,
        sentiment_change,
        version_changed,
        version1.as_deref(),
        version2.as_deref(),
    );
    let detailed_insights = build_detailed_insights(
        period1,
        period2,
        config,
        &summary,
        InsightInputs {
            volume_change,
            rating_change,
            sentiment_change,
            positive_change,
            negative_change,
            neutral_change,
            version_changed,
            version1: version1.as_deref(),
            version2: version2.as_deref(),
            avg_rating1,
            avg_rating2,
            count1,
            count2,
        },
    );

    ComparisonOutcome::Complete(Box::new(ComparisonResult {
        period1: window1,
        period2: window2,
        volume: VolumeComparison {
            period1: VolumeSide {
                total_reviews: count1,
                daily_average: round2(daily_avg1),
            },
            period2: VolumeSide {
                total_reviews: count2,
                daily_average: round2(daily_avg2),
            },
            total_reviews_percent: round2(volume_change * 100.0),
            daily_average_percent: round2(daily_avg_change * 100.0),
        },
        rating: RatingComparison {
            period1_average: round2(avg_rating1),
            period2_average: round2(avg_rating2),
            delta: round2(rating_change),
        },
        sentiment: SentimentComparison {
            period1: SentimentSide {
                positive_ratio: round2(dist1.positive_ratio * 100.0),
                negative_ratio: round2(dist1.negative_ratio * 100.0),
                neutral_ratio: round2(dist1.neutral_ratio * 100.0),
                average_score: round4(dist1.average_score),
            },
            period2: SentimentSide {
                positive_ratio: round2(dist2.positive_ratio * 100.0),
                negative_ratio: round2(dist2.negative_ratio * 100.0),
                neutral_ratio: round2(dist2.neutral_ratio * 100.0),
                average_score: round4(dist2.average_score),
            },
            positive_ratio_points: round2(positive_change * 100.0),
            negative_ratio_points: round2(negative_change * 100.0),
            neutral_ratio_points: round2(neutral_change * 100.0),
            score_delta: round4(sentiment_change),
        },
        version: VersionComparison {
            period1_main: version1,
            period2_main: version2,
            changed: version_changed,
        },
        summary,
        detailed_insights,
    }))
}

/// Fixed summary rule table: every rule is evaluated independently and
/// all matching rules fire; the fallback line fires only when none did.
fn build_summary(
    volume_change: f64,
    rating_change: f64,
    sentiment_change: f64,
    version_changed: bool,
    version1: Option<&str>,
    version2: Option<&str>,
) -> Vec<String> {
    let mut summary = Vec::new();

    if volume_change > VOLUME_SHIFT {
        summary.push(format!(
            "Review volume increased substantially (+{:.1}%)",
            volume_change * 100.0
        ));
    } else if volume_change < -VOLUME_SHIFT {
        summary.push(format!(
            "Review volume decreased substantially ({:.1}%)",
            volume_change * 100.0
        ));
    }

    if rating_change > RATING_SHIFT {
        summary.push(format!(
            "Average rating improved notably (+{:.1})",
            rating_change
        ));
    } else if rating_change < -RATING_SHIFT {
        summary.push(format!(
            "Average rating declined notably ({:.1})",
            rating_change
        ));
    }

    if sentiment_change > SENTIMENT_SHIFT {
        summary.push("Player sentiment shifted clearly positive".to_string());
    } else if sentiment_change < -SENTIMENT_SHIFT {
        summary.push("Player sentiment shifted clearly negative".to_string());
    }

    if version_changed {
        if let (Some(v1), Some(v2)) = (version1, version2) {
            summary.push(format!("App version updated from {v1} to {v2}"));
        }
    }

    if summary.is_empty() {
        summary.push(NO_SIGNIFICANT_DIFFERENCE.to_string());
    }
    summary
}

struct InsightInputs<'a> {
    volume_change: f64,
    rating_change: f64,
    sentiment_change: f64,
    positive_change: f64,
    negative_change: f64,
    neutral_change: f64,
    version_changed: bool,
    version1: Option<&'a str>,
    version2: Option<&'a str>,
    avg_rating1: f64,
    avg_rating2: f64,
    count1: usize,
    count2: usize,
}

/// Ordered multi-factor insight rules. Guaranteed non-empty: a generic
/// keep-monitoring line closes the gap when nothing else fires.
fn build_detailed_insights(
    period1: &Period,
    period2: &Period,
    config: &AnalyzerConfig,
    summary: &[String],
    inputs: InsightInputs<'_>,
) -> Vec<String> {
    let mut insights = Vec::new();
    let pct = |change: f64| change.abs() * 100.0;

    // Volume movement, two tiers each way.
    if inputs.volume_change > VOLUME_SHIFT {
        if inputs.volume_change > VOLUME_SURGE {
            insights.push(format!(
                "Review volume surged by {:.1}%, suggesting a sharp rise in player attention, \
                 likely driven by a new event, feature release, or marketing push.",
                pct(inputs.volume_change)
            ));
        } else {
            insights.push(format!(
                "Review volume increased noticeably ({:.1}%), reflecting higher player \
                 engagement and growing attention on the game.",
                pct(inputs.volume_change)
            ));
        }
    } else if inputs.volume_change < -VOLUME_SHIFT {
        if inputs.volume_change < -VOLUME_SURGE {
            insights.push(format!(
                "Review volume dropped sharply ({:.1}%), which may signal fading interest, \
                 heavy player churn, or a lack of updates worth talking about.",
                pct(inputs.volume_change)
            ));
        } else {
            insights.push(format!(
                "Review volume declined somewhat ({:.1}%); player activity may be slipping \
                 and engagement is worth watching.",
                pct(inputs.volume_change)
            ));
        }
    }

    // Rating and sentiment, agreement or divergence.
    if inputs.rating_change > RATING_LEAN && inputs.sentiment_change > SENTIMENT_LEAN {
        insights.push(
            "Rating and sentiment improved together, a consistent signal that player \
             satisfaction genuinely increased."
                .to_string(),
        );
    } else if inputs.rating_change < -RATING_LEAN && inputs.sentiment_change < -SENTIMENT_LEAN {
        insights.push(
            "Rating and sentiment declined together, confirming a real drop in player \
             satisfaction that deserves a closer look at the root cause."
                .to_string(),
        );
    } else if inputs.rating_change > RATING_LEAN && inputs.sentiment_change < -SENTIMENT_LEAN {
        insights.push(
            "Ratings rose while review sentiment fell; satisfied players may be quicker to \
             leave a star rating, but the review text still carries unresolved complaints."
                .to_string(),
        );
    } else if inputs.rating_change < -RATING_LEAN && inputs.sentiment_change > SENTIMENT_LEAN {
        insights.push(
            "Ratings fell while review sentiment improved; players may be holding the game \
             to higher expectations even as their comments grow more positive."
                .to_string(),
        );
    }

    // Neutral-ratio swings.
    if inputs.neutral_change.abs() > RATIO_SWING {
        if inputs.neutral_change > 0.0 {
            insights.push(format!(
                "The share of neutral reviews grew by {:.1} points; more players are on the \
                 fence, liking some parts of the game while frustrated by others.",
                pct(inputs.neutral_change)
            ));
        } else {
            insights.push(format!(
                "The share of neutral reviews shrank by {:.1} points; opinions are becoming \
                 more decisive and polarized.",
                pct(inputs.neutral_change)
            ));
        }
    }

    // Positive/negative ratio inversions.
    if inputs.positive_change > RATIO_SWING && inputs.negative_change < -RATIO_SWING {
        insights.push(
            "Positive reviews grew while negative reviews shrank, the ideal shift: the \
             overall experience improved across the player base."
                .to_string(),
        );
    } else if inputs.positive_change < -RATIO_SWING && inputs.negative_change > RATIO_SWING {
        insights.push(
            "Positive reviews shrank while negative reviews grew, a warning sign of \
             problems on several fronts that calls for a broad review."
                .to_string(),
        );
    }

    // Version change framed by the rating outcome.
    if inputs.version_changed {
        if let (Some(v1), Some(v2)) = (inputs.version1, inputs.version2) {
            if inputs.rating_change > RATING_LEAN {
                insights.push(format!(
                    "The update from {v1} to {v2} landed well, lifting the average rating by \
                     {:.2}; it likely fixed key issues or added welcome features.",
                    inputs.rating_change
                ));
            } else if inputs.rating_change < -RATING_LEAN {
                insights.push(format!(
                    "The update from {v1} to {v2} was poorly received, dropping the average \
                     rating by {:.2}; it may have introduced problems or removed features \
                     players liked.",
                    inputs.rating_change.abs()
                ));
            } else {
                insights.push(format!(
                    "Version moved from {v1} to {v2} with little change in player ratings, \
                     likely a minor update or one whose improvements went unnoticed."
                ));
            }
        }
    }

    // Volume against rating.
    if inputs.volume_change > VOLUME_SHIFT && inputs.rating_change > RATING_LEAN {
        insights.push(
            "Volume and rating rose together; the game appears to be in a positive loop of \
             growing, satisfied players."
                .to_string(),
        );
    } else if inputs.volume_change < -VOLUME_SHIFT && inputs.rating_change < -RATING_LEAN {
        insights.push(
            "Volume and rating fell together; core players may be drifting away, which makes \
             this the more serious pattern."
                .to_string(),
        );
    } else if inputs.volume_change > VOLUME_SHIFT && inputs.rating_change < -RATING_LEAN {
        insights.push(
            "More reviews but lower ratings; greater exposure may be bringing in players with \
             a worse first experience, or a controversial update is driving discussion."
                .to_string(),
        );
    }

    // Trend-direction transition table.
    let trend1 = stats::sentiment_trend(&period1.records, config.bucket).direction;
    let trend2 = stats::sentiment_trend(&period2.records, config.bucket).direction;
    match (trend1, trend2) {
        (TrendDirection::Down, TrendDirection::Up) => insights.push(
            "The sentiment trend flipped from falling to rising; player mood is recovering \
             and earlier problems may have been resolved."
                .to_string(),
        ),
        (TrendDirection::Up, TrendDirection::Down) => insights.push(
            "The sentiment trend flipped from rising to falling; something recent is not \
             sitting well with players and deserves prompt attention."
                .to_string(),
        ),
        (TrendDirection::Stable, TrendDirection::Up) => insights.push(
            "The sentiment trend moved from stable to rising; the experience seems to be \
             improving and player satisfaction is climbing."
                .to_string(),
        ),
        (TrendDirection::Stable, TrendDirection::Down) => insights.push(
            "The sentiment trend moved from stable to falling; the experience may be \
             getting worse and the cause is worth finding early."
                .to_string(),
        ),
        (TrendDirection::Up, TrendDirection::Up) => insights.push(
            "Sentiment kept rising across both periods; whatever is working should be \
             kept up."
                .to_string(),
        ),
        (TrendDirection::Down, TrendDirection::Down) => insights.push(
            "Sentiment kept falling across both periods; the underlying issues look \
             unresolved and need deeper investigation."
                .to_string(),
        ),
        _ => {}
    }

    // Stability notes when no summary rule fired and both samples are
    // large enough to trust the flatness.
    let summary_is_fallback = summary.len() == 1 && summary[0] == NO_SIGNIFICANT_DIFFERENCE;
    if summary_is_fallback
        && inputs.count1 >= STABILITY_SAMPLE
        && inputs.count2 >= STABILITY_SAMPLE
    {
        insights.push(
            "Metrics are highly stable between the two periods; that can be a good sign \
             (consistently satisfied players) or a bad one (a static experience going stale)."
                .to_string(),
        );
        if inputs.avg_rating1 >= HIGH_RATING && inputs.avg_rating2 >= HIGH_RATING {
            insights.push(
                "Ratings held at a high level (4.0 or above) in both periods; overall \
                 satisfaction remains strong and the core experience is in good shape."
                    .to_string(),
            );
        } else if inputs.avg_rating1 <= LOW_RATING && inputs.avg_rating2 <= LOW_RATING {
            insights.push(
                "Ratings stayed low (3.0 or below) in both periods, pointing to \
                 long-standing unresolved issues with the game design or service quality."
                    .to_string(),
            );
        }
    }

    if insights.is_empty() {
        insights.push(
            "No clear movement in the current data; keep monitoring and collect more \
             samples to surface any underlying trend."
                .to_string(),
        );
    }
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SentimentLabel, SentimentResult};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn record(id: usize, date: NaiveDate, rating: u8, score: f64, version: &str) -> ReviewRecord {
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
            version: version.to_string(),
            username: "player".to_string(),
            title: None,
            content: Some("fine".to_string()),
            sentiment: Some(SentimentResult { label, score }),
        }
    }

    fn period(name: &str, start: u32, end: u32, records: Vec<ReviewRecord>) -> Period {
        Period::new(name, day(start), day(end), records).unwrap()
    }

    /// Ratings [5,4,5,3,4] doubled to reach the sample threshold, spread
    /// over the given day range.
    fn padded_period(name: &str, start: u32, end: u32, ratings: [u8; 5], version: &str) -> Period {
        let mut records = Vec::new();
        for (i, rating) in ratings.iter().cycle().take(10).enumerate() {
            let date = day(start + (i as u32 % (end - start + 1)));
            let score = (f64::from(*rating) - 3.0) / 2.0 * 0.4;
            records.push(record(i, date, *rating, score, version));
        }
        period(name, start, end, records)
    }

    #[test]
    fn below_minimum_sample_returns_warning() {
        let config = AnalyzerConfig::default();
        let p1 = period(
            "Period 1",
            1,
            5,
            (0..5).map(|i| record(i, day(1), 4, 0.2, "1.0.0")).collect(),
        );
        let p2 = period(
            "Period 2",
            6,
            10,
            (0..5).map(|i| record(i, day(6), 4, 0.2, "1.0.0")).collect(),
        );
        let outcome = compare(&p1, &p2, &config);
        assert_eq!(
            outcome,
            ComparisonOutcome::Insufficient {
                period1_count: 5,
                period2_count: 5,
                minimum: 10,
            }
        );
    }

    #[test]
    fn rating_delta_drives_summary_rule() {
        let config = AnalyzerConfig::default();
        let p1 = padded_period("Period 1", 1, 5, [5, 4, 5, 3, 4], "1.1.0");
        let p2 = padded_period("Period 2", 6, 10, [2, 4, 5, 3, 4], "1.1.0");

        let ComparisonOutcome::Complete(result) = compare(&p1, &p2, &config) else {
            panic!("expected complete comparison");
        };
        // Means 4.2 and 3.6: delta -0.6, magnitude above 0.5.
        assert_eq!(result.rating.period1_average, 4.2);
        assert_eq!(result.rating.period2_average, 3.6);
        assert_eq!(result.rating.delta, -0.6);
        assert!(result
            .summary
            .iter()
            .any(|line| line.contains("rating declined notably")));
    }

    #[test]
    fn small_rating_delta_does_not_fire_rule() {
        let config = AnalyzerConfig::default();
        let p1 = padded_period("Period 1", 1, 5, [5, 4, 5, 3, 4], "1.1.0");
        let p2 = padded_period("Period 2", 6, 10, [4, 4, 5, 3, 4], "1.1.0");

        let ComparisonOutcome::Complete(result) = compare(&p1, &p2, &config) else {
            panic!("expected complete comparison");
        };
        // Delta -0.2: no rating bullet may fire.
        assert_eq!(result.rating.delta, -0.2);
        assert!(!result.summary.iter().any(|line| line.contains("rating")));
    }

    #[test]
    fn version_mode_change_names_both_versions() {
        let config = AnalyzerConfig::default();
        let p1 = padded_period("Period 1", 1, 5, [4, 4, 4, 4, 4], "1.1.0");
        let p2 = padded_period("Period 2", 6, 10, [4, 4, 4, 4, 4], "1.1.1");

        let ComparisonOutcome::Complete(result) = compare(&p1, &p2, &config) else {
            panic!("expected complete comparison");
        };
        assert!(result.version.changed);
        assert_eq!(result.version.period1_main.as_deref(), Some("1.1.0"));
        assert_eq!(result.version.period2_main.as_deref(), Some("1.1.1"));
        assert!(result
            .summary
            .iter()
            .any(|line| line == "App version updated from 1.1.0 to 1.1.1"));
    }

    #[test]
    fn version_mode_tie_breaks_by_first_encountered() {
        let records = vec![
            record(0, day(1), 4, 0.2, "2.0.0"),
            record(1, day(1), 4, 0.2, "1.0.0"),
            record(2, day(2), 4, 0.2, "2.0.0"),
            record(3, day(2), 4, 0.2, "1.0.0"),
        ];
        assert_eq!(main_version(&records).as_deref(), Some("2.0.0"));
    }

    #[test]
    fn missing_version_degrades_without_flag() {
        let records: Vec<ReviewRecord> =
            (0..10).map(|i| record(i, day(1), 4, 0.2, "")).collect();
        assert_eq!(main_version(&records), None);

        let config = AnalyzerConfig::default();
        let p1 = period("Period 1", 1, 5, records.clone());
        let p2 = period("Period 2", 6, 10, records);
        let ComparisonOutcome::Complete(result) = compare(&p1, &p2, &config) else {
            panic!("expected complete comparison");
        };
        assert!(!result.version.changed);
        assert_eq!(result.version.period1_main, None);
    }

    #[test]
    fn compare_is_idempotent() {
        let config = AnalyzerConfig::default();
        let p1 = padded_period("Period 1", 1, 5, [5, 4, 5, 3, 4], "1.1.0");
        let p2 = padded_period("Period 2", 6, 10, [2, 4, 5, 3, 4], "1.1.1");
        let first = compare(&p1, &p2, &config);
        let second = compare(&p1, &p2, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_baseline_yields_infinite_sentinel() {
        assert_eq!(fractional_change(0.0, 5.0), f64::INFINITY);
        assert!((fractional_change(10.0, 15.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn detailed_insights_never_empty() {
        let config = AnalyzerConfig::default();
        let p1 = padded_period("Period 1", 1, 5, [4, 4, 4, 4, 4], "1.1.0");
        let p2 = padded_period("Period 2", 6, 10, [4, 4, 4, 4, 4], "1.1.0");
        let ComparisonOutcome::Complete(result) = compare(&p1, &p2, &config) else {
            panic!("expected complete comparison");
        };
        assert!(!result.detailed_insights.is_empty());
    }

    #[test]
    fn stability_note_requires_large_samples() {
        let config = AnalyzerConfig::default();
        let make = |name: &str, start: u32, end: u32, n: usize| {
            let records = (0..n)
                .map(|i| {
                    record(
                        i,
                        day(start + (i as u32 % (end - start + 1))),
                        5,
                        0.0,
                        "1.0.0",
                    )
                })
                .collect();
            period(name, start, end, records)
        };

        let p1 = make("Period 1", 1, 5, 120);
        let p2 = make("Period 2", 6, 10, 120);
        let ComparisonOutcome::Complete(result) = compare(&p1, &p2, &config) else {
            panic!("expected complete comparison");
        };
        assert_eq!(
            result.summary,
            vec!["No significant difference between the two periods".to_string()]
        );
        assert!(result
            .detailed_insights
            .iter()
            .any(|line| line.contains("highly stable")));
        assert!(result
            .detailed_insights
            .iter()
            .any(|line| line.contains("high level")));

        let p1_small = make("Period 1", 1, 5, 20);
        let p2_small = make("Period 2", 6, 10, 20);
        let ComparisonOutcome::Complete(result) = compare(&p1_small, &p2_small, &config) else {
            panic!("expected complete comparison");
        };
        assert!(!result
            .detailed_insights
            .iter()
            .any(|line| line.contains("highly stable")));
        assert!(result
            .detailed_insights
            .iter()
            .any(|line| line.contains("keep monitoring")));
    }

    #[test]
    fn volume_surge_with_rating_drop_flags_exposure() {
        let config = AnalyzerConfig::default();
        let p1: Vec<ReviewRecord> = (0..20)
            .map(|i| record(i, day(1 + i as u32 % 5), 5, 0.3, "1.0.0"))
            .collect();
        let p2: Vec<ReviewRecord> = (0..40)
            .map(|i| record(i, day(6 + i as u32 % 5), 3, -0.3, "1.0.0"))
            .collect();
        let p1 = period("Period 1", 1, 5, p1);
        let p2 = period("Period 2", 6, 10, p2);

        let ComparisonOutcome::Complete(result) = compare(&p1, &p2, &config) else {
            panic!("expected complete comparison");
        };
        assert!(result
            .summary
            .iter()
            .any(|line| line.contains("volume increased substantially")));
        assert!(result
            .detailed_insights
            .iter()
            .any(|line| line.contains("More reviews but lower ratings")));
    }
}
