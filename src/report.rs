use std::fmt::Write;
use std::str::FromStr;

use crate::compare::ComparisonOutcome;
use crate::error::Result;
use crate::models::ComparisonResult;

/// Output format for comparison reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown format '{other}', expected text or json")),
        }
    }
}

fn fmt_pct(value: f64) -> String {
    if value.is_infinite() {
        "n/a (empty baseline)".to_string()
    } else {
        format!("{value:+.2}%")
    }
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Markdown report over a full comparison result.
pub fn render_text(result: &ComparisonResult) -> String {
    let mut output = String::new();
    let p1 = &result.period1;
    let p2 = &result.period2;

    let _ = writeln!(output, "# Review Comparison: {} vs {}", p1.name, p2.name);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "- {}: {} to {} ({} days)",
        p1.name,
        fmt_date(p1.start),
        fmt_date(p1.end),
        p1.days
    );
    let _ = writeln!(
        output,
        "- {}: {} to {} ({} days)",
        p2.name,
        fmt_date(p2.start),
        fmt_date(p2.end),
        p2.days
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Review Volume");
    let _ = writeln!(
        output,
        "- {}: {} reviews ({:.2}/day)",
        p1.name, result.volume.period1.total_reviews, result.volume.period1.daily_average
    );
    let _ = writeln!(
        output,
        "- {}: {} reviews ({:.2}/day)",
        p2.name, result.volume.period2.total_reviews, result.volume.period2.daily_average
    );
    let _ = writeln!(
        output,
        "- Change: {} total, {} daily average",
        fmt_pct(result.volume.total_reviews_percent),
        fmt_pct(result.volume.daily_average_percent)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Rating");
    let _ = writeln!(
        output,
        "- {}: {:.2} average",
        p1.name, result.rating.period1_average
    );
    let _ = writeln!(
        output,
        "- {}: {:.2} average",
        p2.name, result.rating.period2_average
    );
    let _ = writeln!(output, "- Change: {:+.2}", result.rating.delta);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment");
    for (window, side) in [(p1, &result.sentiment.period1), (p2, &result.sentiment.period2)] {
        let _ = writeln!(
            output,
            "- {}: {:.2}% positive, {:.2}% negative, {:.2}% neutral (mean score {:.4})",
            window.name,
            side.positive_ratio,
            side.negative_ratio,
            side.neutral_ratio,
            side.average_score
        );
    }
    let _ = writeln!(
        output,
        "- Change: {:+.2} positive points, {:+.2} negative points, {:+.2} neutral points, \
         {:+.4} mean score",
        result.sentiment.positive_ratio_points,
        result.sentiment.negative_ratio_points,
        result.sentiment.neutral_ratio_points,
        result.sentiment.score_delta
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Version");
    let _ = writeln!(
        output,
        "- {}: {}",
        p1.name,
        result.version.period1_main.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        output,
        "- {}: {}",
        p2.name,
        result.version.period2_main.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        output,
        "- Version changed: {}",
        if result.version.changed { "yes" } else { "no" }
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    for line in &result.summary {
        let _ = writeln!(output, "- {line}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Detailed Insights");
    for insight in &result.detailed_insights {
        let _ = writeln!(output, "- {insight}");
    }

    output
}

/// JSON rendering of any comparison outcome, warning results included.
pub fn render_json(outcome: &ComparisonOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{self, ComparisonOutcome};
    use crate::config::AnalyzerConfig;
    use crate::models::{Period, ReviewRecord, SentimentLabel, SentimentResult};
    use chrono::NaiveDate;

    fn sample_outcome() -> ComparisonOutcome {
        let day = |d: u32| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        let record = |id: usize, date: NaiveDate, rating: u8, version: &str| ReviewRecord {
            id,
            country: "US".to_string(),
            rating,
            date,
            version: version.to_string(),
            username: "player".to_string(),
            title: None,
            content: Some("fine".to_string()),
            sentiment: Some(SentimentResult {
                label: SentimentLabel::Neutral,
                score: 0.0,
            }),
        };
        let p1 = Period::new(
            "Before",
            day(1),
            day(5),
            (0..10).map(|i| record(i, day(1 + i as u32 % 5), 5, "1.1.0")).collect(),
        )
        .unwrap();
        let p2 = Period::new(
            "After",
            day(6),
            day(10),
            (0..10).map(|i| record(i, day(6 + i as u32 % 5), 3, "1.1.1")).collect(),
        )
        .unwrap();
        compare::compare(&p1, &p2, &AnalyzerConfig::default())
    }

    #[test]
    fn text_report_contains_all_sections() {
        let ComparisonOutcome::Complete(result) = sample_outcome() else {
            panic!("expected complete comparison");
        };
        let text = render_text(&result);
        for section in [
            "## Review Volume",
            "## Rating",
            "## Sentiment",
            "## Version",
            "## Summary",
            "## Detailed Insights",
        ] {
            assert!(text.contains(section), "missing section {section}");
        }
        assert!(text.contains("App version updated from 1.1.0 to 1.1.1"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
        assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert!("jsom".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn json_report_round_trips() {
        let outcome = sample_outcome();
        let json = render_json(&outcome).unwrap();
        let parsed: ComparisonOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }
}
