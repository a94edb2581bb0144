use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::models::ReviewRecord;

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "Rating")]
    rating: Option<String>,
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Version")]
    version: Option<String>,
    #[serde(rename = "Username")]
    username: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Content")]
    content: Option<String>,
}

/// Basic overview of a cleaned record set, exposed by the `stats` CLI
/// command.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub rating_distribution: BTreeMap<u8, u64>,
    pub version_distribution: BTreeMap<String, u64>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Parse a calendar date, tolerating a trailing time-of-day component.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if value.len() >= 10 {
        if let Ok(date) = NaiveDate::parse_from_str(&value[..10], "%Y-%m-%d") {
            return Ok(date);
        }
    }
    Err(AnalysisError::InvalidInput(format!(
        "unparseable date '{value}', expected YYYY-MM-DD"
    )))
}

fn clean_row(row: RawRow) -> Option<(String, u8, NaiveDate, RawRow)> {
    let country = row.country.as_deref()?.trim();
    if country.is_empty() {
        return None;
    }
    let rating: f64 = row.rating.as_deref()?.trim().parse().ok()?;
    if !(1.0..=5.0).contains(&rating) {
        return None;
    }
    let date = parse_date(row.date.as_deref()?).ok()?;
    row.content.as_deref().filter(|c| !c.trim().is_empty())?;
    Some((country.to_string(), rating.round() as u8, date, row))
}

/// Load a tab-separated reviews export and drop rows that are missing
/// required fields, carry an out-of-range rating, or have an invalid
/// date. Surviving rows get sequential ids.
pub fn load_reviews(path: &Path) -> Result<Vec<ReviewRecord>> {
    info!("loading reviews from {}", path.display());
    let file = std::fs::File::open(path)?;
    let records = read_reviews(file)?;
    info!("loaded {} cleaned reviews", records.len());
    Ok(records)
}

pub fn read_reviews<R: Read>(reader: R) -> Result<Vec<ReviewRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);
    csv_reader.headers()?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in csv_reader.deserialize::<RawRow>() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        let Some((country, rating, date, row)) = clean_row(row) else {
            dropped += 1;
            continue;
        };
        records.push(ReviewRecord {
            id: records.len(),
            country,
            rating,
            date,
            version: row.version.unwrap_or_default().trim().to_string(),
            username: row.username.unwrap_or_default().trim().to_string(),
            title: row.title.filter(|t| !t.trim().is_empty()),
            content: row.content,
            sentiment: None,
        });
    }
    if dropped > 0 {
        debug!("dropped {dropped} rows during cleaning");
    }
    Ok(records)
}

/// Records whose date falls inside [start, end], both ends inclusive.
/// An inverted range is a rejected request, never silently reordered.
pub fn filter_by_date(
    records: &[ReviewRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ReviewRecord>> {
    if start > end {
        return Err(AnalysisError::InvalidInput(format!(
            "start date {start} is after end date {end}"
        )));
    }
    let filtered: Vec<ReviewRecord> = records
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .cloned()
        .collect();
    debug!(
        "date filter [{start}..{end}] kept {} of {} records",
        filtered.len(),
        records.len()
    );
    Ok(filtered)
}

pub fn dataset_overview(records: &[ReviewRecord]) -> DatasetOverview {
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
        let sum: f64 = records.iter().map(|r| f64::from(r.rating)).sum();
        ((sum / records.len() as f64) * 100.0).round() / 100.0
    };

    DatasetOverview {
        total_reviews: records.len(),
        average_rating,
        rating_distribution,
        version_distribution,
        min_date: records.iter().map(|r| r.date).min(),
        max_date: records.iter().map(|r| r.date).max(),
    }
}
