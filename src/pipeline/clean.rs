//! Cleaning and enrichment of raw lead data
//!
//! Parses lead timestamps, derives the reporting month, the outcome flags and
//! the contactability buckets. Nothing is filtered: every loaded row survives,
//! including rows whose derived fields are null.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;

use super::buckets::{coerce_score, BucketThresholds};
use super::classify::LeadClassifier;
use super::error::InputError;
use super::loader::{format_float, require_columns};

// Source columns
pub const LEAD_CREATED: &str = "LeadCreated";
pub const CALL_STATUS: &str = "CallStatus";
pub const WIDGET_NAME: &str = "WidgetName";
pub const PARTNER: &str = "Partner";
pub const DEBT_LEVEL: &str = "DebtLevel";
pub const PHONE_SCORE: &str = "PhoneScore";
pub const ADDRESS_SCORE: &str = "AddressScore";
pub const STATE: &str = "State";

// Derived columns
pub const MONTH: &str = "Month";
pub const GOOD_LEAD_FLAG: &str = "GoodLeadFlag";
pub const BAD_LEAD_FLAG: &str = "BadLeadFlag";
pub const CLOSED_FLAG: &str = "ClosedFlag";
pub const PHONE_BUCKET: &str = "PhoneBucket";
pub const ADDRESS_BUCKET: &str = "AddressBucket";

/// Columns the input must provide
pub const REQUIRED_COLUMNS: [&str; 8] = [
    LEAD_CREATED,
    CALL_STATUS,
    WIDGET_NAME,
    PARTNER,
    DEBT_LEVEL,
    PHONE_SCORE,
    ADDRESS_SCORE,
    STATE,
];

/// Date-time layouts tried in order after RFC 3339
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only layouts
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y"];

/// Counts of values that were recovered during cleaning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub rows: usize,
    pub unparseable_dates: usize,
    pub coerced_phone_scores: usize,
    pub coerced_address_scores: usize,
    pub unbucketed_phone_scores: usize,
    pub unbucketed_address_scores: usize,
}

/// Parse a lead timestamp, returning None when no known layout matches
pub fn parse_lead_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Reporting month (`YYYY-MM`) of a raw timestamp
pub fn month_of(raw: Option<&str>) -> Option<String> {
    raw.and_then(parse_lead_timestamp)
        .map(|dt| dt.format("%Y-%m").to_string())
}

/// Enrich a raw lead dataset with month, outcome flags and score buckets.
///
/// Fails when a required column is missing or when the dataset has no rows.
pub fn clean_leads(
    df: &DataFrame,
    classifier: &LeadClassifier,
    thresholds: &BucketThresholds,
) -> Result<(DataFrame, CleaningStats)> {
    require_columns(df, &REQUIRED_COLUMNS)?;

    if df.height() == 0 {
        return Err(InputError::EmptyDataset.into());
    }

    let mut stats = CleaningStats {
        rows: df.height(),
        ..Default::default()
    };

    // Month
    let created = text_values(df, LEAD_CREATED)?;
    let months: Vec<Option<String>> = created.iter().map(|v| month_of(v.as_deref())).collect();
    stats.unparseable_dates = months.iter().filter(|m| m.is_none()).count();

    // Outcome flags
    let statuses = text_values(df, CALL_STATUS)?;
    let mut good = Vec::with_capacity(statuses.len());
    let mut bad = Vec::with_capacity(statuses.len());
    let mut closed = Vec::with_capacity(statuses.len());
    for status in &statuses {
        let flags = classifier.classify(status.as_deref());
        good.push(flags.good as i32);
        bad.push(flags.bad as i32);
        closed.push(flags.closed as i32);
    }

    // Scores and buckets
    let (phone_scores, phone_buckets, coerced, unbucketed) =
        score_columns(&text_values(df, PHONE_SCORE)?, thresholds);
    stats.coerced_phone_scores = coerced;
    stats.unbucketed_phone_scores = unbucketed;

    let (address_scores, address_buckets, coerced, unbucketed) =
        score_columns(&text_values(df, ADDRESS_SCORE)?, thresholds);
    stats.coerced_address_scores = coerced;
    stats.unbucketed_address_scores = unbucketed;

    let mut enriched = df.clone();
    enriched
        .with_column(Column::new(PHONE_SCORE.into(), phone_scores))?
        .with_column(Column::new(ADDRESS_SCORE.into(), address_scores))?
        .with_column(Column::new(MONTH.into(), months))?
        .with_column(Column::new(GOOD_LEAD_FLAG.into(), good))?
        .with_column(Column::new(BAD_LEAD_FLAG.into(), bad))?
        .with_column(Column::new(CLOSED_FLAG.into(), closed))?
        .with_column(Column::new(PHONE_BUCKET.into(), phone_buckets))?
        .with_column(Column::new(ADDRESS_BUCKET.into(), address_buckets))?;

    tracing::debug!(?stats, "cleaned lead dataset");

    Ok((enriched, stats))
}

/// Coerce raw scores and bucket them.
///
/// Returns (scores, buckets, coerced_count, unbucketed_count).
fn score_columns(
    raw: &[Option<String>],
    thresholds: &BucketThresholds,
) -> (Vec<f64>, Vec<Option<&'static str>>, usize, usize) {
    let mut scores = Vec::with_capacity(raw.len());
    let mut buckets = Vec::with_capacity(raw.len());
    let mut coerced = 0;
    let mut unbucketed = 0;

    for value in raw {
        let (score, substituted) = coerce_score(value.as_deref());
        if substituted {
            coerced += 1;
        }
        let bucket = thresholds.bucket(score);
        if bucket.is_none() {
            unbucketed += 1;
        }
        scores.push(score);
        buckets.push(bucket.map(|b| b.as_str()));
    }

    (scores, buckets, coerced, unbucketed)
}

/// Read a column as optional text regardless of its stored type
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?;

    let values = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Float32 | DataType::Float64 => {
            // Keep integral floats free of a trailing ".0"
            let cast = column.cast(&DataType::Float64)?;
            cast.f64()?.into_iter().map(|v| v.map(format_float)).collect()
        }
        _ => {
            let cast = column
                .cast(&DataType::String)
                .with_context(|| format!("Column '{}' cannot be read as text", name))?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}
