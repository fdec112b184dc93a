//! Segment aggregations over the enriched lead dataset
//!
//! Seven fixed group-by queries, each producing a count and the mean of one or
//! more outcome flags per group. Group order is first appearance in the input
//! and every sort is stable, so ties always come out in the same order.

use anyhow::{Context, Result};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::buckets::ScoreBucket;
use super::clean::{
    ADDRESS_BUCKET, BAD_LEAD_FLAG, CALL_STATUS, CLOSED_FLAG, DEBT_LEVEL, GOOD_LEAD_FLAG, MONTH,
    PARTNER, PHONE_BUCKET, WIDGET_NAME,
};

/// Partners need strictly more leads than this to be reported
pub const DEFAULT_PARTNER_MIN_LEADS: u32 = 10;

/// Widget/partner pairs need strictly more leads than this to be reported
pub const DEFAULT_WIDGET_PARTNER_MIN_LEADS: u32 = 8;

// Metric columns
pub const TOTAL_LEADS: &str = "total_leads";
pub const LEADS: &str = "leads";
pub const GOOD_RATE: &str = "good_rate";
pub const BAD_RATE: &str = "bad_rate";
pub const CLOSED_RATE: &str = "closed_rate";

/// Minimum-volume filters applied before sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationThresholds {
    pub partner_min_leads: u32,
    pub widget_partner_min_leads: u32,
}

impl Default for AggregationThresholds {
    fn default() -> Self {
        Self {
            partner_min_leads: DEFAULT_PARTNER_MIN_LEADS,
            widget_partner_min_leads: DEFAULT_WIDGET_PARTNER_MIN_LEADS,
        }
    }
}

/// The fixed set of segment analyses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Monthly,
    Widget,
    Partner,
    Debt,
    Matrix,
    Funnel,
    WidgetPartner,
}

/// How a segment table is ordered
enum SegmentOrder {
    Ascending(&'static str),
    Descending(&'static str),
    BucketPair,
}

impl Segment {
    /// All segments in output order
    pub const ALL: [Segment; 7] = [
        Segment::Monthly,
        Segment::Widget,
        Segment::Partner,
        Segment::Debt,
        Segment::Matrix,
        Segment::Funnel,
        Segment::WidgetPartner,
    ];

    /// Table name used for output files
    pub fn name(&self) -> &'static str {
        match self {
            Segment::Monthly => "monthly",
            Segment::Widget => "widget",
            Segment::Partner => "partner",
            Segment::Debt => "debt",
            Segment::Matrix => "matrix",
            Segment::Funnel => "funnel",
            Segment::WidgetPartner => "widget_partner",
        }
    }

    /// Grouping columns
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Segment::Monthly => &[MONTH],
            Segment::Widget => &[WIDGET_NAME],
            Segment::Partner => &[PARTNER],
            Segment::Debt => &[DEBT_LEVEL],
            Segment::Matrix => &[PHONE_BUCKET, ADDRESS_BUCKET],
            Segment::Funnel => &[CALL_STATUS],
            Segment::WidgetPartner => &[WIDGET_NAME, PARTNER],
        }
    }

    fn count_column(&self) -> &'static str {
        match self {
            Segment::Monthly => TOTAL_LEADS,
            _ => LEADS,
        }
    }

    /// (flag column, rate column) pairs in output order
    fn rates(&self) -> &'static [(&'static str, &'static str)] {
        const GOOD: (&str, &str) = (GOOD_LEAD_FLAG, GOOD_RATE);
        const BAD: (&str, &str) = (BAD_LEAD_FLAG, BAD_RATE);
        const CLOSED: (&str, &str) = (CLOSED_FLAG, CLOSED_RATE);

        match self {
            Segment::Monthly | Segment::Partner => &[GOOD, BAD, CLOSED],
            Segment::Widget => &[GOOD, CLOSED, BAD],
            Segment::Debt | Segment::Matrix | Segment::Funnel => &[GOOD, CLOSED],
            Segment::WidgetPartner => &[GOOD],
        }
    }

    fn min_leads(&self, thresholds: &AggregationThresholds) -> Option<u32> {
        match self {
            Segment::Partner => Some(thresholds.partner_min_leads),
            Segment::WidgetPartner => Some(thresholds.widget_partner_min_leads),
            _ => None,
        }
    }

    fn order(&self) -> SegmentOrder {
        match self {
            Segment::Monthly => SegmentOrder::Ascending(MONTH),
            Segment::Funnel => SegmentOrder::Descending(LEADS),
            Segment::Matrix => SegmentOrder::BucketPair,
            _ => SegmentOrder::Descending(GOOD_RATE),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One aggregation result
#[derive(Debug, Clone)]
pub struct SegmentTable {
    pub segment: Segment,
    pub table: DataFrame,
}

/// All aggregation results of a run, in `Segment::ALL` order
#[derive(Debug, Clone)]
pub struct Segments {
    tables: Vec<SegmentTable>,
}

impl Segments {
    pub fn get(&self, segment: Segment) -> Option<&DataFrame> {
        self.tables
            .iter()
            .find(|t| t.segment == segment)
            .map(|t| &t.table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SegmentTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Run every segment analysis.
///
/// The queries are independent and run in parallel; all of them finish before
/// this returns.
pub fn run_segments(df: &DataFrame, thresholds: &AggregationThresholds) -> Result<Segments> {
    let tables = Segment::ALL
        .par_iter()
        .map(|segment| {
            run_segment(df, *segment, thresholds).map(|table| SegmentTable {
                segment: *segment,
                table,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Segments { tables })
}

/// Run a single segment analysis
pub fn run_segment(
    df: &DataFrame,
    segment: Segment,
    thresholds: &AggregationThresholds,
) -> Result<DataFrame> {
    let count_name = segment.count_column();

    let keys: Vec<Expr> = segment.keys().iter().map(|k| col(*k)).collect();
    let mut aggs = vec![len().alias(count_name)];
    for (flag, rate) in segment.rates() {
        aggs.push(col(*flag).cast(DataType::Float64).mean().alias(*rate));
    }

    let mut lf = df.clone().lazy().group_by_stable(keys).agg(aggs);

    // Drop low-volume groups before ordering
    if let Some(min) = segment.min_leads(thresholds) {
        lf = lf.filter(col(count_name).gt(lit(min)));
    }

    let options = SortMultipleOptions::default()
        .with_maintain_order(true)
        .with_nulls_last(true);

    lf = match segment.order() {
        SegmentOrder::Ascending(by) => lf.sort([by], options),
        SegmentOrder::Descending(by) => lf.sort([by], options.with_order_descending(true)),
        SegmentOrder::BucketPair => {
            lf.sort_by_exprs([bucket_rank(PHONE_BUCKET), bucket_rank(ADDRESS_BUCKET)], options)
        }
    };

    lf.collect()
        .with_context(|| format!("Failed to compute '{}' segment", segment))
}

/// Ordinal sort key for a bucket column; nulls sort after High
fn bucket_rank(column: &str) -> Expr {
    let [low, medium, high] = ScoreBucket::ALL;
    when(col(column).eq(lit(low.as_str())))
        .then(lit(low.rank() as i32))
        .when(col(column).eq(lit(medium.as_str())))
        .then(lit(medium.rank() as i32))
        .when(col(column).eq(lit(high.as_str())))
        .then(lit(high.rank() as i32))
        .otherwise(lit(ScoreBucket::ALL.len() as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_df() -> DataFrame {
        df! {
            MONTH => [Some("2023-02"), Some("2023-01"), None, Some("2023-01")],
            WIDGET_NAME => ["w1", "w2", "w1", "w2"],
            PARTNER => ["p1", "p1", "p2", "p2"],
            DEBT_LEVEL => ["low", "high", "low", "high"],
            CALL_STATUS => ["Closed", "Other", "Other", "Other"],
            PHONE_BUCKET => [Some("High"), Some("Low"), None, Some("Medium")],
            ADDRESS_BUCKET => [Some("Low"), Some("Low"), Some("High"), Some("Low")],
            GOOD_LEAD_FLAG => [1i32, 0, 0, 0],
            BAD_LEAD_FLAG => [0i32, 0, 1, 0],
            CLOSED_FLAG => [1i32, 0, 0, 0],
        }
        .unwrap()
    }

    #[test]
    fn test_segment_names_are_unique() {
        let mut names: Vec<&str> = Segment::ALL.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_monthly_sorted_with_null_last() {
        let out = run_segment(&flags_df(), Segment::Monthly, &Default::default()).unwrap();
        assert_eq!(
            out.get_column_names(),
            &[MONTH, TOTAL_LEADS, GOOD_RATE, BAD_RATE, CLOSED_RATE]
        );
        let months: Vec<Option<&str>> = out.column(MONTH).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(months, vec![Some("2023-01"), Some("2023-02"), None]);
    }

    #[test]
    fn test_widget_columns_follow_query_order() {
        let out = run_segment(&flags_df(), Segment::Widget, &Default::default()).unwrap();
        assert_eq!(
            out.get_column_names(),
            &[WIDGET_NAME, LEADS, GOOD_RATE, CLOSED_RATE, BAD_RATE]
        );
        let first = out.column(WIDGET_NAME).unwrap().str().unwrap().get(0);
        assert_eq!(first, Some("w1"));
    }

    #[test]
    fn test_matrix_sorted_by_bucket_ordinal() {
        let out = run_segment(&flags_df(), Segment::Matrix, &Default::default()).unwrap();
        let phone: Vec<Option<&str>> = out
            .column(PHONE_BUCKET)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(phone, vec![Some("Low"), Some("Medium"), Some("High"), None]);
    }

    #[test]
    fn test_partner_threshold_filters_everything_small() {
        let out = run_segment(&flags_df(), Segment::Partner, &Default::default()).unwrap();
        assert_eq!(out.height(), 0);

        let loose = AggregationThresholds {
            partner_min_leads: 1,
            widget_partner_min_leads: 0,
        };
        let out = run_segment(&flags_df(), Segment::Partner, &loose).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_run_segments_returns_all_in_order() {
        let segments = run_segments(&flags_df(), &Default::default()).unwrap();
        let order: Vec<Segment> = segments.iter().map(|t| t.segment).collect();
        assert_eq!(order, Segment::ALL.to_vec());
        assert!(segments.get(Segment::Funnel).is_some());
    }
}
