use std::collections::BTreeMap;

use chrono::Datelike;

use super::super::domain::Visit;
use super::super::scoring;
use super::views::{BranchFilter, ChartBand, MonthBucket, MonthlyTrendPoint};

#[derive(Debug, Default, Clone, Copy)]
struct BucketTotals {
    total: i64,
    max: i64,
    visits: usize,
}

/// Monthly conformity trend.
///
/// Each bucket sums the visits' totals and maxima and derives one percentage from the
/// sums. With `year` set the result covers all twelve months of that year; without it
/// only months holding at least one visit are returned. Ascending by month either way.
pub fn aggregate_by_month(
    visits: &[Visit],
    year: Option<i32>,
    branch: &BranchFilter,
) -> Vec<MonthlyTrendPoint> {
    let mut buckets: BTreeMap<MonthBucket, BucketTotals> = BTreeMap::new();

    for visit in visits
        .iter()
        .filter(|visit| year.map_or(true, |year| visit.visit_date.year() == year))
        .filter(|visit| branch.matches(visit))
    {
        let totals = buckets
            .entry(MonthBucket::from_date(visit.visit_date))
            .or_default();
        totals.total += i64::from(visit.total_score.unwrap_or(0));
        totals.max += i64::from(visit.max_possible_score.unwrap_or(0));
        totals.visits += 1;
    }

    match year {
        Some(year) => (1..=12)
            .map(|month| {
                let bucket = MonthBucket { year, month };
                point(bucket, buckets.get(&bucket).copied())
            })
            .collect(),
        None => buckets
            .into_iter()
            .map(|(bucket, totals)| point(bucket, Some(totals)))
            .collect(),
    }
}

fn point(bucket: MonthBucket, totals: Option<BucketTotals>) -> MonthlyTrendPoint {
    let totals = totals.unwrap_or_default();
    // an empty bucket is "no data", never 0%
    let percentage = if totals.visits == 0 {
        None
    } else {
        scoring::percentage(totals.total, totals.max)
    };

    let band = percentage.map(ChartBand::from_percentage);
    MonthlyTrendPoint {
        bucket,
        month: bucket.label(),
        percentage,
        visit_count: totals.visits,
        total_score: totals.total,
        max_possible: totals.max,
        band,
        colour: band.map(ChartBand::colour),
    }
}
