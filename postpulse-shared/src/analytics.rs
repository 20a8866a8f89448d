//! Ranking metrics and the engagement graph
//!
//! No per-day history is stored. The graph is a linear ramp from zero up to
//! the post's current totals, one point per day ending today.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::post_analytics::PostAnalytics;

/// Ordering used by the top-posts ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopMetric {
    /// Reactions plus shares and comments
    #[default]
    Engagement,
    /// The five reaction counters
    Reactions,
    Impressions,
}

impl TopMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopMetric::Engagement => "engagement",
            TopMetric::Reactions => "reactions",
            TopMetric::Impressions => "impressions",
        }
    }

    /// SQL sort key over `post_analytics a`; a missing row sorts as zero
    pub(crate) fn order_expression(&self) -> &'static str {
        match self {
            TopMetric::Engagement => {
                "COALESCE(a.like_count::BIGINT + a.praise_count + a.empathy_count \
                 + a.interest_count + a.appreciation_count + a.shares_count \
                 + a.comments_count, 0)"
            }
            TopMetric::Reactions => {
                "COALESCE(a.like_count::BIGINT + a.praise_count + a.empathy_count \
                 + a.interest_count + a.appreciation_count, 0)"
            }
            TopMetric::Impressions => "COALESCE(a.impressions_count, 0)",
        }
    }
}

/// The totals a graph ramps up to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphTotals {
    pub reactions: i64,
    pub engagements: i64,
    pub impressions: i64,
    pub shares: i64,
    pub comments: i64,
}

impl From<&PostAnalytics> for GraphTotals {
    fn from(analytics: &PostAnalytics) -> Self {
        Self {
            reactions: analytics.total_reactions(),
            engagements: analytics.total_engagements(),
            impressions: analytics.impressions_count.into(),
            shares: analytics.shares_count.into(),
            comments: analytics.comments_count.into(),
        }
    }
}

/// One day of the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphPoint {
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub reactions: i64,
    pub engagements: i64,
    pub impressions: i64,
    pub shares: i64,
    pub comments: i64,
}

/// Builds `days` points dated `today - (days - 1)` through `today`
///
/// Point `i` holds `floor(total * (i + 1) / days)` for every series, so the
/// last point equals the current totals.
pub fn synthesize_graph(totals: &GraphTotals, days: u32, today: NaiveDate) -> Vec<GraphPoint> {
    let days = i64::from(days);

    (0..days)
        .map(|i| {
            let scale = |total: i64| total * (i + 1) / days;

            GraphPoint {
                date: today - Duration::days(days - 1 - i),
                reactions: scale(totals.reactions),
                engagements: scale(totals.engagements),
                impressions: scale(totals.impressions),
                shares: scale(totals.shares),
                comments: scale(totals.comments),
            }
        })
        .collect()
}
