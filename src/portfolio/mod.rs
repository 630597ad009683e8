//! Bucket-level aggregation: weighted metrics, combined rolling returns,
//! and withdrawal sizing insights

mod aggregate;
mod insights;

pub use aggregate::{
    bucket_metrics, combine_rolling, weighted_average, BucketMetrics, FundMetrics,
};
pub use insights::{
    withdrawal_insights, InsightParams, WithdrawalInsights, DEFAULT_RISK_FACTOR,
};
