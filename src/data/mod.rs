/// Data layer: typed records, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  decode cells → Row → validated record
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │  Dataset<R> │  Vec<R>, distinct values per dimension, months
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  membership + month range predicates → filtered view
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  count / sum / mean per group, KPIs, insights
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod insight;
pub mod loader;
pub mod model;
pub mod month;
pub mod row;

pub use error::LoadError;
pub use model::{
    CampaignDataset, CampaignDimension, CampaignMetric, CampaignRecord, Dataset, Dimension,
    ListeningDataset, ListeningRecord, Metric, SubscriptionTier, TabularRecord,
};
pub use month::Month;
