use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::LoadError;
use super::month::Month;
use super::row::Row;

// ---------------------------------------------------------------------------
// SubscriptionTier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SubscriptionTier {
    Free,
    Premium,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 2] = [SubscriptionTier::Free, SubscriptionTier::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Premium => "Premium",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "premium" => Ok(SubscriptionTier::Premium),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TabularRecord – a typed row that can be loaded, filtered and grouped
// ---------------------------------------------------------------------------

/// A record type backed by a flat table.
///
/// `Dimension` enumerates the categorical columns a record can be filtered
/// and grouped by. Every record also has a [`Month`], which is filtered by
/// range rather than by membership.
pub trait TabularRecord: Sized {
    type Dimension: Copy + Ord + fmt::Debug + fmt::Display + 'static;

    /// Columns that must be present in the header.
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Categorical dimensions whose distinct values are indexed at load.
    const DIMENSIONS: &'static [Self::Dimension];

    /// Validate one decoded row into a record.
    fn from_row(row: &Row) -> Result<Self, LoadError>;

    /// The grouping key of this record in `dimension`.
    fn key(&self, dimension: Self::Dimension) -> Cow<'_, str>;

    fn month(&self) -> Month;
}

// ---------------------------------------------------------------------------
// ListeningRecord – one row of the listening table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Artist,
    Genre,
    Region,
    Country,
    Tier,
    Month,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Artist => "Artist",
            Dimension::Genre => "Genre",
            Dimension::Region => "Region",
            Dimension::Country => "Country",
            Dimension::Tier => "Subscription",
            Dimension::Month => "Month",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListeningRecord {
    pub artist: String,
    pub genre: String,
    pub region: String,
    /// Empty when the source has no `country` column.
    pub country: String,
    pub tier: SubscriptionTier,
    pub month: Month,
    pub streams: u64,
    pub active_listeners: u64,
    pub completion_rate: Option<f64>,
}

impl TabularRecord for ListeningRecord {
    type Dimension = Dimension;

    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "artist_name",
        "genre",
        "region",
        "subscription_type",
        "month",
        "streams",
        "active_listeners",
    ];

    const DIMENSIONS: &'static [Dimension] = &[
        Dimension::Artist,
        Dimension::Genre,
        Dimension::Region,
        Dimension::Country,
        Dimension::Tier,
    ];

    fn from_row(row: &Row) -> Result<Self, LoadError> {
        Ok(ListeningRecord {
            artist: row.text("artist_name")?,
            genre: row.text("genre")?,
            region: row.text("region")?,
            country: row.text_or_empty("country"),
            tier: row.tier("subscription_type")?,
            month: row.month("month")?,
            streams: row.count("streams")?,
            active_listeners: row.count("active_listeners")?,
            completion_rate: row.optional_float("completion_rate")?,
        })
    }

    fn key(&self, dimension: Dimension) -> Cow<'_, str> {
        match dimension {
            Dimension::Artist => Cow::Borrowed(self.artist.as_str()),
            Dimension::Genre => Cow::Borrowed(self.genre.as_str()),
            Dimension::Region => Cow::Borrowed(self.region.as_str()),
            Dimension::Country => Cow::Borrowed(self.country.as_str()),
            Dimension::Tier => Cow::Borrowed(self.tier.as_str()),
            Dimension::Month => Cow::Owned(self.month.to_string()),
        }
    }

    fn month(&self) -> Month {
        self.month
    }
}

/// Numeric columns of a [`ListeningRecord`] that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Streams,
    ActiveListeners,
    CompletionRate,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Streams, Metric::ActiveListeners, Metric::CompletionRate];

    pub fn value(&self, record: &ListeningRecord) -> Option<f64> {
        match self {
            Metric::Streams => Some(record.streams as f64),
            Metric::ActiveListeners => Some(record.active_listeners as f64),
            Metric::CompletionRate => record.completion_rate,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Streams => "Streams",
            Metric::ActiveListeners => "Active listeners",
            Metric::CompletionRate => "Completion rate",
        }
    }
}

// ---------------------------------------------------------------------------
// CampaignRecord – one row of the marketing campaign table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CampaignDimension {
    Campaign,
    TargetRegion,
    TargetGenre,
    Month,
}

impl fmt::Display for CampaignDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CampaignDimension::Campaign => "Campaign",
            CampaignDimension::TargetRegion => "Target region",
            CampaignDimension::TargetGenre => "Target genre",
            CampaignDimension::Month => "Month",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRecord {
    pub campaign: String,
    pub target_region: String,
    pub target_genre: String,
    pub month: Month,
    pub net_user_gain: i64,
    pub user_growth_pct: f64,
    pub premium_growth_pct: f64,
}

impl TabularRecord for CampaignRecord {
    type Dimension = CampaignDimension;

    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "campaign_name",
        "target_region",
        "target_genre",
        "month",
        "net_user_gain",
        "user_growth_pct",
        "premium_growth_pct",
    ];

    const DIMENSIONS: &'static [CampaignDimension] = &[
        CampaignDimension::Campaign,
        CampaignDimension::TargetRegion,
        CampaignDimension::TargetGenre,
    ];

    fn from_row(row: &Row) -> Result<Self, LoadError> {
        Ok(CampaignRecord {
            campaign: row.text("campaign_name")?,
            target_region: row.text("target_region")?,
            target_genre: row.text("target_genre")?,
            month: row.month("month")?,
            net_user_gain: row.integer("net_user_gain")?,
            user_growth_pct: row.float("user_growth_pct")?,
            premium_growth_pct: row.float("premium_growth_pct")?,
        })
    }

    fn key(&self, dimension: CampaignDimension) -> Cow<'_, str> {
        match dimension {
            CampaignDimension::Campaign => Cow::Borrowed(self.campaign.as_str()),
            CampaignDimension::TargetRegion => Cow::Borrowed(self.target_region.as_str()),
            CampaignDimension::TargetGenre => Cow::Borrowed(self.target_genre.as_str()),
            CampaignDimension::Month => Cow::Owned(self.month.to_string()),
        }
    }

    fn month(&self) -> Month {
        self.month
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignMetric {
    NetUserGain,
    UserGrowthPct,
    PremiumGrowthPct,
}

impl CampaignMetric {
    pub fn value(&self, record: &CampaignRecord) -> Option<f64> {
        Some(match self {
            CampaignMetric::NetUserGain => record.net_user_gain as f64,
            CampaignMetric::UserGrowthPct => record.user_growth_pct,
            CampaignMetric::PremiumGrowthPct => record.premium_growth_pct,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CampaignMetric::NetUserGain => "Net user gain",
            CampaignMetric::UserGrowthPct => "User growth %",
            CampaignMetric::PremiumGrowthPct => "Premium growth %",
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed indices for the filter widgets.
#[derive(Debug, Clone)]
pub struct Dataset<R: TabularRecord> {
    /// All records, in file order. Never mutated after loading.
    pub records: Vec<R>,
    /// For each categorical dimension the sorted set of distinct values.
    pub distinct: BTreeMap<R::Dimension, BTreeSet<String>>,
    /// Every month present in the table.
    pub months: BTreeSet<Month>,
}

impl<R: TabularRecord> Dataset<R> {
    /// Build dimension indices from the loaded records.
    pub fn from_records(records: Vec<R>) -> Self {
        let mut distinct: BTreeMap<R::Dimension, BTreeSet<String>> = R::DIMENSIONS
            .iter()
            .map(|dim| (*dim, BTreeSet::new()))
            .collect();
        let mut months = BTreeSet::new();

        for record in &records {
            for dim in R::DIMENSIONS {
                if let Some(values) = distinct.get_mut(dim) {
                    values.insert(record.key(*dim).into_owned());
                }
            }
            months.insert(record.month());
        }

        Dataset {
            records,
            distinct,
            months,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct values of `dimension` (empty if not indexed).
    pub fn values(&self, dimension: R::Dimension) -> impl Iterator<Item = &str> {
        self.distinct
            .get(&dimension)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn first_month(&self) -> Option<Month> {
        self.months.first().copied()
    }

    pub fn last_month(&self) -> Option<Month> {
        self.months.last().copied()
    }
}

pub type ListeningDataset = Dataset<ListeningRecord>;
pub type CampaignDataset = Dataset<CampaignRecord>;
