use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::model::{
    CampaignMetric, CampaignRecord, Dimension, ListeningRecord, Metric, SubscriptionTier,
    TabularRecord,
};
use super::month::Month;

// ---------------------------------------------------------------------------
// Summary – count / sum / mean of one metric
// ---------------------------------------------------------------------------

/// Running summary of a metric. `count` only counts non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
}

impl Summary {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    /// `None` when no value contributed.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn merge(mut self, other: &Summary) -> Summary {
        self.count += other.count;
        self.sum += other.sum;
        self
    }
}

// ---------------------------------------------------------------------------
// AggregateResult – grouping key → summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateResult {
    groups: BTreeMap<String, Summary>,
}

impl AggregateResult {
    pub fn get(&self, key: &str) -> Option<&Summary> {
        self.groups.get(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Summary)> {
        self.groups.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Sum of every group. Equals the summary of the records grouped.
    pub fn total(&self) -> Summary {
        self.groups.values().fold(Summary::default(), Summary::merge)
    }

    /// Groups by descending sum; equal sums fall back to ascending key.
    pub fn ranked(&self) -> Vec<(&str, &Summary)> {
        self.ranked_by(|s| Some(s.sum))
    }

    /// Groups by descending `score`. Groups without a score sort last;
    /// ties are broken by ascending key.
    pub fn ranked_by(&self, score: impl Fn(&Summary) -> Option<f64>) -> Vec<(&str, &Summary)> {
        let mut ranked: Vec<(&str, &Summary, Option<f64>)> =
            self.iter().map(|(k, s)| (k, s, score(s))).collect();
        ranked.sort_by(|a, b| {
            let by_score = match (a.2, b.2) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_score.then_with(|| a.0.cmp(b.0))
        });
        ranked.into_iter().map(|(k, s, _)| (k, s)).collect()
    }

    /// The first `n` entries of [`AggregateResult::ranked`].
    pub fn top(&self, n: usize) -> Vec<(&str, &Summary)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Summarise `metric` per distinct key of `dimension`.
///
/// Every key present in `records` gets a group, even if none of its
/// records has a value for `metric`.
pub fn group_by<'a, R, I, F>(records: I, dimension: R::Dimension, metric: F) -> AggregateResult
where
    R: TabularRecord + 'a,
    I: IntoIterator<Item = &'a R>,
    F: Fn(&R) -> Option<f64>,
{
    let mut groups: BTreeMap<String, Summary> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(record.key(dimension).into_owned()).or_default();
        if let Some(value) = metric(record) {
            entry.add(value);
        }
    }
    AggregateResult { groups }
}

/// Two-level grouping: `outer` key → (`inner` key → summary).
pub fn group_by_pair<'a, R, I, F>(
    records: I,
    outer: R::Dimension,
    inner: R::Dimension,
    metric: F,
) -> BTreeMap<String, AggregateResult>
where
    R: TabularRecord + 'a,
    I: IntoIterator<Item = &'a R>,
    F: Fn(&R) -> Option<f64>,
{
    let mut result: BTreeMap<String, AggregateResult> = BTreeMap::new();
    for record in records {
        let entry = result
            .entry(record.key(outer).into_owned())
            .or_default()
            .groups
            .entry(record.key(inner).into_owned())
            .or_default();
        if let Some(value) = metric(record) {
            entry.add(value);
        }
    }
    result
}

/// Summarise `metric` per month, in chronological order.
pub fn by_month<'a, R, I, F>(records: I, metric: F) -> BTreeMap<Month, Summary>
where
    R: TabularRecord + 'a,
    I: IntoIterator<Item = &'a R>,
    F: Fn(&R) -> Option<f64>,
{
    let mut months: BTreeMap<Month, Summary> = BTreeMap::new();
    for record in records {
        let entry = months.entry(record.month()).or_default();
        if let Some(value) = metric(record) {
            entry.add(value);
        }
    }
    months
}

/// Summarise `metric` over every record.
pub fn total<'a, R, I, F>(records: I, metric: F) -> Summary
where
    R: TabularRecord + 'a,
    I: IntoIterator<Item = &'a R>,
    F: Fn(&R) -> Option<f64>,
{
    let mut summary = Summary::default();
    for value in records.into_iter().filter_map(|r| metric(r)) {
        summary.add(value);
    }
    summary
}

/// Sum of counts, pinned at `u64::MAX` instead of overflowing.
pub fn saturating_sum(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

/// Headline numbers for the streaming page. Every field is `None` when the
/// filtered view is empty, so the UI can show "no data".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamingKpis {
    pub records: usize,
    pub total_streams: Option<u64>,
    pub active_listeners: Option<u64>,
    pub top_artist: Option<String>,
    /// Premium listeners as a percentage of all active listeners.
    pub premium_share: Option<f64>,
}

impl StreamingKpis {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a ListeningRecord>) -> Self {
        let records: Vec<&ListeningRecord> = records.into_iter().collect();
        if records.is_empty() {
            return StreamingKpis::default();
        }

        let total_streams = saturating_sum(records.iter().map(|r| r.streams));
        let active_listeners = saturating_sum(records.iter().map(|r| r.active_listeners));
        let premium_listeners = saturating_sum(
            records
                .iter()
                .filter(|r| r.tier == SubscriptionTier::Premium)
                .map(|r| r.active_listeners),
        );

        let top_artist = group_by(records.iter().copied(), Dimension::Artist, |r| {
            Metric::Streams.value(r)
        })
        .ranked()
        .first()
        .map(|(artist, _)| artist.to_string());

        let premium_share = (active_listeners > 0)
            .then(|| premium_listeners as f64 * 100.0 / active_listeners as f64);

        StreamingKpis {
            records: records.len(),
            total_streams: Some(total_streams),
            active_listeners: Some(active_listeners),
            top_artist,
            premium_share,
        }
    }
}

/// Headline numbers for the campaign page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CampaignKpis {
    pub records: usize,
    pub total_net_user_gain: Option<i64>,
    pub avg_user_growth_pct: Option<f64>,
    pub avg_premium_growth_pct: Option<f64>,
}

impl CampaignKpis {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a CampaignRecord>) -> Self {
        let records: Vec<&CampaignRecord> = records.into_iter().collect();
        if records.is_empty() {
            return CampaignKpis::default();
        }

        CampaignKpis {
            records: records.len(),
            total_net_user_gain: Some(
                records
                    .iter()
                    .fold(0i64, |acc, r| acc.saturating_add(r.net_user_gain)),
            ),
            avg_user_growth_pct: total(records.iter().copied(), |r| {
                CampaignMetric::UserGrowthPct.value(r)
            })
            .mean(),
            avg_premium_growth_pct: total(records.iter().copied(), |r| {
                CampaignMetric::PremiumGrowthPct.value(r)
            })
            .mean(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, ListeningFilter};
    use crate::data::model::tests::listen;
    use crate::data::model::SubscriptionTier::*;

    fn streams(r: &ListeningRecord) -> Option<f64> {
        Metric::Streams.value(r)
    }

    #[test]
    fn pop_rock_example() {
        let records = vec![
            listen("A", "Pop", "EU", Free, "2024-01", 10),
            listen("B", "Pop", "EU", Free, "2024-01", 20),
            listen("C", "Rock", "EU", Free, "2024-01", 5),
        ];
        let mut filter = ListeningFilter::default();
        filter.select(Dimension::Genre, ["Pop"]);

        let view = apply(&records, &filter);
        assert_eq!(view.len(), 2);

        let by_genre = group_by(view, Dimension::Genre, streams);
        let pop = by_genre.get("Pop").unwrap();
        assert_eq!(pop.sum, 30.0);
        assert_eq!(pop.count, 2);
        assert_eq!(pop.mean(), Some(15.0));
        assert!(by_genre.get("Rock").is_none());
    }

    #[test]
    fn group_sums_add_up_to_total() {
        let records = vec![
            listen("A", "Pop", "EU", Free, "2024-01", 10),
            listen("B", "Rock", "NA", Premium, "2024-02", 7),
            listen("A", "Jazz", "NA", Free, "2024-03", 3),
            listen("C", "Pop", "APAC", Premium, "2024-03", 11),
        ];
        let overall = total(&records, streams);
        for dim in [
            Dimension::Artist,
            Dimension::Genre,
            Dimension::Region,
            Dimension::Tier,
            Dimension::Month,
        ] {
            let grouped = group_by(&records, dim, streams);
            assert_eq!(grouped.total(), overall, "dimension {dim}");
        }
    }

    #[test]
    fn ranking_breaks_ties_by_key() {
        let records = vec![
            listen("Zed", "Pop", "EU", Free, "2024-01", 10),
            listen("Abe", "Pop", "EU", Free, "2024-01", 10),
            listen("Max", "Pop", "EU", Free, "2024-01", 30),
        ];
        let grouped = group_by(&records, Dimension::Artist, streams);
        let order: Vec<&str> = grouped.ranked().into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, ["Max", "Abe", "Zed"]);
        assert_eq!(grouped.top(2).len(), 2);
        assert_eq!(grouped.top(10).len(), 3);
    }

    #[test]
    fn rank_by_mean_puts_missing_last() {
        let mut a = listen("A", "Pop", "EU", Free, "2024-01", 1);
        a.completion_rate = Some(0.5);
        let b = listen("B", "Pop", "EU", Free, "2024-01", 1);
        let mut c = listen("C", "Pop", "EU", Free, "2024-01", 1);
        c.completion_rate = Some(0.9);

        let records = [a, b, c];
        let grouped = group_by(&records, Dimension::Artist, |r| Metric::CompletionRate.value(r));
        assert_eq!(grouped.get("B").unwrap().count, 0);
        let order: Vec<&str> = grouped
            .ranked_by(Summary::mean)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(order, ["C", "A", "B"]);
    }

    #[test]
    fn pair_grouping_and_months() {
        let records = vec![
            listen("A", "Pop", "EU", Free, "2024-02", 10),
            listen("B", "Rock", "EU", Free, "2024-01", 4),
            listen("C", "Pop", "NA", Free, "2024-02", 6),
        ];
        let pairs = group_by_pair(&records, Dimension::Region, Dimension::Genre, streams);
        assert_eq!(pairs["EU"].get("Pop").unwrap().sum, 10.0);
        assert_eq!(pairs["EU"].get("Rock").unwrap().sum, 4.0);
        assert_eq!(pairs["NA"].len(), 1);

        let months: Vec<(String, f64)> = by_month(&records, streams)
            .into_iter()
            .map(|(m, s)| (m.to_string(), s.sum))
            .collect();
        assert_eq!(months, [("2024-01".to_string(), 4.0), ("2024-02".to_string(), 16.0)]);
    }

    #[test]
    fn streaming_kpis() {
        let mut records = vec![
            listen("Nova", "Pop", "EU", Premium, "2024-01", 100),
            listen("Dune", "Rock", "EU", Free, "2024-01", 100),
            listen("Echo", "Pop", "EU", Free, "2024-01", 50),
        ];
        records[0].active_listeners = 30;
        records[1].active_listeners = 60;
        records[2].active_listeners = 10;

        let kpis = StreamingKpis::compute(&records);
        assert_eq!(kpis.records, 3);
        assert_eq!(kpis.total_streams, Some(250));
        assert_eq!(kpis.active_listeners, Some(100));
        assert_eq!(kpis.top_artist.as_deref(), Some("Dune"));
        assert_eq!(kpis.premium_share, Some(30.0));
    }

    #[test]
    fn empty_view_has_no_kpis() {
        let kpis = StreamingKpis::compute(std::iter::empty());
        assert_eq!(kpis, StreamingKpis::default());
        assert_eq!(kpis.top_artist, None);
        assert_eq!(CampaignKpis::compute(std::iter::empty()).avg_user_growth_pct, None);
    }

    #[test]
    fn premium_share_without_listeners_is_undefined() {
        let mut record = listen("Nova", "Pop", "EU", Premium, "2024-01", 5);
        record.active_listeners = 0;
        let kpis = StreamingKpis::compute([&record]);
        assert_eq!(kpis.total_streams, Some(5));
        assert_eq!(kpis.premium_share, None);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let big = i64::MAX as u64;
        let records: Vec<ListeningRecord> = ["A", "B", "C"]
            .into_iter()
            .map(|artist| {
                let mut r = listen(artist, "Pop", "EU", Premium, "2024-01", big);
                r.active_listeners = big;
                r
            })
            .collect();

        let kpis = StreamingKpis::compute(&records);
        assert_eq!(kpis.total_streams, Some(u64::MAX));
        assert_eq!(kpis.active_listeners, Some(u64::MAX));
        assert_eq!(kpis.premium_share, Some(100.0));
        assert_eq!(kpis.top_artist.as_deref(), Some("A"));
        assert_eq!(saturating_sum([u64::MAX, 1]), u64::MAX);

        let campaigns: Vec<CampaignRecord> = (0..3)
            .map(|_| CampaignRecord {
                campaign: "Wrapped".into(),
                target_region: "EU".into(),
                target_genre: "Pop".into(),
                month: "2024-01".parse().unwrap(),
                net_user_gain: i64::MAX,
                user_growth_pct: 1.0,
                premium_growth_pct: 1.0,
            })
            .collect();
        assert_eq!(CampaignKpis::compute(&campaigns).total_net_user_gain, Some(i64::MAX));
    }
}
