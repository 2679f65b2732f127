use std::collections::BTreeMap;
use std::fmt;

use super::aggregate::group_by;
use super::model::{CampaignDimension, CampaignMetric, CampaignRecord, Dimension, ListeningRecord};

/// Quantile `q` (0..=1) of `values` with linear interpolation between the
/// two closest ranks. `None` for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

// ---------------------------------------------------------------------------
// Market signal – how strongly a genre is adopted per country
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Adoption {
    Low,
    Moderate,
    High,
}

impl fmt::Display for Adoption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Adoption::Low => "Low",
            Adoption::Moderate => "Moderate",
            Adoption::High => "High",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketSignal {
    pub country: String,
    pub region: String,
    pub streams: u64,
    pub adoption: Adoption,
}

/// Streams of `genre` per (country, region), each labelled against the
/// 0.75 and 0.40 quantiles of all markets. Sorted by descending streams,
/// then country.
pub fn market_signals<'a>(
    records: impl IntoIterator<Item = &'a ListeningRecord>,
    genre: &str,
) -> Vec<MarketSignal> {
    let mut markets: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for r in records.into_iter().filter(|r| r.genre == genre) {
        let total = markets.entry((r.country.as_str(), r.region.as_str())).or_default();
        *total = total.saturating_add(r.streams);
    }

    let totals: Vec<f64> = markets.values().map(|&s| s as f64).collect();
    let (Some(high), Some(moderate)) = (quantile(&totals, 0.75), quantile(&totals, 0.40)) else {
        return Vec::new();
    };

    let mut signals: Vec<MarketSignal> = markets
        .into_iter()
        .map(|((country, region), streams)| {
            let s = streams as f64;
            let adoption = if s >= high {
                Adoption::High
            } else if s >= moderate {
                Adoption::Moderate
            } else {
                Adoption::Low
            };
            MarketSignal {
                country: country.to_string(),
                region: region.to_string(),
                streams,
                adoption,
            }
        })
        .collect();
    signals.sort_by(|a, b| b.streams.cmp(&a.streams).then_with(|| a.country.cmp(&b.country)));
    signals
}

/// The `n` most streamed artists in `country`.
pub fn country_top_artists<'a>(
    records: impl IntoIterator<Item = &'a ListeningRecord>,
    country: &str,
    n: usize,
) -> Vec<(String, u64)> {
    let grouped = group_by(
        records.into_iter().filter(|r| r.country == country),
        Dimension::Artist,
        |r| Some(r.streams as f64),
    );
    grouped
        .top(n)
        .into_iter()
        .map(|(artist, s)| (artist.to_string(), s.sum as u64))
        .collect()
}

// ---------------------------------------------------------------------------
// Campaign verdicts – acquisition vs monetization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Both growth rates clear their thresholds.
    ScaleCandidate,
    /// Users grow but premium conversion lags.
    MonetizationGap,
    /// Converts to premium without broad user growth.
    NicheConverter,
    Reassess,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::ScaleCandidate => "Scale candidate",
            Verdict::MonetizationGap => "Monetization gap",
            Verdict::NicheConverter => "Niche converter",
            Verdict::Reassess => "Reassess",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub user_growth_pct: f64,
    pub premium_growth_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            user_growth_pct: 10.0,
            premium_growth_pct: 5.0,
        }
    }
}

impl Thresholds {
    pub fn verdict(&self, user_growth_pct: f64, premium_growth_pct: f64) -> Verdict {
        match (
            user_growth_pct >= self.user_growth_pct,
            premium_growth_pct >= self.premium_growth_pct,
        ) {
            (true, true) => Verdict::ScaleCandidate,
            (true, false) => Verdict::MonetizationGap,
            (false, true) => Verdict::NicheConverter,
            (false, false) => Verdict::Reassess,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignAssessment {
    pub campaign: String,
    pub user_growth_pct: f64,
    pub premium_growth_pct: f64,
    pub verdict: Verdict,
}

/// Mean growth rates per campaign with their verdict, by campaign name.
pub fn assess_campaigns<'a>(
    records: impl IntoIterator<Item = &'a CampaignRecord>,
    thresholds: &Thresholds,
) -> Vec<CampaignAssessment> {
    let records: Vec<&CampaignRecord> = records.into_iter().collect();
    let users = group_by(records.iter().copied(), CampaignDimension::Campaign, |r| {
        CampaignMetric::UserGrowthPct.value(r)
    });
    let premium = group_by(records.iter().copied(), CampaignDimension::Campaign, |r| {
        CampaignMetric::PremiumGrowthPct.value(r)
    });

    users
        .iter()
        .filter_map(|(campaign, summary)| {
            let user_growth_pct = summary.mean()?;
            let premium_growth_pct = premium.get(campaign)?.mean()?;
            Some(CampaignAssessment {
                campaign: campaign.to_string(),
                user_growth_pct,
                premium_growth_pct,
                verdict: thresholds.verdict(user_growth_pct, premium_growth_pct),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::listen;
    use crate::data::model::SubscriptionTier::*;

    #[test]
    fn quantile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.75), Some(3.25));
        assert_eq!(quantile(&[7.0], 0.4), Some(7.0));
        assert_eq!(quantile(&[], 0.4), None);
    }

    fn market(country: &str, streams: u64) -> ListeningRecord {
        let mut r = listen("A", "Pop", "EU", Free, "2024-01", streams);
        r.country = country.to_string();
        r
    }

    #[test]
    fn markets_are_labelled_by_quantile() {
        let mut records = vec![
            market("DE", 100),
            market("FR", 40),
            market("ES", 20),
            market("IT", 10),
            market("DE", 10),
        ];
        records.push(listen("B", "Rock", "EU", Free, "2024-01", 1_000));

        let signals = market_signals(&records, "Pop");
        let labels: Vec<(&str, u64, Adoption)> = signals
            .iter()
            .map(|s| (s.country.as_str(), s.streams, s.adoption))
            .collect();
        // totals 10, 20, 40, 110: q75 = 57.5, q40 = 24
        assert_eq!(
            labels,
            [
                ("DE", 110, Adoption::High),
                ("FR", 40, Adoption::Moderate),
                ("ES", 20, Adoption::Low),
                ("IT", 10, Adoption::Low),
            ]
        );
        assert!(market_signals(&records, "Jazz").is_empty());
    }

    #[test]
    fn country_drill_down() {
        let mut records = vec![market("DE", 5), market("DE", 7), market("FR", 100)];
        records[1].artist = "B".into();
        let top = country_top_artists(&records, "DE", 5);
        assert_eq!(top, [("B".to_string(), 7), ("A".to_string(), 5)]);
    }

    #[test]
    fn market_totals_saturate() {
        let big = i64::MAX as u64;
        let records = [market("DE", big), market("DE", big), market("DE", big), market("FR", 1)];
        let signals = market_signals(&records, "Pop");
        assert_eq!(signals[0].country, "DE");
        assert_eq!(signals[0].streams, u64::MAX);
        assert_eq!(signals[1].streams, 1);
    }

    fn campaign(name: &str, users: f64, premium: f64) -> CampaignRecord {
        CampaignRecord {
            campaign: name.to_string(),
            target_region: "Europe".into(),
            target_genre: "Pop".into(),
            month: "2024-01".parse().unwrap(),
            net_user_gain: 100,
            user_growth_pct: users,
            premium_growth_pct: premium,
        }
    }

    #[test]
    fn verdicts_follow_thresholds() {
        let records = [
            campaign("Wrapped", 12.0, 6.0),
            campaign("Wrapped", 14.0, 8.0),
            campaign("Duo", 15.0, 1.0),
            campaign("Podcasts", 2.0, 9.0),
            campaign("Radio", 1.0, 1.0),
        ];
        let assessed = assess_campaigns(&records, &Thresholds::default());
        let verdicts: Vec<(&str, Verdict)> = assessed
            .iter()
            .map(|a| (a.campaign.as_str(), a.verdict))
            .collect();
        assert_eq!(
            verdicts,
            [
                ("Duo", Verdict::MonetizationGap),
                ("Podcasts", Verdict::NicheConverter),
                ("Radio", Verdict::Reassess),
                ("Wrapped", Verdict::ScaleCandidate),
            ]
        );
        assert_eq!(assessed[3].user_growth_pct, 13.0);
    }
}
