use spotify_dashboard::data::filter::{filtered_indices, CampaignFilter, ListeningFilter};
use spotify_dashboard::data::insight::Thresholds;
use spotify_dashboard::data::{
    CampaignDataset, Dimension, ListeningDataset, Metric, SubscriptionTier,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Streaming,
    Campaigns,
}

/// Widget selections local to single charts on the streaming page.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingView {
    pub top_artists: usize,
    /// Genre shown in the market-signal table.
    pub market_genre: Option<String>,
    pub drill_country: Option<String>,
    /// Restrict the monthly trend to one tier (`None` = all tiers).
    pub trend_tier: Option<SubscriptionTier>,
    pub engagement: Metric,
}

impl StreamingView {
    fn new(top_artists: usize) -> Self {
        StreamingView {
            top_artists,
            market_genre: None,
            drill_country: None,
            trend_tier: None,
            engagement: Metric::Streams,
        }
    }
}

/// The full UI state of one session, independent of rendering.
pub struct AppState {
    /// Listening table, loaded at startup.
    pub listening: ListeningDataset,

    /// Campaign table, if one was configured or opened.
    pub campaigns: Option<CampaignDataset>,

    pub filters: ListeningFilter,
    pub campaign_filters: CampaignFilter,

    /// Indices of listening records passing `filters` (cached).
    pub visible: Vec<usize>,

    /// Indices of campaign records passing `campaign_filters` (cached).
    pub visible_campaigns: Vec<usize>,

    pub page: Page,
    pub streaming: StreamingView,
    pub thresholds: Thresholds,

    /// One colour per genre, shared by every chart.
    pub genre_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(
        listening: ListeningDataset,
        campaigns: Option<CampaignDataset>,
        top_artists: usize,
    ) -> Self {
        let mut state = AppState {
            visible: (0..listening.len()).collect(),
            genre_colors: ColorMap::new(listening.values(Dimension::Genre)),
            listening,
            campaigns: None,
            filters: ListeningFilter::default(),
            campaign_filters: CampaignFilter::default(),
            visible_campaigns: Vec::new(),
            page: Page::default(),
            streaming: StreamingView::new(top_artists),
            thresholds: Thresholds::default(),
            status_message: None,
        };
        if let Some(campaigns) = campaigns {
            state.set_campaigns(campaigns);
        }
        state
    }

    /// Replace the listening table; filters and chart selections reset.
    pub fn set_listening(&mut self, dataset: ListeningDataset) {
        self.genre_colors = ColorMap::new(dataset.values(Dimension::Genre));
        self.listening = dataset;
        self.filters.reset();
        self.streaming = StreamingView::new(self.streaming.top_artists);
        self.refilter();
        self.status_message = None;
    }

    pub fn set_campaigns(&mut self, dataset: CampaignDataset) {
        self.visible_campaigns = (0..dataset.len()).collect();
        self.campaigns = Some(dataset);
        self.campaign_filters.reset();
        self.status_message = None;
    }

    /// Recompute `visible` after a filter change.
    pub fn refilter(&mut self) {
        self.visible = filtered_indices(&self.listening, &self.filters);
        log::debug!(
            "listening filter {:?} → {} of {} records",
            self.filters,
            self.visible.len(),
            self.listening.len()
        );
    }

    /// Recompute `visible_campaigns` after a filter change.
    pub fn refilter_campaigns(&mut self) {
        if let Some(ds) = &self.campaigns {
            self.visible_campaigns = filtered_indices(ds, &self.campaign_filters);
            log::debug!(
                "campaign filter {:?} → {} of {} records",
                self.campaign_filters,
                self.visible_campaigns.len(),
                ds.len()
            );
        }
    }
}
