use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use crate::data::{CampaignRecord, ListeningRecord, Month, SubscriptionTier};

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Csv,
    Json,
    Parquet,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Parquet => "parquet",
        }
    }
}

// ---------------------------------------------------------------------------
// Deterministic generator
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const ARTISTS: [(&str, &str); 14] = [
    ("Nova Lane", "Pop"),
    ("The Midnight Run", "Rock"),
    ("Lil Sosa", "Hip-Hop"),
    ("Kairo", "Hip-Hop"),
    ("Sol y Mar", "Latin"),
    ("Bad Luna", "Latin"),
    ("Pulsewave", "Electronic"),
    ("Neon Drift", "Electronic"),
    ("SEOUL9", "K-Pop"),
    ("Starlight Crew", "K-Pop"),
    ("Ivy Hart", "Pop"),
    ("Maya Bloom", "Pop"),
    ("Granite", "Rock"),
    ("Echo Park", "Indie"),
];

const MARKETS: [(&str, &str); 17] = [
    ("United States", "North America"),
    ("Canada", "North America"),
    ("Mexico", "LATAM"),
    ("Brazil", "LATAM"),
    ("Argentina", "LATAM"),
    ("Colombia", "LATAM"),
    ("Germany", "Europe"),
    ("United Kingdom", "Europe"),
    ("France", "Europe"),
    ("Sweden", "Europe"),
    ("Japan", "APAC"),
    ("India", "APAC"),
    ("Australia", "APAC"),
    ("South Korea", "APAC"),
    ("United Arab Emirates", "MENA"),
    ("Egypt", "MENA"),
    ("Saudi Arabia", "MENA"),
];

const CAMPAIGNS: [(&str, &str, &str); 6] = [
    ("Wrapped Push", "Europe", "Pop"),
    ("Student Premium", "North America", "Hip-Hop"),
    ("Duo Launch", "LATAM", "Latin"),
    ("K-Pop Spotlight", "APAC", "K-Pop"),
    ("Podcast Weeks", "Europe", "Indie"),
    ("Summer Beats", "MENA", "Electronic"),
];

const YEAR: i32 = 2024;

fn month(m: u8) -> Month {
    Month::new(YEAR, m).unwrap_or_else(|| unreachable!("month {m} out of range"))
}

/// Synthetic listening table: every month × market × tier, three artists each.
pub fn listening_records(seed: u64) -> Vec<ListeningRecord> {
    let mut rng = SimpleRng::new(seed);
    let mut records = Vec::new();

    for m in 1..=12u8 {
        // Mild seasonality: summer and December peaks.
        let season = 1.0 + 0.15 * ((f64::from(m) - 1.0) / 12.0 * 2.0 * std::f64::consts::PI).sin()
            + if m == 12 { 0.2 } else { 0.0 };

        for (country, region) in MARKETS {
            for tier in SubscriptionTier::ALL {
                let tier_factor = match tier {
                    SubscriptionTier::Free => 1.0,
                    SubscriptionTier::Premium => 1.6,
                };
                for _ in 0..3 {
                    let (artist, genre) = ARTISTS[rng.below(ARTISTS.len())];
                    let base = 40_000.0 * season * tier_factor;
                    let streams = rng.gauss(base, base * 0.25).max(500.0).round() as u64;
                    let listeners_ratio = rng.gauss(0.12, 0.03).clamp(0.02, 0.5);
                    let completion = match tier {
                        SubscriptionTier::Free => rng.gauss(0.62, 0.08),
                        SubscriptionTier::Premium => rng.gauss(0.78, 0.06),
                    };

                    records.push(ListeningRecord {
                        artist: artist.to_string(),
                        genre: genre.to_string(),
                        region: region.to_string(),
                        country: country.to_string(),
                        tier,
                        month: month(m),
                        streams,
                        active_listeners: (streams as f64 * listeners_ratio).round() as u64,
                        completion_rate: Some((completion.clamp(0.0, 1.0) * 1000.0).round() / 1000.0),
                    });
                }
            }
        }
    }
    records
}

/// Synthetic campaign table: each campaign runs for six consecutive months.
pub fn campaign_records(seed: u64) -> Vec<CampaignRecord> {
    let mut rng = SimpleRng::new(seed.wrapping_add(1));
    let mut records = Vec::new();

    for (i, (name, region, genre)) in CAMPAIGNS.iter().enumerate() {
        let strength = rng.gauss(1.0, 0.6);
        let start = 1 + (i as u8 % 7);
        for m in start..start + 6 {
            let user_growth = rng.gauss(8.0 * strength, 4.0);
            records.push(CampaignRecord {
                campaign: name.to_string(),
                target_region: region.to_string(),
                target_genre: genre.to_string(),
                month: month(m),
                net_user_gain: rng.gauss(12_000.0 * strength, 6_000.0).round() as i64,
                user_growth_pct: (user_growth * 10.0).round() / 10.0,
                premium_growth_pct: (rng.gauss(4.0 * strength, 2.5) * 10.0).round() / 10.0,
            });
        }
    }
    records
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ListeningRow<'a> {
    artist_name: &'a str,
    genre: &'a str,
    region: &'a str,
    country: &'a str,
    subscription_type: SubscriptionTier,
    month: String,
    streams: u64,
    active_listeners: u64,
    completion_rate: Option<f64>,
}

impl<'a> From<&'a ListeningRecord> for ListeningRow<'a> {
    fn from(r: &'a ListeningRecord) -> Self {
        ListeningRow {
            artist_name: &r.artist,
            genre: &r.genre,
            region: &r.region,
            country: &r.country,
            subscription_type: r.tier,
            month: r.month.to_string(),
            streams: r.streams,
            active_listeners: r.active_listeners,
            completion_rate: r.completion_rate,
        }
    }
}

#[derive(Serialize)]
struct CampaignRow<'a> {
    campaign_name: &'a str,
    target_region: &'a str,
    target_genre: &'a str,
    month: String,
    net_user_gain: i64,
    user_growth_pct: f64,
    premium_growth_pct: f64,
}

impl<'a> From<&'a CampaignRecord> for CampaignRow<'a> {
    fn from(r: &'a CampaignRecord) -> Self {
        CampaignRow {
            campaign_name: &r.campaign,
            target_region: &r.target_region,
            target_genre: &r.target_genre,
            month: r.month.to_string(),
            net_user_gain: r.net_user_gain,
            user_growth_pct: r.user_growth_pct,
            premium_growth_pct: r.premium_growth_pct,
        }
    }
}

type Column = (&'static str, DataType, bool, ArrayRef);

pub fn write_listening(path: &Path, records: &[ListeningRecord], format: Format) -> Result<()> {
    let rows: Vec<ListeningRow> = records.iter().map(ListeningRow::from).collect();
    match format {
        Format::Csv => write_csv(path, &rows),
        Format::Json => write_json(path, &rows),
        Format::Parquet => write_parquet(
            path,
            vec![
                ("artist_name", DataType::Utf8, false, strings(&rows, |r| r.artist_name)),
                ("genre", DataType::Utf8, false, strings(&rows, |r| r.genre)),
                ("region", DataType::Utf8, false, strings(&rows, |r| r.region)),
                ("country", DataType::Utf8, false, strings(&rows, |r| r.country)),
                (
                    "subscription_type",
                    DataType::Utf8,
                    false,
                    strings(&rows, |r| r.subscription_type.as_str()),
                ),
                ("month", DataType::Utf8, false, strings(&rows, |r| r.month.as_str())),
                ("streams", DataType::Int64, false, ints(&rows, |r| r.streams as i64)),
                (
                    "active_listeners",
                    DataType::Int64,
                    false,
                    ints(&rows, |r| r.active_listeners as i64),
                ),
                (
                    "completion_rate",
                    DataType::Float64,
                    true,
                    floats(&rows, |r| r.completion_rate),
                ),
            ],
        ),
    }
}

pub fn write_campaigns(path: &Path, records: &[CampaignRecord], format: Format) -> Result<()> {
    let rows: Vec<CampaignRow> = records.iter().map(CampaignRow::from).collect();
    match format {
        Format::Csv => write_csv(path, &rows),
        Format::Json => write_json(path, &rows),
        Format::Parquet => write_parquet(
            path,
            vec![
                ("campaign_name", DataType::Utf8, false, strings(&rows, |r| r.campaign_name)),
                ("target_region", DataType::Utf8, false, strings(&rows, |r| r.target_region)),
                ("target_genre", DataType::Utf8, false, strings(&rows, |r| r.target_genre)),
                ("month", DataType::Utf8, false, strings(&rows, |r| r.month.as_str())),
                ("net_user_gain", DataType::Int64, false, ints(&rows, |r| r.net_user_gain)),
                (
                    "user_growth_pct",
                    DataType::Float64,
                    false,
                    floats(&rows, |r| Some(r.user_growth_pct)),
                ),
                (
                    "premium_growth_pct",
                    DataType::Float64,
                    false,
                    floats(&rows, |r| Some(r.premium_growth_pct)),
                ),
            ],
        ),
    }
}

// -- Arrow column helpers --

fn strings<'a, T>(rows: &'a [T], f: impl Fn(&'a T) -> &'a str) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<&str>>()))
}

fn ints<T>(rows: &[T], f: impl Fn(&T) -> i64) -> ArrayRef {
    Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<i64>>()))
}

fn floats<T>(rows: &[T], f: impl Fn(&T) -> Option<f64>) -> ArrayRef {
    Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<Option<f64>>>()))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    serde_json::to_writer_pretty(create(path)?, rows).context("writing JSON")?;
    Ok(())
}

fn write_parquet(path: &Path, columns: Vec<Column>) -> Result<()> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns
        .into_iter()
        .map(|(name, data_type, nullable, array)| (Field::new(name, data_type, nullable), array))
        .unzip();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
