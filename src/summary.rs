//! Environmental summary document
//!
//! Builds twelve monthly series (temperature, humidity, AQI, PM2.5, fire
//! hotspots, precipitation) from a seeded generator, computes descriptive
//! statistics for each one and renders a standalone HTML document with a
//! narrative paragraph, a statistics table and a line chart per series.

use std::fmt::Write as _;
use std::f64::consts::PI;

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use serde::Serialize;

use crate::{CityScienceError, Result};

const MONTHS: usize = 12;

/// Summary statistics of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    /// Sample standard deviation, 0 for fewer than two values
    pub std: f64,
    pub amplitude: f64,
    /// Full month name of the first maximum
    pub max_month: String,
    /// Full month name of the first minimum
    pub min_month: String,
}

impl SeriesStats {
    /// `None` when `values` is empty or does not line up with `dates`
    #[must_use]
    pub fn compute(values: &[f64], dates: &[NaiveDate]) -> Option<Self> {
        if values.is_empty() || values.len() != dates.len() {
            return None;
        }

        let (mut idx_max, mut idx_min) = (0, 0);
        for (i, value) in values.iter().enumerate() {
            if *value > values[idx_max] {
                idx_max = i;
            }
            if *value < values[idx_min] {
                idx_min = i;
            }
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() < 2 {
            0.0
        } else {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        };

        Some(Self {
            max: values[idx_max],
            min: values[idx_min],
            mean,
            std,
            amplitude: values[idx_max] - values[idx_min],
            max_month: dates[idx_max].format("%B").to_string(),
            min_month: dates[idx_min].format("%B").to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    AirQualityIndex,
    Pm25,
    FireHotspots,
    Precipitation,
}

impl Metric {
    pub const ALL: [Self; 6] = [
        Self::Temperature,
        Self::Humidity,
        Self::AirQualityIndex,
        Self::Pm25,
        Self::FireHotspots,
        Self::Precipitation,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::AirQualityIndex => "Air Quality Index",
            Self::Pm25 => "PM2.5",
            Self::FireHotspots => "Fire Hotspots",
            Self::Precipitation => "Precipitation",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::AirQualityIndex => "AQI",
            Self::Pm25 => "µg/m³",
            Self::FireHotspots => "hotspots",
            Self::Precipitation => "mm",
        }
    }
}

/// One monthly series with its statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySeries {
    pub metric: Metric,
    pub values: Vec<f64>,
    pub stats: SeriesStats,
}

impl MonthlySeries {
    /// Narrative paragraph as (bold lead, body)
    #[must_use]
    pub fn narrative(&self) -> (&'static str, String) {
        let s = &self.stats;
        let unit = self.metric.unit();
        match self.metric {
            Metric::Temperature => (
                "Temperature shows a clear seasonal pattern.",
                format!(
                    "The series peaked at {:.1} {unit} in {} and dropped to a low of {:.1} {unit} in {}, an amplitude of {:.1} {unit}. The average was {:.1} {unit} (σ={:.1}), indicating notable differences between seasons.",
                    s.max, s.max_month, s.min, s.min_month, s.amplitude, s.mean, s.std
                ),
            ),
            Metric::Humidity => (
                "Humidity measurements follow recurring cycles with distinct highs and lows.",
                format!(
                    "The series reached a maximum of {:.1} {unit} in {} and a minimum of {:.1} {unit} in {}. With a mean of {:.1} {unit} (σ={:.1}), these values help identify periods relevant for agriculture and water management.",
                    s.max, s.max_month, s.min, s.min_month, s.mean, s.std
                ),
            ),
            Metric::AirQualityIndex => (
                "Air Quality (AQI) summary.",
                format!(
                    "The series peaked at {:.1} {unit} in {} and fell to {:.1} {unit} in {}. The mean was {:.1} {unit} (σ={:.1}), indicating periods that should be correlated with local emission sources and meteorology.",
                    s.max, s.max_month, s.min, s.min_month, s.mean, s.std
                ),
            ),
            Metric::Pm25 => (
                "PM2.5 concentration summary.",
                format!(
                    "The series reached {:.1} {unit} in {} and a minimum of {:.1} {unit} in {}. Mean {:.1} {unit} (σ={:.1}). Elevated PM2.5 episodes may impact public health and merit targeted mitigation.",
                    s.max, s.max_month, s.min, s.min_month, s.mean, s.std
                ),
            ),
            Metric::FireHotspots => (
                "Fire hotspots summary.",
                format!(
                    "The series shows a peak of {} {unit} in {} and a low of {} in {}. Average {:.1} {unit} (σ={:.1}). These patterns help identify high-risk months for fire prevention.",
                    s.max as i64, s.max_month, s.min as i64, s.min_month, s.mean, s.std
                ),
            ),
            Metric::Precipitation => (
                "Precipitation summary.",
                format!(
                    "The series recorded a maximum monthly total of {:.1} {unit} in {} and a minimum of {:.1} {unit} in {}. Mean {:.1} {unit} (σ={:.1}). Precipitation seasonality is important for hydrology and fire-risk analysis.",
                    s.max, s.max_month, s.min, s.min_month, s.mean, s.std
                ),
            ),
        }
    }
}

/// Complete summary for one location and year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentalSummary {
    pub location: String,
    /// Year the series cover
    pub year: i32,
    pub months: Vec<NaiveDate>,
    pub series: Vec<MonthlySeries>,
}

/// `n` evenly spaced values from `start` to `end` inclusive
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Last day of every month of `year`
pub fn month_ends(year: i32) -> Result<Vec<NaiveDate>> {
    (1..=12u32)
        .map(|month| {
            let next = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)
            };
            next.and_then(|d| d.pred_opt())
                .ok_or_else(|| CityScienceError::general(format!("Invalid year {year}")))
        })
        .collect()
}

fn noise<R: Rng + ?Sized>(rng: &mut R, std: f64) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    std * z
}

/// Synthesize the six monthly series for `year`
pub fn synthesize<R: Rng + ?Sized>(location: &str, year: i32, rng: &mut R) -> Result<EnvironmentalSummary> {
    let months = month_ends(year)?;
    let full_cycle = linspace(0.0, 2.0 * PI, MONTHS);

    let temperature: Vec<f64> = full_cycle
        .iter()
        .map(|x| 30.0 + 20.0 * x.sin() + noise(rng, 3.0))
        .collect();
    let humidity: Vec<f64> = full_cycle
        .iter()
        .map(|x| 60.0 + 20.0 * x.cos() + noise(rng, 5.0))
        .collect();
    let aqi: Vec<f64> = linspace(0.5, 2.5 * PI, MONTHS)
        .iter()
        .map(|x| 50.0 + 15.0 * x.sin() + noise(rng, 6.0))
        .collect();
    let pm25: Vec<f64> = full_cycle
        .iter()
        .map(|x| 8.0 + 12.0 * x.sin().abs() + noise(rng, 2.0))
        .collect();

    // dry months carry a higher hotspot rate
    let mut fire_hotspots = Vec::with_capacity(MONTHS);
    for x in linspace(-0.3, 2.0, MONTHS) {
        let dry = if x.sin() > 0.0 { 1.0 } else { 0.0 };
        let poisson = Poisson::new(1.5 + 4.0 * dry)
            .map_err(|e| CityScienceError::general(format!("Invalid hotspot rate: {e}")))?;
        let count: f64 = poisson.sample(rng);
        fire_hotspots.push(count);
    }

    let precipitation: Vec<f64> = full_cycle
        .iter()
        .map(|x| 120.0 * x.cos().clamp(0.0, 1.0) + noise(rng, 10.0))
        .collect();

    let series = Metric::ALL
        .into_iter()
        .zip([temperature, humidity, aqi, pm25, fire_hotspots, precipitation])
        .map(|(metric, values)| {
            let stats = SeriesStats::compute(&values, &months).ok_or_else(|| {
                CityScienceError::general(format!("No values for {}", metric.title()))
            })?;
            Ok(MonthlySeries {
                metric,
                values,
                stats,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EnvironmentalSummary {
        location: location.to_string(),
        year,
        months,
        series,
    })
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Inline SVG line chart, one point per month
fn svg_chart(values: &[f64]) -> String {
    const WIDTH: f64 = 640.0;
    const HEIGHT: f64 = 240.0;
    const PAD: f64 = 24.0;

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let step = if values.len() > 1 {
        (WIDTH - 2.0 * PAD) / (values.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = PAD + step * i as f64;
            let y = HEIGHT - PAD - (v - min) / span * (HEIGHT - 2.0 * PAD);
            format!("{x:.1},{y:.1}")
        })
        .collect();

    format!(
        r##"<svg width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}"><polyline fill="none" stroke="#1f77b4" stroke-width="2" points="{}"/></svg>"##,
        points.join(" ")
    )
}

impl EnvironmentalSummary {
    /// Render the standalone HTML document
    #[must_use]
    pub fn to_html(&self, generated_at: NaiveDateTime) -> String {
        let location = escape_html(&self.location);
        let mut html = String::new();

        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Environmental Bulletin {year} - {location}</title>
<style>
body {{ font-family: Calibri, Arial, sans-serif; font-size: 11pt; max-width: 820px; margin: auto; }}
h1, .meta {{ text-align: center; }}
table {{ border-collapse: collapse; margin: 8px 0; }}
td, th {{ border: 1px solid #ccc; padding: 4px 8px; text-align: right; }}
footer {{ text-align: right; margin-top: 24px; }}
</style>
</head>
<body>
<h1>Environmental Bulletin {year}</h1>
<p class="meta"><em>City Science</em><br>
Data source: City Science sensors and external datasets (e.g. MODIS). Location: {location}<br>
<em>Extracted from: NASA Database</em></p>
"#,
            year = self.year,
        );

        for series in &self.series {
            let (lead, body) = series.narrative();
            let s = &series.stats;
            let _ = write!(
                html,
                r#"<section>
<h2>{title} ({unit})</h2>
<p><strong>{lead}</strong> {body}</p>
<table>
<tr><th>Max</th><th>Min</th><th>Mean</th><th>Std dev</th><th>Amplitude</th><th>Peak month</th><th>Low month</th></tr>
<tr><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td><td>{}</td></tr>
</table>
{chart}
</section>
"#,
                s.max,
                s.min,
                s.mean,
                s.std,
                s.amplitude,
                s.max_month,
                s.min_month,
                title = series.metric.title(),
                unit = series.metric.unit(),
                body = escape_html(&body),
                chart = svg_chart(&series.values),
            );
        }

        let _ = write!(
            html,
            "<footer>Generated: {}</footer>\n</body>\n</html>\n",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dates(n: usize) -> Vec<NaiveDate> {
        month_ends(2024).unwrap().into_iter().take(n).collect()
    }

    #[test]
    fn test_stats_basic() {
        let stats = SeriesStats::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], &dates(8)).unwrap();
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.amplitude, 7.0);
        assert!((stats.std - 2.138_089_935).abs() < 1e-6);
        assert_eq!(stats.max_month, "August");
        assert_eq!(stats.min_month, "January");
    }

    #[test]
    fn test_stats_first_occurrence_wins() {
        let stats = SeriesStats::compute(&[1.0, 3.0, 3.0, 1.0], &dates(4)).unwrap();
        assert_eq!(stats.max_month, "February");
        assert_eq!(stats.min_month, "January");
    }

    #[test]
    fn test_stats_single_value_has_zero_std() {
        let stats = SeriesStats::compute(&[4.2], &dates(1)).unwrap();
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.amplitude, 0.0);
    }

    #[test]
    fn test_stats_rejects_empty_or_mismatched() {
        assert!(SeriesStats::compute(&[], &[]).is_none());
        assert!(SeriesStats::compute(&[1.0, 2.0], &dates(3)).is_none());
    }

    #[test]
    fn test_month_ends_handles_leap_year() {
        let ends = month_ends(2024).unwrap();
        assert_eq!(ends.len(), 12);
        assert_eq!(ends[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(ends[11], NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_synthesize_is_reproducible() {
        let a = synthesize("Fortaleza - CE, Brazil", 2024, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = synthesize("Fortaleza - CE, Brazil", 2024, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.series.len(), 6);
        for series in &a.series {
            assert_eq!(series.values.len(), 12);
        }
    }

    #[test]
    fn test_hotspots_are_non_negative_counts() {
        let summary = synthesize("x", 2024, &mut StdRng::seed_from_u64(5)).unwrap();
        let fires = summary
            .series
            .iter()
            .find(|s| s.metric == Metric::FireHotspots)
            .unwrap();
        for value in &fires.values {
            assert!(*value >= 0.0);
            assert_eq!(value.fract(), 0.0);
        }
    }

    #[test]
    fn test_html_document_structure() {
        let summary = synthesize("Fortaleza <CE>", 2024, &mut StdRng::seed_from_u64(1)).unwrap();
        let generated = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let html = summary.to_html(generated);

        assert!(html.contains("<title>Environmental Bulletin 2024 - Fortaleza &lt;CE&gt;</title>"));
        assert!(html.contains("<h1>Environmental Bulletin 2024</h1>"));
        assert!(html.contains("Location: Fortaleza &lt;CE&gt;"));
        assert_eq!(html.matches("<section>").count(), 6);
        assert_eq!(html.matches("<svg ").count(), 6);
        assert!(html.contains("Temperature shows a clear seasonal pattern."));
        assert!(html.contains("<footer>Generated: 2025-03-01 09:30:00</footer>"));
    }
}
