//! Air-quality scores on a 0-10 scale (higher means more polluted)
//!
//! Measured scores come from hourly pollutant concentrations. When a
//! location has none, a PM2.5 proxy is estimated from the weather averages
//! plus random noise; it is a heuristic, not a physical model.

use rand::{Rng, RngExt};
use rand_distr::{Distribution, StandardNormal};

use crate::weather::weatherapi::AirQuality;

/// Concentration mapped to the top of the scale, per pollutant
pub const POLLUTANT_LIMITS: [(&str, f64); 6] = [
    ("co", 1000.0),
    ("no2", 200.0),
    ("o3", 200.0),
    ("so2", 50.0),
    ("pm2_5", 25.0),
    ("pm10", 50.0),
];

const PM_PROXY_MEAN: f64 = 12.0;
const PM_PROXY_STD: f64 = 10.0;
const PM_PROXY_MAX: f64 = 200.0;
const PM25_BAD_THRESHOLD: f64 = 25.0;
const MEASURED_JITTER: f64 = 0.3;
const ESTIMATED_JITTER: f64 = 1.5;

/// Result of the proxy estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirEstimate {
    /// Score in [0, 10]
    pub avg_air: f64,
    /// Estimated PM2.5 in µg/m³, in [0, 200]
    pub pm_proxy: f64,
}

/// Mean of the per-pollutant scores for one record; a missing pollutant counts as 0
#[must_use]
pub fn hourly_air_score(air: &AirQuality) -> f64 {
    let values = [air.co, air.no2, air.o3, air.so2, air.pm2_5, air.pm10];
    let total: f64 = values
        .iter()
        .zip(POLLUTANT_LIMITS.iter())
        .map(|(value, (_, limit))| (value.unwrap_or(0.0) / limit * 10.0).min(10.0))
        .sum();
    total / POLLUTANT_LIMITS.len() as f64
}

/// Average the hourly scores and add a small jitter so that cities with
/// identical readings do not end up with identical values.
///
/// Returns `None` when no record carries pollutant data.
pub fn measured_air_score<'a, R, I>(records: I, rng: &mut R) -> Option<f64>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a AirQuality>,
{
    let scores: Vec<f64> = records
        .into_iter()
        .filter(|air| !air.is_empty())
        .map(hourly_air_score)
        .collect();

    if scores.is_empty() {
        return None;
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let jitter = rng.random_range(-MEASURED_JITTER..=MEASURED_JITTER);
    Some((mean + jitter).clamp(0.0, 10.0))
}

/// Estimate an air score from weather averages when no measurement exists.
///
/// Wind lowers the proxy, heat above 20°C raises it and humidity lowers it
/// slightly.
pub fn estimate_air_quality<R: Rng + ?Sized>(
    avg_temp: f64,
    avg_wind: f64,
    avg_humidity: f64,
    rng: &mut R,
) -> AirEstimate {
    let z: f64 = StandardNormal.sample(rng);
    let baseline = PM_PROXY_MEAN + PM_PROXY_STD * z;

    let pm_proxy = (baseline + avg_wind * -0.15 + (avg_temp - 20.0) * 0.4 - avg_humidity * 0.02)
        .clamp(0.0, PM_PROXY_MAX);

    let estimated = (pm_proxy / PM25_BAD_THRESHOLD * 10.0).min(10.0);
    let jitter = rng.random_range(-ESTIMATED_JITTER..=ESTIMATED_JITTER);

    AirEstimate {
        avg_air: (estimated + jitter).clamp(0.0, 10.0),
        pm_proxy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    fn full_limits() -> AirQuality {
        AirQuality {
            co: Some(1000.0),
            no2: Some(200.0),
            o3: Some(200.0),
            so2: Some(50.0),
            pm2_5: Some(25.0),
            pm10: Some(50.0),
        }
    }

    #[test]
    fn test_hourly_score_at_limits_is_ten() {
        assert_eq!(hourly_air_score(&full_limits()), 10.0);
    }

    #[test]
    fn test_hourly_score_caps_each_pollutant() {
        let air = AirQuality {
            pm2_5: Some(2500.0),
            ..AirQuality::default()
        };
        // one pollutant capped at 10, the other five count as 0
        assert!((hourly_air_score(&air) - 10.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_measured_score_ignores_empty_records() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = [AirQuality::default(), full_limits()];
        let score = measured_air_score(records.iter(), &mut rng).unwrap();
        assert!((9.7..=10.0).contains(&score));
    }

    #[test]
    fn test_measured_score_none_without_data() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = [AirQuality::default()];
        assert_eq!(measured_air_score(records.iter(), &mut rng), None);
    }

    #[rstest]
    #[case(-5.0, 0.0, 10.0)]
    #[case(35.0, 0.0, 100.0)]
    #[case(20.0, 60.0, 50.0)]
    #[case(-40.0, 150.0, 100.0)]
    #[case(60.0, 0.0, 0.0)]
    fn test_estimate_stays_in_bounds(#[case] temp: f64, #[case] wind: f64, #[case] humidity: f64) {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let estimate = estimate_air_quality(temp, wind, humidity, &mut rng);
            assert!((0.0..=10.0).contains(&estimate.avg_air), "{estimate:?}");
            assert!((0.0..=200.0).contains(&estimate.pm_proxy), "{estimate:?}");
        }
    }

    #[test]
    fn test_estimate_is_reproducible_with_same_seed() {
        let a = estimate_air_quality(28.0, 15.0, 70.0, &mut StdRng::seed_from_u64(3));
        let b = estimate_air_quality(28.0, 15.0, 70.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hot_still_air_scores_worse_than_cold_windy_air() {
        let mut hot = StdRng::seed_from_u64(11);
        let mut cold = StdRng::seed_from_u64(11);
        let mut hot_total = 0.0;
        let mut cold_total = 0.0;
        for _ in 0..200 {
            hot_total += estimate_air_quality(38.0, 0.0, 20.0, &mut hot).pm_proxy;
            cold_total += estimate_air_quality(-5.0, 60.0, 90.0, &mut cold).pm_proxy;
        }
        assert!(hot_total > cold_total);
    }
}
