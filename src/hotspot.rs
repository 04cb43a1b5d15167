//! Disease hotspot styling for the barangay map.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::HeatmapPoint;
use crate::pipeline::refine::{refine, Refinement};
use crate::pipeline::query::{SortOrder, SortSpec};

/// Map center over Calauan, Laguna.
pub const MAP_CENTER: (f64, f64) = (14.1706, 121.2436);
pub const MAP_ZOOM: u8 = 13;

pub const MIN_RADIUS: f64 = 25.0;
pub const MAX_RADIUS: f64 = 80.0;

/// Sick-rate band of a barangay, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskBand {
    VeryHigh,
    High,
    MediumHigh,
    Medium,
    Low,
    VeryLow,
}

impl RiskBand {
    pub const ALL: [RiskBand; 6] = [
        RiskBand::VeryHigh,
        RiskBand::High,
        RiskBand::MediumHigh,
        RiskBand::Medium,
        RiskBand::Low,
        RiskBand::VeryLow,
    ];

    /// Band of a sick rate in percent. Anything below 10, including negative
    /// or NaN input, is `VeryLow`; anything from 80 up is `VeryHigh`.
    pub fn of(sick_rate: f64) -> Self {
        match sick_rate {
            r if r >= 80.0 => RiskBand::VeryHigh,
            r if r >= 60.0 => RiskBand::High,
            r if r >= 40.0 => RiskBand::MediumHigh,
            r if r >= 20.0 => RiskBand::Medium,
            r if r >= 10.0 => RiskBand::Low,
            _ => RiskBand::VeryLow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::VeryHigh => "Very High",
            RiskBand::High => "High",
            RiskBand::MediumHigh => "Medium-High",
            RiskBand::Medium => "Medium",
            RiskBand::Low => "Low",
            RiskBand::VeryLow => "Very Low",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskBand::VeryHigh => "rgba(255,0,0,0.8)",
            RiskBand::High => "rgba(255,100,0,0.8)",
            RiskBand::MediumHigh => "rgba(255,165,0,0.8)",
            RiskBand::Medium => "rgba(255,255,0,0.8)",
            RiskBand::Low => "rgba(0,255,0,0.8)",
            RiskBand::VeryLow => "rgba(0,0,255,0.8)",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            RiskBand::VeryHigh => "very-high",
            RiskBand::High => "high",
            RiskBand::MediumHigh => "medium-high",
            RiskBand::Medium => "medium",
            RiskBand::Low => "low",
            RiskBand::VeryLow => "very-low",
        }
    }

    /// Half-open `[lower, upper)` range in percent.
    pub fn range(&self) -> (f64, f64) {
        match self {
            RiskBand::VeryHigh => (80.0, f64::INFINITY),
            RiskBand::High => (60.0, 80.0),
            RiskBand::MediumHigh => (40.0, 60.0),
            RiskBand::Medium => (20.0, 40.0),
            RiskBand::Low => (10.0, 20.0),
            RiskBand::VeryLow => (f64::NEG_INFINITY, 10.0),
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskBand::ALL
            .into_iter()
            .find(|band| band.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown risk level {s:?}"))
    }
}

/// `clamp(total_patients / 3, 25, 80)`.
pub fn marker_radius(total_patients: i64) -> f64 {
    (total_patients as f64 / 3.0).clamp(MIN_RADIUS, MAX_RADIUS)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub barangay: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub band: RiskBand,
    pub color: &'static str,
    pub sick_rate: f64,
    pub total_patients: i64,
    pub sick_patients: i64,
}

impl From<&HeatmapPoint> for Marker {
    fn from(point: &HeatmapPoint) -> Self {
        let band = RiskBand::of(point.sick_rate);
        Self {
            barangay: point.barangay.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
            radius: marker_radius(point.total_patients),
            band,
            color: band.color(),
            sick_rate: point.sick_rate,
            total_patients: point.total_patients,
            sick_patients: point.sick_patients,
        }
    }
}

pub fn render_markers(points: &[HeatmapPoint]) -> Vec<Marker> {
    points.iter().map(Marker::from).collect()
}

/// Tracker page controls.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotFilter {
    pub search: String,
    /// `None` shows every band.
    pub band: Option<RiskBand>,
    pub sort: SortSpec,
}

impl Default for HotspotFilter {
    fn default() -> Self {
        Self { search: String::new(), band: None, sort: SortSpec::new("patients", SortOrder::Desc) }
    }
}

impl HotspotFilter {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn apply(&self, points: &[HeatmapPoint]) -> Vec<HeatmapPoint> {
        let banded: Vec<HeatmapPoint> = points
            .iter()
            .filter(|p| self.band.map_or(true, |band| RiskBand::of(p.sick_rate) == band))
            .cloned()
            .collect();
        let refinement = Refinement {
            search: Some(self.search.clone()),
            matches: Vec::new(),
            sort: Some(self.sort.clone()),
        };
        refine(&banded, &refinement)
    }
}

/// Headline numbers over the barangays currently shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HotspotSummary {
    pub areas: usize,
    /// Barangays at 60% or above.
    pub high_risk: usize,
    pub total_patients: i64,
    pub total_sick: i64,
    /// Whole percent.
    pub overall_rate: i64,
}

pub fn summarize(points: &[HeatmapPoint]) -> HotspotSummary {
    let total_patients: i64 = points.iter().map(|p| p.total_patients).sum();
    let total_sick: i64 = points.iter().map(|p| p.sick_patients).sum();
    let overall_rate = if total_patients > 0 {
        (total_sick as f64 / total_patients as f64 * 100.0).round() as i64
    } else {
        0
    };
    HotspotSummary {
        areas: points.len(),
        high_risk: points.iter().filter(|p| p.sick_rate >= 60.0).count(),
        total_patients,
        total_sick,
        overall_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(100.0 => RiskBand::VeryHigh)]
    #[test_case(80.0 => RiskBand::VeryHigh)]
    #[test_case(79.99 => RiskBand::High)]
    #[test_case(60.0 => RiskBand::High)]
    #[test_case(59.9 => RiskBand::MediumHigh)]
    #[test_case(40.0 => RiskBand::MediumHigh)]
    #[test_case(20.0 => RiskBand::Medium)]
    #[test_case(19.5 => RiskBand::Low)]
    #[test_case(10.0 => RiskBand::Low)]
    #[test_case(9.99 => RiskBand::VeryLow)]
    #[test_case(0.0 => RiskBand::VeryLow)]
    #[test_case(f64::NAN => RiskBand::VeryLow ; "nan")]
    #[test_case(-5.0 => RiskBand::VeryLow ; "negative")]
    fn bands(rate: f64) -> RiskBand {
        RiskBand::of(rate)
    }

    #[test]
    fn bands_partition_zero_to_hundred() {
        for step in 0..=10_000 {
            let rate = step as f64 / 100.0;
            let containing: Vec<RiskBand> = RiskBand::ALL
                .into_iter()
                .filter(|b| {
                    let (lo, hi) = b.range();
                    rate >= lo && rate < hi
                })
                .collect();
            assert_eq!(containing, vec![RiskBand::of(rate)], "rate {rate}");
        }
    }

    #[test_case(0 => 25.0)]
    #[test_case(75 => 25.0)]
    #[test_case(120 => 40.0)]
    #[test_case(240 => 80.0)]
    #[test_case(10_000 => 80.0)]
    fn radius(total: i64) -> f64 {
        marker_radius(total)
    }

    #[test]
    fn radius_is_monotonic() {
        let radii: Vec<f64> = (0..600).map(marker_radius).collect();
        assert!(radii.windows(2).all(|w| w[0] <= w[1]));
        assert!(radii.iter().all(|r| (MIN_RADIUS..=MAX_RADIUS).contains(r)));
    }

    fn point(name: &str, total: i64, sick: i64, rate: f64) -> HeatmapPoint {
        HeatmapPoint {
            barangay: name.into(),
            latitude: 14.17,
            longitude: 121.24,
            total_patients: total,
            sick_patients: sick,
            sick_rate: rate,
            disease_types: 0,
            diseases: None,
        }
    }

    #[test]
    fn filter_defaults_to_patient_count_descending() {
        let points = vec![
            point("Dayap", 10, 9, 90.0),
            point("Bangyas", 40, 4, 10.0),
            point("Imok", 25, 15, 60.0),
        ];
        let mut filter = HotspotFilter::default();
        let names: Vec<_> = filter.apply(&points).into_iter().map(|p| p.barangay).collect();
        assert_eq!(names, vec!["Bangyas", "Imok", "Dayap"]);

        filter.band = Some(RiskBand::High);
        filter.search = "im".into();
        assert_eq!(filter.apply(&points).len(), 1);

        filter.clear();
        assert_eq!(filter, HotspotFilter::default());
    }

    #[test]
    fn summary_counts_high_risk_and_rounds() {
        let points = vec![point("Dayap", 10, 9, 90.0), point("Imok", 20, 1, 5.0)];
        let summary = summarize(&points);
        assert_eq!(summary.high_risk, 1);
        assert_eq!(summary.total_patients, 30);
        assert_eq!(summary.total_sick, 10);
        assert_eq!(summary.overall_rate, 33);
        assert_eq!(summarize(&[]).overall_rate, 0);
    }

    #[test]
    fn band_keys_parse() {
        assert_eq!("medium-high".parse::<RiskBand>(), Ok(RiskBand::MediumHigh));
        assert!("extreme".parse::<RiskBand>().is_err());
    }
}
