// THEORY:
// Density values are unbounded reals, but a heatmap needs a small, ordered set of
// severity levels to colour by. `DensityTier` is that ladder: six tiers with
// fixed thresholds at 0, 1, 2, 3, 4 and 5. A value belongs to the highest tier
// whose threshold it reaches. Colours attached to each tier are presentation
// hints for renderers; nothing numeric depends on them.

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Ordered severity tiers for a density value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DensityTier {
    None,
    Low,
    MediumLow,
    Medium,
    MediumHigh,
    High,
}

impl DensityTier {
    /// Tiers in ascending order.
    pub const ALL: [DensityTier; 6] = [
        DensityTier::None,
        DensityTier::Low,
        DensityTier::MediumLow,
        DensityTier::Medium,
        DensityTier::MediumHigh,
        DensityTier::High,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The lowest density that falls into this tier.
    pub fn threshold(&self) -> f64 {
        self.index() as f64
    }

    pub fn label(&self) -> &'static str {
        match self {
            DensityTier::None => "None",
            DensityTier::Low => "Low",
            DensityTier::MediumLow => "Medium-Low",
            DensityTier::Medium => "Medium",
            DensityTier::MediumHigh => "Medium-High",
            DensityTier::High => "High",
        }
    }

    /// Overlay colour; alpha grows with severity and the empty tier is transparent.
    pub fn color(&self) -> Rgba<u8> {
        match self {
            DensityTier::None => Rgba([0, 0, 255, 0]),
            DensityTier::Low => Rgba([0, 255, 255, 77]),
            DensityTier::MediumLow => Rgba([0, 255, 0, 102]),
            DensityTier::Medium => Rgba([255, 255, 0, 128]),
            DensityTier::MediumHigh => Rgba([255, 165, 0, 153]),
            DensityTier::High => Rgba([255, 0, 0, 179]),
        }
    }
}

/// Tier of cells counted as hotspots.
pub const HOTSPOT_TIER: DensityTier = DensityTier::MediumHigh;

/// Maps a density value to its tier.
///
/// Anything below the `Low` threshold (including exactly 0, negatives and NaN)
/// is `None`.
pub fn classify_density(value: f64) -> DensityTier {
    DensityTier::ALL
        .into_iter()
        .rev()
        .find(|tier| value >= tier.threshold())
        .unwrap_or(DensityTier::None)
}

/// One row of a heatmap legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub tier: DensityTier,
    pub label: &'static str,
    pub threshold: f64,
    /// RGBA colour components.
    pub color: [u8; 4],
}

/// Legend rows for every tier, lowest first.
pub fn legend() -> Vec<LegendEntry> {
    DensityTier::ALL
        .into_iter()
        .map(|tier| LegendEntry {
            tier,
            label: tier.label(),
            threshold: tier.threshold(),
            color: tier.color().0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_matches_thresholds() {
        assert_eq!(classify_density(0.0), DensityTier::None);
        assert_eq!(classify_density(0.999), DensityTier::None);
        assert_eq!(classify_density(1.0), DensityTier::Low);
        assert_eq!(classify_density(2.5), DensityTier::MediumLow);
        assert_eq!(classify_density(3.0), DensityTier::Medium);
        assert_eq!(classify_density(4.0), DensityTier::MediumHigh);
        assert_eq!(classify_density(5.5), DensityTier::High);
        assert_eq!(classify_density(1e6), DensityTier::High);
    }

    #[test]
    fn classify_degenerate_inputs() {
        assert_eq!(classify_density(-3.0), DensityTier::None);
        assert_eq!(classify_density(f64::NAN), DensityTier::None);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(DensityTier::None < DensityTier::Low);
        assert!(DensityTier::MediumHigh < DensityTier::High);
        assert_eq!(DensityTier::High.index(), 5);
        assert_eq!(HOTSPOT_TIER.threshold(), 4.0);
    }

    #[test]
    fn legend_lists_every_tier() {
        let legend = legend();
        assert_eq!(legend.len(), 6);
        assert_eq!(legend[0].label, "None");
        assert_eq!(legend[0].color[3], 0);
        assert_eq!(legend[5].label, "High");
        assert_eq!(legend[5].color, [255, 0, 0, 179]);
        assert!(legend.windows(2).all(|w| w[0].threshold < w[1].threshold));
    }
}
