//! Threshold-based color scale for risk values.
//!
//! Values are bucketed by the first threshold they strictly exceed,
//! scanning from the highest threshold down. Anything that exceeds no
//! threshold (zero, negatives, NaN) lands in the lowest bucket, which is
//! also the color used for departments without data.

use std::fmt;

/// Number of buckets in the risk scale.
pub const BUCKET_COUNT: usize = 6;

/// Lower bounds of each bucket, ascending.
pub const RISK_THRESHOLDS: [f64; BUCKET_COUNT] = [0.0, 10.0, 30.0, 50.0, 70.0, 90.0];

/// Fill color of each bucket, paired positionally with [`RISK_THRESHOLDS`].
pub const RISK_COLORS: [Rgb; BUCKET_COUNT] = [
    Rgb::new(0x91, 0xcf, 0x60),
    Rgb::new(0xd9, 0xef, 0x8b),
    Rgb::new(0xfe, 0xe0, 0x8b),
    Rgb::new(0xfc, 0x8d, 0x59),
    Rgb::new(0xd7, 0x30, 0x27),
    Rgb::new(0xb1, 0x00, 0x26),
];

/// Simple RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    /// Formats as CSS hex: `#rrggbb`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Maps risk values to bucket colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    thresholds: [f64; BUCKET_COUNT],
    colors: [Rgb; BUCKET_COUNT],
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            thresholds: RISK_THRESHOLDS,
            colors: RISK_COLORS,
        }
    }
}

impl ColorScale {
    /// Returns the color of the highest bucket whose threshold `value`
    /// strictly exceeds, or the lowest bucket's color if none.
    #[must_use]
    pub fn color_for(&self, value: f64) -> Rgb {
        self.thresholds
            .iter()
            .zip(self.colors.iter())
            .rev()
            .find(|(threshold, _)| value > **threshold)
            .map_or(self.colors[0], |(_, color)| *color)
    }

    /// Color of the lowest bucket.
    #[must_use]
    pub const fn lowest(&self) -> Rgb {
        self.colors[0]
    }

    /// Color of the highest bucket.
    #[must_use]
    pub const fn highest(&self) -> Rgb {
        self.colors[BUCKET_COUNT - 1]
    }

    /// Iterates over buckets as `(from, to, color)`. The top bucket has no
    /// upper bound.
    pub fn buckets(&self) -> impl Iterator<Item = (f64, Option<f64>, Rgb)> + '_ {
        self.thresholds.iter().enumerate().map(|(i, &from)| {
            let to = self.thresholds.get(i + 1).copied();
            (from, to, self.color_for(from + 1.0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_values_use_lowest_bucket() {
        let scale = ColorScale::default();
        for v in [0.0, -0.0, -1.0, -250.0, f64::NEG_INFINITY] {
            assert_eq!(scale.color_for(v), scale.lowest(), "{v}");
        }
    }

    #[test]
    fn nan_uses_lowest_bucket() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_for(f64::NAN), scale.lowest());
    }

    #[test]
    fn thresholds_are_strict() {
        let scale = ColorScale::default();
        for i in 1..BUCKET_COUNT {
            let t = RISK_THRESHOLDS[i];
            assert_eq!(scale.color_for(t), RISK_COLORS[i - 1], "at {t}");
            assert_eq!(scale.color_for(t + 1e-9), RISK_COLORS[i], "above {t}");
        }
    }

    #[test]
    fn values_above_top_threshold_use_highest_bucket() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_for(95.0), scale.highest());
        assert_eq!(scale.color_for(250.0), scale.highest());
        assert_eq!(scale.color_for(85.0), RISK_COLORS[4]);
    }

    #[test]
    fn small_positive_values_use_first_bucket() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_for(0.5), RISK_COLORS[0]);
        assert_eq!(scale.color_for(10.0), RISK_COLORS[0]);
    }

    #[test]
    fn buckets_pair_ranges_with_colors() {
        let buckets: Vec<_> = ColorScale::default().buckets().collect();
        assert_eq!(buckets.len(), BUCKET_COUNT);
        assert_eq!(buckets[0], (0.0, Some(10.0), RISK_COLORS[0]));
        assert_eq!(buckets[3], (50.0, Some(70.0), RISK_COLORS[3]));
        assert_eq!(buckets[5], (90.0, None, RISK_COLORS[5]));
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(RISK_COLORS[0].to_string(), "#91cf60");
        assert_eq!(RISK_COLORS[5].to_string(), "#b10026");
    }
}
