//! Quantized two-color scale for effort values

/// Linear scale from `from` to `to` over `[low, high]`, split into `bins`
/// discrete steps. Values outside the range clamp to the end colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    low: f64,
    high: f64,
    bins: usize,
    from: [f64; 3],
    to: [f64; 3],
}

impl ColorScale {
    pub const WHITE: [f64; 3] = [1.0, 1.0, 1.0];
    pub const PURPLE: [f64; 3] = [0.542, 0.211, 0.973];
    pub const BINS: usize = 100;

    /// White-to-purple scale with 100 bins
    pub fn new(low: f64, high: f64) -> Self {
        Self::with_colors(low, high, Self::WHITE, Self::PURPLE, Self::BINS)
    }

    pub fn with_colors(low: f64, high: f64, from: [f64; 3], to: [f64; 3], bins: usize) -> Self {
        Self {
            low,
            high,
            bins: bins.max(2),
            from,
            to,
        }
    }

    fn bin(&self, value: f64) -> usize {
        let span = self.high - self.low;
        let t = if span > 0.0 { (value - self.low) / span } else { 0.0 };
        if t.is_nan() || t < 0.0 {
            0
        } else if t >= 1.0 {
            self.bins - 1
        } else {
            ((t * self.bins as f64) as usize).min(self.bins - 1)
        }
    }

    pub fn rgb(&self, value: f64) -> [f64; 3] {
        let frac = self.bin(value) as f64 / (self.bins - 1) as f64;
        let mut rgb = [0.0; 3];
        for (i, c) in rgb.iter_mut().enumerate() {
            *c = self.from[i] + (self.to[i] - self.from[i]) * frac;
        }
        rgb
    }

    /// `#rrggbb` for `value`
    pub fn hex(&self, value: f64) -> String {
        let [r, g, b] = self.rgb(value).map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_of_scale() {
        let scale = ColorScale::new(1.0, 3.0);
        assert_eq!(scale.hex(1.0), "#ffffff");
        assert_eq!(scale.hex(3.0), "#8a36f8");
    }

    #[test]
    fn out_of_range_clamps() {
        let scale = ColorScale::new(1.0, 3.0);
        assert_eq!(scale.hex(0.2), "#ffffff");
        assert_eq!(scale.hex(10.0), "#8a36f8");
    }

    #[test]
    fn values_are_quantized() {
        let scale = ColorScale::new(0.0, 1.0);
        // Same bin, same color
        assert_eq!(scale.hex(0.501), scale.hex(0.509));
        assert_ne!(scale.hex(0.49), scale.hex(0.51));
    }

    #[test]
    fn degenerate_range_is_start_color() {
        let scale = ColorScale::new(1.0, 1.0);
        assert_eq!(scale.hex(1.0), "#ffffff");
    }
}
