//! Loop crossfade curves and timing
//!
//! Each active sound loops by overlapping the tail of one resource with the
//! head of a fresh one. The fade runs in discrete steps; at progress `p` the
//! outgoing resource plays at `initial * gain_out(p)` and the incoming one at
//! `target * gain_in(p)`.
//!
//! - Quadratic: `1 - p²` out, `p²` in (default, matches the classic loop fade)
//! - Linear: plain amplitude ramp
//! - Equal Power: sine/cosine pair, constant perceived loudness

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

/// Crossfade curve type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Slow start for the incoming resource, fast drop of the outgoing one at the end
    #[default]
    Quadratic,

    /// Linear fade
    ///
    /// Has a 3 dB dip at the midpoint (0.5² + 0.5² = 0.5 power).
    Linear,

    /// Equal power fade: sin²(x) + cos²(x) = 1
    EqualPower,
}

impl FadeCurve {
    /// Gain multiplier for the outgoing resource at progress `p` (0.0 - 1.0)
    #[inline]
    pub fn gain_out(self, p: f32) -> f32 {
        let p = p.clamp(0.0, 1.0);
        match self {
            FadeCurve::Quadratic => 1.0 - p * p,
            FadeCurve::Linear => 1.0 - p,
            FadeCurve::EqualPower => (p * FRAC_PI_2).cos(),
        }
    }

    /// Gain multiplier for the incoming resource at progress `p` (0.0 - 1.0)
    #[inline]
    pub fn gain_in(self, p: f32) -> f32 {
        let p = p.clamp(0.0, 1.0);
        match self {
            FadeCurve::Quadratic => p * p,
            FadeCurve::Linear => p,
            FadeCurve::EqualPower => (p * FRAC_PI_2).sin(),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FadeCurve::Quadratic => "Quadratic",
            FadeCurve::Linear => "Linear",
            FadeCurve::EqualPower => "Equal Power",
        }
    }
}

/// Crossfade settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeSettings {
    /// Overlap window in milliseconds; the fade starts when this much audio remains
    pub window_ms: u64,

    /// Number of discrete gain steps across the window
    pub steps: u32,

    /// Fade curve type
    pub curve: FadeCurve,
}

impl Default for CrossfadeSettings {
    fn default() -> Self {
        Self {
            window_ms: 3000, // 3 second overlap
            steps: 60,
            curve: FadeCurve::Quadratic,
        }
    }
}

impl CrossfadeSettings {
    /// Milliseconds between fade steps (50 ms with defaults)
    pub fn step_interval_ms(&self) -> u64 {
        (self.window_ms / u64::from(self.steps.max(1))).max(1)
    }

    /// Fade progress after `step` of `steps` steps
    pub fn progress(&self, step: u32) -> f32 {
        let p = step as f32 / self.steps.max(1) as f32;
        p.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_endpoints() {
        let curve = FadeCurve::Quadratic;
        assert_eq!(curve.gain_out(0.0), 1.0);
        assert_eq!(curve.gain_out(1.0), 0.0);
        assert_eq!(curve.gain_in(0.0), 0.0);
        assert_eq!(curve.gain_in(1.0), 1.0);
        assert!((curve.gain_in(0.5) - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn equal_power_is_constant_power() {
        let curve = FadeCurve::EqualPower;
        for i in 0..=10 {
            let p = i as f32 / 10.0;
            let power = curve.gain_out(p).powi(2) + curve.gain_in(p).powi(2);
            assert!((power - 1.0).abs() < 1e-5, "power {power} at {p}");
        }
    }

    #[test]
    fn progress_is_clamped() {
        let curve = FadeCurve::Linear;
        assert_eq!(curve.gain_in(1.5), 1.0);
        assert_eq!(curve.gain_out(-0.5), 1.0);
    }

    #[test]
    fn default_settings_step_every_50ms() {
        let settings = CrossfadeSettings::default();
        assert_eq!(settings.step_interval_ms(), 50);
        assert_eq!(settings.progress(30), 0.5);
        assert_eq!(settings.progress(60), 1.0);
    }
}
