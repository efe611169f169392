// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Soft clipping of resampled output into 16 bits.

/// Values with magnitude below this pass unchanged.
pub const SOFT_CLIP_THRESHOLD: f32 = 28000.0;

/// Padé tanh approximation (5th order), saturating beyond |x| >= 3.
#[inline]
fn tanh_pade(x: f32) -> f32 {
    if x >= 3.0 {
        return 1.0;
    }
    let x2 = x * x;
    x * (945.0 + x2 * (105.0 + x2)) / (945.0 + x2 * (420.0 + x2 * 15.0))
}

/// Compresses a non-negative magnitude into `[0, limit]`.
#[inline]
fn compress(magnitude: f32, limit: f32) -> f32 {
    if magnitude < SOFT_CLIP_THRESHOLD {
        return magnitude;
    }
    let knee = SOFT_CLIP_THRESHOLD / limit;
    let headroom = 1.0 - knee;
    let overshoot = (magnitude - SOFT_CLIP_THRESHOLD) / limit;
    (knee + headroom * tanh_pade(overshoot / headroom)) * limit
}

/// Converts a float sample to `i16`, saturating smoothly above the threshold.
///
/// Linear (truncating toward zero) for `|x| < 28000`, monotone everywhere.
/// NaN maps to 0.
#[inline]
pub fn soft_clip(x: f32) -> i16 {
    if x.is_nan() {
        return 0;
    }
    if x < 0.0 {
        -compress(-x, -(i16::MIN as f32)) as i16
    } else {
        compress(x, i16::MAX as f32) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pade_saturates_continuously() {
        assert!((tanh_pade(3.0 - 1e-4) - 0.995).abs() < 0.01);
        assert_eq!(tanh_pade(10.0), 1.0);
        assert_eq!(tanh_pade(0.0), 0.0);
    }

    #[test]
    fn nan_is_silence() {
        assert_eq!(soft_clip(f32::NAN), 0);
    }

    #[test]
    fn infinities_saturate() {
        assert_eq!(soft_clip(f32::INFINITY), i16::MAX);
        assert_eq!(soft_clip(f32::NEG_INFINITY), i16::MIN);
    }
}
