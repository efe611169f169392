// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Kaiser-windowed sinc filter design.
//!
//! A filter bank of `res` phases, each `n` taps long, approximates a
//! continuous-phase low-pass. The resampler linearly interpolates between
//! adjacent phases.

use alloc::vec;
use alloc::vec::Vec;

use super::cache::FirKey;
use crate::math;

/// Maximum error acceptable in I0 is 1e-6, or ~96 dB.
const I0E: f64 = 1e-6;

/// Target output resolution.
const BITS: i32 = 16;

/// Compute the 0th order modified Bessel function of the first kind.
///
/// Power series summed until a term drops below `I0E` of the running sum.
pub fn i0(x: f64) -> f64 {
    let halfx = x / 2.0;
    let mut sum = 1.0;
    let mut u = 1.0;
    let mut n = 1.0;
    loop {
        let temp = halfx / n;
        u *= temp * temp;
        sum += u;
        n += 1.0;
        if u < I0E * sum {
            break;
        }
    }
    sum
}

/// Filter dimensions and window parameters derived from a rate pair.
///
/// Only [`FirSpec::new`] builds one, so `n` is odd and `res` is at least 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FirSpec {
    /// Filter length, always odd.
    pub(crate) n: usize,
    /// Number of phase tables per input sample.
    pub(crate) res: usize,
    /// Input samples per output sample.
    pub(crate) cycles_per_sample: f64,
    /// Kaiser shape parameter.
    pub(crate) beta: f64,
}

impl FirSpec {
    /// Derives the filter for resampling `clock_freq` down to `sample_freq`
    /// while keeping everything below `highest_accurate_freq` in the passband.
    ///
    /// Arguments must already be validated by the caller.
    pub fn new(clock_freq: f64, sample_freq: f64, highest_accurate_freq: f64) -> Self {
        // 16 bits -> -96dB stopband attenuation.
        let atten = -20.0 * math::log10(1.0 / (1 << BITS) as f64);
        // A fraction of the bandwidth is allocated to the transition band, which
        // we double because the filter transitions halfway at nyquist.
        let dw = (1.0 - 2.0 * highest_accurate_freq / sample_freq) * core::f64::consts::PI * 2.0;

        // For calculation of beta and N see the reference for the kaiserord
        // function in the MATLAB Signal Processing Toolbox:
        // http://www.mathworks.com/help/signal/ref/kaiserord.html
        let beta = 0.1102 * (atten - 8.7);
        let cycles_per_sample = clock_freq / sample_freq;

        // The filter order is equal to the number of zero crossings, i.e.
        // it should be an even number (sinc is symmetric about x = 0).
        let mut order = ((atten - 7.95) / (2.285 * dw) + 0.5) as i32;
        order += order & 1;

        // The filter length is equal to the filter order + 1 and must be odd.
        let n = ((order as f64 * cycles_per_sample) as usize + 1) | 1;

        // Error is bounded by err < 1.234 / L^2, so L = sqrt(1.234 * 2^16).
        let res = math::ceil(math::sqrt(1.234 * (1 << BITS) as f64) / cycles_per_sample) as usize;

        Self {
            n,
            res: res.max(1),
            cycles_per_sample,
            beta,
        }
    }

    /// Filter length, always odd.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of phase tables per input sample.
    #[inline]
    pub fn res(&self) -> usize {
        self.res
    }

    /// Input samples per output sample.
    #[inline]
    pub fn cycles_per_sample(&self) -> f64 {
        self.cycles_per_sample
    }

    /// Kaiser shape parameter.
    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Cache key identifying the table this spec designs.
    pub fn key(&self) -> FirKey {
        FirKey::new(self.n, self.res, self.cycles_per_sample)
    }
}

/// Coefficient matrix, `res` rows of `n` taps, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct FirTable {
    n: usize,
    res: usize,
    data: Vec<f32>,
}

impl FirTable {
    /// Computes every phase of the sinc bank weighted by the Kaiser window.
    pub fn design(spec: &FirSpec) -> Self {
        let FirSpec {
            n,
            res,
            cycles_per_sample,
            beta,
        } = *spec;
        let i0_beta = i0(beta);
        let half = (n / 2) as f64;

        // The cutoff frequency is midway through the transition band, in effect
        // the same as nyquist.
        let wc = core::f64::consts::PI;
        let scale = wc / cycles_per_sample / core::f64::consts::PI;

        let mut data = vec![0.0f32; n * res];
        for (i, row) in data.chunks_exact_mut(n).enumerate() {
            let phase = i as f64 / res as f64 + half;
            for (j, tap) in row.iter_mut().enumerate() {
                let x = j as f64 - phase;
                let wt = wc * x / cycles_per_sample;
                *tap = (scale * sinc(wt) * kaiser(x / half, beta, i0_beta)) as f32;
            }
        }

        Self { n, res, data }
    }

    /// Taps per phase.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of phases.
    #[inline]
    pub fn res(&self) -> usize {
        self.res
    }

    /// Coefficients of phase `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}

/// Kaiser window at normalized position `xt`, zero outside (-1, 1).
#[inline]
fn kaiser(xt: f64, beta: f64, i0_beta: f64) -> f64 {
    if math::abs(xt) < 1.0 {
        i0(beta * math::sqrt(1.0 - xt * xt)) / i0_beta
    } else {
        0.0
    }
}

/// `sin(x)/x` with the removable singularity filled in.
#[inline]
fn sinc(x: f64) -> f64 {
    if math::abs(x) >= 1e-8 {
        math::sin(x) / x
    } else {
        1.0
    }
}
