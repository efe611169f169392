// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Two-pass sinc resampler.
//!
//! Chains two sinc resamplers through an intermediate frequency. The first
//! pass only needs a short filter since its transition band is wide; the
//! second runs at a much lower input rate. The intermediate frequency follows
//! Laurent Ganier's formula, about 120kHz at typical settings.

#[cfg(feature = "std")]
use super::cache::FirCache;
use super::sinc::SincResampler;
use super::{validate_rates, Resampler};
use crate::{math, SamplingError};

/// Passband limit for high sample rates (>44kHz).
const DEFAULT_PASSBAND: f64 = 20000.0;

/// Clock rate to output rate via an intermediate rate.
#[derive(Clone)]
pub struct TwoPassSincResampler {
    /// clock_freq -> intermediate_freq
    s1: SincResampler,
    /// intermediate_freq -> sample_freq
    s2: SincResampler,
}

impl TwoPassSincResampler {
    /// Creates a resampler from `clock_freq` down to `sample_freq`.
    ///
    /// Any downsampling pair is accepted. When the two rates are close the
    /// first pass runs at the clock rate and only band-limits.
    ///
    /// # Panics
    /// Panics if either pass derives a filter longer than the sample ring.
    pub fn new(clock_freq: f64, sample_freq: f64) -> Result<Self, SamplingError> {
        validate_rates(clock_freq, sample_freq)?;
        let passband = Self::passband_freq(sample_freq);
        let intermediate_freq = Self::intermediate_freq(clock_freq, sample_freq);
        log::debug!(
            "two-pass resampler: {} -> {} -> {} Hz, passband {} Hz",
            clock_freq,
            intermediate_freq,
            sample_freq,
            passband
        );
        Ok(Self {
            s1: SincResampler::new(clock_freq, intermediate_freq, passband)?,
            s2: SincResampler::new(intermediate_freq, sample_freq, passband)?,
        })
    }

    /// Like [`new`](Self::new) but looks both filters up in `cache`.
    #[cfg(feature = "std")]
    pub fn with_cache(
        cache: &FirCache,
        clock_freq: f64,
        sample_freq: f64,
    ) -> Result<Self, SamplingError> {
        validate_rates(clock_freq, sample_freq)?;
        let passband = Self::passband_freq(sample_freq);
        let intermediate_freq = Self::intermediate_freq(clock_freq, sample_freq);
        Ok(Self {
            s1: SincResampler::with_cache(cache, clock_freq, intermediate_freq, passband)?,
            s2: SincResampler::with_cache(cache, intermediate_freq, sample_freq, passband)?,
        })
    }

    /// Passband edge for an output rate: 20kHz above 44kHz, else 45% of it.
    pub fn passband_freq(sample_freq: f64) -> f64 {
        if sample_freq > 44000.0 {
            DEFAULT_PASSBAND
        } else {
            sample_freq * 0.45
        }
    }

    /// Rate between the two passes, never above `clock_freq`.
    pub fn intermediate_freq(clock_freq: f64, sample_freq: f64) -> f64 {
        let passband = Self::passband_freq(sample_freq);
        let freq = 2.0 * passband
            + math::sqrt(2.0 * passband * clock_freq * (sample_freq - 2.0 * passband) / sample_freq);
        freq.min(clock_freq)
    }

    /// First pass.
    pub fn first_pass(&self) -> &SincResampler {
        &self.s1
    }

    /// Second pass.
    pub fn second_pass(&self) -> &SincResampler {
        &self.s2
    }
}

impl Resampler for TwoPassSincResampler {
    #[inline]
    fn input(&mut self, sample: f32) -> bool {
        self.s1.input(sample) && self.s2.input(self.s1.output())
    }

    #[inline]
    fn output(&self) -> f32 {
        self.s2.output()
    }

    fn reset(&mut self) {
        self.s1.reset();
        self.s2.reset();
    }
}
