// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Polyphase sinc resampler.
//!
//! Input samples are written twice into a ring of `2 * RING_SIZE` entries so
//! the most recent `n` samples are always contiguous. An output sample is the
//! linear interpolation between the convolutions with the two filter phases
//! surrounding the exact output instant.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;

use wide::f32x8;

#[cfg(feature = "std")]
use super::cache::FirCache;
use super::fir::{FirSpec, FirTable};
use super::{validate_rates, PhaseAccumulator, Resampler, PHASE_MASK, PHASE_SHIFT};
use crate::SamplingError;

/// Length of the sample ring. Filters must be shorter than this.
pub const RING_SIZE: usize = 16384;
const RING_MASK: usize = RING_SIZE - 1;

/// Downsampling resampler with a Kaiser-windowed sinc bank.
#[derive(Clone)]
pub struct SincResampler {
    fir: Arc<FirTable>,
    // Ring buffer, each sample stored at index and index + RING_SIZE.
    sample: Box<[f32]>,
    sample_index: usize,
    phase: PhaseAccumulator,
    output_value: f32,
}

impl SincResampler {
    /// Creates a resampler from `clock_freq` down to `sample_freq`, accurate
    /// up to `highest_accurate_freq`.
    ///
    /// The filter table is shared through [`FirCache::global`].
    ///
    /// # Panics
    /// Panics if the derived filter does not fit in the sample ring.
    #[cfg(feature = "std")]
    pub fn new(
        clock_freq: f64,
        sample_freq: f64,
        highest_accurate_freq: f64,
    ) -> Result<Self, SamplingError> {
        Self::with_cache(
            FirCache::global(),
            clock_freq,
            sample_freq,
            highest_accurate_freq,
        )
    }

    /// Creates a resampler from `clock_freq` down to `sample_freq`, accurate
    /// up to `highest_accurate_freq`.
    ///
    /// # Panics
    /// Panics if the derived filter does not fit in the sample ring.
    #[cfg(not(feature = "std"))]
    pub fn new(
        clock_freq: f64,
        sample_freq: f64,
        highest_accurate_freq: f64,
    ) -> Result<Self, SamplingError> {
        let spec = checked_spec(clock_freq, sample_freq, highest_accurate_freq)?;
        let fir = Arc::new(FirTable::design(&spec));
        Ok(Self::from_table(fir, clock_freq, sample_freq))
    }

    /// Like [`new`](Self::new) but looks the filter up in `cache`.
    #[cfg(feature = "std")]
    pub fn with_cache(
        cache: &FirCache,
        clock_freq: f64,
        sample_freq: f64,
        highest_accurate_freq: f64,
    ) -> Result<Self, SamplingError> {
        let spec = checked_spec(clock_freq, sample_freq, highest_accurate_freq)?;
        let fir = cache.get_or_design(&spec);
        Ok(Self::from_table(fir, clock_freq, sample_freq))
    }

    fn from_table(fir: Arc<FirTable>, clock_freq: f64, sample_freq: f64) -> Self {
        Self {
            fir,
            sample: vec![0.0; RING_SIZE * 2].into_boxed_slice(),
            sample_index: 0,
            phase: PhaseAccumulator::new(clock_freq, sample_freq),
            output_value: 0.0,
        }
    }

    /// Taps per filter phase.
    pub fn fir_n(&self) -> usize {
        self.fir.n()
    }

    /// Number of filter phases.
    pub fn fir_res(&self) -> usize {
        self.fir.res()
    }

    /// Input samples per output sample, fixed-point with 10 fractional bits.
    pub fn cycles_per_sample(&self) -> i32 {
        self.phase.cycles_per_sample
    }

    /// Shared coefficient table.
    pub fn fir_table(&self) -> &Arc<FirTable> {
        &self.fir
    }

    fn fir(&self, subcycle: i32) -> f32 {
        let n = self.fir.n();
        let res = self.fir.res();

        // Find the first of the nearest fir tables close to the phase
        let fir_offset = subcycle as usize * res;
        let mut fir_table = fir_offset >> PHASE_SHIFT;

        // Find firN most recent samples, plus one extra in case the FIR wraps.
        let mut sample_start = self.sample_index + RING_SIZE - n - 1;

        let v1 = convolve(
            &self.sample[sample_start..sample_start + n],
            self.fir.row(fir_table),
        );

        // Use next FIR table, wrap around to first FIR using the next sample.
        fir_table += 1;
        if fir_table == res {
            fir_table = 0;
            sample_start += 1;
        }

        let v2 = convolve(
            &self.sample[sample_start..sample_start + n],
            self.fir.row(fir_table),
        );

        // Linear interpolation between the sinc tables yields good
        // approximation for the exact value.
        let frac = (fir_offset & PHASE_MASK) as f32;
        v1 + frac * (v2 - v1) / (1 << PHASE_SHIFT) as f32
    }
}

impl Resampler for SincResampler {
    #[inline]
    fn input(&mut self, sample: f32) -> bool {
        self.sample[self.sample_index] = sample;
        self.sample[self.sample_index + RING_SIZE] = sample;
        self.sample_index = (self.sample_index + 1) & RING_MASK;

        match self.phase.advance() {
            Some(subcycle) => {
                self.output_value = self.fir(subcycle);
                true
            }
            None => false,
        }
    }

    #[inline]
    fn output(&self) -> f32 {
        self.output_value
    }

    fn reset(&mut self) {
        self.sample.fill(0.0);
        self.sample_index = 0;
        self.phase.reset();
        self.output_value = 0.0;
    }
}

fn checked_spec(
    clock_freq: f64,
    sample_freq: f64,
    highest_accurate_freq: f64,
) -> Result<FirSpec, SamplingError> {
    validate_rates(clock_freq, sample_freq)?;
    if !(highest_accurate_freq > 0.0 && highest_accurate_freq < sample_freq / 2.0) {
        return Err(SamplingError::InvalidPassband);
    }
    let spec = FirSpec::new(clock_freq, sample_freq, highest_accurate_freq);
    assert!(
        spec.n < RING_SIZE,
        "FIR length {} does not fit the {} sample ring",
        spec.n,
        RING_SIZE
    );
    Ok(spec)
}

#[inline(always)]
fn lanes(s: &[f32]) -> f32x8 {
    f32x8::from([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
}

/// Dot product of two equally long slices.
#[inline]
fn convolve(samples: &[f32], taps: &[f32]) -> f32 {
    let len = samples.len().min(taps.len());
    let (mut s, mut t) = (&samples[..len], &taps[..len]);

    let mut acc0 = f32x8::ZERO;
    let mut acc1 = f32x8::ZERO;
    while s.len() >= 16 {
        acc0 = lanes(&s[..8]).mul_add(lanes(&t[..8]), acc0);
        acc1 = lanes(&s[8..16]).mul_add(lanes(&t[8..16]), acc1);
        s = &s[16..];
        t = &t[16..];
    }
    if s.len() >= 8 {
        acc0 = lanes(&s[..8]).mul_add(lanes(&t[..8]), acc0);
        s = &s[8..];
        t = &t[8..];
    }

    let mut out = (acc0 + acc1).reduce_add();
    for (a, b) in s.iter().zip(t) {
        out += a * b;
    }
    out
}
