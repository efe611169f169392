// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#![no_std]
#![warn(missing_docs)]
//! Signal-path building blocks derived from libresidfp: the MOS 8580 filter
//! integrator and band-limited resampling of the chip output.
//!
//! ## Feature flags
//! - `std` (default): process-wide shared filter model and FIR table cache.
//!   Without it, each resampler designs its own table and math falls back to
//!   `libm`.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod integrator;
mod math;
pub mod opamp;
pub mod resample;

pub use self::config::FilterModelConfig8580;
pub use self::integrator::{Integrator8580, OPAMP_REV_SIZE};
#[cfg(feature = "std")]
pub use self::resample::FirCache;
pub use self::resample::{
    i0, soft_clip, FirKey, FirSpec, FirTable, Resampler, SincResampler, TwoPassSincResampler,
    ZeroOrderResampler,
};

/// Clock frequency constants for common C64 configurations.
pub mod clock {
    /// PAL C64 clock frequency (~985 kHz).
    pub const PAL: u32 = 985_248;
    /// NTSC C64 clock frequency (~1.02 MHz).
    pub const NTSC: u32 = 1_022_727;
}

/// Error returned when sampling parameters are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SamplingError {
    /// Clock frequency must be positive.
    #[error("clock frequency must be positive")]
    ZeroClockFreq,
    /// Sample frequency must be positive.
    #[error("sample frequency must be positive")]
    ZeroSampleFreq,
    /// Highest accurate frequency must lie in `(0, sample_freq / 2)`.
    #[error("highest accurate frequency must lie between 0 and half the sample frequency")]
    InvalidPassband,
    /// Only downsampling is supported.
    #[error("clock frequency is below the sample frequency")]
    Upsampling,
}
