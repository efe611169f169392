// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Circuit constants and lookup tables for the 8580 filter integrators.
//!
//! The reverse op-amp table is derived from a measured transfer curve and is
//! shared read-only by every integrator built from the same config.
//!
//! # Singleton Usage
//!
//! Building the table interpolates 65536 points. With `std` a process-wide
//! instance is available:
//!
//! ```
//! use residfp_core::FilterModelConfig8580;
//!
//! let config = FilterModelConfig8580::global();
//! let mut hp = config.integrator();
//! hp.set_fc(FilterModelConfig8580::fc_wl(1024));
//! ```

use alloc::sync::Arc;
use alloc::vec::Vec;

#[cfg(feature = "std")]
use std::sync::OnceLock;

use crate::integrator::{Integrator8580, OPAMP_REV_SIZE};
use crate::opamp::{MonotoneSpline, Point};

#[cfg(feature = "std")]
static CONFIG: OnceLock<FilterModelConfig8580> = OnceLock::new();

/// Number of bits in the filter cutoff frequency DAC.
const DAC_BITS: u32 = 11;

/// W/L of the least significant cutoff DAC transistor.
const DAC_WL0: f64 = 0.00615;

/// Voice output DC level (V).
const VOICE_DC_VOLTAGE: f64 = 4.84;

/// Integrator capacitor (F).
const CAPACITOR: f64 = 22e-9;

/// Supply voltage (V).
const VDD: f64 = 9.09;

/// Transistor threshold voltage (V).
const VTH: f64 = 0.80;

/// Process transconductance (A/V^2).
const U_COX: f64 = 100e-6;

/// 8580 op-amp voltage transfer function, (vi, vo) in volts.
///
/// Measured on CAP1B/CAP1A of an 8580 chip; monotone decreasing output.
pub const OPAMP_VOLTAGE_8580: [(f64, f64); 21] = [
    (1.30, 8.91), // Approximate start of actual range
    (4.76, 8.91),
    (4.77, 8.90),
    (4.78, 8.88),
    (4.785, 8.86),
    (4.79, 8.80),
    (4.795, 8.60),
    (4.80, 8.25),
    (4.805, 7.50),
    (4.81, 6.10),
    (4.815, 4.05), // Change of curvature
    (4.82, 2.27),
    (4.825, 1.65),
    (4.83, 1.55),
    (4.84, 1.47),
    (4.85, 1.43),
    (4.87, 1.37),
    (4.90, 1.34),
    (5.00, 1.30),
    (5.10, 1.30),
    (8.91, 1.30), // Approximate end of actual range
];

/// Fixed-point model of the 8580 filter circuit.
pub struct FilterModelConfig8580 {
    /// Reverse op-amp transfer function, shared with the integrators.
    opamp_rev: Arc<[u16]>,

    /// Fixed-point scale factor: norm * UINT16_MAX.
    n16: f64,

    /// Lowest voltage of the normalized range.
    vmin: f64,

    /// Width of the normalized voltage range.
    denorm: f64,

    /// Transconductance, normalized for 1 cycle at 1MHz.
    n_kp: f64,
}

impl FilterModelConfig8580 {
    /// Returns the process-wide model, building it on first use.
    #[cfg(feature = "std")]
    pub fn global() -> &'static FilterModelConfig8580 {
        CONFIG.get_or_init(Self::new)
    }

    /// Builds the model and its reverse op-amp table.
    pub fn new() -> Self {
        let vmin = OPAMP_VOLTAGE_8580[0].0;
        let vddt = VDD - VTH;
        let vmax = vddt.max(OPAMP_VOLTAGE_8580[0].1);
        let denorm = vmax - vmin;
        let n16 = u16::MAX as f64 / denorm;
        let n_kp = denorm * (U_COX / 2.0 * 1.0e-6 / CAPACITOR);

        let opamp_rev = build_opamp_rev_table(n16, vmin);
        log::debug!(
            "built 8580 filter model: N16={:.3} vmin={} nKp={:.6}",
            n16,
            vmin,
            n_kp
        );

        Self {
            opamp_rev,
            n16,
            vmin,
            denorm,
            n_kp,
        }
    }

    /// Creates an integrator sharing this model's reverse op-amp table.
    pub fn integrator(&self) -> Integrator8580 {
        Integrator8580::new(
            Arc::clone(&self.opamp_rev),
            VOICE_DC_VOLTAGE,
            VTH,
            self.n_kp,
            self.vmin,
            self.n16,
        )
    }

    /// Cutoff DAC output as a W/L ratio for [`Integrator8580::set_fc`].
    ///
    /// Only the low 11 bits of `fc` are used. A zero register still leaks
    /// half of the smallest transistor.
    pub fn fc_wl(fc: u16) -> f64 {
        let fc = fc & ((1 << DAC_BITS) - 1);
        if fc == 0 {
            return DAC_WL0 / 2.0;
        }
        (0..DAC_BITS)
            .filter(|bit| fc & (1 << bit) != 0)
            .map(|bit| DAC_WL0 * (1u32 << bit) as f64)
            .sum()
    }

    /// Maps a filter curve position (0.0 dark .. 1.0 bright) to the gate
    /// voltage multiplier for [`Integrator8580::set_v`].
    pub fn curve_to_v(curve: f64) -> f64 {
        1.8 - curve.clamp(0.0, 1.0) * 0.6
    }

    /// Normalizes a voltage into the 16-bit fixed-point domain.
    pub fn normalize(&self, volts: f64) -> i32 {
        (self.n16 * (volts - self.vmin) + 0.5) as i32
    }

    /// Shared reverse op-amp table.
    #[inline]
    pub fn opamp_rev(&self) -> &Arc<[u16]> {
        &self.opamp_rev
    }

    /// Fixed-point scale factor.
    #[inline]
    pub fn n16(&self) -> f64 {
        self.n16
    }

    /// Lowest voltage of the normalized range.
    #[inline]
    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    /// Width of the normalized voltage range.
    #[inline]
    pub fn denorm(&self) -> f64 {
        self.denorm
    }

    /// Normalized transconductance.
    #[inline]
    pub fn n_kp(&self) -> f64 {
        self.n_kp
    }

    /// Voice DC level in volts.
    #[inline]
    pub fn voice_dc_voltage(&self) -> f64 {
        VOICE_DC_VOLTAGE
    }
}

impl Default for FilterModelConfig8580 {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounds into `u16`, saturating at the range ends.
fn to_u16(x: f64) -> u16 {
    (x + 0.5).clamp(0.0, u16::MAX as f64) as u16
}

/// Samples the inverted op-amp curve at every capacitor index.
///
/// x is the scaled capacitor voltage `(vi - vo) / 2` shifted into the
/// positive range, y is the normalized op-amp input voltage.
fn build_opamp_rev_table(n16: f64, vmin: f64) -> Arc<[u16]> {
    let knots: Vec<Point> = OPAMP_VOLTAGE_8580
        .iter()
        .map(|&(vi, vo)| Point {
            x: n16 * (vi - vo) / 2.0 + 32768.0,
            y: n16 * (vi - vmin),
        })
        .collect();
    let spline = MonotoneSpline::new(&knots);

    (0..OPAMP_REV_SIZE)
        .map(|x| to_u16(spline.value(x as f64)))
        .collect()
}
