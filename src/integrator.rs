// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Integrator for the 8580 filter.
//!
//! ```text
//!                   +---C---+
//!                   |       |
//!     vi -----Rfc---o--[A>--o-- vo
//!                   vx
//! ```
//!
//! The current through the cutoff transistor charges the capacitor:
//!
//! ```text
//!     vc = vc0 - n*(IRfc(vi, vx))
//!     vc = vc0 - n*(IRfc(vi, g(vc)))
//!     IRfc = K*W/L*(Vgst^2 - Vgdt^2) = n*((Vgt - vx)^2 - (Vgt - vi)^2)
//! ```
//!
//! `g` is the op-amp transfer function, inverted ahead of time into a lookup
//! table so a step needs no iterative solve. The Rfc gate voltage comes from a
//! switched capacitor divider off the voice DC level.

use alloc::sync::Arc;

/// Number of entries in a reverse op-amp table.
pub const OPAMP_REV_SIZE: usize = 1 << 16;

/// One integrator stage of the 8580 state-variable filter.
#[derive(Clone)]
pub struct Integrator8580 {
    /// Reverse op-amp transfer function, shared by all stages of a chip.
    opamp_rev: Arc<[u16]>,

    /// Op-amp input (feedback node) voltage, normalized.
    vx: i32,

    /// Capacitor charge, scaled by 2^15 relative to the table index.
    vc: i32,

    /// Normalized gate overdrive Vg - Vth.
    n_vgt: u16,

    /// Normalized current factor of the cutoff DAC.
    n_dac: u16,

    voice_dc_voltage: f64,
    vth: f64,
    n_kp: f64,
    vmin: f64,
    n16: f64,
}

impl Integrator8580 {
    /// Creates an integrator over a shared reverse op-amp table.
    ///
    /// The gate multiplier starts at 1.5 and the cutoff current at zero.
    ///
    /// # Panics
    /// Panics if the table does not have [`OPAMP_REV_SIZE`] entries, or if the
    /// constants put the default gate voltage outside the 16-bit range.
    pub fn new(
        opamp_rev: Arc<[u16]>,
        voice_dc_voltage: f64,
        vth: f64,
        n_kp: f64,
        vmin: f64,
        n16: f64,
    ) -> Self {
        assert_eq!(
            opamp_rev.len(),
            OPAMP_REV_SIZE,
            "reverse op-amp table must have 65536 entries"
        );
        let mut integrator = Self {
            opamp_rev,
            vx: 0,
            vc: 0,
            n_vgt: 0,
            n_dac: 0,
            voice_dc_voltage,
            vth,
            n_kp,
            vmin,
            n16,
        };
        integrator.set_v(1.5);
        integrator
    }

    /// Sets the cutoff DAC W/L ratio.
    ///
    /// Normalized current factor for 1 cycle at 1MHz, scaled by 2^13.
    ///
    /// # Panics
    /// Panics if the scaled factor does not fit in 16 bits.
    pub fn set_fc(&mut self, wl: f64) {
        let tmp = (1 << 13) as f64 * self.n_kp * wl;
        assert!(
            tmp > -0.5 && tmp < 65535.5,
            "cutoff current factor {} out of 16-bit range (wl={})",
            tmp,
            wl
        );
        self.n_dac = (tmp + 0.5) as u16;
    }

    /// Sets the gate voltage multiplier, `1 < v < 2`.
    ///
    /// # Panics
    /// Panics if `v` is outside its domain or the resulting gate overdrive
    /// does not fit in 16 bits.
    pub fn set_v(&mut self, v: f64) {
        assert!(v > 1.0 && v < 2.0, "gate multiplier {} outside (1, 2)", v);
        let vg = self.voice_dc_voltage * v;
        let vgt = vg - self.vth;

        // Vg - Vth, normalized so that translated values can be subtracted:
        // Vgt - x = (Vgt - t) - (x - t)
        let tmp = self.n16 * (vgt - self.vmin);
        assert!(
            tmp > -0.5 && tmp < 65535.5,
            "gate overdrive {} out of 16-bit range (v={})",
            tmp,
            v
        );
        self.n_vgt = (tmp + 0.5) as u16;
    }

    /// Clears capacitor charge and feedback voltage.
    pub fn reset(&mut self) {
        self.vx = 0;
        self.vc = 0;
    }

    /// Advances one cycle with input `vi`, returning the output voltage.
    ///
    /// # Panics
    /// Panics if the stage entered subthreshold (`vx >= nVgt`) or the
    /// capacitor charge left the table range; both mean the caller drove the
    /// circuit outside its operating envelope.
    #[inline]
    pub fn solve(&mut self, vi: i32) -> i32 {
        let n_vgt = self.n_vgt as i32;
        assert!(
            self.vx < n_vgt,
            "integrator in subthreshold: vx={} nVgt={}",
            self.vx,
            n_vgt
        );

        // DAC voltages; Vgdt is zero once the drain saturates.
        let vgst = (n_vgt - self.vx) as u32;
        let vgdt = if vi < n_vgt {
            n_vgt.wrapping_sub(vi) as u32
        } else {
            0
        };

        let vgst_2 = vgst.wrapping_mul(vgst);
        let vgdt_2 = vgdt.wrapping_mul(vgdt);

        // DAC current, scaled by (1/m)*2^13*m*2^16*m*2^16*2^-15 = m*2^30
        let n_i_dac = (self.n_dac as i32).wrapping_mul(vgst_2.wrapping_sub(vgdt_2) as i32 >> 15);

        self.vc = self.vc.wrapping_add(n_i_dac);

        // vx = g(vc)
        let index = (self.vc >> 15) + (1 << 15);
        assert!(
            (0..OPAMP_REV_SIZE as i32).contains(&index),
            "capacitor charge {} outside op-amp table",
            self.vc
        );
        self.vx = self.opamp_rev[index as usize] as i32;

        self.vx - (self.vc >> 14)
    }

    /// Feedback node voltage.
    #[inline]
    pub fn vx(&self) -> i32 {
        self.vx
    }

    /// Capacitor charge.
    #[inline]
    pub fn vc(&self) -> i32 {
        self.vc
    }

    /// Normalized gate overdrive.
    #[inline]
    pub fn n_vgt(&self) -> u16 {
        self.n_vgt
    }

    /// Normalized cutoff current factor.
    #[inline]
    pub fn n_dac(&self) -> u16 {
        self.n_dac
    }

    /// Shared reverse op-amp table.
    #[inline]
    pub fn opamp_rev(&self) -> &Arc<[u16]> {
        &self.opamp_rev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Linear table: vx rises from zero once the charge turns positive.
    fn linear_table() -> Arc<[u16]> {
        (0..OPAMP_REV_SIZE)
            .map(|i| (i.saturating_sub(1 << 15) / 4) as u16)
            .collect()
    }

    fn integrator() -> Integrator8580 {
        // N16 = 1000/V, vmin = 0: 1.5 * 4.0 - 1.0 = 5.0V -> nVgt = 5000.
        Integrator8580::new(linear_table(), 4.0, 1.0, 1.0, 0.0, 1000.0)
    }

    #[test]
    fn constructor_applies_default_gate_multiplier() {
        let integrator = integrator();
        assert_eq!(integrator.n_vgt(), 5000);
        assert_eq!(integrator.n_dac(), 0);
    }

    #[test]
    fn set_fc_scales_by_2_pow_13() {
        let mut integrator = integrator();
        integrator.set_fc(0.5);
        assert_eq!(integrator.n_dac(), 4096);
        integrator.set_fc(0.0);
        assert_eq!(integrator.n_dac(), 0);
    }

    #[test]
    fn zero_current_leaves_charge_untouched() {
        let mut integrator = integrator();
        for vi in [0, 1000, 4999, 6000] {
            integrator.solve(vi);
            assert_eq!(integrator.vc(), 0);
        }
    }

    /// Vgst^2 - Vgdt^2 with vx = 0, nVgt = 5000, vi = 4000:
    /// (25_000_000 - 1_000_000) >> 15 = 732, times n_dac.
    #[test]
    fn single_step_matches_fixed_point_formula() {
        let mut integrator = integrator();
        integrator.set_fc(1.0 / 8192.0 * 3.0);
        assert_eq!(integrator.n_dac(), 3);

        let vo = integrator.solve(4000);
        assert_eq!(integrator.vc(), 3 * 732);
        assert_eq!(integrator.vx(), 0);
        assert_eq!(vo, 0);
    }

    #[test]
    fn saturation_clamps_drain_overdrive() {
        let mut a = integrator();
        let mut b = integrator();
        a.set_fc(0.001);
        b.set_fc(0.001);
        // Any vi at or above nVgt behaves like vi == nVgt.
        assert_eq!(a.solve(5000), b.solve(60000));
        assert_eq!(a.vc(), b.vc());
    }

    #[test]
    fn reset_clears_state() {
        let mut integrator = integrator();
        integrator.set_fc(0.01);
        for _ in 0..10 {
            integrator.solve(2000);
        }
        assert_ne!(integrator.vc(), 0);

        integrator.reset();
        assert_eq!(integrator.vc(), 0);
        assert_eq!(integrator.vx(), 0);
    }

    #[test]
    #[should_panic(expected = "65536 entries")]
    fn rejects_short_table() {
        let table: Arc<[u16]> = vec![0u16; 1024].into();
        Integrator8580::new(table, 4.0, 1.0, 1.0, 0.0, 1000.0);
    }

    #[test]
    #[should_panic(expected = "outside (1, 2)")]
    fn set_v_rejects_multiplier_outside_domain() {
        integrator().set_v(2.0);
    }

    #[test]
    #[should_panic(expected = "out of 16-bit range")]
    fn set_fc_rejects_oversized_current() {
        integrator().set_fc(8.0);
    }
}
