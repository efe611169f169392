// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Monotone cubic interpolation of measured op-amp transfer curves.
//!
//! Fritsch-Carlson tangents guarantee that a monotone data set stays monotone
//! between the knots, which is what makes the reverse op-amp table a valid
//! inverse of the transfer function.

use alloc::vec::Vec;

/// A knot of the interpolated curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// Input coordinate.
    pub x: f64,
    /// Output coordinate.
    pub y: f64,
}

/// Cubic `a*t^3 + b*t^2 + c*t + d` with `t = x - x0`.
#[derive(Clone, Copy, Debug)]
struct Cubic {
    x0: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Cubic {
    #[inline]
    fn eval(&self, x: f64) -> f64 {
        let t = x - self.x0;
        ((self.a * t + self.b) * t + self.c) * t + self.d
    }

    #[inline]
    fn slope(&self, x: f64) -> f64 {
        let t = x - self.x0;
        (3.0 * self.a * t + 2.0 * self.b) * t + self.c
    }
}

/// Piecewise cubic through a strictly increasing set of knots.
///
/// Outside the knot range the first and last segments are extended, so the
/// curve extrapolates smoothly instead of clamping.
#[derive(Clone, Debug)]
pub struct MonotoneSpline {
    /// Upper x bound of every segment but the last.
    bounds: Vec<f64>,
    cubics: Vec<Cubic>,
}

impl MonotoneSpline {
    /// Fits the spline.
    ///
    /// # Panics
    /// Panics with fewer than three knots or if x is not strictly increasing.
    pub fn new(knots: &[Point]) -> Self {
        assert!(knots.len() >= 3, "spline needs at least 3 knots");
        assert!(
            knots.windows(2).all(|w| w[1].x > w[0].x),
            "spline knots must have strictly increasing x"
        );

        let segments = knots.len() - 1;
        let widths: Vec<f64> = knots.windows(2).map(|w| w[1].x - w[0].x).collect();
        let secants: Vec<f64> = knots
            .windows(2)
            .zip(&widths)
            .map(|(w, h)| (w[1].y - w[0].y) / h)
            .collect();

        let mut tangents = Vec::with_capacity(knots.len());
        tangents.push(secants[0]);
        for i in 1..segments {
            let (m0, m1) = (secants[i - 1], secants[i]);
            if m0 * m1 <= 0.0 {
                tangents.push(0.0);
            } else {
                let (h0, h1) = (widths[i - 1], widths[i]);
                let sum = h0 + h1;
                tangents.push(3.0 * sum / ((sum + h1) / m0 + (sum + h0) / m1));
            }
        }
        tangents.push(secants[segments - 1]);

        let cubics = (0..segments)
            .map(|i| {
                let inv_h = 1.0 / widths[i];
                let m = secants[i];
                let c = tangents[i];
                let k = c + tangents[i + 1] - 2.0 * m;
                Cubic {
                    x0: knots[i].x,
                    a: k * inv_h * inv_h,
                    b: (m - c - k) * inv_h,
                    c,
                    d: knots[i].y,
                }
            })
            .collect();

        let bounds = knots[1..segments].iter().map(|p| p.x).collect();

        Self { bounds, cubics }
    }

    #[inline]
    fn segment(&self, x: f64) -> &Cubic {
        // First segment whose upper bound is >= x; past the end falls into the last.
        let i = self.bounds.partition_point(|&upper| upper < x);
        &self.cubics[i]
    }

    /// Value of the curve at `x`.
    #[inline]
    pub fn value(&self, x: f64) -> f64 {
        self.segment(x).eval(x)
    }

    /// First derivative of the curve at `x`.
    #[inline]
    pub fn slope(&self, x: f64) -> f64 {
        self.segment(x).slope(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OPAMP_VOLTAGE_8580;

    fn knots(data: &[(f64, f64)]) -> Vec<Point> {
        data.iter().map(|&(x, y)| Point { x, y }).collect()
    }

    /// The 8580 curve falls steeply around 4.8V; the spline must not overshoot.
    #[test]
    fn opamp_8580_stays_monotone() {
        let spline = MonotoneSpline::new(&knots(&OPAMP_VOLTAGE_8580));

        let mut prev = f64::MAX;
        let mut x = 1.0;
        while x < 9.5 {
            let y = spline.value(x);
            assert!(
                y <= prev + 1e-12,
                "curve rises at x={}: {} > {}",
                x,
                y,
                prev
            );
            prev = y;
            x += 0.001;
        }
    }

    #[test]
    fn passes_through_every_knot() {
        let points = knots(&OPAMP_VOLTAGE_8580);
        let spline = MonotoneSpline::new(&points);

        for (i, p) in points.iter().enumerate() {
            let y = spline.value(p.x);
            assert!(
                (y - p.y).abs() < 1e-10,
                "knot {} at x={}: expected {}, got {}",
                i,
                p.x,
                p.y,
                y
            );
        }
    }

    #[test]
    fn extrapolates_with_end_segments() {
        let spline = MonotoneSpline::new(&[
            Point { x: 10.0, y: 15.0 },
            Point { x: 15.0, y: 20.0 },
            Point { x: 20.0, y: 30.0 },
            Point { x: 25.0, y: 40.0 },
            Point { x: 30.0, y: 45.0 },
        ]);

        assert!((spline.value(5.0) - 6.66667).abs() < 1e-5);
        assert!((spline.value(40.0) - 75.0).abs() < 1e-5);
    }

    #[test]
    fn slope_is_zero_at_local_extremum() {
        let spline = MonotoneSpline::new(&[
            Point { x: 0.0, y: 0.0 },
            Point { x: 1.0, y: 1.0 },
            Point { x: 2.0, y: 0.0 },
        ]);
        assert!(spline.slope(1.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn rejects_unsorted_knots() {
        MonotoneSpline::new(&[
            Point { x: 0.0, y: 0.0 },
            Point { x: 2.0, y: 1.0 },
            Point { x: 1.0, y: 2.0 },
        ]);
    }
}
