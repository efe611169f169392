// Tests for Integrator8580 driven by the measured 8580 op-amp model.
//
// The integrator is an inverting stage: a constant input settles the
// feedback node on the input voltage and the output on the op-amp curve.

use residfp_core::{FilterModelConfig8580, Integrator8580};

/// Normalized voice DC level, the usual quiescent filter input.
const VOICE_DC: i32 = 30486;

fn integrator(fc: u16) -> Integrator8580 {
    let mut integrator = FilterModelConfig8580::global().integrator();
    integrator.set_fc(FilterModelConfig8580::fc_wl(fc));
    integrator
}

/// Runs `steps` cycles at constant input, returning every output.
fn run(integrator: &mut Integrator8580, vi: i32, steps: usize) -> Vec<i32> {
    (0..steps).map(|_| integrator.solve(vi)).collect()
}

/// First step after which the output stays within `tolerance` of its final value.
fn settle_time(outputs: &[i32], tolerance: i32) -> usize {
    let last = outputs[outputs.len() - 1];
    outputs
        .iter()
        .rposition(|&o| (o - last).abs() > tolerance)
        .map_or(0, |i| i + 1)
}

#[test]
fn defaults_from_model() {
    let config = FilterModelConfig8580::global();
    let integrator = config.integrator();
    // nVgt = N16 * (4.84 * 1.5 - 0.8 - 1.3)
    let expected = (config.n16() * (4.84 * 1.5 - 0.8 - config.vmin()) + 0.5) as u16;
    assert_eq!(integrator.n_vgt(), expected);
    assert_eq!(integrator.n_dac(), 0);
    assert_eq!(integrator.vc(), 0);
    assert_eq!(integrator.vx(), 0);
}

/// Constant input settles to a fixed point with vx tracking vi.
#[test]
fn constant_input_reaches_steady_state() {
    let mut integrator = integrator(1024);
    let outputs = run(&mut integrator, VOICE_DC, 20000);

    let tail = &outputs[outputs.len() - 1000..];
    let last = tail[tail.len() - 1];
    assert!(
        tail.iter().all(|&o| (o - last).abs() <= 16),
        "output still moving: {:?}..{:?}",
        tail.iter().min(),
        tail.iter().max()
    );
    assert!(
        (integrator.vx() - VOICE_DC).abs() <= 1,
        "vx {} did not track vi {}",
        integrator.vx(),
        VOICE_DC
    );
}

/// The settled output lies on the measured op-amp curve: vi = 4.84V gives
/// vo = 1.47V.
#[test]
fn steady_state_matches_opamp_working_point() {
    let config = FilterModelConfig8580::global();
    let mut integrator = integrator(1024);
    let vo = *run(&mut integrator, VOICE_DC, 20000).last().unwrap();
    let expected = config.normalize(1.47);
    assert!(
        (vo - expected).abs() <= 16,
        "vo {} not near normalized 1.47V ({})",
        vo,
        expected
    );
}

/// Higher input settles to a lower output.
#[test]
fn stage_is_inverting() {
    let inputs = [30400, 30450, 30486, 30600, 31000];
    let outputs: Vec<i32> = inputs
        .iter()
        .map(|&vi| *run(&mut integrator(1024), vi, 20000).last().unwrap())
        .collect();
    for (w, vi) in outputs.windows(2).zip(inputs.windows(2)) {
        assert!(
            w[0] > w[1],
            "vi {} -> {} but vi {} -> {}",
            vi[0],
            w[0],
            vi[1],
            w[1]
        );
    }
}

/// A larger cutoff DAC value pumps more current and settles sooner.
#[test]
fn higher_cutoff_settles_faster() {
    let slow = run(&mut integrator(256), VOICE_DC, 20000);
    let fast = run(&mut integrator(2047), VOICE_DC, 20000);
    let slow_t = settle_time(&slow, 16);
    let fast_t = settle_time(&fast, 16);
    assert!(
        fast_t < slow_t,
        "fc=2047 settled after {} steps, fc=256 after {}",
        fast_t,
        slow_t
    );
    // Both end on the same fixed point.
    assert_eq!(slow.last(), fast.last());
}

/// The lowest cutoff bit alone drives one unit of current.
#[test]
fn lowest_cutoff_still_integrates() {
    let mut integrator = integrator(1);
    assert_eq!(integrator.n_dac(), 1);
    integrator.solve(VOICE_DC);
    integrator.solve(VOICE_DC);
    assert!(integrator.vc() > 0);
}

#[test]
fn reset_restores_initial_trajectory() {
    let mut integrator = integrator(1024);
    let first = run(&mut integrator, VOICE_DC, 500);
    integrator.reset();
    let second = run(&mut integrator, VOICE_DC, 500);
    assert_eq!(first, second);
}

/// Clones share the op-amp table but not state.
#[test]
fn clones_evolve_independently() {
    let mut a = integrator(1024);
    run(&mut a, VOICE_DC, 100);
    let mut b = a.clone();
    run(&mut b, 31000, 100);
    assert!(std::sync::Arc::ptr_eq(a.opamp_rev(), b.opamp_rev()));
    assert_ne!(a.vc(), b.vc());
}

/// Linear congruential generator for a repeatable input sequence.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0
    }
}

/// Any input below the gate overdrive keeps the feedback node under it, at
/// every cutoff and curve setting.
#[test]
fn varying_input_stays_above_threshold() {
    let config = FilterModelConfig8580::global();
    let lo = config.normalize(3.0);

    for fc in [1u16, 256, 1024, 2047] {
        for curve in [0.0, 0.5, 1.0] {
            let mut integrator = integrator(fc);
            integrator.set_v(FilterModelConfig8580::curve_to_v(curve));
            let n_vgt = integrator.n_vgt() as i32;
            let hi = n_vgt.min(config.normalize(6.5));
            assert!(hi > lo, "empty input range for curve {}", curve);
            let span = (hi - lo) as u32;

            let mut rng = Lcg(0x2545_f491);
            for step in 0..200_000 {
                let vi = lo + ((rng.next() >> 8) % span) as i32;
                integrator.solve(vi);
                assert!(
                    integrator.vx() < n_vgt,
                    "fc={} curve={} step {}: vx {} reached nVgt {}",
                    fc,
                    curve,
                    step,
                    integrator.vx(),
                    n_vgt
                );
            }
        }
    }
}

/// Dropping the gate voltage below the settled feedback node is fatal.
#[test]
#[should_panic(expected = "subthreshold")]
fn subthreshold_is_fatal() {
    let mut integrator = integrator(1024);
    run(&mut integrator, VOICE_DC, 20000);
    integrator.set_v(1.01);
    integrator.solve(VOICE_DC);
}
