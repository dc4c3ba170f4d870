use std::cell::Cell;
use std::time::{Duration, Instant};

use linesense_core::mocks::{NoopSource, ScriptedSource};
use linesense_core::{
    LineSenseError, LinePolarity, Phase, RawReading, SamplingMode, SensorCfg, Thresholds,
    build_line_sensor,
};
use linesense_traits::Clock;
use rstest::rstest;

/// Clock that only moves when slept on.
struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
}

impl ManualClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn sleep(&self, d: Duration) {
        self.offset.set(self.offset.get() + d);
    }
}

fn cfg(n: u8) -> SensorCfg {
    SensorCfg {
        channels: (0..n).collect(),
        samples_per_sensor: 1,
        ..SensorCfg::default()
    }
}

/// Two calibration rows (all floor, all line) followed by `rows`.
fn scripted(n: usize, rows: &[Vec<u16>]) -> ScriptedSource {
    let mut all = vec![vec![100; n], vec![900; n]];
    all.extend_from_slice(rows);
    ScriptedSource::new(all)
}

#[rstest]
fn calibrate_then_read_line() {
    let src = scripted(8, &[vec![100, 100, 100, 900, 900, 100, 100, 100]]);
    let mut sensor = build_line_sensor(src, cfg(8)).unwrap();

    let state = sensor.calibrate_iterations(2).unwrap();
    assert_eq!(state.observations(), 2);
    assert_eq!(state.degenerate_count(), 0);
    assert_eq!(sensor.phase(), Phase::Ready);

    let r = sensor.read_line(0).unwrap();
    assert_eq!(r.calibrated.as_slice(), &[0, 0, 0, 1000, 1000, 0, 0, 0]);
    assert_eq!(r.bits.to_string(), "00011000");
    assert_eq!(r.steps, 0);
    assert_eq!(r.error_milli, 0);
    assert_eq!(r.position, 3500);
    assert!(!r.gap);
    assert_eq!(sensor.bits().to_string(), "00011000");
}

#[rstest]
fn averaging_truncates_the_mean() {
    let src = ScriptedSource::new(vec![vec![10], vec![11], vec![12], vec![13]]);
    let mut sensor = build_line_sensor(
        src,
        SensorCfg {
            samples_per_sensor: 4,
            ..cfg(1)
        },
    )
    .unwrap();
    // (10 + 11 + 12 + 13) / 4 = 11.5
    assert_eq!(sensor.read_raw().unwrap().on.as_slice(), &[11]);
}

#[rstest]
fn analog_reads_clamp_to_raw_max() {
    let src = ScriptedSource::new(vec![vec![2000]]);
    let mut sensor = build_line_sensor(
        src,
        SensorCfg {
            sampling: SamplingMode::Analog { raw_max: 1023 },
            ..cfg(1)
        },
    )
    .unwrap();
    assert_eq!(sensor.read_raw().unwrap().on.as_slice(), &[1023]);
}

#[rstest]
fn timed_reads_are_capped_at_the_timeout() {
    let src = ScriptedSource::new(vec![vec![100, 5000]]);
    let mut sensor = build_line_sensor(
        src,
        SensorCfg {
            sampling: SamplingMode::Timed { timeout_us: 2500 },
            ..cfg(2)
        },
    )
    .unwrap();
    assert_eq!(sensor.read_raw().unwrap().on.as_slice(), &[100, 2500]);
}

#[rstest]
fn reads_during_calibration_are_rejected() {
    let mut sensor = build_line_sensor(scripted(2, &[]), cfg(2)).unwrap();
    sensor.begin_calibration();
    sensor.calibrate_step().unwrap();
    let err = sensor.read_line(0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LineSenseError>(),
        Some(LineSenseError::State(_))
    ));
    assert!(sensor.read_calibrated().is_err());
    assert!(sensor.read_binary().is_err());

    sensor.finish_calibration();
    assert!(sensor.read_line(0).is_ok());
}

#[rstest]
fn calibrate_step_requires_the_calibration_phase() {
    let mut sensor = build_line_sensor(scripted(2, &[]), cfg(2)).unwrap();
    let err = sensor.calibrate_step().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LineSenseError>(),
        Some(LineSenseError::State(_))
    ));
}

#[rstest]
fn uncalibrated_read_finalizes_implicitly() {
    let mut sensor = build_line_sensor(ScriptedSource::new(vec![vec![500, 500]]), cfg(2)).unwrap();
    let r = sensor.read_line(0).unwrap();
    assert_eq!(sensor.phase(), Phase::Ready);
    // never-observed bounds are degenerate and read 0
    assert_eq!(r.calibrated.as_slice(), &[0, 0]);
    assert!(r.gap);
    assert_eq!(sensor.calibration().degenerate_count(), 2);
}

#[rstest]
fn calibrate_for_runs_at_least_one_sweep() {
    let clock = ManualClock::new();
    let mut sensor = build_line_sensor(scripted(2, &[]), cfg(2)).unwrap();
    let state = sensor.calibrate_for(Duration::ZERO, &clock).unwrap();
    assert_eq!(state.observations(), 1);
}

#[rstest]
fn calibrate_for_stops_when_the_budget_elapses() {
    let clock = ManualClock::new();
    let mut sensor = build_line_sensor(scripted(2, &[]), cfg(2)).unwrap();
    let state = sensor.calibrate_for(Duration::from_millis(10), &clock).unwrap();
    // one sweep per 1 ms sleep, plus the sweep that observes expiry
    assert_eq!(state.observations(), 11);
    assert!(state.is_finalized());
}

#[rstest]
fn sampling_failure_during_calibration_keeps_the_phase() {
    let src = scripted(2, &[]).failing_after(3);
    let mut sensor = build_line_sensor(src, cfg(2)).unwrap();
    let err = sensor.calibrate_iterations(5).unwrap_err();
    assert!(format!("{err:#}").contains("calibration sweep"));
    assert!(matches!(
        err.downcast_ref::<LineSenseError>(),
        Some(LineSenseError::Hardware(_))
    ));
    assert_eq!(sensor.phase(), Phase::Calibrating);
}

#[rstest]
fn ambient_mode_samples_with_the_emitter_off() {
    let on = vec![vec![150, 150], vec![950, 950], vec![550, 950]];
    let off = vec![vec![50, 50], vec![50, 50], vec![50, 50]];
    let src = ScriptedSource::new(on).with_off_rows(off);
    let mut sensor = build_line_sensor(
        src,
        SensorCfg {
            ambient: true,
            ..cfg(2)
        },
    )
    .unwrap();
    sensor.calibrate_iterations(2).unwrap();
    let off_bounds = sensor.calibration().sensors()[0].off;
    assert_eq!((off_bounds.min, off_bounds.max), (50, 50));

    let raw = sensor.read_raw().unwrap();
    assert_eq!(raw.off.as_deref(), Some(&[50u16, 50][..]));
    assert!(sensor.source().emitter_on());

    // lo_eff = 150 - 50 = 100, hi_eff = 950 - 50 = 900
    let r = sensor.read_line(0);
    assert!(r.is_ok());
}

#[rstest]
fn light_line_polarity_inverts_calibrated_values() {
    let src = scripted(2, &[vec![100, 900]]);
    let mut sensor = build_line_sensor(
        src,
        SensorCfg {
            polarity: LinePolarity::LightLine,
            ..cfg(2)
        },
    )
    .unwrap();
    sensor.calibrate_iterations(2).unwrap();
    let v = sensor.read_calibrated().unwrap();
    assert_eq!(v.as_slice(), &[1000, 0]);
}

#[rstest]
fn binary_thresholds_can_be_changed() {
    let src = scripted(3, &[vec![500, 500, 500]]);
    let mut sensor = build_line_sensor(src, cfg(3)).unwrap();
    sensor.calibrate_iterations(2).unwrap();
    sensor.set_binary_thresholds(200, 400);
    assert_eq!(sensor.thresholds(), &Thresholds::new(200, 400));
    assert_eq!(sensor.read_binary().unwrap().to_string(), "111");
    assert!(!sensor.gap_detection());
}

#[rstest]
fn process_frame_checks_shape() {
    let mut sensor = build_line_sensor(NoopSource, cfg(3)).unwrap();
    sensor.begin_calibration();
    sensor
        .observe_frame(&RawReading::from_slices(&[100, 100, 100], None))
        .unwrap();
    sensor
        .observe_frame(&RawReading::from_slices(&[900, 900, 900], None))
        .unwrap();
    sensor.finish_calibration();

    let err = sensor
        .process_frame(&RawReading::from_slices(&[1, 2], None), 0)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<LineSenseError>(),
        Some(&LineSenseError::FrameShape {
            expected: 3,
            got: 2
        })
    );

    let r = sensor
        .process_frame(&RawReading::from_slices(&[100, 100, 900], None), 0)
        .unwrap();
    assert_eq!(r.bits.to_string(), "001");
    assert_eq!(r.position, 2000);
}

#[rstest]
fn compute_error_uses_the_stored_bits_by_default() {
    let src = scripted(8, &[vec![100, 100, 100, 100, 100, 100, 100, 900]]);
    let mut sensor = build_line_sensor(src, cfg(8)).unwrap();
    sensor.calibrate_iterations(2).unwrap();
    sensor.read_binary().unwrap();
    assert_eq!(sensor.compute_error_from_bits(None, 0), 7000);
    let other = "10000000".parse().unwrap();
    assert_eq!(sensor.compute_error_from_bits(Some(&other), 0), -7000);
}

#[rstest]
fn source_errors_carry_channel_context() {
    let mut sensor = build_line_sensor(NoopSource, cfg(2)).unwrap();
    let err = sensor.read_raw().unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("sampling channel 0"), "{chain}");
}
