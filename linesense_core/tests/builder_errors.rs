use linesense_core::error::BuildError;
use linesense_core::mocks::{NoopSource, ScriptedSource};
use linesense_core::{
    BitVector, ClassifierCfg, LineSensor, MAX_SENSORS, Phase, SensorCfg, build_line_sensor,
};
use rstest::rstest;

#[rstest]
fn builder_missing_source_yields_typed_build_error() {
    let err = LineSensor::builder()
        .with_channels([0, 1, 2])
        .try_build()
        .expect_err("should fail with MissingSource");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSource) => {}
        other => panic!("expected MissingSource, got: {other:?}"),
    }
}

#[rstest]
fn builder_with_source_starts_uncalibrated() {
    let sensor = LineSensor::builder()
        .with_source(NoopSource)
        .with_channels(0..8)
        .build()
        .expect("build");
    assert_eq!(sensor.sensor_count(), 8);
    assert_eq!(sensor.phase(), Phase::Uncalibrated);
    assert!(sensor.bits().is_empty());
}

#[rstest]
fn channel_overflow_is_truncated() {
    let cfg = SensorCfg {
        channels: (0..(MAX_SENSORS as u8 + 4)).collect(),
        ..SensorCfg::default()
    };
    let sensor = build_line_sensor(NoopSource, cfg).expect("build");
    assert_eq!(sensor.sensor_count(), MAX_SENSORS);
    assert_eq!(sensor.calibration().sensors().len(), MAX_SENSORS);
}

#[rstest]
fn zero_samples_is_coerced_to_one() {
    let cfg = SensorCfg {
        channels: vec![0],
        samples_per_sensor: 0,
        ..SensorCfg::default()
    };
    let mut sensor = build_line_sensor(ScriptedSource::new(vec![vec![42]]), cfg).expect("build");
    let raw = sensor.read_raw().expect("read");
    assert_eq!(raw.on.as_slice(), &[42]);
    assert_eq!(sensor.source().samples_taken(), 1);
}

#[rstest]
fn zero_channels_reads_are_empty() {
    let mut sensor = build_line_sensor(NoopSource, SensorCfg::default()).expect("build");
    let reading = sensor.read_line(5).expect("empty read");
    assert!(reading.calibrated.is_empty());
    assert!(reading.bits.is_empty());
    assert!(!reading.gap);
    assert_eq!(reading.steps, 0);
    assert_eq!(reading.position, 0);
}

#[rstest]
fn build_turns_the_emitter_on() {
    let mut src = ScriptedSource::new(vec![vec![0]]);
    linesense_traits::SampleSource::set_emitter(&mut src, false).unwrap();
    let sensor = build_line_sensor(
        src,
        SensorCfg {
            channels: vec![0],
            ..SensorCfg::default()
        },
    )
    .expect("build");
    assert!(sensor.source().emitter_on());
}

#[rstest]
fn huge_centroid_gain_is_clamped() {
    let cfg = SensorCfg {
        channels: (0..5).collect(),
        classifier: ClassifierCfg {
            centroid_gain: f32::MAX,
        },
        ..SensorCfg::default()
    };
    let sensor = build_line_sensor(NoopSource, cfg).unwrap();
    let right: BitVector = "00010".parse().unwrap();
    assert_eq!(sensor.compute_error_from_bits(Some(&right), 0), 7000);
    let left: BitVector = "01000".parse().unwrap();
    assert_eq!(sensor.compute_error_from_bits(Some(&left), 0), -7000);
}
