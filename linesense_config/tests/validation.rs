use linesense_config::{GrayZone, Polarity, SamplingKind, load_toml};
use rstest::rstest;

const BASE: &str = r#"
[sensors]
channels = [0, 1, 2, 3, 4, 5, 6, 7]
"#;

fn with(extra: &str) -> String {
    format!("{BASE}\n{extra}")
}

#[test]
fn minimal_config_uses_defaults() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("defaults should validate");
    assert_eq!(cfg.sensors.samples_per_sensor, 4);
    assert_eq!(cfg.sampling.mode, SamplingKind::Analog);
    assert_eq!(cfg.sampling.raw_max, 1023);
    assert_eq!(cfg.thresholds.white, 300);
    assert_eq!(cfg.thresholds.black, 700);
    assert_eq!(cfg.thresholds.gray_zone, GrayZone::Background);
    assert_eq!(cfg.line.polarity, Polarity::Dark);
    assert!(!cfg.line.ambient);
    assert!((cfg.classifier.centroid_gain - 2.0).abs() < f32::EPSILON);
}

#[test]
fn full_config_parses() {
    let toml = r#"
[sensors]
channels = [0, 1, 2, 3, 4, 5]
samples_per_sensor = 2
emitter_pin = 17
rc_pins = [5, 6, 13, 19, 26, 21]

[sampling]
mode = "timed"
timeout_us = 3000

[thresholds]
white = 200
black = 650
gray_zone = "line"

[classifier]
centroid_gain = 1.5

[line]
polarity = "light"
ambient = true

[calibration]
iterations = 400

[runner]
cycle_hz = 250
max_cycles = 1000

[logging]
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.sampling.mode, SamplingKind::Timed);
    assert_eq!(cfg.sensors.emitter_pin, Some(17));
    assert_eq!(cfg.calibration.iterations, Some(400));
    assert_eq!(cfg.line.polarity, Polarity::Light);
    assert_eq!(cfg.thresholds.gray_zone, GrayZone::Line);
}

#[test]
fn oversized_channel_list_is_not_a_validation_error() {
    let channels: Vec<String> = (0..20).map(|c| c.to_string()).collect();
    let toml = format!("[sensors]\nchannels = [{}]\n", channels.join(", "));
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("channel overflow is clamped by the core");
}

#[test]
fn zero_samples_is_not_a_validation_error() {
    let toml = "[sensors]\nchannels = [0]\nsamples_per_sensor = 0\n";
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("zero samples is coerced by the core");
}

#[rstest]
#[case("[thresholds]\nwhite = 1200\nblack = 1300\n", "thresholds.white must be in")]
#[case("[thresholds]\nwhite = 100\nblack = 1001\n", "thresholds.black must be in")]
#[case("[thresholds]\nwhite = 700\nblack = 700\n", "white must be < thresholds.black")]
#[case("[sampling]\nraw_max = 0\n", "raw_max must be >= 1")]
#[case("[sampling]\nmode = \"timed\"\ntimeout_us = 0\n", "timeout_us must be >= 1")]
#[case("[classifier]\ncentroid_gain = 0.0\n", "centroid_gain must be in")]
#[case("[classifier]\ncentroid_gain = 20.0\n", "centroid_gain must be in")]
#[case("[calibration]\niterations = 0\n", "iterations must be >= 1")]
#[case("[calibration]\nduration_ms = 0\n", "duration_ms must be >= 1")]
#[case("[runner]\ncycle_hz = 0\n", "cycle_hz must be > 0")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
fn rejects_invalid_values(#[case] extra: &str, #[case] needle: &str) {
    let cfg = load_toml(&with(extra)).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        err.to_string().contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn timed_mode_requires_rc_pin_per_channel() {
    let toml = r#"
[sensors]
channels = [0, 1, 2]
rc_pins = [5, 6]

[sampling]
mode = "timed"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("channel 2 has no pin");
    assert!(err.to_string().contains("entry 2"));
}

#[test]
fn missing_sensors_section_fails_to_parse() {
    assert!(load_toml("[sampling]\nraw_max = 1023\n").is_err());
}
