#![no_main]
use libfuzzer_sys::fuzz_target;
use linesense_core::mocks::NoopSource;
use linesense_core::{RawReading, SensorCfg, build_line_sensor, run_frames};

fuzz_target!(|data: &[u8]| {
    // Arbitrary CSV through the frame loader, calibration and the whole pipeline.
    let Ok(frames) = linesense_config::parse_frames(data) else {
        return;
    };
    let frames: Vec<RawReading> = frames.iter().map(RawReading::from).collect();
    let width = frames.first().map_or(0, |f| f.on.len());
    let cfg = SensorCfg {
        channels: (0..width).filter_map(|i| u8::try_from(i).ok()).collect(),
        ambient: frames.first().is_some_and(|f| f.off.is_some()),
        ..SensorCfg::default()
    };
    let Ok(mut sensor) = build_line_sensor(NoopSource, cfg) else {
        return;
    };
    if sensor.calibrate_from_frames(&frames).is_err() {
        return;
    }
    if let Ok(summary) = run_frames(&mut sensor, &frames, |_, r| {
        assert!((-7..=7).contains(&r.steps));
        assert!(r.calibrated.iter().all(|&v| v <= 1000));
    }) {
        assert_eq!(summary.cycles as usize, frames.len());
    }
});
