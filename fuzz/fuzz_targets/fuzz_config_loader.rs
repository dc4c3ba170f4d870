#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validate must reject bad input with an error, never a panic.
    if let Ok(cfg) = toml::from_str::<linesense_config::Config>(data)
        && cfg.validate().is_ok()
    {
        // A valid config must also map onto the runtime types.
        let _ = linesense_core::SensorCfg::from(&cfg);
        let _ = linesense_core::CalibrationPlan::from(&cfg.calibration);
    }
});
