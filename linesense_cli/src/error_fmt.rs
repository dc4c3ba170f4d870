//! Human-readable error descriptions and structured JSON error formatting.

use linesense_core::{BuildError, LineSenseError, TableError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSource => {
                "What happened: No sample source was provided to the line sensor.\nLikely causes: The ADC or GPIO backend failed to initialize or was not wired into the builder.\nHow to fix: Ensure the source is created successfully and passed via with_source(...).".to_string()
            }
        };
    }

    if let Some(te) = err.downcast_ref::<TableError>() {
        return format!(
            "What happened: The pattern table is invalid ({te}).\nLikely causes: A custom table with a wrong width, a duplicate pattern, or a step outside -7..=7.\nHow to fix: Use eight-character 0/1 patterns, each listed once, with steps in range."
        );
    }

    if let Some(le) = err.downcast_ref::<LineSenseError>() {
        return match le {
            LineSenseError::Timeout => {
                "What happened: A sensor read timed out.\nLikely causes: Sensor not powered, wrong pins, or sampling.timeout_us set too low.\nHow to fix: Check wiring and [sensors] pins, and raise sampling.timeout_us in the config.".to_string()
            }
            LineSenseError::Unsupported(mode) => format!(
                "What happened: The sample source cannot do {mode} sampling.\nLikely causes: sampling.mode does not match the attached hardware.\nHow to fix: Use mode = \"analog\" for the MCP3008 and mode = \"timed\" for RC sensors."
            ),
            LineSenseError::FrameShape { expected, got } => format!(
                "What happened: A frame had {got} readings for a {expected}-sensor array.\nLikely causes: The recording was made with a different channel list.\nHow to fix: Record again with the current config, or replay with the config used to record."
            ),
            LineSenseError::State(msg) => format!(
                "What happened: Operation not allowed in the current phase ({msg}).\nLikely causes: Reading while calibration is still running.\nHow to fix: Finish calibration before reading the line."
            ),
            LineSenseError::Hardware(msg) | LineSenseError::HardwareFault(msg) => format!(
                "What happened: Hardware error ({msg}).\nLikely causes: Wiring, power, or insufficient SPI/GPIO permissions.\nHow to fix: Check the wiring and run with access to /dev/spidev* and /dev/gpiomem."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = format!("{err:#}").to_ascii_lowercase();

    if lower.contains("open mcp3008") || lower.contains("open rc sensor pins") {
        return "What happened: Failed to initialize the sensor hardware.\nLikely causes: SPI disabled, incorrect pin numbers, or insufficient GPIO permissions.\nHow to fix: Enable SPI, fix the [sensors] pin values, and ensure the process can access GPIO.".to_string();
    }

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid ({}).\nLikely causes: Out-of-range thresholds, sampling or calibration values.\nHow to fix: Edit the TOML config and try again.",
            innermost(err)
        );
    }

    if lower.contains("frame csv must have headers") {
        return "Invalid headers in frame CSV. Expected 's0,s1,...' optionally followed by 'off0,off1,...'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn innermost(err: &eyre::Report) -> String {
    err.chain()
        .last()
        .map_or_else(|| err.to_string(), ToString::to_string)
}

/// Stable exit codes: 3 for hardware, 4 for bad recordings, 1 otherwise.
/// Argument errors keep clap's own code 2.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(le) = err.downcast_ref::<LineSenseError>() {
        return match le {
            LineSenseError::Hardware(_)
            | LineSenseError::HardwareFault(_)
            | LineSenseError::Timeout
            | LineSenseError::Unsupported(_) => 3,
            LineSenseError::FrameShape { .. } => 4,
            LineSenseError::State(_) => 1,
        };
    }
    if format!("{err:#}")
        .to_ascii_lowercase()
        .contains("frame csv")
    {
        return 4;
    }
    1
}

/// Short stable name for the error kind, used as the JSON `reason`.
fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    if err.downcast_ref::<TableError>().is_some() {
        return "PatternTable";
    }
    match err.downcast_ref::<LineSenseError>() {
        Some(LineSenseError::Hardware(_) | LineSenseError::HardwareFault(_)) => "Hardware",
        Some(LineSenseError::Timeout) => "Timeout",
        Some(LineSenseError::Unsupported(_)) => "Unsupported",
        Some(LineSenseError::State(_)) => "State",
        Some(LineSenseError::FrameShape { .. }) => "FrameShape",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "exit_code": exit_code_for_error(err),
    });
    if let Some(LineSenseError::FrameShape { expected, got }) = err.downcast_ref::<LineSenseError>()
    {
        obj["details"] = json!({ "expected": expected, "got": got });
    }
    obj.to_string()
}
