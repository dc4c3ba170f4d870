//! tracing-subscriber setup: console layer plus optional rotating JSON file.

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::FILE_GUARD;

fn rotation(name: Option<&str>) -> tracing_appender::rolling::Rotation {
    use tracing_appender::rolling::Rotation;
    match name {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--log-level`,
/// which wins over `[logging].level`.
///
/// Console output goes to stderr so stdout stays machine-readable.
pub fn init(json: bool, cli_level: Option<&str>, cfg: Option<&linesense_config::Logging>) {
    let level = cli_level
        .or_else(|| cfg.and_then(|c| c.level.as_deref()))
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (pretty, structured) = if json {
        let console = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        (None, Some(console.json()))
    } else {
        let console = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        (Some(console), None)
    };

    let file_layer = cfg.and_then(|c| c.file.as_deref()).map(|file| {
        let path = Path::new(file);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let name = path.file_name().map_or_else(
            || std::ffi::OsString::from("linesense.log"),
            std::ffi::OsStr::to_os_string,
        );
        let appender = tracing_appender::rolling::RollingFileAppender::new(
            rotation(cfg.and_then(|c| c.rotation.as_deref())),
            dir.unwrap_or_else(|| Path::new(".")),
            name,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
    });

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(structured)
        .with(file_layer)
        .try_init();
}
