use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use linesense_traits::{Clock, SampleSource};

use crate::config::RunParams;
use crate::error::Result;
use crate::sensor::{LineReading, LineSensor};
use crate::types::RawReading;
use crate::util::period_us;

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    /// Cycles in which every sensor read background.
    pub gaps: u64,
    pub last: Option<LineReading>,
}

impl RunSummary {
    fn record(&mut self, reading: LineReading) {
        self.cycles += 1;
        if reading.gap {
            self.gaps += 1;
        }
        self.last = Some(reading);
    }

    /// Steps of the last cycle, 0 before the first.
    pub fn last_steps(&self) -> i32 {
        self.last.as_ref().map_or(0, |r| i32::from(r.steps))
    }
}

/// Run paced decision cycles until `max_cycles` (0 = unbounded) or `stop`.
///
/// Each cycle's steps are fed back as `last_steps` for the next one. The
/// stop flag is checked between cycles, never inside one.
pub fn run_cycles<S, C, F>(
    sensor: &mut LineSensor<S>,
    params: &RunParams,
    clock: &C,
    stop: &AtomicBool,
    mut on_reading: F,
) -> Result<RunSummary>
where
    S: SampleSource,
    C: Clock,
    F: FnMut(u64, &LineReading),
{
    let period = Duration::from_micros(period_us(params.cycle_hz));
    let mut summary = RunSummary::default();
    tracing::info!(
        cycle_hz = params.cycle_hz,
        max_cycles = params.max_cycles,
        sensors = sensor.sensor_count(),
        "run start"
    );

    while !stop.load(Ordering::Relaxed)
        && (params.max_cycles == 0 || summary.cycles < params.max_cycles)
    {
        let started = clock.now();
        let reading = sensor
            .read_line(summary.last_steps())
            .wrap_err_with(|| format!("decision cycle {}", summary.cycles + 1))?;
        on_reading(summary.cycles + 1, &reading);
        summary.record(reading);

        let spent = clock.now().saturating_duration_since(started);
        if let Some(rest) = period.checked_sub(spent) {
            clock.sleep(rest);
        }
    }

    tracing::info!(cycles = summary.cycles, gaps = summary.gaps, "run finished");
    Ok(summary)
}

/// Feed recorded frames through the pipeline back to back, unpaced.
pub fn run_frames<S, F>(
    sensor: &mut LineSensor<S>,
    frames: &[RawReading],
    mut on_reading: F,
) -> Result<RunSummary>
where
    S: SampleSource,
    F: FnMut(u64, &LineReading),
{
    let mut summary = RunSummary::default();
    for frame in frames {
        let reading = sensor
            .process_frame(frame, summary.last_steps())
            .wrap_err_with(|| format!("replay frame {}", summary.cycles))?;
        on_reading(summary.cycles + 1, &reading);
        summary.record(reading);
    }
    tracing::info!(cycles = summary.cycles, gaps = summary.gaps, "replay finished");
    Ok(summary)
}
