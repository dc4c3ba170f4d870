//! Test and helper sources for linesense_core.

use std::time::Duration;

use linesense_traits::{BoxError, SampleSource};

/// A source that errors on every sample; used when frames are fed in
/// directly through `LineSensor::process_frame`.
#[derive(Debug, Default)]
pub struct NoopSource;

impl SampleSource for NoopSource {
    fn sample_analog(&mut self, _channel: u8) -> Result<u16, BoxError> {
        Err(Box::new(std::io::Error::other("noop source")))
    }

    fn sample_timed(&mut self, _channel: u8, _timeout: Duration) -> Result<u16, BoxError> {
        Err(Box::new(std::io::Error::other("noop source")))
    }

    fn set_emitter(&mut self, _on: bool) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Plays back scripted rows, one value per channel per sample call.
///
/// Each channel keeps its own cursor into the row list; once a cursor reaches
/// the last row that row repeats. Emitter-off samples come from `off_rows`
/// (or read 0 when none were scripted). Timed samples are capped at the
/// requested timeout.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    on_rows: Vec<Vec<u16>>,
    off_rows: Vec<Vec<u16>>,
    on_cursor: Vec<usize>,
    off_cursor: Vec<usize>,
    emitter_on: bool,
    emitter_switches: u32,
    samples_taken: u64,
    fail_after: Option<u64>,
}

impl ScriptedSource {
    pub fn new(rows: Vec<Vec<u16>>) -> Self {
        Self {
            on_rows: rows,
            emitter_on: true,
            ..Self::default()
        }
    }

    /// Rows returned while the emitter is off.
    pub fn with_off_rows(mut self, rows: Vec<Vec<u16>>) -> Self {
        self.off_rows = rows;
        self
    }

    /// Fail every sample after `n` successful ones.
    pub fn failing_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn emitter_on(&self) -> bool {
        self.emitter_on
    }

    /// Number of `set_emitter` calls that changed the state.
    pub fn emitter_switches(&self) -> u32 {
        self.emitter_switches
    }

    pub fn samples_taken(&self) -> u64 {
        self.samples_taken
    }

    fn next(&mut self, channel: u8) -> Result<u16, BoxError> {
        if let Some(limit) = self.fail_after
            && self.samples_taken >= limit
        {
            return Err(Box::new(std::io::Error::other("scripted failure")));
        }
        self.samples_taken += 1;
        let ch = usize::from(channel);
        let (rows, cursors) = if self.emitter_on {
            (&self.on_rows, &mut self.on_cursor)
        } else {
            (&self.off_rows, &mut self.off_cursor)
        };
        if rows.is_empty() {
            return Ok(0);
        }
        if cursors.len() <= ch {
            cursors.resize(ch + 1, 0);
        }
        let row = &rows[cursors[ch].min(rows.len() - 1)];
        cursors[ch] += 1;
        row.get(ch)
            .copied()
            .ok_or_else(|| format!("scripted row has no channel {channel}").into())
    }
}

impl SampleSource for ScriptedSource {
    fn sample_analog(&mut self, channel: u8) -> Result<u16, BoxError> {
        self.next(channel)
    }

    fn sample_timed(&mut self, channel: u8, timeout: Duration) -> Result<u16, BoxError> {
        let ceiling = u16::try_from(timeout.as_micros()).unwrap_or(u16::MAX);
        Ok(self.next(channel)?.min(ceiling))
    }

    fn set_emitter(&mut self, on: bool) -> Result<(), BoxError> {
        if on != self.emitter_on {
            self.emitter_switches += 1;
        }
        self.emitter_on = on;
        Ok(())
    }
}
