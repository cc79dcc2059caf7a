//! Single-pass streaming loader for tab-separated trace files.
//!
//! The first input line carries the headers. Column types start out as
//! `Integer` and are sniffed over a bounded sample window: any value that is
//! neither a hex literal nor a signed decimal integer downgrades its column
//! to `StringCode` (or `RawString` for the terminal header, the only place
//! free text is tolerated). When the window closes the buffered raw values
//! are replayed into their finalized storage and later rows append directly.
//!
//! Loading is a restartable state machine pumped by the caller through
//! [`LoadTask::step`], which checks a [`CancelToken`] at every step boundary
//! so an in-flight load can be abandoned without unbounded continuation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{LoadError, RowError};
use crate::events::{SharedBus, ViewerEvent};
use crate::stream::{ByteSource, LineSource};
use crate::table::{shared_table, Column, ColumnKind, SharedTable, Table};

#[derive(Clone, Copy, Debug)]
pub struct LoadOptions {
    /// Data lines sampled before column types are frozen.
    pub sample_rows: usize,
    /// Progress callback cadence, in input lines.
    pub progress_every: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sample_rows: 100,
            progress_every: 10_000,
        }
    }
}

/// Load lifecycle callbacks. All methods default to no-ops.
pub trait LoadObserver {
    /// Periodic progress with the cumulative input line count.
    fn progress(&mut self, _lines: u64) {}
    /// A row was skipped; loading continues.
    fn row_rejected(&mut self, _err: &RowError) {}
    /// The load completed with `rows` committed rows.
    fn finished(&mut self, _rows: usize) {}
    /// The load aborted. Never called for cancellation.
    fn failed(&mut self, _err: &LoadError) {}
}

pub struct NullObserver;

impl LoadObserver for NullObserver {}

/// Cooperative cancellation flag, checked at step boundaries only. A
/// cancelled load fires neither the finish nor the error callback and
/// leaves a partially populated table behind.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum Phase {
    Header,
    Sampling {
        kinds: Vec<ColumnKind>,
        rows: Vec<Vec<String>>,
    },
    Streaming,
    Finished,
}

pub struct TabLoader {
    opts: LoadOptions,
    table: SharedTable,
    bus: Option<SharedBus>,
    phase: Phase,
    line_no: u64,
    header_count: usize,
    coerce_warned: Vec<bool>,
}

impl TabLoader {
    pub fn new(opts: LoadOptions) -> Self {
        Self {
            opts,
            table: shared_table(),
            bus: None,
            phase: Phase::Header,
            line_no: 0,
            header_count: 0,
            coerce_warned: Vec::new(),
        }
    }

    pub fn with_bus(mut self, bus: SharedBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn table(&self) -> SharedTable {
        self.table.clone()
    }

    /// Input lines consumed so far, header included.
    pub fn lines_consumed(&self) -> u64 {
        self.line_no
    }

    fn publish(&self, event: ViewerEvent) {
        if let Some(bus) = &self.bus {
            bus.borrow_mut().publish(&event);
        }
    }

    pub fn push_line(&mut self, line: &str, obs: &mut dyn LoadObserver) {
        self.line_no += 1;
        match &mut self.phase {
            Phase::Header => {
                let headers: Vec<String> = line.split('\t').map(str::to_string).collect();
                self.header_count = headers.len();
                self.coerce_warned = vec![false; headers.len()];
                self.table.write().set_headers(headers);
                self.phase = Phase::Sampling {
                    kinds: vec![ColumnKind::Integer; self.header_count],
                    rows: Vec::new(),
                };
            }
            Phase::Sampling { kinds, rows } => {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() > self.header_count {
                    let err = RowError::TooManyFields {
                        line: self.line_no,
                        fields: fields.len(),
                        headers: self.header_count,
                    };
                    obs.row_rejected(&err);
                    self.publish(ViewerEvent::RowRejected { line: self.line_no });
                    return;
                }
                // Missing trailing values are neutral for detection; they
                // commit as empty/zero according to the finalized kind.
                for (i, kind) in kinds.iter_mut().enumerate() {
                    let value = fields.get(i).copied().unwrap_or("");
                    if value.is_empty() || *kind != ColumnKind::Integer {
                        continue;
                    }
                    if parse_int(value).is_none() {
                        *kind = if i + 1 == self.header_count {
                            ColumnKind::RawString
                        } else {
                            ColumnKind::StringCode
                        };
                    }
                }
                rows.push(fields.iter().map(|f| f.to_string()).collect());
                if rows.len() == self.opts.sample_rows {
                    self.close_sample_window();
                }
            }
            Phase::Streaming => {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() > self.header_count {
                    let err = RowError::TooManyFields {
                        line: self.line_no,
                        fields: fields.len(),
                        headers: self.header_count,
                    };
                    obs.row_rejected(&err);
                    self.publish(ViewerEvent::RowRejected { line: self.line_no });
                    return;
                }
                let mut table = self.table.write();
                commit_row(&mut table, &fields, &mut self.coerce_warned);
            }
            Phase::Finished => {}
        }

        if self.opts.progress_every > 0 && self.line_no % self.opts.progress_every == 0 {
            obs.progress(self.line_no);
            self.publish(ViewerEvent::LoadProgress {
                lines: self.line_no,
            });
        }
    }

    /// Replays the buffered sample rows into their finalized columns.
    fn close_sample_window(&mut self) {
        let (kinds, rows) = match std::mem::replace(&mut self.phase, Phase::Streaming) {
            Phase::Sampling { kinds, rows } => (kinds, rows),
            other => {
                self.phase = other;
                return;
            }
        };
        debug!(?kinds, sampled = rows.len(), "type window closed");
        let mut table = self.table.write();
        table.set_columns(kinds.into_iter().map(Column::new).collect());
        for fields in &rows {
            commit_row(&mut table, fields, &mut self.coerce_warned);
        }
    }

    /// Closes the load. Returns the committed row count, or `None` when the
    /// stream never produced a header line.
    pub fn finish(&mut self, obs: &mut dyn LoadObserver) -> Option<usize> {
        match self.phase {
            Phase::Header => {
                self.phase = Phase::Finished;
                obs.failed(&LoadError::EmptyInput);
                self.publish(ViewerEvent::LoadFailed { line: 0 });
                None
            }
            Phase::Sampling { .. } => {
                self.close_sample_window();
                self.phase = Phase::Finished;
                self.announce_finished(obs)
            }
            Phase::Streaming => {
                self.phase = Phase::Finished;
                self.announce_finished(obs)
            }
            Phase::Finished => Some(self.table.read().row_count()),
        }
    }

    fn announce_finished(&mut self, obs: &mut dyn LoadObserver) -> Option<usize> {
        let rows = self.table.read().row_count();
        info!(rows, lines = self.line_no, "load finished");
        obs.finished(rows);
        self.publish(ViewerEvent::LoadFinished { rows });
        Some(rows)
    }
}

fn commit_row<S: AsRef<str>>(table: &mut Table, fields: &[S], coerce_warned: &mut [bool]) {
    for i in 0..table.headers().len() {
        let value = fields.get(i).map(|f| f.as_ref()).unwrap_or("");
        let column = table.column_mut(i);
        match column.kind() {
            ColumnKind::Integer => {
                let v = if value.is_empty() {
                    0
                } else {
                    match parse_int(value) {
                        Some(v) => v,
                        None => {
                            // Type is frozen after the sample window; late
                            // non-numeric values coerce best-effort.
                            if !coerce_warned[i] {
                                coerce_warned[i] = true;
                                warn!(column = i, value, "non-numeric value in integer column");
                            }
                            0
                        }
                    }
                };
                column.push_int(v);
            }
            ColumnKind::StringCode => {
                column.push_code(value);
            }
            ColumnKind::RawString => {
                column.push_text(value);
            }
        }
    }
    table.commit_row();
}

/// Parses a hex (`0x`/`0X` prefix) or signed decimal integer literal.
pub fn parse_int(value: &str) -> Option<i32> {
    let t = value.trim();
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(|v| v as i32)
    } else {
        t.parse::<i32>().ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    InProgress,
    Finished { rows: usize },
    Cancelled,
    Failed,
}

/// Default lines consumed per [`LoadTask::run`] slice.
pub const DEFAULT_STEP_LINES: usize = 4096;

/// Cooperative driver feeding a [`LineSource`] through a [`TabLoader`].
/// Callers pump [`step`](Self::step) from their own scheduler; each call
/// consumes at most `budget` lines before yielding back.
pub struct LoadTask {
    loader: TabLoader,
    lines: LineSource,
    cancel: CancelToken,
    status: LoadStatus,
}

impl LoadTask {
    pub fn new(source: Box<dyn ByteSource>, opts: LoadOptions, cancel: CancelToken) -> Self {
        Self {
            loader: TabLoader::new(opts),
            lines: LineSource::new(source),
            cancel,
            status: LoadStatus::InProgress,
        }
    }

    pub fn with_bus(mut self, bus: SharedBus) -> Self {
        self.loader = self.loader.with_bus(bus);
        self
    }

    pub fn table(&self) -> SharedTable {
        self.loader.table()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Input bytes consumed so far (compressed bytes for a zstd source).
    pub fn bytes_progress(&self) -> u64 {
        self.lines.progress()
    }

    pub fn step(&mut self, budget: usize, obs: &mut dyn LoadObserver) -> LoadStatus {
        if self.status != LoadStatus::InProgress {
            return self.status;
        }
        if self.cancel.is_cancelled() {
            // No callbacks fire; the partial table is the caller's to drop.
            self.status = LoadStatus::Cancelled;
            return self.status;
        }
        for _ in 0..budget {
            match self.lines.next_line() {
                Ok(Some(line)) => self.loader.push_line(&line, obs),
                Ok(None) => {
                    self.status = match self.loader.finish(obs) {
                        Some(rows) => LoadStatus::Finished { rows },
                        None => LoadStatus::Failed,
                    };
                    return self.status;
                }
                Err(err) => {
                    let line = self.loader.lines_consumed() + 1;
                    let err = match err {
                        LoadError::Io(e) => LoadError::Stream {
                            line,
                            message: e.to_string(),
                        },
                        LoadError::Stream { message, .. } => LoadError::Stream { line, message },
                        other => other,
                    };
                    obs.failed(&err);
                    if let Some(bus) = &self.loader.bus {
                        bus.borrow_mut().publish(&ViewerEvent::LoadFailed { line });
                    }
                    self.status = LoadStatus::Failed;
                    return self.status;
                }
            }
        }
        LoadStatus::InProgress
    }

    /// Drives the load to a terminal state in budgeted slices.
    pub fn run(&mut self, obs: &mut dyn LoadObserver) -> LoadStatus {
        loop {
            match self.step(DEFAULT_STEP_LINES, obs) {
                LoadStatus::InProgress => continue,
                terminal => return terminal,
            }
        }
    }
}
