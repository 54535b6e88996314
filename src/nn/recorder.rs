//! Training-data recorder
//!
//! One append-only file per game, newline-delimited JSON records. The file
//! is created lazily on the first recorded decision so short-lived scratch
//! controllers never leave empty files behind. All writes are mutually
//! exclusive per instance because the surrounding engine may call in from
//! multiple game threads through the same controller.

use crate::game::GameLogger;
use crate::nn::features::OptionRow;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Total decision records written, across all games
pub static DECISIONS_RECORDED: AtomicU64 = AtomicU64::new(0);

/// Total game files completed, across all games
pub static GAMES_RECORDED: AtomicU64 = AtomicU64::new(0);

/// One recorded decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub turn: u32,
    pub phase: String,
    #[serde(rename = "decisionType")]
    pub decision_type: String,
    pub state: Vec<f32>,
    pub options: Vec<Vec<f32>>,
    #[serde(rename = "numOptions")]
    pub num_options: usize,
    #[serde(rename = "chosenIndex")]
    pub chosen_index: usize,
}

/// The final record of a game file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub result: f64,
    pub turns: u32,
    pub reason: String,
}

struct RecorderInner {
    directory: PathBuf,
    writer: Option<BufWriter<File>>,
    closed: bool,
    io_error_logged: bool,
}

/// Per-game training-data file
pub struct GameRecorder {
    inner: Mutex<RecorderInner>,
    logger: GameLogger,
}

impl GameRecorder {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        GameRecorder {
            inner: Mutex::new(RecorderInner {
                directory: directory.into(),
                writer: None,
                closed: false,
                io_error_logged: false,
            }),
            logger: GameLogger::new(),
        }
    }

    pub fn with_logger(mut self, logger: GameLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Record one decision; creates the file on first call
    pub fn record_decision(
        &self,
        turn: u32,
        phase: &str,
        decision_type: &str,
        state: &[f32],
        options: &[OptionRow],
        chosen_index: usize,
    ) {
        let record = DecisionRecord {
            record_type: "decision".to_string(),
            turn,
            phase: phase.to_string(),
            decision_type: decision_type.to_string(),
            state: state.to_vec(),
            options: options.iter().map(|r| r.to_vec()).collect(),
            num_options: options.len(),
            chosen_index,
        };

        let mut inner = self.inner.lock().expect("recorder lock poisoned");
        if inner.closed {
            return;
        }
        if self.write_record(&mut inner, &record) {
            DECISIONS_RECORDED.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Write the outcome record and close the file
    ///
    /// Later writes are silently dropped. Calling this without any recorded
    /// decision writes nothing (no empty files).
    pub fn finish_game(&self, won: bool, turns: u32, reason: &str) {
        let record = OutcomeRecord {
            record_type: "outcome".to_string(),
            result: if won { 1.0 } else { 0.0 },
            turns,
            reason: reason.to_string(),
        };

        let mut inner = self.inner.lock().expect("recorder lock poisoned");
        if inner.closed {
            return;
        }
        if inner.writer.is_some() {
            if self.write_record(&mut inner, &record) {
                GAMES_RECORDED.fetch_add(1, Ordering::Relaxed);
            }
            if let Some(mut writer) = inner.writer.take() {
                let _ = writer.flush();
            }
        }
        inner.closed = true;
    }

    /// Has the recorder created its file yet?
    pub fn has_file(&self) -> bool {
        self.inner
            .lock()
            .expect("recorder lock poisoned")
            .writer
            .is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().expect("recorder lock poisoned").closed
    }

    fn write_record<T: Serialize>(&self, inner: &mut RecorderInner, record: &T) -> bool {
        if inner.writer.is_none() {
            match Self::open_file(&inner.directory) {
                Ok(writer) => inner.writer = Some(writer),
                Err(err) => {
                    self.log_io_error_once(inner, &err);
                    inner.closed = true;
                    return false;
                }
            }
        }

        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(err) => {
                self.logger
                    .warn(format!("training record serialization failed: {}", err));
                return false;
            }
        };

        let writer = inner.writer.as_mut().expect("writer just ensured");
        if let Err(err) = writeln!(writer, "{}", line) {
            self.log_io_error_once(inner, &err);
            inner.writer = None;
            inner.closed = true;
            return false;
        }
        true
    }

    /// IO failure policy: log once, mark closed, never crash the game
    fn log_io_error_once(&self, inner: &mut RecorderInner, err: &std::io::Error) {
        if !inner.io_error_logged {
            self.logger
                .warn(format!("training recorder disabled after IO error: {}", err));
            inner.io_error_logged = true;
        }
    }

    fn open_file(directory: &PathBuf) -> std::io::Result<BufWriter<File>> {
        fs::create_dir_all(directory)?;
        let path = directory.join(format!("game_{}_{}.ndjson", Uuid::now_v7(), epoch_millis()));
        Ok(BufWriter::new(File::create(path)?))
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
