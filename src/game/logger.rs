//! Centralized game logging
//!
//! A small verbosity-leveled logger owned by the game state. Controllers,
//! the search core and the recorder route diagnostic messages through it so
//! output stays attributable to a single game when many run in parallel.

use serde::{Deserialize, Serialize};

/// How much output a game produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// No output at all
    Silent,
    /// Important events only
    #[default]
    Normal,
    /// Everything, including per-branch search diagnostics
    Verbose,
}

/// Centralized logger for game events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameLogger {
    verbosity: VerbosityLevel,
}

impl GameLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger { verbosity }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Log an important event (shown at Normal and above)
    pub fn log(&self, message: impl AsRef<str>) {
        if self.verbosity >= VerbosityLevel::Normal {
            println!("{}", message.as_ref());
        }
    }

    /// Log a diagnostic detail (shown only at Verbose)
    pub fn diag(&self, message: impl AsRef<str>) {
        if self.verbosity >= VerbosityLevel::Verbose {
            eprintln!("{}", message.as_ref());
        }
    }

    /// Log a warning (shown unless Silent)
    pub fn warn(&self, message: impl AsRef<str>) {
        if self.verbosity > VerbosityLevel::Silent {
            eprintln!("warning: {}", message.as_ref());
        }
    }
}
