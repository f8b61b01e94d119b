//! Process exit statuses.
//!
//! `0` and `3` are analysis outcomes; `11` and `12` are problems the user can
//! fix in the config or the input files; `21` is the filesystem. Argument
//! errors exit with clap's own status `2`.

use tt_common::{Error, ErrorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Clean = 0,
    /// A statistic had an empty denominator or population.
    InsufficientData = 3,
    ConfigError = 11,
    /// Malformed or unsorted time tags.
    InputError = 12,
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Name used in JSON error envelopes.
    pub fn code_name(self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::InsufficientData => "ERR_INSUFFICIENT_DATA",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::IoError => "ERR_IO",
        }
    }

    pub fn for_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Input => ExitCode::InputError,
            ErrorCategory::InsufficientData => ExitCode::InsufficientData,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.code_name(), self.as_i32())
    }
}
