// Consistent exit codes for the folio CLI.
//
//   0 = success
//   1 = general error
//   2 = usage, validation or config error
//   3 = page or version not found
//   4 = history integrity failure

use std::process;

use folio_engine::config::ConfigError;
use folio_engine::EngineError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotFound = 3,
    Integrity = 4,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(engine) = cause.downcast_ref::<EngineError>() {
                return Self::from_engine(engine);
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::Usage;
            }
        }
        Self::Error
    }

    pub fn from_engine(err: &EngineError) -> Self {
        match err {
            EngineError::PageNotFound(_) | EngineError::VersionNotFound { .. } => Self::NotFound,
            EngineError::Integrity { .. } | EngineError::PatchApplication { .. } => Self::Integrity,
            EngineError::InvalidMove { .. }
            | EngineError::InvalidTitle(_)
            | EngineError::Validation(_) => Self::Usage,
            EngineError::Store(_) => Self::Error,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}
