use mediaload_core::runner::Error as RunnerError;

use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    SessionFailed(anyhow::Error),
    Interrupted(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::SessionFailed(_) => ExitCode::SessionFailed,
            Self::Interrupted(_) => ExitCode::Interrupted,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e)
            | Self::SessionFailed(e)
            | Self::Interrupted(e)
            | Self::RuntimeError(e) => e,
        }
    }
}

impl From<RunnerError> for RunError {
    fn from(err: RunnerError) -> Self {
        let wrap = match &err {
            RunnerError::Cancelled => Self::Interrupted,
            RunnerError::Session { .. } | RunnerError::Publish { .. } => Self::SessionFailed,
            e if e.is_config() => Self::InvalidInput,
            _ => Self::RuntimeError,
        };
        wrap(err.into())
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
