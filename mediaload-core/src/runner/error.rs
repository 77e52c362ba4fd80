pub type Result<T> = std::result::Result<T, Error>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("`identity_range` must be `<int>-<int>` (got `{0}`)")]
    InvalidIdentityRange(String),

    #[error("`identity_range` bounds must be integers (got `{0}`)")]
    InvalidIdentityBound(String),

    #[error("`identity_range` `{0}` contains no identities")]
    EmptyIdentityRange(String),

    #[error("identity `{0}` is listed more than once")]
    DuplicateIdentity(String),

    #[error("identity `{0}` collides with a generated subscriber name")]
    ReservedIdentity(String),

    #[error("`num_per_second` must be a non-negative number (got {0})")]
    InvalidRate(f64),

    #[error("invalid video file name `{0}` (expected `<prefix>_<height>_<kbps>_<fps>.h264`)")]
    InvalidVideoSpec(String),

    #[error("could not connect {name}: {source}")]
    Session {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("{name} could not publish {track}: {source}")]
    Publish {
        name: String,
        track: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("run cancelled")]
    Cancelled,
}

impl Error {
    /// Name of the session that caused the failure, if any.
    pub fn session_name(&self) -> Option<&str> {
        match self {
            Self::Session { name, .. } | Self::Publish { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentityRange(_)
                | Self::InvalidIdentityBound(_)
                | Self::EmptyIdentityRange(_)
                | Self::DuplicateIdentity(_)
                | Self::ReservedIdentity(_)
                | Self::InvalidRate(_)
                | Self::InvalidVideoSpec(_)
        )
    }
}
