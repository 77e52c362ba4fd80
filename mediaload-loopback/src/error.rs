pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("room `{room}` rejected {name}")]
    Rejected { room: String, name: String },

    #[error("{0} has not joined a room")]
    NotJoined(String),

    #[error("{0} was stopped")]
    Stopped(String),
}
