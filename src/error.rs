use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    #[error("Room is full. Please try another room.")]
    RoomFull,
}

/// Why a move was refused without touching the board.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMove {
    #[error("cell {0} is off the board")]
    OutOfRange(i64),
    #[error("cell {0} is already taken")]
    Occupied(usize),
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("you have no mark in this game")]
    NoMark,
    #[error("the game is already over")]
    GameOver,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no game for room {0}")]
    UnknownRoom(String),
    #[error("invalid move: {0}")]
    Invalid(#[from] InvalidMove),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid PORT {0:?}")]
    InvalidPort(String),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
