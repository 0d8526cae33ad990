pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("pool already has the maximum number of outstanding tasks")]
    TooManyTasks,

    #[error("task was already pushed to a pool")]
    TaskAlreadyPushed,

    #[error("pool still has queued or running tasks")]
    HasPendingTasks,

    #[error("task was never pushed to a pool")]
    TaskNotPushed,

    #[error("task is still queued or running")]
    TaskStillQueued,

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("timed out waiting for task completion")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
