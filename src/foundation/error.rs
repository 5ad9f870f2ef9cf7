pub type LumoResult<T> = Result<T, LumoError>;

#[derive(thiserror::Error, Debug)]
pub enum LumoError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("allocation error: {0}")]
    Allocation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LumoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }
}
