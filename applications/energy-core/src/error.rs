use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("malformed reading identifier: {id}")]
    MalformedIdentifier { id: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
