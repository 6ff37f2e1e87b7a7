use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Payload is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    #[error("Store append timed out after {0:?}")]
    StoreTimeout(std::time::Duration),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
