//! Client-side error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect: {0}")]
    ConnectionError(String),

    #[error("the server rejected username '{0}'")]
    UsernameRejected(String),
}
