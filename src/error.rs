use thiserror::Error;

/// Errors raised while validating or transforming skinning data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An op was handed something that is not `SmoothSkinningData`.
    #[error("{op}: expected input of type {expected}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
    },

    /// The data or an op parameter broke an invariant.
    #[error("{0}")]
    Validation(String),
}

impl Error {
    pub(crate) fn validation<S: Into<String>>(message: S) -> Error {
        Error::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
