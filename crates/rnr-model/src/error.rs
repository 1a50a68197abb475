use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("empty label")]
    EmptyLabel,
    #[error("unsupported label schema: {0}")]
    UnsupportedSchema(String),
}
