use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown rule type: {0}")]
    UnknownRuleType(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
