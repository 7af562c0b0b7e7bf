use thiserror::Error;

/// Structural failures of the rule source. Fatal: cell-level oddities are
/// tolerated, but a source with no usable rule sheets cannot be processed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("rule source contains no rule sheets (only metadata or empty sheets)")]
    NoRuleSheets,
}

/// Interpretation failures. An oracle payload that does not conform to the
/// descriptor contract is a hard failure, never silently degraded.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("oracle payload is not valid rule JSON: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("oracle payload violates the descriptor contract: {0}")]
    Contract(String),
    #[error("descriptor cache io: {0}")]
    CacheIo(#[from] std::io::Error),
    #[error("descriptor cache is not valid JSON: {0}")]
    CacheFormat(serde_json::Error),
}
