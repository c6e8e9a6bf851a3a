/// Errors raised while building or rendering alarms.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The comparison operator is not one of the CloudWatch operators.
    #[error("Comparison operator {0} is not supported.")]
    UnsupportedComparisonOperator(String),

    /// A metric adjuster rejected the metric or the alarm request.
    #[error("{0}")]
    UnsupportedAlarmConfiguration(String),

    /// The alarm request is internally inconsistent.
    #[error("{0}")]
    InvalidAlarmConfiguration(String),

    /// A required builder value was never set.
    #[error("{0}")]
    MissingConfiguration(&'static str),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
