use thiserror::Error;

/// One input parameter violating its declared constraint. Collected in
/// aggregate; a single bad value never hides the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub parameter: String,
    pub value: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parameter '{}': value '{}' rejected: {}",
            self.parameter, self.value, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

/// Internal contract violation in the resolution logic itself. Always fatal;
/// never downgraded to a default value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("condition '{0}' referenced but not defined")]
    UndefinedCondition(String),
    #[error("parameter '{0}' referenced but not present in the parameter set")]
    UnknownParameter(String),
    #[error("condition dependency cycle involving '{0}'")]
    ConditionCycle(String),
    #[error("parameter '{parameter}' holds non-numeric value '{value}' after validation")]
    NonNumericValue { parameter: String, value: String },
}

/// Error type of the full validate → evaluate → build pass.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{} parameter constraint violation(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

/// Semantically doubtful but schema-legal combination. Surfaced alongside the
/// document, never a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    ExpirationBeforeTransition {
        storage_class: String,
        transition_days: u32,
        expiration_days: u32,
    },
}

impl std::fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionWarning::ExpirationBeforeTransition {
                storage_class,
                transition_days,
                expiration_days,
            } => write!(
                f,
                "objects expire after {expiration_days} days but transition to {storage_class} after {transition_days}; the transition will never take effect"
            ),
        }
    }
}
