use thiserror::Error;

/// Invalid or missing runtime configuration. Always fatal: raised while
/// settings are loaded, before any store or transport handle exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid setting {var}={value:?}: {reason}")]
    InvalidSetting { var: &'static str, value: String, reason: String },
}

/// A detail payload that cannot be turned into a `Condition`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("payload is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("payload contains no condition record")]
    Empty,
}

/// Configured action mode is not one of the known spellings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown action mode {0:?} (expected SendMessage, CreateTicket or Both)")]
pub struct UnknownActionMode(pub String);
