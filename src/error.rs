use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Step buttons come from the same fixed list as the steps, so this only fires on a caller bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("Step index {index} out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },
    #[error("Narrative has no steps")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarouselError {
    #[error("Carousel item {0} does not exist")]
    UnknownItem(u32),
    #[error("Carousel position {index} out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("Form field '{0}' is missing")]
    FieldMissing(&'static str),
    #[error("Lead endpoint is not configured")]
    ConfigMissing,
    #[error("A submission is already in flight")]
    InFlight,
    #[error("Lead endpoint responded with status {0}")]
    Rejected(u16),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
