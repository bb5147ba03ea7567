use derive_more::Display;

/// Input-shape problems the core can detect. None of these abort an aggregation;
/// callers either skip the offending record or reject the request up front.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TrackingError {
    #[display(fmt = "malformed date: {:?}", _0)]
    MalformedDate(String),
    #[display(fmt = "month must be between 1 and 12, got {}", _0)]
    InvalidMonth(u32),
}

impl std::error::Error for TrackingError {}
