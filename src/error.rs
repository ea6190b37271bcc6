use thiserror::Error;

/// Rejections raised while turning stored or imported rows into `ReviewRecord`s.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("rating {0} is outside the 1-5 range")]
    RatingOutOfRange(i32),
    #[error("unknown sentiment label '{0}'")]
    UnknownSentiment(String),
    #[error("review has a response timestamp but is not marked as responded")]
    ResponseWithoutFlag,
    #[error("malformed row: {0}")]
    Malformed(String),
}
