use num_enum::TryFromPrimitiveError;
use thiserror::Error as ThisError;

pub type Result<R, E = Error> = std::result::Result<R, E>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("IO Error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("Num Enum Error: {0:?}")]
    NumEnumOutcome(#[from] TryFromPrimitiveError<crate::DataCheckOutcome>),

    #[error("Empty Magic")]
    EmptyMagic,
}
