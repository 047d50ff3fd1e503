use std::fmt;
use std::io;

/// The error type returned by this crate's internal, fallible helpers.
///
/// None of these ever escape the public API (`allocate`/`release`/`resize`):
/// they are collapsed to the documented null/no-op ABI at the boundary.
#[derive(Debug)]
pub enum Error {
  /// An argument was outside the range this crate is willing to accept.
  InvalidParameter(&'static str),
  /// The underlying OS mapping primitive failed.
  SystemCall(io::Error),
  /// A pointer did not fall within any region currently owned by the pool.
  UnmappedRegion,
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::InvalidParameter(what) => write!(f, "invalid parameter: {}", what),
      Error::SystemCall(err) => write!(f, "system call failed: {}", err),
      Error::UnmappedRegion => write!(f, "pointer does not belong to any region"),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Error::SystemCall(err) => Some(err),
      _ => None,
    }
  }
}

impl From<io::Error> for Error {
  fn from(err: io::Error) -> Self {
    Error::SystemCall(err)
  }
}

/// A specialized `Result` type for this crate's internal fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
