/*!
Specialized `Error` and `Result` types for pageflow.
*/

use std::{convert, error, fmt, result};

/// Specialized `Error` type for pageflow errors.
///
/// Transient conditions are not errors: a channel with no message ready
/// reports `Ok(None)` from [`try_recv`](crate::proto::RequestChannel::try_recv)
/// rather than an `Error` variant. Everything below is fatal to the run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Error {
    /// Generic error type containing a string
    Other(&'static str),
    /// Configuration error.
    ///
    /// A command line or `Config` value is out of range or malformed.
    Config(&'static str),
    /// Resource setup error.
    ///
    /// The clock region, message channel or logfile could not be set up.
    Setup(&'static str),
    /// Protocol violation.
    ///
    /// A worker broke its contract (e.g. referenced an address outside
    /// the 15-bit range). The run is abandoned, not retried.
    Protocol(&'static str),
    /// Message channel error.
    ///
    /// Sending or receiving on the request channel failed hard.
    Channel(&'static str),
    /// The real-time watchdog deadline fired.
    Watchdog,
}

/// Convert from &str to error
impl convert::From<&'static str> for Error {
    fn from(error: &'static str) -> Self {
        Error::Other(error)
    }
}

impl Error {
    /// Returns a tuple representing the error description and its string value.
    pub fn to_str_pair(self) -> (&'static str, Option<&'static str>) {
        match self {
            Error::Other(e) => ("other error", Some(e)),
            Error::Config(e) => ("configuration error", Some(e)),
            Error::Setup(e) => ("resource setup error", Some(e)),
            Error::Protocol(e) => ("protocol violation", Some(e)),
            Error::Channel(e) => ("channel error", Some(e)),
            Error::Watchdog => ("watchdog deadline reached", None),
        }
    }

    /// Returns a simple string representation of the error.
    pub fn to_str(self) -> &'static str {
        self.to_str_pair().0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (desc, value) = self.to_str_pair();

        if let Some(value) = value {
            write!(f, "{}: {}", desc, value)
        } else {
            f.write_str(desc)
        }
    }
}

impl error::Error for Error {}

/// Specialized `Result` type for pageflow results.
pub type Result<T> = result::Result<T, Error>;
