use core::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The handle kind does not support the operation.
    NotCapable,
    /// End of input. Terminal, but not a failure.
    Eof,
    /// Generic I/O failure; the handle should be treated as unusable.
    Io,
    /// A read was interrupted by `stop_reading`. Never delivered to callbacks.
    Cancelled,
    /// The charset label is unknown, or the charset cannot be used for encoding.
    UnsupportedCharset,
    /// A host collaborator (async runtime, event loop) is missing or gone.
    Unavailable,
}

impl ErrorKind {
    /// The short code handed to script callbacks.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotCapable => "ENOTCAPABLE",
            ErrorKind::Eof => "EOF",
            ErrorKind::Io => "EIO",
            ErrorKind::Cancelled => "ECANCELED",
            ErrorKind::UnsupportedCharset => "EINVAL",
            ErrorKind::Unavailable => "EUNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            message: None,
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: Some(message.into()),
        }
    }

    pub fn not_capable(operation: &str) -> Self {
        Self::with_message(
            ErrorKind::NotCapable,
            format!("handle not capable of {}", operation),
        )
    }

    pub fn eof() -> Self {
        Self::new(ErrorKind::Eof)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == ErrorKind::Eof
    }

    /// Classifies a failed blocking read.
    ///
    /// A "stream closed" failure is end of input as far as callers are
    /// concerned, and an interrupt only ever comes from `stop_reading`.
    pub fn from_read_error(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Interrupted => Self::new(ErrorKind::Cancelled),
            io::ErrorKind::UnexpectedEof => Self::eof(),
            _ if is_stream_closed(&err) => Self::eof(),
            _ => Self::from(err),
        }
    }
}

fn is_stream_closed(err: &io::Error) -> bool {
    err.to_string().eq_ignore_ascii_case("stream closed")
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::NotCapable => write!(f, "Operation not supported by handle")?,
            ErrorKind::Eof => write!(f, "End of stream")?,
            ErrorKind::Io => write!(f, "I/O error")?,
            ErrorKind::Cancelled => write!(f, "Operation cancelled")?,
            ErrorKind::UnsupportedCharset => write!(f, "Unsupported charset")?,
            ErrorKind::Unavailable => write!(f, "Host runtime unavailable")?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::with_message(ErrorKind::Io, err.to_string())
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        let kind = match err.kind {
            ErrorKind::Eof => io::ErrorKind::UnexpectedEof,
            ErrorKind::Cancelled => io::ErrorKind::Interrupted,
            ErrorKind::NotCapable => io::ErrorKind::Unsupported,
            ErrorKind::UnsupportedCharset => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = core::result::Result<T, Error>;
