use thiserror::Error;

/// Failures reported by the mail transport. Never retried here.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IMAP error: {0}")]
    Imap(#[from] imap::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum HeaderError {
    /// The server returned a field we never asked for.
    #[error("unknown header field `{name}` in fetched headers")]
    UnknownHeader { name: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no free separator marker found within {attempts} attempts")]
    MarkerExhausted { attempts: usize },
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("invalid stats query: {0}")]
    Validation(String),
}
