//! Crate error type.
//!
//! One `thiserror` variant per failure case, wrapped in a thin newtype so
//! the public surface is a single `Error` type rather than a bare enum.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("server reports the username is unavailable")]
    UsernameError,

    #[error("otp required for login id {login_id}")]
    OtpError {
        login_id: String,
        voucher_id: Option<String>,
        voucher_auth: Option<String>,
        reset_token: Option<String>,
    },

    #[error("invalid password")]
    PasswordError,

    #[error("invalid pin")]
    Pin2Error,

    #[error("invalid recovery answers")]
    Recovery2Error,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("key integrity failure: {0}")]
    KeyIntegrity(String),

    #[error("server lost children for appId `{app_id}`: stash has {stash_children}, reply has {reply_children}")]
    ServerLostChildren {
        app_id: String,
        stash_children: usize,
        reply_children: usize,
    },

    #[error("no authentication secret (loginAuth or passwordAuth) present on node")]
    MissingAuth,

    #[error("no authentication material available to build a server request")]
    NoAuth,

    #[error("no login found in tree for loginId `{0}`")]
    MissingLogin(String),

    #[error("invalid stash: {0}")]
    InvalidStash(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate error. A thin wrapper so call sites write `Error` while match arms
/// still dispatch on the richer `ErrorKind`.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&*self.0)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(Box::new(kind))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error(Box::new(ErrorKind::Io(e)))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error(Box::new(ErrorKind::Json(e)))
    }
}
