use std::{error, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The line doesn't follow the flow dump syntax.
    MalformedFlow,
    /// A table id has no entry in the supplied table map.
    UnmappedTable,
    /// The cookie map failed to produce a label.
    CookieMap,
    Config,
    Io,
    Other,
}

pub struct Error {
    kind: ErrorKind,
    message: String,
    line: Option<String>,
    source: Option<Box<dyn error::Error + Send + Sync>>,
}

impl Error {
    pub fn with_kind(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            source: None,
        }
    }

    pub fn malformed(message: &str) -> Self {
        Self::with_kind(ErrorKind::MalformedFlow, message)
    }

    pub fn unmapped_table(table: u32) -> Self {
        Self::with_kind(
            ErrorKind::UnmappedTable,
            &format!("table {} not found in table map", table),
        )
    }

    pub fn cookie_map(cookie: u64, message: &str) -> Self {
        Self::with_kind(
            ErrorKind::CookieMap,
            &format!("cookie map failed for cookie {:#x}: {}", cookie, message),
        )
    }

    /// Attaches the offending flow line. An already attached line is kept.
    pub fn at_line(mut self, line: &str) -> Self {
        if self.line.is_none() {
            self.line = Some(line.into());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    pub(crate) fn set_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unexpected error ({:?}): {}", self.kind, self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(err) => write!(f, "{}. Source error: {}", self.message, err)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(line) = &self.line {
            write!(f, " |{}|", line)?;
        }
        Ok(())
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.source {
            Some(ref err) => Some(&**err),
            None => None,
        }
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::with_kind(ErrorKind::Other, &message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::with_kind(ErrorKind::Other, message)
    }
}

impl<E: error::Error + Send + Sync + 'static> From<(String, E)> for Error {
    fn from((message, err): (String, E)) -> Self {
        Self {
            kind: ErrorKind::Other,
            message,
            line: None,
            source: Some(Box::new(err)),
        }
    }
}

impl<E: error::Error + Send + Sync + 'static> From<(&str, E)> for Error {
    fn from((message, err): (&str, E)) -> Self {
        Self {
            kind: ErrorKind::Other,
            message: message.into(),
            line: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::from(("I/O failed", err)).set_kind(ErrorKind::Io)
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        format!("{}", err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
