// Error kinds, stable C codes, and the thread-local last-error channel.
use std::cell::RefCell;
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NullParameter,
    InvalidHandle,
    AlreadyFreed,
    TypeMismatch,
    OutOfMemory,
    Internal,
    OutOfRange,
    Parse,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    handle: Option<u64>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            handle: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn handle(&self) -> Option<u64> {
        self.handle
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_handle(mut self, handle: u64) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Park this error in the calling thread's last-error slot, overwriting
    /// whatever was there. The slot is only ever written on failure; success
    /// paths leave it alone.
    pub fn set_last(self) {
        LAST_ERROR.with(|slot| {
            *slot.borrow_mut() = Some(self);
        });
    }

    pub fn last_code() -> i32 {
        LAST_ERROR.with(|slot| {
            slot.borrow()
                .as_ref()
                .map(|err| to_error_code(err.kind))
                .unwrap_or(0)
        })
    }

    pub fn last_message() -> String {
        LAST_ERROR.with(|slot| {
            slot.borrow()
                .as_ref()
                .map(|err| err.to_string())
                .unwrap_or_default()
        })
    }

    pub fn take_last() -> Option<Error> {
        LAST_ERROR.with(|slot| slot.borrow_mut().take())
    }

    pub fn clear_last() {
        LAST_ERROR.with(|slot| {
            *slot.borrow_mut() = None;
        });
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(handle) = self.handle {
            write!(f, " (handle: {handle:#x})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<Error>> = const { RefCell::new(None) };
}

// Code convention: 0 = no error, 1-99 = handle/infrastructure faults,
// 100+ = payload and backend faults. Frozen once published.
pub fn to_error_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NullParameter => 1,
        ErrorKind::InvalidHandle => 2,
        ErrorKind::AlreadyFreed => 3,
        ErrorKind::TypeMismatch => 4,
        ErrorKind::OutOfMemory => 5,
        ErrorKind::Internal => 6,
        ErrorKind::OutOfRange => 7,
        ErrorKind::Parse => 100,
        ErrorKind::Io => 101,
    }
}
