use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the failure class of this error.
    pub fn status(&self) -> ErrorStatus {
        self.kind().status()
    }

    pub fn not_enough_data(element: impl Into<String>, required: usize, available: usize) -> Error {
        Error(
            ErrorKind::NotEnoughData {
                element: element.into(),
                required,
                available,
            }
            .into(),
        )
    }

    pub fn buffer_overflow(element: impl Into<String>, required: usize, available: usize) -> Error {
        Error(
            ErrorKind::BufferOverflow {
                element: element.into(),
                required,
                available,
            }
            .into(),
        )
    }

    pub fn capacity_exceeded(element: impl Into<String>, capacity: usize, requested: usize) -> Error {
        Error(
            ErrorKind::CapacityExceeded {
                element: element.into(),
                capacity,
                requested,
            }
            .into(),
        )
    }

    pub fn invalid_content(element: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidContent {
                element: element.into(),
            }
            .into(),
        )
    }

    pub fn invalid_config(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidConfiguration {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("not enough data for '{element}': required {required} bytes, available {available}")]
    NotEnoughData {
        element: String,
        required: usize,
        available: usize,
    },

    #[error("output buffer too small for '{element}': required {required} bytes, available {available}")]
    BufferOverflow {
        element: String,
        required: usize,
        available: usize,
    },

    #[error("capacity of '{element}' exceeded: capacity {capacity}, requested {requested}")]
    CapacityExceeded {
        element: String,
        capacity: usize,
        requested: usize,
    },

    #[error("invalid content in '{element}'")]
    InvalidContent { element: String },

    #[error("invalid configuration of '{element}': {message}")]
    InvalidConfiguration { element: String, message: String },

    #[error("invalid wire format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },
}

impl ErrorKind {
    pub fn status(&self) -> ErrorStatus {
        match self {
            ErrorKind::NotEnoughData { .. } => ErrorStatus::NotEnoughData,
            ErrorKind::BufferOverflow { .. } => ErrorStatus::BufferOverflow,
            ErrorKind::CapacityExceeded { .. } => ErrorStatus::CapacityExceeded,
            ErrorKind::InvalidContent { .. } => ErrorStatus::InvalidContent,
            ErrorKind::InvalidConfiguration { .. } => ErrorStatus::InvalidConfiguration,
            ErrorKind::InvalidFormat { .. } => ErrorStatus::ProtocolError,
            ErrorKind::InvalidArgument { .. } | ErrorKind::InvalidOperation { .. } => {
                ErrorStatus::InvalidOperation
            }
        }
    }
}

/// Field-free discriminant of [`ErrorKind`], for callers that only branch on the
/// class of a read/write failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    NotEnoughData,
    BufferOverflow,
    CapacityExceeded,
    InvalidContent,
    InvalidConfiguration,
    ProtocolError,
    InvalidOperation,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
