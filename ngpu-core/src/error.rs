use std::fmt;

/// Semantic error category. Numeric discriminants are not part of the
/// public contract; only the variant identity is.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ErrorKind {
    /// Catch-all.
    Generic,
    /// Caller supplied a malformed or out-of-range value.
    InvalidArg,
    /// Shader compile/link failure, format parse error.
    InvalidData,
    /// API misused (resize on an offscreen context, capture on an onscreen one).
    InvalidUsage,
    /// A named entity (block field, bind-group slot) was not found.
    NotFound,
    /// Feature absent at runtime.
    Unsupported,
    /// Device lacks a required format or feature.
    GraphicsUnsupported,
    /// Request exceeds a device maximum.
    GraphicsLimitExceeded,
    /// Native graphics API call failed.
    GraphicsGeneric,
    /// A wrapped external library failed (vaapi, EGL, CoreVideo, ...).
    External,
    /// Host or device allocation failure.
    Memory,
    /// File-system error.
    Io,
    /// A size exceeded an implementation limit (e.g. > i32::MAX).
    LimitExceeded,
    /// Internal invariant violated; indicates a bug in this crate or its caller.
    Bug,
}

/// The crate-wide error type. Carries a kind plus a short human-readable
/// context string (shader label, attachment index, missing extension name).
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Error {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

macro_rules! error_ctor {
    ($name:ident, $kind:ident) => {
        pub fn $name(context: impl Into<String>) -> Error {
            Error::new(ErrorKind::$kind, context)
        }
    };
}

impl Error {
    error_ctor!(generic, Generic);
    error_ctor!(invalid_arg, InvalidArg);
    error_ctor!(invalid_data, InvalidData);
    error_ctor!(invalid_usage, InvalidUsage);
    error_ctor!(not_found, NotFound);
    error_ctor!(unsupported, Unsupported);
    error_ctor!(graphics_unsupported, GraphicsUnsupported);
    error_ctor!(graphics_limit_exceeded, GraphicsLimitExceeded);
    error_ctor!(graphics_generic, GraphicsGeneric);
    error_ctor!(external, External);
    error_ctor!(memory, Memory);
    error_ctor!(io, Io);
    error_ctor!(limit_exceeded, LimitExceeded);
    error_ctor!(bug, Bug);
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
