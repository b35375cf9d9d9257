//! Error types for generic region decoding.

use core::fmt;

/// The main error type for generic region decoding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Errors related to reading the encoded data.
    Parse(ParseError),
    /// Errors related to region dimensions and storage.
    Region(RegionError),
    /// Errors related to template configuration.
    Template(TemplateError),
}

/// Errors related to reading the encoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The arithmetic source ran out of data before the region was complete.
    UnexpectedEof,
}

/// Errors related to region dimensions and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    /// Region with invalid dimension.
    InvalidDimension,
    /// The packed pixel data does not match the region dimensions.
    DataLengthMismatch,
    /// The bitmap storage could not be allocated.
    AllocationFailed,
}

/// Errors related to template configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateError {
    /// An invalid template value was used.
    Invalid,
    /// The number of adaptive template pixels does not match the template.
    InvalidAtPixelCount,
    /// The context slice is smaller than the template's context space.
    InsufficientContexts,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Region(e) => write!(f, "{e}"),
            Self::Template(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
        }
    }
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension => write!(f, "invalid dimension value"),
            Self::DataLengthMismatch => write!(f, "pixel data does not match dimensions"),
            Self::AllocationFailed => write!(f, "failed to allocate bitmap"),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid template value"),
            Self::InvalidAtPixelCount => {
                write!(f, "wrong number of adaptive template pixels")
            }
            Self::InsufficientContexts => write!(f, "context array is too small for template"),
        }
    }
}

impl core::error::Error for DecodeError {}
impl core::error::Error for ParseError {}
impl core::error::Error for RegionError {}
impl core::error::Error for TemplateError {}

impl From<ParseError> for DecodeError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RegionError> for DecodeError {
    fn from(e: RegionError) -> Self {
        Self::Region(e)
    }
}

impl From<TemplateError> for DecodeError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e)
    }
}

/// Result type for generic region decoding operations.
pub type Result<T> = core::result::Result<T, DecodeError>;

macro_rules! bail {
    ($err:expr) => {
        return Err($err.into())
    };
}

macro_rules! err {
    ($err:expr) => {
        Err($err.into())
    };
}

pub(crate) use bail;
pub(crate) use err;
