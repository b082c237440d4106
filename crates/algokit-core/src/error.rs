//! Status and error model shared by every algokit crate
//!
//! Operations report failures through a [`Status`]: an ordered list of
//! [`Error`] records. Each record carries an [`ErrorKind`] (stable integer id),
//! a [`Severity`] and any number of `(ErrorDetail, DetailValue)` pairs used for
//! diagnostics, e.g. `(ParameterName, "nClusters")`.
//!
//! Statuses compose by OR-accumulation, so independent checks can run and merge
//! before compute aborts:
//!
//! ```rust
//! use algokit_core::{Error, ErrorDetail, ErrorKind, Status};
//!
//! let mut status = Status::new();
//! status |= Error::new(ErrorKind::IncorrectParameter)
//!     .with_detail(ErrorDetail::ParameterName, "nClusters");
//! status |= Status::new();
//! assert!(!status.is_ok());
//! assert!(status.contains(ErrorKind::IncorrectParameter));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use thiserror::Error;

/// Kind of an error record, identified by a stable integer id
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorKind {
    /// A required table, model or collection is missing
    #[error("Required input is not set")]
    NullInput = 1,

    /// A table or collection holds no data
    #[error("Input is empty")]
    EmptyInput = 2,

    #[error("Incorrect number of columns")]
    IncorrectNumberOfColumns = 3,

    #[error("Incorrect number of rows")]
    IncorrectNumberOfRows = 4,

    /// Parameter value outside its valid range
    #[error("Incorrect parameter")]
    IncorrectParameter = 5,

    /// Table layout not accepted by the consumer
    #[error("Incorrect type of numeric table")]
    IncorrectTypeOfNumericTable = 6,

    /// Layout or method combination not implemented
    #[error("Operation is not supported")]
    UnsupportedOperation = 7,

    /// Block request outside the backing storage
    #[error("Requested block is out of range")]
    OutOfRange = 8,

    #[error("Incorrect data type")]
    IncorrectDataType = 9,

    #[error("Memory allocation failed")]
    MemoryAllocationFailed = 10,

    /// Requested CPU variant is not compiled in or not present on the host
    #[error("CPU type is not supported")]
    CpuNotSupported = 11,

    /// Feature not implemented by a given engine or variant
    #[error("Method is not supported")]
    MethodNotSupported = 12,

    #[error("Incorrect size of buffer")]
    IncorrectSizeOfBuffer = 13,

    /// NaN or infinite value in a column that rejects special values
    #[error("Input contains non-finite values")]
    NonFiniteValue = 14,

    /// Finalization requested before every partial result arrived
    #[error("Not all partial results were added")]
    MissingPartialResults = 15,

    /// Operation called in a state that does not allow it
    #[error("Incorrect compute state")]
    IncorrectComputeState = 16,

    #[error("Serialization tag is not registered")]
    SerializationTagNotRegistered = 17,

    #[error("Serialization failed")]
    Serialization = 18,
}

impl ErrorKind {
    /// Stable integer id of this kind
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Look up a kind by its integer id
    pub fn from_id(id: u32) -> Option<Self> {
        use ErrorKind::*;
        const ALL: [ErrorKind; 18] = [
            NullInput,
            EmptyInput,
            IncorrectNumberOfColumns,
            IncorrectNumberOfRows,
            IncorrectParameter,
            IncorrectTypeOfNumericTable,
            UnsupportedOperation,
            OutOfRange,
            IncorrectDataType,
            MemoryAllocationFailed,
            CpuNotSupported,
            MethodNotSupported,
            IncorrectSizeOfBuffer,
            NonFiniteValue,
            MissingPartialResults,
            IncorrectComputeState,
            SerializationTagNotRegistered,
            Serialization,
        ];
        ALL.iter().copied().find(|k| k.id() == id)
    }
}

/// Kind of a diagnostic detail attached to an error record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorDetail {
    ParameterName,
    ArgumentName,
    Row,
    Column,
    ExpectedValue,
    ActualValue,
    SerializationTag,
    Method,
    Cpu,
    Message,
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorDetail::ParameterName => "parameter",
            ErrorDetail::ArgumentName => "argument",
            ErrorDetail::Row => "row",
            ErrorDetail::Column => "column",
            ErrorDetail::ExpectedValue => "expected",
            ErrorDetail::ActualValue => "actual",
            ErrorDetail::SerializationTag => "tag",
            ErrorDetail::Method => "method",
            ErrorDetail::Cpu => "cpu",
            ErrorDetail::Message => "message",
        };
        f.write_str(name)
    }
}

/// Value of a diagnostic detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DetailValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailValue::Str(s) => f.write_str(s),
            DetailValue::Int(v) => write!(f, "{v}"),
            DetailValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Str(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Str(value)
    }
}

impl From<usize> for DetailValue {
    fn from(value: usize) -> Self {
        DetailValue::Int(value as i64)
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        DetailValue::Int(value)
    }
}

impl From<u32> for DetailValue {
    fn from(value: u32) -> Self {
        DetailValue::Int(i64::from(value))
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        DetailValue::Float(value)
    }
}

/// Whether a record blocks computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// A single error record
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind}{}", format_details(.details))]
pub struct Error {
    kind: ErrorKind,
    severity: Severity,
    details: Vec<(ErrorDetail, DetailValue)>,
}

fn format_details(details: &[(ErrorDetail, DetailValue)]) -> String {
    if details.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = details.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!(" ({})", parts.join(", "))
}

impl Error {
    /// Create a blocking error of the given kind
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            details: Vec::new(),
        }
    }

    /// Create a non-blocking warning of the given kind
    pub fn warning(kind: ErrorKind) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            details: Vec::new(),
        }
    }

    /// Attach a diagnostic detail
    pub fn with_detail(mut self, detail: ErrorDetail, value: impl Into<DetailValue>) -> Self {
        self.details.push((detail, value.into()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn details(&self) -> &[(ErrorDetail, DetailValue)] {
        &self.details
    }

    /// First value recorded for a detail kind
    pub fn detail(&self, detail: ErrorDetail) -> Option<&DetailValue> {
        self.details
            .iter()
            .find(|(k, _)| *k == detail)
            .map(|(_, v)| v)
    }

    // Helpers for the common patterns

    /// Parameter value out of range
    pub fn incorrect_parameter(name: &str) -> Self {
        Self::new(ErrorKind::IncorrectParameter).with_detail(ErrorDetail::ParameterName, name)
    }

    /// Required argument missing
    pub fn null_input(argument: &str) -> Self {
        Self::new(ErrorKind::NullInput).with_detail(ErrorDetail::ArgumentName, argument)
    }

    /// Block `[start, start + n)` does not fit in `available` rows
    pub fn out_of_range(start: usize, n: usize, available: usize) -> Self {
        Self::new(ErrorKind::OutOfRange)
            .with_detail(ErrorDetail::Row, start)
            .with_detail(ErrorDetail::ExpectedValue, available)
            .with_detail(ErrorDetail::ActualValue, start.saturating_add(n))
    }

    /// Operation not implemented for this layout or method
    pub fn unsupported(message: &str) -> Self {
        Self::new(ErrorKind::UnsupportedOperation).with_detail(ErrorDetail::Message, message)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// Ordered list of error records; empty means success
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    errors: Vec<Error>,
}

/// Result type alias carrying a [`Status`] on failure
pub type Result<T> = std::result::Result<T, Status>;

impl Status {
    /// An empty (successful) status
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no blocking error is recorded; warnings are ignored
    pub fn is_ok(&self) -> bool {
        self.errors.iter().all(Error::is_warning)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        self.errors.iter().any(Error::is_warning)
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Whether any record of the given kind is present
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// First blocking error, if any
    pub fn first_error(&self) -> Option<&Error> {
        self.errors.iter().find(|e| !e.is_warning())
    }

    /// Append a record, never dropping earlier ones
    pub fn add(&mut self, error: impl Into<Error>) {
        self.errors.push(error.into());
    }

    /// Convert to a `Result`, yielding `value` when no blocking error exists
    pub fn ok_or<T>(self, value: T) -> Result<T> {
        if self.is_ok() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    pub fn into_result(self) -> Result<()> {
        self.ok_or(())
    }

    /// Escape hatch for top-level convenience wrappers
    pub fn throw_if_possible(self) -> anyhow::Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(anyhow::Error::new(self))
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("Success");
        }
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            if e.is_warning() {
                f.write_str("warning: ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Status {}

impl From<Error> for Status {
    fn from(error: Error) -> Self {
        Status {
            errors: vec![error],
        }
    }
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        Status::from(Error::new(kind))
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Status) {
        self.errors.extend(rhs.errors);
    }
}

impl BitOrAssign<Error> for Status {
    fn bitor_assign(&mut self, rhs: Error) {
        self.errors.push(rhs);
    }
}

impl<T> BitOrAssign<Result<T>> for Status {
    fn bitor_assign(&mut self, rhs: Result<T>) {
        if let Err(s) = rhs {
            *self |= s;
        }
    }
}

impl BitOr for Status {
    type Output = Status;

    fn bitor(mut self, rhs: Status) -> Status {
        self |= rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_status_is_success() {
        let s = Status::new();
        assert!(s.is_ok());
        assert!(s.is_empty());
        assert_eq!(s.to_string(), "Success");
        assert!(s.into_result().is_ok());
    }

    #[test]
    fn test_error_display_with_details() {
        let err = Error::incorrect_parameter("nClusters");
        assert_eq!(err.to_string(), "Incorrect parameter (parameter: nClusters)");

        let err = Error::out_of_range(3, 4, 5);
        assert_eq!(
            err.to_string(),
            "Requested block is out of range (row: 3, expected: 5, actual: 7)"
        );
    }

    #[test]
    fn test_accumulation_is_monotonic() {
        let mut s = Status::new();
        s |= Error::null_input("data");
        s |= Status::new();
        s |= Status::from(ErrorKind::IncorrectNumberOfRows) | Status::from(ErrorKind::OutOfRange);

        assert_eq!(s.errors().len(), 3);
        assert_eq!(s.errors()[0].kind(), ErrorKind::NullInput);
        assert_eq!(s.errors()[2].kind(), ErrorKind::OutOfRange);
        assert_eq!(
            s.first_error().and_then(|e| e.detail(ErrorDetail::ArgumentName)),
            Some(&DetailValue::from("data"))
        );
    }

    #[test]
    fn test_warnings_do_not_block() {
        let mut s = Status::new();
        s |= Error::warning(ErrorKind::NonFiniteValue);
        assert!(s.is_ok());
        assert!(s.has_warnings());
        assert!(s.first_error().is_none());
        assert_eq!(s.clone().ok_or(7).unwrap(), 7);

        s |= Error::new(ErrorKind::EmptyInput);
        assert!(!s.is_ok());
        assert!(s.to_string().starts_with("warning: "));
    }

    #[test]
    fn test_result_accumulates_into_status() {
        fn failing() -> Result<u8> {
            Err(ErrorKind::MethodNotSupported.into())
        }
        let mut s = Status::new();
        s |= failing();
        s |= Ok::<_, Status>(1u8);
        assert!(s.contains(ErrorKind::MethodNotSupported));
        assert_eq!(s.errors().len(), 1);
    }

    #[test]
    fn test_kind_ids_round_trip() {
        for id in 1..=18 {
            let kind = ErrorKind::from_id(id).unwrap();
            assert_eq!(kind.id(), id);
        }
        assert_eq!(ErrorKind::from_id(0), None);
        assert_eq!(ErrorKind::from_id(99), None);
    }

    #[test]
    fn test_throw_if_possible() {
        assert!(Status::new().throw_if_possible().is_ok());

        let err = Status::from(Error::unsupported("dense write on CSR"))
            .throw_if_possible()
            .unwrap_err();
        assert!(err.to_string().contains("dense write on CSR"));
        let status = err.downcast_ref::<Status>().unwrap();
        assert!(status.contains(ErrorKind::UnsupportedOperation));
    }
}
