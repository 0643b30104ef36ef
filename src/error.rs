// Oracle-session - Session layer for Oracle database over ODPI-C
//
//-----------------------------------------------------------------------------
// Copyright (c) 2017-2023 Kubo Takehiro <kubo@jiubao.org>. All rights reserved.
// This program is free software: you can modify it and/or redistribute it
// under the terms of:
//
// (i)  the Universal Permissive License v 1.0 or at your option, any
//      later version (http://oss.oracle.com/licenses/upl); and/or
//
// (ii) the Apache License v 2.0. (http://www.apache.org/licenses/LICENSE-2.0)
//-----------------------------------------------------------------------------

use crate::to_rust_str;
use crate::AssertSend;
use crate::AssertSync;
use crate::Context;
use odpic_sys::{dpiContext_getError, dpiErrorInfo};
use std::borrow::Cow;
use std::error;
use std::ffi::CStr;
use std::fmt;
use std::mem::MaybeUninit;
use std::os::raw::c_char;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
/// A list of error categories.
///
/// It is used with the [`Error`] type.
pub enum ErrorKind {
    /// Every connection attempt failed.
    Connection,

    /// A SQL statement or PL/SQL block could not be prepared.
    Parse,

    /// Binding, execution, fetching or committing a statement failed.
    Execution,

    /// Error from an underlying Oracle client library outside of statement execution.
    OciError,

    /// Error from an underlying ODPI-C layer outside of statement execution.
    DpiError,

    /// Error when NULL value is got but the target rust type cannot handle NULL.
    NullValue,

    /// Error when an unacceptable argument is passed
    InvalidArgument,

    /// Error when conversion from a type to another is not allowed.
    InvalidTypeConversion,

    /// Error when the column name is not in the query.
    InvalidColumnName,

    /// Internal error. When you get this error, please report it with a test case to reproduce it.
    InternalError,
}

/// The error type for oracle-session
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Every connection attempt failed. `message` is the last failure.
    #[error("Cannot connect to database after {attempts} attempt(s): {message}")]
    Connection {
        attempts: u32,
        message: String,
        dberr: Option<Box<DbError>>,
    },

    /// Preparing a statement failed.
    #[error("Error with parsing the statement: {message}\n SQL: {sql}\n Bindvars: {binds}")]
    Parse {
        message: String,
        sql: String,
        binds: String,
        dberr: Option<Box<DbError>>,
    },

    /// Binding, executing or fetching a statement failed.
    #[error("Error with statement execution: {message}\n SQL: {sql}\n Bindvars: {binds}")]
    Execution {
        message: String,
        sql: String,
        binds: String,
        dberr: Option<Box<DbError>>,
    },

    /// Error from an underlying Oracle client library.
    #[error("OCI Error: {}", .0.message)]
    OciError(DbError),

    /// Error from an underlying ODPI-C layer.
    #[error("DPI Error: {}", .0.message)]
    DpiError(DbError),

    /// NULL value found where a non-null value is required.
    #[error("NULL value found")]
    NullValue,

    /// Error when an unacceptable argument is passed
    #[error("{message}")]
    InvalidArgument { message: Cow<'static, str> },

    /// Error when conversion from a type to another is not allowed.
    #[error("invalid type conversion from {from} to {to}")]
    InvalidTypeConversion { from: String, to: String },

    /// Error when the column name is not in the query.
    #[error("invalid column name {0}")]
    InvalidColumnName(String),

    /// Internal error.
    #[error("{0}")]
    InternalError(String),
}

impl Error {
    pub(crate) fn from_context(ctxt: &Context) -> Error {
        let err = unsafe {
            let mut err = MaybeUninit::uninit();
            dpiContext_getError(ctxt.context, err.as_mut_ptr());
            err.assume_init()
        };
        Error::from_dpi_error(&err)
    }

    pub(crate) fn from_dpi_error(err: &dpiErrorInfo) -> Error {
        Error::from_db_error(DbError::from_dpi_error(err))
    }

    pub(crate) fn from_db_error(dberr: DbError) -> Error {
        if dberr.message().starts_with("DPI") {
            Error::DpiError(dberr)
        } else {
            Error::OciError(dberr)
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Execution { .. } => ErrorKind::Execution,
            Error::OciError(_) => ErrorKind::OciError,
            Error::DpiError(_) => ErrorKind::DpiError,
            Error::NullValue => ErrorKind::NullValue,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::InvalidTypeConversion { .. } => ErrorKind::InvalidTypeConversion,
            Error::InvalidColumnName(_) => ErrorKind::InvalidColumnName,
            Error::InternalError(_) => ErrorKind::InternalError,
        }
    }

    /// Returns [`DbError`] reported by the client library, if any.
    pub fn db_error(&self) -> Option<&DbError> {
        match self {
            Error::OciError(err) | Error::DpiError(err) => Some(err),
            Error::Connection { dberr, .. }
            | Error::Parse { dberr, .. }
            | Error::Execution { dberr, .. } => dberr.as_deref(),
            _ => None,
        }
    }

    /// Returns Oracle error code.
    /// For example 1 for "ORA-0001: unique constraint violated"
    pub fn oci_code(&self) -> Option<i32> {
        match self.db_error() {
            Some(dberr) if dberr.code != 0 && !dberr.message.starts_with("DPI") => {
                Some(dberr.code)
            }
            _ => None,
        }
    }

    /// Returns the SQL text of a parse or execution error.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Parse { sql, .. } | Error::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Returns the rendered bind variables of a parse or execution error.
    pub fn binds(&self) -> Option<&str> {
        match self {
            Error::Parse { binds, .. } | Error::Execution { binds, .. } => Some(binds),
            _ => None,
        }
    }

    // The message part without the variant prefix, plus the driver error.
    fn into_parts(self) -> (String, Option<Box<DbError>>) {
        match self {
            Error::OciError(dberr) | Error::DpiError(dberr) => {
                (dberr.message.clone(), Some(Box::new(dberr)))
            }
            Error::Connection { message, dberr, .. }
            | Error::Parse { message, dberr, .. }
            | Error::Execution { message, dberr, .. } => (message, dberr),
            err => (err.to_string(), None),
        }
    }

    pub(crate) fn connection(attempts: u32, last: Error) -> Error {
        let (message, dberr) = last.into_parts();
        Error::Connection {
            attempts,
            message,
            dberr,
        }
    }

    pub(crate) fn into_parse(self, sql: &str, binds: String) -> Error {
        let (message, dberr) = self.into_parts();
        Error::Parse {
            message,
            sql: sql.to_string(),
            binds,
            dberr,
        }
    }

    pub(crate) fn into_execution(self, sql: &str, binds: String) -> Error {
        if let Error::Execution { .. } = self {
            return self;
        }
        let (message, dberr) = self.into_parts();
        Error::Execution {
            message,
            sql: sql.to_string(),
            binds,
            dberr,
        }
    }

    pub(crate) fn null_value() -> Error {
        Error::NullValue
    }

    pub(crate) fn invalid_argument<M>(message: M) -> Error
    where
        M: Into<Cow<'static, str>>,
    {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_type_conversion<T1, T2>(from: T1, to: T2) -> Error
    where
        T1: Into<String>,
        T2: Into<String>,
    {
        Error::InvalidTypeConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    pub(crate) fn invalid_column_name<T>(name: T) -> Error
    where
        T: Into<String>,
    {
        Error::InvalidColumnName(name.into())
    }

    pub(crate) fn internal_error<T>(message: T) -> Error
    where
        T: Into<String>,
    {
        Error::InternalError(message.into())
    }
}

impl AssertSend for Error {}
impl AssertSync for Error {}

/// Oracle database error or ODPI-C error
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct DbError {
    code: i32,
    offset: u32,
    message: String,
    fn_name: Cow<'static, str>,
    action: Cow<'static, str>,
    is_recoverable: bool,
}

fn c_str_or_empty(ptr: *const c_char) -> Cow<'static, str> {
    if ptr.is_null() {
        Cow::Borrowed("")
    } else {
        Cow::Owned(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

impl DbError {
    pub(crate) fn from_dpi_error(err: &dpiErrorInfo) -> DbError {
        DbError {
            code: err.code,
            offset: err.offset,
            message: to_rust_str(err.message, err.messageLength),
            fn_name: c_str_or_empty(err.fnName),
            action: c_str_or_empty(err.action),
            is_recoverable: err.isRecoverable != 0,
        }
    }

    /// Creates a new DbError. Note that its `is_recoverable` value is always `false`.
    pub fn new<M, F, A>(code: i32, offset: u32, message: M, fn_name: F, action: A) -> DbError
    where
        M: Into<String>,
        F: Into<Cow<'static, str>>,
        A: Into<Cow<'static, str>>,
    {
        DbError {
            code,
            offset,
            message: message.into(),
            fn_name: fn_name.into(),
            action: action.into(),
            is_recoverable: false,
        }
    }

    /// Oracle error code if OciError. always zero if DpiError
    pub fn code(&self) -> i32 {
        self.code
    }

    /// ? (used for Batch Errors?)
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// name of the ODPI-C function which failed
    pub fn fn_name(&self) -> &str {
        &self.fn_name
    }

    /// ODPI-C action name when the error occurred
    pub fn action(&self) -> &str {
        &self.action
    }

    /// True when the error can be recovered by retrying the call.
    pub fn is_recoverable(&self) -> bool {
        self.is_recoverable
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl error::Error for DbError {}

macro_rules! chkerr {
    ($ctxt:expr, $code:expr) => {{
        #[allow(unused_unsafe)]
        if unsafe { $code } != odpic_sys::DPI_SUCCESS as i32 {
            return Err($crate::Error::from_context($ctxt));
        }
    }};
}

pub(crate) use chkerr;
