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

use crate::util::normalize_bind_name;
use crate::Error;
use crate::Result;
use crate::Value;
use odpic_sys::*;
use std::fmt;

// Largest VARCHAR2 and RAW bind in bytes. Longer values are bound as LONG or LONG RAW.
const MAX_VARCHAR_BIND_SIZE: u32 = 32767;

/// Direction of a bind variable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindDirection {
    /// The value is sent to the server only.
    In,
    /// The value is written by the statement and returned in [`ExecOutcome::outputs`](crate::ExecOutcome::outputs).
    Out,
    /// The value is sent and the updated value is returned.
    InOut,
}

/// Type of an output bind variable or of the elements of an [`ArrayBind`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindType {
    /// VARCHAR2 with the maximum size in bytes
    Varchar2(u32),
    /// RAW with the maximum size in bytes
    Raw(u32),
    /// PLS_INTEGER / BINARY_INTEGER
    Int64,
    /// BINARY_DOUBLE
    Double,
    /// NUMBER as decimal text
    Number,
    Timestamp,
    /// PL/SQL BOOLEAN
    Boolean,
    IntervalDS,
    IntervalYM,
    /// CLOB locator
    Clob,
    /// BLOB locator
    Blob,
}

impl BindType {
    /// Returns the type used to bind `value` as input.
    /// `max_len` widens character and binary buffers.
    pub fn for_value(value: &Value, max_len: Option<u32>) -> BindType {
        let len = |n: usize| (n as u32).max(max_len.unwrap_or(0)).max(1);
        match value {
            Value::Null => BindType::Varchar2(len(0)),
            Value::Integer(_) => BindType::Int64,
            Value::Float(_) => BindType::Double,
            Value::Number(_) => BindType::Number,
            Value::Text(s) => BindType::Varchar2(len(s.len())),
            Value::Bytes(b) => BindType::Raw(len(b.len())),
            Value::Boolean(_) => BindType::Boolean,
            Value::Timestamp(_) => BindType::Timestamp,
            Value::IntervalDS(_) => BindType::IntervalDS,
            Value::IntervalYM { .. } => BindType::IntervalYM,
            Value::Lob(lob) => match lob.kind() {
                crate::LobKind::Clob => BindType::Clob,
                crate::LobKind::Blob => BindType::Blob,
            },
        }
    }

    // (oracle type, native type, size, size is bytes) passed to dpiConn_newVar.
    pub(crate) fn var_params(self) -> (dpiOracleTypeNum, dpiNativeTypeNum, u32, i32) {
        match self {
            BindType::Varchar2(size) if size > MAX_VARCHAR_BIND_SIZE => {
                (DPI_ORACLE_TYPE_LONG_VARCHAR, DPI_NATIVE_TYPE_BYTES, size, 1)
            }
            BindType::Varchar2(size) => (DPI_ORACLE_TYPE_VARCHAR, DPI_NATIVE_TYPE_BYTES, size, 1),
            BindType::Raw(size) if size > MAX_VARCHAR_BIND_SIZE => {
                (DPI_ORACLE_TYPE_LONG_RAW, DPI_NATIVE_TYPE_BYTES, size, 1)
            }
            BindType::Raw(size) => (DPI_ORACLE_TYPE_RAW, DPI_NATIVE_TYPE_BYTES, size, 1),
            BindType::Int64 => (DPI_ORACLE_TYPE_NATIVE_INT, DPI_NATIVE_TYPE_INT64, 0, 0),
            BindType::Double => (DPI_ORACLE_TYPE_NATIVE_DOUBLE, DPI_NATIVE_TYPE_DOUBLE, 0, 0),
            BindType::Number => (DPI_ORACLE_TYPE_NUMBER, DPI_NATIVE_TYPE_BYTES, 0, 0),
            BindType::Timestamp => (DPI_ORACLE_TYPE_TIMESTAMP, DPI_NATIVE_TYPE_TIMESTAMP, 0, 0),
            BindType::Boolean => (DPI_ORACLE_TYPE_BOOLEAN, DPI_NATIVE_TYPE_BOOLEAN, 0, 0),
            BindType::IntervalDS => {
                (DPI_ORACLE_TYPE_INTERVAL_DS, DPI_NATIVE_TYPE_INTERVAL_DS, 0, 0)
            }
            BindType::IntervalYM => {
                (DPI_ORACLE_TYPE_INTERVAL_YM, DPI_NATIVE_TYPE_INTERVAL_YM, 0, 0)
            }
            BindType::Clob => (DPI_ORACLE_TYPE_CLOB, DPI_NATIVE_TYPE_LOB, 0, 0),
            BindType::Blob => (DPI_ORACLE_TYPE_BLOB, DPI_NATIVE_TYPE_LOB, 0, 0),
        }
    }

    // Size shown in rendered bind lists, -1 when the type has no length.
    fn declared_len(self) -> i64 {
        match self {
            BindType::Varchar2(size) | BindType::Raw(size) => size as i64,
            _ => -1,
        }
    }
}

impl fmt::Display for BindType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BindType::Varchar2(size) => write!(f, "VARCHAR2({})", size),
            BindType::Raw(size) => write!(f, "RAW({})", size),
            BindType::Int64 => write!(f, "PLS_INTEGER"),
            BindType::Double => write!(f, "BINARY_DOUBLE"),
            BindType::Number => write!(f, "NUMBER"),
            BindType::Timestamp => write!(f, "TIMESTAMP"),
            BindType::Boolean => write!(f, "BOOLEAN"),
            BindType::IntervalDS => write!(f, "INTERVAL DAY TO SECOND"),
            BindType::IntervalYM => write!(f, "INTERVAL YEAR TO MONTH"),
            BindType::Clob => write!(f, "CLOB"),
            BindType::Blob => write!(f, "BLOB"),
        }
    }
}

/// A named bind variable
///
/// The name may start with one colon, which is dropped.
///
/// ```
/// # use oracle_session::*;
/// let deptno = BindVar::new(":deptno", 30);
/// let name = BindVar::new("ename", "SMITH").max_len(20);
/// let total = BindVar::output("total", BindType::Number);
/// assert_eq!(deptno.name(), "deptno");
/// assert_eq!(total.direction(), BindDirection::Out);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BindVar {
    name: String,
    value: Value,
    direction: BindDirection,
    bind_type: Option<BindType>,
    max_len: Option<u32>,
}

impl BindVar {
    /// Creates an input bind variable.
    pub fn new<N, V>(name: N, value: V) -> BindVar
    where
        N: Into<String>,
        V: Into<Value>,
    {
        BindVar {
            name: strip_colon(name.into()),
            value: value.into(),
            direction: BindDirection::In,
            bind_type: None,
            max_len: None,
        }
    }

    /// Creates an output bind variable of `bind_type`.
    pub fn output<N>(name: N, bind_type: BindType) -> BindVar
    where
        N: Into<String>,
    {
        BindVar {
            name: strip_colon(name.into()),
            value: Value::Null,
            direction: BindDirection::Out,
            bind_type: Some(bind_type),
            max_len: None,
        }
    }

    /// Creates an input/output bind variable of `bind_type` holding `value`.
    pub fn in_out<N, V>(name: N, value: V, bind_type: BindType) -> BindVar
    where
        N: Into<String>,
        V: Into<Value>,
    {
        BindVar {
            name: strip_colon(name.into()),
            value: value.into(),
            direction: BindDirection::InOut,
            bind_type: Some(bind_type),
            max_len: None,
        }
    }

    /// Declares the maximum length in bytes of a character or binary input.
    pub fn max_len(mut self, len: u32) -> BindVar {
        self.max_len = Some(len);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn direction(&self) -> BindDirection {
        self.direction
    }

    /// Returns the type the variable is bound with.
    pub fn bind_type(&self) -> BindType {
        self.bind_type
            .unwrap_or_else(|| BindType::for_value(&self.value, self.max_len))
    }
}

/// A PL/SQL index-by array bound as a whole
///
/// ```
/// # use oracle_session::*;
/// let ids = ArrayBind::new("ids", vec![1, 2, 3], BindType::Int64);
/// assert_eq!(ids.len(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayBind {
    name: String,
    values: Vec<Value>,
    element_type: BindType,
}

impl ArrayBind {
    pub fn new<N, I>(name: N, values: I, element_type: BindType) -> ArrayBind
    where
        N: Into<String>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        ArrayBind {
            name: strip_colon(name.into()),
            values: values.into_iter().map(Into::into).collect(),
            element_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn element_type(&self) -> BindType {
        self.element_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn strip_colon(mut name: String) -> String {
    if name.starts_with(':') {
        name.remove(0);
    }
    name
}

/// Scalar and array bind variables of one statement
///
/// Its `Display` output is the bind list shown in parse and execution errors,
/// such as `[(":id", 10, -1), (":name", 'abc', 20)]`.
#[derive(Clone, Copy, Debug)]
pub struct BindList<'a> {
    scalars: &'a [BindVar],
    arrays: &'a [ArrayBind],
}

impl<'a> BindList<'a> {
    pub fn new(scalars: &'a [BindVar]) -> BindList<'a> {
        BindList {
            scalars,
            arrays: &[],
        }
    }

    pub fn with_arrays(scalars: &'a [BindVar], arrays: &'a [ArrayBind]) -> BindList<'a> {
        BindList { scalars, arrays }
    }

    pub fn scalars(&self) -> &'a [BindVar] {
        self.scalars
    }

    pub fn arrays(&self) -> &'a [ArrayBind] {
        self.arrays
    }

    fn names(&self) -> impl Iterator<Item = &'a str> {
        self.scalars
            .iter()
            .map(BindVar::name)
            .chain(self.arrays.iter().map(ArrayBind::name))
    }

    /// Checks every name and rejects duplicates compared case-insensitively.
    pub(crate) fn validate(&self, extra: &[&str]) -> Result<()> {
        let mut seen: Vec<String> = Vec::new();
        for name in self.names().chain(extra.iter().copied()) {
            if normalize_bind_name(name)?.len() != name.len() {
                return Err(Error::invalid_argument(format!(
                    "invalid bind variable name \"{}\"",
                    name
                )));
            }
            let name = name.to_uppercase();
            if seen.contains(&name) {
                return Err(Error::invalid_argument(format!(
                    "duplicated bind variable name \"{}\"",
                    name
                )));
            }
            seen.push(name);
        }
        Ok(())
    }

    /// Rejects names reserved for internal use.
    pub(crate) fn check_reserved(&self, reserved: &[&str]) -> Result<()> {
        for name in self.names() {
            if let Some(r) = reserved.iter().find(|r| r.eq_ignore_ascii_case(name)) {
                return Err(Error::invalid_argument(format!(
                    "bind variable name \"{}\" is reserved",
                    r
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for BindList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[")?;
        let mut first = true;
        for var in self.scalars {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            let len = match (var.max_len, var.bind_type) {
                (Some(len), _) => len as i64,
                (None, Some(t)) => t.declared_len(),
                (None, None) => -1,
            };
            match var.direction {
                BindDirection::Out => write!(f, "(\":{}\", OUT {}, {})", var.name, var.bind_type(), len)?,
                _ => write!(f, "(\":{}\", {}, {})", var.name, var.value, len)?,
            }
        }
        for arr in self.arrays {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "(\":{}\", [", arr.name)?;
            for (i, val) in arr.values.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", val)?;
            }
            write!(f, "], {})", arr.element_type.declared_len())?;
        }
        write!(f, "]")
    }
}
