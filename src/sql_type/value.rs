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

use crate::sql_type::Lob;
use crate::util::set_hex_string;
use crate::Error;
use crate::Result;
use chrono::Duration;
use chrono::NaiveDateTime;
use std::fmt;

/// A value bound to or fetched from a statement
///
/// Values convert from the usual Rust types:
///
/// ```
/// # use oracle_session::Value;
/// assert_eq!(Value::from(10), Value::Integer(10));
/// assert_eq!(Value::from("ten"), Value::Text("ten".into()));
/// assert_eq!(Value::from(None::<i64>), Value::Null);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,

    /// NUMBER with scale 0 and precision up to 18, or PLS_INTEGER
    Integer(i64),

    /// BINARY_FLOAT and BINARY_DOUBLE
    Float(f64),

    /// Other NUMBER values as exact decimal text
    Number(String),

    /// Character data
    Text(String),

    /// RAW and LONG RAW
    Bytes(Vec<u8>),

    /// PL/SQL BOOLEAN
    Boolean(bool),

    /// DATE and TIMESTAMP. Time zone offsets are not applied.
    Timestamp(NaiveDateTime),

    /// INTERVAL DAY TO SECOND
    IntervalDS(Duration),

    /// INTERVAL YEAR TO MONTH
    IntervalYM { years: i32, months: i32 },

    /// CLOB, NCLOB, BLOB or BFILE locator
    Lob(Lob),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Number(_) => "Number",
            Value::Text(_) => "Text",
            Value::Bytes(_) => "Bytes",
            Value::Boolean(_) => "Boolean",
            Value::Timestamp(_) => "Timestamp",
            Value::IntervalDS(_) => "IntervalDS",
            Value::IntervalYM { .. } => "IntervalYM",
            Value::Lob(_) => "Lob",
        }
    }

    fn conversion_error(&self, to: &str) -> Error {
        if self.is_null() {
            Error::null_value()
        } else {
            Error::invalid_type_conversion(self.type_name(), to)
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Integer(n) => Ok(*n),
            Value::Number(s) | Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::invalid_type_conversion(format!("\"{}\"", s), "i64")),
            _ => Err(self.conversion_error("i64")),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Integer(n) => Ok(*n as f64),
            Value::Float(n) => Ok(*n),
            Value::Number(s) | Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::invalid_type_conversion(format!("\"{}\"", s), "f64")),
            _ => Err(self.conversion_error("f64")),
        }
    }

    /// Returns text and decimal number values as `&str`.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Text(s) | Value::Number(s) => Ok(s),
            _ => Err(self.conversion_error("&str")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b),
            _ => Err(self.conversion_error("&[u8]")),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.conversion_error("bool")),
        }
    }

    pub fn as_timestamp(&self) -> Result<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Ok(*ts),
            _ => Err(self.conversion_error("NaiveDateTime")),
        }
    }

    pub fn as_lob(&self) -> Result<&Lob> {
        match self {
            Value::Lob(lob) => Ok(lob),
            _ => Err(self.conversion_error("Lob")),
        }
    }
}

/// Renders the value as a SQL literal, as shown in error messages and logs.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Number(s) => write!(f, "{}", s),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => {
                let mut s = String::with_capacity(b.len() * 2);
                set_hex_string(&mut s, b);
                write!(f, "HEXTORAW('{}')", s)
            }
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Timestamp(ts) => write!(f, "TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::IntervalDS(d) => {
                let sign = if *d < Duration::zero() { "-" } else { "+" };
                let secs = d.num_seconds().abs();
                let nanos = (*d - Duration::seconds(d.num_seconds()))
                    .num_nanoseconds()
                    .unwrap_or(0)
                    .abs();
                write!(
                    f,
                    "INTERVAL '{}{} {:02}:{:02}:{:02}.{:09}' DAY TO SECOND",
                    sign,
                    secs / 86400,
                    secs / 3600 % 24,
                    secs / 60 % 60,
                    secs % 60,
                    nanos
                )
            }
            Value::IntervalYM { years, months } => {
                let sign = if *years < 0 || *months < 0 { "-" } else { "+" };
                write!(
                    f,
                    "INTERVAL '{}{}-{}' YEAR TO MONTH",
                    sign,
                    years.abs(),
                    months.abs()
                )
            }
            Value::Lob(lob) => write!(f, "({:?})", lob.kind()),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Value {
                    Value::$variant($conv(v))
                }
            }
        )*
    };
}

impl_from_for_value! {
    i64 => Integer(|v| v),
    i32 => Integer(i64::from),
    i16 => Integer(i64::from),
    u32 => Integer(i64::from),
    f64 => Float(|v| v),
    f32 => Float(f64::from),
    bool => Boolean(|v| v),
    String => Text(|v| v),
    &str => Text(str::to_string),
    Vec<u8> => Bytes(|v| v),
    &[u8] => Bytes(<[u8]>::to_vec),
    NaiveDateTime => Timestamp(|v| v),
    Duration => IntervalDS(|v| v),
    Lob => Lob(|v| v),
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Value {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::NaiveDate;

    #[test]
    fn from_rust_types() {
        assert_eq!(Value::from(7i32), Value::Integer(7));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(&b"\x01\x02"[..]), Value::Bytes(vec![1, 2]));
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
        assert!(Value::from(None::<String>).is_null());
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::Integer(42).as_i64().unwrap(), 42);
        assert_eq!(Value::Number("123".into()).as_i64().unwrap(), 123);
        assert_eq!(Value::Number("1.25".into()).as_f64().unwrap(), 1.25);
        assert_eq!(Value::Text("abc".into()).as_str().unwrap(), "abc");
        assert_eq!(
            Value::Null.as_i64().unwrap_err().kind(),
            ErrorKind::NullValue
        );
        assert_eq!(
            Value::Boolean(true).as_str().unwrap_err().kind(),
            ErrorKind::InvalidTypeConversion
        );
        assert_eq!(
            Value::Number("1.5".into()).as_i64().unwrap_err().kind(),
            ErrorKind::InvalidTypeConversion
        );
        assert_eq!(
            Value::Integer(1).as_lob().unwrap_err().kind(),
            ErrorKind::InvalidTypeConversion
        );
    }

    #[test]
    fn display_as_literal() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Text("it's".into()).to_string(), "'it''s'");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "HEXTORAW('DEAD')");
        let ts = NaiveDate::from_ymd_opt(2012, 3, 4)
            .and_then(|d| d.and_hms_opt(5, 6, 7))
            .unwrap();
        assert_eq!(
            Value::Timestamp(ts).to_string(),
            "TIMESTAMP '2012-03-04 05:06:07'"
        );
        let it = Duration::days(1) + Duration::hours(2) + Duration::milliseconds(500);
        assert_eq!(
            Value::IntervalDS(it).to_string(),
            "INTERVAL '+1 02:00:00.500000000' DAY TO SECOND"
        );
        assert_eq!(
            Value::IntervalYM {
                years: 3,
                months: 2
            }
            .to_string(),
            "INTERVAL '+3-2' YEAR TO MONTH"
        );
    }
}
