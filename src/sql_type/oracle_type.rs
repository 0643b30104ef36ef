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

use crate::Error;
use crate::Result;
use odpic_sys::*;
use std::fmt;

/// Oracle data type of a query column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OracleType {
    /// VARCHAR2(size)
    Varchar2(u32),

    /// NVARCHAR2(size)
    NVarchar2(u32),

    /// CHAR(size)
    Char(u32),

    /// NCHAR(size)
    NChar(u32),

    /// ROWID
    Rowid,

    /// RAW(size)
    Raw(u32),

    /// BINARY_FLOAT
    BinaryFloat,

    /// BINARY_DOUBLE
    BinaryDouble,

    /// NUMBER(precision, scale)
    ///
    /// `precision` is 0 when it is omitted in the column definition.
    Number(u8, i8),

    /// FLOAT(precision)
    Float(u8),

    /// DATE
    Date,

    /// TIMESTAMP(fsprec)
    Timestamp(u8),

    /// TIMESTAMP(fsprec) WITH TIME ZONE
    TimestampTZ(u8),

    /// TIMESTAMP(fsprec) WITH LOCAL TIME ZONE
    TimestampLTZ(u8),

    /// INTERVAL DAY(lfprec) TO SECOND(fsprec)
    IntervalDS(u8, u8),

    /// INTERVAL YEAR(lfprec) TO MONTH
    IntervalYM(u8),

    /// CLOB
    CLOB,

    /// NCLOB
    NCLOB,

    /// BLOB
    BLOB,

    /// BFILE
    BFILE,

    /// REF CURSOR
    RefCursor,

    /// BOOLEAN
    Boolean,

    /// LONG
    Long,

    /// LONG RAW
    LongRaw,

    /// Integer column of PL/SQL types such as PLS_INTEGER
    Int64,
}

impl OracleType {
    pub(crate) fn from_type_info(info: &dpiDataTypeInfo) -> Result<OracleType> {
        match info.oracleTypeNum {
            DPI_ORACLE_TYPE_VARCHAR => Ok(OracleType::Varchar2(info.dbSizeInBytes)),
            DPI_ORACLE_TYPE_NVARCHAR => Ok(OracleType::NVarchar2(info.sizeInChars)),
            DPI_ORACLE_TYPE_CHAR => Ok(OracleType::Char(info.dbSizeInBytes)),
            DPI_ORACLE_TYPE_NCHAR => Ok(OracleType::NChar(info.sizeInChars)),
            DPI_ORACLE_TYPE_ROWID => Ok(OracleType::Rowid),
            DPI_ORACLE_TYPE_RAW => Ok(OracleType::Raw(info.dbSizeInBytes)),
            DPI_ORACLE_TYPE_NATIVE_FLOAT => Ok(OracleType::BinaryFloat),
            DPI_ORACLE_TYPE_NATIVE_DOUBLE => Ok(OracleType::BinaryDouble),
            DPI_ORACLE_TYPE_NATIVE_INT => Ok(OracleType::Int64),
            DPI_ORACLE_TYPE_NUMBER => {
                if info.precision != 0 && info.scale == -127 {
                    Ok(OracleType::Float(info.precision as u8))
                } else {
                    Ok(OracleType::Number(info.precision as u8, info.scale))
                }
            }
            DPI_ORACLE_TYPE_DATE => Ok(OracleType::Date),
            DPI_ORACLE_TYPE_TIMESTAMP => Ok(OracleType::Timestamp(info.fsPrecision)),
            DPI_ORACLE_TYPE_TIMESTAMP_TZ => Ok(OracleType::TimestampTZ(info.fsPrecision)),
            DPI_ORACLE_TYPE_TIMESTAMP_LTZ => Ok(OracleType::TimestampLTZ(info.fsPrecision)),
            DPI_ORACLE_TYPE_INTERVAL_DS => Ok(OracleType::IntervalDS(
                info.precision as u8,
                info.fsPrecision,
            )),
            DPI_ORACLE_TYPE_INTERVAL_YM => Ok(OracleType::IntervalYM(info.precision as u8)),
            DPI_ORACLE_TYPE_CLOB => Ok(OracleType::CLOB),
            DPI_ORACLE_TYPE_NCLOB => Ok(OracleType::NCLOB),
            DPI_ORACLE_TYPE_BLOB => Ok(OracleType::BLOB),
            DPI_ORACLE_TYPE_BFILE => Ok(OracleType::BFILE),
            DPI_ORACLE_TYPE_STMT => Ok(OracleType::RefCursor),
            DPI_ORACLE_TYPE_BOOLEAN => Ok(OracleType::Boolean),
            DPI_ORACLE_TYPE_LONG_VARCHAR => Ok(OracleType::Long),
            DPI_ORACLE_TYPE_LONG_RAW => Ok(OracleType::LongRaw),
            _ => Err(Error::internal_error(format!(
                "unsupported Oracle type number {}",
                info.oracleTypeNum
            ))),
        }
    }

    /// True for NUMBER columns fetched as [`Value::Integer`](crate::Value::Integer).
    pub fn is_integer_number(&self) -> bool {
        matches!(*self, OracleType::Number(prec, 0) if (1..=18).contains(&prec))
    }

    /// True for CLOB, NCLOB, BLOB and BFILE.
    pub fn is_lob(&self) -> bool {
        matches!(
            *self,
            OracleType::CLOB | OracleType::NCLOB | OracleType::BLOB | OracleType::BFILE
        )
    }

    // Native type used to define a query column. NUMBER columns are
    // defined explicitly so that no precision is lost through doubles.
    pub(crate) fn define_native_type(&self) -> Option<dpiNativeTypeNum> {
        match *self {
            OracleType::Number(..) if self.is_integer_number() => Some(DPI_NATIVE_TYPE_INT64),
            OracleType::Number(..) | OracleType::Float(_) => Some(DPI_NATIVE_TYPE_BYTES),
            _ => None,
        }
    }
}

impl fmt::Display for OracleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OracleType::Varchar2(size) => write!(f, "VARCHAR2({})", size),
            OracleType::NVarchar2(size) => write!(f, "NVARCHAR2({})", size),
            OracleType::Char(size) => write!(f, "CHAR({})", size),
            OracleType::NChar(size) => write!(f, "NCHAR({})", size),
            OracleType::Rowid => write!(f, "ROWID"),
            OracleType::Raw(size) => write!(f, "RAW({})", size),
            OracleType::BinaryFloat => write!(f, "BINARY_FLOAT"),
            OracleType::BinaryDouble => write!(f, "BINARY_DOUBLE"),
            OracleType::Number(0, _) => write!(f, "NUMBER"),
            OracleType::Number(prec, 0) => write!(f, "NUMBER({})", prec),
            OracleType::Number(prec, scale) => write!(f, "NUMBER({},{})", prec, scale),
            OracleType::Float(126) => write!(f, "FLOAT"),
            OracleType::Float(prec) => write!(f, "FLOAT({})", prec),
            OracleType::Date => write!(f, "DATE"),
            OracleType::Timestamp(6) => write!(f, "TIMESTAMP"),
            OracleType::Timestamp(fsprec) => write!(f, "TIMESTAMP({})", fsprec),
            OracleType::TimestampTZ(6) => write!(f, "TIMESTAMP WITH TIME ZONE"),
            OracleType::TimestampTZ(fsprec) => {
                write!(f, "TIMESTAMP({}) WITH TIME ZONE", fsprec)
            }
            OracleType::TimestampLTZ(6) => write!(f, "TIMESTAMP WITH LOCAL TIME ZONE"),
            OracleType::TimestampLTZ(fsprec) => {
                write!(f, "TIMESTAMP({}) WITH LOCAL TIME ZONE", fsprec)
            }
            OracleType::IntervalDS(2, 6) => write!(f, "INTERVAL DAY TO SECOND"),
            OracleType::IntervalDS(lfprec, fsprec) => {
                write!(f, "INTERVAL DAY({}) TO SECOND({})", lfprec, fsprec)
            }
            OracleType::IntervalYM(2) => write!(f, "INTERVAL YEAR TO MONTH"),
            OracleType::IntervalYM(lfprec) => write!(f, "INTERVAL YEAR({}) TO MONTH", lfprec),
            OracleType::CLOB => write!(f, "CLOB"),
            OracleType::NCLOB => write!(f, "NCLOB"),
            OracleType::BLOB => write!(f, "BLOB"),
            OracleType::BFILE => write!(f, "BFILE"),
            OracleType::RefCursor => write!(f, "REF CURSOR"),
            OracleType::Boolean => write!(f, "BOOLEAN"),
            OracleType::Long => write!(f, "LONG"),
            OracleType::LongRaw => write!(f, "LONG RAW"),
            OracleType::Int64 => write!(f, "PLS_INTEGER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_numbers() {
        assert!(OracleType::Number(1, 0).is_integer_number());
        assert!(OracleType::Number(18, 0).is_integer_number());
        assert!(!OracleType::Number(19, 0).is_integer_number());
        assert!(!OracleType::Number(0, 0).is_integer_number());
        assert!(!OracleType::Number(10, 2).is_integer_number());
        assert_eq!(
            OracleType::Number(9, 0).define_native_type(),
            Some(DPI_NATIVE_TYPE_INT64)
        );
        assert_eq!(
            OracleType::Number(0, 0).define_native_type(),
            Some(DPI_NATIVE_TYPE_BYTES)
        );
        assert_eq!(OracleType::Varchar2(10).define_native_type(), None);
    }

    #[test]
    fn display() {
        assert_eq!(OracleType::Number(0, 0).to_string(), "NUMBER");
        assert_eq!(OracleType::Number(5, 0).to_string(), "NUMBER(5)");
        assert_eq!(OracleType::Number(7, 2).to_string(), "NUMBER(7,2)");
        assert_eq!(OracleType::Timestamp(6).to_string(), "TIMESTAMP");
        assert_eq!(OracleType::Timestamp(3).to_string(), "TIMESTAMP(3)");
        assert_eq!(OracleType::IntervalDS(2, 6).to_string(), "INTERVAL DAY TO SECOND");
        assert!(OracleType::NCLOB.is_lob());
        assert!(!OracleType::Long.is_lob());
    }
}
