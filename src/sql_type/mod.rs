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

//! SQL data types
//!
//! Fetched column values are converted to [`Value`] as follows.
//!
//! | Oracle Type | Value |
//! | --- | --- |
//! | character data types, ROWID, LONG | [`Value::Text`] |
//! | NUMBER(p) with 1 <= p <= 18, PLS_INTEGER | [`Value::Integer`] |
//! | other NUMBER, FLOAT | [`Value::Number`] (decimal text) |
//! | BINARY_FLOAT, BINARY_DOUBLE | [`Value::Float`] |
//! | RAW, LONG RAW | [`Value::Bytes`] |
//! | DATE, TIMESTAMP types | [`Value::Timestamp`] |
//! | INTERVAL DAY TO SECOND | [`Value::IntervalDS`] |
//! | INTERVAL YEAR TO MONTH | [`Value::IntervalYM`] |
//! | BOOLEAN (PL/SQL only) | [`Value::Boolean`] |
//! | CLOB, NCLOB, BLOB, BFILE | [`Value::Lob`] |
//!
//! NULL is [`Value::Null`] regardless of the column type.

mod lob;
mod oracle_type;
mod value;

pub use self::lob::Lob;
pub use self::lob::LobData;
pub use self::lob::LobKind;
pub use self::oracle_type::OracleType;
pub use self::value::Value;
