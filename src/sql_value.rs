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

use crate::connection::Connection;
use crate::error::chkerr;
use crate::sql_type::Lob;
use crate::sql_type::LobKind;
use crate::sql_type::OracleType;
use crate::to_rust_slice;
use crate::to_rust_str;
use crate::util::check_number_format;
use crate::AssertSend;
use crate::BindType;
use crate::Context;
use crate::DpiStmt;
use crate::DpiVar;
use crate::Error;
use crate::Result;
use crate::Value;
use chrono::Datelike;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Timelike;
use odpic_sys::*;
use std::os::raw::c_char;
use std::ptr;

/// How a fetched or returned buffer is turned into a [`Value`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ValueHint {
    Text,
    Number,
    Raw,
    Clob,
    Blob,
    Other,
}

impl From<&OracleType> for ValueHint {
    fn from(oratype: &OracleType) -> ValueHint {
        match *oratype {
            OracleType::Number(..) | OracleType::Float(_) => ValueHint::Number,
            OracleType::Raw(_) | OracleType::LongRaw => ValueHint::Raw,
            OracleType::CLOB | OracleType::NCLOB => ValueHint::Clob,
            OracleType::BLOB | OracleType::BFILE => ValueHint::Blob,
            OracleType::Varchar2(_)
            | OracleType::NVarchar2(_)
            | OracleType::Char(_)
            | OracleType::NChar(_)
            | OracleType::Rowid
            | OracleType::Long => ValueHint::Text,
            _ => ValueHint::Other,
        }
    }
}

impl From<BindType> for ValueHint {
    fn from(bind_type: BindType) -> ValueHint {
        match bind_type {
            BindType::Varchar2(_) => ValueHint::Text,
            BindType::Number => ValueHint::Number,
            BindType::Raw(_) => ValueHint::Raw,
            BindType::Clob => ValueHint::Clob,
            BindType::Blob => ValueHint::Blob,
            _ => ValueHint::Other,
        }
    }
}

/// Bind variable buffer holding one value or an array of values
pub(crate) struct SqlVar {
    ctxt: Context,
    handle: DpiVar,
    data: *mut dpiData,
    bind_type: Option<BindType>,
    array_size: u32,
}

unsafe impl Send for SqlVar {}
impl AssertSend for SqlVar {}

impl SqlVar {
    fn create(
        conn: &Connection,
        params: (dpiOracleTypeNum, dpiNativeTypeNum, u32, i32),
        array_size: u32,
        is_array: bool,
    ) -> Result<(DpiVar, *mut dpiData)> {
        let (oratype_num, native_type_num, size, size_is_byte) = params;
        let mut handle = ptr::null_mut();
        let mut data = ptr::null_mut();
        chkerr!(
            conn.ctxt(),
            dpiConn_newVar(
                conn.handle(),
                oratype_num,
                native_type_num,
                array_size,
                size,
                size_is_byte,
                i32::from(is_array),
                ptr::null_mut(),
                &mut handle,
                &mut data,
            )
        );
        Ok((DpiVar::new(handle), data))
    }

    /// Creates a scalar variable.
    pub(crate) fn new(conn: &Connection, bind_type: BindType) -> Result<SqlVar> {
        let (handle, data) = SqlVar::create(conn, bind_type.var_params(), 1, false)?;
        Ok(SqlVar {
            ctxt: *conn.ctxt(),
            handle,
            data,
            bind_type: Some(bind_type),
            array_size: 1,
        })
    }

    /// Creates a PL/SQL index-by array variable filled with `values`.
    pub(crate) fn new_array(
        conn: &Connection,
        element_type: BindType,
        values: &[Value],
    ) -> Result<SqlVar> {
        let array_size = (values.len() as u32).max(1);
        let (handle, data) =
            SqlVar::create(conn, element_type.var_params(), array_size, true)?;
        let mut var = SqlVar {
            ctxt: *conn.ctxt(),
            handle,
            data,
            bind_type: Some(element_type),
            array_size,
        };
        for (pos, value) in values.iter().enumerate() {
            var.set(pos as u32, value)?;
        }
        chkerr!(
            &var.ctxt,
            dpiVar_setNumElementsInArray(var.raw(), values.len() as u32)
        );
        Ok(var)
    }

    /// Creates a REF CURSOR variable. `prefetch_rows` is applied to the cursor itself.
    pub(crate) fn new_cursor(conn: &Connection, prefetch_rows: Option<u32>) -> Result<SqlVar> {
        let params = (DPI_ORACLE_TYPE_STMT, DPI_NATIVE_TYPE_STMT, 0, 0);
        let (handle, data) = SqlVar::create(conn, params, 1, false)?;
        if let Some(prefetch_rows) = prefetch_rows {
            let stmt = unsafe { dpiData_getStmt(data) };
            chkerr!(conn.ctxt(), dpiStmt_setPrefetchRows(stmt, prefetch_rows));
        }
        Ok(SqlVar {
            ctxt: *conn.ctxt(),
            handle,
            data,
            bind_type: None,
            array_size: 1,
        })
    }

    pub(crate) fn raw(&self) -> *mut dpiVar {
        self.handle.raw()
    }

    fn data_at(&self, pos: u32) -> Result<*mut dpiData> {
        if pos < self.array_size {
            Ok(unsafe { self.data.add(pos as usize) })
        } else {
            Err(Error::internal_error(format!(
                "position {} is out of the array size {}",
                pos, self.array_size
            )))
        }
    }

    fn set_bytes(&mut self, pos: u32, val: &[u8]) -> Result<()> {
        chkerr!(
            &self.ctxt,
            dpiVar_setFromBytes(
                self.raw(),
                pos,
                val.as_ptr() as *const c_char,
                val.len() as u32
            )
        );
        Ok(())
    }

    /// Stores `value` at `pos`, converting it to the variable type.
    pub(crate) fn set(&mut self, pos: u32, value: &Value) -> Result<()> {
        let bind_type = match self.bind_type {
            Some(t) => t,
            None => return Err(Error::internal_error("cannot set a value to a cursor variable")),
        };
        let data = self.data_at(pos)?;
        let mismatch = || Error::invalid_type_conversion(value.type_name(), bind_type.to_string());
        unsafe {
            match (value, bind_type) {
                (Value::Null, _) => (*data).isNull = 1,
                (Value::Integer(n), BindType::Int64) => dpiData_setInt64(data, *n),
                (Value::Integer(n), BindType::Double) => dpiData_setDouble(data, *n as f64),
                (Value::Float(n), BindType::Double) => dpiData_setDouble(data, *n),
                (Value::Integer(_), BindType::Number | BindType::Varchar2(_))
                | (Value::Float(_), BindType::Number | BindType::Varchar2(_)) => {
                    self.set_bytes(pos, value.to_string().as_bytes())?
                }
                (Value::Number(s) | Value::Text(s), BindType::Number) => {
                    check_number_format(s)?;
                    self.set_bytes(pos, s.as_bytes())?
                }
                (Value::Number(s) | Value::Text(s), BindType::Varchar2(_)) => {
                    self.set_bytes(pos, s.as_bytes())?
                }
                (Value::Number(_) | Value::Text(_), BindType::Int64) => {
                    dpiData_setInt64(data, value.as_i64().map_err(|_| mismatch())?)
                }
                (Value::Number(_) | Value::Text(_), BindType::Double) => {
                    dpiData_setDouble(data, value.as_f64().map_err(|_| mismatch())?)
                }
                (Value::Bytes(b), BindType::Raw(_)) => self.set_bytes(pos, b)?,
                (Value::Boolean(b), BindType::Boolean) => dpiData_setBool(data, i32::from(*b)),
                (Value::Timestamp(ts), BindType::Timestamp) => dpiData_setTimestamp(
                    data,
                    dpi_year(ts)?,
                    ts.month() as u8,
                    ts.day() as u8,
                    ts.hour() as u8,
                    ts.minute() as u8,
                    ts.second() as u8,
                    ts.nanosecond(),
                    0,
                    0,
                ),
                (Value::IntervalDS(d), BindType::IntervalDS) => {
                    let (days, hours, minutes, seconds, nanos) = split_duration(d);
                    dpiData_setIntervalDS(data, days, hours, minutes, seconds, nanos)
                }
                (Value::IntervalYM { years, months }, BindType::IntervalYM) => {
                    dpiData_setIntervalYM(data, *years, *months)
                }
                (Value::Lob(lob), BindType::Clob | BindType::Blob) => {
                    chkerr!(&self.ctxt, dpiVar_setFromLob(self.raw(), pos, lob.raw()))
                }
                _ => return Err(mismatch()),
            }
        }
        Ok(())
    }

    /// Binds a LOB locator at position 0.
    pub(crate) fn set_lob(&mut self, lob: &Lob) -> Result<()> {
        chkerr!(&self.ctxt, dpiVar_setFromLob(self.raw(), 0, lob.raw()));
        Ok(())
    }

    /// Reads the value at `pos`.
    pub(crate) fn get(&self, pos: u32) -> Result<Value> {
        let hint = self.bind_type.map_or(ValueHint::Other, ValueHint::from);
        let native_type = self.native_type_num()?;
        unsafe { value_from_data(&self.ctxt, self.data_at(pos)?, native_type, hint) }
    }

    /// Reads the first value written by a `RETURNING ... INTO` clause.
    /// `None` when the statement returned no rows.
    pub(crate) fn get_returned(&self) -> Result<Option<Value>> {
        let mut num = 0;
        let mut data = ptr::null_mut();
        chkerr!(
            &self.ctxt,
            dpiVar_getReturnedData(self.raw(), 0, &mut num, &mut data)
        );
        if num == 0 {
            return Ok(None);
        }
        let hint = self.bind_type.map_or(ValueHint::Other, ValueHint::from);
        let native_type = self.native_type_num()?;
        unsafe { value_from_data(&self.ctxt, data, native_type, hint).map(Some) }
    }

    /// Returns the statement of a REF CURSOR variable after execution.
    pub(crate) fn cursor(&self) -> Result<DpiStmt> {
        let data = self.data_at(0)?;
        unsafe {
            if (*data).isNull != 0 {
                return Err(Error::null_value());
            }
            Ok(DpiStmt::with_add_ref(dpiData_getStmt(data)))
        }
    }

    fn native_type_num(&self) -> Result<dpiNativeTypeNum> {
        match self.bind_type {
            Some(t) => Ok(t.var_params().1),
            None => Ok(DPI_NATIVE_TYPE_STMT),
        }
    }
}

fn split_duration(d: &Duration) -> (i32, i32, i32, i32, i32) {
    let secs = d.num_seconds();
    let nanos = (*d - Duration::seconds(secs)).num_nanoseconds().unwrap_or(0);
    (
        (secs / 86400) as i32,
        (secs / 3600 % 24) as i32,
        (secs / 60 % 60) as i32,
        (secs % 60) as i32,
        nanos as i32,
    )
}

fn join_duration(it: &dpiIntervalDS) -> Duration {
    Duration::days(it.days as i64)
        + Duration::hours(it.hours as i64)
        + Duration::minutes(it.minutes as i64)
        + Duration::seconds(it.seconds as i64)
        + Duration::nanoseconds(it.fseconds as i64)
}

fn dpi_year(ts: &NaiveDateTime) -> Result<i16> {
    i16::try_from(ts.year()).map_err(|_| {
        Error::invalid_type_conversion(format!("timestamp {}", ts), "TIMESTAMP")
    })
}

fn timestamp_from_dpi(ts: &dpiTimestamp) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(ts.year as i32, ts.month as u32, ts.day as u32)
        .and_then(|date| {
            date.and_hms_nano_opt(
                ts.hour as u32,
                ts.minute as u32,
                ts.second as u32,
                ts.fsecond,
            )
        })
        .ok_or_else(|| {
            Error::invalid_type_conversion(
                format!(
                    "timestamp {}-{}-{} {}:{}:{}.{}",
                    ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second, ts.fsecond
                ),
                "NaiveDateTime",
            )
        })
}

/// Converts `data` of `native_type` to a [`Value`].
///
/// # Safety
///
/// `data` must point to a valid dpiData whose native type is `native_type`.
pub(crate) unsafe fn value_from_data(
    ctxt: &Context,
    data: *mut dpiData,
    native_type: dpiNativeTypeNum,
    hint: ValueHint,
) -> Result<Value> {
    if (*data).isNull != 0 {
        return Ok(Value::Null);
    }
    match native_type {
        DPI_NATIVE_TYPE_INT64 => Ok(Value::Integer(dpiData_getInt64(data))),
        DPI_NATIVE_TYPE_UINT64 => {
            let n = dpiData_getUint64(data);
            Ok(i64::try_from(n).map_or_else(|_| Value::Number(n.to_string()), Value::Integer))
        }
        DPI_NATIVE_TYPE_FLOAT => Ok(Value::Float(dpiData_getFloat(data) as f64)),
        DPI_NATIVE_TYPE_DOUBLE => Ok(Value::Float(dpiData_getDouble(data))),
        DPI_NATIVE_TYPE_BYTES => {
            let bytes = dpiData_getBytes(data);
            match hint {
                ValueHint::Raw | ValueHint::Blob => Ok(Value::Bytes(
                    to_rust_slice((*bytes).ptr, (*bytes).length).to_vec(),
                )),
                ValueHint::Number => Ok(Value::Number(to_rust_str((*bytes).ptr, (*bytes).length))),
                _ => Ok(Value::Text(to_rust_str((*bytes).ptr, (*bytes).length))),
            }
        }
        DPI_NATIVE_TYPE_TIMESTAMP => Ok(Value::Timestamp(timestamp_from_dpi(
            &*dpiData_getTimestamp(data),
        )?)),
        DPI_NATIVE_TYPE_INTERVAL_DS => Ok(Value::IntervalDS(join_duration(
            &*dpiData_getIntervalDS(data),
        ))),
        DPI_NATIVE_TYPE_INTERVAL_YM => {
            let it = &*dpiData_getIntervalYM(data);
            Ok(Value::IntervalYM {
                years: it.years,
                months: it.months,
            })
        }
        DPI_NATIVE_TYPE_BOOLEAN => Ok(Value::Boolean(dpiData_getBool(data) != 0)),
        DPI_NATIVE_TYPE_LOB => {
            let kind = match hint {
                ValueHint::Clob => LobKind::Clob,
                _ => LobKind::Blob,
            };
            Ok(Value::Lob(Lob::from_raw(*ctxt, dpiData_getLOB(data), kind)))
        }
        DPI_NATIVE_TYPE_ROWID => {
            let mut ptr = ptr::null();
            let mut len = 0;
            chkerr!(
                ctxt,
                dpiRowid_getStringValue((*data).value.asRowid, &mut ptr, &mut len)
            );
            Ok(Value::Text(to_rust_str(ptr, len)))
        }
        DPI_NATIVE_TYPE_STMT => Err(Error::invalid_type_conversion("REF CURSOR", "Value")),
        _ => Err(Error::internal_error(format!(
            "unsupported native type number {}",
            native_type
        ))),
    }
}
