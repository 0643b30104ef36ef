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
use crate::sql_value::value_from_data;
use crate::sql_value::SqlVar;
use crate::sql_value::ValueHint;
use crate::to_odpi_str;
use crate::to_rust_str;
use crate::ArrayBind;
use crate::BindDirection;
use crate::BindType;
use crate::BindVar;
use crate::ColumnInfo;
use crate::Context;
use crate::DpiStmt;
use crate::Error;
use crate::Result;
use crate::Row;
use crate::Value;
use odpic_sys::*;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VarKind {
    Scalar(BindDirection),
    Array,
    Cursor,
    ReturnedLob,
}

struct BoundVar {
    name: String,
    kind: VarKind,
    var: SqlVar,
}

/// An executed statement
///
/// A statement borrows the session that executed it, so it cannot outlive
/// the connection. The underlying handle is released when the statement is
/// dropped.
///
/// ```no_run
/// # use oracle_session::*; fn try_main() -> Result<()> {
/// # let session = Session::open("scott", "tiger", "", "", "", "", "")?;
/// let mut stmt = session.execute_statement(
///     "select empno, ename from emp order by empno",
///     "list employees",
///     &[],
/// )?;
/// for row_result in stmt.rows() {
///     let row = row_result?;
///     println!("{:?} {:?}", row.get("EMPNO")?, row.get("ENAME")?);
/// }
/// # Ok(())}
/// ```
pub struct Statement<'conn> {
    conn: &'conn Connection,
    handle: DpiStmt,
    sql: String,
    binds: String,
    is_query: bool,
    is_returning: bool,
    vars: Vec<BoundVar>,
    columns: Option<Arc<Vec<ColumnInfo>>>,
}

impl<'conn> Statement<'conn> {
    /// Parses `sql`. `binds` is the rendered bind list reported by errors.
    pub(crate) fn prepare(
        conn: &'conn Connection,
        sql: &str,
        binds: String,
    ) -> Result<Statement<'conn>> {
        let (handle, info) = match Statement::prepare_raw(conn, sql) {
            Ok(prepared) => prepared,
            Err(err) => return Err(err.into_parse(sql, binds)),
        };
        Ok(Statement {
            conn,
            handle,
            sql: sql.to_string(),
            binds,
            is_query: info.isQuery != 0,
            is_returning: info.isReturning != 0,
            vars: Vec::new(),
            columns: None,
        })
    }

    fn prepare_raw(conn: &Connection, sql: &str) -> Result<(DpiStmt, dpiStmtInfo)> {
        let sql = to_odpi_str(sql);
        let mut handle = ptr::null_mut();
        chkerr!(
            conn.ctxt(),
            dpiConn_prepareStmt(
                conn.handle(),
                0,
                sql.ptr,
                sql.len,
                ptr::null(),
                0,
                &mut handle
            )
        );
        let handle = DpiStmt::new(handle);
        let mut info = MaybeUninit::uninit();
        chkerr!(
            conn.ctxt(),
            dpiStmt_getInfo(handle.raw(), info.as_mut_ptr())
        );
        Ok((handle, unsafe { info.assume_init() }))
    }

    /// Wraps the statement of a REF CURSOR which was opened by a PL/SQL block.
    pub(crate) fn from_cursor(
        conn: &'conn Connection,
        handle: DpiStmt,
        sql: &str,
        binds: &str,
    ) -> Result<Statement<'conn>> {
        let mut stmt = Statement {
            conn,
            handle,
            sql: sql.to_string(),
            binds: binds.to_string(),
            is_query: true,
            is_returning: false,
            vars: Vec::new(),
            columns: None,
        };
        let mut num_cols = 0;
        chkerr!(
            stmt.ctxt(),
            dpiStmt_getNumQueryColumns(stmt.handle.raw(), &mut num_cols)
        );
        stmt.describe(num_cols)?;
        Ok(stmt)
    }

    fn ctxt(&self) -> &Context {
        self.conn.ctxt()
    }

    /// Sets the number of rows fetched by the first round trip.
    pub(crate) fn set_prefetch_rows(&self, prefetch_rows: Option<u32>) -> Result<()> {
        if let Some(rows) = prefetch_rows {
            chkerr!(
                self.ctxt(),
                dpiStmt_setPrefetchRows(self.handle.raw(), rows)
            );
        }
        Ok(())
    }

    fn bind_by_name(&mut self, name: &str, kind: VarKind, var: SqlVar) -> Result<()> {
        let odpi_name = to_odpi_str(name);
        chkerr!(
            self.ctxt(),
            dpiStmt_bindByName(self.handle.raw(), odpi_name.ptr, odpi_name.len, var.raw())
        );
        self.vars.push(BoundVar {
            name: name.to_string(),
            kind,
            var,
        });
        Ok(())
    }

    /// Binds a scalar variable. Output-only variables are bound as NULL.
    pub(crate) fn bind(&mut self, bindvar: &BindVar) -> Result<()> {
        let mut var = SqlVar::new(self.conn, bindvar.bind_type())?;
        if bindvar.direction() != BindDirection::Out {
            var.set(0, bindvar.value())?;
        }
        self.bind_by_name(bindvar.name(), VarKind::Scalar(bindvar.direction()), var)
    }

    /// Binds the whole sequence as a PL/SQL index-by array.
    pub(crate) fn bind_array(&mut self, bind: &ArrayBind) -> Result<()> {
        let var = SqlVar::new_array(self.conn, bind.element_type(), bind.values())?;
        self.bind_by_name(bind.name(), VarKind::Array, var)
    }

    /// Binds a REF CURSOR variable. `prefetch_rows` applies to the cursor.
    pub(crate) fn bind_cursor(&mut self, name: &str, prefetch_rows: Option<u32>) -> Result<()> {
        let var = SqlVar::new_cursor(self.conn, prefetch_rows)?;
        self.bind_by_name(name, VarKind::Cursor, var)
    }

    /// Binds a LOB locator as input.
    pub(crate) fn bind_lob(&mut self, name: &str, lob: &Lob) -> Result<()> {
        let bind_type = match lob.kind() {
            LobKind::Clob => BindType::Clob,
            LobKind::Blob => BindType::Blob,
        };
        let mut var = SqlVar::new(self.conn, bind_type)?;
        var.set_lob(lob)?;
        self.bind_by_name(name, VarKind::Scalar(BindDirection::In), var)
    }

    /// Binds a variable receiving the locator of `RETURNING ... INTO`.
    pub(crate) fn bind_returned_lob(&mut self, name: &str, kind: LobKind) -> Result<()> {
        let bind_type = match kind {
            LobKind::Clob => BindType::Clob,
            LobKind::Blob => BindType::Blob,
        };
        let var = SqlVar::new(self.conn, bind_type)?;
        self.bind_by_name(name, VarKind::ReturnedLob, var)
    }

    /// Executes the statement and describes the select-list of a query.
    pub(crate) fn execute(&mut self, commit_on_success: bool) -> Result<()> {
        let mode = if commit_on_success {
            DPI_MODE_EXEC_COMMIT_ON_SUCCESS
        } else {
            DPI_MODE_EXEC_DEFAULT
        };
        let mut num_cols = 0;
        chkerr!(
            self.ctxt(),
            dpiStmt_execute(self.handle.raw(), mode, &mut num_cols)
        );
        if self.is_query {
            self.describe(num_cols)?;
        }
        Ok(())
    }

    fn describe(&mut self, num_cols: u32) -> Result<()> {
        let mut columns = Vec::with_capacity(num_cols as usize);
        for pos in 1..=num_cols {
            let mut info = MaybeUninit::uninit();
            chkerr!(
                self.ctxt(),
                dpiStmt_getQueryInfo(self.handle.raw(), pos, info.as_mut_ptr())
            );
            let info = unsafe { info.assume_init() };
            let oratype = OracleType::from_type_info(&info.typeInfo)?;
            // Integer NUMBERs are fetched as i64, others as decimal text.
            if let Some(native_type) = oratype.define_native_type() {
                chkerr!(
                    self.ctxt(),
                    dpiStmt_defineValue(
                        self.handle.raw(),
                        pos,
                        info.typeInfo.oracleTypeNum,
                        native_type,
                        0,
                        0,
                        ptr::null_mut()
                    )
                );
            }
            columns.push(ColumnInfo::new(
                to_rust_str(info.name, info.nameLength),
                oratype,
                info.nullOk != 0,
            ));
        }
        self.columns = Some(Arc::new(columns));
        Ok(())
    }

    /// Turns `err` into [`Error::Execution`] carrying the SQL text and binds.
    pub(crate) fn execution_error(&self, err: Error) -> Error {
        err.into_execution(&self.sql, self.binds.clone())
    }

    /// Runs `f`, reporting its failure as an execution error of this statement.
    pub(crate) fn in_execution<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Statement<'conn>) -> Result<T>,
    {
        f(self).map_err(|err| self.execution_error(err))
    }

    /// Returns the SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns true when the statement is a query or a REF CURSOR.
    pub fn is_query(&self) -> bool {
        self.is_query
    }

    /// Returns true when the statement has a `RETURNING ... INTO` clause.
    pub fn is_returning(&self) -> bool {
        self.is_returning
    }

    /// Returns column information of the select-list. Empty for non-queries.
    pub fn columns(&self) -> &[ColumnInfo] {
        match &self.columns {
            Some(columns) => columns.as_slice(),
            None => &[],
        }
    }

    /// Fetches the next row. `Ok(None)` after the last row.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        self.fetch_row().map_err(|err| self.execution_error(err))
    }

    fn fetch_row(&self) -> Result<Option<Row>> {
        let columns = match &self.columns {
            Some(columns) => columns.clone(),
            None => {
                return Err(Error::invalid_argument(
                    "could not fetch rows from a non-query statement",
                ))
            }
        };
        let mut found = 0;
        let mut buffer_row_index = 0;
        chkerr!(
            self.ctxt(),
            dpiStmt_fetch(self.handle.raw(), &mut found, &mut buffer_row_index)
        );
        if found == 0 {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let mut native_type = 0;
            let mut data = ptr::null_mut();
            chkerr!(
                self.ctxt(),
                dpiStmt_getQueryValue(
                    self.handle.raw(),
                    (idx + 1) as u32,
                    &mut native_type,
                    &mut data
                )
            );
            let hint = ValueHint::from(column.oracle_type());
            values.push(unsafe { value_from_data(self.ctxt(), data, native_type, hint)? });
        }
        Ok(Some(Row::new(columns, values)))
    }

    /// Returns an iterator over the remaining rows.
    pub fn rows<'stmt>(&'stmt mut self) -> Rows<'stmt, 'conn> {
        Rows {
            stmt: self,
            done: false,
        }
    }

    /// Fetches all remaining rows.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.rows().collect()
    }

    /// Returns the number of rows affected by DML or fetched so far by a query.
    pub fn row_count(&self) -> Result<u64> {
        let mut count = 0;
        chkerr!(
            self.ctxt(),
            dpiStmt_getRowCount(self.handle.raw(), &mut count)
        );
        Ok(count)
    }

    fn bound(&self, name: &str) -> Result<&BoundVar> {
        let name = name.strip_prefix(':').unwrap_or(name);
        self.vars
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_argument(format!("no bind variable named :{}", name)))
    }

    fn read_output(&self, bound: &BoundVar) -> Result<Value> {
        if self.is_returning {
            Ok(bound.var.get_returned()?.unwrap_or(Value::Null))
        } else {
            bound.var.get(0)
        }
    }

    /// Returns the value of an output or in/out bind variable after execution.
    pub fn output_value(&self, name: &str) -> Result<Value> {
        let bound = self.bound(name)?;
        match bound.kind {
            VarKind::Scalar(BindDirection::Out) | VarKind::Scalar(BindDirection::InOut) => {
                self.read_output(bound)
            }
            _ => Err(Error::invalid_argument(format!(
                ":{} is not an output bind variable",
                bound.name
            ))),
        }
    }

    /// Returns name and value of every output and in/out bind variable in bind order.
    pub fn output_values(&self) -> Result<Vec<(String, Value)>> {
        self.vars
            .iter()
            .filter(|v| {
                matches!(
                    v.kind,
                    VarKind::Scalar(BindDirection::Out) | VarKind::Scalar(BindDirection::InOut)
                )
            })
            .map(|v| Ok((v.name.clone(), self.read_output(v)?)))
            .collect()
    }

    /// Returns the LOB locator written by `RETURNING ... INTO`.
    pub(crate) fn returned_lob(&self, name: &str) -> Result<Option<Lob>> {
        let bound = self.bound(name)?;
        if bound.kind != VarKind::ReturnedLob {
            return Err(Error::internal_error(format!(
                ":{} is not bound to receive a LOB locator",
                bound.name
            )));
        }
        match bound.var.get_returned()? {
            Some(Value::Lob(lob)) => Ok(Some(lob)),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(Error::invalid_type_conversion(other.type_name(), "LOB")),
        }
    }

    /// Opens the REF CURSOR bound as `name` after execution.
    pub(crate) fn cursor(&self, name: &str) -> Result<Statement<'conn>> {
        let bound = self.bound(name)?;
        if bound.kind != VarKind::Cursor {
            return Err(Error::internal_error(format!(
                ":{} is not bound as a REF CURSOR",
                bound.name
            )));
        }
        let handle = bound.var.cursor()?;
        Statement::from_cursor(self.conn, handle, &self.sql, &self.binds)
    }
}

impl fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("binds", &self.binds)
            .field("is_query", &self.is_query)
            .field("is_returning", &self.is_returning)
            .field("columns", &self.columns())
            .finish()
    }
}

/// Row iterator of a [`Statement`]
///
/// Iteration stops after the first error.
pub struct Rows<'stmt, 'conn> {
    stmt: &'stmt mut Statement<'conn>,
    done: bool,
}

impl Rows<'_, '_> {
    pub fn column_info(&self) -> &[ColumnInfo] {
        self.stmt.columns()
    }
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        if self.done {
            return None;
        }
        match self.stmt.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
