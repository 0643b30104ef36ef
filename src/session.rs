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
use crate::log::elapsed;
use crate::log::format_elapsed;
use crate::util::client_encoding;
use crate::util::page_bounds;
use crate::util::paging_sql;
use crate::util::truncate_action;
use crate::util::PAGE_FIRST_BIND;
use crate::util::PAGE_LAST_BIND;
use crate::ArrayBind;
use crate::AssertSend;
use crate::BindList;
use crate::BindType;
use crate::BindVar;
use crate::Error;
use crate::Lob;
use crate::LobData;
use crate::LogCategory;
use crate::LogEntry;
use crate::LogLevel;
use crate::Result;
use crate::Row;
use crate::SessionLog;
use crate::Statement;
use crate::Value;
use std::fmt;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread;
use std::time::Duration;
use std::time::Instant;

/// Byte length of the output buffer bound by [`Session::execute_returning`]
const RETURNING_BUFFER_LEN: u32 = 32;

/// Prefetch row count applied when [`SessionBuilder::prefetch_rows`] is not called
pub const DEFAULT_PREFETCH_ROWS: u32 = 100;

/// Who connects to which database, and how the connection is tagged
///
/// The password never appears in the `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    schema: String,
    password: String,
    database: String,
    charset: String,
    client_info: String,
    module: String,
    client_identifier: String,
}

impl Identity {
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Character set name. Empty means UTF-8.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn client_info(&self) -> &str {
        &self.client_info
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn client_identifier(&self) -> &str {
        &self.client_identifier
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Identity")
            .field("schema", &self.schema)
            .field("password", &"<hidden>")
            .field("database", &self.database)
            .field("charset", &self.charset)
            .field("client_info", &self.client_info)
            .field("module", &self.module)
            .field("client_identifier", &self.client_identifier)
            .finish()
    }
}

/// How many times and how often to try to connect
///
/// The default is 10 attempts in total, 100 milliseconds apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    /// Creates a policy. `max_attempts` counts the first attempt and is at least one.
    pub fn new(max_attempts: u32, delay: Duration) -> RetryPolicy {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        RetryPolicy::new(RetryPolicy::DEFAULT_MAX_ATTEMPTS, RetryPolicy::DEFAULT_DELAY)
    }
}

/// Calls `f` until it succeeds or the policy gives up.
///
/// `f` receives the attempt number starting with 1. The value is returned
/// with the number of attempts made.
pub(crate) fn connect_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<(T, u32)>
where
    F: FnMut(u32) -> Result<T>,
{
    let mut attempt = 1;
    loop {
        match f(attempt) {
            Ok(val) => return Ok((val, attempt)),
            Err(err) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "connection attempt failed"
                );
                if attempt >= policy.max_attempts {
                    return Err(Error::connection(attempt, err));
                }
            }
        }
        thread::sleep(policy.delay);
        attempt += 1;
    }
}

/// Outcome of [`Session::execute`] and [`Session::bulk_insert`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecOutcome {
    /// Rows affected by DML. Zero for PL/SQL blocks and DDL.
    pub rows_affected: u64,
    /// Values of output and in/out bind variables in bind order
    pub outputs: Vec<(String, Value)>,
}

impl ExecOutcome {
    /// Looks up an output value by bind name. A leading `:` and ASCII case are ignored.
    pub fn output(&self, name: &str) -> Option<&Value> {
        let name = name.strip_prefix(':').unwrap_or(name);
        self.outputs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

/// Builder of [`Session`]
///
/// # Examples
///
/// ```no_run
/// # use oracle_session::*;
/// # use std::time::Duration;
/// let session = SessionBuilder::new("scott", "tiger", "//localhost/XE")
///     .client_info("nightly report")
///     .module("reports")
///     .client_identifier("alice")
///     .prefetch_rows(Some(500))
///     .retry_policy(RetryPolicy::new(3, Duration::from_millis(500)))
///     .log_level(LogLevel::Basic)
///     .connect()?;
/// # Ok::<(), Error>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SessionBuilder {
    identity: Identity,
    prefetch_rows: Option<u32>,
    retry_policy: RetryPolicy,
    log_level: LogLevel,
}

impl SessionBuilder {
    pub fn new<S, P, D>(schema: S, password: P, database: D) -> SessionBuilder
    where
        S: Into<String>,
        P: Into<String>,
        D: Into<String>,
    {
        SessionBuilder {
            identity: Identity {
                schema: schema.into(),
                password: password.into(),
                database: database.into(),
                charset: "".into(),
                client_info: "".into(),
                module: "".into(),
                client_identifier: "".into(),
            },
            prefetch_rows: Some(DEFAULT_PREFETCH_ROWS),
            retry_policy: RetryPolicy::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Sets the client character set. Empty, `UTF-8`, `UTF8` and `AL32UTF8`
    /// are accepted; [`SessionBuilder::connect`] rejects anything else.
    pub fn charset<T>(&mut self, charset: T) -> &mut SessionBuilder
    where
        T: Into<String>,
    {
        self.identity.charset = charset.into();
        self
    }

    /// Sets the client info tag, shown in `V$SESSION.CLIENT_INFO`.
    pub fn client_info<T>(&mut self, client_info: T) -> &mut SessionBuilder
    where
        T: Into<String>,
    {
        self.identity.client_info = client_info.into();
        self
    }

    /// Sets the module name, shown in `V$SESSION.MODULE`.
    pub fn module<T>(&mut self, module: T) -> &mut SessionBuilder
    where
        T: Into<String>,
    {
        self.identity.module = module.into();
        self
    }

    /// Sets the end user, shown in `V$SESSION.CLIENT_IDENTIFIER`.
    pub fn client_identifier<T>(&mut self, client_identifier: T) -> &mut SessionBuilder
    where
        T: Into<String>,
    {
        self.identity.client_identifier = client_identifier.into();
        self
    }

    /// Sets the prefetch row count of every statement and REF CURSOR.
    /// `None` leaves the client library default.
    pub fn prefetch_rows(&mut self, prefetch_rows: Option<u32>) -> &mut SessionBuilder {
        self.prefetch_rows = prefetch_rows;
        self
    }

    pub fn retry_policy(&mut self, retry_policy: RetryPolicy) -> &mut SessionBuilder {
        self.retry_policy = retry_policy;
        self
    }

    pub fn log_level(&mut self, log_level: LogLevel) -> &mut SessionBuilder {
        self.log_level = log_level;
        self
    }

    /// Connects, retrying as the retry policy says, and tags the connection.
    pub fn connect(&self) -> Result<Session> {
        let ident = &self.identity;
        client_encoding(&ident.charset)?;
        let start = Instant::now();
        let (conn, attempts) = connect_with_retry(&self.retry_policy, |_| {
            Connection::connect(&ident.schema, &ident.password, &ident.database, &ident.charset)
        })
        .map_err(|err| {
            tracing::error!(
                schema = %ident.schema,
                database = %ident.database,
                error = %err,
                "could not open a connection"
            );
            err
        })?;
        conn.set_client_info(&ident.client_info)?;
        conn.set_module(&ident.module)?;
        conn.set_client_identifier(&ident.client_identifier)?;
        let secs = elapsed(start, Instant::now());
        tracing::info!(
            schema = %ident.schema,
            database = %ident.database,
            attempts,
            elapsed = secs,
            "connection opened"
        );
        let mut log = SessionLog::new(self.log_level);
        log.push(
            LogCategory::Connection,
            format!(
                "DB: Connection has been opened to the '{}' schema on '{}' with client info of '{}' and '{}' as user and it took {}s",
                ident.schema,
                ident.database,
                ident.client_info,
                ident.client_identifier,
                format_elapsed(secs)
            ),
        );
        Ok(Session {
            conn,
            identity: self.identity.clone(),
            prefetch_rows: self.prefetch_rows,
            log: Mutex::new(log),
        })
    }
}

/// A connection to an Oracle database with its in-memory log
///
/// Every statement runs in auto-commit mode, except the LOB write of
/// [`Session::insert_lob`] which commits explicitly after the payload is
/// written. Every failure is recorded in the session log before it is
/// returned.
///
/// The connection is released when the session is dropped.
pub struct Session {
    conn: Connection,
    identity: Identity,
    prefetch_rows: Option<u32>,
    log: Mutex<SessionLog>,
}

impl AssertSend for Session {}

impl Session {
    /// Connects with the default prefetch size, retry policy and log level.
    ///
    /// See [`SessionBuilder`] to change them.
    pub fn open(
        schema: &str,
        password: &str,
        database: &str,
        charset: &str,
        client_info: &str,
        module: &str,
        client_identifier: &str,
    ) -> Result<Session> {
        SessionBuilder::new(schema, password, database)
            .charset(charset)
            .client_info(client_info)
            .module(module)
            .client_identifier(client_identifier)
            .connect()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn prefetch_rows(&self) -> Option<u32> {
        self.prefetch_rows
    }

    fn lock_log(&self) -> MutexGuard<'_, SessionLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one primary operation, recording its timing or its failure.
    fn run<T, F>(&self, operation: &str, sql: &str, binds: &BindList, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let start = Instant::now();
        match f() {
            Ok(val) => {
                let secs = elapsed(start, Instant::now());
                tracing::debug!(operation, sql, elapsed = secs, "operation completed");
                self.lock_log().push(
                    LogCategory::Timing,
                    format!(
                        "DB: {} has been completed: '{}'\n Bindvars: '{}'\n and it took {}s",
                        operation,
                        sql,
                        binds,
                        format_elapsed(secs)
                    ),
                );
                Ok(val)
            }
            Err(err) => {
                tracing::error!(operation, sql, error = %err, "operation failed");
                // Parse and execution errors already carry the statement.
                let message = match err.sql() {
                    Some(_) => err.to_string(),
                    None => format!("{}\n SQL: {}\n Bindvars: {}", err, sql, binds),
                };
                self.lock_log().push(LogCategory::Failure, message);
                Err(err)
            }
        }
    }

    fn prepare(&self, sql: &str, binds: &BindList, extra: &[&str]) -> Result<Statement<'_>> {
        binds.validate(extra)?;
        Statement::prepare(&self.conn, sql, binds.to_string())
    }

    fn bind_all(&self, stmt: &mut Statement<'_>, binds: &BindList) -> Result<()> {
        for var in binds.scalars() {
            stmt.bind(var)?;
        }
        for arr in binds.arrays() {
            stmt.bind_array(arr)?;
        }
        Ok(())
    }

    fn execute_with_action(
        &self,
        stmt: &mut Statement<'_>,
        action: &str,
        commit_on_success: bool,
    ) -> Result<()> {
        self.conn.set_action(truncate_action(action))?;
        stmt.execute(commit_on_success)
    }

    /// Executes `sql` with `binds` and commits on success.
    ///
    /// Output and in/out bind variables are returned in [`ExecOutcome::outputs`].
    ///
    /// ```no_run
    /// # use oracle_session::*; fn try_main() -> Result<()> {
    /// # let session = Session::open("scott", "tiger", "", "", "", "", "")?;
    /// let outcome = session.execute(
    ///     "begin :total := 10 + :n; end;",
    ///     "add",
    ///     &[BindVar::new("n", 5), BindVar::output("total", BindType::Int64)],
    /// )?;
    /// assert_eq!(outcome.output("total"), Some(&Value::Integer(15)));
    /// # Ok(())}
    /// ```
    pub fn execute(&self, sql: &str, action: &str, binds: &[BindVar]) -> Result<ExecOutcome> {
        let binds = BindList::new(binds);
        self.run("execute", sql, &binds, || {
            let mut stmt = self.prepare(sql, &binds, &[])?;
            stmt.in_execution(|stmt| {
                stmt.set_prefetch_rows(self.prefetch_rows)?;
                self.bind_all(stmt, &binds)?;
                self.execute_with_action(stmt, action, true)?;
                Ok(ExecOutcome {
                    rows_affected: stmt.row_count()?,
                    outputs: stmt.output_values()?,
                })
            })
        })
    }

    /// Executes `sql` and returns the value written to `:output_name`,
    /// typically by `RETURNING ... INTO :output_name`.
    ///
    /// The placeholder is bound as a 32-byte character buffer.
    pub fn execute_returning(
        &self,
        sql: &str,
        action: &str,
        binds: &[BindVar],
        output_name: &str,
    ) -> Result<Value> {
        let output_name = output_name.strip_prefix(':').unwrap_or(output_name);
        let binds = BindList::new(binds);
        self.run("execute_returning", sql, &binds, || {
            let mut stmt = self.prepare(sql, &binds, &[output_name])?;
            stmt.in_execution(|stmt| {
                stmt.set_prefetch_rows(self.prefetch_rows)?;
                self.bind_all(stmt, &binds)?;
                stmt.bind(&BindVar::output(
                    output_name,
                    BindType::Varchar2(RETURNING_BUFFER_LEN),
                ))?;
                self.execute_with_action(stmt, action, true)?;
                stmt.output_value(output_name)
            })
        })
    }

    /// Executes `sql` and returns the statement for row-by-row fetching.
    pub fn execute_statement(
        &self,
        sql: &str,
        action: &str,
        binds: &[BindVar],
    ) -> Result<Statement<'_>> {
        let binds = BindList::new(binds);
        self.run("execute_statement", sql, &binds, || {
            let mut stmt = self.prepare(sql, &binds, &[])?;
            stmt.in_execution(|stmt| {
                stmt.set_prefetch_rows(self.prefetch_rows)?;
                self.bind_all(stmt, &binds)?;
                self.execute_with_action(stmt, action, true)
            })?;
            Ok(stmt)
        })
    }

    fn query(&self, sql: &str, action: &str, binds: &BindList) -> Result<Vec<Row>> {
        let mut stmt = self.prepare(sql, binds, &[])?;
        stmt.in_execution(|stmt| {
            stmt.set_prefetch_rows(self.prefetch_rows)?;
            self.bind_all(stmt, binds)?;
            self.execute_with_action(stmt, action, true)?;
            stmt.fetch_all()
        })
    }

    /// Executes a query and fetches every row.
    pub fn fetch_all(&self, sql: &str, action: &str, binds: &[BindVar]) -> Result<Vec<Row>> {
        let binds = BindList::new(binds);
        self.run("fetch_all", sql, &binds, || self.query(sql, action, &binds))
    }

    /// Fetches `num_rows` rows starting at the 1-based `first_row`.
    ///
    /// The query is wrapped by a `ROWNUM` filter whose bounds are bound as
    /// `:sq_first` and `:sq_last`, so each row carries an extra `RNUM`
    /// column. `sql` itself is never modified; use bind variables for
    /// user input.
    pub fn fetch_page(
        &self,
        sql: &str,
        action: &str,
        first_row: u64,
        num_rows: u64,
        binds: &[BindVar],
    ) -> Result<Vec<Row>> {
        let caller_binds = BindList::new(binds);
        self.run("fetch_page", sql, &caller_binds, || {
            caller_binds.check_reserved(&[PAGE_FIRST_BIND, PAGE_LAST_BIND])?;
            let (first, last) = match page_bounds(first_row, num_rows) {
                Some(bounds) => bounds,
                None => return Ok(Vec::new()),
            };
            let to_i64 = |n: u64| {
                i64::try_from(n).map_err(|_| {
                    Error::invalid_argument(format!("row number {} is too large", n))
                })
            };
            let mut page_binds = binds.to_vec();
            page_binds.push(BindVar::new(PAGE_FIRST_BIND, to_i64(first)?));
            page_binds.push(BindVar::new(PAGE_LAST_BIND, to_i64(last)?));
            self.query(&paging_sql(sql), action, &BindList::new(&page_binds))
        })
    }

    /// Executes a PL/SQL block opening a REF CURSOR bound as `:cursor_name`
    /// and fetches every row of the cursor.
    ///
    /// ```no_run
    /// # use oracle_session::*; fn try_main() -> Result<()> {
    /// # let session = Session::open("scott", "tiger", "", "", "", "", "")?;
    /// let rows = session.fetch_from_cursor(
    ///     "begin open :cur for select ename from emp where deptno = :deptno; end;",
    ///     "employees by cursor",
    ///     "cur",
    ///     &[BindVar::new("deptno", 10)],
    /// )?;
    /// # Ok(())}
    /// ```
    pub fn fetch_from_cursor(
        &self,
        plsql: &str,
        action: &str,
        cursor_name: &str,
        binds: &[BindVar],
    ) -> Result<Vec<Row>> {
        let cursor_name = cursor_name.strip_prefix(':').unwrap_or(cursor_name);
        let binds = BindList::new(binds);
        self.run("fetch_from_cursor", plsql, &binds, || {
            let mut stmt = self.prepare(plsql, &binds, &[cursor_name])?;
            stmt.in_execution(|stmt| {
                stmt.bind_cursor(cursor_name, self.prefetch_rows)?;
                self.bind_all(stmt, &binds)?;
                self.execute_with_action(stmt, action, true)?;
                let mut cursor = stmt.cursor(cursor_name)?;
                cursor.fetch_all()
            })
        })
    }

    /// Executes a PL/SQL block with each [`ArrayBind`] bound as an index-by array.
    ///
    /// ```no_run
    /// # use oracle_session::*; fn try_main() -> Result<()> {
    /// # let session = Session::open("scott", "tiger", "", "", "", "", "")?;
    /// session.bulk_insert(
    ///     "begin forall i in 1..:ids.count insert into t(id, name) values (:ids(i), :names(i)); end;",
    ///     "load",
    ///     &[
    ///         ArrayBind::new("ids", vec![1, 2, 3], BindType::Int64),
    ///         ArrayBind::new("names", vec!["a", "b", "c"], BindType::Varchar2(10)),
    ///     ],
    ///     &[],
    /// )?;
    /// # Ok(())}
    /// ```
    pub fn bulk_insert(
        &self,
        plsql: &str,
        action: &str,
        array_binds: &[ArrayBind],
        binds: &[BindVar],
    ) -> Result<ExecOutcome> {
        let binds = BindList::with_arrays(binds, array_binds);
        self.run("bulk_insert", plsql, &binds, || {
            let mut stmt = self.prepare(plsql, &binds, &[])?;
            stmt.in_execution(|stmt| {
                self.bind_all(stmt, &binds)?;
                self.execute_with_action(stmt, action, true)?;
                Ok(ExecOutcome {
                    rows_affected: stmt.row_count()?,
                    outputs: stmt.output_values()?,
                })
            })
        })
    }

    /// Writes `data` as a CLOB ([`LobData::Text`]) or BLOB ([`LobData::Binary`])
    /// bound as `:lob_bind_name`, then commits.
    ///
    /// When `sql` has `RETURNING ... INTO :lob_bind_name`, the payload is written
    /// into the returned locator. Otherwise a temporary LOB holding the payload
    /// is bound as input. The transaction is rolled back on failure.
    ///
    /// ```no_run
    /// # use oracle_session::*; fn try_main() -> Result<()> {
    /// # let session = Session::open("scott", "tiger", "", "", "", "", "")?;
    /// session.insert_lob(
    ///     "insert into docs(id, body) values (:id, empty_clob()) returning body into :body",
    ///     "store doc",
    ///     "body",
    ///     &LobData::from("hello"),
    ///     &[BindVar::new("id", 1)],
    /// )?;
    /// # Ok(())}
    /// ```
    pub fn insert_lob(
        &self,
        sql: &str,
        action: &str,
        lob_bind_name: &str,
        data: &LobData,
        binds: &[BindVar],
    ) -> Result<()> {
        let lob_bind_name = lob_bind_name.strip_prefix(':').unwrap_or(lob_bind_name);
        let binds = BindList::new(binds);
        self.run("insert_lob", sql, &binds, || {
            let mut stmt = self.prepare(sql, &binds, &[lob_bind_name])?;
            let result = stmt.in_execution(|stmt| {
                self.bind_all(stmt, &binds)?;
                if stmt.is_returning() {
                    stmt.bind_returned_lob(lob_bind_name, data.kind())?;
                    self.execute_with_action(stmt, action, false)?;
                    if let Some(lob) = stmt.returned_lob(lob_bind_name)? {
                        lob.write_all(data)?;
                    }
                } else {
                    let lob = Lob::new_temp(&self.conn, data.kind())?;
                    lob.write_all(data)?;
                    stmt.bind_lob(lob_bind_name, &lob)?;
                    self.execute_with_action(stmt, action, false)?;
                }
                self.conn.commit()
            });
            if result.is_err() {
                if let Err(err) = self.conn.rollback() {
                    tracing::warn!(error = %err, "rollback after a failed LOB write failed");
                }
            }
            result
        })
    }

    /// Reads the LOB in column `lob_column` of the first row.
    ///
    /// The column is looked up ignoring case. `None` when the query returns
    /// no rows or the value is NULL.
    pub fn fetch_one_lob(
        &self,
        sql: &str,
        action: &str,
        lob_column: &str,
        binds: &[BindVar],
    ) -> Result<Option<LobData>> {
        let binds = BindList::new(binds);
        self.run("fetch_one_lob", sql, &binds, || {
            let mut stmt = self.prepare(sql, &binds, &[])?;
            let row = stmt.in_execution(|stmt| {
                stmt.set_prefetch_rows(self.prefetch_rows)?;
                self.bind_all(stmt, &binds)?;
                self.execute_with_action(stmt, action, true)?;
                stmt.next_row()
            })?;
            let row = match row {
                Some(row) => row,
                None => return Ok(None),
            };
            match row.get_ignore_case(&lob_column.to_uppercase())? {
                Value::Null => Ok(None),
                Value::Lob(lob) => lob
                    .read_to_end()
                    .map(Some)
                    .map_err(|err| stmt.execution_error(err)),
                other => Err(Error::invalid_type_conversion(other.type_name(), "LOB")),
            }
        })
    }

    /// Appends `line` to the session log. Ignored when the log level is [`LogLevel::Off`].
    pub fn log<T>(&self, line: T)
    where
        T: Into<String>,
    {
        self.lock_log().push(LogCategory::Note, line);
    }

    pub fn log_level(&self) -> LogLevel {
        self.lock_log().level()
    }

    /// Returns a snapshot of the log entries in insertion order.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.lock_log().entries().to_vec()
    }

    /// Returns the log as text, one entry per line.
    pub fn log_text(&self) -> String {
        self.lock_log().to_text()
    }

    /// Returns the log as HTML fragments joined with `<br/>`.
    pub fn log_html(&self) -> String {
        self.lock_log().to_html()
    }

    /// Closes the connection and reports a failure to close it.
    pub fn close(self) -> Result<()> {
        let result = self.conn.close();
        match &result {
            Ok(()) => tracing::info!(
                schema = %self.identity.schema,
                database = %self.identity.database,
                "connection closed"
            ),
            Err(err) => tracing::error!(error = %err, "could not close the connection"),
        }
        result
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("prefetch_rows", &self.prefetch_rows)
            .field("log_level", &self.log_level())
            .finish()
    }
}
