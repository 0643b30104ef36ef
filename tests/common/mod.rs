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

// Integration tests need a database. Set the following environment variables:
//
//   ORACLE_SESSION_TEST_USER
//   ORACLE_SESSION_TEST_PASSWORD
//   ORACLE_SESSION_TEST_CONNECT_STRING
//
// Tests return without checking anything when one of them is unset.

use oracle_session::LogLevel;
use oracle_session::Session;
use oracle_session::SessionBuilder;
use std::env;

pub struct Params {
    pub user: String,
    pub password: String,
    pub connect_string: String,
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

pub fn params() -> Option<Params> {
    Some(Params {
        user: env_var("ORACLE_SESSION_TEST_USER")?,
        password: env_var("ORACLE_SESSION_TEST_PASSWORD")?,
        connect_string: env_var("ORACLE_SESSION_TEST_CONNECT_STRING")?,
    })
}

#[allow(dead_code)]
pub fn builder() -> Option<SessionBuilder> {
    let params = params()?;
    let mut builder = SessionBuilder::new(params.user, params.password, params.connect_string);
    builder
        .charset("AL32UTF8")
        .client_info("oracle-session tests")
        .module("oracle-session")
        .client_identifier("tester");
    Some(builder)
}

#[allow(dead_code)]
pub fn connect() -> Option<Session> {
    builder().map(|b| b.connect().unwrap())
}

#[allow(dead_code)]
pub fn connect_with_log_level(log_level: LogLevel) -> Option<Session> {
    builder().map(|mut b| b.log_level(log_level).connect().unwrap())
}

/// Returns a session or returns from the test when the database is not configured.
#[allow(unused_macros)]
macro_rules! session_or_skip {
    () => {
        match common::connect() {
            Some(session) => session,
            None => {
                eprintln!("skipped: ORACLE_SESSION_TEST_* variables are not set");
                return;
            }
        }
    };
}

/// Runs a cleanup statement when it goes out of scope
#[allow(dead_code)]
pub struct DropGuard<'a> {
    session: &'a Session,
    sql: String,
}

impl Drop for DropGuard<'_> {
    fn drop(&mut self) {
        let _ = self.session.execute(&self.sql, "cleanup", &[]);
    }
}

/// Returns a unique object name such as `OS_3F2504E04F8911D39A0C0305`.
#[allow(dead_code)]
pub fn unique_name() -> String {
    let uuid = uuid::Uuid::new_v4().to_simple().to_string();
    format!("OS_{}", &uuid[..24]).to_uppercase()
}

/// Creates a table and returns its name with a guard dropping it.
#[allow(dead_code)]
pub fn create_table<'a>(session: &'a Session, columns: &str) -> (String, DropGuard<'a>) {
    let name = unique_name();
    session
        .execute(
            &format!("create table {} ({})", name, columns),
            "create table",
            &[],
        )
        .unwrap();
    let guard = DropGuard {
        session,
        sql: format!("drop table {} purge", name),
    };
    (name, guard)
}

/// Creates a package from its specification and body, returning its name with a guard.
#[allow(dead_code)]
pub fn create_package<'a>(session: &'a Session, declarations: &str, body: &str) -> (String, DropGuard<'a>) {
    let name = unique_name();
    session
        .execute(
            &format!("create or replace package {} as\n{}\nend;", name, declarations),
            "create package",
            &[],
        )
        .unwrap();
    let guard = DropGuard {
        session,
        sql: format!("drop package {}", name),
    };
    session
        .execute(
            &format!("create or replace package body {} as\n{}\nend;", name, body),
            "create package body",
            &[],
        )
        .unwrap();
    (name, guard)
}
