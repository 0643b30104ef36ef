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

#[macro_use]
mod common;

use oracle_session::*;
use std::time::Duration;

fn fill_numbers(session: &Session, table: &str, count: i64) {
    session
        .execute(
            &format!(
                "insert into {} select level, 'row ' || level from dual connect by level <= :cnt",
                table
            ),
            "fill",
            &[BindVar::new("cnt", count)],
        )
        .unwrap();
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .map(|row| row.get("ID").unwrap().as_i64().unwrap())
        .collect()
}

#[test]
fn connect_tags_and_logs() {
    let session = session_or_skip!();
    let rows = session
        .fetch_all(
            "select sys_context('USERENV', 'CLIENT_INFO') as ci, \
                    sys_context('USERENV', 'MODULE') as module, \
                    sys_context('USERENV', 'CLIENT_IDENTIFIER') as cid \
               from dual",
            "read tags",
            &[],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("CI").unwrap().as_str().unwrap(), "oracle-session tests");
    assert_eq!(rows[0].get("MODULE").unwrap().as_str().unwrap(), "oracle-session");
    assert_eq!(rows[0].get("CID").unwrap().as_str().unwrap(), "tester");

    let entries = session.log_entries();
    assert_eq!(entries[0].category(), LogCategory::Connection);
    assert!(entries[0]
        .message()
        .starts_with("DB: Connection has been opened to the '"));
    assert!(entries[0].message().contains("'tester' as user"));
    session.close().unwrap();
}

#[test]
fn long_action_is_truncated_on_the_server() {
    let session = session_or_skip!();
    let action = "0123456789abcdefghijklmnopqrstuvwxyzABCD";
    let rows = session
        .fetch_all(
            "select sys_context('USERENV', 'ACTION') as action from dual",
            action,
            &[],
        )
        .unwrap();
    assert_eq!(rows[0].get("ACTION").unwrap().as_str().unwrap(), &action[..32]);

    let rows = session
        .fetch_all(
            "select sys_context('USERENV', 'ACTION') as action from dual",
            "short",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0].get("ACTION").unwrap().as_str().unwrap(), "short");
}

#[test]
fn connect_failure_reports_attempts() {
    let params = match common::params() {
        Some(params) => params,
        None => return,
    };
    let err = SessionBuilder::new(params.user, "wrong password", params.connect_string)
        .retry_policy(RetryPolicy::new(2, Duration::from_millis(10)))
        .connect()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(err.to_string().starts_with("Cannot connect to database after 2 attempt(s): "));
    assert_eq!(err.oci_code(), Some(1017));
}

#[test]
fn fetch_all_in_order() {
    let session = session_or_skip!();
    let (table, _guard) = common::create_table(&session, "id number(10) primary key, name varchar2(30)");
    fill_numbers(&session, &table, 3);
    session
        .execute(
            &format!("insert into {} values (:id, :name)", table),
            "insert null",
            &[BindVar::new("id", 4), BindVar::new("name", Value::Null)],
        )
        .unwrap();

    let rows = session
        .fetch_all(
            &format!("select id, name from {} where id > :min_id order by id", table),
            "fetch all",
            &[BindVar::new(":min_id", 1)],
        )
        .unwrap();
    assert_eq!(ids(&rows), [2, 3, 4]);
    assert_eq!(rows[0].get("NAME").unwrap(), &Value::Text("row 2".into()));
    assert_eq!(rows[0].get(0usize).unwrap(), &Value::Integer(2));
    assert!(rows[2].get("NAME").unwrap().is_null());
    let columns = rows[0].columns();
    assert_eq!(columns[0].name(), "ID");
    assert_eq!(columns[0].oracle_type(), &OracleType::Number(10, 0));
    assert!(!columns[0].nullable());
    assert_eq!(columns[1].oracle_type(), &OracleType::Varchar2(30));
}

#[test]
fn fetch_page_of_rows() {
    let session = session_or_skip!();
    let (table, _guard) = common::create_table(&session, "id number(10), name varchar2(30)");
    fill_numbers(&session, &table, 25);
    let sql = format!("select id, name from {} where id >= :min_id order by id", table);
    let min_id = [BindVar::new("min_id", 1)];

    let page = session.fetch_page(&sql, "page 2", 11, 10, &min_id).unwrap();
    assert_eq!(ids(&page), (11..=20).collect::<Vec<_>>());
    assert_eq!(page[0].get("RNUM").unwrap().as_i64().unwrap(), 11);

    let page = session.fetch_page(&sql, "last page", 21, 10, &min_id).unwrap();
    assert_eq!(ids(&page), [21, 22, 23, 24, 25]);

    let page = session.fetch_page(&sql, "past the end", 100, 10, &min_id).unwrap();
    assert!(page.is_empty());

    let page = session.fetch_page(&sql, "no rows", 1, 0, &min_id).unwrap();
    assert!(page.is_empty());

    let err = session
        .fetch_page(&sql, "reserved", 1, 10, &[BindVar::new("SQ_FIRST", 1)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn fetch_rows_from_ref_cursor() {
    let session = session_or_skip!();
    let rows = session
        .fetch_from_cursor(
            "begin open :cur for select level as n from dual connect by level <= :cnt; end;",
            "ref cursor",
            ":cur",
            &[BindVar::new("cnt", 5)],
        )
        .unwrap();
    let numbers: Vec<_> = rows
        .iter()
        .map(|row| row.get("N").unwrap().as_i64().unwrap())
        .collect();
    assert_eq!(numbers, [1, 2, 3, 4, 5]);
}

#[test]
fn bulk_insert_array_binds() {
    let session = session_or_skip!();
    let (table, _table_guard) = common::create_table(&session, "id number(10), name varchar2(30)");
    let (package, _package_guard) = common::create_package(
        &session,
        "type id_tab is table of number index by binary_integer;\n\
         type name_tab is table of varchar2(30) index by binary_integer;\n\
         procedure load(ids id_tab, names name_tab);",
        &format!(
            "procedure load(ids id_tab, names name_tab) is\n\
             begin\n\
               forall i in 1..ids.count\n\
                 insert into {} values (ids(i), names(i));\n\
             end;",
            table
        ),
    );
    let count = 100;
    let outcome = session
        .bulk_insert(
            &format!("begin {}.load(:ids, :names); end;", package),
            "bulk insert",
            &[
                ArrayBind::new("ids", 1..=count, BindType::Int64),
                ArrayBind::new(
                    "names",
                    (1..=count).map(|i| format!("name {}", i)),
                    BindType::Varchar2(30),
                ),
            ],
            &[],
        )
        .unwrap();
    assert!(outcome.outputs.is_empty());

    let rows = session
        .fetch_all(
            &format!("select count(*) as cnt, max(name) keep (dense_rank last order by id) as last_name from {}", table),
            "count",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0].get("CNT").unwrap().as_i64().unwrap(), count as i64);
    assert_eq!(rows[0].get("LAST_NAME").unwrap().as_str().unwrap(), "name 100");
}

#[test]
fn bulk_insert_with_bad_element_inserts_nothing() {
    let session = session_or_skip!();
    let (table, _table_guard) =
        common::create_table(&session, "id number(10) primary key, name varchar2(30)");
    let (package, _package_guard) = common::create_package(
        &session,
        "type id_tab is table of number index by binary_integer;\n\
         type name_tab is table of varchar2(30) index by binary_integer;\n\
         procedure load(ids id_tab, names name_tab);",
        &format!(
            "procedure load(ids id_tab, names name_tab) is\n\
             begin\n\
               forall i in 1..ids.count\n\
                 insert into {} values (ids(i), names(i));\n\
             end;",
            table
        ),
    );
    // element 60 repeats the key of element 10
    let ids: Vec<i64> = (1..=100).map(|i| if i == 60 { 10 } else { i }).collect();
    let err = session
        .bulk_insert(
            &format!("begin {}.load(:ids, :names); end;", package),
            "bulk insert",
            &[
                ArrayBind::new("ids", ids, BindType::Int64),
                ArrayBind::new(
                    "names",
                    (1..=100).map(|i| format!("name {}", i)),
                    BindType::Varchar2(30),
                ),
            ],
            &[],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.oci_code(), Some(1));

    let rows = session
        .fetch_all(&format!("select count(*) as cnt from {}", table), "count", &[])
        .unwrap();
    assert_eq!(rows[0].get("CNT").unwrap().as_i64().unwrap(), 0);
}

#[test]
fn clob_and_blob_round_trip() {
    let session = session_or_skip!();
    let (table, _guard) = common::create_table(&session, "id number(10), doc clob, img blob");
    let text: String = "Grüße, LOB! ".repeat(5000);
    let bytes: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    // written into the locator returned by the insert
    session
        .insert_lob(
            &format!(
                "insert into {} (id, doc, img) values (:id, empty_clob(), null) returning doc into :doc",
                table
            ),
            "insert clob",
            "doc",
            &LobData::from(text.as_str()),
            &[BindVar::new("id", 1)],
        )
        .unwrap();
    // bound as a temporary LOB
    session
        .insert_lob(
            &format!("update {} set img = :img where id = :id", table),
            "update blob",
            ":img",
            &LobData::from(bytes.clone()),
            &[BindVar::new("id", 1)],
        )
        .unwrap();

    let sql = format!("select doc, img from {} where id = :id", table);
    let doc = session
        .fetch_one_lob(&sql, "read clob", "doc", &[BindVar::new("id", 1)])
        .unwrap()
        .unwrap();
    assert_eq!(doc.as_text(), Some(text.as_str()));
    let img = session
        .fetch_one_lob(&sql, "read blob", "IMG", &[BindVar::new("id", 1)])
        .unwrap()
        .unwrap();
    assert_eq!(img, LobData::Binary(bytes));
}

#[test]
fn fetch_one_lob_edge_cases() {
    let session = session_or_skip!();
    let (table, _guard) = common::create_table(&session, "id number(10), doc clob");
    session
        .execute(
            &format!("insert into {} values (1, null)", table),
            "insert null lob",
            &[],
        )
        .unwrap();
    let sql = format!("select id, doc from {} where id = :id", table);

    let lob = session
        .fetch_one_lob(&sql, "null lob", "doc", &[BindVar::new("id", 1)])
        .unwrap();
    assert_eq!(lob, None);

    let lob = session
        .fetch_one_lob(&sql, "no row", "doc", &[BindVar::new("id", 2)])
        .unwrap();
    assert_eq!(lob, None);

    let err = session
        .fetch_one_lob(&sql, "not a lob", "id", &[BindVar::new("id", 1)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTypeConversion);

    let err = session
        .fetch_one_lob(&sql, "no column", "body", &[BindVar::new("id", 1)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidColumnName);
}

#[test]
fn failed_lob_write_is_rolled_back() {
    let session = session_or_skip!();
    let (table, _guard) = common::create_table(&session, "id number(10) primary key, doc clob");
    let insert = format!("insert into {} values (:id, :doc)", table);
    session
        .insert_lob(&insert, "first", "doc", &LobData::from("first"), &[BindVar::new("id", 1)])
        .unwrap();
    let err = session
        .insert_lob(&insert, "duplicate", "doc", &LobData::from("second"), &[BindVar::new("id", 1)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.oci_code(), Some(1));
    assert_eq!(err.sql(), Some(insert.as_str()));

    let rows = session
        .fetch_all(&format!("select count(*) as cnt from {}", table), "count", &[])
        .unwrap();
    assert_eq!(rows[0].get("CNT").unwrap().as_i64().unwrap(), 1);
}

#[test]
fn output_binds() {
    let session = session_or_skip!();
    let outcome = session
        .execute(
            "begin :total := :a + :b; :greeting := 'Hello, ' || :name; :counter := :counter * 2; end;",
            "plsql outputs",
            &[
                BindVar::new("a", 40),
                BindVar::new("b", 2),
                BindVar::output("total", BindType::Int64),
                BindVar::new("name", "World"),
                BindVar::output("greeting", BindType::Varchar2(50)),
                BindVar::in_out("counter", 21, BindType::Int64),
            ],
        )
        .unwrap();
    assert_eq!(outcome.outputs.len(), 3);
    assert_eq!(outcome.output("total"), Some(&Value::Integer(42)));
    assert_eq!(outcome.output("greeting"), Some(&Value::Text("Hello, World".into())));
    assert_eq!(outcome.output(":COUNTER"), Some(&Value::Integer(42)));

    let (table, _guard) = common::create_table(&session, "id number(10) generated always as identity, name varchar2(30)");
    let first = session
        .execute_returning(
            &format!("insert into {} (name) values (:name) returning id into :new_id", table),
            "returning",
            &[BindVar::new("name", "Asimov")],
            "new_id",
        )
        .unwrap();
    assert_eq!(first, Value::Text("1".into()));
    let outcome = session
        .execute(
            &format!("update {} set name = :name", table),
            "rows affected",
            &[BindVar::new("name", "Clarke")],
        )
        .unwrap();
    assert_eq!(outcome.rows_affected, 1);
}

#[test]
fn statement_rows_one_by_one() {
    let session = session_or_skip!();
    let mut stmt = session
        .execute_statement(
            "select level as n, to_char(level) as s from dual connect by level <= 3",
            "rows",
            &[],
        )
        .unwrap();
    assert!(stmt.is_query());
    assert_eq!(stmt.columns().len(), 2);
    let first = stmt.next_row().unwrap().unwrap();
    assert_eq!(first.get("S").unwrap().as_str().unwrap(), "1");
    let rest: Vec<Row> = stmt.rows().collect::<Result<_>>().unwrap();
    assert_eq!(rest.len(), 2);
    assert!(stmt.next_row().unwrap().is_none());
}

#[test]
fn parse_and_execution_errors_are_logged() {
    let session = session_or_skip!();
    // the server reports syntax errors on execution
    let err = session
        .execute("selec 1 from dual", "typo", &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.oci_code(), Some(900));

    let err = session
        .fetch_all("select 1 from no_such_table_xyz where 1 = :x", "missing", &[BindVar::new("x", 1)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.oci_code(), Some(942));
    assert_eq!(err.binds(), Some("[(\":x\", 1, -1)]"));

    let err = session
        .execute("select 1 from dual", "dup", &[BindVar::new("x", 1), BindVar::new("X", 2)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let failures: Vec<_> = session
        .log_entries()
        .into_iter()
        .filter(|e| e.category() == LogCategory::Failure)
        .collect();
    assert_eq!(failures.len(), 3);
    assert!(failures[1]
        .message()
        .starts_with("Error with statement execution: ORA-00942"));
    assert!(failures[1].message().contains("\n SQL: select 1 from no_such_table_xyz"));
    assert!(failures[2]
        .message()
        .contains("\n SQL: select 1 from dual\n Bindvars: [(\":x\""));
    assert!(failures[2].message().contains("\":X\""));
    assert!(session.log_html().contains("<br />\n SQL: "));
}

#[test]
fn log_accumulates_by_level() {
    let session = match common::connect_with_log_level(LogLevel::Timing) {
        Some(session) => session,
        None => return,
    };
    let before = session.log_entries().len();
    for i in 0..5 {
        session
            .fetch_all("select :i as i from dual", "timing", &[BindVar::new("i", i)])
            .unwrap();
    }
    session.log("done");
    let entries = session.log_entries();
    assert!(entries.len() >= before + 6);
    assert_eq!(entries.last().map(LogEntry::message), Some("done"));
    assert_eq!(session.log_text().lines().last().map(|l| l.ends_with(" done")), Some(true));

    let quiet = common::connect_with_log_level(LogLevel::Off).unwrap();
    quiet.fetch_all("select 1 from dual", "quiet", &[]).unwrap();
    quiet.log("ignored");
    assert!(quiet.log_entries().is_empty());
    assert!(quiet.log_text().is_empty());
}
