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

/*!
A resilient [Oracle database][] session for [Rust][] built on [ODPI-C][].

A [`Session`] owns one connection and offers the operations an
administrative or reporting application needs:

* connect with a fixed-delay retry loop and end-to-end tracing tags
  (client info, module, client identifier, action),
* execute SQL and PL/SQL with named bind variables, auto-committing
  every successful statement,
* fetch whole results, pages of results or the rows of a REF CURSOR,
* bind PL/SQL index-by arrays for bulk inserts,
* write and read CLOB/BLOB payloads,
* keep an in-memory, timestamped log of what happened.

## Run-time Requirements

* Oracle client 11.2 or later. See [ODPI-C installation document][].

## Examples

```no_run
# use oracle_session::*; fn try_main() -> Result<()> {
let session = Session::open(
    "scott", "tiger", "//localhost/XE", "AL32UTF8",
    "report page", "reports", "alice",
)?;

// Select rows with a bind variable.
let rows = session.fetch_all(
    "select ename, sal from emp where deptno = :deptno order by ename",
    "list employees",
    &[BindVar::new("deptno", 30)],
)?;
for row in &rows {
    println!("{:?} {:?}", row.get("ENAME"), row.get("SAL"));
}

// The second page of ten rows.
let page = session.fetch_page(
    "select ename from emp order by ename",
    "page employees",
    11,
    10,
    &[],
)?;
assert!(page.len() <= 10);

// Insert a row and capture the generated id.
let id = session.execute_returning(
    "insert into people(name) values (:name) returning id into :new_id",
    "add person",
    &[BindVar::new("name", "Asimov")],
    "new_id",
)?;
println!("new id: {}", id);

for entry in session.log_entries() {
    println!("{}", entry);
}
# Ok(())} fn main() { try_main().unwrap(); }
```

## NLS_LANG parameter

The character set given to [`Session::open`] is passed to the client
library. Rust strings are UTF-8, so character data is decoded as UTF-8;
use `AL32UTF8` (or leave it empty, which means UTF-8).

[Rust]:                 https://www.rust-lang.org/
[ODPI-C]:               https://oracle.github.io/odpi/
[ODPI-C installation document]: https://oracle.github.io/odpi/doc/installation.html
[Oracle database]: https://www.oracle.com/database/index.html
*/

use odpic_sys::*;
use std::os::raw::c_char;
use std::ptr;
use std::slice;

mod bind;
mod connection;
mod context;
mod error;
mod log;
mod row;
mod session;
pub mod sql_type;
mod sql_value;
mod statement;
mod util;

pub use crate::bind::ArrayBind;
pub use crate::bind::BindDirection;
pub use crate::bind::BindList;
pub use crate::bind::BindType;
pub use crate::bind::BindVar;
pub use crate::error::DbError;
pub use crate::error::Error;
pub use crate::error::ErrorKind;
pub use crate::log::elapsed;
pub use crate::log::format_elapsed;
pub use crate::log::LogCategory;
pub use crate::log::LogEntry;
pub use crate::log::LogLevel;
pub use crate::log::SessionLog;
pub use crate::row::ColumnIndex;
pub use crate::row::ColumnInfo;
pub use crate::row::Row;
pub use crate::session::ExecOutcome;
pub use crate::session::Identity;
pub use crate::session::RetryPolicy;
pub use crate::session::Session;
pub use crate::session::SessionBuilder;
pub use crate::session::DEFAULT_PREFETCH_ROWS;
pub use crate::sql_type::Lob;
pub use crate::sql_type::LobData;
pub use crate::sql_type::LobKind;
pub use crate::sql_type::OracleType;
pub use crate::sql_type::Value;
pub use crate::statement::Rows;
pub use crate::statement::Statement;

pub(crate) use crate::context::Context;

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! define_dpi_data_with_refcount {
    ($name:ident) => {
        paste::item! {
            pub(crate) struct [<Dpi $name>] {
                raw: *mut [<dpi $name>],
            }

            impl [<Dpi $name>] {
                pub(crate) fn new(raw: *mut [<dpi $name>]) -> [<Dpi $name>] {
                    [<Dpi $name>] { raw }
                }

                #[allow(dead_code)]
                pub(crate) fn with_add_ref(raw: *mut [<dpi $name>]) -> [<Dpi $name>] {
                    unsafe { [<dpi $name _addRef>](raw) };
                    [<Dpi $name>] { raw }
                }

                pub(crate) fn raw(&self) -> *mut [<dpi $name>] {
                    self.raw
                }
            }

            impl Clone for [<Dpi $name>] {
                fn clone(&self) -> [<Dpi $name>] {
                    unsafe { [<dpi $name _addRef>](self.raw()) };
                    [<Dpi $name>]::new(self.raw())
                }
            }

            impl Drop for [<Dpi $name>] {
                fn drop(&mut self) {
                    unsafe { [<dpi $name _release>](self.raw()) };
                }
            }

            unsafe impl Send for [<Dpi $name>] {}
            unsafe impl Sync for [<Dpi $name>] {}
        }
    };
}

// define DpiConn wrapping *mut dpiConn.
define_dpi_data_with_refcount!(Conn);

// define DpiStmt wrapping *mut dpiStmt.
define_dpi_data_with_refcount!(Stmt);

// define DpiVar wrapping *mut dpiVar.
define_dpi_data_with_refcount!(Var);

// define DpiLob wrapping *mut dpiLob.
define_dpi_data_with_refcount!(Lob);

trait AssertSend: Send {}
trait AssertSync: Sync {}

//
// Utility struct to convert Rust strings from/to ODPI-C strings
//

struct OdpiStr {
    pub ptr: *const c_char,
    pub len: u32,
}

fn to_odpi_str(s: &str) -> OdpiStr {
    if s.is_empty() {
        OdpiStr {
            ptr: ptr::null(),
            len: 0,
        }
    } else {
        OdpiStr {
            ptr: s.as_ptr() as *const c_char,
            len: s.len() as u32,
        }
    }
}

fn to_rust_str(ptr: *const c_char, len: u32) -> String {
    if ptr.is_null() {
        "".to_string()
    } else {
        let s = unsafe { slice::from_raw_parts(ptr as *mut u8, len as usize) };
        String::from_utf8_lossy(s).into_owned()
    }
}

fn to_rust_slice<'a>(ptr: *const c_char, len: u32) -> &'a [u8] {
    if ptr.is_null() {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr as *mut u8, len as usize) }
    }
}
