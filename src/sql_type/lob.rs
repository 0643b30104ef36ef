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
use crate::Context;
use crate::DpiLob;
use crate::Result;
use odpic_sys::*;
use std::fmt;
use std::os::raw::c_char;
use std::ptr;

// Number of characters (CLOB) or bytes (BLOB) read per round trip.
const READ_CHUNK_SIZE: u64 = 8192;

/// Payload of a large object, read or written as a whole
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LobData {
    /// Character data of a CLOB
    Text(String),
    /// Binary data of a BLOB
    Binary(Vec<u8>),
}

impl LobData {
    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            LobData::Text(s) => s.as_bytes(),
            LobData::Binary(b) => b,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            LobData::Text(s) => Some(s),
            LobData::Binary(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> LobKind {
        match self {
            LobData::Text(_) => LobKind::Clob,
            LobData::Binary(_) => LobKind::Blob,
        }
    }
}

impl From<String> for LobData {
    fn from(s: String) -> LobData {
        LobData::Text(s)
    }
}

impl From<&str> for LobData {
    fn from(s: &str) -> LobData {
        LobData::Text(s.to_string())
    }
}

impl From<Vec<u8>> for LobData {
    fn from(b: Vec<u8>) -> LobData {
        LobData::Binary(b)
    }
}

impl From<&[u8]> for LobData {
    fn from(b: &[u8]) -> LobData {
        LobData::Binary(b.to_vec())
    }
}

/// Character (CLOB, NCLOB) or binary (BLOB, BFILE) LOB
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LobKind {
    Clob,
    Blob,
}

impl LobKind {
    pub(crate) fn oracle_type_num(self) -> dpiOracleTypeNum {
        match self {
            LobKind::Clob => DPI_ORACLE_TYPE_CLOB,
            LobKind::Blob => DPI_ORACLE_TYPE_BLOB,
        }
    }
}

/// A LOB locator fetched from a query column
///
/// The locator stays valid while the session that fetched it is open.
#[derive(Clone)]
pub struct Lob {
    ctxt: Context,
    handle: DpiLob,
    kind: LobKind,
}

impl Lob {
    // `raw` is borrowed from a variable; a reference is added.
    pub(crate) fn from_raw(ctxt: Context, raw: *mut dpiLob, kind: LobKind) -> Lob {
        Lob {
            ctxt,
            handle: DpiLob::with_add_ref(raw),
            kind,
        }
    }

    /// Creates a temporary LOB which may be written and bound to a statement.
    pub(crate) fn new_temp(conn: &Connection, kind: LobKind) -> Result<Lob> {
        let mut raw = ptr::null_mut();
        chkerr!(
            conn.ctxt(),
            dpiConn_newTempLob(conn.handle(), kind.oracle_type_num(), &mut raw)
        );
        Ok(Lob {
            ctxt: *conn.ctxt(),
            handle: DpiLob::new(raw),
            kind,
        })
    }

    pub(crate) fn raw(&self) -> *mut dpiLob {
        self.handle.raw()
    }

    pub fn kind(&self) -> LobKind {
        self.kind
    }

    /// Returns the size of the LOB, in characters for CLOBs and in bytes for BLOBs.
    pub fn size(&self) -> Result<u64> {
        let mut size = 0;
        chkerr!(&self.ctxt, dpiLob_getSize(self.raw(), &mut size));
        Ok(size)
    }

    /// Reads the whole LOB into memory.
    pub fn read_to_end(&self) -> Result<LobData> {
        match self.kind {
            LobKind::Clob => Ok(LobData::Text(self.read_chars()?)),
            LobKind::Blob => Ok(LobData::Binary(self.read_bytes()?)),
        }
    }

    fn read_chars(&self) -> Result<String> {
        let lob = self.raw();
        let total_char_size = self.size()?;
        let mut total_byte_size = 0;
        let mut bufsiz = 0;
        chkerr!(
            &self.ctxt,
            dpiLob_getBufferSize(lob, total_char_size, &mut total_byte_size)
        );
        chkerr!(
            &self.ctxt,
            dpiLob_getBufferSize(lob, READ_CHUNK_SIZE, &mut bufsiz)
        );
        let mut result = Vec::with_capacity(total_byte_size as usize);
        let mut buf = vec![0u8; bufsiz as usize];
        let mut offset = 1;
        while offset <= total_char_size {
            let mut read_len = bufsiz;
            chkerr!(
                &self.ctxt,
                dpiLob_readBytes(
                    lob,
                    offset,
                    READ_CHUNK_SIZE,
                    buf.as_mut_ptr() as *mut c_char,
                    &mut read_len
                )
            );
            result.extend_from_slice(&buf[..(read_len as usize)]);
            offset += READ_CHUNK_SIZE;
        }
        Ok(String::from_utf8_lossy(&result).into_owned())
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        let lob = self.raw();
        let total_size = self.size()?;
        let mut result = Vec::with_capacity(total_size as usize);
        let mut buf = vec![0u8; READ_CHUNK_SIZE as usize];
        let mut offset = 1;
        while offset <= total_size {
            let mut read_len = READ_CHUNK_SIZE;
            chkerr!(
                &self.ctxt,
                dpiLob_readBytes(
                    lob,
                    offset,
                    READ_CHUNK_SIZE,
                    buf.as_mut_ptr() as *mut c_char,
                    &mut read_len
                )
            );
            result.extend_from_slice(&buf[..(read_len as usize)]);
            offset += READ_CHUNK_SIZE;
        }
        Ok(result)
    }

    /// Replaces the LOB content with `data`.
    pub(crate) fn write_all(&self, data: &LobData) -> Result<()> {
        let bytes = data.as_bytes();
        chkerr!(&self.ctxt, dpiLob_trim(self.raw(), 0));
        if !bytes.is_empty() {
            chkerr!(
                &self.ctxt,
                dpiLob_writeBytes(
                    self.raw(),
                    1,
                    bytes.as_ptr() as *const c_char,
                    bytes.len() as u64
                )
            );
        }
        Ok(())
    }
}

impl PartialEq for Lob {
    fn eq(&self, other: &Lob) -> bool {
        self.raw() == other.raw()
    }
}

impl fmt::Debug for Lob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lob {{ kind: {:?}, handle: {:?} }}", self.kind, self.raw())
    }
}
