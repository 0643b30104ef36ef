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

use crate::error::chkerr;
use crate::to_odpi_str;
use crate::util::client_encoding;
use crate::util::string_into_c_string;
use crate::AssertSend;
use crate::AssertSync;
use crate::Context;
use crate::DpiConn;
use crate::Result;
use odpic_sys::*;
use std::ptr;

/// Standalone connection owned by one session
pub(crate) struct Connection {
    ctxt: Context,
    handle: DpiConn,
}

impl AssertSync for Context {}
impl AssertSend for Context {}
impl AssertSend for Connection {}

impl Connection {
    /// Connects once. The caller retries.
    pub(crate) fn connect(
        username: &str,
        password: &str,
        connect_string: &str,
        charset: &str,
    ) -> Result<Connection> {
        let encoding = client_encoding(charset)?;
        let encoding = string_into_c_string(encoding.to_string(), "charset")?;
        let ctxt = Context::get()?;
        let common_params = ctxt.common_create_params(&encoding);
        let mut conn_params = ctxt.conn_create_params();
        let username = to_odpi_str(username);
        let password = to_odpi_str(password);
        let connect_string = to_odpi_str(connect_string);
        let mut handle = ptr::null_mut();
        chkerr!(
            &ctxt,
            dpiConn_create(
                ctxt.context,
                username.ptr,
                username.len,
                password.ptr,
                password.len,
                connect_string.ptr,
                connect_string.len,
                &common_params,
                &mut conn_params,
                &mut handle
            )
        );
        Ok(Connection {
            ctxt,
            handle: DpiConn::new(handle),
        })
    }

    pub(crate) fn ctxt(&self) -> &Context {
        &self.ctxt
    }

    pub(crate) fn handle(&self) -> *mut dpiConn {
        self.handle.raw()
    }

    pub(crate) fn commit(&self) -> Result<()> {
        chkerr!(&self.ctxt, dpiConn_commit(self.handle()));
        Ok(())
    }

    pub(crate) fn rollback(&self) -> Result<()> {
        chkerr!(&self.ctxt, dpiConn_rollback(self.handle()));
        Ok(())
    }

    /// Closes the connection. This fails while statements or LOBs are open.
    pub(crate) fn close(&self) -> Result<()> {
        chkerr!(
            &self.ctxt,
            dpiConn_close(
                self.handle(),
                DPI_MODE_CONN_CLOSE_DEFAULT,
                ptr::null(),
                0
            )
        );
        Ok(())
    }

    /// Sets the module piggybacked with the next round trip.
    pub(crate) fn set_module(&self, module: &str) -> Result<()> {
        let s = to_odpi_str(module);
        chkerr!(&self.ctxt, dpiConn_setModule(self.handle(), s.ptr, s.len));
        Ok(())
    }

    /// Sets the action piggybacked with the next round trip.
    pub(crate) fn set_action(&self, action: &str) -> Result<()> {
        let s = to_odpi_str(action);
        chkerr!(&self.ctxt, dpiConn_setAction(self.handle(), s.ptr, s.len));
        Ok(())
    }

    pub(crate) fn set_client_info(&self, client_info: &str) -> Result<()> {
        let s = to_odpi_str(client_info);
        chkerr!(
            &self.ctxt,
            dpiConn_setClientInfo(self.handle(), s.ptr, s.len)
        );
        Ok(())
    }

    pub(crate) fn set_client_identifier(&self, client_identifier: &str) -> Result<()> {
        let s = to_odpi_str(client_identifier);
        chkerr!(
            &self.ctxt,
            dpiConn_setClientIdentifier(self.handle(), s.ptr, s.len)
        );
        Ok(())
    }
}
