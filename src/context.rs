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
use once_cell::sync::OnceCell;
use std::ffi::CStr;
use std::mem::{self, MaybeUninit};
use std::os::raw::c_char;
use std::ptr;

//
// Context
//

// The context member (*mut dpiContext) is created only once in the process
// and shared by every session, statement and LOB created afterwards.
#[derive(Clone, Copy)]
pub(crate) struct Context {
    pub context: *mut dpiContext,
}

unsafe impl Sync for Context {}
unsafe impl Send for Context {}

static GLOBAL_CONTEXT: OnceCell<Context> = OnceCell::new();

impl Context {
    // Use this only inside of GLOBAL_CONTEXT.get_or_try_init().
    fn from_params(params: &mut dpiContextCreateParams) -> Result<Context> {
        if params.defaultDriverName.is_null() {
            let driver_name: &'static str =
                concat!("oracle-session : ", env!("CARGO_PKG_VERSION"), "\0");
            params.defaultDriverName = driver_name.as_ptr() as *const c_char;
        }
        let mut ctxt = ptr::null_mut();
        let mut err = MaybeUninit::uninit();
        if unsafe {
            dpiContext_createWithParams(
                DPI_MAJOR_VERSION,
                DPI_MINOR_VERSION,
                params,
                &mut ctxt,
                err.as_mut_ptr(),
            )
        } == DPI_SUCCESS as i32
        {
            tracing::debug!("ODPI-C context created");
            Ok(Context { context: ctxt })
        } else {
            Err(Error::from_dpi_error(&unsafe { err.assume_init() }))
        }
    }

    pub fn get() -> Result<Context> {
        GLOBAL_CONTEXT
            .get_or_try_init(|| {
                let mut params = unsafe { mem::zeroed() };
                Context::from_params(&mut params)
            })
            .copied()
    }

    // `encoding` is used for both CHAR and NCHAR data.
    // The caller keeps it alive until the connection is created.
    pub fn common_create_params(&self, encoding: &CStr) -> dpiCommonCreateParams {
        let mut params = MaybeUninit::uninit();
        unsafe {
            dpiContext_initCommonCreateParams(self.context, params.as_mut_ptr());
            let mut params = params.assume_init();
            params.createMode |= DPI_MODE_CREATE_THREADED;
            params.encoding = encoding.as_ptr();
            params.nencoding = encoding.as_ptr();
            params
        }
    }

    pub fn conn_create_params(&self) -> dpiConnCreateParams {
        let mut params = MaybeUninit::uninit();
        unsafe {
            dpiContext_initConnCreateParams(self.context, params.as_mut_ptr());
            params.assume_init()
        }
    }
}
