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
use std::ffi::CString;

/// Maximum number of characters of an action tag.
pub const MAX_ACTION_CHARS: usize = 32;

/// Bind names appended by [`paging_sql`].
pub const PAGE_FIRST_BIND: &str = "sq_first";
pub const PAGE_LAST_BIND: &str = "sq_last";

/// Truncates `action` to [`MAX_ACTION_CHARS`] characters on a character boundary.
pub fn truncate_action(action: &str) -> &str {
    match action.char_indices().nth(MAX_ACTION_CHARS) {
        Some((idx, _)) => &action[..idx],
        None => action,
    }
}

/// Drops one leading colon and rejects empty names.
pub fn normalize_bind_name(name: &str) -> Result<&str> {
    let name = name.strip_prefix(':').unwrap_or(name);
    if name.is_empty() {
        return Err(Error::invalid_argument("bind variable name must not be empty"));
    }
    if name.contains(|c: char| c.is_whitespace() || c == ':' || c == '\0') {
        return Err(Error::invalid_argument(format!(
            "invalid bind variable name \"{}\"",
            name
        )));
    }
    Ok(name)
}

pub fn paging_sql(sql: &str) -> String {
    format!(
        "SELECT * FROM (SELECT a.*, ROWNUM AS rnum FROM ({}) a WHERE ROWNUM <= :{}) WHERE :{} <= rnum",
        sql, PAGE_LAST_BIND, PAGE_FIRST_BIND
    )
}

// Inclusive (first, last) row numbers of a page. None for an empty page.
// Row numbers start at 1, so a page starting at 0 holds one row less.
pub fn page_bounds(first_row: u64, num_rows: u64) -> Option<(u64, u64)> {
    if num_rows == 0 {
        None
    } else {
        Some((first_row, first_row.saturating_add(num_rows - 1)))
    }
}

/// Client encoding handed to ODPI-C. Text is always decoded as UTF-8.
pub const CLIENT_ENCODING: &str = "UTF-8";

/// Maps a requested character set to [`CLIENT_ENCODING`].
///
/// An empty name and the UTF-8 aliases `UTF-8`, `UTF8` and `AL32UTF8` are
/// accepted ignoring case. Other character sets are rejected.
pub fn client_encoding(charset: &str) -> Result<&'static str> {
    const ALIASES: [&str; 3] = ["UTF-8", "UTF8", "AL32UTF8"];
    if charset.is_empty() || ALIASES.iter().any(|a| a.eq_ignore_ascii_case(charset)) {
        Ok(CLIENT_ENCODING)
    } else {
        Err(Error::invalid_argument(format!(
            "unsupported character set \"{}\" (only UTF-8 is supported)",
            charset
        )))
    }
}

/// Checks the textual form of an Oracle number such as `-12.5e-3`.
pub fn check_number_format(s: &str) -> Result<()> {
    let err = || Error::invalid_argument(format!("\"{}\" is not a valid Oracle number", s));
    let rest = s.strip_prefix('-').unwrap_or(s);
    let (mantissa, exponent) = match rest.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
        None => (rest, None),
    };
    let all_digits = |t: &str| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(mantissa),
    };
    let exponent_ok = match exponent {
        Some(exp) => all_digits(exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp)),
        None => true,
    };
    if mantissa_ok && exponent_ok {
        Ok(())
    } else {
        Err(err())
    }
}

pub fn set_hex_string(s: &mut String, bytes: &[u8]) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for byte in bytes {
        s.push(HEX[(byte >> 4) as usize] as char);
        s.push(HEX[(byte & 0xF) as usize] as char);
    }
}

pub fn string_into_c_string(s: String, name: &str) -> Result<CString> {
    CString::new(s)
        .map_err(|_| Error::invalid_argument(format!("{} cannot contain nul characters", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_truncate_action() {
        assert_eq!(truncate_action(""), "");
        assert_eq!(truncate_action("short"), "short");
        let long = "a".repeat(40);
        assert_eq!(truncate_action(&long), &long[..32]);
        let multibyte = "\u{3042}".repeat(33);
        assert_eq!(truncate_action(&multibyte).chars().count(), 32);
        let exact = "b".repeat(32);
        assert_eq!(truncate_action(&exact), exact);
    }

    #[test]
    fn test_normalize_bind_name() {
        assert_eq!(normalize_bind_name(":id").unwrap(), "id");
        assert_eq!(normalize_bind_name("id").unwrap(), "id");
        assert_eq!(
            normalize_bind_name("::id").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            normalize_bind_name(":").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert!(normalize_bind_name("a b").is_err());
    }

    #[test]
    fn test_paging_sql() {
        assert_eq!(
            paging_sql("select * from t"),
            "SELECT * FROM (SELECT a.*, ROWNUM AS rnum FROM (select * from t) a WHERE ROWNUM <= :sq_last) WHERE :sq_first <= rnum"
        );
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(1, 10), Some((1, 10)));
        assert_eq!(page_bounds(11, 10), Some((11, 20)));
        assert_eq!(page_bounds(5, 1), Some((5, 5)));
        assert_eq!(page_bounds(5, 0), None);
    }

    #[test]
    fn test_check_number_format() {
        for ok in &["123", "-123", "-123.5", "-123e1", "-123e+1", "1E-10", "0.0"] {
            assert!(check_number_format(ok).is_ok(), "{}", ok);
        }
        for ng in &["", "a", "-123.", ".123", "-123e", " 123", "1.2.3", "--1"] {
            assert!(check_number_format(ng).is_err(), "{}", ng);
        }
    }

    #[test]
    fn test_page_bounds_from_zero() {
        assert_eq!(page_bounds(0, 3), Some((0, 2)));
        assert_eq!(page_bounds(0, 1), Some((0, 0)));
        assert_eq!(page_bounds(u64::MAX, 2), Some((u64::MAX, u64::MAX)));
    }

    #[test]
    fn test_client_encoding() {
        assert_eq!(client_encoding("").unwrap(), CLIENT_ENCODING);
        assert_eq!(client_encoding("AL32UTF8").unwrap(), CLIENT_ENCODING);
        assert_eq!(client_encoding("al32utf8").unwrap(), CLIENT_ENCODING);
        assert_eq!(client_encoding("utf8").unwrap(), CLIENT_ENCODING);
        assert_eq!(client_encoding("UTF-8").unwrap(), CLIENT_ENCODING);
        for charset in ["WE8ISO8859P1", "ISO-8859-1", "JA16SJIS", "UTF-16"] {
            let err = client_encoding(charset).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert!(err.to_string().contains(charset));
        }
    }

    #[test]
    fn test_set_hex_string() {
        let mut s = String::new();
        set_hex_string(&mut s, &[0x00, 0x9a, 0xff]);
        assert_eq!(s, "009AFF");
    }

    #[test]
    fn test_string_into_c_string() {
        assert!(string_into_c_string("AL32UTF8".into(), "charset").is_ok());
        let err = string_into_c_string("a\0b".into(), "charset").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
