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

use crate::sql_type::OracleType;
use crate::Error;
use crate::Result;
use crate::Value;
use std::fmt;
use std::sync::Arc;

/// Column information in a select statement
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    name: String,
    oracle_type: OracleType,
    nullable: bool,
}

impl ColumnInfo {
    pub(crate) fn new(name: String, oracle_type: OracleType, nullable: bool) -> ColumnInfo {
        ColumnInfo {
            name,
            oracle_type,
            nullable,
        }
    }

    /// Gets column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets Oracle type
    pub fn oracle_type(&self) -> &OracleType {
        &self.oracle_type
    }

    /// Gets whether the column may be NULL.
    /// False when the column is defined as `NOT NULL`.
    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.nullable {
            write!(f, "{} {}", self.name, self.oracle_type)
        } else {
            write!(f, "{} {} NOT NULL", self.name, self.oracle_type)
        }
    }
}

/// A trait to specify a column of a [`Row`]
pub trait ColumnIndex {
    /// Returns the position of the column specified by `self`.
    fn idx(&self, columns: &[ColumnInfo]) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn idx(&self, columns: &[ColumnInfo]) -> Result<usize> {
        if *self < columns.len() {
            Ok(*self)
        } else {
            Err(Error::invalid_argument(format!(
                "column index {} is out of range (number of columns: {})",
                self,
                columns.len()
            )))
        }
    }
}

/// Exact, case-sensitive column name
impl ColumnIndex for &str {
    fn idx(&self, columns: &[ColumnInfo]) -> Result<usize> {
        columns
            .iter()
            .position(|col| col.name == *self)
            .ok_or_else(|| Error::invalid_column_name(*self))
    }
}

/// Row in a result set of a select statement
///
/// Rows of one query share their column information.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    columns: Arc<Vec<ColumnInfo>>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<Vec<ColumnInfo>>, values: Vec<Value>) -> Row {
        Row { columns, values }
    }

    /// Gets the column value at the specified index or with the specified name.
    pub fn get<I>(&self, colidx: I) -> Result<&Value>
    where
        I: ColumnIndex,
    {
        let pos = colidx.idx(&self.columns)?;
        Ok(&self.values[pos])
    }

    /// Gets the column value whose name matches `name` ignoring ASCII case.
    pub fn get_ignore_case(&self, name: &str) -> Result<&Value> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
            .map(|pos| &self.values[pos])
            .ok_or_else(|| Error::invalid_column_name(name))
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over column information and value pairs in select-list order.
    pub fn iter(&self) -> impl Iterator<Item = (&ColumnInfo, &Value)> {
        self.columns.iter().zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn sample_row() -> Row {
        let columns = Arc::new(vec![
            ColumnInfo::new("EMPNO".into(), OracleType::Number(4, 0), false),
            ColumnInfo::new("ENAME".into(), OracleType::Varchar2(10), true),
            ColumnInfo::new("RNUM".into(), OracleType::Number(0, -127), true),
        ]);
        Row::new(
            columns,
            vec![
                Value::Integer(7369),
                Value::Text("SMITH".into()),
                Value::Number("1".into()),
            ],
        )
    }

    #[test]
    fn lookup_by_name_and_index() {
        let row = sample_row();
        assert_eq!(row.get("ENAME").unwrap(), &Value::Text("SMITH".into()));
        assert_eq!(row.get(0usize).unwrap(), &Value::Integer(7369));
        assert_eq!(
            row.get("ename").unwrap_err().kind(),
            ErrorKind::InvalidColumnName
        );
        assert_eq!(
            row.get_ignore_case("ename").unwrap(),
            &Value::Text("SMITH".into())
        );
        assert_eq!(
            row.get_ignore_case("nosuch").unwrap_err().kind(),
            ErrorKind::InvalidColumnName
        );
        assert_eq!(row.get(3usize).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn iterate_in_select_list_order() {
        let row = sample_row();
        let names: Vec<_> = row.iter().map(|(col, _)| col.name()).collect();
        assert_eq!(names, ["EMPNO", "ENAME", "RNUM"]);
        assert_eq!(row.len(), 3);
        assert_eq!(row.columns()[0].to_string(), "EMPNO NUMBER(4) NOT NULL");
        assert_eq!(row.columns()[1].to_string(), "ENAME VARCHAR2(10)");
        assert_eq!(row.into_values().len(), 3);
    }
}
