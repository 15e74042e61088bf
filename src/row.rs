//! A decoded `DataRow`, positioned against its `RowDescription`.
//!
//! - [`Row`]
//! - [`Column`][crate::column::Column]
//! - [`FromRow`]
use bytes::{Buf, Bytes};

use crate::{
    column::{Column, ColumnInfo, Index},
    decode::{Decode, DecodeError},
    postgres::backend::DataRow,
};

/// One row of a query result, borrowing the column layout from the statement/portal that
/// produced it.
pub struct Row<'a> {
    cols: &'a [ColumnInfo],
    body: Bytes,
}

impl<'a> Row<'a> {
    pub(crate) fn new(cols: &'a [ColumnInfo], data_row: DataRow) -> Self {
        Self { cols, body: data_row.body }
    }

    /// Get and decode a single column by name or position.
    pub fn try_get<I: Index, R: FromRowValue>(&self, index: I) -> Result<R, DecodeError> {
        let pos = index.position(self.cols).ok_or(DecodeError::FieldNotFound)?;
        R::from_value(self.nth_value(pos)?)
    }

    /// Number of columns in this row.
    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    fn nth_value(&self, pos: usize) -> Result<Option<Column>, DecodeError> {
        let mut body = self.body.clone();
        let field_count = body.get_i16();
        debug_assert_eq!(field_count as usize, self.cols.len());
        for i in 0..=pos {
            let len = body.get_i32();
            if len < 0 {
                if i == pos {
                    return Ok(None);
                }
                continue;
            }
            let len = len as usize;
            if i == pos {
                let value = body.copy_to_bytes(len);
                return Ok(Some(Column::new(&self.cols[pos], value)));
            }
            body.advance(len);
        }
        Err(DecodeError::IndexOutOfBound)
    }
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (i, col) in self.cols.iter().enumerate() {
            match self.nth_value(i) {
                Ok(Some(value)) => map.entry(&col.field_name(), &value.as_slice()),
                Ok(None) => map.entry(&col.field_name(), &"NULL"),
                Err(_) => map.entry(&col.field_name(), &"<invalid>"),
            };
        }
        map.finish()
    }
}

/// Value decoded out of a [`Row`] at a given position: `T` requires the column be non-null,
/// `Option<T>` maps a SQL `NULL` to `None`.
pub trait FromRowValue: Sized {
    fn from_value(value: Option<Column>) -> Result<Self, DecodeError>;
}

impl<T: Decode> FromRowValue for T {
    fn from_value(value: Option<Column>) -> Result<Self, DecodeError> {
        T::decode(value.ok_or(DecodeError::UnexpectedNull)?)
    }
}

impl<T: Decode> FromRowValue for Option<T> {
    fn from_value(value: Option<Column>) -> Result<Self, DecodeError> {
        value.map(T::decode).transpose()
    }
}

/// Type that can be constructed from a whole [`Row`].
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self, DecodeError>;
}

/// Decode a single-column row directly into its column value, e.g. `query(..).fetch_one::<i32>()`.
impl<T: FromRowValue> FromRow for T {
    fn from_row(row: Row) -> Result<Self, DecodeError> {
        row.try_get(0usize)
    }
}

macro_rules! from_row_tuple {
    ($($idx:tt: $ty:ident),+) => {
        impl<$($ty: FromRowValue),+> FromRow for ($($ty,)+) {
            fn from_row(row: Row) -> Result<Self, DecodeError> {
                Ok(($(row.try_get::<usize, $ty>($idx)?,)+))
            }
        }
    };
}

from_row_tuple!(0: T0);
from_row_tuple!(0: T0, 1: T1);
from_row_tuple!(0: T0, 1: T1, 2: T2);
from_row_tuple!(0: T0, 1: T1, 2: T2, 3: T3);
