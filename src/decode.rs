//! Row value decoding.
use crate::{column::Column, postgres::PgType};

mod error;

pub use error::DecodeError;

/// Type that can be decoded from column value.
pub trait Decode: Sized {
    /// Construct self from a column.
    fn decode(col: Column) -> Result<Self, DecodeError>;
}

impl Decode for () {
    fn decode(_: Column) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! int_decode {
    ($ty:ty) => {
        impl Decode for $ty {
            fn decode(col: Column) -> Result<Self, DecodeError> {
                if col.oid() != <$ty>::OID {
                    return Err(DecodeError::OidMissmatch);
                }
                let slice = col.as_slice();
                let be: [u8; size_of::<$ty>()] = slice
                    .try_into()
                    .map_err(|_| DecodeError::InvalidLength)?;
                Ok(<$ty>::from_be_bytes(be))
            }
        }
    };
}

int_decode!(i16);
int_decode!(i32);
int_decode!(i64);

impl Decode for f32 {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        Ok(f32::from_bits(i32::decode(col)? as u32))
    }
}

impl Decode for f64 {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        Ok(f64::from_bits(i64::decode(col)? as u64))
    }
}

impl Decode for bool {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != bool::OID {
            return Err(DecodeError::OidMissmatch);
        }
        match col.as_slice() {
            [0] => Ok(false),
            [_] => Ok(true),
            _ => Err(DecodeError::InvalidLength),
        }
    }
}

impl Decode for String {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != String::OID {
            return Err(DecodeError::OidMissmatch);
        }
        Ok(String::from_utf8(col.into_value().into())?)
    }
}

impl Decode for Vec<u8> {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Vec::<u8>::OID {
            return Err(DecodeError::OidMissmatch);
        }
        Ok(col.into_value().into())
    }
}

impl Decode for serde_json::Value {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        use crate::postgres::pg_type::{JSON, JSONB};
        match col.oid() {
            JSON => Ok(serde_json::from_slice(col.as_slice())?),
            // jsonb values are prefixed with a one byte format version.
            JSONB => Ok(serde_json::from_slice(&col.as_slice()[1..])?),
            _ => Err(DecodeError::OidMissmatch),
        }
    }
}
