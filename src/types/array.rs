use bytes::{Buf, Bytes};

use crate::{
    Decode, Encode,
    decode::DecodeError,
    column::Column,
    encode::Encoded,
    postgres::{Oid, PgType, pg_type},
};

/// Element types this module can lay out on the wire by itself, bypassing [`Encode`] — owned
/// `String` only has a borrowed `Encode` impl (`&str`/`&String`), so array encoding can't
/// just call `.encode()` on each owned element like the rest of the crate does.
trait ArrayElem: PgType {
    fn wire_bytes(&self) -> Vec<u8>;
}

macro_rules! int_elem {
    ($ty:ty) => {
        impl ArrayElem for $ty {
            fn wire_bytes(&self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }
        }
    };
}

int_elem!(i16);
int_elem!(i32);
int_elem!(i64);
int_elem!(f32);
int_elem!(f64);

impl ArrayElem for bool {
    fn wire_bytes(&self) -> Vec<u8> {
        vec![*self as u8]
    }
}

impl ArrayElem for String {
    fn wire_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

// <https://www.postgresql.org/docs/current/arrays.html> binary wire format: ndim, has-null
// flag, element oid, then one (size, lower bound) pair per dimension, then ndim-major elements
// as (len, bytes) with len == -1 for NULL. Only one dimensional arrays are supported; postgres
// itself always reports ndim == 0 for an empty array regardless of the column's declared
// dimensionality.
fn decode_array<T: Decode + PgType>(mut body: Bytes) -> Result<Vec<T>, DecodeError> {
    if body.remaining() < 12 {
        return Err(DecodeError::InvalidLength);
    }
    let ndim = body.get_i32();
    let _has_null = body.get_i32();
    let _elem_oid = body.get_u32();

    if ndim == 0 {
        return Ok(Vec::new());
    }
    if ndim != 1 {
        return Err(DecodeError::InvalidLength);
    }
    if body.remaining() < 8 {
        return Err(DecodeError::InvalidLength);
    }
    let len = body.get_i32();
    let _lower_bound = body.get_i32();

    let mut items = Vec::with_capacity(len.max(0) as usize);
    for _ in 0..len {
        if body.remaining() < size_of::<i32>() {
            return Err(DecodeError::InvalidLength);
        }
        let elem_len = body.get_i32();
        if elem_len < 0 {
            return Err(DecodeError::UnexpectedNull);
        }
        let elem_len = elem_len as usize;
        if body.remaining() < elem_len {
            return Err(DecodeError::InvalidLength);
        }
        let value = body.copy_to_bytes(elem_len);
        items.push(T::decode(Column::from_parts(T::OID, value))?);
    }
    Ok(items)
}

fn encode_array<T: ArrayElem>(items: &[T], elem_oid: Oid) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1i32.to_be_bytes()); // ndim
    bytes.extend_from_slice(&0i32.to_be_bytes()); // has_null
    bytes.extend_from_slice(&elem_oid.to_be_bytes());
    bytes.extend_from_slice(&(items.len() as i32).to_be_bytes()); // dimension size
    bytes.extend_from_slice(&1i32.to_be_bytes()); // lower bound
    for item in items {
        let wire = item.wire_bytes();
        bytes.extend_from_slice(&(wire.len() as i32).to_be_bytes());
        bytes.extend_from_slice(&wire);
    }
    bytes
}

/// Implement [`PgType`]/[`Decode`]/[`Encode`] for `Vec<$elem>`, bound to the given array oid.
///
/// `Vec<u8>` is deliberately excluded: it already means `bytea`, not `Vec` of individual bytes.
macro_rules! array_type {
    ($elem:ty, $array_oid:expr) => {
        impl PgType for Vec<$elem> {
            const OID: Oid = $array_oid;
        }

        impl Decode for Vec<$elem> {
            fn decode(col: Column) -> Result<Self, DecodeError> {
                if col.oid() != Self::OID {
                    return Err(DecodeError::OidMissmatch);
                }
                decode_array::<$elem>(col.into_value())
            }
        }

        impl Encode<'static> for Vec<$elem> {
            fn encode(self) -> Encoded<'static> {
                Encoded::owned(encode_array(&self, <$elem>::OID), Self::OID)
            }
        }
    };
}

array_type!(i16, pg_type::INT2_ARRAY);
array_type!(i32, pg_type::INT4_ARRAY);
array_type!(i64, pg_type::INT8_ARRAY);
array_type!(f32, pg_type::FLOAT4_ARRAY);
array_type!(f64, pg_type::FLOAT8_ARRAY);
array_type!(bool, pg_type::BOOL_ARRAY);
array_type!(String, pg_type::TEXT_ARRAY);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_the_wire_format() {
        let bytes = encode_array(&[1i32, 2, 3], pg_type::INT4);
        let items = decode_array::<i32>(Bytes::from(bytes)).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn empty_array_has_ndim_zero() {
        let bytes = encode_array::<String>(&[], pg_type::TEXT);
        let items = decode_array::<String>(Bytes::from(bytes)).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn null_element_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_be_bytes()); // ndim
        bytes.extend_from_slice(&1i32.to_be_bytes()); // has_null
        bytes.extend_from_slice(&pg_type::INT4.to_be_bytes());
        bytes.extend_from_slice(&1i32.to_be_bytes()); // dimension size
        bytes.extend_from_slice(&1i32.to_be_bytes()); // lower bound
        bytes.extend_from_slice(&(-1i32).to_be_bytes()); // NULL element

        let result = decode_array::<i32>(Bytes::from(bytes));
        assert!(matches!(result, Err(DecodeError::UnexpectedNull)));
    }
}
