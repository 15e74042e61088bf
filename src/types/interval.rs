use crate::{
    Decode, Encode,
    decode::DecodeError,
    column::Column,
    encode::Encoded,
    postgres::{Oid, PgType, pg_type},
};

/// A postgres `interval`: months and days are kept apart from the sub-day component because
/// their length in seconds is calendar dependent (a month is not always 30 days, a day is not
/// always 24 hours across a DST transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PgInterval {
    pub microseconds: i64,
    pub days: i32,
    pub months: i32,
}

impl PgType for PgInterval {
    const OID: Oid = pg_type::INTERVAL;
}

impl Decode for PgInterval {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Self::OID {
            return Err(DecodeError::OidMissmatch);
        }
        let slice = col.as_slice();
        let bytes: [u8; 16] = slice.try_into().map_err(|_| DecodeError::InvalidLength)?;
        let microseconds = i64::from_be_bytes(bytes[0..8].try_into().unwrap());
        let days = i32::from_be_bytes(bytes[8..12].try_into().unwrap());
        let months = i32::from_be_bytes(bytes[12..16].try_into().unwrap());
        Ok(Self { microseconds, days, months })
    }
}

impl Encode<'static> for PgInterval {
    fn encode(self) -> Encoded<'static> {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&self.microseconds.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.days.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.months.to_be_bytes());
        Encoded::copy_from_slice(&bytes, Self::OID)
    }
}
