use time::{Date, Duration, PrimitiveDateTime, Time, UtcDateTime};

use crate::{
    Decode, Encode,
    decode::DecodeError,
    column::Column,
    encode::Encoded,
    postgres::{Oid, PgType, pg_type},
};

impl PgType for Date {
    const OID: Oid = pg_type::DATE;
}

impl PgType for Time {
    const OID: Oid = pg_type::TIME;
}

impl PgType for PrimitiveDateTime {
    const OID: Oid = pg_type::TIMESTAMP;
}

impl PgType for UtcDateTime {
    const OID: Oid = pg_type::TIMESTAMPTZ;
}

// source: `Date::from_julian_day` docs
const PG_EPOCH_DATE: Date = match Date::from_julian_day(2_451_545) {
    Ok(date) => date,
    Err(_) => panic!("2451545 is a valid julian day"),
};

const PRIMITIVE_PG_EPOCH: PrimitiveDateTime = PrimitiveDateTime::new(PG_EPOCH_DATE, Time::MIDNIGHT);
const UTC_PG_EPOCH: UtcDateTime = UtcDateTime::new(PG_EPOCH_DATE, Time::MIDNIGHT);

fn read_i64(col: &Column) -> Result<i64, DecodeError> {
    let bytes: [u8; 8] = col.as_slice().try_into().map_err(|_| DecodeError::InvalidLength)?;
    Ok(i64::from_be_bytes(bytes))
}

impl Decode for Date {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Self::OID {
            return Err(DecodeError::OidMissmatch);
        }
        let bytes: [u8; 4] = col.as_slice().try_into().map_err(|_| DecodeError::InvalidLength)?;
        let days = i32::from_be_bytes(bytes);
        Ok(PG_EPOCH_DATE.saturating_add(Duration::days(days as i64)))
    }
}

impl Decode for Time {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Self::OID {
            return Err(DecodeError::OidMissmatch);
        }
        let micros = read_i64(&col)?;
        Ok(Time::MIDNIGHT + Duration::microseconds(micros))
    }
}

impl Decode for PrimitiveDateTime {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Self::OID {
            return Err(DecodeError::OidMissmatch);
        }
        let micros = read_i64(&col)?;
        Ok(PRIMITIVE_PG_EPOCH.saturating_add(Duration::microseconds(micros)))
    }
}

impl Decode for UtcDateTime {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Self::OID {
            return Err(DecodeError::OidMissmatch);
        }
        let micros = read_i64(&col)?;
        Ok(UTC_PG_EPOCH.saturating_add(Duration::microseconds(micros)))
    }
}

impl Encode<'static> for Date {
    fn encode(self) -> Encoded<'static> {
        let days = (self - PG_EPOCH_DATE).whole_days() as i32;
        Encoded::owned(days.to_be_bytes().to_vec(), Self::OID)
    }
}

impl Encode<'static> for Time {
    fn encode(self) -> Encoded<'static> {
        let micros = (self - Time::MIDNIGHT).whole_microseconds() as i64;
        Encoded::owned(micros.to_be_bytes().to_vec(), Self::OID)
    }
}

impl Encode<'static> for PrimitiveDateTime {
    fn encode(self) -> Encoded<'static> {
        let micros = (self - PRIMITIVE_PG_EPOCH).whole_microseconds() as i64;
        Encoded::owned(micros.to_be_bytes().to_vec(), Self::OID)
    }
}

impl Encode<'static> for UtcDateTime {
    fn encode(self) -> Encoded<'static> {
        let micros = (self - UTC_PG_EPOCH).whole_microseconds() as i64;
        Encoded::owned(micros.to_be_bytes().to_vec(), Self::OID)
    }
}
