//! Object IDs for the small set of built-in types this crate understands natively.
//!
//! <https://www.postgresql.org/docs/current/catalog-pg-type.html> lists the full catalog;
//! anything not covered here round-trips fine as raw bytes via [`Column`][crate::Column] but
//! has no [`Decode`][crate::Decode]/[`Encode`][crate::encode::Encode] impl.
pub type Oid = u32;

/// A Rust type with a fixed, well known postgres [`Oid`].
pub trait PgType {
    const OID: Oid;
}

pub const BOOL: Oid = 16;
pub const BYTEA: Oid = 17;
pub const CHAR: Oid = 18;
pub const INT8: Oid = 20;
pub const INT2: Oid = 21;
pub const INT4: Oid = 23;
pub const TEXT: Oid = 25;
pub const JSON: Oid = 114;
pub const FLOAT4: Oid = 700;
pub const FLOAT8: Oid = 701;
pub const UNKNOWN: Oid = 705;
pub const CIDR: Oid = 650;
pub const INET: Oid = 869;
pub const BPCHAR: Oid = 1042;
pub const VARCHAR: Oid = 1043;
pub const DATE: Oid = 1082;
pub const TIME: Oid = 1083;
pub const TIMESTAMP: Oid = 1114;
pub const TIMESTAMPTZ: Oid = 1184;
pub const INTERVAL: Oid = 1186;
pub const TIMETZ: Oid = 1266;
pub const NUMERIC: Oid = 1700;
pub const JSONB: Oid = 3802;

// Array oids of the scalar/text element types this crate decodes/encodes. Built-in types keep
// a fixed oid across every postgres install, so these are safe to hardcode rather than look up
// in `pg_catalog.pg_type` at connect time.
pub const BOOL_ARRAY: Oid = 1000;
pub const INT2_ARRAY: Oid = 1005;
pub const INT4_ARRAY: Oid = 1007;
pub const TEXT_ARRAY: Oid = 1009;
pub const INT8_ARRAY: Oid = 1016;
pub const FLOAT4_ARRAY: Oid = 1021;
pub const FLOAT8_ARRAY: Oid = 1022;

impl PgType for () {
    const OID: Oid = UNKNOWN;
}

impl PgType for bool {
    const OID: Oid = BOOL;
}

impl PgType for i16 {
    const OID: Oid = INT2;
}

impl PgType for i32 {
    const OID: Oid = INT4;
}

impl PgType for i64 {
    const OID: Oid = INT8;
}

impl PgType for f32 {
    const OID: Oid = FLOAT4;
}

impl PgType for f64 {
    const OID: Oid = FLOAT8;
}

impl PgType for str {
    const OID: Oid = TEXT;
}

impl PgType for String {
    const OID: Oid = TEXT;
}

impl PgType for [u8] {
    const OID: Oid = BYTEA;
}

impl PgType for Vec<u8> {
    const OID: Oid = BYTEA;
}

impl PgType for serde_json::Value {
    const OID: Oid = JSONB;
}
