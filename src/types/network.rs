use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::{
    Decode, Encode,
    decode::DecodeError,
    column::Column,
    encode::Encoded,
    postgres::{Oid, PgType, pg_type},
};

// <https://github.com/postgres/postgres/blob/master/src/include/utils/inet.h>
// these are fixed wire constants, unrelated to the platform's own AF_INET/AF_INET6.
const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = PGSQL_AF_INET + 1;

fn decode_addr(slice: &[u8]) -> Result<(IpAddr, u8), DecodeError> {
    let [family, bits, _is_cidr, len, addr @ ..] = slice else {
        return Err(DecodeError::InvalidLength);
    };
    let ip = match (*family, *len, addr) {
        (PGSQL_AF_INET, 4, [a, b, c, d]) => IpAddr::V4(Ipv4Addr::new(*a, *b, *c, *d)),
        (PGSQL_AF_INET6, 16, _) => {
            let octets: [u8; 16] = addr.try_into().map_err(|_| DecodeError::InvalidLength)?;
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return Err(DecodeError::InvalidLength),
    };
    Ok((ip, *bits))
}

fn encode_addr(ip: IpAddr, bits: u8, is_cidr: bool) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(20);
    match ip {
        IpAddr::V4(v4) => {
            bytes.push(PGSQL_AF_INET);
            bytes.push(bits);
            bytes.push(is_cidr as u8);
            bytes.push(4);
            bytes.extend_from_slice(&v4.octets());
        }
        IpAddr::V6(v6) => {
            bytes.push(PGSQL_AF_INET6);
            bytes.push(bits);
            bytes.push(is_cidr as u8);
            bytes.push(16);
            bytes.extend_from_slice(&v6.octets());
        }
    }
    bytes
}

impl PgType for IpAddr {
    const OID: Oid = pg_type::INET;
}

impl Decode for IpAddr {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Self::OID {
            return Err(DecodeError::OidMissmatch);
        }
        decode_addr(col.as_slice()).map(|(ip, _bits)| ip)
    }
}

impl Encode<'static> for IpAddr {
    fn encode(self) -> Encoded<'static> {
        let bits = match self {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        Encoded::owned(encode_addr(self, bits, false), Self::OID)
    }
}

/// A postgres `cidr`: a network address, as opposed to `inet`'s host address.
///
/// This wraps a whole-address [`IpAddr`] rather than an address plus an explicit prefix
/// length, matching the common case of a `cidr` column holding a single network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr(pub IpAddr);

impl PgType for Cidr {
    const OID: Oid = pg_type::CIDR;
}

impl Decode for Cidr {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if col.oid() != Self::OID {
            return Err(DecodeError::OidMissmatch);
        }
        decode_addr(col.as_slice()).map(|(ip, _bits)| Cidr(ip))
    }
}

impl Encode<'static> for Cidr {
    fn encode(self) -> Encoded<'static> {
        let bits = match self.0 {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        Encoded::owned(encode_addr(self.0, bits, true), Self::OID)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ipv4_round_trips() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let bytes = encode_addr(ip, 32, false);
        assert_eq!(decode_addr(&bytes).unwrap(), (ip, 32));
    }

    #[test]
    fn ipv6_round_trips() {
        let ip = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        let bytes = encode_addr(ip, 128, true);
        assert_eq!(decode_addr(&bytes).unwrap(), (ip, 128));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        assert!(matches!(decode_addr(&[2, 32, 0]), Err(DecodeError::InvalidLength)));
    }
}
