use bytes::{Buf, Bytes};

const OWNED_LEN: usize = 15;

#[derive(Debug)]
pub(crate) enum ValueRef<'a> {
    Slice(&'a [u8]),
    Inline {
        offset: usize,
        value: [u8; OWNED_LEN],
    },
    Bytes(Bytes),
}

macro_rules! from {
    (($fr:ty: $pt:pat) => $body:expr) => {
        impl From<$fr> for ValueRef<'static> {
            fn from($pt: $fr) -> Self { $body }
        }
    };
    (<$lf:tt>($fr:ty: $pt:pat) => $body:expr) => {
        impl<$lf> From<&$lf $fr> for ValueRef<$lf> {
            fn from($pt: &$lf $fr) -> Self { $body }
        }
    };
}

from!(((): _) => Self::Slice(&[]));
from!((i32: v) => Self::inline(&v.to_be_bytes()));
from!((bool: v) => Self::inline(&(v as u8).to_be_bytes()));
from!(<'a>(str: v) => Self::Slice(v.as_bytes()));
from!(<'a>([u8]: v) => Self::Slice(v));
from!(<'a>(String: v) => Self::Slice(v.as_bytes()));
from!(<'a>(Vec<u8>: v) => Self::Slice(v));
from!((Bytes: v) => Self::Bytes(v));

impl<'a> ValueRef<'a> {
    /// Copy `slice` into an owned, `'static` value, inline if it fits in [`OWNED_LEN`]
    /// bytes, heap allocated otherwise.
    pub(crate) fn inline(slice: &[u8]) -> ValueRef<'static> {
        let len = slice.len();
        if len <= OWNED_LEN {
            let mut value = [0u8; OWNED_LEN];
            value[OWNED_LEN - len..].copy_from_slice(slice);
            ValueRef::Inline { offset: OWNED_LEN - len, value }
        } else {
            ValueRef::Bytes(Bytes::copy_from_slice(slice))
        }
    }

    /// Alias kept for callers that only ever hand over owned heap data.
    pub(crate) fn copy_from_slice(slice: &[u8]) -> ValueRef<'static> {
        Self::inline(slice)
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            ValueRef::Slice(items) => items.len(),
            ValueRef::Inline { offset, .. } => OWNED_LEN - offset,
            ValueRef::Bytes(bytes) => bytes.len(),
        }
    }
}

impl Buf for ValueRef<'_> {
    fn remaining(&self) -> usize {
        match self {
            ValueRef::Slice(items) => Buf::remaining(items),
            ValueRef::Inline { offset, .. } => OWNED_LEN - offset,
            ValueRef::Bytes(bytes) => Buf::remaining(bytes),
        }
    }

    fn chunk(&self) -> &[u8] {
        match self {
            ValueRef::Slice(items) => Buf::chunk(items),
            ValueRef::Inline { offset, value } => &value[*offset..],
            ValueRef::Bytes(bytes) => Buf::chunk(bytes),
        }
    }

    fn advance(&mut self, cnt: usize) {
        match self {
            ValueRef::Slice(items) => Buf::advance(items, cnt),
            ValueRef::Inline { offset, .. } => *offset += cnt,
            ValueRef::Bytes(bytes) => Buf::advance(bytes, cnt),
        }
    }
}
