//! NDN packet types and their wire representation.
//!
//! Interest, Data, and Nack packets are TLV-encoded. Unknown TLV fields
//! inside a packet are skipped on decode so that packets produced by a
//! newer peer still parse.

use crate::error::Error;
use crate::name::Name;
use crate::tlv::{self, TlvElement};
use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Default InterestLifetime when the field is absent, in milliseconds.
pub const DEFAULT_INTEREST_LIFETIME_MS: u64 = 4000;

/* ---------------------------------------------------------------- *\
 * Interest
\* ---------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    /// Absent on the wire until a forwarder fills one in.
    pub nonce: Option<u32>,
    pub lifetime_ms: u64,
    pub hop_limit: Option<u8>,
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            nonce: None,
            lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            hop_limit: None,
            can_be_prefix: false,
            must_be_fresh: false,
        }
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_lifetime(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    pub fn with_hop_limit(mut self, hop_limit: u8) -> Self {
        self.hop_limit = Some(hop_limit);
        self
    }

    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        self.name.to_tlv().encode(&mut buf);
        if self.can_be_prefix {
            TlvElement::new(tlv::TLV_CAN_BE_PREFIX, Bytes::new()).encode(&mut buf);
        }
        if self.must_be_fresh {
            TlvElement::new(tlv::TLV_MUST_BE_FRESH, Bytes::new()).encode(&mut buf);
        }
        if let Some(nonce) = self.nonce {
            TlvElement::new(tlv::TLV_NONCE, nonce.to_be_bytes().to_vec()).encode(&mut buf);
        }
        if self.lifetime_ms != DEFAULT_INTEREST_LIFETIME_MS {
            TlvElement::from_nonneg_integer(tlv::TLV_INTEREST_LIFETIME, self.lifetime_ms)
                .encode(&mut buf);
        }
        if let Some(hop_limit) = self.hop_limit {
            TlvElement::new(tlv::TLV_HOP_LIMIT, vec![hop_limit]).encode(&mut buf);
        }
        TlvElement::new(tlv::TLV_INTEREST, buf.freeze())
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_INTEREST {
            return Err(Error::Packet(format!(
                "Expected Interest TLV type {}, got {}",
                tlv::TLV_INTEREST,
                element.tlv_type
            )));
        }

        let mut name = None;
        let mut nonce = None;
        let mut lifetime_ms = DEFAULT_INTEREST_LIFETIME_MS;
        let mut hop_limit = None;
        let mut can_be_prefix = false;
        let mut must_be_fresh = false;

        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let field = TlvElement::decode(&mut buf)?;
            match field.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&field)?),
                tlv::TLV_CAN_BE_PREFIX => can_be_prefix = true,
                tlv::TLV_MUST_BE_FRESH => must_be_fresh = true,
                tlv::TLV_NONCE => {
                    if field.value.len() != 4 {
                        return Err(Error::Packet("Nonce must be 4 bytes".into()));
                    }
                    let mut v = field.value.clone();
                    nonce = Some(v.get_u32());
                }
                tlv::TLV_INTEREST_LIFETIME => lifetime_ms = field.as_nonneg_integer()?,
                tlv::TLV_HOP_LIMIT => {
                    if field.value.len() != 1 {
                        return Err(Error::Packet("HopLimit must be 1 byte".into()));
                    }
                    hop_limit = Some(field.value[0]);
                }
                // Skip unrecognized fields
                _ => {}
            }
        }

        let name = name.ok_or_else(|| Error::Packet("Interest is missing a Name".into()))?;
        if name.is_empty() {
            return Err(Error::Packet("Interest name must be non-empty".into()));
        }

        Ok(Self {
            name,
            nonce,
            lifetime_ms,
            hop_limit,
            can_be_prefix,
            must_be_fresh,
        })
    }

    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.to_tlv().encode(&mut buf);
        buf.freeze()
    }

    pub fn from_wire(wire: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(wire);
        let element = TlvElement::decode(&mut buf)?;
        Self::from_tlv(&element)
    }
}

/* ---------------------------------------------------------------- *\
 * Data
\* ---------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,
    pub content: Bytes,
    /// How long the Data counts as fresh after arrival; 0 means
    /// immediately stale.
    pub freshness_period_ms: u64,
    /// Opaque signature bytes; content verification is not performed here.
    pub signature: Option<Bytes>,
}

impl Data {
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content: content.into(),
            freshness_period_ms: 0,
            signature: None,
        }
    }

    pub fn with_freshness_period(mut self, freshness_period_ms: u64) -> Self {
        self.freshness_period_ms = freshness_period_ms;
        self
    }

    pub fn with_signature(mut self, signature: impl Into<Bytes>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        self.name.to_tlv().encode(&mut buf);
        if self.freshness_period_ms != 0 {
            let mut meta = BytesMut::new();
            TlvElement::from_nonneg_integer(tlv::TLV_FRESHNESS_PERIOD, self.freshness_period_ms)
                .encode(&mut meta);
            TlvElement::new(tlv::TLV_META_INFO, meta.freeze()).encode(&mut buf);
        }
        TlvElement::new(tlv::TLV_CONTENT, self.content.clone()).encode(&mut buf);
        if let Some(signature) = &self.signature {
            TlvElement::new(tlv::TLV_SIGNATURE_VALUE, signature.clone()).encode(&mut buf);
        }
        TlvElement::new(tlv::TLV_DATA, buf.freeze())
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_DATA {
            return Err(Error::Packet(format!(
                "Expected Data TLV type {}, got {}",
                tlv::TLV_DATA,
                element.tlv_type
            )));
        }

        let mut name = None;
        let mut content = Bytes::new();
        let mut freshness_period_ms = 0;
        let mut signature = None;

        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let field = TlvElement::decode(&mut buf)?;
            match field.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&field)?),
                tlv::TLV_META_INFO => {
                    let mut meta = field.value.clone();
                    while meta.has_remaining() {
                        let inner = TlvElement::decode(&mut meta)?;
                        if inner.tlv_type == tlv::TLV_FRESHNESS_PERIOD {
                            freshness_period_ms = inner.as_nonneg_integer()?;
                        }
                    }
                }
                tlv::TLV_CONTENT => content = field.value.clone(),
                tlv::TLV_SIGNATURE_VALUE => signature = Some(field.value.clone()),
                _ => {}
            }
        }

        let name = name.ok_or_else(|| Error::Packet("Data is missing a Name".into()))?;
        if name.is_empty() {
            return Err(Error::Packet("Data name must be non-empty".into()));
        }

        Ok(Self {
            name,
            content,
            freshness_period_ms,
            signature,
        })
    }

    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.to_tlv().encode(&mut buf);
        buf.freeze()
    }

    pub fn from_wire(wire: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(wire);
        let element = TlvElement::decode(&mut buf)?;
        Self::from_tlv(&element)
    }
}

/* ---------------------------------------------------------------- *\
 * Nack
\* ---------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NackReason {
    Congestion = 50,
    Duplicate = 100,
    NoRoute = 150,
}

impl NackReason {
    fn from_code(code: u64) -> Result<Self, Error> {
        match code {
            50 => Ok(Self::Congestion),
            100 => Ok(Self::Duplicate),
            150 => Ok(Self::NoRoute),
            other => Err(Error::Packet(format!("Unknown Nack reason code {}", other))),
        }
    }
}

impl std::fmt::Display for NackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Congestion => write!(f, "Congestion"),
            Self::Duplicate => write!(f, "Duplicate"),
            Self::NoRoute => write!(f, "NoRoute"),
        }
    }
}

/// A negative acknowledgement carrying back the Interest it rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nack {
    pub reason: NackReason,
    pub interest: Interest,
}

impl Nack {
    pub fn new(reason: NackReason, interest: Interest) -> Self {
        Self { reason, interest }
    }

    fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        TlvElement::from_nonneg_integer(tlv::TLV_NACK_REASON, self.reason as u8 as u64)
            .encode(&mut buf);
        self.interest.to_tlv().encode(&mut buf);
        TlvElement::new(tlv::TLV_NACK, buf.freeze())
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_NACK {
            return Err(Error::Packet(format!(
                "Expected Nack TLV type {}, got {}",
                tlv::TLV_NACK,
                element.tlv_type
            )));
        }

        let mut reason = None;
        let mut interest = None;

        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let field = TlvElement::decode(&mut buf)?;
            match field.tlv_type {
                tlv::TLV_NACK_REASON => {
                    reason = Some(NackReason::from_code(field.as_nonneg_integer()?)?)
                }
                tlv::TLV_INTEREST => interest = Some(Interest::from_tlv(&field)?),
                _ => {}
            }
        }

        Ok(Self {
            reason: reason.ok_or_else(|| Error::Packet("Nack is missing a reason".into()))?,
            interest: interest
                .ok_or_else(|| Error::Packet("Nack is missing an Interest".into()))?,
        })
    }

    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.to_tlv().encode(&mut buf);
        buf.freeze()
    }
}

/* ---------------------------------------------------------------- *\
 * Packet
\* ---------------------------------------------------------------- */

/// Any packet a face can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Interest(Interest),
    Data(Data),
    Nack(Nack),
}

impl Packet {
    pub fn to_wire(&self) -> Bytes {
        match self {
            Self::Interest(interest) => interest.to_wire(),
            Self::Data(data) => data.to_wire(),
            Self::Nack(nack) => nack.to_wire(),
        }
    }

    pub fn from_wire(wire: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(wire);
        let element = TlvElement::decode(&mut buf)?;
        match element.tlv_type {
            tlv::TLV_INTEREST => Ok(Self::Interest(Interest::from_tlv(&element)?)),
            tlv::TLV_DATA => Ok(Self::Data(Data::from_tlv(&element)?)),
            tlv::TLV_NACK => Ok(Self::Nack(Nack::from_tlv(&element)?)),
            other => Err(Error::Packet(format!("Unknown packet TLV type {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_roundtrip() {
        let interest = Interest::new(Name::from_string("/test/interest"))
            .with_nonce(42)
            .with_lifetime(2000)
            .with_hop_limit(32)
            .with_can_be_prefix(true)
            .with_must_be_fresh(true);

        let wire = interest.to_wire();
        let parsed = Interest::from_wire(&wire).unwrap();

        assert_eq!(parsed, interest);
    }

    #[test]
    fn test_interest_defaults() {
        // No nonce, default lifetime, no hop limit: the optional fields
        // stay off the wire.
        let interest = Interest::new(Name::from_string("/a"));
        let parsed = Interest::from_wire(&interest.to_wire()).unwrap();

        assert_eq!(parsed.nonce, None);
        assert_eq!(parsed.lifetime_ms, DEFAULT_INTEREST_LIFETIME_MS);
        assert_eq!(parsed.hop_limit, None);
        assert!(!parsed.can_be_prefix);
        assert!(!parsed.must_be_fresh);
    }

    #[test]
    fn test_data_roundtrip() {
        let data = Data::new(Name::from_string("/test/data"), &b"Hello, NDN!"[..])
            .with_freshness_period(10_000)
            .with_signature(vec![0u8; 32]);

        let wire = data.to_wire();
        let parsed = Data::from_wire(&wire).unwrap();

        assert_eq!(parsed, data);
    }

    #[test]
    fn test_nack_roundtrip() {
        let interest = Interest::new(Name::from_string("/a/b")).with_nonce(0x11);
        let nack = Nack::new(NackReason::Duplicate, interest);

        let wire = nack.to_wire();
        match Packet::from_wire(&wire).unwrap() {
            Packet::Nack(parsed) => assert_eq!(parsed, nack),
            other => panic!("expected Nack, got {:?}", other),
        }
    }

    #[test]
    fn test_packet_dispatch() {
        let interest = Interest::new(Name::from_string("/x")).with_nonce(1);
        match Packet::from_wire(&interest.to_wire()).unwrap() {
            Packet::Interest(parsed) => assert_eq!(parsed.name, interest.name),
            other => panic!("expected Interest, got {:?}", other),
        }

        let data = Data::new(Name::from_string("/x"), &b"payload"[..]);
        match Packet::from_wire(&data.to_wire()).unwrap() {
            Packet::Data(parsed) => assert_eq!(parsed.content, data.content),
            other => panic!("expected Data, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_packets() {
        // Unknown outer type
        assert!(Packet::from_wire(&[0x70, 0x00]).is_err());
        // Interest without a name
        assert!(Interest::from_wire(&[tlv::TLV_INTEREST, 0x00]).is_err());
        // Truncated wire
        let wire = Interest::new(Name::from_string("/a")).to_wire();
        assert!(Packet::from_wire(&wire[..wire.len() - 1]).is_err());
    }
}
