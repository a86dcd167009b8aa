//! Inner transaction model and its canonical byte encoding.
//!
//! The encrypted payload is compact JSON with a fixed key order:
//!
//! ```text
//! {"type":..,"from":..,"nonce":..,"gas":..,"fee":..,"bid":..,"fee_recipient":..}
//! ```
//!
//! Every optional field is written with its default (`0` or `""`). The
//! ciphertext and tag depend on these exact bytes, so the encoding is
//! written by hand rather than left to a generic serializer.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TxError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("malformed inner transaction at line {line}, column {column}")]
    Malformed { line: usize, column: usize },
    #[error("unsupported private payload type")]
    UnsupportedKind,
}

/// Payload kinds that may travel inside a private envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    #[default]
    #[serde(rename = "plaintext_v1")]
    PlaintextV1,
    #[serde(rename = "auction_bid_v1")]
    AuctionBidV1,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlaintextV1 => "plaintext_v1",
            Self::AuctionBidV1 => "auction_bid_v1",
        }
    }

    /// Decoder-side lookup. An empty string means plaintext.
    pub fn from_wire(s: &str) -> Result<Self, TxError> {
        match s {
            "" | "plaintext_v1" => Ok(Self::PlaintextV1),
            "auction_bid_v1" => Ok(Self::AuctionBidV1),
            _ => Err(TxError::UnsupportedKind),
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outer envelope type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    #[serde(rename = "plaintext_v1")]
    PlaintextV1,
    #[serde(rename = "auction_bid_v1")]
    AuctionBidV1,
    #[serde(rename = "private_v1")]
    PrivateV1,
}

impl TxType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlaintextV1 => "plaintext_v1",
            Self::AuctionBidV1 => "auction_bid_v1",
            Self::PrivateV1 => "private_v1",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied inner transaction. Optional fields take their defaults
/// during [`canonicalize`](Self::canonicalize).
///
/// Numeric fields are `u64`; larger values cannot be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerTransaction {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PayloadKind>,
    pub from: String,
    pub nonce: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_recipient: Option<String>,
}

impl InnerTransaction {
    pub fn new(from: impl Into<String>, nonce: u64) -> Self {
        Self {
            from: from.into(),
            nonce,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: PayloadKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_bid(mut self, bid: u64) -> Self {
        self.bid = Some(bid);
        self
    }

    pub fn with_fee_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.fee_recipient = Some(recipient.into());
        self
    }

    /// Resolve defaults and validate required fields.
    pub fn canonicalize(&self) -> Result<CanonicalTx, TxError> {
        if self.from.is_empty() {
            return Err(TxError::MissingField("from"));
        }
        Ok(CanonicalTx {
            kind: self.kind.unwrap_or_default(),
            from: self.from.clone(),
            nonce: self.nonce,
            gas: self.gas.unwrap_or(0),
            fee: self.fee.unwrap_or(0),
            bid: self.bid.unwrap_or(0),
            fee_recipient: self.fee_recipient.clone().unwrap_or_default(),
        })
    }
}

/// Fully defaulted inner transaction, the exact content that gets encrypted.
///
/// Field order here matches the wire order, so the serde output of this
/// struct and [`to_bytes`](Self::to_bytes) agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalTx {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub from: String,
    pub nonce: u64,
    pub gas: u64,
    pub fee: u64,
    pub bid: u64,
    pub fee_recipient: String,
}

/// Decoder view: every field optional, unknown keys ignored.
#[derive(Deserialize)]
struct WireInner {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    nonce: u64,
    #[serde(default)]
    gas: u64,
    #[serde(default)]
    fee: u64,
    #[serde(default)]
    bid: u64,
    #[serde(default)]
    fee_recipient: String,
}

impl CanonicalTx {
    /// Canonical encoding. Infallible for any value of this type.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(96 + self.from.len() + self.fee_recipient.len());
        out.push_str("{\"type\":");
        write_json_str(&mut out, self.kind.as_str());
        out.push_str(",\"from\":");
        write_json_str(&mut out, &self.from);
        // write! into a String cannot fail
        let _ = write!(
            out,
            ",\"nonce\":{},\"gas\":{},\"fee\":{},\"bid\":{}",
            self.nonce, self.gas, self.fee, self.bid
        );
        out.push_str(",\"fee_recipient\":");
        write_json_str(&mut out, &self.fee_recipient);
        out.push('}');
        out.into_bytes()
    }

    /// Parse a decrypted payload. Accepts the canonical form and the looser
    /// variants other encoders emit (omitted zero fields, empty `type`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let wire: WireInner = serde_json::from_slice(bytes).map_err(|e| TxError::Malformed {
            line: e.line(),
            column: e.column(),
        })?;
        Ok(Self {
            kind: PayloadKind::from_wire(&wire.kind)?,
            from: wire.from,
            nonce: wire.nonce,
            gas: wire.gas,
            fee: wire.fee,
            bid: wire.bid,
            fee_recipient: wire.fee_recipient,
        })
    }

    /// Map to the concrete payload the kind describes. Fields that the kind
    /// does not carry are dropped.
    pub fn into_payload(self) -> DecodedPayload {
        match self.kind {
            PayloadKind::PlaintextV1 => DecodedPayload::Plaintext(PlaintextTx {
                from: self.from,
                nonce: self.nonce,
                gas: self.gas,
                fee: self.fee,
            }),
            PayloadKind::AuctionBidV1 => DecodedPayload::AuctionBid(AuctionBidTx {
                from: self.from,
                nonce: self.nonce,
                gas: self.gas,
                bid: self.bid,
                fee_recipient: self.fee_recipient,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaintextTx {
    pub from: String,
    pub nonce: u64,
    pub gas: u64,
    pub fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuctionBidTx {
    pub from: String,
    pub nonce: u64,
    pub gas: u64,
    pub bid: u64,
    pub fee_recipient: String,
}

/// A decrypted private payload, typed by its inner kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DecodedPayload {
    #[serde(rename = "plaintext_v1")]
    Plaintext(PlaintextTx),
    #[serde(rename = "auction_bid_v1")]
    AuctionBid(AuctionBidTx),
}

impl DecodedPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Plaintext(_) => PayloadKind::PlaintextV1,
            Self::AuctionBid(_) => PayloadKind::AuctionBidV1,
        }
    }

    pub fn sender(&self) -> &str {
        match self {
            Self::Plaintext(tx) => &tx.from,
            Self::AuctionBid(tx) => &tx.from,
        }
    }

    pub fn nonce(&self) -> u64 {
        match self {
            Self::Plaintext(tx) => tx.nonce,
            Self::AuctionBid(tx) => tx.nonce,
        }
    }
}

/// Quote and escape `s` as a JSON string: `"` and `\` escaped, the usual
/// short escapes for control characters, `\u00XX` (lowercase) for the rest
/// below 0x20, everything else verbatim.
fn write_json_str(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
