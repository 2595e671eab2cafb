//! Hand-written protobuf types for the snapshot payload.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Only populated slots are written; a restored occupation starts from a
//! fresh schema instance, so absent slots come back null.

use prost::Message;

// ── Occupation ─────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoOccupation {
    #[prost(string, tag = "1")]
    pub occupation_id: String,
    #[prost(string, tag = "2")]
    pub occupation_name: String,
    #[prost(message, repeated, tag = "3")]
    pub values: Vec<ProtoScaleValue>,
}

// ── Scale Value ────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoScaleValue {
    #[prost(string, tag = "1")]
    pub element_id: String,
    #[prost(string, tag = "2")]
    pub scale_id: String,
    #[prost(double, tag = "3")]
    pub value: f64,
    #[prost(enumeration = "ValueKind", tag = "4")]
    pub kind: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ValueKind {
    Category = 0,
    Rating = 1,
}
