//! JSON-to-domain decode layer: decode errors, optional-field access, the
//! timestamp codec, and type-driven dispatch.

use crate::{Attachment, Match, Participant, Tournament};
use chrono::{DateTime, FixedOffset};
use log::debug;
use serde_json::Value;
use std::fmt;

pub type DecodeResult<T> = Result<T, DecodeError>;

/// A raw JSON object as received from the service, field order preserved.
pub type RawRecord = serde_json::Map<String, Value>;

/// Why a payload could not be adapted. Every variant is a contract violation
/// between the service and these bindings; nothing here is retried or
/// recovered, the immediate caller decides what to do with the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The raw value is not the JSON shape the target type requires.
    SchemaMismatch {
        expected: &'static str,
        found: String,
    },
    /// A field the schema marks mandatory was absent or null.
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
    /// A present timestamp field does not parse as ISO-8601 with offset.
    MalformedTimestamp(String),
    /// Tagged dispatch met a wire tag with no registered adapter.
    UnsupportedType(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::SchemaMismatch { expected, found } => {
                write!(f, "schema mismatch: expected {expected}, found {found}")
            }
            DecodeError::MissingField { entity, field } => {
                write!(f, "{entity} record is missing required field `{field}`")
            }
            DecodeError::MalformedTimestamp(raw) => write!(f, "malformed timestamp: {raw}"),
            DecodeError::UnsupportedType(tag) => {
                write!(f, "no adapter registered for payload tag `{tag}`")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn mismatch(expected: &'static str, value: &Value) -> DecodeError {
    DecodeError::SchemaMismatch {
        expected,
        found: json_type(value).to_string(),
    }
}

// ---------------------------------------------------------------------------
// Optional-field access — the one place absent/null is resolved
// ---------------------------------------------------------------------------

/// Resolve a field of a raw record. Absent and explicit JSON null both come
/// back as `None`; a present value is returned untouched for typed
/// extraction. Every field read in the crate goes through here.
pub fn field<'a>(record: &'a RawRecord, name: &str) -> Option<&'a Value> {
    match record.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// Typed view over one entity's raw record.
pub struct Fields<'a> {
    record: &'a RawRecord,
    entity: &'static str,
    ctx: &'a Adapters,
}

impl<'a> Fields<'a> {
    pub fn new(record: &'a RawRecord, entity: &'static str, ctx: &'a Adapters) -> Self {
        Self { record, entity, ctx }
    }

    /// Read a field the schema marks mandatory. Absent or null fails with
    /// [`DecodeError::MissingField`] naming the field.
    pub fn require<T: Decode>(&self, name: &'static str) -> DecodeResult<T> {
        match field(self.record, name) {
            Some(value) => T::decode(value, self.ctx),
            None => Err(DecodeError::MissingField {
                entity: self.entity,
                field: name,
            }),
        }
    }

    /// Read an optional field. Absent or null is `Ok(None)`.
    pub fn optional<T: Decode>(&self, name: &str) -> DecodeResult<Option<T>> {
        field(self.record, name)
            .map(|value| T::decode(value, self.ctx))
            .transpose()
    }

    /// Read an embedded entity collection. Absent or null decodes as empty;
    /// a present array keeps its length and order.
    pub fn embedded<T: Decode>(&self, name: &str) -> DecodeResult<Vec<T>> {
        match field(self.record, name) {
            Some(value) => Vec::<T>::decode(value, self.ctx),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamps — ISO-8601 with explicit UTC offset, e.g. 2018-07-06T10:15:00+02:00
// ---------------------------------------------------------------------------

pub fn parse_timestamp(raw: &str) -> DecodeResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .map_err(|_| DecodeError::MalformedTimestamp(raw.to_owned()))
}

/// Inverse of [`parse_timestamp`]: the output always round-trips to an equal
/// instant.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339()
}

// ---------------------------------------------------------------------------
// Type-driven dispatch
// ---------------------------------------------------------------------------

/// Conversion from a raw JSON value to a typed instance. Implementations
/// exist for the structural primitives, for `Option<T>` and `Vec<T>`
/// (dispatching each contained value to `T`), for timestamps, and for every
/// domain entity; the entity impls are the adapters in [`crate::adapters`].
pub trait Decode: Sized {
    fn decode(value: &Value, ctx: &Adapters) -> DecodeResult<Self>;
}

impl Decode for String {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl Decode for bool {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("boolean", value))
    }
}

impl Decode for u64 {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        value
            .as_u64()
            .ok_or_else(|| mismatch("unsigned integer", value))
    }
}

impl Decode for u32 {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| mismatch("unsigned 32-bit integer", value))
    }
}

impl Decode for i64 {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        value.as_i64().ok_or_else(|| mismatch("integer", value))
    }
}

impl Decode for i32 {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| mismatch("32-bit integer", value))
    }
}

impl Decode for f64 {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        value.as_f64().ok_or_else(|| mismatch("number", value))
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &Value, ctx: &Adapters) -> DecodeResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other, ctx).map(Some),
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &Value, ctx: &Adapters) -> DecodeResult<Self> {
        match value {
            Value::Array(items) => items.iter().map(|item| T::decode(item, ctx)).collect(),
            other => Err(mismatch("array", other)),
        }
    }
}

impl Decode for DateTime<FixedOffset> {
    fn decode(value: &Value, _ctx: &Adapters) -> DecodeResult<Self> {
        match value {
            Value::String(raw) => parse_timestamp(raw),
            // Per the timestamp contract a present-but-unparseable value is a
            // timestamp error, whatever its JSON type.
            other => Err(DecodeError::MalformedTimestamp(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tagged dispatch — the closed adapter registry
// ---------------------------------------------------------------------------

/// Wire tag of a decodable entity. The service wraps every entity in a
/// single-key envelope carrying one of these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Tournament,
    Participant,
    Match,
    Attachment,
}

impl EntityKind {
    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Tournament => "tournament",
            EntityKind::Participant => "participant",
            EntityKind::Match => "match",
            EntityKind::Attachment => "match_attachment",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "tournament" => Some(EntityKind::Tournament),
            "participant" => Some(EntityKind::Participant),
            "match" => Some(EntityKind::Match),
            "match_attachment" => Some(EntityKind::Attachment),
            _ => None,
        }
    }
}

/// A decoded entity of a kind known only at runtime, from tagged dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Tournament(Tournament),
    Participant(Participant),
    Match(Match),
    Attachment(Attachment),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Tournament(_) => EntityKind::Tournament,
            Entity::Participant(_) => EntityKind::Participant,
            Entity::Match(_) => EntityKind::Match,
            Entity::Attachment(_) => EntityKind::Attachment,
        }
    }
}

type AdapterFn = fn(&Value, &Adapters) -> DecodeResult<Entity>;

/// Deserialization context: the closed table of entity adapters. Built once,
/// read-only afterwards, and safe to share across threads (dispatch only
/// reads the table and allocates fresh output per call).
pub struct Adapters {
    table: [(EntityKind, AdapterFn); 4],
}

impl Adapters {
    pub fn new() -> Self {
        Self {
            table: [
                (EntityKind::Tournament, |value, ctx| {
                    Tournament::decode(value, ctx).map(Entity::Tournament)
                }),
                (EntityKind::Participant, |value, ctx| {
                    Participant::decode(value, ctx).map(Entity::Participant)
                }),
                (EntityKind::Match, |value, ctx| {
                    Match::decode(value, ctx).map(Entity::Match)
                }),
                (EntityKind::Attachment, |value, ctx| {
                    Attachment::decode(value, ctx).map(Entity::Attachment)
                }),
            ],
        }
    }

    /// Decode a raw value as the statically requested type.
    pub fn decode<T: Decode>(&self, value: &Value) -> DecodeResult<T> {
        T::decode(value, self)
    }

    /// Decode a wrapped payload by its envelope tag. The value must be a
    /// single-key object; an unrecognized tag fails with
    /// [`DecodeError::UnsupportedType`].
    pub fn decode_tagged(&self, value: &Value) -> DecodeResult<Entity> {
        let record = value
            .as_object()
            .ok_or_else(|| mismatch("tagged entity object", value))?;
        let mut keys = record.keys();
        let tag = match (keys.next(), keys.next()) {
            (Some(tag), None) => tag.as_str(),
            _ => {
                return Err(DecodeError::SchemaMismatch {
                    expected: "object with a single entity tag",
                    found: format!("object with {} keys", record.len()),
                });
            }
        };
        debug!("dispatching payload tagged `{tag}`");
        let kind = EntityKind::from_tag(tag)
            .ok_or_else(|| DecodeError::UnsupportedType(tag.to_owned()))?;
        let adapter = self
            .table
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, run)| *run)
            .ok_or_else(|| DecodeError::UnsupportedType(tag.to_owned()))?;
        adapter(value, self)
    }

    /// Decode an array of wrapped payloads, preserving order. This is the
    /// shape of the service's index endpoints.
    pub fn decode_tagged_list(&self, value: &Value) -> DecodeResult<Vec<Entity>> {
        match value {
            Value::Array(items) => items.iter().map(|item| self.decode_tagged(item)).collect(),
            other => Err(mismatch("array", other)),
        }
    }
}

impl Default for Adapters {
    fn default() -> Self {
        Self::new()
    }
}
