//! Protobuf binary wire format over [`Record`] reflection.
//!
//! Known fields are written in declaration order, followed by the record's
//! unknown fields exactly as they were read. Repeated numeric, bool and enum
//! fields are written packed; both packed and unpacked input is accepted.
//! Fields whose number is not declared, or that arrive with a wire type the
//! declared kind cannot use, are kept as unknown fields. Enum numbers are
//! stored as read, whether or not the enum declares them.
//!
//! Malformed input and mismatched wire types are reported as `debug` events.

use bytes::{Buf, BufMut};
use prost::encoding::{
    decode_key, decode_varint, encode_key, encode_varint, encoded_len_varint, key_len, WireType,
};
use thiserror::Error;

use schema::{
    FieldDescriptor, FieldKind, FieldRef, Record, SchemaError, UnknownField, UnknownValue, Value,
    ValueRef,
};

/// Maximum nesting depth of records accepted by the decoder.
pub const RECURSION_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Decode(#[from] prost::DecodeError),

    #[error("unexpected end of input in field {number}")]
    Truncated { number: u32 },

    #[error("field {number} uses the unsupported group encoding")]
    Group { number: u32 },

    #[error("field {field} of {type_name} is not valid UTF-8")]
    InvalidUtf8 {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("records nested deeper than {} levels", RECURSION_LIMIT)]
    RecursionLimit,

    #[error("field {field} of {type_name} holds a value that does not match its {kind} kind")]
    KindMismatch {
        type_name: &'static str,
        field: &'static str,
        kind: &'static str,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type WireResult<T> = Result<T, WireError>;

/// A scalar lowered to its wire representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scalar<'a> {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    Bytes(&'a [u8]),
}

impl Scalar<'_> {
    fn len(&self) -> usize {
        match *self {
            Scalar::Varint(v) => encoded_len_varint(v),
            Scalar::Fixed32(_) => 4,
            Scalar::Fixed64(_) => 8,
            Scalar::Bytes(bytes) => encoded_len_varint(bytes.len() as u64) + bytes.len(),
        }
    }

    fn write(&self, buf: &mut impl BufMut) {
        match *self {
            Scalar::Varint(v) => encode_varint(v, buf),
            Scalar::Fixed32(v) => buf.put_u32_le(v),
            Scalar::Fixed64(v) => buf.put_u64_le(v),
            Scalar::Bytes(bytes) => {
                encode_varint(bytes.len() as u64, buf);
                buf.put_slice(bytes);
            }
        }
    }
}

fn wire_type_of(kind: &FieldKind) -> WireType {
    match kind {
        FieldKind::Double | FieldKind::Fixed64 | FieldKind::SFixed64 => WireType::SixtyFourBit,
        FieldKind::Float | FieldKind::Fixed32 | FieldKind::SFixed32 => WireType::ThirtyTwoBit,
        FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) => WireType::LengthDelimited,
        FieldKind::Int64
        | FieldKind::UInt64
        | FieldKind::Int32
        | FieldKind::UInt32
        | FieldKind::SInt32
        | FieldKind::SInt64
        | FieldKind::Bool
        | FieldKind::Enum(_) => WireType::Varint,
    }
}

fn zigzag32(v: i32) -> u64 {
    u64::from(((v << 1) ^ (v >> 31)) as u32)
}

fn zigzag64(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag32(raw: u64) -> i32 {
    let n = raw as u32;
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

fn unzigzag64(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

/// Lowers a scalar value; `None` when the value does not fit `kind`.
fn lower<'a>(kind: &FieldKind, value: &ValueRef<'a>) -> Option<Scalar<'a>> {
    Some(match (kind, *value) {
        (FieldKind::Double, ValueRef::F64(v)) => Scalar::Fixed64(v.to_bits()),
        (FieldKind::Float, ValueRef::F32(v)) => Scalar::Fixed32(v.to_bits()),
        (FieldKind::Int64, ValueRef::I64(v)) => Scalar::Varint(v as u64),
        (FieldKind::SInt64, ValueRef::I64(v)) => Scalar::Varint(zigzag64(v)),
        (FieldKind::SFixed64, ValueRef::I64(v)) => Scalar::Fixed64(v as u64),
        (FieldKind::UInt64, ValueRef::U64(v)) => Scalar::Varint(v),
        (FieldKind::Fixed64, ValueRef::U64(v)) => Scalar::Fixed64(v),
        // Negative 32-bit values are sign-extended to ten bytes.
        (FieldKind::Int32, ValueRef::I32(v)) => Scalar::Varint(i64::from(v) as u64),
        (FieldKind::SInt32, ValueRef::I32(v)) => Scalar::Varint(zigzag32(v)),
        (FieldKind::SFixed32, ValueRef::I32(v)) => Scalar::Fixed32(v as u32),
        (FieldKind::UInt32, ValueRef::U32(v)) => Scalar::Varint(u64::from(v)),
        (FieldKind::Fixed32, ValueRef::U32(v)) => Scalar::Fixed32(v),
        (FieldKind::Bool, ValueRef::Bool(v)) => Scalar::Varint(u64::from(v)),
        (FieldKind::Enum(_), ValueRef::Enum(v)) => Scalar::Varint(i64::from(v) as u64),
        (FieldKind::String, ValueRef::Str(v)) => Scalar::Bytes(v.as_bytes()),
        (FieldKind::Bytes, ValueRef::Bytes(v)) => Scalar::Bytes(v),
        _ => return None,
    })
}

fn lower_field<'a>(
    record: &dyn Record,
    field: &FieldDescriptor,
    value: &ValueRef<'a>,
) -> WireResult<Scalar<'a>> {
    lower(&field.kind, value).ok_or(WireError::KindMismatch {
        type_name: record.type_name(),
        field: field.name,
        kind: field.kind.name(),
    })
}

fn unknown_len(field: &UnknownField) -> usize {
    key_len(field.number)
        + match &field.value {
            UnknownValue::Varint(v) => encoded_len_varint(*v),
            UnknownValue::Fixed32(_) => 4,
            UnknownValue::Fixed64(_) => 8,
            UnknownValue::LengthDelimited(bytes) => {
                encoded_len_varint(bytes.len() as u64) + bytes.len()
            }
        }
}

fn write_unknown(field: &UnknownField, buf: &mut impl BufMut) {
    let (wire_type, scalar) = match &field.value {
        UnknownValue::Varint(v) => (WireType::Varint, Scalar::Varint(*v)),
        UnknownValue::Fixed32(v) => (WireType::ThirtyTwoBit, Scalar::Fixed32(*v)),
        UnknownValue::Fixed64(v) => (WireType::SixtyFourBit, Scalar::Fixed64(*v)),
        UnknownValue::LengthDelimited(bytes) => (WireType::LengthDelimited, Scalar::Bytes(bytes)),
    };
    encode_key(field.number, wire_type, buf);
    scalar.write(buf);
}

/// Exact number of bytes [`encode`] writes for `record`.
pub fn encoded_len(record: &dyn Record) -> WireResult<usize> {
    let mut len = 0;
    for field in record.descriptor().fields {
        let Some(present) = record.field(field.number) else {
            continue;
        };
        let key = key_len(field.number);
        match present {
            FieldRef::Repeated(values) if field.kind.is_primitive() => {
                let payload = packed_len(record, field, &values)?;
                len += key + encoded_len_varint(payload as u64) + payload;
            }
            present => {
                for value in present.values() {
                    len += key + value_len(record, field, value)?;
                }
            }
        }
    }
    Ok(len + record.unknown_fields().iter().map(unknown_len).sum::<usize>())
}

fn packed_len(record: &dyn Record, field: &FieldDescriptor, values: &[ValueRef<'_>]) -> WireResult<usize> {
    values
        .iter()
        .map(|value| lower_field(record, field, value).map(|scalar| scalar.len()))
        .sum()
}

/// Length of one value without its key.
fn value_len(record: &dyn Record, field: &FieldDescriptor, value: &ValueRef<'_>) -> WireResult<usize> {
    match (field.kind, value) {
        (FieldKind::Message(_), ValueRef::Message(nested)) => {
            let nested_len = encoded_len(*nested)?;
            Ok(encoded_len_varint(nested_len as u64) + nested_len)
        }
        _ => lower_field(record, field, value).map(|scalar| scalar.len()),
    }
}

/// Appends the encoding of `record` to `buf`.
pub fn encode(record: &dyn Record, buf: &mut impl BufMut) -> WireResult<()> {
    for field in record.descriptor().fields {
        let Some(present) = record.field(field.number) else {
            continue;
        };
        match present {
            FieldRef::Repeated(values) if field.kind.is_primitive() => {
                let payload = packed_len(record, field, &values)?;
                encode_key(field.number, WireType::LengthDelimited, buf);
                encode_varint(payload as u64, buf);
                for value in &values {
                    lower_field(record, field, value)?.write(buf);
                }
            }
            present => {
                for value in present.values() {
                    encode_value(record, field, value, buf)?;
                }
            }
        }
    }
    for unknown in record.unknown_fields() {
        write_unknown(unknown, buf);
    }
    Ok(())
}

fn encode_value(
    record: &dyn Record,
    field: &FieldDescriptor,
    value: &ValueRef<'_>,
    buf: &mut impl BufMut,
) -> WireResult<()> {
    encode_key(field.number, wire_type_of(&field.kind), buf);
    match (field.kind, value) {
        (FieldKind::Message(_), ValueRef::Message(nested)) => {
            encode_varint(encoded_len(*nested)? as u64, buf);
            encode(*nested, buf)
        }
        _ => {
            lower_field(record, field, value)?.write(buf);
            Ok(())
        }
    }
}

/// Clears `record` and decodes `bytes` into it.
pub fn decode(record: &mut dyn Record, bytes: &[u8]) -> WireResult<()> {
    record.clear();
    merge(record, bytes)
}

/// Decodes `bytes` into `record` on top of its current contents.
///
/// Singular fields read later overwrite earlier ones, repeated fields append
/// and nested records merge, as protobuf parsers do.
pub fn merge(record: &mut dyn Record, bytes: &[u8]) -> WireResult<()> {
    let type_name = record.type_name();
    merge_at_depth(record, bytes, 0).map_err(|err| {
        tracing::debug!(type_name, error = %err, "malformed record encoding");
        err
    })
}

fn merge_at_depth(record: &mut dyn Record, mut buf: &[u8], depth: usize) -> WireResult<()> {
    if depth > RECURSION_LIMIT {
        return Err(WireError::RecursionLimit);
    }
    let descriptor = record.descriptor();
    while buf.has_remaining() {
        let (number, wire_type) = decode_key(&mut buf)?;
        if matches!(wire_type, WireType::StartGroup | WireType::EndGroup) {
            return Err(WireError::Group { number });
        }

        let Some(field) = descriptor.field_by_number(number) else {
            let value = read_unknown(number, wire_type, &mut buf)?;
            record.unknown_fields_mut().push(number, value);
            continue;
        };

        let expected = wire_type_of(&field.kind);
        if wire_type == expected {
            read_field(record, field, wire_type, &mut buf, depth)?;
        } else if wire_type == WireType::LengthDelimited
            && field.is_repeated()
            && field.kind.is_primitive()
        {
            let mut packed = take(number, &mut buf)?;
            while packed.has_remaining() {
                read_field(record, field, expected, &mut packed, depth)?;
            }
        } else {
            let value = read_unknown(number, wire_type, &mut buf)?;
            tracing::debug!(
                type_name = descriptor.full_name,
                field = field.name,
                ?wire_type,
                "wire type does not match field kind, keeping as unknown"
            );
            record.unknown_fields_mut().push(number, value);
        }
    }
    Ok(())
}

fn read_field(
    record: &mut dyn Record,
    field: &FieldDescriptor,
    wire_type: WireType,
    buf: &mut &[u8],
    depth: usize,
) -> WireResult<()> {
    let number = field.number;
    let value = match (field.kind, wire_type) {
        (FieldKind::Message(_), _) => {
            let bytes = take(number, buf)?;
            let nested = record.message_mut(number)?;
            return merge_at_depth(nested, bytes, depth + 1);
        }
        (kind, WireType::Varint) => {
            let raw = decode_varint(buf)?;
            match kind {
                FieldKind::Int64 => Value::I64(raw as i64),
                FieldKind::UInt64 => Value::U64(raw),
                FieldKind::Int32 => Value::I32(raw as i32),
                FieldKind::UInt32 => Value::U32(raw as u32),
                FieldKind::SInt32 => Value::I32(unzigzag32(raw)),
                FieldKind::SInt64 => Value::I64(unzigzag64(raw)),
                FieldKind::Bool => Value::Bool(raw != 0),
                _ => Value::Enum(raw as i32),
            }
        }
        (kind, WireType::ThirtyTwoBit) => {
            if buf.remaining() < 4 {
                return Err(WireError::Truncated { number });
            }
            let raw = buf.get_u32_le();
            match kind {
                FieldKind::Float => Value::F32(f32::from_bits(raw)),
                FieldKind::SFixed32 => Value::I32(raw as i32),
                _ => Value::U32(raw),
            }
        }
        (kind, WireType::SixtyFourBit) => {
            if buf.remaining() < 8 {
                return Err(WireError::Truncated { number });
            }
            let raw = buf.get_u64_le();
            match kind {
                FieldKind::Double => Value::F64(f64::from_bits(raw)),
                FieldKind::SFixed64 => Value::I64(raw as i64),
                _ => Value::U64(raw),
            }
        }
        (FieldKind::String, _) => {
            let bytes = take(number, buf)?;
            let text = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 {
                type_name: record.type_name(),
                field: field.name,
            })?;
            Value::String(text.to_owned())
        }
        (_, _) => Value::Bytes(take(number, buf)?.to_vec()),
    };
    record.set_field(number, value)?;
    Ok(())
}

fn read_unknown(number: u32, wire_type: WireType, buf: &mut &[u8]) -> WireResult<UnknownValue> {
    Ok(match wire_type {
        WireType::Varint => UnknownValue::Varint(decode_varint(buf)?),
        WireType::ThirtyTwoBit => {
            if buf.remaining() < 4 {
                return Err(WireError::Truncated { number });
            }
            UnknownValue::Fixed32(buf.get_u32_le())
        }
        WireType::SixtyFourBit => {
            if buf.remaining() < 8 {
                return Err(WireError::Truncated { number });
            }
            UnknownValue::Fixed64(buf.get_u64_le())
        }
        WireType::LengthDelimited => UnknownValue::LengthDelimited(take(number, buf)?.to_vec()),
        WireType::StartGroup | WireType::EndGroup => return Err(WireError::Group { number }),
    })
}

/// Splits a length-prefixed payload off the front of `buf`.
fn take<'a>(number: u32, buf: &mut &'a [u8]) -> WireResult<&'a [u8]> {
    let len = decode_varint(buf)?;
    let len = usize::try_from(len).map_err(|_| WireError::Truncated { number })?;
    if len > buf.len() {
        return Err(WireError::Truncated { number });
    }
    let (payload, rest) = buf.split_at(len);
    *buf = rest;
    Ok(payload)
}
