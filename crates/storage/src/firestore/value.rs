use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{FieldValue, Fields, StorageError};

/// Wire form of a single document field.
///
/// The REST API tags every value with its type and carries 64-bit integers
/// as strings, so this enum exists purely to translate between that JSON
/// shape and [`FieldValue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum ApiValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    ArrayValue {
        #[serde(default)]
        values: Vec<ApiValue>,
    },
    MapValue {
        #[serde(default)]
        fields: BTreeMap<String, ApiValue>,
    },
}

impl ApiValue {
    pub(super) fn encode(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => Self::NullValue(()),
            FieldValue::Bool(b) => Self::BooleanValue(*b),
            FieldValue::Int(i) => Self::IntegerValue(i.to_string()),
            FieldValue::Double(d) => Self::DoubleValue(*d),
            FieldValue::Str(s) => Self::StringValue(s.clone()),
            FieldValue::Timestamp(ts) => Self::TimestampValue(*ts),
            FieldValue::Array(items) => Self::ArrayValue {
                values: items.iter().map(Self::encode).collect(),
            },
            FieldValue::Map(fields) => Self::MapValue {
                fields: encode_fields(fields),
            },
        }
    }

    pub(super) fn decode(self) -> Result<FieldValue, StorageError> {
        Ok(match self {
            Self::NullValue(()) => FieldValue::Null,
            Self::BooleanValue(b) => FieldValue::Bool(b),
            Self::IntegerValue(raw) => FieldValue::Int(raw.parse().map_err(|_| {
                StorageError::Serialization(format!("bad integer value: {raw:?}"))
            })?),
            Self::DoubleValue(d) => FieldValue::Double(d),
            Self::TimestampValue(ts) => FieldValue::Timestamp(ts),
            Self::StringValue(s) => FieldValue::Str(s),
            Self::ArrayValue { values } => FieldValue::Array(
                values
                    .into_iter()
                    .map(Self::decode)
                    .collect::<Result<_, _>>()?,
            ),
            Self::MapValue { fields } => FieldValue::Map(decode_fields(fields)?),
        })
    }
}

pub(super) fn encode_fields(fields: &Fields) -> BTreeMap<String, ApiValue> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), ApiValue::encode(value)))
        .collect()
}

pub(super) fn decode_fields(fields: BTreeMap<String, ApiValue>) -> Result<Fields, StorageError> {
    fields
        .into_iter()
        .map(|(name, value)| Ok((name, value.decode()?)))
        .collect()
}
