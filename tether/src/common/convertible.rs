use std::collections::BTreeMap;

use crate::common::{Document, DocumentId, Value};
use crate::errors::{ErrorKind, TetherError, TetherResult};

/// Conversion between a Rust type and its [Value] representation.
///
/// Entities convert to a [`Value::Document`]; field types convert to
/// whatever variant fits them. The trait is usually derived with
/// `#[derive(Convertible)]` from `tether_derive`.
pub trait Convertible {
    fn to_value(&self) -> TetherResult<Value>;

    fn from_value(value: &Value) -> TetherResult<Self>
    where
        Self: Sized;
}

/// Converts a value into `T`; used by the derived implementations.
pub fn from_value<T: Convertible>(value: &Value) -> TetherResult<T> {
    T::from_value(value)
}

/// Encodes `value` and requires the result to be a document.
pub fn to_document<T: Convertible + ?Sized>(value: &T) -> TetherResult<Document> {
    match value.to_value()? {
        Value::Document(doc) => Ok(doc),
        other => {
            log::error!("Value {} is not a document", other);
            Err(TetherError::new(
                &format!("Expected a document but found {}", other.type_name()),
                ErrorKind::ObjectMappingError,
            ))
        }
    }
}

fn mapping_error(expected: &str, value: &Value) -> TetherError {
    log::error!("Value {} is not {}", value, expected);
    TetherError::new(
        &format!("Value of type {} is not {}", value.type_name(), expected),
        ErrorKind::ObjectMappingError,
    )
}

macro_rules! impl_convertible_for_int {
    ($($t:ty),*) => {
        $(
            impl Convertible for $t {
                fn to_value(&self) -> TetherResult<Value> {
                    Ok(Value::I64(i64::from(*self)))
                }

                fn from_value(value: &Value) -> TetherResult<Self> {
                    match value {
                        Value::I64(i) => Ok(<$t>::try_from(*i)?),
                        _ => Err(mapping_error(concat!("an ", stringify!($t)), value)),
                    }
                }
            }
        )*
    };
}

impl_convertible_for_int!(i8, i16, i32, i64, u8, u16, u32);

impl Convertible for u64 {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::I64(i64::try_from(*self)?))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::I64(i) => Ok(u64::try_from(*i)?),
            _ => Err(mapping_error("a u64", value)),
        }
    }
}

impl Convertible for usize {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::I64(i64::try_from(*self)?))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::I64(i) => Ok(usize::try_from(*i)?),
            _ => Err(mapping_error("a usize", value)),
        }
    }
}

impl Convertible for f64 {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        value.as_f64().ok_or_else(|| mapping_error("an f64", value))
    }
}

impl Convertible for f32 {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::F64(f64::from(*self)))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| mapping_error("an f32", value))
    }
}

impl Convertible for bool {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        value.as_bool().ok_or_else(|| mapping_error("a bool", value))
    }
}

impl Convertible for String {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            // ids are often kept as strings by callers that don't care about the type
            Value::Id(id) => Ok(id.to_string()),
            _ => Err(mapping_error("a string", value)),
        }
    }
}

impl Convertible for DocumentId {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::Id(*self))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::Id(id) => Ok(*id),
            Value::String(s) => s.parse(),
            _ => Err(mapping_error("a document id", value)),
        }
    }
}

impl Convertible for Value {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        Ok(value.clone())
    }
}

impl Convertible for Document {
    fn to_value(&self) -> TetherResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::Document(doc) => Ok(doc.clone()),
            _ => Err(mapping_error("a document", value)),
        }
    }
}

impl<T: Convertible> Convertible for Option<T> {
    fn to_value(&self) -> TetherResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T: Convertible> Convertible for Vec<T> {
    fn to_value(&self) -> TetherResult<Value> {
        let values = self
            .iter()
            .map(|item| item.to_value())
            .collect::<TetherResult<Vec<Value>>>()?;
        Ok(Value::Array(values))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::Array(array) => array.iter().map(T::from_value).collect(),
            // an absent list decodes as empty
            Value::Null => Ok(Vec::new()),
            _ => Err(mapping_error("an array", value)),
        }
    }
}

impl<T: Convertible> Convertible for BTreeMap<String, T> {
    fn to_value(&self) -> TetherResult<Value> {
        let mut doc = Document::new();
        for (key, item) in self {
            doc.put(key, item.to_value()?)?;
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        match value {
            Value::Document(doc) => doc
                .iter()
                .map(|(key, item)| Ok((key.clone(), T::from_value(item)?)))
                .collect(),
            Value::Null => Ok(BTreeMap::new()),
            _ => Err(mapping_error("a document", value)),
        }
    }
}
