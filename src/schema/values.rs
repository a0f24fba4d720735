//! Member value contracts
//!
//! Document members are read through these traits so that the set of
//! supported member kinds is closed at compile time: a field whose type does
//! not implement `IndexValue` cannot be registered as an index member.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::core::{DataType, IdType, StructureId, Value};

/// A scalar member that can be stored in the indexes table.
pub trait IndexValue: Send + Sync + 'static {
    const DATA_TYPE: DataType;

    fn to_value(&self) -> Value;
}

macro_rules! integer_index_value {
    ($($ty:ty),*) => {
        $(
            impl IndexValue for $ty {
                const DATA_TYPE: DataType = DataType::Integer;

                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }
            }
        )*
    };
}

integer_index_value!(i8, i16, i32, i64, u8, u16, u32);

impl IndexValue for f32 {
    const DATA_TYPE: DataType = DataType::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl IndexValue for f64 {
    const DATA_TYPE: DataType = DataType::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl IndexValue for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl IndexValue for String {
    const DATA_TYPE: DataType = DataType::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl IndexValue for DateTime<Utc> {
    const DATA_TYPE: DataType = DataType::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl IndexValue for Uuid {
    const DATA_TYPE: DataType = DataType::Uuid;

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl<V: IndexValue> IndexValue for Option<V> {
    const DATA_TYPE: DataType = V::DATA_TYPE;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, IndexValue::to_value)
    }
}

/// A member usable as the document identity.
pub trait IdValue: Send + Sync + Sized + 'static {
    const ID_TYPE: IdType;

    fn to_structure_id(&self) -> StructureId;

    /// `None` when `id` is of another identity kind or out of range.
    fn from_structure_id(id: &StructureId) -> Option<Self>;
}

impl IdValue for i64 {
    const ID_TYPE: IdType = IdType::Identity;

    fn to_structure_id(&self) -> StructureId {
        StructureId::Identity(*self)
    }

    fn from_structure_id(id: &StructureId) -> Option<Self> {
        match id {
            StructureId::Identity(i) => Some(*i),
            _ => None,
        }
    }
}

impl IdValue for i32 {
    const ID_TYPE: IdType = IdType::Identity;

    fn to_structure_id(&self) -> StructureId {
        StructureId::Identity(i64::from(*self))
    }

    fn from_structure_id(id: &StructureId) -> Option<Self> {
        match id {
            StructureId::Identity(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl IdValue for Uuid {
    const ID_TYPE: IdType = IdType::Guid;

    fn to_structure_id(&self) -> StructureId {
        StructureId::Guid(*self)
    }

    fn from_structure_id(id: &StructureId) -> Option<Self> {
        match id {
            StructureId::Guid(g) => Some(*g),
            _ => None,
        }
    }
}

impl IdValue for String {
    const ID_TYPE: IdType = IdType::String;

    fn to_structure_id(&self) -> StructureId {
        StructureId::String(self.clone())
    }

    fn from_structure_id(id: &StructureId) -> Option<Self> {
        match id {
            StructureId::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<V: IdValue> IdValue for Option<V> {
    const ID_TYPE: IdType = V::ID_TYPE;

    fn to_structure_id(&self) -> StructureId {
        self.as_ref()
            .map_or_else(|| V::ID_TYPE.empty_id(), IdValue::to_structure_id)
    }

    fn from_structure_id(id: &StructureId) -> Option<Self> {
        V::from_structure_id(id).map(Some)
    }
}

/// A member stamped with the last-modified instant on every build.
pub trait TimeStampValue: IndexValue {
    /// Set the instant and return the one it replaced.
    fn stamp(&mut self, at: DateTime<Utc>) -> Option<DateTime<Utc>>;

    /// Put back what an earlier `stamp` returned.
    fn restore(&mut self, previous: Option<DateTime<Utc>>);
}

impl TimeStampValue for DateTime<Utc> {
    fn stamp(&mut self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Some(std::mem::replace(self, at))
    }

    fn restore(&mut self, previous: Option<DateTime<Utc>>) {
        if let Some(previous) = previous {
            *self = previous;
        }
    }
}

impl TimeStampValue for Option<DateTime<Utc>> {
    fn stamp(&mut self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.replace(at)
    }

    fn restore(&mut self, previous: Option<DateTime<Utc>>) {
        *self = previous;
    }
}
