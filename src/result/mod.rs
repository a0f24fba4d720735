//! Read path
//!
//! Result sequences are lazy, forward-only and single pass: each row is read
//! from the underlying stream only when the sequence is advanced. They borrow
//! the session's executor, so a sequence must be drained or dropped before the
//! next statement is issued.

mod materializer;

pub use materializer::{materialize, merge_document};

use std::marker::PhantomData;
use serde::de::DeserializeOwned;
use crate::codec::{DocumentCodec, JsonCodec};
use crate::core::{DbError, IdType, Result, StructureId, Value};
use crate::dac::RecordStream;

/// Materialized JSON documents, includes merged in.
pub struct JsonResults<'a> {
    records: RecordStream<'a>,
}

impl<'a> JsonResults<'a> {
    pub fn new(records: RecordStream<'a>) -> Self {
        Self { records }
    }
}

impl Iterator for JsonResults<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.and_then(|record| materialize(&record)))
    }
}

/// Documents decoded into `T`, either the stored type or a projection of it.
pub struct TypedResults<'a, T, C: DocumentCodec = JsonCodec> {
    documents: JsonResults<'a>,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned, C: DocumentCodec> TypedResults<'a, T, C> {
    pub fn new(records: RecordStream<'a>, codec: C) -> Self {
        Self {
            documents: JsonResults::new(records),
            codec,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned, C: DocumentCodec> Iterator for TypedResults<'_, T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let document = self.documents.next()?;
        Some(document.and_then(|body| self.codec.decode(&body)))
    }
}

/// Identities from an identifier query.
pub struct IdResults<'a> {
    records: RecordStream<'a>,
    id_type: IdType,
}

impl<'a> IdResults<'a> {
    pub fn new(records: RecordStream<'a>, id_type: IdType) -> Self {
        Self { records, id_type }
    }
}

impl Iterator for IdResults<'_> {
    type Item = Result<StructureId>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        let id_type = self.id_type;
        Some(record.and_then(|record| {
            let value = record
                .get_at(0)
                .ok_or_else(|| DbError::ExecutionError("identifier row has no columns".to_string()))?;
            to_structure_id(value, id_type)
        }))
    }
}

/// Convert a stored identity column value back to a typed identity.
pub fn to_structure_id(value: &Value, id_type: IdType) -> Result<StructureId> {
    let coerced = value.coerce_to(id_type.data_type());
    match (id_type, coerced) {
        (IdType::Identity, Some(Value::Integer(id))) => Ok(StructureId::Identity(id)),
        (IdType::Guid, Some(Value::Uuid(id))) => Ok(StructureId::Guid(id)),
        (IdType::String, Some(Value::Text(id))) => Ok(StructureId::String(id)),
        _ => Err(DbError::TypeMismatch(format!(
            "{} column value is not a {} identity",
            value.type_name(),
            id_type
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dac::DataRecord;

    fn rows(values: Vec<Value>) -> RecordStream<'static> {
        Box::new(
            values
                .into_iter()
                .map(|value| DataRecord::new(vec!["StructureId".into()], vec![value])),
        )
    }

    #[test]
    fn id_results_convert_column_values() {
        let ids: Vec<StructureId> = IdResults::new(rows(vec![Value::Integer(3), Value::Integer(9)]), IdType::Identity)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(ids, vec![StructureId::Identity(3), StructureId::Identity(9)]);
    }

    #[test]
    fn id_results_reject_wrong_kind() {
        let mut ids = IdResults::new(rows(vec![Value::Text("x".into())]), IdType::Identity);
        assert!(matches!(ids.next(), Some(Err(DbError::TypeMismatch(_)))));
    }

    #[test]
    fn json_results_are_lazy() {
        let mut pulled = 0;
        let stream: RecordStream<'_> = Box::new(std::iter::from_fn(|| {
            pulled += 1;
            Some(DataRecord::new(vec!["Json".into()], vec![Value::Text("{}".into())]))
        }));
        let mut results = JsonResults::new(stream);

        assert_eq!(results.next().unwrap().unwrap(), "{}");
        drop(results);
        assert_eq!(pulled, 1);
    }
}
