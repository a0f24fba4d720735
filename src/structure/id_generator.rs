use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use crate::core::{DbError, IdType, Result, StructureId};
use crate::schema::SchemaModel;

/// Hands out identities for documents that arrive without one.
pub trait IdentitySource: Send + Sync {
    /// Reserve `count` consecutive identities for the schema and return the first.
    fn reserve_next_ids(&self, schema_hash: &str, count: usize) -> Result<i64>;

    fn next_guid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// In-process identity source with one monotonic counter per schema hash.
#[derive(Debug, Default)]
pub struct SequentialIdentitySource {
    counters: Mutex<HashMap<String, i64>>,
}

impl SequentialIdentitySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue an existing sequence, e.g. after loading the highest stored id.
    pub fn seeded(schema_hash: impl Into<String>, last_id: i64) -> Self {
        let mut counters = HashMap::new();
        counters.insert(schema_hash.into(), last_id);
        Self {
            counters: Mutex::new(counters),
        }
    }
}

impl IdentitySource for SequentialIdentitySource {
    fn reserve_next_ids(&self, schema_hash: &str, count: usize) -> Result<i64> {
        let count = i64::try_from(count)
            .map_err(|_| DbError::IdentityUnavailable(format!("cannot reserve {} identities", count)))?;
        let mut counters = self.counters.lock()?;
        let current = counters.entry(schema_hash.to_string()).or_insert(0);
        let end = current.checked_add(count).ok_or_else(|| {
            DbError::IdentityUnavailable(format!("identity sequence '{}' is exhausted", schema_hash))
        })?;
        let start = *current + 1;
        *current = end;
        Ok(start)
    }
}

/// Turns identity source reservations into typed structure ids.
#[derive(Clone)]
pub struct StructureIdGenerator {
    source: Arc<dyn IdentitySource>,
}

impl StructureIdGenerator {
    pub fn new(source: Arc<dyn IdentitySource>) -> Self {
        Self { source }
    }

    /// Generate `count` fresh ids; integer identities come from one reservation.
    pub fn generate(&self, schema: &SchemaModel, count: usize) -> Result<Vec<StructureId>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        match schema.id_type() {
            IdType::Identity => {
                let start = self.source.reserve_next_ids(schema.hash(), count)?;
                if start <= 0 {
                    return Err(DbError::IdentityUnavailable(format!(
                        "identity source returned a non-positive start for '{}'",
                        schema.name()
                    )));
                }
                let last = i64::try_from(count - 1)
                    .ok()
                    .and_then(|span| start.checked_add(span))
                    .ok_or_else(|| {
                        DbError::IdentityUnavailable(format!(
                            "{} identities from {} overflow the range of '{}'",
                            count,
                            start,
                            schema.name()
                        ))
                    })?;
                Ok((start..=last).map(StructureId::Identity).collect())
            }
            IdType::Guid => Ok((0..count)
                .map(|_| StructureId::Guid(self.source.next_guid()))
                .collect()),
            IdType::String => Err(DbError::IdentityUnavailable(format!(
                "string identities of '{}' must be assigned by the caller",
                schema.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservations_are_monotonic_per_hash() {
        let source = SequentialIdentitySource::new();

        assert_eq!(source.reserve_next_ids("a", 3).unwrap(), 1);
        assert_eq!(source.reserve_next_ids("a", 2).unwrap(), 4);
        assert_eq!(source.reserve_next_ids("b", 1).unwrap(), 1);
    }

    #[test]
    fn exhausted_sequence_is_unavailable() {
        let source = SequentialIdentitySource::seeded("a", i64::MAX - 2);

        assert_eq!(source.reserve_next_ids("a", 2).unwrap(), i64::MAX - 1);
        assert!(matches!(source.reserve_next_ids("a", 1), Err(DbError::IdentityUnavailable(_))));
    }

    struct FixedSource(i64);

    impl IdentitySource for FixedSource {
        fn reserve_next_ids(&self, _schema_hash: &str, _count: usize) -> Result<i64> {
            Ok(self.0)
        }
    }

    #[test]
    fn block_running_past_i64_max_is_unavailable() {
        let schema = SchemaModel::new("Thing".into(), "h".into(), "Id".into(), IdType::Identity, vec![], None);
        let generator = StructureIdGenerator::new(Arc::new(FixedSource(i64::MAX)));

        assert_eq!(generator.generate(&schema, 1).unwrap(), vec![StructureId::Identity(i64::MAX)]);
        assert!(matches!(generator.generate(&schema, 2), Err(DbError::IdentityUnavailable(_))));
    }

    #[test]
    fn seeded_source_continues_sequence() {
        let source = SequentialIdentitySource::seeded("a", 41);
        assert_eq!(source.reserve_next_ids("a", 1).unwrap(), 42);
    }
}
