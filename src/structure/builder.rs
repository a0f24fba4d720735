//! Structure builder
//!
//! Converts typed items into storage-ready [`Structure`] records. Identity
//! resolution happens in one sequential pre-pass so a batch costs a single
//! identity reservation; the per-item work after that shares no state and may
//! run sequentially or fanned out over scoped worker threads. Either way the
//! output order is the input order.

use std::sync::Arc;
use std::thread;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use crate::codec::{DocumentCodec, JsonCodec};
use crate::core::{DbError, Result, StructureId};
use crate::schema::{Document, StructureSchema};
use super::id_generator::{IdentitySource, StructureIdGenerator};
use super::structure::{Structure, StructureIndex};

/// How a batch is spread over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    Sequential,
    Parallel { workers: usize },
    /// Parallel over all available cores once a batch reaches `threshold` items.
    Auto { threshold: usize },
}

impl BuildStrategy {
    /// Number of workers to use for a batch of `items` items; 1 means in-thread.
    pub fn workers_for(&self, items: usize) -> usize {
        let workers = match *self {
            Self::Sequential => 1,
            Self::Parallel { workers } => workers,
            Self::Auto { threshold } if items >= threshold.max(2) => thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Self::Auto { .. } => 1,
        };
        workers.clamp(1, items.max(1))
    }
}

impl Default for BuildStrategy {
    fn default() -> Self {
        Self::Auto { threshold: 100 }
    }
}

/// Identity of one item resolved before the build pass.
#[derive(Debug, Clone)]
struct ResolvedId {
    id: StructureId,
    /// Empty id the item carried when `id` was generated for it
    replaced: Option<StructureId>,
}

/// Values a build wrote over on one item, kept until the whole batch succeeds.
#[derive(Debug, Clone)]
struct Overwritten {
    id: Option<StructureId>,
    stamp: Option<Option<DateTime<Utc>>>,
}

impl Overwritten {
    fn undo<T>(self, item: &mut T, schema: &StructureSchema<T>) {
        if let Some(previous) = self.id {
            if let Err(err) = schema.id_accessor().set_value(item, &previous) {
                warn!("Could not restore identity of a '{}' item: {}", schema.name(), err);
            }
        }
        if let (Some(accessor), Some(previous)) = (schema.timestamp_accessor(), self.stamp) {
            accessor.restore(item, previous);
        }
    }
}

type Built = (Structure, Overwritten);

pub struct StructureBuilder<C: DocumentCodec = JsonCodec> {
    id_generator: StructureIdGenerator,
    codec: C,
    strategy: BuildStrategy,
}

impl StructureBuilder<JsonCodec> {
    pub fn new(identity_source: Arc<dyn IdentitySource>) -> Self {
        Self::with_codec(identity_source, JsonCodec)
    }
}

impl<C: DocumentCodec> StructureBuilder<C> {
    pub fn with_codec(identity_source: Arc<dyn IdentitySource>, codec: C) -> Self {
        Self {
            id_generator: StructureIdGenerator::new(identity_source),
            codec,
            strategy: BuildStrategy::default(),
        }
    }

    pub fn strategy(mut self, strategy: BuildStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Build one structure, writing a generated identity back onto `item`.
    pub fn build_structure<T: Document>(&self, item: &mut T, schema: &StructureSchema<T>) -> Result<Structure> {
        let mut structures = self.build_structures(std::slice::from_mut(item), schema)?;
        structures
            .pop()
            .ok_or_else(|| DbError::ContractViolation("no structure built for item".to_string()))
    }

    /// Build one structure per item, in input order.
    ///
    /// Every item of the batch is stamped with the same instant. When any item
    /// fails, no item keeps a generated identity or a new stamp.
    pub fn build_structures<T: Document>(
        &self,
        items: &mut [T],
        schema: &StructureSchema<T>,
    ) -> Result<Vec<Structure>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.resolve_ids(items, schema)?;
        let now = schema.has_timestamp().then(Utc::now);
        let workers = self.strategy.workers_for(items.len());
        let run_size = items.len().div_ceil(workers);

        debug!(
            "Building {} structure(s) of '{}' with {} worker(s)",
            items.len(),
            schema.name(),
            workers
        );

        let runs = if workers <= 1 {
            vec![self.build_run(items, &ids, now, schema)]
        } else {
            self.build_in_parallel(items, &ids, now, schema, run_size)
        };

        let mut first_error = None;
        let mut completed = Vec::with_capacity(runs.len());
        for run in runs {
            match run {
                Ok(built) => completed.push(Some(built)),
                Err(err) => {
                    completed.push(None);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            None => Ok(completed
                .into_iter()
                .flatten()
                .flatten()
                .map(|(structure, _)| structure)
                .collect()),
            Some(err) => {
                for (run_items, built) in items.chunks_mut(run_size).zip(completed) {
                    if let Some(built) = built {
                        undo_all(run_items, built, schema);
                    }
                }
                Err(err)
            }
        }
    }

    fn resolve_ids<T>(&self, items: &[T], schema: &StructureSchema<T>) -> Result<Vec<ResolvedId>> {
        let current: Vec<StructureId> = items
            .iter()
            .map(|item| schema.id_accessor().get_value(item))
            .collect();
        let missing = current.iter().filter(|id| id.is_empty()).count();
        let mut generated = self.id_generator.generate(schema.model(), missing)?.into_iter();

        current
            .into_iter()
            .map(|id| {
                if !id.is_empty() {
                    return Ok(ResolvedId { id, replaced: None });
                }
                generated
                    .next()
                    .map(|generated| ResolvedId {
                        id: generated,
                        replaced: Some(id),
                    })
                    .ok_or_else(|| {
                        DbError::IdentityUnavailable(format!(
                            "identity source returned too few ids for '{}'",
                            schema.name()
                        ))
                    })
            })
            .collect()
    }

    fn build_in_parallel<T: Document>(
        &self,
        items: &mut [T],
        ids: &[ResolvedId],
        now: Option<DateTime<Utc>>,
        schema: &StructureSchema<T>,
        run_size: usize,
    ) -> Vec<Result<Vec<Built>>> {
        thread::scope(|scope| {
            let handles: Vec<_> = items
                .chunks_mut(run_size)
                .zip(ids.chunks(run_size))
                .map(|(items, ids)| scope.spawn(move || self.build_run(items, ids, now, schema)))
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(run) => run,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    /// Build a contiguous run of items; a failure undoes the run's own writes.
    fn build_run<T: Document>(
        &self,
        items: &mut [T],
        ids: &[ResolvedId],
        now: Option<DateTime<Utc>>,
        schema: &StructureSchema<T>,
    ) -> Result<Vec<Built>> {
        let mut built = Vec::with_capacity(items.len());
        for (index, resolved) in ids.iter().enumerate().take(items.len()) {
            match self.create_structure(&mut items[index], resolved, now, schema) {
                Ok(entry) => built.push(entry),
                Err(err) => {
                    undo_all(&mut items[..index], built, schema);
                    return Err(err);
                }
            }
        }
        Ok(built)
    }

    fn create_structure<T: Document>(
        &self,
        item: &mut T,
        resolved: &ResolvedId,
        now: Option<DateTime<Utc>>,
        schema: &StructureSchema<T>,
    ) -> Result<Built> {
        let mut overwritten = Overwritten { id: None, stamp: None };
        if let Some(previous) = &resolved.replaced {
            schema.id_accessor().set_value(item, &resolved.id)?;
            overwritten.id = Some(previous.clone());
        }
        if let (Some(accessor), Some(now)) = (schema.timestamp_accessor(), now) {
            overwritten.stamp = Some(accessor.set_value(item, now));
        }

        match self.describe(item, &resolved.id, schema) {
            Ok(structure) => Ok((structure, overwritten)),
            Err(err) => {
                overwritten.undo(item, schema);
                Err(err)
            }
        }
    }

    fn describe<T: Document>(&self, item: &T, id: &StructureId, schema: &StructureSchema<T>) -> Result<Structure> {
        let indexes = schema
            .index_accessors()
            .iter()
            .map(|accessor| {
                Ok(StructureIndex {
                    member_path: accessor.path().to_string(),
                    value: accessor.value_of(item, schema.name())?,
                    data_type: accessor.data_type(),
                    is_unique: accessor.is_unique(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Structure {
            schema_name: schema.name().to_string(),
            id: id.clone(),
            indexes,
            json: self.codec.encode(Some(item))?,
        })
    }
}

fn undo_all<T>(items: &mut [T], built: Vec<Built>, schema: &StructureSchema<T>) {
    for (item, (_, overwritten)) in items.iter_mut().zip(built) {
        overwritten.undo(item, schema);
    }
}
