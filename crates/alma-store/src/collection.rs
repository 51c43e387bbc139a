// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The one controller behind every list screen: an in-memory collection of
//! one entity type with gateway-backed create/update/remove and a lazy,
//! non-mutating query view. Mutations apply optimistically and roll back
//! whenever the gateway refuses, so the collection never silently diverges
//! from the backend.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use alma_app::forms::ValidationError;

use crate::filter::Filter;
use crate::gateway::{Gateway, GatewayError, ListFilter, Row};

/// Binds a model to its gateway table: table name, required draft fields,
/// and the fields the filter engine searches and facets on.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    const TABLE: &'static str;
    const REQUIRED: &'static [&'static str];
    const SEARCH: &'static [&'static str];
    const FACETS: &'static [&'static str] = &[];

    fn id(&self) -> i64;
}

#[derive(Debug)]
pub enum CreateError {
    Validation(ValidationError),
    Gateway(GatewayError),
}

impl std::fmt::Display for CreateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(error) => error.fmt(f),
            Self::Gateway(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for CreateError {}

impl From<GatewayError> for CreateError {
    fn from(error: GatewayError) -> Self {
        Self::Gateway(error)
    }
}

#[derive(Debug)]
pub enum MutateError {
    NotFound(i64),
    Gateway(GatewayError),
}

impl std::fmt::Display for MutateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "record {id} is not in this collection"),
            Self::Gateway(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for MutateError {}

impl From<GatewayError> for MutateError {
    fn from(error: GatewayError) -> Self {
        Self::Gateway(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The backend had already dropped the row; local state was corrected.
    AlreadyGone,
}

/// A row lifted out of the collection pending the user's confirmation.
/// Dropping it without committing is the "cancel" path, so the caller must
/// put it back explicitly via `cancel_removal`.
#[derive(Debug)]
pub struct StagedRemoval<E> {
    record: E,
    index: usize,
}

impl<E: Entity> StagedRemoval<E> {
    pub fn record(&self) -> &E {
        &self.record
    }
}

#[derive(Debug, Clone)]
pub struct Collection<E> {
    rows: Vec<E>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&E> {
        self.rows.iter().find(|record| record.id() == id)
    }

    /// Replaces the collection from the gateway. On any failure the prior
    /// rows are left exactly as they were.
    pub fn load(
        &mut self,
        gateway: &dyn Gateway,
        filter: &ListFilter,
    ) -> Result<usize, GatewayError> {
        let raw = gateway.list(E::TABLE, filter)?;
        let rows = decode_rows::<E>(raw)?;
        self.rows = rows;
        Ok(self.rows.len())
    }

    /// Applies rows fetched elsewhere (the async load path). Same
    /// leave-prior-intact guarantee as `load`.
    pub fn apply_rows(&mut self, raw: Vec<Row>) -> Result<usize, GatewayError> {
        let rows = decode_rows::<E>(raw)?;
        self.rows = rows;
        Ok(self.rows.len())
    }

    /// Validates required fields (reporting every missing one), inserts
    /// through the gateway, and appends the gateway-assigned record. On any
    /// failure nothing is appended.
    pub fn create(&mut self, gateway: &dyn Gateway, draft: Row) -> Result<E, CreateError> {
        check_required::<E>(&draft).map_err(CreateError::Validation)?;
        let inserted = gateway.insert(E::TABLE, draft)?;
        let record = decode_row::<E>(inserted)?;
        self.rows.push(record.clone());
        Ok(record)
    }

    /// Patches the record with `id`: patched fields overwrite, everything
    /// else is untouched. The patch is applied locally first and rolled
    /// back if the gateway refuses it.
    pub fn update(
        &mut self,
        gateway: &dyn Gateway,
        id: i64,
        patch: Row,
    ) -> Result<E, MutateError> {
        let index = self
            .rows
            .iter()
            .position(|record| record.id() == id)
            .ok_or(MutateError::NotFound(id))?;

        let prior = self.rows[index].clone();
        let merged = merge_patch(&prior, &patch).map_err(MutateError::Gateway)?;
        self.rows[index] = merged;

        match gateway.update(E::TABLE, id, patch) {
            Ok(row) => match decode_row::<E>(row) {
                Ok(record) => {
                    self.rows[index] = record.clone();
                    Ok(record)
                }
                Err(error) => {
                    self.rows[index] = prior;
                    Err(MutateError::Gateway(error))
                }
            },
            Err(error) => {
                self.rows[index] = prior;
                Err(MutateError::Gateway(error))
            }
        }
    }

    /// First half of the destructive-action guard: lifts the row out and
    /// hands it back for the confirmation prompt. `None` means the id is
    /// not in the collection -- report it, nothing changed.
    pub fn stage_removal(&mut self, id: i64) -> Option<StagedRemoval<E>> {
        let index = self.rows.iter().position(|record| record.id() == id)?;
        let record = self.rows.remove(index);
        Some(StagedRemoval { record, index })
    }

    /// Confirmation declined: the row goes back where it was.
    pub fn cancel_removal(&mut self, staged: StagedRemoval<E>) {
        let index = staged.index.min(self.rows.len());
        self.rows.insert(index, staged.record);
    }

    /// Confirmation accepted: delete on the backend. A gateway failure
    /// restores the row at its original index.
    pub fn commit_removal(
        &mut self,
        gateway: &dyn Gateway,
        staged: StagedRemoval<E>,
    ) -> Result<RemoveOutcome, GatewayError> {
        match gateway.delete(E::TABLE, staged.record.id()) {
            Ok(()) => Ok(RemoveOutcome::Removed),
            Err(GatewayError::NotFound { .. }) => Ok(RemoveOutcome::AlreadyGone),
            Err(error) => {
                self.cancel_removal(staged);
                Err(error)
            }
        }
    }

    /// Lazy filtered view; never mutates or clones the underlying rows.
    pub fn query<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a E> + 'a {
        self.rows.iter().filter(move |record| filter.matches(*record))
    }
}

fn decode_rows<E: Entity>(raw: Vec<Row>) -> Result<Vec<E>, GatewayError> {
    let mut rows = Vec::with_capacity(raw.len());
    for row in raw {
        rows.push(decode_row::<E>(row)?);
    }
    Ok(rows)
}

fn decode_row<E: Entity>(row: Row) -> Result<E, GatewayError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|error| GatewayError::Decode(format!("{} row: {error}", E::TABLE)))
}

fn merge_patch<E: Entity>(record: &E, patch: &Row) -> Result<E, GatewayError> {
    let mut value = serde_json::to_value(record)
        .map_err(|error| GatewayError::Decode(format!("{} row: {error}", E::TABLE)))?;
    let Some(object) = value.as_object_mut() else {
        return Err(GatewayError::Decode(format!(
            "{} row did not serialize to an object",
            E::TABLE
        )));
    };
    for (field, replacement) in patch {
        if field == "id" {
            continue;
        }
        object.insert(field.clone(), replacement.clone());
    }
    serde_json::from_value(value)
        .map_err(|error| GatewayError::Decode(format!("{} row: {error}", E::TABLE)))
}

fn check_required<E: Entity>(draft: &Row) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    for field in E::REQUIRED {
        let present = match draft.get(*field) {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) => !text.trim().is_empty(),
            Some(_) => true,
        };
        if !present {
            missing.push(*field);
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            missing,
            invalid: Vec::new(),
        })
    }
}
