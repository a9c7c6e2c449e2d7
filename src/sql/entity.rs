//! Generic fetch-by-business-key / insert-if-absent over a [`Store`].

use crate::core::{DbError, ImportError, Value};
use crate::storage::{ID_COLUMN, Store};
use crate::Result;
use tracing::debug;

/// A row type with a fixed table and, for dimension tables, the columns
/// whose values identify an existing row.
pub trait Entity {
    const TABLE: &'static str;
    const BUSINESS_KEY: &'static [&'static str];

    /// Every column written on insert, in insert order.
    fn columns(&self) -> Vec<(&'static str, Value)>;

    /// Column values used to look up an existing row. Defaults to the
    /// business key columns.
    fn lookup(&self) -> Vec<(&'static str, Value)> {
        business_key(self)
    }
}

/// The entity's business key columns with their values.
pub fn business_key<E: Entity + ?Sized>(entity: &E) -> Vec<(&'static str, Value)> {
    let columns = entity.columns();
    E::BUSINESS_KEY
        .iter()
        .filter_map(|key| columns.iter().find(|(name, _)| name == key).cloned())
        .collect()
}

/// An entity and the ID of its stored row, once known.
///
/// The ID goes from `None` to resolved exactly once, through [`fetch`] or
/// [`save`] with `update_id`.
///
/// [`fetch`]: Tracked::fetch
/// [`save`]: Tracked::save
#[derive(Debug, Clone)]
pub struct Tracked<E: Entity> {
    entity: E,
    id: Option<i64>,
}

impl<E: Entity> Tracked<E> {
    pub fn new(entity: E) -> Self {
        Self { entity, id: None }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Look the entity up by its lookup columns. No match leaves the ID
    /// unresolved; more than one match is an integrity error.
    pub fn fetch<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<Option<i64>> {
        let lookup = self.entity.lookup();
        if lookup.is_empty() {
            return Err(DbError::UnsupportedOperation(format!(
                "{} has no business key to fetch by",
                E::TABLE
            ))
            .into());
        }

        let clause = lookup
            .iter()
            .map(|(name, value)| -> Result<String> {
                match value {
                    Value::Null => Ok(format!("{} IS NULL", name)),
                    _ => Ok(format!("{}={}", name, store.literal(value)?)),
                }
            })
            .collect::<Result<Vec<_>>>()?
            .join(" AND ");
        let sql = format!("SELECT {} FROM {} WHERE {}", ID_COLUMN, E::TABLE, clause);
        debug!(target: "pmtm_import::sql", "{}", sql);

        match store.execute(&sql)? {
            0 => {}
            1 => {
                let row = store.fetch_one()?;
                let id = row
                    .as_ref()
                    .and_then(|r| r.first())
                    .and_then(Value::as_i64)
                    .ok_or_else(|| ImportError::UnresolvedId(E::TABLE.to_string()))?;
                self.id = Some(id);
            }
            _ => return Err(ImportError::AmbiguousKey(E::TABLE.to_string())),
        }
        Ok(self.id)
    }

    /// Insert the entity as a new row, then optionally fetch its ID.
    pub fn save<S: Store + ?Sized>(&mut self, store: &mut S, update_id: bool) -> Result<()> {
        let columns = self.entity.columns();
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        let values = columns
            .iter()
            .map(|(_, value)| store.literal(value))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            names.join(", "),
            values.join(", ")
        );
        debug!(target: "pmtm_import::sql", "{}", sql);

        if store.execute(&sql)? == 0 {
            return Err(ImportError::InsertFailed(E::TABLE.to_string()));
        }

        if update_id {
            self.fetch(store)?;
            if self.id.is_none() {
                return Err(ImportError::UnresolvedId(E::TABLE.to_string()));
            }
        }
        Ok(())
    }

    /// The dimension-table upsert: reuse the stored row when one matches,
    /// insert otherwise.
    pub fn fetch_or_save<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<i64> {
        if let Some(id) = self.fetch(store)? {
            return Ok(id);
        }
        self.save(store, true)?;
        self.id
            .ok_or_else(|| ImportError::UnresolvedId(E::TABLE.to_string()))
    }
}
