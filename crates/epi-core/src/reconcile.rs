//! Two-phase batch reconciliation: resolve, partition, then write twice.
//!
//! An upload is a mixture of rows the store has never seen and rows that
//! restate an existing natural key. [`reconcile`] splits such a batch into a
//! *create* set (full records) and an *update* set (existing records with
//! only their mutable fields overwritten). The caller then issues exactly one
//! bulk insert and one field-restricted bulk update. Re-submitting the same
//! batch therefore converges on the same stored values.

use std::{collections::HashMap, hash::Hash};

use crate::Stored;

/// A record type with a natural identity and a set of mutable fields.
pub trait Reconcile {
  type Key: Eq + Hash + Clone;

  /// The fields whose equality defines "same record".
  fn natural_key(&self) -> Self::Key;

  /// Copy the mutable fields of `incoming` onto `self`. Identity fields are
  /// never touched.
  fn absorb(&mut self, incoming: Self);
}

/// The outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
  pub create: Vec<T>,
  pub update: Vec<Stored<T>>,
}

impl<T> Partition<T> {
  pub fn is_empty(&self) -> bool { self.create.is_empty() && self.update.is_empty() }
}

impl<T> Default for Partition<T> {
  fn default() -> Self { Self { create: Vec::new(), update: Vec::new() } }
}

enum Slot {
  Create(usize),
  Update(usize),
}

/// Partition `incoming` against the store view exposed by `find`.
///
/// `find` is consulted at most once per distinct key. Rows repeating a key
/// already seen in this batch fold into the pending entry for that key, so
/// a batch never produces two creates (or two updates) for one identity.
pub fn reconcile<T, I, F>(incoming: I, mut find: F) -> Partition<T>
where
  T: Reconcile,
  I: IntoIterator<Item = T>,
  F: FnMut(&T::Key) -> Option<Stored<T>>,
{
  let mut partition: Partition<T> = Partition::default();
  let mut seen: HashMap<T::Key, Slot> = HashMap::new();

  for record in incoming {
    let key = record.natural_key();
    match seen.get(&key) {
      Some(Slot::Create(i)) => partition.create[*i].absorb(record),
      Some(Slot::Update(i)) => partition.update[*i].record.absorb(record),
      None => match find(&key) {
        Some(mut existing) => {
          existing.record.absorb(record);
          seen.insert(key, Slot::Update(partition.update.len()));
          partition.update.push(existing);
        }
        None => {
          seen.insert(key, Slot::Create(partition.create.len()));
          partition.create.push(record);
        }
      },
    }
  }

  partition
}

/// Index a one-pass store read by natural key, for use as the `find`
/// argument of [`reconcile`] via `|k| index.remove(k)`.
pub fn index_by_key<T: Reconcile>(
  existing: impl IntoIterator<Item = Stored<T>>,
) -> HashMap<T::Key, Stored<T>> {
  existing
    .into_iter()
    .map(|stored| (stored.record.natural_key(), stored))
    .collect()
}
