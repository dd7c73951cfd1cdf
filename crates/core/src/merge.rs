//! Collection merge engine.
//!
//! These operations never fail. Merging is insert-if-absent: a child that is already present
//! (same uuid) is left as it is, so re-delivering a page is a no-op.

use crate::collection::{ChildCollection, Keyed};
use crate::store::Record;

/// Adds `new_child` to `existing` unless a child with the same uuid is present.
///
/// Returns whether the collection changed.
pub fn merge_child<T: Keyed>(existing: &mut ChildCollection<T>, new_child: T) -> bool {
    let key = new_child.key().to_owned();
    let inserted = existing.insert_if_absent(new_child);
    if !inserted {
        tracing::debug!(uuid = %key, "child already present; merge is a no-op");
    }
    inserted
}

/// Removes the element sharing `entity`'s uuid.
pub fn remove_from_collection<T: Keyed>(
    collection: &mut ChildCollection<T>,
    entity: &T,
) -> Option<T> {
    collection.remove_by_key(entity.key())
}

/// Returns a fold over records of one parent that each carry a `key` collection.
///
/// The children of every record accumulate, in order and without duplicates, onto one running
/// collection. The result is the last record, carrying the accumulated collection, or `None`
/// for an empty input.
pub fn merge_collections_on_key(key: &str) -> impl Fn(Vec<Record>) -> Option<Record> + '_ {
    move |records| {
        let mut accumulated: ChildCollection<Record> = ChildCollection::new();
        let mut last = None;
        for record in records {
            for child in record.collection(key) {
                accumulated.insert_if_absent(child);
            }
            last = Some(record);
        }
        last.map(|mut record| {
            record.set_collection(key, accumulated.into_vec());
            record
        })
    }
}
