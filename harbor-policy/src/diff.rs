//! Comparison of canonical desired and current state.

use crate::resources::Identified;

/// Outcome of comparing a singleton resource.
#[derive(Debug, Clone, PartialEq)]
pub struct SingletonDelta<T> {
    pub changed: bool,
    pub before: T,
    pub after: T,
}

/// Compare two canonical snapshots. `force` treats them as different even when equal.
pub fn compare<T: PartialEq>(current: T, desired: T, force: bool) -> SingletonDelta<T> {
    let changed = force || current != desired;
    SingletonDelta {
        changed,
        before: current,
        after: desired,
    }
}

/// Partition of a set-valued resource into creates and deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDelta<T> {
    /// Desired items with no structurally equal current item.
    pub to_create: Vec<T>,
    /// Current items with no structurally equal desired item, with their ids.
    pub to_delete: Vec<Identified<T>>,
}

impl<T> SetDelta<T> {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }

    pub fn delete_ids(&self) -> Vec<i64> {
        self.to_delete.iter().map(|d| d.id).collect()
    }
}

/// Set difference by full structural equality, never by identifier.
///
/// A changed field therefore shows up as one delete plus one create.
pub fn partition<T: PartialEq + Clone>(current: &[Identified<T>], desired: &[T]) -> SetDelta<T> {
    let mut to_create: Vec<T> = Vec::new();
    for item in desired {
        if !current.iter().any(|c| &c.item == item) && !to_create.contains(item) {
            to_create.push(item.clone());
        }
    }
    let to_delete = current
        .iter()
        .filter(|c| !desired.contains(&c.item))
        .cloned()
        .collect();

    SetDelta {
        to_create,
        to_delete,
    }
}

/// Items present in `after` but not in `before`, and the reverse.
pub fn added_removed<T: PartialEq + Clone>(before: &[T], after: &[T]) -> (Vec<T>, Vec<T>) {
    let added = after.iter().filter(|a| !before.contains(a)).cloned().collect();
    let removed = before.iter().filter(|b| !after.contains(b)).cloned().collect();
    (added, removed)
}
