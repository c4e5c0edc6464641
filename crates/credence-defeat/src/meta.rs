//! Meta-defeat resolution
//!
//! A defeater is effectively active when its own status is `active` and none
//! of the defeaters listed in its `defeated_by` is effectively active. The
//! relation may contain cycles; resolution walks it depth first with an
//! explicit stack and treats a defeater already on the current path as
//! inactive, so every query terminates without growing the call stack.
//!
//! Cycle outcomes follow from that rule: a self-defeating defeater stays
//! active, both members of a 2-cycle are inactive, and all members of a
//! 3-cycle are active.

use credence_domain::{DefeaterId, DefeaterStatus, ExtendedDefeater};
use std::collections::{HashMap, HashSet};
use tracing::trace;

struct Frame<'a> {
    defeater: &'a ExtendedDefeater,
    next: usize,
    /// Some check below this frame hit a defeater already on the path
    cut: bool,
}

impl<'a> Frame<'a> {
    fn new(defeater: &'a ExtendedDefeater) -> Self {
        Self {
            defeater,
            next: 0,
            cut: false,
        }
    }
}

struct Outcome {
    active: bool,
    cut: bool,
}

/// Shared lookup state for one set of defeaters
///
/// Results that never depended on a cycle being cut are the same on every
/// path, so they are settled once and reused. Results inside a cycle depend
/// on where the walk entered it and are recomputed per query.
struct Resolver<'a> {
    index: HashMap<&'a DefeaterId, &'a ExtendedDefeater>,
    settled: HashMap<&'a DefeaterId, bool>,
}

impl<'a> Resolver<'a> {
    fn new(all: &'a [ExtendedDefeater]) -> Self {
        Self {
            index: all.iter().map(|d| (&d.id, d)).collect(),
            settled: HashMap::new(),
        }
    }

    fn is_active(&mut self, root: &'a ExtendedDefeater) -> bool {
        if root.status != DefeaterStatus::Active {
            return false;
        }

        let mut on_path: HashSet<&'a DefeaterId> = HashSet::from([&root.id]);
        let mut stack = vec![Frame::new(root)];
        let mut returned: Option<Outcome> = None;

        while let Some(top) = stack.last_mut() {
            let current: &'a ExtendedDefeater = top.defeater;
            let mut defeated = false;
            if let Some(outcome) = returned.take() {
                top.cut |= outcome.cut;
                defeated = outcome.active;
            }

            if !defeated {
                if let Some(meta_id) = current.meta_defeaters().get(top.next) {
                    top.next += 1;
                    let Some(meta) = self.index.get(meta_id).copied() else {
                        continue;
                    };
                    if meta.status != DefeaterStatus::Active {
                        continue;
                    }
                    if on_path.contains(&meta.id) {
                        top.cut = true;
                        continue;
                    }
                    match self.settled.get(&meta.id) {
                        Some(false) => continue,
                        Some(true) => defeated = true,
                        None => {
                            on_path.insert(&meta.id);
                            stack.push(Frame::new(meta));
                            continue;
                        }
                    }
                }
            }

            // `current` is decided: defeated by an active meta-defeater, or
            // active because every meta-defeater turned out inactive.
            let Some(done) = stack.pop() else {
                break;
            };
            on_path.remove(&current.id);
            if defeated {
                trace!(defeater = %current.id, "Defeated by an active meta-defeater");
            }
            if !done.cut {
                self.settled.insert(&current.id, !defeated);
            }
            if stack.is_empty() {
                return !defeated;
            }
            returned = Some(Outcome {
                active: !defeated,
                cut: done.cut,
            });
        }

        // Unreachable: the loop returns once the root frame is popped.
        false
    }
}

/// Whether `defeater` is in force once meta-defeaters are taken into account
///
/// Meta-defeaters are looked up by ID in `all`; IDs missing from `all` are
/// ignored.
///
/// Acyclic parts of the relation are resolved once per query, so the cost
/// is linear in the number of `defeated_by` links reachable from
/// `defeater`. Defeaters that sit on a cycle are re-walked from each
/// entry point, which can be exponential for densely interlocked cycles.
///
/// # Examples
///
/// ```
/// use credence_defeat::{add_meta_defeater, is_defeater_active};
/// use credence_domain::{DefeaterSeverity, DefeaterType, ExtendedDefeater};
///
/// let change = ExtendedDefeater::new(
///     DefeaterType::CodeChange, DefeaterSeverity::Partial, "edited", vec![], 0.3,
/// ).unwrap().with_id("change");
/// let revert = ExtendedDefeater::new(
///     DefeaterType::NewInfo, DefeaterSeverity::Full, "edit reverted", vec![], 1.0,
/// ).unwrap().with_id("revert");
///
/// let change = add_meta_defeater(&change, &revert.id);
/// let all = vec![change.clone(), revert];
/// assert!(!is_defeater_active(&change, &all));
/// ```
pub fn is_defeater_active<'a>(defeater: &'a ExtendedDefeater, all: &'a [ExtendedDefeater]) -> bool {
    Resolver::new(all).is_active(defeater)
}

/// The subset of `all` that is effectively active, in input order
pub fn get_effectively_active_defeaters(all: &[ExtendedDefeater]) -> Vec<&ExtendedDefeater> {
    let mut resolver = Resolver::new(all);
    all.iter().filter(|&d| resolver.is_active(d)).collect()
}

/// Copy of `defeater` with `meta_id` added to `defeated_by` (no duplicates)
pub fn add_meta_defeater(defeater: &ExtendedDefeater, meta_id: &DefeaterId) -> ExtendedDefeater {
    let mut updated = defeater.clone();
    let mut metas = updated.defeated_by.take().unwrap_or_default();
    if !metas.contains(meta_id) {
        metas.push(meta_id.clone());
    }
    updated.defeated_by = Some(metas);
    updated
}

/// Copy of `defeater` with `meta_id` removed from `defeated_by`
///
/// The field is dropped entirely once the list is empty.
pub fn remove_meta_defeater(defeater: &ExtendedDefeater, meta_id: &DefeaterId) -> ExtendedDefeater {
    let mut updated = defeater.clone();
    updated.defeated_by = updated
        .defeated_by
        .take()
        .map(|metas| metas.into_iter().filter(|id| id != meta_id).collect::<Vec<_>>())
        .filter(|metas| !metas.is_empty());
    updated
}

/// Copy of `defeater` marked resolved
pub fn resolve_defeater(defeater: &ExtendedDefeater) -> ExtendedDefeater {
    defeater.clone().with_status(DefeaterStatus::Resolved)
}

/// Copy of `defeater` marked ignored
pub fn ignore_defeater(defeater: &ExtendedDefeater) -> ExtendedDefeater {
    defeater.clone().with_status(DefeaterStatus::Ignored)
}

/// Copy of `defeater` confirmed as active
pub fn activate_defeater(defeater: &ExtendedDefeater) -> ExtendedDefeater {
    defeater.clone().with_status(DefeaterStatus::Active)
}
