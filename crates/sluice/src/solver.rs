//! Change ordering - breaks foreign-key cycles and sequences view changes.
//!
//! The planner renders changes in the order it receives them, so two things
//! must happen first:
//! 1. Table creations that reference each other in a loop are split: the
//!    creation whose foreign key closes the loop is emitted without it, and
//!    the key is added once every table exists.
//! 2. View changes are sorted so that a view is never created before the
//!    views it selects from, nor dropped after them.
//!
//! ## Example Problem
//!
//! ```text
//! -- This fails, whichever table comes first:
//! CREATE TABLE `user` (..., FOREIGN KEY (`pinned_id`) REFERENCES `post` (`id`));
//! CREATE TABLE `post` (..., FOREIGN KEY (`author_id`) REFERENCES `user` (`id`));
//!
//! -- This works:
//! CREATE TABLE `post` (...);
//! CREATE TABLE `user` (..., FOREIGN KEY (`pinned_id`) REFERENCES `post` (`id`));
//! ALTER TABLE `post` ADD FOREIGN KEY (`author_id`) REFERENCES `user` (`id`);
//! ```

use std::collections::BTreeSet;

use indexmap::IndexMap;
use sluice_schema::{ForeignKey, Table, TableRef};

use crate::{Change, Error, Result};

/// Orders changes before they are rendered.
///
/// Implementations must be deterministic: the same input yields the same
/// output.
pub trait ChangeOrdering {
    /// Return the changes with no cyclic foreign-key dependency among table
    /// creations.
    fn detach_cycles(&self, changes: Vec<Change>) -> Result<Vec<Change>>;

    /// Return the view changes in an order the server can execute.
    fn order_views(&self, changes: Vec<Change>) -> Result<Vec<Change>>;
}

/// The built-in ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOrdering;

impl ChangeOrdering for DefaultOrdering {
    fn detach_cycles(&self, changes: Vec<Change>) -> Result<Vec<Change>> {
        let slots: Vec<usize> = changes
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Change::AddTable { .. }))
            .map(|(i, _)| i)
            .collect();
        if slots.len() < 2 {
            return Ok(changes);
        }

        let tables: Vec<Table> = slots
            .iter()
            .filter_map(|&i| match &changes[i] {
                Change::AddTable { table, .. } => Some(table.clone()),
                _ => None,
            })
            .collect();

        // edges[i] = (fk index, referenced creation)
        let edges: Vec<Vec<(usize, usize)>> = tables
            .iter()
            .enumerate()
            .map(|(i, t)| {
                t.foreign_keys
                    .iter()
                    .enumerate()
                    .filter_map(|(k, fk)| {
                        let target = tables
                            .iter()
                            .position(|other| refers_to(&fk.ref_table, t, other))?;
                        (target != i).then_some((k, target))
                    })
                    .collect()
            })
            .collect();

        let back = back_edges(&edges);
        let deps: Vec<Vec<usize>> = edges
            .iter()
            .enumerate()
            .map(|(i, out)| {
                out.iter()
                    .filter(|(k, _)| !back.contains(&(i, *k)))
                    .map(|&(_, target)| target)
                    .collect()
            })
            .collect();
        let order = stable_topo(&deps).map_err(|_| {
            Error::Structural("foreign keys still cyclic after detaching back edges".into())
        })?;

        // Split creations whose keys were detached.
        let mut detached: IndexMap<usize, Vec<ForeignKey>> = IndexMap::new();
        for &(i, k) in &back {
            detached
                .entry(i)
                .or_default()
                .push(tables[i].foreign_keys[k].clone());
        }
        let mut creations: Vec<Change> = Vec::with_capacity(slots.len());
        for &i in &order {
            let Change::AddTable {
                table,
                if_not_exists,
            } = &changes[slots[i]]
            else {
                continue;
            };
            let mut table = table.clone();
            if let Some(fks) = detached.get(&i) {
                table.foreign_keys.retain(|fk| !fks.contains(fk));
            }
            creations.push(Change::AddTable {
                table,
                if_not_exists: *if_not_exists,
            });
        }
        // Detached keys are added in the order their tables were created.
        let mut rank = vec![0; order.len()];
        for (pos, &i) in order.iter().enumerate() {
            rank[i] = pos;
        }
        detached.sort_by(|a, _, b, _| rank[*a].cmp(&rank[*b]));

        let last = slots[slots.len() - 1];
        let mut creations = creations.into_iter();
        let mut planned = Vec::with_capacity(changes.len() + detached.len());
        for (pos, change) in changes.into_iter().enumerate() {
            if matches!(change, Change::AddTable { .. }) {
                planned.extend(creations.next());
            } else {
                planned.push(change);
            }
            if pos == last {
                for (&i, fks) in &detached {
                    tracing::debug!(
                        table = %tables[i].name,
                        count = fks.len(),
                        "detached cyclic foreign keys"
                    );
                    planned.push(Change::ModifyTable {
                        table: tables[i].clone(),
                        changes: fks.iter().cloned().map(Change::AddForeignKey).collect(),
                    });
                }
            }
        }
        Ok(planned)
    }

    fn order_views(&self, changes: Vec<Change>) -> Result<Vec<Change>> {
        let (drops, rest): (Vec<Change>, Vec<Change>) = changes
            .into_iter()
            .partition(|c| matches!(c, Change::DropView { .. }));

        // Dependents are dropped before what they select from: sort
        // dependencies-first and reverse.
        let mut drops = order_by_dependencies(drops)?;
        drops.reverse();
        let rest = order_by_dependencies(rest)?;

        Ok(drops.into_iter().chain(rest).collect())
    }
}

/// Reports whether a reference made from `from` points at `target`.
///
/// A reference without a schema resolves to the schema of the referencing
/// table.
fn refers_to(r: &TableRef, from: &Table, target: &Table) -> bool {
    let context = from.schema_name();
    r.name == target.name && r.schema.as_deref().or(context) == target.schema_name().or(context)
}

/// The `(node, fk index)` pairs whose edge closes a cycle in a depth-first
/// walk started from each node in order.
fn back_edges(edges: &[Vec<(usize, usize)>]) -> BTreeSet<(usize, usize)> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    fn visit(
        node: usize,
        edges: &[Vec<(usize, usize)>],
        marks: &mut [Mark],
        back: &mut BTreeSet<(usize, usize)>,
    ) {
        marks[node] = Mark::Active;
        for &(k, target) in &edges[node] {
            match marks[target] {
                Mark::New => visit(target, edges, marks, back),
                Mark::Active => {
                    back.insert((node, k));
                }
                Mark::Done => {}
            }
        }
        marks[node] = Mark::Done;
    }

    let mut marks = vec![Mark::New; edges.len()];
    let mut back = BTreeSet::new();
    for node in 0..edges.len() {
        if marks[node] == Mark::New {
            visit(node, edges, &mut marks, &mut back);
        }
    }
    back
}

/// Topologically sort nodes so that every node comes after its
/// dependencies, breaking ties by original position.
///
/// On a cycle, returns the nodes that could not be placed.
fn stable_topo(deps: &[Vec<usize>]) -> std::result::Result<Vec<usize>, Vec<usize>> {
    let mut placed = vec![false; deps.len()];
    let mut order = Vec::with_capacity(deps.len());
    while order.len() < deps.len() {
        let next = (0..deps.len()).find(|&i| !placed[i] && deps[i].iter().all(|&d| placed[d]));
        match next {
            Some(i) => {
                placed[i] = true;
                order.push(i);
            }
            None => return Err((0..deps.len()).filter(|&i| !placed[i]).collect()),
        }
    }
    Ok(order)
}

/// The view a change produces, and the views it selects from.
fn view_deps(change: &Change) -> (Option<TableRef>, Vec<TableRef>) {
    match change {
        Change::AddView(v) | Change::DropView { view: v, .. } => {
            (Some(v.view_ref()), v.depends_on.clone())
        }
        Change::ModifyView { to, .. } => (Some(to.view_ref()), to.depends_on.clone()),
        Change::RenameView { to, .. } => (Some(to.clone()), Vec::new()),
        _ => (None, Vec::new()),
    }
}

fn order_by_dependencies(changes: Vec<Change>) -> Result<Vec<Change>> {
    let nodes: Vec<_> = changes.iter().map(view_deps).collect();
    let deps: Vec<Vec<usize>> = nodes
        .iter()
        .enumerate()
        .map(|(i, (_, on))| {
            on.iter()
                .filter_map(|r| {
                    nodes.iter().enumerate().position(|(j, (produced, _))| {
                        j != i && produced.as_ref().is_some_and(|p| same_view(r, p))
                    })
                })
                .collect()
        })
        .collect();

    let order = stable_topo(&deps).map_err(|stuck| {
        Error::Cycle(
            stuck
                .iter()
                .filter_map(|&i| nodes[i].0.as_ref().map(|r| r.name.clone()))
                .collect(),
        )
    })?;

    let mut changes: Vec<Option<Change>> = changes.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| changes[i].take()).collect())
}

fn same_view(a: &TableRef, b: &TableRef) -> bool {
    a.name == b.name && (a.schema.is_none() || b.schema.is_none() || a.schema == b.schema)
}
