//! Table create, drop, rename and modify.

use sluice_schema::{Index, Table, TableRef};

use super::State;
use super::alter::prior_table;
use crate::{Change, ChangeKind, Error, Result, Statement};

impl State<'_> {
    pub(super) fn add_table(
        &mut self,
        table: &Table,
        if_not_exists: bool,
        source: &Change,
    ) -> Result<()> {
        if table.columns.is_empty() {
            return Err(Error::Structural(format!(
                "table {:?} has no columns",
                table.name
            )));
        }

        let mut errors = Vec::new();
        let mut b = self.build();
        b.p("CREATE TABLE");
        if if_not_exists {
            b.p("IF NOT EXISTS");
        }
        b.table(&table.name, table.schema_name());
        b.wrap_indent(|b| {
            b.map_indent(&table.columns, |c, b| {
                if let Err(e) = self.column(b, table, c) {
                    errors.push(e);
                }
            });
            if let Some(pk) = &table.primary_key {
                b.comma().nl().p("PRIMARY KEY");
                self.index_parts(b, pk);
            }
            if !table.indexes.is_empty() {
                b.comma();
            }
            b.map_indent(&table.indexes, |idx, b| self.index(b, idx));
            if !table.foreign_keys.is_empty() {
                b.comma();
                if let Err(e) = b.map_indent_err(&table.foreign_keys, |fk, b| {
                    self.foreign_key(b, table, fk)
                }) {
                    errors.push(e);
                }
            }
            for check in &table.checks {
                b.comma().nl();
                self.check(b, check);
            }
        });
        if !errors.is_empty() {
            return Err(Error::Table {
                action: "create",
                table: table.name.clone(),
                errors,
            });
        }

        let mut attrs = table.attrs.clone();
        if attrs.auto_increment.is_none() {
            attrs.auto_increment = table
                .columns
                .iter()
                .filter_map(|c| c.attrs.auto_increment)
                .find(|&seed| seed > 0);
        }
        self.table_attrs(&mut b, &attrs);

        let mut reverse = self.build();
        reverse.p("DROP TABLE").table(&table.name, table.schema_name());
        self.append(Statement {
            forward: b.into_string(),
            reverse: Some(reverse.into_string()),
            comment: format!("create {:?} table", table.name),
            source: source.clone(),
        });
        Ok(())
    }

    pub(super) fn drop_table(
        &mut self,
        table: &Table,
        if_exists: bool,
        source: &Change,
    ) -> Result<()> {
        let mut scratch = self.scratch();
        let create = Change::AddTable {
            table: table.clone(),
            if_not_exists: false,
        };
        scratch
            .add_table(table, false, &create)
            .map_err(|e| {
                e.context(format!("calculate reverse for drop table {:?}", table.name))
            })?;
        let reverse = scratch.statements.pop().map(|s| s.forward);

        let mut b = self.build();
        b.p("DROP TABLE");
        if if_exists {
            b.p("IF EXISTS");
        }
        b.table(&table.name, table.schema_name());
        self.append(Statement {
            forward: b.into_string(),
            reverse,
            comment: format!("drop {:?} table", table.name),
            source: source.clone(),
        });
        Ok(())
    }

    /// Plan the alteration of one table in at most two statements: the
    /// first drops what the second re-adds, since the engine refuses to drop
    /// and add the same constraint in one `ALTER TABLE`.
    pub(super) fn modify_table(&mut self, table: &Table, changes: &[Change]) -> Result<()> {
        if table.columns.is_empty() {
            return Err(Error::Structural(format!(
                "table {:?} has no columns; drop the table instead",
                table.name
            )));
        }

        let mut phases: [Vec<Change>; 2] = Default::default();
        for change in skip_auto_changes(changes) {
            match change {
                Change::ModifyForeignKey { from, to, change } => {
                    phases[0].push(Change::DropForeignKey(from.clone()));
                    // The index the engine created for the old reference.
                    if change.intersects(ChangeKind::reference()) {
                        let name = from.symbol.clone().unwrap_or_default();
                        phases[0].push(Change::DropIndex(Index::new(name, Vec::new())));
                    }
                    phases[1].push(Change::AddForeignKey(to.clone()));
                }
                Change::ModifyIndex { from, to, .. } => {
                    phases[0].push(Change::DropIndex(from.clone()));
                    phases[1].push(Change::AddIndex(to.clone()));
                }
                Change::DropAttr(attr) => {
                    return Err(Error::Structural(format!(
                        "unsupported change type: {}",
                        attr.kind_name()
                    )));
                }
                other => phases[1].push(other.clone()),
            }
        }

        let prior = prior_table(table, changes);
        for phase in phases {
            if !phase.is_empty() {
                self.alter_table(table, &prior, phase)?;
            }
        }
        Ok(())
    }

    pub(super) fn rename_table(&mut self, from: &TableRef, to: &TableRef, source: &Change) {
        let stmt = Statement {
            forward: self.rename(from, to),
            reverse: Some(self.rename(to, from)),
            comment: format!("rename a table from {:?} to {:?}", from.name, to.name),
            source: source.clone(),
        };
        self.append(stmt);
    }

    /// `RENAME TABLE`, which renames views too.
    pub(super) fn rename(&self, from: &TableRef, to: &TableRef) -> String {
        let mut b = self.build();
        b.p("RENAME TABLE")
            .table(&from.name, from.schema.as_deref())
            .p("TO")
            .table(&to.name, to.schema.as_deref());
        b.into_string()
    }
}

/// Drop the index drops the engine performs on its own: an index whose
/// key parts are all columns being dropped goes away with them.
fn skip_auto_changes(changes: &[Change]) -> impl Iterator<Item = &Change> {
    let dropped: Vec<&str> = changes
        .iter()
        .filter_map(|c| match c {
            Change::DropColumn(col) => Some(col.name.as_str()),
            _ => None,
        })
        .collect();

    changes.iter().filter(move |change| {
        let Change::DropIndex(idx) = change else {
            return true;
        };
        let implied = !idx.parts.is_empty()
            && idx
                .parts
                .iter()
                .all(|part| part.column_name().is_some_and(|c| dropped.contains(&c)));
        if implied {
            tracing::trace!(index = %idx.name, "index dropped along with its columns");
        }
        !implied
    })
}
