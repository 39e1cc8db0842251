//! `ALTER TABLE` batching.
//!
//! Every clause is rendered together with the change that undoes it. The
//! reverse statement is the same batch built from those inverse changes in
//! opposite order, and exists only when every clause has an inverse.

use sluice_schema::{Attr, Column, Table};
use sluice_sql::Builder;

use super::State;
use crate::{Change, Error, Result, Statement};

/// What undoes one rendered clause.
enum Inverse {
    Change(Change),
    /// The engine restores it along with another inverse.
    Implicit,
    Irreversible,
}

/// A rendered `ALTER TABLE` batch.
struct Alteration {
    /// `None` when no clause produced any text.
    forward: Option<String>,
    inverse: Vec<Change>,
    reversible: bool,
}

impl State<'_> {
    /// Alter `table` into its desired shape. `prior` is the table as it was
    /// before the whole modification, which the reverse statement restores.
    pub(super) fn alter_table(
        &mut self,
        table: &Table,
        prior: &Table,
        changes: Vec<Change>,
    ) -> Result<()> {
        let alteration = self.alter_body(table, &changes, "alter")?;
        let Some(forward) = alteration.forward else {
            return Ok(());
        };

        let reverse = if alteration.reversible {
            let mut inverse = alteration.inverse;
            inverse.reverse();
            self.alter_body(prior, &inverse, "reversed alter")?.forward
        } else {
            None
        };

        self.append(Statement {
            forward,
            reverse,
            comment: format!("modify {:?} table", table.name),
            source: Change::ModifyTable {
                table: table.clone(),
                changes,
            },
        });
        Ok(())
    }

    fn alter_body(
        &self,
        table: &Table,
        changes: &[Change],
        action: &'static str,
    ) -> Result<Alteration> {
        let fail = |errors: Vec<Error>| Error::Table {
            action,
            table: table.name.clone(),
            errors,
        };

        let mut b = self.build();
        b.p("ALTER TABLE").table(&table.name, table.schema_name());

        let mut clauses = 0;
        let mut column_errors = Vec::new();
        let mut inverse = Vec::new();
        let mut reversible = true;
        for change in changes {
            let mut clause = b.fork();
            let undo = self
                .alter_clause(&mut clause, table, change, &mut column_errors)
                .map_err(|e| fail(vec![e]))?;
            if clause.is_empty() {
                continue;
            }
            if clauses > 0 {
                b.comma();
            }
            b.p(clause.as_str());
            clauses += 1;
            match undo {
                Inverse::Change(c) => inverse.push(c),
                Inverse::Implicit => {}
                Inverse::Irreversible => reversible = false,
            }
        }
        if !column_errors.is_empty() {
            return Err(fail(column_errors));
        }

        Ok(Alteration {
            forward: (clauses > 0).then(|| b.into_string()),
            inverse,
            reversible,
        })
    }

    /// Render one clause into `b` and return its inverse.
    ///
    /// Column definition errors are pushed to `column_errors` so all of a
    /// table's column problems surface together; anything else fails the
    /// clause.
    fn alter_clause(
        &self,
        b: &mut Builder,
        table: &Table,
        change: &Change,
        column_errors: &mut Vec<Error>,
    ) -> Result<Inverse> {
        let inverse = match change {
            Change::AddColumn(c) => {
                b.p("ADD COLUMN");
                collect(column_errors, self.column(b, table, c));
                Change::DropColumn(c.clone())
            }
            Change::ModifyColumn { from, to, change } => {
                if let Err(e) = check_change_generated(from, to) {
                    column_errors.push(e);
                    return Ok(Inverse::Irreversible);
                }
                b.p("MODIFY COLUMN");
                collect(column_errors, self.column(b, table, to));
                Change::ModifyColumn {
                    from: to.clone(),
                    to: from.clone(),
                    change: *change,
                }
            }
            Change::RenameColumn { from, to } => {
                if self.caps.supports_rename_column {
                    b.p("RENAME COLUMN").ident(&from.name).p("TO").ident(&to.name);
                } else {
                    b.p("CHANGE COLUMN").ident(&from.name);
                    collect(column_errors, self.column(b, table, to));
                }
                Change::RenameColumn {
                    from: to.clone(),
                    to: from.clone(),
                }
            }
            Change::DropColumn(c) => {
                b.p("DROP COLUMN").ident(&c.name);
                Change::AddColumn(c.clone())
            }

            Change::AddIndex(idx) => {
                b.p("ADD");
                self.index(b, idx);
                Change::DropIndex(idx.clone())
            }
            Change::RenameIndex { from, to } => {
                b.p("RENAME INDEX").ident(&from.name).p("TO").ident(&to.name);
                Change::RenameIndex {
                    from: to.clone(),
                    to: from.clone(),
                }
            }
            Change::DropIndex(idx) => {
                b.p("DROP INDEX").ident(&idx.name);
                // A part-less index stands for the one backing a foreign key.
                if idx.parts.is_empty() {
                    return Ok(Inverse::Implicit);
                }
                Change::AddIndex(idx.clone())
            }

            Change::AddPrimaryKey(pk) => {
                b.p("ADD PRIMARY KEY");
                self.index_parts(b, pk);
                Change::DropPrimaryKey(pk.clone())
            }
            Change::DropPrimaryKey(pk) => {
                b.p("DROP PRIMARY KEY");
                Change::AddPrimaryKey(pk.clone())
            }
            Change::ModifyPrimaryKey { from, to, change } => {
                b.p("DROP PRIMARY KEY").comma().p("ADD PRIMARY KEY");
                self.index_parts(b, to);
                Change::ModifyPrimaryKey {
                    from: to.clone(),
                    to: from.clone(),
                    change: *change,
                }
            }

            Change::AddForeignKey(fk) => {
                b.p("ADD");
                self.foreign_key(b, table, fk)?;
                if fk.symbol.is_none() {
                    return Ok(Inverse::Irreversible);
                }
                Change::DropForeignKey(fk.clone())
            }
            Change::DropForeignKey(fk) => {
                let Some(symbol) = &fk.symbol else {
                    return Err(Error::Structural(
                        "cannot drop unnamed foreign key".to_string(),
                    ));
                };
                b.p("DROP FOREIGN KEY").ident(symbol);
                Change::AddForeignKey(fk.clone())
            }

            Change::AddAttr(attr) => {
                self.table_attr(b, attr, false);
                return Ok(Inverse::Irreversible);
            }
            Change::ModifyAttr { from, to } => {
                self.table_attr(b, to, true);
                Change::ModifyAttr {
                    from: to.clone(),
                    to: from.clone(),
                }
            }
            Change::DropAttr(attr) => {
                return Err(Error::Structural(format!(
                    "unsupported change type: {}",
                    attr.kind_name()
                )));
            }

            Change::AddCheck(check) => {
                b.p("ADD");
                self.check(b, check);
                if check.name.is_none() {
                    return Ok(Inverse::Irreversible);
                }
                Change::DropCheck(check.clone())
            }
            Change::DropCheck(check) => {
                let Some(name) = &check.name else {
                    return Err(Error::Structural(
                        "cannot drop unnamed check constraint".to_string(),
                    ));
                };
                b.p("DROP CONSTRAINT").ident(name);
                Change::AddCheck(check.clone())
            }
            Change::ModifyCheck { from, to } => {
                let Some(name) = &from.name else {
                    return Err(Error::Structural(
                        "cannot modify unnamed check constraint".to_string(),
                    ));
                };
                if from.name != to.name {
                    return Err(Error::Structural(format!(
                        "mismatch check constraint names: {:?} != {:?}",
                        name,
                        to.name.as_deref().unwrap_or_default()
                    )));
                }
                if from.expr != to.expr {
                    b.p("DROP CHECK").ident(name).comma().p("ADD");
                    self.check(b, to);
                } else if self.caps.supports_enforce_check
                    && from.is_enforced() != to.is_enforced()
                {
                    b.p("ALTER CHECK").ident(name);
                    b.p(if to.is_enforced() {
                        "ENFORCED"
                    } else {
                        "NOT ENFORCED"
                    });
                } else {
                    return Err(Error::UnrecognizedChange(
                        "unknown check constraint change".to_string(),
                    ));
                }
                Change::ModifyCheck {
                    from: to.clone(),
                    to: from.clone(),
                }
            }

            Change::AddSchema { .. }
            | Change::DropSchema { .. }
            | Change::ModifySchema { .. }
            | Change::AddTable { .. }
            | Change::DropTable { .. }
            | Change::ModifyTable { .. }
            | Change::RenameTable { .. }
            | Change::ModifyIndex { .. }
            | Change::ModifyForeignKey { .. }
            | Change::AddView(_)
            | Change::DropView { .. }
            | Change::ModifyView { .. }
            | Change::RenameView { .. } => {
                return Err(Error::UnknownVariant(change.kind_name().to_string()));
            }
        };
        Ok(Inverse::Change(inverse))
    }
}

/// Rebuild the table as it was before `changes`, so clauses of a reverse
/// statement are checked against the columns they restore.
pub(super) fn prior_table(table: &Table, changes: &[Change]) -> Table {
    let mut prior = table.clone();
    for change in changes.iter().rev() {
        match change {
            Change::AddColumn(c) => prior.columns.retain(|p| p.name != c.name),
            Change::DropColumn(c) => {
                if prior.column(&c.name).is_none() {
                    prior.columns.push(c.clone());
                }
            }
            Change::ModifyColumn { from, to, .. } | Change::RenameColumn { from, to } => {
                match prior.columns.iter_mut().find(|p| p.name == to.name) {
                    Some(p) => *p = from.clone(),
                    None => prior.columns.push(from.clone()),
                }
            }
            Change::ModifyAttr { from: Attr::Charset(v), .. } => {
                prior.attrs.charset = Some(v.clone());
            }
            Change::ModifyAttr { from: Attr::Collation(v), .. } => {
                prior.attrs.collation = Some(v.clone());
            }
            _ => {}
        }
    }
    prior
}

fn collect(errors: &mut Vec<Error>, result: Result<()>) {
    if let Err(e) = result {
        errors.push(e);
    }
}

/// Generated columns can change their expression or type, but not become
/// or stop being generated, nor switch storage.
fn check_change_generated(from: &Column, to: &Column) -> Result<()> {
    match (&from.generated, &to.generated) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(Error::SemanticConflict(format!(
            "changing column {:?} to a generated column is not supported (drop and add is required)",
            from.name
        ))),
        (Some(_), None) => Err(Error::SemanticConflict(format!(
            "changing generated column {:?} to a non-generated column is not supported (drop and add is required)",
            from.name
        ))),
        (Some(a), Some(b)) if a.storage != b.storage => Err(Error::SemanticConflict(format!(
            "changing the store type of generated column {:?} from {:?} to {:?} is not supported",
            from.name,
            a.storage.as_str(),
            b.storage.as_str()
        ))),
        (Some(_), Some(_)) => Ok(()),
    }
}
