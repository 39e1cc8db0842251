//! View statements, rendered in the order the view ordering produced.

use sluice_schema::{TableRef, View};

use super::State;
use crate::{Change, Error, Result, Statement};

impl State<'_> {
    pub(super) fn view(&mut self, change: &Change) -> Result<()> {
        let stmt = match change {
            Change::AddView(view) => Statement {
                forward: self.define_view("CREATE VIEW", view),
                reverse: Some(self.drop_view(&view.view_ref(), false)),
                comment: format!("create {:?} view", view.name),
                source: change.clone(),
            },
            Change::DropView { view, if_exists } => Statement {
                forward: self.drop_view(&view.view_ref(), *if_exists),
                reverse: Some(self.define_view("CREATE VIEW", view)),
                comment: format!("drop {:?} view", view.name),
                source: change.clone(),
            },
            Change::ModifyView { from, to } => Statement {
                forward: self.define_view("ALTER VIEW", to),
                reverse: Some(self.define_view("ALTER VIEW", from)),
                comment: format!("modify {:?} view", to.name),
                source: change.clone(),
            },
            Change::RenameView { from, to } => Statement {
                forward: self.rename(from, to),
                reverse: Some(self.rename(to, from)),
                comment: format!("rename a view from {:?} to {:?}", from.name, to.name),
                source: change.clone(),
            },
            Change::AddSchema { .. }
            | Change::DropSchema { .. }
            | Change::ModifySchema { .. }
            | Change::AddTable { .. }
            | Change::DropTable { .. }
            | Change::ModifyTable { .. }
            | Change::RenameTable { .. }
            | Change::AddColumn(_)
            | Change::DropColumn(_)
            | Change::ModifyColumn { .. }
            | Change::RenameColumn { .. }
            | Change::AddIndex(_)
            | Change::DropIndex(_)
            | Change::ModifyIndex { .. }
            | Change::RenameIndex { .. }
            | Change::AddPrimaryKey(_)
            | Change::DropPrimaryKey(_)
            | Change::ModifyPrimaryKey { .. }
            | Change::AddForeignKey(_)
            | Change::DropForeignKey(_)
            | Change::ModifyForeignKey { .. }
            | Change::AddCheck(_)
            | Change::DropCheck(_)
            | Change::ModifyCheck { .. }
            | Change::AddAttr(_)
            | Change::ModifyAttr { .. }
            | Change::DropAttr(_) => {
                return Err(Error::UnknownVariant(change.kind_name().to_string()));
            }
        };
        self.append(stmt);
        Ok(())
    }

    /// `CREATE VIEW` or `ALTER VIEW`, with the full definition.
    fn define_view(&self, verb: &str, view: &View) -> String {
        let mut b = self.build();
        b.p(verb)
            .table(&view.name, view.schema_name())
            .p("AS")
            .p(&view.def);
        if let Some(option) = view.check_option {
            b.p("WITH").p(option.as_str()).p("CHECK OPTION");
        }
        b.into_string()
    }

    fn drop_view(&self, view: &TableRef, if_exists: bool) -> String {
        let mut b = self.build();
        b.p("DROP VIEW");
        if if_exists {
            b.p("IF EXISTS");
        }
        b.table(&view.name, view.schema.as_deref());
        b.into_string()
    }
}
