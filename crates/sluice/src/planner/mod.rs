//! The plan orchestrator.
//!
//! Planning runs in stages:
//! 1. schema-level changes (create/drop/alter database) are planned first,
//! 2. foreign-key cycles among table creations are detached,
//! 3. table changes are planned in order, alterations batched per table,
//! 4. view changes are ordered and planned last.
//!
//! Each call to [`Planner::plan`] works on its own [`State`]; the planner
//! itself is immutable and can be shared across threads.

mod alter;
mod emit;
mod schema;
mod table;
mod view;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use sluice_sql::Builder;

use crate::{
    Capabilities, Change, ChangeOrdering, Config, DefaultOrdering, Error, Plan, PlanOptions,
    Result, Statement,
};

/// Compiles change sets into [`Plan`]s for one target server.
#[derive(Clone)]
pub struct Planner {
    caps: Capabilities,
    options: PlanOptions,
    ordering: Arc<dyn ChangeOrdering + Send + Sync>,
}

impl Planner {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            options: PlanOptions::default(),
            ordering: Arc::new(DefaultOrdering),
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self::new(config.capabilities).with_options(config.options)
    }

    pub fn with_options(mut self, options: PlanOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the cycle-detaching and view-ordering strategy.
    pub fn with_ordering(mut self, ordering: impl ChangeOrdering + Send + Sync + 'static) -> Self {
        self.ordering = Arc::new(ordering);
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Plan the given changes.
    ///
    /// Planning stops at the first error; no partial plan is returned.
    pub fn plan(&self, name: &str, changes: &[Change]) -> Result<Plan> {
        let span = tracing::debug_span!("plan", name, changes = changes.len());
        let _enter = span.enter();

        if self.options.schema_qualifier.is_some() {
            check_scope(changes)?;
        }

        let mut state = State::new(&self.caps, &self.options);
        let planned = state.top_level(changes)?;
        let planned = self.ordering.detach_cycles(planned)?;

        let mut views = Vec::new();
        for change in planned {
            match &change {
                Change::AddTable {
                    table,
                    if_not_exists,
                } => state.add_table(table, *if_not_exists, &change)?,
                Change::DropTable { table, if_exists } => {
                    state.drop_table(table, *if_exists, &change)?
                }
                Change::ModifyTable { table, changes } => state.modify_table(table, changes)?,
                Change::RenameTable { from, to } => state.rename_table(from, to, &change),
                Change::AddView(_)
                | Change::DropView { .. }
                | Change::ModifyView { .. }
                | Change::RenameView { .. } => views.push(change.clone()),
                Change::AddSchema { .. }
                | Change::DropSchema { .. }
                | Change::ModifySchema { .. }
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
            }
        }

        for change in self.ordering.order_views(views)? {
            state.view(&change)?;
        }

        let plan = Plan::new(name, state.statements);
        tracing::debug!(
            statements = plan.statements.len(),
            reversible = plan.reversible,
            "planned"
        );
        Ok(plan)
    }
}

impl fmt::Debug for Planner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Planner")
            .field("caps", &self.caps)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A plan scoped to one schema may not touch databases, nor tables of more
/// than one schema.
fn check_scope(changes: &[Change]) -> Result<()> {
    let mut names: IndexSet<&str> = IndexSet::new();
    for change in changes {
        if change.is_schema_level() {
            return Err(Error::Structural(format!(
                "{} is not allowed when the plan is scoped to one schema",
                change.kind_name()
            )));
        }
        names.extend(change.schema_names());
    }
    if names.len() > 1 {
        let names: Vec<String> = names.iter().map(|n| format!("{n:?}")).collect();
        return Err(Error::Structural(format!(
            "found {} schemas when the plan is scoped to one: {}",
            names.len(),
            names.join(", ")
        )));
    }
    Ok(())
}

/// The working accumulator of one planning call.
pub(crate) struct State<'a> {
    caps: &'a Capabilities,
    opts: &'a PlanOptions,
    statements: Vec<Statement>,
}

impl<'a> State<'a> {
    pub(crate) fn new(caps: &'a Capabilities, opts: &'a PlanOptions) -> Self {
        Self {
            caps,
            opts,
            statements: Vec::new(),
        }
    }

    /// A fresh state sharing this one's context, for computing reverses.
    fn scratch(&self) -> State<'a> {
        State::new(self.caps, self.opts)
    }

    /// A builder configured for this target.
    fn build(&self) -> Builder {
        Builder::new(self.caps.quote)
            .with_indent(self.opts.indent.clone())
            .with_qualifier(self.opts.schema_qualifier.clone())
    }

    fn append(&mut self, stmt: Statement) {
        tracing::debug!(
            comment = %stmt.comment,
            reversible = stmt.is_reversible(),
            "statement"
        );
        self.statements.push(stmt);
    }
}
