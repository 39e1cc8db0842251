//! Schema changes - the planner's input.
//!
//! A [`Change`] is one structural delta between a prior and a desired
//! schema. Changes are produced by a diffing stage outside this crate and
//! are never mutated by the planner. Table and schema modifications nest
//! their own sub-changes.

use std::fmt;

use bitflags::bitflags;
use sluice_schema::{Attr, Check, Column, ForeignKey, Index, Schema, Table, TableRef, View};

bitflags! {
    /// Which facets of an entity a `Modify*` change touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangeKind: u32 {
        const ATTR          = 1 << 0;
        const CHARSET       = 1 << 1;
        const COLLATE       = 1 << 2;
        const COMMENT       = 1 << 3;
        const NULL          = 1 << 4;
        const TYPE          = 1 << 5;
        const DEFAULT       = 1 << 6;
        const GENERATED     = 1 << 7;
        const UNIQUE        = 1 << 8;
        const PARTS         = 1 << 9;
        const COLUMN        = 1 << 10;
        const REF_COLUMN    = 1 << 11;
        const REF_TABLE     = 1 << 12;
        const UPDATE_ACTION = 1 << 13;
        const DELETE_ACTION = 1 << 14;
    }
}

impl ChangeKind {
    /// Facets that mean a foreign key points somewhere else.
    pub const fn reference() -> Self {
        Self::REF_COLUMN.union(Self::REF_TABLE)
    }
}

/// A single schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Create a database.
    AddSchema { schema: Schema, if_not_exists: bool },
    /// Drop a database.
    DropSchema { schema: Schema, if_exists: bool },
    /// Alter database attributes.
    ModifySchema { schema: Schema, changes: Vec<Change> },

    /// Create a table.
    AddTable { table: Table, if_not_exists: bool },
    /// Drop a table. `table` is its full prior definition.
    DropTable { table: Table, if_exists: bool },
    /// Alter a table. `table` is its desired definition.
    ModifyTable { table: Table, changes: Vec<Change> },
    /// Rename a table.
    RenameTable { from: TableRef, to: TableRef },

    AddColumn(Column),
    DropColumn(Column),
    ModifyColumn {
        from: Column,
        to: Column,
        change: ChangeKind,
    },
    RenameColumn { from: Column, to: Column },

    AddIndex(Index),
    DropIndex(Index),
    ModifyIndex {
        from: Index,
        to: Index,
        change: ChangeKind,
    },
    RenameIndex { from: Index, to: Index },

    AddPrimaryKey(Index),
    DropPrimaryKey(Index),
    ModifyPrimaryKey {
        from: Index,
        to: Index,
        change: ChangeKind,
    },

    AddForeignKey(ForeignKey),
    DropForeignKey(ForeignKey),
    ModifyForeignKey {
        from: ForeignKey,
        to: ForeignKey,
        change: ChangeKind,
    },

    AddCheck(Check),
    DropCheck(Check),
    ModifyCheck { from: Check, to: Check },

    /// Set a schema or table attribute.
    AddAttr(Attr),
    ModifyAttr { from: Attr, to: Attr },
    DropAttr(Attr),

    /// Create a view.
    AddView(View),
    /// Drop a view. `view` is its full prior definition.
    DropView { view: View, if_exists: bool },
    ModifyView { from: View, to: View },
    RenameView { from: TableRef, to: TableRef },
}

impl Change {
    /// The name of this change's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Change::AddSchema { .. } => "AddSchema",
            Change::DropSchema { .. } => "DropSchema",
            Change::ModifySchema { .. } => "ModifySchema",
            Change::AddTable { .. } => "AddTable",
            Change::DropTable { .. } => "DropTable",
            Change::ModifyTable { .. } => "ModifyTable",
            Change::RenameTable { .. } => "RenameTable",
            Change::AddColumn(_) => "AddColumn",
            Change::DropColumn(_) => "DropColumn",
            Change::ModifyColumn { .. } => "ModifyColumn",
            Change::RenameColumn { .. } => "RenameColumn",
            Change::AddIndex(_) => "AddIndex",
            Change::DropIndex(_) => "DropIndex",
            Change::ModifyIndex { .. } => "ModifyIndex",
            Change::RenameIndex { .. } => "RenameIndex",
            Change::AddPrimaryKey(_) => "AddPrimaryKey",
            Change::DropPrimaryKey(_) => "DropPrimaryKey",
            Change::ModifyPrimaryKey { .. } => "ModifyPrimaryKey",
            Change::AddForeignKey(_) => "AddForeignKey",
            Change::DropForeignKey(_) => "DropForeignKey",
            Change::ModifyForeignKey { .. } => "ModifyForeignKey",
            Change::AddCheck(_) => "AddCheck",
            Change::DropCheck(_) => "DropCheck",
            Change::ModifyCheck { .. } => "ModifyCheck",
            Change::AddAttr(_) => "AddAttr",
            Change::ModifyAttr { .. } => "ModifyAttr",
            Change::DropAttr(_) => "DropAttr",
            Change::AddView(_) => "AddView",
            Change::DropView { .. } => "DropView",
            Change::ModifyView { .. } => "ModifyView",
            Change::RenameView { .. } => "RenameView",
        }
    }

    /// Reports whether this change creates, drops or alters a database.
    pub fn is_schema_level(&self) -> bool {
        matches!(
            self,
            Change::AddSchema { .. } | Change::DropSchema { .. } | Change::ModifySchema { .. }
        )
    }

    /// Reports whether this change targets a view.
    pub fn is_view_level(&self) -> bool {
        matches!(
            self,
            Change::AddView(_)
                | Change::DropView { .. }
                | Change::ModifyView { .. }
                | Change::RenameView { .. }
        )
    }

    /// The schemas this change touches, in order of appearance.
    ///
    /// Tables without an owning schema contribute nothing.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        match self {
            Change::AddTable { table: t, .. } | Change::DropTable { table: t, .. } => {
                table_schemas(&mut names, t, &[])
            }
            Change::ModifyTable { table: t, changes } => table_schemas(&mut names, t, changes),
            Change::AddView(v) | Change::DropView { view: v, .. } => {
                names.extend(v.schema_name());
            }
            Change::ModifyView { to, .. } => names.extend(to.schema_name()),
            Change::RenameTable { from, to } | Change::RenameView { from, to } => {
                names.extend(from.schema.as_deref());
                names.extend(to.schema.as_deref());
            }
            _ => {}
        }
        names.retain(|n| !n.is_empty());
        names
    }
}

fn table_schemas<'a>(names: &mut Vec<&'a str>, table: &'a Table, changes: &'a [Change]) {
    names.extend(table.schema_name());
    names.extend(
        table
            .foreign_keys
            .iter()
            .filter_map(|fk| fk.ref_table.schema.as_deref()),
    );
    for c in changes {
        if let Change::AddForeignKey(fk) | Change::ModifyForeignKey { to: fk, .. } = c {
            names.extend(fk.ref_table.schema.as_deref());
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::AddSchema { schema, .. } => write!(f, "+ schema {}", schema.name),
            Change::DropSchema { schema, .. } => write!(f, "- schema {}", schema.name),
            Change::ModifySchema { schema, changes } => {
                write!(f, "~ schema {} ({} changes)", schema.name, changes.len())
            }
            Change::AddTable { table, .. } => write!(f, "+ table {}", table.name),
            Change::DropTable { table, .. } => write!(f, "- table {}", table.name),
            Change::ModifyTable { table, changes } => {
                write!(f, "~ table {} ({} changes)", table.name, changes.len())
            }
            Change::RenameTable { from, to } => write!(f, "~ rename {} -> {}", from.name, to.name),
            Change::AddColumn(c) => write!(f, "+ column {} {}", c.name, c.ty),
            Change::DropColumn(c) => write!(f, "- column {}", c.name),
            Change::ModifyColumn { to, change, .. } => {
                write!(f, "~ column {} {:?}", to.name, change)
            }
            Change::RenameColumn { from, to } => {
                write!(f, "~ rename column {} -> {}", from.name, to.name)
            }
            Change::AddIndex(i) => write!(f, "+ index {}", i.name),
            Change::DropIndex(i) => write!(f, "- index {}", i.name),
            Change::ModifyIndex { to, .. } => write!(f, "~ index {}", to.name),
            Change::RenameIndex { from, to } => {
                write!(f, "~ rename index {} -> {}", from.name, to.name)
            }
            Change::AddPrimaryKey(_) => write!(f, "+ primary key"),
            Change::DropPrimaryKey(_) => write!(f, "- primary key"),
            Change::ModifyPrimaryKey { .. } => write!(f, "~ primary key"),
            Change::AddForeignKey(fk) => {
                write!(f, "+ foreign key ({}) -> {}", fk.columns.join(", "), fk.ref_table.name)
            }
            Change::DropForeignKey(fk) => {
                write!(f, "- foreign key ({}) -> {}", fk.columns.join(", "), fk.ref_table.name)
            }
            Change::ModifyForeignKey { to, .. } => {
                write!(f, "~ foreign key ({}) -> {}", to.columns.join(", "), to.ref_table.name)
            }
            Change::AddCheck(c) => write!(f, "+ check {}", c.expr),
            Change::DropCheck(c) => write!(f, "- check {}", c.expr),
            Change::ModifyCheck { to, .. } => write!(f, "~ check {}", to.expr),
            Change::AddAttr(a) => write!(f, "+ {}", a.kind_name()),
            Change::ModifyAttr { to, .. } => write!(f, "~ {}", to.kind_name()),
            Change::DropAttr(a) => write!(f, "- {}", a.kind_name()),
            Change::AddView(v) => write!(f, "+ view {}", v.name),
            Change::DropView { view, .. } => write!(f, "- view {}", view.name),
            Change::ModifyView { to, .. } => write!(f, "~ view {}", to.name),
            Change::RenameView { from, to } => {
                write!(f, "~ rename view {} -> {}", from.name, to.name)
            }
        }
    }
}
