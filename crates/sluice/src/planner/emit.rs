//! Clause emitters: one structural entity in, statement text out.

use sluice_schema::{
    Attr, Check, Column, ColumnType, DefaultValue, ForeignKey, Index, IndexMethod, IndexTarget,
    ReferenceAction, Table, TableAttrs,
};
use sluice_sql::{Builder, Ident, may_wrap, quote};

use super::State;
use crate::{AutoIncrementPolicy, Error, Result};

/// Raw defaults on temporal columns that are written as-is.
const CURRENT_TIMESTAMP: &[&str] = &["current_timestamp", "now(", "localtime", "localtimestamp"];

impl State<'_> {
    /// Write a column definition.
    pub(super) fn column(&self, b: &mut Builder, table: &Table, c: &Column) -> Result<()> {
        let ty = c.ty.format().map_err(|e| {
            Error::Structural(format!("format type for column {:?}: {e}", c.name))
        })?;
        b.ident(&c.name).p(&ty);

        if let Some(charset) = &c.attrs.charset {
            if !c.ty.supports_charset() {
                return Err(unsupported_attr(c, &ty, "CHARSET"));
            }
            if self.charset(table) != charset {
                b.p("CHARSET").p(charset);
            }
        }
        if let Some(generated) = &c.generated {
            b.p("AS")
                .p(may_wrap(&generated.expr))
                .p(generated.storage.as_str());
        }
        // MariaDB rejects NULL / NOT NULL on generated columns.
        if c.generated.is_none() || !self.caps.is_mariadb() {
            if !c.nullable {
                b.p("NOT");
            }
            b.p("NULL");
        }
        self.column_default(b, c);
        if c.ty.is_json() && self.caps.needs_json_check() && c.attrs.check.is_none() {
            let name = Ident(&c.name, self.caps.quote);
            b.p("CHECK").wrap(|b| {
                b.raw(format!("json_valid({name})"));
            });
        }
        if let Some(collation) = &c.attrs.collation {
            if !c.ty.supports_charset() {
                return Err(unsupported_attr(c, &ty, "COLLATE"));
            }
            if self.collation(table) != collation {
                b.p("COLLATE").p(collation);
            }
        }
        if let Some(on_update) = &c.attrs.on_update {
            b.p("ON UPDATE").p(on_update);
        }
        if c.attrs.auto_increment.is_some() {
            b.p("AUTO_INCREMENT");
        }
        if let Some(comment) = &c.attrs.comment {
            b.p("COMMENT").p(quote(comment));
        }
        Ok(())
    }

    fn column_default(&self, b: &mut Builder, c: &Column) {
        let value = match &c.default {
            None => return,
            Some(DefaultValue::Literal(v)) => {
                if c.ty.has_numeric_default() || is_hex(v) {
                    v.clone()
                } else {
                    quote(v)
                }
            }
            Some(DefaultValue::Raw(x)) => {
                if raw_default_is_bare(&c.ty, x) {
                    x.clone()
                } else {
                    quote(x)
                }
            }
        };
        b.p("DEFAULT").p(value);
    }

    /// The effective character set of a table's columns.
    fn charset<'t>(&'t self, table: &'t Table) -> &'t str {
        table.charset().unwrap_or(self.caps.charset.as_str())
    }

    /// The effective collation of a table's columns.
    fn collation<'t>(&'t self, table: &'t Table) -> &'t str {
        table.collation().unwrap_or(self.caps.collation.as_str())
    }

    /// Write an index definition, e.g. ``UNIQUE INDEX `ix` (`a`)``.
    pub(super) fn index(&self, b: &mut Builder, idx: &Index) {
        let fulltext = !idx.unique && idx.attrs.method == IndexMethod::FullText;
        if idx.unique {
            b.p("UNIQUE");
        } else if matches!(idx.attrs.method, IndexMethod::FullText | IndexMethod::Spatial) {
            b.p(idx.attrs.method.as_str());
        }
        b.p("INDEX").ident(&idx.name);
        self.index_parts(b, idx);
        if let Some(comment) = &idx.attrs.comment {
            b.p("COMMENT").p(quote(comment));
        }
        if fulltext && let Some(parser) = &idx.attrs.parser {
            b.p("WITH PARSER").ident(parser);
        }
    }

    /// Write the method and parenthesized key parts of an index.
    pub(super) fn index_parts(&self, b: &mut Builder, idx: &Index) {
        // BTREE is the default and never written.
        if idx.attrs.method == IndexMethod::Hash {
            b.p("USING HASH");
        }
        b.wrap(|b| {
            b.map_comma(&idx.parts, |part, b| {
                match &part.target {
                    IndexTarget::Column(name) => b.ident(name),
                    IndexTarget::Expr(expr) => b.p(may_wrap(expr)),
                };
                if let Some(len) = part.prefix {
                    b.raw(format!("({len})"));
                }
                if part.desc {
                    b.p("DESC");
                }
            });
        });
    }

    /// Write a foreign key constraint.
    pub(super) fn foreign_key(&self, b: &mut Builder, table: &Table, fk: &ForeignKey) -> Result<()> {
        let set_null = |a: Option<ReferenceAction>| a == Some(ReferenceAction::SetNull);
        if set_null(fk.on_update) || set_null(fk.on_delete) {
            let not_null = fk
                .columns
                .iter()
                .find(|name| table.column(name).is_some_and(|c| !c.nullable));
            if let Some(column) = not_null {
                return Err(Error::SemanticConflict(format!(
                    "foreign key constraint {:?} is SET NULL, but column {:?} is NOT NULL",
                    fk.symbol.as_deref().unwrap_or_default(),
                    column
                )));
            }
        }

        if let Some(symbol) = &fk.symbol {
            b.p("CONSTRAINT").ident(symbol);
        }
        b.p("FOREIGN KEY").wrap(|b| {
            b.map_comma(&fk.columns, |c, b| {
                b.ident(c);
            });
        });
        b.p("REFERENCES")
            .table(&fk.ref_table.name, fk.ref_table.schema.as_deref());
        b.wrap(|b| {
            b.map_comma(&fk.ref_columns, |c, b| {
                b.ident(c);
            });
        });
        if let Some(action) = fk.on_update {
            b.p("ON UPDATE").p(action.as_str());
        }
        if let Some(action) = fk.on_delete {
            b.p("ON DELETE").p(action.as_str());
        }
        Ok(())
    }

    /// Write a CHECK constraint.
    pub(super) fn check(&self, b: &mut Builder, c: &Check) {
        if let Some(name) = &c.name {
            b.p("CONSTRAINT").ident(name);
        }
        b.p("CHECK").p(may_wrap(&c.expr));
        if self.caps.supports_enforce_check
            && let Some(enforced) = c.enforced
        {
            b.p(if enforced { "ENFORCED" } else { "NOT ENFORCED" });
        }
    }

    /// Write the table options of a created table.
    pub(super) fn table_attrs(&self, b: &mut Builder, attrs: &TableAttrs) {
        for attr in attrs.to_attrs() {
            self.table_attr(b, &attr, false);
        }
    }

    /// Write one table option. `altering` is set when the option replaces an
    /// existing value.
    pub(super) fn table_attr(&self, b: &mut Builder, attr: &Attr, altering: bool) {
        match attr {
            Attr::Engine(engine) => {
                if altering || !engine.default {
                    b.p("ENGINE").p(&engine.name);
                }
            }
            Attr::Charset(v) => {
                b.p("CHARSET").p(v);
            }
            Attr::Collation(v) => {
                b.p("COLLATE").p(v);
            }
            Attr::Comment(v) => {
                b.p("COMMENT").p(quote(v));
            }
            Attr::CreateOptions(v) => {
                b.p(v);
            }
            Attr::AutoIncrement(seed) => {
                if self.opts.auto_increment == AutoIncrementPolicy::Emit && (altering || *seed > 1)
                {
                    b.p("AUTO_INCREMENT").p(seed.to_string());
                }
            }
        }
    }
}

fn unsupported_attr(c: &Column, ty: &str, attr: &str) -> Error {
    Error::Capability(format!(
        "column {:?} of type {ty} does not support the {attr} attribute",
        c.name
    ))
}

fn is_hex(v: &str) -> bool {
    v.len() > 2 && v.as_bytes()[..2].eq_ignore_ascii_case(b"0x")
}

/// Reports whether a raw default is written without quotes.
fn raw_default_is_bare(ty: &ColumnType, x: &str) -> bool {
    if is_hex(x) || ty.has_numeric_default() || (x.starts_with('(') && x.ends_with(')')) {
        return true;
    }
    let lower = x.to_lowercase();
    ty.is_time() && CURRENT_TIMESTAMP.iter().any(|k| lower.starts_with(k))
}
