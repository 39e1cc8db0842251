//! Database-level statements, planned before anything else.

use sluice_schema::{Attr, Schema};

use super::State;
use crate::{Change, Error, Result, Statement};

impl State<'_> {
    /// Plan schema-level changes and return the rest, in order.
    pub(super) fn top_level(&mut self, changes: &[Change]) -> Result<Vec<Change>> {
        let mut planned = Vec::with_capacity(changes.len());
        for change in changes {
            match change {
                Change::AddSchema {
                    schema,
                    if_not_exists,
                } => self.add_schema(schema, *if_not_exists, change),
                Change::DropSchema { schema, if_exists } => {
                    self.drop_schema(schema, *if_exists, change)
                }
                Change::ModifySchema { schema, changes } => {
                    self.modify_schema(schema, changes, change)?
                }
                other => planned.push(other.clone()),
            }
        }
        Ok(planned)
    }

    fn add_schema(&mut self, schema: &Schema, if_not_exists: bool, source: &Change) {
        let mut b = self.build();
        b.p("CREATE DATABASE");
        if if_not_exists {
            b.p("IF NOT EXISTS");
        }
        b.ident(&schema.name);
        // Only spell out what differs from the server defaults.
        if let Some(charset) = non_default(schema.attrs.charset.as_deref(), &self.caps.charset) {
            b.p("CHARSET").p(charset);
        }
        if let Some(collation) = non_default(schema.attrs.collation.as_deref(), &self.caps.collation) {
            b.p("COLLATE").p(collation);
        }
        let mut reverse = self.build();
        reverse.p("DROP DATABASE").ident(&schema.name);
        self.append(Statement {
            forward: b.into_string(),
            reverse: Some(reverse.into_string()),
            comment: format!("add new schema named {:?}", schema.name),
            source: source.clone(),
        });
    }

    fn drop_schema(&mut self, schema: &Schema, if_exists: bool, source: &Change) {
        let mut b = self.build();
        b.p("DROP DATABASE");
        if if_exists {
            b.p("IF EXISTS");
        }
        b.ident(&schema.name);
        self.append(Statement {
            forward: b.into_string(),
            reverse: None,
            comment: format!("drop schema named {:?}", schema.name),
            source: source.clone(),
        });
    }

    fn modify_schema(&mut self, schema: &Schema, changes: &[Change], source: &Change) -> Result<()> {
        let (mut b, mut r) = (self.build(), self.build());
        for change in changes {
            match change {
                Change::AddAttr(Attr::Charset(v)) => {
                    if let Some(v) = non_default(Some(v.as_str()), &self.caps.charset) {
                        b.p("CHARSET").p(v);
                        r.p("CHARSET").p(&self.caps.charset);
                    }
                }
                Change::AddAttr(Attr::Collation(v)) => {
                    if let Some(v) = non_default(Some(v.as_str()), &self.caps.collation) {
                        b.p("COLLATE").p(v);
                        r.p("COLLATE").p(&self.caps.collation);
                    }
                }
                Change::ModifyAttr {
                    from: Attr::Charset(from),
                    to: Attr::Charset(to),
                } => {
                    b.p("CHARSET").p(to);
                    r.p("CHARSET").p(from);
                }
                Change::ModifyAttr {
                    from: Attr::Collation(from),
                    to: Attr::Collation(to),
                } => {
                    b.p("COLLATE").p(to);
                    r.p("COLLATE").p(from);
                }
                Change::ModifyAttr { from, to } => {
                    return Err(Error::Structural(format!(
                        "mismatch ModifyAttr attributes: {} != {}",
                        to.kind_name(),
                        from.kind_name()
                    )));
                }
                Change::AddAttr(a) => {
                    return Err(Error::Structural(format!(
                        "unexpected schema AddAttr: {}",
                        a.kind_name()
                    )));
                }
                other => {
                    return Err(Error::Structural(format!(
                        "unsupported ModifySchema change {}",
                        other.kind_name()
                    )));
                }
            }
        }
        if b.is_empty() {
            return Ok(());
        }

        let mut forward = self.build();
        forward.p("ALTER DATABASE").ident(&schema.name);
        let mut reverse = forward.clone();
        forward.p(b.as_str());
        reverse.p(r.as_str());
        self.append(Statement {
            forward: forward.into_string(),
            reverse: Some(reverse.into_string()),
            comment: format!("modify {:?} schema", schema.name),
            source: source.clone(),
        });
        Ok(())
    }
}

fn non_default<'v>(value: Option<&'v str>, default: &str) -> Option<&'v str> {
    value.filter(|v| !v.is_empty() && *v != default)
}
