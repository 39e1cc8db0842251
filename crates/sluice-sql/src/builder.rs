//! Token-oriented statement builder.

use crate::{BACKTICK, Ident};

/// Accumulates a SQL statement phrase by phrase.
///
/// Phrases are separated by a single space, except right after an opening
/// parenthesis or whitespace, such as a line break and its indent. When an
/// indent is configured, bodies built with [`Builder::wrap_indent`] and
/// [`Builder::nl`] are laid out one item per line; otherwise they stay on a
/// single line.
#[derive(Debug, Clone)]
pub struct Builder {
    buf: String,
    quote: char,
    indent: Option<String>,
    qualifier: Option<String>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(BACKTICK)
    }
}

impl Builder {
    /// Create an empty builder quoting identifiers with `quote`.
    pub fn new(quote: char) -> Self {
        Self {
            buf: String::new(),
            quote,
            indent: None,
            qualifier: None,
        }
    }

    /// Lay out indented bodies with the given indent string.
    ///
    /// An empty indent behaves like no indent at all.
    pub fn with_indent(mut self, indent: Option<String>) -> Self {
        self.indent = indent.filter(|i| !i.is_empty());
        self
    }

    /// Override how table names are schema-qualified.
    ///
    /// `None` qualifies a table with its own schema (if any), `Some("")`
    /// never qualifies, and `Some(s)` always qualifies with `s`.
    pub fn with_qualifier(mut self, qualifier: Option<String>) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// An empty builder sharing this builder's settings.
    pub fn fork(&self) -> Self {
        Self {
            buf: String::new(),
            quote: self.quote,
            indent: self.indent.clone(),
            qualifier: self.qualifier.clone(),
        }
    }

    fn separate(&mut self) {
        if !self.buf.is_empty() && !self.buf.ends_with(|c: char| c == '(' || c.is_whitespace()) {
            self.buf.push(' ');
        }
    }

    /// Append a phrase. Empty phrases are ignored.
    pub fn p(&mut self, phrase: impl AsRef<str>) -> &mut Self {
        let phrase = phrase.as_ref();
        if phrase.is_empty() {
            return self;
        }
        self.separate();
        self.buf.push_str(phrase);
        self
    }

    /// Append text verbatim, without a separating space.
    pub fn raw(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.buf.push_str(text.as_ref());
        self
    }

    /// Append a quoted identifier.
    pub fn ident(&mut self, name: impl AsRef<str>) -> &mut Self {
        let quoted = Ident(name.as_ref(), self.quote).to_string();
        self.p(quoted)
    }

    /// Append a table name, schema-qualified according to the builder's
    /// qualifier setting.
    pub fn table(&mut self, name: &str, schema: Option<&str>) -> &mut Self {
        let schema = match self.qualifier.as_deref() {
            Some("") => None,
            Some(qualifier) => Some(qualifier),
            None => schema.filter(|s| !s.is_empty()),
        };
        let rendered = match schema {
            Some(schema) => format!(
                "{}.{}",
                Ident(schema, self.quote),
                Ident(name, self.quote)
            ),
            None => Ident(name, self.quote).to_string(),
        };
        self.p(rendered)
    }

    /// Append a comma.
    pub fn comma(&mut self) -> &mut Self {
        if !self.buf.is_empty() {
            self.buf.push(',');
        }
        self
    }

    /// Break the line and indent, if an indent is configured.
    pub fn nl(&mut self) -> &mut Self {
        if let Some(indent) = &self.indent {
            self.buf.push('\n');
            self.buf.push_str(indent);
        }
        self
    }

    /// Wrap whatever `f` writes in parentheses.
    pub fn wrap(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.separate();
        self.buf.push('(');
        f(self);
        self.buf.push(')');
        self
    }

    /// Wrap a body in parentheses, closing on its own line when indenting.
    pub fn wrap_indent(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.separate();
        self.buf.push('(');
        f(self);
        if self.indent.is_some() {
            self.buf.push('\n');
        }
        self.buf.push(')');
        self
    }

    /// Write every item with `f`, separated by commas.
    pub fn map_comma<T>(&mut self, items: &[T], mut f: impl FnMut(&T, &mut Builder)) -> &mut Self {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            f(item, self);
        }
        self
    }

    /// Write every item on its own (indented) line, separated by commas.
    pub fn map_indent<T>(
        &mut self,
        items: &[T],
        mut f: impl FnMut(&T, &mut Builder),
    ) -> &mut Self {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.nl();
            f(item, self);
        }
        self
    }

    /// Fallible [`Builder::map_indent`]; stops at the first error.
    pub fn map_indent_err<T, E>(
        &mut self,
        items: &[T],
        mut f: impl FnMut(&T, &mut Builder) -> Result<(), E>,
    ) -> Result<&mut Self, E> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.nl();
            f(item, self)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

