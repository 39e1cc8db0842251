//! SQL text building for MySQL-family DDL.
//!
//! Statements are accumulated token by token in a [`Builder`], which takes
//! care of spacing, identifier quoting, parenthesizing and (optionally)
//! indenting multi-clause bodies.

mod builder;
pub use builder::*;

/// The default MySQL identifier quote.
pub const BACKTICK: char = '`';

/// A MySQL string literal wrapper.
///
/// Display writes the value quoted with single quotes, doubling embedded
/// single quotes and escaping backslashes.
///
/// # Example
/// ```
/// use sluice_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            match c {
                '\'' => write!(f, "''")?,
                '\\' => write!(f, "\\\\")?,
                c => write!(f, "{}", c)?,
            }
        }
        write!(f, "'")
    }
}

/// An identifier wrapper, quoted with the given quote character.
///
/// Display writes the value quoted, doubling any embedded quote.
///
/// # Example
/// ```
/// use sluice_sql::Ident;
/// assert_eq!(format!("{}", Ident("user", '`')), "`user`");
/// assert_eq!(format!("{}", Ident("bla`h", '`')), "`bla``h`");
/// ```
pub struct Ident<T: AsRef<str>>(pub T, pub char);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let quote = self.1;
        write!(f, "{}", quote)?;
        for c in self.0.as_ref().chars() {
            if c == quote {
                write!(f, "{}{}", quote, quote)?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "{}", quote)
    }
}

/// Escape a string literal for SQL.
pub fn escape_string(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Quote a string value unless it is already a quoted literal.
///
/// ```
/// use sluice_sql::quote;
/// assert_eq!(quote("abc"), "'abc'");
/// assert_eq!(quote("'abc'"), "'abc'");
/// assert_eq!(quote("\"abc\""), "\"abc\"");
/// ```
pub fn quote(s: &str) -> String {
    if is_quoted(s, &['"', '\'']) {
        s.to_string()
    } else {
        escape_string(s)
    }
}

/// Reports whether `s` is a single literal enclosed in one of `quotes`.
///
/// Inner occurrences of the enclosing quote must be escaped, either doubled
/// or preceded by a backslash.
pub fn is_quoted(s: &str, quotes: &[char]) -> bool {
    let mut chars = s.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return false;
    };
    if first != last || !quotes.contains(&first) {
        return false;
    }

    let mut inner = chars.peekable();
    while let Some(c) = inner.next() {
        if c == '\\' {
            inner.next();
        } else if c == first {
            if inner.peek() == Some(&first) {
                inner.next();
            } else {
                return false;
            }
        }
    }
    true
}

/// Wrap `expr` in parentheses unless the whole expression already is.
///
/// ```
/// use sluice_sql::may_wrap;
/// assert_eq!(may_wrap("a > 0"), "(a > 0)");
/// assert_eq!(may_wrap("(a > 0)"), "(a > 0)");
/// assert_eq!(may_wrap("(a) + (b)"), "((a) + (b))");
/// ```
pub fn may_wrap(expr: &str) -> String {
    if is_wrapped(expr) {
        expr.to_string()
    } else {
        format!("({expr})")
    }
}

/// Reports whether the outermost parentheses of `expr` enclose all of it.
pub fn is_wrapped(expr: &str) -> bool {
    let expr = expr.trim();
    if !expr.starts_with('(') || !expr.ends_with(')') {
        return false;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let last = expr.len() - 1;
    for (i, c) in expr.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
