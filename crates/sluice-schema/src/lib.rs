//! Relational schema types for sluice.
//!
//! These types describe the structural state of a MySQL-family schema:
//! databases, tables, columns, indexes, foreign keys, checks and views.
//! They carry no behavior beyond lookups and a few helpers shared by the
//! planner; in particular, attribute sets are plain optional-field records
//! so that presence can be checked without searching.

mod types;
pub use types::*;

/// A database (schema in MySQL terms).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub name: String,
    pub attrs: SchemaAttrs,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: SchemaAttrs::default(),
        }
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.attrs.charset = Some(charset.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.attrs.collation = Some(collation.into());
        self
    }
}

/// Database-level attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaAttrs {
    pub charset: Option<String>,
    pub collation: Option<String>,
}

/// A reference to a table (or view) by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn in_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

/// A database table definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Owning schema, if known
    pub schema: Option<Schema>,
    /// Columns, in definition order
    pub columns: Vec<Column>,
    pub primary_key: Option<Index>,
    /// Secondary indexes
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Table-level CHECK constraints
    pub checks: Vec<Check>,
    pub attrs: TableAttrs,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, pk: Index) -> Self {
        self.primary_key = Some(pk);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn with_attrs(mut self, attrs: TableAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Name of the owning schema.
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_ref().map(|s| s.name.as_str())
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// A reference to this table.
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            schema: self.schema_name().map(str::to_string),
            name: self.name.clone(),
        }
    }

    /// The character set declared on the table, or else on its schema.
    pub fn charset(&self) -> Option<&str> {
        self.attrs
            .charset
            .as_deref()
            .or_else(|| self.schema.as_ref()?.attrs.charset.as_deref())
    }

    /// The collation declared on the table, or else on its schema.
    pub fn collation(&self) -> Option<&str> {
        self.attrs
            .collation
            .as_deref()
            .or_else(|| self.schema.as_ref()?.attrs.collation.as_deref())
    }
}

/// A storage engine, e.g. `InnoDB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Engine {
    pub name: String,
    /// Whether this is the server's default engine.
    pub default: bool,
}

impl Engine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: false,
        }
    }

    pub fn server_default(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: true,
        }
    }
}

/// Table options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableAttrs {
    pub engine: Option<Engine>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    /// Free-form create options, passed through verbatim.
    pub create_options: Option<String>,
    /// Starting value of the auto-increment counter.
    pub auto_increment: Option<i64>,
}

impl TableAttrs {
    /// The attributes that are set, in the order they are written out.
    pub fn to_attrs(&self) -> Vec<Attr> {
        let mut attrs = Vec::new();
        if let Some(engine) = &self.engine {
            attrs.push(Attr::Engine(engine.clone()));
        }
        if let Some(charset) = &self.charset {
            attrs.push(Attr::Charset(charset.clone()));
        }
        if let Some(collation) = &self.collation {
            attrs.push(Attr::Collation(collation.clone()));
        }
        if let Some(comment) = &self.comment {
            attrs.push(Attr::Comment(comment.clone()));
        }
        if let Some(seed) = self.auto_increment {
            attrs.push(Attr::AutoIncrement(seed));
        }
        if let Some(options) = &self.create_options {
            attrs.push(Attr::CreateOptions(options.clone()));
        }
        attrs
    }
}

/// A single schema or table attribute, as carried by attribute changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attr {
    Engine(Engine),
    Charset(String),
    Collation(String),
    Comment(String),
    CreateOptions(String),
    AutoIncrement(i64),
}

impl Attr {
    /// Short name of the attribute kind, for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Attr::Engine(_) => "ENGINE",
            Attr::Charset(_) => "CHARSET",
            Attr::Collation(_) => "COLLATE",
            Attr::Comment(_) => "COMMENT",
            Attr::CreateOptions(_) => "create options",
            Attr::AutoIncrement(_) => "AUTO_INCREMENT",
        }
    }
}

/// A column default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefaultValue {
    /// A literal value, quoted when written unless numeric or hexadecimal.
    Literal(String),
    /// A raw SQL expression.
    Raw(String),
}

/// Whether a generated column is computed on read or materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratedStorage {
    #[default]
    Virtual,
    Stored,
}

impl GeneratedStorage {
    pub fn as_str(self) -> &'static str {
        match self {
            GeneratedStorage::Virtual => "VIRTUAL",
            GeneratedStorage::Stored => "STORED",
        }
    }
}

/// The expression of a generated column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneratedExpr {
    pub expr: String,
    pub storage: GeneratedStorage,
}

/// Column-level attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnAttrs {
    pub charset: Option<String>,
    pub collation: Option<String>,
    /// `ON UPDATE` action, e.g. `CURRENT_TIMESTAMP`.
    pub on_update: Option<String>,
    /// Set for `AUTO_INCREMENT` columns; a value above zero is the seed.
    pub auto_increment: Option<i64>,
    pub comment: Option<String>,
    /// A CHECK constraint bound to this column by inspection. Never written
    /// out; its presence means the column is already validated.
    pub check: Option<Check>,
}

/// A database column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub generated: Option<GeneratedExpr>,
    pub attrs: ColumnAttrs,
}

impl Column {
    /// A non-nullable column of the given type.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: None,
            generated: None,
            attrs: ColumnAttrs::default(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn generated_as(mut self, expr: impl Into<String>, storage: GeneratedStorage) -> Self {
        self.generated = Some(GeneratedExpr {
            expr: expr.into(),
            storage,
        });
        self
    }

    pub fn with_attrs(mut self, attrs: ColumnAttrs) -> Self {
        self.attrs = attrs;
        self
    }
}

/// Index method. B-tree is the engine default and never written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexMethod {
    #[default]
    BTree,
    Hash,
    FullText,
    Spatial,
}

impl IndexMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexMethod::BTree => "BTREE",
            IndexMethod::Hash => "HASH",
            IndexMethod::FullText => "FULLTEXT",
            IndexMethod::Spatial => "SPATIAL",
        }
    }
}

/// What an index part covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexTarget {
    Column(String),
    /// A functional key part.
    Expr(String),
}

/// A key part of an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexPart {
    pub target: IndexTarget,
    /// Prefix length, for string columns.
    pub prefix: Option<u32>,
    /// Descending order. Ascending is the default and never written out.
    pub desc: bool,
}

impl IndexPart {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            target: IndexTarget::Column(name.into()),
            prefix: None,
            desc: false,
        }
    }

    pub fn expr(expr: impl Into<String>) -> Self {
        Self {
            target: IndexTarget::Expr(expr.into()),
            prefix: None,
            desc: false,
        }
    }

    pub fn desc(mut self) -> Self {
        self.desc = true;
        self
    }

    pub fn with_prefix(mut self, len: u32) -> Self {
        self.prefix = Some(len);
        self
    }

    /// The column this part covers, if it is not an expression.
    pub fn column_name(&self) -> Option<&str> {
        match &self.target {
            IndexTarget::Column(name) => Some(name),
            IndexTarget::Expr(_) => None,
        }
    }
}

/// Index attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexAttrs {
    pub method: IndexMethod,
    /// Full-text parser plugin.
    pub parser: Option<String>,
    pub comment: Option<String>,
}

/// A database index (also used for primary keys).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub parts: Vec<IndexPart>,
    pub attrs: IndexAttrs,
}

impl Index {
    pub fn new(name: impl Into<String>, parts: Vec<IndexPart>) -> Self {
        Self {
            name: name.into(),
            unique: false,
            parts,
            attrs: IndexAttrs::default(),
        }
    }

    /// A primary key over the given columns.
    pub fn primary_key<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            "PRIMARY",
            columns.into_iter().map(IndexPart::column).collect(),
        )
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_method(mut self, method: IndexMethod) -> Self {
        self.attrs.method = method;
        self
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.attrs.parser = Some(parser.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.attrs.comment = Some(comment.into());
        self
    }
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferenceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceAction::NoAction => "NO ACTION",
            ReferenceAction::Restrict => "RESTRICT",
            ReferenceAction::Cascade => "CASCADE",
            ReferenceAction::SetNull => "SET NULL",
            ReferenceAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    /// Constraint name
    pub symbol: Option<String>,
    /// Column(s) in this table
    pub columns: Vec<String>,
    /// Referenced table
    pub ref_table: TableRef,
    /// Referenced column(s)
    pub ref_columns: Vec<String>,
    pub on_update: Option<ReferenceAction>,
    pub on_delete: Option<ReferenceAction>,
}

impl ForeignKey {
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        ref_table: TableRef,
        ref_columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            symbol: None,
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table,
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            on_update: None,
            on_delete: None,
        }
    }

    pub fn named(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn on_update(mut self, action: ReferenceAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn on_delete(mut self, action: ReferenceAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}

/// A CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Check {
    pub name: Option<String>,
    pub expr: String,
    /// Explicit enforcement; `None` leaves it to the server (enforced).
    pub enforced: Option<bool>,
}

impl Check {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            name: None,
            expr: expr.into(),
            enforced: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_enforced(mut self, enforced: bool) -> Self {
        self.enforced = Some(enforced);
        self
    }

    /// Whether the server enforces this check.
    pub fn is_enforced(&self) -> bool {
        self.enforced.unwrap_or(true)
    }
}

/// `WITH ... CHECK OPTION` of an updatable view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewCheckOption {
    Cascaded,
    Local,
}

impl ViewCheckOption {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewCheckOption::Cascaded => "CASCADED",
            ViewCheckOption::Local => "LOCAL",
        }
    }
}

/// A view definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct View {
    pub name: String,
    pub schema: Option<Schema>,
    /// The defining `SELECT` statement.
    pub def: String,
    pub check_option: Option<ViewCheckOption>,
    /// Views this view selects from.
    pub depends_on: Vec<TableRef>,
}

impl View {
    pub fn new(name: impl Into<String>, def: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            def: def.into(),
            ..Self::default()
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn depends_on(mut self, view: TableRef) -> Self {
        self.depends_on.push(view);
        self
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_ref().map(|s| s.name.as_str())
    }

    pub fn view_ref(&self) -> TableRef {
        TableRef {
            schema: self.schema_name().map(str::to_string),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
