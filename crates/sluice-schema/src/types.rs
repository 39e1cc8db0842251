//! Column types and their MySQL spelling.

use std::fmt;

use sluice_sql::Lit;
use thiserror::Error;

/// Error produced when a column type cannot be spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("{0} requires a size")]
    MissingSize(&'static str),

    #[error("decimal scale {scale} exceeds precision {precision}")]
    ScaleExceedsPrecision { precision: u32, scale: u32 },

    #[error("decimal scale requires a precision")]
    ScaleWithoutPrecision,

    #[error("fractional seconds precision {0} exceeds 6")]
    FractionalPrecision(u32),

    #[error("{0} requires at least one value")]
    NoValues(&'static str),

    #[error("raw type is empty")]
    EmptyRaw,
}

/// Integer widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    Tiny,
    Small,
    Medium,
    Int,
    Big,
}

impl IntegerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IntegerKind::Tiny => "tinyint",
            IntegerKind::Small => "smallint",
            IntegerKind::Medium => "mediumint",
            IntegerKind::Int => "int",
            IntegerKind::Big => "bigint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    Float,
    Double,
}

/// Character string types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Char,
    VarChar,
    TinyText,
    Text,
    MediumText,
    LongText,
}

/// Binary string types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryKind {
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
}

/// Temporal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeKind {
    Date,
    DateTime,
    Timestamp,
    Time,
    Year,
}

/// The semantic type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer { kind: IntegerKind, unsigned: bool },
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
        unsigned: bool,
    },
    Float(FloatKind),
    Bool,
    Bit { size: Option<u32> },
    String { kind: StringKind, size: Option<u32> },
    Binary { kind: BinaryKind, size: Option<u32> },
    Enum(Vec<String>),
    Set(Vec<String>),
    Time {
        kind: TimeKind,
        precision: Option<u32>,
    },
    Json,
    /// A spatial type such as `point` or `geometry`.
    Spatial(String),
    /// A type spelled out verbatim.
    Raw(String),
}

impl ColumnType {
    /// `int`
    pub fn int() -> Self {
        ColumnType::Integer {
            kind: IntegerKind::Int,
            unsigned: false,
        }
    }

    /// `bigint`
    pub fn bigint() -> Self {
        ColumnType::Integer {
            kind: IntegerKind::Big,
            unsigned: false,
        }
    }

    /// `varchar(size)`
    pub fn varchar(size: u32) -> Self {
        ColumnType::String {
            kind: StringKind::VarChar,
            size: Some(size),
        }
    }

    /// `text`
    pub fn text() -> Self {
        ColumnType::String {
            kind: StringKind::Text,
            size: None,
        }
    }

    /// A temporal type without fractional seconds.
    pub fn time(kind: TimeKind) -> Self {
        ColumnType::Time {
            kind,
            precision: None,
        }
    }

    /// Spell out the type as MySQL expects it in a column definition.
    pub fn format(&self) -> Result<String, TypeError> {
        let formatted = match self {
            ColumnType::Integer { kind, unsigned } => with_unsigned(kind.as_str().into(), *unsigned),
            ColumnType::Decimal {
                precision,
                scale,
                unsigned,
            } => {
                let base = match (precision, scale) {
                    (None, None) => "decimal".to_string(),
                    (None, Some(_)) => return Err(TypeError::ScaleWithoutPrecision),
                    (Some(p), None) | (Some(p), Some(0)) => format!("decimal({p})"),
                    (Some(p), Some(s)) if s > p => {
                        return Err(TypeError::ScaleExceedsPrecision {
                            precision: *p,
                            scale: *s,
                        });
                    }
                    (Some(p), Some(s)) => format!("decimal({p},{s})"),
                };
                with_unsigned(base, *unsigned)
            }
            ColumnType::Float(FloatKind::Float) => "float".to_string(),
            ColumnType::Float(FloatKind::Double) => "double".to_string(),
            ColumnType::Bool => "bool".to_string(),
            ColumnType::Bit { size } => sized("bit", *size),
            ColumnType::String { kind, size } => match kind {
                StringKind::Char => sized("char", *size),
                StringKind::VarChar => {
                    let size = size.ok_or(TypeError::MissingSize("varchar"))?;
                    format!("varchar({size})")
                }
                StringKind::TinyText => "tinytext".to_string(),
                StringKind::Text => "text".to_string(),
                StringKind::MediumText => "mediumtext".to_string(),
                StringKind::LongText => "longtext".to_string(),
            },
            ColumnType::Binary { kind, size } => match kind {
                BinaryKind::Binary => sized("binary", *size),
                BinaryKind::VarBinary => {
                    let size = size.ok_or(TypeError::MissingSize("varbinary"))?;
                    format!("varbinary({size})")
                }
                BinaryKind::TinyBlob => "tinyblob".to_string(),
                BinaryKind::Blob => "blob".to_string(),
                BinaryKind::MediumBlob => "mediumblob".to_string(),
                BinaryKind::LongBlob => "longblob".to_string(),
            },
            ColumnType::Enum(values) => values_list("enum", values)?,
            ColumnType::Set(values) => values_list("set", values)?,
            ColumnType::Time { kind, precision } => {
                if let Some(p) = precision
                    && *p > 6
                {
                    return Err(TypeError::FractionalPrecision(*p));
                }
                match kind {
                    TimeKind::Date => "date".to_string(),
                    TimeKind::Year => "year".to_string(),
                    TimeKind::DateTime => sized("datetime", *precision),
                    TimeKind::Timestamp => sized("timestamp", *precision),
                    TimeKind::Time => sized("time", *precision),
                }
            }
            ColumnType::Json => "json".to_string(),
            ColumnType::Spatial(name) => name.to_lowercase(),
            ColumnType::Raw(raw) => {
                if raw.trim().is_empty() {
                    return Err(TypeError::EmptyRaw);
                }
                raw.clone()
            }
        };
        Ok(formatted)
    }

    /// Reports whether the type accepts `CHARSET` and `COLLATE` clauses.
    pub fn supports_charset(&self) -> bool {
        matches!(
            self,
            ColumnType::String { .. } | ColumnType::Enum(_) | ColumnType::Set(_)
        )
    }

    /// Reports whether default values of this type are written unquoted.
    pub fn has_numeric_default(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer { .. }
                | ColumnType::Decimal { .. }
                | ColumnType::Float(_)
                | ColumnType::Bool
                | ColumnType::Bit { .. }
        )
    }

    pub fn is_time(&self) -> bool {
        matches!(self, ColumnType::Time { .. })
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ColumnType::Json)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

fn with_unsigned(base: String, unsigned: bool) -> String {
    if unsigned {
        format!("{base} unsigned")
    } else {
        base
    }
}

fn sized(name: &str, size: Option<u32>) -> String {
    match size {
        Some(size) => format!("{name}({size})"),
        None => name.to_string(),
    }
}

fn values_list(name: &'static str, values: &[String]) -> Result<String, TypeError> {
    if values.is_empty() {
        return Err(TypeError::NoValues(name));
    }
    let values: Vec<String> = values.iter().map(|v| Lit(v).to_string()).collect();
    Ok(format!("{name}({})", values.join(",")))
}
