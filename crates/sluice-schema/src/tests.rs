use crate::*;

#[test]
fn test_format_integer_types() {
    assert_eq!(ColumnType::int().format().unwrap(), "int");
    let ty = ColumnType::Integer {
        kind: IntegerKind::Big,
        unsigned: true,
    };
    assert_eq!(ty.format().unwrap(), "bigint unsigned");
}

#[test]
fn test_format_decimal() {
    let ty = ColumnType::Decimal {
        precision: Some(10),
        scale: Some(2),
        unsigned: false,
    };
    assert_eq!(ty.format().unwrap(), "decimal(10,2)");

    let ty = ColumnType::Decimal {
        precision: Some(10),
        scale: Some(0),
        unsigned: true,
    };
    assert_eq!(ty.format().unwrap(), "decimal(10) unsigned");

    let ty = ColumnType::Decimal {
        precision: Some(2),
        scale: Some(5),
        unsigned: false,
    };
    assert_eq!(
        ty.format(),
        Err(TypeError::ScaleExceedsPrecision {
            precision: 2,
            scale: 5
        })
    );
}

#[test]
fn test_format_varchar_requires_size() {
    assert_eq!(ColumnType::varchar(255).format().unwrap(), "varchar(255)");
    let ty = ColumnType::String {
        kind: StringKind::VarChar,
        size: None,
    };
    assert_eq!(ty.format(), Err(TypeError::MissingSize("varchar")));
}

#[test]
fn test_format_enum_quotes_values() {
    let ty = ColumnType::Enum(vec!["a".into(), "it's".into()]);
    assert_eq!(ty.format().unwrap(), "enum('a','it''s')");
    assert_eq!(
        ColumnType::Set(vec![]).format(),
        Err(TypeError::NoValues("set"))
    );
}

#[test]
fn test_format_fractional_seconds() {
    let ty = ColumnType::Time {
        kind: TimeKind::DateTime,
        precision: Some(3),
    };
    assert_eq!(ty.format().unwrap(), "datetime(3)");

    let ty = ColumnType::Time {
        kind: TimeKind::Timestamp,
        precision: Some(7),
    };
    assert_eq!(ty.format(), Err(TypeError::FractionalPrecision(7)));
}

#[test]
fn test_charset_support() {
    assert!(ColumnType::text().supports_charset());
    assert!(ColumnType::Enum(vec!["x".into()]).supports_charset());
    assert!(!ColumnType::int().supports_charset());
    assert!(!ColumnType::Json.supports_charset());
}

#[test]
fn test_table_charset_falls_back_to_schema() {
    let schema = Schema::new("app")
        .with_charset("utf8mb4")
        .with_collation("utf8mb4_bin");
    let mut table = Table::new("users").with_schema(schema);
    assert_eq!(table.charset(), Some("utf8mb4"));
    assert_eq!(table.collation(), Some("utf8mb4_bin"));

    table.attrs.charset = Some("latin1".into());
    assert_eq!(table.charset(), Some("latin1"));
    assert_eq!(table.collation(), Some("utf8mb4_bin"));
}

#[test]
fn test_table_ref_and_lookup() {
    let table = Table::new("users")
        .with_schema(Schema::new("app"))
        .with_column(Column::new("id", ColumnType::bigint()))
        .with_column(Column::new("name", ColumnType::varchar(64)).nullable());

    assert_eq!(table.table_ref(), TableRef::in_schema("app", "users"));
    assert!(table.column("name").is_some_and(|c| c.nullable));
    assert!(table.column("missing").is_none());
}

#[test]
fn test_table_attrs_order() {
    let attrs = TableAttrs {
        engine: Some(Engine::new("MyISAM")),
        comment: Some("users".into()),
        charset: Some("utf8mb4".into()),
        auto_increment: Some(100),
        ..Default::default()
    };
    let kinds: Vec<_> = attrs.to_attrs().iter().map(Attr::kind_name).collect();
    assert_eq!(kinds, ["ENGINE", "CHARSET", "COMMENT", "AUTO_INCREMENT"]);
}

#[test]
fn test_primary_key_helper() {
    let pk = Index::primary_key(["a", "b"]);
    assert_eq!(pk.name, "PRIMARY");
    let cols: Vec<_> = pk.parts.iter().filter_map(IndexPart::column_name).collect();
    assert_eq!(cols, ["a", "b"]);
}

#[test]
fn test_check_enforced_defaults_to_true() {
    assert!(Check::new("a > 0").is_enforced());
    assert!(!Check::new("a > 0").with_enforced(false).is_enforced());
}
