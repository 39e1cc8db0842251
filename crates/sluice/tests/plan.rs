use sluice::schema::{
    Attr, Check, Column, ColumnAttrs, ColumnType, DefaultValue, ForeignKey, GeneratedStorage,
    Index, IndexMethod, IndexPart, ReferenceAction, Schema, Table, TableRef, View,
    ViewCheckOption,
};
use sluice::{
    AutoIncrementPolicy, Capabilities, Change, ChangeKind, Error, ErrorKind, PlanOptions, Planner,
    Version,
};

fn planner() -> Planner {
    Planner::new(Capabilities::default())
}

fn user() -> Table {
    Table::new("user")
        .with_column(Column::new("id", ColumnType::bigint()).with_attrs(ColumnAttrs {
            auto_increment: Some(0),
            ..Default::default()
        }))
        .with_column(Column::new("email", ColumnType::varchar(255)))
        .with_primary_key(Index::primary_key(["id"]))
        .with_index(Index::new("user_email", vec![IndexPart::column("email")]).unique())
}

fn add(table: Table) -> Change {
    Change::AddTable {
        table,
        if_not_exists: false,
    }
}

fn modify(table: Table, changes: Vec<Change>) -> Change {
    Change::ModifyTable { table, changes }
}

fn forwards(plan: &sluice::Plan) -> Vec<&str> {
    plan.statements.iter().map(|s| s.forward.as_str()).collect()
}

#[test]
fn test_create_table_indented() {
    let planner = planner().with_options(PlanOptions::default().with_indent("  "));
    let plan = planner.plan("init", &[add(user())]).unwrap();

    assert_eq!(plan.statements.len(), 1);
    insta::assert_snapshot!(plan.statements[0].forward, @r"
    CREATE TABLE `user` (
      `id` bigint NOT NULL AUTO_INCREMENT,
      `email` varchar(255) NOT NULL,
      PRIMARY KEY (`id`),
      UNIQUE INDEX `user_email` (`email`)
    )
    ");
    assert_eq!(plan.statements[0].reverse.as_deref(), Some("DROP TABLE `user`"));
    assert_eq!(plan.statements[0].comment, "create \"user\" table");
    assert!(plan.reversible);
    assert!(!plan.transactional);
}

#[test]
fn test_create_table_with_constraints() {
    let post = Table::new("post")
        .with_column(Column::new("id", ColumnType::bigint()))
        .with_column(Column::new("author_id", ColumnType::bigint()).nullable())
        .with_column(Column::new("score", ColumnType::int()))
        .with_foreign_key(
            ForeignKey::new(["author_id"], TableRef::new("user"), ["id"])
                .named("post_author")
                .on_delete(ReferenceAction::SetNull),
        )
        .with_check(Check::new("score >= 0").named("post_score"));
    let plan = planner().plan("post", &[add(post)]).unwrap();

    insta::assert_snapshot!(
        plan.statements[0].forward,
        @"CREATE TABLE `post` (`id` bigint NOT NULL, `author_id` bigint NULL, `score` int NOT NULL, CONSTRAINT `post_author` FOREIGN KEY (`author_id`) REFERENCES `user` (`id`) ON DELETE SET NULL, CONSTRAINT `post_score` CHECK (score >= 0))"
    );
}

#[test]
fn test_create_if_not_exists_and_drop_if_exists() {
    let plan = planner()
        .plan(
            "guards",
            &[
                Change::AddTable {
                    table: user(),
                    if_not_exists: true,
                },
                Change::DropTable {
                    table: Table::new("legacy").with_column(Column::new("id", ColumnType::int())),
                    if_exists: true,
                },
            ],
        )
        .unwrap();

    assert!(plan.statements[0].forward.starts_with("CREATE TABLE IF NOT EXISTS `user` ("));
    assert_eq!(plan.statements[1].forward, "DROP TABLE IF EXISTS `legacy`");
    assert_eq!(
        plan.statements[1].reverse.as_deref(),
        Some("CREATE TABLE `legacy` (`id` int NOT NULL)")
    );
}

#[test]
fn test_empty_table_is_structural() {
    let err = planner().plan("empty", &[add(Table::new("t"))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.to_string(), "table \"t\" has no columns");
}

#[test]
fn test_modify_to_empty_table_is_structural() {
    let id = Column::new("id", ColumnType::int());
    let err = planner()
        .plan("empty", &[modify(Table::new("t"), vec![Change::DropColumn(id)])])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(err.to_string().contains("drop the table instead"), "{err}");
}

#[test]
fn test_drop_table_reverse_matches_create() {
    let planner = planner();
    let created = planner.plan("create", &[add(user())]).unwrap();
    let dropped = planner
        .plan(
            "drop",
            &[Change::DropTable {
                table: user(),
                if_exists: false,
            }],
        )
        .unwrap();

    assert_eq!(dropped.statements[0].forward, "DROP TABLE `user`");
    assert_eq!(dropped.statements[0].comment, "drop \"user\" table");
    assert_eq!(
        dropped.statements[0].reverse.as_deref(),
        Some(created.statements[0].forward.as_str())
    );
}

#[test]
fn test_drop_table_with_bad_definition_fails() {
    let table = Table::new("t").with_column(Column::new(
        "n",
        ColumnType::int(),
    )
    .with_attrs(ColumnAttrs {
        charset: Some("latin1".into()),
        ..Default::default()
    }));
    let err = planner()
        .plan(
            "drop",
            &[Change::DropTable {
                table,
                if_exists: false,
            }],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capability);
    assert_eq!(
        err.to_string(),
        "calculate reverse for drop table \"t\": create table \"t\": column \"n\" of type int does not support the CHARSET attribute"
    );
}

#[test]
fn test_column_errors_are_collected() {
    let table = Table::new("t")
        .with_column(Column::new("a", ColumnType::int()).with_attrs(ColumnAttrs {
            collation: Some("utf8mb4_bin".into()),
            ..Default::default()
        }))
        .with_column(Column::new("b", ColumnType::Raw(" ".into())));
    let err = planner().plan("bad", &[add(table)]).unwrap_err();

    match &err {
        Error::Table {
            action,
            table,
            errors,
        } => {
            assert_eq!(*action, "create");
            assert_eq!(table, "t");
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[0].kind(), ErrorKind::Capability);
            assert_eq!(errors[1].kind(), ErrorKind::Structural);
        }
        other => panic!("expected a table error, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Capability);
}

#[test]
fn test_add_column_reverse_drops_it() {
    let bio = Column::new("bio", ColumnType::text()).nullable();
    let table = user().with_column(bio.clone());
    let plan = planner()
        .plan("bio", &[modify(table, vec![Change::AddColumn(bio)])])
        .unwrap();

    let stmt = &plan.statements[0];
    assert_eq!(stmt.forward, "ALTER TABLE `user` ADD COLUMN `bio` text NULL");
    assert_eq!(stmt.reverse.as_deref(), Some("ALTER TABLE `user` DROP COLUMN `bio`"));
    assert_eq!(stmt.comment, "modify \"user\" table");
}

#[test]
fn test_foreign_key_modification_takes_two_statements() {
    let title = Column::new("title", ColumnType::varchar(100)).nullable();
    let from = ForeignKey::new(["author_id"], TableRef::new("user"), ["id"]).named("post_author");
    let to = ForeignKey::new(["author_id"], TableRef::new("account"), ["id"]).named("post_author");
    let post = Table::new("post")
        .with_column(Column::new("id", ColumnType::bigint()))
        .with_column(Column::new("author_id", ColumnType::bigint()))
        .with_column(title.clone())
        .with_foreign_key(to.clone());

    let plan = planner()
        .plan(
            "retarget",
            &[modify(
                post,
                vec![
                    Change::ModifyForeignKey {
                        from,
                        to,
                        change: ChangeKind::REF_TABLE,
                    },
                    Change::AddColumn(title),
                ],
            )],
        )
        .unwrap();

    assert_eq!(
        forwards(&plan),
        [
            "ALTER TABLE `post` DROP FOREIGN KEY `post_author`, DROP INDEX `post_author`",
            "ALTER TABLE `post` ADD CONSTRAINT `post_author` FOREIGN KEY (`author_id`) REFERENCES `account` (`id`), ADD COLUMN `title` varchar(100) NULL",
        ]
    );
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some(
            "ALTER TABLE `post` ADD CONSTRAINT `post_author` FOREIGN KEY (`author_id`) REFERENCES `user` (`id`)"
        )
    );
    assert_eq!(
        plan.statements[1].reverse.as_deref(),
        Some("ALTER TABLE `post` DROP COLUMN `title`, DROP FOREIGN KEY `post_author`")
    );

    let Change::ModifyTable { changes, .. } = &plan.statements[0].source else {
        panic!("expected a ModifyTable source");
    };
    assert_eq!(changes.len(), 2);
    assert!(plan.reversible);
}

#[test]
fn test_foreign_key_action_change_keeps_index() {
    let from = ForeignKey::new(["author_id"], TableRef::new("user"), ["id"]).named("post_author");
    let to = from.clone().on_delete(ReferenceAction::Cascade);
    let post = Table::new("post")
        .with_column(Column::new("author_id", ColumnType::bigint()))
        .with_foreign_key(to.clone());

    let plan = planner()
        .plan(
            "cascade",
            &[modify(
                post,
                vec![Change::ModifyForeignKey {
                    from,
                    to,
                    change: ChangeKind::DELETE_ACTION,
                }],
            )],
        )
        .unwrap();
    assert_eq!(
        forwards(&plan),
        [
            "ALTER TABLE `post` DROP FOREIGN KEY `post_author`",
            "ALTER TABLE `post` ADD CONSTRAINT `post_author` FOREIGN KEY (`author_id`) REFERENCES `user` (`id`) ON DELETE CASCADE",
        ]
    );
}

#[test]
fn test_index_modification_rebuilds() {
    let from = Index::new("ix", vec![IndexPart::column("a")]);
    let to = Index::new("ix", vec![IndexPart::column("a"), IndexPart::column("b").desc()])
        .with_method(IndexMethod::Hash);
    let table = Table::new("t")
        .with_column(Column::new("a", ColumnType::int()))
        .with_column(Column::new("b", ColumnType::int()))
        .with_index(to.clone());

    let plan = planner()
        .plan(
            "ix",
            &[modify(
                table,
                vec![Change::ModifyIndex {
                    from,
                    to,
                    change: ChangeKind::PARTS,
                }],
            )],
        )
        .unwrap();

    assert_eq!(plan.statements[0].forward, "ALTER TABLE `t` DROP INDEX `ix`");
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("ALTER TABLE `t` ADD INDEX `ix` (`a`)")
    );
    insta::assert_snapshot!(
        plan.statements[1].forward,
        @"ALTER TABLE `t` ADD INDEX `ix` USING HASH (`a`, `b` DESC)"
    );
}

#[test]
fn test_index_on_dropped_columns_is_skipped() {
    let email = Column::new("email", ColumnType::varchar(255));
    let index = Index::new("user_email", vec![IndexPart::column("email")]).unique();
    let table = Table::new("user").with_column(Column::new("id", ColumnType::bigint()));

    let plan = planner()
        .plan(
            "drop_email",
            &[modify(
                table,
                vec![Change::DropIndex(index), Change::DropColumn(email)],
            )],
        )
        .unwrap();
    assert_eq!(forwards(&plan), ["ALTER TABLE `user` DROP COLUMN `email`"]);
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("ALTER TABLE `user` ADD COLUMN `email` varchar(255) NOT NULL")
    );
}

#[test]
fn test_primary_key_changes() {
    let table = Table::new("t")
        .with_column(Column::new("a", ColumnType::int()))
        .with_column(Column::new("b", ColumnType::int()));
    let from = Index::primary_key(["a"]);
    let to = Index::primary_key(["a", "b"]);

    let plan = planner()
        .plan(
            "pk",
            &[modify(
                table,
                vec![Change::ModifyPrimaryKey {
                    from,
                    to,
                    change: ChangeKind::PARTS,
                }],
            )],
        )
        .unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "ALTER TABLE `t` DROP PRIMARY KEY, ADD PRIMARY KEY (`a`, `b`)"
    );
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("ALTER TABLE `t` DROP PRIMARY KEY, ADD PRIMARY KEY (`a`)")
    );
}

#[test]
fn test_set_null_on_not_null_column_is_conflict() {
    let post = Table::new("post")
        .with_column(Column::new("author_id", ColumnType::bigint()))
        .with_foreign_key(
            ForeignKey::new(["author_id"], TableRef::new("user"), ["id"])
                .named("post_author")
                .on_delete(ReferenceAction::SetNull),
        );
    let err = planner().plan("post", &[add(post)]).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SemanticConflict);
    assert_eq!(
        err.to_string(),
        "create table \"post\": foreign key constraint \"post_author\" is SET NULL, but column \"author_id\" is NOT NULL"
    );
}

#[test]
fn test_reverse_checks_set_null_against_restored_columns() {
    let fk = ForeignKey::new(["author_id"], TableRef::new("user"), ["id"])
        .named("post_author")
        .on_delete(ReferenceAction::SetNull);
    let nullable = Column::new("author_id", ColumnType::bigint()).nullable();
    let not_null = Column::new("author_id", ColumnType::bigint());
    let post = Table::new("post").with_column(not_null.clone());

    let plan = planner()
        .plan(
            "tighten",
            &[modify(
                post,
                vec![
                    Change::DropForeignKey(fk),
                    Change::ModifyColumn {
                        from: nullable,
                        to: not_null,
                        change: ChangeKind::NULL,
                    },
                ],
            )],
        )
        .unwrap();

    let stmt = &plan.statements[0];
    assert_eq!(
        stmt.forward,
        "ALTER TABLE `post` DROP FOREIGN KEY `post_author`, MODIFY COLUMN `author_id` bigint NOT NULL"
    );
    assert_eq!(
        stmt.reverse.as_deref(),
        Some(
            "ALTER TABLE `post` MODIFY COLUMN `author_id` bigint NULL, ADD CONSTRAINT `post_author` FOREIGN KEY (`author_id`) REFERENCES `user` (`id`) ON DELETE SET NULL"
        )
    );
    assert!(plan.reversible);
}

#[test]
fn test_unicode_names_and_values() {
    let table = Table::new("商品")
        .with_column(Column::new("価格", ColumnType::int()))
        .with_column(
            Column::new("名前", ColumnType::varchar(50))
                .with_default(DefaultValue::Literal("日本".into()))
                .with_attrs(ColumnAttrs {
                    comment: Some("表示名 🏷".into()),
                    ..Default::default()
                }),
        )
        .with_check(Check::new("価格 > 0").named("価格_正"));

    let plan = planner().plan("商品", &[add(table)]).unwrap();
    let stmt = &plan.statements[0];
    assert_eq!(
        stmt.forward,
        "CREATE TABLE `商品` (`価格` int NOT NULL, `名前` varchar(50) NOT NULL DEFAULT '日本' COMMENT '表示名 🏷', CONSTRAINT `価格_正` CHECK (価格 > 0))"
    );
    assert_eq!(stmt.reverse.as_deref(), Some("DROP TABLE `商品`"));
}

#[test]
fn test_rename_table_is_mirrored() {
    let from = TableRef::in_schema("app", "users");
    let to = TableRef::in_schema("app", "user");
    let plan = planner()
        .plan("rename", &[Change::RenameTable { from, to }])
        .unwrap();

    let stmt = &plan.statements[0];
    assert_eq!(stmt.forward, "RENAME TABLE `app`.`users` TO `app`.`user`");
    assert_eq!(
        stmt.reverse.as_deref(),
        Some("RENAME TABLE `app`.`user` TO `app`.`users`")
    );
    assert_eq!(stmt.comment, "rename a table from \"users\" to \"user\"");
}

#[test]
fn test_rename_column_by_capability() {
    let from = Column::new("mail", ColumnType::varchar(255));
    let to = Column::new("email", ColumnType::varchar(255));
    let changes = [modify(
        user(),
        vec![Change::RenameColumn {
            from: from.clone(),
            to: to.clone(),
        }],
    )];

    let plan = planner().plan("rename", &changes).unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "ALTER TABLE `user` RENAME COLUMN `mail` TO `email`"
    );
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("ALTER TABLE `user` RENAME COLUMN `email` TO `mail`")
    );

    let legacy = Planner::new(Capabilities::mysql(Version::new(5, 7, 40)));
    let plan = legacy.plan("rename", &changes).unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "ALTER TABLE `user` CHANGE COLUMN `mail` `email` varchar(255) NOT NULL"
    );
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("ALTER TABLE `user` CHANGE COLUMN `email` `mail` varchar(255) NOT NULL")
    );
}

#[test]
fn test_generated_column_conversion_is_conflict() {
    let from = Column::new("total", ColumnType::int());
    let to = from.clone().generated_as("a + b", GeneratedStorage::Virtual);
    let table = Table::new("t").with_column(to.clone());
    let err = planner()
        .plan(
            "gen",
            &[modify(
                table.clone(),
                vec![Change::ModifyColumn {
                    from: from.clone(),
                    to: to.clone(),
                    change: ChangeKind::GENERATED,
                }],
            )],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SemanticConflict);
    assert!(err.to_string().starts_with("alter table \"t\": "), "{err}");

    let stored = from.clone().generated_as("a + b", GeneratedStorage::Stored);
    let err = planner()
        .plan(
            "gen",
            &[modify(
                table.clone(),
                vec![Change::ModifyColumn {
                    from: to.clone(),
                    to: stored,
                    change: ChangeKind::GENERATED,
                }],
            )],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SemanticConflict);

    let new_expr = from.generated_as("a * b", GeneratedStorage::Virtual);
    let plan = planner()
        .plan(
            "gen",
            &[modify(
                table,
                vec![Change::ModifyColumn {
                    from: to,
                    to: new_expr,
                    change: ChangeKind::GENERATED,
                }],
            )],
        )
        .unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "ALTER TABLE `t` MODIFY COLUMN `total` int AS (a * b) VIRTUAL NOT NULL"
    );
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("ALTER TABLE `t` MODIFY COLUMN `total` int AS (a + b) VIRTUAL NOT NULL")
    );
}

#[test]
fn test_check_modifications() {
    let table = Table::new("t").with_column(Column::new("a", ColumnType::int()));
    let check = Check::new("a > 0").named("positive");
    let plan_check = |planner: &Planner, from: Check, to: Check| {
        planner.plan(
            "check",
            &[modify(table.clone(), vec![Change::ModifyCheck { from, to }])],
        )
    };

    let plan = plan_check(&planner(), check.clone(), check.clone().with_enforced(false)).unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "ALTER TABLE `t` ALTER CHECK `positive` NOT ENFORCED"
    );
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("ALTER TABLE `t` ALTER CHECK `positive` ENFORCED")
    );

    let plan = plan_check(&planner(), check.clone(), Check::new("a > 1").named("positive")).unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "ALTER TABLE `t` DROP CHECK `positive`, ADD CONSTRAINT `positive` CHECK (a > 1)"
    );

    let err = plan_check(&planner(), check.clone(), Check::new("a > 0").named("other")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(
        err.to_string(),
        "alter table \"t\": mismatch check constraint names: \"positive\" != \"other\""
    );

    let err = plan_check(&planner(), check.clone(), check.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnrecognizedChange);

    // MariaDB cannot toggle enforcement.
    let maria = Planner::new(Capabilities::mariadb(Version::new(10, 6, 0)));
    let err = plan_check(&maria, check.clone(), check.with_enforced(false)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnrecognizedChange);
}

#[test]
fn test_unnamed_check_is_irreversible() {
    let table = Table::new("t").with_column(Column::new("a", ColumnType::int()));
    let plan = planner()
        .plan(
            "check",
            &[modify(table, vec![Change::AddCheck(Check::new("a > 0"))])],
        )
        .unwrap();
    assert_eq!(plan.statements[0].forward, "ALTER TABLE `t` ADD CHECK (a > 0)");
    assert_eq!(plan.statements[0].reverse, None);
    assert!(!plan.reversible);
    assert_eq!(plan.reverse_sql(), None);
}

#[test]
fn test_table_attributes() {
    let table = Table::new("t").with_column(Column::new("a", ColumnType::int()));
    let plan = planner()
        .plan(
            "attrs",
            &[modify(
                table.clone(),
                vec![
                    Change::AddAttr(Attr::Comment("things".into())),
                    Change::ModifyAttr {
                        from: Attr::Collation("utf8mb4_bin".into()),
                        to: Attr::Collation("utf8mb4_general_ci".into()),
                    },
                ],
            )],
        )
        .unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "ALTER TABLE `t` COMMENT 'things', COLLATE utf8mb4_general_ci"
    );
    // A comment added to a table has no generic inverse.
    assert!(!plan.reversible);

    let err = planner()
        .plan(
            "attrs",
            &[modify(table, vec![Change::DropAttr(Attr::Comment("things".into()))])],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.to_string(), "unsupported change type: COMMENT");
}

#[test]
fn test_auto_increment_policy() {
    let table = Table::new("t").with_column(Column::new("id", ColumnType::bigint()).with_attrs(
        ColumnAttrs {
            auto_increment: Some(100),
            ..Default::default()
        },
    ));
    let seed = modify(
        table.clone(),
        vec![Change::ModifyAttr {
            from: Attr::AutoIncrement(100),
            to: Attr::AutoIncrement(200),
        }],
    );

    let plan = planner().plan("ai", &[add(table.clone()), seed.clone()]).unwrap();
    assert_eq!(
        forwards(&plan),
        ["CREATE TABLE `t` (`id` bigint NOT NULL AUTO_INCREMENT)"]
    );

    let emit = planner()
        .with_options(PlanOptions::default().with_auto_increment(AutoIncrementPolicy::Emit));
    let plan = emit.plan("ai", &[add(table), seed]).unwrap();
    assert_eq!(
        forwards(&plan),
        [
            "CREATE TABLE `t` (`id` bigint NOT NULL AUTO_INCREMENT) AUTO_INCREMENT 100",
            "ALTER TABLE `t` AUTO_INCREMENT 200",
        ]
    );
    assert_eq!(
        plan.statements[1].reverse.as_deref(),
        Some("ALTER TABLE `t` AUTO_INCREMENT 100")
    );
}

#[test]
fn test_mariadb_generated_and_json_columns() {
    let table = Table::new("doc")
        .with_column(Column::new("body", ColumnType::Json))
        .with_column(
            Column::new("size", ColumnType::int())
                .generated_as("json_length(body)", GeneratedStorage::Virtual),
        );
    let maria = Planner::new(Capabilities::mariadb(Version::new(10, 3, 0)));
    let plan = maria.plan("doc", &[add(table)]).unwrap();

    insta::assert_snapshot!(
        plan.statements[0].forward,
        @"CREATE TABLE `doc` (`body` json NOT NULL CHECK (json_valid(`body`)), `size` int AS (json_length(body)) VIRTUAL)"
    );
}

#[test]
fn test_schema_changes_come_first() {
    let plan = planner()
        .plan(
            "schemas",
            &[
                add(user()),
                Change::AddSchema {
                    schema: Schema::new("app").with_charset("latin1"),
                    if_not_exists: false,
                },
                Change::AddSchema {
                    schema: Schema::new("blog").with_charset("utf8mb4"),
                    if_not_exists: true,
                },
                Change::ModifySchema {
                    schema: Schema::new("app"),
                    changes: vec![Change::ModifyAttr {
                        from: Attr::Charset("latin1".into()),
                        to: Attr::Charset("utf8mb4".into()),
                    }],
                },
            ],
        )
        .unwrap();

    assert_eq!(
        forwards(&plan)[..3],
        [
            "CREATE DATABASE `app` CHARSET latin1",
            "CREATE DATABASE IF NOT EXISTS `blog`",
            "ALTER DATABASE `app` CHARSET utf8mb4",
        ]
    );
    assert!(plan.statements[3].forward.starts_with("CREATE TABLE `user`"));
    assert_eq!(plan.statements[0].reverse.as_deref(), Some("DROP DATABASE `app`"));
    assert_eq!(
        plan.statements[2].reverse.as_deref(),
        Some("ALTER DATABASE `app` CHARSET latin1")
    );
    assert_eq!(plan.statements[0].comment, "add new schema named \"app\"");
    assert!(plan.reversible);
}

#[test]
fn test_drop_schema_is_irreversible() {
    let plan = planner()
        .plan(
            "drop",
            &[Change::DropSchema {
                schema: Schema::new("app"),
                if_exists: true,
            }],
        )
        .unwrap();
    assert_eq!(plan.statements[0].forward, "DROP DATABASE IF EXISTS `app`");
    assert_eq!(plan.statements[0].reverse, None);
    assert!(!plan.reversible);
}

#[test]
fn test_modify_schema_rejects_other_changes() {
    let err = planner()
        .plan(
            "schema",
            &[Change::ModifySchema {
                schema: Schema::new("app"),
                changes: vec![Change::AddAttr(Attr::Comment("x".into()))],
            }],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.to_string(), "unexpected schema AddAttr: COMMENT");

    // Setting the server default changes nothing.
    let plan = planner()
        .plan(
            "schema",
            &[Change::ModifySchema {
                schema: Schema::new("app"),
                changes: vec![Change::AddAttr(Attr::Charset("utf8mb4".into()))],
            }],
        )
        .unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_scoped_plan() {
    let scoped = planner().with_options(PlanOptions::default().with_schema_qualifier("prod"));
    let app = Schema::new("app");
    let t = Table::new("t")
        .with_schema(app.clone())
        .with_column(Column::new("id", ColumnType::int()));
    let plan = scoped.plan("scoped", &[add(t.clone())]).unwrap();
    assert_eq!(
        plan.statements[0].forward,
        "CREATE TABLE `prod`.`t` (`id` int NOT NULL)"
    );

    let unqualified = planner().with_options(PlanOptions::default().with_schema_qualifier(""));
    let plan = unqualified.plan("scoped", &[add(t.clone())]).unwrap();
    assert_eq!(plan.statements[0].forward, "CREATE TABLE `t` (`id` int NOT NULL)");

    let other = Table::new("o")
        .with_schema(Schema::new("other"))
        .with_column(Column::new("id", ColumnType::int()));
    let err = scoped.plan("scoped", &[add(t), add(other)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "found 2 schemas when the plan is scoped to one: \"app\", \"other\""
    );

    let err = scoped
        .plan(
            "scoped",
            &[Change::AddSchema {
                schema: app,
                if_not_exists: false,
            }],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(
        err.to_string(),
        "AddSchema is not allowed when the plan is scoped to one schema"
    );
}

#[test]
fn test_foreign_key_cycle_is_detached() {
    let user = Table::new("user")
        .with_column(Column::new("id", ColumnType::bigint()))
        .with_column(Column::new("pinned_id", ColumnType::bigint()).nullable())
        .with_foreign_key(
            ForeignKey::new(["pinned_id"], TableRef::new("post"), ["id"]).named("user_pinned"),
        );
    let post = Table::new("post")
        .with_column(Column::new("id", ColumnType::bigint()))
        .with_column(Column::new("author_id", ColumnType::bigint()))
        .with_foreign_key(
            ForeignKey::new(["author_id"], TableRef::new("user"), ["id"]).named("post_author"),
        );

    let plan = planner().plan("cycle", &[add(user), add(post)]).unwrap();
    assert_eq!(
        forwards(&plan),
        [
            "CREATE TABLE `post` (`id` bigint NOT NULL, `author_id` bigint NOT NULL)",
            "CREATE TABLE `user` (`id` bigint NOT NULL, `pinned_id` bigint NULL, CONSTRAINT `user_pinned` FOREIGN KEY (`pinned_id`) REFERENCES `post` (`id`))",
            "ALTER TABLE `post` ADD CONSTRAINT `post_author` FOREIGN KEY (`author_id`) REFERENCES `user` (`id`)",
        ]
    );
    assert_eq!(
        plan.statements[2].reverse.as_deref(),
        Some("ALTER TABLE `post` DROP FOREIGN KEY `post_author`")
    );
    assert!(plan.reversible);
}

#[test]
fn test_views_are_ordered_and_planned_last() {
    let base = View::new("base", "SELECT id FROM user");
    let top = View {
        check_option: Some(ViewCheckOption::Cascaded),
        ..View::new("top", "SELECT id FROM base WHERE id > 0")
    }
    .depends_on(TableRef::new("base"));

    let plan = planner()
        .plan(
            "views",
            &[
                Change::AddView(top),
                Change::AddView(base.clone()),
                add(user()),
                Change::RenameView {
                    from: TableRef::new("old"),
                    to: TableRef::new("new"),
                },
            ],
        )
        .unwrap();

    let fwd = forwards(&plan);
    assert!(fwd[0].starts_with("CREATE TABLE `user`"));
    assert_eq!(
        fwd[1..],
        [
            "CREATE VIEW `base` AS SELECT id FROM user",
            "CREATE VIEW `top` AS SELECT id FROM base WHERE id > 0 WITH CASCADED CHECK OPTION",
            "RENAME TABLE `old` TO `new`",
        ]
    );
    assert_eq!(plan.statements[1].reverse.as_deref(), Some("DROP VIEW `base`"));
    assert_eq!(plan.statements[2].comment, "create \"top\" view");
    assert_eq!(
        plan.statements[3].reverse.as_deref(),
        Some("RENAME TABLE `new` TO `old`")
    );

    let changed = View::new("base", "SELECT id, email FROM user");
    let plan = planner()
        .plan(
            "views",
            &[
                Change::ModifyView {
                    from: base.clone(),
                    to: changed,
                },
                Change::DropView {
                    view: base,
                    if_exists: true,
                },
            ],
        )
        .unwrap();
    assert_eq!(
        forwards(&plan),
        [
            "DROP VIEW IF EXISTS `base`",
            "ALTER VIEW `base` AS SELECT id, email FROM user",
        ]
    );
    assert_eq!(
        plan.statements[0].reverse.as_deref(),
        Some("CREATE VIEW `base` AS SELECT id FROM user")
    );
    assert_eq!(
        plan.statements[1].reverse.as_deref(),
        Some("ALTER VIEW `base` AS SELECT id FROM user")
    );
}

#[test]
fn test_view_cycle_fails() {
    let a = View::new("a", "SELECT * FROM b").depends_on(TableRef::new("b"));
    let b = View::new("b", "SELECT * FROM a").depends_on(TableRef::new("a"));
    let err = planner()
        .plan("views", &[Change::AddView(a), Change::AddView(b)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cycle);
}

#[test]
fn test_misplaced_change_is_unknown_variant() {
    let err = planner()
        .plan(
            "bad",
            &[Change::AddColumn(Column::new("id", ColumnType::int()))],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownVariant);
    assert_eq!(err.to_string(), "unsupported change AddColumn");
}

#[test]
fn test_render_scripts() {
    let bio = Column::new("bio", ColumnType::text()).nullable();
    let plan = planner()
        .plan(
            "init",
            &[
                add(Table::new("t").with_column(Column::new("id", ColumnType::int()))),
                modify(
                    Table::new("t")
                        .with_column(Column::new("id", ColumnType::int()))
                        .with_column(bio.clone()),
                    vec![Change::AddColumn(bio)],
                ),
            ],
        )
        .unwrap();

    assert_eq!(
        plan.to_sql(),
        "-- Create \"t\" table\n\
         CREATE TABLE `t` (`id` int NOT NULL);\n\
         -- Modify \"t\" table\n\
         ALTER TABLE `t` ADD COLUMN `bio` text NULL;\n"
    );
    assert_eq!(
        plan.reverse_sql().as_deref(),
        Some(
            "-- reverse: modify \"t\" table\n\
             ALTER TABLE `t` DROP COLUMN `bio`;\n\
             -- reverse: create \"t\" table\n\
             DROP TABLE `t`;\n"
        )
    );

    assert_eq!(plan.fingerprint(), plan.clone().fingerprint());
    assert_eq!(plan.fingerprint().len(), 64);
}

#[test]
fn test_planner_is_shareable() {
    let planner = planner();
    let changes = vec![add(user())];
    let expected = planner.plan("init", &changes).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let planner = planner.clone();
            let changes = changes.clone();
            std::thread::spawn(move || planner.plan("init", &changes).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
