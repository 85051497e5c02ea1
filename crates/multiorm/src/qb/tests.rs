//! End-to-end builder scenarios across dialects.

use crate::condition::{between, eq, gt, gte, in_list, like, lt, lte, ne, not, or};
use crate::dialect::{Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
use crate::qb::{select, Direction, SelectQb};
use crate::schema::Schema;
use crate::value::Value;
use std::sync::Arc;

fn users_qb(dialect: Arc<dyn Dialect>) -> SelectQb {
    select(&Schema::new("users"), dialect)
}

#[test]
fn eq_on_backtick_dialect() {
    let (sql, args) = users_qb(Arc::new(MySqlDialect))
        .where_(eq("name", "John"))
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT * FROM `users` WHERE `name` = ?");
    assert_eq!(args, vec![Value::Text("John".into())]);
}

#[test]
fn comparison_operators_render_contract_symbols() {
    let cases = [
        (eq("age", 18), "`age` = ?"),
        (ne("age", 18), "`age` != ?"),
        (gt("age", 18), "`age` > ?"),
        (lt("age", 18), "`age` < ?"),
        (gte("age", 18), "`age` >= ?"),
        (lte("age", 18), "`age` <= ?"),
    ];
    for (cond, fragment) in cases {
        let (sql, args) = users_qb(Arc::new(MySqlDialect)).where_(cond).build().unwrap();
        assert!(sql.contains(fragment), "{fragment} not in {sql}");
        assert_eq!(args, vec![Value::Int(18)]);
        assert_eq!(sql.matches('?').count(), 1);
    }
}

#[test]
fn where_all_renders_one_parenthesized_and_group() {
    let (sql, args) = users_qb(Arc::new(MySqlDialect))
        .where_all(vec![eq("status", "active"), gt("age", 18)])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE (`status` = ? AND `age` > ?)"
    );
    assert_eq!(args, vec![Value::Text("active".into()), Value::Int(18)]);
}

#[test]
fn where_any_renders_one_parenthesized_or_group() {
    let (sql, args) = users_qb(Arc::new(MySqlDialect))
        .where_any(vec![eq("status", "active"), eq("status", "pending")])
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE (`status` = ? OR `status` = ?)"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn select_limit_offset_without_args() {
    let (sql, args) = users_qb(Arc::new(MySqlDialect))
        .select(&["id", "name"])
        .limit(10)
        .offset(5)
        .build()
        .unwrap();
    assert_eq!(sql, "SELECT `id`, `name` FROM `users` LIMIT 10 OFFSET 5");
    assert!(!sql.contains('*'));
    assert!(args.is_empty());
}

#[test]
fn same_logical_query_across_three_dialects() {
    let build = |dialect: Arc<dyn Dialect>| {
        users_qb(dialect)
            .select(&["id", "name"])
            .where_(eq("status", "active"))
            .where_(in_list("role", vec!["admin", "user"]))
            .order_by("id", Direction::Asc)
            .limit(10)
            .build()
            .unwrap()
    };

    let (mysql_sql, mysql_args) = build(Arc::new(MySqlDialect));
    let (pg_sql, pg_args) = build(Arc::new(PostgresDialect));
    let (sqlite_sql, sqlite_args) = build(Arc::new(SqliteDialect));

    // Different rendering per dialect
    assert!(mysql_sql.contains("`status` = ?"));
    assert!(pg_sql.contains("\"status\" = $1"));
    assert!(pg_sql.contains("\"role\" IN ($2, $3)"));
    assert!(sqlite_sql.contains("`status` = ?"));
    assert_ne!(mysql_sql, pg_sql);

    // Identical argument lists regardless of dialect
    assert_eq!(mysql_args, pg_args);
    assert_eq!(pg_args, sqlite_args);
    assert_eq!(
        mysql_args,
        vec![
            Value::Text("active".into()),
            Value::Text("admin".into()),
            Value::Text("user".into()),
        ]
    );
}

#[test]
fn numbered_placeholders_strictly_increase() {
    let (sql, args) = users_qb(Arc::new(PostgresDialect))
        .where_(eq("a", 1))
        .where_any(vec![eq("b", 2), not(between("c", 3, 4))])
        .where_(in_list("d", vec![5, 6]))
        .build()
        .unwrap();

    let mut indices = Vec::new();
    let mut rest = sql.as_str();
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        indices.push(digits.parse::<usize>().unwrap());
    }
    assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(args.len(), 6);
    assert_eq!(
        args,
        vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Int(4),
            Value::Int(5),
            Value::Int(6)
        ]
    );
}

#[test]
fn positional_placeholder_count_is_nesting_independent() {
    let (sql, args) = users_qb(Arc::new(SqliteDialect))
        .where_(or(vec![
            eq("a", 1),
            not(or(vec![between("b", 2, 3), like("c", "%x%")])),
        ]))
        .build()
        .unwrap();
    assert_eq!(sql.matches('?').count(), 4);
    assert_eq!(args.len(), 4);
}

#[test]
fn not_wraps_inner_group() {
    let (sql, args) = users_qb(Arc::new(MySqlDialect))
        .where_(not(or(vec![eq("status", "banned"), eq("status", "deleted")])))
        .build()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE NOT ((`status` = ? OR `status` = ?))"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn combined_clauses_in_contract_order() {
    let (sql, args) = users_qb(Arc::new(MySqlDialect))
        .select(&["id", "name", "age"])
        .where_(gt("age", 18))
        .where_(eq("status", "active"))
        .order_by("age", Direction::Desc)
        .limit(10)
        .offset(5)
        .build()
        .unwrap();

    let select_pos = sql.find("SELECT").unwrap();
    let from_pos = sql.find(" FROM ").unwrap();
    let where_pos = sql.find(" WHERE ").unwrap();
    let order_pos = sql.find(" ORDER BY ").unwrap();
    let limit_pos = sql.find(" LIMIT 10 OFFSET 5").unwrap();
    assert!(select_pos < from_pos && from_pos < where_pos);
    assert!(where_pos < order_pos && order_pos < limit_pos);
    assert_eq!(args.len(), 2);
}

#[test]
fn empty_where_group_fails_the_build() {
    let err = users_qb(Arc::new(MySqlDialect))
        .where_all(Vec::new())
        .build()
        .expect_err("empty group must fail");
    assert!(err.is_translation());
}

#[test]
fn shared_condition_across_builders() {
    let cond = eq("status", "active");
    let (mysql_sql, _) = users_qb(Arc::new(MySqlDialect))
        .where_(cond.clone())
        .build()
        .unwrap();
    let (pg_sql, _) = users_qb(Arc::new(PostgresDialect))
        .where_(cond)
        .build()
        .unwrap();
    assert!(mysql_sql.contains("`status`"));
    assert!(pg_sql.contains("\"status\""));
}
