//! Full-pipeline tests through the public API: schema → changeset →
//! provider → query builder → executor.

use multiorm::condition::{between, eq, gt, in_list};
use multiorm::qb::Direction;
use multiorm::{
    Changeset, Executor, OrmResult, QueryProvider, Repository, Row, Schema, SqlQueryProvider,
    Value,
};
use multiorm::schema::{Field, FieldType};
use std::sync::Mutex;

fn users_schema() -> Schema {
    Schema::new("users")
        .field(Field::builder("id", FieldType::Integer).primary_key().build())
        .field(Field::builder("name", FieldType::String).build())
        .field(Field::builder("age", FieldType::Integer).nullable(true).build())
        .field(Field::builder("status", FieldType::String).build())
}

/// Executor double that records statements and serves canned rows.
#[derive(Default)]
struct RecordingDb {
    statements: Mutex<Vec<(String, Vec<Value>)>>,
    rows: Mutex<Vec<Row>>,
}

impl Executor for RecordingDb {
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        async { Ok(1) }
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        let rows = self.rows.lock().unwrap().clone();
        async move { Ok(rows) }
    }
}

#[tokio::test]
async fn repository_builds_and_executes_through_the_boundary() {
    let db = RecordingDb::default();
    {
        let mut row = Row::new();
        row.insert("id", Value::Int(1));
        row.insert("name", Value::Text("Alice".into()));
        db.rows.lock().unwrap().push(row);
    }
    let repo = Repository::new(db, SqlQueryProvider::postgres());

    let rows = repo
        .query_builder(&users_schema())
        .select(&["id", "name"])
        .where_(eq("status", "active"))
        .order_by("id", Direction::Asc)
        .limit(10)
        .fetch_all(repo.executor())
        .await
        .expect("fetch");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].try_str("name").unwrap(), "Alice");

    let statements = repo.executor().statements.lock().unwrap().clone();
    assert_eq!(statements.len(), 1);
    let (sql, params) = &statements[0];
    assert_eq!(
        sql,
        "SELECT \"id\", \"name\" FROM \"users\" WHERE \"status\" = $1 \
         ORDER BY \"id\" ASC LIMIT 10"
    );
    assert_eq!(params, &vec![Value::Text("active".into())]);
}

#[test]
fn capability_check_gates_operator_use() {
    let provider = SqlQueryProvider::mysql();
    let caps = provider.capabilities();
    assert!(caps.supports_op(multiorm::CmpOp::Between));

    // A caller that consults capabilities first never hits a translation
    // error for a supported operator.
    if caps.supports_op(multiorm::CmpOp::Between) {
        let (sql, params) = provider
            .query(&users_schema())
            .where_(between("age", 18, 65))
            .build()
            .expect("build");
        assert!(sql.contains("`age` BETWEEN ? AND ?"));
        assert_eq!(params, vec![Value::Int(18), Value::Int(65)]);
    }
}

#[test]
fn changeset_feeds_builder_values() {
    let cs = Changeset::new(users_schema())
        .cast(vec![
            ("name".to_string(), Value::Text("Bob".into())),
            ("age".to_string(), Value::Text("44".into())),
            ("status".to_string(), Value::Text("active".into())),
        ])
        .validate_required(&["name", "status"]);
    assert!(cs.is_valid());
    assert_eq!(cs.get_change("age"), Some(&Value::Int(44)));

    // Use the cast status value in a query against another dialect.
    let status = cs.get("status").cloned().unwrap();
    let (sql, params) = SqlQueryProvider::sqlite()
        .query(&users_schema())
        .where_(eq("status", status))
        .where_(gt("age", 40))
        .build()
        .expect("build");
    assert_eq!(
        sql,
        "SELECT * FROM `users` WHERE `status` = ? AND `age` > ?"
    );
    assert_eq!(params, vec![Value::Text("active".into()), Value::Int(40)]);
}

#[test]
fn one_query_three_backends() {
    let providers = [
        SqlQueryProvider::mysql(),
        SqlQueryProvider::postgres(),
        SqlQueryProvider::sqlite(),
    ];
    let mut arg_sets = Vec::new();
    for provider in &providers {
        let (sql, params) = provider
            .query(&users_schema())
            .where_(in_list("id", vec![1i64, 2, 3]))
            .build()
            .expect("build");
        assert_eq!(params.len(), 3);
        assert!(sql.contains("IN ("));
        arg_sets.push(params);
    }
    assert_eq!(arg_sets[0], arg_sets[1]);
    assert_eq!(arg_sets[1], arg_sets[2]);
}
