use sqltag::{
    BindDef, BindDefs, BindDirection, BindKey, BindMap, BindType, Dispatched, ExecuteManyOptions,
    ExecuteOptions, Executor, SqlError, SqlResult, Value, sql,
};
use std::future::Future;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Execute {
        sql: String,
        binds: BindMap,
        options: ExecuteOptions,
    },
    ExecuteMany {
        sql: String,
        rows: Vec<BindMap>,
        options: ExecuteManyOptions,
    },
}

#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    fail: bool,
}

impl RecordingExecutor {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for RecordingExecutor {
    type Output = u64;
    type BulkOutput = Vec<u64>;

    fn execute(
        &self,
        sql: &str,
        binds: &BindMap,
        options: &ExecuteOptions,
    ) -> impl Future<Output = SqlResult<u64>> + Send {
        self.calls.lock().unwrap().push(Call::Execute {
            sql: sql.to_string(),
            binds: binds.clone(),
            options: *options,
        });
        let result = if self.fail {
            Err(SqlError::transport("ORA-00942: table or view does not exist"))
        } else {
            Ok(1)
        };
        std::future::ready(result)
    }

    fn execute_many(
        &self,
        sql: &str,
        rows: &[BindMap],
        options: &ExecuteManyOptions,
    ) -> impl Future<Output = SqlResult<Vec<u64>>> + Send {
        self.calls.lock().unwrap().push(Call::ExecuteMany {
            sql: sql.to_string(),
            rows: rows.to_vec(),
            options: options.clone(),
        });
        std::future::ready(Ok(vec![1; rows.len()]))
    }
}

fn string(max_size: usize) -> BindDef {
    BindDef::new()
        .dir(BindDirection::In)
        .ty(BindType::String)
        .max_size(max_size)
}

#[tokio::test]
async fn scalar_query_runs_once() {
    let conn = RecordingExecutor::default();
    let q = sql!("DELETE FROM books WHERE id = {}", 7).unwrap();

    let out = q
        .execute(&conn, &ExecuteManyOptions::new().auto_commit(true))
        .await
        .unwrap();

    assert_eq!(out, Dispatched::Single(1));
    assert_eq!(
        conn.calls(),
        [Call::Execute {
            sql: "DELETE FROM books WHERE id = :1".to_string(),
            binds: BindMap::from([(BindKey::Position(1), Value::Int(7))]),
            options: ExecuteOptions::new().auto_commit(true),
        }]
    );
}

#[tokio::test]
async fn bulk_query_runs_many_with_inferred_defs() {
    let conn = RecordingExecutor::default();
    let q = sql!(
        "INSERT INTO books (author, genre) VALUES ({}, {})",
        ["bob", "joe", "bill"],
        "fantasy",
    )
    .unwrap();

    let out = q.execute(&conn, &ExecuteManyOptions::new()).await.unwrap();
    assert_eq!(out.bulk(), Some(vec![1, 1, 1]));

    let calls = conn.calls();
    let Call::ExecuteMany { sql, rows, options } = &calls[0] else {
        panic!("expected execute_many, got {calls:?}");
    };
    assert_eq!(sql, "INSERT INTO books (author, genre) VALUES (:1, :2)");
    assert_eq!(rows.len(), 3);
    assert_eq!(
        options.bind_defs,
        Some(BindDefs::from([
            (BindKey::Position(1), string(4)),
            (BindKey::Position(2), string(7)),
        ]))
    );
}

#[tokio::test]
async fn caller_defs_override_inferred_defs() {
    let conn = RecordingExecutor::default();
    let q = sql!("INSERT INTO books (author) VALUES ({})", ["bob", "joe"]).unwrap();
    let options = ExecuteManyOptions::new()
        .batch_errors(true)
        .bind_defs(BindDefs::from([(BindKey::Position(1), BindDef::new().max_size(64))]));

    q.execute(&conn, &options).await.unwrap();

    let calls = conn.calls();
    let Call::ExecuteMany { options, .. } = &calls[0] else {
        panic!("expected execute_many");
    };
    assert!(options.batch_errors);
    assert_eq!(
        options.bind_defs.as_ref().unwrap()[&BindKey::Position(1)],
        string(64)
    );
}

#[tokio::test]
async fn execute_many_wraps_single_map() {
    let conn = RecordingExecutor::default();
    let q = sql!("UPDATE books SET title = {} WHERE id = {}", "Mort", 3).unwrap();

    let out = q.execute_many(&conn, &ExecuteManyOptions::new()).await.unwrap();
    assert_eq!(out, vec![1]);

    let calls = conn.calls();
    let Call::ExecuteMany { rows, .. } = &calls[0] else {
        panic!("expected execute_many");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][&BindKey::Position(1)], Value::text("Mort"));
}

#[tokio::test]
async fn shape_errors_stop_before_the_executor() {
    let conn = RecordingExecutor::default();
    let q = sql!("INSERT INTO t (a, b) VALUES ({}, {})", [1, 2], [1]).unwrap();

    let err = q.execute(&conn, &ExecuteManyOptions::new()).await.unwrap_err();
    assert!(err.is_shape_error());
    assert!(conn.calls().is_empty());
}

#[cfg(feature = "tracing")]
#[tokio::test]
async fn tracing_executor_passes_results_through() {
    use sqltag::TracingExecutor;

    let conn = TracingExecutor::new(RecordingExecutor::default()).max_sql_length(10);
    let q = sql!("SELECT * FROM books WHERE id = {}", 1).unwrap();

    let out = q.execute(&conn, &ExecuteManyOptions::new()).await.unwrap();
    assert_eq!(out, Dispatched::Single(1));
    assert_eq!(conn.inner().calls().len(), 1);

    let failing = TracingExecutor::new(RecordingExecutor {
        fail: true,
        ..Default::default()
    });
    let err = q.execute(&failing, &ExecuteManyOptions::new()).await.unwrap_err();
    assert!(matches!(err, SqlError::Transport(_)));
}
