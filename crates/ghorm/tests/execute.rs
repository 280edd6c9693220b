//! Runs the driver against stub gh-ost scripts.
#![cfg(unix)]

use ghorm::{
    ColumnDef, ExecuteConfig, Executor, FlagOption, GhormError, GhormResult, IndexDef,
    MemorySink, MigrationSpec, StreamKind,
};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::Mutex;

// Writing an executable while another test forks can fail the exec with ETXTBSY,
// so process tests run one at a time.
static SERIAL: Mutex<()> = Mutex::const_new(());

const ECHO_ARGS: &str = r#"for a in "$@"; do printf '%s\n' "$a"; done"#;

/// Write an executable `#!/bin/sh` script. The directory lives as long as the guard.
fn write_stub(name: &str, body: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::Builder::new()
        .prefix("ghorm_test")
        .tempdir()
        .expect("create stub dir");

    let path = dir.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod stub");
    (dir, path)
}

fn spec_for(binary: PathBuf, options: Vec<FlagOption>) -> MigrationSpec {
    MigrationSpec::new(binary, "127.0.0.1", "root", "123456", "test", "orders", options)
        .expect("valid coordinates")
}

fn capture() -> (Executor, MemorySink) {
    let sink = MemorySink::new();
    let executor = Executor::new().with_sink(sink.clone());
    (executor, sink)
}

#[tokio::test]
async fn argv_starts_with_fixed_prefix_and_ends_with_execute() -> GhormResult<()> {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub("gh-ost", ECHO_ARGS);
    let mut spec = spec_for(stub, vec![]);
    spec.add_column(
        ColumnDef::new("c1", "varchar")
            .length(10)
            .not_null()
            .default_value("'a'")
            .comment("test"),
    );

    let (executor, sink) = capture();
    let report = executor.run(&spec).await?;

    assert_eq!(
        sink.stream(StreamKind::Stdout),
        [
            "--host=127.0.0.1",
            "--user=root",
            "--password=123456",
            "--database=test",
            "--table=orders",
            "--alter=ADD COLUMN c1 varchar(10) NOT NULL DEFAULT 'a' COMMENT 'test'",
            "--allow-on-master",
            "--attempt-instant-ddl",
            "--initially-drop-ghost-table",
            "--initially-drop-old-table",
            "--execute",
        ]
    );
    assert_eq!(report.stdout_lines, 11);
    assert_eq!(report.stderr_lines, 0);
    assert!(report.status.success());
    Ok(())
}

#[tokio::test]
async fn pass_through_flags_reach_the_child() -> GhormResult<()> {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub("gh-ost", ECHO_ARGS);
    let mut spec = spec_for(
        stub,
        vec![
            FlagOption::new("exact-rowcount"),
            FlagOption::with_value("max-load", "Threads_running=25"),
            FlagOption::assume_master_host("db-master:3306"),
        ],
    );
    spec.set_engine("InnoDB");

    let (executor, sink) = capture();
    executor.run(&spec).await?;

    let args = sink.stream(StreamKind::Stdout);
    assert_eq!(args, spec.args());
    assert_eq!(args.len(), 14);
    let passed = &args[10..13];
    assert!(passed.contains(&"--exact-rowcount".to_string()));
    assert!(passed.contains(&"--max-load=Threads_running=25".to_string()));
    assert!(passed.contains(&"--assume-master-host=db-master:3306".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("--execute"));
    Ok(())
}

#[tokio::test]
async fn both_streams_are_forwarded_in_order() -> GhormResult<()> {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub(
        "gh-ost",
        "for i in 1 2 3; do echo \"out $i\"; echo \"err $i\" >&2; done",
    );
    let mut spec = spec_for(stub, vec![]);
    spec.remove_index("idx_c1");

    let (executor, sink) = capture();
    let report = executor.run(&spec).await?;

    assert_eq!(sink.stream(StreamKind::Stdout), ["out 1", "out 2", "out 3"]);
    assert_eq!(sink.stream(StreamKind::Stderr), ["err 1", "err 2", "err 3"]);
    assert_eq!(report.stdout_lines, 3);
    assert_eq!(report.stderr_lines, 3);
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_reported() {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub(
        "gh-ost",
        "echo 'ERROR You have an error in your SQL syntax' >&2\nexit 3",
    );
    let mut spec = spec_for(stub, vec![]);
    spec.modify_column(ColumnDef::new("c1", "bogus"));

    let (executor, sink) = capture();
    let err = executor.run(&spec).await.unwrap_err();

    assert!(err.is_exit());
    assert_eq!(err.exit_code(), Some(3));
    assert_eq!(
        sink.stream(StreamKind::Stderr),
        ["ERROR You have an error in your SQL syntax"]
    );
}

#[tokio::test]
async fn missing_binary_fails_to_start() {
    let _guard = SERIAL.lock().await;
    let mut spec = spec_for(PathBuf::from("/nonexistent/ghorm/gh-ost"), vec![]);
    spec.remove_column("c1");

    let err = Executor::new().run(&spec).await.unwrap_err();
    match err {
        GhormError::Spawn { binary, .. } => {
            assert_eq!(binary, PathBuf::from("/nonexistent/ghorm/gh-ost"));
        }
        other => panic!("expected spawn error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_alter_never_spawns() {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub("gh-ost", ECHO_ARGS);
    let spec = spec_for(stub, vec![]);

    let (executor, sink) = capture();
    let err = executor.run(&spec).await.unwrap_err();

    assert!(matches!(err, GhormError::EmptyAlter));
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn shutdown_kills_the_child() {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub("gh-ost", "echo started\nexec sleep 30");
    let mut spec = spec_for(stub, vec![]);
    spec.set_engine("InnoDB");

    let sink = MemorySink::new();
    let executor = Executor::new()
        .with_config(ExecuteConfig::new().kill_on_drop(true))
        .with_sink(sink.clone());

    let started = Instant::now();
    let err = executor
        .run_until(&spec, tokio::time::sleep(Duration::from_millis(500)))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(sink.stream(StreamKind::Stdout), ["started"]);
}

#[tokio::test]
async fn spec_can_be_reused_for_another_change() -> GhormResult<()> {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub("gh-ost", ECHO_ARGS);
    let mut spec = spec_for(stub, vec![]);
    let (executor, sink) = capture();

    spec.remove_column("legacy");
    executor.run(&spec).await?;
    spec.add_index(IndexDef::unique("idx_c1", ["c1"]).method("BTREE"))?;
    executor.run(&spec).await?;

    let alters: Vec<String> = sink
        .stream(StreamKind::Stdout)
        .into_iter()
        .filter(|a| a.starts_with("--alter="))
        .collect();
    assert_eq!(
        alters,
        [
            "--alter=DROP COLUMN legacy",
            "--alter=ADD UNIQUE INDEX idx_c1(c1) USING BTREE",
        ]
    );
    Ok(())
}

// A backgrounded grandchild inherits the pipes and keeps them open after gh-ost exits.
const LEAKS_PIPES: &str = "sleep 10 &\necho done\nexit 0";

#[tokio::test]
async fn held_pipes_do_not_block_a_finished_run() -> GhormResult<()> {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub("gh-ost", LEAKS_PIPES);
    let mut spec = spec_for(stub, vec![]);
    spec.set_engine("InnoDB");

    let sink = MemorySink::new();
    let executor = Executor::new()
        .with_config(ExecuteConfig::new().drain_grace(Duration::from_millis(300)))
        .with_sink(sink.clone());

    let started = Instant::now();
    let report = executor.run(&spec).await?;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.status.success());
    assert_eq!(report.stdout_lines, 1);
    assert_eq!(sink.stream(StreamKind::Stdout), ["done"]);
    Ok(())
}

#[tokio::test]
async fn shutdown_is_honoured_while_draining() {
    let _guard = SERIAL.lock().await;
    let (_dir, stub) = write_stub("gh-ost", LEAKS_PIPES);
    let mut spec = spec_for(stub, vec![]);
    spec.set_engine("InnoDB");

    let executor = Executor::new()
        .with_config(ExecuteConfig::new().drain_grace(Duration::from_secs(1)))
        .with_sink(MemorySink::new());

    let started = Instant::now();
    let err = executor
        .run_until(&spec, tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

/// In-memory log destination for a scoped `fmt` subscriber.
#[derive(Clone, Default)]
struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

async fn run_with_log(config: ExecuteConfig) -> String {
    let (_dir, stub) = write_stub("gh-ost", ECHO_ARGS);
    let mut spec = spec_for(stub, vec![]);
    spec.remove_column("legacy");

    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let log = log.clone();
            move || log.clone()
        })
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let _default = tracing::subscriber::set_default(subscriber);

    Executor::new()
        .with_config(config)
        .with_sink(MemorySink::new())
        .run(&spec)
        .await
        .expect("stub run succeeds");
    log.text()
}

#[tokio::test]
async fn launch_is_logged_once_with_password_redacted() {
    let _guard = SERIAL.lock().await;
    let log = run_with_log(ExecuteConfig::new()).await;

    let launches: Vec<&str> = log
        .lines()
        .filter(|l| l.contains("starting gh-ost"))
        .collect();
    assert_eq!(launches.len(), 1, "log was:\n{log}");
    assert!(launches[0].contains("ghorm.exec"));
    assert!(launches[0].contains("--password=***"));
    assert!(launches[0].contains("--alter=DROP COLUMN legacy"));
    assert!(!log.contains("123456"));
}

#[tokio::test]
async fn launch_log_shows_password_when_redaction_is_off() {
    let _guard = SERIAL.lock().await;
    let log = run_with_log(ExecuteConfig::new().redact_password(false)).await;

    let launch = log
        .lines()
        .find(|l| l.contains("starting gh-ost"))
        .expect("launch event");
    assert!(launch.contains("--password=123456"));
}
