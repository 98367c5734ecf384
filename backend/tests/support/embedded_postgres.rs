//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! Each test binary shares one `pg-embed-setup-unpriv` cluster and stops it
//! when the process exits. Every test receives a fresh database cloned from a
//! template that already carries the schema and the seed catalog, so suites
//! never observe each other's rows.
//!
//! Set `SKIP_TEST_CLUSTER=1` where PostgreSQL cannot run; the suites then log
//! a skip marker instead of failing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{BootstrapResult, ClusterHandle, TemporaryDatabase};
use podium::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use tokio::runtime::Runtime;
use uuid::Uuid;

const TEMPLATE_PREFIX: &str = "podium_template";
const ATTEMPTS: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const STABLE_PASSWORD: &str = "podium_embedded_test";

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static POSTMASTER_PID: AtomicI32 = AtomicI32::new(0);
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// A migrated database plus a pool and runtime to drive repositories with.
pub(crate) struct TestDatabase {
    pub(crate) runtime: Runtime,
    pub(crate) pool: DbPool,
    pub(crate) url: String,
    _database: TemporaryDatabase,
}

/// Provision a database for one test, or `None` when skipping is allowed.
///
/// # Panics
///
/// Panics when the cluster cannot start and `SKIP_TEST_CLUSTER` is unset, so
/// a broken CI environment is never mistaken for a passing suite.
pub(crate) fn test_database() -> Option<TestDatabase> {
    match provision() {
        Ok(database) => Some(database),
        Err(reason) if skip_requested() => {
            eprintln!("SKIP-TEST-CLUSTER: {reason}");
            None
        }
        Err(reason) => {
            panic!("embedded PostgreSQL unavailable: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.")
        }
    }
}

fn skip_requested() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn provision() -> Result<TestDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster().map_err(|err| err.to_string())?;
    let database = clone_template(cluster, &runtime)?;
    let url = database.url().to_owned();
    let config = PoolConfig::new(url.as_str())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(TestDatabase {
        runtime,
        pool,
        url,
        _database: database,
    })
}

fn template_name() -> Result<String, String> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations).map_err(|err| format!("hash migrations: {err}"))?;
    let short = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_PREFIX}_{short}"))
}

fn ensure_template(cluster: &ClusterHandle, runtime: &Runtime) -> Result<String, String> {
    let name = template_name()?;
    let _guard = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&name);
        runtime
            .block_on(run_migrations(url.to_string()))
            .map_err(|err| format!("migrate template: {err}"))?;
    }
    Ok(name)
}

fn clone_template(cluster: &ClusterHandle, runtime: &Runtime) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::from("no attempt made");
    for attempt in 1..=ATTEMPTS {
        let cloned = ensure_template(cluster, runtime).and_then(|template| {
            let name = format!("test_{}", Uuid::new_v4().simple());
            cluster
                .temporary_database_from_template(name.as_str(), template.as_str())
                .map_err(|err| format!("clone template: {err:?}"))
        });
        match cloned {
            Ok(database) => return Ok(database),
            Err(err) => last_error = format!("attempt {attempt}/{ATTEMPTS}: {err}"),
        }
        std::thread::sleep(RETRY_DELAY);
    }
    Err(last_error)
}

/// The process-wide cluster, started on first use.
fn shared_cluster() -> BootstrapResult<&'static ClusterHandle> {
    // A reused data directory keeps the password chosen by its first initdb.
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster spawns threads; later calls see the
        // variable already set and skip the write.
        unsafe {
            std::env::set_var("PG_PASSWORD", STABLE_PASSWORD);
        }
    }
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => {
                stop_at_exit(handle);
                return Ok(handle);
            }
            Err(err) if attempt >= ATTEMPTS => return Err(err),
            Err(_) => {
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

fn postmaster_pid(data_dir: &Path) -> Option<i32> {
    let dir = cap_std::fs::Dir::open_ambient_dir(data_dir, cap_std::ambient_authority()).ok()?;
    let content = dir.read_to_string("postmaster.pid").ok()?;
    content.lines().next()?.trim().parse().ok()
}

/// Register a one-off exit hook; a running postmaster would block the next
/// test binary from starting on the same data directory.
fn stop_at_exit(handle: &ClusterHandle) {
    let data_dir = &handle.settings().data_dir;
    let Some(pid) = postmaster_pid(data_dir) else {
        return;
    };
    if POSTMASTER_PID
        .compare_exchange(0, pid, Ordering::Relaxed, Ordering::Relaxed)
        .is_err()
    {
        return;
    }
    let _ = DATA_DIR.set(data_dir.clone());

    // SAFETY: `stop_postmaster` is a plain `extern "C"` fn without arguments.
    if unsafe { libc::atexit(stop_postmaster) } != 0 {
        eprintln!("pg-embed: atexit registration failed; PostgreSQL {pid} may outlive the tests");
    }
}

extern "C" fn stop_postmaster() {
    let stored = POSTMASTER_PID.load(Ordering::Relaxed);
    // Re-read the pid file so a recycled pid is never signalled.
    let current = DATA_DIR.get().and_then(|dir| postmaster_pid(dir));
    if stored <= 0 || current != Some(stored) {
        return;
    }

    // SAFETY: `stored` matches the live postmaster.pid of our cluster.
    if unsafe { libc::kill(stored, libc::SIGTERM) } != 0 {
        return;
    }
    for _ in 0..50 {
        std::thread::sleep(Duration::from_millis(100));
        // SAFETY: signal 0 only probes whether the process exists.
        if unsafe { libc::kill(stored, 0) } != 0 {
            return;
        }
    }
    // SAFETY: same validated pid; the graceful budget is spent.
    unsafe {
        libc::kill(stored, libc::SIGKILL);
    }
}
