use std::sync::Once;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use crate::store::Store;

static INIT_TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary.
///
/// Set `RUST_LOG` (for example `RUST_LOG=triplestore=debug`) to see the
/// store's logs in test output.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Create a new, empty store in a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped, so keep
/// it alive for as long as the store is in use.
#[allow(clippy::expect_used)]
pub fn new_test_store() -> (TempDir, Store) {
    init_tracing();
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = Store::open(dir.path().join("store"), true).expect("open test store");
    (dir, store)
}
