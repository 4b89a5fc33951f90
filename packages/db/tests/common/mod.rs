use std::error::Error;
use std::future::Future;
use std::sync::{LazyLock, Mutex};

use db::DbConfig;

/// The global connection is bound to the runtime that opened it, so every
/// test drives its body on this one runtime.
static RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime")
});

static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Run `test` against a freshly emptied in-memory database.
pub fn run_db_test<F>(test: F) -> Result<(), Box<dyn Error>>
where
    F: Future<Output = Result<(), Box<dyn Error>>>,
{
    let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    RUNTIME.block_on(async {
        db::init(DbConfig::memory()).await?;
        db::get_db()?.query("DELETE article;").await?;
        test.await
    })
}
