use std::backtrace::Backtrace;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tether::common::{Document, Value};
use tether::errors::TetherResult;
use tether::scope::{Scope, StorePool};
use tether::store::{
    ChangeOutcome, DocumentStore, FindOptions, MemoryConnector, StoreCollection, StoreConnector,
    StoreCursor,
};
use tether::tether_config::TetherConfig;
use tether::TetherBuilder;

/// Runs a test with retry logic and error handling.
/// Tests run on the current thread; every attempt gets a fresh context from `before`.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> TetherResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> TetherResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> TetherResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        let (error, backtrace) = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => (e, bt),
            Err(panic_err) => {
                let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                (format!("Panic: {}", message), Backtrace::capture().to_string())
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("Error: {}", error);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(error);
        last_backtrace = Some(backtrace);
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// A pool over a fresh in-memory database whose store calls are counted.
#[derive(Clone)]
pub struct TestContext {
    pool: StorePool,
    stats: Arc<StoreStats>,
}

impl TestContext {
    pub fn new(pool: StorePool, stats: Arc<StoreStats>) -> Self {
        Self { pool, stats }
    }

    pub fn pool(&self) -> StorePool {
        self.pool.clone()
    }

    /// Opens a new execution scope on the pool.
    pub fn scope(&self) -> Scope {
        self.pool.scope()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}

pub fn random_database() -> String {
    format!("test-{}", uuid::Uuid::new_v4().simple())
}

pub fn create_test_context() -> TetherResult<TestContext> {
    create_test_context_with(TetherBuilder::new())
}

/// Like [create_test_context], starting from a partly configured builder.
pub fn create_test_context_with(builder: TetherBuilder) -> TetherResult<TestContext> {
    let stats = Arc::new(StoreStats::default());
    let connector = RecordingConnector::new(MemoryConnector::new(), stats.clone());
    let pool = builder
        .database(&random_database())
        .connector(connector)
        .build()?;
    Ok(TestContext::new(pool, stats))
}

pub fn cleanup(ctx: TestContext) -> TetherResult<()> {
    ctx.pool.close()
}

/// Number of calls that reached the store, per primitive.
#[derive(Debug, Default)]
pub struct StoreStats {
    finds: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    upserts: AtomicUsize,
    removes: AtomicUsize,
    cursor_closes: AtomicUsize,
}

impl StoreStats {
    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    pub fn cursor_closes(&self) -> usize {
        self.cursor_closes.load(Ordering::SeqCst)
    }

    /// Calls that mutate the store.
    pub fn writes(&self) -> usize {
        self.inserts() + self.updates() + self.upserts() + self.removes()
    }
}

/// Wraps a connector so that every collection call is counted in [StoreStats].
pub struct RecordingConnector<C> {
    inner: C,
    stats: Arc<StoreStats>,
}

impl<C: StoreConnector> RecordingConnector<C> {
    pub fn new(inner: C, stats: Arc<StoreStats>) -> Self {
        Self { inner, stats }
    }
}

impl<C: StoreConnector> StoreConnector for RecordingConnector<C> {
    fn connect(&self, config: &TetherConfig) -> TetherResult<Arc<dyn DocumentStore>> {
        let store = self.inner.connect(config)?;
        Ok(Arc::new(RecordingStore {
            inner: store,
            stats: self.stats.clone(),
        }))
    }
}

struct RecordingStore {
    inner: Arc<dyn DocumentStore>,
    stats: Arc<StoreStats>,
}

impl DocumentStore for RecordingStore {
    fn session(&self) -> TetherResult<Arc<dyn DocumentStore>> {
        Ok(Arc::new(RecordingStore {
            inner: self.inner.session()?,
            stats: self.stats.clone(),
        }))
    }

    fn database_name(&self) -> String {
        self.inner.database_name()
    }

    fn collection(&self, name: &str) -> TetherResult<Arc<dyn StoreCollection>> {
        Ok(Arc::new(RecordingCollection {
            inner: self.inner.collection(name)?,
            stats: self.stats.clone(),
        }))
    }

    fn collection_names(&self) -> TetherResult<Vec<String>> {
        self.inner.collection_names()
    }

    fn close(&self) -> TetherResult<()> {
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

struct RecordingCollection {
    inner: Arc<dyn StoreCollection>,
    stats: Arc<StoreStats>,
}

impl StoreCollection for RecordingCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn find(&self, filter: &Document, options: &FindOptions) -> TetherResult<Box<dyn StoreCursor>> {
        self.stats.finds.fetch_add(1, Ordering::SeqCst);
        let cursor = self.inner.find(filter, options)?;
        Ok(Box::new(RecordingCursor {
            inner: cursor,
            stats: self.stats.clone(),
        }))
    }

    fn count(&self, filter: &Document, options: &FindOptions) -> TetherResult<usize> {
        self.inner.count(filter, options)
    }

    fn distinct(&self, field: &str, filter: &Document) -> TetherResult<Vec<Value>> {
        self.inner.distinct(field, filter)
    }

    fn insert(&self, document: Document) -> TetherResult<Value> {
        self.stats.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(document)
    }

    fn update(&self, filter: &Document, document: Document) -> TetherResult<()> {
        self.stats.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(filter, document)
    }

    fn upsert(&self, filter: &Document, document: Document) -> TetherResult<ChangeOutcome> {
        self.stats.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(filter, document)
    }

    fn remove(&self, filter: &Document) -> TetherResult<()> {
        self.stats.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(filter)
    }
}

struct RecordingCursor {
    inner: Box<dyn StoreCursor>,
    stats: Arc<StoreStats>,
}

impl StoreCursor for RecordingCursor {
    fn next(&mut self) -> Option<Document> {
        self.inner.next()
    }

    fn close(&mut self) -> TetherResult<()> {
        self.stats.cursor_closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}
