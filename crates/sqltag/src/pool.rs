//! Connection pool registry.
//!
//! One pool per connect string, created lazily and shared by every caller.
//! A pool that stops handing out connections is torn down and rebuilt on the
//! next [`PoolRegistry::connection`] call, so an application recovers from a
//! database restart without intervention.

use crate::config::{ConnectConfig, PoolConfig};
use crate::error::{SqlError, SqlResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

/// Driver-side pool operations used by [`PoolRegistry`].
pub trait PoolManager: Send + Sync {
    type Pool: Send + Sync;
    type Connection: Send;

    /// Open a new pool for `connect` sized by `config`.
    fn create_pool(
        &self,
        connect: &ConnectConfig,
        config: &PoolConfig,
    ) -> impl Future<Output = SqlResult<Self::Pool>> + Send;

    /// Check out one connection.
    fn acquire(&self, pool: &Self::Pool)
    -> impl Future<Output = SqlResult<Self::Connection>> + Send;

    /// Round-trip to the server on an idle connection.
    fn ping(&self, conn: &mut Self::Connection) -> impl Future<Output = SqlResult<()>> + Send;

    /// Close the pool, giving in-use connections `drain` to finish.
    fn close(&self, pool: &Self::Pool, drain: Duration)
    -> impl Future<Output = SqlResult<()>> + Send;
}

struct Slot<P> {
    pool: OnceCell<Arc<P>>,
    last_ping: Mutex<Instant>,
}

impl<P> Slot<P> {
    fn new() -> Self {
        Self {
            pool: OnceCell::new(),
            last_ping: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_ping.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// `true` at most once per `interval`; the caller is expected to ping.
    fn ping_due(&self, interval: Duration) -> bool {
        let mut last = self.last_ping.lock().unwrap_or_else(PoisonError::into_inner);
        if last.elapsed() >= interval {
            *last = Instant::now();
            true
        } else {
            false
        }
    }
}

/// Pools keyed by connect string.
///
/// # Example
///
/// ```ignore
/// let registry = PoolRegistry::new(OracleManager::default(), PoolConfig::default());
/// let conn = registry.connection(&ConnectConfig::new("app", secret, "db:1521/APP")).await?;
/// ```
pub struct PoolRegistry<M: PoolManager> {
    manager: M,
    config: PoolConfig,
    slots: Mutex<HashMap<String, Arc<Slot<M::Pool>>>>,
}

impl<M: PoolManager> PoolRegistry<M> {
    pub fn new(manager: M, config: PoolConfig) -> Self {
        Self {
            manager,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of keys with a slot, initialized or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether a pool for `connect_string` is open.
    pub fn contains(&self, connect_string: &str) -> bool {
        self.lock()
            .get(connect_string)
            .is_some_and(|slot| slot.pool.initialized())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Slot<M::Pool>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Arc<Slot<M::Pool>> {
        self.lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Slot::new()))
            .clone()
    }

    /// Get the pool for `connect`, creating it on first use.
    ///
    /// Concurrent callers for the same connect string share a single
    /// creation. A failed creation is not remembered: the next call retries.
    pub async fn get_or_create(&self, connect: &ConnectConfig) -> SqlResult<Arc<M::Pool>> {
        self.pool_in_slot(connect).await.map(|(_, pool)| pool)
    }

    async fn pool_in_slot(
        &self,
        connect: &ConnectConfig,
    ) -> SqlResult<(Arc<Slot<M::Pool>>, Arc<M::Pool>)> {
        let key = connect_key(connect)?;
        let slot = self.slot(key);
        let pool = slot
            .pool
            .get_or_try_init(|| async {
                let pool = self.manager.create_pool(connect, &self.config).await?;
                tracing::debug!(
                    target: "sqltag.pool",
                    connect_string = %key,
                    pool_min = self.config.pool_min,
                    pool_max = self.config.pool_max,
                    "created pool"
                );
                slot.touch();
                Ok::<_, SqlError>(Arc::new(pool))
            })
            .await?
            .clone();
        Ok((slot, pool))
    }

    /// Check out a connection from the pool for `connect`.
    ///
    /// The checkout (and a ping, once per `ping_interval`) must finish within
    /// `acquire_timeout`. Otherwise the pool is closed and rebuilt, and the
    /// checkout is retried once on the new pool without a timeout.
    pub async fn connection(&self, connect: &ConnectConfig) -> SqlResult<M::Connection> {
        let (slot, pool) = self.pool_in_slot(connect).await?;
        match self.checkout(&slot, &pool).await {
            Ok(conn) => Ok(conn),
            Err(err) => {
                tracing::warn!(
                    target: "sqltag.pool",
                    connect_string = %connect.connect_string,
                    error = %err,
                    "connection checkout failed, recreating pool"
                );
                let pool = self.recreate(connect, &slot, &pool).await?;
                self.manager.acquire(&pool).await
            }
        }
    }

    async fn checkout(&self, slot: &Slot<M::Pool>, pool: &M::Pool) -> SqlResult<M::Connection> {
        let limit = self.config.acquire_timeout;
        let mut conn = tokio::time::timeout(limit, self.manager.acquire(pool))
            .await
            .map_err(|_| SqlError::Timeout(limit))??;
        if slot.ping_due(self.config.ping_interval) {
            tokio::time::timeout(limit, self.manager.ping(&mut conn))
                .await
                .map_err(|_| SqlError::Timeout(limit))??;
        }
        Ok(conn)
    }

    async fn recreate(
        &self,
        connect: &ConnectConfig,
        slot: &Arc<Slot<M::Pool>>,
        stale: &M::Pool,
    ) -> SqlResult<Arc<M::Pool>> {
        self.close_pool(&connect.connect_string, stale).await;
        {
            let mut slots = self.lock();
            // Another caller may already have replaced this slot.
            if slots
                .get(&connect.connect_string)
                .is_some_and(|current| Arc::ptr_eq(current, slot))
            {
                slots.remove(&connect.connect_string);
            }
        }
        self.get_or_create(connect).await
    }

    /// Close `pool` within `close_timeout`. Failures are logged, not returned.
    async fn close_pool(&self, key: &str, pool: &M::Pool) {
        match self.shutdown(pool).await {
            Ok(()) => {}
            Err(err) => tracing::warn!(
                target: "sqltag.pool",
                connect_string = %key,
                error = %err,
                "failed to close pool"
            ),
        }
    }

    async fn shutdown(&self, pool: &M::Pool) -> SqlResult<()> {
        let limit = self.config.close_timeout;
        tokio::time::timeout(limit, self.manager.close(pool, limit))
            .await
            .map_err(|_| SqlError::Timeout(limit))?
    }

    /// Close and forget the pool for `connect_string`.
    ///
    /// Returns `Ok(false)` when no pool was open under that key.
    pub async fn close(&self, connect_string: &str) -> SqlResult<bool> {
        let Some(slot) = self.lock().remove(connect_string) else {
            return Ok(false);
        };
        match slot.pool.get() {
            Some(pool) => {
                self.shutdown(pool).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close every open pool.
    ///
    /// All pools are attempted; the first error is returned.
    pub async fn close_all(&self) -> SqlResult<()> {
        let slots: Vec<_> = self.lock().drain().collect();
        let mut first_err = None;
        for (key, slot) in slots {
            let Some(pool) = slot.pool.get() else {
                continue;
            };
            if let Err(err) = self.shutdown(pool).await {
                tracing::warn!(
                    target: "sqltag.pool",
                    connect_string = %key,
                    error = %err,
                    "failed to close pool"
                );
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

fn connect_key(connect: &ConnectConfig) -> SqlResult<&str> {
    if connect.connect_string.is_empty() {
        return Err(SqlError::InvalidConnection(
            "connect string must not be empty".to_string(),
        ));
    }
    Ok(&connect.connect_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeManager {
        created: AtomicUsize,
        closed: AtomicUsize,
        pings: AtomicUsize,
        failing_creates: AtomicUsize,
        hang_first_pool: AtomicBool,
        create_delay: Duration,
    }

    struct FakePool {
        generation: usize,
    }

    #[derive(Debug)]
    struct FakeConn {
        generation: usize,
    }

    impl PoolManager for FakeManager {
        type Pool = FakePool;
        type Connection = FakeConn;

        fn create_pool(
            &self,
            _connect: &ConnectConfig,
            _config: &PoolConfig,
        ) -> impl Future<Output = SqlResult<FakePool>> + Send {
            async move {
                if !self.create_delay.is_zero() {
                    tokio::time::sleep(self.create_delay).await;
                }
                let fail = self
                    .failing_creates
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if fail {
                    return Err(SqlError::pool("listener refused"));
                }
                let generation = self.created.fetch_add(1, Ordering::SeqCst);
                Ok(FakePool { generation })
            }
        }

        fn acquire(&self, pool: &FakePool) -> impl Future<Output = SqlResult<FakeConn>> + Send {
            async move {
                if pool.generation == 0 && self.hang_first_pool.load(Ordering::SeqCst) {
                    std::future::pending::<()>().await;
                }
                Ok(FakeConn {
                    generation: pool.generation,
                })
            }
        }

        fn ping(&self, _conn: &mut FakeConn) -> impl Future<Output = SqlResult<()>> + Send {
            self.pings.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }

        fn close(&self, _pool: &FakePool, _drain: Duration) -> impl Future<Output = SqlResult<()>> + Send {
            self.closed.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    fn connect() -> ConnectConfig {
        ConnectConfig::new("app", "secret", "db.example.com:1521/APP")
    }

    #[tokio::test]
    async fn empty_connect_string_is_invalid() {
        let registry = PoolRegistry::new(FakeManager::default(), PoolConfig::default());
        let err = registry
            .get_or_create(&ConnectConfig::new("app", "secret", ""))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SqlError::InvalidConnection(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_pool() {
        let manager = FakeManager {
            create_delay: Duration::from_millis(20),
            ..Default::default()
        };
        let registry = PoolRegistry::new(manager, PoolConfig::default());
        let connect = connect();

        let pools = join_all((0..8).map(|_| registry.get_or_create(&connect))).await;
        let pools: Vec<_> = pools.into_iter().map(Result::unwrap).collect();

        assert_eq!(registry.manager().created.load(Ordering::SeqCst), 1);
        assert!(pools.iter().all(|pool| Arc::ptr_eq(pool, &pools[0])));
        assert!(registry.contains(&connect.connect_string));
    }

    #[tokio::test]
    async fn failed_creation_is_retried() {
        let manager = FakeManager {
            failing_creates: AtomicUsize::new(1),
            ..Default::default()
        };
        let registry = PoolRegistry::new(manager, PoolConfig::default());
        let connect = connect();

        assert!(registry.get_or_create(&connect).await.is_err());
        assert!(!registry.contains(&connect.connect_string));

        let pool = registry.get_or_create(&connect).await.unwrap();
        assert_eq!(pool.generation, 0);
    }

    #[tokio::test]
    async fn timed_out_checkout_recreates_pool() {
        let manager = FakeManager {
            hang_first_pool: AtomicBool::new(true),
            ..Default::default()
        };
        let config = PoolConfig::default().acquire_timeout(Duration::from_millis(30));
        let registry = PoolRegistry::new(manager, config);
        let connect = connect();

        let conn = registry.connection(&connect).await.unwrap();
        assert_eq!(conn.generation, 1);
        assert_eq!(registry.manager().created.load(Ordering::SeqCst), 2);
        assert_eq!(registry.manager().closed.load(Ordering::SeqCst), 1);

        let pool = registry.get_or_create(&connect).await.unwrap();
        assert_eq!(pool.generation, 1);
    }

    #[tokio::test]
    async fn ping_follows_interval() {
        let registry = PoolRegistry::new(FakeManager::default(), PoolConfig::default());
        registry.connection(&connect()).await.unwrap();
        registry.connection(&connect()).await.unwrap();
        assert_eq!(registry.manager().pings.load(Ordering::SeqCst), 0);

        let config = PoolConfig::default().ping_interval(Duration::ZERO);
        let registry = PoolRegistry::new(FakeManager::default(), config);
        registry.connection(&connect()).await.unwrap();
        registry.connection(&connect()).await.unwrap();
        assert_eq!(registry.manager().pings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn close_forgets_pool() {
        let registry = PoolRegistry::new(FakeManager::default(), PoolConfig::default());
        let connect = connect();
        registry.get_or_create(&connect).await.unwrap();

        assert!(registry.close(&connect.connect_string).await.unwrap());
        assert!(!registry.close(&connect.connect_string).await.unwrap());
        assert!(!registry.contains(&connect.connect_string));

        let pool = registry.get_or_create(&connect).await.unwrap();
        assert_eq!(pool.generation, 1);
    }

    #[tokio::test]
    async fn close_all_closes_every_pool() {
        let registry = PoolRegistry::new(FakeManager::default(), PoolConfig::default());
        registry.get_or_create(&connect()).await.unwrap();
        registry
            .get_or_create(&ConnectConfig::new("app", "secret", "replica:1521/APP"))
            .await
            .unwrap();

        registry.close_all().await.unwrap();
        assert_eq!(registry.manager().closed.load(Ordering::SeqCst), 2);
        assert!(registry.is_empty());
    }
}
