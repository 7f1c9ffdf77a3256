use crate::config::Config;
use crate::traced::TracedPool;
use crate::Result;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

/// Build a connection pool from `config`.
///
/// Connections are opened lazily, so this succeeds even when the database is
/// down; the first checkout reports the failure.
pub fn create_pool(config: &Config) -> Result<TracedPool> {
    let url = config.require_database_url()?;
    let pg_config: tokio_postgres::Config = url.parse()?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    let pool = Pool::builder(manager)
        .max_size(config.pool_size)
        .wait_timeout(Some(config.pool_timeout))
        .runtime(Runtime::Tokio1)
        .build()?;

    tracing::debug!(max_size = config.pool_size, "created connection pool");
    Ok(TracedPool::new(pool))
}
