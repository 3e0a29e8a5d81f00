//! Database dispatch macros for reducing code duplication.
//!
//! This module provides declarative macros that generate database-specific
//! match arms over `DbPool` while keeping each arm readable inline.

/// Macro for generating database dispatch match arms.
///
/// # Example
///
/// ```ignore
/// let handle = impl_db_dispatch!(&self.pool, {
///     MySql(p) => Handle::MySql(p.acquire().await?),
///     SQLite(p) => Handle::SQLite(p.acquire().await?),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
