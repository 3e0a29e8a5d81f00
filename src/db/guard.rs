//! Connection-scoped guards.
//!
//! `AutoCommitGuard` overrides a connection's autocommit mode and puts the
//! original mode back; `RollbackGuard` rolls a transaction back unless it was
//! explicitly committed. Both deref to the wrapped connection so they nest:
//!
//! ```ignore
//! let mut auto = AutoCommitGuard::acquire(conn.as_mut(), false).await?;
//! let mut tx = RollbackGuard::new(&mut *auto);
//! tx.execute_update(&statement).await?;
//! tx.commit().await?;
//! tx.close().await?;
//! auto.restore().await?;
//! ```
//!
//! If `close` fails the transaction may still be open; drop the
//! `AutoCommitGuard` rather than restoring, since switching autocommit back on
//! would commit it.
//!
//! Cleanup needs I/O, so the normal exits are the async `close`/`restore`
//! calls. A guard dropped without them (early `?` that skipped cleanup, a
//! panic, a cancelled future) discards the connection instead: it is closed
//! rather than reused, and the database rolls back whatever was left open.

use crate::db::connection::Connection;
use crate::error::PersistResult;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// Overrides autocommit for the guard's lifetime.
pub struct AutoCommitGuard<'a, C: Connection + ?Sized> {
    conn: &'a mut C,
    original: bool,
    restored: bool,
}

impl<'a, C: Connection + ?Sized> AutoCommitGuard<'a, C> {
    /// Remember the connection's autocommit mode and switch it to `desired`.
    pub async fn acquire(conn: &'a mut C, desired: bool) -> PersistResult<Self> {
        let original = conn.auto_commit();
        conn.set_auto_commit(desired).await?;
        debug!(original, desired, "Autocommit overridden");
        Ok(Self {
            conn,
            original,
            restored: false,
        })
    }

    /// The autocommit mode the connection had before the guard.
    pub fn original(&self) -> bool {
        self.original
    }

    /// Put the original autocommit mode back.
    pub async fn restore(mut self) -> PersistResult<()> {
        // On failure `restored` stays false and Drop discards the connection.
        self.conn.set_auto_commit(self.original).await?;
        self.restored = true;
        Ok(())
    }
}

impl<C: Connection + ?Sized> Deref for AutoCommitGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.conn
    }
}

impl<C: Connection + ?Sized> DerefMut for AutoCommitGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.conn
    }
}

impl<C: Connection + ?Sized> Drop for AutoCommitGuard<'_, C> {
    fn drop(&mut self) {
        if !self.restored {
            warn!(
                original = self.original,
                "Autocommit mode not restored, discarding connection"
            );
            self.conn.discard();
        }
    }
}

/// Rolls back on exit unless `commit` succeeded.
pub struct RollbackGuard<'a, C: Connection + ?Sized> {
    conn: &'a mut C,
    committed: bool,
    settled: bool,
}

impl<'a, C: Connection + ?Sized> RollbackGuard<'a, C> {
    pub fn new(conn: &'a mut C) -> Self {
        Self {
            conn,
            committed: false,
            settled: false,
        }
    }

    /// Commit on the connection and mark the guard committed.
    pub async fn commit(&mut self) -> PersistResult<()> {
        self.conn.commit().await?;
        self.committed = true;
        self.settled = true;
        Ok(())
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// End the guard's scope, rolling back if `commit` was not called.
    pub async fn close(mut self) -> PersistResult<()> {
        if !self.committed {
            debug!("Rolling back uncommitted work");
            self.conn.rollback().await?;
        }
        self.settled = true;
        Ok(())
    }
}

impl<C: Connection + ?Sized> Deref for RollbackGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.conn
    }
}

impl<C: Connection + ?Sized> DerefMut for RollbackGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.conn
    }
}

impl<C: Connection + ?Sized> Drop for RollbackGuard<'_, C> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Transaction neither committed nor rolled back, discarding connection");
            self.conn.discard();
        }
    }
}
