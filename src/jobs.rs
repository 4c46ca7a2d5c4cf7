//! Periodic maintenance jobs run by the server process.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::store::Store;

/// Deactivates users whose last login (or creation, for users who never
/// logged in) is older than `inactive_after`. Returns how many were changed.
pub fn deactivate_inactive_users(store: &dyn Store, inactive_after: chrono::Duration) -> Result<usize> {
    let cutoff = Utc::now() - inactive_after;
    let count = store.deactivate_users_inactive_since(cutoff)?;
    if count > 0 {
        tracing::info!(count, %cutoff, "deactivated inactive users");
    }
    Ok(count)
}

/// Runs the inactive-user sweep on a fixed interval, starting immediately.
pub fn spawn_inactive_user_sweeper(
    store: Arc<dyn Store>,
    inactive_after: chrono::Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = deactivate_inactive_users(store.as_ref(), inactive_after) {
                tracing::error!("inactive user sweep failed: {e}");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{Capability, User};
    use tempfile::TempDir;

    fn user(id: &str, idle_days: i64) -> User {
        let then = Utc::now() - chrono::Duration::days(idle_days);
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            first_name: None,
            last_name: None,
            phone: None,
            city: None,
            password_hash: None,
            capabilities: Capability::default(),
            is_active: true,
            last_login_at: Some(then),
            created_at: then,
            updated_at: then,
        }
    }

    #[test]
    fn test_sweep_deactivates_only_idle_users() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();

        store.create_user(&user("idle", 31)).unwrap();
        store.create_user(&user("recent", 3)).unwrap();

        let count = deactivate_inactive_users(&store, chrono::Duration::days(30)).unwrap();
        assert_eq!(count, 1);
        assert!(!store.get_user("idle").unwrap().unwrap().is_active);
        assert!(store.get_user("recent").unwrap().unwrap().is_active);

        // second sweep finds nothing new
        assert_eq!(
            deactivate_inactive_users(&store, chrono::Duration::days(30)).unwrap(),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_start() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(temp.path().join("test.db")).unwrap());
        store.initialize().unwrap();
        store.create_user(&user("idle", 90)).unwrap();

        let handle = spawn_inactive_user_sweeper(
            store.clone(),
            chrono::Duration::days(30),
            Duration::from_secs(3600),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();

        assert!(!store.get_user("idle").unwrap().unwrap().is_active);
    }
}
