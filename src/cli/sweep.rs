use chrono::Duration;

use crate::jobs::deactivate_inactive_users;

use super::init_store;

/// Runs one inactive-user sweep against the database.
pub fn run_sweep(data_dir: String, inactive_days: i64) -> anyhow::Result<()> {
    if inactive_days <= 0 {
        anyhow::bail!("--inactive-days must be positive");
    }

    let store = init_store(&data_dir)?;
    let count = deactivate_inactive_users(&store, Duration::days(inactive_days))?;

    println!();
    println!("Deactivated {count} inactive user(s).");
    println!();

    Ok(())
}
