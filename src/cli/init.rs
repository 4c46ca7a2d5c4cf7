use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;

use crate::auth::issue_token;
use crate::store::{SqliteStore, Store};

pub const ADMIN_TOKEN_FILE: &str = ".admin_token";

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

/// Creates the database and the single admin token.
pub fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let data_path: PathBuf = data_dir.clone().into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join(crate::config::DB_FILE_NAME);
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    let token_file = data_path.join(ADMIN_TOKEN_FILE);

    if store.has_admin_token()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let (_, raw_token) = issue_token(&store, true, None, None)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    if !non_interactive {
        let create_user = inquire::Confirm::new("Would you like to create a moderator account?")
            .with_default(false)
            .prompt()?;

        if create_user {
            drop(store);
            super::run_user_add(data_dir, None, None, true, true, false)?;
        }
    }

    Ok(())
}
