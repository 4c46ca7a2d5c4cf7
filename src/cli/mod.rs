mod commands;
mod init;
pub mod pickers;
mod sweep;
mod token;
mod user;

pub use commands::{AdminCommands, ModeratorCommands, TokenCommands, UserCommands};
pub use init::{ADMIN_TOKEN_FILE, run_init};
pub use sweep::run_sweep;
pub use token::{run_token_create, run_token_list, run_token_revoke};
pub use user::{run_moderator, run_user_add, run_user_list};

use crate::store::SqliteStore;

/// Initialize store from data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let data_path: std::path::PathBuf = data_dir.into();
    let db_path = data_path.join(crate::config::DB_FILE_NAME);

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'coursework admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}
