use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the server (create database and admin token)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Deactivate users that have not logged in recently
    Sweep {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Days without a login before a user is deactivated
        #[arg(long, default_value = "30")]
        inactive_days: i64,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new user
    Add {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email address of the new user
        #[arg(long)]
        email: Option<String>,

        /// Password for the new user (token-only user when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Add the user to the moderators group
        #[arg(long)]
        moderator: bool,

        /// Create a token for the new user
        #[arg(long)]
        create_token: bool,

        /// Skip interactive prompts (requires --email)
        #[arg(long)]
        non_interactive: bool,
    },

    /// List users
    List {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage moderators group membership
    Moderator {
        #[command(subcommand)]
        command: ModeratorCommands,
    },
}

#[derive(Subcommand)]
pub enum ModeratorCommands {
    /// Add a user to the moderators group
    Grant {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the user
        #[arg(long)]
        email: Option<String>,

        /// Skip interactive prompts (requires --email)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Remove a user from the moderators group
    Revoke {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the user
        #[arg(long)]
        email: Option<String>,

        /// Skip interactive prompts (requires --email)
        #[arg(long)]
        non_interactive: bool,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Create a token for a user
    Create {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the user to create a token for
        #[arg(long)]
        email: Option<String>,

        /// Token lifetime in days (0 or less means never)
        #[arg(long)]
        expires_days: Option<i64>,

        /// Skip interactive prompts (requires --email)
        #[arg(long)]
        non_interactive: bool,
    },

    /// List a user's tokens
    List {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the user
        #[arg(long)]
        email: Option<String>,

        /// Skip interactive prompts (requires --email)
        #[arg(long)]
        non_interactive: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke a token
    Revoke {
        /// Token ID to revoke
        #[arg(long)]
        token_id: String,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// Skip interactive prompts (requires --yes)
        #[arg(long)]
        non_interactive: bool,
    },
}
