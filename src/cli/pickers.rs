use std::fmt;

use chrono::{DateTime, Duration, Utc};
use inquire::{InquireError, Select};

use crate::store::Store;
use crate::types::User;

/// Upper bound on rows loaded for interactive pickers.
const PICKER_LIMIT: i64 = 1000;

pub struct UserDisplay {
    pub user: User,
}

impl fmt::Display for UserDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user.email)?;
        if self.user.capabilities.has(crate::types::Capability::moderator()) {
            write!(f, "  (moderator)")?;
        }
        if !self.user.is_active {
            write!(f, "  [inactive]")?;
        }
        Ok(())
    }
}

struct ExpirationOption {
    label: &'static str,
    days: Option<i64>,
}

impl fmt::Display for ExpirationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

/// Format a datetime as relative time (e.g., "2 days ago")
#[must_use]
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let diff = Utc::now().signed_duration_since(*dt);

    if diff.num_seconds() < 0 {
        return "in the future".to_string();
    }
    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }

    let (n, unit) = if diff.num_minutes() < 60 {
        (diff.num_minutes(), "minute")
    } else if diff.num_hours() < 24 {
        (diff.num_hours(), "hour")
    } else if diff.num_days() < 30 {
        (diff.num_days(), "day")
    } else if diff.num_days() < 365 {
        (diff.num_days() / 30, "month")
    } else {
        (diff.num_days() / 365, "year")
    };

    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Get all users for listing
pub fn list_users(store: &impl Store) -> anyhow::Result<Vec<UserDisplay>> {
    Ok(store
        .list_users(0, PICKER_LIMIT)?
        .into_iter()
        .map(|user| UserDisplay { user })
        .collect())
}

/// Pick a user from the list
pub fn pick_user(store: &impl Store) -> anyhow::Result<Option<User>> {
    let users = list_users(store)?;

    if users.is_empty() {
        println!("No users found.");
        return Ok(None);
    }

    let selection = Select::new("Select user:", users)
        .with_page_size(15)
        .with_help_message("Type to filter, Enter to select")
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(display) => Ok(Some(display.user)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Get a user by email or interactively pick one
pub fn get_or_pick_user(
    store: &impl Store,
    email: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<Option<User>> {
    if let Some(email) = email {
        let email = email.trim().to_lowercase();
        let user = store
            .get_user_by_email(&email)?
            .ok_or_else(|| anyhow::anyhow!("User not found: {email}"))?;
        Ok(Some(user))
    } else if non_interactive {
        anyhow::bail!("--email is required in non-interactive mode");
    } else {
        pick_user(store)
    }
}

/// Pick token expiration
pub fn pick_expiration() -> anyhow::Result<Option<Option<Duration>>> {
    let options = vec![
        ExpirationOption {
            label: "30 days",
            days: Some(30),
        },
        ExpirationOption {
            label: "90 days",
            days: Some(90),
        },
        ExpirationOption {
            label: "1 year",
            days: Some(365),
        },
        ExpirationOption {
            label: "Never",
            days: None,
        },
    ];

    let selection = Select::new("Token expiration:", options)
        .with_page_size(4)
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(opt) => Ok(Some(opt.days.map(Duration::days))),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Request confirmation for a destructive operation
pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}
