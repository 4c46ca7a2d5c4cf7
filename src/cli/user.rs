use chrono::Utc;
use inquire::{Confirm, Password, Text};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{hash_password, issue_token};
use crate::server::validation::{normalize_email, validate_password};
use crate::store::Store;
use crate::types::{Capability, User};

use super::init_store;
use super::pickers::{format_relative_time, get_or_pick_user, list_users, pick_expiration};

#[derive(Serialize)]
struct UserOutput {
    id: String,
    email: String,
    capabilities: Vec<&'static str>,
    is_active: bool,
    created_at: String,
    last_login_at: Option<String>,
}

pub fn run_user_add(
    data_dir: String,
    email: Option<String>,
    password: Option<String>,
    moderator: bool,
    create_token_flag: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let email = if let Some(email) = email {
        normalize_email(&email).map_err(|e| anyhow::Error::msg(e.message))?
    } else if non_interactive {
        anyhow::bail!("--email is required in non-interactive mode");
    } else {
        let raw = Text::new("Email:")
            .with_validator(|input: &str| {
                Ok(normalize_email(input)
                    .map(|_| inquire::validator::Validation::Valid)
                    .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.message.into())))
            })
            .prompt()?;
        normalize_email(&raw).map_err(|e| anyhow::Error::msg(e.message))?
    };

    if store.get_user_by_email(&email)?.is_some() {
        anyhow::bail!("User '{}' already exists", email);
    }

    let password = match password {
        Some(password) => Some(password),
        None if non_interactive => None,
        None => {
            if Confirm::new("Set a password for web login?")
                .with_default(true)
                .prompt()?
            {
                Some(Password::new("Password:").prompt()?)
            } else {
                None
            }
        }
    };

    let password_hash = match password.as_deref() {
        Some(password) => {
            validate_password(password, None).map_err(|e| anyhow::Error::msg(e.message))?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let capabilities = if moderator {
        Capability::moderator()
    } else {
        Capability::default()
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.clone(),
        first_name: None,
        last_name: None,
        phone: None,
        city: None,
        password_hash,
        capabilities,
        is_active: true,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };

    store.create_user(&user)?;

    println!();
    if moderator {
        println!("Created moderator \"{email}\"");
    } else {
        println!("Created user \"{email}\"");
    }

    let should_create_token = if create_token_flag {
        true
    } else if non_interactive {
        false
    } else {
        Confirm::new("Create access token?")
            .with_default(true)
            .prompt()?
    };

    if should_create_token {
        let expires_in = if non_interactive {
            None
        } else {
            match pick_expiration()? {
                Some(exp) => exp,
                None => {
                    println!("Token creation cancelled.");
                    return Ok(());
                }
            }
        };

        let (_, raw_token) = issue_token(&store, false, Some(user.id), expires_in)?;

        println!();
        println!("Token created: {raw_token}");
        println!("  Save this now - it cannot be retrieved later.");
    }

    println!();

    Ok(())
}

pub fn run_user_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let users = list_users(&store)?;

    if json {
        let output: Vec<UserOutput> = users
            .iter()
            .map(|d| UserOutput {
                id: d.user.id.clone(),
                email: d.user.email.clone(),
                capabilities: d.user.capabilities.to_strings(),
                is_active: d.user.is_active,
                created_at: d.user.created_at.to_rfc3339(),
                last_login_at: d.user.last_login_at.map(|dt| dt.to_rfc3339()),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    println!();
    for display in &users {
        let last_login = match &display.user.last_login_at {
            Some(dt) => format!("last login {}", format_relative_time(dt)),
            None => "never logged in".to_string(),
        };
        println!("  {display}  {last_login}");
    }
    println!();

    Ok(())
}

/// Adds the user to, or removes them from, the moderators group.
pub fn run_moderator(
    data_dir: String,
    email: Option<String>,
    grant: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let Some(mut user) = get_or_pick_user(&store, email, non_interactive)? else {
        return Ok(());
    };

    user.capabilities = if grant {
        user.capabilities.union(Capability::moderator())
    } else {
        user.capabilities.difference(Capability::moderator())
    };
    user.updated_at = Utc::now();
    store.update_user(&user)?;

    println!();
    if grant {
        println!("Added '{}' to moderators", user.email);
    } else {
        println!("Removed '{}' from moderators", user.email);
    }
    println!();

    Ok(())
}
