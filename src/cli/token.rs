use chrono::Duration;
use serde::Serialize;

use crate::auth::issue_token;
use crate::store::Store;
use crate::types::Token;

use super::init_store;
use super::pickers::{confirm_action, format_relative_time, get_or_pick_user, pick_expiration};

#[derive(Serialize)]
struct TokenOutput {
    id: String,
    lookup: String,
    user_id: Option<String>,
    is_admin: bool,
    created_at: String,
    expires_at: Option<String>,
    last_used_at: Option<String>,
}

impl From<&Token> for TokenOutput {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id.clone(),
            lookup: token.token_lookup.clone(),
            user_id: token.user_id.clone(),
            is_admin: token.is_admin,
            created_at: token.created_at.to_rfc3339(),
            expires_at: token.expires_at.map(|dt| dt.to_rfc3339()),
            last_used_at: token.last_used_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

pub fn run_token_create(
    data_dir: String,
    email: Option<String>,
    expires_days: Option<i64>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let Some(user) = get_or_pick_user(&store, email, non_interactive)? else {
        return Ok(());
    };

    let expires_in = if let Some(days) = expires_days {
        (days > 0).then(|| Duration::days(days))
    } else if non_interactive {
        None
    } else {
        match pick_expiration()? {
            Some(exp) => exp,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    };

    let (_, raw_token) = issue_token(&store, false, Some(user.id), expires_in)?;

    println!();
    println!("Token created for '{}': {}", user.email, raw_token);
    println!("  Save this now - it cannot be retrieved later.");
    println!();

    Ok(())
}

pub fn run_token_list(
    data_dir: String,
    email: Option<String>,
    non_interactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let Some(user) = get_or_pick_user(&store, email, non_interactive)? else {
        return Ok(());
    };
    let tokens = store.list_user_tokens(&user.id)?;

    if json {
        let output: Vec<TokenOutput> = tokens.iter().map(TokenOutput::from).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if tokens.is_empty() {
        println!("No tokens found.");
        return Ok(());
    }

    println!();
    for token in &tokens {
        let last_used = match &token.last_used_at {
            Some(dt) => format_relative_time(dt),
            None => "never used".to_string(),
        };
        println!(
            "  {}  cw_{}...  created {}  {}",
            token.id,
            token.token_lookup,
            format_relative_time(&token.created_at),
            last_used
        );
    }
    println!();

    Ok(())
}

pub fn run_token_revoke(
    data_dir: String,
    token_id: String,
    yes: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let token = store
        .get_token_by_id(&token_id)?
        .ok_or_else(|| anyhow::anyhow!("Token not found: {}", token_id))?;

    if token.is_admin {
        anyhow::bail!("The admin token cannot be revoked from the command line");
    }

    let confirmed = confirm_action(
        &format!("Revoke token cw_{}...?", token.token_lookup),
        yes,
        non_interactive,
    )?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_token(&token.id)?;

    println!();
    println!("Token revoked.");
    println!();

    Ok(())
}
