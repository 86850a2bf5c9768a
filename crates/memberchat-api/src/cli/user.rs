//! Account administration commands: create, list, passwd.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Input, Password};

use memberchat_core::repository::user::UserRepository;
use memberchat_types::user::{NewUser, User};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create an account (prompts for anything not given).
    Create {
        /// Email address.
        #[arg(long)]
        email: Option<String>,

        /// Display name.
        #[arg(long)]
        name: Option<String>,

        /// Password (prompted with hidden input when omitted).
        #[arg(long, env = "MCHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Create the account without chat access.
        #[arg(long)]
        no_subscriber: bool,
    },

    /// List accounts, oldest first.
    #[command(alias = "ls")]
    List {
        /// Maximum rows to show.
        #[arg(long)]
        limit: Option<i64>,

        /// Rows to skip.
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Set a new password for an account.
    Passwd {
        /// Email address of the account.
        email: String,

        /// New password (prompted with hidden input when omitted).
        #[arg(long, env = "MCHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

/// Dispatch a `mchat user` subcommand.
pub async fn run(state: &AppState, action: UserCommand, json: bool) -> Result<()> {
    match action {
        UserCommand::Create {
            email,
            name,
            password,
            no_subscriber,
        } => create_user(state, email, name, password, !no_subscriber, json).await,
        UserCommand::List { limit, offset } => list_users(state, limit, offset, json).await,
        UserCommand::Passwd { email, password } => {
            set_password(state, &email, password, json).await
        }
    }
}

fn prompt_new_password() -> Result<String> {
    Ok(Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?)
}

/// Create an account, validating like the signup endpoint.
///
/// # Examples
///
/// ```bash
/// # Interactive
/// mchat user create
///
/// # Script/automation mode
/// MCHAT_PASSWORD=... mchat user create --email ana@example.com --name Ana
/// ```
pub async fn create_user(
    state: &AppState,
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
    is_subscriber: bool,
    json: bool,
) -> Result<()> {
    let email = match email {
        Some(e) => e,
        None => Input::<String>::new().with_prompt("Email").interact_text()?,
    };
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Name")
            .allow_empty(true)
            .interact_text()?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt_new_password()?,
    };

    let user = state
        .auth_service
        .signup(NewUser {
            email,
            password,
            name: Some(name),
            is_subscriber: Some(is_subscriber),
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!("  {} Account created", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Email:").bold(), style(&user.email).cyan());
    if !user.name.is_empty() {
        println!("  {}   {}", style("Name:").bold(), &user.name);
    }
    println!(
        "  {} {}",
        style("Access:").bold(),
        if user.is_subscriber { "subscriber" } else { "no chat access" }
    );
    println!("  {}     {}", style("ID:").bold(), style(user.id.to_string()).dim());
    println!();

    Ok(())
}

/// List accounts in a table.
pub async fn list_users(
    state: &AppState,
    limit: Option<i64>,
    offset: Option<i64>,
    json: bool,
) -> Result<()> {
    let users = state
        .auth_service
        .users()
        .list_users(limit, offset)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  {} No accounts yet. Create one with: {}",
            style("i").blue().bold(),
            style("mchat user create").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", users_table(&users));
    println!();
    println!("  {} account(s)", users.len());
    println!();

    Ok(())
}

fn users_table(users: &[User]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Email").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Sign-in").fg(Color::White),
        Cell::new("Access").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for user in users {
        let sign_in = match (user.has_password(), user.external_id.is_some()) {
            (true, true) => "password + google",
            (true, false) => "password",
            (false, true) => "google",
            (false, false) => "none",
        };
        let access = if user.is_subscriber {
            Cell::new("● subscriber").fg(Color::Green)
        } else {
            Cell::new("○ none").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(&user.email),
            Cell::new(&user.name),
            Cell::new(sign_in),
            access,
            Cell::new(user.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    table
}

/// Replace an account's password without a reset link.
pub async fn set_password(
    state: &AppState,
    email: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_new_password()?,
    };

    let user = state.auth_service.set_password(email, &password).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"updated": true, "id": user.id, "email": user.email})
        );
    } else {
        println!(
            "  {} Password updated for {}",
            style("✓").green().bold(),
            style(&user.email).bold()
        );
    }

    Ok(())
}
