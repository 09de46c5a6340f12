//! User management commands.

use crate::cli::{Output, UserAction};
use crate::config::Settings;
use crate::db::{hash_password, Database, NewUser};
use crate::error::TubechatError;
use anyhow::Result;

/// Run a user subcommand.
pub fn run_user(action: &UserAction, settings: Settings) -> Result<()> {
    let database = Database::open(&settings.database_path())?;

    match action {
        UserAction::Add {
            name,
            email,
            password,
        } => {
            let new_user = NewUser {
                name: name.clone(),
                email: email.clone(),
                password: password.clone(),
            };
            let new_user = match new_user.validated() {
                Ok(valid) => valid,
                Err(e) => {
                    Output::error(&e.to_string());
                    return Err(e.into());
                }
            };

            let password_hash = hash_password(&new_user.password)?;
            let user = database.insert_user(&new_user.name, &new_user.email, &password_hash)?;
            Output::success(&format!("Registered user #{}", user.id));
            Output::user_info(&user);
        }

        UserAction::Show { id } => match database.get_user(*id)? {
            Some(user) => {
                Output::header(&format!("User #{}", user.id));
                Output::kv("Name", &user.name);
                Output::kv("Email", &user.email);
                Output::kv("Created", &user.created_at.to_rfc3339());
                Output::kv("Videos", &database.list_videos(user.id)?.len().to_string());
            }
            None => {
                let e = TubechatError::UserNotFound(*id);
                Output::error(&e.to_string());
                return Err(e.into());
            }
        },

        UserAction::List => {
            let users = database.list_users()?;
            if users.is_empty() {
                Output::info("No users yet. Use 'tubechat user add' to register one.");
            } else {
                Output::header(&format!("Users ({})", users.len()));
                println!();
                for user in &users {
                    Output::user_info(user);
                }
            }
        }
    }

    Ok(())
}
