//! User command - IAM user lookup.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::{Style, style};

use super::{Context, print_json};

/// Arguments for the user command.
#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Search users by login ID
    Search {
        /// Login ID to look up
        login_id: String,
    },
}

/// Run the user command.
pub async fn run(args: UserArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client()?.iam_user()?;

    match args.command {
        UserCommand::Search { login_id } => {
            let users = api
                .search_user(&login_id)
                .await
                .with_context(|| format!("user search for '{}' failed", login_id))?;

            if ctx.json_output {
                return print_json(&users);
            }

            let dim = Style::new().dim();
            println!("{}", style("Users").bold());
            println!("{}", dim.apply_to("─".repeat(50)));

            if users.is_empty() {
                println!("{}", dim.apply_to("No users found"));
            }
            for user in &users {
                println!(
                    "{} {} {} <{}>",
                    style(&user.login_id).cyan(),
                    user.name.given,
                    user.name.family,
                    user.email_address
                );
                println!("  {}", dim.apply_to(format!("id: {}", user.id)));
                println!(
                    "  {}",
                    dim.apply_to(format!("organization: {}", user.managing_organization))
                );
                if ctx.verbose {
                    for membership in &user.memberships {
                        println!(
                            "  {}",
                            dim.apply_to(format!(
                                "member of {} roles=[{}]",
                                membership
                                    .organization_name
                                    .as_deref()
                                    .unwrap_or(&membership.organization_id),
                                membership.roles.join(", ")
                            ))
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
