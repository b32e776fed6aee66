//! Auth command - IAM token operations.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::Style;
use hsdp_oauth::{IamTokenSource, Token};

use super::{Context, print_json};

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in with the configured grant and print the access token
    Token,

    /// Show whether a token is active (default: a freshly issued one)
    Introspect {
        /// Access token to inspect
        token: Option<String>,
    },

    /// Revoke an access token
    Revoke {
        /// Access token to revoke
        token: String,
    },
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    let source = ctx.token_source()?;

    match args.command {
        AuthCommand::Token => cmd_token(&source, ctx).await,
        AuthCommand::Introspect { token } => cmd_introspect(&source, token, ctx).await,
        AuthCommand::Revoke { token } => cmd_revoke(&source, token, ctx).await,
    }
}

async fn cmd_token(source: &IamTokenSource, ctx: &Context) -> Result<()> {
    let token = source.login().await.context("login failed")?;

    if ctx.json_output {
        return print_json(&serde_json::json!({
            "access_token": token.access_token(),
            "token_type": token.token_type(),
            "expires_at": token.expires_at().to_rfc3339(),
            "scope": token.scope(),
        }));
    }

    println!("{}", token.access_token());
    if ctx.verbose {
        let dim = Style::new().dim();
        eprintln!(
            "{}",
            dim.apply_to(format!("expires in {}", token.expires_in_display()))
        );
    }
    Ok(())
}

async fn cmd_introspect(
    source: &IamTokenSource,
    token: Option<String>,
    ctx: &Context,
) -> Result<()> {
    let token = match token {
        Some(access_token) => Token::non_expiring(access_token),
        None => source.login().await.context("login failed")?,
    };
    let info = source
        .introspect(&token)
        .await
        .context("introspection failed")?;

    if ctx.json_output {
        return print_json(&info);
    }

    let (mark, label) = if info.active {
        (Style::new().green().apply_to("✓"), "active")
    } else {
        (Style::new().red().apply_to("✗"), "inactive")
    };
    println!("{} Token is {}", mark, label);

    let dim = Style::new().dim();
    if let Some(username) = &info.username {
        println!("  {}", dim.apply_to(format!("username: {}", username)));
    }
    if let Some(client_id) = &info.client_id {
        println!("  {}", dim.apply_to(format!("client: {}", client_id)));
    }
    if let Some(scope) = &info.scope {
        println!("  {}", dim.apply_to(format!("scope: {}", scope)));
    }
    Ok(())
}

async fn cmd_revoke(source: &IamTokenSource, token: String, ctx: &Context) -> Result<()> {
    source
        .revoke(&Token::non_expiring(token))
        .await
        .context("revoke failed")?;

    if ctx.json_output {
        return print_json(&serde_json::json!({ "revoked": true }));
    }
    println!("{} Token revoked", Style::new().green().apply_to("✓"));
    Ok(())
}
