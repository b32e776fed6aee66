//! CDR command - FHIR resource search and read.

use anyhow::{Context as _, Result, anyhow};
use clap::{Args, Subcommand};

use hsdp_client::Format;

use super::{Context, print_json};

/// Arguments for the cdr command.
#[derive(Args, Debug)]
pub struct CdrArgs {
    #[command(subcommand)]
    pub command: CdrCommand,
}

#[derive(Subcommand, Debug)]
pub enum CdrCommand {
    /// Search resources of one type
    Search {
        /// FHIR resource type, e.g. Patient
        resource_type: String,

        /// Search parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Request XML instead of JSON
        #[arg(long)]
        xml: bool,
    },

    /// Read one resource
    Read {
        /// FHIR resource type, e.g. Patient
        resource_type: String,

        /// Logical resource ID
        id: String,

        /// Request XML instead of JSON
        #[arg(long)]
        xml: bool,
    },
}

/// Run the cdr command.
pub async fn run(args: CdrArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client()?.cdr()?;

    let (status, body) = match args.command {
        CdrCommand::Search {
            resource_type,
            params,
            xml,
        } => {
            let params: Vec<(&str, &str)> = params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let response = api
                .search(&resource_type, &params, format(xml))
                .await
                .with_context(|| format!("search of {} failed", resource_type))?;
            (response.status, response.body)
        }
        CdrCommand::Read {
            resource_type,
            id,
            xml,
        } => {
            let response = api
                .read(&resource_type, &id, format(xml))
                .await
                .with_context(|| format!("read of {}/{} failed", resource_type, id))?;
            (response.status, response.body)
        }
    };

    if ctx.json_output {
        return print_json(&serde_json::json!({ "status": status, "body": body }));
    }
    if ctx.verbose {
        eprintln!("HTTP {}", status);
    }
    println!("{}", body);
    Ok(())
}

fn format(xml: bool) -> Format {
    if xml { Format::Xml } else { Format::Json }
}

fn parse_param(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(anyhow!("empty parameter name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
