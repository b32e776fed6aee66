//! TDR command - data item search.

use anyhow::{Context as _, Result, anyhow};
use clap::{Args, Subcommand};
use console::{Style, style};

use hsdp_client::{Coding, DataItem, DataItemQuery};

use super::{Context, print_json};

/// Arguments for the tdr command.
#[derive(Args, Debug)]
pub struct TdrArgs {
    #[command(subcommand)]
    pub command: TdrCommand,
}

#[derive(Subcommand, Debug)]
pub enum TdrCommand {
    /// Search data items
    Search {
        /// Owning organization
        #[arg(long)]
        organization: String,

        /// Data type as system|code
        #[arg(long, value_parser = parse_coding)]
        data_type: Coding,

        /// Restrict to one user, as system|value
        #[arg(long)]
        user: Option<String>,

        /// Page size
        #[arg(long)]
        count: Option<u32>,

        /// Follow next links until the last page
        #[arg(long)]
        all: bool,
    },
}

/// Run the tdr command.
pub async fn run(args: TdrArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client()?.tdr()?;

    match args.command {
        TdrCommand::Search {
            organization,
            data_type,
            user,
            count,
            all,
        } => {
            let mut query = DataItemQuery::new(organization, data_type);
            if let Some(user) = user {
                query = query.user(user);
            }
            if let Some(count) = count {
                query = query.count(count);
            }

            let mut page = api
                .search_data_items(&query)
                .await
                .context("data item search failed")?;
            let mut items: Vec<DataItem> = page.resources().cloned().collect();
            let mut pages = 1;

            while all {
                let Some(next) = api.next_page(&page).await.context("fetching next page failed")?
                else {
                    break;
                };
                items.extend(next.resources().cloned());
                page = next;
                pages += 1;
                tracing::debug!(pages, items = items.len(), "Fetched data item page");
            }

            if ctx.json_output {
                return print_json(&items);
            }

            let dim = Style::new().dim();
            println!("{}", style("Data items").bold());
            println!("{}", dim.apply_to("─".repeat(50)));
            if items.is_empty() {
                println!("{}", dim.apply_to("No data items found"));
            }
            for item in &items {
                println!(
                    "{} {} {}",
                    dim.apply_to(&item.timestamp),
                    style(&item.data_type.code).cyan(),
                    item.id
                );
            }
            if !all && page.next_link().is_some() {
                println!();
                println!("{}", dim.apply_to("More results available; use --all"));
            }
        }
    }

    Ok(())
}

fn parse_coding(s: &str) -> Result<Coding> {
    match s.split_once('|') {
        Some((system, code)) if !system.is_empty() && !code.is_empty() => Ok(Coding {
            system: system.to_string(),
            code: code.to_string(),
        }),
        _ => Err(anyhow!("expected system|code, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coding() {
        let coding = parse_coding("TDR|steps").unwrap();
        assert_eq!(coding.system, "TDR");
        assert_eq!(coding.code, "steps");

        assert!(parse_coding("steps").is_err());
        assert!(parse_coding("|steps").is_err());
        assert!(parse_coding("TDR|").is_err());
    }
}
