use anyhow::Result;

use super::env::CliArgs;
use super::evaluate::cmd_evaluate;
use super::list::{cmd_groups, cmd_list};
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::List(args) => cmd_list(args, ctx).await,
        Commands::Groups => cmd_groups(ctx).await,
        Commands::Evaluate(args) => cmd_evaluate(args, ctx).await,
    }
}
