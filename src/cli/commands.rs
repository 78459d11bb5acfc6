use clap::Subcommand;

use super::evaluate::EvaluateArgs;
use super::list::ListArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// List registered measures
    List(ListArgs),

    /// List the measure groups in use
    Groups,

    /// Evaluate measures against a hierarchy document
    Evaluate(EvaluateArgs),
}
