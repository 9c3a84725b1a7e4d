//! CLI argument parsing using clap 4.x derive macros

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use sherwood_core::{BackendId, ProductKind};

/// Draft research products with a team of LLM interns and reviewers
///
/// Interns with web access draft the product; reviewers without internet
/// access compare the drafts and flag where they agree, differ or look
/// factually doubtful.
#[derive(Parser, Debug)]
#[command(name = "sherwood")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./sherwood.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draft a product with the selected interns and have reviewers compare
    Run(RunArgs),

    /// Print the prompt the interns would receive, without calling anyone
    Prompt {
        #[command(flatten)]
        subject: SubjectArgs,
    },

    /// Describe the available interns and reviewers
    Backends,
}

/// Product kind and where its subject comes from
#[derive(Args, Debug)]
pub struct SubjectArgs {
    /// cv, developments, factsheet, tariffs or custom
    #[arg(short, long)]
    pub product: ProductKind,

    /// Person or country, or the full request for a custom product
    #[arg(short, long, conflicts_with = "file")]
    pub subject: Option<String>,

    /// Read the subject from a file (handy for long custom requests)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub subject: SubjectArgs,

    /// Intern to deploy (repeatable; defaults to Sonar, Deepseek and Gemini)
    #[arg(short = 'i', long = "intern")]
    pub interns: Vec<BackendId>,

    /// Reviewer to deploy (repeatable; defaults to Graham and Oscar)
    #[arg(short = 'r', long = "reviewer", conflicts_with = "no_reviewers")]
    pub reviewers: Vec<BackendId>,

    /// Skip the comparison stage
    #[arg(long)]
    pub no_reviewers: bool,

    /// Copy all answers to the clipboard when the run finishes
    #[arg(long)]
    pub copy: bool,

    /// Do not send bot notifications
    #[arg(long)]
    pub no_notify: bool,
}

impl RunArgs {
    pub fn interns(&self) -> Vec<BackendId> {
        if self.interns.is_empty() {
            BackendId::default_interns()
        } else {
            self.interns.clone()
        }
    }

    pub fn reviewers(&self) -> Vec<BackendId> {
        if self.no_reviewers {
            Vec::new()
        } else if self.reviewers.is_empty() {
            BackendId::default_reviewers()
        } else {
            self.reviewers.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sherwood").chain(args.iter().copied())).unwrap()
    }

    fn run_args(cli: Cli) -> RunArgs {
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn run_defaults_to_standard_team() {
        let args = run_args(parse(&["run", "--product", "cv", "--subject", "Jane Doe"]));
        assert_eq!(args.subject.product, ProductKind::Biography);
        assert_eq!(args.subject.subject.as_deref(), Some("Jane Doe"));
        assert_eq!(args.interns(), BackendId::default_interns());
        assert_eq!(args.reviewers(), BackendId::default_reviewers());
    }

    #[test]
    fn repeated_flags_keep_order() {
        let args = run_args(parse(&[
            "run", "-p", "factsheet", "-s", "Laos", "-i", "gemini", "-i", "sonar", "-r", "oscar",
        ]));
        assert_eq!(args.interns(), vec![BackendId::Gemini, BackendId::Sonar]);
        assert_eq!(args.reviewers(), vec![BackendId::Oscar]);
    }

    #[test]
    fn no_reviewers_clears_selection() {
        let args = run_args(parse(&["run", "-p", "tariffs", "-s", "Vietnam", "--no-reviewers"]));
        assert!(args.reviewers().is_empty());
    }

    #[test]
    fn rejects_unknown_backend() {
        let result = Cli::try_parse_from(["sherwood", "run", "-p", "cv", "-s", "x", "-i", "claude"]);
        assert!(result.is_err());
    }

    #[test]
    fn subject_and_file_conflict() {
        let result = Cli::try_parse_from([
            "sherwood", "prompt", "-p", "custom", "-s", "text", "-f", "request.txt",
        ]);
        assert!(result.is_err());
    }
}
