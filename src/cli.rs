use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::github::{Auth, TrafficClient, DEFAULT_API_URL};
use crate::resolve;

#[derive(Parser)]
#[command(name = "ghtraffic")]
#[command(about = "GitHub repository traffic reports: views, clones, referrers and paths")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Personal access token (falls back to GITHUB_TOKEN)")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Username for basic authentication")]
    pub user: Option<String>,

    #[arg(long, global = true, help = "Password for basic authentication")]
    pub password: Option<String>,

    #[arg(long, global = true, default_value = "", help = "Comma separated list of repos to ignore")]
    pub ignore: String,

    #[arg(
        long,
        global = true,
        default_value = "",
        help = "Comma separated list of repos to exclusively include"
    )]
    pub include: String,

    #[arg(long, global = true, default_value = DEFAULT_API_URL, help = "GitHub API base URL")]
    pub api_url: String,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Output format"
    )]
    pub output_format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = SortOrder::Asc,
        help = "Sort order for report rows"
    )]
    pub order: SortOrder,

    #[arg(
        long,
        global = true,
        default_value_t = 10,
        value_parser = clap::value_parser!(u16).range(1..=100),
        help = "Concurrent fetch workers (1-100)"
    )]
    pub workers: u16,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-day views and clones summary across repositories
    Summary {
        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            default_values = ["views", "clones"],
            help = "Metrics to fetch and show"
        )]
        metrics: Vec<Metric>,

        #[arg(
            long,
            default_value_t = 15,
            value_parser = clap::value_parser!(u32).range(0..=15),
            help = "Number of day columns shown in the table"
        )]
        days: u32,
    },
    /// Top referrers across repositories
    #[command(visible_aliases = ["refs", "hosts"])]
    Referrers,
    /// Top content paths across repositories
    Paths,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn is_descending(self) -> bool {
        matches!(self, SortOrder::Desc)
    }
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Metric {
    Views,
    Clones,
}

impl CommonArgs {
    pub fn workers(&self) -> usize {
        self.workers as usize
    }

    fn auth(&self) -> Result<Auth> {
        let token = self
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()));
        if let Some(token) = token {
            return Ok(Auth::Token(token));
        }
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Ok(Auth::Basic {
                user: user.clone(),
                password: password.clone(),
            }),
            _ => bail!(
                "authentication required: pass --token (or set GITHUB_TOKEN), or --user and --password"
            ),
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub async fn execute(self) -> Result<()> {
        let client = TrafficClient::new(&self.common.api_url, self.common.auth()?)
            .context("Failed to build API client")?;

        let repos = client
            .viewer_repos()
            .await
            .context("Failed to list repositories")?;
        let repos = resolve::filter_repos(
            repos,
            &resolve::parse_name_list(&self.common.ignore),
            &resolve::parse_name_list(&self.common.include),
        );

        match self.command {
            Commands::Summary { metrics, days } => {
                crate::summary::exec(&client, &repos, &self.common, &metrics, days).await
            }
            Commands::Referrers => crate::toplists::referrers(&client, &repos, &self.common).await,
            Commands::Paths => crate::toplists::paths(&client, &repos, &self.common).await,
        }
    }
}
