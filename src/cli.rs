//! Command-line interface for the `cityscience` binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::Verbosity;
use crate::prompt::{
    BuildRequest, BulletinRequest, CitizenRequest, FocusArea, LeedGoal, ManagementRequest,
    ProjectType,
};

/// City Science - environmental bulletins and city quality scores
#[derive(Debug, Parser)]
#[command(name = "cityscience")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server
    Serve,

    /// Score every city of a list and append new regions to the regions file
    Score(ScoreCommand),

    /// Generate one bulletin and write it as HTML
    Bulletin(BulletinCommand),

    /// Write the environmental summary document
    Summary(SummaryCommand),
}

#[derive(Debug, Args)]
pub struct ScoreCommand {
    /// City list (defaults to batch.cities_file)
    #[arg(long, value_name = "FILE")]
    pub cities: Option<PathBuf>,

    /// Regions JSON file (defaults to batch.regions_file)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Seed for air-quality jitter and summary wording
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Args)]
pub struct BulletinCommand {
    /// Output HTML file (defaults to server.output_html)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub kind: BulletinKind,
}

#[derive(Debug, Subcommand)]
pub enum BulletinKind {
    /// Answer a citizen question about a place
    Citizen {
        #[arg(long)]
        city: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        observations: Option<String>,
    },

    /// Sustainable construction (LEED) report
    Build {
        #[arg(long)]
        city: String,
        /// BDC, IDCL, OML or HDC
        #[arg(long)]
        project_type: ProjectType,
        /// Certified, Silver, Gold or Platinum
        #[arg(long)]
        leed_goal: LeedGoal,
        /// Energy, Water, Materials, Location or Indoor
        #[arg(long)]
        focus_area: FocusArea,
        #[arg(long)]
        details: String,
    },

    /// Bulletin for city administrators
    Management {
        #[arg(long)]
        city: String,
        #[arg(long)]
        problem: String,
        #[arg(long)]
        goal: String,
        #[arg(long)]
        budget: String,
        #[arg(long)]
        timeframe: String,
        #[arg(long)]
        priority: String,
        #[arg(long)]
        expected_impact: String,
    },
}

impl From<BulletinKind> for BulletinRequest {
    fn from(kind: BulletinKind) -> Self {
        match kind {
            BulletinKind::Citizen {
                city,
                question,
                observations,
            } => BulletinRequest::Citizen(CitizenRequest {
                city,
                question,
                observations,
            }),
            BulletinKind::Build {
                city,
                project_type,
                leed_goal,
                focus_area,
                details,
            } => BulletinRequest::Build(BuildRequest {
                city,
                project_type,
                leed_goal,
                focus_area,
                project_details: details,
            }),
            BulletinKind::Management {
                city,
                problem,
                goal,
                budget,
                timeframe,
                priority,
                expected_impact,
            } => BulletinRequest::Management(ManagementRequest {
                city,
                problem,
                goal,
                budget,
                timeframe,
                priority,
                expected_impact,
            }),
        }
    }
}

#[derive(Debug, Args)]
pub struct SummaryCommand {
    /// Location printed in the document header
    #[arg(long, default_value = "Fortaleza - CE, Brazil")]
    pub location: String,

    /// Year of the monthly series
    #[arg(long, default_value_t = 2024)]
    pub year: i32,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(short, long, default_value = "environmental_summary.html", value_name = "FILE")]
    pub output: PathBuf,
}

impl Cli {
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
