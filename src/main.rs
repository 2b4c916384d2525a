use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod clean;
mod columns;
mod derive;
mod export;
mod filter;
mod ingest;
mod metrics;
mod models;
mod pipeline;
mod report;
mod timestamp;

use columns::AliasTable;
use filter::FilterParams;
use models::{Completion, Meridiem};

#[derive(Parser)]
#[command(name = "engagement-dashboard")]
#[command(about = "Engagement analytics over FreeFuse video-watch exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Watch-history export file (repeat for multiple sources)
    #[arg(long = "csv", required = true)]
    csv: Vec<PathBuf>,
    /// JSON file with extra column aliases, e.g. {"video_name": ["clip"]}
    #[arg(long)]
    aliases: Option<PathBuf>,
}

impl SourceArgs {
    fn assemble(&self) -> Result<pipeline::Dataset> {
        let mut table = AliasTable::default();
        if let Some(path) = &self.aliases {
            table = table.with_overrides(path)?;
        }
        pipeline::assemble(&self.csv, &table)
    }
}

#[derive(Args, Default)]
struct FilterArgs {
    /// Keep records on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Keep records on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Keep records in this hour of day
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=23))]
    hour: Option<u32>,
    /// Keep morning or afternoon records
    #[arg(long, value_enum)]
    meridiem: Option<Meridiem>,
    /// Keep records in this academic year, e.g. 2023-2024
    #[arg(long)]
    year: Option<String>,
    /// Keep records of this video title (repeatable)
    #[arg(long = "video")]
    videos: Vec<String>,
    /// Keep records with this completion status
    #[arg(long, value_enum)]
    completion: Option<Completion>,
    /// Keep questionnaire participants (true) or non-participants (false)
    #[arg(long)]
    questionnaire: Option<bool>,
}

impl FilterArgs {
    fn into_params(self) -> FilterParams {
        FilterParams {
            from: self.from,
            to: self.to,
            hour: self.hour,
            meridiem: self.meridiem,
            academic_year: self.year,
            videos: self.videos,
            completion: self.completion,
            questionnaire: self.questionnaire,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Data-quality counts and the KPI panel for the filtered dataset
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Per-video leaderboard
    Videos {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Hide videos with fewer views than this
        #[arg(long, default_value_t = 0)]
        min_views: usize,
    },
    /// Write the full engagement report as markdown
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the filtered table as CSV with canonical headers
    Export {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "filtered.csv")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary { source, filters } => {
            let dataset = source.assemble()?;
            let params = filters.into_params();
            let rows = filter::apply(&dataset.records, &params);
            print_summary(&dataset.stats, &params, &rows);
        }
        Commands::Videos {
            source,
            filters,
            limit,
            min_views,
        } => {
            let dataset = source.assemble()?;
            let rows = filter::apply(&dataset.records, &filters.into_params());
            let stats: Vec<_> = derive::video_stats(&rows)
                .into_iter()
                .filter(|v| v.views >= min_views)
                .take(limit)
                .collect();

            if stats.is_empty() {
                println!("No videos match the current filters.");
                return Ok(());
            }
            println!("Top videos by views:");
            for v in stats {
                println!(
                    "- {}: {} views, {} unique viewers, avg {:.2} min, {:.1}% repeat",
                    v.video_name,
                    v.views,
                    v.unique_viewers,
                    v.avg_duration_min,
                    v.repeat_share * 100.0
                );
            }
        }
        Commands::Report {
            source,
            filters,
            out,
        } => {
            let dataset = source.assemble()?;
            let params = filters.into_params();
            let rows = filter::apply(&dataset.records, &params);
            let report = report::build_report(&params, &dataset.stats, &rows);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            source,
            filters,
            out,
        } => {
            let dataset = source.assemble()?;
            let rows = filter::apply(&dataset.records, &filters.into_params());
            let written = export::write_csv(&rows, &out)?;
            println!("Exported {written} rows to {}.", out.display());
        }
    }

    Ok(())
}

fn print_summary(stats: &models::CleanStats, params: &FilterParams, rows: &[models::WatchRecord]) {
    println!(
        "Cleaned dataset: kept {} of {} rows ({} excluded).",
        stats.rows_kept,
        stats.rows_total,
        stats.excluded()
    );
    if stats.files_skipped > 0 {
        println!(
            "  {} file(s) skipped for missing required columns ({} rows)",
            stats.files_skipped, stats.missing_columns
        );
    }
    if stats.bad_timestamp > 0 {
        println!("  {} rows with unparseable timestamps", stats.bad_timestamp);
    }
    if stats.missing_video > 0 {
        println!("  {} rows without a video name", stats.missing_video);
    }
    if stats.invalid_duration > 0 {
        println!("  {} rows with invalid durations", stats.invalid_duration);
    }
    if stats.duplicates > 0 {
        println!("  {} duplicate rows collapsed", stats.duplicates);
    }

    println!();
    println!("Filter: {}", params.describe());
    if rows.is_empty() {
        println!("No records match the current filters.");
        return;
    }

    let summary = metrics::summarize(rows);
    println!("Total views: {}", summary.total_views);
    println!("Unique viewers: {}", summary.unique_viewers);
    println!("Videos watched: {}", summary.videos_watched);
    if let Some(avg) = summary.avg_duration_min {
        println!("Avg duration (min): {avg:.2}");
    }
    if let Some(median) = summary.median_duration_min {
        println!("Median duration (min): {median:.2}");
    }
    if let Some(rate) = summary.completion_rate {
        println!("Completion rate: {:.1}%", rate * 100.0);
    }
    if let Some(rate) = summary.repeat_rate {
        println!("Repeat view rate: {:.1}%", rate * 100.0);
    }
    if let Some(rate) = summary.questionnaire_rate {
        println!("Questionnaire participation: {:.1}%", rate * 100.0);
    }
    if let Some((month, views)) = &summary.peak_month {
        println!("Peak month: {month} ({views} views)");
    }
}
