use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod db;
mod models;
mod report;
mod risk;
mod rotation;

#[derive(Parser)]
#[command(name = "burnout-early-warning")]
#[command(about = "Daily burnout risk tracker: rotating check-in questions and a 7-day risk engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import historical answers or signals from a CSV file
    #[command(group(
        ArgGroup::new("source")
            .args(["answers", "signals"])
            .required(true)
            .multiple(false)
    ))]
    Import {
        #[arg(long)]
        answers: Option<PathBuf>,
        #[arg(long)]
        signals: Option<PathBuf>,
    },
    /// Show the two check-in questions for a date
    Questions {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record a user's answer to one of the pool questions
    Submit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        value: i32,
    },
    /// Record a passive behavior signal for a user
    Track {
        #[arg(long)]
        user: String,
        #[arg(long)]
        kind: String,
        #[arg(long, default_value_t = 1.0)]
        value: f64,
    },
    /// Compute, store, and print a burnout risk assessment
    Assess {
        #[arg(long)]
        user: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 7)]
        since_days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn connect() -> anyhow::Result<sqlx::PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    rotation::verify_pool()?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { answers, signals } => {
            let pool = connect().await?;
            if let Some(path) = answers {
                let inserted = db::import_answers_csv(&pool, &path).await?;
                println!("Inserted {inserted} answers from {}.", path.display());
            } else if let Some(path) = signals {
                let inserted = db::import_signals_csv(&pool, &path).await?;
                println!("Inserted {inserted} signals from {}.", path.display());
            }
        }
        Commands::Questions { date } => {
            let day = date.unwrap_or_else(|| Utc::now().date_naive());
            let (first, second) = rotation::select_questions(day);
            println!("Check-in questions for {day}:");
            for question in [first, second] {
                println!(
                    "- [{}] {} ({})",
                    question.id,
                    question.text,
                    question.category.as_str()
                );
            }
        }
        Commands::Submit {
            user,
            question,
            value,
        } => {
            let question = rotation::find_question(&question)
                .with_context(|| format!("unknown question id: {question}"))?;
            anyhow::ensure!(
                (1..=5).contains(&value),
                "answer value must be between 1 and 5, got {value}"
            );

            let pool = connect().await?;
            let user_id = db::upsert_user(&pool, &user, None).await?;
            db::record_answer(&pool, user_id, question.id, value).await?;
            println!("Recorded answer to {} for {user}.", question.id);
        }
        Commands::Track { user, kind, value } => {
            let kind = models::SignalKind::parse(&kind).with_context(|| {
                format!(
                    "unknown signal kind: {kind} \
                     (expected app_open, response_delay, late_night_usage, or missed_checkin)"
                )
            })?;

            let pool = connect().await?;
            let user_id = db::upsert_user(&pool, &user, None).await?;
            db::record_signal(&pool, user_id, kind, value).await?;
            println!("Recorded {} signal for {user}.", kind.as_str());
        }
        Commands::Assess { user, date } => {
            let pool = connect().await?;
            let user_id = db::find_user(&pool, &user)
                .await?
                .with_context(|| format!("no such user: {user}"))?;

            let day = date.unwrap_or_else(|| Utc::now().date_naive());
            let since = risk::window_start(day);
            let answers = db::fetch_answers(&pool, since, Some(&user)).await?;
            let signals = db::fetch_signals(&pool, since, Some(&user)).await?;

            let assessment = risk::assess(user_id, day, &answers, &signals);
            db::insert_assessment(&pool, &assessment).await?;

            println!(
                "Risk for {user} on {}: {:.1} ({})",
                assessment.date,
                assessment.risk_score,
                assessment.risk_level.as_str()
            );
            for insight in &assessment.insights {
                println!("- {insight}");
            }
        }
        Commands::Report {
            user,
            since_days,
            out,
        } => {
            let pool = connect().await?;
            let cutoff = report::cutoff_date(since_days);
            let since = risk::day_start(cutoff);

            let answers = db::fetch_answers(&pool, since, user.as_deref()).await?;
            let signals = db::fetch_signals(&pool, since, user.as_deref()).await?;
            let assessments = db::fetch_latest_assessments(&pool, user.as_deref()).await?;

            let report = report::build_report(
                user.as_deref(),
                since_days,
                cutoff,
                &answers,
                &signals,
                &assessments,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
