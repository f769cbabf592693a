//! askdb - natural-language questions answered from a SQLite database.

use std::io::Write;
use std::sync::Arc;

use askdb::cli::Cli;
use askdb::config::Config;
use askdb::db::{DatabaseClient, SqliteClient};
use askdb::error::{AskError, Result};
use askdb::knowledge::{DirectoryKnowledge, KnowledgeSelector};
use askdb::llm::create_llm_client;
use askdb::logging::init_logging;
use askdb::output::{render, OutputFormat};
use askdb::query::QueryExecutor;
use askdb::retry::{Outcome, RetryController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const EXIT_COMMANDS: &[&str] = &["exit", "quit", "q"];

#[tokio::main]
async fn main() {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Runs the session. Returns `Ok(false)` when a single question could not
/// be answered.
async fn run(cli: Cli) -> Result<bool> {
    let format = cli.parse_output_format().map_err(AskError::config)?;

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let db = SqliteClient::open(&cli.db)?.read_only(config.safety.read_only);
    info!(path = %db.path().display(), "Opening database");
    let schema = db.introspect_schema().await?;
    eprintln!(
        "Connected to {} ({} tables)",
        cli.db.display(),
        schema.tables.len()
    );

    let llm = create_llm_client(&config.llm)?;
    let executor = QueryExecutor::new(Arc::new(db), config.executor_settings());
    let knowledge = KnowledgeSelector::new(Arc::new(DirectoryKnowledge::new(
        config.knowledge_dir.clone(),
    )));
    let controller = RetryController::new(
        Arc::from(llm),
        executor,
        knowledge,
        &schema,
        config.retry_settings(),
    );

    let session = Session {
        controller,
        format,
        sql_only: cli.sql_only,
    };

    match cli.query.as_deref() {
        Some(question) => session.ask(question).await,
        None => session.interactive().await,
    }
}

struct Session {
    controller: RetryController,
    format: OutputFormat,
    sql_only: bool,
}

impl Session {
    /// Answers one question, printing results to stdout and progress to
    /// stderr. Returns whether the question was answered.
    async fn ask(&self, question: &str) -> Result<bool> {
        if self.sql_only {
            let sql = self.controller.generate_only(question).await?;
            println!("{sql}");
            return Ok(true);
        }

        let outcome = self.controller.resolve(question).await;
        report_attempts(&outcome);

        match outcome {
            Outcome::Success { result, .. } => {
                eprintln!("SQL: {}", result.sql);
                println!("{}", render(&result, self.format));
                Ok(true)
            }
            Outcome::Exhausted {
                last_error,
                last_sql,
                attempts,
            } => {
                eprintln!("Failed after {} attempt(s): {}", attempts.len(), last_error);
                if let Some(sql) = last_sql {
                    eprintln!("Last SQL: {sql}");
                }
                Ok(false)
            }
        }
    }

    /// Reads questions from stdin until EOF or an exit command.
    async fn interactive(&self) -> Result<bool> {
        eprintln!("Ask a question about your data. Type 'exit' to quit.");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            eprint!("> ");
            let _ = std::io::stderr().flush();

            let line = lines
                .next_line()
                .await
                .map_err(|e| AskError::internal(format!("Failed to read input: {e}")))?;
            let Some(line) = line else { break };

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if EXIT_COMMANDS.contains(&question.to_lowercase().as_str()) {
                break;
            }

            // Failures are reported and the loop continues; only fatal errors end it.
            if let Err(e) = self.ask(question).await {
                if e.is_fatal() {
                    return Err(e);
                }
                eprintln!("Error: {e}");
            }
        }

        Ok(true)
    }
}

/// Prints failed attempts that preceded the final one.
fn report_attempts(outcome: &Outcome) {
    let attempts = outcome.attempts();
    let retried = match outcome {
        Outcome::Success { .. } => attempts.len().saturating_sub(1),
        Outcome::Exhausted { .. } => attempts.len(),
    };

    for (i, attempt) in attempts.iter().take(retried).enumerate() {
        let reason = attempt.error.as_deref().unwrap_or("unknown error");
        match &attempt.sql {
            Some(sql) => eprintln!("Attempt {} failed: {} ({})", i + 1, reason, sql),
            None => eprintln!("Attempt {} failed: {}", i + 1, reason),
        }
    }
}
