use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use curriculum_gateway::assessment::score_assessment;
use curriculum_gateway::config::Config;
use curriculum_gateway::gateway::envelope::{ApiResult, Failure};
use curriculum_gateway::gateway::rate_limiter::RateLimiter;
use curriculum_gateway::gateway::retry::RetryExecutor;
use curriculum_gateway::gateway::transport::HttpTransport;
use curriculum_gateway::gateway::RequestGateway;
use curriculum_gateway::generation::requests::{
    AssessmentKind, AssessmentRequest, ChatRequest, CourseRequest,
};
use curriculum_gateway::generation::CourseGateway;
use curriculum_gateway::models::course::{Difficulty, DurationClass};
use curriculum_gateway::store::{CourseStore, JsonFileStore};

/// Generate AI course material through the resilient gateway
#[derive(Parser, Debug)]
#[clap(name = "curriculum-gateway")]
#[clap(about = "Generate courses, assessments and chat replies from the curriculum backend")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a course and save it to the store
    Course {
        topic: String,

        #[clap(long, default_value = "beginner")]
        difficulty: Difficulty,

        #[clap(long, default_value = "4-weeks")]
        duration: DurationClass,
    },

    /// Generate an assessment; with --answers, score it into a learner profile
    Assessment {
        topic: String,

        #[clap(long, default_value = "quiz")]
        kind: AssessmentKind,

        #[clap(long, default_value = "5")]
        count: u32,

        /// Selected option index per question, in question order (e.g. 0,2,1)
        #[clap(long, value_delimiter = ',')]
        answers: Vec<usize>,

        /// Course difficulty used as the starting knowledge level
        #[clap(long)]
        level: Option<Difficulty>,
    },

    /// Ask the learning assistant a question
    Chat { message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting curriculum gateway v{}", env!("CARGO_PKG_VERSION"));

    let transport = HttpTransport::new(&config.api_base_url, &config.api_key, config.request_timeout)?;
    info!("Backend: {}", config.api_base_url);

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window,
    ));
    let cleanup = limiter.clone().spawn_cleanup(config.rate_limit_window);

    let service = CourseGateway::new(
        RequestGateway::new(Arc::new(transport)),
        limiter,
        RetryExecutor::new(config.retry_base_delay),
        config.generation_retries,
    );
    let store: Arc<dyn CourseStore> = Arc::new(JsonFileStore::new(&config.store_path));

    let outcome = run(cli.command, &service, store.as_ref()).await;
    cleanup.abort();
    outcome
}

async fn run(command: Command, service: &CourseGateway, store: &dyn CourseStore) -> Result<()> {
    match command {
        Command::Course {
            topic,
            difficulty,
            duration,
        } => {
            let request = CourseRequest {
                topic,
                difficulty,
                duration,
            };
            let course = unwrap_or_report(service.generate_course(&request).await)?.value;

            let mut courses = store.load_courses().await?;
            courses.retain(|c| c.id != course.id);
            courses.push(course.clone());
            store.save_courses(&courses).await?;

            let mut progress = store.load_progress().await?;
            progress.active_course_id = Some(course.id.clone());
            store.save_progress(&progress).await?;

            print_json(&course)
        }
        Command::Assessment {
            topic,
            kind,
            count,
            answers,
            level,
        } => {
            let request = AssessmentRequest { topic, kind, count };
            let questions = unwrap_or_report(service.generate_assessment(&request).await)?.value;
            if answers.is_empty() {
                return print_json(&questions);
            }

            let answers: HashMap<String, usize> = questions
                .iter()
                .zip(answers)
                .map(|(q, index)| (q.id.clone(), index))
                .collect();
            let profile = score_assessment(&questions, &answers, level);

            let mut progress = store.load_progress().await?;
            progress.assessment = Some(profile.clone());
            store.save_progress(&progress).await?;

            print_json(&profile)
        }
        Command::Chat { message } => {
            let request = ChatRequest {
                message,
                context: None,
            };
            let reply = unwrap_or_report(service.chat(&request).await)?;
            println!("{reply}");
            Ok(())
        }
    }
}

/// Prints the failure body as JSON and hands the failure back as the error.
fn unwrap_or_report<T>(result: ApiResult<T>) -> Result<T, Failure> {
    match result {
        Ok(envelope) => {
            if let Some(warning) = &envelope.metadata.warning {
                info!("backend warning: {warning}");
            }
            Ok(envelope.data)
        }
        Err(failure) => {
            println!("{:#}", failure.body());
            Err(failure)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
