use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};

use tagesbrief::ai::ClaudeClient;
use tagesbrief::bot::{Announcer, Bot, Notifier, OutgoingMessage};
use tagesbrief::config::Config;
use tagesbrief::db::{FeedbackStore, Repository};
use tagesbrief::error::Result;
use tagesbrief::feedback::FeedbackRecorder;
use tagesbrief::models::{Article, Feedback};
use tagesbrief::pipeline::{Discoverer, ScrapeStage, StageReport, StageRunner, TranslateStage};
use tagesbrief::recommend::Recommender;
use tagesbrief::services::{TagesschauScraper, TelegramNotifier};

#[derive(Parser)]
#[command(name = "tagesbrief", version, about = "German news, translated and recommended")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a random category and insert its first unseen article
    Discover,
    /// Scrape new articles
    Scrape {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Translate and classify scraped articles
    Translate {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Discover, scrape and translate in one pass
    Run,
    /// Pick unseen articles matching liked topics
    Recommend {
        #[arg(long)]
        limit: Option<usize>,
        /// Deliver to the configured chat instead of printing
        #[arg(long)]
        send: bool,
    },
    /// Record feedback for an article
    Feedback {
        #[arg(value_enum)]
        value: FeedbackArg,
        id: i64,
    },
    /// Handle raw button callback data, e.g. `feedback:up:12`
    Callback { data: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedbackArg {
    Up,
    Down,
}

impl From<FeedbackArg> for Feedback {
    fn from(arg: FeedbackArg) -> Self {
        match arg {
            FeedbackArg::Up => Feedback::Up,
            FeedbackArg::Down => Feedback::Down,
        }
    }
}

/// Prints messages when no chat is configured.
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn deliver(&self, _chat_id: &str, message: &OutgoingMessage) -> Result<()> {
        println!("{}", message.text);
        for row in &message.buttons {
            let labels: Vec<String> = row
                .iter()
                .map(|b| format!("[{}] ({})", b.label, b.callback_data))
                .collect();
            println!("{}", labels.join(" "));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let store = Arc::new(Repository::new(&config.db_path).await?);

    match cli.command {
        Command::Discover => {
            discover(&config, &store).await?;
        }
        Command::Scrape { limit } => {
            print_report("scrape", scrape(&config, &store, limit).await?);
        }
        Command::Translate { limit } => {
            print_report("translate", translate(&config, &store, limit).await?);
        }
        Command::Run => {
            discover(&config, &store).await?;
            print_report("scrape", scrape(&config, &store, None).await?);
            print_report("translate", translate(&config, &store, None).await?);
        }
        Command::Recommend { limit, send } => {
            let limit = limit.unwrap_or(config.recommend_limit);
            if send {
                let (notifier, chat_id) = notifier(&config)?;
                Bot::new(store, notifier, limit)
                    .send_recommendations(&chat_id)
                    .await?;
            } else {
                let picked = Recommender::new(store).recommend(limit).await?;
                print_articles(&picked);
            }
        }
        Command::Feedback { value, id } => {
            FeedbackRecorder::new(store).record(id, value.into()).await?;
            println!("Recorded feedback for article {id}");
        }
        Command::Callback { data } => {
            let (notifier, chat_id) = notifier(&config)?;
            Bot::new(store, notifier, config.recommend_limit)
                .handle_callback(&chat_id, &data)
                .await?;
        }
    }

    Ok(())
}

async fn discover(config: &Config, store: &Arc<Repository>) -> Result<()> {
    let source = TagesschauScraper::new(&config.source_base_url)?;
    match Discoverer::new(Arc::clone(store), source).discover().await? {
        Some(article) => println!("Discovered {} ({})", article.source_url, article.category),
        None => println!("Nothing new discovered"),
    }
    Ok(())
}

async fn scrape(
    config: &Config,
    store: &Arc<Repository>,
    limit: Option<usize>,
) -> Result<StageReport> {
    let scraper = TagesschauScraper::new(&config.source_base_url)?;
    StageRunner::new(Arc::clone(store), ScrapeStage::new(scraper))
        .run(limit)
        .await
}

async fn translate(
    config: &Config,
    store: &Arc<Repository>,
    limit: Option<usize>,
) -> Result<StageReport> {
    let client = ClaudeClient::new(
        config.require_claude_key()?.to_string(),
        config.claude_model.clone(),
    )?;
    let mut stage = TranslateStage::new(client.clone(), client);

    if let Some((token, chat_id)) = config.telegram() {
        let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(token.to_string())?);
        let feedback_store: Arc<dyn FeedbackStore> = store.clone();
        stage = stage.with_announcer(Announcer::new(
            notifier,
            feedback_store,
            chat_id,
            config.min_active_articles,
        ));
    } else {
        tracing::info!("Telegram not configured, translated articles won't be announced");
    }

    StageRunner::new(Arc::clone(store), stage).run(limit).await
}

/// The configured chat, or the console when none is set up.
fn notifier(config: &Config) -> Result<(Arc<dyn Notifier>, String)> {
    Ok(match config.telegram() {
        Some((token, chat_id)) => (
            Arc::new(TelegramNotifier::new(token.to_string())?),
            chat_id.to_string(),
        ),
        None => (Arc::new(ConsoleNotifier), String::new()),
    })
}

fn print_report(stage: &str, report: StageReport) {
    println!(
        "{stage}: {} claimed, {} succeeded, {} failed",
        report.claimed, report.succeeded, report.failed
    );
}

fn print_articles(articles: &[Article]) {
    if articles.is_empty() {
        println!("No new recommendations yet.");
        return;
    }
    for article in articles {
        println!(
            "#{} [{}] {}\n    {}",
            article.id,
            article.topic.as_deref().unwrap_or("-"),
            article.display_title(),
            article.source_url
        );
    }
}
