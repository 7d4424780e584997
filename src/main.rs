use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scholarly::config::{
    default_config_path, find_config_file, get_config, load_config, write_default_config, Config,
};
use scholarly::discussion::FileCommentStore;
use scholarly::insights::{GeminiClient, InsightError};
use scholarly::models::{SearchParams, SortBy, SortOrder};
use scholarly::utils::{
    article_details, comments_table, feed_table, insight_details, is_terminal,
};
use scholarly::{ArxivSource, FeedResult, Library, LibraryError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholarly - search arXiv, read summaries and discuss papers
#[derive(Parser, Debug)]
#[command(name = "scholarly")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search arXiv, read AI summaries and discuss papers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Table on a terminal, JSON otherwise
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self) -> OutputFormat {
        match self {
            OutputFormat::Auto if is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Sort field for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortField {
    Relevance,
    /// Last updated date
    Updated,
    /// Submission date
    Submitted,
}

impl From<SortField> for SortBy {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Relevance => SortBy::Relevance,
            SortField::Updated => SortBy::LastUpdated,
            SortField::Submitted => SortBy::Submitted,
        }
    }
}

/// Sort order
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Ascending,
            Order::Desc => SortOrder::Descending,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search arXiv
    #[command(alias = "s")]
    Search {
        /// Search query (arXiv syntax such as `ti:transformer` is passed through)
        query: String,

        /// Category filter, repeatable (e.g. cs.AI)
        #[arg(long, short)]
        category: Vec<String>,

        /// Author filter
        #[arg(long, short)]
        author: Option<String>,

        /// Sort by field
        #[arg(long, value_enum, default_value_t = SortField::Relevance)]
        sort_by: SortField,

        /// Sort order
        #[arg(long, value_enum, default_value_t = Order::Desc)]
        order: Order,

        /// Offset of the first result
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Maximum number of results
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Submitted on or after (YYYYMMDD or YYYYMMDDHHMM)
        #[arg(long)]
        from: Option<String>,

        /// Submitted on or before (YYYYMMDD or YYYYMMDDHHMM)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    /// Show an article with its comments
    #[command(alias = "a")]
    Article {
        /// arXiv id or abs/pdf URL
        id: String,

        /// Also generate an AI summary
        #[arg(long)]
        summary: bool,
    },

    /// Most recently updated articles
    Recent {
        /// Category filter, repeatable
        #[arg(long, short)]
        category: Vec<String>,

        /// Maximum number of results
        #[arg(long, short)]
        max_results: Option<usize>,
    },

    /// Read and post comments
    Comments {
        #[command(subcommand)]
        action: CommentCommands,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CommentCommands {
    /// List comments on an article, newest first
    List { article: String },

    /// Post a comment
    Add {
        article: String,

        #[arg(long, short)]
        user: String,

        message: String,
    },

    /// Reply to a comment
    Reply {
        article: String,

        comment_id: String,

        #[arg(long, short)]
        user: String,

        message: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Where to write it (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_file = cli.config.clone().or_else(find_config_file);
    let config = match &config_file {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => get_config().context("Failed to read configuration from environment")?,
    };

    init_tracing(&cli, &config);
    if let Some(path) = &config_file {
        tracing::debug!("Using config file: {}", path.display());
    }

    let format = cli.output.resolve();

    match cli.command {
        Commands::Search {
            query,
            category,
            author,
            sort_by,
            order,
            start,
            max_results,
            from,
            to,
        } => {
            let mut params = SearchParams::new(query)
                .sort_by(sort_by.into())
                .sort_order(order.into())
                .start(start)
                .max_results(max_results.unwrap_or(config.arxiv.default_max_results));
            for c in category {
                params = params.category(c);
            }
            if let Some(author) = author {
                params = params.author(author);
            }
            if let Some(from) = from {
                params = params.submitted_between(from, to);
            }

            let library = build_library(&config)?;
            let feed = library.search(&params).await.map_err(user_error)?;
            output_feed(&feed, format)?;
        }

        Commands::Article { id, summary } => {
            let library = build_library(&config)?;
            let page = library.article_page(&id).await.map_err(user_error)?;
            let insight = if summary {
                Some(library.insight(&page.article).await)
            } else {
                None
            };

            match format {
                OutputFormat::Json => {
                    #[derive(Serialize)]
                    struct ArticleOutput<'a> {
                        #[serde(flatten)]
                        page: &'a scholarly::ArticlePage,
                        #[serde(skip_serializing_if = "Option::is_none")]
                        insight: Option<&'a scholarly::models::AiInsight>,
                    }
                    let output = ArticleOutput {
                        page: &page,
                        insight: insight.as_ref(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                _ => {
                    println!("{}", article_details(&page.article));
                    if let Some(insight) = &insight {
                        println!("\n{}", insight_details(insight));
                    }
                    if page.comments.is_empty() {
                        println!("\nNo comments yet.");
                    } else {
                        println!("\n{}", comments_table(&page.comments));
                    }
                }
            }
        }

        Commands::Recent {
            category,
            max_results,
        } => {
            let library = build_library(&config)?;
            let max_results = max_results.unwrap_or(config.arxiv.default_max_results);
            let feed = library
                .home(&category, max_results)
                .await
                .map_err(user_error)?;
            output_feed(&feed, format)?;
        }

        Commands::Comments { action } => {
            let library = build_library(&config)?;
            match action {
                CommentCommands::List { article } => {
                    let comments = library.comments(&article).await.map_err(user_error)?;
                    match format {
                        OutputFormat::Json => {
                            println!("{}", serde_json::to_string_pretty(&comments)?)
                        }
                        _ if comments.is_empty() => println!("No comments yet."),
                        _ => println!("{}", comments_table(&comments)),
                    }
                }
                CommentCommands::Add {
                    article,
                    user,
                    message,
                } => {
                    let comment = library
                        .post_comment(&article, &user, &message)
                        .await
                        .map_err(user_error)?;
                    match format {
                        OutputFormat::Json => {
                            println!("{}", serde_json::to_string_pretty(&comment)?)
                        }
                        _ => println!("Posted comment {}", comment.id),
                    }
                }
                CommentCommands::Reply {
                    article,
                    comment_id,
                    user,
                    message,
                } => {
                    let reply = library
                        .post_reply(&article, &comment_id, &user, &message)
                        .await
                        .map_err(user_error)?;
                    match format {
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reply)?),
                        _ => println!("Posted reply {}", reply.id),
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigCommands::Init { path, force } => {
                let path = path.unwrap_or_else(default_config_path);
                write_default_config(&path, force)?;
                println!("Wrote default configuration to {}", path.display());
            }
            ConfigCommands::Show => {
                let mut shown = config.clone();
                if shown.summary.api_key.is_some() {
                    shown.summary.api_key = Some("********".to_string());
                }
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
                    _ => print!("{}", toml::to_string_pretty(&shown)?),
                }
            }
        },
    }

    Ok(())
}

/// Logs go to stderr so JSON output on stdout stays parseable
fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("scholarly={}", level)));

    let json = config.logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn build_library(config: &Config) -> Result<Library> {
    let source = ArxivSource::from_config(config).context("Failed to create arXiv client")?;
    let comments = FileCommentStore::in_dir(&config.storage.data_dir);
    let library = Library::new(Arc::new(source), Arc::new(comments));

    match GeminiClient::from_config(&config.summary) {
        Ok(generator) => Ok(library.with_generator(Arc::new(generator))),
        Err(InsightError::NotConfigured) => {
            tracing::debug!("No summary API key configured, summaries use the fallback");
            Ok(library)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Summary client unavailable, summaries use the fallback");
            Ok(library)
        }
    }
}

fn output_feed(feed: &FeedResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(feed)?),
        _ => {
            if feed.is_empty() {
                println!("No articles found.");
            } else {
                println!("{}", feed_table(feed));
                println!(
                    "Showing {}-{} of {} results",
                    feed.start_index + 1,
                    feed.start_index + feed.len(),
                    feed.total_results
                );
            }
            if feed.dropped_count() > 0 {
                eprintln!(
                    "{} entries could not be read and were skipped",
                    feed.dropped_count()
                );
            }
        }
    }
    Ok(())
}

fn user_error(err: LibraryError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}
