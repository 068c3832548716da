use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use trinity_core::{ArticleStore, UserId};
use trinity_recommend::{Recommender, RecommenderConfig, ScoredArticle};

mod import;
mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Personalised article recommendations for Trinity AI News", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "TRINITY_STORAGE", default_value = "memory", global = true)]
    storage: String,
    /// Database location for the sqlite backend (path or sqlite:// url)
    #[arg(long, env = "TRINITY_DATABASE_URL", global = true)]
    database_url: Option<String>,
    /// Seed file imported into the store before the command runs
    #[arg(long, env = "TRINITY_SEED", global = true)]
    seed: Option<PathBuf>,
    #[arg(long, env = "TRINITY_LOG", default_value = "info", global = true)]
    log_level: String,
    /// Newest eligible articles considered per recommendation request
    #[arg(long, default_value_t = 10, global = true)]
    candidate_pool: usize,
    /// Recommendations returned when no limit is given
    #[arg(long, default_value_t = 5, global = true)]
    default_limit: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "TRINITY_ADDR", default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
    },
    /// Print recommendations for a user
    Recommend {
        user: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the tags a user reacts to most
    Interests {
        user: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Load articles and reactions from a JSON seed file
    Import {
        file: PathBuf,
    },
}

impl Cli {
    fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            default_limit: self.default_limit,
            candidate_pool: self.candidate_pool,
            ..RecommenderConfig::default()
        }
    }
}

fn print_recommendations(user: &str, recommendations: &[ScoredArticle]) {
    if recommendations.is_empty() {
        println!("No recommendations for {} yet", user);
        return;
    }
    for (rank, scored) in recommendations.iter().enumerate() {
        let article = &scored.article;
        println!(
            "{:>2}. [{}] {} ({}) {}",
            rank + 1,
            scored.score,
            article.title,
            article.published_at.format("%Y-%m-%d"),
            article.tags.join(", ")
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let storage: Arc<dyn ArticleStore> =
        trinity_storage::create_storage(&cli.storage, cli.database_url.as_deref()).await?;

    if let Some(seed) = &cli.seed {
        import::import_file(storage.as_ref(), seed).await?;
    }

    let recommender = Recommender::new(storage.clone(), cli.recommender_config());
    info!("🧠 Recommender ready ({:?})", recommender.config());

    match cli.command {
        Commands::Serve { addr } => {
            trinity_web::serve(trinity_web::AppState::from_recommender(recommender), addr).await?;
        }
        Commands::Recommend { user, limit } => {
            let recommendations = recommender
                .recommend_for_user(&UserId::from(user.as_str()), limit)
                .await?;
            print_recommendations(&user, &recommendations);
        }
        Commands::Interests { user, limit } => {
            let tags = recommender
                .interests_for_user(&UserId::from(user.as_str()), limit)
                .await?;
            if tags.is_empty() {
                println!("No interests recorded for {}", user);
            } else {
                println!("{}", tags.join(", "));
            }
        }
        Commands::Import { file } => {
            let summary = import::import_file(storage.as_ref(), &file).await?;
            println!(
                "Imported {} articles and {} reactions, skipped {}",
                summary.articles, summary.reactions, summary.skipped
            );
        }
    }

    Ok(())
}
