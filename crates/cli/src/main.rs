use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{ItemCatalog, ItemId, LoadOptions, RatingTable, UserId, load_dataset, parse_day};
use predictors::{ItemSimilarityPredictor, Predictor, PredictorConfig, PredictorKind};
use recommender::{Evaluation, Recommendation, Recommender};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// ReelPredict - rating prediction and top-N recommendation
#[derive(Parser)]
#[command(name = "reel-predict")]
#[command(about = "Collaborative filtering rating predictors", long_about = None)]
struct Cli {
    /// Rating file (HetRec user_ratedmovies.dat or MovieLens ratings.dat)
    #[arg(short, long, global = true, default_value = "data/user_ratedmovies.dat")]
    ratings: PathBuf,

    /// Item file with titles (HetRec movies.dat or MovieLens movies.dat)
    #[arg(short, long, global = true)]
    items: Option<PathBuf>,

    /// Keep ratings made on or after this day (dd.mm.yyyy)
    #[arg(long, global = true)]
    from_date: Option<String>,

    /// Keep ratings made on or before this day (dd.mm.yyyy)
    #[arg(long, global = true)]
    to_date: Option<String>,

    /// Keep items with at least this many ratings
    #[arg(long, global = true)]
    min_ratings: Option<usize>,

    /// TOML file with predictor parameters
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Predictor to use, overriding the config file
    #[arg(short, long, global = true)]
    predictor: Option<PredictorKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Top-N items for a user
    Recommend {
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Also rank items the user already rated
        #[arg(long)]
        include_seen: bool,
    },

    /// Items most similar to an item
    Similar {
        #[arg(long)]
        item_id: ItemId,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Similarity between two items
    Similarity {
        #[arg(long)]
        first: ItemId,

        #[arg(long)]
        second: ItemId,
    },

    /// The strongest item pairs
    Pairs {
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Fit on ratings before a day and evaluate on the rest
    Evaluate {
        /// First day of the held-out period (dd.mm.yyyy)
        #[arg(long)]
        split_date: String,

        /// Length of each recommendation list
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Evaluate every predictor instead of the configured one
        #[arg(long)]
        all: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.predictor)?;
    let options = load_options(&cli)?;

    println!("Loading ratings from {}...", cli.ratings.display());
    let start = Instant::now();
    let (table, catalog) = match &cli.items {
        Some(items) => load_dataset(&cli.ratings, items, &options),
        None => RatingTable::load_from_file(&cli.ratings, &options).map(|t| (t, ItemCatalog::new())),
    }
    .context("Failed to load rating data")?;
    let (users, items, ratings) = table.counts();
    println!(
        "{} Loaded {} ratings ({} users, {} items) in {:?}",
        "✓".green(),
        ratings,
        users,
        items,
        start.elapsed()
    );

    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            include_seen,
        } => handle_recommend(table, &catalog, &config, user_id, limit, include_seen)?,
        Commands::Similar { item_id, limit } => {
            handle_similar(&table, &catalog, &config, item_id, limit)?
        }
        Commands::Similarity { first, second } => {
            handle_similarity(&table, &catalog, &config, first, second)?
        }
        Commands::Pairs { limit } => handle_pairs(&table, &catalog, &config, limit)?,
        Commands::Evaluate {
            split_date,
            limit,
            all,
            json,
        } => handle_evaluate(&table, &config, &split_date, limit, all, json)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>, predictor: Option<PredictorKind>) -> Result<PredictorConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            PredictorConfig::from_toml_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => PredictorConfig::default(),
    };
    if let Some(kind) = predictor {
        config.predictor = kind;
    }
    tracing::debug!("Predictor config: {:?}", config);
    Ok(config)
}

fn load_options(cli: &Cli) -> Result<LoadOptions> {
    let mut options = LoadOptions::new();
    if let Some(day) = &cli.from_date {
        options = options.with_from_date(parse_day(day).context("Invalid --from-date")?);
    }
    if let Some(day) = &cli.to_date {
        options = options.with_to_date(parse_day(day).context("Invalid --to-date")?);
    }
    if let Some(min) = cli.min_ratings {
        options = options.with_min_ratings(min);
    }
    Ok(options)
}

fn title(catalog: &ItemCatalog, item_id: ItemId) -> String {
    catalog
        .title_of(item_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("item {}", item_id))
}

fn fit_similarity(table: &RatingTable, config: &PredictorConfig) -> Result<ItemSimilarityPredictor> {
    let start = Instant::now();
    let mut predictor = config.item_similarity();
    predictor
        .fit(table)
        .context("Failed to fit item similarity")?;
    println!("{} Fitted similarities in {:?}", "✓".green(), start.elapsed());
    Ok(predictor)
}

/// Handle the 'recommend' command
fn handle_recommend(
    table: RatingTable,
    catalog: &ItemCatalog,
    config: &PredictorConfig,
    user_id: UserId,
    limit: usize,
    include_seen: bool,
) -> Result<()> {
    if !table.contains_user(user_id) {
        return Err(anyhow!("User {} has no ratings in the loaded table", user_id));
    }

    let start = Instant::now();
    let mut recommender = Recommender::new(config.build()?);
    recommender.fit(Arc::new(table))?;
    println!(
        "{} Fitted {} in {:?}",
        "✓".green(),
        recommender.predictor().name(),
        start.elapsed()
    );

    let recommendations = recommender.recommend(user_id, limit, include_seen)?;
    print_recommendations(catalog, user_id, &recommendations);
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(
    table: &RatingTable,
    catalog: &ItemCatalog,
    config: &PredictorConfig,
    item_id: ItemId,
    limit: usize,
) -> Result<()> {
    let predictor = fit_similarity(table, config)?;
    let neighbours = predictor.similar_items(item_id, limit)?;

    println!(
        "{}",
        format!("Items similar to {}:", title(catalog, item_id)).bold().blue()
    );
    for (rank, (other, score)) in neighbours.iter().enumerate() {
        println!(
            "{}. {} - Similarity: {:.4}",
            (rank + 1).to_string().green(),
            title(catalog, *other),
            score
        );
    }
    Ok(())
}

/// Handle the 'similarity' command
fn handle_similarity(
    table: &RatingTable,
    catalog: &ItemCatalog,
    config: &PredictorConfig,
    first: ItemId,
    second: ItemId,
) -> Result<()> {
    let predictor = fit_similarity(table, config)?;
    let score = predictor.similarity(first, second)?;
    println!(
        "Similarity between {} and {}: {}",
        title(catalog, first).bold(),
        title(catalog, second).bold(),
        format!("{:.4}", score).cyan()
    );
    Ok(())
}

/// Handle the 'pairs' command
fn handle_pairs(
    table: &RatingTable,
    catalog: &ItemCatalog,
    config: &PredictorConfig,
    limit: usize,
) -> Result<()> {
    let predictor = fit_similarity(table, config)?;
    let pairs = predictor.most_similar_pairs(limit)?;

    println!("{}", format!("{} most similar pairs:", limit).bold().blue());
    for (rank, (a, b, score)) in pairs.iter().enumerate() {
        println!(
            "{}. {} <-> {} - Similarity: {:.4}",
            (rank + 1).to_string().green(),
            title(catalog, *a),
            title(catalog, *b),
            score
        );
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(
    table: &RatingTable,
    config: &PredictorConfig,
    split_date: &str,
    limit: usize,
    all: bool,
    json: bool,
) -> Result<()> {
    let split = parse_day(split_date).context("Invalid --split-date")?;
    let (train, test) = table.split_at(split);
    if train.is_empty() || test.is_empty() {
        return Err(anyhow!(
            "Split at {} leaves {} training and {} test ratings",
            split,
            train.len(),
            test.len()
        ));
    }
    println!(
        "Training on {} ratings, testing on {} ratings",
        train.len(),
        test.len()
    );
    let train = Arc::new(train);

    let kinds: Vec<PredictorKind> = if all {
        PredictorKind::ALL.to_vec()
    } else {
        vec![config.predictor]
    };

    let mut reports: Vec<(PredictorKind, Evaluation)> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let start = Instant::now();
        let mut recommender = Recommender::new(config.build_kind(kind)?);
        recommender
            .fit(train.clone())
            .with_context(|| format!("Failed to fit {}", kind))?;
        let report = recommender.evaluate(&test, limit)?;
        tracing::info!("{} evaluated in {:?}", kind, start.elapsed());
        reports.push((kind, report));
    }

    if json {
        let value: Vec<serde_json::Value> = reports
            .iter()
            .map(|(kind, report)| serde_json::json!({ "predictor": kind, "evaluation": report }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for (kind, report) in &reports {
            println!("{}", format!("Predictor: {}", kind).bold().blue());
            println!("{}\n", report);
        }
    }
    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(catalog: &ItemCatalog, user_id: UserId, recommendations: &[Recommendation]) {
    println!(
        "{}",
        format!("Recommendations for user {}:", user_id).bold().blue()
    );
    if recommendations.is_empty() {
        println!("  (nothing to recommend)");
    }
    for (rank, rec) in recommendations.iter().enumerate() {
        let year = catalog
            .get_item(rec.item_id)
            .and_then(|item| item.year)
            .map(|year| format!(" ({})", year))
            .unwrap_or_default();
        println!(
            "{}. {}{} - Score: {:.2}",
            (rank + 1).to_string().green(),
            title(catalog, rec.item_id),
            year,
            rec.score
        );
    }
}
