//! Corpus-Sieve main entry point
//!
//! This is the command-line interface for the article curation pipeline.
//! Each subcommand runs one stage over the record store.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use corpus_sieve::classify::{filter_relevant, OpenAiClient, RelevanceClassifier};
use corpus_sieve::config::{load_config_with_hash, Config};
use corpus_sieve::dataset::merge_documents;
use corpus_sieve::dedup::{filter_duplicates, similarity_matrix, DropPolicy, SimilarityMethod};
use corpus_sieve::extract::{
    AttributeMap, ContentExtractor, ForumExtractor, RedirectionMap, SelectorRegistry,
};
use corpus_sieve::fetch::Fetcher;
use corpus_sieve::output::{
    print_dedup_report, print_extraction_report, print_relevance_statistics,
    write_failure_report, RelevanceStatistics,
};
use corpus_sieve::store::{RecordStore, SimilarityCache};
use corpus_sieve::{DatasetKey, DatasetKind, Stage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Corpus-Sieve: curation pipeline for news and forum collections
///
/// Extracts article bodies with per-host selector rules that are learned as
/// the run goes, removes near-duplicates and keeps the records an LLM judges
/// relevant to a topic.
#[derive(Parser, Debug)]
#[command(name = "corpus-sieve")]
#[command(version = "1.0.0")]
#[command(about = "Article collection curation pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract article bodies for search or crawl results
    Extract {
        #[arg(long, value_enum)]
        kind: DatasetKind,

        /// Stage holding the records to extract (search or crawl)
        #[arg(long, value_enum, default_value = "crawl")]
        stage: Stage,

        /// Keywords whose collections are extracted
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Redo collections that already have extracted text
        #[arg(long)]
        force: bool,
    },

    /// Remove near-duplicates from the processed collection
    Dedup {
        #[arg(long, value_enum)]
        kind: DatasetKind,

        /// Similarity method; defaults to jaccard for news and url for forum
        #[arg(long, value_enum)]
        method: Option<SimilarityMethod>,

        /// Recompute the similarity matrix even if cached
        #[arg(long)]
        force_matrix: bool,

        /// Redo even if the unique collection exists
        #[arg(long)]
        force: bool,
    },

    /// Keep the records relevant to a topic
    Classify {
        #[arg(long, value_enum)]
        kind: DatasetKind,

        /// Topic the records are judged against
        #[arg(long)]
        topic: String,

        /// File holding the long description of the topic
        #[arg(long)]
        description_file: PathBuf,

        /// Stage holding the records to classify
        #[arg(long, value_enum, default_value = "unique")]
        stage: Stage,

        /// Redo even if the related collection exists
        #[arg(long)]
        force: bool,
    },

    /// Merge keyword collections into one collection
    Merge {
        #[arg(long, value_enum)]
        kind: DatasetKind,

        /// Stage of the merged collection
        #[arg(long, value_enum, default_value = "processed")]
        into: Stage,

        /// Parts to merge, as `stage:keyword`
        #[arg(required = true)]
        parts: Vec<String>,
    },

    /// List hosts that have no extraction rule and no successful extraction
    Unmapped {
        #[arg(long, value_enum)]
        kind: DatasetKind,

        #[arg(long, value_enum, default_value = "crawl-with-text")]
        stage: Stage,

        keyword: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let store = RecordStore::new(&config.store.results_dir);

    match cli.command {
        Command::Extract {
            kind,
            stage,
            keywords,
            force,
        } => handle_extract(&config, &store, kind, stage, &keywords, force).await,
        Command::Dedup {
            kind,
            method,
            force_matrix,
            force,
        } => handle_dedup(&config, &store, kind, method, force_matrix, force),
        Command::Classify {
            kind,
            topic,
            description_file,
            stage,
            force,
        } => handle_classify(&config, &store, kind, stage, &topic, &description_file, force).await,
        Command::Merge { kind, into, parts } => handle_merge(&store, kind, into, &parts),
        Command::Unmapped {
            kind,
            stage,
            keyword,
        } => handle_unmapped(&config, &store, kind, stage, &keyword),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_sieve=info,warn"),
            1 => EnvFilter::new("corpus_sieve=debug,info"),
            2 => EnvFilter::new("corpus_sieve=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `extract`: fills `text` (news) or question/answers (forum)
///
/// A keyword that fails is logged and skipped. Learned rules are flushed
/// after every keyword so a later failure cannot lose them.
async fn handle_extract(
    config: &Config,
    store: &RecordStore,
    kind: DatasetKind,
    stage: Stage,
    keywords: &[String],
    force: bool,
) -> anyhow::Result<()> {
    let Some(output_stage) = stage.with_text() else {
        bail!("stage {:?} has no extracted-text counterpart", stage);
    };

    let fetcher = Fetcher::new(&config.fetch).context("building HTTP client")?;
    let extract = &config.extract;

    let mut registry = SelectorRegistry::load(&extract.selectors_path, &extract.default_selector)?;
    let extractors = Extractors {
        news: ContentExtractor::new(
            fetcher.clone(),
            RedirectionMap::load(&extract.redirections_path)?,
            AttributeMap::load(&extract.attributes_path)?,
            extract,
        ),
        forum: ForumExtractor::new(fetcher, extract),
    };

    let mut failed = Vec::new();
    for keyword in keywords {
        let input = DatasetKey::new(kind, stage, Some(keyword));
        let output = input.at_stage(output_stage);
        if !force && store.exists(&output) {
            tracing::info!(%output, "Already extracted, skipping");
            continue;
        }

        if let Err(e) =
            extract_keyword(config, store, &extractors, &mut registry, &input, &output).await
        {
            let error = format!("{:#}", e);
            tracing::error!(%input, %error, "Extraction failed, skipping keyword");
            failed.push(keyword.as_str());
        }
    }

    if registry.learned_count() > 0 {
        println!(
            "Saved {} learned rule(s) to {}",
            registry.learned_count(),
            extract.selectors_path.display()
        );
    }
    if !failed.is_empty() {
        println!("Failed keywords: {}", failed.join(", "));
    }

    Ok(())
}

struct Extractors {
    news: ContentExtractor,
    forum: ForumExtractor,
}

/// Extracts one keyword collection, saves it and flushes new rules
async fn extract_keyword(
    config: &Config,
    store: &RecordStore,
    extractors: &Extractors,
    registry: &mut SelectorRegistry,
    input: &DatasetKey,
    output: &DatasetKey,
) -> anyhow::Result<()> {
    let mut document = store
        .load(input)
        .with_context(|| format!("loading {}", input))?;
    tracing::info!(%input, records = document.len(), "Extracting collection");

    let report = match input.kind {
        DatasetKind::News => {
            extractors
                .news
                .extract_collection(&mut document.items, registry)
                .await
        }
        DatasetKind::Forum => extractors.forum.extract_collection(&mut document.items).await,
    };

    document.keyword = input.keyword.clone();
    store.save(output, &document)?;
    registry.flush(&config.extract.selectors_path)?;

    let title = input.keyword.as_deref().unwrap_or_default();
    let report_path = store
        .root()
        .join("reports")
        .join(format!("{}_failures.md", output.file_stem()));
    write_failure_report(title, &report, &report_path)?;
    print_extraction_report(&output.to_string(), &report);
    Ok(())
}

/// Handles `dedup`: processed collection to unique collection
fn handle_dedup(
    config: &Config,
    store: &RecordStore,
    kind: DatasetKind,
    method: Option<SimilarityMethod>,
    force_matrix: bool,
    force: bool,
) -> anyhow::Result<()> {
    let input = DatasetKey::new(kind, Stage::Processed, None);
    let output = input.at_stage(Stage::Unique);
    if !force && store.exists(&output) {
        tracing::info!(%output, "Already deduplicated, skipping");
        return Ok(());
    }

    let method = method.unwrap_or(match kind {
        DatasetKind::News => SimilarityMethod::Jaccard,
        DatasetKind::Forum => SimilarityMethod::UrlIdentity,
    });

    let mut document = store
        .load(&input)
        .with_context(|| format!("loading {}", input))?;
    let cache = SimilarityCache::open(&config.dedup.cache_path)?;
    let matrix = similarity_matrix(&cache, kind, &document.items, method, force_matrix)?;

    let report = filter_duplicates(
        &mut document.items,
        &matrix,
        config.dedup.threshold,
        DropPolicy::for_kind(kind),
    );

    document.keyword = None;
    store.save(&output, &document)?;
    print_dedup_report(&output.to_string(), &report);
    Ok(())
}

/// Handles `classify`: keeps relevant records, with the judgement arrays
async fn handle_classify(
    config: &Config,
    store: &RecordStore,
    kind: DatasetKind,
    stage: Stage,
    topic: &str,
    description_file: &Path,
    force: bool,
) -> anyhow::Result<()> {
    let input = DatasetKey::new(kind, stage, None);
    let output = input.at_stage(Stage::Related);
    if !force && store.exists(&output) {
        tracing::info!(%output, "Already classified, skipping");
        return Ok(());
    }

    let description = std::fs::read_to_string(description_file)
        .with_context(|| format!("reading {}", description_file.display()))?;
    let document = store
        .load(&input)
        .with_context(|| format!("loading {}", input))?;

    let client = OpenAiClient::from_config(&config.classifier)?;
    let classifier = RelevanceClassifier::new(client, &config.classifier);

    tracing::info!(%input, records = document.len(), topic, "Classifying collection");
    let judgements = classifier
        .classify_relevance(&document.items, topic, description.trim())
        .await;
    let (succeeded, attempted) = classifier.progress();
    tracing::info!(succeeded, attempted, "Classification finished");

    let stats = RelevanceStatistics::from_judgements(&judgements);
    let related = filter_relevant(document, topic, &judgements);
    store.save(&output, &related)?;
    print_relevance_statistics(&output.to_string(), &stats);
    Ok(())
}

/// Parses `stage:keyword` into a key of `kind`
fn parse_part(kind: DatasetKind, part: &str) -> anyhow::Result<DatasetKey> {
    let Some((stage, keyword)) = part.split_once(':') else {
        bail!("expected `stage:keyword`, got `{}`", part);
    };
    let stage = Stage::from_str(stage, true).map_err(|e| anyhow::anyhow!(e))?;
    Ok(DatasetKey::new(kind, stage, Some(keyword)))
}

/// Handles `merge`: concatenates keyword collections, tagging each record
fn handle_merge(
    store: &RecordStore,
    kind: DatasetKind,
    into: Stage,
    parts: &[String],
) -> anyhow::Result<()> {
    let mut documents = Vec::with_capacity(parts.len());
    for part in parts {
        let key = parse_part(kind, part)?;
        let document = store
            .load(&key)
            .with_context(|| format!("loading {}", key))?;
        documents.push((key, document));
    }

    let merged = merge_documents(documents);
    let output = DatasetKey::new(kind, into, None);
    store.save(&output, &merged)?;
    println!("Merged {} records into {}", merged.len(), output);
    Ok(())
}

/// Handles `unmapped`: hosts that need a hand-written rule
fn handle_unmapped(
    config: &Config,
    store: &RecordStore,
    kind: DatasetKind,
    stage: Stage,
    keyword: &str,
) -> anyhow::Result<()> {
    let key = DatasetKey::new(kind, stage, Some(keyword));
    let document = store
        .load(&key)
        .with_context(|| format!("loading {}", key))?;
    let registry = SelectorRegistry::load(
        &config.extract.selectors_path,
        &config.extract.default_selector,
    )?;

    let hosts = registry.unmapped_hosts(&document.items);
    println!("Unmapped hosts in {} ({}):", key, hosts.len());
    for host in hosts {
        println!("  - {}", host);
    }
    Ok(())
}
