mod config;
mod server;

use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lectio_core::{
    AnalysisContext, FrequencyReport, Reading, build_density, navigate,
    occurrences_from_positions, word_frequency,
};
use lectio_navigium::NavigiumClient;

use crate::config::LectioConfig;

#[derive(Parser)]
#[command(name = "lectio", about = "Latin text analysis and frequency navigation")]
struct Cli {
    /// Config file (default: $LECTIO_CONFIG, then ./lectio.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to listen on, overriding the config file
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Look up a single word form
    Lookup {
        word: String,

        /// Dictionary entry number (1-based)
        #[arg(long, default_value_t = 1)]
        nr: u32,

        /// Print every entry listed under the word's forms
        #[arg(long)]
        all: bool,
    },

    /// Look up every word of a text
    Analyze {
        /// Text file, or `-` for stdin
        input: PathBuf,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Positions of each search word's lemmata in a text
    Frequency {
        /// Text file, or `-` for stdin
        input: PathBuf,

        #[arg(required = true)]
        words: Vec<String>,

        /// Match surface forms only, without dictionary lookups
        #[arg(long)]
        offline: bool,
    },

    /// Resolve a bucket of the density chart to one occurrence
    Navigate {
        /// Text file, or `-` for stdin
        input: PathBuf,

        word: String,

        /// Clicked bucket (0-based)
        #[arg(long)]
        bucket: usize,

        /// Number of chart buckets (default: config `default_buckets`)
        #[arg(long)]
        buckets: Option<usize>,

        /// Maximum count difference between neighbouring plateau buckets
        #[arg(long, default_value_t = 0)]
        tolerance: usize,

        /// Match surface forms only, without dictionary lookups
        #[arg(long)]
        offline: bool,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = LectioConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Serve { bind } => cmd_serve(config, *bind).await,
        Commands::Lookup { word, nr, all } => cmd_lookup(&config, word, *nr, *all).await,
        Commands::Analyze { input, json } => cmd_analyze(&config, input, *json).await,
        Commands::Frequency {
            input,
            words,
            offline,
        } => cmd_frequency(&config, input, words, *offline).await,
        Commands::Navigate {
            input,
            word,
            bucket,
            buckets,
            tolerance,
            offline,
        } => {
            let buckets = buckets.unwrap_or(config.default_buckets);
            cmd_navigate(&config, input, word, *bucket, buckets, *tolerance, *offline).await
        }
    }
}

fn client(config: &LectioConfig) -> Result<NavigiumClient> {
    NavigiumClient::new(config.navigium.clone()).context("failed to build HTTP client")
}

/// Read a text file, or stdin for `-`.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn cmd_serve(mut config: LectioConfig, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(addr) = bind {
        config.bind = addr;
    }
    let client = client(&config)?;
    eprintln!("lectio serving on http://{}", config.bind);
    server::serve(&config, client).await
}

async fn cmd_lookup(config: &LectioConfig, word: &str, nr: u32, all: bool) -> Result<()> {
    let client = client(config)?;
    let json = if all {
        serde_json::to_string_pretty(&client.lookup_all_meanings(word).await)?
    } else {
        serde_json::to_string_pretty(&client.lookup(word, nr.max(1)).await)?
    };
    println!("{json}");
    Ok(())
}

async fn cmd_analyze(config: &LectioConfig, input: &Path, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let analyses = client(config)?.analyze_text(&text, true).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&analyses)?);
        return Ok(());
    }
    for analysis in &analyses {
        match analysis.reading() {
            Reading::Unknown => println!("{:<16} ?", analysis.word),
            Reading::Unambiguous(lemma) => println!("{:<16} {lemma}", analysis.word),
            Reading::Ambiguous(lemmas) => {
                println!("{:<16} {} [ambiguous]", analysis.word, lemmas.join(" | "))
            }
        }
    }
    println!("{} words", analyses.len());
    Ok(())
}

async fn frequency_report(
    config: &LectioConfig,
    text: &str,
    words: &[String],
    offline: bool,
) -> Result<FrequencyReport> {
    let mut ctx = AnalysisContext::new(text, &[]);
    if !offline {
        client(config)?.fill_lemmas(&mut ctx, words).await;
    }
    Ok(word_frequency(&ctx, words))
}

async fn cmd_frequency(
    config: &LectioConfig,
    input: &Path,
    words: &[String],
    offline: bool,
) -> Result<()> {
    let text = read_input(input)?;
    let report = frequency_report(config, &text, words, offline).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_navigate(
    config: &LectioConfig,
    input: &Path,
    word: &str,
    bucket: usize,
    buckets: usize,
    tolerance: usize,
    offline: bool,
) -> Result<()> {
    config.check_bucket_count(buckets)?;
    let text = read_input(input)?;
    let words = vec![word.to_string()];
    let report = frequency_report(config, &text, &words, offline).await?;
    let occurrences = occurrences_from_positions(&report.word_data[0].positions, word);

    let series = build_density(&occurrences, report.total_words, buckets)
        .context("cannot build density chart")?;
    let nav = navigate(&series, &occurrences, bucket, tolerance).context("cannot navigate")?;

    let counts: Vec<String> = series.counts().iter().map(|c| c.to_string()).collect();
    println!("counts:   {}", counts.join(" "));
    println!("plateau:  {}..={}", nav.plateau.lo, nav.plateau.hi);
    match nav.occurrence {
        Some(occ) => println!("word:     {}", occ.position + 1),
        None => println!("word:     none"),
    }
    Ok(())
}
