use anyhow::Context;
use clap::{Parser, Subcommand};
use paperscope::{
    analyzer::{self, Column},
    clean, clean_with_report,
    loader::{print_column_summaries, truncate_chars},
    AbstractFilter, CleanedTable, Config, Dataset, Filter, RawTable, Reporter,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paperscope")]
#[command(about = "Load, clean and summarize research-paper metadata")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full load, clean and analysis pipeline
    Run {
        /// Metadata CSV file (defaults to the configured input_path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory to export JSON, HTML and Markdown reports into
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the cleaned table to this CSV file
        #[arg(long)]
        clean_output: Option<PathBuf>,
    },
    /// Filter the cleaned table and summarize the selection
    Explore {
        /// Metadata CSV file (defaults to the configured input_path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// First publication year to include
        #[arg(long)]
        from_year: Option<i32>,

        /// Last publication year to include
        #[arg(long)]
        to_year: Option<i32>,

        /// Only include papers from this journal
        #[arg(short, long)]
        journal: Option<String>,

        /// Filter on abstract presence
        #[arg(long, value_enum, default_value = "all")]
        abstracts: AbstractFilter,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the config file (defaults to ~/.paperscope.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run { input, config, output, clean_output } => {
            run_pipeline(load_config(config, input)?, output, clean_output)?;
        }
        Commands::Explore { input, config, from_year, to_year, journal, abstracts } => {
            explore(load_config(config, input)?, from_year, to_year, journal, abstracts)?;
        }
        Commands::Config { output } => {
            generate_config(output)?;
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, input: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::from_file(&path)?.with_env_overrides(),
        None => Config::load()?,
    };
    if let Some(input) = input {
        config.input_path = input;
    }
    Ok(config)
}

fn load_and_clean(config: &Config) -> anyhow::Result<CleanedTable> {
    let dataset = Dataset::from_path(&config.input_path)?;
    Ok(clean(&dataset))
}

fn run_pipeline(config: Config, output: Option<PathBuf>, clean_output: Option<PathBuf>) -> anyhow::Result<()> {
    println!("PAPER METADATA ANALYSIS");
    println!("{}", "=".repeat(50));

    let start_time = Instant::now();

    println!("\nPART 1: DATA LOADING AND EXPLORATION");
    let raw = RawTable::from_path(&config.input_path)?;
    raw.print_summary(config.head_rows, config.missing_report_rows);

    println!("\nPART 2: DATA CLEANING");
    let dataset = Dataset::from_raw(&raw)?;
    let (table, cleaning) = clean_with_report(&dataset);
    cleaning.print_summary();

    if let Some(path) = clean_output {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        table.write_csv(BufWriter::new(file))?;
        info!("Cleaned table written to {}", path.display());
    }

    println!("\nPART 3: ANALYSIS");
    let reporter = Reporter::new();
    let report = reporter.generate_report(&table, &cleaning, &config, start_time.elapsed().as_millis());
    report.print_summary();

    if let Some(output_path) = output {
        let exported_files = reporter.export_report(&report, &output_path)?;
        println!("\nReports exported to:");
        for file in exported_files {
            println!("   - {}", file.display());
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("ANALYSIS COMPLETE in {:.2}s", start_time.elapsed().as_secs_f64());
    println!("{}", "=".repeat(50));

    Ok(())
}

fn explore(
    config: Config,
    from_year: Option<i32>,
    to_year: Option<i32>,
    journal: Option<String>,
    abstracts: AbstractFilter,
) -> anyhow::Result<()> {
    let table = load_and_clean(&config)?;

    let year_range = Filter::year_range_for(&table, from_year, to_year);
    let filter = Filter { year_range, journal, abstracts };
    let filtered = filter.apply(&table);
    info!("{} of {} papers match the filter", filtered.len(), table.len());

    let explore = &config.explore;
    let summary = analyzer::abstract_summary(&filtered);

    println!("PAPER METADATA EXPLORER");
    println!("{}", "=".repeat(50));
    println!("Total papers:       {}", filtered.len());
    println!("With abstracts:     {}", summary.with_abstract);
    match year_range.or_else(|| filtered.year_bounds()) {
        Some((from, to)) => println!("Time range:         {} - {}", from, to),
        None => println!("Time range:         n/a"),
    }
    match summary.mean_abstract_words {
        Some(mean) => println!("Avg abstract words: {:.0}", mean),
        None => println!("Avg abstract words: n/a"),
    }

    println!("\n=== PUBLICATIONS BY YEAR ===");
    for (year, count) in analyzer::yearly_counts(&filtered, i32::MIN) {
        println!("  {}: {}", year, count);
    }

    println!("\n=== MONTHLY PUBLICATIONS ===");
    for (month, count) in analyzer::monthly_counts(&filtered) {
        println!("  {}: {}", month, count);
    }

    print_ranking(
        &format!("TOP {} JOURNALS", explore.top_n),
        &analyzer::top_n(&filtered, &Column::Journal, explore.top_n),
    );
    print_ranking(
        "JOURNAL DISTRIBUTION",
        &analyzer::top_n_with_other(&filtered, &Column::Journal, 10),
    );

    let stopwords = analyzer::stopword_set(&explore.stopwords);
    let words = analyzer::word_frequency_with_limit(
        &filtered,
        &Column::Title,
        &stopwords,
        config.word_min_len,
        explore.top_n,
    );
    if words.is_empty() {
        println!("\nNo titles available for word counts.");
    } else {
        print_ranking(&format!("TOP {} TITLE WORDS", explore.top_n), &words);
    }

    print_ranking(
        &format!("TOP {} SOURCES", explore.top_n),
        &analyzer::top_n(&filtered, &Column::SourceX, explore.top_n),
    );

    println!("\n=== SAMPLE DATA ===");
    for row in filtered.rows.iter().take(explore.sample_rows) {
        println!(
            "  {:<60} | {:<30} | {:>4} | {}",
            truncate_chars(&row.title, 60),
            truncate_chars(&row.journal, 30),
            row.publication_year.map_or_else(|| "-".to_string(), |y| y.to_string()),
            row.has_abstract
        );
    }

    println!("\n=== DATASET STATISTICS ===");
    println!("Number of columns: {}", filtered.column_names().len());
    println!("Number of rows: {}", filtered.len());
    print_column_summaries(&analyzer::descriptive_stats(&filtered));

    Ok(())
}

fn print_ranking(title: &str, rows: &[(String, usize)]) {
    println!("\n=== {} ===", title);
    for (i, (name, count)) in rows.iter().enumerate() {
        println!("  {:>2}. {}: {}", i + 1, name, count);
    }
}

fn generate_config(output_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = output_path.unwrap_or_else(|| {
        Config::default_config_path().unwrap_or_else(|_| PathBuf::from("paperscope.toml"))
    });

    println!("Generating configuration file: {}", config_path.display());

    Config::write_documented(&config_path)?;

    println!("Configuration file created successfully!");
    println!("Edit the file to customize input, report sizes and stopwords.");

    Ok(())
}
