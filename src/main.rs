use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{error, info, Level};

use cookbook_import::events::Tee;
use cookbook_import::{CookbookImporter, EventSink, ImportConfig, LogSink, RecordingSink};

#[derive(Parser)]
#[command(
    name = "cookbook-import",
    about = "Import a LaTeX recipe collection into SQLite"
)]
struct Cli {
    /// TOML configuration file (default: ./cookbook.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory holding the manifest and recipe documents
    #[arg(short, long)]
    root: Option<PathBuf>,
    /// SQLite database to create the tables in
    #[arg(short, long)]
    database: Option<PathBuf>,
    /// Delimited tag table joined onto recipes by title
    #[arg(short, long)]
    tags: Option<PathBuf>,
    /// Parse only and print the result as JSON
    #[arg(long)]
    dry_run: bool,
    /// Also append log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Writes log lines to stderr and to a file
struct LogTee {
    file: File,
}

impl Write for LogTee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> io::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = File::options().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(LogTee { file })));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let t0 = Instant::now();
    info!("Start import");

    let config = ImportConfig::load(cli.config.as_deref())?;
    let mut builder = CookbookImporter::builder().config(config);
    if let Some(root) = cli.root {
        builder = builder.root(root);
    }
    if let Some(database) = cli.database {
        builder = builder.database(database);
    }
    if let Some(tags) = cli.tags {
        builder = builder.tags(tags);
    }
    let importer = builder.build()?;

    let recorded = RecordingSink::new();
    let sink = Tee(&LogSink, &recorded);
    let sink: &dyn EventSink = &sink;

    let result = if cli.dry_run {
        importer.parse(sink)
    } else {
        importer.run(sink)
    };
    let cookbook = match result {
        Ok(cookbook) => cookbook,
        Err(e) => {
            error!("Import failed: {e}");
            return Err(e.into());
        }
    };

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&cookbook)?);
    } else {
        info!(
            "Wrote {} recipes and {} ingredients to {}",
            cookbook.recipes.len(),
            cookbook.ingredients.len(),
            importer.config().paths.database.display()
        );
    }

    let warnings = recorded.at_level(Level::Warn).len();
    let review = cookbook.rows_needing_review();
    if warnings > 0 || review > 0 {
        info!("{warnings} warnings, {review} ingredient rows need review");
    }
    info!("Runtime: {:.2?}", t0.elapsed());
    Ok(())
}
