use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use ticketflow_syntax::tokenize;
use ticketflow_templates::{Config, TemplateEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template to HTML
    Render {
        /// Template identifier, e.g. `pages/dashboard`
        template: String,

        /// JSON file with the render context
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Extra string global (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Path to the YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Template root (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Write the page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the token stream of a template file
    Tokens {
        /// Template source file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            template,
            data,
            set,
            config,
            root,
            output,
        } => render(
            &template,
            data.as_deref(),
            &set,
            config.as_deref(),
            root,
            output.as_deref(),
        ),
        Commands::Tokens { file } => print_tokens(&file),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render(
    template: &str,
    data: Option<&Path>,
    set: &[String],
    config_path: Option<&Path>,
    root: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::load(path).with_context(|| format!("Failed to load config {path:?}"))?
        }
        None => Config::default(),
    };
    if let Some(root) = root {
        config.templates.root = root;
    }

    let mut engine = TemplateEngine::from_config(&config);
    for assignment in set {
        let (key, value) = parse_assignment(assignment)?;
        engine.add_global(key, value);
    }

    let data = match data {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file {path:?}"))?;
            serde_json::from_str(&content).context("Failed to parse JSON data")?
        }
        None => serde_json::json!({}),
    };

    let html = engine
        .render(template, data)
        .with_context(|| format!("Failed to render '{template}'"))?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {parent:?}"))?;
            }
            std::fs::write(path, html).with_context(|| format!("Failed to write {path:?}"))?;
            tracing::info!(path = %path.display(), "page written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(anyhow!("Invalid --set '{assignment}', expected KEY=VALUE")),
    }
}

fn print_tokens(file: &Path) -> Result<()> {
    let source =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {file:?}"))?;

    for token in tokenize(&source) {
        println!(
            "{:>4}:{:<3} {:<6} {:?}",
            token.location.line,
            token.location.column,
            format!("{:?}", token.token_type),
            token.value
        );
    }

    Ok(())
}
