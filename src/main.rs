use anyhow::{Context, Result};
use clap::Parser;
use compready::bugs::ResultItem;
use compready::cli::{Cli, Command, EncodeArgs, OutputFormat};
use compready::report::codec::{self, keys};
use compready::report::ReportConfiguration;
use compready::settings::Settings;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn run_encode(settings: &Settings, args: &EncodeArgs) -> Result<()> {
    let mut config = settings
        .default_configuration()
        .context("Invalid default configuration")?;
    args.apply(&mut config, settings.views())?;

    let params = codec::encode(&config);
    match args.format {
        OutputFormat::Text => println!("{}", codec::report_path(&params)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "path": codec::report_path(&params),
            "params": params,
        }))?,
    }
    Ok(())
}

/// Print a configuration as `key: value` lines
fn print_configuration(config: &ReportConfiguration) {
    println!("{}: {}", keys::VIEW, config.view().unwrap_or("-"));
    for (role, window) in [("basis", config.basis()), ("sample", config.sample())] {
        println!(
            "{}: {} [{} .. {}]",
            role,
            window.release,
            window.start.to_rfc3339(),
            window.end.to_rfc3339()
        );
    }
    if let Some(pr) = config.sample_pull_request() {
        println!("pull request: {}", pr);
    }

    let group_by: Vec<&str> = config.group_by().iter().map(String::as_str).collect();
    println!("{}: {}", keys::GROUP_BY, group_by.join(","));
    for (dimension, values) in config.included_variants() {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        println!("include {}: {}", dimension, values.join(","));
    }

    println!("{}: {}", keys::CONFIDENCE, config.confidence());
    println!("{}: {}", keys::PITY, config.pity());
    println!("{}: {}", keys::MIN_FAIL, config.min_fail());
    println!("{}: {}", keys::IGNORE_MISSING, config.ignore_missing());
    println!("{}: {}", keys::IGNORE_DISRUPTION, config.ignore_disruption());
}

fn run_decode(settings: &Settings, query: &str, format: OutputFormat) -> Result<()> {
    let codec = settings.codec().context("Invalid default configuration")?;
    let config = codec
        .decode_query(query)
        .with_context(|| format!("Failed to decode query '{}'", query))?;

    match format {
        OutputFormat::Text => print_configuration(&config),
        OutputFormat::Json => print_json(&config)?,
    }
    Ok(())
}

fn run_classify(
    settings: &Settings,
    status: i64,
    gray_factor: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let classification = settings.severity().classify(status, gray_factor);
    match format {
        OutputFormat::Text => {
            let dampened = if classification.dampened {
                " (dampened)"
            } else {
                ""
            };
            println!(
                "{} [{}{}]",
                classification.status_text(),
                classification.tier,
                dampened
            );
        }
        OutputFormat::Json => print_json(&classification)?,
    }
    Ok(())
}

fn run_bug_url(
    settings: &Settings,
    name: &str,
    release: &str,
    test_grid_url: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let mut item = ResultItem::new(name, 0);
    item.test_grid_url = test_grid_url;

    let draft = settings.bug_tracker().draft(&item, release);
    match format {
        OutputFormat::Text => println!("{}", draft.url),
        OutputFormat::Json => print_json(&draft)?,
    }
    Ok(())
}

fn run_dimensions(settings: &Settings) {
    let catalog = settings.catalog();
    for name in catalog.eligible_dimensions() {
        let values = catalog.values(name).unwrap_or_default();
        println!("{}: {}", name, values.join(", "));
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let settings = Settings::load(args.config.as_deref())?;

    match args.command {
        Command::Encode(encode) => run_encode(&settings, &encode),
        Command::Decode { query, format } => run_decode(&settings, &query, format),
        Command::Classify {
            status,
            gray_factor,
            format,
        } => run_classify(&settings, status, gray_factor, format),
        Command::BugUrl {
            name,
            release,
            test_grid_url,
            format,
        } => run_bug_url(&settings, &name, &release, test_grid_url, format),
        Command::Dimensions => {
            run_dimensions(&settings);
            Ok(())
        }
    }
}
