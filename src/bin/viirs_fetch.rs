use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use viirs_fetch::app::{App, DownloadOutcome, RunOptions, RunReport};
use viirs_fetch::cmr::SystemCatalogClient;
use viirs_fetch::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use viirs_fetch::convert::ConversionReport;
use viirs_fetch::error::ViirsError;
use viirs_fetch::netcdf_io::NetcdfGranuleIo;
use viirs_fetch::output::{ConsoleOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "viirs-fetch")]
#[command(about = "Fetch VIIRS cloud-mask granules with cmrfetch and normalize them to time/lat/lon grids")]
#[command(version, author)]
struct Cli {
    /// Print a JSON report on stdout instead of progress lines
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ./viirs-fetch.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Look up, download and convert granules (default)")]
    Run(RunArgs),
    #[command(about = "Look up granules without downloading")]
    Search(QueryArgs),
    #[command(about = "Download granules into the output folder")]
    Download(QueryArgs),
    #[command(about = "Convert downloaded .nc granules in a folder")]
    Convert(ConvertArgs),
    #[command(about = "Show the catalog tool location and version")]
    Check(CheckArgs),
}

#[derive(Args, Clone, Default)]
struct QueryArgs {
    #[arg(long)]
    concept_id: Option<String>,

    /// minlon,minlat,maxlon,maxlat
    #[arg(long = "bbox")]
    bounding_box: Option<String>,

    /// RFC 3339 start timestamp
    #[arg(long)]
    start: Option<String>,

    /// RFC 3339 end timestamp
    #[arg(long)]
    end: Option<String>,

    /// Whole UTC day, YYYY-MM-DD
    #[arg(long, conflicts_with_all = ["start", "end"])]
    date: Option<String>,

    #[arg(long)]
    output_dir: Option<String>,

    /// Catalog tool name or path
    #[arg(long)]
    tool: Option<String>,
}

#[derive(Args, Clone, Default)]
struct RunArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Do not convert when the download fails
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Clone)]
struct ConvertArgs {
    /// Folder holding downloaded granules (defaults to the configured output folder)
    #[arg(long)]
    dir: Option<String>,
}

#[derive(Args, Clone)]
struct CheckArgs {
    #[arg(long)]
    tool: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(err) = report.downcast_ref::<ViirsError>() {
                return ExitCode::from(map_exit_code(err));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &ViirsError) -> u8 {
    match error {
        ViirsError::InvalidConceptId(_)
        | ViirsError::InvalidBoundingBox(_)
        | ViirsError::InvalidTimestamp(_)
        | ViirsError::InvalidTimeRange { .. }
        | ViirsError::ConfigRead(_)
        | ViirsError::ConfigParse(_) => 2,
        ViirsError::MissingTool(_) | ViirsError::ToolFailed { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<u8> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };
    let config = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let resolved = resolve(config, args.query)?;
            let app = build_app(&resolved.tool);
            let options = RunOptions {
                strict: args.strict,
            };
            let report = match output_mode {
                OutputMode::Json => {
                    let report = app.run(&resolved, options, &JsonOutput)?;
                    JsonOutput::print_run(&report).into_diagnostic()?;
                    report
                }
                OutputMode::Console => {
                    let report = app.run(&resolved, options, &ConsoleOutput)?;
                    print_run_summary(&report);
                    report
                }
            };
            Ok(report.exit_code())
        }
        Commands::Search(args) => {
            let resolved = resolve(config, args)?;
            let app = build_app(&resolved.tool);
            let result = match output_mode {
                OutputMode::Json => {
                    let result = app.search(&resolved.query, &JsonOutput)?;
                    JsonOutput::print_search(&result).into_diagnostic()?;
                    result
                }
                OutputMode::Console => {
                    let result = app.search(&resolved.query, &ConsoleOutput)?;
                    if let Some(listing) = &result.granules {
                        println!("{}", listing.as_str().trim_end());
                    }
                    result
                }
            };
            Ok(if result.granules.is_some() { 0 } else { 2 })
        }
        Commands::Download(args) => {
            let resolved = resolve(config, args)?;
            let app = build_app(&resolved.tool);
            match output_mode {
                OutputMode::Json => {
                    let result = app.download(&resolved.query, &resolved.output_dir, &JsonOutput)?;
                    JsonOutput::print_download(&result).into_diagnostic()?;
                }
                OutputMode::Console => {
                    let result =
                        app.download(&resolved.query, &resolved.output_dir, &ConsoleOutput)?;
                    println!("downloaded into {}", result.output_dir);
                }
            }
            Ok(0)
        }
        Commands::Convert(args) => {
            let resolved = resolve(
                config,
                QueryArgs {
                    output_dir: args.dir,
                    ..QueryArgs::default()
                },
            )?;
            let app = build_app(&resolved.tool);
            let dir: Utf8PathBuf = resolved.output_dir;
            let report = match output_mode {
                OutputMode::Json => {
                    let report = app.convert(&dir, &JsonOutput)?;
                    JsonOutput::print_conversion(&report).into_diagnostic()?;
                    report
                }
                OutputMode::Console => {
                    let report = app.convert(&dir, &ConsoleOutput)?;
                    print_conversion_summary(&report);
                    report
                }
            };
            Ok(if report.failed() > 0 { 4 } else { 0 })
        }
        Commands::Check(args) => {
            let tool = match args.tool {
                Some(tool) => tool,
                None => ConfigLoader::resolve(config, ConfigOverrides::default())?.tool,
            };
            let info = build_app(&tool).tool_info();
            match output_mode {
                OutputMode::Json => JsonOutput::print_tool(&info).into_diagnostic()?,
                OutputMode::Console => {
                    println!("tool:    {}", info.name);
                    println!("path:    {}", info.path.as_deref().unwrap_or("not found"));
                    println!("version: {}", info.version.as_deref().unwrap_or("unknown"));
                }
            }
            Ok(if info.path.is_some() { 0 } else { 3 })
        }
    }
}

fn resolve(config: Option<&str>, args: QueryArgs) -> Result<ResolvedConfig, ViirsError> {
    ConfigLoader::resolve(
        config,
        ConfigOverrides {
            concept_id: args.concept_id,
            bounding_box: args.bounding_box,
            start: args.start,
            end: args.end,
            date: args.date,
            output_dir: args.output_dir,
            tool: args.tool,
        },
    )
}

fn build_app(tool: &str) -> App<SystemCatalogClient, NetcdfGranuleIo, NetcdfGranuleIo> {
    App::new(SystemCatalogClient::new(tool), NetcdfGranuleIo, NetcdfGranuleIo)
}

fn print_run_summary(report: &RunReport) {
    println!("concept:  {}", report.query.concept_id);
    println!("period:   {}", report.query.time_range);
    println!("area:     {}", report.query.bounding_box);
    println!("folder:   {}", report.output_dir);
    if report.granules.is_none() {
        println!("no granules found, nothing downloaded");
        return;
    }
    match &report.download {
        DownloadOutcome::Skipped => println!("download: skipped"),
        DownloadOutcome::Succeeded => println!("download: ok"),
        DownloadOutcome::Failed { error } => println!("download: failed ({error})"),
    }
    match &report.conversion {
        Some(conversion) => print_conversion_summary(conversion),
        None => println!("conversion: skipped"),
    }
}

fn print_conversion_summary(report: &ConversionReport) {
    if report.no_input_files {
        println!("no .nc files found in {}", report.input_dir);
        return;
    }
    println!(
        "converted {} of {} file(s) into {}",
        report.converted(),
        report.files.len(),
        report.output_dir.as_deref().unwrap_or("-")
    );
    for file in &report.files {
        match (&file.output, &file.error) {
            (_, Some(error)) => println!("  failed {}: {error}", file.input),
            (Some(output), None) => println!("  ok     {output}"),
            (None, None) => {}
        }
    }
}
