//! ftl2gotpl CLI - FreeMarker to Go html/template converter

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::process::ExitCode;

#[cfg(feature = "cli")]
use ftl2gotpl::{
    batch::run_batch,
    convert_template, Helper,
    utils::config::{RunConfig, DEFAULT_OUTPUT_EXT},
};

#[cfg(feature = "cli")]
const EXIT_CONVERSION_FAILED: u8 = 2;
#[cfg(feature = "cli")]
const EXIT_RUN_ERROR: u8 = 1;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "ftl2gotpl")]
#[command(version)]
#[command(about = "Convert FreeMarker templates to Go html/template source", long_about = None)]
struct Cli {
    /// Template files to convert (reads one template from stdin if none are given)
    inputs: Vec<PathBuf>,

    /// Output directory; each input is written as <stem><ext>
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Extension of converted files
    #[arg(long, default_value = DEFAULT_OUTPUT_EXT)]
    ext: String,

    /// Write a JSON run report to this path
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Write a CSV run report to this path
    #[arg(long)]
    report_csv: Option<PathBuf>,

    /// Stop at the first template that fails to convert
    #[arg(long)]
    strict: bool,

    /// Print the helper functions converted templates may call, then exit
    #[arg(long)]
    list_helpers: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[cfg(feature = "cli")]
impl Cli {
    fn run_config(&self) -> RunConfig {
        let inputs = self.inputs.clone();
        let mut config = if self.strict {
            RunConfig::strict(inputs)
        } else {
            RunConfig::new(inputs)
        };
        config.out_dir = self.out.clone();
        config.ext = self.ext.clone();
        config.report_json = self.report_json.clone();
        config.report_csv = self.report_csv.clone();
        config
    }
}

#[cfg(feature = "cli")]
fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.list_helpers {
        for helper in Helper::ALL {
            println!("{:<18} {}", helper.name(), helper.description());
        }
        return ExitCode::SUCCESS;
    }

    let config = cli.run_config();
    if cli.inputs.is_empty() {
        if let Err(e) = config.validate_stdin() {
            log::error!("invalid configuration: {}", e);
            return ExitCode::from(EXIT_RUN_ERROR);
        }
        return convert_stdin();
    }

    let stdout = io::stdout();
    match run_batch(&config, &mut stdout.lock()) {
        Ok(report) if report.has_failures() => ExitCode::from(EXIT_CONVERSION_FAILED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(EXIT_RUN_ERROR)
        }
    }
}

#[cfg(feature = "cli")]
fn convert_stdin() -> ExitCode {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        log::error!("read <stdin>: {}", e);
        return ExitCode::from(EXIT_RUN_ERROR);
    }

    match convert_template("<stdin>", &source) {
        Ok(conversion) => {
            if let Err(e) = io::stdout().write_all(conversion.output.as_bytes()) {
                log::error!("write <stdout>: {}", e);
                return ExitCode::from(EXIT_RUN_ERROR);
            }
            if !conversion.helpers.is_empty() {
                log::info!("helpers needed: {}", conversion.helpers.join(", "));
            }
            ExitCode::SUCCESS
        }
        Err(diag) => {
            log::warn!("conversion failed: {}", diag);
            if !diag.snippet.is_empty() {
                log::warn!("  near: {}", diag.snippet);
            }
            ExitCode::from(EXIT_CONVERSION_FAILED)
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install ftl2gotpl --features cli");
    eprintln!("  ftl2gotpl [OPTIONS] [INPUTS]...");
}
