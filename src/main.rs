use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use xccov_cobertura::config::{
    EnvSource, Layered, Settings, TomlSource, OUTPUT_DIR_KEY, SOURCE_DIR_KEY, STEP_OUTPUTS_KEY,
    XCRESULT_KEY,
};
use xccov_cobertura::export::XccovExporter;
use xccov_cobertura::pipeline::{self, Conversion};

const CONFIG_FILE: &str = "xccov-cobertura.toml";

#[derive(Parser)]
#[command(name = "xccov-cobertura")]
#[command(about = "Convert Xcode coverage reports to Cobertura XML")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: xccov-cobertura.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export coverage from an .xcresult bundle and convert it
    Run {
        /// Path to the .xcresult bundle [config: path_to_xcresult]
        #[arg(long)]
        xcresult: Option<String>,

        /// Directory for coverage.json and cobertura.xml [config: xml_output_dir]
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Source root stripped from file paths [config: path_to_source_dir]
        #[arg(short, long)]
        source_dir: Option<String>,

        /// Where to publish step outputs: envman, stdout, none [config: step_outputs]
        /// (default: envman when BITRISE_IO is set, none otherwise)
        #[arg(long)]
        step_outputs: Option<String>,
    },

    /// Convert an already exported xccov JSON report
    Convert {
        /// xccov JSON report
        input: PathBuf,

        /// Source root stripped from file paths
        #[arg(short, long)]
        source_dir: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            xcresult,
            output_dir,
            source_dir,
            step_outputs,
        } => {
            let mut overrides = HashMap::new();
            for (key, value) in [
                (XCRESULT_KEY, xcresult),
                (OUTPUT_DIR_KEY, output_dir),
                (SOURCE_DIR_KEY, source_dir),
                (STEP_OUTPUTS_KEY, step_outputs),
            ] {
                if let Some(value) = value {
                    overrides.insert(key.to_string(), value);
                }
            }
            cmd_run(cli.config.as_deref(), overrides)
        }
        Commands::Convert {
            input,
            source_dir,
            output,
        } => cmd_convert(&input, &source_dir, output.as_deref()),
    }
}

fn cmd_run(config_path: Option<&Path>, overrides: HashMap<String, String>) -> Result<()> {
    let mut source = Layered::new().with(overrides);

    match config_path {
        Some(path) => source = source.with(TomlSource::load(path)?),
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                source = source.with(TomlSource::load(default_path)?);
            }
        }
    }

    let settings = Settings::from_source(&source.with(EnvSource))?;
    let outputs = settings.publisher();

    let result = pipeline::run(&settings, &XccovExporter::default(), outputs.as_ref())?;

    print_summary(&result.conversion);
    println!(
        "\n{} Cobertura report: {}",
        "✓".green(),
        result.xml_path.display().to_string().green()
    );

    Ok(())
}

fn cmd_convert(input: &Path, source_dir: &str, output: Option<&Path>) -> Result<()> {
    let content = fs::read(input)
        .with_context(|| format!("Failed to read coverage json: {}", input.display()))?;

    let conversion = pipeline::convert(&content, source_dir)?;

    match output {
        Some(path) => {
            fs::write(path, &conversion.xml)
                .with_context(|| format!("Failed to write xml: {}", path.display()))?;
            print_summary(&conversion);
            println!(
                "\n{} Cobertura report: {}",
                "✓".green(),
                path.display().to_string().green()
            );
        }
        None => print!("{}", conversion.xml),
    }

    Ok(())
}

fn print_summary(conversion: &Conversion) {
    let report = &conversion.report;
    let document = &conversion.document;
    let skipped = report.targets.len() - document.packages.len();

    println!("\n{}", "Coverage:".bold());
    println!(
        "  {} {} package(s), {} class(es), {} function(s), {} line(s)",
        "•".green(),
        document.packages.len(),
        document.class_count(),
        report.function_count(),
        document.line_count()
    );
    if skipped > 0 {
        println!("  {} {} target(s) without files skipped", "•".yellow(), skipped);
    }
    println!(
        "  {} Line coverage: {:.1}% ({}/{})",
        "•".green(),
        report.line_coverage * 100.0,
        report.covered_lines,
        report.executable_lines
    );
}
