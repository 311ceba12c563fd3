use cfn_tools::cfn_yaml::{self, DumpOptions, Error};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cfn-tools")]
#[command(about = "CloudFormation Tools - Process CloudFormation templates with custom tags", long_about = None)]
#[command(version)]
struct Cli {
    /// Log what the loader is doing
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Commands for working with CloudFormation templates
    #[command(subcommand)]
    Template(TemplateCommands),
}

#[derive(Subcommand, Debug)]
enum TemplateCommands {
    /// Resolve !IncludeFile and !ToString tags in a CloudFormation YAML file
    Process {
        /// Path to the CloudFormation YAML file
        #[arg(short, long, default_value = "template.yaml")]
        template: PathBuf,

        /// Output file path. Use '-' for stdout
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,

        /// Sort mapping keys in the output
        #[arg(long)]
        sort_keys: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", style("Error:").red().bold().for_stderr(), e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let directive = if verbose {
        "cfn_tools=debug"
    } else {
        "cfn_tools=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), String> {
    match command {
        Commands::Template(TemplateCommands::Process {
            template,
            output,
            format,
            sort_keys,
        }) => process_template(&template, &output, format, sort_keys),
    }
}

fn process_template(
    template: &Path,
    output: &Path,
    format: OutputFormat,
    sort_keys: bool,
) -> Result<(), String> {
    if !template.exists() {
        return Err(format!("Template file not found: {}", template.display()));
    }

    let processed = cfn_yaml::load_file(template).map_err(|e| match &e {
        Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            format!("Template file not found: {}", template.display())
        }
        Error::Syntax { .. } => format!("Failed to parse YAML: {}", e),
        _ => e.to_string(),
    })?;

    let rendered = match format {
        OutputFormat::Yaml => {
            let options = DumpOptions::default().with_sort_keys(sort_keys);
            cfn_yaml::dump(&processed, &options).map_err(|e| e.to_string())?
        }
        OutputFormat::Json => {
            let json = cfn_yaml::to_json(&processed);
            let json = if sort_keys { sort_json_keys(json) } else { json };
            let mut text = serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?;
            text.push('\n');
            text
        }
    };

    if output == Path::new("-") {
        print!("{}", rendered);
    } else {
        fs::write(output, rendered)
            .map_err(|e| format!("Failed to write {}: {}", output.display(), e))?;
        eprintln!("Processed template written to: {}", output.display());
    }
    Ok(())
}

fn sort_json_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_json_keys(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_json_keys).collect())
        }
        other => other,
    }
}
