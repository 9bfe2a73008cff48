mod request;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use request::LoweringRequest;
use std::path::{Path, PathBuf};
use yulgen_lower::CodegenError;

#[derive(Parser)]
#[command(name = "yulgen")]
#[command(about = "yulgen - Lower typed contract function bodies to Yul")]
#[command(version = "0.1.0")]
#[command(author = "Gianluca Brigandi <gbrigand@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Lower {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        #[arg(long, conflicts_with = "json")]
        helpers: bool,

        #[arg(long, value_enum)]
        evm_version: Option<EvmVersion>,

        #[arg(short, long)]
        verbose: bool,
    },

    Check {
        input: PathBuf,

        #[arg(long, value_enum)]
        evm_version: Option<EvmVersion>,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
}

impl From<EvmVersion> for yulgen_lower::EvmVersion {
    fn from(version: EvmVersion) -> Self {
        match version {
            EvmVersion::Homestead => yulgen_lower::EvmVersion::Homestead,
            EvmVersion::TangerineWhistle => yulgen_lower::EvmVersion::TangerineWhistle,
            EvmVersion::SpuriousDragon => yulgen_lower::EvmVersion::SpuriousDragon,
            EvmVersion::Byzantium => yulgen_lower::EvmVersion::Byzantium,
            EvmVersion::Constantinople => yulgen_lower::EvmVersion::Constantinople,
            EvmVersion::Petersburg => yulgen_lower::EvmVersion::Petersburg,
            EvmVersion::Istanbul => yulgen_lower::EvmVersion::Istanbul,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Lower {
            input,
            output,
            json,
            helpers,
            evm_version,
            verbose,
        } => {
            init_tracing(verbose);
            cmd_lower(input, output, json, helpers, evm_version, verbose)
        }
        Commands::Check {
            input,
            evm_version,
            verbose,
        } => {
            init_tracing(verbose);
            cmd_check(input, evm_version, verbose)
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_request(input: &Path, evm_version: Option<EvmVersion>) -> Result<LoweringRequest> {
    use anyhow::Context;
    use std::fs;

    let source = fs::read_to_string(input)
        .with_context(|| format!("Cannot read {}", input.display()))?;
    let mut request = LoweringRequest::from_json(&source)?;
    if let Some(version) = evm_version {
        request.config.evm_version = version.into();
    }
    Ok(request)
}

fn cmd_lower(
    input: PathBuf,
    output: Option<PathBuf>,
    json: bool,
    helpers: bool,
    evm_version: Option<EvmVersion>,
    verbose: bool,
) -> Result<()> {
    use colored::*;
    use std::fs;
    use std::io::IsTerminal;
    use std::time::Instant;
    use yulgen_emit::{Emitter, EmitterConfig, YulEmitter};

    if verbose {
        eprintln!("{}", " yulgen".bright_blue().bold());
        eprintln!("{}", "=".repeat(50).bright_blue());
        eprintln!(" Input: {}", input.display());
        if let Some(ref out) = output {
            eprintln!(" Output: {}", out.display());
        }
        eprintln!();
    }

    let start = Instant::now();
    let request = load_request(&input, evm_version)?;
    if verbose {
        eprintln!(
            " Lowering {} for {}...",
            request.function.name, request.config.evm_version
        );
    }
    let lowered = request.lower()?;

    let text = if json {
        serde_json::to_string_pretty(&lowered)?
    } else {
        let use_colors = output.is_none() && std::io::stdout().is_terminal();
        let emitter = YulEmitter::new(EmitterConfig {
            use_colors,
            ..EmitterConfig::default()
        });
        let mut text = String::new();
        if let Some(initializer) = &lowered.initializer {
            text.push_str(&emitter.emit_to_string(initializer)?);
        }
        text.push_str(&emitter.emit_to_string(&lowered.body)?);
        if helpers {
            text.push('\n');
            for helper in &lowered.helpers {
                text.push_str(&format!("// helper: {}\n", helper.name));
            }
            for function in &lowered.function_queue {
                text.push_str(&format!("// function: {}\n", function));
            }
        }
        text
    };

    if let Some(output_path) = output {
        fs::write(&output_path, &text)?;
        if verbose {
            eprintln!(
                "\n {} Lowering successful!",
                "SUCCESS:".bright_green().bold()
            );
            eprintln!("   Helpers: {}", lowered.helpers.len());
            eprintln!("   Time: {:.3}s", start.elapsed().as_secs_f64());
            eprintln!("   Output: {}", output_path.display());
        }
    } else {
        print!("{}", text);
        if json {
            println!();
        }
    }

    Ok(())
}

fn cmd_check(input: PathBuf, evm_version: Option<EvmVersion>, verbose: bool) -> Result<()> {
    use colored::*;

    let request = load_request(&input, evm_version)?;
    match request.lower() {
        Ok(lowered) => {
            println!("{}", " OK".bright_green().bold());
            if verbose {
                println!("   Function: {}", lowered.function);
                println!("   Statements: {}", lowered.body.statements.len());
                println!("   Helpers: {}", lowered.helpers.len());
                println!("   Queued functions: {}", lowered.function_queue.len());
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", " FAILED".bright_red().bold());
            let heading = match e.downcast_ref::<CodegenError>() {
                Some(err) if err.is_unimplemented() => "Unsupported construct:",
                Some(_) => "Internal error:",
                None => "Lowering Error:",
            };
            println!("\n{}", heading.bright_red());
            println!("{:#}", e);
            Err(anyhow::anyhow!("Lowering failed"))
        }
    }
}
