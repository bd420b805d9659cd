use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pg_keen::PgKeenError;
use pg_keen::parameterize::{MissingParamPolicy, extract};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rewrite :name SQL templates into positional form")]
struct Args {
    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the positional text and the placeholder names of a template.
    Extract {
        /// Template file, or `-` for stdin.
        file: PathBuf,
    },
    /// Bind a template against a JSON parameter bag.
    Bind {
        /// Template file, or `-` for stdin.
        file: PathBuf,
        #[arg(long, default_value = "{}")]
        params: String,
        /// What to do with names the parameters do not resolve.
        #[arg(long, value_enum, default_value_t = MissingParamPolicy::PassThrough)]
        missing: MissingParamPolicy,
        /// Shorthand for `--missing strict`.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Serialize)]
struct BindOutput {
    text: String,
    values: Vec<JsonValue>,
}

fn read_template(file: &Path) -> Result<String, PgKeenError> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

fn run(command: Command) -> Result<String, PgKeenError> {
    match command {
        Command::Extract { file } => {
            let template = read_template(&file)?;
            Ok(serde_json::to_string_pretty(&extract(&template))?)
        }
        Command::Bind {
            file,
            params,
            missing,
            strict,
        } => {
            let template = read_template(&file)?;
            let params: JsonValue = serde_json::from_str(&params)?;
            let policy = if strict {
                MissingParamPolicy::Strict
            } else {
                missing
            };
            let extracted = extract(&template);
            tracing::debug!(names = ?extracted.names, "extracted");
            let bound = extracted.bind_with(&params, policy)?;
            let output = BindOutput {
                text: bound.text,
                values: bound.values.iter().map(|v| v.to_json()).collect(),
            };
            Ok(serde_json::to_string_pretty(&output)?)
        }
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match run(args.command) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
