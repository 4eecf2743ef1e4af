//! formdata - multipart/form-data command-line tool
//!
//! Builds multipart bodies from fields and files, and decodes bodies back into
//! their parts.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::EncodeRequest;
use config::{Config, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formdata")]
#[command(about = "Encode and decode multipart/form-data bodies")]
#[command(version)]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, env = "FORMDATA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode fields and files into a multipart body
    Encode {
        /// Text field
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// File field
        #[arg(short = 'F', long = "file", value_name = "NAME=@PATH[;type=MIME]")]
        files: Vec<String>,

        /// JSON field (inline JSON or @file.json)
        #[arg(short = 'j', long = "json", value_name = "NAME=JSON")]
        json: Vec<String>,

        /// URL-encoded parameter field
        #[arg(short = 'p', long = "params", value_name = "NAME=QUERY")]
        params: Vec<String>,

        /// Write the body here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use a fixed boundary
        #[arg(long)]
        boundary: Option<String>,
    },

    /// Decode a multipart body and list its parts
    Decode {
        /// Content-Type header value carrying the boundary
        #[arg(short = 't', long, env = "FORMDATA_CONTENT_TYPE")]
        content_type: String,

        /// Body file (stdin if omitted or "-")
        input: Option<PathBuf>,

        /// Print parts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a freshly generated boundary
    Boundary,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let result: Result<Option<String>, Box<dyn std::error::Error>> = match cli.command {
        Commands::Encode {
            fields,
            files,
            json,
            params,
            output,
            boundary,
        } => {
            let request = EncodeRequest {
                fields,
                files,
                json,
                params,
                boundary,
            };
            commands::encode(&request, output.as_deref(), &config).map(|content_type| {
                eprintln!("Content-Type: {}", content_type);
                None
            })
        }
        Commands::Decode {
            content_type,
            input,
            json,
        } => {
            let format = if json {
                OutputFormat::Json
            } else {
                config.output.format
            };
            commands::decode(input.as_deref(), &content_type, format, &config).map(Some)
        }
        Commands::Boundary => Ok(Some(formdata_codec::boundary::generate())),
        Commands::Config => config.to_yaml().map(Some).map_err(Into::into),
    };

    match result {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => {}
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
