use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{command_arsc, command_axml, command_extract, command_show};

mod commands;

#[derive(Parser)]
#[command(version, about, arg_required_else_help(true))]
struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Batch-scan a directory for .apk files and print package name / min SDK
    Show {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Pretty-print the decoded AndroidManifest.xml of a single file
    Axml {
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Print the package name resolved through the resource table
    Arsc {
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Unzip an APK to disk
    Extract {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.commands {
        Some(Commands::Show { paths }) => command_show(paths),
        Some(Commands::Axml { path }) => command_axml(path),
        Some(Commands::Arsc { path }) => command_arsc(path),
        Some(Commands::Extract { paths, output }) => command_extract(paths, output),
        None => Ok(()),
    };

    if let Err(err) = result {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
