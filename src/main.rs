//! Layout Builder CLI
//!
//! Replays a scripted editing session and prints what happened.
//!
//! Usage:
//!   layout-builder [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Editor configuration (TOML format)
//!   -p, --palette        List the registered component variants
//!   -v, --verbose        Log placement decisions to stderr
//!   -h, --help           Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use layout_builder::{render_outline, Editor, EditorConfig, Scenario};

#[derive(Parser)]
#[command(name = "layout-builder")]
#[command(about = "Replay drag-and-drop editing sessions against the layout builder")]
struct Cli {
    /// Scenario file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Editor configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List the registered component variants
    #[arg(short, long)]
    palette: bool,

    /// Log placement decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => match EditorConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EditorConfig::default(),
    };

    let mut editor = Editor::new(config);

    if cli.palette {
        print_palette(&editor);
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let scenario = match Scenario::from_str(&source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match scenario.run(&mut editor) {
        Ok(lines) => {
            for (i, line) in lines.iter().enumerate() {
                println!("{:>3}. {}", i + 1, line);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    match editor.empty_hint() {
        Some(hint) => println!("{}", hint),
        None => print!("{}", render_outline(editor.tree(), editor.selected_node())),
    }

    if let Err(e) = editor.tree().check_integrity() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_palette(editor: &Editor) {
    for variant in editor.factory().registered_variants() {
        let accepts = if variant.is_drop_container() { "accepts drops" } else { "" };
        println!("{:<12} {:<10} {}", variant.as_str(), variant.kind().to_string(), accepts);
    }
}

fn print_intro() {
    println!(
        r#"Layout Builder - drag-and-drop placement engine

USAGE:
    layout-builder [OPTIONS] [FILE]
    cat session.toml | layout-builder

OPTIONS:
    -c, --config     Editor configuration (TOML file)
    -p, --palette    List the registered component variants
    -v, --verbose    Log placement decisions to stderr
    -h, --help       Print help

QUICK START:
    [[steps]]
    action = "drop"
    variant = "form"
    as = "signup"

    [[steps]]
    action = "drop"
    variant = "input"
    into = "signup"

Each step prints one line; the final document outline follows."#
    );
}
