//! CLI module for Surveyor

mod args;

pub use args::{Args, Command};

use crate::diagnostics::{Diagnostics, StderrSink};
use crate::error::{Error, Result};
use crate::expand::{Element, Expander};
use crate::scan::{Annotation, Scanner};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Expand {
            path,
            format,
            exclude,
            verbose,
        } => expand(&path, &format, &exclude, verbose),
        Command::Check { path, exclude } => check(&path, &exclude),
    }
}

fn expand(path: &Path, format: &str, exclude: &[String], verbose: bool) -> Result<()> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }

    let scanner = Scanner::new(exclude)?;
    let files = scanner.discover_files(path)?;

    if verbose {
        println!("Scanning {} source files", files.len());
    }

    let progress = if verbose {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut expander = Expander::new();
    let mut sink = Diagnostics::new();
    let mut expanded: Vec<(Annotation, Vec<Element>)> = Vec::new();

    for file in &files {
        if let Some(ref pb) = progress {
            let msg = file
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            pb.set_message(msg);
            pb.inc(1);
        }

        for annotation in scanner.scan_file(file)? {
            let elements = expander.expand(&annotation.content, &annotation.file, &mut sink);
            expanded.push((annotation, elements));
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("Scan complete");
    }

    match format {
        "json" => {
            let rows: Vec<serde_json::Value> = expanded
                .iter()
                .map(|(annotation, elements)| {
                    serde_json::json!({
                        "file": annotation.file,
                        "line": annotation.line,
                        "annotation": annotation.content,
                        "elements": elements,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            for (_, elements) in &expanded {
                for element in elements {
                    print!("{}", element.source);
                }
            }
        }
    }

    for warning in sink.warnings() {
        eprintln!("warning: {}", warning);
    }

    if verbose {
        let element_count: usize = expanded.iter().map(|(_, e)| e.len()).sum();
        println!(
            "Expanded {} annotations into {} elements ({} warnings)",
            expanded.len(),
            element_count,
            sink.len()
        );
    }

    Ok(())
}

fn check(path: &Path, exclude: &[String]) -> Result<()> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }

    let scanner = Scanner::new(exclude)?;
    let annotations = scanner.scan(path)?;

    let mut expander = Expander::new();
    let mut sink = StderrSink::new();
    let mut element_count = 0usize;

    for annotation in &annotations {
        element_count += expander
            .expand(&annotation.content, &annotation.file, &mut sink)
            .len();
    }

    println!(
        "Checked {} annotations, {} elements generated",
        annotations.len(),
        element_count
    );

    if sink.count() > 0 {
        return Err(Error::other(format!("{} warning(s) recorded", sink.count())));
    }
    Ok(())
}
