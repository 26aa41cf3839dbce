use clap::Parser;
use folio::{DocumentSpec, Pipeline, PipelineError};
use log::warn;
use std::fs;
use std::path::PathBuf;

/// Breaks a JSON document into lines and pages and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(version, about = "Optimal line and page breaking for JSON documents")]
struct Args {
    /// Path to the document description
    input: PathBuf,

    /// Write the layout here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run page sequences in parallel, overriding the document setting
    #[arg(short, long)]
    parallel: bool,

    /// Print a one-line summary per page sequence instead of the full layout
    #[arg(short, long)]
    summary: bool,
}

fn main() -> Result<(), PipelineError> {
    env_logger::init();
    let args = Args::parse();

    let mut doc = DocumentSpec::from_json(&fs::read_to_string(&args.input)?)?;
    if args.parallel {
        doc.config.parallel = true;
    }
    let layout = Pipeline::for_document(&doc).run(&doc)?;
    for warning in layout.warnings() {
        warn!("{}", warning);
    }

    let rendered = if args.summary {
        layout
            .sequences
            .iter()
            .map(|s| {
                format!(
                    "{}: {} page(s), {} paragraph(s), demerits {:.1}",
                    s.name,
                    s.page_count(),
                    s.paragraphs.len(),
                    s.pages.demerits
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        serde_json::to_string_pretty(&layout)?
    };

    match args.output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }
    Ok(())
}
