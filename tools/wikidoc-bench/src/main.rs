use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use wikidoc_config::{Config, LoadOptions};
use wikidoc_edit_core::{
    apply_edit, ContentSource, EditOptions, EditRequest, Operation, SectionQuery,
};
use wikidoc_format::Renderer;
use wikidoc_model::{Block, Document, InlineSpan, ListItem, Row, Table};

#[derive(Parser)]
#[command(author, version, about = "Benchmark harness for wikidoc parse, format and edit")]
struct Args {
    /// Number of synthetic sections in the benchmark page
    #[arg(long, default_value_t = 200)]
    sections: usize,

    /// Paragraphs per section
    #[arg(long, default_value_t = 5)]
    paragraphs: usize,

    /// Explicit configuration file layered over the discovered ones
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of warm-up iterations (not counted in results)
    #[arg(long, default_value_t = 1)]
    warmup: usize,

    /// Number of measured iterations
    #[arg(long, default_value_t = 3)]
    iterations: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
    let args = Args::parse();
    if args.iterations == 0 {
        anyhow::bail!("--iterations must be at least 1");
    }

    let mut load = LoadOptions::default();
    if let Some(path) = &args.config {
        load = load.with_override_path(path);
    }
    let config = Config::load(load).context("failed to load configuration")?;
    let renderer = Renderer::from_config(&config);
    let options = EditOptions::from_config(&config);

    let document = synthesize(args.sections, args.paragraphs)?;
    let markup = renderer.render_document(&document);
    info!(
        "synthesized {} top-level blocks ({} bytes of markup)",
        document.len(),
        markup.len()
    );

    let parse_result = benchmark("parse", args.warmup, args.iterations, || {
        wikidoc_parser::parse(&markup)?;
        Ok(())
    })?;

    let format_result = benchmark("format", args.warmup, args.iterations, || {
        renderer.render_document(&document);
        Ok(())
    })?;

    let middle = format!("Section {}", args.sections / 2);
    let edit_result = benchmark("replace-section", args.warmup, args.iterations, || {
        let request = EditRequest::new(
            markup.clone(),
            Operation::ReplaceSection {
                query: SectionQuery::new(middle.as_str()),
                content: ContentSource::Markup("<p>Replaced body.</p>".into()),
            },
        )
        .with_options(options.clone());
        apply_edit(request)?;
        Ok(())
    })?;

    print_summary(&[parse_result, format_result, edit_result]);
    Ok(())
}

/// A page of `sections` h2 sections, each holding paragraphs, a list and a
/// small table.
fn synthesize(sections: usize, paragraphs: usize) -> Result<Document> {
    let mut document = Document::new();
    for section in 0..sections {
        document.push(Block::heading(2, format!("Section {section}"))?);
        for paragraph in 0..paragraphs {
            document.push(Block::paragraph(vec![
                InlineSpan::text(format!("Paragraph {paragraph} of section {section} with ")),
                InlineSpan::bold("bold"),
                InlineSpan::text(" and "),
                InlineSpan::code("code"),
                InlineSpan::text("."),
            ]));
        }
        document.push(Block::list(
            false,
            vec![ListItem::text("first"), ListItem::text("second")],
        ));
        document.push(
            Table::new(["Key", "Value"])
                .with_rows(vec![Row::from_texts(["a", "1"]), Row::from_texts(["b", "2"])])
                .into(),
        );
    }
    Ok(document)
}

struct BenchResult {
    name: String,
    iterations: usize,
    average: Duration,
    median: Duration,
}

fn benchmark<F>(name: &str, warmup: usize, iterations: usize, mut f: F) -> Result<BenchResult>
where
    F: FnMut() -> Result<()>,
{
    for _ in 0..warmup {
        f()?;
    }

    let mut samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        f()?;
        samples.push(start.elapsed());
    }

    samples.sort();
    let total = samples
        .iter()
        .copied()
        .fold(Duration::ZERO, |acc, sample| acc + sample);
    let average = total / (iterations as u32);
    let median = samples[samples.len() / 2];

    Ok(BenchResult {
        name: name.to_string(),
        iterations,
        average,
        median,
    })
}

fn print_summary(results: &[BenchResult]) {
    println!("wikidoc benchmark results:\n");
    for result in results {
        println!(
            "- {}: avg {:?} (median {:?}) over {} iterations",
            result.name, result.average, result.median, result.iterations
        );
    }
}
