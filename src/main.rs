//! flowpages CLI - paginate an HTML document with the simulated layout host

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use flowpages::{
    Geometry, LayoutParams, LeafIndex, Pages, PagesConfig, Position, SettleReport, SimulatedHost,
    Viewport,
};

#[derive(Parser)]
#[command(name = "flowpages")]
#[command(version)]
#[command(about = "Paginate HTML into columns and track reading positions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a document and print its pages with the position at the top of each
    Paginate {
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Change the layout while reading and show where the reader lands
    Relayout {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Page to read from before the change
        #[arg(long, default_value = "0")]
        page: usize,

        /// New font size in px
        #[arg(long)]
        new_font_size: Option<u32>,

        /// New column count
        #[arg(long)]
        new_columns: Option<u32>,

        /// New margin in px
        #[arg(long)]
        new_margin: Option<u32>,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// Input HTML file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// JSON session configuration; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    margin: Option<u32>,

    #[arg(long)]
    columns: Option<u32>,

    #[arg(long)]
    font_size: Option<u32>,

    /// Polls during which the simulated host is still reflowing
    #[arg(long, default_value = "0")]
    reflow_polls: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageEntry {
    page: usize,
    position: Option<Position>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaginateOutput {
    viewport: Viewport,
    layout: LayoutParams,
    geometry: Geometry,
    page_count: usize,
    pages: Vec<PageEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayoutOutput {
    before_page: usize,
    position: Position,
    layout: LayoutParams,
    page_count: usize,
    report: Option<SettleReport>,
    restored_position: Option<Position>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Paginate { layout } => {
            let mut pages = open(&layout)?;
            pages.run_until_settled();

            let mut entries = Vec::with_capacity(pages.page_count());
            for page in 0..pages.page_count() {
                pages.go_to_page(page);
                entries.push(PageEntry {
                    page: pages.page_index(),
                    position: pages.position().ok(),
                });
            }

            print_json(&PaginateOutput {
                viewport: pages.viewport(),
                layout: pages.params().clone(),
                geometry: *pages.geometry(),
                page_count: pages.page_count(),
                pages: entries,
            })
        }
        Commands::Relayout {
            layout,
            page,
            new_font_size,
            new_columns,
            new_margin,
        } => {
            let mut pages = open(&layout)?;
            pages.run_until_settled();
            if page > pages.last_page() {
                bail!(
                    "page {} is past the last page ({})",
                    page,
                    pages.last_page()
                );
            }
            let before_page = pages.go_to_page(page);
            let position = pages
                .position()
                .with_context(|| format!("no reading position on page {}", before_page))?;

            // each change settles before the next so every restore sees the
            // previous one's position
            let mut report = None;
            if let Some(size) = new_font_size {
                pages.set_font_size(size)?;
                report = pages.run_until_settled();
            }
            if let Some(columns) = new_columns {
                pages.set_columns(columns)?;
                report = pages.run_until_settled();
            }
            if let Some(margin) = new_margin {
                pages.set_margin(margin)?;
                report = pages.run_until_settled();
            }

            print_json(&RelayoutOutput {
                before_page,
                position,
                layout: pages.params().clone(),
                page_count: pages.page_count(),
                report,
                restored_position: pages.position().ok(),
            })
        }
    }
}

fn open(args: &LayoutArgs) -> anyhow::Result<Pages<SimulatedHost>> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            PagesConfig::from_json(&json)?
        }
        None => PagesConfig::default(),
    };
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }
    if let Some(margin) = args.margin {
        config.layout.margin = margin;
    }
    if let Some(columns) = args.columns {
        config.layout.columns = columns;
    }
    if let Some(font_size) = args.font_size {
        config.layout.font_size = font_size;
    }

    let index = load_document(&args.input)?;
    log::info!(
        "{}: {} text leaves, {} images",
        args.input.display(),
        index.text_count(),
        index.image_count()
    );
    let host = SimulatedHost::new(&index).with_reflow_polls(args.reflow_polls);
    Ok(Pages::new(host, index, config)?)
}

fn load_document(path: &Path) -> anyhow::Result<LeafIndex> {
    let html = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    Ok(LeafIndex::parse_html(&html))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
