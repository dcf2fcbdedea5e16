use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use visual_blocks::announce::ChannelAnnouncer;
use visual_blocks::block::{Block, BlockView};
use visual_blocks::carousel::GenerationState;
use visual_blocks::catalog::Catalog;
use visual_blocks::{config, output};

#[derive(Parser)]
#[command(name = "visual-blocks")]
#[command(about = "Turn text blocks into browsable generated illustrations")]
#[command(long_about = "\
Turn text blocks into browsable generated illustrations

Each block keeps its own history of generated images. Generating appends a
new image (different from the one on screen) after a simulated round trip;
the history can be browsed with wraparound, pruned, or overridden with a
manual pick from the catalog.

Simulate a session by listing actions in order:

  generate        generate one more image (waits for it to settle)
  convert         show the image region, generating the first image if needed
  visuals         toggle visual mode
  next | prev     browse the history
  delete          delete the displayed image
  select:N        display catalog entry N (0-based, see 'catalog')
  picker          open/close the catalog picker (prints the open page)
  page-next | page-prev
                  page through the picker (prints the page)
  pick:N          pick slot N on the current picker page
  bookmark        toggle the bookmark
  lightbox | close-lightbox
  download        request a download

Run 'visual-blocks gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file; repeat to layer several, later files win
    #[arg(long, global = true)]
    config: Vec<PathBuf>,

    /// Log state transitions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the image catalog by category
    Catalog,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Drive one block through a scripted session
    Simulate(SimulateArgs),
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// RNG seed, overriding [selector] seed from the config
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final state as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Actions to perform, in order
    #[arg(required = true)]
    actions: Vec<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Generate,
    Convert,
    Visuals,
    Next,
    Prev,
    Delete,
    Select(usize),
    Picker,
    PageNext,
    PagePrev,
    Pick(usize),
    Bookmark,
    Lightbox,
    CloseLightbox,
    Download,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = |arg: &str| {
            arg.parse::<usize>()
                .map_err(|_| format!("'{s}': expected a non-negative index after ':'"))
        };
        match s.split_once(':') {
            Some(("select", n)) => Ok(Action::Select(index(n)?)),
            Some(("pick", n)) => Ok(Action::Pick(index(n)?)),
            Some(_) => Err(format!("unknown action '{s}'")),
            None => match s {
                "generate" => Ok(Action::Generate),
                "convert" => Ok(Action::Convert),
                "visuals" => Ok(Action::Visuals),
                "next" => Ok(Action::Next),
                "prev" => Ok(Action::Prev),
                "delete" => Ok(Action::Delete),
                "picker" => Ok(Action::Picker),
                "page-next" => Ok(Action::PageNext),
                "page-prev" => Ok(Action::PagePrev),
                "bookmark" => Ok(Action::Bookmark),
                "lightbox" => Ok(Action::Lightbox),
                "close-lightbox" => Ok(Action::CloseLightbox),
                "download" => Ok(Action::Download),
                _ => Err(format!("unknown action '{s}'")),
            },
        }
    }
}

#[derive(Serialize)]
struct Report {
    view: BlockView,
    state: GenerationState,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut widget_config = config::load_config(&cli.config)?;
    let catalog = match &widget_config.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin(),
    };
    let catalog = Arc::new(catalog);

    match cli.command {
        Command::Catalog => {
            output::print_catalog(&catalog);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Simulate(args) => {
            if args.seed.is_some() {
                widget_config.selector.seed = args.seed;
            }
            let report = simulate(&widget_config, catalog, &args.actions).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!();
                output::print_state(&report.state, Some(&report.view));
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Run `actions` against a fresh block, printing announcements as they happen.
///
/// Each action that starts a generation waits for it to settle before the
/// next action runs.
async fn simulate(
    widget_config: &config::WidgetConfig,
    catalog: Arc<Catalog>,
    actions: &[Action],
) -> Result<Report, Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel::<String>();
    let printer = std::thread::spawn(move || {
        for message in rx {
            println!("{}", output::format_announcement(&message));
        }
    });

    let mut block = Block::from_config(
        widget_config,
        Arc::clone(&catalog),
        Arc::new(ChannelAnnouncer::new(tx)),
    );

    for action in actions {
        tracing::info!(?action, "applying action");
        match *action {
            Action::Generate => block.regenerate(),
            Action::Convert => block.convert_to_image(),
            Action::Visuals => block.toggle_visual_mode(),
            Action::Next => block.next_image(),
            Action::Prev => block.prev_image(),
            Action::Delete => block.delete_image(),
            Action::Select(index) => {
                let entry = catalog
                    .get(index)
                    .ok_or_else(|| format!("select:{index}: catalog has {} entries", catalog.len()))?;
                block.pipeline().select_image(&entry.source, &entry.label);
            }
            Action::Picker => block.toggle_picker(),
            Action::PageNext => block.pager_mut().next(),
            Action::PagePrev => block.pager_mut().prev(),
            Action::Pick(slot) => {
                if !block.pick(slot) {
                    return Err(format!("pick:{slot}: no entry in that slot").into());
                }
            }
            Action::Bookmark => block.toggle_bookmark(),
            Action::Lightbox => {
                if !block.open_lightbox() {
                    tracing::warn!("lightbox needs a settled image");
                }
            }
            Action::CloseLightbox => block.close_lightbox(),
            Action::Download => block.request_download(),
        }
        block.pipeline_mut().settle().await;
        let pages_picker = matches!(
            action,
            Action::Picker | Action::PageNext | Action::PagePrev
        );
        if pages_picker && block.view().picker_open {
            output::print_picker_page(block.pager(), block.catalog());
        }
    }

    let report = Report {
        view: block.view(),
        state: block.images(),
    };
    // Dropping the block closes the announcement channel.
    drop(block);
    printer
        .join()
        .map_err(|_| "announcement printer panicked")?;
    Ok(report)
}
