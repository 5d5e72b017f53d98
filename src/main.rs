//! typeahead CLI
//!
//! Drives the headless widget from the terminal: one-shot searches, an
//! interactive type-and-pick loop, and a dump of the markup it builds.

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{HumanDuration, ProgressBar};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use typeahead::config::{DEFAULT_MIN_CHARS, DEFAULT_QUERY_PARAM};
use typeahead::{
    logging, CatalogBackend, HttpBackend, NodeId, Page, PanelState, SearchBackend, WidgetConfig,
    WidgetId,
};

/// typeahead - headless type-ahead search widget
///
/// Debounces keystrokes, queries a search endpoint and renders the results
/// panel exactly as the widget would in a page.
#[derive(Parser)]
#[command(name = "typeahead")]
#[command(author = "Typeahead Contributors")]
#[command(version)]
#[command(about = "Type-ahead search against a JSON endpoint", long_about = None)]
struct Cli {
    /// Log level or filter directive (e.g. debug, typeahead=trace)
    #[arg(long, global = true, default_value = logging::DEFAULT_LEVEL)]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WidgetArgs {
    /// Search endpoint URL
    endpoint: String,

    /// Minimum query length that triggers a search
    #[arg(long, default_value_t = DEFAULT_MIN_CHARS)]
    min_chars: usize,

    /// Quiet period after the last keystroke, in milliseconds
    #[arg(long, default_value_t = 300)]
    debounce_ms: u64,

    /// Query parameter name
    #[arg(long, default_value = DEFAULT_QUERY_PARAM)]
    param: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Answer from a JSON catalog file instead of the endpoint
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Type a query and print the resulting panel
    Search {
        #[command(flatten)]
        widget: WidgetArgs,

        /// Query text (use -- before it if it starts with -)
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Print the panel markup
        #[arg(long, conflicts_with = "json")]
        html: bool,

        /// Print the panel state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Each stdin line becomes the input value; `:N` picks row N, `:q` quits
    Interactive {
        #[command(flatten)]
        widget: WidgetArgs,

        /// Open the selected result's URL in the browser
        #[arg(long)]
        open: bool,
    },

    /// Print the markup built around an input
    Markup,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level, cli.log_file.as_deref()) {
        eprintln!("{} {}", style("Warning:").yellow().bold(), e);
    }
    tracing::info!(version = typeahead::VERSION, "typeahead starting up");

    let result = match cli.command {
        Commands::Search {
            widget,
            query,
            html,
            json,
        } => cmd_search(&widget, &query, html, json),

        Commands::Interactive { widget, open } => cmd_interactive(&widget, open),

        Commands::Markup => cmd_markup(),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn backend(args: &WidgetArgs) -> typeahead::Result<Arc<dyn SearchBackend>> {
    let backend: Arc<dyn SearchBackend> = match &args.catalog {
        Some(path) => Arc::new(CatalogBackend::load(path)?),
        None => Arc::new(HttpBackend::new(Duration::from_secs(args.timeout_secs))),
    };
    Ok(backend)
}

fn config(args: &WidgetArgs) -> WidgetConfig {
    WidgetConfig::default()
        .with_min_chars(args.min_chars)
        .with_debounce(Duration::from_millis(args.debounce_ms))
        .with_query_param(args.param.clone())
}

/// A page holding a single input with a widget attached
fn scratch_page(
    backend: Arc<dyn SearchBackend>,
    endpoint: &str,
    config: WidgetConfig,
) -> typeahead::Result<(Page, NodeId, WidgetId)> {
    let mut page = Page::new(backend);
    let doc = page.document_mut();
    let body = doc.body();
    let form = doc.create_element("form");
    let input = doc.create_element("input");
    doc.append_child(body, form)?;
    doc.append_child(form, input)?;
    let widget = page.attach(input, endpoint, config)?;
    Ok((page, input, widget))
}

/// Sleep through the pending debounce, fire it and wait for the outcome
fn settle(page: &mut Page, timeout: Duration) -> typeahead::Result<()> {
    if let Some(deadline) = page.next_deadline() {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }
    if page.fire_due(Instant::now())? > 0 {
        page.wait_for_outcome(timeout)?;
    }
    Ok(())
}

fn print_panel(page: &Page, widget: WidgetId) -> typeahead::Result<()> {
    match page.state(widget)? {
        PanelState::Closed => println!("  {}", style("(closed)").dim()),
        PanelState::Loading => println!("  {}", style("Searching...").dim()),
        PanelState::Error => println!("  {}", style("Search failed").red()),
        PanelState::Empty { query } => {
            println!("  No results found for \"{}\"", style(query).yellow())
        }
        PanelState::Results { results, .. } => {
            for (i, result) in results.iter().enumerate() {
                println!(
                    "  {} {} {}",
                    style(format!("{:3}.", i + 1)).dim(),
                    style(&result.name).cyan(),
                    style(result.secondary_text()).dim()
                );
            }
        }
    }
    Ok(())
}

/// Zero-based row for a 1-based `:N` pick
fn parse_pick(pick: &str) -> Option<usize> {
    pick.trim().parse::<usize>().ok()?.checked_sub(1)
}

// ============================================================================
// Commands
// ============================================================================

/// One-shot search command
fn cmd_search(args: &WidgetArgs, query: &str, html: bool, json: bool) -> typeahead::Result<()> {
    let (mut page, input, widget) = scratch_page(backend(args)?, &args.endpoint, config(args))?;
    let timeout = Duration::from_secs(args.timeout_secs);
    let start = Instant::now();

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Searching for '{}'", query));
    spinner.enable_steady_tick(Duration::from_millis(80));

    page.type_into(input, query, Instant::now())?;
    settle(&mut page, timeout)?;
    spinner.finish_and_clear();

    let state = page.state(widget)?;
    if json {
        let results = match &state {
            PanelState::Results { results, .. } => results.clone(),
            _ => Vec::new(),
        };
        println!(
            "{}",
            serde_json::json!({
                "state": state.label(),
                "query": query.trim(),
                "results": results,
                "elapsed_seconds": start.elapsed().as_secs_f64(),
            })
        );
        return Ok(());
    }

    if html {
        let panel = page
            .widget(widget)
            .map(|w| w.scaffold().panel)
            .ok_or(typeahead::TypeaheadError::NoSuchWidget(widget))?;
        println!("{}", page.document().outer_html(panel));
        return Ok(());
    }

    println!(
        "{} {} in {}",
        style("→").cyan().bold(),
        style(state.label()).green(),
        style(HumanDuration(start.elapsed())).cyan()
    );
    println!();
    print_panel(&page, widget)
}

/// Interactive type-and-pick loop
fn cmd_interactive(args: &WidgetArgs, open_urls: bool) -> typeahead::Result<()> {
    let (mut page, input, widget) = scratch_page(backend(args)?, &args.endpoint, config(args))?;
    let timeout = Duration::from_secs(args.timeout_secs);

    println!(
        "{} Type to search {}, {} to pick a row, {} to quit",
        style("→").cyan().bold(),
        style(&args.endpoint).yellow(),
        style(":N").bold(),
        style(":q").bold()
    );

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", style("›").cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };

        match line.strip_prefix(':') {
            Some("q") => break,
            Some(pick) => {
                let Some(row) = parse_pick(pick) else {
                    println!("  {}", style("expected :N (N >= 1) or :q").red());
                    continue;
                };
                let before = page.document().location().map(str::to_string);
                page.click_result(widget, row)?;

                println!(
                    "  {} {}",
                    style("Input:").bold(),
                    page.document().value(input)?
                );
                let after = page.document().location().map(str::to_string);
                if let Some(url) = after.filter(|url| Some(url) != before.as_ref()) {
                    println!("  {} {}", style("Navigate:").bold(), style(&url).cyan());
                    if open_urls {
                        open::that(&url)?;
                    }
                }
            }
            None => {
                page.type_into(input, &line, Instant::now())?;
                settle(&mut page, timeout)?;
                print_panel(&page, widget)?;
            }
        }
    }

    Ok(())
}

/// Markup dump command
fn cmd_markup() -> typeahead::Result<()> {
    let (page, _, _) = scratch_page(
        Arc::new(CatalogBackend::default()),
        "/autocomplete/",
        WidgetConfig::default(),
    )?;
    let body = page.document().body();
    println!("{}", page.document().outer_html(body));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_are_one_based() {
        assert_eq!(parse_pick("1"), Some(0));
        assert_eq!(parse_pick(" 3 "), Some(2));
        assert_eq!(parse_pick("0"), None);
        assert_eq!(parse_pick("x"), None);
        assert_eq!(parse_pick("-1"), None);
    }
}
