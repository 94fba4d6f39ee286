//! Interactive REPL for the analysis router.
//!
//! Launch with `analysis-router-mcp repl` to try queries against a registry.
//! Type `/help` for available commands, Tab for completion.

use std::path::PathBuf;
use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use analysis_router::{
    classify, compute_breaks, legend, parse_dataset, AnalysisRouter, NormalizedBatch,
    RoutingResult, DEFAULT_BUCKET_COUNT,
};

use crate::config::{load_registry, RegistrySource, ServerConfig};
use crate::session::DirectoryFetcher;
use crate::tools::ToolRegistry;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/info", "Show server capabilities and tools"),
    ("/tools", "List available MCP tools"),
    ("/endpoints", "List registered endpoints"),
    ("/route", "Route a query (plain text also routes)"),
    ("/xref", "Cross-references from the current endpoint"),
    ("/use", "Set the current endpoint"),
    ("/fetch", "Fetch and normalize an endpoint from the data dir"),
    ("/normalize", "Normalize a dataset file: /normalize <endpoint> <file.json>"),
    ("/breaks", "Quantile breaks for numbers: /breaks 1 2 3 4"),
    ("/validate", "Validate a registry file"),
    ("/load", "Load a registry file"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// Commands whose first argument is an endpoint id.
const ENDPOINT_COMMANDS: &[&str] = &["/use", "/fetch", "/normalize"];

/// REPL helper for tab completion.
#[derive(Default)]
struct RouterHelper {
    endpoints: Vec<String>,
}

fn json_files_in_cwd() -> Vec<String> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(".") {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
    }
    files.sort();
    files
}

impl Completer for RouterHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let word_start = input.rfind(' ').map_or(0, |i| i + 1);
        let word = &input[word_start..];
        let first_arg = !args.trim_start().contains(' ');

        let candidates: Vec<String> = if ENDPOINT_COMMANDS.contains(&cmd) && first_arg {
            self.endpoints.clone()
        } else if cmd == "/load" || cmd == "/validate" || cmd == "/normalize" {
            json_files_in_cwd()
        } else {
            Vec::new()
        };

        let matches = candidates
            .into_iter()
            .filter(|c| c.starts_with(word))
            .map(|c| Pair {
                display: c.clone(),
                replacement: format!("{c} "),
            })
            .collect();
        Ok((word_start, matches))
    }
}

impl Hinter for RouterHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for RouterHelper {}
impl Validator for RouterHelper {}
impl Helper for RouterHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Session state.
struct ReplState {
    router: AnalysisRouter,
    source: RegistrySource,
    data_dir: Option<PathBuf>,
    current: Option<String>,
}

impl ReplState {
    fn endpoint_ids(&self) -> Vec<String> {
        self.router.registry().ids().map(str::to_string).collect()
    }
}

/// Run the interactive REPL.
pub fn run(config: ServerConfig) -> anyhow::Result<()> {
    let registry = load_registry(&config.registry)?;
    let mut state = ReplState {
        router: AnalysisRouter::new(Arc::new(registry)),
        source: config.registry,
        data_dir: config.data_dir,
        current: None,
    };

    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1manalysis-router-mcp v{}\x1b[0m \x1b[90m({} endpoints from {})\x1b[0m",
        env!("CARGO_PKG_VERSION"),
        state.router.registry().len(),
        state.source
    );
    eprintln!();
    eprintln!(
        "    Type a query to route it, \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(30)
        .build();

    let mut rl: Editor<RouterHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(RouterHelper {
        endpoints: state.endpoint_ids(),
    }));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = PathBuf::from(&home).join(".analysis_router_mcp_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    loop {
        let prompt = match &state.current {
            Some(current) => format!(" \x1b[36mroute\x1b[0m \x1b[90m[{current}]\x1b[0m> "),
            None => " \x1b[36mroute>\x1b[0m ".to_string(),
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let Some(input) = line.strip_prefix('/') else {
                    cmd_route(line, &state);
                    continue;
                };
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "info" => cmd_info(&state),
                    "tools" => cmd_tools(),
                    "endpoints" => cmd_endpoints(&state),
                    "route" => cmd_route(args, &state),
                    "xref" => cmd_xref(args, &state),
                    "use" => cmd_use(args, &mut state),
                    "fetch" => cmd_fetch(args, &mut state),
                    "normalize" => cmd_normalize(args, &state),
                    "breaks" => cmd_breaks(args),
                    "validate" => cmd_validate(args, &state),
                    "load" => {
                        cmd_load(args, &mut state);
                        if let Some(helper) = rl.helper_mut() {
                            helper.endpoints = state.endpoint_ids();
                        }
                    }
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(std::path::Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completes commands, endpoint ids and .json files.");
    eprintln!();
}

fn cmd_info(state: &ReplState) {
    let capabilities = crate::types::InitializeResult::default_result();
    let tools = ToolRegistry::list_tools();
    let registry = state.router.registry();
    eprintln!();
    eprintln!(
        "  Server:    {} v{}",
        capabilities.server_info.name, capabilities.server_info.version
    );
    eprintln!("  Protocol:  {}", capabilities.protocol_version);
    eprintln!("  Tools:     {}", tools.len());
    eprintln!("  Registry:  {} ({} endpoints)", state.source, registry.len());
    eprintln!("  Default:   {}", registry.default_endpoint());
    match &state.data_dir {
        Some(dir) => eprintln!("  Data dir:  {}", dir.display()),
        None => eprintln!("  Data dir:  (none)"),
    }
    eprintln!();
}

fn cmd_tools() {
    let tools = ToolRegistry::list_tools();
    eprintln!();
    eprintln!("  {} MCP tools available:", tools.len());
    eprintln!();
    for tool in &tools {
        eprintln!(
            "    {:<28} {}",
            tool.name,
            tool.description.as_deref().unwrap_or("")
        );
    }
    eprintln!();
}

fn cmd_endpoints(state: &ReplState) {
    let registry = state.router.registry();
    eprintln!();
    for sig in registry.all() {
        let marker = if sig.endpoint_id == registry.default_endpoint() {
            "*"
        } else {
            " "
        };
        eprintln!(
            "  {marker} {:<28} {:<7} {}",
            sig.endpoint_id,
            sig.priority.as_str(),
            sig.target_variable_name
        );
    }
    eprintln!();
}

fn print_routing(result: &RoutingResult) {
    eprintln!();
    if result.fallback {
        eprintln!("  No signals matched; falling back to '{}'", result.best_endpoint);
    } else {
        eprintln!("  Best endpoint: \x1b[1m{}\x1b[0m", result.best_endpoint);
    }
    for ranked in result.ranked_endpoints.iter().filter(|r| r.score > 0).take(5) {
        eprintln!(
            "    {:<28} {:>6}  {}",
            ranked.endpoint_id,
            ranked.score,
            ranked.matched_signals.join(", ")
        );
    }
    for xref in &result.cross_references {
        eprintln!(
            "    xref {:<23} fetch={:<5} {}",
            xref.endpoint_id, xref.should_fetch, xref.reason
        );
    }
    eprintln!();
}

fn cmd_route(args: &str, state: &ReplState) {
    if args.is_empty() {
        eprintln!("  Usage: /route <query>");
        return;
    }
    let result = state.router.route(args, state.current.as_deref());
    print_routing(&result);
}

fn cmd_xref(args: &str, state: &ReplState) {
    let Some(current) = &state.current else {
        eprintln!("  No current endpoint. Use /use <endpoint> first.");
        return;
    };
    let xrefs = state.router.detect_cross_references(args, current);
    if xrefs.is_empty() {
        eprintln!("  No cross-references from '{current}'.");
        return;
    }
    eprintln!();
    for xref in &xrefs {
        eprintln!(
            "    {:<28} fetch={:<5} {}",
            xref.endpoint_id, xref.should_fetch, xref.reason
        );
    }
    eprintln!();
}

fn cmd_use(args: &str, state: &mut ReplState) {
    if args.is_empty() {
        state.current = None;
        eprintln!("  Cleared current endpoint.");
        return;
    }
    match state.router.registry().lookup(args) {
        Ok(_) => {
            state.current = Some(args.to_string());
            eprintln!("  Current endpoint: {args}");
        }
        Err(e) => eprintln!("  {e}"),
    }
}

fn print_batch(batch: &NormalizedBatch) {
    let values: Vec<f64> = batch.points.iter().map(|p| p.value).collect();
    eprintln!();
    eprintln!(
        "  {} records for '{}' ({} flagged), target '{}'",
        batch.len(),
        batch.endpoint_id,
        batch.flagged_records,
        batch.target_variable
    );
    for entry in legend(&batch.breaks, &values, batch.bucket_count) {
        eprintln!("    bucket {}: {:<24} {} areas", entry.bucket, entry.label, entry.count);
    }
    for point in batch.top(5) {
        eprintln!(
            "    #{:<3} {:<32} {:.2}",
            point.rank, point.area_name, point.value
        );
    }
    eprintln!();
}

fn cmd_fetch(args: &str, state: &mut ReplState) {
    if args.is_empty() {
        eprintln!("  Usage: /fetch <endpoint>");
        return;
    }
    let Some(dir) = &state.data_dir else {
        eprintln!("  No data directory configured. Pass --data-dir.");
        return;
    };
    let fetcher = DirectoryFetcher::new(dir);
    match state.router.fetch_and_normalize(&fetcher, args) {
        Ok(batch) => {
            print_batch(&batch);
            state.current = Some(args.to_string());
        }
        Err(e) => eprintln!("  {e}"),
    }
}

fn cmd_normalize(args: &str, state: &ReplState) {
    let mut parts = args.split_whitespace();
    let (Some(endpoint), Some(path)) = (parts.next(), parts.next()) else {
        eprintln!("  Usage: /normalize <endpoint> <file.json>");
        return;
    };

    let records = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| parse_dataset(endpoint, &text).map_err(|e| e.to_string()));
    match records {
        Ok(records) => match state.router.normalize_endpoint_data(endpoint, &records) {
            Ok(batch) => print_batch(&batch),
            Err(e) => eprintln!("  {e}"),
        },
        Err(e) => eprintln!("  Cannot read {path}: {e}"),
    }
}

fn cmd_breaks(args: &str) {
    let values: Result<Vec<f64>, _> = args
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect();
    let values = match values {
        Ok(v) => v,
        Err(e) => {
            eprintln!("  Not a number list: {e}");
            return;
        }
    };

    let breaks = compute_breaks(&values);
    let categories: Vec<usize> = values
        .iter()
        .map(|v| classify(*v, &breaks, DEFAULT_BUCKET_COUNT))
        .collect();
    eprintln!();
    eprintln!("  Breaks:     {:?}", breaks.as_slice());
    eprintln!("  Categories: {categories:?}");
    eprintln!();
}

fn resolve_path(args: &str, state: &ReplState) -> RegistrySource {
    match args.split_whitespace().next() {
        Some(path) => RegistrySource::File(PathBuf::from(path)),
        None => state.source.clone(),
    }
}

fn cmd_validate(args: &str, state: &ReplState) {
    let source = resolve_path(args, state);
    match load_registry(&source) {
        Ok(registry) => {
            eprintln!();
            eprintln!("  Valid endpoint registry: {source}");
            eprintln!("    Endpoints: {}", registry.len());
            eprintln!("    Default:   {}", registry.default_endpoint());
            eprintln!();
        }
        Err(e) => {
            eprintln!("  Invalid endpoint registry: {e}");
        }
    }
}

fn cmd_load(args: &str, state: &mut ReplState) {
    if args.is_empty() {
        eprintln!("  Usage: /load <endpoints.json>");
        return;
    }
    let source = resolve_path(args, state);
    match load_registry(&source) {
        Ok(registry) => {
            eprintln!("  Loaded: {source} ({} endpoints)", registry.len());
            state.router = AnalysisRouter::new(Arc::new(registry));
            state.source = source;
            state.current = None;
        }
        Err(e) => {
            eprintln!("  Failed to load: {e}");
        }
    }
}
