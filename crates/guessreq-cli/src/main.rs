use std::env;
use std::io;
use std::rc::Rc;

use atty::Stream;
use clap::Parser;
use color_eyre::Result;
use guessreq_core::{
    guess_requirements, AutoConfirm, CommandContext, CommandStatus, Config, ExecutionOutcome,
    GuessRequest, LinePrompter, Prompter, SystemEffects, TerminalPrompter,
};
use serde_json::{json, Value};

mod cli;
mod style;

use cli::GuessCli;
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = GuessCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let request = build_request(&cli)?;
    tracing::info!(
        project = %request.project_root.display(),
        "guessing package versions from git history"
    );
    let outcome = execute(&cli, &request).unwrap_or_else(|err| {
        tracing::debug!(error = ?err, "guess failed");
        ExecutionOutcome::failure(format!("{err:#}"), Value::Null)
    });
    let code = emit_output(&cli, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("guessreq_cli={level},guessreq_core={level},guessreq_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_request(cli: &GuessCli) -> Result<GuessRequest> {
    let cwd = env::current_dir()?;
    let project_root = match &cli.project {
        Some(path) => cwd.join(path),
        None => cwd,
    };
    let force_guess = cli
        .force_guess
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    Ok(GuessRequest {
        project_root,
        requirements: cli.requirements.clone(),
        write: cli.write.clone(),
        force_guess,
        keep_unused_packages: cli.keep_unused_packages,
        include_prereleases: cli.include_prereleases,
        latest_addition: cli.latest_addition,
        refresh_mapping: cli.refresh_mapping,
    })
}

fn execute(cli: &GuessCli, request: &GuessRequest) -> anyhow::Result<ExecutionOutcome> {
    let config = Config::from_env()?;
    let effects = Rc::new(SystemEffects::new(&config, build_prompter(cli.yes))?);
    let ctx = CommandContext::new(config, effects);
    guess_requirements(&ctx, request)
}

/// Terminal menus when attached to a tty, numbered line prompts otherwise.
fn build_prompter(assume_yes: bool) -> Rc<dyn Prompter> {
    let interactive = atty::is(Stream::Stdin) && atty::is(Stream::Stderr);
    match (interactive, assume_yes) {
        (true, false) => Rc::new(TerminalPrompter),
        (true, true) => Rc::new(AutoConfirm::new(TerminalPrompter)),
        (false, false) => Rc::new(LinePrompter::new(io::stdin().lock(), io::stderr())),
        (false, true) => Rc::new(AutoConfirm::new(LinePrompter::new(
            io::stdin().lock(),
            io::stderr(),
        ))),
    }
}

fn emit_output(cli: &GuessCli, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.exit_code();

    if cli.json {
        let payload = json!({
            "status": outcome.status,
            "message": outcome.message,
            "details": outcome.details,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));
    if outcome.status != CommandStatus::Ok {
        eprintln!("{}", style.status(outcome.status, &outcome.message));
        if let Some(hint) = hint_from_details(&outcome.details) {
            eprintln!("{}", style.note(&format!("Hint: {hint}")));
        }
        return Ok(code);
    }
    if cli.quiet {
        return Ok(code);
    }

    println!("{}", style.status(outcome.status, &outcome.message));
    if let Some(table) = render_package_table(&style, &outcome.details) {
        println!("{table}");
    }
    if let Some(requirements) = outcome.details.get("requirements").and_then(Value::as_str) {
        println!();
        println!("{}", style.heading("requirements.txt:"));
        print!("{requirements}");
    }
    if let Some(written) = outcome.details.get("written").and_then(Value::as_str) {
        println!("{}", style.note(&format!("Wrote {written}")));
    }
    if let Some(hint) = hint_from_details(&outcome.details) {
        println!("{}", style.note(&format!("Hint: {hint}")));
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

struct PackageRow {
    name: String,
    status: String,
    version: String,
    detail: String,
}

fn render_package_table(style: &Style, details: &Value) -> Option<String> {
    let packages = details.get("packages")?.as_array()?;
    if packages.is_empty() {
        return None;
    }

    let field = |pkg: &Value, key: &str| {
        pkg.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let rows: Vec<PackageRow> = packages
        .iter()
        .map(|pkg| {
            let detail = match pkg.get("status").and_then(Value::as_str) {
                Some("resolved") => format!("{} on {}", field(pkg, "source"), field(pkg, "date")),
                Some("skipped") => field(pkg, "reason"),
                _ => String::new(),
            };
            PackageRow {
                name: field(pkg, "name"),
                status: field(pkg, "status"),
                version: field(pkg, "version"),
                detail,
            }
        })
        .collect();

    Some(format_package_table(style, &rows))
}

fn format_package_table(style: &Style, rows: &[PackageRow]) -> String {
    let headers = ["Package", "Status", "Version", "Detail"];
    let mut widths = headers.map(str::len);
    for row in rows {
        widths[0] = widths[0].max(row.name.len());
        widths[1] = widths[1].max(row.status.len());
        widths[2] = widths[2].max(row.version.len());
        widths[3] = widths[3].max(row.detail.len());
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(style.heading(&format!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {}",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    )));
    lines.push(format!(
        "{:-<w0$}  {:-<w1$}  {:-<w2$}  {:-<w3$}",
        "",
        "",
        "",
        "",
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    ));
    for row in rows {
        let line = format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}",
            row.name,
            row.status,
            row.version,
            row.detail,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
        lines.push(style.package_row(&row.status, &line));
    }

    lines.join("\n")
}
