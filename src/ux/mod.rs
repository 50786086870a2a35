use anyhow::{anyhow, Result};
use colored::Colorize;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use crate::export::{export_blueprint, format_prompts, ExportSummary};
use crate::generation::GenerationService;
use crate::render::markdown_to_html;
use crate::wire::{ProductData, ProductPatch};
use crate::wizard::runner::Wizard;
use crate::wizard::{Effect, Outcome, Step, WizardState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Back,
    Jump(Step),
    Generate,
    ShowPrd,
    ShowHtml,
    ShowTickets,
    ShowPrompts,
    Export,
    StartOver,
    Quit,
    Unknown,
}

/// An empty line means "next", which keeps the happy path to pressing Enter.
pub fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or("n").to_lowercase();
    match head.as_str() {
        "n" | "next" => Command::Next,
        "b" | "back" => Command::Back,
        "j" | "jump" => parts
            .next()
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(Step::from_number)
            .map(Command::Jump)
            .unwrap_or(Command::Unknown),
        "g" | "generate" => Command::Generate,
        "p" | "prd" => Command::ShowPrd,
        "h" | "html" => Command::ShowHtml,
        "t" | "tickets" => Command::ShowTickets,
        "a" | "prompts" => Command::ShowPrompts,
        "e" | "export" => Command::Export,
        "s" | "start-over" => Command::StartOver,
        "q" | "quit" => Command::Quit,
        _ => Command::Unknown,
    }
}

/// Required fields still empty for `step`; an empty list means the user may proceed.
pub fn missing_fields(step: Step, state: &WizardState) -> Vec<&'static str> {
    let p = state.product();
    fn blank(s: &str) -> bool {
        s.trim().is_empty()
    }
    let checks: Vec<(&'static str, bool)> = match step {
        Step::Idea => vec![("Project Name", blank(&p.project_name)), ("High-Level Description", blank(&p.description))],
        Step::Audience => vec![("Target Audience", blank(&p.target_audience)), ("Problem to Solve", blank(&p.problem_to_solve))],
        Step::Features => vec![("Features / User Stories", blank(&p.features))],
        Step::Platform => vec![("Platform Recommendation", state.content().platform.is_none())],
        Step::Results => vec![],
    };
    checks.into_iter().filter(|(_, missing)| *missing).map(|(name, _)| name).collect()
}

pub fn can_proceed(step: Step, state: &WizardState) -> bool {
    missing_fields(step, state).is_empty()
}

pub struct Console<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// `None` on end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut s = String::new();
        if self.input.read_line(&mut s)? == 0 {
            return Ok(None);
        }
        Ok(Some(s.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn ask(&mut self, label: &str, current: &str) -> io::Result<Option<String>> {
        if current.is_empty() {
            write!(self.out, "{}: ", label.bold())?;
        } else {
            write!(self.out, "{} [{}]: ", label.bold(), current.dimmed())?;
        }
        self.out.flush()?;
        Ok(self.read_line()?.map(|s| if s.trim().is_empty() { current.to_string() } else { s }))
    }

    /// Multi-line entry ended by a lone `.`; an empty first line keeps `current`.
    fn ask_lines(&mut self, label: &str, current: &str) -> io::Result<Option<String>> {
        writeln!(self.out, "{} (one per line, finish with a single '.'; Enter keeps current)", label.bold())?;
        if !current.is_empty() {
            writeln!(self.out, "{}", current.dimmed())?;
        }
        self.out.flush()?;

        let mut lines: Vec<String> = Vec::new();
        loop {
            let Some(line) = self.read_line()? else {
                if lines.is_empty() {
                    return Ok(None);
                }
                break;
            };
            if lines.is_empty() && line.trim().is_empty() {
                return Ok(Some(current.to_string()));
            }
            if line.trim() == "." {
                break;
            }
            lines.push(line);
        }
        if lines.is_empty() {
            return Ok(Some(current.to_string()));
        }
        Ok(Some(lines.join("\n")))
    }

    fn ask_command(&mut self, menu: &str) -> io::Result<Command> {
        write!(self.out, "{} ", menu.cyan())?;
        self.out.flush()?;
        Ok(self.read_line()?.map(|l| parse_command(&l)).unwrap_or(Command::Quit))
    }
}

pub fn print_step_indicator<W: Write>(out: &mut W, current: Step) -> io::Result<()> {
    let parts: Vec<String> = Step::ALL
        .iter()
        .map(|s| {
            let label = format!("{}. {}", s.number(), s.label());
            if *s == current {
                label.blue().bold().to_string()
            } else if *s < current {
                label.green().to_string()
            } else {
                label.dimmed().to_string()
            }
        })
        .collect();
    writeln!(out, "\n{}", parts.join("  ›  "))
}

fn print_error<W: Write>(out: &mut W, state: &WizardState) -> io::Result<()> {
    if let Some(err) = state.error() {
        writeln!(out, "{} {}", "Error:".red().bold(), err.red())?;
    }
    Ok(())
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn run_with_spinner<S: GenerationService>(wizard: &mut Wizard<S>, effect: Effect, msg: &str) -> Option<Outcome> {
    if matches!(effect, Effect::None) {
        return None;
    }
    let pb = spinner(msg);
    let outcome = wizard.run(effect).await;
    pb.finish_and_clear();
    outcome
}

fn field_patch(step: Step, first: String, second: String) -> ProductPatch {
    match step {
        Step::Idea => ProductPatch { project_name: Some(first), description: Some(second), ..Default::default() },
        _ => ProductPatch { target_audience: Some(first), problem_to_solve: Some(second), ..Default::default() },
    }
}

fn field_pair(step: Step, p: &ProductData) -> [(&'static str, String); 2] {
    match step {
        Step::Idea => [("Project Name", p.project_name.clone()), ("High-Level Description", p.description.clone())],
        _ => [("Target Audience", p.target_audience.clone()), ("Problem to Solve", p.problem_to_solve.clone())],
    }
}

fn print_platform<W: Write>(out: &mut W, state: &WizardState) -> io::Result<()> {
    writeln!(out, "\n{}", "AI Platform Recommendation".bold())?;
    match &state.content().platform {
        Some(rec) => {
            writeln!(out, "{} {}", "Recommended platform:".bold(), rec.platform.green().bold())?;
            writeln!(out, "\n{}", rec.justification)
        }
        None => writeln!(out, "{}", "No recommendation yet.".dimmed()),
    }
}

fn print_results<W: Write>(out: &mut W, state: &WizardState) -> io::Result<()> {
    match &state.content().documents {
        None => {
            writeln!(out, "\n{}", "Ready to Generate Your Product Blueprint?".bold())?;
            writeln!(out, "Generate the PRD, development tickets and AI prompts from your inputs.")
        }
        Some(docs) => {
            writeln!(out, "\n{}", "Your Product Blueprint".bold())?;
            writeln!(
                out,
                "  PRD: {} chars   Tickets: {}   AI Prompts: {}",
                docs.prd.len(),
                docs.tickets.len(),
                docs.prompts.len()
            )
        }
    }
}

fn print_tickets<W: Write>(out: &mut W, state: &WizardState) -> io::Result<()> {
    let Some(docs) = &state.content().documents else { return Ok(()) };
    for (i, t) in docs.tickets.iter().enumerate() {
        writeln!(out, "\n{}. {}", i + 1, t.title.blue().bold())?;
        writeln!(out, "{}", t.description)?;
        writeln!(out, "{}", "Acceptance Criteria:".bold())?;
        for ac in &t.acceptance_criteria {
            writeln!(out, "  - {ac}")?;
        }
    }
    Ok(())
}

fn print_export<W: Write>(out: &mut W, summary: &ExportSummary) -> io::Result<()> {
    writeln!(
        out,
        "{} {} ({})",
        "Exported to".green().bold(),
        summary.dir.display(),
        format_size(summary.bytes, DECIMAL)
    )?;
    for f in &summary.files {
        writeln!(out, "  {}", f.display())?;
    }
    Ok(())
}

/// Drives the wizard from a console until the user quits or input ends.
pub async fn run_interactive<S, R, W>(wizard: &mut Wizard<S>, console: &mut Console<R, W>, out_dir: &Path) -> Result<()>
where
    S: GenerationService,
    R: BufRead,
    W: Write,
{
    loop {
        let step = wizard.state().current_step();
        print_step_indicator(&mut console.out, step)?;
        print_error(&mut console.out, wizard.state())?;

        let command = match step {
            Step::Idea | Step::Audience => {
                let [(l1, v1), (l2, v2)] = field_pair(step, wizard.state().product());
                let Some(first) = console.ask(l1, &v1)? else { return Ok(()) };
                let Some(second) = console.ask(l2, &v2)? else { return Ok(()) };
                wizard.state_mut().update_field(field_patch(step, first, second));
                console.ask_command("[n]ext  [b]ack  [j]ump <step>  [q]uit >")?
            }
            Step::Features => {
                let current = wizard.state().product().features.clone();
                let Some(features) = console.ask_lines("Features / User Stories", &current)? else { return Ok(()) };
                wizard.state_mut().update_field(ProductPatch { features: Some(features), ..Default::default() });
                console.ask_command("[n]ext (get platform recommendation)  [b]ack  [j]ump <step>  [q]uit >")?
            }
            Step::Platform => {
                print_platform(&mut console.out, wizard.state())?;
                console.ask_command("[n]ext  [b]ack  [j]ump <step>  [q]uit >")?
            }
            Step::Results => {
                print_results(&mut console.out, wizard.state())?;
                let menu = if wizard.state().content().documents.is_some() {
                    "[p]rd  [h]tml  [t]ickets  [a]i prompts  [g] re-generate  [e]xport  [s]tart over  [b]ack  [q]uit >"
                } else {
                    "[g]enerate documents  [b]ack  [j]ump <step>  [s]tart over  [q]uit >"
                };
                console.ask_command(menu)?
            }
        };

        match command {
            Command::Quit => return Ok(()),
            Command::Back => wizard.state_mut().retreat(),
            Command::Jump(target) => wizard.state_mut().jump_to(target),
            Command::Next if step == Step::Results => {}
            Command::Next if !can_proceed(step, wizard.state()) => {
                let missing = missing_fields(step, wizard.state());
                writeln!(console.out, "{} {}", "Please fill in:".yellow().bold(), missing.join(", "))?;
            }
            Command::Next => {
                if step == Step::Features {
                    let effect = wizard.state_mut().request_platform_recommendation();
                    run_with_spinner(wizard, effect, "Analyzing your product...").await;
                } else {
                    wizard.state_mut().advance();
                }
            }
            Command::Generate if step == Step::Results => {
                let effect = wizard.state_mut().request_document_generation();
                run_with_spinner(wizard, effect, "Generating your documents...").await;
            }
            Command::ShowPrd | Command::ShowHtml | Command::ShowTickets | Command::ShowPrompts | Command::Export
                if step == Step::Results =>
            {
                let state = wizard.state();
                let Some(docs) = &state.content().documents else {
                    writeln!(console.out, "{}", "Generate the documents first.".yellow())?;
                    continue;
                };
                match command {
                    Command::ShowPrd => writeln!(console.out, "\n{}", docs.prd)?,
                    Command::ShowHtml => writeln!(console.out, "\n{}", markdown_to_html(&docs.prd))?,
                    Command::ShowTickets => print_tickets(&mut console.out, state)?,
                    Command::ShowPrompts => writeln!(console.out, "\n{}", format_prompts(&docs.prompts))?,
                    _ => match export_blueprint(out_dir, state) {
                        Ok(summary) => print_export(&mut console.out, &summary)?,
                        Err(e) => {
                            tracing::error!(error = %format!("{e:#}"), "export failed");
                            writeln!(console.out, "{} {e}", "Export failed:".red().bold())?;
                        }
                    },
                }
            }
            Command::StartOver => wizard.state_mut().start_over(),
            _ => writeln!(console.out, "{}", "Unknown command for this step.".yellow())?,
        }
    }
}

/// Non-interactive flow for prefilled product data: gate, recommend, generate, export.
pub async fn run_batch<S: GenerationService, W: Write>(wizard: &mut Wizard<S>, out: &mut W, out_dir: &Path) -> Result<ExportSummary> {
    for step in [Step::Idea, Step::Audience] {
        let missing = missing_fields(step, wizard.state());
        if !missing.is_empty() {
            return Err(anyhow!("input is missing: {}", missing.join(", ")));
        }
        wizard.state_mut().advance();
    }
    let missing = missing_fields(Step::Features, wizard.state());
    if !missing.is_empty() {
        return Err(anyhow!("input is missing: {}", missing.join(", ")));
    }

    let pb = spinner("Analyzing your product...");
    let outcome = wizard.request_platform_recommendation().await;
    pb.finish_and_clear();
    if outcome != Some(Outcome::Committed) {
        return Err(anyhow!(wizard.state().error().unwrap_or("platform recommendation failed").to_string()));
    }
    print_platform(out, wizard.state())?;
    wizard.state_mut().advance();

    let pb = spinner("Generating your documents...");
    let outcome = wizard.request_document_generation().await;
    pb.finish_and_clear();
    if outcome != Some(Outcome::Committed) {
        return Err(anyhow!(wizard.state().error().unwrap_or("document generation failed").to_string()));
    }
    print_results(out, wizard.state())?;

    let summary = export_blueprint(out_dir, wizard.state())?;
    print_export(out, &summary)?;
    Ok(summary)
}
