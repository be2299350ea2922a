//! `stride predict`: one rename, every suggestion it implies.

use crate::protocol::SuggestionView;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use stride_adapters::config::Config;
use stride_adapters::source::{load_source, write_source};
use stride_core::{AcceptOutcome, Buffer, Session, Span, Suggestion, TextEdit};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Source file to edit
    pub file: PathBuf,
    /// 1-based line of the text to replace
    #[arg(long)]
    pub line: usize,
    /// 1-based byte column of the text to replace
    #[arg(long)]
    pub column: usize,
    /// Text expected at that position
    #[arg(long)]
    pub old: String,
    /// Replacement text
    #[arg(long)]
    pub new: String,
    /// Accept every suggestion and write the file back
    #[arg(long)]
    pub apply: bool,
    /// Print suggestions as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of a one-shot prediction.
#[derive(Debug)]
pub struct PredictReport {
    pub views: Vec<SuggestionView>,
    pub applied: usize,
    pub text: String,
}

pub fn run(args: &PredictArgs, config: &Config) -> Result<()> {
    let report = predict(args, config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.views)?);
    } else {
        print!("{}", render_report(&report.views));
    }
    if args.apply {
        write_source(&args.file, &report.text)?;
        eprintln!(
            "  + applied {} suggestion(s) to {}",
            report.applied,
            args.file.display()
        );
    }
    Ok(())
}

pub fn predict(args: &PredictArgs, config: &Config) -> Result<PredictReport> {
    let buffer = load_source(&args.file, config.max_file_bytes)?;
    let span = locate(&buffer, args)?;

    let mut session = Session::new(buffer, config.matcher_config())
        .with_token_merging(config.merge_within_token);
    session.begin_editing();
    session
        .edit(TextEdit::replace(span, args.new.clone()))
        .context("Failed to apply the rename")?;
    let suggestions = session.finish_editing();
    info!(
        file = %args.file.display(),
        suggestions = suggestions.len(),
        "prediction complete"
    );
    let views = views(&suggestions, session.buffer());

    let mut applied = 0;
    if args.apply {
        while let AcceptOutcome::Applied { .. } = session.accept()? {
            applied += 1;
        }
    }
    Ok(PredictReport {
        views,
        applied,
        text: session.buffer().text().to_string(),
    })
}

fn locate(buffer: &Buffer, args: &PredictArgs) -> Result<Span> {
    let (Some(line), Some(column)) = (args.line.checked_sub(1), args.column.checked_sub(1)) else {
        bail!("--line and --column start at 1");
    };
    let start = buffer
        .offset_of(line, column)
        .with_context(|| format!("{}:{} is outside the file", args.line, args.column))?;
    let span = Span::new(start, start + args.old.len());
    let found = buffer.slice(span).unwrap_or_default();
    if found != args.old {
        bail!(
            "expected {:?} at {}:{}, found {:?}",
            args.old,
            args.line,
            args.column,
            found
        );
    }
    Ok(span)
}

fn views(suggestions: &[Suggestion], buffer: &Buffer) -> Vec<SuggestionView> {
    suggestions
        .iter()
        .map(|s| SuggestionView::new(s, buffer))
        .collect()
}

/// One line per suggestion, positions 1-based like the arguments.
pub fn render_report(views: &[SuggestionView]) -> String {
    if views.is_empty() {
        return "  No suggestions\n".to_string();
    }
    let mut out = String::new();
    for view in views {
        out.push_str(&format!(
            "  {}:{}  {}  ({:?})\n",
            view.line + 1,
            view.column + 1,
            view.summary,
            view.confidence
        ));
    }
    out
}
