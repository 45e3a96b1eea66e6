use crate::domain::{FilterKind, Matcher, SortKey, ViewRow, build_filter, project};
use crate::infra::{ReadDirError, ReadDirOptions, local_offset, read_dir_entries};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui {
        left: Option<PathBuf>,
        right: Option<PathBuf>,
    },
    List(ListCommand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListCommand {
    pub path: Option<PathBuf>,
    pub sort_key: SortKey,
    pub filter: Option<String>,
    pub filter_kind: FilterKind,
    pub show_hidden: bool,
    pub json: bool,
}

impl Default for ListCommand {
    fn default() -> Self {
        Self {
            path: None,
            sort_key: SortKey::Name,
            filter: None,
            filter_kind: FilterKind::Subsequence,
            show_hidden: false,
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();
    if iter.peek().is_some_and(|arg| arg.as_str() == "list") {
        let _ = iter.next();
        return parse_list(iter).map(CliInvocation::List);
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for arg in iter {
        match arg.as_str() {
            "--" => continue,
            _ if arg.starts_with('-') && arg.len() > 1 => {
                return Err(CliParseError::UnknownFlag(arg.to_string()));
            }
            _ if paths.len() >= 2 => {
                return Err(CliParseError::UnexpectedArgument(arg.to_string()));
            }
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    let mut paths = paths.into_iter();
    Ok(CliInvocation::Tui {
        left: paths.next(),
        right: paths.next(),
    })
}

fn parse_list<'a>(args: impl Iterator<Item = &'a String>) -> Result<ListCommand, CliParseError> {
    let mut command = ListCommand::default();
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sort" | "-s" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--sort".to_string()))?;
                command.sort_key =
                    SortKey::parse(value).ok_or_else(|| CliParseError::InvalidFlagValue {
                        flag: "--sort".to_string(),
                        value: value.to_string(),
                    })?;
            }
            "--filter" | "-f" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--filter".to_string()))?;
                command.filter = Some(value.to_string());
            }
            "--regex" => {
                command.filter_kind = FilterKind::Regex;
            }
            "--all" | "-a" => {
                command.show_hidden = true;
            }
            "--json" => {
                command.json = true;
            }
            _ if arg.starts_with('-') && arg.len() > 1 => {
                return Err(CliParseError::UnknownFlag(arg.to_string()));
            }
            _ => {
                if command.path.is_some() {
                    return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                }
                command.path = Some(PathBuf::from(arg));
            }
        }
    }

    if command.filter_kind == FilterKind::Regex {
        if let Some(pattern) = command.filter.as_deref() {
            regex::Regex::new(pattern).map_err(|_| CliParseError::InvalidFlagValue {
                flag: "--filter".to_string(),
                value: pattern.to_string(),
            })?;
        }
    }
    Ok(command)
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    ReadDir(#[from] ReadDirError),

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(String),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub fn run_list(command: &ListCommand) -> Result<(), CliRunError> {
    let dir = match &command.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().map_err(|error| CliRunError::CurrentDir(error.to_string()))?,
    };
    let rows = list_rows(&dir, command)?;

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    if command.json {
        let payload = json_payload(&dir, command, &rows);
        let text = serde_json::to_string_pretty(&payload)?;
        write_line(&mut out, &text)?;
    } else {
        for row in &rows {
            if !write_line(&mut out, &row_line(row))? {
                return Ok(());
            }
        }
    }
    match out.flush() {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}

/// The rows a pane would show for `dir` with the same sort and filter.
pub fn list_rows(dir: &Path, command: &ListCommand) -> Result<Vec<ViewRow>, CliRunError> {
    let options = ReadDirOptions {
        show_hidden: command.show_hidden,
        offset: local_offset(),
    };
    let entries = read_dir_entries(dir, options)?;
    let filter = command
        .filter
        .as_deref()
        .and_then(|text| build_filter(command.filter_kind, text));
    Ok(project(
        &entries,
        command.sort_key,
        filter.as_ref().map(|filter| filter as &dyn Matcher),
    ))
}

fn row_line(row: &ViewRow) -> String {
    let entry = &row.entry;
    let size = if entry.is_dir {
        "-".to_string()
    } else {
        entry.size.to_string()
    };
    format!(
        "{}\t{}\t{}\t{}",
        entry.type_label(),
        size,
        entry.modified,
        entry.name
    )
}

fn json_payload(dir: &Path, command: &ListCommand, rows: &[ViewRow]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "name": row.entry.name,
                "type": row.entry.type_label(),
                "is_dir": row.entry.is_dir,
                "size": row.entry.size,
                "modified": row.entry.modified,
                "matched": row.matched,
            })
        })
        .collect();
    serde_json::json!({
        "dir": dir.display().to_string(),
        "sort": command.sort_key.label().to_ascii_lowercase(),
        "filter": command.filter,
        "entries": entries,
    })
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}
