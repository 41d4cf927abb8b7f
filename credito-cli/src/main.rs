use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use credito_core::{Entry, ExtractionResult, Session};
use credito_extract::response::parse_extraction;
use credito_extract::{ExtractionClient, GeminiService, MediaType};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

mod auth;
mod config;
mod logging;
mod render;
mod session_ctl;
mod state;

use render::{render, OutputFormat};
use session_ctl::SessionController;

#[derive(Parser, Debug)]
#[command(name = "credito", version, about = "Monthly breakdown of credits received, from a bank statement")]
struct Cli {
    /// Log level (trace, debug, info, warn, error, off); RUST_LOG wins when set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a statement (PDF or image) for extraction and print the monthly breakdown
    Analyze {
        /// Statement file
        file: PathBuf,

        /// Media type override (application/pdf or image/*); inferred from the extension otherwise
        #[arg(long)]
        media_type: Option<String>,

        /// Name shown on the report instead of the extracted account holder
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write the extracted entries as JSON (editable, re-usable with `summarize`)
        #[arg(long)]
        save_entries: Option<PathBuf>,
    },

    /// Aggregate a saved entries JSON file without calling the service
    Summarize {
        /// JSON file shaped as {"clientName": "...", "entries": [...]}
        entries: PathBuf,

        #[arg(long)]
        name: Option<String>,

        /// Leave out entry N (1-based, as listed in the file); repeatable
        #[arg(long = "drop-row", value_name = "N")]
        drop_rows: Vec<usize>,

        /// Add an entry as "DESCRIPTION;AMOUNT[;YYYY-MM-DD]" (date defaults to today); repeatable
        #[arg(long = "add", value_name = "ENTRY")]
        add_entries: Vec<String>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Manage the Gemini API key
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage ~/.credito/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste and store a Gemini API key
    PasteApiKey,
    /// Show where the key comes from and whether it looks valid
    Status,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = config::load_config();
    let level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.log.level.clone()))
        .unwrap_or_else(|| config::LogSection::default().level);
    logging::setup_logging(&level);

    // auth and config init must keep working while config.toml is broken
    let cfg = match loaded {
        Ok(cfg) => cfg,
        Err(e) if !cli.command.needs_config() => {
            warn!(error = ?e, "config unreadable, using defaults");
            config::Config::default()
        }
        Err(e) => return Err(e),
    };

    match cli.command {
        Command::Analyze {
            file,
            media_type,
            name,
            format,
            output,
            save_entries,
        } => {
            let media = resolve_media_type(&file, media_type.as_deref())?;
            let bytes = fs::read(&file).with_context(|| format!("read {}", file.display()))?;
            debug!(path = %file.display(), bytes = bytes.len(), "loaded statement");

            let (key, source) = auth::configured_key()?;
            debug!(?source, "resolved API key source");
            let service = GeminiService::new(cfg.extract.gemini(), key)?;
            let client = ExtractionClient::new(service).with_policy(cfg.extract.retry_policy());
            let mut ctl = SessionController::new(client);

            eprintln!("Analyzing {} ...", file.display());
            ctl.analyze(&bytes, media).await?;
            let session = ctl.session();
            if session.entries.is_empty() {
                eprintln!("No qualifying credits were found in this statement.");
            }

            if let Some(path) = save_entries {
                let result = ExtractionResult {
                    client_name: session.client_name.clone(),
                    entries: session.entries.clone(),
                };
                let json = serde_json::to_string_pretty(&result)?;
                fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
                eprintln!("Saved entries to {}", path.display());
            }

            let report = ctl.report(name.as_deref(), Local::now());
            emit(&report, format.unwrap_or(cfg.output.default_format), &cfg, output.as_deref())?;
        }

        Command::Summarize {
            entries,
            name,
            drop_rows,
            add_entries,
            format,
            output,
        } => {
            let text = fs::read_to_string(&entries).with_context(|| format!("read {}", entries.display()))?;
            let result = parse_extraction(&text)
                .with_context(|| format!("parse {} (expected clientName and entries)", entries.display()))?;

            let mut session = Session::new();
            session.replace(result);
            apply_edits(&mut session, &drop_rows, &add_entries, Local::now().date_naive())?;
            if let Some(n) = name {
                session.set_display_name(n);
            }
            let report = session.report(Local::now());
            emit(&report, format.unwrap_or(cfg.output.default_format), &cfg, output.as_deref())?;
        }

        Command::Auth { command } => match command {
            AuthCommand::PasteApiKey => auth::paste_api_key()?,
            AuthCommand::Status => auth::status()?,
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

impl Command {
    fn needs_config(&self) -> bool {
        !matches!(
            self,
            Command::Auth { .. }
                | Command::Config {
                    command: ConfigCommand::Init
                }
        )
    }
}

/// Drop rows first (highest index first so earlier indices stay valid), then append.
fn apply_edits(session: &mut Session, drop_rows: &[usize], add_entries: &[String], today: NaiveDate) -> Result<()> {
    let mut drops = drop_rows.to_vec();
    drops.sort_unstable();
    drops.dedup();
    for n in drops.into_iter().rev() {
        let index = n.checked_sub(1).context("rows are numbered from 1")?;
        let removed = session.remove_row(index)?;
        debug!(row = n, description = %removed.description, "dropped entry");
    }

    for raw in add_entries {
        let index = session.add_row(today);
        let blank = session.entries[index].clone();
        session.update_row(index, parse_entry_arg(raw, blank)?)?;
    }
    Ok(())
}

/// `DESCRIPTION;AMOUNT[;DATE]`, amount with a `.` or `,` decimal mark.
fn parse_entry_arg(raw: &str, blank: Entry) -> Result<Entry> {
    let mut parts = raw.splitn(3, ';');
    let description = parts.next().unwrap_or_default();
    let Some(amount) = parts.next() else {
        bail!("--add expects DESCRIPTION;AMOUNT[;YYYY-MM-DD], got {raw:?}");
    };
    let amount: f64 = amount
        .trim()
        .replace(',', ".")
        .parse()
        .with_context(|| format!("--add amount is not a number: {amount:?}"))?;
    let date = parts.next().map(str::to_string).unwrap_or(blank.date);
    Ok(Entry::new(description, amount, date))
}

fn resolve_media_type(file: &Path, explicit: Option<&str>) -> Result<MediaType> {
    if let Some(raw) = explicit {
        return raw.parse::<MediaType>().map_err(anyhow::Error::msg);
    }
    match MediaType::from_path(file) {
        Some(m) => Ok(m),
        None => bail!(
            "cannot tell the media type of {} (use a .pdf or image file, or pass --media-type)",
            file.display()
        ),
    }
}

fn emit(
    report: &credito_core::MonthlyReport,
    format: OutputFormat,
    cfg: &config::Config,
    output: Option<&Path>,
) -> Result<()> {
    if report.aggregation.excluded_count() > 0 {
        warn!(
            excluded = report.aggregation.excluded_count(),
            "some entries were left out of the totals"
        );
    }
    let text = render(report, format, &cfg.output.currency())?;
    match output {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_flag_or_extension() {
        assert_eq!(resolve_media_type(Path::new("a.bin"), Some("application/pdf")).unwrap(), MediaType::Pdf);
        assert_eq!(
            resolve_media_type(Path::new("scan.JPEG"), None).unwrap(),
            MediaType::Image("jpeg".into())
        );
        assert!(resolve_media_type(Path::new("statement.ofx"), None).is_err());
        assert!(resolve_media_type(Path::new("a.pdf"), Some("text/plain")).is_err());
    }

    fn session() -> Session {
        let mut s = Session::new();
        s.replace(ExtractionResult {
            client_name: "ANA".into(),
            entries: vec![
                Entry::new("SALARIO", 1000.0, "2024-01-10"),
                Entry::new("ESTORNO", 30.0, "2024-01-11"),
                Entry::new("PIX", 500.0, "2024-02-15"),
            ],
        });
        s
    }

    #[test]
    fn test_summarize_edits() {
        let mut s = session();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let adds = vec!["TED;250,50;2024-02-20".to_string(), "DEPOSITO;10".to_string()];
        apply_edits(&mut s, &[2, 2], &adds, today).unwrap();

        let descriptions: Vec<&str> = s.entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, ["SALARIO", "PIX", "TED", "DEPOSITO"]);
        assert_eq!(s.entries[2], Entry::new("TED", 250.5, "2024-02-20"));
        assert_eq!(s.entries[3].date, "2024-03-01");
        assert_eq!(s.aggregate().grand_total, 1760.5);
    }

    #[test]
    fn test_summarize_edit_errors() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(apply_edits(&mut session(), &[0], &[], today).is_err());
        assert!(apply_edits(&mut session(), &[4], &[], today).is_err());
        assert!(apply_edits(&mut session(), &[], &["TED".to_string()], today).is_err());
        assert!(apply_edits(&mut session(), &[], &["TED;abc".to_string()], today).is_err());
    }

    #[test]
    fn test_repair_commands_skip_config() {
        let parse = |args: &[&str]| Cli::try_parse_from(args.iter().copied()).unwrap().command;
        assert!(!parse(&["credito", "auth", "status"]).needs_config());
        assert!(!parse(&["credito", "auth", "paste-api-key"]).needs_config());
        assert!(!parse(&["credito", "config", "init"]).needs_config());
        assert!(parse(&["credito", "config", "show"]).needs_config());
        assert!(parse(&["credito", "summarize", "e.json", "--drop-row", "2"]).needs_config());
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from(["credito", "analyze", "extrato.pdf", "--format", "csv", "--name", "Ana"]).unwrap();
        match cli.command {
            Command::Analyze { file, format, name, .. } => {
                assert_eq!(file, PathBuf::from("extrato.pdf"));
                assert_eq!(format, Some(OutputFormat::Csv));
                assert_eq!(name.as_deref(), Some("Ana"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
