use std::fmt;
use std::path::{Path, PathBuf};

use services::DiscoveryStrategy;
use spoken_core::model::{CategoryId, ContentId, PageNumber};

pub const DEFAULT_DB_URL: &str = "sqlite://spoken.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    UnsupportedFlag { command: &'static str, flag: &'static str },
    InvalidValue { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::UnsupportedFlag { command, flag } => {
                write!(f, "{flag} is not supported by {command}")
            }
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [--db <sqlite_url>] [--content <url-or-dir>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  categories");
    eprintln!("  read <category> [--page N]");
    eprintln!("  next <category>");
    eprintln!("  prev <category>");
    eprintln!("  pages <category> [--strategy linear|exponential]");
    eprintln!("  mark <category> <id>");
    eprintln!("  marked [--category C]");
    eprintln!("  scroll <category> <id> [--page N] [--speed S]");
    eprintln!("  reset");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --content ./public");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SPOKEN_DB_URL, SPOKEN_CONTENT, SPOKEN_FETCH_TIMEOUT_MS, SPOKEN_DISCOVERY, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Categories,
    Read {
        category: String,
        page: Option<PageNumber>,
    },
    Next {
        category: String,
    },
    Prev {
        category: String,
    },
    Pages {
        category: String,
        strategy: Option<DiscoveryStrategy>,
    },
    Mark {
        category: String,
        id: ContentId,
    },
    Marked {
        category: Option<CategoryId>,
    },
    Scroll {
        category: String,
        id: ContentId,
        page: Option<PageNumber>,
        speed: Option<f32>,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub db_url: String,
    pub content: Option<String>,
    pub command: Command,
}

/// Flags shared by every command; each command checks which ones it accepts.
#[derive(Default)]
struct Flags {
    page: Option<PageNumber>,
    strategy: Option<DiscoveryStrategy>,
    category: Option<CategoryId>,
    speed: Option<f32>,
}

impl Flags {
    fn allow_only(&self, command: &'static str, allowed: &[&'static str]) -> Result<(), ArgsError> {
        let present = [
            ("--page", self.page.is_some()),
            ("--strategy", self.strategy.is_some()),
            ("--category", self.category.is_some()),
            ("--speed", self.speed.is_some()),
        ];
        match present
            .into_iter()
            .find(|(flag, set)| *set && !allowed.contains(flag))
        {
            Some((flag, _)) => Err(ArgsError::UnsupportedFlag { command, flag }),
            None => Ok(()),
        }
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.parse().map_err(|_| ArgsError::InvalidValue { flag, raw })
}

impl Args {
    /// Parse everything after the program name. `Ok(None)` means help was requested.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = std::env::var("SPOKEN_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut content = None;
        let mut flags = Flags::default();
        let mut positionals = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--content" => content = Some(require_value(&mut args, "--content")?),
                "--page" => flags.page = Some(parse_value(&mut args, "--page")?),
                "--strategy" => flags.strategy = Some(parse_value(&mut args, "--strategy")?),
                "--category" => flags.category = Some(parse_value(&mut args, "--category")?),
                "--speed" => flags.speed = Some(parse_value(&mut args, "--speed")?),
                "--help" | "-h" => return Ok(None),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positionals.push(arg),
            }
        }

        let mut positionals = positionals.into_iter();
        let Some(name) = positionals.next() else {
            return Ok(None);
        };
        let mut category = || {
            positionals
                .next()
                .ok_or(ArgsError::MissingArgument { name: "category" })
        };

        let command = match name.as_str() {
            "categories" => {
                flags.allow_only("categories", &[])?;
                Command::Categories
            }
            "read" => {
                flags.allow_only("read", &["--page"])?;
                Command::Read {
                    category: category()?,
                    page: flags.page,
                }
            }
            "next" => {
                flags.allow_only("next", &[])?;
                Command::Next {
                    category: category()?,
                }
            }
            "prev" => {
                flags.allow_only("prev", &[])?;
                Command::Prev {
                    category: category()?,
                }
            }
            "pages" => {
                flags.allow_only("pages", &["--strategy"])?;
                Command::Pages {
                    category: category()?,
                    strategy: flags.strategy,
                }
            }
            "mark" => {
                flags.allow_only("mark", &[])?;
                let category = category()?;
                Command::Mark {
                    category,
                    id: parse_id(positionals.next())?,
                }
            }
            "marked" => {
                flags.allow_only("marked", &["--category"])?;
                Command::Marked {
                    category: flags.category,
                }
            }
            "scroll" => {
                flags.allow_only("scroll", &["--page", "--speed"])?;
                let category = category()?;
                Command::Scroll {
                    category,
                    id: parse_id(positionals.next())?,
                    page: flags.page,
                    speed: flags.speed,
                }
            }
            "reset" => {
                flags.allow_only("reset", &[])?;
                Command::Reset
            }
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        if let Some(extra) = positionals.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self {
            db_url,
            content,
            command,
        }))
    }
}

fn parse_id(raw: Option<String>) -> Result<ContentId, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArgument { name: "id" })?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidValue { flag: "<id>", raw })
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) so `SQLite` can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}
