//! CSV chat-export ingestion.
//!
//! Columns are located by header name so exports with extra or reordered
//! columns still load. Short rows are tolerated; rows with empty content are
//! skipped. Timestamps that fail to parse become `None` rather than errors.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::aggregate::Message;

/// Fallback display name for blank author names
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Author id used when the export has no `author.id` column
pub const UNKNOWN_AUTHOR_ID: &str = "unknown";

/// Errors raised while locating or reading chat exports
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum IngestError
{
    #[error("Failed to open {}", .path.display())]
    #[diagnostic(code(stylecard::ingest::open), help("Check the path and file permissions"))]
    Open
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {}", .path.display())]
    #[diagnostic(
        code(stylecard::ingest::csv),
        help("Expected a chat export with a `content` column and a header row")
    )]
    Csv
    {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No CSV files found under {}", .root.display())]
    #[diagnostic(
        code(stylecard::ingest::no_inputs),
        help("Point --data-dir at your exports or pick a guild with --guild")
    )]
    NoInputs
    {
        root: PathBuf,
    },
}

/// Explicit author-id -> display-name overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable
{
    pub aliases: IndexMap<String, String>,
    /// Only admit aliased ids (ignored while the table is empty)
    pub restrict: bool,
}

impl AliasTable
{
    pub fn new(
        aliases: IndexMap<String, String>,
        restrict: bool,
    ) -> Self
    {
        Self { aliases, restrict }
    }

    /// Alias if one exists, else the trimmed raw name, else `Unknown`
    pub fn resolve_name(
        &self,
        author_id: &str,
        raw_name: &str,
    ) -> String
    {
        if let Some(alias) = self
            .aliases
            .get(author_id)
        {
            return alias.clone();
        }

        let trimmed = raw_name.trim();
        if trimmed.is_empty() { UNKNOWN_AUTHOR.to_string() } else { trimmed.to_string() }
    }

    pub fn admits(
        &self,
        author_id: &str,
    ) -> bool
    {
        !self.restrict
            || self
                .aliases
                .is_empty()
            || self
                .aliases
                .contains_key(author_id)
    }
}

/// Parse an export timestamp.
///
/// Accepts RFC 3339 (including `Z`), `YYYY-MM-DD HH:MM:SS[.f][+HH:MM]`, naive
/// date-times (read as UTC) and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>>
{
    let s = raw.trim();
    if s.is_empty()
    {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s)
    {
        return Some(dt);
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"]
    {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt)
        {
            return Some(dt);
        }
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt)
        {
            return Some(
                naive
                    .and_utc()
                    .fixed_offset(),
            );
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| {
            naive
                .and_utc()
                .fixed_offset()
        })
}

/// Header positions of the columns we read
#[derive(Debug, Default)]
struct Columns
{
    content: Option<usize>,
    timestamp: Option<usize>,
    author_id: Option<usize>,
    global_name: Option<usize>,
    username: Option<usize>,
    bot: Option<usize>,
}

impl Columns
{
    fn from_headers(headers: &csv::StringRecord) -> Self
    {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
        };

        Self {
            content: find("content"),
            timestamp: find("timestamp").or_else(|| find("date")),
            author_id: find("author.id"),
            global_name: find("author.global_name"),
            username: find("author.username"),
            bot: find("author.bot"),
        }
    }
}

fn field<'r>(
    rec: &'r csv::StringRecord,
    idx: Option<usize>,
) -> &'r str
{
    idx.and_then(|i| rec.get(i))
        .unwrap_or("")
}

/// Reads chat exports into `Message`s
#[derive(Debug, Clone, Default)]
pub struct CsvSource
{
    aliases: AliasTable,
}

impl CsvSource
{
    pub fn new(aliases: AliasTable) -> Self
    {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasTable
    {
        &self.aliases
    }

    /// Read one export file
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_path(
        &self,
        path: &Path,
    ) -> Result<Vec<Message>, IngestError>
    {
        let file = File::open(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        self.read_from(file)
            .map_err(|source| IngestError::Csv { path: path.to_path_buf(), source })
    }

    /// Read an export from any reader (header row required)
    pub fn read_from<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<Message>, csv::Error>
    {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let cols = Columns::from_headers(rdr.headers()?);
        let mut out = Vec::new();
        let mut skipped = 0usize;

        for rec in rdr.records()
        {
            let rec = rec?;

            let content = field(&rec, cols.content);
            if content.is_empty()
            {
                skipped += 1;
                continue;
            }

            // A blank id in a present column stays blank; it is its own author
            let author_id = match cols.author_id
            {
                Some(_) => field(&rec, cols.author_id).trim(),
                None => UNKNOWN_AUTHOR_ID,
            };
            if !self
                .aliases
                .admits(author_id)
            {
                skipped += 1;
                continue;
            }

            let raw_name = match field(&rec, cols.global_name).trim()
            {
                "" => field(&rec, cols.username),
                name => name,
            };
            let name = self
                .aliases
                .resolve_name(author_id, raw_name);
            let is_bot = field(&rec, cols.bot)
                .trim()
                .eq_ignore_ascii_case("true");

            let mut msg = Message::new(author_id, name, content).with_bot(is_bot);
            if let Some(ts) = parse_timestamp(field(&rec, cols.timestamp))
            {
                msg = msg.with_timestamp(ts);
            }
            out.push(msg);
        }

        debug!(rows = out.len(), skipped, "parsed export");
        Ok(out)
    }
}
