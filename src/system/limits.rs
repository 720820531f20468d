//! PAM resource limits (`/etc/security/limits.conf`)
//!
//! The document is kept line by line so that comments and entries this tool
//! does not manage survive a rewrite untouched.

use super::SecurityLimits;
use crate::error::{IoResultExt, Result, SaptuneError};
use crate::param::value::LimitBound;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default location of the limits file
pub const LIMITS_CONF: &str = "/etc/security/limits.conf";

/// Textual value that stands for "no limit"
const UNLIMITED: &str = "unlimited";

/// One `<domain> <type> <item> <value>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitEntry {
    /// User, `@group`, `*` or uid range
    pub domain: String,
    /// `soft`, `hard` or `-` for both
    pub kind: String,
    /// Resource name such as `nofile`
    pub item: String,
    /// Limit; `u64::MAX` encodes unlimited
    pub value: u64,
}

impl LimitEntry {
    fn applies_to(&self, domain: &str, bound: LimitBound, item: &str) -> bool {
        self.domain == domain && self.item == item && (self.kind == bound.as_str() || self.kind == "-")
    }
}

impl fmt::Display for LimitEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.domain, self.kind, self.item, format_limit(self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Comment, blank line or anything not managed here
    Verbatim(String),
    Entry(LimitEntry),
}

/// Parsed limits document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitsFile {
    lines: Vec<Line>,
}

impl LimitsFile {
    /// Parse limits.conf content.
    ///
    /// Lines with four fields and a numeric (or unlimited) value become
    /// entries; everything else is kept verbatim.
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .map(|raw| match parse_entry(raw) {
                Some(entry) => Line::Entry(entry),
                None => Line::Verbatim(raw.to_string()),
            })
            .collect();
        Self { lines }
    }

    /// Effective value for `(domain, bound, item)`; later lines win
    pub fn get(&self, domain: &str, bound: LimitBound, item: &str) -> Option<u64> {
        self.entries()
            .filter(|e| e.applies_to(domain, bound, item))
            .last()
            .map(|e| e.value)
    }

    /// Set `(domain, bound, item)`.
    ///
    /// The entry currently in effect is rewritten in place when it has
    /// exactly that type; otherwise a new entry is appended, which takes
    /// precedence over any earlier `-` entry.
    pub fn set(&mut self, domain: &str, bound: LimitBound, item: &str, value: u64) {
        let in_place = self
            .lines
            .iter_mut()
            .rev()
            .find_map(|line| match line {
                Line::Entry(e) if e.applies_to(domain, bound, item) => Some(e),
                _ => None,
            })
            .filter(|e| e.kind == bound.as_str());

        if let Some(entry) = in_place {
            entry.value = value;
            return;
        }

        self.lines.push(Line::Entry(LimitEntry {
            domain: domain.to_string(),
            kind: bound.as_str().to_string(),
            item: item.to_string(),
            value,
        }));
    }

    /// Drop `(domain, bound, item)` so that no line applies to it any more.
    ///
    /// Entries of exactly that type are deleted; a `-` entry is narrowed to
    /// the other bound so its value still holds there. Returns whether
    /// anything changed.
    pub fn remove(&mut self, domain: &str, bound: LimitBound, item: &str) -> bool {
        let other = match bound {
            LimitBound::Soft => LimitBound::Hard,
            LimitBound::Hard => LimitBound::Soft,
        };
        let before = self.lines.len();
        self.lines.retain(|line| {
            !matches!(line, Line::Entry(e) if e.applies_to(domain, bound, item) && e.kind == bound.as_str())
        });
        let mut changed = self.lines.len() != before;

        for line in &mut self.lines {
            if let Line::Entry(e) = line {
                if e.applies_to(domain, bound, item) {
                    e.kind = other.as_str().to_string();
                    changed = true;
                }
            }
        }
        changed
    }

    /// Iterate over parsed entries in file order
    pub fn entries(&self) -> impl Iterator<Item = &LimitEntry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(e) => Some(e),
            Line::Verbatim(_) => None,
        })
    }
}

impl fmt::Display for LimitsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                Line::Verbatim(raw) => writeln!(f, "{}", raw)?,
                Line::Entry(entry) => writeln!(f, "{}", entry)?,
            }
        }
        Ok(())
    }
}

fn parse_entry(raw: &str) -> Option<LimitEntry> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    match fields.as_slice() {
        [domain, kind, item, value] if matches!(*kind, "soft" | "hard" | "-") => Some(LimitEntry {
            domain: domain.to_string(),
            kind: kind.to_string(),
            item: item.to_string(),
            value: parse_limit(value)?,
        }),
        _ => None,
    }
}

fn parse_limit(value: &str) -> Option<u64> {
    match value {
        "unlimited" | "infinity" | "-1" => Some(u64::MAX),
        other => other.parse().ok(),
    }
}

fn format_limit(value: u64) -> String {
    if value == u64::MAX {
        UNLIMITED.to_string()
    } else {
        value.to_string()
    }
}

/// limits.conf on disk
#[derive(Debug, Clone)]
pub struct LimitsConf {
    path: PathBuf,
}

impl LimitsConf {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecurityLimits for LimitsConf {
    fn load(&self) -> Result<LimitsFile> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(LimitsFile::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{:?} does not exist yet", self.path);
                Ok(LimitsFile::default())
            }
            Err(e) => Err(SaptuneError::io(&self.path, e)),
        }
    }

    fn store(&self, limits: &LimitsFile) -> Result<()> {
        tracing::info!("Writing resource limits to {:?}", self.path);
        std::fs::write(&self.path, limits.to_string()).with_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
# /etc/security/limits.conf
#<domain>      <type>  <item>         <value>
*               soft    core            0
@sapsys         soft    nofile          1024
@sapsys         -       nofile          4096
@dba            hard    nofile          unlimited
@sdba           soft    nofile          lots
";

    #[test]
    fn test_get_respects_dash_and_order() {
        let limits = LimitsFile::parse(SAMPLE);
        // `-` after the soft entry overrides it
        assert_eq!(limits.get("@sapsys", LimitBound::Soft, "nofile"), Some(4096));
        assert_eq!(limits.get("@sapsys", LimitBound::Hard, "nofile"), Some(4096));
        assert_eq!(limits.get("@dba", LimitBound::Hard, "nofile"), Some(u64::MAX));
        assert_eq!(limits.get("@dba", LimitBound::Soft, "nofile"), None);
        // unparsable value is left alone and not reported
        assert_eq!(limits.get("@sdba", LimitBound::Soft, "nofile"), None);
    }

    #[test]
    fn test_set_rewrites_and_appends() {
        let mut limits = LimitsFile::parse(SAMPLE);
        limits.set("@sapsys", LimitBound::Soft, "nofile", 32800);
        limits.set("@sdba", LimitBound::Hard, "nofile", 32800);

        // the appended soft entry now wins over the earlier `-` line
        let text = limits.to_string();
        let reparsed = LimitsFile::parse(&text);
        assert_eq!(reparsed.get("@sapsys", LimitBound::Soft, "nofile"), Some(32800));
        assert_eq!(reparsed.get("@sdba", LimitBound::Hard, "nofile"), Some(32800));
        assert!(text.starts_with("# /etc/security/limits.conf\n"));
        assert!(text.contains("@sdba           soft    nofile          lots"));
        assert!(text.contains("@dba\thard\tnofile\tunlimited"));
    }

    #[test]
    fn test_set_existing_in_place() {
        let mut limits = LimitsFile::parse("@dba hard nofile 1024\n");
        limits.set("@dba", LimitBound::Hard, "nofile", 65536);
        assert_eq!(limits.entries().count(), 1);
        assert_eq!(limits.to_string(), "@dba\thard\tnofile\t65536\n");
    }

    #[test]
    fn test_remove_exact_and_dash_entries() {
        let mut limits = LimitsFile::parse(SAMPLE);
        assert!(limits.remove("@sapsys", LimitBound::Soft, "nofile"));
        assert_eq!(limits.get("@sapsys", LimitBound::Soft, "nofile"), None);
        // the `-` line survives as a hard entry
        assert_eq!(limits.get("@sapsys", LimitBound::Hard, "nofile"), Some(4096));

        assert!(!limits.remove("@dba", LimitBound::Soft, "nofile"));
        assert_eq!(limits.get("@dba", LimitBound::Hard, "nofile"), Some(u64::MAX));

        let text = limits.to_string();
        assert!(text.contains("*\tsoft\tcore\t0"));
        assert!(text.contains("@sapsys\thard\tnofile\t4096"));
        assert!(!text.contains("@sapsys\tsoft"));
    }

    #[test]
    fn test_remove_undoes_appended_entry() {
        let original = LimitsFile::parse("# keep\n@dba hard nofile 1024\n");
        let mut limits = original.clone();
        limits.set("@sdba", LimitBound::Soft, "nofile", 32800);
        assert!(limits.remove("@sdba", LimitBound::Soft, "nofile"));
        assert_eq!(limits, original);
    }

    #[test]
    fn test_store_and_load() {
        let dir = TempDir::new().unwrap();
        let conf = LimitsConf::new(dir.path().join("limits.conf"));

        let mut limits = conf.load().unwrap();
        assert_eq!(limits.entries().count(), 0);

        limits.set("@sapsys", LimitBound::Hard, "nofile", 32800);
        conf.store(&limits).unwrap();
        assert_eq!(conf.load().unwrap().get("@sapsys", LimitBound::Hard, "nofile"), Some(32800));
    }
}
