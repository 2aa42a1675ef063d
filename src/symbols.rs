//! Searchable index of documented symbols.
//!
//! Each entry is the tuple `(search key, display label, target anchor,
//! owning scope)`; serialized, an index is a JSON array of such 4-element
//! arrays.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String, String, String)", into = "(String, String, String, String)")]
pub struct SymbolEntry {
    pub key: String,
    pub label: String,
    pub anchor: String,
    pub scope: String,
}

impl From<(String, String, String, String)> for SymbolEntry {
    fn from((key, label, anchor, scope): (String, String, String, String)) -> Self {
        Self {
            key,
            label,
            anchor,
            scope,
        }
    }
}

impl From<SymbolEntry> for (String, String, String, String) {
    fn from(entry: SymbolEntry) -> Self {
        (entry.key, entry.label, entry.anchor, entry.scope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    Struct,
    Enum,
    Trait,
    Fn,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolIndex {
    entries: Vec<SymbolEntry>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`, declared in `module` (a `::` path below the crate
    /// root), with a rustdoc style anchor.
    pub fn add(&mut self, kind: SymbolKind, module: &str, name: &str) -> &mut Self {
        let scope = if module.is_empty() {
            env!("CARGO_PKG_NAME").to_string()
        } else {
            format!("{}::{}", env!("CARGO_PKG_NAME"), module)
        };
        let anchor = format!("{}/{}.{}.html", scope.replace("::", "/"), kind, name);

        self.entries.push(SymbolEntry {
            key: name.to_lowercase(),
            label: name.to_string(),
            anchor,
            scope,
        });
        self
    }

    pub fn push(&mut self, entry: SymbolEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose key starts with `prefix`, ignoring case, in the order
    /// they were added.
    pub fn search<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a SymbolEntry> + 'a {
        let prefix = prefix.to_lowercase();
        self.entries
            .iter()
            .filter(move |entry| entry.key.to_lowercase().starts_with(&prefix))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

lazy_static::lazy_static! {
    static ref INDEX: SymbolIndex = build_index();
}

fn build_index() -> SymbolIndex {
    use SymbolKind::*;

    let mut index = SymbolIndex::new();
    index
        .add(Struct, "logger", "Logger")
        .add(Struct, "record", "Record")
        .add(Fn, "record", "restore_format")
        .add(Enum, "level", "Level")
        .add(Enum, "error", "LoggingError")
        .add(Trait, "element", "Element")
        .add(Trait, "filters", "Filter")
        .add(Struct, "filters", "LevelFilter")
        .add(Struct, "filters", "LoggerFilter")
        .add(Struct, "filters", "MessageFilter")
        .add(Struct, "filters", "SwitchFilter")
        .add(Trait, "layouts", "Layout")
        .add(Struct, "layouts", "BinaryLayout")
        .add(Struct, "layouts", "EmptyLayout")
        .add(Struct, "layouts", "HashLayout")
        .add(Struct, "layouts", "JsonLayout")
        .add(Struct, "layouts", "NullLayout")
        .add(Struct, "layouts", "TextLayout")
        .add(Trait, "appenders", "Appender")
        .add(Struct, "appenders", "ConsoleAppender")
        .add(Struct, "appenders", "DebugAppender")
        .add(Struct, "appenders", "ErrorAppender")
        .add(Struct, "appenders", "FileAppender")
        .add(Struct, "appenders", "MemoryAppender")
        .add(Struct, "appenders", "NullAppender")
        .add(Struct, "appenders", "RollingFileAppender")
        .add(Struct, "appenders", "WriterAppender")
        .add(Trait, "processors", "Processor")
        .add(Struct, "processors", "AsyncWaitProcessor")
        .add(Struct, "processors", "AsyncWaitFreeProcessor")
        .add(Struct, "processors", "BufferedProcessor")
        .add(Struct, "processors", "DefaultProcessor")
        .add(Struct, "processors", "ExclusiveProcessor")
        .add(Struct, "processors", "SyncProcessor")
        .add(Fn, "config", "configure_logger")
        .add(Fn, "config", "create_logger")
        .add(Fn, "config", "shutdown")
        .add(Fn, "config", "startup")
        .add(Struct, "hashlog", "Hashlog")
        .add(Struct, "reader", "BinaryReader")
        .add(Struct, "reader", "HashReader")
        .add(Struct, "settings", "Settings")
        .add(Struct, "bridge", "LogBridge")
        .add(Struct, "symbols", "SymbolIndex");

    #[cfg(unix)]
    index.add(Struct, "appenders", "SyslogAppender");

    index
}

/// Index of this crate's public API.
pub fn index() -> &'static SymbolIndex {
    &INDEX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_prefix() {
        let labels: Vec<&str> = index()
            .search("LEVEL")
            .map(|entry| entry.label.as_str())
            .collect();
        assert_eq!(labels, ["Level", "LevelFilter"]);

        let filters: Vec<&str> = index()
            .search("l")
            .map(|entry| entry.label.as_str())
            .collect();
        assert_eq!(
            filters,
            ["Logger", "Level", "LoggingError", "LevelFilter", "LoggerFilter", "Layout", "LogBridge"]
        );

        assert_eq!(index().search("").count(), index().len());
        assert_eq!(index().search("nothing").count(), 0);
    }

    #[test]
    fn test_entry_fields() {
        let entry = index().search("layout").next().unwrap();
        assert_eq!(entry.key, "layout");
        assert_eq!(entry.anchor, "lumber/layouts/trait.Layout.html");
        assert_eq!(entry.scope, "lumber::layouts");
    }

    #[test]
    fn test_json_tuples() {
        let mut index = SymbolIndex::new();
        index.add(SymbolKind::Struct, "", "Root");

        let json = index.to_json().unwrap();
        assert_eq!(json, r#"[["root","Root","lumber/struct.Root.html","lumber"]]"#);
        assert_eq!(SymbolIndex::from_json(&json).unwrap(), index);
    }
}
