//! Scraping deployment settings out of LMS configuration files.
//!
//! Two shapes are understood: JSON (`lms.env.json`, `lms.auth.json`) and the
//! line-oriented YAML layout of `lms.yml`. Only the values the exporter needs
//! are read: `LMS_BASE` and one `DATABASES` entry.

use std::collections::BTreeMap;
use std::path::Path;

use lmsx_core::strip_decoration;
use serde_json::Value;

const LMS_BASE_KEY: &str = "LMS_BASE";
const DATABASES_KEY: &str = "DATABASES";
const FALLBACK_ALIAS: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Lines,
}

impl ConfigFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Lines,
        }
    }
}

/// Which `DATABASES` entry to read credentials from.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseSelector<'a> {
    /// Preferred alias, e.g. `read_replica`.
    pub alias: &'a str,
    /// When set, the entry whose `USER` equals this wins over the alias.
    pub user: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedSettings {
    pub lms_base: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_host: Option<String>,
    pub db_name: Option<String>,
}

impl ScrapedSettings {
    /// Fill every missing field from `other`; present fields are kept.
    pub fn merge_missing(&mut self, other: Self) {
        self.lms_base = self.lms_base.take().or(other.lms_base);
        self.db_user = self.db_user.take().or(other.db_user);
        self.db_password = self.db_password.take().or(other.db_password);
        self.db_host = self.db_host.take().or(other.db_host);
        self.db_name = self.db_name.take().or(other.db_name);
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.lms_base.is_some()
            && self.db_user.is_some()
            && self.db_password.is_some()
            && self.db_host.is_some()
            && self.db_name.is_some()
    }
}

/// Scrape one file's content.
#[must_use]
pub fn scrape(content: &str, format: ConfigFormat, selector: DatabaseSelector<'_>) -> ScrapedSettings {
    match format {
        ConfigFormat::Json => scrape_json(content, selector),
        ConfigFormat::Lines => scrape_lines(content, selector),
    }
}

type DatabaseEntry = BTreeMap<String, String>;

/// Values arrive already undecorated; JSON strings are taken verbatim.
fn settings_from(lms_base: Option<String>, entry: Option<&DatabaseEntry>) -> ScrapedSettings {
    let field = |key: &str| {
        entry
            .and_then(|entry| entry.get(key))
            .filter(|value| !value.is_empty())
            .cloned()
    };
    ScrapedSettings {
        lms_base: lms_base.filter(|value| !value.is_empty()),
        db_user: field("USER"),
        db_password: field("PASSWORD"),
        db_host: field("HOST"),
        db_name: field("NAME"),
    }
}

/// Pick the entry for `selector` from alias -> fields.
fn select_entry<'m>(
    databases: &'m BTreeMap<String, DatabaseEntry>,
    selector: DatabaseSelector<'_>,
) -> Option<&'m DatabaseEntry> {
    if let Some(user) = selector.user
        && let Some(entry) = databases.values().find(|entry| {
            entry
                .get("USER")
                .is_some_and(|value| value == user)
        })
    {
        return Some(entry);
    }
    databases
        .get(selector.alias)
        .or_else(|| databases.get(FALLBACK_ALIAS))
}

fn scrape_json(content: &str, selector: DatabaseSelector<'_>) -> ScrapedSettings {
    let Ok(root) = serde_json::from_str::<Value>(content) else {
        tracing::debug!("config content is not valid JSON; nothing scraped");
        return ScrapedSettings::default();
    };

    let lms_base = root
        .get(LMS_BASE_KEY)
        .and_then(Value::as_str)
        .map(ToString::to_string);

    let databases = root
        .get(DATABASES_KEY)
        .and_then(Value::as_object)
        .map(|aliases| {
            aliases
                .iter()
                .filter_map(|(alias, fields)| {
                    let fields = fields.as_object()?;
                    let entry = fields
                        .iter()
                        .filter_map(|(key, value)| {
                            let text = match value {
                                Value::String(text) => text.clone(),
                                Value::Number(number) => number.to_string(),
                                _ => return None,
                            };
                            Some((key.clone(), text))
                        })
                        .collect::<DatabaseEntry>();
                    Some((alias.clone(), entry))
                })
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    settings_from(lms_base, select_entry(&databases, selector))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.trim().split_once(':')?;
    Some((key.trim().trim_matches(['"', '\'']), value.trim()))
}

fn scrape_lines(content: &str, selector: DatabaseSelector<'_>) -> ScrapedSettings {
    let mut lms_base = None;
    let mut databases: BTreeMap<String, DatabaseEntry> = BTreeMap::new();

    let mut in_databases = false;
    let mut alias_indent: Option<usize> = None;
    let mut current_alias: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indent_of(line);

        if indent == 0 {
            in_databases = false;
            alias_indent = None;
            current_alias = None;

            if let Some((key, value)) = split_key_value(line) {
                if key == LMS_BASE_KEY && !value.is_empty() {
                    lms_base = Some(strip_decoration(value));
                } else if key == DATABASES_KEY && value.is_empty() {
                    in_databases = true;
                }
            }
            continue;
        }

        if !in_databases {
            continue;
        }

        let Some((key, value)) = split_key_value(line) else {
            continue;
        };

        let alias_level = *alias_indent.get_or_insert(indent);
        if indent <= alias_level {
            if value.is_empty() {
                current_alias = Some(key.to_string());
                databases.entry(key.to_string()).or_default();
            } else {
                current_alias = None;
            }
        } else if let Some(alias) = &current_alias {
            databases
                .entry(alias.clone())
                .or_default()
                .insert(key.to_string(), strip_decoration(value));
        }
    }

    settings_from(lms_base, select_entry(&databases, selector))
}
