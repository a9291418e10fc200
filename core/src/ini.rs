//! In-memory INI document: parsing, lookup, mutation and serialization.
//!
//! Dialect:
//! - `[name]` opens a section; section names are case-sensitive.
//! - `key = value` or `key: value`; option names are case-insensitive.
//! - Full-line comments start with `#` or `;`. Inline comments are kept as
//!   part of the value.
//! - Lines indented deeper than their option line continue its value.
//! - `[DEFAULT]` supplies fallback options to every other section.
//!
//! Values are plain strings. Nothing is interpolated or coerced.

use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

/// Name of the section whose options act as fallbacks for every section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Malformed INI input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct SyntaxError {
    /// 1-based line number of the offending line.
    pub line: usize,
    /// What was wrong with the line.
    pub reason: String,
}

impl SyntaxError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self { line, reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), entries: Vec::new() }
    }

    fn find(&self, option: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == option)
            .map(|(_, value)| value.as_str())
    }

    fn find_mut(&mut self, option: &str) -> Option<&mut String> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == option)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    Defaults,
    Section(usize),
}

/// Continuation state for the option most recently read.
struct OpenValue {
    indent: usize,
    blank_lines: usize,
}

/// Parsed INI content, sections kept in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    defaults: Section,
    sections: Vec<Section>,
}

impl Default for IniDocument {
    fn default() -> Self {
        Self { defaults: Section::new(DEFAULT_SECTION), sections: Vec::new() }
    }
}

impl IniDocument {
    /// Parse INI text.
    pub fn parse(text: &str) -> std::result::Result<Self, SyntaxError> {
        let mut doc = Self::default();
        let mut cursor: Option<Cursor> = None;
        let mut open: Option<OpenValue> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                if let Some(value) = open.as_mut() {
                    value.blank_lines += 1;
                }
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indent = raw.len() - raw.trim_start().len();
            if let (Some(value), Some(at)) = (open.as_mut(), cursor) {
                if indent > value.indent {
                    let continued = doc
                        .section_at_mut(at)
                        .entries
                        .last_mut()
                        .map(|(_, existing)| existing);
                    if let Some(existing) = continued {
                        for _ in 0..value.blank_lines {
                            existing.push('\n');
                        }
                        existing.push('\n');
                        existing.push_str(trimmed);
                    }
                    value.blank_lines = 0;
                    continue;
                }
            }
            open = None;

            if let Some(name) = parse_header(trimmed) {
                if name.is_empty() {
                    return Err(SyntaxError::new(line, "empty section name"));
                }
                cursor = Some(doc.open_section(name, line)?);
                continue;
            }

            let Some(at) = cursor else {
                return Err(SyntaxError::new(line, "option appears before any section header"));
            };
            let Some(split) = trimmed.find(|c: char| c == '=' || c == ':') else {
                return Err(SyntaxError::new(line, format!("expected `key = value`, found {trimmed:?}")));
            };
            let key = trimmed[..split].trim().to_lowercase();
            let value = trimmed[split + 1..].trim();
            if key.is_empty() {
                return Err(SyntaxError::new(line, "empty option name"));
            }

            let section = doc.section_at_mut(at);
            if section.find(&key).is_some() {
                return Err(SyntaxError::new(
                    line,
                    format!("option '{key}' in section '{}' already exists", section.name),
                ));
            }
            section.entries.push((key, value.to_string()));
            open = Some(OpenValue { indent, blank_lines: 0 });
        }

        Ok(doc)
    }

    fn open_section(&mut self, name: &str, line: usize) -> std::result::Result<Cursor, SyntaxError> {
        if name == DEFAULT_SECTION {
            return Ok(Cursor::Defaults);
        }
        if self.position(name).is_some() {
            return Err(SyntaxError::new(line, format!("section '{name}' already exists")));
        }
        self.sections.push(Section::new(name));
        Ok(Cursor::Section(self.sections.len() - 1))
    }

    fn section_at_mut(&mut self, cursor: Cursor) -> &mut Section {
        match cursor {
            Cursor::Defaults => &mut self.defaults,
            Cursor::Section(index) => &mut self.sections[index],
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.name == name)
    }

    fn section(&self, name: &str) -> Result<&Section> {
        self.position(name)
            .map(|index| &self.sections[index])
            .ok_or_else(|| Error::MissingSection { section: name.to_string() })
    }

    /// Section names in file order, `DEFAULT` excluded.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.name.as_str())
    }

    /// Whether a non-`DEFAULT` section named `name` exists.
    pub fn has_section(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Option names visible in `section`: its own first, then `DEFAULT` ones.
    pub fn options(&self, section: &str) -> Result<Vec<&str>> {
        let found = self.section(section)?;
        let mut names: Vec<&str> = found.entries.iter().map(|(key, _)| key.as_str()).collect();
        for (key, _) in &self.defaults.entries {
            if found.find(key).is_none() {
                names.push(key.as_str());
            }
        }
        Ok(names)
    }

    /// Look up one value, falling back to `DEFAULT`.
    pub fn get(&self, section: &str, option: &str) -> Result<&str> {
        let key = option.to_lowercase();
        let own = if section == DEFAULT_SECTION {
            None
        } else {
            self.section(section)?.find(&key)
        };
        own.or_else(|| self.defaults.find(&key)).ok_or_else(|| Error::MissingOption {
            section: section.to_string(),
            option: key,
        })
    }

    /// Every option visible in `section` with its value.
    pub fn get_all(&self, section: &str) -> Result<BTreeMap<String, String>> {
        let mut all = BTreeMap::new();
        for option in self.options(section)? {
            all.insert(option.to_string(), self.get(section, option)?.to_string());
        }
        Ok(all)
    }

    /// Replace the value of an option that already exists.
    ///
    /// An option inherited from `DEFAULT` is overridden inside `section`;
    /// the `DEFAULT` value itself is left alone.
    pub fn set(&mut self, section: &str, option: &str, value: impl Into<String>) -> Result<()> {
        let key = option.to_lowercase();
        self.get(section, &key)?;
        let target = match self.position(section) {
            Some(index) => &mut self.sections[index],
            None => &mut self.defaults,
        };
        match target.find_mut(&key) {
            Some(existing) => *existing = value.into(),
            None => target.entries.push((key, value.into())),
        }
        Ok(())
    }
}

fn parse_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    rest.rfind(']').map(|end| &rest[..end])
}

impl fmt::Display for IniDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defaults = Some(&self.defaults).filter(|section| !section.entries.is_empty());
        for section in defaults.into_iter().chain(&self.sections) {
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{key} = {}", value.replace('\n', "\n\t"))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
