//! INI reader built on `ChainMap`: a map of section name to a map of
//! key to value, both keyed by string.
//!
//! Lines are stripped of surrounding spaces and tabs. Blank lines and lines
//! starting with `#` or `;` are skipped. `[name]` opens a section; reopening
//! a name adds to the existing section. Everything else must be
//! `key = value` inside a section, split on the first `=`.

use crate::chain_map::ChainMap;
use crate::error::IniError;
use crate::ops::StrOps;
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Keys to values within one section.
pub type Section = ChainMap<String, String, StrOps>;

pub struct IniFile {
    sections: ChainMap<String, Section, StrOps>,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn reject(err: IniError) -> IniError {
    warn!("[inifile] {}", err);
    err
}

impl IniFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IniError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let file = Self::parse(&text)?;
        debug!(
            "parsed {} ({} sections)",
            path.display(),
            file.sections.len()
        );
        Ok(file)
    }

    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut sections: ChainMap<String, Section, StrOps> = ChainMap::with_ops(StrOps);
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim_matches(is_blank);
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| reject(IniError::MissingSectionEnd { line }))?
                    .trim_matches(is_blank);
                if !sections.contains(name) {
                    sections.put(name.to_string(), Section::with_ops(StrOps))?;
                }
                current = Some(name.to_string());
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| reject(IniError::ExpectedKeyValue { line }))?;
            let section_name = current
                .as_deref()
                .ok_or_else(|| reject(IniError::KeyOutsideSection { line }))?;
            let key = key.trim_matches(is_blank);
            if key.is_empty() {
                return Err(reject(IniError::EmptyKey { line }));
            }
            let value = value.trim_matches(is_blank);

            if let Some(section) = sections.get_mut(section_name) {
                section.put(key.to_string(), value.to_string())?;
            }
        }

        Ok(Self { sections })
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.sections.contains(name)
    }

    /// Value of `key` in `section`, if both exist.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
