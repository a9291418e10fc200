//! File-backed INI configuration store.
//!
//! Every read parses the file again, so callers always observe what is on
//! disk at the time of the call. Use [`ConfigStore::snapshot`] when several
//! reads must come from the same parse.

use crate::ini::IniDocument;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Handle on an INI file that exists on disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Bind to `path`, which must be an existing file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound { path: path.to_path_buf() });
        }
        Ok(Self { path: path.to_path_buf() })
    }

    /// File this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the current file content.
    pub fn snapshot(&self) -> Result<IniDocument> {
        let text = fs::read_to_string(&self.path).map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })?;
        IniDocument::parse(&text).map_err(|source| Error::Syntax {
            path: self.path.clone(),
            source,
        })
    }

    /// Value of `section.option`, read from disk now.
    pub fn get(&self, section: &str, option: &str) -> Result<String> {
        let value = self.snapshot()?.get(section, option)?.to_string();
        tracing::debug!(path = %self.path.display(), section, option, "read config value");
        Ok(value)
    }

    /// All options of `section` with their values, from a single parse.
    pub fn get_all(&self, section: &str) -> Result<BTreeMap<String, String>> {
        self.snapshot()?.get_all(section)
    }

    /// Section names in file order.
    pub fn sections(&self) -> Result<Vec<String>> {
        Ok(self.snapshot()?.sections().map(str::to_string).collect())
    }

    /// Option names of `section`, including `DEFAULT` fallbacks.
    pub fn options(&self, section: &str) -> Result<Vec<String>> {
        let doc = self.snapshot()?;
        let names = doc.options(section)?;
        Ok(names.into_iter().map(str::to_string).collect())
    }

    /// Overwrite an existing option and write the whole file back.
    ///
    /// Not atomic: a concurrent writer on the same path may be lost.
    pub fn set(&self, section: &str, option: &str, value: &str) -> Result<()> {
        let mut doc = self.snapshot()?;
        doc.set(section, option, value)?;
        fs::write(&self.path, doc.to_string()).map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), section, option, "updated config value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("config.ini");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn open_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.ini");
        match ConfigStore::open(&missing) {
            Err(Error::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn open_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(ConfigStore::open(dir.path()), Err(Error::NotFound { .. })));
    }

    #[test]
    fn reads_reflect_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[Platform]\nurl = http://a\n");
        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(store.get("Platform", "url").unwrap(), "http://a");

        fs::write(&path, "[Platform]\nurl = http://b\n").unwrap();
        assert_eq!(store.get("Platform", "url").unwrap(), "http://b");
    }

    #[test]
    fn set_rewrites_file_and_keeps_other_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[Platform]\nurl = http://a-very-long-address.example\nenable-stderr = false\n\n[RunSetting]\nmax-run = 4\n",
        );
        let store = ConfigStore::open(&path).unwrap();

        store.set("Platform", "url", "http://b").unwrap();

        assert_eq!(store.get("Platform", "url").unwrap(), "http://b");
        assert_eq!(store.get("Platform", "enable-stderr").unwrap(), "false");
        assert_eq!(store.get("RunSetting", "max-run").unwrap(), "4");
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "[Platform]\nurl = http://b\nenable-stderr = false\n\n[RunSetting]\nmax-run = 4\n\n"
        );
    }

    #[test]
    fn set_does_not_create_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[Platform]\nurl = http://a\n");
        let store = ConfigStore::open(&path).unwrap();

        assert!(matches!(store.set("Platform", "port", "80"), Err(Error::MissingOption { .. })));
        assert!(matches!(store.set("Engine", "url", "x"), Err(Error::MissingSection { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[Platform]\nurl = http://a\n");
    }

    #[test]
    fn syntax_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "url = http://a\n");
        let store = ConfigStore::open(&path).unwrap();
        match store.get("Platform", "url") {
            Err(Error::Syntax { path: reported, source }) => {
                assert_eq!(reported, path);
                assert_eq!(source.line, 1);
            }
            other => panic!("expected Syntax, got {other:?}"),
        }
    }

    #[test]
    fn lists_sections_and_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[Header]\nb = 2\na = 1\n[Engine]\nengine-code = e\n");
        let store = ConfigStore::open(&path).unwrap();
        assert_eq!(store.sections().unwrap(), vec!["Header", "Engine"]);
        assert_eq!(store.options("Header").unwrap(), vec!["b", "a"]);
        let all = store.get_all("Header").unwrap();
        assert_eq!(all.get("a").map(String::as_str), Some("1"));
        assert_eq!(all.get("b").map(String::as_str), Some("2"));
    }
}
