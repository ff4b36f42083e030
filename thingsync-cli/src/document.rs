//! Notes on disk: the stand-in for the editor's active document.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use thingsync_core::Frontmatter;
use thingsync_core::encode::build_url;

#[derive(Debug, Clone)]
pub struct Note {
    pub path: PathBuf,
    pub text: String,
}

impl Note {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.text).with_context(|| format!("write {}", self.path.display()))
    }

    pub fn frontmatter(&self) -> Frontmatter {
        Frontmatter::parse(&self.text)
    }

    /// File name without the `.md` extension.
    pub fn file_stem(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.strip_suffix(".md").map(str::to_string).unwrap_or(name)
    }

    /// Line `number` (1-based), without its line ending.
    pub fn line(&self, number: usize) -> Option<&str> {
        self.text.lines().nth(number.checked_sub(1)?)
    }

    /// 1-based number of the first line equal to `text`.
    pub fn find_line(&self, text: &str) -> Option<usize> {
        self.text.lines().position(|l| l == text).map(|i| i + 1)
    }

    /// Replace line `number` (1-based), keeping its original line ending.
    pub fn replace_line(&mut self, number: usize, new_line: &str) -> Result<()> {
        let Some(index) = number.checked_sub(1) else {
            bail!("line numbers start at 1");
        };

        let mut out = String::with_capacity(self.text.len() + new_line.len());
        let mut found = false;
        for (i, line) in self.text.split_inclusive('\n').enumerate() {
            if i == index {
                let content = line.trim_end_matches(['\n', '\r']);
                out.push_str(new_line);
                out.push_str(&line[content.len()..]);
                found = true;
            } else {
                out.push_str(line);
            }
        }

        if !found {
            bail!("{} has no line {}", self.path.display(), number);
        }
        self.text = out;
        Ok(())
    }
}

/// Where a note sits inside its vault, for deep links and shortcut payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLocation {
    pub vault: String,
    /// Vault-relative path with `/` separators and no `.md` extension.
    pub relative: String,
}

impl VaultLocation {
    /// The nearest ancestor holding a `.obsidian` folder is the vault root.
    /// Without one, the parent directory stands in for the vault.
    pub fn locate(path: &Path, configured_vault: Option<&str>) -> Self {
        let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        let root = absolute
            .ancestors()
            .skip(1)
            .find(|dir| dir.join(".obsidian").is_dir())
            .or_else(|| absolute.parent());

        let relative = root
            .and_then(|root| absolute.strip_prefix(root).ok())
            .unwrap_or(absolute.as_path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let relative = relative
            .strip_suffix(".md")
            .map(str::to_string)
            .unwrap_or(relative);

        let vault = configured_vault
            .map(str::to_string)
            .or_else(|| {
                root.and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_default();

        Self { vault, relative }
    }

    /// `obsidian://open` link that reopens the note.
    pub fn deep_link(&self) -> String {
        build_url(
            "obsidian://open",
            &[("vault", self.vault.as_str()), ("file", self.relative.as_str())],
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_access_and_replace_keep_endings() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("2024-06-05.md");
        fs::write(&p, "# Now\r\n- [ ] a\r\n- [ ] b").unwrap();

        let mut note = Note::load(&p).unwrap();
        assert_eq!(note.file_stem(), "2024-06-05");
        assert_eq!(note.line(2), Some("- [ ] a"));
        assert_eq!(note.line(0), None);
        assert_eq!(note.line(9), None);
        assert_eq!(note.find_line("- [ ] b"), Some(3));

        note.replace_line(2, "- [x] a").unwrap();
        note.replace_line(3, "- [x] b").unwrap();
        assert_eq!(note.text, "# Now\r\n- [x] a\r\n- [x] b");
        assert!(note.replace_line(4, "x").is_err());
    }

    #[test]
    fn vault_root_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("Notes");
        fs::create_dir_all(vault.join(".obsidian")).unwrap();
        fs::create_dir_all(vault.join("daily")).unwrap();
        let p = vault.join("daily").join("2024-06-05.md");
        fs::write(&p, "").unwrap();

        let loc = VaultLocation::locate(&p, None);
        assert_eq!(loc.vault, "Notes");
        assert_eq!(loc.relative, "daily/2024-06-05");
        assert_eq!(
            loc.deep_link(),
            "obsidian://open?vault=Notes&file=daily%2F2024-06-05"
        );

        let named = VaultLocation::locate(&p, Some("Work Vault"));
        assert_eq!(named.vault, "Work Vault");
    }

    #[test]
    fn parent_dir_without_vault_marker() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("loose");
        fs::create_dir_all(&folder).unwrap();
        let p = folder.join("todo.md");
        fs::write(&p, "").unwrap();

        let loc = VaultLocation::locate(&p, None);
        assert_eq!(loc.vault, "loose");
        assert_eq!(loc.relative, "todo");
    }
}
