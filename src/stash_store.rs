//! Stash store (§4.1): load, save, and delete the on-disk encrypted login
//! tree, keyed by a derived filename.

use std::fs;
use std::path::PathBuf;

use crate::crypto::codecs;
use crate::error::{Error, ErrorKind};
use crate::events::Publisher;
use crate::types::stash::LoginStash;

/// Path-keyed text store, mirroring the source's `disklet` abstraction. A
/// trait so tests can substitute an in-memory implementation (§4.1).
pub trait Disklet: Send + Sync {
    fn list(&self) -> Result<Vec<String>, Error>;
    fn get_text(&self, path: &str) -> Result<String, Error>;
    fn set_text(&self, path: &str, text: &str) -> Result<(), Error>;
    fn delete(&self, path: &str) -> Result<(), Error>;
}

/// The only production `Disklet`: files under `root`, written via a
/// temp-file-then-rename so a crash never leaves a half-written stash (§4.1
/// "The write must be whole-file").
pub struct FsDisklet {
    root: PathBuf,
}

impl FsDisklet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsDisklet { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Disklet for FsDisklet {
    fn list(&self) -> Result<Vec<String>, Error> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    out.push(name.to_string());
                }
            }
        }
        Ok(out)
    }

    fn get_text(&self, path: &str) -> Result<String, Error> {
        Ok(fs::read_to_string(self.resolve(path))?)
    }

    fn set_text(&self, path: &str, text: &str) -> Result<(), Error> {
        fs::create_dir_all(&self.root)?;
        let target = self.resolve(path);
        let tmp = target.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), Error> {
        let target = self.resolve(path);
        if target.exists() {
            fs::remove_file(target)?;
        }
        Ok(())
    }
}

/// `logins/<base58(loginId)>.json` (§3 invariant 7, §6 disk layout).
pub fn stash_filename(login_id_base64: &str) -> Result<String, Error> {
    let raw = codecs::base64_decode(login_id_base64)?;
    Ok(format!("{}.json", codecs::base58_encode(&raw)))
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub struct StashStore<D: Disklet> {
    disklet: D,
}

impl<D: Disklet> StashStore<D> {
    pub fn new(disklet: D) -> Self {
        StashStore { disklet }
    }

    /// Lists every file, parses it as a `LoginStash`, and skips (with a
    /// warning) anything that fails to parse — a corrupt sibling file must
    /// not abort the whole load.
    pub fn load_stashes(&self) -> Result<Vec<LoginStash>, Error> {
        let mut out = Vec::new();
        for name in self.disklet.list()? {
            if !name.ends_with(".json") {
                continue;
            }
            let text = match self.disklet.get_text(&name) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "failed to read stash file");
                    continue;
                }
            };
            match serde_json::from_str::<LoginStash>(&text) {
                Ok(stash) => out.push(stash),
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping unparseable stash file");
                }
            }
        }
        Ok(out)
    }

    /// Deletes every file whose parsed stash has `username` (normalized),
    /// then publishes `LoginStashDeleted`.
    pub fn remove_stash(&self, username: &str, publisher: Option<&Publisher>) -> Result<(), Error> {
        let target = normalize_username(username);
        for name in self.disklet.list()? {
            if !name.ends_with(".json") {
                continue;
            }
            let text = match self.disklet.get_text(&name) {
                Ok(t) => t,
                Err(_) => continue,
            };
            let stash: LoginStash = match serde_json::from_str(&text) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if stash.username.as_deref().map(normalize_username).as_deref() == Some(&target) {
                self.disklet.delete(&name)?;
            }
        }
        if let Some(p) = publisher {
            p.stash_deleted(target);
        }
        Ok(())
    }

    /// §3 invariant 7 validation, then a whole-file write, then
    /// `LoginStashSaved`.
    pub fn save_stash(&self, stash: &LoginStash, publisher: Option<&Publisher>) -> Result<(), Error> {
        stash.validate_for_save()?;
        let filename = stash_filename(&stash.login_id)?;
        let text = serde_json::to_string_pretty(stash)?;
        self.disklet.set_text(&filename, &text)?;
        if let Some(p) = publisher {
            p.stash_saved(stash.clone());
        }
        Ok(())
    }
}
