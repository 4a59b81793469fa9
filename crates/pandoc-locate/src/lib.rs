//! # pandoc-locate
//!
//! Find a usable [pandoc](https://pandoc.org) executable at runtime, so that
//! callers can shell out to it without hard-coding an install location.
//!
//! ## How it works
//!
//! On first call to [`locate_pandoc`]:
//!
//! 1. If `PANDOC_PATH` is set and points to an existing file, that file wins.
//! 2. Otherwise every directory on `PATH` is searched for the platform
//!    executable name (`pandoc` or `pandoc.exe`).
//! 3. Otherwise a short list of well-known install directories is tried
//!    (`~/.local/bin`, `~/.cabal/bin`, `/usr/local/bin`, `/opt/homebrew/bin`,
//!    `%LOCALAPPDATA%\Pandoc`).
//!
//! The resolved path is cached for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pandoc_locate::{locate_pandoc, probe_version};
//!
//! let path = locate_pandoc().expect("pandoc is not installed");
//! let version = probe_version(&path).expect("pandoc --version failed");
//! println!("using pandoc {version} at {}", path.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PANDOC_PATH` — path to a pandoc executable; skips the search.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides the search.
pub const PANDOC_PATH_ENV: &str = "PANDOC_PATH";

/// Oldest pandoc release whose HTML writer and `gfm` reader behave the way
/// the table repair pipeline expects.
pub const MIN_PANDOC_VERSION: PandocVersion = PandocVersion {
    major: 2,
    minor: 0,
    patch: 0,
};

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pandoc-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No pandoc executable was found anywhere.
    #[error(
        "pandoc was not found.\n\
Searched {n} location(s).\n\
Install it from https://pandoc.org/installing.html or set PANDOC_PATH=/path/to/pandoc",
        n = .searched.len()
    )]
    NotFound { searched: Vec<PathBuf> },

    /// `PANDOC_PATH` was set but does not point to a file.
    #[error("PANDOC_PATH is set to '{path}' but no such file exists")]
    OverrideMissing { path: PathBuf },

    /// Running `pandoc --version` failed or printed something unexpected.
    #[error("Failed to probe pandoc version at '{path}': {reason}")]
    VersionProbe { path: PathBuf, reason: String },

    /// The located pandoc is older than [`MIN_PANDOC_VERSION`].
    #[error("pandoc {found} at '{path}' is too old (need >= {min})", min = MIN_PANDOC_VERSION)]
    Unsupported { path: PathBuf, found: PandocVersion },
}

// ── Version ──────────────────────────────────────────────────────────────────

/// A pandoc release number, e.g. `3.1.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PandocVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PandocVersion {
    /// Parse the first line of `pandoc --version` output.
    ///
    /// Accepts `pandoc 3.1.9`, `pandoc.exe 2.19.2` and four-part versions
    /// such as `pandoc 2.14.0.3` (the fourth component is ignored).
    pub fn parse_banner(banner: &str) -> Option<Self> {
        let first = banner.lines().next()?.trim();
        let (name, rest) = first.split_once(char::is_whitespace)?;
        if !name.to_ascii_lowercase().starts_with("pandoc") {
            return None;
        }
        let mut parts = rest.trim().split('.').map(|p| p.parse::<u32>());
        let major = parts.next()?.ok()?;
        let minor = parts.next().and_then(Result::ok).unwrap_or(0);
        let patch = parts.next().and_then(Result::ok).unwrap_or(0);
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for PandocVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ── Search locations ─────────────────────────────────────────────────────────

/// Platform executable file name.
pub fn pandoc_exe_name() -> &'static str {
    if cfg!(windows) {
        "pandoc.exe"
    } else {
        "pandoc"
    }
}

/// Directories searched after `PATH`, in order.
pub fn fallback_dirs() -> Vec<PathBuf> {
    let mut dirs_out = Vec::new();
    if let Some(home) = dirs::home_dir() {
        dirs_out.push(home.join(".local").join("bin"));
        dirs_out.push(home.join(".cabal").join("bin"));
    }
    if cfg!(windows) {
        if let Some(local) = dirs::data_local_dir() {
            dirs_out.push(local.join("Pandoc"));
        }
    } else {
        dirs_out.push(PathBuf::from("/usr/local/bin"));
        dirs_out.push(PathBuf::from("/opt/homebrew/bin"));
    }
    dirs_out
}

/// Every directory [`locate_pandoc`] would look in, `PATH` first.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    for dir in fallback_dirs() {
        if !out.contains(&dir) {
            out.push(dir);
        }
    }
    out
}

/// Return the first `dir/exe_name` that exists as a file.
pub fn find_in_dirs<I, P>(dirs_iter: I, exe_name: &str) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    dirs_iter
        .into_iter()
        .map(|d| d.as_ref().join(exe_name))
        .find(|candidate| candidate.is_file())
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve the pandoc executable, honouring `PANDOC_PATH`.
///
/// The first successful lookup is cached; later calls are a field read.
pub fn locate_pandoc() -> Result<PathBuf, LocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve()?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` when [`locate_pandoc`] would succeed.
pub fn is_pandoc_available() -> bool {
    locate_pandoc().is_ok()
}

/// Run `<path> --version` and parse the banner line.
pub fn probe_version(path: &Path) -> Result<PandocVersion, LocateError> {
    let output = Command::new(path)
        .arg("--version")
        .output()
        .map_err(|e| LocateError::VersionProbe {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(LocateError::VersionProbe {
            path: path.to_path_buf(),
            reason: format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    PandocVersion::parse_banner(&stdout).ok_or_else(|| LocateError::VersionProbe {
        path: path.to_path_buf(),
        reason: format!("unrecognised banner {:?}", stdout.lines().next().unwrap_or("")),
    })
}

/// Locate pandoc and reject releases older than [`MIN_PANDOC_VERSION`].
pub fn ensure_pandoc() -> Result<(PathBuf, PandocVersion), LocateError> {
    let path = locate_pandoc()?;
    let version = probe_version(&path)?;
    if version < MIN_PANDOC_VERSION {
        return Err(LocateError::Unsupported {
            path,
            found: version,
        });
    }
    Ok((path, version))
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve() -> Result<PathBuf, LocateError> {
    if let Some(env_path) = std::env::var_os(PANDOC_PATH_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_file() {
            return Ok(p);
        }
        return Err(LocateError::OverrideMissing { path: p });
    }

    let searched = search_dirs();
    find_in_dirs(&searched, pandoc_exe_name()).ok_or(LocateError::NotFound { searched })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
