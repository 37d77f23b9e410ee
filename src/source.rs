//! Where project directories come from
//!
//! Projects live either in a local directory or in a git repository that
//! is checked out into the user cache directory before the rollout.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::cli::SourceArgs;
use crate::runner;

/// Root containing one sub-directory per project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSource {
    Local(PathBuf),
    Git { url: String, branch: String },
}

impl ProjectSource {
    /// Build the source from CLI flags, falling back to `default_root`
    pub fn from_args(args: &SourceArgs, default_root: &Path) -> Self {
        if let Some(url) = &args.git_url {
            return Self::Git {
                url: url.clone(),
                branch: args.git_branch.clone(),
            };
        }
        match &args.path {
            Some(path) => Self::Local(expand_path(path)),
            None => Self::Local(default_root.to_path_buf()),
        }
    }

    /// Make the projects root available on disk and return it
    pub fn prepare(&self) -> Result<PathBuf> {
        match self {
            Self::Local(path) => {
                if !path.is_dir() {
                    bail!("Projects directory does not exist: {}", path.display());
                }
                Ok(path.clone())
            }
            Self::Git { url, branch } => {
                let dir = checkout_dir(url, branch)?;
                sync_checkout(url, branch, &dir)?;
                Ok(dir)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Git { url, branch } => format!("{url} ({branch})"),
        }
    }
}

/// Expand `~` and environment variables in a user supplied path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Cache directory for a (url, branch) checkout
fn checkout_dir(url: &str, branch: &str) -> Result<PathBuf> {
    let cache = dirs::cache_dir().context("Could not determine cache directory")?;
    Ok(cache.join("rollout").join("checkouts").join(checkout_key(url, branch)))
}

/// Stable short key for a checkout
fn checkout_key(url: &str, branch: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\0");
    hasher.update(branch.as_bytes());
    let hash = hasher.finalize().to_hex().to_string();
    format!("{}-{}", repo_name_from_url(url).unwrap_or("repo"), &hash[..16])
}

/// Extract repo name from a git URL
fn repo_name_from_url(url: &str) -> Option<&str> {
    let url = url.trim_end_matches('/').trim_end_matches(".git");
    url.rsplit(['/', ':']).next().filter(|s| !s.is_empty())
}

/// Clone the branch, or bring an existing checkout up to date
fn sync_checkout(url: &str, branch: &str, dir: &Path) -> Result<()> {
    let dir_str = dir.to_string_lossy();

    if dir.join(".git").is_dir() {
        log::info!("Updating checkout of {url} ({branch}) in {dir_str}");
        runner::run_checked("git", &["-C", &dir_str, "fetch", "--depth", "1", "origin", branch])?;
        let target = format!("origin/{branch}");
        runner::run_checked("git", &["-C", &dir_str, "checkout", "-B", branch, &target])?;
        runner::run_checked("git", &["-C", &dir_str, "reset", "--hard", &target])?;
    } else {
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        log::info!("Cloning {url} ({branch}) into {dir_str}");
        runner::run_checked(
            "git",
            &["clone", "--depth", "1", "--branch", branch, url, &dir_str],
        )?;
    }
    Ok(())
}
