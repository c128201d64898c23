use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// Resolve the application home directory to an absolute path.
///
/// - `None` falls back to `$HOME/<default_subdir>`.
/// - A leading `~` is expanded to the user's home directory.
/// - Relative paths are anchored at the current working directory.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let user_home = || dirs::home_dir().ok_or_else(|| anyhow!("cannot determine user home directory"));

    let path = match configured {
        None => user_home()?.join(default_subdir),
        Some(raw) if raw == "~" => user_home()?,
        Some(raw) => match raw.strip_prefix("~/") {
            Some(rest) => user_home()?.join(rest),
            None => PathBuf::from(raw),
        },
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("cannot read current directory")?
            .join(path)
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }

    Ok(path)
}
