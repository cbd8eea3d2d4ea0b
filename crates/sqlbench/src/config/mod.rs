use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

pub const DEFAULT_DB_PATH: &str = "data/Biblioteca.db";
pub const DEFAULT_CASES_PATH: &str = "test_cases/queries.json";
pub const DEFAULT_OUT_DIR: &str = "results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    pub db_path: PathBuf,
    pub cases_path: PathBuf,
    pub models_file: Option<PathBuf>,
}

/// User-supplied path overrides. Unset entries fall back to the
/// project-relative defaults under `cwd`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathOverrides<'a> {
    pub out_dir: Option<&'a Path>,
    pub db_path: Option<&'a Path>,
    pub cases_path: Option<&'a Path>,
    pub models_file: Option<&'a Path>,
}

pub fn resolve_runtime_paths(
    home_dir: &Path,
    cwd: &Path,
    overrides: &PathOverrides<'_>,
) -> Result<RuntimePaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let home_dir = normalize_lexical(home_dir);
    let cwd = normalize_lexical(cwd);
    let resolve = |path: Option<&Path>, default: &str| match path {
        Some(path) => resolve_user_path(path, &home_dir, &cwd),
        None => Ok(normalize_lexical(&cwd.join(default))),
    };

    let out_dir = resolve(overrides.out_dir, DEFAULT_OUT_DIR)?;
    let db_path = resolve(overrides.db_path, DEFAULT_DB_PATH)?;
    let cases_path = resolve(overrides.cases_path, DEFAULT_CASES_PATH)?;
    let models_file = overrides
        .models_file
        .map(|path| resolve_user_path(path, &home_dir, &cwd))
        .transpose()?;

    Ok(RuntimePaths {
        home_dir,
        cwd,
        out_dir,
        db_path,
        cases_path,
        models_file,
    })
}

fn resolve_user_path(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}
