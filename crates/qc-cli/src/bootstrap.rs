use std::path::{Path, PathBuf};

use anyhow::Context;
use qc_config::{PROJECT_DIR, QConsoleConfig};

/// Load layered configuration for `project_root`, reading its `.env` first.
pub fn load_config(project_root: &Path) -> anyhow::Result<QConsoleConfig> {
    QConsoleConfig::load_with_dotenv(project_root).with_context(|| {
        format!(
            "failed to load qconsole configuration for {}",
            project_root.display()
        )
    })
}

/// Resolve the project root from `--project`, else the current directory.
pub fn resolve_project_root(project_override: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_override {
        let explicit = PathBuf::from(path);

        if explicit
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == PROJECT_DIR)
        {
            return explicit
                .parent()
                .map(Path::to_path_buf)
                .context("invalid --project path: '.qconsole' directory has no parent");
        }

        if explicit.is_dir() {
            return Ok(explicit);
        }

        anyhow::bail!(
            "invalid --project '{}': directory does not exist",
            explicit.display()
        );
    }

    std::env::current_dir().context("failed to read current directory")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::resolve_project_root;

    #[test]
    fn explicit_directory_is_used_as_is() {
        let temp = TempDir::new().expect("tempdir should create");
        let path = temp.path().to_string_lossy().into_owned();

        let root = resolve_project_root(Some(&path)).expect("root should resolve");
        assert_eq!(root, temp.path());
    }

    #[test]
    fn explicit_project_dir_resolves_to_parent() {
        let temp = TempDir::new().expect("tempdir should create");
        let state = temp.path().join(".qconsole");
        std::fs::create_dir(&state).expect(".qconsole should create");

        let root = resolve_project_root(Some(&state.to_string_lossy())).expect("root should resolve");
        assert_eq!(root, temp.path());
    }

    #[test]
    fn current_directory_is_the_default_root() {
        let root = resolve_project_root(None).expect("root should resolve");
        assert_eq!(root, std::env::current_dir().expect("cwd should resolve"));
    }

    #[test]
    fn missing_explicit_directory_is_an_error() {
        let temp = TempDir::new().expect("tempdir should create");
        let gone = temp.path().join("gone");

        let error = resolve_project_root(Some(&gone.to_string_lossy())).unwrap_err();
        assert!(error.to_string().contains("does not exist"));
    }
}
