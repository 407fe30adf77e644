use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Local;
use tracing::{info, warn};

use wifi_sweep_abstract::ExperimentPlan;

/// How to treat a stale output file left behind by an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalePolicy {
    /// Ask before removing; declining aborts the sweep.
    Prompt,
    /// Remove without asking.
    Remove,
    /// Refuse to run.
    Fail,
}

/// Answers yes/no questions for `StalePolicy::Prompt`.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Clear a leftover output file before the sweep starts.
///
/// Rows appended by an earlier run would otherwise be averaged into the
/// first combination of this one.
pub fn clear_stale_output(
    path: &Path,
    policy: StalePolicy,
    confirm: &mut dyn Confirm,
) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    match policy {
        StalePolicy::Remove => {}
        StalePolicy::Fail => bail!("stale output file {} already exists", path.display()),
        StalePolicy::Prompt => {
            let remove = confirm.confirm(&format!(
                "Remove existing file {}? [Yes/No]",
                path.display()
            ))?;
            if !remove {
                bail!("aborted: stale output file {} left in place", path.display());
            }
        }
    }
    fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    info!("removed stale output file {}", path.display());
    Ok(())
}

/// Directory collecting everything one sweep produces: relocated data files,
/// the effective plan, the report and the rendered charts.
pub struct ResultsWorkspace {
    dir: PathBuf,
}

impl ResultsWorkspace {
    /// Create `<root>/<plan-name>-<YYYYmmdd-HHMMSS>/`.
    pub fn create(root: &Path, plan_name: &str) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let dir = root.join(format!("{plan_name}-{stamp}"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create results directory {}", dir.display()))?;
        info!("results directory: {}", dir.display());
        Ok(ResultsWorkspace { dir })
    }

    /// Wrap an existing directory without touching its contents.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
        Ok(ResultsWorkspace { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move the simulator's output file here as `<stem>_<label>.dat`.
    ///
    /// Refuses to overwrite: two combinations mapping to the same label is a
    /// plan bug that must not cost the first combination its data.
    pub fn relocate(&self, src: &Path, stem: &str, label: &str) -> Result<PathBuf> {
        let dest = self.dir.join(format!("{stem}_{label}.dat"));
        if dest.exists() {
            bail!("relocation target {} already exists", dest.display());
        }
        if fs::rename(src, &dest).is_err() {
            // results root can live on a different filesystem
            fs::copy(src, &dest).with_context(|| {
                format!("failed to move {} to {}", src.display(), dest.display())
            })?;
            fs::remove_file(src)
                .with_context(|| format!("failed to remove {}", src.display()))?;
        }
        Ok(dest)
    }

    /// Copy of the effective plan, next to the data it produced.
    pub fn write_plan(&self, plan: &ExperimentPlan) -> Result<PathBuf> {
        let text = toml::to_string_pretty(plan).context("failed to serialize plan")?;
        let path = self.dir.join("plan.toml");
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn read_plan(dir: &Path) -> Result<ExperimentPlan> {
        let path = dir.join("plan.toml");
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let plan =
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(plan)
    }

    /// Record which simulator commit produced the data, as `git-commit.txt`.
    ///
    /// Best effort: a missing `git` binary or a simulator tree that is not a
    /// repository only logs a warning.
    pub fn snapshot_git_state(&self, repo: &Path) {
        let result = Command::new("git")
            .arg("show")
            .arg("--name-only")
            .current_dir(repo)
            .output();
        match result {
            Ok(output) if output.status.success() => {
                let path = self.dir.join("git-commit.txt");
                if let Err(err) = fs::write(&path, &output.stdout) {
                    warn!("could not write git snapshot: {err}");
                }
            }
            Ok(output) => {
                warn!(
                    "git show failed in {} ({}); skipping provenance snapshot",
                    repo.display(),
                    output.status
                );
            }
            Err(err) => {
                warn!("git not available ({err}); skipping provenance snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(bool);

    impl Confirm for Scripted {
        fn confirm(&mut self, _message: &str) -> Result<bool> {
            Ok(self.0)
        }
    }

    #[test]
    fn missing_output_file_needs_no_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi-mld.dat");
        let mut confirm = Scripted(false);
        clear_stale_output(&path, StalePolicy::Prompt, &mut confirm).unwrap();
    }

    #[test]
    fn prompt_policy_removes_on_yes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi-mld.dat");
        fs::write(&path, "stale\n").unwrap();
        let mut confirm = Scripted(true);
        clear_stale_output(&path, StalePolicy::Prompt, &mut confirm).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn prompt_policy_aborts_on_no() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi-mld.dat");
        fs::write(&path, "stale\n").unwrap();
        let mut confirm = Scripted(false);
        let err = clear_stale_output(&path, StalePolicy::Prompt, &mut confirm).unwrap_err();
        assert!(err.to_string().contains("aborted"));
        assert!(path.exists());
    }

    #[test]
    fn fail_policy_refuses_to_touch_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi-mld.dat");
        fs::write(&path, "stale\n").unwrap();
        let mut confirm = Scripted(true);
        let err = clear_stale_output(&path, StalePolicy::Fail, &mut confirm).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(path.exists());
    }

    #[test]
    fn remove_policy_clears_without_asking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wifi-mld.dat");
        fs::write(&path, "stale\n").unwrap();
        let mut confirm = Scripted(false);
        clear_stale_output(&path, StalePolicy::Remove, &mut confirm).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn workspace_directory_is_named_after_the_plan() {
        let root = tempfile::tempdir().unwrap();
        let workspace = ResultsWorkspace::create(root.path(), "cw-grid").unwrap();
        let name = workspace
            .dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.starts_with("cw-grid-"), "{name}");
        assert!(workspace.dir().is_dir());
    }

    #[test]
    fn relocation_moves_and_renames_the_output() {
        let root = tempfile::tempdir().unwrap();
        let sim = tempfile::tempdir().unwrap();
        let workspace = ResultsWorkspace::create(root.path(), "plan").unwrap();

        let src = sim.path().join("wifi-mld.dat");
        fs::write(&src, "1,2,3\n").unwrap();
        let dest = workspace
            .relocate(&src, "wifi-mld", "lambda-0.001_bw-20")
            .unwrap();

        assert!(!src.exists());
        assert_eq!(
            dest.file_name().unwrap().to_string_lossy(),
            "wifi-mld_lambda-0.001_bw-20.dat"
        );
        assert_eq!(fs::read_to_string(dest).unwrap(), "1,2,3\n");
    }

    #[test]
    fn relocation_refuses_to_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let sim = tempfile::tempdir().unwrap();
        let workspace = ResultsWorkspace::create(root.path(), "plan").unwrap();

        let src = sim.path().join("wifi-mld.dat");
        fs::write(&src, "first\n").unwrap();
        workspace.relocate(&src, "wifi-mld", "same").unwrap();

        fs::write(&src, "second\n").unwrap();
        let err = workspace.relocate(&src, "wifi-mld", "same").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
