use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Runs one simulator program with a set of `--flag=value` arguments.
///
/// `check` runs once before a sweep and its failures are fatal; a failing
/// `invoke` only skips the combination it belongs to.
pub trait Launcher {
    /// Verify the launcher can run at all.
    fn check(&self) -> Result<()>;

    /// Run one invocation to completion. `Ok` means the process exited
    /// successfully.
    fn invoke(&self, program: &str, args: &[String]) -> Result<()>;

    /// Directory the simulator writes its fixed-name output file into.
    fn output_dir(&self) -> &Path;

    /// Command line as it would be executed, for dry runs and logs.
    fn describe(&self, program: &str, args: &[String]) -> String;
}

/// Launcher for an ns-3 build tree, going through its `ns3` wrapper.
///
/// The wrapper takes the whole program invocation as one argument:
/// `./ns3 run "single-bss-mld --nMldSta=10"`. The simulator drops its
/// summary file into the tree root.
pub struct Ns3Launcher {
    root: PathBuf,
}

impl Ns3Launcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Ns3Launcher { root: root.into() }
    }

    fn wrapper(&self) -> PathBuf {
        self.root.join("ns3")
    }

    fn inner_command(program: &str, args: &[String]) -> String {
        let mut inner = String::from(program);
        for arg in args {
            inner.push(' ');
            inner.push_str(arg);
        }
        inner
    }
}

impl Launcher for Ns3Launcher {
    fn check(&self) -> Result<()> {
        let wrapper = self.wrapper();
        if !wrapper.is_file() {
            bail!(
                "ns3 wrapper not found at {}; point --sim-root at a built ns-3 tree",
                wrapper.display()
            );
        }
        Ok(())
    }

    fn invoke(&self, program: &str, args: &[String]) -> Result<()> {
        let inner = Self::inner_command(program, args);
        debug!("launching: ns3 run \"{inner}\"");
        let output = Command::new(self.wrapper())
            .arg("run")
            .arg(&inner)
            .current_dir(&self.root)
            .output()
            .with_context(|| format!("failed to launch `ns3 run {inner}`"))?;
        if !output.status.success() {
            bail!(
                "simulator exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn output_dir(&self) -> &Path {
        &self.root
    }

    fn describe(&self, program: &str, args: &[String]) -> String {
        format!(
            "{} run \"{}\"",
            self.wrapper().display(),
            Self::inner_command(program, args)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_fails_without_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Ns3Launcher::new(dir.path());
        let err = launcher.check().unwrap_err();
        assert!(err.to_string().contains("ns3 wrapper not found"));
    }

    #[test]
    fn describe_quotes_the_inner_command() {
        let launcher = Ns3Launcher::new("/opt/ns3");
        let line = launcher.describe("single-bss-sld", &["--mcs=6".to_string()]);
        assert_eq!(line, "/opt/ns3/ns3 run \"single-bss-sld --mcs=6\"");
    }

    #[cfg(unix)]
    mod unix {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        use super::*;

        fn write_wrapper(dir: &Path, body: &str) {
            let path = dir.join("ns3");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        #[test]
        fn invoke_succeeds_on_clean_exit() {
            let dir = tempfile::tempdir().unwrap();
            write_wrapper(dir.path(), "exit 0");
            let launcher = Ns3Launcher::new(dir.path());
            launcher.check().unwrap();
            launcher
                .invoke("single-bss-sld", &["--mcs=6".to_string()])
                .unwrap();
        }

        #[test]
        fn invoke_reports_exit_status_and_stderr() {
            let dir = tempfile::tempdir().unwrap();
            write_wrapper(dir.path(), "echo 'assert failed' >&2; exit 3");
            let launcher = Ns3Launcher::new(dir.path());
            let err = launcher.invoke("single-bss-sld", &[]).unwrap_err();
            let message = err.to_string();
            assert!(message.contains("exited with"), "{message}");
            assert!(message.contains("assert failed"), "{message}");
        }
    }
}
