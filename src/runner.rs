use std::{
    path::{Path, PathBuf},
    process::Command,
    time::Instant,
};

use log::{debug, info};

use crate::program::{Program, ProgramError};

/// Runs a [Program] directly on the current machine, in `dir`
#[derive(Debug)]
pub struct Local {
    pub command: String,
    pub threads: Option<usize>,
    pub dir: PathBuf,
}

impl Local {
    pub fn new(command: &str, threads: Option<usize>, dir: &Path) -> Self {
        Self {
            command: command.to_string(),
            threads,
            dir: dir.to_path_buf(),
        }
    }

    /// the arguments passed to `self.command` to run `prog`. The command
    /// runs inside `self.dir`, so only the bare file names are passed
    pub fn args<P: Program>(&self, prog: &P) -> Vec<String> {
        let mut ret = Vec::new();
        if let Some(nt) = self.threads {
            ret.push("-nt".to_owned());
            ret.push(nt.to_string());
        }
        for file in [prog.infile(), prog.outfile()] {
            let name = Path::new(&file)
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or(file);
            ret.push(name);
        }
        ret
    }

    /// run `prog` and wait for it to finish. The input file should already
    /// be written
    pub fn run<P: Program>(&self, prog: &P) -> Result<(), ProgramError> {
        let args = self.args(prog);
        info!(
            "running {} {} in {}",
            self.command,
            args.join(" "),
            self.dir.display()
        );
        let now = Instant::now();
        let output = Command::new(&self.command)
            .args(&args)
            .current_dir(&self.dir)
            .output()
            .map_err(|e| {
                ProgramError::Io(format!(
                    "failed to run `{}` with {e}",
                    self.command
                ))
            })?;
        info!(
            "finished {} after {:.1} s",
            self.command,
            now.elapsed().as_millis() as f64 / 1e3
        );
        if !output.stdout.is_empty() {
            debug!("{}", String::from_utf8_lossy(&output.stdout));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProgramError::ErrorInOutput(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// remove `files` left over from an earlier run so that their contents
    /// are never mistaken for new results. Files that are already gone are
    /// fine, but any other failure is an error
    pub fn clear_stale(&self, files: &[String]) -> Result<(), ProgramError> {
        for file in files {
            match std::fs::remove_file(file) {
                Ok(()) => debug!("removed stale {file}"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => (),
                Err(e) => {
                    return Err(ProgramError::Io(format!(
                        "failed to remove stale {file} with {e}"
                    )))
                }
            }
        }
        Ok(())
    }
}
