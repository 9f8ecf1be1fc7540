//! Delegation to an external bulk extraction tool.
//!
//! The tool is driven by a newline separated instruction script and invoked as
//! `<tool> -o -Q [-f <namelist>] <script> <archive> <output_dir>`. It runs once
//! per batch; which resources made it out is decided by the files it left behind.

use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

use tracing::{debug, info, instrument, warn};

use super::{BatchExporter, BatchOutcome, Exporter};
use crate::{
    config::ToolSettings,
    container::Container,
    error::{Error, Result},
    export::safe_join,
    io::ArchiveSource,
    resource::Resource,
};

/// The external tool and the cached result of looking it up
#[derive(Debug)]
pub struct ExternalTool {
    program: PathBuf,
    leading_args: Vec<String>,
    available: OnceLock<bool>,
    /// Set when a spawn found no program after the lookup succeeded
    vanished: AtomicBool,
}

impl ExternalTool {
    pub fn new(program: impl Into<PathBuf>, leading_args: Vec<String>) -> Self {
        ExternalTool {
            program: program.into(),
            leading_args,
            available: OnceLock::new(),
            vanished: AtomicBool::new(false),
        }
    }

    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self::new(settings.program.clone(), settings.leading_args.clone())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether the program can be found. Looked up once, later calls reuse the answer.
    pub fn is_available(&self) -> bool {
        if self.vanished.load(Ordering::Relaxed) {
            return false;
        }
        *self.available.get_or_init(|| {
            let found = locate(&self.program);
            match &found {
                Some(path) => debug!(path = %path.display(), "found external tool"),
                None => warn!(program = %self.program.display(), "external tool not found"),
            }
            found.is_some()
        })
    }

    pub fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::ToolUnavailable(self.program.display().to_string()))
        }
    }

    /// Run the tool to completion, returning whether it exited successfully
    #[instrument(skip(self), fields(program = %self.program.display()))]
    pub fn run(
        &self,
        names: Option<&Path>,
        script: &Path,
        archive: &Path,
        out_dir: &Path,
    ) -> Result<bool> {
        self.ensure_available()?;

        let mut command = Command::new(&self.program);
        command.args(&self.leading_args).arg("-o").arg("-Q");
        if let Some(names) = names {
            command.arg("-f").arg(names);
        }
        command
            .arg(script)
            .arg(archive)
            .arg(out_dir)
            .stdin(Stdio::null());

        debug!(?command, "running external tool");
        let output = command.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                warn!("external tool disappeared");
                self.vanished.store(true, Ordering::Relaxed);
                Error::ToolUnavailable(self.program.display().to_string())
            }
            _ => Error::IOError(e),
        })?;

        if !output.status.success() {
            warn!(
                code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "external tool failed"
            );
        }
        Ok(output.status.success())
    }
}

fn locate(program: &Path) -> Option<PathBuf> {
    if program.is_absolute() || program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| {
            let candidate = dir.join(program);
            let with_suffix = candidate.with_extension(env::consts::EXE_EXTENSION);
            [candidate, with_suffix]
        })
        .find(|candidate| candidate.is_file())
}

/// One line of an instruction script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Select the decompression algorithm for following `clog` lines
    Comtype(&'a str),

    /// Extract and decompress
    Clog {
        name: String,
        offset: u64,
        length: u64,
        decompressed_length: u64,
    },

    /// Extract as stored
    Log {
        name: String,
        offset: u64,
        length: u64,
    },
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Comtype(name) => write!(f, "comtype {name}"),
            Instruction::Clog {
                name,
                offset,
                length,
                decompressed_length,
            } => write!(f, "clog \"{name}\" {offset} {length} {decompressed_length}"),
            Instruction::Log {
                name,
                offset,
                length,
            } => write!(f, "log \"{name}\" {offset} {length}"),
        }
    }
}

/// Name as the tool sees it, forward slashes only
fn tool_name(resource: &Resource) -> Result<String> {
    let name = resource.name();
    if name.contains(['"', '\n', '\r']) {
        return Err(Error::DecompressionFailed(format!(
            "{name:?} cannot be written to an instruction script"
        )));
    }
    Ok(name.replace('\\', "/"))
}

/// Build the script extracting `resources`, compressed ones through `comtype`
pub fn build_script(comtype: &str, resources: &[&Resource]) -> Result<String> {
    let mut lines = Vec::with_capacity(resources.len() + 1);
    if resources.iter().any(|r| r.is_compressed()) {
        lines.push(Instruction::Comtype(comtype));
    }

    for resource in resources {
        let name = tool_name(resource)?;
        lines.push(if resource.is_compressed() {
            Instruction::Clog {
                name,
                offset: resource.offset(),
                length: resource.compressed_length(),
                decompressed_length: resource.decompressed_length(),
            }
        } else {
            Instruction::Log {
                name,
                offset: resource.offset(),
                length: resource.compressed_length(),
            }
        });
    }

    let mut script = String::new();
    for line in lines {
        script.push_str(&line.to_string());
        script.push('\n');
    }
    Ok(script)
}

/// How the tool is told what to extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolMode {
    /// Write a fresh script for every run, decompressing with `comtype`
    SingleRun { comtype: String },

    /// Run an existing format script, picking resources through a name list
    Wrapper { script: PathBuf },
}

/// Exporter backed by an [`ExternalTool`], able to extract whole batches in one run
#[derive(Debug)]
pub struct ExternalToolExporter {
    tool: Arc<ExternalTool>,
    mode: ToolMode,
}

impl ExternalToolExporter {
    pub fn new(tool: Arc<ExternalTool>, mode: ToolMode) -> Self {
        ExternalToolExporter { tool, mode }
    }

    pub fn tool(&self) -> &ExternalTool {
        &self.tool
    }
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

impl Exporter for ExternalToolExporter {
    fn tag(&self) -> &str {
        match &self.mode {
            ToolMode::SingleRun { comtype } => comtype.as_str(),
            ToolMode::Wrapper { .. } => "script",
        }
    }

    #[instrument(skip_all, fields(name = resource.name()))]
    fn produce(&self, _source: &mut ArchiveSource, resource: &Resource) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir()?;
        let outcome = self.produce_batch(resource.container(), &[resource], scratch.path())?;

        match outcome.outputs.into_iter().next().flatten() {
            Some(path) => Ok(fs::read(path)?),
            None => Err(Error::DecompressionFailed(format!(
                "{} was not produced by {}",
                resource.name(),
                self.tool.program().display()
            ))),
        }
    }

    fn as_batch(&self) -> Option<&dyn BatchExporter> {
        Some(self)
    }
}

impl BatchExporter for ExternalToolExporter {
    #[instrument(skip_all, fields(container = %container.path().display(), count = resources.len()))]
    fn produce_batch(
        &self,
        container: &Container,
        resources: &[&Resource],
        out_dir: &Path,
    ) -> Result<BatchOutcome> {
        self.tool.ensure_available()?;
        if resources.is_empty() {
            return Ok(BatchOutcome::new(Vec::new()));
        }

        // Names escaping `out_dir` never reach the tool.
        let mut targets = Vec::with_capacity(resources.len());
        let mut runnable = Vec::with_capacity(resources.len());
        for resource in resources {
            let name = tool_name(resource)?;
            match safe_join(out_dir, &name) {
                Ok(target) => {
                    targets.push(Some((name, target)));
                    runnable.push(*resource);
                }
                Err(error) => {
                    warn!(%name, %error, "refusing to extract resource");
                    targets.push(None);
                }
            }
        }
        if runnable.is_empty() {
            return Ok(BatchOutcome::failed(resources.len()));
        }

        let scratch = tempfile::tempdir()?;
        let archive = match container.file_path() {
            Some(path) => path.to_path_buf(),
            None => {
                let path = scratch.path().join("archive.bin");
                fs::write(&path, container.bytes().unwrap_or_default())?;
                path
            }
        };

        let (script, names) = match &self.mode {
            ToolMode::SingleRun { comtype } => {
                let path = scratch.path().join("extract.bms");
                fs::write(&path, build_script(comtype, &runnable)?)?;
                (path, None)
            }
            ToolMode::Wrapper { script } => {
                let path = scratch.path().join("names.txt");
                let list = targets
                    .iter()
                    .flatten()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                fs::write(&path, list)?;
                (script.clone(), Some(path))
            }
        };

        // The tool writes into a directory of its own so stale files never count as output.
        let staging = scratch.path().join("out");
        fs::create_dir_all(&staging)?;

        if !self.tool.run(names.as_deref(), &script, &archive, &staging)? {
            return Ok(BatchOutcome::failed(resources.len()));
        }

        let mut outputs = Vec::with_capacity(resources.len());
        for target in targets {
            let Some((name, target)) = target else {
                outputs.push(None);
                continue;
            };

            let produced = staging.join(&name);
            if !produced.is_file() {
                warn!(%name, "external tool did not produce resource");
                outputs.push(None);
                continue;
            }

            match move_file(&produced, &target) {
                Ok(()) => {
                    info!("wrote {}", target.display());
                    outputs.push(Some(target));
                }
                Err(error) => {
                    warn!(%name, %error, "unable to move resource into place");
                    outputs.push(None);
                }
            }
        }

        let outcome = BatchOutcome::new(outputs);
        debug!(status = %outcome.status, "batch finished");
        Ok(outcome)
    }
}
