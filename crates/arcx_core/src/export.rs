//! Writing a whole table to disk.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use bon::Builder;
use indexmap::IndexMap;
use tracing::{debug, info, instrument, warn};

use crate::{
    container::Container,
    error::{Error, Result},
    exporter::{BatchOutcome, ExtractStatus},
    io::ArchiveSource,
    resource::Resource,
    table::ResourceTable,
    task::CancellationToken,
};

/// Where and how resources are written
#[derive(Builder, Debug, Clone)]
pub struct ExportOptions {
    #[builder(into)]
    pub out_dir: PathBuf,

    #[builder(default)]
    pub overwrite: bool,
}

/// A resource that could not be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Summary of an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub status: ExtractStatus,
    pub exported: usize,
    pub failures: Vec<ExportFailure>,
    /// Cancellation stopped the run before every resource was attempted
    pub cancelled: bool,
}

/// Join a resource name below `root`, refusing absolute names and `..` components
pub fn safe_join(root: &Path, name: &str) -> Result<PathBuf> {
    let normalised = name.replace('\\', "/");
    let relative = Path::new(&normalised);

    let mut path = root.to_path_buf();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathEscape(name.to_owned()));
            }
        }
    }

    if depth == 0 || normalised.contains(':') {
        return Err(Error::PathEscape(name.to_owned()));
    }
    Ok(path)
}

/// Resources sharing a container and exporter go to one batch
type BatchKey = (usize, usize);

fn batch_key(resource: &Resource) -> BatchKey {
    (
        Arc::as_ptr(resource.container()) as *const () as usize,
        Arc::as_ptr(resource.exporter()) as *const () as usize,
    )
}

/// Export every resource of `table` below `options.out_dir`.
///
/// Resources whose exporter supports batches are grouped per container and exporter and
/// extracted in a single run, at the position of the group's first member. Everything else
/// goes one by one. Failures are collected rather than aborting; `cancel` is checked before
/// each resource or batch.
#[instrument(skip_all, fields(out_dir = %options.out_dir.display(), count = table.len()))]
pub fn export_all(
    table: &mut ResourceTable,
    options: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<ExportReport> {
    fs::create_dir_all(&options.out_dir)?;

    let mut batches: IndexMap<BatchKey, Vec<usize>> = IndexMap::new();
    for (index, resource) in table.iter().enumerate() {
        if resource.exporter().as_batch().is_some() {
            batches.entry(batch_key(resource)).or_default().push(index);
        }
    }

    let mut sources: HashMap<usize, ArchiveSource> = HashMap::new();
    let mut failures = Vec::new();
    let mut exported = 0usize;
    let mut cancelled = false;

    for index in 0..table.len() {
        if cancel.is_cancelled() {
            info!("export cancelled");
            cancelled = true;
            break;
        }

        let resource = &table[index];
        if resource.exporter().as_batch().is_some() {
            let Some(members) = batches.shift_remove(&batch_key(resource)) else {
                // already handled with an earlier member
                continue;
            };
            let (ok, mut failed) = export_batch(table, &members, options)?;
            exported += ok;
            failures.append(&mut failed);
            continue;
        }

        let key = Arc::as_ptr(resource.container()) as *const () as usize;
        let source = match sources.entry(key) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                match resource.container().open() {
                    Ok(source) => entry.insert(source),
                    Err(error) => {
                        failures.push(failure(index, resource, &error));
                        continue;
                    }
                }
            }
        };

        match export_one(source, resource, options) {
            Ok(path) => {
                table
                    .get_mut(index)
                    .expect("index is within the table")
                    .set_exported(path, SystemTime::now());
                exported += 1;
            }
            Err(error) => {
                warn!(name = resource.name(), %error, "export failed");
                failures.push(failure(index, resource, &error));
            }
        }
    }

    let report = ExportReport {
        status: ExtractStatus::from_counts(exported, table.len()),
        exported,
        failures,
        cancelled,
    };
    debug!(status = %report.status, exported, "export finished");
    Ok(report)
}

fn failure(index: usize, resource: &Resource, error: &Error) -> ExportFailure {
    ExportFailure {
        index,
        name: resource.name().to_owned(),
        reason: error.to_string(),
    }
}

fn create(path: &Path, overwrite: bool) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(if overwrite {
        File::create(path)?
    } else {
        File::create_new(path)?
    })
}

fn export_one(source: &mut ArchiveSource, resource: &Resource, options: &ExportOptions) -> Result<PathBuf> {
    let path = safe_join(&options.out_dir, resource.name())?;
    let mut out = BufWriter::new(create(&path, options.overwrite)?);

    let written = resource
        .exporter()
        .produce_to(source, resource, &mut out)
        .and_then(|written| {
            out.flush()?;
            Ok(written)
        });

    match written {
        Ok(written) => {
            info!("wrote {} ({written} bytes)", path.display());
            Ok(path)
        }
        Err(error) => {
            drop(out);
            let _ = fs::remove_file(&path);
            Err(error)
        }
    }
}

fn export_batch(
    table: &mut ResourceTable,
    members: &[usize],
    options: &ExportOptions,
) -> Result<(usize, Vec<ExportFailure>)> {
    let mut failures = Vec::new();
    let mut runnable = Vec::with_capacity(members.len());

    for &index in members {
        let resource = &table[index];
        let target = match safe_join(&options.out_dir, resource.name()) {
            Ok(target) => target,
            Err(error) => {
                failures.push(failure(index, resource, &error));
                continue;
            }
        };
        if target.exists() && !options.overwrite {
            let error = Error::IOError(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            ));
            failures.push(failure(index, resource, &error));
            continue;
        }
        runnable.push(index);
    }

    if runnable.is_empty() {
        return Ok((0, failures));
    }

    let first = &table[runnable[0]];
    let container: Arc<Container> = first.container().clone();
    let exporter = first.exporter().clone();
    let Some(batch) = exporter.as_batch() else {
        return Ok((0, failures));
    };

    let resources: Vec<&Resource> = runnable.iter().map(|&i| &table[i]).collect();
    let outcome = match batch.produce_batch(&container, &resources, &options.out_dir) {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!(%error, "batch export failed");
            for &index in &runnable {
                failures.push(failure(index, &table[index], &error));
            }
            return Ok((0, failures));
        }
    };
    drop(resources);

    let BatchOutcome { outputs, .. } = outcome;
    let now = SystemTime::now();
    let mut exported = 0;
    for (&index, output) in runnable.iter().zip(outputs) {
        match output {
            Some(path) => {
                table
                    .get_mut(index)
                    .expect("index is within the table")
                    .set_exported(path, now);
                exported += 1;
            }
            None => failures.push(ExportFailure {
                index,
                name: table[index].name().to_owned(),
                reason: "not produced by the batch".to_owned(),
            }),
        }
    }

    Ok((exported, failures))
}
