//! Format plugins and the registry that matches files against them.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::Settings,
    container::Container,
    error::{Error, Result},
    io::ArchiveSource,
    table::ResourceTable,
};

/// Everything a parser may consult besides the bytes themselves
#[derive(Debug, Clone, Copy)]
pub struct ReadContext<'a> {
    pub container: &'a Arc<Container>,
    pub settings: &'a Settings,
}

/// A parser for one archive format
pub trait FormatPlugin: Send + Sync {
    /// Stable identifier, used to force a format
    fn id(&self) -> &'static str;

    /// Human readable name
    fn name(&self) -> &'static str;

    /// Lowercase extensions this format usually has
    fn extensions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Cheap probe returning a confidence between 0 (not this format) and 100.
    ///
    /// The source is positioned at the start. Errors count as 0.
    fn rate(&self, container: &Container, source: &mut ArchiveSource) -> Result<u8>;

    /// Read the full directory
    fn read(&self, source: &mut ArchiveSource, context: &ReadContext<'_>) -> Result<ResourceTable>;
}

/// Confidence a plugin reported for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating {
    pub plugin: &'static str,
    pub confidence: u8,
}

/// What happened when a plugin was considered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rated 0, never attempted
    NotRecognised,
    /// Read succeeded with this many resources
    Accepted(usize),
    /// Read succeeded but found nothing
    Empty,
    /// The data did not have the plugin's structure
    Rejected(String),
    /// Read failed for a reason other than the data's structure
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NotRecognised => f.write_str("not recognised"),
            Outcome::Accepted(count) => write!(f, "accepted with {count} resources"),
            Outcome::Empty => f.write_str("no resources"),
            Outcome::Rejected(reason) => write!(f, "rejected: {reason}"),
            Outcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub plugin: &'static str,
    pub confidence: u8,
    pub outcome: Outcome,
}

/// Every plugin considered for a file, in the order they were considered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    pub attempts: Vec<Attempt>,
}

/// A successfully opened archive
#[derive(Debug)]
pub struct Opened {
    pub plugin: &'static str,
    pub table: ResourceTable,
    pub report: MatchReport,
}

/// All known format plugins, in registration order
#[derive(Default)]
pub struct FormatRegistry {
    plugins: IndexMap<&'static str, Arc<dyn FormatPlugin>>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: impl FormatPlugin + 'static) -> Result<()> {
        let id = plugin.id();
        if self.plugins.contains_key(id) {
            return Err(Error::DuplicatePlugin(id.to_owned()));
        }
        self.plugins.insert(id, Arc::new(plugin));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn FormatPlugin>> {
        self.plugins.get(id)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn FormatPlugin>> {
        self.plugins.values()
    }

    /// Ask every plugin to rate the file, in registration order
    pub fn rate_all(&self, container: &Container, source: &mut ArchiveSource) -> Vec<Rating> {
        self.plugins
            .values()
            .map(|plugin| {
                let confidence = match source
                    .seek(0)
                    .and_then(|_| plugin.rate(container, source))
                {
                    Ok(confidence) => confidence.min(100),
                    Err(error) => {
                        debug!(plugin = plugin.id(), %error, "rating failed");
                        0
                    }
                };
                Rating {
                    plugin: plugin.id(),
                    confidence,
                }
            })
            .collect()
    }

    /// Ratings sorted by confidence, highest first; ties keep registration order
    pub fn rank(&self, container: &Container, source: &mut ArchiveSource) -> Vec<Rating> {
        let mut ratings = self.rate_all(container, source);
        ratings.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        ratings
    }

    /// Find the format of `container` and read its directory.
    ///
    /// Candidates are tried from the highest rating down; the first one producing a
    /// non-empty table wins. Parser failures only move on to the next candidate.
    #[instrument(skip_all, fields(path = %container.path().display()))]
    pub fn open(&self, container: Arc<Container>, settings: &Settings) -> Result<Opened> {
        let mut source = container.open()?;
        let context = ReadContext {
            container: &container,
            settings,
        };

        let mut report = MatchReport::default();
        for rating in self.rank(&container, &mut source) {
            if rating.confidence == 0 {
                report.attempts.push(Attempt {
                    plugin: rating.plugin,
                    confidence: 0,
                    outcome: Outcome::NotRecognised,
                });
                continue;
            }

            let Some(plugin) = self.plugins.get(rating.plugin) else {
                continue;
            };

            debug!(plugin = rating.plugin, confidence = rating.confidence, "trying format");
            let result = source.seek(0).and_then(|_| plugin.read(&mut source, &context));
            let outcome = match result {
                Ok(table) if !table.is_empty() => {
                    info!(plugin = rating.plugin, count = table.len(), "opened archive");
                    report.attempts.push(Attempt {
                        plugin: rating.plugin,
                        confidence: rating.confidence,
                        outcome: Outcome::Accepted(table.len()),
                    });
                    return Ok(Opened {
                        plugin: rating.plugin,
                        table,
                        report,
                    });
                }
                Ok(_) => Outcome::Empty,
                Err(error) if error.is_mismatch() => {
                    debug!(plugin = rating.plugin, %error, "format rejected file");
                    Outcome::Rejected(error.to_string())
                }
                Err(error) => {
                    warn!(plugin = rating.plugin, %error, "format failed to read file");
                    Outcome::Failed(error.to_string())
                }
            };

            report.attempts.push(Attempt {
                plugin: rating.plugin,
                confidence: rating.confidence,
                outcome,
            });
        }

        debug!(?report, "no format matched");
        Err(Error::NoMatchingFormat(container.path().to_path_buf()))
    }

    /// Read `container` with one specific plugin, skipping the rating step
    #[instrument(skip(self, container, settings), fields(path = %container.path().display()))]
    pub fn open_with(
        &self,
        id: &str,
        container: Arc<Container>,
        settings: &Settings,
    ) -> Result<Opened> {
        let plugin = self
            .plugins
            .get(id)
            .ok_or_else(|| Error::UnknownPlugin(id.to_owned()))?;

        let mut source = container.open()?;
        let context = ReadContext {
            container: &container,
            settings,
        };
        let table = plugin.read(&mut source, &context)?;

        let report = MatchReport {
            attempts: vec![Attempt {
                plugin: plugin.id(),
                confidence: 100,
                outcome: if table.is_empty() {
                    Outcome::Empty
                } else {
                    Outcome::Accepted(table.len())
                },
            }],
        };

        Ok(Opened {
            plugin: plugin.id(),
            table,
            report,
        })
    }
}
