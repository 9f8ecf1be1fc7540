use std::sync::{Arc, Mutex};

use arcx_core::{
    error::{Error, Result},
    exporter::RawExporter,
    matcher::{Attempt, Outcome},
    ArchiveSource, Container, FormatPlugin, FormatRegistry, ReadContext, Resource, ResourceTable,
    Settings,
};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

#[derive(Clone, Copy)]
enum Behaviour {
    Fail,
    Break,
    Empty,
    Succeed,
}

struct Fixed {
    id: &'static str,
    confidence: u8,
    behaviour: Behaviour,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl FormatPlugin for Fixed {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.id
    }

    fn rate(&self, _container: &Container, _source: &mut ArchiveSource) -> Result<u8> {
        Ok(self.confidence)
    }

    fn read(&self, _source: &mut ArchiveSource, context: &ReadContext<'_>) -> Result<ResourceTable> {
        self.log.lock().unwrap().push(self.id);
        match self.behaviour {
            Behaviour::Fail => Err(Error::FormatMismatch(self.id.to_owned())),
            Behaviour::Break => Err(Error::DecompressionFailed(format!("{} is broken", self.id))),
            Behaviour::Empty => Ok(ResourceTable::new()),
            Behaviour::Succeed => Ok([Resource::builder()
                .name(self.id)
                .offset(0)
                .compressed_length(0)
                .decompressed_length(0)
                .exporter(Arc::new(RawExporter))
                .container(context.container.clone())
                .build()]
            .into_iter()
            .collect()),
        }
    }
}

fn registry(plugins: &[(&'static str, u8, Behaviour)]) -> (FormatRegistry, Arc<Mutex<Vec<&'static str>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut registry = FormatRegistry::new();
    for (id, confidence, behaviour) in plugins {
        registry
            .register(Fixed {
                id,
                confidence: *confidence,
                behaviour: *behaviour,
                log: log.clone(),
            })
            .unwrap();
    }
    (registry, log)
}

fn container() -> Arc<Container> {
    Arc::new(Container::from_bytes("file.bin", vec![0u8; 16]))
}

#[traced_test]
#[test]
fn highest_rating_first_ties_in_registration_order() -> Result<()> {
    let (registry, log) = registry(&[
        ("low", 50, Behaviour::Succeed),
        ("first_tie", 80, Behaviour::Empty),
        ("second_tie", 80, Behaviour::Fail),
        ("third_tie", 80, Behaviour::Succeed),
        ("unrated", 0, Behaviour::Succeed),
    ]);

    let opened = registry.open(container(), &Settings::default())?;
    assert_eq!(opened.plugin, "third_tie");
    assert_eq!(*log.lock().unwrap(), vec!["first_tie", "second_tie", "third_tie"]);

    assert_eq!(
        opened.report.attempts,
        vec![
            Attempt { plugin: "first_tie", confidence: 80, outcome: Outcome::Empty },
            Attempt {
                plugin: "second_tie",
                confidence: 80,
                outcome: Outcome::Rejected("not a second_tie file".into()),
            },
            Attempt { plugin: "third_tie", confidence: 80, outcome: Outcome::Accepted(1) },
        ]
    );
    Ok(())
}

#[traced_test]
#[test]
fn hard_failures_are_told_apart_from_mismatches() -> Result<()> {
    let (registry, _) = registry(&[
        ("broken", 90, Behaviour::Break),
        ("mismatch", 80, Behaviour::Fail),
        ("fallback", 10, Behaviour::Succeed),
    ]);

    let opened = registry.open(container(), &Settings::default())?;
    assert_eq!(opened.plugin, "fallback");
    assert_eq!(
        opened.report.attempts[0].outcome,
        Outcome::Failed("decompression failed: broken is broken".into())
    );
    assert_eq!(
        opened.report.attempts[1].outcome,
        Outcome::Rejected("not a mismatch file".into())
    );
    assert!(logs_contain("format failed to read file"));
    Ok(())
}

#[test]
fn ranking_is_deterministic() {
    let (registry, _) = registry(&[
        ("a", 10, Behaviour::Fail),
        ("b", 90, Behaviour::Fail),
        ("c", 10, Behaviour::Fail),
        ("d", 90, Behaviour::Fail),
    ]);

    let container = container();
    let mut source = container.open().unwrap();
    let order: Vec<_> = registry
        .rank(&container, &mut source)
        .into_iter()
        .map(|r| r.plugin)
        .collect();
    assert_eq!(order, vec!["b", "d", "a", "c"]);
}

#[test]
fn unrated_plugins_are_never_read() {
    let (registry, log) = registry(&[("zero", 0, Behaviour::Succeed), ("fails", 5, Behaviour::Fail)]);

    let err = registry.open(container(), &Settings::default()).unwrap_err();
    assert!(matches!(err, Error::NoMatchingFormat(_)));
    assert_eq!(*log.lock().unwrap(), vec!["fails"]);
}

#[test]
fn forced_format_skips_rating() -> Result<()> {
    let (registry, _) = registry(&[("zero", 0, Behaviour::Succeed), ("fails", 5, Behaviour::Fail)]);

    let opened = registry.open_with("zero", container(), &Settings::default())?;
    assert_eq!(opened.table.len(), 1);

    assert!(matches!(
        registry.open_with("fails", container(), &Settings::default()),
        Err(Error::FormatMismatch(_))
    ));
    assert!(matches!(
        registry.open_with("missing", container(), &Settings::default()),
        Err(Error::UnknownPlugin(_))
    ));
    Ok(())
}

#[test]
fn duplicate_ids_are_refused() {
    let (mut registry, log) = registry(&[("a", 1, Behaviour::Fail)]);
    let again = Fixed {
        id: "a",
        confidence: 1,
        behaviour: Behaviour::Fail,
        log,
    };
    assert!(matches!(registry.register(again), Err(Error::DuplicatePlugin(_))));
    assert_eq!(registry.len(), 1);
}
