//! Fixture source for testing

use async_trait::async_trait;
use seat_inspect_api::{AttrValue, Liveness, PropertyBag};
use seat_inspect_util::{EntityId, EntityKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{LoginSource, ProcessProbe, SourceError, SourceResult};

/// Build a property bag from name/value pairs
pub fn bag<K, I>(pairs: I) -> PropertyBag
where
    K: Into<String>,
    I: IntoIterator<Item = (K, AttrValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Shorthand for a reference list value
pub fn refs<I, S>(ids: I) -> AttrValue
where
    I: IntoIterator<Item = S>,
    S: Into<EntityId>,
{
    AttrValue::Refs(ids.into_iter().map(Into::into).collect())
}

/// Failure to inject into a fixture call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFailure {
    Unavailable,
    PermissionDenied,
    NotFound,
    Protocol,
}

impl FixtureFailure {
    fn to_error(self, what: String) -> SourceError {
        match self {
            FixtureFailure::Unavailable => SourceError::Unavailable(what),
            FixtureFailure::PermissionDenied => SourceError::PermissionDenied(what),
            FixtureFailure::NotFound => SourceError::NotFound(what),
            FixtureFailure::Protocol => SourceError::Protocol(what),
        }
    }
}

/// In-memory login source for unit/integration testing
pub struct FixtureSource {
    objects: BTreeMap<EntityKind, BTreeMap<EntityId, PropertyBag>>,

    /// Configure enumeration of a kind to fail
    pub fail_list: Arc<Mutex<HashMap<EntityKind, FixtureFailure>>>,

    /// Configure detail queries of single objects to fail
    pub fail_properties: Arc<Mutex<HashMap<(EntityKind, EntityId), FixtureFailure>>>,

    /// Delay applied to every detail query
    pub delay: Arc<Mutex<Option<Duration>>>,

    closed: AtomicBool,
    property_queries: AtomicUsize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            fail_list: Arc::new(Mutex::new(HashMap::new())),
            fail_properties: Arc::new(Mutex::new(HashMap::new())),
            delay: Arc::new(Mutex::new(None)),
            closed: AtomicBool::new(false),
            property_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_object(mut self, kind: EntityKind, id: impl Into<EntityId>, props: PropertyBag) -> Self {
        self.objects.entry(kind).or_default().insert(id.into(), props);
        self
    }

    pub fn with_seat(self, id: impl Into<EntityId>, props: PropertyBag) -> Self {
        self.with_object(EntityKind::Seat, id, props)
    }

    pub fn with_session(self, id: impl Into<EntityId>, props: PropertyBag) -> Self {
        self.with_object(EntityKind::Session, id, props)
    }

    pub fn with_user(self, id: impl Into<EntityId>, props: PropertyBag) -> Self {
        self.with_object(EntityKind::User, id, props)
    }

    pub fn fail_list_of(&self, kind: EntityKind, failure: FixtureFailure) {
        self.fail_list.lock().unwrap().insert(kind, failure);
    }

    pub fn fail_properties_of(&self, kind: EntityKind, id: impl Into<EntityId>, failure: FixtureFailure) {
        self.fail_properties
            .lock()
            .unwrap()
            .insert((kind, id.into()), failure);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of detail queries served so far
    pub fn property_queries(&self) -> usize {
        self.property_queries.load(Ordering::SeqCst)
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoginSource for FixtureSource {
    fn describe(&self) -> String {
        "fixture".into()
    }

    async fn list(&self, kind: EntityKind) -> SourceResult<Vec<EntityId>> {
        if let Some(failure) = self.fail_list.lock().unwrap().get(&kind).copied() {
            return Err(failure.to_error(format!("list {}s", kind)));
        }

        Ok(self
            .objects
            .get(&kind)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn properties(&self, kind: EntityKind, id: &EntityId) -> SourceResult<PropertyBag> {
        self.property_queries.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .fail_properties
            .lock()
            .unwrap()
            .get(&(kind, id.clone()))
            .copied();
        if let Some(failure) = failure {
            return Err(failure.to_error(format!("{} {}", kind, id)));
        }

        self.objects
            .get(&kind)
            .and_then(|objects| objects.get(id))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("{} {}", kind, id)))
    }

    async fn close(&self) -> SourceResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Probe answering from a fixed table; unknown PIDs report `Unknown`
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    answers: HashMap<u32, Liveness>,
}

impl FixedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pid: u32, liveness: Liveness) -> Self {
        self.answers.insert(pid, liveness);
        self
    }
}

impl ProcessProbe for FixedProbe {
    fn probe(&self, pid: u32) -> Liveness {
        self.answers.get(&pid).copied().unwrap_or(Liveness::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_lists_and_reads() {
        let source = FixtureSource::new()
            .with_seat("seat0", bag([("CanMultiSession", AttrValue::Bool(true))]))
            .with_session("2", bag([("Seat", refs(["seat0"]))]));

        let seats = source.list(EntityKind::Seat).await.unwrap();
        assert_eq!(seats, vec![EntityId::new("seat0")]);
        assert!(source.list(EntityKind::User).await.unwrap().is_empty());

        let props = source
            .properties(EntityKind::Session, &EntityId::new("2"))
            .await
            .unwrap();
        assert_eq!(props.get("Seat"), Some(&refs(["seat0"])));
        assert_eq!(source.property_queries(), 1);
    }

    #[tokio::test]
    async fn fixture_failure_injection() {
        let source = FixtureSource::new().with_session("2", PropertyBag::new());
        source.fail_list_of(EntityKind::Seat, FixtureFailure::PermissionDenied);
        source.fail_properties_of(EntityKind::Session, "2", FixtureFailure::Protocol);

        assert!(matches!(
            source.list(EntityKind::Seat).await,
            Err(SourceError::PermissionDenied(_))
        ));
        assert!(matches!(
            source.properties(EntityKind::Session, &EntityId::new("2")).await,
            Err(SourceError::Protocol(_))
        ));
        assert!(matches!(
            source.properties(EntityKind::Session, &EntityId::new("9")).await,
            Err(SourceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn fixture_close() {
        let source = FixtureSource::new();
        assert!(!source.is_closed());
        source.close().await.unwrap();
        assert!(source.is_closed());
    }

    #[test]
    fn fixed_probe_defaults_to_unknown() {
        let probe = FixedProbe::new().with(100, Liveness::Dead);
        assert_eq!(probe.probe(100), Liveness::Dead);
        assert_eq!(probe.probe(101), Liveness::Unknown);
    }
}
