//! Inspection pipeline: fetch, build, check

use chrono::{DateTime, Local};
use seat_inspect_api::{
    EdgeRecord, Finding, NodeRecord, PartialFetch, REPORT_VERSION, Report, Snapshot,
};
use seat_inspect_config::InspectConfig;
use seat_inspect_source_api::{LoginSource, ProcessProbe};
use seat_inspect_util::{NodeKey, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::checks::InvariantChecker;
use crate::fetch::{EntityFetcher, FetchOptions};
use crate::graph::Graph;

/// Result of one inspection run
#[derive(Debug, Clone)]
pub struct Inspection {
    pub graph: Graph,
    pub findings: Vec<Finding>,
    pub warnings: Vec<PartialFetch>,
    pub source: String,
    pub captured_at: DateTime<Local>,
}

impl Inspection {
    /// Whether any finding has warning severity
    pub fn has_warnings(&self) -> bool {
        self.findings.iter().any(Finding::is_warning)
    }

    /// Indices of findings implicating `key`
    pub fn findings_for(&self, key: &NodeKey) -> Vec<usize> {
        self.findings
            .iter()
            .enumerate()
            .filter(|(_, f)| f.implicates(key))
            .map(|(i, _)| i)
            .collect()
    }

    /// Versioned record form for scripts
    pub fn report(&self) -> Report {
        let nodes = self
            .graph
            .nodes()
            .map(|node| {
                let edges = self
                    .graph
                    .edges_from(&node.key)
                    .map(|edge| EdgeRecord {
                        relation: edge.relation,
                        target: edge.to.clone(),
                        state: edge.target,
                        origin: edge.origin,
                    })
                    .collect();

                let mut findings: Vec<_> = self
                    .findings_for(&node.key)
                    .into_iter()
                    .map(|i| self.findings[i].category)
                    .collect();
                findings.dedup();

                NodeRecord {
                    kind: node.key.kind,
                    id: node.key.id.clone(),
                    partial: node.partial,
                    attributes: node.attrs.clone(),
                    edges,
                    findings,
                }
            })
            .collect();

        Report {
            version: REPORT_VERSION,
            captured_at: self.captured_at,
            source: self.source.clone(),
            nodes,
            findings: self.findings.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Runs the pipeline against a login source
pub struct Inspector {
    config: InspectConfig,
}

impl Inspector {
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InspectConfig {
        &self.config
    }

    /// Fetch a snapshot, closing the source afterwards whatever the outcome
    pub async fn fetch(
        &self,
        source: Arc<dyn LoginSource>,
        probe: Option<Arc<dyn ProcessProbe>>,
    ) -> Result<Snapshot> {
        let mut fetcher = EntityFetcher::new(Arc::clone(&source), FetchOptions::from(&self.config.fetch));
        if self.config.fetch.probe_leaders
            && let Some(probe) = probe
        {
            fetcher = fetcher.with_probe(probe);
        }

        let result = fetcher.fetch_all().await;

        if let Err(e) = source.close().await {
            warn!(error = %e, "Failed to close login source");
        }

        result
    }

    /// Build and check a fetched snapshot
    pub fn analyze(&self, snapshot: &Snapshot) -> Result<Inspection> {
        let graph = Graph::build(snapshot)?;
        let findings = InvariantChecker::new(&self.config.checks).check(&graph);

        info!(
            nodes = graph.len(),
            findings = findings.len(),
            warnings = snapshot.warnings.len(),
            "Inspection complete"
        );

        Ok(Inspection {
            graph,
            findings,
            warnings: snapshot.warnings.clone(),
            source: snapshot.source.clone(),
            captured_at: snapshot.captured_at,
        })
    }

    pub async fn run(
        &self,
        source: Arc<dyn LoginSource>,
        probe: Option<Arc<dyn ProcessProbe>>,
    ) -> Result<Inspection> {
        let snapshot = self.fetch(source, probe).await?;
        self.analyze(&snapshot)
    }
}
