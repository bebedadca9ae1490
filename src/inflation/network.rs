//! Causal networks: observables (classical variables) and the sources
//! (hidden common causes) they share.
//!
//! # Citations
//! - Wolfe, Spekkens, Fritz, "The Inflation Technique for Causal Inference with
//!   Latent Variables", J. Causal Inference 7 (2019)

use crate::namer::AlphabeticNamer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors from causal networks and the variants of their inflations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("observable {observable} has no outcomes")]
    ZeroOutcomes { observable: usize },

    #[error("source {source_id} references observable {observable}, but only {count} exist")]
    BadObservable {
        source_id: usize,
        observable: usize,
        count: usize,
    },

    #[error("source {source_id} is connected to no observable")]
    EmptySource { source_id: usize },

    #[error("inflation level must be at least 1")]
    ZeroInflation,

    #[error("variant {index} out of range ({count} variants)")]
    BadVariant { index: usize, count: usize },
}

/// A classical random variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observable {
    pub id: usize,
    pub name: String,
    pub outcomes: usize,
    /// Connected sources, including an implicit one for singletons.
    pub sources: BTreeSet<usize>,
    /// No explicit source feeds this observable.
    pub singleton: bool,
}

impl Observable {
    /// Number of copies under `inflation`-fold inflation.
    ///
    /// Singletons are never copied; every other observable gets one copy per
    /// assignment of source copies.
    pub fn count_copies(&self, inflation: usize) -> usize {
        if self.singleton {
            1
        } else {
            inflation.pow(self.sources.len() as u32)
        }
    }

    /// Operators per copy: every outcome but the last.
    #[inline]
    pub fn operators_per_copy(&self) -> usize {
        self.outcomes - 1
    }
}

/// A hidden common cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: usize,
    pub observables: BTreeSet<usize>,
    /// Synthesized for a singleton observable.
    pub implicit: bool,
}

/// Bipartite graph of observables and sources.
///
/// # Invariants
/// - `o ∈ sources[s].observables ⟺ s ∈ observables[o].sources`.
/// - Sources `0..implicit_source_index()` are explicit; the rest are implicit,
///   one per singleton observable, each containing only that observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalNetwork {
    observables: Vec<Observable>,
    sources: Vec<Source>,
    implicit_source_index: usize,
}

impl CausalNetwork {
    /// Network with `outcomes[o]` outcomes for observable `o`, and explicit
    /// source `s` feeding the observables in `source_observables[s]`.
    pub fn new(
        outcomes: Vec<usize>,
        source_observables: Vec<BTreeSet<usize>>,
    ) -> Result<Self, NetworkError> {
        let namer = AlphabeticNamer::upper();
        let mut observables = Vec::with_capacity(outcomes.len());
        for (id, &count) in outcomes.iter().enumerate() {
            if count == 0 {
                return Err(NetworkError::ZeroOutcomes { observable: id });
            }
            observables.push(Observable {
                id,
                name: namer.index_to_name(id),
                outcomes: count,
                sources: BTreeSet::new(),
                singleton: false,
            });
        }

        let mut sources = Vec::with_capacity(source_observables.len());
        for (id, members) in source_observables.into_iter().enumerate() {
            if members.is_empty() {
                return Err(NetworkError::EmptySource { source_id: id });
            }
            if let Some(&bad) = members.iter().find(|&&o| o >= observables.len()) {
                return Err(NetworkError::BadObservable {
                    source_id: id,
                    observable: bad,
                    count: observables.len(),
                });
            }
            sources.push(Source {
                id,
                observables: members,
                implicit: false,
            });
        }

        Self::reverse_observable_to_source(&mut observables, &sources);

        let implicit_source_index = sources.len();
        for observable in observables.iter_mut().filter(|o| o.sources.is_empty()) {
            let id = sources.len();
            observable.singleton = true;
            observable.sources.insert(id);
            sources.push(Source {
                id,
                observables: BTreeSet::from([observable.id]),
                implicit: true,
            });
        }

        Ok(Self {
            observables,
            sources,
            implicit_source_index,
        })
    }

    /// Derives each observable's sources from the sources' observables.
    fn reverse_observable_to_source(observables: &mut [Observable], sources: &[Source]) {
        for source in sources {
            for &o in &source.observables {
                observables[o].sources.insert(source.id);
            }
        }
    }

    #[inline]
    pub fn observables(&self) -> &[Observable] {
        &self.observables
    }

    #[inline]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Index of the first implicit source.
    #[inline]
    pub fn implicit_source_index(&self) -> usize {
        self.implicit_source_index
    }

    #[inline]
    pub fn explicit_source_count(&self) -> usize {
        self.implicit_source_index
    }

    /// Copies of source `source` under `inflation`-fold inflation.
    pub fn source_copies(&self, source: usize, inflation: usize) -> usize {
        if self.sources[source].implicit {
            1
        } else {
            inflation
        }
    }

    /// Source copies across all sources.
    pub fn total_source_copies(&self, inflation: usize) -> usize {
        (0..self.sources.len())
            .map(|s| self.source_copies(s, inflation))
            .sum()
    }

    /// Operators needed under `inflation`-fold inflation.
    pub fn total_operator_count(&self, inflation: usize) -> usize {
        self.observables
            .iter()
            .map(|o| o.count_copies(inflation) * o.operators_per_copy())
            .sum()
    }
}
