//! The inflation context.
//!
//! Under `k`-fold inflation every explicit source is copied `k` times, and
//! every observable is copied once per assignment of copies to its sources.
//! Each copy (a *variant*) carries `outcomes - 1` projectors.
//!
//! The algebra:
//! - operators of different observables commute;
//! - operators of one observable commute iff their variants share no source
//!   copy (they are *independent*);
//! - the outcome projectors of one variant are orthogonal and idempotent.
//!
//! Canonical sequences are reduced (no idempotent repeats or orthogonal pairs
//! that commutation can bring together) and then put in lexicographic normal
//! form: the smallest operator that commutes with everything before it always
//! comes first.
//!
//! # Citations
//! - Wolfe, Navascués, Pozas-Kerstjens, "Quantum inflation: A general approach
//!   to quantum causal compatibility", Phys. Rev. X 11 (2021)
//! - Anisimov & Knuth, "Inhomogeneous sorting", Int. J. Comput. Inf. Sci. 8 (1979)
//! - Diekert & Rozenberg (eds.), "The Book of Traces" (1995) – lexicographic normal forms

use super::network::{CausalNetwork, NetworkError};
use super::source_set::SourceSet;
use crate::context::Context;
use crate::indices::MultiDimensionalIndexIterator;
use crate::operators::{Operator, OperatorFlags, OperatorSequence, Party};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One copy of an observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ICVariant {
    pub observable: usize,
    /// Index among this observable's variants.
    pub flat_index: usize,
    /// Index among all variants of all observables.
    pub global_index: usize,
    /// Global index of the outcome-0 operator.
    pub operator_offset: usize,
    /// Copy of each connected source, in the observable's source order.
    pub indices: Vec<usize>,
    /// Source → copy.
    pub source_variants: BTreeMap<usize, usize>,
    /// Global source copies this variant touches.
    pub connected_sources: SourceSet,
}

/// An observable as laid out in the inflated scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ICObservable {
    pub id: usize,
    pub name: String,
    pub outcomes: usize,
    pub operators_per_variant: usize,
    /// Global index of the first operator.
    pub operator_offset: usize,
    /// Global index of the first variant.
    pub variant_offset: usize,
    /// Connected sources, ascending.
    pub sources: Vec<usize>,
    /// Copies of each connected source.
    pub source_copies: Vec<usize>,
    pub variants: Vec<ICVariant>,
}

impl ICObservable {
    /// Flat index of the variant using copies `indices`.
    pub fn variant_index(&self, indices: &[usize]) -> usize {
        indices
            .iter()
            .zip(&self.source_copies)
            .fold(0, |flat, (&index, &copies)| flat * copies + index)
    }
}

/// Where an operator sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorInfo {
    pub observable: usize,
    pub variant: usize,
    pub outcome: usize,
}

/// Operator algebra of a causal network under `k`-fold inflation.
#[derive(Debug, Clone)]
pub struct InflationContext {
    network: CausalNetwork,
    inflation: usize,
    parties: Vec<Party>,
    operators: Vec<Operator>,
    observables: Vec<ICObservable>,
    operator_info: Vec<OperatorInfo>,
    /// Global variant index → (observable, flat variant).
    variant_lookup: Vec<(usize, usize)>,
    source_copy_offsets: Vec<usize>,
    total_source_copies: usize,
}

impl InflationContext {
    pub fn new(network: CausalNetwork, inflation: usize) -> Result<Self, NetworkError> {
        if inflation == 0 {
            return Err(NetworkError::ZeroInflation);
        }
        let mut source_copy_offsets = Vec::with_capacity(network.sources().len());
        let mut total_source_copies = 0;
        for source in 0..network.sources().len() {
            source_copy_offsets.push(total_source_copies);
            total_source_copies += network.source_copies(source, inflation);
        }

        let mut observables = Vec::with_capacity(network.observables().len());
        let mut operator_info = Vec::new();
        let mut variant_lookup = Vec::new();
        for observable in network.observables() {
            let sources: Vec<usize> = observable.sources.iter().copied().collect();
            let source_copies: Vec<usize> = sources
                .iter()
                .map(|&s| network.source_copies(s, inflation))
                .collect();
            let operators_per_variant = observable.operators_per_copy();
            let operator_offset = operator_info.len();
            let variant_offset = variant_lookup.len();

            let mut variants = Vec::with_capacity(observable.count_copies(inflation));
            for (flat_index, indices) in MultiDimensionalIndexIterator::new(source_copies.clone()).enumerate() {
                let mut connected_sources = SourceSet::new();
                let mut source_variants = BTreeMap::new();
                for (&source, &copy) in sources.iter().zip(&indices) {
                    connected_sources.insert(source_copy_offsets[source] + copy);
                    source_variants.insert(source, copy);
                }
                let variant_operator_offset = operator_info.len();
                for outcome in 0..operators_per_variant {
                    operator_info.push(OperatorInfo {
                        observable: observable.id,
                        variant: flat_index,
                        outcome,
                    });
                }
                variants.push(ICVariant {
                    observable: observable.id,
                    flat_index,
                    global_index: variant_lookup.len(),
                    operator_offset: variant_operator_offset,
                    indices,
                    source_variants,
                    connected_sources,
                });
                variant_lookup.push((observable.id, flat_index));
            }

            observables.push(ICObservable {
                id: observable.id,
                name: observable.name.clone(),
                outcomes: observable.outcomes,
                operators_per_variant,
                operator_offset,
                variant_offset,
                sources,
                source_copies,
                variants,
            });
        }

        let party = Party::new(0, "I", operator_info.len(), OperatorFlags::Idempotent);
        let operators = party.operators().to_vec();
        Ok(Self {
            network,
            inflation,
            parties: vec![party],
            operators,
            observables,
            operator_info,
            variant_lookup,
            source_copy_offsets,
            total_source_copies,
        })
    }

    #[inline]
    pub fn network(&self) -> &CausalNetwork {
        &self.network
    }

    #[inline]
    pub fn inflation(&self) -> usize {
        self.inflation
    }

    #[inline]
    pub fn observables(&self) -> &[ICObservable] {
        &self.observables
    }

    /// Number of variants across all observables.
    #[inline]
    pub fn variant_count(&self) -> usize {
        self.variant_lookup.len()
    }

    /// Variant with global index `index`.
    pub fn variant(&self, index: usize) -> Option<&ICVariant> {
        let &(observable, flat) = self.variant_lookup.get(index)?;
        Some(&self.observables[observable].variants[flat])
    }

    /// Variant with a global index this context handed out.
    pub(crate) fn variant_at(&self, index: usize) -> &ICVariant {
        let (observable, flat) = self.variant_lookup[index];
        &self.observables[observable].variants[flat]
    }

    fn check_variants(&self, variants: &[usize]) -> Result<(), NetworkError> {
        match variants.iter().find(|&&v| v >= self.variant_count()) {
            Some(&index) => Err(NetworkError::BadVariant {
                index,
                count: self.variant_count(),
            }),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn total_source_copies(&self) -> usize {
        self.total_source_copies
    }

    /// Placement of an operator of this context.
    ///
    /// # Panics
    /// If `op` is not an operator of this context.
    #[inline]
    pub fn operator_info(&self, op: &Operator) -> OperatorInfo {
        self.operator_info[op.id as usize]
    }

    /// Projector for `outcome` of a variant; `None` for the implicit last outcome.
    pub fn operator_for(&self, observable: usize, variant: usize, outcome: usize) -> Option<Operator> {
        let obs = self.observables.get(observable)?;
        let var = obs.variants.get(variant)?;
        (outcome < obs.operators_per_variant).then(|| self.operators[var.operator_offset + outcome])
    }

    fn variant_of(&self, info: OperatorInfo) -> &ICVariant {
        &self.observables[info.observable].variants[info.variant]
    }

    /// Whether two variants (global indices) share no source copy.
    pub fn independent(&self, a: usize, b: usize) -> Result<bool, NetworkError> {
        self.check_variants(&[a, b])?;
        Ok(!self
            .variant_at(a)
            .connected_sources
            .intersects(&self.variant_at(b).connected_sources))
    }

    /// Whether two operators of distinct variants commute.
    fn commutes_info(&self, a: OperatorInfo, b: OperatorInfo) -> bool {
        if a.observable != b.observable {
            return true;
        }
        !self
            .variant_of(a)
            .connected_sources
            .intersects(&self.variant_of(b).connected_sources)
    }

    /// Whether two operators commute.
    pub fn commutes(&self, a: &Operator, b: &Operator) -> bool {
        let (ia, ib) = (self.operator_info(a), self.operator_info(b));
        if ia.observable == ib.observable && ia.variant == ib.variant {
            // Equal projectors commute; orthogonal ones multiply to zero either way.
            return true;
        }
        self.commutes_info(ia, ib)
    }

    /// Removes repeats and detects orthogonal pairs that commutation can
    /// bring together. Returns `true` if the product is zero.
    fn reduce_projectors(&self, ops: &mut Vec<Operator>) -> bool {
        let mut j = 1;
        while j < ops.len() {
            let later = self.operator_info(&ops[j]);
            let mut removed = false;
            for i in (0..j).rev() {
                let earlier = self.operator_info(&ops[i]);
                if earlier.observable == later.observable && earlier.variant == later.variant {
                    if earlier.outcome != later.outcome {
                        return true;
                    }
                    ops.remove(j);
                    removed = true;
                    break;
                }
                if !self.commutes_info(earlier, later) {
                    break;
                }
            }
            if !removed {
                j += 1;
            }
        }
        false
    }

    /// Lexicographic normal form of a reduced word.
    fn lexicographic_form(&self, ops: &mut Vec<Operator>) {
        let mut remaining = std::mem::take(ops);
        while !remaining.is_empty() {
            let mut best = 0;
            for k in 1..remaining.len() {
                if remaining[k] < remaining[best]
                    && remaining[..k].iter().all(|prior| self.commutes(prior, &remaining[k]))
                {
                    best = k;
                }
            }
            ops.push(remaining.remove(best));
        }
    }

    /// Explicit sources used by `variants`, with the copies each one uses.
    fn used_copies(&self, variants: impl IntoIterator<Item = usize>) -> Vec<(usize, Vec<usize>)> {
        let explicit = self.network.implicit_source_index();
        let mut used: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for variant in variants {
            for (&source, &copy) in &self.variant_at(variant).source_variants {
                if source < explicit {
                    used.entry(source).or_default().insert(copy);
                }
            }
        }
        used.into_iter()
            .map(|(source, copies)| (source, copies.into_iter().collect()))
            .collect()
    }

    /// Every relabeling that maps each source's used copies onto `0..m`.
    ///
    /// A relabeling is indexed by global source copy; unused copies keep their label.
    fn relabelings(&self, used: &[(usize, Vec<usize>)]) -> Vec<Vec<usize>> {
        let permutations: Vec<Vec<Vec<usize>>> = used
            .iter()
            .map(|(_, copies)| copies.iter().copied().permutations(copies.len()).collect())
            .collect();
        let identity: Vec<usize> = (0..self.network.sources().len())
            .flat_map(|s| 0..self.network.source_copies(s, self.inflation))
            .collect();

        MultiDimensionalIndexIterator::new(permutations.iter().map(Vec::len).collect())
            .map(|choice| {
                let mut map = identity.clone();
                for ((source, _), (options, &pick)) in used.iter().zip(permutations.iter().zip(&choice)) {
                    for (label, &copy) in options[pick].iter().enumerate() {
                        map[self.source_copy_offsets[*source] + copy] = label;
                    }
                }
                map
            })
            .collect()
    }

    /// Image of a variant (global index) under a relabeling.
    fn relabel_variant(&self, variant: usize, map: &[usize]) -> usize {
        let var = self.variant_at(variant);
        let obs = &self.observables[var.observable];
        let indices: Vec<usize> = obs
            .sources
            .iter()
            .zip(&var.indices)
            .map(|(&source, &copy)| map[self.source_copy_offsets[source] + copy])
            .collect();
        obs.variant_offset + obs.variant_index(&indices)
    }

    fn global_variant(&self, info: OperatorInfo) -> usize {
        self.observables[info.observable].variant_offset + info.variant
    }

    /// Representative of `sequence` under relabeling of source copies: the
    /// image with the lowest hash.
    ///
    /// `sequence` must have been built in this context.
    pub fn canonical_moment(&self, sequence: &OperatorSequence) -> OperatorSequence {
        if sequence.is_empty() {
            return sequence.clone();
        }
        let used = self.used_copies(sequence.iter().map(|op| self.global_variant(self.operator_info(op))));
        let mut best: Option<(u64, OperatorSequence)> = None;
        for map in self.relabelings(&used) {
            let relabeled = sequence
                .iter()
                .map(|op| {
                    let info = self.operator_info(op);
                    let variant = self.variant_at(self.relabel_variant(self.global_variant(info), &map));
                    self.operators[variant.operator_offset + info.outcome]
                })
                .collect();
            let candidate = OperatorSequence::new(relabeled, self);
            let hash = self.hash(&candidate);
            if best.as_ref().map_or(true, |(lowest, _)| hash < *lowest) {
                best = Some((hash, candidate));
            }
        }
        best.map_or_else(|| sequence.clone(), |(_, canonical)| canonical)
    }

    /// Representative of a set of variants (global indices) under relabeling
    /// of source copies: the lexicographically smallest sorted image.
    pub fn canonical_variants(&self, variants: &[usize]) -> Result<Vec<usize>, NetworkError> {
        self.check_variants(variants)?;
        Ok(self.canonical_variants_of(variants))
    }

    pub(crate) fn canonical_variants_of(&self, variants: &[usize]) -> Vec<usize> {
        let used = self.used_copies(variants.iter().copied());
        let mut best: Option<Vec<usize>> = None;
        for map in self.relabelings(&used) {
            let mut image: Vec<usize> = variants.iter().map(|&v| self.relabel_variant(v, &map)).collect();
            image.sort_unstable();
            if best.as_ref().map_or(true, |lowest| image < *lowest) {
                best = Some(image);
            }
        }
        best.unwrap_or_else(|| {
            let mut sorted = variants.to_vec();
            sorted.sort_unstable();
            sorted
        })
    }

    /// Whether every pair of the given variants (global indices) commutes.
    pub fn variants_commute(&self, variants: &[usize]) -> Result<bool, NetworkError> {
        self.check_variants(variants)?;
        Ok(self.variants_commute_of(variants))
    }

    pub(crate) fn variants_commute_of(&self, variants: &[usize]) -> bool {
        variants.iter().tuple_combinations().all(|(&a, &b)| {
            let (va, vb) = (self.variant_at(a), self.variant_at(b));
            a != b
                && (va.observable != vb.observable
                    || !va.connected_sources.intersects(&vb.connected_sources))
        })
    }

    /// Splits `sequence` into factors over disjoint sets of source copies,
    /// ordered by hash. Zero factors as `[0]`; the identity has no factors.
    ///
    /// `sequence` must have been built in this context.
    pub fn factorize(&self, sequence: &OperatorSequence) -> Vec<OperatorSequence> {
        if sequence.is_zero() {
            return vec![OperatorSequence::zero()];
        }
        let mut groups: Vec<(SourceSet, Vec<usize>)> = Vec::new();
        for (position, op) in sequence.iter().enumerate() {
            let sources = &self.variant_of(self.operator_info(op)).connected_sources;
            let mut merged = (sources.clone(), vec![position]);
            let mut kept = Vec::with_capacity(groups.len());
            for group in groups.drain(..) {
                if group.0.intersects(&merged.0) {
                    merged.0.union_with(&group.0);
                    merged.1.extend(group.1);
                } else {
                    kept.push(group);
                }
            }
            kept.push(merged);
            groups = kept;
        }

        let mut factors: Vec<(u64, OperatorSequence)> = groups
            .into_iter()
            .map(|(_, mut positions)| {
                positions.sort_unstable();
                let ops = positions.into_iter().map(|p| sequence.operators()[p]).collect();
                let factor = OperatorSequence::new(ops, self);
                (self.hash(&factor), factor)
            })
            .collect();
        factors.sort_by_key(|(hash, _)| *hash);
        factors.into_iter().map(|(_, factor)| factor).collect()
    }
}

impl Context for InflationContext {
    fn parties(&self) -> &[Party] {
        &self.parties
    }

    fn operators(&self) -> &[Operator] {
        &self.operators
    }

    fn additional_simplification(&self, ops: &mut Vec<Operator>) -> bool {
        if self.reduce_projectors(ops) {
            return true;
        }
        self.lexicographic_form(ops);
        false
    }

    fn format_operator(&self, op: &Operator) -> String {
        let info = self.operator_info(op);
        let observable = &self.observables[info.observable];
        let variant = &observable.variants[info.variant];
        format!("{}[{}].{}", observable.name, variant.indices.iter().join(","), info.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Triangle: A-B share source 0, B-C source 1, A-C source 2.
    fn triangle(inflation: usize) -> InflationContext {
        let network = CausalNetwork::new(
            vec![2, 2, 2],
            vec![
                BTreeSet::from([0, 1]),
                BTreeSet::from([1, 2]),
                BTreeSet::from([0, 2]),
            ],
        )
        .unwrap();
        InflationContext::new(network, inflation).unwrap()
    }

    /// A single observable fed by one source, with three outcomes.
    fn single_source(inflation: usize) -> InflationContext {
        let network = CausalNetwork::new(vec![3], vec![BTreeSet::from([0])]).unwrap();
        InflationContext::new(network, inflation).unwrap()
    }

    fn op(ctx: &InflationContext, observable: usize, indices: &[usize], outcome: usize) -> Operator {
        let variant = ctx.observables()[observable].variant_index(indices);
        ctx.operator_for(observable, variant, outcome).unwrap()
    }

    #[test]
    fn layout() {
        let ctx = triangle(2);
        assert_eq!(ctx.size(), 12);
        assert_eq!(ctx.variant_count(), 12);
        assert_eq!(ctx.total_source_copies(), 6);
        let a = &ctx.observables()[0];
        assert_eq!(a.sources, vec![0, 2]);
        assert_eq!(a.variant_index(&[1, 0]), 2);
        assert_eq!(ctx.format_operator(&op(&ctx, 0, &[1, 0], 0)), "A[1,0].0");
        assert_eq!(ctx.operator_for(0, 0, 1), None);
    }

    #[test]
    fn outcomes_are_orthogonal_projectors() {
        let ctx = single_source(2);
        let a0 = op(&ctx, 0, &[0], 0);
        let a1 = op(&ctx, 0, &[0], 1);
        assert!(OperatorSequence::new(vec![a0, a1], &ctx).is_zero());
        assert_eq!(OperatorSequence::new(vec![a0, a0], &ctx).operators(), &[a0]);
    }

    #[test]
    fn independent_copies_commute() {
        let ctx = single_source(2);
        let first = op(&ctx, 0, &[0], 0);
        let second = op(&ctx, 0, &[1], 0);
        let forward = OperatorSequence::new(vec![first, second], &ctx);
        let backward = OperatorSequence::new(vec![second, first], &ctx);
        assert_eq!(forward, backward);
        assert_eq!(forward.operators(), &[first, second]);
    }

    #[test]
    fn dependent_copies_do_not_commute() {
        let ctx = triangle(2);
        let a00 = op(&ctx, 0, &[0, 0], 0);
        let a01 = op(&ctx, 0, &[0, 1], 0);
        assert!(!ctx.commutes(&a00, &a01));
        let forward = OperatorSequence::new(vec![a01, a00], &ctx);
        assert_eq!(forward.operators(), &[a01, a00]);
        // Repeats separated only by commuting operators still collapse.
        let b = op(&ctx, 1, &[1, 1], 0);
        let word = OperatorSequence::new(vec![a00, b, a00], &ctx);
        assert_eq!(word.len(), 2);
    }

    #[test]
    fn orthogonality_through_commuting_neighbours() {
        let ctx = single_source(2);
        let a0 = op(&ctx, 0, &[0], 0);
        let a1 = op(&ctx, 0, &[0], 1);
        let other = op(&ctx, 0, &[1], 0);
        assert!(OperatorSequence::new(vec![a0, other, a1], &ctx).is_zero());
    }

    #[test]
    fn canonical_moment_relabels_sources() {
        let ctx = single_source(3);
        let copy2 = OperatorSequence::new(vec![op(&ctx, 0, &[2], 1)], &ctx);
        let copy0 = OperatorSequence::new(vec![op(&ctx, 0, &[0], 1)], &ctx);
        assert_eq!(ctx.canonical_moment(&copy2), copy0);
        assert_eq!(ctx.canonical_moment(&OperatorSequence::identity()), OperatorSequence::identity());

        let tri = triangle(2);
        let word = OperatorSequence::new(vec![op(&tri, 0, &[1, 1], 0), op(&tri, 1, &[1, 0], 0)], &tri);
        let canonical = tri.canonical_moment(&word);
        let expected = OperatorSequence::new(vec![op(&tri, 0, &[0, 0], 0), op(&tri, 1, &[0, 0], 0)], &tri);
        assert_eq!(canonical, expected);
    }

    #[test]
    fn canonical_variants_are_minimal() {
        let ctx = single_source(3);
        assert_eq!(ctx.canonical_variants(&[2]).unwrap(), vec![0]);
        assert_eq!(ctx.canonical_variants(&[1, 2]).unwrap(), vec![0, 1]);
        assert!(ctx.variants_commute(&[0, 1, 2]).unwrap());
        assert!(ctx.independent(0, 2).unwrap());
        let tri = triangle(2);
        // A[0,0] and A[0,1] share source 0's copy 0.
        assert!(!tri.variants_commute(&[0, 1]).unwrap());
        assert!(!tri.independent(0, 1).unwrap());
    }

    #[test]
    fn foreign_variants_are_rejected() {
        let ctx = single_source(3);
        assert!(ctx.variant(2).is_some());
        assert!(ctx.variant(3).is_none());
        let out_of_range = NetworkError::BadVariant { index: 3, count: 3 };
        assert_eq!(ctx.canonical_variants(&[0, 3]).unwrap_err(), out_of_range);
        assert_eq!(ctx.variants_commute(&[3]).unwrap_err(), out_of_range);
        assert_eq!(ctx.independent(3, 0).unwrap_err(), out_of_range);
    }

    #[test]
    fn factorization_splits_disjoint_sources() {
        let ctx = triangle(2);
        let a = op(&ctx, 0, &[0, 0], 0);
        let b_far = op(&ctx, 1, &[1, 1], 0);
        let c = op(&ctx, 2, &[0, 0], 0);
        let joint = OperatorSequence::new(vec![a, b_far], &ctx);
        assert_eq!(ctx.factorize(&joint).len(), 2);
        // A[0,0] and C[0,0] share source 2's copy 0.
        let linked = OperatorSequence::new(vec![a, c], &ctx);
        assert_eq!(ctx.factorize(&linked), vec![linked.clone()]);
        assert_eq!(ctx.factorize(&OperatorSequence::zero()), vec![OperatorSequence::zero()]);
        assert!(ctx.factorize(&OperatorSequence::identity()).is_empty());
    }

    #[test]
    fn singleton_observables_are_not_copied() {
        let network = CausalNetwork::new(vec![2, 2], vec![BTreeSet::from([0])]).unwrap();
        let ctx = InflationContext::new(network, 3).unwrap();
        assert_eq!(ctx.observables()[1].variants.len(), 1);
        assert_eq!(ctx.size(), 4);
    }

    proptest! {
        #[test]
        fn inflation_canonical_forms(raw in prop::collection::vec(0usize..12, 0..6)) {
            let ctx = triangle(2);
            let ops: Vec<Operator> = raw.iter().map(|&g| ctx.operator(g)).collect();
            let seq = OperatorSequence::new(ops, &ctx);
            let again = OperatorSequence::new(seq.operators().to_vec(), &ctx);
            if !seq.is_zero() {
                prop_assert_eq!(&again, &seq);
            }
            prop_assert_eq!(seq.conjugate(&ctx).conjugate(&ctx), seq.clone());
            let hash = ctx.hash(&seq);
            prop_assert_eq!(hash == 0, seq.is_zero());
            prop_assert_eq!(hash == 1, seq.is_identity());
        }
    }
}
