//! Alias tables (Walker/Vose) for O(1) draws from a discrete distribution.
//!
//! Construction is O(k) in the support size. A draw costs two uniform samples: one picks a
//! bucket, the other decides between the bucket itself and its packed alias by comparing
//! against `prob[bucket]`.
//!
//! References:
//! - Walker (1974): An efficient method for generating discrete random variables with general distributions.
//! - Vose (1991): A linear algorithm for generating random numbers with a given distribution.

use crate::{Error, Result};
use rand::Rng;

/// An owned alias table over a non-empty support.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasTable {
    prob: Vec<f32>,
    alias: Vec<u32>,
}

impl AliasTable {
    /// Compile `weights` into an alias table.
    ///
    /// Weights need not be normalized. Zero weights are allowed (that outcome is never
    /// drawn), but at least one weight must be positive.
    ///
    /// Errors:
    /// - [`Error::EmptyDistribution`] if `weights` is empty or sums to zero
    /// - [`Error::InvalidParameter`] if any weight is negative or not finite
    pub fn new(weights: &[f32]) -> Result<Self> {
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidParameter(format!(
                "alias weights must be finite and non-negative, got {w}"
            )));
        }

        let k = weights.len();
        let mut prob = vec![0.0f32; k];
        let mut alias = vec![0u32; k];
        if !alias_setup_into(weights, &mut prob, &mut alias) {
            return Err(Error::EmptyDistribution);
        }
        Ok(Self { prob, alias })
    }

    pub fn len(&self) -> usize {
        self.prob.len()
    }

    /// Always `false`: construction rejects empty distributions.
    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    pub fn view(&self) -> AliasView<'_> {
        AliasView::new(&self.prob, &self.alias)
    }

    /// Draw an index in `0..self.len()`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        alias_draw(&self.prob, &self.alias, rng)
    }

    /// The normalized distribution encoded by the table.
    pub fn probabilities(&self) -> Vec<f64> {
        self.view().probabilities()
    }
}

/// A borrowed alias table, typically a slice of a flat arena.
///
/// Unlike [`AliasTable`], a view may be empty (a node without outgoing edges).
#[derive(Debug, Clone, Copy)]
pub struct AliasView<'a> {
    prob: &'a [f32],
    alias: &'a [u32],
}

impl<'a> AliasView<'a> {
    pub(crate) fn new(prob: &'a [f32], alias: &'a [u32]) -> Self {
        debug_assert_eq!(prob.len(), alias.len());
        Self { prob, alias }
    }

    pub fn len(&self) -> usize {
        self.prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    pub fn prob(&self) -> &'a [f32] {
        self.prob
    }

    pub fn alias(&self) -> &'a [u32] {
        self.alias
    }

    /// Draw an index, or `None` when the support is empty.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(alias_draw(self.prob, self.alias, rng))
    }

    /// Reconstruct the normalized distribution from `prob`/`alias`.
    ///
    /// Outcome `i` keeps `prob[i] / k` of its own bucket and receives `(1 - prob[j]) / k`
    /// from every bucket `j` aliased to it.
    pub fn probabilities(&self) -> Vec<f64> {
        let k = self.len();
        let mut out = vec![0.0f64; k];
        if k == 0 {
            return out;
        }
        let inv_k = 1.0 / k as f64;
        for i in 0..k {
            let keep = (self.prob[i] as f64).clamp(0.0, 1.0);
            out[i] += keep * inv_k;
            out[self.alias[i] as usize] += (1.0 - keep) * inv_k;
        }
        out
    }
}

/// Fill `prob`/`alias` (both `weights.len()` long) with the alias table of `weights`.
///
/// Returns `false` and leaves the outputs untouched if the weights sum to zero (this
/// includes the empty support).
pub(crate) fn alias_setup_into<W>(weights: &[W], prob: &mut [f32], alias: &mut [u32]) -> bool
where
    W: Copy + Into<f64>,
{
    let k = weights.len();
    debug_assert_eq!(prob.len(), k);
    debug_assert_eq!(alias.len(), k);

    let sum: f64 = weights.iter().map(|&w| Into::<f64>::into(w)).sum();
    if !(sum > 0.0) {
        return false;
    }

    // Scaled probabilities in f64; only the final values are narrowed.
    let scale = k as f64 / sum;
    let mut scaled: Vec<f64> = weights.iter().map(|&w| Into::<f64>::into(w) * scale).collect();

    let mut smaller: Vec<usize> = Vec::with_capacity(k);
    let mut larger: Vec<usize> = Vec::with_capacity(k);
    for (i, &s) in scaled.iter().enumerate() {
        alias[i] = i as u32;
        if s < 1.0 {
            smaller.push(i);
        } else {
            larger.push(i);
        }
    }

    while let (Some(&small), Some(&large)) = (smaller.last(), larger.last()) {
        smaller.pop();
        larger.pop();
        prob[small] = scaled[small] as f32;
        alias[small] = large as u32;
        scaled[large] = scaled[large] + scaled[small] - 1.0;
        if scaled[large] < 1.0 {
            smaller.push(large);
        } else {
            larger.push(large);
        }
    }

    // Leftovers are 1.0 up to rounding.
    for i in smaller.into_iter().chain(larger) {
        prob[i] = 1.0;
        alias[i] = i as u32;
    }

    true
}

#[inline]
pub(crate) fn alias_draw<R: Rng>(prob: &[f32], alias: &[u32], rng: &mut R) -> usize {
    debug_assert_eq!(prob.len(), alias.len());
    let kk = rng.random_range(0..prob.len());
    if rng.random::<f32>() < prob[kk] {
        kk
    } else {
        alias[kk] as usize
    }
}
