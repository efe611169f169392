// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Cache of designed FIR tables.
//!
//! Designing a table costs thousands of Bessel evaluations, while an
//! application only ever uses a handful of rate pairs. Tables are published
//! behind an `Arc` and never change or get evicted afterwards.

#[cfg(feature = "std")]
use alloc::sync::Arc;

#[cfg(feature = "std")]
use parking_lot::Mutex;
#[cfg(feature = "std")]
use std::collections::HashMap;
#[cfg(feature = "std")]
use std::sync::OnceLock;

#[cfg(feature = "std")]
use super::fir::{FirSpec, FirTable};

/// Identity of a FIR table: length, phase count and exact rate ratio.
///
/// The ratio is compared by bit pattern, so configurations that differ in
/// the last ulp get distinct tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FirKey {
    n: usize,
    res: usize,
    cycles_per_sample_bits: u64,
}

impl FirKey {
    /// Builds a key from the table dimensions and the input/output ratio.
    pub fn new(n: usize, res: usize, cycles_per_sample: f64) -> Self {
        Self {
            n,
            res,
            cycles_per_sample_bits: cycles_per_sample.to_bits(),
        }
    }

    /// Input samples per output sample.
    pub fn cycles_per_sample(&self) -> f64 {
        f64::from_bits(self.cycles_per_sample_bits)
    }
}

#[cfg(feature = "std")]
static FIR_CACHE: OnceLock<FirCache> = OnceLock::new();

/// Thread-safe map from [`FirKey`] to a shared table.
///
/// The lock is held across lookup and design, so each key is designed once
/// even when resamplers are built concurrently.
#[cfg(feature = "std")]
#[derive(Default)]
pub struct FirCache {
    tables: Mutex<HashMap<FirKey, Arc<FirTable>>>,
}

#[cfg(feature = "std")]
impl FirCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used by [`SincResampler::new`](super::SincResampler::new).
    pub fn global() -> &'static FirCache {
        FIR_CACHE.get_or_init(FirCache::new)
    }

    /// Returns the table for `spec`, designing and publishing it on a miss.
    pub fn get_or_design(&self, spec: &FirSpec) -> Arc<FirTable> {
        let key = spec.key();
        let mut tables = self.tables.lock();
        if let Some(table) = tables.get(&key) {
            log::trace!("FIR cache hit: {:?}", key);
            return Arc::clone(table);
        }

        log::debug!(
            "designing FIR table: N={} RES={} ratio={}",
            spec.n,
            spec.res,
            spec.cycles_per_sample
        );
        let table = Arc::new(FirTable::design(spec));
        tables.insert(key, Arc::clone(&table));
        table
    }

    /// Whether a table for `key` has been published.
    pub fn contains(&self, key: &FirKey) -> bool {
        self.tables.lock().contains_key(key)
    }

    /// Number of published tables.
    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    /// True if nothing has been designed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
