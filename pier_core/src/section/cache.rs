//! Content-addressed cache of section models.
//!
//! Keys are the exact bit patterns of `(length, width, coarseness)`, so two
//! lookups share a model only when every input is identical. Models are
//! immutable, which makes a cached entry indistinguishable from a fresh build.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::SectionModel;
use crate::errors::MonitorResult;

/// Cache key built from the f64 bit patterns of the section inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionKey {
    length_bits: u64,
    width_bits: u64,
    coarseness_bits: u64,
}

impl SectionKey {
    pub fn new(length_mm: f64, width_mm: f64, coarseness: f64) -> Self {
        SectionKey {
            length_bits: length_mm.to_bits(),
            width_bits: width_mm.to_bits(),
            coarseness_bits: coarseness.to_bits(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SectionCache {
    models: HashMap<SectionKey, Rc<SectionModel>>,
    hits: usize,
    misses: usize,
}

impl SectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached model for these inputs, building it on first use.
    ///
    /// Build failures are returned and not cached.
    pub fn get_or_build(
        &mut self,
        length_mm: f64,
        width_mm: f64,
        coarseness: f64,
    ) -> MonitorResult<Rc<SectionModel>> {
        let key = SectionKey::new(length_mm, width_mm, coarseness);
        if let Some(model) = self.models.get(&key) {
            self.hits += 1;
            return Ok(Rc::clone(model));
        }

        debug!(length_mm, width_mm, coarseness, "meshing section");
        let model = Rc::new(SectionModel::rectangular(length_mm, width_mm, coarseness)?);
        self.misses += 1;
        self.models.insert(key, Rc::clone(&model));
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_dimensions_share_model() {
        let mut cache = SectionCache::new();
        let a = cache.get_or_build(5000.0, 2000.0, 50.0).unwrap();
        let b = cache.get_or_build(5000.0, 2000.0, 50.0).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_coarseness_is_part_of_key() {
        let mut cache = SectionCache::new();
        let a = cache.get_or_build(5000.0, 2000.0, 50.0).unwrap();
        let b = cache.get_or_build(5000.0, 2000.0, 25.0).unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cached_model_equals_fresh_build() {
        let mut cache = SectionCache::new();
        let cached = cache.get_or_build(4000.0, 1500.0, 40.0).unwrap();
        let fresh = SectionModel::rectangular(4000.0, 1500.0, 40.0).unwrap();
        assert_eq!(*cached, fresh);
    }

    #[test]
    fn test_failures_not_cached() {
        let mut cache = SectionCache::new();
        assert!(cache.get_or_build(-1.0, 2000.0, 50.0).is_err());
        assert!(cache.is_empty());
    }
}
