// THEORY:
// A `BucketSet` is the ordered palette of prefabs the renderer draws with,
// darkest first. It is built once, before any frame is processed, and never
// changes afterwards; the pixelizer only needs its length, the reconciler looks
// prefabs up by index.

use crate::error::{RenderError, RenderResult};

/// Ordered prefab identifiers, index 0 darkest.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSet<P> {
    prefabs: Vec<P>,
}

impl<P> BucketSet<P> {
    /// Rejects an empty palette.
    pub fn new(prefabs: Vec<P>) -> RenderResult<Self> {
        if prefabs.is_empty() {
            return Err(RenderError::degenerate("a bucket set needs at least one prefab"));
        }
        Ok(Self { prefabs })
    }

    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }

    pub fn get(&self, bucket_index: usize) -> Option<&P> {
        self.prefabs.get(bucket_index)
    }

    pub fn darkest(&self) -> &P {
        &self.prefabs[0]
    }

    pub fn brightest(&self) -> &P {
        &self.prefabs[self.prefabs.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.prefabs.iter()
    }
}

impl<P> TryFrom<Vec<P>> for BucketSet<P> {
    type Error = RenderError;

    fn try_from(prefabs: Vec<P>) -> RenderResult<Self> {
        Self::new(prefabs)
    }
}
