use std::num::NonZeroUsize;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Groups a stream into consecutive batches of `size`; the trailing batch
/// holds whatever is left and is never dropped.
pub struct Batches<I> {
    inner: I,
    size: NonZeroUsize,
}

impl<I: Iterator> Batches<I> {
    pub fn new(inner: I, size: NonZeroUsize) -> Self {
        Batches { inner, size }
    }

    pub fn get_ref(&self) -> &I {
        &self.inner
    }
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.inner.by_ref().take(self.size.get()).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}
