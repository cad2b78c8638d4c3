//! Compatibility layer for rayon/sequential execution.
//!
//! With the `parallel` feature (the default) this re-exports rayon's
//! parallel iterators. Without it the same method names resolve to plain
//! sequential iterators, so per-row cell passes and per-criterion transforms
//! are written once.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    ///
    /// `into_par_iter()` forwards to `into_iter()`, so `.zip()`, `.map()`,
    /// `.flat_map()` and `.collect()` resolve to the `Iterator` methods.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
