//! rayon or sequential iteration, chosen by the `parallel` feature.
//!
//! Weights construction iterates rows with `into_par_iter()`. With the
//! feature on that resolves to rayon; with it off the shim below turns the
//! call into a plain `into_iter()`, so the same chain (`flat_map`, `map`,
//! `collect`) compiles against `std::iter::Iterator`. Row results are
//! collected in index order either way.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
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
