use core::hash::{BuildHasher, Hasher};

/// Polynomial rolling hash, `h = h * BASE + byte` over every byte written,
/// wrapping on overflow.
///
/// Cheap and deterministic, which keeps probe sequences reproducible from run to
/// run. Two hashers with different bases give the two independent hash functions
/// double hashing needs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolynomialHasher<const BASE: u64> {
    state: u64,
}

impl<const BASE: u64> Hasher for PolynomialHasher<BASE> {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(BASE).wrapping_add(u64::from(byte));
        }
    }
}

/// Builds [`PolynomialHasher`]s starting from a zero state.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use ostat::probe_hash_set::PolynomialState;
///
/// let state = PolynomialState::<127>;
/// assert_eq!(state.hash_one("ab"), state.hash_one(String::from("ab")));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PolynomialState<const BASE: u64>;

impl<const BASE: u64> BuildHasher for PolynomialState<BASE> {
    type Hasher = PolynomialHasher<BASE>;

    fn build_hasher(&self) -> Self::Hasher {
        PolynomialHasher::default()
    }
}

/// Default hasher for the start of a probe sequence.
pub type Primary = PolynomialState<127>;

/// Default hasher for the probe step.
pub type Secondary = PolynomialState<131>;
