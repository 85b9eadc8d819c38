// SPDX-License-Identifier: AGPL-3.0-only

//! Composable linear operators on lattice fields.
//!
//! A [`MatrixOperator`] bundles four maps `(dst, src)`: forward A, adjoint
//! A†, inverse A⁻¹ and adjoint-inverse A⁻†. The last two are optional.
//! Composition follows matrix algebra: for C = A∘B
//!
//! | Map | Order of application |
//! |-----|----------------------|
//! | C | B, then A |
//! | C† | A†, then B† |
//! | C⁻¹ | A⁻¹, then B⁻¹ |
//! | C⁻† | B⁻†, then A⁻† |
//!
//! The adjoint/inverse relationship is supplied by the builder and is not
//! verified here. Source and destination are distinct borrows, so an
//! operator can never write into the field it is reading:
//!
//! ```compile_fail
//! use std::sync::Arc;
//! use lattice_fields::lattice::field::Lattice;
//! use lattice_fields::lattice::fft::fft;
//! use lattice_fields::lattice::grid::Grid;
//!
//! let grid = Arc::new(Grid::new(&[4, 4]).unwrap());
//! let mut f = Lattice::complex(&grid);
//! fft(None).apply_into(&mut f, &f);
//! ```

use std::fmt;
use std::ops::Mul;
use std::sync::Arc;

use super::field::{Lattice, ObjectType};

/// One linear map, writing into its first argument.
pub type FieldMap = Arc<dyn Fn(&mut Lattice, &Lattice) + Send + Sync>;

/// Forward, adjoint, inverse and adjoint-inverse maps with type tags.
#[derive(Clone)]
pub struct MatrixOperator {
    forward: FieldMap,
    adjoint: FieldMap,
    inverse: Option<FieldMap>,
    adjoint_inverse: Option<FieldMap>,
    accepts: Option<ObjectType>,
    produces: Option<ObjectType>,
}

impl fmt::Debug for MatrixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixOperator")
            .field("invertible", &self.is_invertible())
            .field("accepts", &self.accepts)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

impl MatrixOperator {
    /// Operator from a forward map and its adjoint.
    pub fn new<F, A>(forward: F, adjoint: A) -> Self
    where
        F: Fn(&mut Lattice, &Lattice) + Send + Sync + 'static,
        A: Fn(&mut Lattice, &Lattice) + Send + Sync + 'static,
    {
        Self {
            forward: Arc::new(forward),
            adjoint: Arc::new(adjoint),
            inverse: None,
            adjoint_inverse: None,
            accepts: None,
            produces: None,
        }
    }

    /// Attach the inverse and adjoint-inverse maps.
    #[must_use]
    pub fn with_inverse<I, J>(mut self, inverse: I, adjoint_inverse: J) -> Self
    where
        I: Fn(&mut Lattice, &Lattice) + Send + Sync + 'static,
        J: Fn(&mut Lattice, &Lattice) + Send + Sync + 'static,
    {
        self.inverse = Some(Arc::new(inverse));
        self.adjoint_inverse = Some(Arc::new(adjoint_inverse));
        self
    }

    /// Restrict the source and destination element types.
    #[must_use]
    pub fn with_types(mut self, accepts: Option<ObjectType>, produces: Option<ObjectType>) -> Self {
        self.accepts = accepts;
        self.produces = produces;
        self
    }

    /// Whether inverse maps are present.
    #[must_use]
    pub const fn is_invertible(&self) -> bool {
        self.inverse.is_some() && self.adjoint_inverse.is_some()
    }

    /// Accepted source element type, if restricted.
    #[must_use]
    pub const fn accepts(&self) -> Option<ObjectType> {
        self.accepts
    }

    /// Produced destination element type, if restricted.
    #[must_use]
    pub const fn produces(&self) -> Option<ObjectType> {
        self.produces
    }

    /// The adjoint operator A†.
    #[must_use]
    pub fn adj(&self) -> Self {
        Self {
            forward: Arc::clone(&self.adjoint),
            adjoint: Arc::clone(&self.forward),
            inverse: self.adjoint_inverse.clone(),
            adjoint_inverse: self.inverse.clone(),
            accepts: self.produces,
            produces: self.accepts,
        }
    }

    /// The inverse operator A⁻¹.
    ///
    /// # Panics
    ///
    /// If no inverse maps were supplied.
    #[must_use]
    pub fn inv(&self) -> Self {
        let (Some(inverse), Some(adjoint_inverse)) = (&self.inverse, &self.adjoint_inverse) else {
            panic!("operator has no inverse");
        };
        Self {
            forward: Arc::clone(inverse),
            adjoint: Arc::clone(adjoint_inverse),
            inverse: Some(Arc::clone(&self.forward)),
            adjoint_inverse: Some(Arc::clone(&self.adjoint)),
            accepts: self.produces,
            produces: self.accepts,
        }
    }

    /// Composition `self ∘ rhs` (apply `rhs` first).
    ///
    /// # Panics
    ///
    /// If both operators declare types and `rhs` produces something `self`
    /// does not accept.
    #[must_use]
    pub fn compose(&self, rhs: &Self) -> Self {
        if let (Some(a), Some(p)) = (self.accepts, rhs.produces) {
            assert_eq!(a, p, "composed operators disagree on the intermediate type");
        }
        let inverse = match (&self.inverse, &rhs.inverse) {
            (Some(a), Some(b)) => Some(chain(a, self.accepts, b)),
            _ => None,
        };
        let adjoint_inverse = match (&rhs.adjoint_inverse, &self.adjoint_inverse) {
            (Some(b), Some(a)) => Some(chain(b, rhs.produces, a)),
            _ => None,
        };
        Self {
            forward: chain(&rhs.forward, rhs.produces, &self.forward),
            adjoint: chain(&self.adjoint, self.accepts, &rhs.adjoint),
            inverse,
            adjoint_inverse,
            accepts: rhs.accepts,
            produces: self.produces,
        }
    }

    /// Apply the forward map into a new field.
    #[must_use]
    pub fn apply(&self, src: &Lattice) -> Lattice {
        let mut dst = match self.produces {
            Some(t) => src.like_typed(t),
            None => src.like(),
        };
        self.apply_into(&mut dst, src);
        dst
    }

    /// Apply the forward map into `dst` (fully overwritten).
    ///
    /// # Panics
    ///
    /// If `src` or `dst` violate the declared element types.
    pub fn apply_into(&self, dst: &mut Lattice, src: &Lattice) {
        if let Some(t) = self.accepts {
            assert_eq!(src.otype(), t, "operator does not accept this source type");
        }
        if let Some(t) = self.produces {
            assert_eq!(dst.otype(), t, "operator does not produce this destination type");
        }
        (self.forward)(dst, src);
    }
}

/// `second ∘ first`, with the intermediate typed by `mid` when known.
fn chain(first: &FieldMap, mid: Option<ObjectType>, second: &FieldMap) -> FieldMap {
    let first = Arc::clone(first);
    let second = Arc::clone(second);
    Arc::new(move |dst: &mut Lattice, src: &Lattice| {
        let mut tmp = match mid {
            Some(t) => src.like_typed(t),
            None => src.like(),
        };
        first(&mut tmp, src);
        second(dst, &tmp);
    })
}

impl Mul for &MatrixOperator {
    type Output = MatrixOperator;
    fn mul(self, rhs: Self) -> MatrixOperator {
        self.compose(rhs)
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;
    use crate::lattice::grid::Grid;

    fn scaling(s: Complex64) -> MatrixOperator {
        MatrixOperator::new(
            move |dst, src| dst.assign(&src.scale(s)),
            move |dst, src| dst.assign(&src.scale(s.conj())),
        )
        .with_inverse(
            move |dst, src| dst.assign(&src.scale(s.inv())),
            move |dst, src| dst.assign(&src.scale(s.conj().inv())),
        )
    }

    fn shift(dim: usize) -> MatrixOperator {
        MatrixOperator::new(
            move |dst, src| dst.assign(&src.cshift(dim, 1)),
            move |dst, src| dst.assign(&src.cshift(dim, -1)),
        )
        .with_inverse(
            move |dst, src| dst.assign(&src.cshift(dim, -1)),
            move |dst, src| dst.assign(&src.cshift(dim, 1)),
        )
    }

    fn field() -> Lattice {
        let g = Arc::new(Grid::new(&[4, 3]).unwrap());
        let mut seed = 17u64;
        Lattice::random(&g, ObjectType::Complex, &mut seed)
    }

    fn assert_close(a: &Lattice, b: &Lattice) {
        for (x, y) in a.data().iter().zip(b.data()) {
            assert!((x - y).norm() < 1e-13, "{x} vs {y}");
        }
    }

    #[test]
    fn composition_applies_right_operand_first() {
        let f = field();
        let a = scaling(Complex64::new(0.0, 2.0));
        let b = shift(0);
        let c = &a * &b;
        let expected = a.apply(&b.apply(&f));
        assert_close(&c.apply(&f), &expected);
    }

    #[test]
    fn adjoint_of_composition_reverses_order() {
        let f = field();
        let a = scaling(Complex64::new(1.0, 1.0)).compose(&shift(1));
        let b = shift(0);
        let c = a.compose(&b);
        let expected = b.adj().apply(&a.adj().apply(&f));
        assert_close(&c.adj().apply(&f), &expected);
    }

    #[test]
    fn inverse_round_trip() {
        let f = field();
        let c = &scaling(Complex64::new(0.5, -1.5)) * &shift(1);
        let back = c.inv().apply(&c.apply(&f));
        assert_close(&back, &f);
        let adj_back = c.adj().inv().apply(&c.adj().apply(&f));
        assert_close(&adj_back, &f);
    }

    #[test]
    fn adjoint_is_involution() {
        let f = field();
        let a = scaling(Complex64::new(0.3, 0.7));
        assert_close(&a.adj().adj().apply(&f), &a.apply(&f));
    }

    #[test]
    #[should_panic(expected = "no inverse")]
    fn missing_inverse_panics() {
        let a = MatrixOperator::new(|d, s| d.assign(s), |d, s| d.assign(s));
        let _ = a.inv();
    }

    #[test]
    #[should_panic(expected = "does not accept")]
    fn type_restriction_is_enforced() {
        let a = MatrixOperator::new(|d, s| d.assign(s), |d, s| d.assign(s))
            .with_types(Some(ObjectType::WilsonSpinor), Some(ObjectType::WilsonSpinor));
        let _ = a.apply(&field());
    }
}
