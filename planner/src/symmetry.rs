//! Point-group symmetry expansion of reciprocal-lattice samples.
//!
//! A reflection is covered when any of its symmetry-equivalent copies falls
//! inside a detector volume. The operations act on Miller indices and are
//! written in the usual crystallographic shorthand, e.g. `"-k,h-k,l"`.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, RowVector3, Vector3};

use crate::error::GeometryError;

/// Linear symmetry operation on Miller indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryOperation(Matrix3<f64>);

impl SymmetryOperation {
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self(matrix)
    }

    /// `h,k,l`
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// `-h,-k,-l`
    pub fn inversion() -> Self {
        Self(-Matrix3::identity())
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    pub fn apply(&self, hkl: &Vector3<f64>) -> Vector3<f64> {
        self.0 * hkl
    }
}

/// Parse one component such as `h-k` or `-2l` into its h, k, l coefficients.
fn parse_component(expr: &str) -> Option<[f64; 3]> {
    let mut row = [0.0; 3];
    let mut chars = expr.chars().filter(|c| !c.is_whitespace()).peekable();
    chars.peek()?;

    while chars.peek().is_some() {
        let mut sign = 1.0;
        while let Some(&c) = chars.peek() {
            match c {
                '+' => {}
                '-' => sign = -sign,
                _ => break,
            }
            chars.next();
        }

        let mut digits = String::new();
        while let Some(&c) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            chars.next();
        }
        let coefficient = if digits.is_empty() {
            1.0
        } else {
            digits.parse::<f64>().ok()?
        };

        let axis = match chars.next()?.to_ascii_lowercase() {
            'h' => 0,
            'k' => 1,
            'l' => 2,
            _ => return None,
        };
        row[axis] += sign * coefficient;
    }

    Some(row)
}

impl FromStr for SymmetryOperation {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeometryError::InvalidSymmetryOperation(s.to_string());

        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut rows = [RowVector3::zeros(); 3];
        for (row, part) in rows.iter_mut().zip(&parts) {
            let coefficients = parse_component(part).ok_or_else(invalid)?;
            *row = RowVector3::from(coefficients);
        }

        let matrix = Matrix3::from_rows(&rows);
        if matrix.determinant().abs() < 0.5 {
            return Err(invalid());
        }
        Ok(Self(matrix))
    }
}

impl fmt::Display for SymmetryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = ['h', 'k', 'l'];
        let mut components = Vec::with_capacity(3);
        for i in 0..3 {
            let mut text = String::new();
            for (j, name) in names.iter().enumerate() {
                let c = self.0[(i, j)];
                if c == 0.0 {
                    continue;
                }
                if c < 0.0 {
                    text.push('-');
                } else if !text.is_empty() {
                    text.push('+');
                }
                if c.abs() != 1.0 {
                    text.push_str(&format!("{}", c.abs()));
                }
                text.push(*name);
            }
            if text.is_empty() {
                text.push('0');
            }
            components.push(text);
        }
        write!(f, "{}", components.join(","))
    }
}

/// Integer Miller indices in `-h_max..=h_max × -k_max..=k_max × -l_max..=l_max`.
///
/// Ordered with k outermost, then h, then l.
pub fn hkl_box(h_max: u32, k_max: u32, l_max: u32) -> Vec<Vector3<f64>> {
    let axis = |m: u32| -(m as i64)..=(m as i64);
    let mut hkl = Vec::with_capacity(
        (2 * h_max as usize + 1) * (2 * k_max as usize + 1) * (2 * l_max as usize + 1),
    );
    for k in axis(k_max) {
        for h in axis(h_max) {
            for l in axis(l_max) {
                hkl.push(Vector3::new(h as f64, k as f64, l as f64));
            }
        }
    }
    hkl
}

/// One lab-frame copy of `hkl` per operation, `q = UB · (op · hkl)`.
pub fn expand(
    hkl: &[Vector3<f64>],
    operations: &[SymmetryOperation],
    ub: &Matrix3<f64>,
) -> Result<Vec<Vec<Vector3<f64>>>, GeometryError> {
    if operations.is_empty() {
        return Err(GeometryError::InvalidGrid(
            "at least one symmetry operation is required".to_string(),
        ));
    }

    Ok(operations
        .iter()
        .map(|op| hkl.iter().map(|h| ub * op.apply(h)).collect())
        .collect())
}
