//! Serde adapter storing complex vectors as `[re, im]` pairs.

use rustfft::num_complex::Complex64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S: Serializer>(values: &[Complex64], serializer: S) -> Result<S::Ok, S::Error> {
    let pairs: Vec<[f64; 2]> = values.iter().map(|c| [c.re, c.im]).collect();
    pairs.serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Complex64>, D::Error> {
    let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
    Ok(pairs.into_iter().map(|[re, im]| Complex64::new(re, im)).collect())
}

/// Same encoding for the per-channel arrays held in `[Vec<Complex64>; 2]`.
pub mod pair {
    use super::*;

    pub fn serialize<S: Serializer>(
        values: &[Vec<Complex64>; 2],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: [Vec<[f64; 2]>; 2] = [
            values[0].iter().map(|c| [c.re, c.im]).collect(),
            values[1].iter().map(|c| [c.re, c.im]).collect(),
        ];
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[Vec<Complex64>; 2], D::Error> {
        let [a, b] = <[Vec<[f64; 2]>; 2]>::deserialize(deserializer)?;
        let decode = |v: Vec<[f64; 2]>| -> Vec<Complex64> {
            v.into_iter().map(|[re, im]| Complex64::new(re, im)).collect()
        };
        Ok([decode(a), decode(b)])
    }
}
