use words2map_core::{Words2MapError, Words2MapResult};

/// Combine vectors into one unit vector: elementwise mean, then divide by the
/// L2 norm of the mean.
///
/// Fails on empty input, on vectors of differing length, and when the mean
/// has zero (or non-finite) norm, e.g. `[1, 0]` with `[-1, 0]`.
pub fn combine<V: AsRef<[f32]>>(vectors: &[V]) -> Words2MapResult<Vec<f32>> {
    let first = vectors
        .first()
        .ok_or_else(|| Words2MapError::Combine("no vectors to combine".to_string()))?;
    let dimension = first.as_ref().len();
    if dimension == 0 {
        return Err(Words2MapError::Combine("vectors are empty".to_string()));
    }

    // Accumulate in f64 so hundreds of f16-sourced rows don't drift.
    let mut sum = vec![0.0f64; dimension];
    for (i, vector) in vectors.iter().enumerate() {
        let vector = vector.as_ref();
        if vector.len() != dimension {
            return Err(Words2MapError::Combine(format!(
                "vector {} has {} components, expected {}",
                i,
                vector.len(),
                dimension
            )));
        }
        for (acc, &x) in sum.iter_mut().zip(vector) {
            *acc += f64::from(x);
        }
    }

    let n = vectors.len() as f64;
    for acc in &mut sum {
        *acc /= n;
    }

    let norm = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(Words2MapError::Combine(
            "mean vector has zero norm".to_string(),
        ));
    }

    Ok(sum.iter().map(|x| (x / norm) as f32).collect())
}

/// Euclidean length of `v`.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
