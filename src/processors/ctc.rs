//! Best-path CTC decoding.

use ndarray::{ArrayView2, Axis};

/// Result of decoding one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcPath {
    /// Collapsed token indices.
    pub indices: Vec<usize>,
    /// Mean probability of the kept timesteps, 0 when nothing was kept.
    pub confidence: f32,
}

/// Greedy decoder for models trained with a CTC loss.
#[derive(Debug, Clone, Copy)]
pub struct CTCGreedyDecoder {
    blank_index: usize,
}

impl CTCGreedyDecoder {
    pub fn new(blank_index: usize) -> Self {
        Self { blank_index }
    }

    pub fn blank_index(&self) -> usize {
        self.blank_index
    }

    /// Picks the most probable class at every timestep of a `[T, C]` matrix.
    pub fn best_path(&self, probs: ArrayView2<f32>) -> Vec<(usize, f32)> {
        probs
            .outer_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(idx, &prob)| (idx, prob))
                    .unwrap_or((self.blank_index, 0.0))
            })
            .collect()
    }

    /// Decodes a `[T, C]` matrix: best path, then merge repeats and drop blanks.
    pub fn decode(&self, probs: ArrayView2<f32>) -> CtcPath {
        let path = self.best_path(probs);
        let mut indices = Vec::new();
        let mut prob_sum = 0.0;
        let mut previous = None;
        for (idx, prob) in path {
            if previous != Some(idx) && idx != self.blank_index {
                indices.push(idx);
                prob_sum += prob;
            }
            previous = Some(idx);
        }
        let confidence = if indices.is_empty() {
            0.0
        } else {
            prob_sum / indices.len() as f32
        };
        CtcPath {
            indices,
            confidence,
        }
    }

    /// Decodes every item of a `[B, T, C]` batch independently.
    pub fn decode_batch(&self, probs: &ndarray::Array3<f32>) -> Vec<CtcPath> {
        let paths: Vec<CtcPath> = probs
            .axis_iter(Axis(0))
            .map(|item| self.decode(item))
            .collect();
        tracing::debug!(
            "CTC decode: batch of {}, {} tokens total",
            paths.len(),
            paths.iter().map(|p| p.indices.len()).sum::<usize>()
        );
        paths
    }
}

/// Applies the CTC collapse rule to a token path: consecutive repeats merge
/// into one token, then every blank is removed.
pub fn collapse(path: &[usize], blank_index: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(path.len());
    let mut previous = None;
    for &idx in path {
        if previous != Some(idx) && idx != blank_index {
            out.push(idx);
        }
        previous = Some(idx);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    const BLANK: usize = 4;

    fn one_hot(path: &[usize], classes: usize) -> Array2<f32> {
        let mut probs = Array2::<f32>::from_elem((path.len(), classes), 0.01);
        for (t, &idx) in path.iter().enumerate() {
            probs[[t, idx]] = 0.9;
        }
        probs
    }

    #[test]
    fn test_collapse_merges_repeats_and_drops_blanks() {
        assert_eq!(collapse(&[1, 1, BLANK, 1, 2, 2, BLANK, BLANK, 3], BLANK), vec![1, 1, 2, 3]);
        assert_eq!(collapse(&[BLANK, BLANK], BLANK), Vec::<usize>::new());
    }

    #[test]
    fn test_collapse_is_idempotent_on_collapsed_input() {
        let collapsed = vec![1, 2, 1, 3, 0, 2];
        assert_eq!(collapse(&collapsed, BLANK), collapsed);
        let once = collapse(&[2, 2, BLANK, 2, 3, 3], BLANK);
        assert_eq!(collapse(&once, BLANK), vec![2, 3]);
    }

    #[test]
    fn test_decode_uses_argmax_per_timestep() {
        let decoder = CTCGreedyDecoder::new(BLANK);
        let probs = one_hot(&[1, 1, BLANK, 1, 3, BLANK], 5);
        let path = decoder.decode(probs.view());
        assert_eq!(path.indices, vec![1, 1, 3]);
        assert!((path.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_decode_batch_is_independent_per_item() {
        let decoder = CTCGreedyDecoder::new(BLANK);
        let mut batch = Array3::<f32>::zeros((2, 4, 5));
        batch.index_axis_mut(Axis(0), 0).assign(&one_hot(&[1, 2, 2, BLANK], 5));
        batch.index_axis_mut(Axis(0), 1).assign(&one_hot(&[BLANK, BLANK, BLANK, BLANK], 5));
        let paths = decoder.decode_batch(&batch);
        assert_eq!(paths[0].indices, vec![1, 2]);
        assert!(paths[1].indices.is_empty());
        assert_eq!(paths[1].confidence, 0.0);
    }
}
