use crate::shared::error::VideoError;

/// A `start:stop:step` selection over frame indices, with Python semantics:
/// missing bounds default to the ends, negative bounds count from the end,
/// out-of-range bounds are clamped rather than rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSlice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl FrameSlice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Every frame, in order.
    pub fn full() -> Self {
        Self::default()
    }

    /// Resolves the slice against a sequence of `length` items, returning
    /// the selected indices in slice order.
    pub fn indices(&self, length: usize) -> Result<Vec<usize>, VideoError> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(VideoError::ZeroStep);
        }
        let len = length as i64;

        let (start, stop) = if step > 0 {
            (
                clamp_bound(self.start, len, 0, len, 0),
                clamp_bound(self.stop, len, 0, len, len),
            )
        } else {
            (
                clamp_bound(self.start, len, -1, len - 1, len - 1),
                clamp_bound(self.stop, len, -1, len - 1, -1),
            )
        };

        let mut indices = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            indices.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(indices)
    }
}

/// Resolves one bound: default when absent, shifted by `len` when negative,
/// then clamped into `[low, high]`.
fn clamp_bound(bound: Option<i64>, len: i64, low: i64, high: i64, default: i64) -> i64 {
    match bound {
        None => default,
        Some(b) => {
            let b = if b < 0 { b + len } else { b };
            b.clamp(low, high)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> FrameSlice {
        FrameSlice::new(start, stop, step)
    }

    #[rstest]
    #[case::full(slice(None, None, None), vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9])]
    #[case::stepped(slice(Some(2), Some(8), Some(2)), vec![2, 4, 6])]
    #[case::negative_start(slice(Some(-3), None, None), vec![7, 8, 9])]
    #[case::negative_stop(slice(None, Some(-7), None), vec![0, 1, 2])]
    #[case::stop_past_end(slice(Some(8), Some(100), None), vec![8, 9])]
    #[case::start_past_end(slice(Some(10), None, None), vec![])]
    #[case::start_after_stop(slice(Some(5), Some(2), None), vec![])]
    #[case::very_negative_start(slice(Some(-100), Some(2), None), vec![0, 1])]
    #[case::step_larger_than_range(slice(Some(1), Some(4), Some(10)), vec![1])]
    #[case::reverse(slice(None, None, Some(-1)), vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0])]
    #[case::reverse_stepped(slice(Some(8), Some(2), Some(-3)), vec![8, 5])]
    #[case::reverse_negative_bounds(slice(Some(-1), Some(-4), Some(-1)), vec![9, 8, 7])]
    #[case::reverse_start_past_end(slice(Some(50), Some(6), Some(-2)), vec![9, 7])]
    #[case::reverse_empty(slice(Some(2), Some(5), Some(-1)), vec![])]
    #[case::huge_step(slice(Some(1), None, Some(i64::MAX)), vec![1])]
    #[case::huge_reverse_step(slice(None, None, Some(i64::MIN)), vec![9])]
    #[case::huge_reverse_step_from_start(slice(Some(0), None, Some(i64::MIN)), vec![0])]
    fn test_indices_over_ten(#[case] s: FrameSlice, #[case] expected: Vec<usize>) {
        assert_eq!(s.indices(10).unwrap(), expected);
    }

    #[test]
    fn test_zero_step_is_rejected() {
        let result = slice(None, None, Some(0)).indices(10);
        assert!(matches!(result, Err(VideoError::ZeroStep)));
    }

    #[test]
    fn test_empty_sequence() {
        assert!(FrameSlice::full().indices(0).unwrap().is_empty());
        assert!(slice(None, None, Some(-1)).indices(0).unwrap().is_empty());
    }
}
