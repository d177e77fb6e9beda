//! Tagging of invalid responses as missing.

use ndarray::{Array2, ArrayView2};

/// A response matrix together with its missing-data mask.
///
/// `mask[[i, j]]` is `true` where the response is *not* one of the valid
/// categories, so downstream estimation treats it as missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedResponses {
    data: Array2<i32>,
    mask: Array2<bool>,
}

impl MaskedResponses {
    pub fn data(&self) -> &Array2<i32> {
        &self.data
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn is_missing(&self, item: usize, person: usize) -> bool {
        self.mask[[item, person]]
    }

    pub fn missing_count(&self) -> usize {
        self.mask.iter().filter(|&&missing| missing).count()
    }

    pub fn valid_count(&self) -> usize {
        self.mask.len() - self.missing_count()
    }

    /// Copy of the data with missing entries replaced by `fill`.
    pub fn filled(&self, fill: i32) -> Array2<i32> {
        let mut filled = self.data.clone();
        filled.zip_mut_with(&self.mask, |value, &missing| {
            if missing {
                *value = fill;
            }
        });
        filled
    }

    pub fn into_parts(self) -> (Array2<i32>, Array2<bool>) {
        (self.data, self.mask)
    }
}

/// Mask every entry of `responses` that is not in `valid_responses`.
pub fn tag_missing_data(responses: ArrayView2<i32>, valid_responses: &[i32]) -> MaskedResponses {
    let mask = responses.mapv(|value| !valid_responses.contains(&value));
    MaskedResponses {
        data: responses.to_owned(),
        mask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mt19937;
    use crate::utils::uniform;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_missing_data() {
        let mut rng = Mt19937::seed_from_u64(3428);
        let random_data =
            Array2::from_shape_fn((500, 500), |_| (uniform(&mut rng) * 4.0).floor() as i32);
        let mask_bad = random_data.mapv(|value| value < 2);

        let tagged = tag_missing_data(random_data.view(), &[2, 3]);
        assert_eq!(tagged.mask(), &mask_bad);
        assert_eq!(tagged.data(), &random_data);
        assert_eq!(
            tagged.missing_count(),
            mask_bad.iter().filter(|&&bad| bad).count()
        );
    }

    #[test]
    fn test_filled_and_counts() {
        let responses = array![[1, 2, 9], [-1, 3, 2]];
        let tagged = tag_missing_data(responses.view(), &[1, 2, 3]);

        assert!(tagged.is_missing(0, 2));
        assert!(tagged.is_missing(1, 0));
        assert!(!tagged.is_missing(1, 1));
        assert_eq!(tagged.valid_count(), 4);
        assert_eq!(tagged.filled(-99), array![[1, 2, -99], [-99, 3, 2]]);

        let (data, mask) = tagged.into_parts();
        assert_eq!(data, responses);
        assert_eq!(mask, array![[false, false, true], [true, false, false]]);
    }
}
