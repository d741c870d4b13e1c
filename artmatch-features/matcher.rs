use artmatch_core::Descriptor;
use rayon::prelude::*;

/// Pairing of a query descriptor index with its best candidate descriptor
/// index, after the ratio test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    pub query_idx: usize,
    pub candidate_idx: usize,
}

/// Hamming distance between two 256-bit descriptors.
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Brute-force two-nearest-neighbour matching under Hamming distance with
/// Lowe's ratio test: a query descriptor is paired with its closest
/// candidate only when that candidate is clearly closer than the runner-up
/// (`best < lowe_ratio * second_best`). Ambiguous matches are dropped.
pub fn match_descriptors(
    query: &[Descriptor],
    candidates: &[Descriptor],
    lowe_ratio: f32,
) -> Vec<Correspondence> {
    if candidates.len() < 2 {
        return Vec::new();
    }

    query
        .par_iter()
        .enumerate()
        .filter_map(|(qi, qd)| {
            let mut best = u32::MAX;
            let mut second = u32::MAX;
            let mut best_idx = 0usize;

            for (ci, cd) in candidates.iter().enumerate() {
                let dist = hamming_distance(qd, cd);
                if dist < best {
                    second = best;
                    best = dist;
                    best_idx = ci;
                } else if dist < second {
                    second = dist;
                }
            }

            if (best as f32) < lowe_ratio * (second as f32) {
                Some(Correspondence { query_idx: qi, candidate_idx: best_idx })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_with_bits(bits: &[usize]) -> Descriptor {
        let mut d = [0u8; 32];
        for &b in bits {
            d[b / 8] |= 1 << (b % 8);
        }
        d
    }

    #[test]
    fn test_hamming_distance() {
        let zero = [0u8; 32];
        let one_bit = descriptor_with_bits(&[3]);
        let far = descriptor_with_bits(&[0, 9, 17, 42, 100, 200, 255]);
        assert_eq!(hamming_distance(&zero, &zero), 0);
        assert_eq!(hamming_distance(&zero, &one_bit), 1);
        assert_eq!(hamming_distance(&zero, &far), 7);
        assert_eq!(hamming_distance(&one_bit, &far), 8);
    }

    #[test]
    fn test_clear_winner_is_kept() {
        let query = vec![descriptor_with_bits(&[1, 2, 3])];
        let candidates = vec![
            descriptor_with_bits(&[1, 2, 3]),                       // distance 0
            descriptor_with_bits(&[50, 51, 52, 53, 54, 55, 56, 57]), // far away
        ];
        let matches = match_descriptors(&query, &candidates, 0.75);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0], Correspondence { query_idx: 0, candidate_idx: 0 });
    }

    #[test]
    fn test_ambiguous_match_is_rejected() {
        // Two candidates equidistant from the query: the ratio test must
        // reject the pairing.
        let query = vec![descriptor_with_bits(&[10])];
        let candidates = vec![
            descriptor_with_bits(&[10, 20]),
            descriptor_with_bits(&[10, 30]),
        ];
        let matches = match_descriptors(&query, &candidates, 0.75);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_identical_best_and_second_rejected() {
        // best == second == 0 fails the strict ratio inequality.
        let query = vec![[0u8; 32]];
        let candidates = vec![[0u8; 32], [0u8; 32]];
        let matches = match_descriptors(&query, &candidates, 0.75);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_fewer_than_two_candidates() {
        let query = vec![[0u8; 32]];
        assert!(match_descriptors(&query, &[], 0.75).is_empty());
        assert!(match_descriptors(&query, &[[0u8; 32]], 0.75).is_empty());
    }

    #[test]
    fn test_each_query_matches_its_counterpart() {
        let base: Vec<Descriptor> = (0..8)
            .map(|i| descriptor_with_bits(&[i * 30, i * 30 + 1, i * 30 + 2]))
            .collect();
        let matches = match_descriptors(&base, &base, 0.75);
        assert_eq!(matches.len(), base.len());
        for m in matches {
            assert_eq!(m.query_idx, m.candidate_idx);
        }
    }
}
