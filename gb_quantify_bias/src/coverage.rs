use std::{fmt, str::FromStr};

use utils::BiasError;

use crate::alignment::AlignmentHit;

/// Span on the query sequence.  The number of bases covered is end - start,
/// and intervals where one starts at the end of the other are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    /// Coordinates can be given in either order
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn span(&self) -> usize {
        self.end - self.start
    }
}

/// Unit used on the command line for the similarity cutoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityUnit {
    Fraction,
    Percent,
}

impl SimilarityUnit {
    fn max(&self) -> f64 {
        match self {
            Self::Fraction => 1.0,
            Self::Percent => 100.0,
        }
    }
}

impl FromStr for SimilarityUnit {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fraction" => Ok(Self::Fraction),
            "percent" => Ok(Self::Percent),
            _ => Err("expected fraction or percent"),
        }
    }
}

impl fmt::Display for SimilarityUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fraction => write!(f, "fraction"),
            Self::Percent => write!(f, "percent"),
        }
    }
}

/// Slack allowed when comparing identities so that a hit sitting exactly on
/// the cutoff is retained whichever unit the cutoff was given in
const IDENTITY_EPS: f64 = 1e-9;

/// Minimum identity for an alignment hit to count as similar sequence.
///
/// Stored as a percentage, the unit of the identity column in the hits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityCutoff {
    percent: f64,
}

impl IdentityCutoff {
    pub fn new(value: f64, unit: SimilarityUnit) -> Result<Self, BiasError> {
        let max = unit.max();
        if !value.is_finite() || !(0.0..=max).contains(&value) {
            Err(BiasError::config(format!(
                "Similarity cutoff {} outside of range [0, {}] (unit: {})",
                value, max, unit
            )))
        } else {
            Ok(Self {
                percent: value * (100.0 / max),
            })
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn retains(&self, hit: &AlignmentHit) -> bool {
        hit.identity() >= self.percent - IDENTITY_EPS
    }
}

/// Total number of bases covered by the union of intervals.
///
/// Intervals are sorted on start then swept once, growing the current window
/// while the next start is <= the window end.  An empty vector gives 0
pub fn merged_coverage(mut v: Vec<Interval>) -> usize {
    v.sort_by_key(|iv| iv.start);
    let mut it = v.iter();
    let mut cur = match it.next() {
        Some(iv) => *iv,
        None => return 0,
    };
    let mut tot = 0;
    for iv in it {
        // Check for overlap
        if iv.start <= cur.end {
            cur.end = cur.end.max(iv.end)
        } else {
            tot += cur.span();
            cur = *iv
        }
    }
    tot + cur.span()
}

/// Coverage of the hits passing an identity cutoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub hits: usize,
    pub retained: usize,
    pub bases: usize,
}

pub fn similar_length(hits: &[AlignmentHit], cutoff: &IdentityCutoff) -> Coverage {
    let v: Vec<_> = hits
        .iter()
        .filter(|h| cutoff.retains(h))
        .map(|h| h.interval())
        .collect();
    let retained = v.len();
    Coverage {
        hits: hits.len(),
        retained,
        bases: merged_coverage(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    fn ivs(v: &[(usize, usize)]) -> Vec<Interval> {
        v.iter().map(|(a, b)| Interval::new(*a, *b)).collect()
    }

    // Small deterministic generator so the property checks need no extra crates
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, n: usize) -> usize {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % n
        }

        fn intervals(&mut self, n: usize, max_pos: usize, max_len: usize) -> Vec<Interval> {
            (0..n)
                .map(|_| {
                    let a = self.next(max_pos);
                    Interval::new(a, a + self.next(max_len))
                })
                .collect()
        }
    }

    // Size of the union of the half-open ranges, counted base by base
    fn brute_force(v: &[Interval]) -> usize {
        let l = v.iter().map(|iv| iv.end).max().unwrap_or(0);
        let mut covered = vec![false; l];
        for iv in v {
            for c in covered[iv.start..iv.end].iter_mut() {
                *c = true
            }
        }
        covered.iter().filter(|c| **c).count()
    }

    #[fixture]
    fn hits() -> Vec<AlignmentHit> {
        vec![
            AlignmentHit::new(99.0, 1, 50),
            AlignmentHit::new(95.0, 120, 60),
            AlignmentHit::new(90.0, 200, 230),
            AlignmentHit::new(85.5, 220, 300),
            AlignmentHit::new(60.0, 500, 900),
        ]
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&[(5, 5)], 0)]
    #[case(&[(10, 20)], 10)]
    #[case(&[(10, 20), (10, 20)], 10)]
    #[case(&[(0, 10), (10, 20)], 20)]
    #[case(&[(0, 10), (11, 20)], 19)]
    #[case(&[(11, 20), (0, 10)], 19)]
    #[case(&[(0, 100), (10, 20), (50, 150)], 150)]
    #[case(&[(0, 100), (10, 20), (120, 150)], 130)]
    #[case(&[(30, 40), (0, 5), (3, 8), (38, 45)], 23)]
    fn test_merged_coverage(#[case] v: &[(usize, usize)], #[case] exp: usize) {
        assert_eq!(merged_coverage(ivs(v)), exp);
    }

    #[rstest]
    fn test_interval_normalized() {
        assert_eq!(Interval::new(20, 10), Interval { start: 10, end: 20 });
        assert_eq!(Interval::new(20, 10).span(), 10);
    }

    #[rstest]
    fn test_matches_base_count() {
        let mut g = Lcg(17);
        for n in 0..60 {
            let v = g.intervals(n, 200, 30);
            assert_eq!(merged_coverage(v.clone()), brute_force(&v), "{:?}", v);
        }
    }

    #[rstest]
    fn test_bounded_by_sum_of_spans() {
        let mut g = Lcg(3);
        for n in 1..60 {
            let v = g.intervals(n, 500, 40);
            let sum: usize = v.iter().map(|iv| iv.span()).sum();
            let cov = merged_coverage(v.clone());
            assert!(cov <= sum);
            let overlapping = v.iter().enumerate().any(|(i, a)| {
                v[i + 1..]
                    .iter()
                    .any(|b| a.start.max(b.start) < a.end.min(b.end))
            });
            assert_eq!(cov == sum, !overlapping, "{:?}", v);
        }
    }

    #[rstest]
    fn test_invariant_to_order_and_duplicates() {
        let mut g = Lcg(11);
        let v = g.intervals(40, 300, 25);
        let exp = merged_coverage(v.clone());

        let mut r = v.clone();
        r.reverse();
        assert_eq!(merged_coverage(r), exp);

        let mut s = v.clone();
        for i in (1..s.len()).rev() {
            let j = g.next(i + 1);
            s.swap(i, j)
        }
        assert_eq!(merged_coverage(s), exp);

        let mut d = v.clone();
        d.extend_from_slice(&v);
        assert_eq!(merged_coverage(d), exp);
    }

    #[rstest]
    #[case(0.0, SimilarityUnit::Fraction, 49 + 60 + 100 + 400)]
    #[case(0.85, SimilarityUnit::Fraction, 49 + 60 + 100)]
    #[case(0.9, SimilarityUnit::Fraction, 49 + 60 + 30)]
    #[case(90.0, SimilarityUnit::Percent, 49 + 60 + 30)]
    #[case(0.95, SimilarityUnit::Fraction, 49 + 60)]
    #[case(1.0, SimilarityUnit::Fraction, 0)]
    fn test_similar_length(
        hits: Vec<AlignmentHit>,
        #[case] value: f64,
        #[case] unit: SimilarityUnit,
        #[case] exp: usize,
    ) {
        let cutoff = IdentityCutoff::new(value, unit).unwrap();
        assert_eq!(similar_length(&hits, &cutoff).bases, exp);
    }

    #[rstest]
    fn test_raising_cutoff_never_increases_coverage(hits: Vec<AlignmentHit>) {
        let mut prev = usize::MAX;
        for i in 0..=100 {
            let cutoff = IdentityCutoff::new(i as f64, SimilarityUnit::Percent).unwrap();
            let c = similar_length(&hits, &cutoff);
            assert!(c.bases <= prev);
            prev = c.bases;
        }
    }

    #[rstest]
    fn test_nothing_retained() {
        let hits = vec![AlignmentHit::new(42.0, 1, 1000)];
        let cutoff = IdentityCutoff::new(0.9, SimilarityUnit::Fraction).unwrap();
        assert_eq!(
            similar_length(&hits, &cutoff),
            Coverage {
                hits: 1,
                retained: 0,
                bases: 0
            }
        );
        assert_eq!(similar_length(&[], &cutoff).bases, 0);
    }

    #[rstest]
    #[case(1.5, SimilarityUnit::Fraction)]
    #[case(-0.1, SimilarityUnit::Fraction)]
    #[case(100.5, SimilarityUnit::Percent)]
    #[case(f64::NAN, SimilarityUnit::Percent)]
    fn test_cutoff_out_of_range(#[case] value: f64, #[case] unit: SimilarityUnit) {
        assert!(IdentityCutoff::new(value, unit).unwrap_err().is_config());
    }

    #[rstest]
    #[case(0.9, SimilarityUnit::Fraction, 90.0)]
    #[case(90.0, SimilarityUnit::Percent, 90.0)]
    #[case(0.901, SimilarityUnit::Fraction, 90.1)]
    #[case(90.1, SimilarityUnit::Percent, 90.1)]
    #[case(0.936, SimilarityUnit::Fraction, 93.6)]
    #[case(93.6, SimilarityUnit::Percent, 93.6)]
    #[case(0.885, SimilarityUnit::Fraction, 88.5)]
    #[case(0.925, SimilarityUnit::Fraction, 92.5)]
    #[case(0.533, SimilarityUnit::Fraction, 53.3)]
    #[case(1.0, SimilarityUnit::Fraction, 100.0)]
    fn test_hit_on_cutoff_retained(
        #[case] value: f64,
        #[case] unit: SimilarityUnit,
        #[case] identity: f64,
    ) {
        let cutoff = IdentityCutoff::new(value, unit).unwrap();
        assert!(cutoff.retains(&AlignmentHit::new(identity, 0, 100)));
        assert!(!cutoff.retains(&AlignmentHit::new(identity - 0.01, 0, 100)));
    }

    #[rstest]
    #[case(0.901, 90.1, 49 + 60)]
    #[case(0.936, 93.6, 49 + 60)]
    fn test_similar_length_same_in_both_units(
        mut hits: Vec<AlignmentHit>,
        #[case] fraction: f64,
        #[case] percent: f64,
        #[case] exp: usize,
    ) {
        hits.push(AlignmentHit::new(percent, 1000, 1010));
        let a = IdentityCutoff::new(fraction, SimilarityUnit::Fraction).unwrap();
        let b = IdentityCutoff::new(percent, SimilarityUnit::Percent).unwrap();
        let ca = similar_length(&hits, &a);
        assert_eq!(ca, similar_length(&hits, &b));
        assert_eq!(ca.bases, exp + 10);
    }

    #[rstest]
    fn test_cutoff_units_retain_same_hits() {
        // Identities with one decimal place, as written by BLAST
        for i in 0u32..=1000 {
            let frac = IdentityCutoff::new(i as f64 / 1000.0, SimilarityUnit::Fraction).unwrap();
            let pct = IdentityCutoff::new(i as f64 / 10.0, SimilarityUnit::Percent).unwrap();
            for j in [i.saturating_sub(1), i, (i + 1).min(1000)] {
                let hit = AlignmentHit::new(j as f64 / 10.0, 0, 10);
                assert_eq!(frac.retains(&hit), j >= i, "cutoff {} hit {}", i, j);
                assert_eq!(pct.retains(&hit), j >= i, "cutoff {} hit {}", i, j);
            }
        }
    }

    #[rstest]
    fn test_cutoff_units_agree() {
        let a = IdentityCutoff::new(0.9, SimilarityUnit::Fraction).unwrap();
        let b = IdentityCutoff::new(90.0, SimilarityUnit::Percent).unwrap();
        assert!((a.percent() - b.percent()).abs() < 1e-9);
        assert!((a.percent() - 90.0).abs() < 1e-9);
        assert_eq!("PERCENT".parse::<SimilarityUnit>(), Ok(SimilarityUnit::Percent));
        assert!("ratio".parse::<SimilarityUnit>().is_err());
    }
}
