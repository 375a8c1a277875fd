//! Statistical comparison of the two heuristic groups.
//!
//! Implements from first principles:
//! - Lanczos approximation for ln(Gamma)
//! - Regularized incomplete beta function
//! - Student's t-distribution CDF
//! - Error-function-based normal CDF
//! - Mann-Whitney U test (two-sided, normal approximation with tie and
//!   continuity corrections)
//! - Paired t-test and pooled two-sample t-test (two-sided)
//!
//! All three tests classify against the fixed threshold [`ALPHA`]. Degenerate
//! inputs are handled explicitly: empty samples are an error, and zero-spread
//! samples produce p = 1.0 (indistinguishable) or p = 0.0 (constant offset)
//! rather than NaN.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::aggregate::MetricSamples;

/// Significance threshold. Fixed, not configurable.
pub const ALPHA: f64 = 0.05;

const EPS: f64 = 1e-15;

// ─── Math primitives ─────────────────────────────────────────────────

/// ln(Gamma(x)) via the Lanczos approximation (g = 7, 9 coefficients).
fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection: Gamma(x) Gamma(1-x) = pi / sin(pi x)
        let sin_val = (std::f64::consts::PI * x).sin();
        if sin_val.abs() < 1e-300 {
            return f64::INFINITY;
        }
        return std::f64::consts::PI.ln() - sin_val.abs().ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut series = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS.iter().enumerate().skip(1) {
        series += c / (x + i as f64);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Regularized incomplete beta function I_x(a, b), continued fraction via
/// the modified Lentz algorithm.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    if x == 1.0 {
        return 1.0;
    }

    // Symmetry gives faster convergence on the other tail
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(b, a, 1.0 - x);
    }

    let ln_prefix =
        a * x.ln() + b * (1.0 - x).ln() + ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) - a.ln();
    let prefix = ln_prefix.exp();

    let max_iter = 200;
    let tiny = 1e-30;

    let mut c = 1.0_f64;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < tiny {
        d = tiny;
    }
    d = 1.0 / d;
    let mut f = d;

    for m in 1..=max_iter {
        let m_f = m as f64;

        let even = m_f * (b - m_f) * x / ((a + 2.0 * m_f - 1.0) * (a + 2.0 * m_f));
        d = 1.0 + even * d;
        if d.abs() < tiny {
            d = tiny;
        }
        c = 1.0 + even / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        f *= c * d;

        let odd =
            -((a + m_f) * (a + b + m_f) * x) / ((a + 2.0 * m_f) * (a + 2.0 * m_f + 1.0));
        d = 1.0 + odd * d;
        if d.abs() < tiny {
            d = tiny;
        }
        c = 1.0 + odd / c;
        if c.abs() < tiny {
            c = tiny;
        }
        d = 1.0 / d;
        let delta = c * d;
        f *= delta;

        if (delta - 1.0).abs() < 1e-14 {
            break;
        }
    }

    prefix * f
}

/// Student's t-distribution CDF: P(T <= t) with `df` degrees of freedom.
pub fn t_cdf(t: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return f64::NAN;
    }
    if t == 0.0 {
        return 0.5;
    }
    let x = df / (df + t * t);
    let ib = regularized_incomplete_beta(df / 2.0, 0.5, x);
    if t > 0.0 {
        1.0 - 0.5 * ib
    } else {
        0.5 * ib
    }
}

/// erf(x), Abramowitz & Stegun 7.1.26 (max error ~1.5e-7).
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn two_sided_t_p(t: f64, df: f64) -> f64 {
    (2.0 * (1.0 - t_cdf(t.abs(), df))).clamp(0.0, 1.0)
}

fn two_sided_z_p(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_sq_dev(values: &[f64], center: f64) -> f64 {
    values.iter().map(|&v| (v - center).powi(2)).sum()
}

// ─── Test kinds and outcomes ─────────────────────────────────────────

/// The three significance tests run on every comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestKind {
    #[serde(rename = "mannwhitneyu")]
    MannWhitneyU,
    #[serde(rename = "paired_t-test")]
    PairedT,
    #[serde(rename = "two_sample_t-test")]
    TwoSampleT,
}

impl TestKind {
    pub const ALL: [TestKind; 3] = [
        TestKind::MannWhitneyU,
        TestKind::PairedT,
        TestKind::TwoSampleT,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestKind::MannWhitneyU => "mannwhitneyu",
            TestKind::PairedT => "paired_t-test",
            TestKind::TwoSampleT => "two_sample_t-test",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistic, two-sided p-value, and the ALPHA classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

impl TestOutcome {
    fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value,
            significant: p_value < ALPHA,
        }
    }
}

/// Errors from the comparator.
#[derive(Debug, Error, PartialEq)]
pub enum ComparisonError {
    #[error("insufficient data for the {test} test: {rr} RR and {mmmr} MMMR samples")]
    InsufficientData {
        test: TestKind,
        rr: usize,
        mmmr: usize,
    },

    #[error(
        "the paired t-test requires index-aligned samples of equal length, \
         got {rr} RR and {mmmr} MMMR samples"
    )]
    PairedLengthMismatch { rr: usize, mmmr: usize },
}

// ─── The three tests ─────────────────────────────────────────────────

/// Mann-Whitney U test, two-sided, normal approximation with midrank tie
/// handling and a continuity correction. The statistic is U of the first
/// sample. If every value across both samples is tied the distributions are
/// indistinguishable and p = 1.0.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<TestOutcome, ComparisonError> {
    if a.is_empty() || b.is_empty() {
        return Err(ComparisonError::InsufficientData {
            test: TestKind::MannWhitneyU,
            rr: a.len(),
            mmmr: b.len(),
        });
    }

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;

    let mut combined: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    combined.sort_by(|x, y| x.0.total_cmp(&y.0));

    // Midranks over tied spans; accumulate the rank sum of sample a and the
    // tie term sum(t^3 - t)
    let mut rank_sum_a = 0.0_f64;
    let mut tie_term = 0.0_f64;
    let mut i = 0;
    while i < combined.len() {
        let mut j = i + 1;
        while j < combined.len() && combined[j].0 == combined[i].0 {
            j += 1;
        }
        let span = (j - i) as f64;
        let midrank = (i + j + 1) as f64 / 2.0;
        let in_a = combined[i..j].iter().filter(|(_, is_a)| *is_a).count() as f64;
        rank_sum_a += midrank * in_a;
        tie_term += span * span * span - span;
        i = j;
    }

    let u1 = rank_sum_a - n1 * (n1 + 1.0) / 2.0;
    let mu = n1 * n2 / 2.0;
    let sigma_sq = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    if sigma_sq <= EPS {
        // Everything tied: no detectable difference
        return Ok(TestOutcome::new(u1, 1.0));
    }
    let sigma = sigma_sq.sqrt();

    let d = u1 - mu;
    let z = if d == 0.0 {
        0.0
    } else {
        (d - 0.5 * d.signum()) / sigma
    };
    Ok(TestOutcome::new(u1, two_sided_z_p(z)))
}

/// Paired t-test, two-sided. The samples must be index-aligned pairs of
/// equal length; a length mismatch is an error, never a silent truncation.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Result<TestOutcome, ComparisonError> {
    if a.is_empty() || b.is_empty() {
        return Err(ComparisonError::InsufficientData {
            test: TestKind::PairedT,
            rr: a.len(),
            mmmr: b.len(),
        });
    }
    if a.len() != b.len() {
        return Err(ComparisonError::PairedLengthMismatch {
            rr: a.len(),
            mmmr: b.len(),
        });
    }
    let n = a.len();
    if n < 2 {
        return Err(ComparisonError::InsufficientData {
            test: TestKind::PairedT,
            rr: a.len(),
            mmmr: b.len(),
        });
    }

    let diffs: Vec<f64> = a.iter().zip(b.iter()).map(|(x, y)| x - y).collect();
    let mean_d = mean(&diffs);
    let var = sum_sq_dev(&diffs, mean_d) / (n as f64 - 1.0);
    let std_err = (var / n as f64).sqrt();

    if std_err < EPS {
        if mean_d.abs() < EPS {
            return Ok(TestOutcome::new(0.0, 1.0));
        }
        // Constant nonzero difference
        return Ok(TestOutcome::new(f64::INFINITY * mean_d.signum(), 0.0));
    }

    let t = mean_d / std_err;
    Ok(TestOutcome::new(t, two_sided_t_p(t, n as f64 - 1.0)))
}

/// Two-sample t-test with pooled variance (equal variances assumed),
/// two-sided. Sample lengths may differ.
pub fn two_sample_t_test(a: &[f64], b: &[f64]) -> Result<TestOutcome, ComparisonError> {
    let n1 = a.len();
    let n2 = b.len();
    if n1 == 0 || n2 == 0 || n1 + n2 < 3 {
        return Err(ComparisonError::InsufficientData {
            test: TestKind::TwoSampleT,
            rr: n1,
            mmmr: n2,
        });
    }

    let m1 = mean(a);
    let m2 = mean(b);
    let df = (n1 + n2 - 2) as f64;
    let pooled_var = (sum_sq_dev(a, m1) + sum_sq_dev(b, m2)) / df;
    let std_err = (pooled_var * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();

    if std_err < EPS {
        if (m1 - m2).abs() < EPS {
            return Ok(TestOutcome::new(0.0, 1.0));
        }
        return Ok(TestOutcome::new(f64::INFINITY * (m1 - m2).signum(), 0.0));
    }

    let t = (m1 - m2) / std_err;
    Ok(TestOutcome::new(t, two_sided_t_p(t, df)))
}

/// Run all three tests on one metric's RR-vs-MMMR samples, in a fixed order.
pub fn compare_samples(
    samples: &MetricSamples,
) -> Result<Vec<(TestKind, TestOutcome)>, ComparisonError> {
    Ok(vec![
        (
            TestKind::MannWhitneyU,
            mann_whitney_u(&samples.rr, &samples.mmmr)?,
        ),
        (TestKind::PairedT, paired_t_test(&samples.rr, &samples.mmmr)?),
        (
            TestKind::TwoSampleT,
            two_sample_t_test(&samples.rr, &samples.mmmr)?,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Math primitives ─────────────────────────────────────────

    #[test]
    fn ln_gamma_matches_factorials() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!(ln_gamma(2.0).abs() < 1e-10);
        assert!((ln_gamma(4.0) - 6.0_f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
        let half = std::f64::consts::PI.sqrt().ln();
        assert!((ln_gamma(0.5) - half).abs() < 1e-10);
    }

    #[test]
    fn t_cdf_midpoint_and_symmetry() {
        assert!((t_cdf(0.0, 5.0) - 0.5).abs() < 1e-12);
        for &t in &[0.3, 1.0, 2.5] {
            let sum = t_cdf(-t, 8.0) + t_cdf(t, 8.0);
            assert!((sum - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn t_cdf_cauchy_value() {
        // df = 1 is the Cauchy distribution: CDF(1) = 0.75
        assert!((t_cdf(1.0, 1.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn t_cdf_tails() {
        assert!(t_cdf(50.0, 6.0) > 0.9999);
        assert!(t_cdf(-50.0, 6.0) < 0.0001);
    }

    #[test]
    fn normal_cdf_known_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-4);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-4);
    }

    // ─── Mann-Whitney ────────────────────────────────────────────

    #[test]
    fn mann_whitney_separated_samples() {
        // [1,2,3] vs [4,5,6]: U1 = 0; asymptotic two-sided p ~ 0.081,
        // not significant at this sample size
        let out = mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(out.statistic, 0.0);
        assert!((out.p_value - 0.081).abs() < 0.005, "p = {}", out.p_value);
        assert!(!out.significant);
    }

    #[test]
    fn mann_whitney_u_values_are_complementary() {
        let a = [1.0, 3.0, 5.0];
        let b = [2.0, 4.0, 6.0];
        let u_ab = mann_whitney_u(&a, &b).unwrap().statistic;
        let u_ba = mann_whitney_u(&b, &a).unwrap().statistic;
        assert_eq!(u_ab + u_ba, (a.len() * b.len()) as f64);
    }

    #[test]
    fn mann_whitney_all_tied_is_p_one() {
        let out = mann_whitney_u(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(out.p_value, 1.0);
        assert!(!out.significant);
        // statistic sits at the mean U
        assert_eq!(out.statistic, 4.5);
    }

    #[test]
    fn mann_whitney_handles_partial_ties() {
        let out = mann_whitney_u(&[1.0, 2.0, 2.0], &[2.0, 3.0, 4.0]).unwrap();
        assert!(out.p_value > 0.0 && out.p_value <= 1.0);
    }

    #[test]
    fn mann_whitney_unequal_lengths() {
        let out = mann_whitney_u(&[1.0, 2.0], &[3.0, 4.0, 5.0, 6.0]).unwrap();
        assert!((0.0..=1.0).contains(&out.p_value));
    }

    #[test]
    fn mann_whitney_empty_is_insufficient() {
        let err = mann_whitney_u(&[], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ComparisonError::InsufficientData {
                test: TestKind::MannWhitneyU,
                ..
            }
        ));
    }

    // ─── Paired t ────────────────────────────────────────────────

    #[test]
    fn paired_t_constant_shift() {
        // Every pair differs by exactly -3: zero variance, maximal evidence
        let out = paired_t_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!(out.statistic.is_infinite() && out.statistic < 0.0);
        assert_eq!(out.p_value, 0.0);
        assert!(out.significant);
    }

    #[test]
    fn paired_t_identical_samples() {
        let out = paired_t_test(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(out.statistic, 0.0);
        assert_eq!(out.p_value, 1.0);
        assert!(!out.significant);
    }

    #[test]
    fn paired_t_known_value() {
        // diffs = [-1, -0.5, -1.5]: t = -3.4641, df = 2, p ~ 0.0742
        let out = paired_t_test(&[1.0, 2.0, 4.0], &[2.0, 2.5, 5.5]).unwrap();
        assert!((out.statistic + 3.4641).abs() < 1e-3);
        assert!((out.p_value - 0.0742).abs() < 0.005, "p = {}", out.p_value);
        assert!(!out.significant);
    }

    #[test]
    fn paired_t_length_mismatch_fails_loudly() {
        let err = paired_t_test(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ComparisonError::PairedLengthMismatch { rr: 3, mmmr: 2 }
        );
    }

    #[test]
    fn paired_t_single_pair_is_insufficient() {
        assert!(paired_t_test(&[1.0], &[2.0]).is_err());
    }

    #[test]
    fn paired_t_empty_is_insufficient() {
        assert!(matches!(
            paired_t_test(&[], &[]),
            Err(ComparisonError::InsufficientData { .. })
        ));
    }

    // ─── Two-sample t ────────────────────────────────────────────

    #[test]
    fn two_sample_t_known_value() {
        // [1,2,3] vs [4,5,6]: t = -3.6742, df = 4, p ~ 0.0213
        let out = two_sample_t_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!((out.statistic + 3.6742).abs() < 1e-3);
        assert!((out.p_value - 0.0213).abs() < 0.003, "p = {}", out.p_value);
        assert!(out.significant);
    }

    #[test]
    fn two_sample_t_identical_samples() {
        let out = two_sample_t_test(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(out.statistic, 0.0);
        assert_eq!(out.p_value, 1.0);
    }

    #[test]
    fn two_sample_t_zero_variance_equal_means() {
        let out = two_sample_t_test(&[2.0, 2.0], &[2.0, 2.0]).unwrap();
        assert_eq!(out.p_value, 1.0);
    }

    #[test]
    fn two_sample_t_zero_variance_different_means() {
        let out = two_sample_t_test(&[1.0, 1.0], &[2.0, 2.0]).unwrap();
        assert_eq!(out.p_value, 0.0);
        assert!(out.statistic.is_infinite() && out.statistic < 0.0);
    }

    #[test]
    fn two_sample_t_unequal_lengths() {
        let out = two_sample_t_test(&[1.0, 2.0, 3.0, 4.0], &[2.0, 3.0]).unwrap();
        assert!((0.0..=1.0).contains(&out.p_value));
    }

    #[test]
    fn two_sample_t_too_small_is_insufficient() {
        assert!(two_sample_t_test(&[1.0], &[2.0]).is_err());
        assert!(two_sample_t_test(&[], &[1.0, 2.0]).is_err());
    }

    // ─── compare_samples ─────────────────────────────────────────

    #[test]
    fn compare_runs_all_three_in_order() {
        let samples = MetricSamples {
            rr: vec![1.0, 2.0, 3.0],
            mmmr: vec![4.0, 5.0, 6.0],
        };
        let results = compare_samples(&samples).unwrap();
        let kinds: Vec<TestKind> = results.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, TestKind::ALL.to_vec());
        for (_, outcome) in &results {
            assert!((0.0..=1.0).contains(&outcome.p_value));
        }
    }

    #[test]
    fn compare_identical_samples_is_never_significant() {
        let samples = MetricSamples {
            rr: vec![7.0, 8.0, 9.0, 10.0],
            mmmr: vec![7.0, 8.0, 9.0, 10.0],
        };
        for (kind, outcome) in compare_samples(&samples).unwrap() {
            assert!(!outcome.significant, "{kind} should not be significant");
            assert!((outcome.p_value - 1.0).abs() < 1e-9, "{kind} p ~ 1.0");
        }
    }

    #[test]
    fn compare_empty_group_propagates_insufficient_data() {
        let samples = MetricSamples {
            rr: vec![1.0, 2.0],
            mmmr: vec![],
        };
        assert!(matches!(
            compare_samples(&samples),
            Err(ComparisonError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_kind_report_names() {
        assert_eq!(TestKind::MannWhitneyU.as_str(), "mannwhitneyu");
        assert_eq!(TestKind::PairedT.as_str(), "paired_t-test");
        assert_eq!(TestKind::TwoSampleT.as_str(), "two_sample_t-test");
    }
}
