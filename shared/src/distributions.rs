//! Stochastic duration sampling shared by the DES kernel and the Monte Carlo
//! simulate-setting projector (the latter reuses `sample_beta` for PERT).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Distribution {
    Deterministic {
        value_hours: f64,
    },
    Exponential {
        rate_per_hour: f64,
    },
    Triangular {
        a: f64,
        m: f64,
        b: f64,
    },
    Lognormal {
        mu: f64,
        sigma: f64,
    },
    Beta {
        alpha: f64,
        beta: f64,
        #[serde(default = "Distribution::unit_scale")]
        scale_hours: f64,
    },
    Gamma {
        shape: f64,
        rate_per_hour: f64,
    },
    Normal {
        mean_hours: f64,
        stddev_hours: f64,
    },
}

impl Distribution {
    fn unit_scale() -> f64 {
        1.0
    }

    /// A malformed distribution is rejected up front, at
    /// scenario-validation time, not at first-sample time.
    pub fn validate(&self) -> Result<(), SimError> {
        match *self {
            Distribution::Deterministic { value_hours } if value_hours < 0.0 => {
                Err(SimError::InvalidParameter(format!(
                    "deterministic value_hours must be >= 0, got {value_hours}"
                )))
            }
            Distribution::Exponential { rate_per_hour } if rate_per_hour <= 0.0 => {
                Err(SimError::InvalidParameter(format!(
                    "exponential rate_per_hour must be > 0, got {rate_per_hour}"
                )))
            }
            Distribution::Triangular { a, m, b } => {
                if b <= a {
                    Err(SimError::InvalidParameter(format!(
                        "triangular requires b > a, got a={a} b={b}"
                    )))
                } else if m < a || m > b {
                    Err(SimError::InvalidParameter(format!(
                        "triangular requires a <= m <= b, got a={a} m={m} b={b}"
                    )))
                } else {
                    Ok(())
                }
            }
            Distribution::Lognormal { sigma, .. } if sigma <= 0.0 => {
                Err(SimError::InvalidParameter(format!(
                    "lognormal sigma must be > 0, got {sigma}"
                )))
            }
            Distribution::Beta { alpha, beta, .. } if alpha <= 0.0 || beta <= 0.0 => {
                Err(SimError::InvalidParameter(format!(
                    "beta requires alpha > 0 and beta > 0, got alpha={alpha} beta={beta}"
                )))
            }
            Distribution::Gamma {
                shape,
                rate_per_hour,
            } if shape <= 0.0 || rate_per_hour <= 0.0 => Err(SimError::InvalidParameter(format!(
                "gamma requires shape > 0 and rate_per_hour > 0, got shape={shape} rate={rate_per_hour}"
            ))),
            Distribution::Normal { stddev_hours, .. } if stddev_hours <= 0.0 => {
                Err(SimError::InvalidParameter(format!(
                    "normal stddev_hours must be > 0, got {stddev_hours}"
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        match *self {
            Distribution::Deterministic { value_hours } => value_hours,
            Distribution::Exponential { rate_per_hour } => {
                let u: f64 = rng.gen();
                -((1.0 - u).ln()) / rate_per_hour
            }
            Distribution::Triangular { a, m, b } => {
                let u: f64 = rng.gen();
                let c = (m - a) / (b - a);
                if u < c {
                    a + (u * (b - a) * (m - a)).sqrt()
                } else {
                    b - ((1.0 - u) * (b - a) * (b - m)).sqrt()
                }
            }
            Distribution::Lognormal { mu, sigma } => (mu + sigma * sample_normal(rng)).exp(),
            Distribution::Beta {
                alpha,
                beta,
                scale_hours,
            } => sample_beta(alpha, beta, rng) * scale_hours,
            Distribution::Gamma {
                shape,
                rate_per_hour,
            } => sample_gamma(shape, rng) / rate_per_hour,
            Distribution::Normal {
                mean_hours,
                stddev_hours,
            } => mean_hours + stddev_hours * sample_normal(rng),
        }
    }
}

/// Standard normal deviate via Box-Muller.
pub fn sample_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Marsaglia-Tsang for shape >= 1, with the `Gamma(a) = Gamma(a+1)*U^(1/a)`
/// boost for shape in (0, 1).
pub fn sample_gamma(shape: f64, rng: &mut impl Rng) -> f64 {
    if shape < 1.0 {
        let u: f64 = rng.gen();
        return sample_gamma(shape + 1.0, rng) * u.powf(1.0 / shape);
    }
    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let mut x;
        let mut v;
        loop {
            x = sample_normal(rng);
            v = 1.0 + c * x;
            if v > 0.0 {
                break;
            }
        }
        v = v * v * v;
        let u: f64 = rng.gen();
        if u < 1.0 - 0.0331 * x * x * x * x {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// `Beta(a,b) = X/(X+Y)` with `X ~ Gamma(a,1), Y ~ Gamma(b,1)`.
pub fn sample_beta(alpha: f64, beta: f64, rng: &mut impl Rng) -> f64 {
    let x = sample_gamma(alpha, rng);
    let y = sample_gamma(beta, rng);
    x / (x + y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn deterministic_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let d = Distribution::Deterministic { value_hours: 2.5 };
        assert_eq!(d.sample(&mut rng), 2.5);
    }

    #[test]
    fn exponential_mean_matches_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let d = Distribution::Exponential { rate_per_hour: 2.0 };
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| d.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.05, "mean was {mean}");
    }

    #[test]
    fn triangular_stays_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let d = Distribution::Triangular {
            a: 1.0,
            m: 2.0,
            b: 4.0,
        };
        for _ in 0..5000 {
            let v = d.sample(&mut rng);
            assert!((1.0..=4.0).contains(&v), "out of bounds: {v}");
        }
    }

    #[test]
    fn beta_mean_matches_analytic() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let (alpha, beta) = (2.0, 5.0);
        let n = 20_000;
        let mean: f64 =
            (0..n).map(|_| sample_beta(alpha, beta, &mut rng)).sum::<f64>() / n as f64;
        let analytic = alpha / (alpha + beta);
        assert!((mean - analytic).abs() < 0.02, "mean was {mean}, expected {analytic}");
    }

    #[test]
    fn rejects_bad_triangular() {
        let d = Distribution::Triangular {
            a: 5.0,
            m: 2.0,
            b: 4.0,
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn rejects_nonpositive_rate() {
        let d = Distribution::Exponential { rate_per_hour: 0.0 };
        assert!(d.validate().is_err());
    }
}
