use std::{fmt, str::FromStr};

use crate::AbrError;

/// Closed set of rate selection strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Fixed 0.8/0.2 recursive smoothing.
    Conventional,
    /// Harmonic estimate corrected by a PI controller on buffer level.
    Elastic,
    /// Sigmoid mapping from buffer level to bitrate.
    Logistic,
    /// Buffer-based allocation with a dynamic reservoir.
    Bba,
    /// Buffer-scaled exponential estimate with switch damping and lookahead.
    Arbiter,
    /// Arithmetic mean of every sample.
    Mean,
    /// Geometric mean of every sample.
    Geometric,
    /// Exponentially weighted mean over a short window.
    ExponentialWeighted,
}

impl Algorithm {
    pub const ALL: [Self; 8] = [
        Self::Conventional,
        Self::Elastic,
        Self::Logistic,
        Self::Bba,
        Self::Arbiter,
        Self::Mean,
        Self::Geometric,
        Self::ExponentialWeighted,
    ];

    /// Configuration name of the strategy.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Conventional => "conventional",
            Self::Elastic => "elastic",
            Self::Logistic => "logistic",
            Self::Bba => "bba",
            Self::Arbiter => "arbiter",
            Self::Mean => "average",
            Self::Geometric => "geometric",
            Self::ExponentialWeighted => "exponential",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = AbrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AbrError::UnknownAlgorithm(wanted.to_string()))
    }
}

/// Numeric state a strategy carries between decisions of one track.
#[derive(Clone, Debug, PartialEq)]
pub enum AlgorithmState {
    Conventional {
        /// Smoothed throughput, seeded by the first sample.
        smoothed_bps: Option<u64>,
    },
    Elastic {
        /// Accumulated buffer error of the PI controller.
        integrator: f64,
    },
    Logistic,
    Bba {
        /// Reservoir computed by the latest decision, in milliseconds.
        reservoir_ms: Option<u64>,
    },
    Arbiter {
        /// Multiplier applied to the latest estimate.
        buffering_factor: f64,
        /// Up-switches reverted or clamped by switch damping.
        damped_switches: u32,
    },
    Mean,
    Geometric,
    ExponentialWeighted,
}

impl AlgorithmState {
    /// Fresh state for `algorithm`.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Conventional => Self::Conventional { smoothed_bps: None },
            Algorithm::Elastic => Self::Elastic { integrator: 0.0 },
            Algorithm::Logistic => Self::Logistic,
            Algorithm::Bba => Self::Bba { reservoir_ms: None },
            Algorithm::Arbiter => Self::Arbiter {
                buffering_factor: 1.0,
                damped_switches: 0,
            },
            Algorithm::Mean => Self::Mean,
            Algorithm::Geometric => Self::Geometric,
            Algorithm::ExponentialWeighted => Self::ExponentialWeighted,
        }
    }

    /// Whether decisions depend on throughput history rather than on the
    /// buffer level alone.
    #[must_use]
    pub fn uses_history(&self) -> bool {
        !matches!(self, Self::Logistic | Self::Bba { .. })
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Conventional { .. } => Algorithm::Conventional,
            Self::Elastic { .. } => Algorithm::Elastic,
            Self::Logistic => Algorithm::Logistic,
            Self::Bba { .. } => Algorithm::Bba,
            Self::Arbiter { .. } => Algorithm::Arbiter,
            Self::Mean => Algorithm::Mean,
            Self::Geometric => Algorithm::Geometric,
            Self::ExponentialWeighted => Algorithm::ExponentialWeighted,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("conventional", Algorithm::Conventional)]
    #[case("average", Algorithm::Mean)]
    #[case(" Exponential ", Algorithm::ExponentialWeighted)]
    #[case("BBA", Algorithm::Bba)]
    fn parses_configuration_names(#[case] input: &str, #[case] expected: Algorithm) {
        assert_eq!(input.parse::<Algorithm>().unwrap(), expected);
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let err = "progressive".parse::<Algorithm>().unwrap_err();
        assert!(matches!(err, AbrError::UnknownAlgorithm(name) if name == "progressive"));
    }

    #[test]
    fn state_remembers_its_algorithm() {
        for algorithm in Algorithm::ALL {
            assert_eq!(AlgorithmState::new(algorithm).algorithm(), algorithm);
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
        }
    }
}
