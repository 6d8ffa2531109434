/// Tuning for the Arbiter strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct ArbiterOptions {
    /// Ratio of the exponentially weighted base estimate.
    pub exponent: f64,
    /// Number of samples in the base estimate.
    pub history_window: usize,
    /// Multiplier applied to the estimate with an empty buffer.
    pub min_buffer_factor: f64,
    /// Multiplier applied to the estimate with a full buffer.
    pub max_buffer_factor: f64,
    /// Scale the estimate by buffer fullness.
    pub buffer_scaling: bool,
    /// Damp up-switches.
    pub switching_control: bool,
    /// Largest up-switch allowed in one decision, in rungs.
    pub maximum_switch: usize,
    /// Validate the chosen rung against probed segment sizes.
    pub lookahead: bool,
    /// Number of upcoming segments probed by the lookahead.
    pub predictive_window: u64,
}

impl Default for ArbiterOptions {
    fn default() -> Self {
        Self {
            exponent: 0.4,
            history_window: 10,
            min_buffer_factor: 0.75,
            max_buffer_factor: 1.15,
            buffer_scaling: true,
            switching_control: true,
            maximum_switch: 2,
            lookahead: true,
            predictive_window: 5,
        }
    }
}

/// Strategy parameters shared by every track of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct AbrOptions {
    /// Ratio of the exponentially weighted strategy.
    pub exp_ratio: f64,
    /// Number of samples averaged by the exponentially weighted strategy.
    pub exp_window: usize,
    /// Proportional gain of the Elastic controller.
    pub elastic_kp: f64,
    /// Integral gain of the Elastic controller.
    pub elastic_ki: f64,
    /// Number of samples in the Elastic harmonic estimate.
    pub elastic_window: usize,
    /// Arbiter tuning.
    pub arbiter: ArbiterOptions,
}

impl Default for AbrOptions {
    fn default() -> Self {
        Self {
            exp_ratio: 0.4,
            exp_window: 3,
            elastic_kp: 0.01,
            elastic_ki: 0.001,
            elastic_window: 5,
            arbiter: ArbiterOptions::default(),
        }
    }
}

impl AbrOptions {
    #[must_use]
    pub fn with_exp_ratio(mut self, ratio: f64) -> Self {
        self.exp_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_exp_window(mut self, window: usize) -> Self {
        self.exp_window = window;
        self
    }

    #[must_use]
    pub fn with_elastic_gains(mut self, kp: f64, ki: f64) -> Self {
        self.elastic_kp = kp;
        self.elastic_ki = ki;
        self
    }

    #[must_use]
    pub fn with_arbiter(mut self, arbiter: ArbiterOptions) -> Self {
        self.arbiter = arbiter;
        self
    }
}
