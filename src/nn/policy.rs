//! Choice policies
//!
//! The seam between the decision bridge and whatever answers its questions:
//! a uniformly random baseline, an inference-session-backed model policy
//! with hot reload, and an epsilon-greedy exploration wrapper.

use crate::nn::features::{
    build_policy_input, DecisionKind, OptionRow, MAX_OPTIONS, POLICY_INPUT_LEN,
};
use crate::{Result, SimError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex, RwLock};

/// Name of the flattened input tensor
pub const INPUT_TENSOR_NAME: &str = "input";

/// Name of the policy-logits output tensor, shape `[1, 64]`
pub const POLICY_TENSOR_NAME: &str = "policy";

/// Name of the optional value-head output tensor, shape `[1, 1]`
pub const VALUE_TENSOR_NAME: &str = "value";

/// Answers one discrete choice
///
/// Implementations must be callable from multiple game threads at once.
pub trait ChoicePolicy: Send + Sync {
    /// Pick an option index in `[0, valid_count)`
    fn choose_option(
        &self,
        state: &[f32],
        kind: DecisionKind,
        options: &[OptionRow],
        valid_count: usize,
    ) -> Result<usize>;
}

/// Uniformly random choices from a seeded thread-safe RNG
pub struct RandomPolicy {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        RandomPolicy {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl ChoicePolicy for RandomPolicy {
    fn choose_option(
        &self,
        _state: &[f32],
        _kind: DecisionKind,
        _options: &[OptionRow],
        valid_count: usize,
    ) -> Result<usize> {
        if valid_count == 0 {
            return Err(SimError::InvalidAction(
                "choice with zero valid options".to_string(),
            ));
        }
        let mut rng = self.rng.lock().expect("policy rng poisoned");
        Ok(rng.gen_range(0..valid_count))
    }
}

/// Output of one model inference
#[derive(Debug, Clone)]
pub struct PolicyOutput {
    /// Raw logits over the option slots, width [`MAX_OPTIONS`]
    pub policy: Vec<f32>,

    /// Optional value-head estimate in `[-1, 1]` (currently unused)
    pub value: Option<f32>,
}

/// An inference session over the fixed 1760-float tensor contract
///
/// Input is the flattened tensor named [`INPUT_TENSOR_NAME`] with shape
/// `[1, 1760]`; output [`POLICY_TENSOR_NAME`] must be `[1, 64]` float32
/// logits. Implementations bind whatever runtime hosts the model; they must
/// tolerate concurrent `infer` calls.
pub trait PolicyModel: Send + Sync {
    fn infer(&self, input: &[f32]) -> Result<PolicyOutput>;
}

/// Model-backed policy with hot-swappable sessions
///
/// Inference failures surface to the caller as errors; the surrounding
/// engine decides whether to fall back to heuristics.
pub struct ModelPolicy {
    session: RwLock<Arc<dyn PolicyModel>>,
}

impl ModelPolicy {
    pub fn new(session: Arc<dyn PolicyModel>) -> Self {
        ModelPolicy {
            session: RwLock::new(session),
        }
    }

    /// Replace the session with a freshly constructed one
    ///
    /// The builder runs before the lock is taken, so the new session exists
    /// before the old one is released and in-flight inferences finish on
    /// the session they started with. A builder failure leaves the previous
    /// session in place.
    pub fn reload_with<F>(&self, build: F) -> Result<()>
    where
        F: FnOnce() -> Result<Arc<dyn PolicyModel>>,
    {
        let fresh = build()?;
        let mut guard = self.session.write().expect("model session lock poisoned");
        *guard = fresh;
        Ok(())
    }

    fn current_session(&self) -> Arc<dyn PolicyModel> {
        self.session
            .read()
            .expect("model session lock poisoned")
            .clone()
    }
}

impl ChoicePolicy for ModelPolicy {
    fn choose_option(
        &self,
        state: &[f32],
        kind: DecisionKind,
        options: &[OptionRow],
        valid_count: usize,
    ) -> Result<usize> {
        if valid_count == 0 {
            return Err(SimError::InvalidAction(
                "choice with zero valid options".to_string(),
            ));
        }

        let input = build_policy_input(state, kind, options, valid_count);
        debug_assert_eq!(input.len(), POLICY_INPUT_LEN);

        let session = self.current_session();
        let output = session.infer(&input)?;

        if output.policy.len() < valid_count.min(MAX_OPTIONS) {
            return Err(SimError::Inference(format!(
                "policy output width {} below valid count {}",
                output.policy.len(),
                valid_count
            )));
        }

        // Argmax over legal indices only
        let mut best = 0usize;
        let mut best_logit = f32::NEG_INFINITY;
        for (i, &logit) in output
            .policy
            .iter()
            .take(valid_count.min(MAX_OPTIONS))
            .enumerate()
        {
            if logit > best_logit {
                best_logit = logit;
                best = i;
            }
        }
        Ok(best)
    }
}

/// Epsilon-greedy exploration wrapper
///
/// With probability epsilon, returns a uniformly random legal index;
/// otherwise delegates to the wrapped policy.
pub struct EpsilonGreedyPolicy {
    inner: Arc<dyn ChoicePolicy>,
    epsilon: f64,
    rng: Mutex<ChaCha8Rng>,
}

impl EpsilonGreedyPolicy {
    pub fn new(inner: Arc<dyn ChoicePolicy>, epsilon: f64, seed: u64) -> Self {
        EpsilonGreedyPolicy {
            inner,
            epsilon: epsilon.clamp(0.0, 1.0),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl ChoicePolicy for EpsilonGreedyPolicy {
    fn choose_option(
        &self,
        state: &[f32],
        kind: DecisionKind,
        options: &[OptionRow],
        valid_count: usize,
    ) -> Result<usize> {
        if valid_count == 0 {
            return Err(SimError::InvalidAction(
                "choice with zero valid options".to_string(),
            ));
        }
        let explore = {
            let mut rng = self.rng.lock().expect("policy rng poisoned");
            if rng.gen_bool(self.epsilon) {
                Some(rng.gen_range(0..valid_count))
            } else {
                None
            }
        };
        match explore {
            Some(idx) => Ok(idx),
            None => self.inner.choose_option(state, kind, options, valid_count),
        }
    }
}
