//! Neural bridge: feature encoding, choice policies, the decision bridge,
//! and the training-data recorder

pub mod bridge;
pub mod features;
pub mod policy;
pub mod recorder;

pub use bridge::{BridgeMode, DecisionBridge};
pub use features::{
    build_policy_input, encode_ability_options, encode_boolean_choice, encode_card,
    encode_card_options, encode_entity_options, encode_number_range, encode_state, DecisionKind,
    OptionRow, CARD_FEATURES, DECISION_KIND_COUNT, MAX_OPTIONS, POLICY_INPUT_LEN, STATE_SIZE,
};
pub use policy::{
    ChoicePolicy, EpsilonGreedyPolicy, ModelPolicy, PolicyModel, PolicyOutput, RandomPolicy,
    INPUT_TENSOR_NAME, POLICY_TENSOR_NAME, VALUE_TENSOR_NAME,
};
pub use recorder::{DecisionRecord, GameRecorder, OutcomeRecord};
