//! Parameter registry: descriptor tables, the shared atomic store and the
//! smoothed handles DSP components read from.

pub mod ids;
pub mod smoothing;
pub mod store;

pub use ids::{
    BoolParamId, Choice, ChoiceParamId, CompressionTopology, CurveKind, DistortionType,
    FloatParamId, FloatRange, IntParamId, NoiseType, ParamKey, PreDistortionType, BOOL_PARAMS,
    CHOICE_PARAMS, FLOAT_PARAMS, INT_PARAMS, PARAM_COUNT,
};
pub use smoothing::{linear_style, BoolValue, ChoiceValue, FloatValue, IntValue, SmoothedFloat};
pub use store::{ParamSnapshot, ParamStore};
