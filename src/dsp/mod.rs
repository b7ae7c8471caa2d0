pub mod allpass_chain;
pub mod biquad;
pub mod block;
pub mod crossover;
pub mod curves;
pub mod distortion;
pub mod dynamics;
pub mod emphasis;
pub mod envelope;
pub mod gain;
pub mod mixer;
pub mod noise;
pub mod oversampling;
pub mod predistortion;
pub mod utils;

pub use allpass_chain::AllPassChain;
pub use biquad::{Biquad, StereoBiquad};
pub use block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
pub use distortion::{PrimaryDistortion, SoftClip};
pub use dynamics::DynamicsEngine;
pub use emphasis::EmphasisFilter;
pub use gain::GainStage;
pub use mixer::DryWetMixer;
pub use noise::NoiseDistortion;
pub use oversampling::OversamplingStack;
pub use predistortion::PreDistortion;

/// A stage of the chain that processes a block in place.
///
/// `prepare` may allocate and is never called from the sample loop in steady
/// state. `process_block` must not allocate, lock or block.
pub trait BlockProcessor {
    fn prepare(&mut self, spec: &ProcessSpec);
    fn process_block(&mut self, block: &mut AudioBlock);
    fn reset(&mut self);
}
