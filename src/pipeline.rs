//! Pipeline orchestrator: owns every stage and runs them in a fixed order.
//!
//! ```text
//! input gain -> dry capture -> oversample up -> [emphasis] -> dynamics
//!   -> noise -> pre-distortion -> primary -> [de-emphasis] -> soft clip
//!   -> oversample down -> output gain -> dry/wet mix
//! ```
//!
//! An oversampling factor change is picked up at the start of a block. The
//! pipeline switches to `Reconfiguring`, re-prepares the stack and every
//! stage behind it at the new rate, retunes the dry delay, and only then
//! processes the block.

use std::sync::Arc;

use assert_no_alloc::permit_alloc;

use crate::dsp::oversampling::MAX_FACTOR;
use crate::dsp::{
    AudioBlock, BlockProcessor, DryWetMixer, DynamicsEngine, EmphasisFilter, GainStage,
    NoiseDistortion, OversamplingStack, PreDistortion, PrimaryDistortion, ProcessSpec, SoftClip,
    MAX_CHANNELS,
};
use crate::error::{ConfigError, Result};
use crate::meters::Meters;
use crate::params::{BoolParamId, BoolValue, FloatParamId, FloatValue, IntParamId, IntValue, ParamStore};
use crate::scorch_log;

/// Hooks for telemetry. Called on preparation and reconfiguration, never
/// from inside the sample loop.
pub trait PipelineObserver: Send {
    fn on_prepared(&mut self, _spec: &ProcessSpec, _latency_samples: f32) {}
    fn on_reconfigured(&mut self, _factor: usize, _latency_samples: f32) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Steady,
    Reconfiguring { factor: usize },
}

struct Toggles {
    enabled: BoolValue,
    compression: BoolValue,
    noise: BoolValue,
    pre_distortion: BoolValue,
    primary: BoolValue,
    emphasis: BoolValue,
    post_clip: BoolValue,
}

impl Toggles {
    fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            enabled: BoolValue::new(store, BoolParamId::PluginEnabled),
            compression: BoolValue::new(store, BoolParamId::CompressionOn),
            noise: BoolValue::new(store, BoolParamId::NoiseDistortionEnabled),
            pre_distortion: BoolValue::new(store, BoolParamId::PreDistortionEnabled),
            primary: BoolValue::new(store, BoolParamId::PrimaryDistortionEnabled),
            emphasis: BoolValue::new(store, BoolParamId::EmphasisOn),
            post_clip: BoolValue::new(store, BoolParamId::PostClipEnabled),
        }
    }
}

pub struct Pipeline {
    store: Arc<ParamStore>,
    meters: Arc<Meters>,
    observer: Option<Box<dyn PipelineObserver>>,

    toggles: Toggles,
    factor: IntValue,
    mix: FloatValue,

    input_gain: GainStage,
    oversampling: OversamplingStack,
    emphasis: EmphasisFilter,
    dynamics: DynamicsEngine,
    noise: NoiseDistortion,
    pre_distortion: PreDistortion,
    primary: PrimaryDistortion,
    soft_clip: SoftClip,
    output_gain: GainStage,
    mixer: DryWetMixer,

    spec: Option<ProcessSpec>,
    state: State,
}

impl Pipeline {
    pub fn new(store: Arc<ParamStore>, observer: Option<Box<dyn PipelineObserver>>) -> Self {
        Self {
            meters: Arc::new(Meters::new()),
            observer,
            toggles: Toggles::new(&store),
            factor: IntValue::new(&store, IntParamId::OversamplingFactor),
            mix: FloatValue::new(&store, FloatParamId::Mix),
            input_gain: GainStage::new(&store, FloatParamId::InputGain),
            oversampling: OversamplingStack::new(),
            emphasis: EmphasisFilter::new(&store),
            dynamics: DynamicsEngine::new(&store),
            noise: NoiseDistortion::new(&store),
            pre_distortion: PreDistortion::new(&store),
            primary: PrimaryDistortion::new(&store),
            soft_clip: SoftClip::new(&store),
            output_gain: GainStage::new(&store, FloatParamId::OutputGain),
            mixer: DryWetMixer::new(),
            spec: None,
            state: State::Steady,
            store,
        }
    }

    pub fn store(&self) -> &Arc<ParamStore> {
        &self.store
    }

    pub fn meters(&self) -> Arc<Meters> {
        Arc::clone(&self.meters)
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Active oversampling factor exponent (0, 1 or 2).
    pub fn oversampling_factor(&self) -> usize {
        self.oversampling.factor()
    }

    /// Wet-path latency in base-rate samples.
    pub fn latency_samples(&self) -> f32 {
        self.oversampling.latency_samples()
    }

    /// Latency rounded up to whole samples, as reported to a host.
    pub fn reported_latency_samples(&self) -> u32 {
        self.latency_samples().ceil() as u32
    }

    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, num_channels: usize) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate { sample_rate });
        }
        if max_block_size == 0 {
            return Err(ConfigError::InvalidBlockSize { max_block_size });
        }
        if num_channels == 0 || num_channels > MAX_CHANNELS {
            return Err(ConfigError::UnsupportedLayout {
                inputs: num_channels,
                outputs: num_channels,
            });
        }

        let spec = ProcessSpec {
            sample_rate,
            max_block_size,
            num_channels,
        };
        self.spec = Some(spec);
        self.configure(&spec, self.requested_factor());

        let latency = self.latency_samples();
        log::debug!(
            "prepared: {} Hz, {} samples, {} ch, factor {}, latency {}",
            sample_rate,
            max_block_size,
            num_channels,
            self.oversampling.factor(),
            latency
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_prepared(&spec, latency);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.oversampling.reset();
        self.emphasis.reset();
        self.dynamics.reset();
        self.noise.reset();
        self.pre_distortion.reset();
        self.primary.reset();
        self.soft_clip.reset();
        self.mixer.reset();
        self.meters.reset();
    }

    pub fn process(&mut self, block: &mut AudioBlock) {
        let channels = block.num_channels();
        self.process_with_input_channels(block, channels);
    }

    /// Channels at or past `num_input_channels` carry no input and are
    /// cleared before processing. With no input at all the block is left
    /// untouched.
    pub fn process_with_input_channels(&mut self, block: &mut AudioBlock, num_input_channels: usize) {
        if block.num_channels() == 0 || num_input_channels == 0 {
            return;
        }
        let Some(spec) = self.spec else {
            return;
        };
        if !self.toggles.enabled.value() {
            return;
        }

        for c in num_input_channels..block.num_channels() {
            block.clear_channel(c);
        }

        let factor = self.requested_factor();
        if factor != self.oversampling.factor() {
            self.state = State::Reconfiguring { factor };
        }
        if let State::Reconfiguring { factor } = self.state {
            self.reconfigure(&spec, factor);
        }

        self.meters.set_input_peak_l(block.peak(0));
        if block.num_channels() > 1 {
            self.meters.set_input_peak_r(block.peak(1));
        }

        // SAFETY: only the floating point control flags of this thread are
        // changed, and they are restored when the closure returns.
        unsafe {
            no_denormals::no_denormals(|| {
                let total = block.num_samples();
                let mut start = 0;
                while start < total {
                    let len = (total - start).min(spec.max_block_size);
                    self.process_chunk(&mut block.sub_block(start, len));
                    start += len;
                }
            });
        }

        self.meters.set_output_peak_l(block.peak(0));
        if block.num_channels() > 1 {
            self.meters.set_output_peak_r(block.peak(1));
        }
        let gain_reduction = if self.toggles.compression.value() {
            self.dynamics.gain_reduction_db()
        } else {
            [0.0; 3]
        };
        self.meters.set_gain_reduction_db(gain_reduction);
    }

    fn requested_factor(&self) -> usize {
        self.factor.value().clamp(0, MAX_FACTOR as i32) as usize
    }

    fn reconfigure(&mut self, spec: &ProcessSpec, factor: usize) {
        permit_alloc(|| {
            self.configure(spec, factor);
            let latency = self.latency_samples();
            log::debug!("oversampling factor {} -> latency {}", factor, latency);
            if let Some(observer) = self.observer.as_mut() {
                observer.on_reconfigured(factor, latency);
            }
        });
        scorch_log!("reconfigured to factor {}", factor);
    }

    /// Prepare every stage for `factor`. Ends in `State::Steady`.
    fn configure(&mut self, base: &ProcessSpec, factor: usize) {
        self.oversampling.set_factor(factor);
        self.oversampling.prepare(base);
        let oversampled = base.oversampled(self.oversampling.factor());

        self.input_gain.prepare(base);
        self.output_gain.prepare(base);

        self.emphasis.prepare(&oversampled);
        self.dynamics.prepare(&oversampled);
        self.noise.prepare(&oversampled);
        self.pre_distortion.prepare(&oversampled);
        self.primary.prepare(&oversampled);
        self.soft_clip.prepare(&oversampled);

        self.mixer.set_wet_mix_proportion(self.mix.value() * 0.01);
        self.mixer.prepare(base);
        self.mixer.set_wet_latency(self.oversampling.latency_samples());

        self.state = State::Steady;
    }

    fn process_chunk(&mut self, block: &mut AudioBlock) {
        self.input_gain.process_block(block);
        self.mixer.push_dry_samples(block);

        let toggles = &self.toggles;
        let emphasis = toggles.emphasis.value();
        {
            let mut up = self.oversampling.process_up(block);

            if emphasis {
                self.emphasis.process_before(&mut up);
            }
            if toggles.compression.value() {
                self.dynamics.process_block(&mut up);
            }
            if toggles.noise.value() {
                self.noise.process_block(&mut up);
            }
            if toggles.pre_distortion.value() {
                self.pre_distortion.process_block(&mut up);
            }
            if toggles.primary.value() {
                self.primary.process_block(&mut up);
            }
            if emphasis {
                self.emphasis.process_after(&mut up);
            }
            if toggles.post_clip.value() {
                self.soft_clip.process_block(&mut up);
            }
        }
        self.oversampling.process_down(block);

        self.output_gain.process_block(block);
        self.mixer.set_wet_mix_proportion(self.mix.value() * 0.01);
        self.mixer.mix_wet_samples(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pipeline() -> Pipeline {
        Pipeline::new(ParamStore::shared(), None)
    }

    #[test]
    fn test_prepare_rejects_bad_config() {
        let mut p = pipeline();
        assert_eq!(
            p.prepare(0.0, 512, 2),
            Err(ConfigError::InvalidSampleRate { sample_rate: 0.0 })
        );
        assert_eq!(
            p.prepare(48000.0, 0, 2),
            Err(ConfigError::InvalidBlockSize { max_block_size: 0 })
        );
        assert_eq!(
            p.prepare(48000.0, 512, 3),
            Err(ConfigError::UnsupportedLayout { inputs: 3, outputs: 3 })
        );
        assert!(p.prepare(48000.0, 512, 1).is_ok());
    }

    #[test]
    fn test_unprepared_and_bypassed_leave_buffer_untouched() {
        let mut p = pipeline();
        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).sin()).collect();
        let mut bufs = vec![input.clone(), input.clone()];
        p.process(&mut AudioBlock::from_vecs(&mut bufs, 64));
        assert_eq!(bufs[0], input);

        p.store().set(BoolParamId::PluginEnabled, 0.0);
        p.store().set(FloatParamId::InputGain, 12.0);
        p.prepare(48000.0, 64, 2).unwrap();
        p.process(&mut AudioBlock::from_vecs(&mut bufs, 64));
        assert_eq!(bufs[1], input);
    }

    #[test]
    fn test_extra_channels_are_cleared() {
        let mut p = pipeline();
        p.prepare(48000.0, 64, 2).unwrap();
        let mut bufs = vec![vec![0.1f32; 64], vec![0.7f32; 64]];
        p.process_with_input_channels(&mut AudioBlock::from_vecs(&mut bufs, 64), 1);
        assert!(bufs[1].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_no_input_channels_leaves_buffer_untouched() {
        let mut p = pipeline();
        p.store().set(FloatParamId::InputGain, 12.0);
        p.store().set(IntParamId::OversamplingFactor, 1.0);
        p.prepare(48000.0, 64, 2).unwrap();
        let mut bufs = vec![vec![0.3f32; 64], vec![-0.2f32; 64]];
        p.process_with_input_channels(&mut AudioBlock::from_vecs(&mut bufs, 64), 0);
        assert!(bufs[0].iter().all(|&v| v == 0.3));
        assert!(bufs[1].iter().all(|&v| v == -0.2));
        assert_eq!(p.meters().get_input_peak_l(), 0.0);
    }

    #[test]
    fn test_factor_change_reconfigures_before_processing() {
        struct Counter(Arc<AtomicUsize>);
        impl PipelineObserver for Counter {
            fn on_reconfigured(&mut self, factor: usize, latency_samples: f32) {
                assert_eq!(factor, 2);
                assert_eq!(latency_samples, 22.5);
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let count = Arc::new(AtomicUsize::new(0));
        let mut p = Pipeline::new(ParamStore::shared(), Some(Box::new(Counter(count.clone()))));
        p.prepare(44100.0, 128, 2).unwrap();
        assert_eq!(p.latency_samples(), 0.0);

        p.store().set(IntParamId::OversamplingFactor, 2.0);
        let mut bufs = vec![vec![0.0f32; 128], vec![0.0f32; 128]];
        p.process(&mut AudioBlock::from_vecs(&mut bufs, 128));
        p.process(&mut AudioBlock::from_vecs(&mut bufs, 128));

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(p.state(), State::Steady);
        assert_eq!(p.oversampling_factor(), 2);
        assert_eq!(p.latency_samples(), 22.5);
        assert_eq!(p.reported_latency_samples(), 23);
        assert_eq!(p.mixer.wet_latency(), 22.5);
    }

    #[test]
    fn test_oversized_block_is_chunked() {
        let mut p = pipeline();
        p.store().set(FloatParamId::OutputGain, -6.0206);
        p.store().set(BoolParamId::PrimaryDistortionEnabled, 0.0);
        p.store().set(BoolParamId::PostClipEnabled, 0.0);
        p.store().set(BoolParamId::EmphasisOn, 0.0);
        p.prepare(48000.0, 32, 1).unwrap();

        let mut bufs = vec![vec![0.5f32; 100]];
        p.process(&mut AudioBlock::from_vecs(&mut bufs, 100));
        assert!(bufs[0].iter().all(|v| (v - 0.25).abs() < 1e-4));
    }
}
