mod debug;
pub mod dsp;
pub mod error;
pub mod meters;
pub mod params;
pub mod pipeline;

pub use error::{ConfigError, Result};
pub use meters::Meters;
pub use params::{ParamKey, ParamSnapshot, ParamStore};
pub use pipeline::{Pipeline, PipelineObserver, State};

use crate::dsp::AudioBlock;
use crate::params::{
    BoolParamId, Choice, CompressionTopology, CurveKind, DistortionType, FloatParamId, IntParamId,
    NoiseType, PreDistortionType, BOOL_PARAMS, FLOAT_PARAMS, INT_PARAMS,
};
use nih_plug::prelude::*;
use std::sync::Arc;

// -----------------------------------------------------------------------------
// HOST PARAMETERS
// -----------------------------------------------------------------------------

/// Host-facing view of the parameter table.
///
/// Every nih-plug parameter is built from a descriptor and carries a callback
/// that writes the new plain value into the shared [`ParamStore`]; the DSP
/// side only ever reads the store. Host smoothing is off, the pipeline
/// smooths.
pub struct ScorchParams {
    store: Arc<ParamStore>,
    floats: Vec<(FloatParamId, FloatParam)>,
    bools: Vec<(BoolParamId, BoolParam)>,
    ints: Vec<(IntParamId, IntParam)>,

    pub primary_type: EnumParam<DistortionType>,
    pub noise_type: EnumParam<NoiseType>,
    pub pre_distortion_type: EnumParam<PreDistortionType>,
    pub compression_type: EnumParam<CompressionTopology>,
    pub compression_curve: EnumParam<CurveKind>,
}

fn host_range(range: params::FloatRange) -> FloatRange {
    match range {
        params::FloatRange::Linear { min, max } => FloatRange::Linear { min, max },
        params::FloatRange::Skewed { min, max, factor } => FloatRange::Skewed { min, max, factor },
    }
}

/// Categorical parameters are typed `EnumParam`s whose variant names are the
/// descriptor's options.
fn choice_param<T: Choice>(store: &Arc<ParamStore>) -> EnumParam<T> {
    let descriptor = T::PARAM.descriptor();
    let target = store.clone();
    EnumParam::new(descriptor.name, T::from_option(descriptor.default)).with_callback(Arc::new(
        move |v: T| {
            target.set(T::PARAM, v.to_index() as f32);
        },
    ))
}

fn sync_choice<T: Choice>(store: &ParamStore, param: &EnumParam<T>) {
    store.set(T::PARAM, param.value().to_index() as f32);
}

fn choice_entry<T: Choice>(param: &EnumParam<T>) -> (String, ParamPtr, String) {
    (T::PARAM.descriptor().key.to_string(), param.as_ptr(), String::new())
}

impl ScorchParams {
    pub fn new(store: Arc<ParamStore>) -> Self {
        let floats = FLOAT_PARAMS
            .iter()
            .map(|d| {
                let target = store.clone();
                let id = d.id;
                let param = FloatParam::new(d.name, d.default, host_range(d.range))
                    .with_unit(d.unit)
                    .with_value_to_string(formatters::v2s_f32_rounded(2))
                    .with_callback(Arc::new(move |v| {
                        target.set(id, v);
                    }));
                (d.id, param)
            })
            .collect();

        let bools = BOOL_PARAMS
            .iter()
            .map(|d| {
                let target = store.clone();
                let id = d.id;
                let param = BoolParam::new(d.name, d.default).with_callback(Arc::new(move |v| {
                    target.set(id, if v { 1.0 } else { 0.0 });
                }));
                (d.id, param)
            })
            .collect();

        let ints = INT_PARAMS
            .iter()
            .map(|d| {
                let target = store.clone();
                let id = d.id;
                let param = IntParam::new(
                    d.name,
                    d.default,
                    IntRange::Linear {
                        min: d.min,
                        max: d.max,
                    },
                )
                .with_callback(Arc::new(move |v| {
                    target.set(id, v as f32);
                }));
                (d.id, param)
            })
            .collect();

        Self {
            primary_type: choice_param(&store),
            noise_type: choice_param(&store),
            pre_distortion_type: choice_param(&store),
            compression_type: choice_param(&store),
            compression_curve: choice_param(&store),
            store,
            floats,
            bools,
            ints,
        }
    }

    pub fn store(&self) -> &Arc<ParamStore> {
        &self.store
    }

    /// Copy every host value into the store. Used after state restore, where
    /// a host may not fire the per-parameter callbacks.
    pub fn sync_store(&self) {
        for (id, p) in &self.floats {
            self.store.set(*id, p.value());
        }
        for (id, p) in &self.bools {
            self.store.set(*id, if p.value() { 1.0 } else { 0.0 });
        }
        for (id, p) in &self.ints {
            self.store.set(*id, p.value() as f32);
        }
        sync_choice(&self.store, &self.primary_type);
        sync_choice(&self.store, &self.noise_type);
        sync_choice(&self.store, &self.pre_distortion_type);
        sync_choice(&self.store, &self.compression_type);
        sync_choice(&self.store, &self.compression_curve);
    }
}

unsafe impl Params for ScorchParams {
    fn param_map(&self) -> Vec<(String, ParamPtr, String)> {
        let mut map = Vec::with_capacity(params::PARAM_COUNT);
        for (id, p) in &self.floats {
            map.push((id.descriptor().key.to_string(), p.as_ptr(), String::new()));
        }
        for (id, p) in &self.bools {
            map.push((id.descriptor().key.to_string(), p.as_ptr(), String::new()));
        }
        for (id, p) in &self.ints {
            map.push((id.descriptor().key.to_string(), p.as_ptr(), String::new()));
        }
        map.push(choice_entry(&self.primary_type));
        map.push(choice_entry(&self.noise_type));
        map.push(choice_entry(&self.pre_distortion_type));
        map.push(choice_entry(&self.compression_type));
        map.push(choice_entry(&self.compression_curve));
        map
    }
}

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------

pub struct ScorchPlugin {
    params: Arc<ScorchParams>,
    pipeline: Pipeline,
    reported_latency: u32,
}

impl Default for ScorchPlugin {
    fn default() -> Self {
        let store = ParamStore::shared();
        Self {
            params: Arc::new(ScorchParams::new(store.clone())),
            pipeline: Pipeline::new(store, None),
            reported_latency: 0,
        }
    }
}

impl ScorchPlugin {
    pub fn meters(&self) -> Arc<Meters> {
        self.pipeline.meters()
    }

    fn process_internal(
        &mut self,
        buffer: &mut Buffer,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let num_channels = buffer.channels();
        let slices = buffer.as_slice();
        let mut block = AudioBlock::new(slices);
        self.pipeline.process_with_input_channels(&mut block, num_channels);

        // Factor changes are picked up inside the pipeline; tell the host
        // once the new latency is in effect.
        let latency = self.pipeline.reported_latency_samples();
        if latency != self.reported_latency {
            self.reported_latency = latency;
            context.set_latency_samples(latency);
        }

        ProcessStatus::Normal
    }
}

impl Plugin for ScorchPlugin {
    const NAME: &'static str = "Scorch";
    const VENDOR: &'static str = "Scorch Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        context: &mut impl InitContext<Self>,
    ) -> bool {
        #[cfg(feature = "debug")]
        crate::debug::logger::init_logger();

        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let channels = audio_io_layout
                .main_output_channels
                .map(NonZeroU32::get)
                .unwrap_or(0) as usize;

            self.params.sync_store();
            if let Err(err) = self.pipeline.prepare(
                buffer_config.sample_rate,
                buffer_config.max_buffer_size as usize,
                channels,
            ) {
                log::warn!("initialize failed: {}", err);
                return false;
            }

            self.reported_latency = self.pipeline.reported_latency_samples();
            context.set_latency_samples(self.reported_latency);

            #[cfg(feature = "debug")]
            crate::debug::logger::drain_to_file();

            true
        }))
        .unwrap_or(false)
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.process_internal(buffer, context)
        }))
        .unwrap_or(ProcessStatus::Normal)
    }

    fn reset(&mut self) {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.pipeline.reset();

            #[cfg(feature = "debug")]
            crate::debug::logger::drain_to_file();
        }))
        .unwrap_or(());
    }
}

impl ClapPlugin for ScorchPlugin {
    const CLAP_ID: &'static str = "com.scorch.distortion";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Oversampled distortion, dynamics and tone shaping");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Distortion,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for ScorchPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"ScorchDistortion";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Distortion,
        Vst3SubCategory::Dynamics,
    ];
}

nih_export_clap!(ScorchPlugin);
nih_export_vst3!(ScorchPlugin);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_map_covers_table() {
        let params = ScorchParams::new(ParamStore::shared());
        let map = params.param_map();
        assert_eq!(map.len(), params::PARAM_COUNT);
        for key in ParamKey::all() {
            assert!(map.iter().any(|(id, _, _)| id == key.key()), "{}", key.key());
        }
    }

    fn assert_variants_match<T: Choice>() {
        assert_eq!(T::variants(), T::PARAM.descriptor().options);
        for (i, _) in T::variants().iter().enumerate() {
            assert_eq!(T::from_option(i).to_index(), i);
        }
    }

    #[test]
    fn test_choice_variants_match_descriptors() {
        assert_variants_match::<DistortionType>();
        assert_variants_match::<NoiseType>();
        assert_variants_match::<PreDistortionType>();
        assert_variants_match::<CompressionTopology>();
        assert_variants_match::<CurveKind>();
    }

    #[test]
    fn test_sync_store_copies_host_defaults() {
        let store = ParamStore::shared();
        store.set(FloatParamId::Mix, 20.0);
        store.set(BoolParamId::PluginEnabled, 0.0);
        store.set(DistortionType::PARAM, 5.0);
        let params = ScorchParams::new(store.clone());
        params.sync_store();
        assert_eq!(store.float(FloatParamId::Mix), 100.0);
        assert!(store.bool(BoolParamId::PluginEnabled));
        assert_eq!(store.choice_index(DistortionType::PARAM), 0);
    }
}
