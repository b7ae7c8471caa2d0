//! Parameter identifiers and descriptor tables.
//!
//! Every parameter is declared once here with its stable string id, display
//! name, range and default. Ids are split by value type so that a handle for a
//! float can only ever be built from a [`FloatParamId`], a toggle only from a
//! [`BoolParamId`], and so on.

use std::collections::HashMap;

use nih_plug::prelude::Enum;
use once_cell::sync::Lazy;

use crate::error::{ConfigError, Result};

// =============================================================================
// Ranges
// =============================================================================

/// Plain-value range of a continuous parameter.
///
/// `Skewed` uses the same convention as the host-facing range: the normalized
/// position is `((v - min) / (max - min)) ^ factor`. The skew only affects how
/// the host maps knob travel, stored values are always plain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FloatRange {
    Linear { min: f32, max: f32 },
    Skewed { min: f32, max: f32, factor: f32 },
}

impl FloatRange {
    pub const fn min(&self) -> f32 {
        match *self {
            FloatRange::Linear { min, .. } | FloatRange::Skewed { min, .. } => min,
        }
    }

    pub const fn max(&self) -> f32 {
        match *self {
            FloatRange::Linear { max, .. } | FloatRange::Skewed { max, .. } => max,
        }
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min(), self.max())
    }
}

// =============================================================================
// Float parameters
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatParamId {
    InputGain,
    OutputGain,
    Mix,

    SaturationAmount,
    Diode,
    Fold,
    GrillBias,

    TubeAmount,
    JeffAmount,
    TubeBias,
    TubeTone,

    PhaseAmount,
    PhaseDistTone,
    PhaseDistStereo,
    PhaseRectify,

    RubidiumAmount,
    RubidiumMojo,
    RubidiumAsym,
    RubidiumTone,

    CookedAmount,
    HardClipGain,

    CompSpeed,
    CompBandTilt,
    CompStereoLink,
    CompRatio,
    CompOut,
    CompKnee,
    StereoCompThreshold,
    MbCompThreshold,
    MsCompThreshold,

    SizzleAmount,
    SizzleFrequency,
    SizzleQ,
    ErosionAmount,
    ErosionFrequency,
    ErosionQ,
    GateAmt,
    GateMix,
    DownsampleFreq,
    DownsampleMix,
    BitReduction,
    FizzAmount,

    AllPassFreq,
    AllPassQ,
    AllPassAmount,
    GrungeAmt,
    GrungeTone,

    EmphasisLowGain,
    EmphasisHighGain,
    EmphasisLowFreq,
    EmphasisHighFreq,

    PostClipGain,
    PostClipKnee,
}

/// Static description of a continuous parameter.
#[derive(Clone, Copy, Debug)]
pub struct FloatDescriptor {
    pub id: FloatParamId,
    pub key: &'static str,
    pub name: &'static str,
    pub range: FloatRange,
    pub default: f32,
    pub unit: &'static str,
    /// Linear ramp length. Zero means the value applies immediately.
    pub smoothing_ms: f32,
}

// Ramp used for gains and amounts.
const RAMP_MS: f32 = 50.0;
// Filter corner frequencies follow faster.
const FREQ_RAMP_MS: f32 = 20.0;

const fn lin(min: f32, max: f32) -> FloatRange {
    FloatRange::Linear { min, max }
}

const fn skew(min: f32, max: f32, factor: f32) -> FloatRange {
    FloatRange::Skewed { min, max, factor }
}

const fn float(
    id: FloatParamId,
    key: &'static str,
    name: &'static str,
    range: FloatRange,
    default: f32,
    unit: &'static str,
    smoothing_ms: f32,
) -> FloatDescriptor {
    FloatDescriptor {
        id,
        key,
        name,
        range,
        default,
        unit,
        smoothing_ms,
    }
}

use FloatParamId as F;

pub const FLOAT_PARAMS: [FloatDescriptor; FloatParamId::COUNT] = [
    float(F::InputGain, "inputGain", "Input Gain", lin(-24.0, 24.0), 0.0, " dB", RAMP_MS),
    float(F::OutputGain, "outputGain", "Out Gain", lin(-24.0, 24.0), 0.0, " dB", RAMP_MS),
    // The dry/wet mixer ramps the proportion itself.
    float(F::Mix, "mix", "Mix", lin(0.0, 100.0), 100.0, "%", 0.0),
    // grill
    float(F::SaturationAmount, "saturationAmount", "Grill Saturation", lin(0.0, 100.0), 0.0, "%", RAMP_MS),
    float(F::Diode, "diode", "Grill Diode", lin(0.0, 100.0), 0.0, "%", RAMP_MS),
    float(F::Fold, "fold", "Grill Fold", lin(0.0, 100.0), 0.0, "%", RAMP_MS),
    float(F::GrillBias, "grillBias", "Grill Bias", lin(0.0, 1.0), 0.0, "", RAMP_MS),
    // tube
    float(F::TubeAmount, "tubeAmount", "Tube Saturation", lin(0.0, 100.0), 0.0, "%", RAMP_MS),
    float(F::JeffAmount, "jeffAmount", "Tube Jeff Amt", lin(0.0, 100.0), 0.0, "%", RAMP_MS),
    float(F::TubeBias, "tubeBias", "Tube Bias", lin(0.0, 1.0), 0.0, "", RAMP_MS),
    float(F::TubeTone, "tubeTone", "Tube Tone", lin(0.0, 1.0), 1.0, "", RAMP_MS),
    // phase
    float(F::PhaseAmount, "phaseAmount", "Phase Distortion", lin(0.0, 100.0), 0.0, "%", RAMP_MS),
    float(F::PhaseDistTone, "phaseDistTone", "Phase Dist Tone", skew(20.0, 20000.0, 0.25), 355.0, " Hz", FREQ_RAMP_MS),
    float(F::PhaseDistStereo, "phaseDistStereo", "Phase Dist Stereo", lin(0.0, 1.0), 0.0, "", RAMP_MS),
    float(F::PhaseRectify, "phaseRectify", "Phase Dist Rectify", lin(0.0, 1.0), 0.0, "", RAMP_MS),
    // rubidium
    float(F::RubidiumAmount, "rubidiumAmount", "Rubidium Saturation", lin(0.0, 100.0), 5.0, "%", RAMP_MS),
    float(F::RubidiumMojo, "rubidiumMojo", "Rubidium Mojo", lin(0.0, 100.0), 5.0, "%", RAMP_MS),
    float(F::RubidiumAsym, "rubidiumAsym", "Rubidium Asymmetry", lin(0.0, 10.0), 0.0, "", RAMP_MS),
    float(F::RubidiumTone, "rubidiumTone", "Rubidium Tone", skew(4.0, 100.0, 0.5), 5.0, "", RAMP_MS),
    // simple curves
    float(F::CookedAmount, "cookedAmount", "Cooked Amount", lin(0.0, 100.0), 0.0, "%", RAMP_MS),
    float(F::HardClipGain, "hardClipGain", "Hard Clip Gain", lin(0.0, 24.0), 0.0, " dB", RAMP_MS),
    // compressor
    float(F::CompSpeed, "compSpeed", "Comp Speed", skew(0.0, 400.0, 0.25), 100.0, " ms", RAMP_MS),
    float(F::CompBandTilt, "compBandTilt", "Comp Band Tilt", lin(-20.0, 20.0), 0.0, " dB", RAMP_MS),
    float(F::CompStereoLink, "compStereoLink", "Stereo Link", lin(0.0, 100.0), 100.0, "%", RAMP_MS),
    float(F::CompRatio, "compRatio", "Comp Ratio", lin(1.0, 10.0), 3.5, ":1", RAMP_MS),
    float(F::CompOut, "compOut", "Comp Makeup", lin(-24.0, 24.0), 0.0, " dB", RAMP_MS),
    float(F::CompKnee, "compKnee", "Comp Knee", lin(0.0, 24.0), 6.0, " dB", RAMP_MS),
    float(F::StereoCompThreshold, "stereoCompThreshold", "Stereo Comp Threshold", lin(-48.0, 0.0), -24.0, " dB", RAMP_MS),
    float(F::MbCompThreshold, "MBCompThreshold", "MB Comp Threshold", lin(-48.0, 0.0), -24.0, " dB", RAMP_MS),
    float(F::MsCompThreshold, "MSCompThreshold", "MS Comp Threshold", lin(-48.0, 0.0), -24.0, " dB", RAMP_MS),
    // noise distortions
    float(F::SizzleAmount, "sizzleAmount", "Sizzle Amt", lin(0.0, 100.0), 5.0, "%", RAMP_MS),
    float(F::SizzleFrequency, "sizzleFrequency", "Sizzle Freq", skew(20.0, 20000.0, 0.25), 4000.0, " Hz", FREQ_RAMP_MS),
    float(F::SizzleQ, "sizzleQ", "Sizzle Q", lin(0.1, 1.5), 1.0, "", FREQ_RAMP_MS),
    float(F::ErosionAmount, "erosionAmount", "Erosion Amt", lin(0.0, 100.0), 3.0, "%", RAMP_MS),
    float(F::ErosionFrequency, "erosionFrequency", "Noise Freq", skew(20.0, 20000.0, 0.25), 400.0, " Hz", FREQ_RAMP_MS),
    float(F::ErosionQ, "erosionQ", "Erosion Q", lin(0.1, 1.5), 1.0, "", FREQ_RAMP_MS),
    float(F::GateAmt, "gateAmt", "Gate Amt", lin(0.0, 1.0), 0.0, "", RAMP_MS),
    float(F::GateMix, "gateMix", "Gate Mix", lin(0.0, 1.0), 1.0, "", RAMP_MS),
    float(F::DownsampleFreq, "downsampleFreq", "Dwnsmpl Freq", skew(200.0, 40000.0, 0.25), 40000.0, " Hz", FREQ_RAMP_MS),
    float(F::DownsampleMix, "downsampleMix", "Dwnsmpl Mix", lin(0.0, 1.0), 1.0, "", RAMP_MS),
    float(F::BitReduction, "bitReduction", "Dwnsmpl Bits", lin(1.0, 32.0), 32.0, " bits", RAMP_MS),
    float(F::FizzAmount, "fizzAmount", "Fizz Amt", lin(0.0, 100.0), 5.0, "%", RAMP_MS),
    // pre distortion
    float(F::AllPassFreq, "allPassFreq", "AllPass Frequency", skew(20.0, 20000.0, 0.25), 85.0, " Hz", FREQ_RAMP_MS),
    float(F::AllPassQ, "allPassQ", "AllPass Q", lin(0.01, 1.41), 0.4, "", FREQ_RAMP_MS),
    // A stage count, applied as soon as it changes.
    float(F::AllPassAmount, "allPassAmount", "AllPass Number", lin(0.0, 50.0), 10.0, "", 0.0),
    float(F::GrungeAmt, "grungeAmt", "Grunge Amt", lin(0.0, 1.0), 0.0, "", RAMP_MS),
    float(F::GrungeTone, "grungeTone", "Grunge Tone", lin(0.0, 1.0), 0.5, "", RAMP_MS),
    // emphasis
    float(F::EmphasisLowGain, "emphasisLowGain", "Emphasis Low Gain", lin(-18.0, 18.0), 0.0, " dB", RAMP_MS),
    float(F::EmphasisHighGain, "emphasisHighGain", "Emphasis Hi Gain", lin(-18.0, 18.0), 0.0, " dB", RAMP_MS),
    float(F::EmphasisLowFreq, "emphasisLowFreq", "Emphasis Low Frequency", skew(20.0, 20000.0, 0.25), 62.0, " Hz", FREQ_RAMP_MS),
    float(F::EmphasisHighFreq, "emphasisHighFreq", "Emphasis Hi Frequency", skew(20.0, 20000.0, 0.25), 9000.0, " Hz", FREQ_RAMP_MS),
    // utility
    float(F::PostClipGain, "postClipGain", "SoftClip Gain", lin(-18.0, 18.0), 0.0, " dB", RAMP_MS),
    float(F::PostClipKnee, "postClipKnee", "SoftClip Knee", lin(0.0, 4.0), 0.5, "", RAMP_MS),
];

impl FloatParamId {
    pub const COUNT: usize = 53;

    pub const ALL: [FloatParamId; FloatParamId::COUNT] = [
        F::InputGain,
        F::OutputGain,
        F::Mix,
        F::SaturationAmount,
        F::Diode,
        F::Fold,
        F::GrillBias,
        F::TubeAmount,
        F::JeffAmount,
        F::TubeBias,
        F::TubeTone,
        F::PhaseAmount,
        F::PhaseDistTone,
        F::PhaseDistStereo,
        F::PhaseRectify,
        F::RubidiumAmount,
        F::RubidiumMojo,
        F::RubidiumAsym,
        F::RubidiumTone,
        F::CookedAmount,
        F::HardClipGain,
        F::CompSpeed,
        F::CompBandTilt,
        F::CompStereoLink,
        F::CompRatio,
        F::CompOut,
        F::CompKnee,
        F::StereoCompThreshold,
        F::MbCompThreshold,
        F::MsCompThreshold,
        F::SizzleAmount,
        F::SizzleFrequency,
        F::SizzleQ,
        F::ErosionAmount,
        F::ErosionFrequency,
        F::ErosionQ,
        F::GateAmt,
        F::GateMix,
        F::DownsampleFreq,
        F::DownsampleMix,
        F::BitReduction,
        F::FizzAmount,
        F::AllPassFreq,
        F::AllPassQ,
        F::AllPassAmount,
        F::GrungeAmt,
        F::GrungeTone,
        F::EmphasisLowGain,
        F::EmphasisHighGain,
        F::EmphasisLowFreq,
        F::EmphasisHighFreq,
        F::PostClipGain,
        F::PostClipKnee,
    ];

    #[inline]
    pub fn descriptor(self) -> &'static FloatDescriptor {
        &FLOAT_PARAMS[self as usize]
    }
}

// =============================================================================
// Toggles
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoolParamId {
    PluginEnabled,
    CompressionOn,
    PrimaryDistortionEnabled,
    EmphasisOn,
    PreDistortionEnabled,
    NoiseDistortionEnabled,
    PostClipEnabled,
}

#[derive(Clone, Copy, Debug)]
pub struct BoolDescriptor {
    pub id: BoolParamId,
    pub key: &'static str,
    pub name: &'static str,
    pub default: bool,
}

pub const BOOL_PARAMS: [BoolDescriptor; BoolParamId::COUNT] = [
    BoolDescriptor { id: BoolParamId::PluginEnabled, key: "pluginEnabled", name: "Enabled", default: true },
    BoolDescriptor { id: BoolParamId::CompressionOn, key: "compressionOn", name: "Compressor On", default: false },
    BoolDescriptor { id: BoolParamId::PrimaryDistortionEnabled, key: "primaryDistortionEnabled", name: "Dist Enabled", default: true },
    BoolDescriptor { id: BoolParamId::EmphasisOn, key: "emphasisOn", name: "Emphasis EQ On", default: true },
    BoolDescriptor { id: BoolParamId::PreDistortionEnabled, key: "preDistortionEnabled", name: "Pre-Dist Enabled", default: false },
    BoolDescriptor { id: BoolParamId::NoiseDistortionEnabled, key: "noiseDistortionEnabled", name: "Noise Enabled", default: false },
    BoolDescriptor { id: BoolParamId::PostClipEnabled, key: "postClipEnabled", name: "SoftClip Enabled", default: true },
];

impl BoolParamId {
    pub const COUNT: usize = 7;

    pub const ALL: [BoolParamId; BoolParamId::COUNT] = [
        BoolParamId::PluginEnabled,
        BoolParamId::CompressionOn,
        BoolParamId::PrimaryDistortionEnabled,
        BoolParamId::EmphasisOn,
        BoolParamId::PreDistortionEnabled,
        BoolParamId::NoiseDistortionEnabled,
        BoolParamId::PostClipEnabled,
    ];

    #[inline]
    pub fn descriptor(self) -> &'static BoolDescriptor {
        &BOOL_PARAMS[self as usize]
    }
}

// =============================================================================
// Integers
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntParamId {
    OversamplingFactor,
}

#[derive(Clone, Copy, Debug)]
pub struct IntDescriptor {
    pub id: IntParamId,
    pub key: &'static str,
    pub name: &'static str,
    pub min: i32,
    pub max: i32,
    pub default: i32,
}

pub const INT_PARAMS: [IntDescriptor; IntParamId::COUNT] = [IntDescriptor {
    id: IntParamId::OversamplingFactor,
    key: "oversamplingFactor",
    name: "Oversampling Factor",
    min: 0,
    max: 2,
    default: 0,
}];

impl IntParamId {
    pub const COUNT: usize = 1;

    pub const ALL: [IntParamId; IntParamId::COUNT] = [IntParamId::OversamplingFactor];

    #[inline]
    pub fn descriptor(self) -> &'static IntDescriptor {
        &INT_PARAMS[self as usize]
    }
}

// =============================================================================
// Categorical
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChoiceParamId {
    PrimaryDistortionType,
    NoiseDistortionType,
    PreDistortionType,
    CompressionType,
    CompressionCurve,
}

#[derive(Clone, Copy, Debug)]
pub struct ChoiceDescriptor {
    pub id: ChoiceParamId,
    pub key: &'static str,
    pub name: &'static str,
    pub options: &'static [&'static str],
    pub default: usize,
}

pub const CHOICE_PARAMS: [ChoiceDescriptor; ChoiceParamId::COUNT] = [
    ChoiceDescriptor {
        id: ChoiceParamId::PrimaryDistortionType,
        key: "primaryDistortionType",
        name: "Distortion Type",
        options: &["Classic", "Tube", "Phase", "Rubidium", "Cooked", "Hard Clip"],
        default: 0,
    },
    ChoiceDescriptor {
        id: ChoiceParamId::NoiseDistortionType,
        key: "noiseDistortionType",
        name: "Noise Type",
        options: &["Sizzle", "Erosion", "Gate", "Downsample", "Fizz"],
        default: 0,
    },
    ChoiceDescriptor {
        id: ChoiceParamId::PreDistortionType,
        key: "preDistortionType",
        name: "Pre-Dist Type",
        options: &["All-Pass", "Grunge"],
        default: 0,
    },
    ChoiceDescriptor {
        id: ChoiceParamId::CompressionType,
        key: "compressionType",
        name: "Compression Type",
        options: &["Stereo", "Multiband", "Mid-Side"],
        default: 0,
    },
    ChoiceDescriptor {
        id: ChoiceParamId::CompressionCurve,
        key: "compressionCurve",
        name: "Compression Curve",
        options: &["Compressor", "Expander", "Upward-Downward"],
        default: 0,
    },
];

impl ChoiceParamId {
    pub const COUNT: usize = 5;

    pub const ALL: [ChoiceParamId; ChoiceParamId::COUNT] = [
        ChoiceParamId::PrimaryDistortionType,
        ChoiceParamId::NoiseDistortionType,
        ChoiceParamId::PreDistortionType,
        ChoiceParamId::CompressionType,
        ChoiceParamId::CompressionCurve,
    ];

    #[inline]
    pub fn descriptor(self) -> &'static ChoiceDescriptor {
        &CHOICE_PARAMS[self as usize]
    }
}

/// A categorical parameter's typed option set. The host sees it as an
/// `EnumParam`, so variant names must match the descriptor's options.
pub trait Choice: Enum + Copy + PartialEq + Send + Sync + 'static {
    const PARAM: ChoiceParamId;

    /// Map a (range-checked) option index to the typed option.
    fn from_option(index: usize) -> Self;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum DistortionType {
    Classic,
    Tube,
    Phase,
    Rubidium,
    Cooked,
    #[name = "Hard Clip"]
    HardClip,
}

impl Choice for DistortionType {
    const PARAM: ChoiceParamId = ChoiceParamId::PrimaryDistortionType;

    fn from_option(index: usize) -> Self {
        match index {
            1 => DistortionType::Tube,
            2 => DistortionType::Phase,
            3 => DistortionType::Rubidium,
            4 => DistortionType::Cooked,
            5 => DistortionType::HardClip,
            _ => DistortionType::Classic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum NoiseType {
    Sizzle,
    Erosion,
    Gate,
    Downsample,
    Fizz,
}

impl Choice for NoiseType {
    const PARAM: ChoiceParamId = ChoiceParamId::NoiseDistortionType;

    fn from_option(index: usize) -> Self {
        match index {
            1 => NoiseType::Erosion,
            2 => NoiseType::Gate,
            3 => NoiseType::Downsample,
            4 => NoiseType::Fizz,
            _ => NoiseType::Sizzle,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum PreDistortionType {
    #[name = "All-Pass"]
    AllPass,
    Grunge,
}

impl Choice for PreDistortionType {
    const PARAM: ChoiceParamId = ChoiceParamId::PreDistortionType;

    fn from_option(index: usize) -> Self {
        match index {
            1 => PreDistortionType::Grunge,
            _ => PreDistortionType::AllPass,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum CompressionTopology {
    Stereo,
    Multiband,
    #[name = "Mid-Side"]
    MidSide,
}

impl Choice for CompressionTopology {
    const PARAM: ChoiceParamId = ChoiceParamId::CompressionType;

    fn from_option(index: usize) -> Self {
        match index {
            1 => CompressionTopology::Multiband,
            2 => CompressionTopology::MidSide,
            _ => CompressionTopology::Stereo,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum CurveKind {
    Compressor,
    Expander,
    #[name = "Upward-Downward"]
    UpwardDownward,
}

impl Choice for CurveKind {
    const PARAM: ChoiceParamId = ChoiceParamId::CompressionCurve;

    fn from_option(index: usize) -> Self {
        match index {
            1 => CurveKind::Expander,
            2 => CurveKind::UpwardDownward,
            _ => CurveKind::Compressor,
        }
    }
}

// =============================================================================
// Any parameter
// =============================================================================

/// Type-erased parameter id, used for string lookup and the flat value set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Float(FloatParamId),
    Bool(BoolParamId),
    Int(IntParamId),
    Choice(ChoiceParamId),
}

pub const PARAM_COUNT: usize =
    FloatParamId::COUNT + BoolParamId::COUNT + IntParamId::COUNT + ChoiceParamId::COUNT;

static KEY_MAP: Lazy<HashMap<&'static str, ParamKey>> =
    Lazy::new(|| ParamKey::all().map(|k| (k.key(), k)).collect());

impl ParamKey {
    /// Look up a parameter by its stable string id.
    pub fn from_key(key: &str) -> Result<ParamKey> {
        KEY_MAP
            .get(key)
            .copied()
            .ok_or_else(|| ConfigError::UnknownParameter { id: key.to_string() })
    }

    pub fn all() -> impl Iterator<Item = ParamKey> {
        FloatParamId::ALL
            .into_iter()
            .map(ParamKey::Float)
            .chain(BoolParamId::ALL.into_iter().map(ParamKey::Bool))
            .chain(IntParamId::ALL.into_iter().map(ParamKey::Int))
            .chain(ChoiceParamId::ALL.into_iter().map(ParamKey::Choice))
    }

    /// Slot in the flat value store.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ParamKey::Float(id) => id as usize,
            ParamKey::Bool(id) => FloatParamId::COUNT + id as usize,
            ParamKey::Int(id) => FloatParamId::COUNT + BoolParamId::COUNT + id as usize,
            ParamKey::Choice(id) => {
                FloatParamId::COUNT + BoolParamId::COUNT + IntParamId::COUNT + id as usize
            }
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ParamKey::Float(id) => id.descriptor().key,
            ParamKey::Bool(id) => id.descriptor().key,
            ParamKey::Int(id) => id.descriptor().key,
            ParamKey::Choice(id) => id.descriptor().key,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamKey::Float(id) => id.descriptor().name,
            ParamKey::Bool(id) => id.descriptor().name,
            ParamKey::Int(id) => id.descriptor().name,
            ParamKey::Choice(id) => id.descriptor().name,
        }
    }

    /// Default value in the store's f32 encoding.
    pub fn default_value(self) -> f32 {
        match self {
            ParamKey::Float(id) => id.descriptor().default,
            ParamKey::Bool(id) => {
                if id.descriptor().default {
                    1.0
                } else {
                    0.0
                }
            }
            ParamKey::Int(id) => id.descriptor().default as f32,
            ParamKey::Choice(id) => id.descriptor().default as f32,
        }
    }

    /// Force a raw value into the parameter's domain.
    ///
    /// Floats are clamped (NaN falls back to the default), toggles become 0/1,
    /// integers and option indices are rounded and clamped.
    pub fn sanitize(self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default_value();
        }
        match self {
            ParamKey::Float(id) => id.descriptor().range.clamp(value),
            ParamKey::Bool(_) => {
                if value >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            ParamKey::Int(id) => {
                let d = id.descriptor();
                value.round().clamp(d.min as f32, d.max as f32)
            }
            ParamKey::Choice(id) => {
                let last = id.descriptor().options.len().saturating_sub(1) as f32;
                value.round().clamp(0.0, last)
            }
        }
    }
}

impl From<FloatParamId> for ParamKey {
    fn from(id: FloatParamId) -> Self {
        ParamKey::Float(id)
    }
}

impl From<BoolParamId> for ParamKey {
    fn from(id: BoolParamId) -> Self {
        ParamKey::Bool(id)
    }
}

impl From<IntParamId> for ParamKey {
    fn from(id: IntParamId) -> Self {
        ParamKey::Int(id)
    }
}

impl From<ChoiceParamId> for ParamKey {
    fn from(id: ChoiceParamId) -> Self {
        ParamKey::Choice(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tables_match_id_order() {
        for (i, id) in FloatParamId::ALL.iter().enumerate() {
            assert_eq!(FLOAT_PARAMS[i].id, *id);
            assert_eq!(*id as usize, i);
        }
        for (i, id) in BoolParamId::ALL.iter().enumerate() {
            assert_eq!(BOOL_PARAMS[i].id, *id);
        }
        for (i, id) in IntParamId::ALL.iter().enumerate() {
            assert_eq!(INT_PARAMS[i].id, *id);
        }
        for (i, id) in ChoiceParamId::ALL.iter().enumerate() {
            assert_eq!(CHOICE_PARAMS[i].id, *id);
        }
    }

    #[test]
    fn test_keys_are_unique_and_indices_dense() {
        let keys: HashSet<_> = ParamKey::all().map(|k| k.key()).collect();
        assert_eq!(keys.len(), PARAM_COUNT);

        let mut indices: Vec<_> = ParamKey::all().map(|k| k.index()).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..PARAM_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_defaults_are_in_range() {
        for d in FLOAT_PARAMS.iter() {
            assert!(d.default >= d.range.min() && d.default <= d.range.max(), "{}", d.key);
        }
        for d in CHOICE_PARAMS.iter() {
            assert!(d.default < d.options.len());
        }
    }

    #[test]
    fn test_from_key() {
        assert_eq!(
            ParamKey::from_key("allPassAmount").unwrap(),
            ParamKey::Float(FloatParamId::AllPassAmount)
        );
        assert_eq!(
            ParamKey::from_key("oversamplingFactor").unwrap(),
            ParamKey::Int(IntParamId::OversamplingFactor)
        );
        let err = ParamKey::from_key("noSuchThing").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownParameter { .. }));
    }

    #[test]
    fn test_sanitize() {
        let ratio = ParamKey::Float(FloatParamId::CompRatio);
        assert_eq!(ratio.sanitize(0.2), 1.0);
        assert_eq!(ratio.sanitize(50.0), 10.0);
        assert_eq!(ratio.sanitize(f32::NAN), 3.5);

        let os = ParamKey::Int(IntParamId::OversamplingFactor);
        assert_eq!(os.sanitize(1.6), 2.0);
        assert_eq!(os.sanitize(-3.0), 0.0);

        let kind = ParamKey::Choice(ChoiceParamId::PrimaryDistortionType);
        assert_eq!(kind.sanitize(99.0), 5.0);

        let on = ParamKey::Bool(BoolParamId::CompressionOn);
        assert_eq!(on.sanitize(0.7), 1.0);
        assert_eq!(on.sanitize(0.1), 0.0);
    }
}
