//! Noise-driven distortions: sizzle, erosion, gate, downsample and fizz.
//!
//! All noise comes from per-channel xorshift generators with fixed seeds, so a
//! render is reproducible from a reset.

use std::sync::Arc;

use crate::dsp::biquad::Biquad;
use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
use crate::dsp::utils::{lerp, Xorshift};
use crate::dsp::BlockProcessor;
use crate::params::{ChoiceValue, FloatParamId, NoiseType, ParamStore, SmoothedFloat};

const SEEDS: [u32; MAX_CHANNELS] = [0x1234_5678, 0x8765_4321];

/// Erosion delay swing at 100 % in seconds.
const EROSION_MAX_DEPTH_S: f32 = 0.0005;
/// Bits at or above this leave the signal unquantised.
const FULL_RESOLUTION_BITS: f32 = 32.0;

fn noise_sources() -> [Xorshift; MAX_CHANNELS] {
    [Xorshift::new(SEEDS[0]), Xorshift::new(SEEDS[1])]
}

/// Band-passed white noise per channel. Coefficients follow the frequency and
/// Q handles and are refreshed once per block.
struct NoiseBand {
    freq: SmoothedFloat,
    q: SmoothedFloat,
    filters: [Biquad; MAX_CHANNELS],
    rng: [Xorshift; MAX_CHANNELS],
    generations: (u32, u32),
    sample_rate: f32,
}

impl NoiseBand {
    fn new(store: &Arc<ParamStore>, freq: FloatParamId, q: FloatParamId) -> Self {
        Self {
            freq: SmoothedFloat::new(store, freq),
            q: SmoothedFloat::new(store, q),
            filters: Default::default(),
            rng: noise_sources(),
            generations: (u32::MAX, u32::MAX),
            sample_rate: 44100.0,
        }
    }

    fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.freq.prepare(sample_rate);
        self.q.prepare(sample_rate);
        self.generations = (u32::MAX, u32::MAX);
        self.refresh();
        self.reset();
    }

    fn advance(&mut self, num_samples: usize) {
        self.freq.update();
        self.q.update();
        self.freq.skip(num_samples);
        self.q.skip(num_samples);
        self.refresh();
    }

    fn refresh(&mut self) {
        let generations = (self.freq.generation(), self.q.generation());
        if generations == self.generations {
            return;
        }
        self.generations = generations;
        let mut design = Biquad::new();
        design.update_bpf(self.freq.value(), self.q.value(), self.sample_rate);
        for filter in self.filters.iter_mut() {
            filter.copy_coefficients(&design);
        }
    }

    #[inline]
    fn next(&mut self, channel: usize) -> f32 {
        let white = self.rng[channel].next_bipolar();
        self.filters[channel].process(white)
    }

    fn reset(&mut self) {
        for filter in self.filters.iter_mut() {
            filter.reset_state();
        }
        self.rng = noise_sources();
    }
}

/// Adds band-passed noise that follows the input level.
pub struct Sizzle {
    amount: SmoothedFloat,
    band: NoiseBand,
}

impl Sizzle {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::SizzleAmount),
            band: NoiseBand::new(store, FloatParamId::SizzleFrequency, FloatParamId::SizzleQ),
        }
    }
}

impl BlockProcessor for Sizzle {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.amount.prepare(spec.sample_rate);
        self.band.prepare(spec.sample_rate);
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.amount.update();
        self.band.advance(block.num_samples());

        block.for_each_frame(|frame, channels| {
            let amount = self.amount.next() * 0.01;
            for (c, x) in frame.iter_mut().enumerate().take(channels) {
                *x += self.band.next(c) * x.abs() * amount;
            }
        });
    }

    fn reset(&mut self) {
        self.band.reset();
    }
}

/// Short delay line whose read position is swung by band-passed noise.
pub struct Erosion {
    amount: SmoothedFloat,
    band: NoiseBand,
    lines: [Vec<f32>; MAX_CHANNELS],
    write_pos: usize,
    max_depth: f32,
}

impl Erosion {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::ErosionAmount),
            band: NoiseBand::new(store, FloatParamId::ErosionFrequency, FloatParamId::ErosionQ),
            lines: Default::default(),
            write_pos: 0,
            max_depth: 0.0,
        }
    }

    /// Linear read `delay` samples behind the newest write.
    #[inline]
    fn read(line: &[f32], write_pos: usize, delay: f32) -> f32 {
        let len = line.len();
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let a = line[(write_pos + len - whole) % len];
        let b = line[(write_pos + 2 * len - whole - 1) % len];
        lerp(a, b, frac)
    }
}

impl BlockProcessor for Erosion {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.amount.prepare(spec.sample_rate);
        self.band.prepare(spec.sample_rate);
        self.max_depth = EROSION_MAX_DEPTH_S * spec.sample_rate;
        // Swing is 0..2 * depth, plus room for the interpolation tap.
        let len = (2.0 * self.max_depth).ceil() as usize + 4;
        for line in self.lines.iter_mut() {
            *line = vec![0.0; len];
        }
        self.write_pos = 0;
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        if self.lines[0].is_empty() {
            return;
        }
        self.amount.update();
        self.band.advance(block.num_samples());

        block.for_each_frame(|frame, channels| {
            let depth = self.amount.next() * 0.01 * self.max_depth;
            let pos = self.write_pos;
            for (c, x) in frame.iter_mut().enumerate().take(channels) {
                let line = &mut self.lines[c];
                line[pos] = *x;
                let swing = self.band.next(c).clamp(-1.0, 1.0);
                *x = Self::read(line, pos, depth * (1.0 + swing));
            }
            self.write_pos = (pos + 1) % self.lines[0].len();
        });
    }

    fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            line.fill(0.0);
        }
        self.write_pos = 0;
        self.band.reset();
    }
}

/// Zeroes samples whose magnitude is below the threshold.
pub struct Gate {
    threshold: SmoothedFloat,
    mix: SmoothedFloat,
}

impl Gate {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            threshold: SmoothedFloat::new(store, FloatParamId::GateAmt),
            mix: SmoothedFloat::new(store, FloatParamId::GateMix),
        }
    }
}

impl BlockProcessor for Gate {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.threshold.prepare(spec.sample_rate);
        self.mix.prepare(spec.sample_rate);
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.threshold.update();
        self.mix.update();

        block.for_each_frame(|frame, channels| {
            let threshold = self.threshold.next();
            let mix = self.mix.next();
            for x in frame.iter_mut().take(channels) {
                let gated = if x.abs() < threshold { 0.0 } else { *x };
                *x = lerp(*x, gated, mix);
            }
        });
    }

    fn reset(&mut self) {}
}

/// Sample-and-hold at a variable rate with an optional bit-depth quantiser.
pub struct Downsample {
    freq: SmoothedFloat,
    bits: SmoothedFloat,
    mix: SmoothedFloat,
    phase: f32,
    held: [f32; MAX_CHANNELS],
    sample_rate: f32,
}

impl Downsample {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            freq: SmoothedFloat::new(store, FloatParamId::DownsampleFreq),
            bits: SmoothedFloat::new(store, FloatParamId::BitReduction),
            mix: SmoothedFloat::new(store, FloatParamId::DownsampleMix),
            phase: 1.0,
            held: [0.0; MAX_CHANNELS],
            sample_rate: 44100.0,
        }
    }

    #[inline]
    fn quantize(x: f32, bits: f32) -> f32 {
        if bits >= FULL_RESOLUTION_BITS {
            return x;
        }
        let levels = (bits - 1.0).exp2();
        (x * levels).round() / levels
    }
}

impl BlockProcessor for Downsample {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        for p in [&mut self.freq, &mut self.bits, &mut self.mix] {
            p.prepare(spec.sample_rate);
        }
        self.reset();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        for p in [&mut self.freq, &mut self.bits, &mut self.mix] {
            p.update();
        }

        let sample_rate = self.sample_rate;
        block.for_each_frame(|frame, channels| {
            let increment = self.freq.next() / sample_rate;
            let bits = self.bits.next();
            let mix = self.mix.next();

            if self.phase >= 1.0 {
                self.phase -= 1.0;
                for c in 0..channels {
                    self.held[c] = Self::quantize(frame[c], bits);
                }
            }
            self.phase = (self.phase + increment).min(2.0);

            for c in 0..channels {
                frame[c] = lerp(frame[c], self.held[c], mix);
            }
        });
    }

    fn reset(&mut self) {
        self.phase = 1.0;
        self.held = [0.0; MAX_CHANNELS];
    }
}

/// Multiplicative white noise.
pub struct Fizz {
    amount: SmoothedFloat,
    rng: [Xorshift; MAX_CHANNELS],
}

impl Fizz {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            amount: SmoothedFloat::new(store, FloatParamId::FizzAmount),
            rng: noise_sources(),
        }
    }
}

impl BlockProcessor for Fizz {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.amount.prepare(spec.sample_rate);
        self.reset();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        self.amount.update();
        block.for_each_frame(|frame, channels| {
            let amount = self.amount.next() * 0.01;
            for (c, x) in frame.iter_mut().enumerate().take(channels) {
                *x *= 1.0 + self.rng[c].next_bipolar() * amount;
            }
        });
    }

    fn reset(&mut self) {
        self.rng = noise_sources();
    }
}

/// Runs the noise variant picked by `noiseDistortionType`.
pub struct NoiseDistortion {
    selected: ChoiceValue<NoiseType>,
    active: NoiseType,
    sizzle: Sizzle,
    erosion: Erosion,
    gate: Gate,
    downsample: Downsample,
    fizz: Fizz,
}

impl NoiseDistortion {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        let selected = ChoiceValue::new(store);
        let active = selected.value();
        Self {
            selected,
            active,
            sizzle: Sizzle::new(store),
            erosion: Erosion::new(store),
            gate: Gate::new(store),
            downsample: Downsample::new(store),
            fizz: Fizz::new(store),
        }
    }

    pub fn active(&self) -> NoiseType {
        self.active
    }

    fn variant(&mut self, kind: NoiseType) -> &mut dyn BlockProcessor {
        match kind {
            NoiseType::Sizzle => &mut self.sizzle,
            NoiseType::Erosion => &mut self.erosion,
            NoiseType::Gate => &mut self.gate,
            NoiseType::Downsample => &mut self.downsample,
            NoiseType::Fizz => &mut self.fizz,
        }
    }

    fn variants(&mut self) -> [&mut dyn BlockProcessor; 5] {
        [
            &mut self.sizzle,
            &mut self.erosion,
            &mut self.gate,
            &mut self.downsample,
            &mut self.fizz,
        ]
    }
}

impl BlockProcessor for NoiseDistortion {
    fn prepare(&mut self, spec: &ProcessSpec) {
        for variant in self.variants() {
            variant.prepare(spec);
        }
        self.active = self.selected.value();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        let kind = self.selected.value();
        if kind != self.active {
            self.active = kind;
            self.variant(kind).reset();
        }
        self.variant(kind).process_block(block);
    }

    fn reset(&mut self) {
        for variant in self.variants() {
            variant.reset();
        }
    }
}
