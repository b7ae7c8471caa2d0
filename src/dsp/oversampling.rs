//! Cascaded 2x half-band oversampling.
//!
//! Each stage is a 31-tap linear-phase half-band FIR (Kaiser window, beta 8)
//! run in polyphase form. Only the 16 even taps are non-zero apart from the
//! centre tap (0.5), so the odd output phase of the interpolator is a pure
//! delay and the decimator needs one multiply per even tap.
//!
//! ```text
//! up:   y[2m]   = 2 * sum_t h[2t] * x[m - t]
//!       y[2m+1] = x[m - 7]
//! down: z[m]    = sum_t h[2t] * y[2(m - t)] + 0.5 * y[2(m - 8) + 1]
//! ```
//!
//! Both filters delay by 15 samples at the stage's higher rate, so each stage
//! costs 15 samples at its own input rate.

use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};

/// Highest supported factor exponent (x4).
pub const MAX_FACTOR: usize = 2;

const NUM_TAPS: usize = 31;
const EVEN_TAPS: usize = 16;
const CENTER: usize = NUM_TAPS / 2;
const KAISER_BETA: f64 = 8.0;

/// Group delay of one stage in samples at its input rate.
pub const STAGE_LATENCY: f32 = CENTER as f32;

fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let half = x * 0.5;
    for k in 1..64 {
        let r = half / k as f64;
        term *= r * r;
        sum += term;
        if term < 1e-14 * sum {
            break;
        }
    }
    sum
}

/// Even-indexed taps of the Kaiser half-band low-pass, normalised so they sum
/// to 0.5 (unity DC gain together with the 0.5 centre tap).
fn design_halfband() -> [f32; EVEN_TAPS] {
    let i0_beta = bessel_i0(KAISER_BETA);
    let mut taps = [0.0f64; EVEN_TAPS];

    for (t, tap) in taps.iter_mut().enumerate() {
        let offset = (2 * t) as f64 - CENTER as f64;
        let ideal = (std::f64::consts::PI * offset * 0.5).sin() / (std::f64::consts::PI * offset);
        let ratio = offset / CENTER as f64;
        let window = bessel_i0(KAISER_BETA * (1.0 - ratio * ratio).max(0.0).sqrt()) / i0_beta;
        *tap = ideal * window;
    }

    let sum: f64 = taps.iter().sum();
    let mut out = [0.0f32; EVEN_TAPS];
    for (o, t) in out.iter_mut().zip(taps.iter()) {
        *o = (t * 0.5 / sum) as f32;
    }
    out
}

/// History of one polyphase branch. Stored twice so the newest `EVEN_TAPS`
/// samples are always contiguous.
#[derive(Clone, Copy)]
struct History {
    buf: [f32; 2 * EVEN_TAPS],
    pos: usize,
}

impl History {
    const fn new() -> Self {
        Self {
            buf: [0.0; 2 * EVEN_TAPS],
            pos: 0,
        }
    }

    #[inline]
    fn push(&mut self, x: f32) {
        self.pos = (self.pos + EVEN_TAPS - 1) % EVEN_TAPS;
        self.buf[self.pos] = x;
        self.buf[self.pos + EVEN_TAPS] = x;
    }

    /// Sample pushed `age` pushes ago.
    #[inline]
    fn tap(&self, age: usize) -> f32 {
        self.buf[self.pos + age]
    }

    #[inline]
    fn dot(&self, coeffs: &[f32; EVEN_TAPS]) -> f32 {
        let window = &self.buf[self.pos..self.pos + EVEN_TAPS];
        window.iter().zip(coeffs.iter()).map(|(x, h)| x * h).sum()
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}

#[derive(Clone, Copy)]
struct StageState {
    up: History,
    down_even: History,
    down_odd: History,
}

impl StageState {
    const fn new() -> Self {
        Self {
            up: History::new(),
            down_even: History::new(),
            down_odd: History::new(),
        }
    }
}

pub struct OversamplingStack {
    factor: usize,
    coeffs: [f32; EVEN_TAPS],
    states: [[StageState; MAX_CHANNELS]; MAX_FACTOR],
    /// Level `k` holds `max_block << k` samples per channel.
    buffers: [Vec<Vec<f32>>; MAX_FACTOR + 1],
    num_channels: usize,
    max_block_size: usize,
}

impl OversamplingStack {
    pub fn new() -> Self {
        Self {
            factor: 0,
            coeffs: design_halfband(),
            states: [[StageState::new(); MAX_CHANNELS]; MAX_FACTOR],
            buffers: Default::default(),
            num_channels: 0,
            max_block_size: 0,
        }
    }

    /// Takes effect on the next `prepare`.
    pub fn set_factor(&mut self, factor: usize) {
        self.factor = factor.min(MAX_FACTOR);
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Allocates every level up to the current factor.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.num_channels = spec.num_channels.min(MAX_CHANNELS);
        self.max_block_size = spec.max_block_size;
        for (level, buffers) in self.buffers.iter_mut().enumerate() {
            let len = if level <= self.factor {
                spec.max_block_size << level
            } else {
                0
            };
            *buffers = vec![vec![0.0; len]; self.num_channels];
        }
        self.reset();
    }

    pub fn reset(&mut self) {
        for stage in self.states.iter_mut() {
            for state in stage.iter_mut() {
                state.up.clear();
                state.down_even.clear();
                state.down_odd.clear();
            }
        }
    }

    /// Latency in base-rate samples: 0, 15 or 22.5.
    pub fn latency_samples(&self) -> f32 {
        (0..self.factor)
            .map(|k| STAGE_LATENCY / (1 << k) as f32)
            .sum()
    }

    /// Upsample `input` into the stack's top-level buffer and return a view of
    /// it. The view must be handed back through `process_down`.
    pub fn process_up(&mut self, input: &AudioBlock) -> AudioBlock<'_> {
        let n = input.num_samples().min(self.max_block_size);
        let channels = input.num_channels().min(self.num_channels);

        for c in 0..channels {
            self.buffers[0][c][..n].copy_from_slice(&input.channel(c)[..n]);
        }

        for level in 0..self.factor {
            let len = n << level;
            let (lower, upper) = self.buffers.split_at_mut(level + 1);
            for c in 0..channels {
                let src = &lower[level][c][..len];
                let dst = &mut upper[0][c][..len * 2];
                let state = &mut self.states[level][c].up;
                for (m, &x) in src.iter().enumerate() {
                    state.push(x);
                    dst[2 * m] = 2.0 * state.dot(&self.coeffs);
                    dst[2 * m + 1] = state.tap(CENTER / 2);
                }
            }
        }

        AudioBlock::from_vecs(&mut self.buffers[self.factor][..channels], n << self.factor)
    }

    /// Decimate the top-level buffer back into `output`.
    pub fn process_down(&mut self, output: &mut AudioBlock) {
        let n = output.num_samples().min(self.max_block_size);
        let channels = output.num_channels().min(self.num_channels);

        for level in (0..self.factor).rev() {
            let len = n << level;
            let (lower, upper) = self.buffers.split_at_mut(level + 1);
            for c in 0..channels {
                let src = &upper[0][c][..len * 2];
                let dst = &mut lower[level][c][..len];
                let state = &mut self.states[level][c];
                for (m, y) in dst.iter_mut().enumerate() {
                    state.down_even.push(src[2 * m]);
                    state.down_odd.push(src[2 * m + 1]);
                    *y = state.down_even.dot(&self.coeffs)
                        + 0.5 * state.down_odd.tap(CENTER / 2 + 1);
                }
            }
        }

        for c in 0..channels {
            output.channel_mut(c)[..n].copy_from_slice(&self.buffers[0][c][..n]);
        }
    }
}

impl Default for OversamplingStack {
    fn default() -> Self {
        Self::new()
    }
}
