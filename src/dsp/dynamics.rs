//! Dynamics Engine
//!
//! Stereo, three-band and mid-side compression with a choice of static
//! curve. Everything runs per sample with no band buffers: the crossover
//! splits a sample, each band is detected and gained, and the bands are summed
//! back.
//!
//! # Detector
//! `link * max(|L|, |R|) + (1 - link) * |x|` feeds a peak follower with
//! attack = speed / 4 and release = speed. Mid-side bands are never linked.

use std::sync::Arc;

use crate::dsp::block::{AudioBlock, ProcessSpec, MAX_CHANNELS};
use crate::dsp::crossover::ThreeBandSplit;
use crate::dsp::curves;
use crate::dsp::envelope::PeakFollower;
use crate::dsp::utils::{db_to_gain, gain_to_db};
use crate::dsp::BlockProcessor;
use crate::params::{
    ChoiceValue, CompressionTopology, CurveKind, FloatParamId, ParamStore, SmoothedFloat,
};

/// Distance from the upper to the lower threshold in upward-downward mode.
const LOWER_THRESHOLD_OFFSET_DB: f32 = 12.0;

const NUM_BANDS: usize = 3;

// Upward gain ceiling, keeps near-silent input from being lifted into noise.
const MAX_BOOST_DB: f32 = 24.0;

#[derive(Clone, Copy)]
struct CurveParams {
    kind: CurveKind,
    ratio: f32,
    knee: f32,
}

impl CurveParams {
    #[inline]
    fn output_db(&self, level_db: f32, threshold: f32) -> f32 {
        match self.kind {
            CurveKind::Compressor => curves::compressor(level_db, threshold, self.ratio, self.knee),
            CurveKind::Expander => curves::expander(level_db, threshold, self.ratio, self.knee),
            CurveKind::UpwardDownward => curves::upward_downward(
                level_db,
                threshold,
                self.ratio,
                threshold - LOWER_THRESHOLD_OFFSET_DB,
                self.ratio,
                self.knee,
            ),
        }
    }
}

pub struct DynamicsEngine {
    topology: ChoiceValue<CompressionTopology>,
    curve: ChoiceValue<CurveKind>,

    speed: SmoothedFloat,
    band_tilt: SmoothedFloat,
    stereo_link: SmoothedFloat,
    ratio: SmoothedFloat,
    makeup: SmoothedFloat,
    knee: SmoothedFloat,
    stereo_threshold: SmoothedFloat,
    mb_threshold: SmoothedFloat,
    ms_threshold: SmoothedFloat,

    splits: [ThreeBandSplit; MAX_CHANNELS],
    followers: [[PeakFollower; MAX_CHANNELS]; NUM_BANDS],
    gain_reduction_db: [f32; NUM_BANDS],

    sample_rate: f32,
    speed_generation: u32,
    last_topology: Option<CompressionTopology>,
}

impl DynamicsEngine {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        Self {
            topology: ChoiceValue::new(store),
            curve: ChoiceValue::new(store),
            speed: SmoothedFloat::new(store, FloatParamId::CompSpeed),
            band_tilt: SmoothedFloat::new(store, FloatParamId::CompBandTilt),
            stereo_link: SmoothedFloat::new(store, FloatParamId::CompStereoLink),
            ratio: SmoothedFloat::new(store, FloatParamId::CompRatio),
            makeup: SmoothedFloat::new(store, FloatParamId::CompOut),
            knee: SmoothedFloat::new(store, FloatParamId::CompKnee),
            stereo_threshold: SmoothedFloat::new(store, FloatParamId::StereoCompThreshold),
            mb_threshold: SmoothedFloat::new(store, FloatParamId::MbCompThreshold),
            ms_threshold: SmoothedFloat::new(store, FloatParamId::MsCompThreshold),
            splits: Default::default(),
            followers: Default::default(),
            gain_reduction_db: [0.0; NUM_BANDS],
            sample_rate: 44100.0,
            speed_generation: u32::MAX,
            last_topology: None,
        }
    }

    /// Most recent gain change per band in dB (negative is reduction).
    /// Stereo uses band 0, mid-side uses bands 0 (mid) and 1 (side).
    pub fn gain_reduction_db(&self) -> [f32; NUM_BANDS] {
        self.gain_reduction_db
    }

    fn update_times(&mut self) {
        if self.speed.generation() == self.speed_generation {
            return;
        }
        self.speed_generation = self.speed.generation();
        let release = self.speed.value();
        let attack = release * 0.25;
        for band in self.followers.iter_mut() {
            for follower in band.iter_mut() {
                follower.set_times(attack, release, self.sample_rate);
            }
        }
    }

    fn smoothed_mut(&mut self) -> [&mut SmoothedFloat; 8] {
        [
            &mut self.band_tilt,
            &mut self.stereo_link,
            &mut self.ratio,
            &mut self.makeup,
            &mut self.knee,
            &mut self.stereo_threshold,
            &mut self.mb_threshold,
            &mut self.ms_threshold,
        ]
    }

    fn process_stereo(&mut self, block: &mut AudioBlock, kind: CurveKind) {
        let n = block.num_samples();
        let (left, mut right) = block.pair_mut();
        let mut gr = 0.0;

        for i in 0..n {
            let threshold = self.stereo_threshold.next();
            let link = self.stereo_link.next() * 0.01;
            let makeup = self.makeup.next();
            let curve = CurveParams {
                kind,
                ratio: self.ratio.next(),
                knee: self.knee.next(),
            };

            let l = left[i];
            let r = right.as_deref().map_or(l, |r| r[i]);
            let peak = l.abs().max(r.abs());

            let gain_l = band_gain(&mut self.followers[0][0], l, peak, link, threshold, &curve);
            left[i] = l * db_to_gain(gain_l + makeup);
            gr = gain_l;

            if let Some(right) = right.as_deref_mut() {
                let gain_r =
                    band_gain(&mut self.followers[0][1], r, peak, link, threshold, &curve);
                right[i] = r * db_to_gain(gain_r + makeup);
                gr = gr.min(gain_r);
            }
        }
        self.gain_reduction_db = [gr, 0.0, 0.0];
    }

    fn process_multiband(&mut self, block: &mut AudioBlock, kind: CurveKind) {
        let n = block.num_samples();
        let (left, mut right) = block.pair_mut();
        let mut gr = [0.0f32; NUM_BANDS];

        for i in 0..n {
            let threshold = self.mb_threshold.next();
            let tilt = self.band_tilt.next() * 0.5;
            let thresholds = [threshold - tilt, threshold, threshold + tilt];
            let link = self.stereo_link.next() * 0.01;
            let makeup = db_to_gain(self.makeup.next());
            let curve = CurveParams {
                kind,
                ratio: self.ratio.next(),
                knee: self.knee.next(),
            };

            let l = self.splits[0].split(left[i]);
            let r = match right.as_deref() {
                Some(right) => self.splits[1].split(right[i]),
                None => l,
            };
            let lb = [l.low, l.mid, l.high];
            let rb = [r.low, r.mid, r.high];

            let mut out_l = 0.0;
            let mut out_r = 0.0;
            for b in 0..NUM_BANDS {
                let peak = lb[b].abs().max(rb[b].abs());
                let g_l = band_gain(
                    &mut self.followers[b][0],
                    lb[b],
                    peak,
                    link,
                    thresholds[b],
                    &curve,
                );
                out_l += lb[b] * db_to_gain(g_l);
                gr[b] = g_l;

                if right.is_some() {
                    let g_r = band_gain(
                        &mut self.followers[b][1],
                        rb[b],
                        peak,
                        link,
                        thresholds[b],
                        &curve,
                    );
                    out_r += rb[b] * db_to_gain(g_r);
                    gr[b] = gr[b].min(g_r);
                }
            }

            left[i] = out_l * makeup;
            if let Some(right) = right.as_deref_mut() {
                right[i] = out_r * makeup;
            }
        }
        self.gain_reduction_db = gr;
    }

    fn process_mid_side(&mut self, block: &mut AudioBlock, kind: CurveKind) {
        let n = block.num_samples();
        let Some((left, right)) = block.stereo_mut() else {
            return;
        };
        let mut gr = [0.0f32; NUM_BANDS];

        for i in 0..n {
            let threshold = self.ms_threshold.next();
            let makeup = db_to_gain(self.makeup.next());
            let curve = CurveParams {
                kind,
                ratio: self.ratio.next(),
                knee: self.knee.next(),
            };

            let mid = (left[i] + right[i]) * 0.5;
            let side = (left[i] - right[i]) * 0.5;

            let g_mid = band_gain(&mut self.followers[0][0], mid, 0.0, 0.0, threshold, &curve);
            let g_side = band_gain(&mut self.followers[1][0], side, 0.0, 0.0, threshold, &curve);
            let mid = mid * db_to_gain(g_mid);
            let side = side * db_to_gain(g_side);

            left[i] = (mid + side) * makeup;
            right[i] = (mid - side) * makeup;
            gr = [g_mid, g_side, 0.0];
        }
        self.gain_reduction_db = gr;
    }
}

/// Detect one band/channel and return its curve gain in dB.
#[inline]
fn band_gain(
    follower: &mut PeakFollower,
    x: f32,
    linked_peak: f32,
    link: f32,
    threshold: f32,
    curve: &CurveParams,
) -> f32 {
    let detector = link * linked_peak + (1.0 - link) * x.abs();
    let level_db = gain_to_db(follower.process(detector));
    (curve.output_db(level_db, threshold) - level_db).min(MAX_BOOST_DB)
}

impl BlockProcessor for DynamicsEngine {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.speed.prepare(spec.sample_rate);
        for p in self.smoothed_mut() {
            p.prepare(spec.sample_rate);
        }
        for split in self.splits.iter_mut() {
            split.prepare(spec.sample_rate);
        }
        self.speed_generation = u32::MAX;
        self.update_times();
        self.reset();
    }

    fn process_block(&mut self, block: &mut AudioBlock) {
        let topology = self.topology.value();
        if self.last_topology != Some(topology) {
            if self.last_topology.is_some() {
                self.reset();
            }
            self.last_topology = Some(topology);
        }

        self.speed.update();
        self.speed.skip(block.num_samples());
        self.update_times();
        for p in self.smoothed_mut() {
            p.update();
        }

        let kind = self.curve.value();
        match topology {
            CompressionTopology::Multiband => self.process_multiband(block, kind),
            CompressionTopology::MidSide if block.num_channels() == 2 => {
                self.process_mid_side(block, kind)
            }
            _ => self.process_stereo(block, kind),
        }
    }

    fn reset(&mut self) {
        for split in self.splits.iter_mut() {
            split.reset();
        }
        for band in self.followers.iter_mut() {
            for follower in band.iter_mut() {
                follower.reset();
            }
        }
        self.gain_reduction_db = [0.0; NUM_BANDS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ChoiceParamId;

    fn engine(store: &Arc<ParamStore>, channels: usize) -> DynamicsEngine {
        let mut dyn_engine = DynamicsEngine::new(store);
        dyn_engine.prepare(&ProcessSpec {
            sample_rate: 48000.0,
            max_block_size: 256,
            num_channels: channels,
        });
        dyn_engine
    }

    fn sine(freq: f32, amp: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / 48000.0).sin())
            .collect()
    }

    fn run(engine: &mut DynamicsEngine, bufs: &mut [Vec<f32>]) {
        let len = bufs[0].len();
        let mut start = 0;
        while start < len {
            let n = (len - start).min(256);
            let mut chunk: Vec<Vec<f32>> = bufs.iter().map(|b| b[start..start + n].to_vec()).collect();
            engine.process_block(&mut AudioBlock::from_vecs(&mut chunk, n));
            for (b, c) in bufs.iter_mut().zip(chunk.iter()) {
                b[start..start + n].copy_from_slice(c);
            }
            start += n;
        }
    }

    #[test]
    fn test_multiband_unity_reconstructs_input() {
        let store = ParamStore::shared();
        store.set(ChoiceParamId::CompressionType, 1.0);
        store.set(FloatParamId::CompRatio, 1.0);
        let mut e = engine(&store, 2);

        let input_l = sine(300.0, 0.8, 4800);
        let input_r = sine(3000.0, 0.5, 4800);
        let mut bufs = vec![input_l.clone(), input_r.clone()];
        run(&mut e, &mut bufs);

        for i in 0..4800 {
            assert!((bufs[0][i] - input_l[i]).abs() < 1e-4);
            assert!((bufs[1][i] - input_r[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_compressor_reduces_loud_signal() {
        let store = ParamStore::shared();
        store.set(FloatParamId::StereoCompThreshold, -30.0);
        store.set(FloatParamId::CompRatio, 4.0);
        store.set(FloatParamId::CompSpeed, 10.0);
        let mut e = engine(&store, 2);

        let mut bufs = vec![sine(1000.0, 1.0, 9600), sine(1000.0, 1.0, 9600)];
        run(&mut e, &mut bufs);

        let peak = bufs[0][4800..].iter().fold(0.0f32, |a, v| a.max(v.abs()));
        assert!(peak < 0.3, "peak {peak}");
        assert!(e.gain_reduction_db()[0] < -10.0);
    }

    #[test]
    fn test_stereo_link_applies_same_gain() {
        let store = ParamStore::shared();
        store.set(FloatParamId::StereoCompThreshold, -30.0);
        store.set(FloatParamId::CompStereoLink, 100.0);
        let mut e = engine(&store, 2);

        let loud = sine(1000.0, 1.0, 4800);
        let quiet: Vec<f32> = loud.iter().map(|x| x * 0.1).collect();
        let mut bufs = vec![loud.clone(), quiet.clone()];
        run(&mut e, &mut bufs);

        for i in (2400..4800).step_by(7) {
            if loud[i].abs() > 0.1 {
                let gl = bufs[0][i] / loud[i];
                let gr = bufs[1][i] / quiet[i];
                assert!((gl - gr).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_expander_attenuates_quiet_signal() {
        let store = ParamStore::shared();
        store.set(ChoiceParamId::CompressionCurve, 1.0);
        store.set(FloatParamId::StereoCompThreshold, -20.0);
        store.set(FloatParamId::CompRatio, 3.0);
        let mut e = engine(&store, 1);

        let mut bufs = vec![sine(1000.0, 0.01, 9600)];
        run(&mut e, &mut bufs);
        let peak = bufs[0][4800..].iter().fold(0.0f32, |a, v| a.max(v.abs()));
        assert!(peak < 0.005);
    }

    #[test]
    fn test_mid_side_keeps_mono_centre_centred() {
        let store = ParamStore::shared();
        store.set(ChoiceParamId::CompressionType, 2.0);
        store.set(FloatParamId::MsCompThreshold, -30.0);
        let mut e = engine(&store, 2);

        let s = sine(500.0, 0.9, 4800);
        let mut bufs = vec![s.clone(), s];
        run(&mut e, &mut bufs);
        for i in 0..4800 {
            assert!((bufs[0][i] - bufs[1][i]).abs() < 1e-6);
            assert!(bufs[0][i].is_finite());
        }
    }

    #[test]
    fn test_upward_downward_lifts_quiet_signal() {
        let store = ParamStore::shared();
        store.set(ChoiceParamId::CompressionCurve, 2.0);
        store.set(FloatParamId::StereoCompThreshold, -10.0);
        store.set(FloatParamId::CompRatio, 4.0);
        let mut e = engine(&store, 1);

        let mut bufs = vec![sine(1000.0, 0.01, 9600)];
        run(&mut e, &mut bufs);
        let peak = bufs[0][4800..].iter().fold(0.0f32, |a, v| a.max(v.abs()));
        assert!(peak > 0.02);
    }
}
