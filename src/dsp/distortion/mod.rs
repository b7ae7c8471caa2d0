//! Primary distortion variants and the dispatcher that runs one of them.

pub mod classic;
pub mod cooked;
pub mod hard_clip;
pub mod phase;
pub mod rubidium;
pub mod shapers;
pub mod soft_clip;
pub mod tube;

use std::sync::Arc;

pub use classic::Classic;
pub use cooked::Cooked;
pub use hard_clip::HardClip;
pub use phase::Phase;
pub use rubidium::Rubidium;
pub use soft_clip::SoftClip;
pub use tube::Tube;

use crate::dsp::block::{AudioBlock, ProcessSpec};
use crate::dsp::BlockProcessor;
use crate::params::{ChoiceValue, DistortionType, ParamStore};

/// Owns every variant so switching never allocates. A variant's state is
/// cleared when it becomes active again.
pub struct PrimaryDistortion {
    selected: ChoiceValue<DistortionType>,
    active: DistortionType,
    classic: Classic,
    tube: Tube,
    phase: Phase,
    rubidium: Rubidium,
    cooked: Cooked,
    hard_clip: HardClip,
}

impl PrimaryDistortion {
    pub fn new(store: &Arc<ParamStore>) -> Self {
        let selected = ChoiceValue::new(store);
        let active = selected.value();
        Self {
            selected,
            active,
            classic: Classic::new(store),
            tube: Tube::new(store),
            phase: Phase::new(store),
            rubidium: Rubidium::new(store),
            cooked: Cooked::new(store),
            hard_clip: HardClip::new(store),
        }
    }

    pub fn active(&self) -> DistortionType {
        self.active
    }

    fn variant(&mut self, kind: DistortionType) -> &mut dyn BlockProcessor {
        match kind {
            DistortionType::Classic => &mut self.classic,
            DistortionType::Tube => &mut self.tube,
            DistortionType::Phase => &mut self.phase,
            DistortionType::Rubidium => &mut self.rubidium,
            DistortionType::Cooked => &mut self.cooked,
            DistortionType::HardClip => &mut self.hard_clip,
        }
    }

    fn variants(&mut self) -> [&mut dyn BlockProcessor; 6] {
        [
            &mut self.classic,
            &mut self.tube,
            &mut self.phase,
            &mut self.rubidium,
            &mut self.cooked,
            &mut self.hard_clip,
        ]
    }
}

impl BlockProcessor for PrimaryDistortion {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Choice, FloatParamId};

    fn extremes(store: &ParamStore) {
        for id in FloatParamId::ALL {
            store.set(id, id.descriptor().range.max());
        }
    }

    #[test]
    fn test_every_variant_stays_finite_at_extremes() {
        let spec = ProcessSpec {
            sample_rate: 96000.0,
            max_block_size: 256,
            num_channels: 2,
        };
        for index in 0..6 {
            let store = ParamStore::shared();
            extremes(&store);
            store.set(DistortionType::PARAM, index as f32);

            let mut dist = PrimaryDistortion::new(&store);
            dist.prepare(&spec);
            assert_eq!(dist.active(), DistortionType::from_option(index));

            for round in 0..8 {
                let mut bufs = vec![vec![0.0f32; 256], vec![0.0f32; 256]];
                if round == 0 {
                    bufs[0][0] = 1.0;
                    bufs[1][0] = -1.0;
                } else {
                    for (i, s) in bufs[0].iter_mut().enumerate() {
                        *s = ((round * 256 + i) as f32 * 0.013).sin();
                    }
                    bufs[1].copy_from_slice(&bufs[0]);
                }
                dist.process_block(&mut AudioBlock::from_vecs(&mut bufs, 256));
                for b in &bufs {
                    assert!(b.iter().all(|x| x.is_finite()), "variant {index}");
                }
            }
        }
    }

    #[test]
    fn test_switch_follows_choice() {
        let store = ParamStore::shared();
        let mut dist = PrimaryDistortion::new(&store);
        dist.prepare(&ProcessSpec {
            sample_rate: 48000.0,
            max_block_size: 16,
            num_channels: 1,
        });
        assert_eq!(dist.active(), DistortionType::Classic);

        // Hard clip gain is 0 dB here, so the clamp alone must hold 1.5 at 1.
        store.set(DistortionType::PARAM, 5.0);
        let mut bufs = vec![vec![1.5f32; 16]];
        dist.process_block(&mut AudioBlock::from_vecs(&mut bufs, 16));
        assert_eq!(dist.active(), DistortionType::HardClip);
        assert!(bufs[0].iter().all(|&x| x == 1.0));
    }
}
