//! Steady-state processing must not touch the allocator. A factor change
//! may allocate, but only inside the pipeline's own permit.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};
use scorch::dsp::AudioBlock;
use scorch::params::{BoolParamId, ChoiceParamId, IntParamId};
use scorch::{ParamStore, Pipeline};

#[global_allocator]
static A: AllocDisabler = AllocDisabler;

const BLOCK: usize = 128;

#[test]
fn steady_state_process_does_not_allocate() {
    let store = ParamStore::shared();
    for id in BoolParamId::ALL {
        store.set(id, 1.0);
    }
    store.set(ChoiceParamId::CompressionType, 1.0);
    store.set(ChoiceParamId::NoiseDistortionType, 1.0);
    store.set(IntParamId::OversamplingFactor, 1.0);

    let mut pipeline = Pipeline::new(store.clone(), None);
    pipeline.prepare(44100.0, BLOCK, 2).unwrap();

    let mut left: Vec<f32> = (0..BLOCK).map(|i| (i as f32 * 0.05).sin()).collect();
    let mut right = left.clone();

    for round in 0..12 {
        // Variant switches are plain state changes on the audio thread.
        store.set(ChoiceParamId::PrimaryDistortionType, (round % 6) as f32);
        store.set(ChoiceParamId::NoiseDistortionType, (round % 5) as f32);
        store.set(ChoiceParamId::PreDistortionType, (round % 2) as f32);
        store.set(ChoiceParamId::CompressionType, (round % 3) as f32);

        assert_no_alloc(|| {
            let mut channels = [left.as_mut_slice(), right.as_mut_slice()];
            pipeline.process(&mut AudioBlock::new(&mut channels));
        });
    }
}

#[test]
fn factor_change_is_permitted_to_allocate() {
    let store = ParamStore::shared();
    let mut pipeline = Pipeline::new(store.clone(), None);
    pipeline.prepare(48000.0, BLOCK, 1).unwrap();

    let mut mono = vec![0.25f32; BLOCK];
    store.set(IntParamId::OversamplingFactor, 2.0);
    assert_no_alloc(|| {
        let mut channels = [mono.as_mut_slice()];
        pipeline.process(&mut AudioBlock::new(&mut channels));
    });
    assert_eq!(pipeline.oversampling_factor(), 2);
}
