//! Lock-free parameter targets shared between the host, the editor and the
//! audio thread.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ids::{
    BoolParamId, ChoiceParamId, FloatParamId, IntParamId, ParamKey, PARAM_COUNT,
};
use crate::error::{ConfigError, Result};

/// One atomic f32 (stored as bits) per parameter.
///
/// Every write goes through [`ParamKey::sanitize`], so a reader always sees an
/// in-range value. Toggles are stored as 0/1 and integers/choices as whole
/// numbers.
pub struct ParamStore {
    values: Box<[AtomicU32]>,
}

impl ParamStore {
    pub fn new() -> Self {
        let values = ParamKey::all()
            .map(|key| AtomicU32::new(key.default_value().to_bits()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        debug_assert_eq!(values.len(), PARAM_COUNT);
        Self { values }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Write a new target. Returns the value actually stored.
    pub fn set(&self, key: impl Into<ParamKey>, value: f32) -> f32 {
        let key = key.into();
        let value = key.sanitize(value);
        self.values[key.index()].store(value.to_bits(), Ordering::Relaxed);
        value
    }

    /// Write a new target by its string id.
    pub fn set_by_key(&self, key: &str, value: f32) -> Result<f32> {
        let key = ParamKey::from_key(key)?;
        Ok(self.set(key, value))
    }

    #[inline]
    pub fn get(&self, key: impl Into<ParamKey>) -> f32 {
        f32::from_bits(self.values[key.into().index()].load(Ordering::Relaxed))
    }

    pub fn get_by_key(&self, key: &str) -> Result<f32> {
        Ok(self.get(ParamKey::from_key(key)?))
    }

    #[inline]
    pub fn float(&self, id: FloatParamId) -> f32 {
        self.get(id)
    }

    #[inline]
    pub fn bool(&self, id: BoolParamId) -> bool {
        self.get(id) >= 0.5
    }

    #[inline]
    pub fn int(&self, id: IntParamId) -> i32 {
        self.get(id) as i32
    }

    #[inline]
    pub fn choice_index(&self, id: ChoiceParamId) -> usize {
        self.get(id) as usize
    }

    pub fn reset_to_defaults(&self) {
        for key in ParamKey::all() {
            self.set(key, key.default_value());
        }
    }

    /// Copy every value into a flat, serialisable map.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            values: ParamKey::all()
                .map(|key| (key.key().to_string(), self.get(key)))
                .collect(),
        }
    }

    /// Apply a snapshot. All ids are validated before anything is written, so
    /// an unknown id leaves the store untouched. Parameters missing from the
    /// snapshot keep their current value.
    pub fn restore(&self, snapshot: &ParamSnapshot) -> Result<()> {
        let resolved = snapshot
            .values
            .iter()
            .map(|(id, value)| ParamKey::from_key(id).map(|key| (key, *value)))
            .collect::<Result<Vec<_>>>()?;

        for (key, value) in resolved {
            self.set(key, value);
        }
        log::debug!("restored {} parameter values", snapshot.values.len());
        Ok(())
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat `id -> value` map of the whole parameter set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSnapshot {
    pub values: BTreeMap<String, f32>,
}

impl ParamSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(ConfigError::from)
    }
}
