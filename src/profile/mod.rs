use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    errors::{SynthError, SynthResult},
    registry::{check_weight, Registry},
    synth::Sampler,
    term::NodeKind,
};

/// Node-kind and operation weights, persisted between runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub kinds: Vec<(NodeKind, f64)>,
    pub operations: Vec<(String, f64)>,
}

impl WeightProfile {
    pub fn capture(sampler: &Sampler, registry: &Registry) -> WeightProfile {
        let kinds = sampler.weights().collect();
        let mut operations: Vec<(String, f64)> = vec![];
        for (op, weight) in registry.operations() {
            if !operations.iter().any(|(name, _)| name == op.name()) {
                operations.push((op.name().to_string(), weight));
            }
        }

        WeightProfile { kinds, operations }
    }

    /// Applies every weight of the profile. Nothing is applied unless every
    /// weight is valid.
    pub fn apply(&self, sampler: &mut Sampler, registry: &mut Registry) -> SynthResult {
        for (kind, weight) in self.kinds.iter() {
            check_weight(*weight, kind)?;
        }
        for (name, weight) in self.operations.iter() {
            check_weight(*weight, name)?;
            if registry.operation_weight(name).is_none() {
                return Err(SynthError::config(format!(
                    "profile names unknown operation `{}`",
                    name
                )));
            }
        }

        for (kind, weight) in self.kinds.iter() {
            sampler.set_weight(*kind, *weight)?;
        }
        for (name, weight) in self.operations.iter() {
            registry.set_operation_weight(name, *weight)?;
        }

        log::debug!(
            "applied {} kind weight(s) and {} operation weight(s)",
            self.kinds.len(),
            self.operations.len()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SynthResult<WeightProfile> {
        let path = path.as_ref();
        match bincode::deserialize_from(fs::File::open(path)?) {
            Ok(profile) => Ok(profile),
            Err(e) => Err(SynthError::config(format!(
                "failed loading weight profile {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> SynthResult {
        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
