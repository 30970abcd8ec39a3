//! Checkpoint save/load utilities
//!
//! Checkpoints are files of named tensors. The format follows the extension:
//! `.safetensors`, `.npz`, or the libtorch archive written by
//! `VarStore::save` for anything else. Keys from Chainer npz archives
//! (`l0z/W`, `bn0l/avg_mean`, ...) are translated to the names used here
//! (`l0z.weight`, `bn0l.running_mean`, ...).
//!
//! Loading validates every parameter and running statistic of the target
//! variable store before a single value is copied.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tch::{nn::VarStore, Kind, Tensor};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Checkpoint metadata stored next to the weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Which network the weights belong to ("generator" or "discriminator")
    pub network: String,
    /// Latent dimension of the generator
    pub latent_dim: i64,
    /// ELU coefficient of the discriminator
    pub elu_alpha: f64,
    /// Timestamp of checkpoint
    pub timestamp: String,
}

impl CheckpointMeta {
    pub fn new(network: &str, latent_dim: i64, elu_alpha: f64) -> Self {
        Self {
            network: network.to_string(),
            latent_dim,
            elu_alpha,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Check a stored sidecar against the model it is loaded into.
    ///
    /// Generators must agree on `latent_dim`, discriminators on `elu_alpha`.
    /// A sidecar labelled with another network only triggers a warning; the
    /// parameter check rejects such files anyway.
    pub fn check_compatible(&self, expected: &CheckpointMeta) -> Result<()> {
        if self.network != expected.network {
            warn!(
                "checkpoint is labelled as a {} checkpoint, loading it as a {}",
                self.network, expected.network
            );
        }

        match expected.network.as_str() {
            "generator" if self.latent_dim != expected.latent_dim => Err(Error::LatentDimMismatch {
                expected: expected.latent_dim,
                actual: self.latent_dim,
            }),
            "discriminator" if (self.elu_alpha - expected.elu_alpha).abs() > 1e-9 => {
                Err(Error::EluAlphaMismatch {
                    expected: expected.elu_alpha,
                    actual: self.elu_alpha,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Path of the metadata sidecar: the weights path with `.json` appended.
pub fn meta_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Translate a stored tensor name to the variable store naming.
///
/// Returns `None` for entries that carry no model state.
pub fn normalize_name(raw: &str) -> Option<String> {
    let raw = raw.trim_start_matches('/');
    let Some((layer, param)) = raw.rsplit_once('/') else {
        return Some(raw.to_string());
    };

    let param = match param {
        "W" | "gamma" => "weight",
        "b" | "beta" => "bias",
        "avg_mean" => "running_mean",
        "avg_var" => "running_var",
        // batch counter
        "N" => return None,
        other => other,
    };
    Some(format!("{}.{}", layer.replace('/', "."), param))
}

/// Read every tensor of a checkpoint, with normalized names.
pub fn read_named_tensors<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Tensor)>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("checkpoint {} does not exist", path.display()),
        )));
    }

    let raw = match extension(path) {
        Some("safetensors") => Tensor::read_safetensors(path)?,
        Some("npz") => Tensor::read_npz(path)?,
        _ => Tensor::load_multi(path)?,
    };

    Ok(raw
        .into_iter()
        .filter_map(|(name, tensor)| normalize_name(&name).map(|n| (n, tensor)))
        .collect())
}

/// List tensor names and shapes of a checkpoint, sorted by name.
pub fn inspect_checkpoint<P: AsRef<Path>>(path: P) -> Result<Vec<(String, Vec<i64>)>> {
    let mut entries: Vec<_> = read_named_tensors(path)?
        .into_iter()
        .map(|(name, tensor)| (name, tensor.size()))
        .collect();
    entries.sort();
    Ok(entries)
}

/// Save all variables of a store, plus a metadata sidecar.
pub fn save_checkpoint<P: AsRef<Path>>(vs: &VarStore, meta: &CheckpointMeta, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut named: Vec<(String, Tensor)> = vs.variables().into_iter().collect();
    named.sort_by(|a, b| a.0.cmp(&b.0));

    match extension(path) {
        Some("safetensors") => Tensor::write_safetensors(&named, path)?,
        Some("npz") => Tensor::write_npz(&named, path)?,
        _ => Tensor::save_multi(&named, path)?,
    }

    std::fs::write(meta_path(path), serde_json::to_string_pretty(meta)?)?;

    info!("Saved {} checkpoint to {}", meta.network, path.display());
    Ok(())
}

/// Load checkpoint metadata if the sidecar exists
pub fn load_checkpoint_meta<P: AsRef<Path>>(path: P) -> Result<Option<CheckpointMeta>> {
    let meta_path = meta_path(path);
    if !meta_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&meta_path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Load a checkpoint into a variable store
///
/// Every variable of the store must be present in the file with exactly the
/// same shape. Extra entries in the file are ignored with a warning.
///
/// # Returns
///
/// The metadata sidecar, when one exists
pub fn load_checkpoint<P: AsRef<Path>>(vs: &mut VarStore, path: P) -> Result<Option<CheckpointMeta>> {
    let path = path.as_ref();
    let stored: HashMap<String, Tensor> = read_named_tensors(path)?.into_iter().collect();
    let variables = vs.variables();

    let mut names: Vec<&String> = variables.keys().collect();
    names.sort();

    for name in &names {
        let expected = variables[*name].size();
        match stored.get(*name) {
            None => {
                return Err(Error::MissingParameter {
                    path: path.display().to_string(),
                    name: name.to_string(),
                })
            }
            Some(found) if found.size() != expected => {
                return Err(Error::ParameterShape {
                    name: name.to_string(),
                    expected,
                    found: found.size(),
                })
            }
            Some(_) => {}
        }
    }

    let unused = stored.keys().filter(|k| !variables.contains_key(*k)).count();
    if unused > 0 {
        warn!("{} tensors in {} do not belong to the model", unused, path.display());
    }

    tch::no_grad(|| -> Result<()> {
        for name in &names {
            let mut var = variables[*name].shallow_clone();
            let src = stored[*name].to_kind(Kind::Float).to_device(var.device());
            var.f_copy_(&src)?;
        }
        Ok(())
    })?;

    debug!("Copied {} tensors from {}", names.len(), path.display());
    load_checkpoint_meta(path)
}

/// Load a checkpoint whose sidecar, if present, must fit `expected`.
///
/// The sidecar is checked before any weight is read.
pub fn load_network_checkpoint<P: AsRef<Path>>(
    vs: &mut VarStore,
    path: P,
    expected: &CheckpointMeta,
) -> Result<Option<CheckpointMeta>> {
    let path = path.as_ref();
    if let Some(meta) = load_checkpoint_meta(path)? {
        meta.check_compatible(expected)?;
    }
    load_checkpoint(vs, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Generator, GeneratorConfig};
    use tch::{nn, Device};

    fn generator_store(latent_dim: i64) -> VarStore {
        let vs = VarStore::new(Device::Cpu);
        let config = GeneratorConfig {
            latent_dim,
            ..Default::default()
        };
        let _gen = Generator::new(&vs.root(), config);
        vs
    }

    #[test]
    fn test_normalize_chainer_names() {
        assert_eq!(normalize_name("l0z/W").as_deref(), Some("l0z.weight"));
        assert_eq!(normalize_name("dc1/b").as_deref(), Some("dc1.bias"));
        assert_eq!(normalize_name("bn0l/gamma").as_deref(), Some("bn0l.weight"));
        assert_eq!(normalize_name("bn0l/beta").as_deref(), Some("bn0l.bias"));
        assert_eq!(normalize_name("bn1/avg_mean").as_deref(), Some("bn1.running_mean"));
        assert_eq!(normalize_name("bn1/avg_var").as_deref(), Some("bn1.running_var"));
        assert_eq!(normalize_name("bn1/N"), None);
        assert_eq!(normalize_name("dc1.weight").as_deref(), Some("dc1.weight"));
    }

    #[test]
    fn test_checkpoint_roundtrip_with_meta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator.ot");

        tch::manual_seed(3);
        let source = generator_store(100);
        let meta = CheckpointMeta::new("generator", 100, 1.0);
        save_checkpoint(&source, &meta, &path).unwrap();

        tch::manual_seed(4);
        let mut target = generator_store(100);
        let loaded_meta = load_checkpoint(&mut target, &path).unwrap();

        assert_eq!(loaded_meta, Some(meta));
        let a = &source.variables()["dc2.weight"];
        let b = &target.variables()["dc2.weight"];
        assert!(a.equal(b));
    }

    #[test]
    fn test_missing_parameter_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.ot");

        let source = generator_store(100);
        let partial: Vec<(String, Tensor)> = source
            .variables()
            .into_iter()
            .filter(|(name, _)| !name.starts_with("bn3"))
            .collect();
        Tensor::save_multi(&partial, &path).unwrap();

        let mut target = generator_store(100);
        let err = load_checkpoint(&mut target, &path).unwrap_err();
        match err {
            Error::MissingParameter { name, .. } => assert!(name.starts_with("bn3.")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected_before_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small_latent.safetensors");

        let source = generator_store(64);
        save_checkpoint(&source, &CheckpointMeta::new("generator", 64, 1.0), &path).unwrap();

        let mut target = generator_store(100);
        let before = target.variables()["dc1.weight"].copy();
        let err = load_checkpoint(&mut target, &path).unwrap_err();

        assert!(err.is_checkpoint_mismatch());
        assert!(matches!(err, Error::ParameterShape { ref name, .. } if name == "l0z.weight"));
        assert!(before.equal(&target.variables()["dc1.weight"]));
    }

    #[test]
    fn test_loads_chainer_npz_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chainer.npz");

        let weight = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).view([2, 3]);
        let bias = Tensor::from_slice(&[0.5f32, -0.5]);
        let counter = Tensor::from_slice(&[10i64]);
        Tensor::write_npz(
            &[("l0z/W", &weight), ("l0z/b", &bias), ("l0z/N", &counter)],
            &path,
        )
        .unwrap();

        let mut vs = VarStore::new(Device::Cpu);
        let _linear = nn::linear(vs.root() / "l0z", 3, 2, Default::default());
        let meta = load_checkpoint(&mut vs, &path).unwrap();

        assert!(meta.is_none());
        assert!(vs.variables()["l0z.weight"].equal(&weight));
        assert!(vs.variables()["l0z.bias"].equal(&bias));
    }

    #[test]
    fn test_sidecar_must_fit_the_network() {
        let stored = CheckpointMeta::new("generator", 64, 1.0);
        assert!(matches!(
            stored.check_compatible(&CheckpointMeta::new("generator", 100, 1.0)),
            Err(Error::LatentDimMismatch { expected: 100, actual: 64 })
        ));

        let stored = CheckpointMeta::new("discriminator", 100, 0.5);
        assert!(matches!(
            stored.check_compatible(&CheckpointMeta::new("discriminator", 100, 1.0)),
            Err(Error::EluAlphaMismatch { .. })
        ));
        // the pair's latent size does not constrain the discriminator
        assert!(stored
            .check_compatible(&CheckpointMeta::new("discriminator", 64, 0.5))
            .is_ok());
    }

    #[test]
    fn test_sidecar_mismatch_rejected_before_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator.ot");

        let source = generator_store(100);
        save_checkpoint(&source, &CheckpointMeta::new("generator", 100, 1.0), &path).unwrap();
        let mut meta = load_checkpoint_meta(&path).unwrap().unwrap();
        meta.latent_dim = 32;
        std::fs::write(meta_path(&path), serde_json::to_string(&meta).unwrap()).unwrap();

        let mut target = generator_store(100);
        let before = target.variables()["l0z.weight"].copy();
        let expected = CheckpointMeta::new("generator", 100, 1.0);
        let err = load_network_checkpoint(&mut target, &path, &expected).unwrap_err();

        assert!(matches!(err, Error::LatentDimMismatch { expected: 100, actual: 32 }));
        assert!(before.equal(&target.variables()["l0z.weight"]));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut vs = generator_store(100);
        let err = load_checkpoint(&mut vs, "/nonexistent/generator.ot").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_inspect_lists_sorted_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generator.ot");
        save_checkpoint(&generator_store(100), &CheckpointMeta::new("generator", 100, 1.0), &path)
            .unwrap();

        let entries = inspect_checkpoint(&path).unwrap();
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();

        assert_eq!(names, sorted);
        assert!(entries.contains(&("l0z.weight".to_string(), vec![18432, 100])));
    }
}
