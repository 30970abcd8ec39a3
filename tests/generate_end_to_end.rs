use rust_dcgan_images::generation::{self, GenerateRequest};
use rust_dcgan_images::utils::{inspect_checkpoint, Config};
use rust_dcgan_images::{Dcgan, Error};
use tch::Device;

fn write_checkpoints(dir: &std::path::Path) -> std::path::PathBuf {
    tch::manual_seed(7);
    let dcgan = Dcgan::with_defaults(Device::Cpu);
    let gen_path = dir.join("generator.ot");
    dcgan
        .save(&gen_path, &dir.join("discriminator.ot"))
        .unwrap();
    gen_path
}

#[test]
fn generates_default_grid_from_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_checkpoints(dir.path());
    let out = dir.path().join("out.png");

    let config = Config::default();
    let mut request = GenerateRequest::from_config(&model, &config);
    request.output = out.clone();
    request.seed = Some(3);

    let grid = generation::run(&request, &config, Device::Cpu).unwrap();

    // 5x5 cells of 96 pixels with 2 pixel padding
    let side = 5 * 96 + 6 * 2;
    assert_eq!(grid.dimensions(), (side, side));

    let written = image::open(&out).unwrap().to_rgb8();
    assert_eq!(written.dimensions(), (side, side));
}

#[test]
fn seeded_runs_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_checkpoints(dir.path());
    let config = Config::default();

    let request = GenerateRequest {
        model,
        num_images: 4,
        output: dir.path().join("a.png"),
        seed: Some(42),
    };
    let a = generation::run(&request, &config, Device::Cpu).unwrap();

    let request = GenerateRequest {
        output: dir.path().join("b.png"),
        ..request
    };
    let b = generation::run(&request, &config, Device::Cpu).unwrap();

    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn missing_model_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.png");
    let request = GenerateRequest {
        model: dir.path().join("missing.ot"),
        num_images: 25,
        output: out.clone(),
        seed: None,
    };

    let err = generation::run(&request, &Config::default(), Device::Cpu).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(!out.exists());
}

#[test]
fn discriminator_checkpoint_is_rejected_as_generator() {
    let dir = tempfile::tempdir().unwrap();
    write_checkpoints(dir.path());
    let out = dir.path().join("out.png");
    let request = GenerateRequest {
        model: dir.path().join("discriminator.ot"),
        num_images: 2,
        output: out.clone(),
        seed: Some(1),
    };

    let err = generation::run(&request, &Config::default(), Device::Cpu).unwrap_err();
    assert!(err.is_checkpoint_mismatch());
    assert!(!out.exists());
}

#[test]
fn saved_generator_lists_expected_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_checkpoints(dir.path());

    let entries = inspect_checkpoint(&model).unwrap();
    let find = |name: &str| {
        entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, shape)| shape.clone())
    };

    assert_eq!(find("l0z.weight"), Some(vec![6 * 6 * 512, 100]));
    assert_eq!(find("dc4.weight"), Some(vec![64, 3, 4, 4]));
    assert_eq!(find("bn0l.running_mean"), Some(vec![6 * 6 * 512]));
}

#[test]
fn unsupported_output_format_is_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_checkpoints(dir.path());
    let out = dir.path().join("grid.unknown");
    let request = GenerateRequest {
        model,
        num_images: 4,
        output: out.clone(),
        seed: Some(1),
    };

    let err = generation::run(&request, &Config::default(), Device::Cpu).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(!out.exists());
}
