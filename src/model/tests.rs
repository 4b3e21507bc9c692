use super::*;
use ndarray::{arr1, arr2};
use tempfile::TempDir;

fn two_layer_model() -> Model {
    Model::new("mlp")
        .with_layer(Layer::linear(
            "fc1",
            arr2(&[[0.1, -0.2], [0.0, 0.4]]).into_dyn(),
            Some(arr1(&[0.0, 1.0]).into_dyn()),
        ))
        .with_layer(Layer::new("act1", LayerKind::Activation))
        .with_layer(Layer::linear(
            "fc2",
            arr2(&[[1.0, 2.0]]).into_dyn(),
            None,
        ))
}

#[test]
fn test_param_names_are_qualified() {
    let model = two_layer_model();
    assert_eq!(
        model.param_names(),
        vec!["fc1.weight", "fc1.bias", "fc2.weight"]
    );
}

#[test]
fn test_prunable_params_exclude_bias() {
    let model = two_layer_model();
    assert_eq!(model.prunable_param_names(), vec!["fc1.weight", "fc2.weight"]);
    assert_eq!(model.prunable_layer_names(), vec!["fc1", "fc2"]);
}

#[test]
fn test_sparsity_of_counts_zeros() {
    let model = two_layer_model();
    // fc1.weight has one zero out of four, fc2.weight none out of two
    let s = model.sparsity_of(&["fc1.weight", "fc2.weight"]);
    assert!((s - 1.0 / 6.0).abs() < 1e-6);
    assert_eq!(model.sparsity_of::<&str>(&[]), 0.0);
}

#[test]
fn test_local_name() {
    let p = Param::from_shape_vec("encoder.layer.0.fc.weight", &[2], vec![1.0, 2.0]);
    assert_eq!(p.local_name(), "weight");
}

#[test]
fn test_zero_grad() {
    let mut model = two_layer_model();
    model
        .param_mut("fc2.weight")
        .unwrap()
        .set_grad(arr2(&[[0.5, 0.5]]).into_dyn());
    model.zero_grad();
    let grad = model.param("fc2.weight").unwrap().grad.as_ref().unwrap();
    assert!(grad.iter().all(|g| *g == 0.0));
}

#[test]
fn test_save_and_load_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.json");
    let model = two_layer_model();
    save_model(&model, &path).unwrap();
    let loaded = load_model(&path).unwrap();
    assert_eq!(loaded, model);
}

#[test]
fn test_save_and_load_yaml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.yaml");
    let model = two_layer_model();
    save_model(&model, &path).unwrap();
    assert_eq!(load_model(&path).unwrap(), model);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.bin");
    assert!(save_model(&two_layer_model(), &path).is_err());
    assert!(load_model(&path).is_err());
}
