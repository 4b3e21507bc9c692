//! Integration tests replaying the demo recipes end to end

use approx::assert_abs_diff_eq;
use ndarray::{Array, ArrayD, IxDyn};
use podar::model::{Layer, LayerKind, Model};
use podar::optim::{apply_recipe, ScheduledOptimizer, SGD};
use podar::recipe::{ModifierSpec, Recipe};
use podar::ScheduledModifierManager;
use serde_yaml::Value;
use std::path::PathBuf;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("recipes")
        .join(name)
}

fn ramp(shape: &[usize]) -> ArrayD<f32> {
    let n: usize = shape.iter().product();
    Array::from_shape_vec(IxDyn(shape), (1..=n).map(|v| v as f32 * 0.1).collect()).unwrap()
}

fn bert_block(model: Model, i: usize) -> Model {
    let prefix = format!("encoder.layer.{i}");
    model
        .with_layer(Layer::linear(format!("{prefix}.attention.query"), ramp(&[4, 8]), None))
        .with_layer(Layer::linear(format!("{prefix}.attention.key"), ramp(&[4, 8]), None))
        .with_layer(Layer::linear(format!("{prefix}.attention.value"), ramp(&[4, 8]), None))
        .with_layer(Layer::linear(format!("{prefix}.intermediate.dense"), ramp(&[8, 8]), None))
        .with_layer(Layer::linear(format!("{prefix}.output.dense"), ramp(&[8, 8]), None))
}

fn tiny_bert(blocks: usize) -> Model {
    (0..blocks).fold(Model::new("tiny-bert"), bert_block)
}

fn conv(name: &str, shape: &[usize]) -> Layer {
    Layer::new(name, LayerKind::Conv).with_param("weight", ramp(shape))
}

fn tiny_resnet() -> Model {
    let mut model = Model::new("tiny-resnet");
    for s in 0..2 {
        let prefix = format!("sections.{s}.0");
        model.push_layer(conv(&format!("{prefix}.conv1"), &[4, 4, 3, 3]));
        model.push_layer(conv(&format!("{prefix}.conv2"), &[4, 4, 3, 3]));
        model.push_layer(conv(&format!("{prefix}.conv3"), &[8, 4, 1, 1]));
    }
    model.with_layer(Layer::linear("fc", ramp(&[2, 8]), None))
}

// TEST_ID: INT-001
#[test]
fn test_every_demo_recipe_parses() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join("recipes");
    let mut count = 0;
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let recipe = Recipe::load(&path)
            .unwrap_or_else(|e| panic!("INT-001 FALSIFIED: {} failed: {e}", path.display()));
        assert!(recipe.num_modifiers() > 0);
        assert!(!recipe.prose().trim().is_empty());
        count += 1;
    }
    assert_eq!(count, 3, "INT-001 FALSIFIED: expected three demo recipes");
}

// TEST_ID: INT-002
#[test]
fn test_bert_recipe_resolves_variables() {
    let recipe = Recipe::load(demo("bert_gmp.md")).unwrap();
    assert_eq!(recipe.variables().number("pruning_end"), Some(6.0));
    assert_eq!(recipe.max_epochs(), 10.0);
    let names: Vec<&str> = recipe.stages().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["training_modifiers", "pruning_modifiers"]);

    let gm = recipe
        .modifiers()
        .find_map(|m| m.magnitude())
        .expect("INT-002 FALSIFIED: no magnitude pruning record");
    assert_abs_diff_eq!(gm.final_sparsity, 0.8);
    assert_eq!(gm.start_epoch, 2.0);
    assert_eq!(gm.end_epoch, 6.0);
    assert_eq!(gm.update_frequency, 0.5);
}

// TEST_ID: INT-003
#[test]
fn test_bert_recipe_overrides() {
    let overrides = vec![
        ("final_sparsity".to_string(), Value::from(0.9)),
        ("num_epochs".to_string(), Value::from(12.0)),
    ];
    let recipe = Recipe::load_with_overrides(demo("bert_gmp.md"), &overrides).unwrap();
    assert_eq!(recipe.variables().number("pruning_end"), Some(8.0));
    let gm = recipe.modifiers().find_map(|m| m.magnitude()).unwrap();
    assert_abs_diff_eq!(gm.final_sparsity, 0.9);
    assert_eq!(gm.end_epoch, 8.0);
}

// TEST_ID: INT-004
#[test]
fn test_bert_recipe_prunes_selected_params() {
    let recipe = Recipe::load(demo("bert_gmp.md")).unwrap();
    let mut model = tiny_bert(2);
    let optimizer = apply_recipe(&recipe, &mut model, 4).unwrap();

    for param in model.params() {
        let selected = param.name.contains(".attention.") || param.name.contains("intermediate");
        if selected {
            let s = param.sparsity();
            assert!(
                (0.75..=0.85).contains(&s),
                "INT-004 FALSIFIED: {} sparsity {s}",
                param.name
            );
            // 1x4 blocks prune whole groups of four
            assert_eq!(param.num_zeros() % 4, 0, "INT-004 FALSIFIED: {}", param.name);
        } else {
            assert_eq!(param.num_zeros(), 0, "INT-004 FALSIFIED: {} touched", param.name);
        }
    }
    assert_abs_diff_eq!(optimizer.lr(), 0.0, epsilon = 1e-9);
}

// TEST_ID: INT-005
#[test]
fn test_resnet_recipe_structured_masks() {
    let recipe = Recipe::load(demo("resnet50_structured.md")).unwrap();
    assert_eq!(recipe.max_epochs(), 30.0);
    let mut model = tiny_resnet();
    let optimizer = apply_recipe(&recipe, &mut model, 2).unwrap();

    // 40% of four filters rounds to two whole filters
    for name in ["sections.0.0.conv1.weight", "sections.1.0.conv2.weight"] {
        let w = &model.param(name).unwrap().data;
        let zero_filters = w
            .outer_iter()
            .filter(|f| f.iter().all(|v| *v == 0.0))
            .count();
        assert_eq!(zero_filters, 2, "INT-005 FALSIFIED: {name}");
        assert_eq!(model.param(name).unwrap().num_zeros(), 2 * 4 * 9);
    }

    // conv3 input channels are ranked jointly across both sections
    let zeros: usize = ["sections.0.0.conv3.weight", "sections.1.0.conv3.weight"]
        .iter()
        .map(|n| model.param(n).unwrap().num_zeros())
        .sum();
    assert!(zeros > 0 && zeros % 8 == 0, "INT-005 FALSIFIED: {zeros} zeros");
    assert_eq!(model.param("fc.weight").unwrap().num_zeros(), 0);

    // two milestones passed by epoch 30
    assert_abs_diff_eq!(optimizer.lr(), 0.001, epsilon = 1e-6);
}

// TEST_ID: INT-006
#[test]
fn test_sparse_transfer_holds_masks_under_sgd() {
    let recipe = Recipe::load(demo("sparse_transfer.md")).unwrap();
    assert!(recipe
        .modifiers()
        .any(|m| matches!(m, ModifierSpec::ConstantPruning(_))));

    let mut model = tiny_bert(4);
    for param in model.params_mut() {
        for (i, v) in param.data.iter_mut().enumerate() {
            if i % 2 == 0 {
                *v = 0.0;
            }
        }
    }
    let zeros_before: Vec<usize> = model.params().map(|p| p.num_zeros()).collect();

    let manager = ScheduledModifierManager::from_recipe(&recipe);
    let mut optimizer = ScheduledOptimizer::new(SGD::new(0.01, 0.0), manager, &mut model, 2).unwrap();
    for _ in 0..optimizer.total_steps() {
        for param in model.params_mut() {
            let grad = ArrayD::ones(param.data.raw_dim());
            param.set_grad(grad);
        }
        optimizer.step(&mut model).unwrap();
    }
    optimizer.finalize(&mut model).unwrap();

    let zeros_after: Vec<usize> = model.params().map(|p| p.num_zeros()).collect();
    assert_eq!(zeros_before, zeros_after, "INT-006 FALSIFIED: masks not held");

    for i in 0..4 {
        let bypassed = model
            .layer_names()
            .iter()
            .filter(|n| n.starts_with(&format!("encoder.layer.{i}.")))
            .all(|n| model.layer(n).unwrap().bypassed);
        assert_eq!(bypassed, i >= 2, "INT-006 FALSIFIED: block {i}");
    }
    assert_abs_diff_eq!(optimizer.lr(), 0.00001, epsilon = 1e-7);
}
