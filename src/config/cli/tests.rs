use super::*;
use serde_yaml::Value;
use std::path::PathBuf;

#[test]
fn test_parse_validate_command() {
    let cli = parse_args(["podar", "validate", "recipe.md", "--detailed"]).unwrap();
    match cli.command {
        Command::Validate(args) => {
            assert_eq!(args.recipe, PathBuf::from("recipe.md"));
            assert!(args.detailed);
            assert!(args.overrides.is_empty());
        }
        _ => panic!("Expected Validate command"),
    }
}

#[test]
fn test_parse_repeated_overrides() {
    let cli = parse_args([
        "podar",
        "info",
        "recipe.md",
        "--set",
        "num_epochs=20",
        "--set",
        "lr=0.1",
        "--format",
        "json",
    ])
    .unwrap();
    match cli.command {
        Command::Info(args) => {
            assert_eq!(args.format, OutputFormat::Json);
            let overrides = parse_overrides(&args.overrides).unwrap();
            assert_eq!(overrides[0], ("num_epochs".to_string(), Value::from(20)));
            assert_eq!(overrides[1].1, Value::from(0.1));
        }
        _ => panic!("Expected Info command"),
    }
}

#[test]
fn test_malformed_override() {
    assert!(parse_overrides(&["noequals".to_string()]).is_err());
}

#[test]
fn test_parse_schedule_defaults() {
    let cli = parse_args(["podar", "schedule", "r.md"]).unwrap();
    match cli.command {
        Command::Schedule(args) => {
            assert_eq!(args.steps_per_epoch, 100);
            assert_eq!(args.resolution, 1.0);
            assert_eq!(args.format, OutputFormat::Text);
        }
        _ => panic!("Expected Schedule command"),
    }
}

#[test]
fn test_parse_apply_requires_model_and_output() {
    assert!(parse_args(["podar", "apply", "r.md", "--model", "m.json"]).is_err());
    let cli = parse_args([
        "podar", "apply", "r.md", "-m", "m.json", "-o", "out.json", "--steps-per-epoch", "4",
    ])
    .unwrap();
    match cli.command {
        Command::Apply(args) => {
            assert_eq!(args.model, PathBuf::from("m.json"));
            assert_eq!(args.output, PathBuf::from("out.json"));
            assert_eq!(args.steps_per_epoch, 4);
        }
        _ => panic!("Expected Apply command"),
    }
}

#[test]
fn test_parse_sensitivity_levels() {
    let cli = parse_args(["podar", "sensitivity", "-m", "m.json", "--levels", "0,0.5,0.9"]).unwrap();
    match cli.command {
        Command::Sensitivity(args) => assert_eq!(args.levels, vec![0.0, 0.5, 0.9]),
        _ => panic!("Expected Sensitivity command"),
    }
}

#[test]
fn test_global_flags() {
    let cli = parse_args(["podar", "-v", "validate", "r.md"]).unwrap();
    assert!(cli.verbose);
    let cli = parse_args(["podar", "validate", "r.md", "--quiet"]).unwrap();
    assert!(cli.quiet);
}

#[test]
fn test_output_format_parse() {
    assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
    assert!("xml".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Json.to_string(), "json");
}
