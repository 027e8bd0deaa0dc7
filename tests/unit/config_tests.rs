// Watermark parameter tests through the public API

use std::path::PathBuf;
use tilemark::watermark::*;

#[test]
fn test_documented_yaml_example_is_valid() {
    let yaml = r#"
text: "Confidential"
uppercase: true
font_size: 20
opacity: 255
color: [255, 0, 0]
grayscale: false
image_path: null
horizontal_spacing: 10
vertical_spacing: 1
"#;
    let spec = WatermarkParams::from_yaml(yaml)
        .expect("Failed to parse parameters")
        .into_spec()
        .expect("Failed to validate parameters");

    assert!(!spec.grayscale_source);
    assert_eq!(spec.spacing, Spacing::new(10, 1));
    match spec.mode {
        WatermarkMode::Text(text) => {
            assert_eq!(text.text, "Confidential");
            assert_eq!(text.case, CaseTransform::Upper);
            assert_eq!(text.font_size, 20);
            assert_eq!(text.opacity, 255);
            assert_eq!(text.color, Color::red());
            assert!(text.font_path.is_none());
        }
        other => panic!("expected text mode, got {:?}", other),
    }
}

#[test]
fn test_empty_yaml_needs_text() {
    let params = WatermarkParams::from_yaml("{}").expect("Failed to parse parameters");
    assert_eq!(params, WatermarkParams::default());

    let result = params.into_spec();
    assert!(matches!(result, Err(WatermarkError::InputValidation(_))));
}

#[test]
fn test_yaml_with_unknown_color_shape_is_rejected() {
    let yaml = r#"
text: "Draft"
color: "red"
"#;
    let result = WatermarkParams::from_yaml(yaml);
    assert!(matches!(result, Err(WatermarkError::InputValidation(_))));
}

#[test]
fn test_yaml_font_path_is_kept() {
    let yaml = r#"
text: "Draft"
font_path: /usr/share/fonts/custom.ttf
"#;
    let spec = WatermarkParams::from_yaml(yaml).unwrap().into_spec().unwrap();
    match spec.mode {
        WatermarkMode::Text(text) => {
            assert_eq!(text.font_path, Some(PathBuf::from("/usr/share/fonts/custom.ttf")));
        }
        other => panic!("expected text mode, got {:?}", other),
    }
}

#[test]
fn test_params_serialize_to_yaml() {
    let params = WatermarkParams {
        text: "Draft".to_string(),
        color: Color::new(0, 128, 255),
        ..Default::default()
    };

    let yaml = serde_yaml::to_string(&params).unwrap();
    assert!(yaml.contains("text: Draft"));
    assert!(!yaml.contains("image_path"));

    let parsed = WatermarkParams::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, params);
}

#[test]
fn test_hex_colors() {
    assert_eq!("#ff0000".parse::<Color>().unwrap(), Color::red());
    assert_eq!("#000".parse::<Color>().unwrap(), Color::black());
    assert_eq!(parse_hex_color("#0A8").unwrap(), Color::new(0x00, 0xAA, 0x88));
    assert!(parse_hex_color("ff0000").is_err());
    assert!(parse_hex_color("#ff00").is_err());
    assert!(parse_hex_color("#gg0000").is_err());
}

#[test]
fn test_uppercase_flag_selects_case() {
    let spec = |uppercase| {
        WatermarkParams {
            text: "MiXeD".to_string(),
            uppercase,
            ..Default::default()
        }
        .into_spec()
        .unwrap()
    };

    for (uppercase, expected) in [(false, "mixed"), (true, "MIXED")] {
        match spec(uppercase).mode {
            WatermarkMode::Text(text) => assert_eq!(text.case.apply(&text.text), expected),
            other => panic!("expected text mode, got {:?}", other),
        }
    }
}

#[test]
fn test_font_size_outside_recommended_range_is_accepted() {
    for font_size in [8, 72] {
        let spec = WatermarkParams {
            text: "Draft".to_string(),
            font_size,
            ..Default::default()
        }
        .into_spec();
        assert!(spec.is_ok(), "font size {} rejected", font_size);
    }
}
