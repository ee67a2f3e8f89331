use super::*;

#[test]
fn defaults_match_documented_values() {
    let p = BlurParameters::default();
    assert_eq!(p.number_of_stages, 10);
    assert_eq!(p.blur_radius, 30.0);
    assert_eq!(p.duration().unwrap(), Duration::from_secs(1));
    p.validate().unwrap();

    let o = LabelOptions::default();
    assert_eq!(o.background, Rgba8::WHITE);
    assert!(o.eager_generation);
    assert_eq!(o.worker_threads, None);
    assert_eq!(o.bounds, Size::new(320.0, 64.0));
    o.validate().unwrap();
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let p = BlurParameters::from_json_str(r#"{ "blur_radius": 12.5 }"#).unwrap();
    assert_eq!(p.blur_radius, 12.5);
    assert_eq!(p.number_of_stages, 10);

    let o = LabelOptions::from_json_str(
        r#"{ "background": { "r": 0, "g": 0, "b": 0, "a": 255 }, "worker_threads": 2 }"#,
    )
    .unwrap();
    assert_eq!(o.background, Rgba8::BLACK);
    assert_eq!(o.worker_threads, Some(2));
}

#[test]
fn json_errors_are_classified() {
    let err = BlurParameters::from_json_str("{ nope").unwrap_err();
    assert!(err.to_string().contains("serialization error:"));

    let err = BlurParameters::from_json_str(r#"{ "number_of_stages": 1 }"#).unwrap_err();
    assert!(err.to_string().contains("validation error:"));

    assert!(BlurParameters::from_json_str(r#"{ "stages": 3 }"#).is_err());
    assert!(LabelOptions::from_json_str(r#"{ "worker_threads": 0 }"#).is_err());
    assert!(
        LabelOptions::from_json_str(r#"{ "bounds": { "width": 0.0, "height": 10.0 } }"#).is_err()
    );
    let o = LabelOptions::from_json_str(r#"{ "bounds": { "width": 200.0, "height": 40.0 } }"#)
        .unwrap();
    assert_eq!(o.bounds, Size::new(200.0, 40.0));
}

#[test]
fn invalid_ranges_are_rejected() {
    let mut p = BlurParameters::default();
    p.blur_radius = -1.0;
    assert!(p.validate().is_err());

    p.blur_radius = 0.0;
    p.validate().unwrap();

    p.animation_duration = 0.0;
    assert!(p.validate().is_err());
    p.animation_duration = f64::NAN;
    assert!(p.validate().is_err());
}

#[test]
fn stage_radius_is_linear() {
    let p = BlurParameters::default();
    assert_eq!(p.radius_for_stage(0), 0.0);
    assert_eq!(p.radius_for_stage(1), 0.0);
    assert!((p.radius_for_stage(2) - 30.0 / 9.0).abs() < 1e-5);
    assert_eq!(p.radius_for_stage(10), 30.0);
    assert_eq!(p.radius_for_stage(11), 30.0);
    for i in 1..11 {
        assert!(p.radius_for_stage(i + 1) > p.radius_for_stage(i));
    }
}
