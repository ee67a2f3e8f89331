use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TextBlurError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TextBlurError::raster("x")
            .to_string()
            .contains("raster error:")
    );
    assert!(TextBlurError::blur("x").to_string().contains("blur error:"));
    assert!(
        TextBlurError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TextBlurError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
