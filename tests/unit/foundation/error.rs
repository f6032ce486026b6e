use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StratumError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(StratumError::gpu("x").to_string().contains("gpu error:"));
    assert!(
        StratumError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(
        StratumError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StratumError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
