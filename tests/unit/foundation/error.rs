use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ArtificeError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        ArtificeError::connection("x")
            .to_string()
            .contains("connection error:")
    );
    assert!(
        ArtificeError::computation("x")
            .to_string()
            .contains("computation error:")
    );
    assert!(
        ArtificeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn missing_input_names_node_and_port() {
    let err = ArtificeError::missing_input(NodeId(3), "image");
    let msg = err.to_string();
    assert!(msg.contains("#3"));
    assert!(msg.contains("'image'"));
    assert_eq!(err.class(), "missing-input");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ArtificeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.class(), "other");
}
