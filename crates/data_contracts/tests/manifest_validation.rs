use data_contracts::{
    FrameBinding, ManifestError, Modality, ModalityManifest, ModalitySpec,
};

#[test]
fn vvt_default_manifest_is_valid() {
    let manifest = ModalityManifest::vvt_default();
    assert!(manifest.validate().is_ok());
    assert_eq!(manifest.reference, Modality::Frame);
    let keypoint = manifest.get(&Modality::Keypoint).expect("keypoint entry");
    assert!(!keypoint.required);
    let person = manifest.get(&Modality::PersonImage).expect("person entry");
    assert_eq!(person.binding, FrameBinding::Shared);
}

#[test]
fn missing_reference_rejected() {
    let manifest = ModalityManifest::new(
        Modality::Frame,
        vec![ModalitySpec::required(Modality::Cloth)],
    );
    assert_eq!(
        manifest.validate().unwrap_err(),
        ManifestError::MissingReference(Modality::Frame)
    );
}

#[test]
fn optional_or_shared_reference_rejected() {
    let optional = ModalityManifest::new(
        Modality::Frame,
        vec![ModalitySpec::optional(Modality::Frame)],
    );
    assert!(matches!(
        optional.validate(),
        Err(ManifestError::InvalidReference(_))
    ));

    let shared = ModalityManifest::new(
        Modality::Frame,
        vec![ModalitySpec::required(Modality::Frame).shared()],
    );
    assert!(matches!(
        shared.validate(),
        Err(ManifestError::InvalidReference(_))
    ));
}

#[test]
fn duplicate_modality_rejected() {
    let manifest = ModalityManifest::new(
        Modality::Frame,
        vec![
            ModalitySpec::required(Modality::Frame),
            ModalitySpec::required(Modality::Cloth),
            ModalitySpec::optional(Modality::Cloth),
        ],
    );
    assert_eq!(
        manifest.validate().unwrap_err(),
        ManifestError::Duplicate(Modality::Cloth)
    );
}

#[test]
fn empty_manifest_rejected() {
    let manifest = ModalityManifest::new(Modality::Frame, Vec::new());
    assert_eq!(manifest.validate().unwrap_err(), ManifestError::Empty);
}

#[test]
fn manifest_parses_from_toml_with_defaults() {
    let raw = r#"
reference = "frame"

[[entries]]
modality = "frame"
extensions = [".PNG", "jpg"]

[[entries]]
modality = "warp_mask"
required = false
binding = "shared"
"#;
    let manifest: ModalityManifest = toml::from_str(raw).expect("parse manifest");
    assert!(manifest.validate().is_ok());
    let frame = manifest.get(&Modality::Frame).unwrap();
    assert!(frame.required);
    assert_eq!(frame.binding, FrameBinding::PerFrame);
    // extensions are taken verbatim from serde; normalisation happens in with_extensions
    assert_eq!(frame.extensions, vec![".PNG".to_string(), "jpg".to_string()]);
    let custom = manifest
        .get(&Modality::Custom("warp_mask".into()))
        .expect("custom entry");
    assert_eq!(custom.binding, FrameBinding::Shared);
}

#[test]
fn manifest_json_uses_snake_case_names() {
    let manifest = ModalityManifest::new(
        Modality::Frame,
        vec![
            ModalitySpec::required(Modality::Frame),
            ModalitySpec::required(Modality::OpticalFlow).with_extensions([".FLO"]),
        ],
    );
    let json = serde_json::to_string(&manifest).unwrap();
    assert!(json.contains("\"optical_flow\""));
    assert!(json.contains("\"flo\""));
    let back: ModalityManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, manifest);
}

#[test]
fn misspelled_entry_key_rejected() {
    let raw = r#"
reference = "frame"

[[entries]]
modality = "frame"

[[entries]]
modality = "keypoint"
requird = false
"#;
    let err = toml::from_str::<ModalityManifest>(raw).unwrap_err();
    assert!(err.to_string().contains("requird"), "unexpected error: {err}");
}

#[test]
fn unknown_manifest_key_rejected() {
    let raw = r#"
reference = "frame"
refrence_count = 3

[[entries]]
modality = "frame"
"#;
    assert!(toml::from_str::<ModalityManifest>(raw).is_err());
}
