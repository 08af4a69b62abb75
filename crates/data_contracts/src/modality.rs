use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of per-frame artifact produced by an external tool.
///
/// Serialized as its snake_case name; unknown names round-trip as
/// [`Modality::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Modality {
    /// Raw video frames; the usual reference modality.
    Frame,
    /// Warped clothing images.
    Cloth,
    Densepose,
    OpticalFlow,
    /// Body-part parsing masks of the video frames.
    Parsing,
    /// Pose keypoints of the video frames.
    Keypoint,
    /// Per-subject product/person image (`clothes_person/img`).
    PersonImage,
    PersonKeypoint,
    PersonParsing,
    Custom(String),
}

impl Modality {
    pub const BUILTIN: [Modality; 9] = [
        Modality::Frame,
        Modality::Cloth,
        Modality::Densepose,
        Modality::OpticalFlow,
        Modality::Parsing,
        Modality::Keypoint,
        Modality::PersonImage,
        Modality::PersonKeypoint,
        Modality::PersonParsing,
    ];

    pub fn name(&self) -> &str {
        match self {
            Modality::Frame => "frame",
            Modality::Cloth => "cloth",
            Modality::Densepose => "densepose",
            Modality::OpticalFlow => "optical_flow",
            Modality::Parsing => "parsing",
            Modality::Keypoint => "keypoint",
            Modality::PersonImage => "person_image",
            Modality::PersonKeypoint => "person_keypoint",
            Modality::PersonParsing => "person_parsing",
            Modality::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Modality::Custom(_))
    }
}

impl From<String> for Modality {
    fn from(raw: String) -> Self {
        let name = raw.trim();
        Modality::BUILTIN
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .unwrap_or_else(|| Modality::Custom(name.to_string()))
    }
}

impl From<&str> for Modality {
    fn from(raw: &str) -> Self {
        Modality::from(raw.to_string())
    }
}

impl From<Modality> for String {
    fn from(m: Modality) -> Self {
        match m {
            Modality::Custom(name) => name,
            other => other.name().to_string(),
        }
    }
}

impl FromStr for Modality {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Modality::from(s))
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which half of the reference tree (`train/` or `test/`) a dataset reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    #[default]
    Train,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            other => Err(format!("unknown split '{other}' (expected train or test)")),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_parse_back() {
        for m in Modality::BUILTIN.iter() {
            assert_eq!(&Modality::from(m.name()), m);
        }
        assert_eq!(
            Modality::from("warp_mask"),
            Modality::Custom("warp_mask".into())
        );
    }

    #[test]
    fn split_parses_case_insensitively() {
        assert_eq!("TEST".parse::<Split>().unwrap(), Split::Test);
        assert!("val".parse::<Split>().is_err());
    }
}
