//! `videos.insert` resource types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Visibility of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Private,
    Unlisted,
    Public,
}

impl PrivacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
            PrivacyStatus::Public => "public",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(PrivacyStatus::Private),
            "unlisted" => Ok(PrivacyStatus::Unlisted),
            "public" => Ok(PrivacyStatus::Public),
            other => Err(format!("unknown privacy status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub category_id: String,
    /// Must be absent rather than empty; the API rejects `"tags": []`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub privacy_status: PrivacyStatus,
}

/// Metadata sent when opening an upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResource {
    pub snippet: VideoSnippet,
    pub status: VideoStatus,
}

/// The subset of the created video we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertedVideo {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(tags: Option<Vec<String>>) -> VideoResource {
        VideoResource {
            snippet: VideoSnippet {
                title: "1997.06.07 BEAC 97".to_string(),
                description: "apu/Kicsi_40.mpg: 0:01.09-4:55.08".to_string(),
                category_id: "22".to_string(),
                tags,
            },
            status: VideoStatus {
                privacy_status: PrivacyStatus::Private,
            },
        }
    }

    #[test]
    fn test_tags_field_omitted_when_none() {
        let json = serde_json::to_value(resource(None)).unwrap();
        assert!(json["snippet"].get("tags").is_none());
        assert_eq!(json["snippet"]["categoryId"], "22");
        assert_eq!(json["status"]["privacyStatus"], "private");
    }

    #[test]
    fn test_tags_field_present_when_some() {
        let json = serde_json::to_value(resource(Some(vec!["a".into(), "b".into()]))).unwrap();
        assert_eq!(json["snippet"]["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_privacy_status_parse() {
        assert_eq!("Unlisted".parse::<PrivacyStatus>().unwrap(), PrivacyStatus::Unlisted);
        assert!("secret".parse::<PrivacyStatus>().is_err());
    }
}
