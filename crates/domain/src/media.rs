//! Camera media path templates and picture URLs.

use std::fmt;

/// Path appended to a camera base URL to check it answers.
pub const PING_PATH: &str = "/command/ping";

const PICTURE_ENDPOINT: &str = "https://api.netatmo.com/api/getcamerapicture";

/// Stream quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoQuality {
    Poor,
    Low,
    Medium,
    High,
}

impl VideoQuality {
    pub const ALL: [Self; 4] = [Self::Poor, Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media resource hosted by a camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaResource {
    LiveSnapshot,
    LiveVideo(VideoQuality),
    /// Recorded video of a past event.
    EventVideo {
        video_id: String,
        quality: VideoQuality,
    },
}

impl MediaResource {
    /// Path to append to the resolved camera base URL.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::LiveSnapshot => "/live/snapshot_720.jpg".to_string(),
            Self::LiveVideo(quality) => format!("/live/files/{quality}/index.m3u8"),
            Self::EventVideo { video_id, quality } => {
                format!("/vod/{video_id}/files/{quality}/index.m3u8")
            }
        }
    }

    /// Full URL of this resource under `base`.
    #[must_use]
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path())
    }
}

/// Cloud URL of a face or event picture, when both id and key are known.
#[must_use]
pub fn picture_url(id: Option<&str>, key: Option<&str>) -> Option<String> {
    match (id, key) {
        (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => {
            Some(format!("{PICTURE_ENDPOINT}?image_id={id}&key={key}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_live_snapshot_path() {
        assert_eq!(MediaResource::LiveSnapshot.path(), "/live/snapshot_720.jpg");
    }

    #[test]
    fn should_build_live_video_path_per_quality() {
        let paths: Vec<_> = VideoQuality::ALL
            .into_iter()
            .map(|q| MediaResource::LiveVideo(q).path())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/live/files/poor/index.m3u8",
                "/live/files/low/index.m3u8",
                "/live/files/medium/index.m3u8",
                "/live/files/high/index.m3u8",
            ]
        );
    }

    #[test]
    fn should_build_event_video_path() {
        let resource = MediaResource::EventVideo {
            video_id: "v-42".to_string(),
            quality: VideoQuality::Medium,
        };
        assert_eq!(resource.path(), "/vod/v-42/files/medium/index.m3u8");
    }

    #[test]
    fn should_join_base_without_double_slash() {
        assert_eq!(
            MediaResource::LiveSnapshot.url("https://relay.example/abc/"),
            "https://relay.example/abc/live/snapshot_720.jpg"
        );
    }

    #[test]
    fn should_build_picture_url_when_id_and_key_are_known() {
        assert_eq!(
            picture_url(Some("img"), Some("k")).as_deref(),
            Some("https://api.netatmo.com/api/getcamerapicture?image_id=img&key=k")
        );
    }

    #[test]
    fn should_not_build_picture_url_without_key() {
        assert_eq!(picture_url(Some("img"), None), None);
        assert_eq!(picture_url(Some("img"), Some("")), None);
    }
}
