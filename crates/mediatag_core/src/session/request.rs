//! What the caller asks a session to do.

use crate::models::{
    CaptureDate, CopyMode, Location, MediaItem, ProjectAssignment, ReviewFlags, TagSet,
};
use crate::orchestrator::ToolPaths;

use super::errors::ValidationError;

/// One tagging batch as collected from the user.
#[derive(Debug, Clone)]
pub struct TaggingRequest {
    pub items: Vec<MediaItem>,
    pub tags: TagSet,
    pub review: ReviewFlags,
    pub location: Option<Location>,
    pub date: CaptureDate,
    /// Run the speech stage after the face stage.
    pub transcribe: bool,
    /// `None` keeps tagged files local.
    pub copy: Option<CopyMode>,
    pub projects: ProjectAssignment,
    /// Run the mount helper when the share is missing.
    pub allow_mount: bool,
}

impl TaggingRequest {
    pub fn new(items: Vec<MediaItem>, tags: TagSet, date: CaptureDate) -> Self {
        Self {
            items,
            tags,
            review: ReviewFlags::default(),
            location: None,
            date,
            transcribe: false,
            copy: None,
            projects: ProjectAssignment::new(),
            allow_mount: true,
        }
    }

    pub fn videos(&self) -> Vec<MediaItem> {
        self.items.iter().filter(|i| i.is_video()).cloned().collect()
    }

    pub fn has_videos(&self) -> bool {
        self.items.iter().any(|i| i.is_video())
    }

    /// Check everything that can be checked without running anything.
    pub fn validate(&self, tools: &ToolPaths) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::NoItems);
        }
        if let Some(missing) = self.items.iter().find(|i| !i.path().is_file()) {
            return Err(ValidationError::MissingItem(missing.path().to_path_buf()));
        }
        if self.tags.is_empty() {
            return Err(ValidationError::NoTags);
        }
        let location = self.location.as_ref().ok_or(ValidationError::MissingLocation)?;
        location.validate().map_err(ValidationError::InvalidLocation)?;

        if self.copy.is_some_and(|m| m.requires_project()) {
            if let Some(item) = self
                .items
                .iter()
                .find(|i| self.projects.project_for(i.path()).is_none())
            {
                return Err(ValidationError::MissingProject(item.path().to_path_buf()));
            }
        }

        if self.has_videos() {
            if tools.ffmpeg.is_none() {
                return Err(ValidationError::ToolMissing("ffmpeg".into()));
            }
            if tools.ffprobe.is_none() {
                return Err(ValidationError::ToolMissing("ffprobe".into()));
            }
            if tools.python.is_none() {
                return Err(ValidationError::ToolMissing("python3".into()));
            }
            if self.transcribe && tools.access_token.trim().is_empty() {
                return Err(ValidationError::MissingAccessToken);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn tools() -> ToolPaths {
        ToolPaths {
            python: Some(PathBuf::from("/usr/bin/python3")),
            ffmpeg: Some(PathBuf::from("/usr/bin/ffmpeg")),
            ffprobe: Some(PathBuf::from("/usr/bin/ffprobe")),
            ..ToolPaths::default()
        }
    }

    fn request(dir: &std::path::Path, names: &[&str]) -> TaggingRequest {
        let items = names
            .iter()
            .map(|n| {
                let p = dir.join(n);
                std::fs::write(&p, b"x").unwrap();
                MediaItem::from_path(p).unwrap()
            })
            .collect();
        let mut tags = TagSet::new();
        tags.add_input("event");
        let mut req = TaggingRequest::new(items, tags, CaptureDate::new(2024, 5, 1).unwrap());
        req.location = Some(Location::new("Hall", "10", "20"));
        req
    }

    #[test]
    fn valid_request_passes() {
        let dir = tempdir().unwrap();
        assert_eq!(request(dir.path(), &["a.jpg", "b.mp4"]).validate(&tools()), Ok(()));
    }

    #[test]
    fn rejects_missing_inputs_in_order() {
        let dir = tempdir().unwrap();
        let mut req = request(dir.path(), &["a.jpg"]);
        req.tags = TagSet::new();
        assert_eq!(req.validate(&tools()), Err(ValidationError::NoTags));

        let mut req = request(dir.path(), &["a.jpg"]);
        req.location = None;
        assert_eq!(req.validate(&tools()), Err(ValidationError::MissingLocation));

        let mut req = request(dir.path(), &["a.jpg"]);
        req.location = Some(Location::new("Bad", "91", "0"));
        assert!(matches!(req.validate(&tools()), Err(ValidationError::InvalidLocation(_))));

        let req = TaggingRequest::new(vec![], TagSet::new(), CaptureDate::new(2024, 1, 1).unwrap());
        assert_eq!(req.validate(&tools()), Err(ValidationError::NoItems));
    }

    #[test]
    fn broll_needs_project_per_item() {
        let dir = tempdir().unwrap();
        let mut req = request(dir.path(), &["a.jpg", "b.jpg"]);
        req.copy = Some(CopyMode::BRoll);
        req.projects.assign(dir.path().join("a.jpg"), "Launch");
        assert_eq!(
            req.validate(&tools()),
            Err(ValidationError::MissingProject(dir.path().join("b.jpg")))
        );
        req.projects.set_default("Launch");
        assert_eq!(req.validate(&tools()), Ok(()));
    }

    #[test]
    fn videos_need_tools_and_token() {
        let dir = tempdir().unwrap();
        let mut req = request(dir.path(), &["clip.mov"]);
        req.transcribe = true;
        assert_eq!(req.validate(&tools()), Err(ValidationError::MissingAccessToken));

        let no_ffmpeg = ToolPaths {
            ffmpeg: None,
            ..tools()
        };
        assert_eq!(
            req.validate(&no_ffmpeg),
            Err(ValidationError::ToolMissing("ffmpeg".into()))
        );

        // Photos alone need no tools
        let photos = request(dir.path(), &["a.jpg"]);
        assert_eq!(photos.validate(&ToolPaths::default()), Ok(()));
    }
}
