use std::path::{Path, PathBuf};

use glam::Mat4;
use wolf_data::{DrawCall, SurfaceSource};
use wolf_md3::RigidModel;
use wolf_mds::{FrameInfo, SkeletalModel};

use crate::animation::{AnimationClock, AnimationEntry};
use crate::error::{CharacterError, Result};
use crate::path::resolve_path;
use crate::skin::SkinFile;
use crate::texture::TextureTable;

/// Skin key naming the head model.
pub const HEAD_ATTACHMENT: &str = "md3_part";

/// Tag on the body where the head is placed.
pub const HEAD_TAG: &str = "tag_head";

/// Geometry of a posed character, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterPose {
    pub frame_info: FrameInfo,
    pub body: Vec<DrawCall>,
    pub head: Vec<DrawCall>,
    /// Places the head model on the body's head tag
    pub head_transform: Mat4,
}

/// An MDS body with an MD3/MDC head attached to its head tag.
///
/// A character directory holds `body.mds`, a `body_<skin>.skin` and a
/// `head_<skin>.skin` per skin, and the head model named by the head skin's
/// `md3_part` entry (`head.mdc` when it has none).
#[derive(Debug, Clone)]
pub struct Character {
    name: String,
    body: SkeletalModel,
    head: RigidModel,
    body_skin: SkinFile,
    head_skin: SkinFile,
    textures: TextureTable,
    clock: AnimationClock,
    frame_info: FrameInfo,
}

impl Character {
    pub fn load(dir: impl AsRef<Path>, skin: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned());

        let body_skin = SkinFile::load_or_empty(dir.join(format!("body_{skin}.skin")));
        let body = SkeletalModel::load_path(dir.join("body.mds"))?;

        let head_skin = SkinFile::load_or_empty(dir.join(format!("head_{skin}.skin")));
        let head_path = head_skin
            .attachment(HEAD_ATTACHMENT)
            .map_or_else(|| dir.join("head.mdc"), |part| dir.join(part));
        let head_path: PathBuf = resolve_path(&head_path, &[".mdc"])
            .ok_or(CharacterError::MissingFile(head_path))?;
        let head = RigidModel::load_path(&head_path)?;

        let mut textures = TextureTable::new();
        textures.add_skin(&body_skin);
        textures.add_skin(&head_skin);

        log::info!(
            "Loaded character {name:?} with skin {skin:?}: {} body surfaces, head {}, {} textures",
            body.surface_count(),
            head_path.display(),
            textures.len()
        );

        Ok(Self {
            name,
            body,
            head,
            body_skin,
            head_skin,
            textures,
            clock: AnimationClock::default(),
            frame_info: FrameInfo::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &SkeletalModel {
        &self.body
    }

    pub fn head(&self) -> &RigidModel {
        &self.head
    }

    pub fn body_skin(&self) -> &SkinFile {
        &self.body_skin
    }

    pub fn head_skin(&self) -> &SkinFile {
        &self.head_skin
    }

    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    /// Pose chosen by the last [`update`](Self::update).
    pub fn frame_info(&self) -> &FrameInfo {
        &self.frame_info
    }

    pub fn set_animation(&mut self, entry: &AnimationEntry) {
        log::debug!(
            "Character {:?} plays {} (frames {}..{} at {} fps)",
            self.name,
            entry.name,
            entry.first_frame,
            entry.first_frame + entry.length,
            entry.fps
        );
        self.clock.set_animation(entry);
    }

    /// Advances the animation by `dt` seconds and returns the pose to draw.
    pub fn update(&mut self, dt: f32) -> FrameInfo {
        self.frame_info = self.clock.update(dt);
        self.frame_info
    }

    /// Transform of the body's head tag for the current pose, identity when
    /// the body has no such tag.
    pub fn head_transform(&self) -> Result<Mat4> {
        Ok(self
            .body
            .lerp_tag(HEAD_TAG, &self.frame_info, 0)?
            .map_or(Mat4::IDENTITY, |(_, transform)| transform.to_mat4()))
    }

    /// Draw calls sized for this character, to pass to
    /// [`pose_into`](Self::pose_into).
    pub fn allocate_pose(&self) -> CharacterPose {
        CharacterPose {
            frame_info: self.frame_info,
            body: self.body.allocate_draw_calls(),
            head: self.head.allocate_draw_calls(),
            head_transform: Mat4::IDENTITY,
        }
    }

    /// Skins the body for the current pose and places the head.
    pub fn pose_into(&self, pose: &mut CharacterPose) -> Result<()> {
        self.body.render(&self.frame_info, &mut pose.body)?;
        self.head.render(0, &mut pose.head)?;
        pose.head_transform = self.head_transform()?;
        pose.frame_info = self.frame_info;
        Ok(())
    }

    pub fn pose(&self) -> Result<CharacterPose> {
        let mut pose = self.allocate_pose();
        self.pose_into(&mut pose)?;
        Ok(pose)
    }
}
