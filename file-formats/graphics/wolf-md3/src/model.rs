use std::fs;
use std::path::Path;

use wolf_data::{DrawCall, QPath, RecordChain, RecordReader, SurfaceSource, Transform};

use crate::error::{Md3Error, Result};
use crate::frame::Frame;
use crate::header::{ModelFormat, RigidHeader};
use crate::surface::{MD3_SURFACE_END_FIELD, MDC_SURFACE_END_FIELD, Surface, read_surface};
use crate::tag::{Md3Tag, MdcTag, lerp_tag_transform};

/// A decoded MD3 or MDC model.
///
/// Every frame's vertices are reconstructed at load time, so rendering a
/// frame is a copy into the caller's draw calls.
#[derive(Debug, Clone)]
pub struct RigidModel {
    header: RigidHeader,
    frames: Vec<Frame>,
    tag_names: Vec<String>,
    /// `num_frames * num_tags` transforms, frame-major.
    tags: Vec<Transform>,
    surfaces: Vec<Surface>,
    surface_chain_end: usize,
}

impl RigidModel {
    /// Decodes a model from an in-memory file.
    pub fn load(data: &[u8]) -> Result<Self> {
        let header = RigidHeader::parse(data)?;

        let frames = RecordReader::at(data, header.ofs_frames)?
            .read_array::<Frame>(header.num_frames)?;

        let tag_slots = header
            .num_frames
            .checked_mul(header.num_tags)
            .ok_or_else(|| Md3Error::CorruptModel("tag table size overflows".to_string()))?;
        let mut tag_reader = RecordReader::at(data, header.ofs_tags)?;

        let (tag_names, tags) = match (header.format, header.ofs_tag_names) {
            (ModelFormat::Mdc, Some(ofs_tag_names)) => {
                let names = RecordReader::at(data, ofs_tag_names)?
                    .read_array::<QPath>(header.num_tags)?
                    .iter()
                    .map(QPath::to_string_lossy)
                    .collect();
                let tags = tag_reader
                    .read_array::<MdcTag>(tag_slots)?
                    .iter()
                    .map(MdcTag::transform)
                    .collect();
                (names, tags)
            }
            _ => {
                let records = tag_reader.read_array::<Md3Tag>(tag_slots)?;
                // Names repeat in every frame; the first frame is authoritative.
                let names = records
                    .iter()
                    .take(header.num_tags)
                    .map(|tag| tag.name.to_string_lossy())
                    .collect();
                let tags = records.iter().map(Md3Tag::transform).collect();
                (names, tags)
            }
        };

        let end_field = match header.format {
            ModelFormat::Md3 => MD3_SURFACE_END_FIELD,
            ModelFormat::Mdc => MDC_SURFACE_END_FIELD,
        };
        let mut chain = RecordChain::new(data, header.ofs_surfaces, header.num_surfaces, end_field);
        // Each surface at least holds its end field, which bounds the count
        // a file of this length can carry.
        let room = data.len().saturating_sub(header.ofs_surfaces) / (end_field + 4);
        let mut surfaces = Vec::with_capacity(header.num_surfaces.min(room));
        for start in chain.by_ref() {
            surfaces.push(read_surface(data, start?, header.format, header.num_frames)?);
        }

        let surface_chain_end = chain.end();
        if surface_chain_end != header.ofs_end {
            log::warn!(
                "Surface chain of {:?} ends at {}, header declares {}",
                header.name,
                surface_chain_end,
                header.ofs_end
            );
        }

        log::info!(
            "Loaded {} model {:?}: {} frames, {} tags, {} surfaces",
            header.format.name(),
            header.name,
            header.num_frames,
            header.num_tags,
            surfaces.len()
        );

        Ok(Self {
            header,
            frames,
            tag_names,
            tags,
            surfaces,
            surface_chain_end,
        })
    }

    /// Reads and decodes a model file.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            log::error!("Cannot read {}: {}", path.display(), e);
            e
        })?;
        Self::load(&data)
    }

    pub fn header(&self) -> &RigidHeader {
        &self.header
    }

    pub fn format(&self) -> ModelFormat {
        self.header.format
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn tag_names(&self) -> &[String] {
        &self.tag_names
    }

    /// Transform of tag slot `slot` in `frame`.
    pub fn tag_transform(&self, frame: usize, slot: usize) -> Option<&Transform> {
        if slot >= self.tag_names.len() {
            return None;
        }
        let index = frame.checked_mul(self.tag_names.len())?.checked_add(slot)?;
        self.tags.get(index)
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }

    /// Offset where the surface chain ended while loading.
    pub fn surface_chain_end(&self) -> usize {
        self.surface_chain_end
    }

    /// Copies `frame`'s geometry into `draw_calls`, one per surface.
    ///
    /// The draw calls must have been sized with
    /// [`SurfaceSource::allocate_draw_calls`].
    pub fn render(&self, frame: usize, draw_calls: &mut [DrawCall]) -> Result<()> {
        self.check_frame(frame)?;
        self.check_draw_calls(draw_calls)?;

        for (surface, draw_call) in self.surfaces.iter().zip(draw_calls.iter_mut()) {
            if let Some(vertices) = surface.frame_vertices(frame) {
                draw_call.vertices.copy_from_slice(vertices);
            }
            draw_call.indices.copy_from_slice(&surface.indices);
        }
        Ok(())
    }

    /// Finds the first tag named `name` at or after slot `start_index` and
    /// returns its slot and transform in `frame`.
    pub fn tag(
        &self,
        name: &str,
        frame: usize,
        start_index: usize,
    ) -> Result<Option<(usize, Transform)>> {
        self.check_frame(frame)?;
        Ok(self
            .find_tag(name, start_index)
            .and_then(|slot| Some((slot, *self.tag_transform(frame, slot)?))))
    }

    /// Like [`tag`](Self::tag), blending between `old_frame` and `frame`.
    ///
    /// `lerp` is the weight of `frame`.
    pub fn lerp_tag(
        &self,
        name: &str,
        frame: usize,
        old_frame: usize,
        lerp: f32,
        start_index: usize,
    ) -> Result<Option<(usize, Transform)>> {
        self.check_frame(frame)?;
        self.check_frame(old_frame)?;

        let Some(slot) = self.find_tag(name, start_index) else {
            return Ok(None);
        };
        match (
            self.tag_transform(old_frame, slot),
            self.tag_transform(frame, slot),
        ) {
            (Some(from), Some(to)) => Ok(Some((slot, lerp_tag_transform(from, to, lerp)))),
            _ => Ok(None),
        }
    }

    fn find_tag(&self, name: &str, start_index: usize) -> Option<usize> {
        self.tag_names
            .iter()
            .enumerate()
            .skip(start_index)
            .find(|(_, tag_name)| tag_name.as_str() == name)
            .map(|(slot, _)| slot)
    }

    fn check_frame(&self, frame: usize) -> Result<()> {
        if frame < self.frames.len() {
            Ok(())
        } else {
            Err(Md3Error::FrameOutOfRange {
                frame,
                count: self.frames.len(),
            })
        }
    }
}

impl SurfaceSource for RigidModel {
    fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    fn surface_name(&self, index: usize) -> Option<&str> {
        self.surfaces.get(index).map(|s| s.name.as_str())
    }

    fn surface_vertex_count(&self, index: usize) -> usize {
        self.surfaces.get(index).map_or(0, Surface::vertex_count)
    }

    fn surface_triangle_count(&self, index: usize) -> usize {
        self.surfaces.get(index).map_or(0, Surface::triangle_count)
    }
}
