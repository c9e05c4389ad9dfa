use wolf_data::{QPath, Record};

/// Tag record as stored on disk: a name bound to a bone.
#[derive(Debug, Clone, PartialEq, Record)]
pub struct MdsTag {
    pub name: QPath,
    pub torso_weight: f32,
    pub bone_index: i32,
}

/// A validated tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub torso_weight: f32,
    pub bone: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_size() {
        assert_eq!(MdsTag::SIZE, 72);
    }
}
