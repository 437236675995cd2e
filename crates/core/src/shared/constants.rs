/// Label used for every unresolved or rejected identity.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Mood reported with dispatched events. Mood inference belongs to the
/// detector collaborator; the engine only forwards a value.
pub const NEUTRAL_MOOD: &str = "neutral";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Optional gallery directory manifest listing reference image file names.
pub const GALLERY_MANIFEST: &str = "images.json";
