pub mod angles;
pub mod landmark;
pub mod stream;

pub use angles::{AngleCatalog, AngleDefinition, JointAngleExtractor, ANGLE_CATALOG_VERSION};
pub use landmark::{Landmark, LandmarkIndex, Pose, PoseFrame};
pub use stream::{open_frames, read_frames};
