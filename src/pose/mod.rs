pub mod landmark;
pub mod preprocess;
pub mod provider;

pub use landmark::{LandmarkIndex, Point2, PoseLandmarks};
pub use preprocess::{preprocess_for_pose, POSE_INPUT_SIZE};
pub use provider::{OnnxPoseProvider, PoseProvider};
