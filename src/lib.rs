pub mod config;
pub mod estimator;
pub mod features;
pub mod photo;
pub mod pipeline;
pub mod pose;
pub mod quality;
