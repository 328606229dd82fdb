pub mod color_space;
pub mod deficiency;
pub mod image_job;
pub mod pixel;
pub mod progress;
