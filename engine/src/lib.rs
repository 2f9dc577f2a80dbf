use crate::image_model::ImageModel;

pub mod cache;
pub mod config;
pub mod image_model;
pub mod prompt;

pub type ImgModBox = Box<dyn ImageModel + Send>;
