// Copyright @yucwang 2021

pub mod exr_utils;
pub mod image_utils;
