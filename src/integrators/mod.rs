// Copyright @yucwang 2021

pub mod path;
pub mod solid;
