// Copyright @yucwang 2026

pub mod height_field;
