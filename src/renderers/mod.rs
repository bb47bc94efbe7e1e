// Copyright @yucwang 2026

pub mod adaptive;
pub mod renderer;
