// Copyright 2020 @TwoCookingMice

use super::constants::Vector3f;

use std::ops;
use std::vec::Vec;

#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    data: Vec<Vector3f>,
    height: usize,
    width: usize
}

impl ops::Index<(usize, usize)> for Bitmap {
    type Output = Vector3f;

    fn index(&self, index: (usize, usize)) -> &Vector3f {
        debug_assert!(index.0 < self.width && index.1 < self.height);
        &self.data[index.0 + self.width * index.1]
    }
}

impl ops::IndexMut<(usize, usize)> for Bitmap {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Vector3f {
        debug_assert!(index.0 < self.width && index.1 < self.height);
        &mut self.data[index.0 + self.width * index.1]
    }
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_number = width * height;
        Self { data: vec!(Vector3f::zeros(); pixel_number),
               width: width,
               height: height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Vector3f] {
        &self.data
    }

    // Row-major copy in the layout the EXR writer expects.
    pub fn raw_copy(&self) -> Vec<(f32, f32, f32)> {
        self.data.iter()
            .map(|c| (c.x as f32, c.y as f32, c.z as f32))
            .collect()
    }
}

/* Test for Bitmap */
