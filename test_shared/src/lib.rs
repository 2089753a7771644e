#![allow(dead_code)]

use std::env;
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

pub fn create_tmp_dir() -> PathBuf {
    let mut dir = env::temp_dir();
    dir.push(nanoid::simple());
    fs::create_dir(&dir).expect("Failed to create test directory.");
    dir
}

pub fn create_tmp_file(data: &str) -> PathBuf {
    let dir = create_tmp_dir();
    create_file_with_content(&dir, &nanoid::simple(), data)
}

pub fn create_file_with_content(dir: &Path, name: &str, data: &str) -> PathBuf {
    create_file_with_bytes(dir, name, data.as_bytes())
}

pub fn create_file_with_bytes(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let file = dir.join(name);
    fs::write(&file, data).expect("Failed to write test file.");
    file
}

// Deterministic, non-repeating enough to exercise multi-chunk reads.
pub fn create_tmp_file_with_size(size: usize) -> PathBuf {
    let dir = create_tmp_dir();
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    create_file_with_bytes(&dir, &nanoid::simple(), &data)
}

pub fn get_file_string_content(path: &Path) -> String {
    let mut file = File::open(path).expect("Failed to open test file.");
    let mut content = String::new();
    file.read_to_string(&mut content)
        .expect("Failed to read test file content.");
    content
}
