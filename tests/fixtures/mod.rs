#![allow(dead_code)]

pub mod probe;
pub mod strategy;
pub mod tracker;
