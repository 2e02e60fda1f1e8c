#![allow(dead_code)]

pub mod transport;
