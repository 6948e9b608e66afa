// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Paneline - photo annotation and perspective window measurement
//!
//! The canvas core: annotations with undo history, handle editing, a skewed
//! window frame with six projected measurement lines, and a magnifying
//! loupe for touch input. The desktop host lives in the binary.

pub mod canvas;
pub mod config;
pub mod io;
pub mod models;
pub mod render;
pub mod util;
