// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometry kernel and resolution scaling helpers.

pub mod geometry;
pub mod scale;
