// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

pub mod raster;
pub mod scene;
pub mod text;
