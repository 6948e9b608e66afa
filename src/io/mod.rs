// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O for photos and saved documents.

pub mod media;
pub mod serialization;
