// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output module: chapter folders, page bitmaps, and text exports.

pub mod paths;
pub mod text;
pub mod transform;

pub use paths::PathAllocator;
pub use transform::PageTransformer;
