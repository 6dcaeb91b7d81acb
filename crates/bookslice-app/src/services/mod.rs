// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: bridges the command line to the bookslice library crates.
//
// `batch` and `menu` hold the folder and interaction logic and are tested
// without pdfium; `runner` supplies the real PDF-backed operations.

pub mod batch;
pub mod menu;
pub mod runner;
pub mod summary;
