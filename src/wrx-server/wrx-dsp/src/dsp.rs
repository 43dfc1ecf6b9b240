// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Building blocks shared by the tuner and the decoder.

pub mod filter;
pub mod iir;
pub mod nco;
pub mod resample;

pub use filter::{BlockFirFilter, BlockFirFilterPair};
pub use iir::BiquadCascade;
pub use nco::Nco;
pub use resample::{expected_output_len, ComplexResampler, RealResampler};
