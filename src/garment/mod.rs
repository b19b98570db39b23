// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Garment catalog and secure garment-file resolution

pub mod catalog;
pub mod containment;
pub mod resolver;

pub use catalog::{humanize_filename, list_garments, GarmentEntry};
pub use containment::is_descendant_of;
pub use resolver::{
    is_safe_identifier, GarmentFile, GarmentReference, GarmentResolver, ResolutionError,
    GARMENT_EXTENSIONS,
};
