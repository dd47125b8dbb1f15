//! Index schema lookups used while parsing.
//!
//! The parser never inspects an index directly. It asks a [`Schema`] to resolve field
//! names to bits and to validate geo filters.

use std::str::FromStr;

use crate::{
    ast::{FieldMask, GeoFilter},
    error::QueryError,
};

/// Field resolution and filter validation for one index.
pub trait Schema: Sync {
    /// Returns the bits for `name`, or [`FieldMask::NONE`] if the field is unknown.
    fn field_mask(&self, name: &str) -> FieldMask;

    /// Checks a geo filter, returning a message describing the first problem.
    fn validate_geo_filter(&self, filter: &GeoFilter) -> Result<(), String> {
        validate_geo(filter)
    }
}

/// Distance units accepted in geo filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoUnit {
    /// Meters.
    Meters,
    /// Kilometers.
    Kilometers,
    /// Miles.
    Miles,
    /// Feet.
    Feet,
}

impl FromStr for GeoUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(Self::Meters),
            "km" => Ok(Self::Kilometers),
            "mi" => Ok(Self::Miles),
            "ft" => Ok(Self::Feet),
            _ => Err(format!("unknown geo unit: {s}")),
        }
    }
}

/// Validates units, coordinates and radius of a geo filter.
pub fn validate_geo(filter: &GeoFilter) -> Result<(), String> {
    if filter.unit.parse::<GeoUnit>().is_err() {
        return Err("Invalid GeoFilter unit".to_string());
    }
    if !(-90.0..=90.0).contains(&filter.lat) || !(-180.0..=180.0).contains(&filter.lon) {
        return Err("Invalid GeoFilter lat/lon".to_string());
    }
    if filter.radius.is_nan() || filter.radius <= 0.0 {
        return Err("Invalid GeoFilter radius".to_string());
    }
    Ok(())
}

/// A schema built from an ordered list of field names.
///
/// Field *i* resolves to bit *i*. Lookups are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSchema {
    /// Field names in bit order.
    fields: Vec<String>,
}

impl IndexSchema {
    /// Maximum number of fields a mask can address.
    pub const MAX_FIELDS: usize = 64;

    /// Creates a schema from field names.
    ///
    /// Fails if there are more fields than a [`FieldMask`] can address.
    pub fn new<I, S>(fields: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.len() > Self::MAX_FIELDS {
            return Err(QueryError::TooManyFields {
                count: fields.len(),
                limit: Self::MAX_FIELDS,
            });
        }
        Ok(Self { fields })
    }

    /// Returns the field names in bit order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl Schema for IndexSchema {
    fn field_mask(&self, name: &str) -> FieldMask {
        self.fields
            .iter()
            .position(|field| field == name)
            .and_then(FieldMask::for_field)
            .unwrap_or(FieldMask::NONE)
    }
}
