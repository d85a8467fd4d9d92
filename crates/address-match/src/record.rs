//! Address record types shared by every comparator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both values are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in kilometres (haversine formula).
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// The hierarchy levels of a Turkish address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyField {
    Province,
    District,
    Neighborhood,
    Street,
    BuildingNo,
    ApartmentNo,
}

impl HierarchyField {
    pub const ALL: [HierarchyField; 6] = [
        HierarchyField::Province,
        HierarchyField::District,
        HierarchyField::Neighborhood,
        HierarchyField::Street,
        HierarchyField::BuildingNo,
        HierarchyField::ApartmentNo,
    ];

    /// Numbers compare exactly; names compare fuzzily.
    pub fn is_numeric(&self) -> bool {
        matches!(self, HierarchyField::BuildingNo | HierarchyField::ApartmentNo)
    }
}

/// Parsed address hierarchy. Every level may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(uniffi::Record))]
pub struct AddressComponents {
    pub province: Option<String>,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub street: Option<String>,
    pub building_no: Option<String>,
    pub apartment_no: Option<String>,
}

impl AddressComponents {
    pub fn get(&self, field: HierarchyField) -> Option<&str> {
        let value = match field {
            HierarchyField::Province => &self.province,
            HierarchyField::District => &self.district,
            HierarchyField::Neighborhood => &self.neighborhood,
            HierarchyField::Street => &self.street,
            HierarchyField::BuildingNo => &self.building_no,
            HierarchyField::ApartmentNo => &self.apartment_no,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        HierarchyField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// One address prepared for comparison.
///
/// Built once per input; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    raw: String,
    normalized: String,
    components: AddressComponents,
    coordinate: Option<Coordinate>,
    /// Full words the raw text wrote in abbreviated form (`cd.` -> `caddesi`)
    #[serde(default)]
    abbreviated: BTreeSet<String>,
}

impl AddressRecord {
    pub fn new(
        raw: impl Into<String>,
        normalized: impl Into<String>,
        components: AddressComponents,
        coordinate: Option<Coordinate>,
    ) -> Self {
        Self {
            raw: raw.into(),
            normalized: normalized.into(),
            components,
            coordinate: coordinate.filter(Coordinate::is_valid),
            abbreviated: BTreeSet::new(),
        }
    }

    pub fn with_abbreviated<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.abbreviated = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn components(&self) -> &AddressComponents {
        &self.components
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    pub fn abbreviated(&self) -> &BTreeSet<String> {
        &self.abbreviated
    }

    /// True when the raw text spelled `word` in short form.
    pub fn abbreviates(&self, word: &str) -> bool {
        self.abbreviated.contains(word)
    }

    /// Empty or whitespace-only normalized text cannot be compared.
    pub fn is_blank(&self) -> bool {
        self.normalized.trim().is_empty()
    }
}
