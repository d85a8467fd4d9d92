//! Upstream collaborators and their built-in fallbacks
//!
//! Spelling correction, component parsing, geocoding, and embeddings are
//! supplied from outside the matcher. Each has a trait here; the matcher works
//! (in degraded form) when any of them is missing or failing.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CollaboratorError;
use crate::gazetteer::Gazetteer;
use crate::normalization::{canonicalize, NormalizedText};
use crate::record::{AddressComponents, Coordinate, HierarchyField};

/// Raw text -> corrected text plus the corrections applied
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> Result<NormalizedText, CollaboratorError>;
}

/// Parsed hierarchy and how sure the parser is about it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedComponents {
    pub components: AddressComponents,
    /// 0.0 - 1.0
    pub confidence: f64,
}

/// Normalized text -> address hierarchy
pub trait ComponentExtractor: Send + Sync {
    fn extract(&self, normalized: &str) -> Result<ParsedComponents, CollaboratorError>;
}

/// Address hierarchy -> approximate coordinate
pub trait Geocoder: Send + Sync {
    fn locate(&self, components: &AddressComponents)
        -> Result<Option<Coordinate>, CollaboratorError>;
}

/// Text -> embedding vector
///
/// Asynchronous backends must be wrapped in a blocking adapter.
pub trait EmbeddingBackend: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError>;
}

/// Turkish case/diacritic folding plus abbreviation expansion.
#[derive(Debug, Clone)]
pub struct TurkishNormalizer {
    gazetteer: Arc<Gazetteer>,
}

impl TurkishNormalizer {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self { gazetteer }
    }
}

impl Normalizer for TurkishNormalizer {
    fn normalize(&self, raw: &str) -> Result<NormalizedText, CollaboratorError> {
        Ok(canonicalize(raw, &self.gazetteer))
    }
}

const NEIGHBORHOOD_MARKER: &str = "mahallesi";
const STREET_MARKERS: &[&str] = &["caddesi", "sokak", "bulvari"];
const BUILDING_MARKER: &str = "numara";
const APARTMENT_MARKER: &str = "daire";
const MAX_NAME_WORDS: usize = 3;

/// Keyword-marker parser over canonical text
///
/// - Province and district: first gazetteer hit
/// - Neighborhood: words before `mahallesi`; the nearest one is always kept
/// - Street: words before `caddesi` / `sokak` / `bulvari`, marker included
/// - Building: number after `numara`, else first number after the street
/// - Apartment: number after `daire`
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    gazetteer: Arc<Gazetteer>,
}

impl MarkerExtractor {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self { gazetteer }
    }

    fn is_boundary(&self, word: &str) -> bool {
        self.gazetteer.is_place_name(word) || self.gazetteer.is_generic(word)
    }

    /// Up to `MAX_NAME_WORDS` street name words ending just before `marker_at`.
    fn street_before(&self, words: &[&str], marker_at: usize) -> Option<String> {
        let mut start = marker_at;
        while start > 0 && marker_at - start < MAX_NAME_WORDS {
            if self.is_boundary(words[start - 1]) {
                break;
            }
            start -= 1;
        }
        (start < marker_at).then(|| words[start..marker_at].join(" "))
    }

    /// Neighborhood name ending just before the `mahallesi` marker.
    ///
    /// The word next to the marker always belongs to the name, even when it is
    /// also a district or a generic term (`bahcelievler`, `merkez`). Further
    /// words are taken until the province or the claimed district.
    fn neighborhood_before(
        &self,
        words: &[&str],
        marker_at: usize,
        district: Option<&str>,
    ) -> Option<String> {
        if marker_at == 0 || is_number(words[marker_at - 1]) {
            return None;
        }
        let mut start = marker_at - 1;
        while start > 0 && marker_at - start < MAX_NAME_WORDS {
            let word = words[start - 1];
            if self.gazetteer.is_province(word)
                || Some(word) == district
                || self.gazetteer.is_generic(word)
                || is_number(word)
            {
                break;
            }
            start -= 1;
        }
        Some(words[start..marker_at].join(" "))
    }
}

impl ComponentExtractor for MarkerExtractor {
    fn extract(&self, normalized: &str) -> Result<ParsedComponents, CollaboratorError> {
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let mut components = AddressComponents::default();

        let neighborhood_at = words.iter().position(|w| *w == NEIGHBORHOOD_MARKER);
        // The word naming the neighborhood is never read as province or district
        let reserved = neighborhood_at.and_then(|at| at.checked_sub(1));
        let unreserved = || {
            words
                .iter()
                .enumerate()
                .filter(move |(i, _)| Some(*i) != reserved)
                .map(|(_, w)| *w)
        };

        components.province = unreserved()
            .find(|w| self.gazetteer.is_province(w))
            .map(str::to_string);
        components.district = unreserved()
            .find(|w| self.gazetteer.is_district(w))
            .map(str::to_string);
        if components.province.is_none() {
            components.province = components
                .district
                .as_deref()
                .and_then(|d| self.gazetteer.province_of_district(d))
                .map(str::to_string);
        }

        if let Some(at) = neighborhood_at {
            components.neighborhood =
                self.neighborhood_before(&words, at, components.district.as_deref());
        }

        let street_at = words.iter().position(|w| STREET_MARKERS.contains(w));
        if let Some(at) = street_at {
            components.street = self
                .street_before(&words, at)
                .map(|name| format!("{} {}", name, words[at]));
        }

        components.building_no = number_after(&words, BUILDING_MARKER).or_else(|| {
            let from = street_at? + 1;
            words[from..]
                .iter()
                .enumerate()
                .find(|(offset, w)| {
                    let previous = words[from + offset - 1];
                    is_number(w) && previous != APARTMENT_MARKER && previous != "kat"
                })
                .map(|(_, w)| w.to_string())
        });
        components.apartment_no = number_after(&words, APARTMENT_MARKER);

        let found = HierarchyField::ALL
            .iter()
            .filter(|f| components.get(**f).is_some())
            .count();

        Ok(ParsedComponents {
            confidence: found as f64 / HierarchyField::ALL.len() as f64,
            components,
        })
    }
}

fn is_number(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn number_after(words: &[&str], marker: &str) -> Option<String> {
    words
        .windows(2)
        .find(|pair| pair[0] == marker && is_number(pair[1]))
        .map(|pair| pair[1].to_string())
}

/// Geocodes to the district centroid, else the province centroid.
#[derive(Debug, Clone)]
pub struct CentroidGeocoder {
    gazetteer: Arc<Gazetteer>,
}

impl CentroidGeocoder {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self { gazetteer }
    }
}

impl Geocoder for CentroidGeocoder {
    fn locate(
        &self,
        components: &AddressComponents,
    ) -> Result<Option<Coordinate>, CollaboratorError> {
        let Some(province) = components.province.as_deref() else {
            return Ok(None);
        };
        Ok(self
            .gazetteer
            .centroid(province, components.district.as_deref()))
    }
}

lazy_static! {
    /// `lat, lon` written inline, at least three decimals each
    static ref COORDINATE_PATTERN: Regex =
        Regex::new(r"(-?\d{1,2}\.\d{3,})\s*[,;]\s*(-?\d{1,3}\.\d{3,})")
            .expect("valid coordinate regex");
}

/// Find an explicit coordinate pair in raw address text.
pub fn explicit_coordinate(raw: &str) -> Option<Coordinate> {
    let captures = COORDINATE_PATTERN.captures(raw)?;
    let latitude = captures.get(1)?.as_str().parse().ok()?;
    let longitude = captures.get(2)?.as_str().parse().ok()?;
    let coordinate = Coordinate::new(latitude, longitude);
    coordinate.is_valid().then_some(coordinate)
}
