//! Raw text -> `AddressRecord` preparation
//!
//! normalize -> canonicalize -> extract components -> locate. A failing
//! collaborator degrades its step and never aborts preparation.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::collaborators::{
    explicit_coordinate, ComponentExtractor, Geocoder, MarkerExtractor, Normalizer,
    ParsedComponents, TurkishNormalizer,
};
use crate::gazetteer::Gazetteer;
use crate::normalization::{canonicalize, fold_turkish};
use crate::record::AddressRecord;

/// Prepares records with the configured collaborators.
#[derive(Clone)]
pub struct RecordPipeline {
    gazetteer: Arc<Gazetteer>,
    normalizer: Arc<dyn Normalizer>,
    extractor: Arc<dyn ComponentExtractor>,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl RecordPipeline {
    /// Built-in normalizer and marker extractor, no geocoder.
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self {
            normalizer: Arc::new(TurkishNormalizer::new(gazetteer.clone())),
            extractor: Arc::new(MarkerExtractor::new(gazetteer.clone())),
            geocoder: None,
            gazetteer,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ComponentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Prepare one raw address.
    pub fn prepare(&self, raw: &str) -> AddressRecord {
        // Collaborator output is canonicalized again so every comparator sees
        // folded, abbreviation-expanded text
        let corrected = match self.normalizer.normalize(raw) {
            Ok(normalized) => normalized.text,
            Err(e) => {
                tracing::debug!(error = %e, "Normalizer failed, falling back to folding");
                fold_turkish(raw)
            }
        };
        let normalized = canonicalize(&corrected, &self.gazetteer).text;

        let parsed = match self.extractor.extract(&normalized) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "Component extraction failed, using empty hierarchy");
                ParsedComponents::default()
            }
        };

        let coordinate = explicit_coordinate(raw).or_else(|| {
            let geocoder = self.geocoder.as_ref()?;
            match geocoder.locate(&parsed.components) {
                Ok(coordinate) => coordinate,
                Err(e) => {
                    tracing::debug!(error = %e, "Geocoder failed, no coordinate");
                    None
                }
            }
        });

        let abbreviated = self.abbreviated_words(raw);
        AddressRecord::new(raw, normalized, parsed.components, coordinate)
            .with_abbreviated(abbreviated)
    }

    /// Expansions of the abbreviations written in `raw`.
    fn abbreviated_words(&self, raw: &str) -> BTreeSet<String> {
        fold_turkish(raw)
            .split(' ')
            .filter_map(|word| {
                let full = self.gazetteer.expansion(word)?;
                self.gazetteer
                    .abbreviates(word, full)
                    .then(|| full.to_string())
            })
            .collect()
    }

    /// Prepare every address of a batch, preserving order.
    pub fn prepare_all<S: AsRef<str>>(&self, addresses: &[S]) -> Vec<AddressRecord> {
        addresses.iter().map(|a| self.prepare(a.as_ref())).collect()
    }

    pub fn gazetteer(&self) -> &Arc<Gazetteer> {
        &self.gazetteer
    }
}

impl fmt::Debug for RecordPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordPipeline")
            .field("geocoder", &self.geocoder.is_some())
            .finish_non_exhaustive()
    }
}
