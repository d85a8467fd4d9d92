//! Turkish administrative reference data.
//!
//! Names are stored in folded form (lowercase ASCII, see
//! [`crate::normalization::fold_turkish`]). A `Gazetteer` is built once and
//! shared read-only by every component through an `Arc`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::record::Coordinate;

/// Serializable reference tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerData {
    pub provinces: Vec<String>,
    pub major_cities: Vec<String>,
    /// Province -> districts
    pub districts: HashMap<String, Vec<String>>,
    /// Unordered pairs of bordering provinces
    pub neighbors: Vec<(String, String)>,
    /// Keyed by `province` or `province/district`
    pub centroids: HashMap<String, Coordinate>,
    /// Short form -> canonical long form
    pub abbreviations: HashMap<String, String>,
    /// Address vocabulary carrying no location identity (mahallesi, sokak, ...)
    pub generic_terms: Vec<String>,
}

/// Indexed, immutable reference data.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    provinces: HashSet<String>,
    major_cities: HashSet<String>,
    district_province: HashMap<String, String>,
    neighbors: HashSet<(String, String)>,
    centroids: HashMap<String, Coordinate>,
    abbreviations: HashMap<String, String>,
    generic_terms: HashSet<String>,
}

impl Gazetteer {
    /// Build the index from raw tables.
    pub fn from_data(data: GazetteerData) -> Self {
        let mut district_province = HashMap::new();
        for (province, districts) in &data.districts {
            for district in districts {
                district_province
                    .entry(district.clone())
                    .or_insert_with(|| province.clone());
            }
        }

        let neighbors = data
            .neighbors
            .iter()
            .map(|(a, b)| ordered_pair(a, b))
            .collect();

        Self {
            provinces: data.provinces.into_iter().collect(),
            major_cities: data.major_cities.into_iter().collect(),
            district_province,
            neighbors,
            centroids: data.centroids,
            abbreviations: data.abbreviations,
            generic_terms: data.generic_terms.into_iter().collect(),
        }
    }

    /// Load reference tables from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: GazetteerData =
            serde_json::from_str(json).map_err(|e| MatchError::Gazetteer(e.to_string()))?;
        Ok(Self::from_data(data))
    }

    /// Built-in Turkish tables: all 81 provinces, major-city districts,
    /// bordering provinces, centroids, and postal abbreviations.
    pub fn turkey() -> Self {
        Self::from_data(turkey_data())
    }

    pub fn is_province(&self, name: &str) -> bool {
        self.provinces.contains(name)
    }

    pub fn is_major_city(&self, name: &str) -> bool {
        self.major_cities.contains(name)
    }

    pub fn is_district(&self, name: &str) -> bool {
        self.district_province.contains_key(name)
    }

    pub fn province_of_district(&self, district: &str) -> Option<&str> {
        self.district_province.get(district).map(String::as_str)
    }

    pub fn are_neighbors(&self, a: &str, b: &str) -> bool {
        self.neighbors.contains(&ordered_pair(a, b))
    }

    /// District centroid when known, otherwise the province centroid.
    pub fn centroid(&self, province: &str, district: Option<&str>) -> Option<Coordinate> {
        district
            .and_then(|d| self.centroids.get(&format!("{}/{}", province, d)))
            .or_else(|| self.centroids.get(province))
            .copied()
    }

    pub fn expansion(&self, short: &str) -> Option<&str> {
        self.abbreviations.get(short).map(String::as_str)
    }

    /// True when `short` abbreviates `full`.
    pub fn abbreviates(&self, short: &str, full: &str) -> bool {
        short != full && self.expansion(short) == Some(full)
    }

    pub fn is_generic(&self, term: &str) -> bool {
        self.generic_terms.contains(term)
    }

    /// Province or district names carry more identity than other words.
    pub fn is_place_name(&self, term: &str) -> bool {
        self.is_province(term) || self.is_district(term)
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::turkey()
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

const PROVINCES: &[&str] = &[
    "adana", "adiyaman", "afyonkarahisar", "agri", "amasya", "ankara", "antalya", "artvin",
    "aydin", "balikesir", "bilecik", "bingol", "bitlis", "bolu", "burdur", "bursa", "canakkale",
    "cankiri", "corum", "denizli", "diyarbakir", "edirne", "elazig", "erzincan", "erzurum",
    "eskisehir", "gaziantep", "giresun", "gumushane", "hakkari", "hatay", "isparta", "mersin",
    "istanbul", "izmir", "kars", "kastamonu", "kayseri", "kirklareli", "kirsehir", "kocaeli",
    "konya", "kutahya", "malatya", "manisa", "kahramanmaras", "mardin", "mugla", "mus",
    "nevsehir", "nigde", "ordu", "rize", "sakarya", "samsun", "siirt", "sinop", "sivas",
    "tekirdag", "tokat", "trabzon", "tunceli", "sanliurfa", "usak", "van", "yozgat", "zonguldak",
    "aksaray", "bayburt", "karaman", "kirikkale", "batman", "sirnak", "bartin", "ardahan",
    "igdir", "yalova", "karabuk", "kilis", "osmaniye", "duzce",
];

const MAJOR_CITIES: &[&str] = &[
    "istanbul", "ankara", "izmir", "bursa", "antalya", "adana", "konya", "gaziantep",
    "sanliurfa", "kocaeli", "mersin", "diyarbakir", "kayseri", "eskisehir", "samsun",
];

const DISTRICTS: &[(&str, &[&str])] = &[
    (
        "istanbul",
        &[
            "adalar", "arnavutkoy", "atasehir", "avcilar", "bagcilar", "bahcelievler", "bakirkoy",
            "basaksehir", "bayrampasa", "besiktas", "beykoz", "beylikduzu", "beyoglu",
            "buyukcekmece", "catalca", "cekmekoy", "esenler", "esenyurt", "eyupsultan", "fatih",
            "gaziosmanpasa", "gungoren", "kadikoy", "kagithane", "kartal", "kucukcekmece",
            "maltepe", "pendik", "sancaktepe", "sariyer", "silivri", "sultanbeyli", "sultangazi",
            "sile", "sisli", "tuzla", "umraniye", "uskudar", "zeytinburnu",
        ],
    ),
    (
        "ankara",
        &[
            "altindag", "cankaya", "etimesgut", "golbasi", "kecioren", "mamak", "pursaklar",
            "sincan", "yenimahalle", "polatli",
        ],
    ),
    (
        "izmir",
        &[
            "bayrakli", "bornova", "buca", "cigli", "gaziemir", "karsiyaka", "konak", "karabaglar",
            "narlidere", "balcova", "urla", "cesme",
        ],
    ),
    ("bursa", &["nilufer", "osmangazi", "yildirim", "mudanya", "gemlik", "inegol"]),
    ("antalya", &["muratpasa", "konyaalti", "kepez", "alanya", "manavgat", "kemer"]),
    ("adana", &["seyhan", "cukurova", "yuregir", "saricam"]),
    ("konya", &["selcuklu", "meram", "karatay"]),
    ("kocaeli", &["izmit", "gebze", "golcuk", "darica", "kartepe"]),
    ("trabzon", &["ortahisar", "akcaabat"]),
    ("eskisehir", &["odunpazari", "tepebasi"]),
    ("gaziantep", &["sahinbey", "sehitkamil"]),
];

const NEIGHBORS: &[(&str, &str)] = &[
    ("istanbul", "kocaeli"), ("istanbul", "tekirdag"), ("kocaeli", "sakarya"),
    ("kocaeli", "yalova"), ("kocaeli", "bursa"), ("bursa", "yalova"), ("bursa", "balikesir"),
    ("bursa", "bilecik"), ("bursa", "kutahya"), ("ankara", "konya"), ("ankara", "eskisehir"),
    ("ankara", "bolu"), ("ankara", "cankiri"), ("ankara", "kirikkale"), ("ankara", "kirsehir"),
    ("ankara", "aksaray"), ("izmir", "manisa"), ("izmir", "aydin"), ("antalya", "mugla"),
    ("antalya", "burdur"), ("antalya", "isparta"), ("antalya", "konya"), ("antalya", "karaman"),
    ("antalya", "mersin"), ("adana", "mersin"), ("adana", "osmaniye"), ("adana", "hatay"),
    ("adana", "kayseri"), ("adana", "nigde"), ("adana", "kahramanmaras"), ("konya", "karaman"),
    ("konya", "aksaray"), ("konya", "eskisehir"), ("gaziantep", "kilis"),
    ("gaziantep", "sanliurfa"), ("gaziantep", "adiyaman"), ("gaziantep", "kahramanmaras"),
    ("gaziantep", "osmaniye"), ("gaziantep", "hatay"), ("trabzon", "rize"),
    ("trabzon", "giresun"), ("trabzon", "gumushane"), ("trabzon", "bayburt"), ("samsun", "ordu"),
    ("samsun", "sinop"), ("samsun", "amasya"), ("samsun", "tokat"), ("samsun", "corum"),
    ("diyarbakir", "mardin"), ("diyarbakir", "batman"), ("diyarbakir", "sanliurfa"),
    ("diyarbakir", "elazig"), ("diyarbakir", "bingol"), ("diyarbakir", "mus"),
    ("diyarbakir", "siirt"), ("diyarbakir", "adiyaman"), ("eskisehir", "kutahya"),
    ("eskisehir", "bilecik"), ("eskisehir", "afyonkarahisar"), ("kayseri", "sivas"),
    ("kayseri", "nevsehir"), ("kayseri", "yozgat"), ("kayseri", "malatya"),
    ("kayseri", "kahramanmaras"), ("kayseri", "nigde"), ("tekirdag", "kirklareli"),
    ("tekirdag", "edirne"), ("tekirdag", "canakkale"), ("edirne", "kirklareli"),
    ("edirne", "canakkale"),
];

const CENTROIDS: &[(&str, f64, f64)] = &[
    ("istanbul", 41.0082, 28.9784),
    ("ankara", 39.9334, 32.8597),
    ("izmir", 38.4237, 27.1428),
    ("bursa", 40.1885, 29.0610),
    ("antalya", 36.8969, 30.7133),
    ("adana", 37.0000, 35.3213),
    ("konya", 37.8746, 32.4932),
    ("gaziantep", 37.0662, 37.3833),
    ("sanliurfa", 37.1591, 38.7969),
    ("kocaeli", 40.8533, 29.8815),
    ("mersin", 36.8121, 34.6415),
    ("diyarbakir", 37.9144, 40.2306),
    ("kayseri", 38.7312, 35.4787),
    ("eskisehir", 39.7767, 30.5206),
    ("samsun", 41.2928, 36.3313),
    ("trabzon", 41.0027, 39.7168),
    ("tekirdag", 40.9781, 27.5117),
    ("sakarya", 40.7569, 30.3783),
    ("yalova", 40.6500, 29.2667),
    ("manisa", 38.6191, 27.4289),
    ("aydin", 37.8560, 27.8416),
    ("mugla", 37.2153, 28.3636),
    ("denizli", 37.7765, 29.0864),
    ("balikesir", 39.6484, 27.8826),
    ("edirne", 41.6771, 26.5557),
    ("hatay", 36.2021, 36.1600),
    ("malatya", 38.3552, 38.3095),
    ("erzurum", 39.9043, 41.2679),
    ("van", 38.5012, 43.3730),
    ("kahramanmaras", 37.5858, 36.9371),
    ("istanbul/kadikoy", 40.9903, 29.0290),
    ("istanbul/besiktas", 41.0422, 29.0083),
    ("istanbul/uskudar", 41.0260, 29.0150),
    ("istanbul/fatih", 41.0186, 28.9397),
    ("istanbul/sisli", 41.0602, 28.9877),
    ("istanbul/beyoglu", 41.0370, 28.9770),
    ("ankara/cankaya", 39.9179, 32.8627),
    ("ankara/kecioren", 39.9800, 32.8650),
    ("izmir/konak", 38.4189, 27.1287),
    ("izmir/karsiyaka", 38.4600, 27.1100),
    ("izmir/bornova", 38.4697, 27.2211),
    ("bursa/nilufer", 40.2140, 28.9870),
    ("antalya/muratpasa", 36.8850, 30.7040),
    ("trabzon/ortahisar", 41.0050, 39.7300),
];

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("mah", "mahallesi"),
    ("mh", "mahallesi"),
    ("mahalle", "mahallesi"),
    ("cad", "caddesi"),
    ("cd", "caddesi"),
    ("cadde", "caddesi"),
    ("sk", "sokak"),
    ("sok", "sokak"),
    ("sokagi", "sokak"),
    ("blv", "bulvari"),
    ("bulv", "bulvari"),
    ("bulvar", "bulvari"),
    ("apt", "apartmani"),
    ("ap", "apartmani"),
    ("no", "numara"),
    ("nu", "numara"),
    ("d", "daire"),
    ("ist", "istanbul"),
    ("ank", "ankara"),
    ("izm", "izmir"),
    ("antep", "gaziantep"),
    ("urfa", "sanliurfa"),
    ("maras", "kahramanmaras"),
    ("afyon", "afyonkarahisar"),
];

const GENERIC_TERMS: &[&str] = &[
    "mahallesi", "caddesi", "sokak", "bulvari", "apartmani", "numara", "daire", "kat", "blok",
    "sitesi", "evleri", "kume", "yolu", "ilce", "il", "merkez",
];

fn turkey_data() -> GazetteerData {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    GazetteerData {
        provinces: strings(PROVINCES),
        major_cities: strings(MAJOR_CITIES),
        districts: DISTRICTS
            .iter()
            .map(|(province, districts)| (province.to_string(), strings(districts)))
            .collect(),
        neighbors: NEIGHBORS
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect(),
        centroids: CENTROIDS
            .iter()
            .map(|(key, lat, lon)| (key.to_string(), Coordinate::new(*lat, *lon)))
            .collect(),
        abbreviations: ABBREVIATIONS
            .iter()
            .map(|(short, full)| (short.to_string(), full.to_string()))
            .collect(),
        generic_terms: strings(GENERIC_TERMS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_provinces_present() {
        let gazetteer = Gazetteer::turkey();
        assert_eq!(PROVINCES.len(), 81);
        assert!(gazetteer.is_province("istanbul"));
        assert!(gazetteer.is_province("sanliurfa"));
        assert!(!gazetteer.is_province("kadikoy"));
    }

    #[test]
    fn test_district_lookup() {
        let gazetteer = Gazetteer::turkey();
        assert_eq!(gazetteer.province_of_district("kadikoy"), Some("istanbul"));
        assert_eq!(gazetteer.province_of_district("cankaya"), Some("ankara"));
        assert!(gazetteer.is_place_name("bornova"));
    }

    #[test]
    fn test_neighbors_are_unordered() {
        let gazetteer = Gazetteer::turkey();
        assert!(gazetteer.are_neighbors("istanbul", "kocaeli"));
        assert!(gazetteer.are_neighbors("kocaeli", "istanbul"));
        assert!(!gazetteer.are_neighbors("istanbul", "ankara"));
    }

    #[test]
    fn test_centroid_prefers_district() {
        let gazetteer = Gazetteer::turkey();
        let district = gazetteer.centroid("istanbul", Some("kadikoy")).unwrap();
        let province = gazetteer.centroid("istanbul", None).unwrap();
        assert_ne!(district, province);
        assert_eq!(gazetteer.centroid("istanbul", Some("tuzla")), Some(province));
        assert_eq!(gazetteer.centroid("atlantis", None), None);
    }

    #[test]
    fn test_abbreviations() {
        let gazetteer = Gazetteer::turkey();
        assert_eq!(gazetteer.expansion("mah"), Some("mahallesi"));
        assert!(gazetteer.abbreviates("cd", "caddesi"));
        assert!(!gazetteer.abbreviates("caddesi", "caddesi"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "provinces": ["istanbul"],
            "districts": {"istanbul": ["kadikoy"]},
            "centroids": {"istanbul": {"latitude": 41.0, "longitude": 29.0}}
        }"#;
        let gazetteer = Gazetteer::from_json(json).unwrap();
        assert!(gazetteer.is_province("istanbul"));
        assert_eq!(gazetteer.province_of_district("kadikoy"), Some("istanbul"));
        assert!(gazetteer.expansion("mah").is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Gazetteer::from_json("not json"),
            Err(MatchError::Gazetteer(_))
        ));
    }
}
