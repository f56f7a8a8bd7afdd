//! The normalized geographical entity and its derived index term set.

use serde::{Deserialize, Serialize};

use crate::partition::word_combinations;
use opentrep_tokenizer::normalized_terms;

/// Composite key identifying one POR. Any component may be empty, but not
/// all three at once; the Geonames ID alone is sufficient for uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceKey {
    pub iata_code: Option<String>,
    pub icao_code: Option<String>,
    pub geoname_id: Option<u64>,
}

impl PlaceKey {
    pub fn new(
        iata_code: Option<String>,
        icao_code: Option<String>,
        geoname_id: Option<u64>,
    ) -> Option<PlaceKey> {
        if iata_code.is_none() && icao_code.is_none() && geoname_id.is_none() {
            return None;
        }
        Some(PlaceKey { iata_code, icao_code, geoname_id })
    }
}

/// Point-of-reference category. Kept open-ended (`Other`) because real POR
/// dumps carry feature codes beyond the handful enumerated by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PorType {
    Airport,
    City,
    Rail,
    Bus,
    Port,
    Heliport,
    OffPoint,
    Metro,
    Other(String),
}

/// A single alternate name: a BCP-47-ish language tag paired with the name
/// in that language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateName {
    pub lang: String,
    pub name: String,
}

/// One POR (point of reference): airport, city, rail station, bus station,
/// port, heliport, metropolitan area, or an off-point alias of one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub key: PlaceKey,
    pub common_name: String,
    pub ascii_name: String,
    pub alternate_names: Vec<AlternateName>,
    pub faa_code: Option<String>,
    pub city_code: Option<String>,
    pub country_code: Option<String>,
    pub continent_code: Option<String>,
    pub admin1_code: Option<String>,
    pub admin2_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub por_type: PorType,
    pub page_rank: f64,
    pub time_zone: Option<String>,
    pub feature_class: Option<String>,
    pub feature_code: Option<String>,
}

/// The sentinel common name meaning "skip this POR line".
pub const NOT_AVAILABLE: &str = "NotAvailable";

impl Place {
    /// Every field that feeds term generation: name, ASCII name, each
    /// alternate name, city code, and the IATA/ICAO/FAA codes.
    fn indexable_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.common_name.as_str(), self.ascii_name.as_str()];
        fields.extend(self.alternate_names.iter().map(|a| a.name.as_str()));
        if let Some(code) = &self.city_code {
            fields.push(code);
        }
        if let Some(code) = &self.key.iata_code {
            fields.push(code);
        }
        if let Some(code) = &self.key.icao_code {
            fields.push(code);
        }
        if let Some(code) = &self.faa_code {
            fields.push(code);
        }
        fields
    }

    /// Computes the term set (union of tokenized terms and every
    /// sub-phrase combination, over every indexable field) and the spelling
    /// set (the same terms, registered for approximate match).
    ///
    /// The two sets happen to be identical in this implementation — every
    /// indexed term is also spelling-correctable — but are kept distinct in
    /// the return type since they serve two separate downstream purposes.
    pub fn build_index_sets(&self) -> (Vec<String>, Vec<String>) {
        let mut terms = Vec::new();

        for field in self.indexable_fields() {
            for word in field.split_whitespace() {
                terms.push(opentrep_tokenizer::normalize_term(word));
            }
            for combination in word_combinations(field) {
                terms.push(opentrep_tokenizer::normalize_term(&combination));
            }
            // normalized_terms also catches punctuation-joined codes
            // ("San Francisco" vs "San-Francisco") the whitespace split above misses.
            terms.extend(normalized_terms(field));
        }

        terms.sort();
        terms.dedup();
        terms.retain(|t| !t.is_empty());

        let spelling = terms.clone();
        (terms, spelling)
    }
}
