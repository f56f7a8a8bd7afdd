//! Parses one caret-separated POR line into a [`Place`]: split on `^`, then
//! on `|` for alternate names, then on `=` for the `lang=value` pairs within
//! each.

use crate::place::{AlternateName, Place, PlaceKey, PorType};

/// Field order the parser expects, a fixed subset of the real POR dump's
/// columns.
const FIELD_COUNT: usize = 19;

/// Parses one non-empty POR line. Returns `Ok(None)` when the line's common
/// name is the `"NotAvailable"` sentinel (skip, not an error). Returns
/// `Err(reason)` when the line is structurally malformed or a mandatory
/// field fails validation; the caller turns that into a counted skip.
pub fn parse_por_line(line: &str) -> Result<Option<Place>, String> {
    let fields: Vec<&str> = line.split('^').collect();
    if fields.len() < FIELD_COUNT {
        return Err(format!(
            "expected {} caret-separated fields, got {}",
            FIELD_COUNT,
            fields.len()
        ));
    }

    let iata = non_empty(fields[0]);
    let icao = non_empty(fields[1]);
    let faa = non_empty(fields[2]);
    let geoname_id = non_empty(fields[3])
        .map(|s| s.parse::<u64>().map_err(|_| format!("invalid geoname_id {s:?}")))
        .transpose()?;
    let common_name = fields[4].to_string();
    let ascii_name = fields[5].to_string();
    let alternate_names = parse_alternate_names(fields[6])?;

    if common_name == crate::place::NOT_AVAILABLE {
        return Ok(None);
    }

    let latitude: f64 = fields[7].parse().map_err(|_| format!("invalid latitude {:?}", fields[7]))?;
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {latitude} out of range"));
    }
    let longitude: f64 = fields[8].parse().map_err(|_| format!("invalid longitude {:?}", fields[8]))?;
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {longitude} out of range"));
    }

    let feature_class = non_empty(fields[9]).map(str::to_string);
    let feature_code = non_empty(fields[10]).map(str::to_string);
    let country_code = non_empty(fields[11]).map(str::to_string);
    let continent_code = non_empty(fields[12]).map(str::to_string);
    let admin1_code = non_empty(fields[13]).map(str::to_string);
    let admin2_code = non_empty(fields[14]).map(str::to_string);
    let time_zone = non_empty(fields[15]).map(str::to_string);
    let page_rank: f64 = fields[16].parse().map_err(|_| format!("invalid page_rank {:?}", fields[16]))?;
    let por_type = parse_por_type(fields[17]);
    let city_code = non_empty(fields[18]).map(str::to_string);

    let key = PlaceKey::new(iata.map(str::to_string), icao.map(str::to_string), geoname_id)
        .ok_or_else(|| "IATA, ICAO and Geonames ID are all empty".to_string())?;

    Ok(Some(Place {
        key,
        common_name,
        ascii_name,
        alternate_names,
        faa_code: faa.map(str::to_string),
        city_code,
        country_code,
        continent_code,
        admin1_code,
        admin2_code,
        latitude,
        longitude,
        por_type,
        page_rank,
        time_zone,
        feature_class,
        feature_code,
    }))
}

fn non_empty(field: &str) -> Option<&str> {
    if field.is_empty() { None } else { Some(field) }
}

fn parse_alternate_names(field: &str) -> Result<Vec<AlternateName>, String> {
    if field.is_empty() {
        return Ok(Vec::new());
    }

    field
        .split('|')
        .map(|entry| {
            let mut parts = entry.splitn(2, '=');
            let lang = parts.next().unwrap_or_default();
            let name = parts
                .next()
                .ok_or_else(|| format!("alternate name {entry:?} missing '='"))?;
            Ok(AlternateName { lang: lang.to_string(), name: name.to_string() })
        })
        .collect()
}

fn parse_por_type(field: &str) -> PorType {
    match field {
        "A" | "airport" => PorType::Airport,
        "C" | "city" => PorType::City,
        "R" | "rail" => PorType::Rail,
        "B" | "bus" => PorType::Bus,
        "P" | "port" => PorType::Port,
        "H" | "heliport" => PorType::Heliport,
        "O" | "off_point" => PorType::OffPoint,
        "" => PorType::Other(String::new()),
        other => {
            if other.eq_ignore_ascii_case("metro") || other == "M" {
                PorType::Metro
            } else {
                PorType::Other(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_line(common_name: &str, lat: &str, lon: &str, page_rank: &str) -> String {
        format!(
            "NCE^LFMN^^6299418^{common_name}^Nice Cote d'Azur^en=Nice Airport|fr=A\u{e9}roport de Nice^{lat}^{lon}^S^AIRP^FR^EU^B8^06^Europe/Paris^{page_rank}^A^NCE"
        )
    }

    #[test]
    fn parses_a_well_formed_line() {
        let line = sample_line("Nice Cote d'Azur", "43.6584", "7.2159", "0.5");
        let place = parse_por_line(&line).unwrap().unwrap();
        assert_eq!(place.key.iata_code.as_deref(), Some("NCE"));
        assert_eq!(place.key.icao_code.as_deref(), Some("LFMN"));
        assert_eq!(place.key.geoname_id, Some(6299418));
        assert_eq!(place.alternate_names.len(), 2);
        assert_eq!(place.por_type, PorType::Airport);
    }

    #[test]
    fn skips_not_available_sentinel() {
        let line = sample_line(crate::place::NOT_AVAILABLE, "43.6584", "7.2159", "0.5");
        assert!(parse_por_line(&line).unwrap().is_none());
    }

    #[test]
    fn rejects_latitude_out_of_range() {
        let line = sample_line("Nice", "123.0", "7.2159", "0.5");
        assert!(parse_por_line(&line).is_err());
    }

    #[test]
    fn rejects_non_numeric_page_rank() {
        let line = sample_line("Nice", "43.6584", "7.2159", "not-a-number");
        assert!(parse_por_line(&line).is_err());
    }

    #[test]
    fn rejects_too_few_fields() {
        assert!(parse_por_line("NCE^LFMN").is_err());
    }

    #[test]
    fn rejects_missing_composite_key() {
        let line = "^^^^ARecord^ARecord^^0^0^S^AIRP^FR^EU^B8^06^Europe/Paris^0.1^A^";
        assert!(parse_por_line(line).is_err());
    }
}
