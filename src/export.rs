//! Reverse crosswalk: canonical document to DCAT JSON-LD
//!
//! The document is flattened against a fixed JSON-LD context. Language
//! variants of multilingual fields become `<field>_<lang>` keys, each backed
//! by a language-tagged context term.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};
use url::Url;

use crate::dates::{normalize_datestring, DateFormat};
use crate::error::Result;
use crate::model::{CharString, Document};
use crate::schemas::Output;
use crate::vocab::PREFIXES;

/// Root sections that are not carried into DCAT
const SKIPPED_SECTIONS: &[&str] = &["mcf", "content_info", "acquisition"];

/// Multilingual fields and the DCAT terms they map to
const LOCALIZED_TERMS: &[(&str, &str)] = &[
    ("title", "dct:title"),
    ("abstract", "dct:description"),
    ("rights", "dct:rights"),
    ("name", "dct:title"),
    ("description", "dct:description"),
    ("keywords", "dcat:keyword"),
];

/// Term mappings of the DCAT context, beside the namespace prefixes
const CONTEXT_TERMS: &[(&str, &str)] = &[
    ("identifier", "dct:identifier"),
    ("topiccategory", "dcat:theme"),
    ("language", "dct:language"),
    ("title", "dct:title"),
    ("abstract", "dct:description"),
    ("distribution", "dcat:distribution"),
    ("url", "dcat:accessURL"),
    ("download_url", "dcat:downloadURL"),
    ("name", "dct:title"),
    ("description", "dct:description"),
    ("keywords", "dcat:keyword"),
    ("contact", "dcat:contactPoint"),
    ("spatial", "dct:spatial"),
    ("temporal", "dct:temporal"),
    ("creation", "dct:created"),
    ("publication", "dct:issued"),
    ("revision", "dct:modified"),
    ("maintenancefrequency", "dct:accrualPeriodicity"),
    ("edition", "dcat:version"),
    ("license", "dct:license"),
    ("format", "dct:format"),
    ("type", "dcat:mediaType"),
    ("size", "dcat:byteSize"),
    ("status", "adms:status"),
    ("organization", "vcard:hasOrganizationName"),
    ("individualname", "vcard:fn"),
    ("phone", "vcard:hasTelephone"),
    ("address", "vcard:street-address"),
    ("city", "vcard:locality"),
    ("administrativearea", "vcard:region"),
    ("postalcode", "vcard:postal-code"),
    ("country", "vcard:country-name"),
    ("email", "vcard:hasEmail"),
    ("accessconstraints", "dct:accessRights"),
    ("rights", "dct:rights"),
    ("bbox", "dcat:bbox"),
    ("begin", "dcat:startDate"),
    ("end", "dcat:endDate"),
];

fn localized_term(field: &str) -> Option<&'static str> {
    LOCALIZED_TERMS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, term)| *term)
}

/// Flattened DCAT record under construction
struct DcatBuilder {
    record: Map<String, Value>,
    /// `(field, lang)` pairs needing a language-tagged context term
    localized: BTreeSet<(String, String)>,
}

impl DcatBuilder {
    fn new() -> Self {
        let mut record = Map::new();
        record.insert("@type".to_string(), json!("dcat:Dataset"));
        Self {
            record,
            localized: BTreeSet::new(),
        }
    }

    /// Insert a field, splitting language variants of multilingual fields
    fn put(&mut self, key: &str, value: Value) {
        split_localized(key, value, &mut self.record, &mut self.localized);
    }

    fn push(&mut self, key: &str, item: Value) {
        let slot = self
            .record
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(item),
            other => *other = Value::Array(vec![other.take(), item]),
        }
    }

    fn unnest_section(&mut self, section: &Map<String, Value>) -> Result<()> {
        for (key, value) in section {
            match key.as_str() {
                "extents" => self.unnest_extents(value),
                "keywords" => self.unnest_keywords(value),
                "dates" => {
                    if let Value::Object(dates) = value {
                        for (role, date) in dates {
                            let date = normalize_datestring(date, DateFormat::Default)?;
                            self.put(role, date);
                        }
                    }
                }
                "license" => self.put(key, license_value(value)),
                _ => self.put(key, value.clone()),
            }
        }
        Ok(())
    }

    fn unnest_extents(&mut self, extents: &Value) {
        let tagged = [("spatial", "dct:Location"), ("temporal", "dct:PeriodOfTime")];
        for (kind, type_tag) in tagged {
            let Some(Value::Array(items)) = extents.get(kind) else {
                continue;
            };
            let items = items
                .iter()
                .map(|item| {
                    let mut item = item.clone();
                    if let Value::Object(obj) = &mut item {
                        obj.insert("@type".to_string(), json!(type_tag));
                    }
                    item
                })
                .collect();
            self.record.insert(kind.to_string(), Value::Array(items));
        }
    }

    /// Flatten `keywords.*.keywords` into `keywords` / `keywords_<lang>`
    fn unnest_keywords(&mut self, keywords: &Value) {
        let Value::Object(buckets) = keywords else {
            return;
        };
        for bucket in buckets.values() {
            match bucket.get("keywords") {
                Some(Value::Array(words)) => {
                    for word in words {
                        self.push("keywords", word.clone());
                    }
                }
                Some(Value::Object(per_lang)) => {
                    for (lang, words) in per_lang {
                        let key = format!("keywords_{}", lang);
                        self.localized.insert(("keywords".to_string(), lang.clone()));
                        for word in words.as_array().into_iter().flatten() {
                            self.push(&key, word.clone());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Re-array a keyed section (`contact`, `distribution`) with type tags
    fn rearray(&mut self, key: &str, section: &Map<String, Value>, type_tag: &str) {
        let mut items = Vec::new();
        for entry in section.values() {
            let Value::Object(fields) = entry else {
                continue;
            };
            let mut item = Map::new();
            for (field, value) in fields {
                let value = if field == "license" {
                    license_value(value)
                } else {
                    value.clone()
                };
                split_localized(field, value, &mut item, &mut self.localized);
            }
            if let Some(url) = item.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()) {
                let id = url.to_string();
                item.insert("@id".to_string(), json!(id));
            }
            item.insert("@type".to_string(), json!(type_tag));
            items.push(Value::Object(item));
        }
        self.record.insert(key.to_string(), Value::Array(items));
    }

    fn context(&self) -> Value {
        let mut ctx = Map::new();
        for (prefix, ns) in PREFIXES {
            ctx.insert(prefix.to_string(), json!(ns));
        }
        for (term, iri) in CONTEXT_TERMS {
            ctx.insert(term.to_string(), json!(iri));
        }
        for (field, lang) in &self.localized {
            if let Some(iri) = localized_term(field) {
                ctx.insert(
                    format!("{}_{}", field, lang),
                    json!({"@id": iri, "@language": lang}),
                );
            }
        }
        Value::Object(ctx)
    }

    fn finish(self) -> Value {
        let mut out = Map::new();
        out.insert("@context".to_string(), self.context());
        out.extend(self.record);
        Value::Object(out)
    }
}

/// Write a value, or its `<key>_<lang>` variants for a localized mapping
fn split_localized(
    key: &str,
    value: Value,
    target: &mut Map<String, Value>,
    localized: &mut BTreeSet<(String, String)>,
) {
    if localized_term(key).is_some() && value.is_object() {
        if let Some(CharString::Localized(per_lang)) = CharString::from_value(&value) {
            for (lang, text) in per_lang {
                localized.insert((key.to_string(), lang.clone()));
                target.insert(format!("{}_{}", key, lang), json!(text));
            }
            return;
        }
    }
    target.insert(key.to_string(), value);
}

/// A license mapping `{name, url}` becomes its url, or its name
fn license_value(value: &Value) -> Value {
    match value {
        Value::Object(obj) => obj
            .get("url")
            .filter(|u| u.as_str().is_some_and(|s| !s.is_empty()))
            .or_else(|| obj.get("name"))
            .cloned()
            .unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Dataset URI: `metadata.dataseturi`, else an identifier that is an absolute URI
fn dataset_uri(doc: &Document) -> Option<String> {
    if let Some(uri) = doc.get_str("metadata.dataseturi").filter(|u| !u.is_empty()) {
        return Some(uri.to_string());
    }
    doc.get_str("metadata.identifier")
        .filter(|id| Url::parse(id).is_ok())
        .map(str::to_string)
}

/// Flatten a canonical document into DCAT JSON-LD
///
/// # Arguments
/// * `doc` - The resolved canonical document
/// * `stringify` - Return serialized JSON text instead of the structure
pub fn to_dcat(doc: &Document, stringify: bool) -> Result<Output> {
    let mut builder = DcatBuilder::new();

    if let Some(uri) = dataset_uri(doc) {
        builder.record.insert("@id".to_string(), json!(uri));
    }

    for (key, value) in doc.as_map() {
        match (key.as_str(), value) {
            (k, _) if SKIPPED_SECTIONS.contains(&k) => {}
            ("metadata" | "identification", Value::Object(section)) => {
                builder.unnest_section(section)?;
            }
            ("distribution", Value::Object(section)) => {
                builder.rearray(key, section, "dcat:Distribution");
            }
            ("contact", Value::Object(section)) => {
                builder.rearray(key, section, "vcard:Organization");
            }
            _ => {
                builder.record.insert(key.clone(), value.clone());
            }
        }
    }
    // dataseturi is emitted as @id
    builder.record.remove("dataseturi");

    let dcat = builder.finish();
    tracing::debug!(keys = dcat.as_object().map_or(0, Map::len), "wrote DCAT record");

    if stringify {
        Ok(Output::Text(serde_json::to_string_pretty(&dcat)?))
    } else {
        Ok(Output::Native(dcat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(doc: Value) -> Value {
        let doc = Document::try_from(doc).unwrap();
        match to_dcat(&doc, false).unwrap() {
            Output::Native(v) => v,
            Output::Text(_) => panic!("expected native output"),
        }
    }

    fn sample() -> Value {
        json!({
            "mcf": {"version": "1.0"},
            "metadata": {
                "identifier": "https://example.org/ds/1",
                "language": "en"
            },
            "identification": {
                "title": {"en": "Rain gauges", "fr": "Pluviomètres"},
                "abstract": "Hourly totals",
                "dates": {"creation": "2020-01-01", "revision": "$year$-01-01"},
                "keywords": {
                    "default": {"keywords": {"en": ["rain"], "fr": ["pluie"]}},
                    "gcmd": {
                        "keywords": ["precipitation"],
                        "vocabulary": {"name": "GCMD"}
                    }
                },
                "extents": {
                    "spatial": [{"bbox": [-141, 42, -52, 84], "crs": 4326}],
                    "temporal": [{"begin": "2020-01-01", "end": "2020-12-31"}]
                },
                "license": {"name": "CC-BY-4.0", "url": "https://creativecommons.org/licenses/by/4.0/"}
            },
            "contact": {
                "main": {"organization": "Weather Office", "url": "https://example.org"}
            },
            "distribution": {
                "csv": {
                    "url": "https://example.org/data.csv",
                    "name": {"en": "CSV", "fr": "CSV (fr)"},
                    "format": "CSV"
                }
            },
            "custom_section": {"kept": true}
        })
    }

    #[test]
    fn test_unnest_and_drop_mcf() {
        let out = native(sample());
        assert!(out.get("mcf").is_none());
        assert!(out.get("metadata").is_none());
        assert_eq!(out["@type"], json!("dcat:Dataset"));
        assert_eq!(out["@id"], json!("https://example.org/ds/1"));
        assert_eq!(out["abstract"], json!("Hourly totals"));
        assert_eq!(out["creation"], json!("2020-01-01"));
        assert_eq!(out["license"], json!("https://creativecommons.org/licenses/by/4.0/"));
        assert_eq!(out["custom_section"], json!({"kept": true}));
    }

    #[test]
    fn test_localized_fields_split() {
        let out = native(sample());
        assert!(out.get("title").is_none());
        assert_eq!(out["title_en"], json!("Rain gauges"));
        assert_eq!(out["title_fr"], json!("Pluviomètres"));
        assert_eq!(
            out["@context"]["title_fr"],
            json!({"@id": "dct:title", "@language": "fr"})
        );
    }

    #[test]
    fn test_keywords_flattened() {
        let out = native(sample());
        assert_eq!(out["keywords"], json!(["precipitation"]));
        assert_eq!(out["keywords_en"], json!(["rain"]));
        assert_eq!(out["keywords_fr"], json!(["pluie"]));
        assert_eq!(
            out["@context"]["keywords_en"],
            json!({"@id": "dcat:keyword", "@language": "en"})
        );
    }

    #[test]
    fn test_extents_typed() {
        let out = native(sample());
        assert_eq!(out["spatial"][0]["@type"], json!("dct:Location"));
        assert_eq!(out["spatial"][0]["bbox"], json!([-141, 42, -52, 84]));
        assert_eq!(out["temporal"][0]["@type"], json!("dct:PeriodOfTime"));
    }

    #[test]
    fn test_items_rearrayed() {
        let out = native(sample());
        let dist = &out["distribution"][0];
        assert_eq!(dist["@type"], json!("dcat:Distribution"));
        assert_eq!(dist["@id"], json!("https://example.org/data.csv"));
        assert_eq!(dist["name_fr"], json!("CSV (fr)"));
        let contact = &out["contact"][0];
        assert_eq!(contact["@type"], json!("vcard:Organization"));
        assert_eq!(contact["@id"], json!("https://example.org"));
    }

    #[test]
    fn test_dataseturi_preferred() {
        let out = native(json!({
            "metadata": {"identifier": "plain-id", "dataseturi": "https://example.org/uri"},
            "identification": {"title": "T"}
        }));
        assert_eq!(out["@id"], json!("https://example.org/uri"));
        assert!(out.get("dataseturi").is_none());
        assert_eq!(out["identifier"], json!("plain-id"));

        let out = native(json!({
            "metadata": {"identifier": "plain-id"},
            "identification": {"title": "T"}
        }));
        assert!(out.get("@id").is_none());
    }

    #[test]
    fn test_stringify() {
        let doc = Document::try_from(sample()).unwrap();
        let text = match to_dcat(&doc, true).unwrap() {
            Output::Text(t) => t,
            Output::Native(_) => panic!("expected text output"),
        };
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["title_en"], json!("Rain gauges"));
    }
}
