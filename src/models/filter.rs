//! The `{from, to, role, q}` filter shared by the listing and dashboard queries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Document};
use serde::{Deserialize, Deserializer};

use crate::models::user::UserRole;

/// Document fields the free-text `q` term is matched against.
pub const SEARCH_FIELDS: [&str; 4] = ["firstName", "lastName", "email", "username"];

/// Narrowing applied to the users collection.
///
/// Dimensions compose by AND; the `q` term fans out by OR over
/// [`SEARCH_FIELDS`]. A missing (or empty) parameter means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserFilter {
    /// Inclusive lower bound on `createdAt`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `createdAt`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub role: Option<UserRole>,
    /// Case-insensitive literal substring, whitespace included.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub q: Option<String>,
}

impl UserFilter {
    /// Same role/search restriction with the date range dropped.
    pub fn without_range(&self) -> Self {
        Self {
            from: None,
            to: None,
            ..self.clone()
        }
    }

    pub fn has_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Translate into a MongoDB `$match` document.
    pub fn to_match(&self) -> Document {
        let mut filter = Document::new();

        if self.has_range() {
            let mut range = Document::new();
            if let Some(from) = self.from {
                range.insert("$gte", bson::DateTime::from_chrono(from));
            }
            if let Some(to) = self.to {
                range.insert("$lte", bson::DateTime::from_chrono(to));
            }
            filter.insert("createdAt", range);
        }

        if let Some(role) = self.role {
            filter.insert("role", role.as_str());
        }

        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            let pattern = regex::escape(q);
            let clauses: Vec<Document> = SEARCH_FIELDS
                .iter()
                .map(|field| {
                    let mut clause = Document::new();
                    clause.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
                    clause
                })
                .collect();
            filter.insert("$or", clauses);
        }

        filter
    }
}

/// Deserialize an optional query value, treating a blank string as absent.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Keep a free-text value verbatim; only an all-whitespace value counts as absent.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Decode `k=v&k=v` pairs the way a query string reaches the extractor.
    fn parse(query: &str) -> Result<UserFilter, serde_json::Error> {
        let pairs: serde_json::Map<String, serde_json::Value> = query
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| {
                let (k, v) = p.split_once('=').unwrap_or((p, ""));
                (k.to_string(), serde_json::Value::String(v.to_string()))
            })
            .collect();
        serde_json::from_value(serde_json::Value::Object(pairs))
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(UserFilter::default().to_match().is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let filter = UserFilter {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        };
        let m = filter.to_match();
        let range = m.get_document("createdAt").unwrap();
        assert_eq!(range.get_datetime("$gte").unwrap().to_chrono(), from);
        assert_eq!(range.get_datetime("$lte").unwrap().to_chrono(), to);
    }

    #[test]
    fn open_ended_range() {
        let to = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let filter = UserFilter {
            to: Some(to),
            ..Default::default()
        };
        let range = filter.to_match().get_document("createdAt").unwrap().clone();
        assert!(!range.contains_key("$gte"));
        assert!(range.contains_key("$lte"));
    }

    #[test]
    fn role_is_exact_match() {
        let filter = UserFilter {
            role: Some(UserRole::Teacher),
            ..Default::default()
        };
        assert_eq!(filter.to_match(), doc! { "role": "teacher" });
    }

    #[test]
    fn q_fans_out_case_insensitively() {
        let filter = UserFilter {
            q: Some("Jane".to_string()),
            ..Default::default()
        };
        let m = filter.to_match();
        let clauses = m.get_array("$or").unwrap();
        assert_eq!(clauses.len(), SEARCH_FIELDS.len());
        for (clause, field) in clauses.iter().zip(SEARCH_FIELDS) {
            let regex = clause.as_document().unwrap().get_document(field).unwrap();
            assert_eq!(regex.get_str("$regex").unwrap(), "Jane");
            assert_eq!(regex.get_str("$options").unwrap(), "i");
        }
    }

    #[test]
    fn q_is_matched_literally() {
        let filter = UserFilter {
            q: Some("a.b+(c)".to_string()),
            ..Default::default()
        };
        let m = filter.to_match();
        let first = m.get_array("$or").unwrap()[0].as_document().unwrap().clone();
        let pattern = first.get_document("firstName").unwrap().get_str("$regex").unwrap().to_string();
        assert_eq!(pattern, r"a\.b\+\(c\)");
        let re = regex::Regex::new(&format!("(?i){pattern}")).unwrap();
        assert!(re.is_match("xA.B+(C)y"));
        assert!(!re.is_match("aXb+(c)"));
    }

    #[test]
    fn dimensions_compose() {
        let filter = UserFilter {
            from: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            to: None,
            role: Some(UserRole::Admin),
            q: Some("x".to_string()),
        };
        let m = filter.to_match();
        assert!(m.contains_key("createdAt"));
        assert!(m.contains_key("role"));
        assert!(m.contains_key("$or"));
    }

    #[test]
    fn without_range_keeps_role_and_q() {
        let filter = UserFilter {
            from: Some(Utc::now()),
            to: Some(Utc::now()),
            role: Some(UserRole::User),
            q: Some("doe".to_string()),
        };
        let stripped = filter.without_range();
        assert!(!stripped.has_range());
        assert_eq!(stripped.role, Some(UserRole::User));
        assert_eq!(stripped.q.as_deref(), Some("doe"));
    }

    #[test]
    fn deserializes_query_pairs() {
        let filter = parse("from=2024-01-01T00:00:00Z&role=admin&q=jane").unwrap();
        assert_eq!(filter.from, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(filter.to, None);
        assert_eq!(filter.role, Some(UserRole::Admin));
        assert_eq!(filter.q.as_deref(), Some("jane"));
    }

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(parse("role=&q=&from=").unwrap(), UserFilter::default());
        assert_eq!(parse("q=   ").unwrap(), UserFilter::default());
    }

    #[test]
    fn search_term_keeps_surrounding_whitespace() {
        let filter = parse("q= Doe").unwrap();
        assert_eq!(filter.q.as_deref(), Some(" Doe"));
        let m = filter.to_match();
        let last_name = m.get_array("$or").unwrap()[1].as_document().unwrap().clone();
        assert_eq!(last_name.get_document("lastName").unwrap().get_str("$regex").unwrap(), " Doe");
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(parse("from=yesterday").is_err());
        assert!(parse("role=superuser").is_err());
    }
}
