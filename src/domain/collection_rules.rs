//! Collection-name keyed rules: timestamp fields, aggregation fields,
//! date ranges, and collection-name validation.
//!
//! These are the only places where the gateway looks inside a document.
//! Everything else treats documents as opaque payloads.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use utoipa::ToSchema;

use super::Document;
use crate::error::GatewayError;

/// Collection whose documents are dated by [`PURCHASE_ORDER_DATE_FIELD`].
pub const PURCHASE_ORDERS: &str = "purchaseorders";

/// Timestamp field of the purchase-order collection.
pub const PURCHASE_ORDER_DATE_FIELD: &str = "PODate";

/// Timestamp field of every other collection.
pub const DEFAULT_DATE_FIELD: &str = "created";

/// Field documents are grouped by for dashboard metrics.
pub const GROUP_FIELD: &str = "createdBy";

/// Numeric field summed per group for dashboard metrics.
pub const SUM_FIELD: &str = "sales";

/// Number of groups returned by dashboard metrics.
pub const TOP_GROUP_LIMIT: usize = 5;

/// Returns the name of the field that dates documents in `collection`.
#[must_use]
pub fn timestamp_field(collection: &str) -> &'static str {
    if collection == PURCHASE_ORDERS {
        PURCHASE_ORDER_DATE_FIELD
    } else {
        DEFAULT_DATE_FIELD
    }
}

/// Rejects collection names that cannot be used as a file-name stem.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for empty names, names with a
/// path separator, or names containing `..`.
pub fn validate_collection_name(name: &str) -> Result<(), GatewayError> {
    if name.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "collection name must not be empty".to_string(),
        ));
    }
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(GatewayError::InvalidRequest(format!(
            "invalid collection name: {name}"
        )));
    }
    Ok(())
}

/// Half-open UTC time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range from explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `end` is not after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, GatewayError> {
        if end <= start {
            return Err(GatewayError::InvalidRequest(
                "date range end must be after start".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// The whole UTC day `[date 00:00, date+1 00:00)`.
    #[must_use]
    pub fn for_day(date: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        let end = start
            .checked_add_days(Days::new(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    /// Parses a `YYYY-MM-DD` day into its UTC range.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `day` is not a valid date.
    pub fn parse_day(day: &str) -> Result<Self, GatewayError> {
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(Self::for_day)
            .map_err(|_| GatewayError::InvalidRequest(format!("invalid date: {day}")))
    }

    /// Returns `true` if `ts` falls within the range.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Reads a timestamp out of a document field value.
///
/// Accepts RFC 3339 strings, naive `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`
/// strings (taken as UTC), integer epoch milliseconds, and extended-JSON
/// `{"$date": ...}` wrappers around any of those.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => map.get("$date").and_then(parse_timestamp),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN)))
}

/// Returns `true` if the document's timestamp field lies inside `range`.
/// Documents without a readable timestamp never match.
#[must_use]
pub fn document_in_range(doc: &Document, field: &str, range: &DateRange) -> bool {
    doc.get(field)
        .and_then(parse_timestamp)
        .is_some_and(|ts| range.contains(ts))
}

/// One row of the dashboard top-groups table.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupTotal {
    /// Group key (value of [`GROUP_FIELD`], `null` when absent).
    #[serde(rename = "_id")]
    #[schema(value_type = Object)]
    pub key: Value,
    /// Sum of [`SUM_FIELD`] across the group.
    #[serde(rename = "totalSales", serialize_with = "serialize_total")]
    pub total: f64,
}

/// Largest magnitude below which every integer is exactly representable
/// as an `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Writes whole sums as JSON integers (`50`, not `50.0`).
fn serialize_total<S: Serializer>(total: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if total.fract() == 0.0 && total.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*total as i64)
    } else {
        serializer.serialize_f64(*total)
    }
}

/// Numeric value of `field`, treating missing and non-numeric values as zero.
#[must_use]
pub fn numeric_or_zero(doc: &Document, field: &str) -> f64 {
    doc.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Groups `docs` by `group_field`, sums `sum_field` per group, and returns
/// the `limit` largest groups in descending order.
///
/// Groups with equal sums keep the order in which each group first appears
/// in `docs` (the store's enumeration order).
pub fn top_groups<'a, I>(docs: I, group_field: &str, sum_field: &str, limit: usize) -> Vec<GroupTotal>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut groups: Vec<GroupTotal> = Vec::new();
    for doc in docs {
        let key = doc.get(group_field).cloned().unwrap_or(Value::Null);
        let amount = numeric_or_zero(doc, sum_field);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.total += amount,
            None => groups.push(GroupTotal { key, total: amount }),
        }
    }
    groups.sort_by(|a, b| b.total.total_cmp(&a.total));
    groups.truncate(limit);
    groups
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        map
    }

    #[test]
    fn purchase_orders_use_po_date() {
        assert_eq!(timestamp_field("purchaseorders"), "PODate");
        assert_eq!(timestamp_field("orders"), "created");
    }

    #[test]
    fn rejects_path_like_names() {
        assert!(validate_collection_name("orders").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("../etc").is_err());
        assert!(validate_collection_name("a/b").is_err());
        assert!(validate_collection_name("a\\b").is_err());
    }

    #[test]
    fn day_range_is_half_open() {
        let Ok(range) = DateRange::parse_day("2024-03-01") else {
            panic!("valid day");
        };
        let inside = parse_timestamp(&json!("2024-03-01T23:59:59.999Z"));
        let boundary = parse_timestamp(&json!("2024-03-02T00:00:00Z"));
        let Some(inside) = inside else {
            panic!("parse");
        };
        let Some(boundary) = boundary else {
            panic!("parse");
        };
        assert!(range.contains(range.start));
        assert!(range.contains(inside));
        assert!(!range.contains(boundary));
    }

    #[test]
    fn invalid_day_is_rejected() {
        assert!(DateRange::parse_day("2024-13-40").is_err());
    }

    #[test]
    fn explicit_range_requires_ordered_bounds() {
        let now = Utc::now();
        assert!(DateRange::new(now, now).is_err());
    }

    #[test]
    fn parses_timestamp_variants() {
        assert!(parse_timestamp(&json!("2024-03-01T10:00:00+02:00")).is_some());
        assert!(parse_timestamp(&json!("2024-03-01T10:00:00")).is_some());
        assert!(parse_timestamp(&json!("2024-03-01")).is_some());
        assert!(parse_timestamp(&json!(1_709_287_200_000_i64)).is_some());
        assert!(parse_timestamp(&json!({"$date": "2024-03-01T10:00:00Z"})).is_some());
        assert!(parse_timestamp(&json!(true)).is_none());
        assert!(parse_timestamp(&json!("yesterday")).is_none());
    }

    #[test]
    fn documents_without_timestamp_never_match() {
        let Ok(range) = DateRange::parse_day("2024-03-01") else {
            panic!("valid day");
        };
        assert!(!document_in_range(&doc(json!({"name": "x"})), "created", &range));
        assert!(document_in_range(
            &doc(json!({"created": "2024-03-01T08:00:00Z"})),
            "created",
            &range
        ));
    }

    #[test]
    fn top_groups_orders_and_truncates() {
        let docs: Vec<Document> = [
            ("a", 50), ("b", 30), ("c", 30), ("d", 10), ("e", 5), ("f", 1),
        ]
        .iter()
        .map(|(who, sales)| doc(json!({"createdBy": who, "sales": sales})))
        .collect();

        let top = top_groups(&docs, GROUP_FIELD, SUM_FIELD, TOP_GROUP_LIMIT);
        assert_eq!(top.len(), 5);
        let totals: Vec<f64> = top.iter().map(|g| g.total).collect();
        assert_eq!(totals, vec![50.0, 30.0, 30.0, 10.0, 5.0]);
        // equal sums keep first-appearance order
        assert_eq!(top.get(1).map(|g| g.key.clone()), Some(json!("b")));
        assert_eq!(top.get(2).map(|g| g.key.clone()), Some(json!("c")));
    }

    #[test]
    fn whole_totals_serialize_as_integers() {
        let whole = GroupTotal { key: json!("a"), total: 50.0 };
        let fractional = GroupTotal { key: Value::Null, total: 2.5 };
        assert_eq!(
            serde_json::to_value(&whole).ok(),
            Some(json!({"_id": "a", "totalSales": 50}))
        );
        assert_eq!(
            serde_json::to_value(&fractional).ok(),
            Some(json!({"_id": null, "totalSales": 2.5}))
        );
        assert_eq!(
            serde_json::to_string(&whole).ok().as_deref(),
            Some(r#"{"_id":"a","totalSales":50}"#)
        );
    }

    #[test]
    fn missing_sales_count_as_zero_and_missing_group_is_null() {
        let docs = vec![
            doc(json!({"createdBy": "a", "sales": 3})),
            doc(json!({"createdBy": "a"})),
            doc(json!({"sales": "lots"})),
            doc(json!({"sales": 2.5})),
        ];
        let top = top_groups(&docs, GROUP_FIELD, SUM_FIELD, TOP_GROUP_LIMIT);
        assert_eq!(
            top,
            vec![
                GroupTotal { key: json!("a"), total: 3.0 },
                GroupTotal { key: Value::Null, total: 2.5 },
            ]
        );
    }
}
