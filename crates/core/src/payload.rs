//! Outdooractive JSON payloads and their mapping to `Condition`.
//!
//! Optional fields are declared with `#[serde(default)]`, so a single
//! deserialization pass yields a fully defaulted payload; `normalize` only has
//! to check the two identifying fields and derive the geometry description.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{Condition, NormalizeError, parse_date};

/// Accepts both a single object and an array of objects.
// `Many` must come first: a defaulted struct also deserializes from a sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// Scalar as text: strings verbatim, numbers/booleans rendered, null empty.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Response of the project `conditions` listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CandidateList {
    pub data: OneOrMany<IdRef>,
}

impl CandidateList {
    /// Candidate ids in listing order, blanks dropped.
    pub fn into_ids(self) -> Vec<String> {
        self.data.into_vec().into_iter().map(|r| r.id).filter(|id| !id.is_empty()).collect()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct IdRef {
    #[serde(deserialize_with = "text")]
    pub id: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct NameRef {
    #[serde(deserialize_with = "text")]
    pub name: String,
}

/// Response of `oois/{id}` for a condition.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetailDocument {
    pub condition: OneOrMany<ConditionPayload>,
}

impl DetailDocument {
    /// # Errors
    /// Returns `NormalizeError::Empty` when the document carries no record.
    pub fn into_payload(self) -> Result<ConditionPayload, NormalizeError> {
        self.condition.into_vec().into_iter().next().ok_or(NormalizeError::Empty)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionPayload {
    #[serde(deserialize_with = "text")]
    pub id: String,
    pub meta: MetaPayload,
    pub category: IdRef,
    #[serde(deserialize_with = "text")]
    pub day_of_inspection: String,
    #[serde(deserialize_with = "text")]
    pub date_from: String,
    #[serde(rename = "frontendtype", deserialize_with = "text")]
    pub frontend_type: String,
    #[serde(deserialize_with = "text")]
    pub ranking: String,
    #[serde(deserialize_with = "text")]
    pub title: String,
    pub localized_title: OneOrMany<LocalizedTitle>,
    #[serde(deserialize_with = "text")]
    pub long_text: String,
    #[serde(deserialize_with = "text")]
    pub winter_activity: String,
    #[serde(deserialize_with = "text")]
    pub geometry: String,
    #[serde(deserialize_with = "text")]
    pub risk_description: String,
    #[serde(deserialize_with = "text")]
    pub weather_description: String,
    pub regions: RegionRefs,
}

impl ConditionPayload {
    /// Region ids referenced by this condition, in payload order.
    pub fn region_ids(&self) -> Vec<String> {
        self.regions
            .region
            .clone()
            .into_vec()
            .into_iter()
            .map(|r| r.id)
            .filter(|id| !id.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaPayload {
    pub workflow: WorkflowPayload,
    pub author_full: IdRef,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowPayload {
    #[serde(deserialize_with = "text")]
    pub state: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LocalizedTitle {
    #[serde(deserialize_with = "text")]
    pub lang: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegionRefs {
    pub region: OneOrMany<IdRef>,
}

/// Response of `oois/{id}` for a region.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegionDocument {
    pub region: OneOrMany<RegionPayload>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegionPayload {
    pub category: NameRef,
    #[serde(deserialize_with = "text")]
    pub title: String,
}

impl RegionDocument {
    /// # Errors
    /// Returns `NormalizeError::Empty` when the document carries no region.
    pub fn into_region(self) -> Result<RegionInfo, NormalizeError> {
        let region = self.region.into_vec().into_iter().next().ok_or(NormalizeError::Empty)?;
        Ok(RegionInfo { kind: region.category.name, name: region.title })
    }
}

/// A resolved region: its category ("district", "county", ...) and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub kind: String,
    pub name: String,
}

impl RegionInfo {
    fn segment(&self) -> String {
        format!("{}->{} / ", self.kind, self.name)
    }
}

/// Concatenates region segments into the human readable geometry description.
#[must_use]
pub fn geometry_description(regions: &[RegionInfo]) -> String {
    regions.iter().map(RegionInfo::segment).collect()
}

/// Maps a detail payload and its resolved regions to a fresh, unprocessed `Condition`.
///
/// # Errors
/// Returns `NormalizeError::MissingField` when the id or the workflow state is absent.
pub fn normalize(
    payload: ConditionPayload,
    regions: &[RegionInfo],
) -> Result<Condition, NormalizeError> {
    if payload.id.trim().is_empty() {
        return Err(NormalizeError::MissingField("id"));
    }
    if payload.meta.workflow.state.trim().is_empty() {
        return Err(NormalizeError::MissingField("meta.workflow.state"));
    }
    let lang = payload.localized_title.into_vec().into_iter().next().unwrap_or_default().lang;

    Ok(Condition {
        id: payload.id,
        status: payload.meta.workflow.state,
        category_id: payload.category.id,
        day_of_inspection: parse_date(&payload.day_of_inspection),
        date_from: parse_date(&payload.date_from),
        frontend_type: payload.frontend_type,
        ranking: payload.ranking,
        title: payload.title,
        lang,
        long_text: payload.long_text,
        winter_activity: payload.winter_activity,
        geometry: payload.geometry,
        risk_description: payload.risk_description,
        weather_description: payload.weather_description,
        user_id: payload.meta.author_full.id,
        processed: false,
        date_processed: None,
        geometry_description: geometry_description(regions),
    })
}
