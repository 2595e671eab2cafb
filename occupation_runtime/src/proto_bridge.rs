//! Proto ↔ model conversion bridge.
//!
//! Converts populated occupations to the snapshot wire type and restores
//! them into fresh schema instances. Restored values pass through the same
//! setters as ingestion, so a payload cannot smuggle in a value the model
//! would refuse.

use occupation_model::scale::ScaleValue;
use occupation_model::{ModelError, Occupation, OccupationSchema};

use crate::error::{Result, RuntimeError};
use crate::proto_types::{ProtoOccupation, ProtoScaleValue, ValueKind};

/// Convert an occupation to its wire form. Null slots are omitted.
pub fn occupation_to_proto(occupation: &Occupation) -> ProtoOccupation {
    let mut values = Vec::new();
    for (element_id, element) in &occupation.elements {
        for (scale_id, scale) in element.scales() {
            let Some(value) = scale.scale_value() else {
                continue;
            };
            let (value, kind) = match value {
                ScaleValue::Category(c) => (c as f64, ValueKind::Category),
                ScaleValue::Rating(v) => (v, ValueKind::Rating),
            };
            values.push(ProtoScaleValue {
                element_id: element_id.clone(),
                scale_id: scale_id.clone(),
                value,
                kind: kind as i32,
            });
        }
    }
    ProtoOccupation {
        occupation_id: occupation.occupation_id.clone(),
        occupation_name: occupation.occupation_name.clone(),
        values,
    }
}

/// Rebuild an occupation from `schema` and a wire record.
pub fn proto_to_occupation(proto: &ProtoOccupation, schema: &OccupationSchema) -> Result<Occupation> {
    let mut occupation = Occupation::from_schema(
        proto.occupation_id.as_str(),
        proto.occupation_name.as_str(),
        schema,
    );
    for v in &proto.values {
        let kind = ValueKind::try_from(v.kind).map_err(|_| {
            RuntimeError::integrity(format!(
                "{}: unknown value kind {} for {}/{}",
                proto.occupation_id, v.kind, v.element_id, v.scale_id
            ))
        })?;
        let scale = occupation
            .get_element_mut(&v.element_id)
            .ok_or_else(|| ModelError::not_found("element", v.element_id.as_str()))?
            .get_scale_mut(&v.scale_id)
            .ok_or_else(|| ModelError::not_found("scale", format!("{}/{}", v.element_id, v.scale_id)))?;
        match kind {
            ValueKind::Category => scale.set_value(v.value)?,
            ValueKind::Rating => scale.set_rating(v.value)?,
        }
    }
    Ok(occupation)
}
