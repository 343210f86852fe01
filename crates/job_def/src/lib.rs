//! Rewrites a job definition template so each registered revision is tied to
//! the workflow step it runs.

use model::JobDefinitionSpec;
use model::env::AccountConfig;
use model::spec::KeyValuePair;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

pub const WORKFLOW_NAME_VAR: &str = "BC_WORKFLOW_NAME";
pub const STEP_NAME_VAR: &str = "BC_STEP_NAME";
pub const REGION_VAR: &str = "AWS_DEFAULT_REGION";
pub const ACCOUNT_ID_VAR: &str = "AWS_ACCOUNT_ID";

/// Parameter holding the canonical JSON of the step image.
pub const IMAGE_PARAMETER: &str = "image";
pub const WORKFLOW_TAG: &str = "bclaw:workflow";

/// Produce the job definition to register for `step_name` of `workflow_name`.
///
/// The template is left untouched. The returned spec owns its own environment,
/// parameters and tags.
pub fn edit_spec(
    spec: &JobDefinitionSpec,
    workflow_name: &str,
    step_name: &str,
    image: &Value,
    account: &AccountConfig,
) -> JobDefinitionSpec {
    let mut edited: JobDefinitionSpec = spec.clone();

    edited.job_definition_name = Some(format!("{workflow_name}_{step_name}"));

    edited.container_properties.environment.extend([
        KeyValuePair::new(WORKFLOW_NAME_VAR, workflow_name),
        KeyValuePair::new(STEP_NAME_VAR, step_name),
        KeyValuePair::new(REGION_VAR, account.region.as_str()),
        KeyValuePair::new(ACCOUNT_ID_VAR, account.account_id.as_str()),
    ]);

    edited
        .parameters
        .insert(IMAGE_PARAMETER.to_string(), canonical_json(image));

    edited
        .tags
        .insert(WORKFLOW_TAG.to_string(), workflow_name.to_string());

    edited
}

/// Compact JSON with object keys sorted, so equal values always give equal text.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&Canonical(value))
        .expect("JSON values always serialise: keys are strings")
}

struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(key, &Canonical(value))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Canonical(item))?;
                }
                out.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}
