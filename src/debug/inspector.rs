use crate::dap::types::Variable;
use crate::Result;
use serde::{Deserialize, Serialize};

const DEFAULT_CHILD_FETCH_BUDGET: usize = 64;
const MAPPING_MAX_ENTRIES: usize = 20;
const SEQUENCE_MAX_ENTRIES: usize = 20;
const SCALAR_TRUNCATE: usize = 256;
const MAPPING_VALUE_TRUNCATE: usize = 80;
const ARRAY_PREVIEW_PER_AXIS: usize = 6;

/// Abstracts "fetch the children of this variablesReference" so the
/// inspector can be unit-tested without a live DAP client. `DebugSession`
/// implements this over its `DapClient`.
#[async_trait::async_trait]
pub trait ChildFetcher: Send + Sync {
    async fn fetch(&self, variables_reference: i32) -> Result<Vec<Variable>>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inspection {
    Tabular {
        shape: Option<String>,
        memory: Option<String>,
        schema: Vec<SchemaColumn>,
    },
    NdArray {
        shape: Option<String>,
        dtype: Option<String>,
        memory: Option<String>,
        preview: String,
    },
    Mapping {
        entries: Vec<(String, String)>,
        truncated: bool,
    },
    Sequence {
        entries: Vec<String>,
        more: Option<usize>,
    },
    Scalar {
        value: String,
    },
    Truncated {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub null_count: String,
}

/// Render a DAP variable tree into a compact, structure-aware preview
/// (spec §4.9/C10). Never issues more than `DEFAULT_CHILD_FETCH_BUDGET`
/// child fetches; exceeding it yields `Inspection::Truncated`, not an
/// error (spec §8 property 6).
pub async fn inspect(root: &Variable, fetcher: &dyn ChildFetcher) -> Result<Inspection> {
    let mut budget = DEFAULT_CHILD_FETCH_BUDGET;
    inspect_with_budget(root, fetcher, &mut budget).await
}

pub async fn inspect_with_budget(
    root: &Variable,
    fetcher: &dyn ChildFetcher,
    budget: &mut usize,
) -> Result<Inspection> {
    if root.variables_reference == 0 {
        return Ok(Inspection::Scalar {
            value: truncate(&root.value, SCALAR_TRUNCATE),
        });
    }

    let type_name = root.type_.clone().unwrap_or_default();

    if is_tabular_type(&type_name) {
        return render_tabular(fetcher, root.variables_reference, budget).await;
    }

    if *budget == 0 {
        return Ok(Inspection::Truncated {
            reason: "child-fetch budget exhausted".to_string(),
        });
    }
    *budget -= 1;
    let children = fetcher.fetch(root.variables_reference).await?;

    if let Some(nd) = try_ndarray(&type_name, &children) {
        return Ok(nd);
    }

    if looks_like_mapping(root, &children) {
        return Ok(render_mapping(&children));
    }

    Ok(render_sequence(&children))
}

fn is_tabular_type(type_name: &str) -> bool {
    ["DataFrame", "Table", "RecordBatch"]
        .iter()
        .any(|t| type_name.contains(t))
}

async fn render_tabular(
    fetcher: &dyn ChildFetcher,
    variables_reference: i32,
    budget: &mut usize,
) -> Result<Inspection> {
    if *budget == 0 {
        return Ok(Inspection::Truncated {
            reason: "child-fetch budget exhausted".to_string(),
        });
    }
    *budget -= 1;
    let children = fetcher.fetch(variables_reference).await?;

    let shape = find_child(&children, "shape").map(|v| v.value.clone());
    let memory = find_child(&children, "memory")
        .or_else(|| find_child(&children, "nbytes"))
        .map(|v| v.value.clone());

    let mut schema = Vec::new();
    if let Some(columns) = find_child(&children, "columns") {
        if columns.variables_reference != 0 && *budget > 0 {
            *budget -= 1;
            let cols = fetcher.fetch(columns.variables_reference).await?;
            for col in cols {
                schema.push(SchemaColumn {
                    name: col.name.clone(),
                    type_: col.type_.clone().unwrap_or_else(|| "unknown".to_string()),
                    null_count: find_child(
                        &fetcher
                            .fetch(col.variables_reference)
                            .await
                            .unwrap_or_default(),
                        "null_count",
                    )
                    .map(|v| v.value.clone())
                    .unwrap_or_else(|| "?".to_string()),
                });
            }
        }
    }

    Ok(Inspection::Tabular {
        shape,
        memory,
        schema,
    })
}

fn try_ndarray(type_name: &str, children: &[Variable]) -> Option<Inspection> {
    let shape = find_child(children, "shape");
    let dtype = find_child(children, "dtype");
    if shape.is_none() && dtype.is_none() && !type_name.contains("ndarray") {
        return None;
    }
    let memory = find_child(children, "nbytes").map(|v| v.value.clone());
    let mut preview_elems: Vec<String> = children
        .iter()
        .filter(|v| !["shape", "dtype", "nbytes"].contains(&v.name.as_str()))
        .take(ARRAY_PREVIEW_PER_AXIS)
        .map(|v| truncate(&v.value, MAPPING_VALUE_TRUNCATE))
        .collect();
    if preview_elems.is_empty() {
        preview_elems.push("…".to_string());
    }
    Some(Inspection::NdArray {
        shape: shape.map(|v| v.value.clone()),
        dtype: dtype.map(|v| v.value.clone()),
        memory,
        preview: preview_elems.join(", "),
    })
}

fn looks_like_mapping(root: &Variable, children: &[Variable]) -> bool {
    if let Some(hint) = &root.presentation_hint {
        if hint.kind.as_deref() == Some("map") || hint.kind.as_deref() == Some("class") {
            return true;
        }
    }
    // Sequences from DAP adapters name their children by numeric index;
    // anything else reads as key->value.
    children
        .iter()
        .any(|v| v.name.parse::<usize>().is_err())
}

fn render_mapping(children: &[Variable]) -> Inspection {
    let mut entries: Vec<(String, String)> = children
        .iter()
        .map(|v| (v.name.clone(), truncate(&v.value, MAPPING_VALUE_TRUNCATE)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let truncated = entries.len() > MAPPING_MAX_ENTRIES;
    entries.truncate(MAPPING_MAX_ENTRIES);
    Inspection::Mapping { entries, truncated }
}

fn render_sequence(children: &[Variable]) -> Inspection {
    let total = children.len();
    let entries: Vec<String> = children
        .iter()
        .take(SEQUENCE_MAX_ENTRIES)
        .enumerate()
        .map(|(i, v)| format!("[{i}] {}", truncate(&v.value, MAPPING_VALUE_TRUNCATE)))
        .collect();
    let more = total.checked_sub(SEQUENCE_MAX_ENTRIES).filter(|n| *n > 0);
    Inspection::Sequence { entries, more }
}

fn find_child<'a>(children: &'a [Variable], name: &str) -> Option<&'a Variable> {
    children.iter().find(|v| v.name == name)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}
