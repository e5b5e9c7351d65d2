use super::record::{MetadataRecord, RecordMeta};
use super::table::Column;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterDirection {
    In,
    InOut,
    Out,
    ReturnValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureParameter {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub data_type: String,
    pub direction: ParameterDirection,
}

impl ProcedureParameter {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, direction: ParameterDirection) -> Self {
        Self {
            meta: RecordMeta::new(name),
            data_type: data_type.into(),
            direction,
        }
    }
}

impl MetadataRecord for ProcedureParameter {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Columns returned by a procedure's result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub parameters: Vec<ProcedureParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set: Option<ResultSet>,
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_function: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_plan: Option<String>,
}

impl Procedure {
    pub fn physical(name: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(name),
            parameters: Vec::new(),
            result_set: None,
            is_virtual: false,
            is_function: false,
            query_plan: None,
        }
    }

    pub fn virtual_procedure(name: impl Into<String>, query_plan: impl Into<String>) -> Self {
        let mut procedure = Self::physical(name);
        procedure.is_virtual = true;
        procedure.query_plan = Some(query_plan.into());
        procedure
    }

    pub fn with_parameter(mut self, parameter: ProcedureParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_result_column(mut self, mut column: Column) -> Self {
        let result_set = self.result_set.get_or_insert_with(ResultSet::default);
        column.position = result_set.columns.len() + 1;
        result_set.columns.push(column);
        self
    }
}

impl MetadataRecord for Procedure {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
