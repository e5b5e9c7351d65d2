use super::record::{MetadataRecord, RecordMeta};
use serde::{Deserialize, Serialize};

/// Statistics gathered for a physical table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub cardinality: Option<u64>,
}

/// Statistics gathered for a column of a physical table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub distinct_values: Option<u64>,
    pub null_values: Option<u64>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub data_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ColumnStats>,
}

fn default_true() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(name),
            data_type: data_type.into(),
            nullable: true,
            position: 0,
            stats: None,
        }
    }
}

impl MetadataRecord for Column {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    Primary,
    Foreign,
    Unique,
    Index,
    AccessPattern,
}

/// A primary, foreign, unique, index or access-pattern key over table columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub kind: KeyKind,
    pub columns: Vec<String>,
    /// Referenced key for foreign keys, as `schema.table.key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl Key {
    pub fn new(name: impl Into<String>, kind: KeyKind, columns: Vec<String>) -> Self {
        Self {
            meta: RecordMeta::new(name),
            kind,
            columns,
            references: None,
        }
    }
}

impl MetadataRecord for Key {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// The update event an instead-of trigger handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    pub const ALL: [TriggerEvent; 3] = [TriggerEvent::Insert, TriggerEvent::Update, TriggerEvent::Delete];
}

/// Definition and enabled flag of an instead-of trigger; both are set independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsteadOfTrigger {
    pub definition: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default = "default_true")]
    pub physical: bool,
    #[serde(default)]
    pub supports_update: bool,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_transformation: Option<String>,
    #[serde(default)]
    pub insert_trigger: InsteadOfTrigger,
    #[serde(default)]
    pub update_trigger: InsteadOfTrigger,
    #[serde(default)]
    pub delete_trigger: InsteadOfTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TableStats>,
}

impl Table {
    /// Creates a source-backed table.
    pub fn physical(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// Creates a view defined by a select transformation.
    pub fn view(name: impl Into<String>, select_transformation: impl Into<String>) -> Self {
        let mut table = Self::new(name, false);
        table.select_transformation = Some(select_transformation.into());
        table
    }

    fn new(name: impl Into<String>, physical: bool) -> Self {
        Self {
            meta: RecordMeta::new(name),
            physical,
            supports_update: false,
            columns: Vec::new(),
            keys: Vec::new(),
            select_transformation: None,
            insert_trigger: InsteadOfTrigger::default(),
            update_trigger: InsteadOfTrigger::default(),
            delete_trigger: InsteadOfTrigger::default(),
            stats: None,
        }
    }

    pub fn with_column(mut self, mut column: Column) -> Self {
        column.position = self.columns.len() + 1;
        self.columns.push(column);
        self
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }

    pub fn updatable(mut self) -> Self {
        self.supports_update = true;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.meta.name.eq_ignore_ascii_case(name))
    }

    pub fn trigger(&self, event: TriggerEvent) -> &InsteadOfTrigger {
        match event {
            TriggerEvent::Insert => &self.insert_trigger,
            TriggerEvent::Update => &self.update_trigger,
            TriggerEvent::Delete => &self.delete_trigger,
        }
    }

    pub fn trigger_mut(&mut self, event: TriggerEvent) -> &mut InsteadOfTrigger {
        match event {
            TriggerEvent::Insert => &mut self.insert_trigger,
            TriggerEvent::Update => &mut self.update_trigger,
            TriggerEvent::Delete => &mut self.delete_trigger,
        }
    }
}

impl MetadataRecord for Table {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}
