#![forbid(unsafe_code)]

//! Persisted element records and the canonical document snapshot.
//!
//! Records are the durable half of the data model: GUID-addressed, flat,
//! order-carrying. A container names its children by [`ElementId`]; the
//! runtime tree is materialized from these records and committed back by
//! reachability (see `panekit-tree`).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Sides, SizeMode};
use crate::id::ElementId;

/// Current document schema version.
pub const DOCUMENT_SCHEMA_VERSION: u16 = 1;

/// Kind of member a delegated visibility rule consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Method,
    Property,
    Field,
}

/// Visibility policy for one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum VisibilityRule {
    /// Always visible.
    #[default]
    AlwaysShow,
    /// Never visible.
    AlwaysHide,
    /// Ask a boolean member of the target object every frame.
    Delegated {
        symbol: String,
        kind: PredicateKind,
    },
}

/// Child arrangement strategy of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    #[default]
    VerticalStack,
    HorizontalStack,
    Paged,
}

/// Leaf behavior family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    /// Editor bound to a member of the target object.
    #[default]
    Field,
    Button,
    Label,
    HelpBox,
    Spacer,
}

/// Toggle presentation for boolean fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToggleStyle {
    #[default]
    Checkbox,
    CheckboxLeft,
    Button,
}

/// Numeric editor presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumberStyle {
    #[default]
    Field,
    Slider,
}

/// Help box severity badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HelpSeverity {
    #[default]
    None,
    Info,
    Warning,
    Error,
}

/// Kind-specific leaf configuration, decoded once at materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeafPayload {
    #[default]
    None,
    Toggle {
        style: ToggleStyle,
        #[serde(default = "white")]
        on_fill: [f32; 4],
        #[serde(default = "white")]
        off_fill: [f32; 4],
        #[serde(default = "white")]
        on_text: [f32; 4],
        #[serde(default = "white")]
        off_text: [f32; 4],
    },
    Number {
        style: NumberStyle,
        #[serde(default)]
        slider_min: f64,
        #[serde(default = "one")]
        slider_max: f64,
    },
    HelpBox {
        severity: HelpSeverity,
    },
}

fn white() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

fn one() -> f64 {
    1.0
}

/// Properties shared by every element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMeta {
    pub display_name: String,
    #[serde(default)]
    pub visibility: VisibilityRule,
    /// Symbol invoked on the target when the element's value changes.
    #[serde(default)]
    pub change_callback: Option<String>,
    #[serde(default)]
    pub padding: Sides,
    /// Host style sheet key, passed through untouched.
    #[serde(default)]
    pub style_ref: Option<String>,
    /// When hidden: `true` keeps the space and draws disabled, `false`
    /// removes the element from layout entirely.
    pub hide_means_disable: bool,
}

impl ElementMeta {
    /// Meta for a new element with leaf defaults.
    #[must_use]
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            visibility: VisibilityRule::AlwaysShow,
            change_callback: None,
            padding: Sides::default(),
            style_ref: None,
            hide_means_disable: false,
        }
    }
}

/// Persisted container element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: ElementId,
    pub meta: ElementMeta,
    pub arrangement: Arrangement,
    pub show_header: bool,
    pub expanded: bool,
    /// Child order is significant. Dangling IDs are tolerated and skipped
    /// at materialization.
    #[serde(default)]
    pub children: Vec<ElementId>,
}

impl ContainerRecord {
    /// Create a container with a fresh GUID.
    #[must_use]
    pub fn new(display_name: impl Into<String>, arrangement: Arrangement) -> Self {
        let mut meta = ElementMeta::named(display_name);
        meta.hide_means_disable = true;
        Self {
            id: ElementId::mint(),
            meta,
            arrangement,
            show_header: true,
            expanded: true,
            children: Vec::new(),
        }
    }
}

/// Static display content of a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
}

/// Persisted leaf element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafRecord {
    pub id: ElementId,
    pub meta: ElementMeta,
    pub kind: LeafKind,
    #[serde(default)]
    pub width: SizeMode,
    #[serde(default)]
    pub height: SizeMode,
    /// Member symbol this leaf binds to (fields only).
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub payload: LeafPayload,
}

impl LeafRecord {
    /// Create a leaf with a fresh GUID.
    #[must_use]
    pub fn new(display_name: impl Into<String>, kind: LeafKind) -> Self {
        Self {
            id: ElementId::mint(),
            meta: ElementMeta::named(display_name),
            kind,
            width: SizeMode::Auto,
            height: SizeMode::Auto,
            target: None,
            content: Content::default(),
            payload: LeafPayload::None,
        }
    }
}

/// One persisted element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum ElementRecord {
    Container(ContainerRecord),
    Leaf(LeafRecord),
}

impl ElementRecord {
    /// GUID of this element.
    #[must_use]
    pub fn id(&self) -> ElementId {
        match self {
            Self::Container(c) => c.id,
            Self::Leaf(l) => l.id,
        }
    }

    /// Shared meta of this element.
    #[must_use]
    pub fn meta(&self) -> &ElementMeta {
        match self {
            Self::Container(c) => &c.meta,
            Self::Leaf(l) => &l.meta,
        }
    }

    /// Display name shorthand.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.meta().display_name
    }

    /// Whether this is a container record.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Container(_))
    }

    fn meta_mut(&mut self) -> &mut ElementMeta {
        match self {
            Self::Container(c) => &mut c.meta,
            Self::Leaf(l) => &mut l.meta,
        }
    }

    fn reassign_id(&mut self, id: ElementId) {
        match self {
            Self::Container(c) => c.id = id,
            Self::Leaf(l) => l.id = id,
        }
    }
}

impl From<ContainerRecord> for ElementRecord {
    fn from(record: ContainerRecord) -> Self {
        Self::Container(record)
    }
}

impl From<LeafRecord> for ElementRecord {
    fn from(record: LeafRecord) -> Self {
        Self::Leaf(record)
    }
}

/// Flat, GUID-keyed set of element records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RecordSet {
    records: BTreeMap<ElementId, ElementRecord>,
}

impl RecordSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previous record under the same GUID.
    pub fn insert(&mut self, record: impl Into<ElementRecord>) -> Option<ElementRecord> {
        let record = record.into();
        self.records.insert(record.id(), record)
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&ElementRecord> {
        self.records.get(&id)
    }

    /// Look up a container record.
    #[must_use]
    pub fn get_container(&self, id: ElementId) -> Option<&ContainerRecord> {
        match self.records.get(&id) {
            Some(ElementRecord::Container(c)) => Some(c),
            _ => None,
        }
    }

    /// Remove a record.
    pub fn remove(&mut self, id: ElementId) -> Option<ElementRecord> {
        self.records.remove(&id)
    }

    /// Whether the set holds a record with this GUID.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in GUID order.
    pub fn iter(&self) -> impl Iterator<Item = &ElementRecord> {
        self.records.values()
    }

    /// Deep-copy the subtree rooted at `root`, minting a fresh GUID for
    /// every copied record.
    ///
    /// The copy is structurally isomorphic to the original (dangling child
    /// IDs are dropped from it) and the copied root's display name gets a
    /// " Copy" suffix. Returns the new root's GUID, or `None` when `root`
    /// is unknown.
    pub fn duplicate_subtree(&mut self, root: ElementId) -> Option<ElementId> {
        let copy_root = self.copy_recursive(root)?;
        if let Some(record) = self.records.get_mut(&copy_root) {
            record.meta_mut().display_name.push_str(" Copy");
        }
        Some(copy_root)
    }

    fn copy_recursive(&mut self, id: ElementId) -> Option<ElementId> {
        let mut record = self.records.get(&id)?.clone();
        let copy_id = ElementId::mint();
        record.reassign_id(copy_id);
        if let ElementRecord::Container(container) = &mut record {
            let originals = std::mem::take(&mut container.children);
            let mut copies = Vec::with_capacity(originals.len());
            for child in originals {
                if let Some(copy) = self.copy_recursive(child) {
                    copies.push(copy);
                }
            }
            container.children = copies;
        }
        self.records.insert(copy_id, record);
        Some(copy_id)
    }
}

impl<R: Into<ElementRecord>> FromIterator<R> for RecordSet {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Fatal problems found while validating a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    UnsupportedSchemaVersion { version: u16 },
    MissingRoot { root: ElementId },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { version } => write!(
                f,
                "unsupported document schema version {version} (expected {DOCUMENT_SCHEMA_VERSION})"
            ),
            Self::MissingRoot { root } => write!(f, "root record {root} is missing"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Tolerated problems found while validating a snapshot.
///
/// These degrade at materialization rather than failing the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotWarning {
    /// A container names a child that has no record.
    DanglingChild { parent: ElementId, child: ElementId },
    /// A record is referenced as a child by more than one container.
    SharedChild { child: ElementId },
}

/// Canonical serialized document shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub root: ElementId,
    pub records: RecordSet,
}

fn default_schema_version() -> u16 {
    DOCUMENT_SCHEMA_VERSION
}

impl DocumentSnapshot {
    /// Wrap a record set into a current-version snapshot.
    #[must_use]
    pub fn new(root: ElementId, records: RecordSet) -> Self {
        Self {
            schema_version: DOCUMENT_SCHEMA_VERSION,
            root,
            records,
        }
    }

    /// Check snapshot invariants.
    ///
    /// Fatal issues (wrong schema version, missing root) fail the check;
    /// recoverable ones come back as warnings.
    pub fn validate(&self) -> Result<Vec<SnapshotWarning>, SnapshotError> {
        if self.schema_version != DOCUMENT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedSchemaVersion {
                version: self.schema_version,
            });
        }
        if !self.records.contains(self.root) {
            return Err(SnapshotError::MissingRoot { root: self.root });
        }

        let mut warnings = Vec::new();
        let mut seen_children: BTreeMap<ElementId, ElementId> = BTreeMap::new();
        for record in self.records.iter() {
            let ElementRecord::Container(container) = record else {
                continue;
            };
            for &child in &container.children {
                if !self.records.contains(child) {
                    warnings.push(SnapshotWarning::DanglingChild {
                        parent: container.id,
                        child,
                    });
                    continue;
                }
                if seen_children.insert(child, container.id).is_some() {
                    warnings.push(SnapshotWarning::SharedChild { child });
                }
            }
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(name: &str) -> ContainerRecord {
        ContainerRecord::new(name, Arrangement::VerticalStack)
    }

    #[test]
    fn container_defaults() {
        let c = stack("Root");
        assert!(c.show_header);
        assert!(c.expanded);
        assert!(c.meta.hide_means_disable);
        assert!(c.children.is_empty());
    }

    #[test]
    fn leaf_defaults() {
        let l = LeafRecord::new("Speed", LeafKind::Field);
        assert!(!l.meta.hide_means_disable);
        assert!(l.width.is_auto());
        assert!(l.height.is_auto());
        assert_eq!(l.payload, LeafPayload::None);
    }

    #[test]
    fn record_set_insert_get() {
        let mut set = RecordSet::new();
        let leaf = LeafRecord::new("A", LeafKind::Label);
        let id = leaf.id;
        assert!(set.insert(leaf).is_none());
        assert!(set.contains(id));
        assert_eq!(set.get(id).unwrap().display_name(), "A");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn record_set_insert_replaces_same_guid() {
        let mut set = RecordSet::new();
        let mut leaf = LeafRecord::new("A", LeafKind::Label);
        let id = leaf.id;
        set.insert(leaf.clone());
        leaf.meta.display_name = "B".into();
        assert!(set.insert(leaf).is_some());
        assert_eq!(set.get(id).unwrap().display_name(), "B");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_mints_fresh_guids() {
        let mut set = RecordSet::new();
        let leaf = LeafRecord::new("Speed", LeafKind::Field);
        let leaf_id = leaf.id;
        let mut root = stack("Group");
        root.children.push(leaf_id);
        let root_id = root.id;
        set.insert(root);
        set.insert(leaf);

        let copy_id = set.duplicate_subtree(root_id).unwrap();
        assert_ne!(copy_id, root_id);
        let copy = set.get_container(copy_id).unwrap();
        assert_eq!(copy.meta.display_name, "Group Copy");
        assert_eq!(copy.children.len(), 1);
        assert_ne!(copy.children[0], leaf_id);
        // Originals untouched.
        let original = set.get_container(root_id).unwrap();
        assert_eq!(original.children, vec![leaf_id]);
        assert_eq!(original.meta.display_name, "Group");
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn duplicate_drops_dangling_children() {
        let mut set = RecordSet::new();
        let mut root = stack("Group");
        root.children.push(ElementId::mint());
        let root_id = root.id;
        set.insert(root);

        let copy_id = set.duplicate_subtree(root_id).unwrap();
        assert!(set.get_container(copy_id).unwrap().children.is_empty());
    }

    #[test]
    fn duplicate_unknown_root_is_none() {
        let mut set = RecordSet::new();
        assert!(set.duplicate_subtree(ElementId::mint()).is_none());
    }

    #[test]
    fn snapshot_validate_ok() {
        let root = stack("Root");
        let root_id = root.id;
        let set: RecordSet = [ElementRecord::from(root)].into_iter().collect();
        let snapshot = DocumentSnapshot::new(root_id, set);
        assert_eq!(snapshot.validate().unwrap(), vec![]);
    }

    #[test]
    fn snapshot_validate_missing_root() {
        let snapshot = DocumentSnapshot::new(ElementId::mint(), RecordSet::new());
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::MissingRoot { .. })
        ));
    }

    #[test]
    fn snapshot_validate_bad_version() {
        let root = stack("Root");
        let root_id = root.id;
        let set: RecordSet = [ElementRecord::from(root)].into_iter().collect();
        let mut snapshot = DocumentSnapshot::new(root_id, set);
        snapshot.schema_version = 99;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::UnsupportedSchemaVersion { version: 99 })
        ));
    }

    #[test]
    fn snapshot_validate_warns_on_dangling_and_shared() {
        let leaf = LeafRecord::new("A", LeafKind::Label);
        let leaf_id = leaf.id;
        let mut first = stack("First");
        first.children.push(leaf_id);
        first.children.push(ElementId::mint());
        let mut second = stack("Second");
        second.children.push(leaf_id);
        let mut root = stack("Root");
        root.children = vec![first.id, second.id];
        let root_id = root.id;

        let set: RecordSet = [
            ElementRecord::from(root),
            first.into(),
            second.into(),
            leaf.into(),
        ]
        .into_iter()
        .collect();
        let warnings = DocumentSnapshot::new(root_id, set).validate().unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, SnapshotWarning::DanglingChild { .. }))
        );
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, SnapshotWarning::SharedChild { child } if *child == leaf_id))
        );
    }

    #[test]
    fn element_record_serde_round_trip() {
        let mut leaf = LeafRecord::new("Speed", LeafKind::Field);
        leaf.target = Some("speed".into());
        leaf.payload = LeafPayload::Number {
            style: NumberStyle::Slider,
            slider_min: 0.0,
            slider_max: 10.0,
        };
        let record = ElementRecord::from(leaf);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"element\":\"leaf\""));
        assert!(json.contains("\"kind\":\"number\""));
        let back: ElementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn visibility_rule_serde_shape() {
        let rule = VisibilityRule::Delegated {
            symbol: "is_advanced".into(),
            kind: PredicateKind::Property,
        };
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"rule\":\"delegated\""));
        assert!(json.contains("\"kind\":\"property\""));
        let back: VisibilityRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
