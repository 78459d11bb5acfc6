use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use thiserror::Error;

use crate::HierarchyId;

/// A single data point assigned to a group.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub name: String,
    pub data: Vec<f64>,
    pub true_class: Option<String>,
}

impl Instance {
    pub fn new(name: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data,
            true_class: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.true_class = Some(class.into());
        self
    }
}

/// One node of a hierarchy. `parent` and `children` index into [`Hierarchy::groups`].
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub id: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub instances: Vec<Instance>,
}

impl Group {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Read-only view of a clustering result consumed by measures.
///
/// Measures never mutate a hierarchy; the host owns it and lends it to the
/// dispatcher for the duration of an evaluation run.
pub trait Hierarchy: Send + Sync + fmt::Debug {
    fn id(&self) -> &HierarchyId;

    /// Number of distinct ground-truth classes. Zero when the data carries no labels.
    fn number_of_classes(&self) -> usize;

    fn groups(&self) -> &[Group];

    fn root(&self) -> Option<&Group> {
        self.groups().iter().find(|group| group.parent.is_none())
    }

    fn group(&self, index: usize) -> Option<&Group> {
        self.groups().get(index)
    }

    fn instance_count(&self) -> usize {
        self.groups().iter().map(|group| group.instances.len()).sum()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("duplicate group: {0}")]
    DuplicateGroup(String),
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("hierarchy has no root group")]
    NoRoot,
    #[error("hierarchy has multiple root groups: {0:?}")]
    MultipleRoots(Vec<String>),
    #[error("group not reachable from root: {0}")]
    Detached(String),
    #[error("invalid hierarchy document: {0}")]
    Invalid(String),
}

/// In-memory hierarchy produced by [`HierarchyBuilder`].
#[derive(Clone, Debug)]
pub struct BasicHierarchy {
    id: HierarchyId,
    groups: Vec<Group>,
    classes: Vec<String>,
}

impl BasicHierarchy {
    pub fn builder() -> HierarchyBuilder {
        HierarchyBuilder::new()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn index_of(&self, group_id: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.id == group_id)
    }
}

impl Hierarchy for BasicHierarchy {
    fn id(&self) -> &HierarchyId {
        &self.id
    }

    fn number_of_classes(&self) -> usize {
        self.classes.len()
    }

    fn groups(&self) -> &[Group] {
        &self.groups
    }
}

#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    id: Option<HierarchyId>,
    groups: Vec<(String, Option<String>)>,
    index: HashMap<String, usize>,
    instances: Vec<(String, Instance)>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&mut self, id: HierarchyId) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn group(
        &mut self,
        id: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<&mut Self, HierarchyError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(HierarchyError::DuplicateGroup(id));
        }
        self.index.insert(id.clone(), self.groups.len());
        self.groups.push((id, parent.map(str::to_string)));
        Ok(self)
    }

    /// Queues an instance for `group`; the group is resolved in [`build`](Self::build).
    pub fn instance(&mut self, group: impl Into<String>, instance: Instance) -> &mut Self {
        self.instances.push((group.into(), instance));
        self
    }

    pub fn build(&mut self) -> Result<BasicHierarchy, HierarchyError> {
        let mut groups: Vec<Group> = self
            .groups
            .iter()
            .map(|(id, _)| Group {
                id: id.clone(),
                parent: None,
                children: Vec::new(),
                instances: Vec::new(),
            })
            .collect();

        let mut roots = Vec::new();
        for (idx, (id, parent)) in self.groups.iter().enumerate() {
            match parent {
                Some(parent_id) => {
                    let parent_idx = *self
                        .index
                        .get(parent_id)
                        .ok_or_else(|| HierarchyError::UnknownGroup(parent_id.clone()))?;
                    groups[idx].parent = Some(parent_idx);
                    groups[parent_idx].children.push(idx);
                }
                None => roots.push(id.clone()),
            }
        }

        match roots.len() {
            0 => return Err(HierarchyError::NoRoot),
            1 => {}
            _ => return Err(HierarchyError::MultipleRoots(roots)),
        }

        let root = self.index[&roots[0]];
        let mut seen = vec![false; groups.len()];
        let mut queue = VecDeque::from([root]);
        while let Some(idx) = queue.pop_front() {
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            queue.extend(groups[idx].children.iter().copied());
        }
        if let Some(idx) = seen.iter().position(|visited| !visited) {
            return Err(HierarchyError::Detached(groups[idx].id.clone()));
        }

        let mut classes = BTreeSet::new();
        for (group_id, instance) in &self.instances {
            let idx = *self
                .index
                .get(group_id)
                .ok_or_else(|| HierarchyError::UnknownGroup(group_id.clone()))?;
            if let Some(class) = &instance.true_class {
                classes.insert(class.clone());
            }
            groups[idx].instances.push(instance.clone());
        }

        Ok(BasicHierarchy {
            id: self.id.clone().unwrap_or_default(),
            groups,
            classes: classes.into_iter().collect(),
        })
    }
}

#[cfg(feature = "serde-full")]
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GroupRecord {
    pub id: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[cfg(feature = "serde-full")]
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct InstanceRecord {
    pub group: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: Vec<f64>,
    #[serde(default, rename = "class")]
    pub true_class: Option<String>,
}

/// Flat, serialisable description of a hierarchy.
#[cfg(feature = "serde-full")]
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HierarchyDocument {
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

#[cfg(feature = "serde-full")]
impl HierarchyDocument {
    pub fn from_json_str(raw: &str) -> Result<Self, HierarchyError> {
        serde_json::from_str(raw).map_err(|err| HierarchyError::Invalid(err.to_string()))
    }

    pub fn into_hierarchy(self) -> Result<BasicHierarchy, HierarchyError> {
        let mut builder = HierarchyBuilder::new();
        for record in &self.groups {
            builder.group(record.id.clone(), record.parent.as_deref())?;
        }
        for record in self.instances {
            let mut instance = Instance::new(record.name, record.data);
            instance.true_class = record.true_class;
            builder.instance(record.group, instance);
        }
        builder.build()
    }
}
