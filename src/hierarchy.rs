use anyhow::{anyhow, bail, Context, Result};
use bevy_ecs::prelude::{Component, Entity, World};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct NodeName(pub String);

/// Non-owning link to the parent node.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

#[derive(Component, Clone, Debug, Default)]
pub struct Children(pub Vec<Entity>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentSlot {
    Bound { type_name: String },
    /// The slot exists but its implementing type could not be resolved.
    Missing { reference: Option<String> },
}

impl ComponentSlot {
    pub fn bound(type_name: impl Into<String>) -> Self {
        Self::Bound { type_name: type_name.into() }
    }

    pub fn missing() -> Self {
        Self::Missing { reference: None }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ComponentSlot::Missing { .. })
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct ComponentSlots(pub Vec<ComponentSlot>);

/// Component type names that resolve to a real implementation.
#[derive(Clone, Debug, Default)]
pub struct ComponentRegistry {
    known: BTreeSet<String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        const BUILTIN: [&str; 9] =
            ["Transform", "MeshFilter", "MeshRenderer", "Camera", "Light", "Collider", "RigidBody", "AudioSource", "Sprite"];
        for name in BUILTIN {
            registry.register(name);
        }
        registry
    }

    pub fn register(&mut self, type_name: impl Into<String>) {
        self.known.insert(type_name.into());
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.known.contains(type_name)
    }

    pub fn resolve(&self, reference: Option<&str>) -> ComponentSlot {
        match reference {
            Some(name) if self.contains(name) => ComponentSlot::bound(name),
            other => ComponentSlot::Missing { reference: other.map(str::to_string) },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyFile {
    #[serde(default)]
    pub registered_types: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<HierarchyNodeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyNodeData {
    pub name: String,
    /// Index of the parent in `nodes`; must refer to an earlier node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    /// `null` entries are slots whose script reference was lost.
    #[serde(default)]
    pub components: Vec<Option<String>>,
}

pub struct SceneHierarchy {
    world: World,
    roots: Vec<Entity>,
    nodes: Vec<Entity>,
}

impl Default for SceneHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHierarchy {
    pub fn new() -> Self {
        Self { world: World::new(), roots: Vec::new(), nodes: Vec::new() }
    }

    pub fn load_from_path(path: impl AsRef<Path>, registry: &ComponentRegistry) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Reading hierarchy file {}", path.display()))?;
        let file = serde_json::from_slice::<HierarchyFile>(&bytes)
            .with_context(|| format!("Parsing hierarchy file {}", path.display()))?;
        Self::from_file(&file, registry).with_context(|| format!("Building hierarchy from {}", path.display()))
    }

    pub fn from_file(file: &HierarchyFile, registry: &ComponentRegistry) -> Result<Self> {
        let mut registry = registry.clone();
        for type_name in &file.registered_types {
            registry.register(type_name.clone());
        }
        let mut hierarchy = Self::new();
        for (index, node) in file.nodes.iter().enumerate() {
            let slots = node.components.iter().map(|reference| registry.resolve(reference.as_deref())).collect();
            match node.parent {
                None => {
                    hierarchy.spawn_root(node.name.clone(), slots);
                }
                Some(parent_index) if parent_index < index => {
                    let parent = hierarchy.nodes[parent_index];
                    hierarchy.spawn_child(parent, node.name.clone(), slots)?;
                }
                Some(parent_index) => {
                    bail!("node {index} ('{}') has parent index {parent_index}, parents must come first", node.name)
                }
            }
        }
        Ok(hierarchy)
    }

    pub fn spawn_root(&mut self, name: impl Into<String>, slots: Vec<ComponentSlot>) -> Entity {
        let entity =
            self.world.spawn((NodeName(name.into()), Children::default(), ComponentSlots(slots))).id();
        self.roots.push(entity);
        self.nodes.push(entity);
        entity
    }

    pub fn spawn_child(
        &mut self,
        parent: Entity,
        name: impl Into<String>,
        slots: Vec<ComponentSlot>,
    ) -> Result<Entity> {
        if !self.contains(parent) {
            return Err(anyhow!("parent entity {} is not part of this hierarchy", parent.index()));
        }
        let entity = self
            .world
            .spawn((NodeName(name.into()), Parent(parent), Children::default(), ComponentSlots(slots)))
            .id();
        if let Some(mut children) = self.world.get_mut::<Children>(parent) {
            children.0.push(entity);
        }
        self.nodes.push(entity);
        Ok(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get::<NodeName>(entity).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }

    /// Every node in creation order.
    pub fn nodes(&self) -> &[Entity] {
        &self.nodes
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<NodeName>(entity).map(|name| name.0.as_str())
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<Parent>(entity).map(|parent| parent.0)
    }

    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.world.get::<Children>(entity).map(|children| children.0.as_slice()).unwrap_or(&[])
    }

    pub fn slots(&self, entity: Entity) -> &[ComponentSlot] {
        self.world.get::<ComponentSlots>(entity).map(|slots| slots.0.as_slice()).unwrap_or(&[])
    }

    /// Names from the root down to `entity`, joined by `separator`.
    pub fn path_of(&self, entity: Entity, separator: &str) -> Option<String> {
        let mut segments = vec![self.name(entity)?];
        let mut current = entity;
        while let Some(parent) = self.parent(current) {
            segments.push(self.name(parent)?);
            current = parent;
        }
        segments.reverse();
        Some(segments.join(separator))
    }

    /// First node, depth-first from the roots, whose path matches `path`.
    pub fn find_by_path(&self, path: &str, separator: &str) -> Option<Entity> {
        let mut segments = path.split(separator).filter(|segment| !segment.is_empty());
        let first = segments.next()?;
        let rest: Vec<&str> = segments.collect();
        self.roots
            .iter()
            .filter(|root| self.name(**root) == Some(first))
            .find_map(|root| self.descend(*root, &rest))
    }

    fn descend(&self, entity: Entity, rest: &[&str]) -> Option<Entity> {
        let Some((next, tail)) = rest.split_first() else {
            return Some(entity);
        };
        self.children(entity)
            .iter()
            .filter(|child| self.name(**child) == Some(*next))
            .find_map(|child| self.descend(*child, tail))
    }
}
