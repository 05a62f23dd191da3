use crate::config::ScanConfig;
use crate::hierarchy::SceneHierarchy;
use bevy_ecs::prelude::Entity;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Only the selected objects.
    Selection,
    /// The selected objects and all of their descendants, parents before children.
    Recursive,
}

impl ScanMode {
    pub fn label(self) -> &'static str {
        match self {
            ScanMode::Selection => "Find Missing Scripts in selected prefabs",
            ScanMode::Recursive => "Find Missing Scripts in selected GameObjects",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTotals {
    pub objects: usize,
    pub components: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSlot {
    pub entity: Entity,
    pub path: String,
    pub position: usize,
}

impl fmt::Display for MissingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} has an empty script attached in position: {}", self.path, self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub mode: ScanMode,
    pub totals: ScanTotals,
    pub missing: Vec<MissingSlot>,
}

impl ScanReport {
    pub fn summary(&self) -> String {
        format!(
            "Searched {} objects, {} components, found {} missing",
            self.totals.objects, self.totals.components, self.totals.missing
        )
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
        lines.push(self.summary());
        lines
    }

    /// Writes one warning per missing slot and the totals to the `log` facade.
    pub fn emit(&self) {
        for slot in &self.missing {
            log::warn!(target: "missing_scripts", "{slot}");
        }
        log::info!(target: "missing_scripts", "{}", self.summary());
    }
}

pub struct MissingScriptFinder {
    separator: String,
}

impl Default for MissingScriptFinder {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

impl MissingScriptFinder {
    pub fn new(config: &ScanConfig) -> Self {
        Self { separator: config.path_separator.clone() }
    }

    /// Read-only scan of `selection`. Entities that are not part of `hierarchy` are skipped.
    pub fn scan(&self, hierarchy: &SceneHierarchy, selection: &[Entity], mode: ScanMode) -> ScanReport {
        let mut report = ScanReport { mode, totals: ScanTotals::default(), missing: Vec::new() };
        for &root in selection {
            if !hierarchy.contains(root) {
                continue;
            }
            match mode {
                ScanMode::Selection => self.visit(hierarchy, root, &mut report),
                ScanMode::Recursive => {
                    let mut stack: SmallVec<[Entity; 32]> = SmallVec::new();
                    stack.push(root);
                    while let Some(entity) = stack.pop() {
                        self.visit(hierarchy, entity, &mut report);
                        stack.extend(hierarchy.children(entity).iter().rev().copied());
                    }
                }
            }
        }
        report
    }

    fn visit(&self, hierarchy: &SceneHierarchy, entity: Entity, report: &mut ScanReport) {
        report.totals.objects += 1;
        for (position, slot) in hierarchy.slots(entity).iter().enumerate() {
            report.totals.components += 1;
            if slot.is_missing() {
                report.totals.missing += 1;
                let path = hierarchy.path_of(entity, &self.separator).unwrap_or_default();
                report.missing.push(MissingSlot { entity, path, position });
            }
        }
    }
}
