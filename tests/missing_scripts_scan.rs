use kestrel_toolkit::config::ScanConfig;
use kestrel_toolkit::hierarchy::{ComponentRegistry, ComponentSlot, SceneHierarchy};
use kestrel_toolkit::missing_scripts::{MissingScriptFinder, ScanMode, ScanTotals};
use std::io::Write;
use tempfile::NamedTempFile;

fn sample() -> (SceneHierarchy, bevy_ecs::prelude::Entity) {
    let mut hierarchy = SceneHierarchy::new();
    let root = hierarchy.spawn_root("R", vec![ComponentSlot::bound("Transform"), ComponentSlot::missing()]);
    hierarchy
        .spawn_child(
            root,
            "C",
            vec![ComponentSlot::missing(), ComponentSlot::bound("Sprite"), ComponentSlot::missing()],
        )
        .expect("spawn child");
    (hierarchy, root)
}

#[test]
fn recursive_scan_reports_parent_before_children() {
    let (hierarchy, root) = sample();
    let report = MissingScriptFinder::default().scan(&hierarchy, &[root], ScanMode::Recursive);
    assert_eq!(report.totals, ScanTotals { objects: 2, components: 5, missing: 3 });
    let lines = report.lines();
    assert_eq!(
        lines,
        vec![
            "R has an empty script attached in position: 1".to_string(),
            "R/C has an empty script attached in position: 0".to_string(),
            "R/C has an empty script attached in position: 2".to_string(),
            "Searched 2 objects, 5 components, found 3 missing".to_string(),
        ]
    );
}

#[test]
fn selection_scan_only_visits_selected_objects() {
    let (hierarchy, root) = sample();
    let report = MissingScriptFinder::default().scan(&hierarchy, &[root], ScanMode::Selection);
    assert_eq!(report.totals, ScanTotals { objects: 1, components: 2, missing: 1 });
}

#[test]
fn recursive_scan_walks_deep_trees_in_pre_order() {
    let mut hierarchy = SceneHierarchy::new();
    let root = hierarchy.spawn_root("A", vec![ComponentSlot::missing()]);
    let b = hierarchy.spawn_child(root, "B", vec![ComponentSlot::missing()]).expect("B");
    hierarchy.spawn_child(b, "D", vec![ComponentSlot::missing()]).expect("D");
    hierarchy.spawn_child(root, "C", vec![ComponentSlot::missing()]).expect("C");
    let report = MissingScriptFinder::default().scan(&hierarchy, &[root], ScanMode::Recursive);
    let paths: Vec<_> = report.missing.iter().map(|slot| slot.path.as_str()).collect();
    assert_eq!(paths, vec!["A", "A/B", "A/B/D", "A/C"]);
}

#[test]
fn hierarchy_file_resolves_registered_types() {
    let mut temp = NamedTempFile::new().expect("temp hierarchy");
    write!(
        temp,
        r#"{{
            "registered_types": ["Spinner"],
            "nodes": [
                {{ "name": "Level", "components": ["Transform", "Spinner", null] }},
                {{ "name": "Door", "parent": 0, "components": ["Transform", "DeletedScript"] }}
            ]
        }}"#
    )
    .expect("write hierarchy");

    let hierarchy = SceneHierarchy::load_from_path(temp.path(), &ComponentRegistry::with_builtin()).expect("load");
    assert_eq!(hierarchy.len(), 2);
    let config = ScanConfig { path_separator: "::".to_string() };
    let door = hierarchy.find_by_path("Level::Door", &config.path_separator).expect("door");
    assert_eq!(hierarchy.slots(door)[1], ComponentSlot::Missing { reference: Some("DeletedScript".to_string()) });

    let report = MissingScriptFinder::new(&config).scan(&hierarchy, hierarchy.roots(), ScanMode::Recursive);
    assert_eq!(report.totals, ScanTotals { objects: 2, components: 5, missing: 2 });
    assert_eq!(report.missing[0].to_string(), "Level has an empty script attached in position: 2");
    assert_eq!(report.missing[1].to_string(), "Level::Door has an empty script attached in position: 1");
}

#[test]
fn parents_listed_after_children_are_rejected() {
    let mut temp = NamedTempFile::new().expect("temp hierarchy");
    write!(temp, r#"{{"nodes":[{{"name":"Child","parent":1}},{{"name":"Root"}}]}}"#).expect("write hierarchy");
    assert!(SceneHierarchy::load_from_path(temp.path(), &ComponentRegistry::new()).is_err());
}
