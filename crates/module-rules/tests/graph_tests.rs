//! Integration tests for graph validation and ordering

use module_rules::{
    GraphError, ModuleDescriptor, ModuleGraph, ModuleRegistry, PchUsageMode, RegistryError,
};

fn leaf(name: &str) -> ModuleDescriptor {
    ModuleDescriptor::new(name, PchUsageMode::Default)
}

fn fog_registry() -> ModuleRegistry {
    let mut editor =
        ModuleDescriptor::new("VolumetricFogEditor", PchUsageMode::UseExplicitOrSharedPchs);
    editor.add_public_dependencies(["Core", "CoreUObject", "Engine", "UnrealEd", "VolumetricFog"]);

    ModuleRegistry::from_descriptors([
        editor,
        leaf("Core"),
        leaf("CoreUObject"),
        leaf("Engine"),
        leaf("UnrealEd"),
        leaf("VolumetricFog"),
    ])
    .unwrap()
}

fn position(order: &[&ModuleDescriptor], name: &str) -> usize {
    order.iter().position(|d| d.name == name).unwrap()
}

#[test]
fn test_names_unique_and_non_empty() {
    let mut registry = fog_registry();
    assert_eq!(registry.len(), 6);

    // Same name again
    let result = registry.insert(leaf("Engine"));
    assert!(matches!(result, Err(RegistryError::DuplicateModule(ref n)) if n == "Engine"));

    // Empty and malformed names
    assert!(matches!(registry.insert(leaf("")), Err(RegistryError::InvalidName(_))));
    assert!(matches!(
        registry.insert(leaf("Volumetric Fog")),
        Err(RegistryError::InvalidName(_))
    ));

    assert_eq!(registry.len(), 6);
    assert!(registry.names().all(|n| !n.is_empty()));
}

#[test]
fn test_every_dependency_resolves() {
    let registry = fog_registry();
    let graph = ModuleGraph::new(&registry);

    assert!(graph.unresolved().is_empty());
    for desc in registry.iter() {
        for dep in desc.dependencies() {
            assert_eq!(registry.get(dep).map(|d| d.name.as_str()), Some(dep));
        }
    }
}

#[test]
fn test_fog_registry_has_no_cycles() {
    let registry = fog_registry();
    let graph = ModuleGraph::new(&registry);

    assert!(graph.find_cycle().is_none());
    assert!(graph.validate().is_ok());
}

#[test]
fn test_editor_ordered_after_dependencies() {
    let registry = fog_registry();
    let order = ModuleGraph::new(&registry).topological_order().unwrap();

    assert_eq!(order.len(), 6);
    let editor = position(&order, "VolumetricFogEditor");
    for dep in ["Core", "CoreUObject", "Engine", "UnrealEd", "VolumetricFog"] {
        assert!(position(&order, dep) < editor, "{} should precede the editor module", dep);
    }
    assert_eq!(editor, 5);
}

#[test]
fn test_dangling_reference() {
    let mut editor = leaf("VolumetricFogEditor");
    editor.add_public_dependency("VolumetricFog");
    let registry = ModuleRegistry::from_descriptors([editor, leaf("Core")]).unwrap();
    let graph = ModuleGraph::new(&registry);

    let unresolved = graph.unresolved();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].module, "VolumetricFogEditor");
    assert_eq!(unresolved[0].dependency, "VolumetricFog");

    assert_eq!(
        graph.topological_order().unwrap_err(),
        GraphError::UnresolvedDependency {
            module: "VolumetricFogEditor".to_string(),
            dependency: "VolumetricFog".to_string(),
        }
    );
}

#[test]
fn test_cycle_rejected() {
    let registry = ModuleRegistry::from_descriptors([
        leaf("Engine").with_public_dependencies(["UnrealEd"]),
        leaf("UnrealEd").with_private_dependencies(["Engine"]),
    ])
    .unwrap();

    let err = ModuleGraph::new(&registry).validate().unwrap_err();
    assert_eq!(
        err,
        GraphError::CircularDependency(vec![
            "Engine".to_string(),
            "UnrealEd".to_string(),
            "Engine".to_string(),
        ])
    );
    assert_eq!(
        err.to_string(),
        "Circular dependency detected: Engine -> UnrealEd -> Engine"
    );
}

#[test]
fn test_build_order_for_target_ignores_unrelated_modules() {
    let registry = ModuleRegistry::from_descriptors([
        leaf("Core"),
        leaf("Engine").with_public_dependencies(["Core"]),
        leaf("Game").with_public_dependencies(["Engine"]),
        // broken, but not reachable from Engine
        leaf("Broken").with_public_dependencies(["Missing"]),
    ])
    .unwrap();
    let graph = ModuleGraph::new(&registry);

    let order: Vec<&str> = graph
        .build_order("Engine")
        .unwrap()
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(order, vec!["Core", "Engine"]);
    assert!(graph.topological_order().is_err());
}

#[test]
fn test_diamond_order() {
    let registry = ModuleRegistry::from_descriptors([
        leaf("Core"),
        leaf("Renderer").with_public_dependencies(["Core"]),
        leaf("Physics").with_public_dependencies(["Core"]),
        leaf("Engine").with_public_dependencies(["Renderer", "Physics"]),
    ])
    .unwrap();

    let order: Vec<String> = ModuleGraph::new(&registry)
        .topological_order()
        .unwrap()
        .iter()
        .map(|d| d.name.clone())
        .collect();
    assert_eq!(order, vec!["Core", "Physics", "Renderer", "Engine"]);
}

#[test]
fn test_public_closure_is_transitive() {
    let registry = ModuleRegistry::from_descriptors([
        leaf("Core"),
        leaf("CoreUObject").with_public_dependencies(["Core"]),
        leaf("Engine").with_public_dependencies(["CoreUObject", "Core"]),
        leaf("VolumetricFog").with_public_dependencies(["Engine"]),
    ])
    .unwrap();
    let graph = ModuleGraph::new(&registry);

    assert_eq!(
        graph.public_closure("VolumetricFog").unwrap(),
        vec!["Engine", "CoreUObject", "Core"]
    );
    assert!(graph.public_closure("Core").unwrap().is_empty());
}

#[test]
fn test_private_dependencies_not_reexposed() {
    let registry = ModuleRegistry::from_descriptors([
        leaf("Core"),
        leaf("Slate"),
        leaf("Engine").with_public_dependencies(["Core"]),
        leaf("FogEditor")
            .with_public_dependencies(["Engine"])
            .with_private_dependencies(["Slate"]),
        leaf("Tools").with_public_dependencies(["FogEditor"]),
    ])
    .unwrap();
    let graph = ModuleGraph::new(&registry);

    assert_eq!(graph.public_closure("FogEditor").unwrap(), vec!["Engine", "Core"]);
    assert_eq!(
        graph.link_closure("FogEditor").unwrap(),
        vec!["Engine", "Core", "Slate"]
    );
    assert_eq!(
        graph.link_closure("Tools").unwrap(),
        vec!["FogEditor", "Engine", "Core"]
    );
}

#[test]
fn test_dependents() {
    let registry = fog_registry();
    let graph = ModuleGraph::new(&registry);

    assert_eq!(graph.dependents("Engine").unwrap(), vec!["VolumetricFogEditor"]);
    assert!(graph.dependents("VolumetricFogEditor").unwrap().is_empty());
}
