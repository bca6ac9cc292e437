use rescope_api::ResourceTypeId;
use rescope_plugin::ResourceTypeDescriptor;

/// Directory under a project root that holds every built-in resource type.
pub const RESOURCE_ROOT: &str = "ignition";

/// Per-resource metadata file.
pub const RESOURCE_MANIFEST: &str = "resource.json";

pub const SCRIPT_PYTHON: ResourceTypeId = ResourceTypeId::from_static("script-python");
pub const NAMED_QUERY: ResourceTypeId = ResourceTypeId::from_static("named-query");
pub const PERSPECTIVE_VIEW: ResourceTypeId = ResourceTypeId::from_static("perspective-view");
pub const STYLE_CLASS: ResourceTypeId = ResourceTypeId::from_static("style-class");
pub const VISION_WINDOW: ResourceTypeId = ResourceTypeId::from_static("vision-window");
pub const REPORT: ResourceTypeId = ResourceTypeId::from_static("report");
pub const EVENT_SCRIPTS: ResourceTypeId = ResourceTypeId::from_static("event-scripts");

fn descriptor(id: ResourceTypeId, label: &str, category: &str, primary_file: &str) -> ResourceTypeDescriptor {
    let base_dir = format!("{}/{}", RESOURCE_ROOT, id);
    ResourceTypeDescriptor::new(id, &base_dir, primary_file)
        .with_label(label)
        .with_category(category)
        .with_manifest(RESOURCE_MANIFEST, true)
}

pub fn builtin_types() -> Vec<ResourceTypeDescriptor> {
    vec![
        descriptor(SCRIPT_PYTHON, "Project Library", "Scripting", "code.py").indexed(),
        descriptor(NAMED_QUERY, "Named Queries", "Data", "query.sql"),
        descriptor(PERSPECTIVE_VIEW, "Perspective Views", "Perspective", "view.json")
            .with_patterns(["**/view.json", "**/thumbnail.png", "**/resource.json"]),
        descriptor(STYLE_CLASS, "Style Classes", "Perspective", "style.json"),
        descriptor(VISION_WINDOW, "Vision Windows", "Vision", "window.bin"),
        descriptor(REPORT, "Reports", "Reporting", "data.bin"),
        descriptor(EVENT_SCRIPTS, "Gateway Events", "Scripting", "data.bin"),
    ]
}
