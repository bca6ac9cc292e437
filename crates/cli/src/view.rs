use rescope_api::{CompletionItem, Origin, Project, Resource, ResourceKind, Warning};
use tabled::Tabled;

fn origin_label(origin: Option<&Origin>) -> String {
    match origin {
        Some(Origin::Inherited(source)) => format!("inherited ({})", source),
        Some(Origin::Local) => "local".to_string(),
        None => "-".to_string(),
    }
}

#[derive(Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "Project")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Parent")]
    pub parent: String,
    #[tabled(rename = "Resources")]
    pub resources: String,
    #[tabled(rename = "Inherited")]
    pub inherited: String,
    #[tabled(rename = "Warnings")]
    pub warnings: usize,
}

impl ProjectRow {
    pub fn new(project: &Project, counts: Option<(usize, usize)>, warnings: usize) -> Self {
        let (resources, inherited) = match counts {
            Some((total, inherited)) => (total.to_string(), inherited.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        Self {
            id: project.id.to_string(),
            title: project.title.clone().unwrap_or_else(|| "-".to_string()),
            parent: project
                .parent_id
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            resources,
            inherited,
            warnings,
        }
    }
}

#[derive(Tabled)]
pub struct ResourceRow {
    #[tabled(rename = "Type")]
    pub type_id: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Origin")]
    pub origin: String,
}

impl From<&Resource> for ResourceRow {
    fn from(resource: &Resource) -> Self {
        let kind = match resource.kind {
            ResourceKind::Resource => "resource",
            ResourceKind::Folder => "folder",
            ResourceKind::OrphanedManifest => "orphaned manifest",
        };
        Self {
            type_id: resource.key.type_id.to_string(),
            path: resource.key.path.to_string(),
            kind: kind.to_string(),
            origin: origin_label(Some(&resource.origin)),
        }
    }
}

#[derive(Tabled)]
pub struct CompletionRow {
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Insert")]
    pub insert: String,
    #[tabled(rename = "Line")]
    pub line: String,
    #[tabled(rename = "Origin")]
    pub origin: String,
}

impl From<&CompletionItem> for CompletionRow {
    fn from(item: &CompletionItem) -> Self {
        Self {
            label: item.label.clone(),
            kind: format!("{:?}", item.kind),
            insert: item
                .call_style
                .clone()
                .unwrap_or_else(|| item.qualified_name.clone()),
            line: item
                .definition_line
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string()),
            origin: origin_label(item.origin.as_ref()),
        }
    }
}

#[derive(Tabled)]
pub struct WarningRow {
    #[tabled(rename = "Project")]
    pub project: String,
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Warning")]
    pub message: String,
}

impl From<&Warning> for WarningRow {
    fn from(warning: &Warning) -> Self {
        Self {
            project: warning.project.to_string(),
            resource: warning
                .resource
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            message: warning.kind.to_string(),
        }
    }
}
