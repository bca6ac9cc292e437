use rescope_api::ResourceTypeId;
use serde::{Deserialize, Serialize};

/// Describes how one resource type is laid out inside a project directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTypeDescriptor {
    pub id: ResourceTypeId,
    pub label: String,
    /// Grouping used by tree consumers, e.g. `Scripting`.
    pub category: String,
    /// Slash-separated directory, relative to the project root, that holds this type.
    pub base_dir: String,
    /// Glob patterns, relative to `base_dir`, selecting the files that belong to a resource.
    pub patterns: Vec<String>,
    /// File whose presence makes a directory a resource.
    pub primary_file: String,
    /// Per-resource metadata file, e.g. `resource.json`.
    pub manifest_file: Option<String>,
    pub manifest_required: bool,
    /// Script-like types are parsed into symbol tables.
    pub indexed: bool,
}

impl ResourceTypeDescriptor {
    pub fn new(id: ResourceTypeId, base_dir: &str, primary_file: &str) -> Self {
        Self {
            label: id.to_string(),
            id,
            category: "General".to_string(),
            base_dir: base_dir.trim_matches('/').to_string(),
            patterns: Vec::new(),
            primary_file: primary_file.to_string(),
            manifest_file: None,
            manifest_required: false,
            indexed: false,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_manifest(mut self, file_name: &str, required: bool) -> Self {
        self.manifest_file = Some(file_name.to_string());
        self.manifest_required = required;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Patterns actually used for matching. Without explicit patterns, the primary file and
    /// the manifest file at any depth.
    pub fn effective_patterns(&self) -> Vec<String> {
        if !self.patterns.is_empty() {
            return self.patterns.clone();
        }
        let mut patterns = vec![format!("**/{}", self.primary_file)];
        if let Some(manifest) = &self.manifest_file {
            patterns.push(format!("**/{}", manifest));
        }
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_cover_primary_and_manifest() {
        let desc = ResourceTypeDescriptor::new(
            ResourceTypeId::from_static("script-python"),
            "/ignition/script-python/",
            "code.py",
        )
        .with_manifest("resource.json", true);

        assert_eq!(desc.base_dir, "ignition/script-python");
        assert_eq!(
            desc.effective_patterns(),
            vec!["**/code.py".to_string(), "**/resource.json".to_string()]
        );
    }

    #[test]
    fn test_explicit_patterns_win() {
        let desc = ResourceTypeDescriptor::new(ResourceTypeId::from_static("view"), "views", "view.json")
            .with_patterns(["**/view.json", "**/thumbnail.png"]);
        assert_eq!(desc.effective_patterns().len(), 2);
    }
}
