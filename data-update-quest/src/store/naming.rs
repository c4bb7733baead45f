/// Default namespace of the platform's search indexes.
pub const DEFAULT_INDEX_PREFIX: &str = "com.cosmotech";

/// Maps short collection names (`organization`) to search index names
/// (`com.cosmotech.organization.domain.OrganizationIdx`) and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNaming {
    prefix: String,
}

impl Default for IndexNaming {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_PREFIX)
    }
}

impl IndexNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn index_for(&self, short_name: &str) -> String {
        let lower = short_name.to_lowercase();
        format!("{}.{lower}.domain.{}Idx", self.prefix, capitalize(&lower))
    }

    /// Segment following the prefix, or `None` for indexes outside the namespace.
    pub fn short_name(&self, index: &str) -> Option<String> {
        let rest = index.strip_prefix(&self.prefix)?.strip_prefix('.')?;
        let name = rest.split('.').next()?;
        (!name.is_empty()).then(|| name.to_string())
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_for_short_name() {
        let naming = IndexNaming::default();
        assert_eq!(naming.index_for("organization"), "com.cosmotech.organization.domain.OrganizationIdx");
        assert_eq!(naming.index_for("Solution"), "com.cosmotech.solution.domain.SolutionIdx");
    }

    #[test]
    fn test_short_name_round_trip() {
        let naming = IndexNaming::default();
        let index = naming.index_for("workspace");
        assert_eq!(naming.short_name(&index).as_deref(), Some("workspace"));
    }

    #[test]
    fn test_short_name_outside_namespace() {
        let naming = IndexNaming::new("com.example");
        assert_eq!(naming.short_name("com.cosmotech.organization.domain.OrganizationIdx"), None);
        assert_eq!(naming.short_name("com.examplex.a.domain.AIdx"), None);
        assert_eq!(naming.short_name("com.example"), None);
        assert_eq!(naming.short_name("com.example.dataset.domain.DatasetIdx").as_deref(), Some("dataset"));
    }
}
