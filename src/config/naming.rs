//! Generated resource names.

use uuid::Uuid;

use super::settings::NamingSettings;

/// Minimum random characters appended when the prefix fills the length.
const MIN_SUFFIX_LEN: usize = 3;

/// Names used by a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleNames {
    /// Resource group name.
    pub resource_group: String,
    /// Web app name.
    pub web_app: String,
}

impl SampleNames {
    /// Generates fresh names for a run.
    #[must_use]
    pub fn generate(naming: &NamingSettings) -> Self {
        Self {
            resource_group: random_resource_name(
                &naming.resource_group_prefix,
                naming.resource_group_length,
            ),
            web_app: random_resource_name(&naming.web_app_prefix, naming.web_app_length),
        }
    }
}

/// Name of the app service plan created alongside `web_app`.
#[must_use]
pub fn plan_name(web_app: &str) -> String {
    format!("{web_app}-plan")
}

/// Builds `prefix` followed by random lowercase hex, `max_len` characters in
/// total.
#[must_use]
pub fn random_resource_name(prefix: &str, max_len: usize) -> String {
    let suffix_len = max_len
        .saturating_sub(prefix.len())
        .max(MIN_SUFFIX_LEN);

    let mut suffix = String::with_capacity(suffix_len);
    while suffix.len() < suffix_len {
        suffix.push_str(&Uuid::new_v4().simple().to_string());
    }
    suffix.truncate(suffix_len);

    format!("{prefix}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_match_prefixes() {
        let names = SampleNames::generate(&NamingSettings::default());

        assert!(names.web_app.starts_with("webapp1-"));
        assert_eq!(names.web_app.len(), 20);
        assert!(names.resource_group.starts_with("rg1NEMV_"));
        assert_eq!(names.resource_group.len(), 24);
        assert_eq!(plan_name(&names.web_app), format!("{}-plan", names.web_app));
    }

    #[test]
    fn test_names_unique_per_run() {
        let naming = NamingSettings::default();
        let generated: HashSet<_> = (0..64)
            .map(|_| SampleNames::generate(&naming))
            .flat_map(|n| [n.web_app, n.resource_group])
            .collect();

        assert_eq!(generated.len(), 128);
    }

    #[test]
    fn test_long_suffix_spans_several_uuids() {
        let name = random_resource_name("x", 80);
        assert_eq!(name.len(), 80);
        assert!(name[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_prefix_longer_than_length_still_gets_suffix() {
        let name = random_resource_name("averylongprefix", 4);
        assert_eq!(name.len(), "averylongprefix".len() + MIN_SUFFIX_LEN);
    }
}
