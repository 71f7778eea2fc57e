//! Label mapping profiles
//!
//! Alert groups label their descriptive fields differently. A profile names
//! the label keys that feed each record field. Keys are case-sensitive.

/// Label keys feeding the descriptive fields of an [`AlertRecord`](crate::AlertRecord)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelProfile {
    pub hostname: &'static str,
    pub account: &'static str,
    pub location: &'static str,
    pub source_name: &'static str,
}

/// Label key selecting the profile
pub const GROUP_LABEL: &str = "group";

const DEFAULT_PROFILE: LabelProfile = LabelProfile {
    hostname: "Hostname",
    account: "Account",
    location: "Location",
    source_name: "prom_serv",
};

const GUARDIAN_PROFILE: LabelProfile = LabelProfile {
    hostname: "hostname",
    account: "policy_description",
    location: "disksafe_description",
    source_name: "prom_serv",
};

/// Groups with their own label schema
const PROFILES: &[(&str, LabelProfile)] = &[("guardian", GUARDIAN_PROFILE)];

impl LabelProfile {
    /// Profile for the given `group` label value
    pub fn for_group(group: Option<&str>) -> &'static LabelProfile {
        group
            .and_then(|g| PROFILES.iter().find(|(name, _)| *name == g))
            .map(|(_, profile)| profile)
            .unwrap_or(&DEFAULT_PROFILE)
    }
}
