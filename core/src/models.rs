use std::collections::HashSet;

use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ApkJson {
    pub package_name: Option<String>,

    pub min_sdk_version: Option<String>,

    pub target_sdk_version: Option<String>,

    pub max_sdk_version: Option<String>,

    #[serde(serialize_with = "sorted_set")]
    pub declared_permissions: HashSet<String>,

    pub shared_user_id: Option<String>,

    pub shared_user_label: Option<String>,

    pub shared_user_max_sdk_version: Option<String>,

    pub version_code: Option<String>,

    pub version_name: Option<String>,

    pub install_location: Option<String>,

    #[serde(serialize_with = "sorted_set")]
    pub features: HashSet<String>,

    #[serde(serialize_with = "sorted_set")]
    pub permissions: HashSet<String>,

    #[serde(serialize_with = "sorted_set")]
    pub permissions_sdk23: HashSet<String>,
}

fn sorted_set<S>(set: &HashSet<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut vec: Vec<_> = set.iter().collect();
    vec.sort();
    vec.serialize(serializer)
}

/// A `<service>` declaration, borrowed directly from the decoded manifest tree.
#[derive(Debug)]
pub struct Service<'a> {
    pub description: Option<&'a str>,
    pub direct_boot_aware: Option<&'a str>,
    pub enabled: Option<&'a str>,
    pub exported: Option<&'a str>,
    pub foreground_service_type: Option<&'a str>,
    pub isolated_process: Option<&'a str>,
    pub name: Option<&'a str>,
    pub permission: Option<&'a str>,
    pub process: Option<&'a str>,
    pub stop_with_task: Option<&'a str>,
}

/// A `<receiver>` declaration, borrowed directly from the decoded manifest tree.
#[derive(Debug)]
pub struct Receiver<'a> {
    pub direct_boot_aware: Option<&'a str>,
    pub enabled: Option<&'a str>,
    pub exported: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub label: Option<&'a str>,
    pub name: Option<&'a str>,
    pub permission: Option<&'a str>,
    pub process: Option<&'a str>,
}
