use std::{
    env,
    path::{Path, PathBuf},
};

pub const PROJECT_ROOT_VAR: &str = "BLOOM_PROJECT_ROOT";
pub const HOST_CONFIG_VAR: &str = "BLOOM_HOST_CONFIG";

/// Project modules copied into the target, with the variable naming each one.
pub const MODULES: &[(&str, &str)] = &[
    ("base", "BLOOM_MODULE_BASE"),
    ("desktop", "BLOOM_MODULE_DESKTOP"),
    ("hardware", "BLOOM_MODULE_HARDWARE"),
    ("packages", "BLOOM_MODULE_PACKAGES"),
    ("branding", "BLOOM_MODULE_BRANDING"),
];

/// Every variable that has to survive the trip through `sudo`.
pub fn env_vars() -> Vec<&'static str> {
    let mut vars = vec![PROJECT_ROOT_VAR, HOST_CONFIG_VAR];
    vars.extend(MODULES.iter().map(|(_, var)| *var));
    vars
}

/// Location of a Bloom Nix project checkout, discovered from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStructure {
    pub root: PathBuf,
    /// (module name, directory) for every module that exists on disk.
    pub modules: Vec<(&'static str, PathBuf)>,
    pub host_config: Option<PathBuf>,
}

impl ProjectStructure {
    /// `None` unless `BLOOM_PROJECT_ROOT` is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let existing = |var: &str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .filter(|p| p.exists())
        };

        let root = lookup(PROJECT_ROOT_VAR).filter(|v| !v.is_empty())?;
        Some(ProjectStructure {
            root: PathBuf::from(root),
            modules: MODULES
                .iter()
                .filter_map(|(name, var)| existing(var).map(|p| (*name, p)))
                .collect(),
            host_config: existing(HOST_CONFIG_VAR),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn absent_without_root() {
        assert_eq!(ProjectStructure::from_lookup(|_| None), None);
        assert_eq!(ProjectStructure::from_lookup(|_| Some(String::new())), None);
    }

    #[test]
    fn only_existing_modules_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base");
        std::fs::create_dir(&base).unwrap();

        let vars: HashMap<&str, String> = [
            (PROJECT_ROOT_VAR, dir.path().display().to_string()),
            ("BLOOM_MODULE_BASE", base.display().to_string()),
            ("BLOOM_MODULE_DESKTOP", dir.path().join("missing").display().to_string()),
        ]
        .into_iter()
        .collect();

        let project = ProjectStructure::from_lookup(|v| vars.get(v).cloned()).unwrap();
        assert_eq!(project.root(), dir.path());
        assert_eq!(project.modules, vec![("base", base)]);
        assert_eq!(project.host_config, None);
    }

    #[test]
    fn sudo_keeps_all_project_variables() {
        let vars = env_vars();
        assert_eq!(vars.len(), 7);
        assert!(vars.contains(&"BLOOM_MODULE_BRANDING"));
    }
}
