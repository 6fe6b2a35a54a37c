//! Plugin discovery.
//!
//! Scans the plugin directory for `*.toml` modules. Every call performs a
//! fresh scan; nothing is cached between calls. A module that cannot be
//! loaded is reported in [`Discovery::failures`] and the scan continues.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::{GadError, GadResult};
use crate::plugins::contract::{
    is_dotted_numeric, PluginDeclaration, PluginDescriptor, PluginModule, DEFAULT_AUTHOR, DEFAULT_DESCRIPTION,
    DEFAULT_VERSION,
};

/// File extension of plugin modules
pub const MODULE_EXTENSION: &str = "toml";

/// A module (or one declaration in it) that could not be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub module: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Result of one directory scan
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Plugins in module-name order, then declaration order
    pub plugins: Vec<PluginDescriptor>,
    pub failures: Vec<LoadFailure>,
}

impl Discovery {
    pub fn find(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Scan `dir` for plugin modules.
///
/// A missing directory yields an empty result. Plugin names are unique in
/// the result; a later declaration with a name already seen is reported as
/// a failure and skipped.
pub fn discover(dir: &Path) -> Discovery {
    let mut discovery = Discovery::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "plugin directory does not exist");
            return discovery;
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "could not read plugin directory");
            return discovery;
        }
    };

    let mut modules: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == MODULE_EXTENSION))
        .filter_map(|path| {
            let module = path.file_stem()?.to_str()?.to_string();
            Some((module, path))
        })
        .collect();
    modules.sort();

    let mut loaded_modules = HashSet::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for (module, path) in modules {
        if !loaded_modules.insert(module.clone()) {
            continue;
        }

        let declarations = match parse_module(&path) {
            Ok(declarations) => declarations,
            Err(e) => {
                tracing::warn!(module = %module, error = %e, "failed to load plugin module");
                discovery.failures.push(LoadFailure {
                    module,
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if declarations.is_empty() {
            tracing::debug!(module = %module, "module declares no plugins");
        }

        for (index, declaration) in declarations.into_iter().enumerate() {
            match descriptor_from(declaration, &module, &path) {
                Ok(plugin) if seen_names.contains(&plugin.name) => {
                    tracing::warn!(module = %module, plugin = %plugin.name, "duplicate plugin name skipped");
                    discovery.failures.push(LoadFailure {
                        module: module.clone(),
                        path: path.clone(),
                        reason: format!("duplicate plugin name '{}'", plugin.name),
                    });
                }
                Ok(plugin) => {
                    seen_names.insert(plugin.name.clone());
                    discovery.plugins.push(plugin);
                }
                Err(reason) => {
                    tracing::warn!(module = %module, index, reason = %reason, "skipped plugin declaration");
                    discovery.failures.push(LoadFailure {
                        module: module.clone(),
                        path: path.clone(),
                        reason: format!("plugin #{}: {}", index + 1, reason),
                    });
                }
            }
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        plugins = discovery.plugins.len(),
        failures = discovery.failures.len(),
        "plugin scan finished"
    );
    discovery
}

/// Plugins found in `dir`, ignoring failures
pub fn load_plugins(dir: &Path) -> Vec<PluginDescriptor> {
    discover(dir).plugins
}

/// Load the plugins declared in a single module file.
///
/// Declarations that cannot become plugins are skipped, the same as in
/// [`discover`].
pub fn load_module(path: &Path) -> GadResult<Vec<PluginDescriptor>> {
    let module = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| GadError::invalid_input("source", path.display().to_string(), "not a module file name"))?
        .to_string();

    let plugins = parse_module(path)?
        .into_iter()
        .filter_map(|declaration| descriptor_from(declaration, &module, path).ok())
        .collect();
    Ok(plugins)
}

fn parse_module(path: &Path) -> GadResult<Vec<PluginDeclaration>> {
    let content = fs::read_to_string(path)
        .map_err(|e| GadError::file_error("read", path.display().to_string(), e.to_string()))?;
    let module: PluginModule = toml::from_str(&content).map_err(|e| GadError::SerializationError {
        reason: format!("{}: {}", path.display(), e),
    })?;
    Ok(module.plugin)
}

fn descriptor_from(declaration: PluginDeclaration, module: &str, path: &Path) -> Result<PluginDescriptor, String> {
    let name = declaration
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "missing a non-empty name".to_string())?;

    let version = declaration.version.unwrap_or_else(|| DEFAULT_VERSION.to_string());
    if !is_dotted_numeric(&version) {
        tracing::warn!(plugin = %name, version = %version, "plugin version is not dotted-numeric");
    }

    Ok(PluginDescriptor {
        name,
        version,
        author: declaration.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        description: declaration
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        module: module.to_string(),
        source: path.to_path_buf(),
        class_name: declaration.class,
        action: declaration.run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::contract::PluginAction;
    use tempfile::TempDir;

    fn write_module(dir: &Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let discovery = discover(&dir.path().join("nope"));
        assert!(discovery.plugins.is_empty());
        assert!(discovery.failures.is_empty());
    }

    #[test]
    fn test_sorted_by_module_then_declaration() {
        let dir = TempDir::new().unwrap();
        write_module(
            dir.path(),
            "psc_girder.toml",
            "[[plugin]]\nname = \"PSC Girder Design\"\n[[plugin]]\nname = \"PSC Girder Check\"\n",
        );
        write_module(dir.path(), "box_culvert.toml", "[[plugin]]\nname = \"Box Culvert Design\"\n");
        write_module(dir.path(), "notes.txt", "[[plugin]]\nname = \"Not A Plugin\"\n");

        let discovery = discover(dir.path());
        assert_eq!(
            discovery.names(),
            vec!["Box Culvert Design", "PSC Girder Design", "PSC Girder Check"]
        );
        assert_eq!(discovery.plugins[0].module, "box_culvert");
    }

    #[test]
    fn test_defaults_applied() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "bare.toml", "[[plugin]]\nname = \"Bare\"\n");

        let plugin = &discover(dir.path()).plugins[0];
        assert_eq!(plugin.version, DEFAULT_VERSION);
        assert_eq!(plugin.author, DEFAULT_AUTHOR);
        assert_eq!(plugin.description, DEFAULT_DESCRIPTION);
        assert_eq!(plugin.action, None);
    }

    #[test]
    fn test_broken_module_does_not_stop_scan() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "a_broken.toml", "[[plugin]\nname = ");
        write_module(
            dir.path(),
            "b_good.toml",
            "[[plugin]]\nname = \"Good\"\n[plugin.run]\nkind = \"fail\"\nmessage = \"boom\"\n",
        );

        let discovery = discover(dir.path());
        assert_eq!(discovery.names(), vec!["Good"]);
        assert_eq!(discovery.failures.len(), 1);
        assert_eq!(discovery.failures[0].module, "a_broken");
        assert_eq!(
            discovery.plugins[0].action,
            Some(PluginAction::Fail { message: "boom".to_string() })
        );
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "a.toml", "[[plugin]]\nname = \"Same\"\nauthor = \"First\"\n");
        write_module(dir.path(), "b.toml", "[[plugin]]\nname = \"Same\"\nauthor = \"Second\"\n");

        let discovery = discover(dir.path());
        assert_eq!(discovery.plugins.len(), 1);
        assert_eq!(discovery.plugins[0].author, "First");
        assert_eq!(discovery.failures.len(), 1);
    }

    #[test]
    fn test_nameless_declaration_skipped() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "m.toml", "[[plugin]]\nname = \"  \"\n[[plugin]]\nname = \"Named\"\n");

        let discovery = discover(dir.path());
        assert_eq!(discovery.names(), vec!["Named"]);
        assert!(discovery.failures[0].reason.contains("plugin #1"));
    }

    #[test]
    fn test_load_single_module() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "slab.toml", "[[plugin]]\nclass = \"SlabPlugin\"\nname = \"Slab\"\n");

        let plugins = load_module(&dir.path().join("slab.toml")).unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].class_name.as_deref(), Some("SlabPlugin"));
        assert!(load_module(&dir.path().join("missing.toml")).is_err());
    }
}
